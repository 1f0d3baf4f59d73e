use crate::domain::model::{Credentials, Profile, SignUpRequest, UserId};
use crate::domain::ports::Authenticator;
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

struct Account {
    password: String,
    profile: Profile,
}

/// Local stand-in for the hosted auth provider. Accounts live only as long
/// as the value does.
#[derive(Default)]
pub struct InMemoryAuthenticator {
    accounts: Mutex<HashMap<String, Account>>,
}

impl InMemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

#[async_trait]
impl Authenticator for InMemoryAuthenticator {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Profile> {
        let accounts = self.accounts.lock().await;
        match accounts.get(&Self::key(&credentials.email)) {
            Some(account) if account.password == credentials.password => {
                Ok(account.profile.clone())
            }
            _ => Err(MarketError::AuthenticationFailed {
                message: "invalid email or password".to_string(),
            }),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<Profile> {
        let mut accounts = self.accounts.lock().await;
        let key = Self::key(&request.email);
        if accounts.contains_key(&key) {
            return Err(MarketError::AuthenticationFailed {
                message: "an account with this email already exists".to_string(),
            });
        }

        let id = UserId(format!("user-{}", accounts.len() + 1));
        let profile = Profile::new(id, key.clone(), request.full_name.trim(), Utc::now());
        accounts.insert(
            key,
            Account {
                password: request.password.clone(),
                profile: profile.clone(),
            },
        );
        Ok(profile)
    }

    async fn sign_out(&self, _user: &UserId) -> Result<()> {
        Ok(())
    }
}
