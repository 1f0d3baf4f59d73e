use crate::core::auth;
use crate::domain::model::{Credentials, Profile, SignUpRequest, UserId};
use crate::domain::ports::Authenticator;
use crate::utils::error::{MarketError, Result};

/// The signed-in user, passed explicitly to whatever needs it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current_user: Option<Profile>,
}

/// Read-only view of a [`Session`] handed to catalog and view code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    user_id: Option<UserId>,
}

impl SessionSnapshot {
    pub fn current_user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is(&self, user: &UserId) -> bool {
        self.user_id.as_ref() == Some(user)
    }
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(profile: Profile) -> Self {
        Self {
            current_user: Some(profile),
        }
    }

    pub fn current_user(&self) -> Option<&Profile> {
        self.current_user.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user_id: self.current_user.as_ref().map(|p| p.id.clone()),
        }
    }

    pub fn require_user(&self) -> Result<&Profile> {
        self.current_user.as_ref().ok_or(MarketError::Unauthenticated)
    }

    /// Checks the credentials locally, then asks the provider.
    pub async fn sign_in<A>(
        &mut self,
        authenticator: &A,
        credentials: &Credentials,
        institutional_domain: &str,
    ) -> Result<&Profile>
    where
        A: Authenticator + ?Sized,
    {
        auth::validate_credentials(credentials, institutional_domain)?;
        let profile = authenticator.sign_in(credentials).await?;
        tracing::info!("👋 Signed in as {}", profile.id);
        Ok(&*self.current_user.insert(profile))
    }

    /// Creates the account without signing in; the provider verifies the
    /// email first.
    pub async fn sign_up<A>(
        authenticator: &A,
        request: &SignUpRequest,
        institutional_domain: &str,
    ) -> Result<Profile>
    where
        A: Authenticator + ?Sized,
    {
        auth::validate_sign_up(request, institutional_domain)?;
        let profile = authenticator.sign_up(request).await?;
        tracing::info!("✅ Account created for {}", profile.email);
        Ok(profile)
    }

    pub async fn sign_out<A>(&mut self, authenticator: &A) -> Result<()>
    where
        A: Authenticator + ?Sized,
    {
        if let Some(profile) = self.current_user.take() {
            authenticator.sign_out(&profile.id).await?;
            tracing::info!("Signed out {}", profile.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_anonymous_session() {
        let session = Session::anonymous();
        assert!(!session.snapshot().is_signed_in());
        assert!(session.snapshot().current_user_id().is_none());
        assert!(matches!(session.require_user(), Err(MarketError::Unauthenticated)));
    }

    #[test]
    fn test_snapshot_exposes_only_the_id() {
        let profile = Profile::new("42", "me@queensu.ca", "Me", Utc::now());
        let session = Session::signed_in(profile);
        let snapshot = session.snapshot();

        assert_eq!(snapshot.current_user_id(), Some(&UserId::from("42")));
        assert!(snapshot.is(&UserId::from("42")));
        assert!(!snapshot.is(&UserId::from("7")));
        assert_eq!(session.require_user().unwrap().full_name, "Me");
    }
}
