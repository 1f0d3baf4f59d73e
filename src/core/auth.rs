use crate::domain::model::{Credentials, SignUpRequest};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{validate_min_length, validate_non_empty_string};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Accepts `someone@<domain>`. The domain is compared case-insensitively;
/// the local part has to be non-empty.
pub fn validate_institutional_email(email: &str, domain: &str) -> Result<()> {
    let email = email.trim();
    let domain = domain.trim().trim_start_matches('@');

    let rejected = || MarketError::InvalidEmailDomain {
        email: email.to_string(),
        domain: domain.to_string(),
    };

    let (local, host) = email.rsplit_once('@').ok_or_else(rejected)?;
    if local.is_empty() || local.contains(char::is_whitespace) || !host.eq_ignore_ascii_case(domain)
    {
        return Err(rejected());
    }
    Ok(())
}

pub fn validate_credentials(credentials: &Credentials, domain: &str) -> Result<()> {
    validate_institutional_email(&credentials.email, domain)?;
    validate_min_length("password", &credentials.password, MIN_PASSWORD_LENGTH)
}

pub fn validate_sign_up(request: &SignUpRequest, domain: &str) -> Result<()> {
    validate_institutional_email(&request.email, domain)?;
    validate_min_length("password", &request.password, MIN_PASSWORD_LENGTH)?;
    validate_non_empty_string("full_name", &request.full_name)
}
