//! Development bearer tokens.
//!
//! Tokens are signed with the same `TRIPMART_AUTH_SECRET` the API verifies
//! with, so the secret strength checks apply here too.

use chrono::{Duration, Utc};
use thiserror::Error;

use tripmart_api::config::{ConfigError, get_auth_secret};
use tripmart_api::services::auth::{AuthError, TokenSigner};
use tripmart_core::{Caller, CallerRole, ParseRoleError};

/// Longest lifetime a development token may have.
const MAX_TTL_HOURS: i64 = 24 * 30;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Role(#[from] ParseRoleError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("ttl must be between 1 and {MAX_TTL_HOURS} hours, got {0}")]
    InvalidTtl(i64),
}

/// Parse the role and lifetime given on the command line.
fn parse_request(role: &str, ttl_hours: i64) -> Result<(CallerRole, Duration), TokenError> {
    let role = role.parse::<CallerRole>()?;
    if !(1..=MAX_TTL_HOURS).contains(&ttl_hours) {
        return Err(TokenError::InvalidTtl(ttl_hours));
    }
    Ok((role, Duration::hours(ttl_hours)))
}

/// Issue a token for `subject` acting as `role`.
///
/// # Errors
///
/// Returns a `TokenError` for an unknown role, an out-of-range lifetime or
/// a missing or weak signing secret.
pub fn issue(role: &str, subject: i32, ttl_hours: i64) -> Result<String, TokenError> {
    dotenvy::dotenv().ok();

    let (role, ttl) = parse_request(role, ttl_hours)?;
    let signer = TokenSigner::new(get_auth_secret("TRIPMART_AUTH_SECRET")?);
    let token = signer.issue(&Caller::new(role, subject), Utc::now(), ttl)?;

    tracing::info!(%role, subject, ttl_hours, "Issued token");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let (role, ttl) = parse_request("tour_guide", 2).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(role, CallerRole::TourGuide);
        assert_eq!(ttl, Duration::hours(2));

        assert!(matches!(
            parse_request("root", 2),
            Err(TokenError::Role(_))
        ));
        assert!(matches!(
            parse_request("admin", 0),
            Err(TokenError::InvalidTtl(0))
        ));
        assert!(matches!(
            parse_request("admin", MAX_TTL_HOURS + 1),
            Err(TokenError::InvalidTtl(_))
        ));
    }
}
