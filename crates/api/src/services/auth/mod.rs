//! Stateless bearer tokens for marketplace callers.
//!
//! The identity collaborator authenticates users and hands out tokens of the
//! form `v1.<role>.<subject>.<expires_unix>.<signature>`, where the signature
//! is hex HMAC-SHA256 over everything before the last dot. The API only
//! verifies tokens; `tm-cli token issue` mints them for operators and tests.

mod error;

pub use error::AuthError;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use tripmart_core::{Caller, CallerRole};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";

/// Signs and verifies caller tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenSigner {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AuthError::InvalidKey)
    }

    /// Issue a token for `caller` that expires `ttl` after `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKey`] if the secret cannot key the MAC.
    pub fn issue(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let expires = (now + ttl).timestamp();
        let payload = format!(
            "{TOKEN_VERSION}.{}.{}.{expires}",
            caller.role.as_str(),
            caller.subject
        );

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify `token` at time `now` and return the caller it names.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] for malformed, forged or expired tokens.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Caller, AuthError> {
        let (payload, signature) = token
            .rsplit_once('.')
            .ok_or(AuthError::Malformed("missing signature"))?;

        let signature =
            hex::decode(signature).map_err(|_| AuthError::Malformed("signature is not hex"))?;
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let mut parts = payload.split('.');
        let (Some(version), Some(role), Some(subject), Some(expires), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(AuthError::Malformed("wrong number of segments"));
        };

        if version != TOKEN_VERSION {
            return Err(AuthError::Malformed("unsupported version"));
        }
        let role: CallerRole = role
            .parse()
            .map_err(|_| AuthError::Malformed("unknown role"))?;
        let subject: i32 = subject
            .parse()
            .map_err(|_| AuthError::Malformed("subject is not an integer"))?;
        let expires: i64 = expires
            .parse()
            .map_err(|_| AuthError::Malformed("expiry is not a timestamp"))?;

        if expires <= now.timestamp() {
            return Err(AuthError::Expired);
        }

        Ok(Caller::new(role, subject))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(SecretString::from("Zq8#vL2!pN6@tR4$wY0^bC3&dF7*hJ1%"))
    }

    #[test]
    fn test_issued_token_verifies() {
        let now = Utc::now();
        let caller = Caller::new(CallerRole::TourGuide, 17);
        let token = signer().issue(&caller, now, Duration::hours(1)).unwrap();

        assert!(token.starts_with("v1.tour_guide.17."));
        assert_eq!(signer().verify(&token, now).unwrap(), caller);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now();
        let caller = Caller::new(CallerRole::Seller, 3);
        let token = signer().issue(&caller, now, Duration::minutes(5)).unwrap();

        let later = now + Duration::minutes(6);
        assert_eq!(signer().verify(&token, later), Err(AuthError::Expired));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let now = Utc::now();
        let token = signer()
            .issue(&Caller::new(CallerRole::Seller, 3), now, Duration::hours(1))
            .unwrap();

        let forged = token.replacen("v1.seller.3.", "v1.admin.3.", 1);
        assert_eq!(signer().verify(&forged, now), Err(AuthError::BadSignature));
    }

    #[test]
    fn test_other_key_is_rejected() {
        let now = Utc::now();
        let token = signer()
            .issue(&Caller::new(CallerRole::Tourist, 8), now, Duration::hours(1))
            .unwrap();

        let other = TokenSigner::new(SecretString::from("Kd5!mW9@qE2#rT7$yU4%iO1^pA6&sD3*"));
        assert_eq!(other.verify(&token, now), Err(AuthError::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let now = Utc::now();
        assert!(matches!(
            signer().verify("not-a-token", now),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            signer().verify("v1.seller.3.99.zz", now),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        assert!(!format!("{:?}", signer()).contains("Zq8#"));
    }
}
