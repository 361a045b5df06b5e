//! Integration tests for Tripmart.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! tm-cli migrate
//!
//! # Start the API
//! cargo run -p tripmart-api
//!
//! # Run the ignored HTTP tests against it
//! cargo test -p tripmart-integration-tests -- --ignored
//! ```
//!
//! The tests read `TRIPMART_API_URL` (default `http://localhost:3000`) and
//! sign their own tokens with `TRIPMART_AUTH_SECRET`, which must match the
//! server's.

use chrono::{Duration, Utc};
use reqwest::{Client, RequestBuilder};
use secrecy::SecretString;
use uuid::Uuid;

use tripmart_api::services::auth::TokenSigner;
use tripmart_core::{Caller, CallerRole};

/// Shared state for one test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    signer: TokenSigner,
}

impl TestContext {
    /// # Panics
    ///
    /// Panics if `TRIPMART_AUTH_SECRET` is not set.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let base_url = std::env::var("TRIPMART_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let secret = std::env::var("TRIPMART_AUTH_SECRET")
            .expect("TRIPMART_AUTH_SECRET must match the running server");

        Self {
            client: Client::new(),
            base_url,
            signer: TokenSigner::new(SecretString::from(secret)),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Bearer token for `subject` in `role`.
    ///
    /// # Panics
    ///
    /// Panics if the secret cannot key the MAC.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn token(&self, role: CallerRole, subject: i32) -> String {
        self.signer
            .issue(&Caller::new(role, subject), Utc::now(), Duration::minutes(10))
            .expect("Failed to sign token")
    }

    /// Attach a bearer token to `request`.
    #[must_use]
    pub fn as_caller(
        &self,
        request: RequestBuilder,
        role: CallerRole,
        subject: i32,
    ) -> RequestBuilder {
        request.bearer_auth(self.token(role, subject))
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A subject id unlikely to collide with other test runs.
#[must_use]
pub fn unique_subject() -> i32 {
    let bits = Uuid::new_v4().as_u128() % 1_000_000_000;
    i32::try_from(bits).unwrap_or_default() + 1_000
}

/// A short uppercase alphanumeric suffix for unique codes and usernames.
#[must_use]
pub fn unique_suffix() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase()
}
