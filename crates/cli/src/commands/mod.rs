//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod token;

use secrecy::SecretString;

/// Database URL from `TRIPMART_DATABASE_URL`, falling back to `DATABASE_URL`.
pub(crate) fn database_url() -> Result<SecretString, &'static str> {
    std::env::var("TRIPMART_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "TRIPMART_DATABASE_URL not set")
}
