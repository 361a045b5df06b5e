//! Bearer token error types.

use thiserror::Error;

/// Errors that can occur while issuing or verifying bearer tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer` header on the request.
    #[error("missing bearer token")]
    MissingToken,

    /// The token does not have the `v1.<role>.<subject>.<expires>.<signature>` shape.
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    /// The signature does not match the payload.
    #[error("invalid token signature")]
    BadSignature,

    /// The token's expiry is in the past.
    #[error("token expired")]
    Expired,

    /// The signing key could not be used.
    #[error("invalid signing key")]
    InvalidKey,
}
