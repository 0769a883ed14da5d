//! Error types for token signing and verification

/// Errors from signing or verifying a token.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unrecognized token payload: {0}")]
    Payload(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;
