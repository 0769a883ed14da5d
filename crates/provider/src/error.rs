//! Error taxonomy shared by the dispatcher and every provider
//!
//! Every failure is either a usage fault (the caller can fix the request) or
//! a provider fault (configuration or the remote service is broken). Adapters
//! branch on `Error::kind()` rather than on message text.

use std::fmt;

/// Who has to act to resolve a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Client-caused; surfaced as HTTP 400
    Usage,
    /// Environment or remote-service caused; surfaced as a server error
    Provider,
}

/// Why a required token could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFault {
    /// The client sent no token
    Missing,
    /// The token is not a well-formed token of the expected kind
    Garbled,
    /// Signature verification failed or the token expired
    Unreadable,
}

impl fmt::Display for TokenFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenFault::Missing => write!(f, "No token cookie given"),
            TokenFault::Garbled | TokenFault::Unreadable => {
                write!(f, "Failed to retrieve oauth_token_secret from token")
            }
        }
    }
}

/// Errors from a dispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid request")]
    InvalidRequest,

    #[error("{0}")]
    Token(TokenFault),

    #[error("No {0} configuration value")]
    MissingConfiguration(&'static str),

    #[error("{0}")]
    Provider(String),

    #[error("{provider} returned neither a redirect nor a user")]
    MalformedProviderResult { provider: &'static str },
}

impl Error {
    pub fn kind(&self) -> FaultKind {
        match self {
            Error::UnsupportedProvider(_)
            | Error::InvalidRequest
            | Error::Token(TokenFault::Missing | TokenFault::Garbled) => FaultKind::Usage,
            Error::Token(TokenFault::Unreadable)
            | Error::MissingConfiguration(_)
            | Error::Provider(_)
            | Error::MalformedProviderResult { .. } => FaultKind::Provider,
        }
    }

    /// Non-200 answer from a remote endpoint: `"<status> from <provider>"`.
    pub fn upstream_status(status: u16, provider: &str) -> Self {
        Error::Provider(format!("{status} from {provider}"))
    }

    /// Remote answer lacking a required field: `"No <field> from <provider>"`.
    pub fn missing_field(field: &str, provider: &str) -> Self {
        Error::Provider(format!("No {field} from {provider}"))
    }
}

/// Result alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;
