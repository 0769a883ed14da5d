//! Signed session tokens
//!
//! Carries small JSON payloads between HTTP round-trips as HS256 JSON web
//! tokens. The signing secret is supplied on every call; nothing is cached
//! here, so one process can serve several secrets without shared state.
//!
//! Two payloads travel through the login flows:
//! 1. `TokenPayload::OAuthSecretHolder` keeps the temporary OAuth1 token
//!    secret confidential while the browser is redirected to the provider
//! 2. `TokenPayload::Identity` is issued once a provider resolves a user

pub mod codec;
pub mod error;
pub mod payload;

pub use codec::{ALGORITHM, sign, verify};
pub use error::{Error, Result};
pub use payload::TokenPayload;
