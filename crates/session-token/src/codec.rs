//! HS256 token codec
//!
//! `verify(sign(x, s), s) == x` for every payload. Byte-level output is not
//! part of the contract; only the round trip is.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use crate::error::{Error, Result};
use crate::payload::TokenPayload;

/// The single signing algorithm accepted by this codec.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Sign `payload` with `secret`, producing a compact JWT.
pub fn sign(payload: &TokenPayload, secret: &[u8]) -> Result<String> {
    encode(
        &Header::new(ALGORITHM),
        payload,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| Error::Signing(e.to_string()))
}

/// Verify `token` against `secret` and return its payload.
///
/// Tokens carry no mandatory registered claims. An `exp` claim, when present,
/// is still enforced.
pub fn verify(token: &str, secret: &[u8]) -> Result<TokenPayload> {
    let mut validation = Validation::new(ALGORITHM);
    validation.required_spec_claims.clear();
    validation.validate_aud = false;

    decode::<TokenPayload>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "token verification failed");
            match e.kind() {
                ErrorKind::InvalidSignature => Error::BadSignature,
                ErrorKind::ExpiredSignature => Error::Expired,
                ErrorKind::Json(inner) => Error::Payload(inner.to_string()),
                _ => Error::Malformed(e.to_string()),
            }
        })
}
