//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Builds the `Authorization: OAuth ...` header for the request-token and
//! access-token legs. Parameters are percent-encoded per RFC 3986, sorted by
//! encoded key then value, and joined into the signature base string
//! `METHOD&enc(url)&enc(params)`. The signing key is
//! `enc(consumer_secret)&enc(token_secret)`.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use provider::{Error, Result};
use rand::RngExt;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Signature base string over already-collected request parameters.
pub fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&normalized)
    )
}

/// Base64 HMAC-SHA1 of `base_string` under the consumer/token secret pair.
pub fn hmac_sha1_signature(
    base_string: &str,
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| Error::Provider(format!("invalid OAuth signing key: {e}")))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Random single-use value for `oauth_nonce`.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn unix_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
        .to_string()
}

/// Signs requests on behalf of one consumer, optionally acting with a token.
pub struct Signer<'a> {
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
    pub token: Option<&'a str>,
    pub token_secret: &'a str,
}

impl Signer<'_> {
    /// `Authorization` header value for a request without body parameters.
    ///
    /// `protocol_params` are extra `oauth_*` values for this leg
    /// (`oauth_callback`, `oauth_verifier`).
    pub fn authorization(
        &self,
        method: &str,
        url: &str,
        protocol_params: &[(&str, &str)],
    ) -> Result<String> {
        self.authorization_with(
            method,
            url,
            protocol_params,
            &generate_nonce(),
            &unix_timestamp(),
        )
    }

    pub(crate) fn authorization_with(
        &self,
        method: &str,
        url: &str,
        protocol_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let mut oauth: Vec<(&str, &str)> = vec![
            ("oauth_consumer_key", self.consumer_key),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp),
            ("oauth_version", VERSION),
        ];
        if let Some(token) = self.token {
            oauth.push(("oauth_token", token));
        }
        oauth.extend_from_slice(protocol_params);

        let base = signature_base_string(method, url, &oauth);
        let signature = hmac_sha1_signature(&base, self.consumer_secret, self.token_secret)?;
        oauth.push(("oauth_signature", &signature));
        oauth.sort();

        let fields = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {fields}"))
    }
}

/// Decode an `application/x-www-form-urlencoded` body. Repeated keys keep the
/// last value.
pub fn parse_form(body: &str) -> HashMap<String, String> {
    body.trim()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(&key.replace('+', " ")).ok()?.into_owned();
            let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}
