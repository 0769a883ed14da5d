//! Payloads carried inside signed tokens
//!
//! Wire shapes stay compatible with tokens minted by earlier deployments:
//! the secret holder is a JSON:API style resource object, the identity is a
//! flat `user_id` claim.

use serde::{Deserialize, Serialize};

/// Resource type tag for the OAuth1 secret holder.
pub const OAUTH_TOKEN_SECRET_TYPE: &str = "oauth_token_secret";

/// Tagged union of everything this workspace puts inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WirePayload", try_from = "WirePayload")]
pub enum TokenPayload {
    /// Temporary OAuth1 token secret, held between redirect and callback.
    OAuthSecretHolder { id: String },
    /// Resolved provider user, issued when a flow completes.
    Identity { user_id: String },
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WirePayload {
    Resource { data: ResourceObject },
    Identity { user_id: String },
}

#[derive(Serialize, Deserialize)]
struct ResourceObject {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

impl From<TokenPayload> for WirePayload {
    fn from(payload: TokenPayload) -> Self {
        match payload {
            TokenPayload::OAuthSecretHolder { id } => WirePayload::Resource {
                data: ResourceObject {
                    kind: OAUTH_TOKEN_SECRET_TYPE.to_string(),
                    id,
                },
            },
            TokenPayload::Identity { user_id } => WirePayload::Identity { user_id },
        }
    }
}

impl TryFrom<WirePayload> for TokenPayload {
    type Error = String;

    fn try_from(wire: WirePayload) -> Result<Self, Self::Error> {
        match wire {
            WirePayload::Resource { data } if data.kind == OAUTH_TOKEN_SECRET_TYPE => {
                Ok(TokenPayload::OAuthSecretHolder { id: data.id })
            }
            WirePayload::Resource { data } => {
                Err(format!("unexpected resource type {:?}", data.kind))
            }
            WirePayload::Identity { user_id } => Ok(TokenPayload::Identity { user_id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_holder_uses_resource_object_shape() {
        let payload = TokenPayload::OAuthSecretHolder { id: "bar".into() };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data": {"type": "oauth_token_secret", "id": "bar"}})
        );
    }

    #[test]
    fn identity_is_flat_user_id() {
        let payload = TokenPayload::Identity { user_id: "987".into() };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"user_id": "987"}));
    }

    #[test]
    fn unknown_resource_type_is_rejected() {
        let json = r#"{"data":{"type":"foobar","id":"x"}}"#;
        let result = serde_json::from_str::<TokenPayload>(json);
        assert!(result.is_err());
    }

    #[test]
    fn resource_without_id_is_rejected() {
        let json = r#"{"data":{"type":"oauth_token_secret"}}"#;
        assert!(serde_json::from_str::<TokenPayload>(json).is_err());
    }

    #[test]
    fn extra_claims_are_ignored() {
        let json = r#"{"user_id":"42","iat":1700000000}"#;
        let payload: TokenPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload, TokenPayload::Identity { user_id: "42".into() });
    }
}
