//! Twitter: three-legged OAuth 1.0a
//!
//! 1. `begin` obtains a request token, signs its secret into a token for the
//!    client and redirects to the authenticate page
//! 2. Twitter redirects back with `oauth_token` and `oauth_verifier`
//! 3. `resume` recovers the secret from the client's token and trades the
//!    verifier for the user's identity
//!
//! The request-token secret never appears in a URL. It rides inside the
//! signed token, so it stays between client and server across the redirect.

use std::sync::Arc;

use common::Secret;
use provider::{
    BoxFuture, Error, OutboundRequest, ProviderClient, ProviderState, RequestContext, Result,
    TokenFault, Transition, Transport,
};
use session_token::TokenPayload;
use tracing::{debug, info, instrument};

use crate::config::{TwitterCredentials, present};
use crate::constants::{
    TWITTER_ACCESS_TOKEN_ENDPOINT, TWITTER_AUTHENTICATE_ENDPOINT, TWITTER_REQUEST_TOKEN_ENDPOINT,
};
use crate::http::fetch;
use crate::oauth1::{Signer, parse_form, percent_encode};

const NAME: &str = "Twitter";

/// Temporary credentials from the first leg.
#[derive(Debug, Clone)]
pub struct RequestToken {
    pub oauth_token: String,
    pub oauth_token_secret: Secret<String>,
}

pub struct TwitterProvider {
    consumer_key: String,
    consumer_secret: Secret<String>,
    transport: Arc<dyn Transport>,
}

impl TwitterProvider {
    /// Fails with `MissingConfiguration` before any network use when either
    /// consumer credential is absent.
    pub fn new(credentials: &TwitterCredentials, transport: Arc<dyn Transport>) -> Result<Self> {
        let consumer_key = present(credentials.consumer_key.as_deref())
            .ok_or(Error::MissingConfiguration("TWITTER_CONSUMER_KEY"))?
            .to_string();
        let consumer_secret = credentials
            .consumer_secret
            .as_ref()
            .and_then(|s| Secret::non_empty(s.expose().as_str()))
            .ok_or(Error::MissingConfiguration("TWITTER_CONSUMER_SECRET"))?;

        Ok(Self {
            consumer_key,
            consumer_secret,
            transport,
        })
    }

    fn signer<'a>(&'a self, token: Option<&'a str>, token_secret: &'a str) -> Signer<'a> {
        Signer {
            consumer_key: &self.consumer_key,
            consumer_secret: self.consumer_secret.expose(),
            token,
            token_secret,
        }
    }

    /// First leg: obtain temporary credentials bound to `callback_url`.
    pub async fn request_token(&self, callback_url: &str) -> Result<RequestToken> {
        let authorization = self.signer(None, "").authorization(
            "POST",
            TWITTER_REQUEST_TOKEN_ENDPOINT,
            &[("oauth_callback", callback_url)],
        )?;
        let request = OutboundRequest::post(TWITTER_REQUEST_TOKEN_ENDPOINT)
            .header("Authorization", authorization);

        let body = fetch(self.transport.as_ref(), request, NAME).await?;
        let mut values = parse_form(&body);
        let oauth_token = values.remove("oauth_token").filter(|v| !v.is_empty());
        let oauth_token_secret = values.remove("oauth_token_secret").filter(|v| !v.is_empty());

        match (oauth_token, oauth_token_secret) {
            (Some(oauth_token), Some(oauth_token_secret)) => Ok(RequestToken {
                oauth_token,
                oauth_token_secret: Secret::new(oauth_token_secret),
            }),
            _ => Err(Error::missing_field("oauth_token or oauth_token_secret", NAME)),
        }
    }

    /// Authenticate page for the given request token.
    pub fn authorize_url(oauth_token: &str) -> String {
        format!(
            "{TWITTER_AUTHENTICATE_ENDPOINT}?oauth_token={}",
            percent_encode(oauth_token)
        )
    }

    /// Recover the request-token secret from the client's signed token.
    ///
    /// A token that is not a secret holder (garbage, or a well-signed token
    /// of another kind) is the client's fault. A bad signature or an
    /// expired token is not.
    fn recover_token_secret(ctx: &RequestContext<'_>) -> Result<String> {
        let token = ctx.token().ok_or(Error::Token(TokenFault::Missing))?;
        match session_token::verify(token, ctx.secret) {
            Ok(TokenPayload::OAuthSecretHolder { id }) => Ok(id),
            Ok(other) => {
                debug!(?other, "token does not hold an oauth_token_secret");
                Err(Error::Token(TokenFault::Garbled))
            }
            Err(e @ (session_token::Error::Malformed(_) | session_token::Error::Payload(_))) => {
                debug!(error = %e, "oauth secret holder is garbled");
                Err(Error::Token(TokenFault::Garbled))
            }
            Err(e) => {
                debug!(error = %e, "oauth secret holder rejected");
                Err(Error::Token(TokenFault::Unreadable))
            }
        }
    }

    /// Third leg: exchange the verifier for the user's identity.
    async fn access_token(
        &self,
        oauth_token: &str,
        oauth_token_secret: &str,
        oauth_verifier: &str,
    ) -> Result<ProviderState> {
        let authorization = self
            .signer(Some(oauth_token), oauth_token_secret)
            .authorization(
                "POST",
                TWITTER_ACCESS_TOKEN_ENDPOINT,
                &[("oauth_verifier", oauth_verifier)],
            )?;
        let request = OutboundRequest::post(TWITTER_ACCESS_TOKEN_ENDPOINT)
            .header("Authorization", authorization);

        let body = fetch(self.transport.as_ref(), request, NAME).await?;
        let mut values = parse_form(&body);
        let user_id = values
            .remove("user_id")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::missing_field("user_id", NAME))?;
        let user_name = values.remove("screen_name").filter(|v| !v.is_empty());

        Ok(ProviderState::Resolved { user_id, user_name })
    }
}

impl ProviderClient for TwitterProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn transition(&self, ctx: &RequestContext<'_>) -> Result<Transition> {
        if ctx.is_login_start() {
            Ok(Transition::Begin)
        } else if ctx.has("oauth_verifier") && ctx.has("oauth_token") {
            Ok(Transition::Resume)
        } else {
            Err(Error::InvalidRequest)
        }
    }

    fn begin<'a>(&'a self, ctx: &'a RequestContext<'a>) -> BoxFuture<'a, Result<ProviderState>> {
        Box::pin(self.start(ctx))
    }

    fn resume<'a>(&'a self, ctx: &'a RequestContext<'a>) -> BoxFuture<'a, Result<ProviderState>> {
        Box::pin(self.finish(ctx))
    }
}

impl TwitterProvider {
    #[instrument(skip_all, fields(provider = NAME))]
    async fn start(&self, ctx: &RequestContext<'_>) -> Result<ProviderState> {
        let RequestToken {
            oauth_token,
            oauth_token_secret,
        } = self.request_token(ctx.callback_url).await?;

        let issued = session_token::sign(
            &TokenPayload::OAuthSecretHolder {
                id: oauth_token_secret.expose().clone(),
            },
            ctx.secret,
        )
        .map_err(|e| Error::Provider(format!("failed to issue token: {e}")))?;

        info!("redirecting to Twitter authenticate page");
        Ok(ProviderState::Redirected {
            redirect_url: Self::authorize_url(&oauth_token),
            issued_token: Some(issued),
        })
    }

    #[instrument(skip_all, fields(provider = NAME))]
    async fn finish(&self, ctx: &RequestContext<'_>) -> Result<ProviderState> {
        let (Some(oauth_token), Some(oauth_verifier)) =
            (ctx.param("oauth_token"), ctx.param("oauth_verifier"))
        else {
            return Err(Error::InvalidRequest);
        };

        let oauth_token_secret = Self::recover_token_secret(ctx)?;
        let state = self
            .access_token(oauth_token, &oauth_token_secret, oauth_verifier)
            .await?;
        info!("Twitter user resolved");
        Ok(state)
    }
}
