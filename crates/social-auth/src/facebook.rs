//! Facebook: two-legged OAuth 2.0
//!
//! `begin` sends the user to the login dialog; no remote call is made.
//! `resume` trades the returned `code` for an access token and reads the
//! user's `id` and `name` from the Graph API.

use std::sync::Arc;

use common::Secret;
use provider::{
    BoxFuture, Error, OutboundRequest, ProviderClient, ProviderState, RequestContext, Result,
    Transition, Transport,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::{FacebookCredentials, present};
use crate::constants::{DEFAULT_GRAPH_API_VERSION, FACEBOOK_DIALOG_ENDPOINT, FACEBOOK_GRAPH_ROOT};
use crate::http::fetch;
use crate::oauth1::percent_encode;

const NAME: &str = "Facebook";

/// Token endpoint response. Only `access_token` matters.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
}

/// `/me?fields=id,name` response. Ids are documented as strings but older
/// API versions returned numbers.
#[derive(Debug, Deserialize)]
struct Profile {
    id: Option<serde_json::Value>,
    name: Option<String>,
}

pub struct FacebookProvider {
    app_id: String,
    app_secret: Secret<String>,
    graph_api_version: String,
    transport: Arc<dyn Transport>,
}

impl FacebookProvider {
    /// Fails with `MissingConfiguration` when the app id or secret is absent.
    pub fn new(credentials: &FacebookCredentials, transport: Arc<dyn Transport>) -> Result<Self> {
        let app_id = present(credentials.app_id.as_deref())
            .ok_or(Error::MissingConfiguration("FACEBOOK_APP_ID"))?
            .to_string();
        let app_secret = credentials
            .app_secret
            .as_ref()
            .and_then(|s| Secret::non_empty(s.expose().as_str()))
            .ok_or(Error::MissingConfiguration("FACEBOOK_APP_SECRET"))?;
        let graph_api_version = present(Some(credentials.graph_api_version.as_str()))
            .unwrap_or(DEFAULT_GRAPH_API_VERSION)
            .to_string();

        Ok(Self {
            app_id,
            app_secret,
            graph_api_version,
            transport,
        })
    }

    pub fn authorize_url(&self, callback_url: &str) -> String {
        format!(
            "{FACEBOOK_DIALOG_ENDPOINT}?client_id={}&redirect_uri={}",
            percent_encode(&self.app_id),
            percent_encode(callback_url)
        )
    }

    fn access_token_url(&self, callback_url: &str, code: &str) -> String {
        format!(
            "{FACEBOOK_GRAPH_ROOT}/{}/oauth/access_token?client_id={}&redirect_uri={}&client_secret={}&code={}",
            self.graph_api_version,
            percent_encode(&self.app_id),
            percent_encode(callback_url),
            percent_encode(self.app_secret.expose()),
            percent_encode(code),
        )
    }

    async fn exchange_code(&self, callback_url: &str, code: &str) -> Result<String> {
        let request = OutboundRequest::get(self.access_token_url(callback_url, code));
        let body = fetch(self.transport.as_ref(), request, NAME).await?;
        let response: AccessTokenResponse = parse_json(&body)?;
        response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::missing_field("access token", NAME))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderState> {
        let url = format!(
            "{FACEBOOK_GRAPH_ROOT}/me?fields=id,name&access_token={}",
            percent_encode(access_token)
        );
        let body = fetch(self.transport.as_ref(), OutboundRequest::get(url), NAME).await?;
        let profile: Profile = parse_json(&body)?;

        let user_id = match profile.id {
            Some(serde_json::Value::String(id)) if !id.is_empty() => id,
            Some(serde_json::Value::Number(id)) => id.to_string(),
            _ => return Err(Error::missing_field("user ID", NAME)),
        };
        Ok(ProviderState::Resolved {
            user_id,
            user_name: profile.name.filter(|n| !n.is_empty()),
        })
    }

    #[instrument(skip_all, fields(provider = NAME))]
    async fn finish(&self, ctx: &RequestContext<'_>) -> Result<ProviderState> {
        let code = ctx.param("code").ok_or(Error::InvalidRequest)?;
        let access_token = self.exchange_code(ctx.callback_url, code).await?;
        let state = self.fetch_profile(&access_token).await?;
        info!("Facebook user resolved");
        Ok(state)
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::Provider(format!("Malformed response from {NAME}: {e}")))
}

impl ProviderClient for FacebookProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn transition(&self, ctx: &RequestContext<'_>) -> Result<Transition> {
        if ctx.is_login_start() {
            Ok(Transition::Begin)
        } else if ctx.has("code") {
            Ok(Transition::Resume)
        } else {
            Err(Error::InvalidRequest)
        }
    }

    fn begin<'a>(&'a self, ctx: &'a RequestContext<'a>) -> BoxFuture<'a, Result<ProviderState>> {
        let redirect_url = self.authorize_url(ctx.callback_url);
        Box::pin(async move {
            info!(provider = NAME, "redirecting to Facebook login dialog");
            Ok(ProviderState::Redirected {
                redirect_url,
                issued_token: None,
            })
        })
    }

    fn resume<'a>(&'a self, ctx: &'a RequestContext<'a>) -> BoxFuture<'a, Result<ProviderState>> {
        Box::pin(self.finish(ctx))
    }
}
