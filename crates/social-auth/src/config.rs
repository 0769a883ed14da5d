//! Provider credentials
//!
//! Loaded once at process start by the embedding application and injected
//! into the dispatcher. Every field is optional here: a missing credential
//! only fails the flows of the provider that needs it, at construction time.

use common::Secret;

use crate::constants::DEFAULT_GRAPH_API_VERSION;

/// Credentials for every supported provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub twitter: TwitterCredentials,
    pub facebook: FacebookCredentials,
}

/// Twitter consumer key pair (`TWITTER_CONSUMER_KEY` / `TWITTER_CONSUMER_SECRET`).
#[derive(Debug, Clone, Default)]
pub struct TwitterCredentials {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<Secret<String>>,
}

/// Facebook app credentials (`FACEBOOK_APP_ID` / `FACEBOOK_APP_SECRET`).
#[derive(Debug, Clone)]
pub struct FacebookCredentials {
    pub app_id: Option<String>,
    pub app_secret: Option<Secret<String>>,
    pub graph_api_version: String,
}

impl Default for FacebookCredentials {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            graph_api_version: DEFAULT_GRAPH_API_VERSION.to_string(),
        }
    }
}

/// Blank strings count as unset, matching how empty environment exports behave.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
