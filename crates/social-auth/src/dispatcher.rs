//! Provider registry and single-step dispatch

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use provider::{Error, ProviderClient, ProviderState, RequestContext, Result, Transport};
use session_token::TokenPayload;
use tracing::{info, instrument, warn};

use crate::config::ProviderConfig;
use crate::directive::Directive;
use crate::facebook::FacebookProvider;
use crate::twitter::TwitterProvider;

/// Closed registry of supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Twitter,
    Facebook,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Twitter, ProviderKind::Facebook];

    /// Route segment, e.g. `twitter` in `/auth/twitter`
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Twitter => "twitter",
            ProviderKind::Facebook => "facebook",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    /// Exact, case-sensitive match against the registry.
    fn from_str(name: &str) -> Result<Self> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::UnsupportedProvider(name.to_string()))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point for the login endpoints.
///
/// Holds only immutable configuration and the outbound transport, so one
/// instance serves concurrent requests without locking.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<ProviderConfig>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(config: ProviderConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Construct the provider for `kind`, validating its configuration.
    pub fn provider(&self, kind: ProviderKind) -> Result<Box<dyn ProviderClient>> {
        let transport = Arc::clone(&self.transport);
        let client: Box<dyn ProviderClient> = match kind {
            ProviderKind::Twitter => Box::new(TwitterProvider::new(&self.config.twitter, transport)?),
            ProviderKind::Facebook => {
                Box::new(FacebookProvider::new(&self.config.facebook, transport)?)
            }
        };
        Ok(client)
    }

    /// Drive `provider_name` through the step selected by `query`.
    #[instrument(skip_all, fields(provider = provider_name))]
    pub async fn handle(
        &self,
        provider_name: &str,
        callback_url: &str,
        query: &HashMap<String, String>,
        secret: &[u8],
        incoming_token: Option<&str>,
    ) -> Result<Directive> {
        let kind: ProviderKind = provider_name.parse().inspect_err(|_| {
            warn!("rejected unsupported provider");
        })?;
        let client = self.provider(kind)?;

        let ctx = RequestContext {
            callback_url,
            query,
            secret,
            incoming_token,
        };
        let state = client.step(&ctx).await?;
        project(state, client.name(), secret)
    }
}

/// Normalize a provider outcome into a `Directive`, issuing the identity
/// token for resolved users.
fn project(state: ProviderState, provider: &'static str, secret: &[u8]) -> Result<Directive> {
    match state {
        ProviderState::Redirected {
            redirect_url,
            issued_token,
        } => Ok(Directive::Redirect {
            redirect_url,
            issued_token,
        }),
        ProviderState::Resolved { user_id, user_name } => {
            let issued_token = session_token::sign(
                &TokenPayload::Identity {
                    user_id: user_id.clone(),
                },
                secret,
            )
            .map_err(|e| Error::Provider(format!("failed to issue token: {e}")))?;
            info!(provider, "login complete");
            Ok(Directive::Complete {
                issued_token,
                user_id,
                user_name,
            })
        }
        ProviderState::Unauthenticated => Err(Error::MalformedProviderResult { provider }),
    }
}
