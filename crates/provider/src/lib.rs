//! Provider abstraction for social login flows
//!
//! Defines the `ProviderClient` trait that decouples the dispatcher from each
//! provider's protocol, and the `Transport` trait providers use to reach the
//! remote service. Nothing here holds state across requests: a provider is
//! driven through exactly one step per inbound HTTP request and everything it
//! must remember rides in the signed token handed back to the caller.

pub mod error;
pub mod transport;

pub use error::{Error, FaultKind, Result, TokenFault};
pub use transport::{OutboundRequest, ReqwestTransport, Transport, TransportError, TransportResponse};

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Boxed future used at the trait seams for dyn-compatibility (`Arc<dyn Transport>`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Inputs of a single dispatch, borrowed from the inbound request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Callback URL, echoed verbatim into `redirect_uri` / `oauth_callback`
    pub callback_url: &'a str,
    pub query: &'a HashMap<String, String>,
    /// Key for every token signed or verified during this request
    pub secret: &'a [u8],
    /// Previously issued token, if the client sent one
    pub incoming_token: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn param(&self, key: &str) -> Option<&'a str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.query.contains_key(key)
    }

    /// Whether the query asks to start a new flow (`login=start`).
    pub fn is_login_start(&self) -> bool {
        self.param("login") == Some("start")
    }

    /// Incoming token, treating an empty string as absent.
    pub fn token(&self) -> Option<&'a str> {
        self.incoming_token.filter(|t| !t.is_empty())
    }
}

/// Which half of a flow the query parameters select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Begin,
    Resume,
}

/// Outcome of one provider step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderState {
    /// No step produced a result. Never a valid final state.
    Unauthenticated,
    /// The user agent must be sent to the provider.
    Redirected {
        redirect_url: String,
        /// Replaces the client's stored token when present
        issued_token: Option<String>,
    },
    /// The provider vouched for a user.
    Resolved {
        user_id: String,
        user_name: Option<String>,
    },
}

/// A social login provider.
///
/// Implementations validate their configuration at construction, so any
/// value of this trait is ready to make remote calls.
pub trait ProviderClient: Send + Sync {
    /// Display name used in error messages and logs (e.g. "Twitter")
    fn name(&self) -> &'static str;

    /// Decide begin vs resume from the query, or reject the request.
    ///
    /// Runs before any network call.
    fn transition(&self, ctx: &RequestContext<'_>) -> Result<Transition>;

    /// Start a flow: produce the redirect to the provider.
    fn begin<'a>(&'a self, ctx: &'a RequestContext<'a>) -> BoxFuture<'a, Result<ProviderState>>;

    /// Finish a flow after the provider redirected back.
    fn resume<'a>(&'a self, ctx: &'a RequestContext<'a>) -> BoxFuture<'a, Result<ProviderState>>;

    /// Drive the provider through the single step the request selects.
    fn step<'a>(&'a self, ctx: &'a RequestContext<'a>) -> BoxFuture<'a, Result<ProviderState>> {
        Box::pin(async move {
            match self.transition(ctx)? {
                Transition::Begin => self.begin(ctx).await,
                Transition::Resume => self.resume(ctx).await,
            }
        })
    }
}
