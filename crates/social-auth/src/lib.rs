//! Stateless social login
//!
//! Offers "log in with Twitter/Facebook" without server-side sessions: the
//! state a flow needs between HTTP round-trips travels in a signed token the
//! client stores (typically an HTTP-only cookie).
//!
//! Request flow:
//! 1. The adapter calls `Dispatcher::handle()` with the provider name,
//!    callback URL, query parameters, signing secret and the client's token
//! 2. The dispatcher checks the name against `ProviderKind`, constructs the
//!    provider from `ProviderConfig` and lets the query select begin/resume
//! 3. The provider talks to the remote service through a `Transport`
//! 4. The result comes back as a `Directive`: redirect, or complete with a
//!    signed identity token

pub mod config;
pub mod constants;
pub mod directive;
pub mod dispatcher;
pub mod facebook;
mod http;
pub mod oauth1;
pub mod twitter;

#[cfg(test)]
mod testing;

pub use config::{FacebookCredentials, ProviderConfig, TwitterCredentials};
pub use directive::Directive;
pub use dispatcher::{Dispatcher, ProviderKind};
pub use facebook::FacebookProvider;
pub use provider::{Error, FaultKind, Result};
pub use twitter::TwitterProvider;
