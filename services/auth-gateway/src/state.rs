//! Shared handler state

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

use common::Secret;
use metrics_exporter_prometheus::PrometheusHandle;
use social_auth::Dispatcher;

/// Counters reported by `/health`
#[derive(Debug, Clone)]
pub struct ServiceStats {
    pub requests_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            errors_total: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }
}

/// How the token cookie is named and flagged.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

impl CookieSettings {
    /// `Set-Cookie` value carrying `token`. Always HTTP-only: scripts never
    /// need to read the token.
    pub fn set_cookie(&self, token: &str) -> String {
        let mut value = format!("{}={token}; Path=/; HttpOnly; SameSite=Lax", self.name);
        if self.secure {
            value.push_str("; Secure");
        }
        value
    }

    /// Value of this cookie in a `Cookie` request header, if present.
    pub fn read<'h>(&self, cookie_header: &'h str) -> Option<&'h str> {
        cookie_header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub token_secret: Arc<Secret<Vec<u8>>>,
    /// Origin prefixed to request paths to form callback URLs, no trailing slash
    pub public_url: Arc<str>,
    pub cookie: CookieSettings,
    pub stats: ServiceStats,
    pub prometheus: PrometheusHandle,
}
