//! Prometheus metrics exposition
//!
//! - `auth_requests_total` (counter): labels `provider`, `outcome`
//! - `auth_request_duration_seconds` (histogram): label `provider`

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const DURATION_METRIC: &str = "auth_request_duration_seconds";

/// Bucket boundaries from 5ms to 30s; a step makes at most two sequential
/// provider calls.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(DURATION_METRIC.to_string()), DURATION_BUCKETS)
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// How a login step ended, for the `outcome` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Redirect,
    Complete,
    UsageError,
    ProviderError,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Redirect => "redirect",
            Outcome::Complete => "complete",
            Outcome::UsageError => "usage_error",
            Outcome::ProviderError => "provider_error",
        }
    }
}

/// Record a finished login step.
///
/// Unknown provider names are folded into `unsupported` so clients cannot
/// grow label cardinality.
pub fn record_auth(provider: &str, outcome: Outcome, duration_secs: f64) {
    let provider = match provider.parse::<social_auth::ProviderKind>() {
        Ok(kind) => kind.as_str(),
        Err(_) => "unsupported",
    };
    metrics::counter!("auth_requests_total", "provider" => provider, "outcome" => outcome.as_str())
        .increment(1);
    metrics::histogram!(DURATION_METRIC, "provider" => provider).record(duration_secs);
}
