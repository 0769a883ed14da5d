//! Shared call-and-check for provider endpoints

use provider::{Error, OutboundRequest, Result, Transport};
use tracing::warn;

/// Execute `request` and return the body of a 200 response.
///
/// Transport failures and any other status surface as provider errors
/// immediately; there is no retry.
pub(crate) async fn fetch(
    transport: &dyn Transport,
    request: OutboundRequest,
    provider: &'static str,
) -> Result<String> {
    let response = transport.execute(request).await.map_err(|e| {
        warn!(provider, error = %e, "provider unreachable");
        Error::Provider(format!("{e} talking to {provider}"))
    })?;

    if response.status != 200 {
        warn!(provider, status = response.status, "provider rejected request");
        return Err(Error::upstream_status(response.status, provider));
    }
    Ok(response.body)
}
