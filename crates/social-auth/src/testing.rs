//! Scripted transport for provider tests

use std::sync::Mutex;

use provider::{BoxFuture, OutboundRequest, Transport, TransportError, TransportResponse};

/// Answers requests from a route table keyed by URL substring, recording
/// every request it sees. Unrouted requests fail as transport errors.
pub(crate) struct ScriptedTransport {
    routes: Vec<(String, TransportResponse)>,
    seen: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            routes: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Route with the providers' happy-path responses.
    pub(crate) fn valid() -> Self {
        Self::new()
            .route(
                "api.twitter.com/oauth/request_token",
                200,
                "oauth_token=foo&oauth_token_secret=bar&oauth_callback_confirmed=true",
            )
            .route(
                "api.twitter.com/oauth/access_token",
                200,
                "oauth_token=foo&oauth_token_secret=bar&user_id=987&screen_name=test",
            )
            .route(
                "/oauth/access_token?client_id",
                200,
                r#"{"access_token":"foobar","token_type":"bearer","expires_in":5117097}"#,
            )
            .route("graph.facebook.com/me?", 200, r#"{"id":"987","name":"test"}"#)
    }

    /// Add a route. Earlier routes win, so overrides go first.
    pub(crate) fn route(mut self, pattern: &str, status: u16, body: &str) -> Self {
        self.routes
            .push((pattern.to_string(), TransportResponse::new(status, body)));
        self
    }

    /// Put a route ahead of everything registered so far.
    pub(crate) fn override_route(mut self, pattern: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(0, (pattern.to_string(), TransportResponse::new(status, body)));
        self
    }

    pub(crate) fn requests(&self) -> Vec<OutboundRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(
        &self,
        request: OutboundRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        let answer = self
            .routes
            .iter()
            .find(|(pattern, _)| request.url.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| TransportError(format!("no route for {}", request.url)));
        self.seen.lock().unwrap().push(request);
        Box::pin(async move { answer })
    }
}
