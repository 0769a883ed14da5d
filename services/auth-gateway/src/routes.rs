//! HTTP handlers
//!
//! `/auth/{provider}` maps a `Directive` onto HTTP: redirects become 302 with
//! `Location`, completions become 200 JSON, and any issued token is stored
//! as an HTTP-only cookie replacing the previous one.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use provider::{Error, FaultKind};
use session_token::TokenPayload;
use social_auth::Directive;
use tracing::{debug, error, instrument};

use crate::error::{ApiError, error_document};
use crate::metrics::{self, Outcome};
use crate::state::{AppState, CookieSettings};

/// `GET /auth/{provider}`: one step of a login flow.
pub async fn auth_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            debug!(error = %rejection, "undecodable query string");
            state.stats.requests_total.fetch_add(1, Ordering::Relaxed);
            state.stats.errors_total.fetch_add(1, Ordering::Relaxed);
            metrics::record_auth(&provider, Outcome::UsageError, 0.0);
            return ApiError(Error::InvalidRequest).into_response();
        }
    };
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    authenticate(&state, &provider, uri.path(), &query, &headers, request_id).await
}

#[instrument(skip_all, fields(request_id = %request_id, provider = %provider))]
pub async fn authenticate(
    state: &AppState,
    provider: &str,
    path: &str,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
    request_id: String,
) -> Response {
    state.stats.requests_total.fetch_add(1, Ordering::Relaxed);
    let started = Instant::now();

    let callback_url = format!("{}{}", state.public_url, path);
    let token = request_token(headers, &state.cookie);
    debug!(callback_url = %callback_url, has_token = token.is_some(), "dispatching");

    let result = state
        .dispatcher
        .handle(
            provider,
            &callback_url,
            query,
            state.token_secret.as_bytes(),
            token,
        )
        .await;

    let (outcome, response) = match result {
        Ok(directive) => apply_directive(directive, &state.cookie),
        Err(err) => {
            state.stats.errors_total.fetch_add(1, Ordering::Relaxed);
            let outcome = match err.kind() {
                FaultKind::Usage => Outcome::UsageError,
                FaultKind::Provider => Outcome::ProviderError,
            };
            (outcome, ApiError(err).into_response())
        }
    };

    metrics::record_auth(provider, outcome, started.elapsed().as_secs_f64());
    response
}

fn request_token<'h>(headers: &'h HeaderMap, cookie: &CookieSettings) -> Option<&'h str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| cookie.read(header))
}

fn apply_directive(directive: Directive, cookie: &CookieSettings) -> (Outcome, Response) {
    match directive {
        Directive::Redirect {
            redirect_url,
            issued_token,
        } => {
            let Ok(location) = HeaderValue::try_from(redirect_url) else {
                error!("provider produced a redirect URL that is not a valid header value");
                return (
                    Outcome::ProviderError,
                    error_document(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
                );
            };
            let mut response = (StatusCode::FOUND, [(LOCATION, location)]).into_response();
            if let Some(token) = issued_token {
                attach_cookie(&mut response, cookie, &token);
            }
            (Outcome::Redirect, response)
        }
        Directive::Complete {
            issued_token,
            user_name,
            ..
        } => {
            let mut body = serde_json::json!({ "status": "success" });
            if let Some(name) = user_name {
                body["user_name"] = serde_json::Value::String(name);
            }
            let mut response = (
                StatusCode::OK,
                [(CONTENT_TYPE, "application/json")],
                body.to_string(),
            )
                .into_response();
            attach_cookie(&mut response, cookie, &issued_token);
            (Outcome::Complete, response)
        }
    }
}

fn attach_cookie(response: &mut Response, cookie: &CookieSettings, token: &str) {
    match HeaderValue::from_str(&cookie.set_cookie(token)) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => error!(error = %e, "issued token is not a valid cookie value"),
    }
}

/// `GET /whoami`: the user id behind the caller's identity token.
pub async fn whoami_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = request_token(&headers, &state.cookie) else {
        return error_document(StatusCode::UNAUTHORIZED, "No token cookie given");
    };

    match session_token::verify(token, state.token_secret.as_bytes()) {
        Ok(TokenPayload::Identity { user_id }) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "application/json")],
            serde_json::json!({ "user_id": user_id }).to_string(),
        )
            .into_response(),
        Ok(TokenPayload::OAuthSecretHolder { .. }) => {
            error_document(StatusCode::UNAUTHORIZED, "Login not complete")
        }
        Err(e) => {
            debug!(error = %e, "identity token rejected");
            error_document(StatusCode::UNAUTHORIZED, "Invalid token")
        }
    }
}

/// `GET /health`: uptime and request counters.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.stats.started_at.elapsed().as_secs(),
        "requests_served": state.stats.requests_total.load(Ordering::Relaxed),
        "errors_total": state.stats.errors_total.load(Ordering::Relaxed),
    });
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint, text exposition format.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.prometheus.render(),
    )
}
