//! Social Auth Gateway
//!
//! Single-binary Rust service that:
//! 1. Serves `/auth/{provider}` login steps for Twitter and Facebook
//! 2. Keeps all in-flight OAuth state inside signed cookies
//! 3. Issues an identity token once the provider confirms the user

mod config;
mod error;
mod metrics;
mod routes;
mod state;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use common::Secret;
use provider::ReqwestTransport;
use rand::RngExt;
use social_auth::Dispatcher;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::routes::{auth_handler, health_handler, metrics_handler, whoami_handler};
use crate::state::{AppState, CookieSettings, ServiceStats};

/// Maximum time to wait for in-flight login steps after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Length of the signing secret generated when none is configured.
const GENERATED_SECRET_LEN: usize = 24;

/// Build the axum router with all routes and shared state.
///
/// Applies a concurrency limit layer based on `max_connections`.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/auth/{provider}", get(auth_handler))
        .route("/whoami", get(whoami_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// Configured signing secret, or a random one for this process only.
fn token_secret(config: &Config) -> Secret<Vec<u8>> {
    match &config.token_secret {
        Some(secret) => Secret::new(secret.as_bytes().to_vec()),
        None => {
            warn!(
                "no TOKEN_SECRET or token_secret_file configured; generated a random secret, \
                 tokens will not survive a restart"
            );
            let mut bytes = vec![0u8; GENERATED_SECRET_LEN];
            rand::rng().fill(bytes.as_mut_slice());
            Secret::new(bytes)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting social-auth-gateway");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install metrics recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        public_url = %config.server.public_url,
        twitter = config.twitter.consumer_key.is_some(),
        facebook = config.facebook.app_id.is_some(),
        graph_api_version = %config.facebook.graph_api_version,
        "configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.server.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let stats = ServiceStats::new();
    let app_state = AppState {
        dispatcher: Dispatcher::new(
            config.provider_config(),
            Arc::new(ReqwestTransport::new(client)),
        ),
        token_secret: Arc::new(token_secret(&config)),
        public_url: Arc::from(config.server.public_url.trim_end_matches('/')),
        cookie: CookieSettings {
            name: config.server.cookie_name.clone(),
            secure: config.server.secure_cookies,
        },
        stats: stats.clone(),
        prometheus: prometheus_handle,
    };

    let app = build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timeout starts when the shutdown signal fires: notify the
    // server to drain, then race the drain against the timeout.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    info!(
        requests_served = stats.requests_total.load(Ordering::Relaxed),
        errors_total = stats.errors_total.load(Ordering::Relaxed),
        "shutdown complete"
    );
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use metrics_exporter_prometheus::PrometheusHandle;
    use provider::{BoxFuture, OutboundRequest, Transport, TransportError, TransportResponse};
    use social_auth::{FacebookCredentials, ProviderConfig, TwitterCredentials};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"gateway-test-secret";

    /// Canned provider responses keyed by URL substring.
    struct StaticTransport {
        routes: Vec<(&'static str, u16, &'static str)>,
    }

    impl StaticTransport {
        fn valid() -> Self {
            Self {
                routes: vec![
                    (
                        "api.twitter.com/oauth/request_token",
                        200,
                        "oauth_token=foo&oauth_token_secret=bar&oauth_callback_confirmed=true",
                    ),
                    (
                        "api.twitter.com/oauth/access_token",
                        200,
                        "oauth_token=foo&oauth_token_secret=bar&user_id=987&screen_name=test",
                    ),
                    (
                        "/oauth/access_token?client_id",
                        200,
                        r#"{"access_token":"foobar","token_type":"bearer"}"#,
                    ),
                    ("graph.facebook.com/me?", 200, r#"{"id":"987","name":"test"}"#),
                ],
            }
        }

        fn failing() -> Self {
            Self {
                routes: vec![("api.twitter.com", 500, "oops")],
            }
        }
    }

    impl Transport for StaticTransport {
        fn execute(
            &self,
            request: OutboundRequest,
        ) -> BoxFuture<'_, std::result::Result<TransportResponse, TransportError>> {
            let answer = self
                .routes
                .iter()
                .find(|(pattern, _, _)| request.url.contains(pattern))
                .map(|(_, status, body)| TransportResponse::new(*status, *body))
                .ok_or_else(|| TransportError(format!("no route for {}", request.url)));
            Box::pin(async move { answer })
        }
    }

    /// Create a PrometheusHandle for tests without installing a global recorder.
    fn test_prometheus_handle() -> PrometheusHandle {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        recorder.handle()
    }

    fn configured() -> ProviderConfig {
        ProviderConfig {
            twitter: TwitterCredentials {
                consumer_key: Some("consumer-key".into()),
                consumer_secret: Secret::non_empty("consumer-secret"),
            },
            facebook: FacebookCredentials {
                app_id: Some("app-id".into()),
                app_secret: Secret::non_empty("app-secret"),
                ..FacebookCredentials::default()
            },
        }
    }

    fn test_app_state(config: ProviderConfig, transport: StaticTransport) -> AppState {
        AppState {
            dispatcher: Dispatcher::new(config, Arc::new(transport)),
            token_secret: Arc::new(Secret::new(SECRET.to_vec())),
            public_url: Arc::from("https://login.example.com"),
            cookie: CookieSettings {
                name: "jwt".into(),
                secure: true,
            },
            stats: ServiceStats::new(),
            prometheus: test_prometheus_handle(),
        }
    }

    fn app() -> Router {
        build_router(test_app_state(configured(), StaticTransport::valid()), 1000)
    }

    async fn get(app: Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = cookie {
            request = request.header(header::COOKIE, format!("theme=dark; jwt={token}"));
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Token value carried by the response's `Set-Cookie` header.
    fn issued_cookie(response: &Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("Set-Cookie header")
            .to_str()
            .unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Secure"));
        set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("jwt="))
            .unwrap()
            .to_string()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn twitter_login_round_trip() {
        let app = app();

        let response = get(app.clone(), "/auth/twitter?login=start", None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            "https://api.twitter.com/oauth/authenticate?oauth_token=foo"
        );
        let holder = issued_cookie(&response);
        assert_eq!(
            session_token::verify(&holder, SECRET).unwrap(),
            session_token::TokenPayload::OAuthSecretHolder { id: "bar".into() }
        );

        let response = get(
            app.clone(),
            "/auth/twitter?oauth_token=foo&oauth_verifier=v",
            Some(&holder),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let identity = issued_cookie(&response);
        let json = body_json(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["user_name"], "test");

        let response = get(app, "/whoami", Some(&identity)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["user_id"], "987");
    }

    #[tokio::test]
    async fn facebook_login_round_trip() {
        let app = app();

        let response = get(app.clone(), "/auth/facebook?login=start", None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(
            location(&response),
            "https://www.facebook.com/dialog/oauth?client_id=app-id\
             &redirect_uri=https%3A%2F%2Flogin.example.com%2Fauth%2Ffacebook"
        );

        let response = get(app, "/auth/facebook?code=abc", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let identity = issued_cookie(&response);
        assert_eq!(
            session_token::verify(&identity, SECRET).unwrap(),
            session_token::TokenPayload::Identity {
                user_id: "987".into()
            }
        );
        assert_eq!(body_json(response).await["user_name"], "test");
    }

    #[tokio::test]
    async fn unsupported_provider_is_400() {
        let response = get(app(), "/auth/github?login=start", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["title"], "Provider not supported: github");
    }

    #[tokio::test]
    async fn unrecognised_query_is_400() {
        let response = get(app(), "/auth/twitter?foo=bar", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["title"], "Invalid request");
    }

    #[tokio::test]
    async fn twitter_callback_without_cookie_is_400() {
        let response = get(app(), "/auth/twitter?oauth_token=foo&oauth_verifier=v", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["title"], "No token cookie given");
    }

    #[tokio::test]
    async fn garbled_cookie_is_400() {
        for garbage in ["foobar", "not.a.token"] {
            let response = get(
                app(),
                "/auth/twitter?oauth_token=foo&oauth_verifier=v",
                Some(garbage),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{garbage}");
            let json = body_json(response).await;
            assert_eq!(json["errors"][0]["status"], 400);
            assert_eq!(
                json["errors"][0]["title"],
                "Failed to retrieve oauth_token_secret from token"
            );
        }
    }

    #[tokio::test]
    async fn malformed_query_gets_error_document() {
        let response = get(app(), "/auth/twitter?login=%FF%FE&%zz", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(content_type, "application/json");
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["status"], 400);
        assert_eq!(json["errors"][0]["title"], "Invalid request");
    }

    #[tokio::test]
    async fn forged_cookie_is_opaque_500() {
        let forged = session_token::sign(
            &session_token::TokenPayload::OAuthSecretHolder { id: "bar".into() },
            b"someone-else",
        )
        .unwrap();
        let response = get(
            app(),
            "/auth/twitter?oauth_token=foo&oauth_verifier=v",
            Some(&forged),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["title"], "Internal Server Error");
    }

    #[tokio::test]
    async fn missing_configuration_is_500() {
        let state = test_app_state(ProviderConfig::default(), StaticTransport::valid());
        let response = get(build_router(state, 1000), "/auth/facebook?login=start", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn upstream_failure_counts_as_error() {
        let state = test_app_state(configured(), StaticTransport::failing());
        let stats = state.stats.clone();
        let app = build_router(state, 1000);

        let response = get(app.clone(), "/auth/twitter?login=start", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(get(app, "/health", None).await).await;
        assert_eq!(json["requests_served"], 1);
        assert_eq!(json["errors_total"], 1);
        assert_eq!(stats.errors_total.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn whoami_rejects_missing_and_holder_tokens() {
        let response = get(app(), "/whoami", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let holder = session_token::sign(
            &session_token::TokenPayload::OAuthSecretHolder { id: "bar".into() },
            SECRET,
        )
        .unwrap();
        let response = get(app(), "/whoami", Some(&holder)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = get(app(), "/whoami", Some("not-a-token")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["errors"][0]["status"], 401);
    }

    #[tokio::test]
    async fn health_endpoint_returns_json() {
        let state = test_app_state(configured(), StaticTransport::valid());
        state.stats.requests_total.fetch_add(5, Ordering::Relaxed);

        let response = get(build_router(state, 1000), "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["requests_served"], 5);
        assert!(json["uptime_seconds"].is_u64());
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_prometheus_format() {
        let response = get(app(), "/metrics", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.contains("text/plain"));
    }

    #[test]
    fn configured_token_secret_is_used() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen_addr = "127.0.0.1:0"
            public_url = "https://login.example.com"
            "#,
        )
        .unwrap();
        let generated = token_secret(&config);
        assert_eq!(generated.as_bytes().len(), GENERATED_SECRET_LEN);

        let config = Config {
            token_secret: Secret::non_empty("configured"),
            ..config
        };
        assert_eq!(token_secret(&config).as_bytes(), b"configured");
    }
}
