//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. Provider secrets
//! and the token signing secret are read from the environment (or a secret
//! file), never from the TOML directly, to avoid leaking them.

use common::Secret;
use serde::Deserialize;
use social_auth::constants::DEFAULT_GRAPH_API_VERSION;
use social_auth::{FacebookCredentials, ProviderConfig, TwitterCredentials};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub twitter: TwitterSection,
    #[serde(default)]
    pub facebook: FacebookSection,
    /// Key for every token this process signs or verifies
    #[serde(skip)]
    pub token_secret: Option<Secret<String>>,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Externally visible origin; callback URLs are this plus the request path
    pub public_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
    /// File holding the token signing secret (alternative to TOKEN_SECRET)
    #[serde(default)]
    pub token_secret_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TwitterSection {
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(skip)]
    pub consumer_secret: Option<Secret<String>>,
}

#[derive(Debug, Deserialize)]
pub struct FacebookSection {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(skip)]
    pub app_secret: Option<Secret<String>>,
    #[serde(default = "default_graph_api_version")]
    pub graph_api_version: String,
}

impl Default for FacebookSection {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            graph_api_version: default_graph_api_version(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_connections() -> usize {
    1000
}

fn default_cookie_name() -> String {
    "jwt".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

fn default_graph_api_version() -> String {
    DEFAULT_GRAPH_API_VERSION.to_string()
}

/// Non-empty value of an environment variable.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Token secret resolution order:
    /// 1. TOKEN_SECRET env var
    /// 2. token_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| common::Error::ReadConfig {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.server.public_url.starts_with("http://")
            && !config.server.public_url.starts_with("https://")
        {
            return Err(common::Error::invalid(
                "public_url",
                format!(
                    "must start with http:// or https://, got: {}",
                    config.server.public_url
                ),
            ));
        }

        if config.server.timeout_secs == 0 {
            return Err(common::Error::invalid("timeout_secs", "must be greater than 0"));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::invalid("max_connections", "must be greater than 0"));
        }

        if config.server.cookie_name.is_empty()
            || !config
                .server
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(common::Error::invalid(
                "cookie_name",
                format!(
                    "must be a non-empty token of [A-Za-z0-9_-], got: {:?}",
                    config.server.cookie_name
                ),
            ));
        }

        if let Some(key) = env_value("TWITTER_CONSUMER_KEY") {
            config.twitter.consumer_key = Some(key);
        }
        config.twitter.consumer_secret =
            env_value("TWITTER_CONSUMER_SECRET").and_then(Secret::non_empty);
        if let Some(id) = env_value("FACEBOOK_APP_ID") {
            config.facebook.app_id = Some(id);
        }
        config.facebook.app_secret = env_value("FACEBOOK_APP_SECRET").and_then(Secret::non_empty);
        if let Some(version) = env_value("FACEBOOK_GRAPH_API_VERSION") {
            config.facebook.graph_api_version = version;
        }

        if let Some(secret) = env_value("TOKEN_SECRET") {
            config.token_secret = Secret::non_empty(secret);
        } else if let Some(ref secret_file) = config.server.token_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|source| {
                common::Error::ReadSecret {
                    path: secret_file.clone(),
                    source,
                }
            })?;
            config.token_secret = Secret::non_empty(secret);
        }

        Ok(config)
    }

    /// Credentials handed to the dispatcher. Missing values stay `None`; the
    /// affected provider reports them when first used.
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            twitter: TwitterCredentials {
                consumer_key: self.twitter.consumer_key.clone(),
                consumer_secret: self.twitter.consumer_secret.clone(),
            },
            facebook: FacebookCredentials {
                app_id: self.facebook.app_id.clone(),
                app_secret: self.facebook.app_secret.clone(),
                graph_api_version: self.facebook.graph_api_version.clone(),
            },
        }
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("social-auth-gateway.toml")
    }
}
