//! Provider endpoints
//!
//! Fixed by the providers' public APIs; only the Graph API version is
//! configurable.

/// Twitter OAuth1 request-token endpoint (first leg)
pub const TWITTER_REQUEST_TOKEN_ENDPOINT: &str = "https://api.twitter.com/oauth/request_token";

/// Twitter authorization page the user is redirected to (second leg)
pub const TWITTER_AUTHENTICATE_ENDPOINT: &str = "https://api.twitter.com/oauth/authenticate";

/// Twitter OAuth1 access-token endpoint (third leg)
pub const TWITTER_ACCESS_TOKEN_ENDPOINT: &str = "https://api.twitter.com/oauth/access_token";

/// Facebook login dialog
pub const FACEBOOK_DIALOG_ENDPOINT: &str = "https://www.facebook.com/dialog/oauth";

/// Facebook Graph API root; the token endpoint is versioned beneath it
pub const FACEBOOK_GRAPH_ROOT: &str = "https://graph.facebook.com";

/// Graph API version used when none is configured
pub const DEFAULT_GRAPH_API_VERSION: &str = "v2.5";
