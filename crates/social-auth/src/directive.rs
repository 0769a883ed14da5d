//! Transport-agnostic result of a dispatch

/// What the HTTP adapter must do next.
///
/// The variants make "redirect without a URL" or "complete without a user"
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Send the user agent to `redirect_url` (HTTP 302). When
    /// `issued_token` is present it replaces the client's stored token.
    Redirect {
        redirect_url: String,
        issued_token: Option<String>,
    },
    /// The flow finished (HTTP 200). `issued_token` is a signed identity
    /// token the adapter must store in place of any prior one.
    Complete {
        issued_token: String,
        user_id: String,
        user_name: Option<String>,
    },
}

impl Directive {
    pub fn status(&self) -> u16 {
        match self {
            Directive::Redirect { .. } => 302,
            Directive::Complete { .. } => 200,
        }
    }

    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Directive::Redirect { redirect_url, .. } => Some(redirect_url),
            Directive::Complete { .. } => None,
        }
    }

    pub fn issued_token(&self) -> Option<&str> {
        match self {
            Directive::Redirect { issued_token, .. } => issued_token.as_deref(),
            Directive::Complete { issued_token, .. } => Some(issued_token),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Directive::Complete { user_id, .. } => Some(user_id),
            Directive::Redirect { .. } => None,
        }
    }

    pub fn user_name(&self) -> Option<&str> {
        match self {
            Directive::Complete { user_name, .. } => user_name.as_deref(),
            Directive::Redirect { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_accessors() {
        let d = Directive::Redirect {
            redirect_url: "https://x.example".into(),
            issued_token: None,
        };
        assert_eq!(d.status(), 302);
        assert_eq!(d.redirect_url(), Some("https://x.example"));
        assert_eq!(d.issued_token(), None);
        assert_eq!(d.user_id(), None);
        assert_eq!(d.user_name(), None);
    }

    #[test]
    fn complete_accessors() {
        let d = Directive::Complete {
            issued_token: "tok".into(),
            user_id: "987".into(),
            user_name: Some("test".into()),
        };
        assert_eq!(d.status(), 200);
        assert_eq!(d.redirect_url(), None);
        assert_eq!(d.issued_token(), Some("tok"));
        assert_eq!(d.user_id(), Some("987"));
        assert_eq!(d.user_name(), Some("test"));
    }
}
