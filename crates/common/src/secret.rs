//! Redacting wrapper for credentials and signing keys

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value - redacted in Debug/Display/logs, zeroed on drop
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Wrap a credential read from config or environment.
    ///
    /// Surrounding whitespace is trimmed and blank values yield `None`, so an
    /// exported-but-empty variable counts as unset.
    pub fn non_empty(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Secret<Vec<u8>> {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_are_redacted() {
        let secret = Secret::new(String::from("consumer-secret"));
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn expose_returns_inner_value() {
        let secret = Secret::new(String::from("consumer-secret"));
        assert_eq!(secret.expose(), "consumer-secret");
        assert_eq!(secret.as_bytes(), b"consumer-secret");
    }

    #[test]
    fn non_empty_trims_and_rejects_blank() {
        assert!(Secret::non_empty("").is_none());
        assert!(Secret::non_empty("   \n").is_none());
        let secret = Secret::non_empty("  abc\n").unwrap();
        assert_eq!(secret.expose(), "abc");
    }

    #[test]
    fn byte_secrets_expose_bytes() {
        let secret = Secret::new(vec![1u8, 2, 3]);
        assert_eq!(secret.as_bytes(), &[1, 2, 3]);
    }
}
