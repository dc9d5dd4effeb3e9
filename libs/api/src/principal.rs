//! API credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The identity requests are signed as: an API key and its secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    api_key: String,
    secret_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl Principal {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            label: None,
        }
    }

    /// Attach a human label (usually the user or account name) for logs.
    #[must_use]
    pub fn named(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Label when set, otherwise a short prefix of the API key.
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => {
                let prefix: String = self.api_key.chars().take(8).collect();
                format!("{prefix}...")
            }
        }
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("label", &self.label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let p = Principal::new("key-123", "very-secret").named("admin");
        let debug = format!("{p:?}");
        assert!(debug.contains("key-123"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_display_name_falls_back_to_key_prefix() {
        let p = Principal::new("abcdefghijklmnop", "s");
        assert_eq!(p.display_name(), "abcdefgh...");
        assert_eq!(p.named("user1").display_name(), "user1");
    }
}
