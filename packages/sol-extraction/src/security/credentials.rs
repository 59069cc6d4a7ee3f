//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of sensitive values.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::error::{ExtractionError, Result};

/// Environment variable consulted when no key is passed explicitly.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API request).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Pick the API key: the explicit value if given, else the environment.
///
/// A missing or blank key is a configuration error, raised before any
/// document is touched.
pub fn resolve_api_key(explicit: Option<&str>) -> Result<SecretString> {
    let from_env = std::env::var(API_KEY_ENV).ok();
    resolve_from(explicit, from_env.as_deref())
}

fn resolve_from(explicit: Option<&str>, from_env: Option<&str>) -> Result<SecretString> {
    explicit
        .or(from_env)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(SecretString::new)
        .ok_or_else(|| {
            ExtractionError::Configuration(format!(
                "no API key: pass --api-key or set {API_KEY_ENV}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug_or_display() {
        let secret = SecretString::new("sk-super-secret-key");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
        assert_eq!(secret.expose(), "sk-super-secret-key");
    }

    #[test]
    fn test_explicit_key_wins() {
        let key = resolve_from(Some("sk-cli"), Some("sk-env")).unwrap();
        assert_eq!(key.expose(), "sk-cli");

        let key = resolve_from(None, Some(" sk-env ")).unwrap();
        assert_eq!(key.expose(), "sk-env");
    }

    #[test]
    fn test_missing_or_blank_key_is_configuration_error() {
        assert!(matches!(
            resolve_from(None, None),
            Err(ExtractionError::Configuration(_))
        ));
        assert!(matches!(
            resolve_from(Some("   "), None),
            Err(ExtractionError::Configuration(_))
        ));
    }
}
