//! Credentials for the naming endpoint.
//!
//! Two values are required when naming is enabled: a chat session id and an
//! authorization header value. They are read from the process environment
//! (`CHAT_ID`, `AUTHORIZATION`), which the binary first populates from a
//! `.env` file, and validated here so the pipeline never sees bad input.

use thiserror::Error;

/// Environment variable holding the chat session id.
pub const CHAT_ID_VAR: &str = "CHAT_ID";

/// Environment variable holding the authorization value.
pub const AUTHORIZATION_VAR: &str = "AUTHORIZATION";

/// Environment variable overriding the naming endpoint base URL.
pub const NAMING_ENDPOINT_VAR: &str = "NAMING_ENDPOINT";

/// Default naming endpoint base URL.
pub const DEFAULT_NAMING_ENDPOINT: &str = "https://kimi.moonshot.cn";

/// Required length of a chat session id.
const CHAT_ID_LEN: usize = 20;

/// Required prefix of the authorization value.
const BEARER_PREFIX: &str = "Bearer ";

/// Errors from loading naming settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// A required variable is unset or empty.
    #[error("missing required setting {name} (set it in the environment or .env)")]
    Missing {
        /// Variable name.
        name: &'static str,
    },

    /// The chat id is not 20 alphanumeric characters.
    #[error("invalid {CHAT_ID_VAR}: expected {CHAT_ID_LEN} alphanumeric characters, got {len} characters")]
    InvalidChatId {
        /// Length of the rejected value.
        len: usize,
    },

    /// The authorization value is not a bearer credential.
    #[error("invalid {AUTHORIZATION_VAR}: value must start with \"{BEARER_PREFIX}\"")]
    InvalidAuthorization,
}

/// Validated naming endpoint settings.
#[derive(Clone, PartialEq, Eq)]
pub struct NamingSettings {
    endpoint: String,
    chat_id: String,
    authorization: String,
}

impl std::fmt::Debug for NamingSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamingSettings")
            .field("endpoint", &self.endpoint)
            .field("chat_id", &self.chat_id)
            .field("authorization", &"<redacted>")
            .finish()
    }
}

impl NamingSettings {
    /// Validates and creates settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the chat id is not exactly 20 ASCII
    /// alphanumerics or the authorization value lacks the `Bearer ` prefix.
    pub fn new(
        endpoint: impl Into<String>,
        chat_id: impl Into<String>,
        authorization: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        let chat_id = chat_id.into();
        if chat_id.is_empty() {
            return Err(SettingsError::Missing { name: CHAT_ID_VAR });
        }
        if chat_id.len() != CHAT_ID_LEN || !chat_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SettingsError::InvalidChatId {
                len: chat_id.chars().count(),
            });
        }

        let authorization = authorization.into();
        if authorization.is_empty() {
            return Err(SettingsError::Missing {
                name: AUTHORIZATION_VAR,
            });
        }
        if !authorization.starts_with(BEARER_PREFIX) {
            return Err(SettingsError::InvalidAuthorization);
        }

        let endpoint: String = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() {
            DEFAULT_NAMING_ENDPOINT.to_string()
        } else {
            endpoint.trim().trim_end_matches('/').to_string()
        };

        Ok(Self {
            endpoint,
            chat_id,
            authorization,
        })
    }

    /// Loads settings from the process environment.
    ///
    /// `endpoint` overrides [`NAMING_ENDPOINT_VAR`] when given.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if a variable is missing or invalid.
    pub fn from_env(endpoint: Option<&str>) -> Result<Self, SettingsError> {
        Self::from_lookup(endpoint, |name| std::env::var(name).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if a variable is missing or invalid.
    pub fn from_lookup<F>(endpoint: Option<&str>, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(SettingsError::Missing { name })
        };
        let chat_id = require(CHAT_ID_VAR)?;
        let authorization = require(AUTHORIZATION_VAR)?;
        let endpoint = endpoint
            .map(str::to_string)
            .or_else(|| lookup(NAMING_ENDPOINT_VAR))
            .unwrap_or_else(|| DEFAULT_NAMING_ENDPOINT.to_string());

        Self::new(endpoint, chat_id, authorization)
    }

    /// Returns the endpoint base URL (no trailing slash).
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the chat session id.
    #[must_use]
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Returns the authorization header value.
    #[must_use]
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// Returns the streaming completion URL for this chat session.
    #[must_use]
    pub fn completion_url(&self) -> String {
        format!(
            "{}/api/chat/{}/completion/stream",
            self.endpoint, self.chat_id
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const CHAT_ID: &str = "abcdefghij0123456789";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_valid() {
        let settings = NamingSettings::from_lookup(
            None,
            lookup_from(&[(CHAT_ID_VAR, CHAT_ID), (AUTHORIZATION_VAR, "Bearer tok")]),
        )
        .unwrap();
        assert_eq!(settings.chat_id(), CHAT_ID);
        assert_eq!(settings.authorization(), "Bearer tok");
        assert_eq!(settings.endpoint(), DEFAULT_NAMING_ENDPOINT);
        assert_eq!(
            settings.completion_url(),
            format!("https://kimi.moonshot.cn/api/chat/{CHAT_ID}/completion/stream")
        );
    }

    #[test]
    fn test_from_lookup_endpoint_override_wins() {
        let settings = NamingSettings::from_lookup(
            Some("http://127.0.0.1:9000/"),
            lookup_from(&[
                (CHAT_ID_VAR, CHAT_ID),
                (AUTHORIZATION_VAR, "Bearer tok"),
                (NAMING_ENDPOINT_VAR, "http://ignored"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.endpoint(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_from_lookup_endpoint_from_env() {
        let settings = NamingSettings::from_lookup(
            None,
            lookup_from(&[
                (CHAT_ID_VAR, CHAT_ID),
                (AUTHORIZATION_VAR, "Bearer tok"),
                (NAMING_ENDPOINT_VAR, "http://naming.local"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.endpoint(), "http://naming.local");
    }

    #[test]
    fn test_missing_chat_id() {
        let result =
            NamingSettings::from_lookup(None, lookup_from(&[(AUTHORIZATION_VAR, "Bearer tok")]));
        assert_eq!(result, Err(SettingsError::Missing { name: CHAT_ID_VAR }));
    }

    #[test]
    fn test_missing_authorization() {
        let result = NamingSettings::from_lookup(None, lookup_from(&[(CHAT_ID_VAR, CHAT_ID)]));
        assert_eq!(
            result,
            Err(SettingsError::Missing {
                name: AUTHORIZATION_VAR
            })
        );
    }

    #[test]
    fn test_chat_id_wrong_length() {
        let result = NamingSettings::new(DEFAULT_NAMING_ENDPOINT, "short", "Bearer tok");
        assert_eq!(result, Err(SettingsError::InvalidChatId { len: 5 }));
    }

    #[test]
    fn test_chat_id_non_alphanumeric() {
        let result =
            NamingSettings::new(DEFAULT_NAMING_ENDPOINT, "abcdefghij-123456789", "Bearer tok");
        assert_eq!(result, Err(SettingsError::InvalidChatId { len: 20 }));
    }

    #[test]
    fn test_authorization_without_bearer() {
        let result = NamingSettings::new(DEFAULT_NAMING_ENDPOINT, CHAT_ID, "Token abc");
        assert_eq!(result, Err(SettingsError::InvalidAuthorization));
    }

    #[test]
    fn test_debug_redacts_authorization() {
        let settings = NamingSettings::new(DEFAULT_NAMING_ENDPOINT, CHAT_ID, "Bearer secret").unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret"), "debug leaked credential: {debug}");
    }
}
