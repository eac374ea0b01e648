use std::env;
use std::fmt;

use thiserror::Error;
use url::Url;

/// Default PostgREST table holding one role row per account.
pub const DEFAULT_ROLE_TABLE: &str = "user_roles";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },
}

/// String holding a credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(***)")
    }
}

/// Process-wide settings, resolved once at cold start.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Supabase project, always ending in `/`.
    pub supabase_url: Url,
    /// Service role key used for admin and table calls.
    pub service_role_key: SecretString,
    /// Pre-shared secret callers present in `x-api-key`.
    pub api_secret: SecretString,
    pub role_table: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let raw_url = required("SUPABASE_URL")?;
        let mut supabase_url = Url::parse(raw_url.trim())
            .map_err(|source| ConfigError::InvalidUrl { name: "SUPABASE_URL", source })?;
        // Url::join drops the last path segment unless the base ends in a slash
        if !supabase_url.path().ends_with('/') {
            let path = format!("{}/", supabase_url.path());
            supabase_url.set_path(&path);
        }

        let role_table = lookup("ROLE_TABLE")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE_TABLE.to_string());

        Ok(Self {
            supabase_url,
            service_role_key: SecretString::new(required("SUPABASE_SERVICE_ROLE_KEY")?),
            api_secret: SecretString::new(required("MANAGE_USERS_SECRET")?),
            role_table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_normalizes_url_and_defaults_table() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ("MANAGE_USERS_SECRET", "shared-secret"),
        ]))
        .unwrap();

        assert_eq!(config.supabase_url.as_str(), "https://abc.supabase.co/");
        assert_eq!(config.role_table, "user_roles");
        assert_eq!(config.api_secret.expose(), "shared-secret");
    }

    #[test]
    fn test_from_lookup_keeps_path_prefix() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "http://localhost:54321/project"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ("MANAGE_USERS_SECRET", "shared-secret"),
            ("ROLE_TABLE", "staff_roles"),
        ]))
        .unwrap();

        assert_eq!(
            config.supabase_url.join("auth/v1/admin/users").unwrap().as_str(),
            "http://localhost:54321/project/auth/v1/admin/users"
        );
        assert_eq!(config.role_table, "staff_roles");
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ("MANAGE_USERS_SECRET", "   "),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Missing("MANAGE_USERS_SECRET")));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "not a url"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ("MANAGE_USERS_SECRET", "shared-secret"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidUrl { name: "SUPABASE_URL", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let secret = SecretString::new("hunter2");
        assert_eq!(format!("{:?}", secret), "SecretString(***)");
    }
}
