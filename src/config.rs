use crate::error::ConfigError;
use backoffice_shared::protocol::ApiRequest;
use backoffice_shared::{HEADER_AUTH_TOKEN, LoginRequest, RefreshRequest};
use serde::Deserialize;
use std::path::PathBuf;

// =========================================================
// Defaults
// =========================================================

/// Used when neither the environment nor a config file defines a value
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_STATE_KEY: &str = "backoffice_state";
const DEFAULT_CREDENTIAL_KEY: &str = "backoffice_session";
const DEFAULT_STORAGE_DIR: &str = ".backoffice";

/// Runtime configuration of the client session layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Persistent store key of the application state snapshot
    pub state_key: String,
    /// Persistent store key of the credential
    pub credential_key: String,
    pub auth_header: String,
    /// Prefix of the header value (`Bearer`), empty to send the raw token
    pub auth_scheme: String,
    pub login_path: String,
    pub refresh_path: String,
    pub storage_dir: PathBuf,
    /// Total byte quota of the persistent store, unlimited when `None`
    pub storage_quota_bytes: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            state_key: DEFAULT_STATE_KEY.to_string(),
            credential_key: DEFAULT_CREDENTIAL_KEY.to_string(),
            auth_header: HEADER_AUTH_TOKEN.to_string(),
            auth_scheme: String::new(),
            login_path: LoginRequest::PATH.to_string(),
            refresh_path: RefreshRequest::PATH.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            storage_quota_bytes: None,
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

impl ClientConfig {
    /// Reads `BACKOFFICE_*` variables, falling back to the default of each field.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let storage_quota_bytes = match std::env::var("BACKOFFICE_STORAGE_QUOTA_BYTES") {
            Ok(raw) => Some(raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
                field: "storage_quota_bytes",
                reason: e.to_string(),
            })?),
            Err(_) => defaults.storage_quota_bytes,
        };

        let config = Self {
            api_base_url: env_or("BACKOFFICE_API_BASE_URL", defaults.api_base_url),
            state_key: env_or("BACKOFFICE_STATE_KEY", defaults.state_key),
            credential_key: env_or("BACKOFFICE_CREDENTIAL_KEY", defaults.credential_key),
            auth_header: env_or("BACKOFFICE_AUTH_HEADER", defaults.auth_header),
            auth_scheme: env_or("BACKOFFICE_AUTH_SCHEME", defaults.auth_scheme),
            login_path: env_or("BACKOFFICE_LOGIN_PATH", defaults.login_path),
            refresh_path: env_or("BACKOFFICE_REFRESH_PATH", defaults.refresh_path),
            storage_dir: std::env::var_os("BACKOFFICE_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            storage_quota_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON config file body. Missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.auth_header.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "auth_header",
                reason: "must not be empty".to_string(),
            });
        }
        // The hydration wrapper rewrites its key on every action.
        if self.state_key == self.credential_key {
            return Err(ConfigError::ConflictingKeys(self.state_key.clone()));
        }
        Ok(())
    }

    /// Joins `path` onto the API base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.api_base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}
