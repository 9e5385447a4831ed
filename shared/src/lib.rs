use serde::{Deserialize, Serialize};

pub mod protocol;

// =========================================================
// Constants
// =========================================================

pub const HEADER_AUTH_TOKEN: &str = "X-Auth-Token";
pub const HEADER_REQUEST_ID: &str = "X-Request-Id";

// =========================================================
// Domain Models
// =========================================================

/// Session profile returned by the login endpoint.
///
/// `client_active` is `None` for users (staff, auditors) for whom the
/// client-activation concept does not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub full_name: String,
    pub email: String,
    pub role_code: String,
    pub token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub client_active: Option<bool>,
}

impl SessionProfile {
    /// Profile fields that are safe to keep in the application state.
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role_code: self.role_code.clone(),
            client_active: self.client_active,
        }
    }
}

/// Token-free view of a [`SessionProfile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub full_name: String,
    pub email: String,
    pub role_code: String,
    #[serde(default)]
    pub client_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    /// Some backends rotate the refresh token, others keep the old one.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Error body the backend attaches to non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
