use serde::{Deserialize, Serialize};
use thiserror::Error;

// =========================================================
// Error taxonomy
// =========================================================

/// Failure classes seen by the client.
///
/// Persistence kinds are absorbed where they happen and only show up in logs.
/// The HTTP kinds always reach the original caller and are mirrored to the
/// notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Snapshot missing, corrupt or storage inaccessible
    PersistenceRead,
    /// Quota or serialization failure on write-back
    PersistenceWrite,
    /// 401: credential rejected, recovery not attempted yet
    AuthenticationRejected,
    /// 401 after the refresh path was exhausted
    SessionExpired,
    /// 4xx other than 401
    RequestRejected,
    /// 5xx
    ServerFailure,
    /// No HTTP response at all
    NetworkFailure,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::AuthenticationRejected | ErrorKind::SessionExpired => 401,
            ErrorKind::RequestRejected => 400,
            ErrorKind::ServerFailure => 500,
            ErrorKind::PersistenceRead | ErrorKind::PersistenceWrite | ErrorKind::NetworkFailure => 0,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::PersistenceRead => "PERSISTENCE_READ",
            ErrorKind::PersistenceWrite => "PERSISTENCE_WRITE",
            ErrorKind::AuthenticationRejected => "AUTHENTICATION_REJECTED",
            ErrorKind::SessionExpired => "SESSION_EXPIRED",
            ErrorKind::RequestRejected => "REQUEST_REJECTED",
            ErrorKind::ServerFailure => "SERVER_FAILURE",
            ErrorKind::NetworkFailure => "NETWORK_FAILURE",
        }
    }

    /// Message shown when the backend did not send one.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::PersistenceRead => "Saved data could not be read",
            ErrorKind::PersistenceWrite => "Data could not be saved locally",
            ErrorKind::AuthenticationRejected => "Authentication required",
            ErrorKind::SessionExpired => "Your session has expired, please sign in again",
            ErrorKind::RequestRejected => "The request was rejected",
            ErrorKind::ServerFailure => "The server could not complete the request",
            ErrorKind::NetworkFailure => "The server could not be reached",
        }
    }
}

// =========================================================
// Storage errors
// =========================================================

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("quota exceeded writing '{key}': {size} bytes over a limit of {limit}")]
    QuotaExceeded { key: String, size: usize, limit: usize },
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Unavailable(e.to_string())
    }
}

/// Failure moving a typed value in or out of the persistent store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =========================================================
// HTTP errors
// =========================================================

#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// The server answered with a non-2xx status
    #[error("{method} {url} failed with status {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    /// The refresh path could not recover a rejected credential
    #[error("session expired: {0}")]
    SessionExpired(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request build failed: {0}")]
    InvalidRequest(String),
    #[error("response decode failed: {0}")]
    Decode(String),
}

impl HttpError {
    /// HTTP status, `0` when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            HttpError::Status { status, .. } => *status,
            HttpError::SessionExpired(_) => 401,
            HttpError::Network(_) | HttpError::InvalidRequest(_) | HttpError::Decode(_) => 0,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, HttpError::Status { status: 401, .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpError::Status { status: 401, .. } => ErrorKind::AuthenticationRejected,
            HttpError::Status { status, .. } if *status >= 500 => ErrorKind::ServerFailure,
            HttpError::Status { .. } => ErrorKind::RequestRejected,
            HttpError::SessionExpired(_) => ErrorKind::SessionExpired,
            HttpError::Network(_) => ErrorKind::NetworkFailure,
            // Nothing reached the server or the body was unusable
            HttpError::InvalidRequest(_) => ErrorKind::RequestRejected,
            HttpError::Decode(_) => ErrorKind::ServerFailure,
        }
    }

    /// Response body, when the server sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            HttpError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type HttpResult<T> = std::result::Result<T, HttpError>;

// =========================================================
// Config errors
// =========================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("state_key and credential_key must differ (both are '{0}')")]
    ConflictingKeys(String),
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

// =========================================================
// Session errors
// =========================================================

/// Failure assembling a client.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure of a session operation (login).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("session could not be persisted: {0}")]
    Persistence(#[from] PersistenceError),
}
