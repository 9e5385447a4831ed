//! Route definitions
//!
//! Pure domain model of the client's routes and which of them require an
//! authenticated session. Nothing here touches navigation.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// Login page (default route)
    #[default]
    Login,
    Dashboard,
    Clients,
    Accounts,
    NotFound,
}

impl AppRoute {
    /// Parses a URL path, ignoring query string and trailing slash.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        match path {
            "/" | "/login" => Self::Login,
            "/dashboard" => Self::Dashboard,
            "/clients" => Self::Clients,
            "/accounts" => Self::Accounts,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::Clients => "/clients",
            Self::Accounts => "/accounts",
            Self::NotFound => "/404",
        }
    }

    /// Routes that are consulted through the route guard.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Dashboard | Self::Clients | Self::Accounts)
    }

    /// Authenticated users are sent away from these.
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login)
    }

    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    pub fn auth_success_redirect() -> Self {
        Self::Dashboard
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}
