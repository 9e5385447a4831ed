//! Back-office application state and its root reducer.

use super::Action;
use backoffice_shared::ProfileSummary;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const SESSION_LOGIN: &str = "session/login";
pub const SESSION_LOGOUT: &str = "session/logout";
pub const UI_TOGGLE_SIDEBAR: &str = "ui/toggle-sidebar";
pub const UI_SET_THEME: &str = "ui/set-theme";
pub const UI_ROUTE_CHANGED: &str = "ui/route-changed";
pub const CACHE_PUT: &str = "cache/put";
pub const CACHE_EVICT: &str = "cache/evict";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
    pub sidebar_open: bool,
    pub theme: Theme,
    pub last_route: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            theme: Theme::default(),
            last_route: None,
        }
    }
}

/// Everything the client keeps across reloads.
///
/// Tokens never live here; they belong to the credential store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationState {
    pub session: Option<ProfileSummary>,
    pub ui: UiState,
    /// Named domain caches (client lists, account lookups, ...)
    pub cache: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct CacheEntry {
    name: String,
    #[serde(default)]
    value: Value,
}

fn payload<T: serde::de::DeserializeOwned>(action: &Action) -> Option<T> {
    let value = action.payload.clone()?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(action = %action.kind, error = %e, "ignoring malformed payload");
            None
        }
    }
}

/// Root reducer. Unknown actions (including `INIT`/`UPDATE`) leave the state as is.
pub fn app_reducer(state: &ApplicationState, action: &Action) -> ApplicationState {
    match action.kind.as_str() {
        SESSION_LOGIN => match payload::<ProfileSummary>(action) {
            Some(profile) => ApplicationState {
                session: Some(profile),
                ..state.clone()
            },
            None => state.clone(),
        },
        // Cached domain data belongs to the previous user
        SESSION_LOGOUT => ApplicationState {
            session: None,
            cache: BTreeMap::new(),
            ui: state.ui.clone(),
        },
        UI_TOGGLE_SIDEBAR => {
            let mut next = state.clone();
            next.ui.sidebar_open = !next.ui.sidebar_open;
            next
        }
        UI_SET_THEME => match payload::<Theme>(action) {
            Some(theme) => {
                let mut next = state.clone();
                next.ui.theme = theme;
                next
            }
            None => state.clone(),
        },
        UI_ROUTE_CHANGED => match payload::<String>(action) {
            Some(path) => {
                let mut next = state.clone();
                next.ui.last_route = Some(path);
                next
            }
            None => state.clone(),
        },
        CACHE_PUT => match payload::<CacheEntry>(action) {
            Some(entry) => {
                let mut next = state.clone();
                next.cache.insert(entry.name, entry.value);
                next
            }
            None => state.clone(),
        },
        CACHE_EVICT => match payload::<String>(action) {
            Some(name) => {
                let mut next = state.clone();
                next.cache.remove(&name);
                next
            }
            None => state.clone(),
        },
        _ => state.clone(),
    }
}
