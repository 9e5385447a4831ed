//! Session and request layer of the back-office client.
//!
//! Application state lives in a [`state::Store`] whose reducer is wrapped by
//! [`state::hydration::Hydrated`], so it is restored from a
//! [`storage::PersistentStore`] on start. Tokens live in a
//! [`credential::CredentialStore`]. Every API call goes through a
//! [`pipeline::Pipeline`] that attaches the token, recovers once from a 401
//! and reports failures, while [`router::Router`] keeps signed-out users on
//! the login page. [`session::BackOffice`] wires all of it together.

pub mod config;
pub mod credential;
pub mod error;
pub mod guard;
pub mod loading;
pub mod notify;
pub mod pipeline;
pub mod request;
pub mod route;
pub mod router;
pub mod session;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;

pub use config::ClientConfig;
pub use credential::{Credential, CredentialStore};
pub use error::{ErrorKind, HttpError, HttpResult, SessionError, SetupError};
pub use loading::{LoadingHandle, LoadingIndicator};
pub use notify::{Notification, NotificationSink};
pub use request::{HttpRequest, HttpResponse, Transport};
pub use route::AppRoute;
pub use session::{BackOffice, BackOfficeBuilder};
pub use state::{Action, Reducer, Store};
pub use storage::{FileStore, MemoryStore, PersistentStore};
