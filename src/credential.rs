//! Credential store
//!
//! Owns the access/refresh token pair. A new credential is written to the
//! persistent store before it becomes visible, so a token returned by
//! [`CredentialStore::get_token`] after sign-in survives a restart. A
//! renewal is visible even if that write fails.

use crate::error::{PersistenceError, StorageError};
use crate::storage::{PersistentStore, load_json, save_json};
use backoffice_shared::SessionProfile;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub token: String,
    pub refresh_token: String,
    #[serde(default, alias = "clienteActivo")]
    pub client_active: Option<bool>,
}

impl Credential {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: refresh_token.into(),
            client_active: None,
        }
    }
}

impl From<&SessionProfile> for Credential {
    fn from(profile: &SessionProfile) -> Self {
        Self {
            token: profile.token.clone(),
            refresh_token: profile.refresh_token.clone(),
            client_active: profile.client_active,
        }
    }
}

pub struct CredentialStore {
    store: Rc<dyn PersistentStore>,
    key: String,
    current: RefCell<Option<Credential>>,
}

impl CredentialStore {
    /// Loads the persisted credential, if any. An unreadable credential is
    /// treated as absent.
    pub fn new(store: Rc<dyn PersistentStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let current = match load_json::<Credential>(store.as_ref(), &key) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "persisted credential unreadable, starting signed out");
                None
            }
        };
        Self {
            store,
            key,
            current: RefCell::new(current),
        }
    }

    pub fn get_token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|c| c.token.clone())
    }

    /// `None` when there is no credential or its refresh token is empty.
    pub fn refresh_token(&self) -> Option<String> {
        self.current
            .borrow()
            .as_ref()
            .map(|c| c.refresh_token.clone())
            .filter(|t| !t.is_empty())
    }

    pub fn credential(&self) -> Option<Credential> {
        self.current.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Persists `credential`, then makes it current. On error the previous
    /// credential stays in effect.
    pub fn set_credential(&self, credential: Credential) -> Result<(), PersistenceError> {
        save_json(self.store.as_ref(), &self.key, &credential)?;
        tracing::debug!(key = %self.key, "credential stored");
        *self.current.borrow_mut() = Some(credential);
        Ok(())
    }

    /// Replaces the access token, and the refresh token when one is given,
    /// keeping the other fields.
    ///
    /// The renewed credential is current even when the write fails: the
    /// previous token has already been rejected. The error then means the
    /// renewal is lost on restart.
    pub fn renew(
        &self,
        token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Result<(), PersistenceError> {
        let mut next = self
            .credential()
            .unwrap_or_else(|| Credential::new(String::new(), String::new()));
        next.token = token.into();
        if let Some(refresh_token) = refresh_token {
            next.refresh_token = refresh_token;
        }
        *self.current.borrow_mut() = Some(next.clone());
        save_json(self.store.as_ref(), &self.key, &next)?;
        tracing::debug!(key = %self.key, "credential renewed");
        Ok(())
    }

    /// Forgets the credential. The in-memory copy is always dropped; the
    /// error reports a persisted copy that could not be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.current.borrow_mut().take();
        self.store.remove(&self.key)?;
        tracing::debug!(key = %self.key, "credential cleared");
        Ok(())
    }
}
