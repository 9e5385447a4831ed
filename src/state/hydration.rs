//! Hydration wrapper
//!
//! Decorates a reducer so that state survives reloads: at `INIT`/`UPDATE`
//! the persisted snapshot is merged into the state the inner reducer sees,
//! and every resulting state is written back. Persistence is best-effort:
//! read failures fall back to the in-memory state, write failures are
//! dropped, and neither ever changes what the reducer returns.

use super::{Action, Reducer};
use crate::error::{ErrorKind, PersistenceError};
use crate::storage::PersistentStore;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::rc::Rc;

pub struct Hydrated<R> {
    inner: R,
    store: Rc<dyn PersistentStore>,
    key: String,
    slices: Option<Vec<String>>,
    preserve_unreadable_snapshot: bool,
}

impl<R> Hydrated<R> {
    pub fn new(inner: R, store: Rc<dyn PersistentStore>, key: impl Into<String>) -> Self {
        Self {
            inner,
            store,
            key: key.into(),
            slices: None,
            preserve_unreadable_snapshot: false,
        }
    }

    /// Persists only the named top-level fields of the state.
    pub fn with_slices<I, K>(mut self, slices: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.slices = Some(slices.into_iter().map(Into::into).collect());
        self
    }

    /// When set, a hydration action whose snapshot exists but cannot be read
    /// does not write back, leaving the stored snapshot for a later attempt.
    pub fn preserve_unreadable_snapshot(mut self, preserve: bool) -> Self {
        self.preserve_unreadable_snapshot = preserve;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn retain_slices(&self, value: Value) -> Value {
        match (&self.slices, value) {
            (Some(slices), Value::Object(map)) => Value::Object(
                map.into_iter()
                    .filter(|(k, _)| slices.iter().any(|s| s == k))
                    .collect::<Map<String, Value>>(),
            ),
            (_, value) => value,
        }
    }

    /// Reads the snapshot and overlays it onto `current`.
    fn read_snapshot<S>(&self, current: &S) -> Result<Option<S>, PersistenceError>
    where
        S: Serialize + DeserializeOwned,
    {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let persisted = self.retain_slices(serde_json::from_str::<Value>(&raw)?);

        let merged = match (serde_json::to_value(current)?, persisted) {
            (Value::Object(mut base), Value::Object(overlay)) => {
                base.extend(overlay);
                Value::Object(base)
            }
            // Non-object states are replaced wholesale
            (_, persisted) => persisted,
        };
        Ok(Some(serde_json::from_value(merged)?))
    }

    fn write_snapshot<S: Serialize>(&self, state: &S) -> Result<(), PersistenceError> {
        let value = self.retain_slices(serde_json::to_value(state)?);
        self.store.set(&self.key, &value.to_string())?;
        Ok(())
    }
}

impl<S, R> Reducer<S> for Hydrated<R>
where
    S: Serialize + DeserializeOwned,
    R: Reducer<S>,
{
    fn reduce(&self, state: &S, action: &Action) -> S {
        let mut hydrated = None;
        let mut unreadable = false;

        if action.is_hydration_point() {
            match self.read_snapshot(state) {
                Ok(Some(restored)) => {
                    tracing::debug!(key = %self.key, action = %action.kind, "state hydrated");
                    hydrated = Some(restored);
                }
                Ok(None) => {
                    tracing::debug!(key = %self.key, "no snapshot to hydrate from");
                }
                Err(e) => {
                    tracing::warn!(
                        key = %self.key,
                        code = ErrorKind::PersistenceRead.error_code(),
                        error = %e,
                        "snapshot unreadable, using in-memory state"
                    );
                    unreadable = true;
                }
            }
        }

        let next = self.inner.reduce(hydrated.as_ref().unwrap_or(state), action);

        if unreadable && self.preserve_unreadable_snapshot {
            tracing::debug!(key = %self.key, "keeping unreadable snapshot, write-back skipped");
        } else if let Err(e) = self.write_snapshot(&next) {
            tracing::warn!(
                key = %self.key,
                code = ErrorKind::PersistenceWrite.error_code(),
                action = %action.kind,
                error = %e,
                "snapshot write failed"
            );
        }

        next
    }
}
