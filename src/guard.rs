//! Route guard
//!
//! Decides, from the credential store alone, whether a protected route may
//! be entered. Evaluated fresh on every navigation.

use crate::credential::CredentialStore;
use crate::route::AppRoute;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(AppRoute),
}

#[derive(Clone)]
pub struct RouteGuard {
    credentials: Rc<CredentialStore>,
    login: AppRoute,
}

impl RouteGuard {
    pub fn new(credentials: Rc<CredentialStore>) -> Self {
        Self {
            credentials,
            login: AppRoute::auth_failure_redirect(),
        }
    }

    /// `Allow` iff a token is present right now.
    pub fn can_activate(&self) -> GuardOutcome {
        if self.credentials.get_token().is_some() {
            GuardOutcome::Allow
        } else {
            GuardOutcome::Redirect(self.login)
        }
    }

    /// Guard decision for `route`; unprotected routes are always allowed.
    pub fn check(&self, route: AppRoute) -> GuardOutcome {
        if route.requires_auth() {
            self.can_activate()
        } else {
            GuardOutcome::Allow
        }
    }
}
