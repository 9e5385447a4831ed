//! Router service
//!
//! Runs "request -> guard -> redirect or load" for every navigation and
//! hands the final path to the [`Navigator`] that performs it.

use crate::guard::{GuardOutcome, RouteGuard};
use crate::route::AppRoute;
use std::cell::RefCell;
use std::rc::Rc;

/// Performs client-side navigation to a path.
pub trait Navigator {
    fn navigate(&self, path: &str);
}

/// In-memory history. Clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct HistoryNavigator {
    history: Rc<RefCell<Vec<String>>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.history.borrow().last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str) {
        self.history.borrow_mut().push(path.to_string());
    }
}

pub struct Router {
    guard: RouteGuard,
    navigator: Rc<dyn Navigator>,
    current: RefCell<AppRoute>,
}

impl Router {
    pub fn new(guard: RouteGuard, navigator: Rc<dyn Navigator>) -> Self {
        Self {
            guard,
            navigator,
            current: RefCell::new(AppRoute::default()),
        }
    }

    pub fn current_route(&self) -> AppRoute {
        *self.current.borrow()
    }

    /// Navigates to `path`, or to wherever the guard redirects. Returns the
    /// route actually entered.
    pub fn go(&self, path: &str) -> AppRoute {
        let target = AppRoute::from_path(path);

        // --- Step 1: validate the target route ---
        let entered = match self.guard.check(target) {
            GuardOutcome::Redirect(redirect) => {
                tracing::info!(target_path = %target, redirect = %redirect, "access denied, redirecting");
                redirect
            }
            GuardOutcome::Allow
                if target.should_redirect_when_authenticated()
                    && self.guard.can_activate() == GuardOutcome::Allow =>
            {
                let redirect = AppRoute::auth_success_redirect();
                tracing::debug!(redirect = %redirect, "already authenticated, redirecting");
                redirect
            }
            GuardOutcome::Allow => target,
        };

        // --- Step 2: load the page ---
        self.navigator.navigate(entered.to_path());
        *self.current.borrow_mut() = entered;
        entered
    }
}

impl Navigator for Router {
    fn navigate(&self, path: &str) {
        self.go(path);
    }
}
