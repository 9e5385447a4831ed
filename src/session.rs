//! Back-office client
//!
//! Wires the persistent store, the hydrated state container, the credential
//! store, the interceptor pipeline and the router into one [`BackOffice`].

use crate::config::ClientConfig;
use crate::credential::{Credential, CredentialStore};
use crate::error::{HttpError, HttpResult, PersistenceError, SessionError, SetupError};
use crate::guard::{GuardOutcome, RouteGuard};
use crate::loading::LoadingIndicator;
use crate::notify::{NotificationSink, TracingSink};
use crate::pipeline::Pipeline;
use crate::pipeline::auth::{AuthInterceptor, HttpTokenRefresher, TokenRefresher};
use crate::pipeline::errors::ErrorInterceptor;
use crate::pipeline::loading::LoadingInterceptor;
use crate::request::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::route::AppRoute;
use crate::router::{HistoryNavigator, Navigator, Router};
use crate::state::app::{self, ApplicationState, app_reducer};
use crate::state::hydration::Hydrated;
use crate::state::{Action, Store};
use crate::storage::{FileStore, PersistentStore};
use backoffice_shared::protocol::ApiRequest;
use backoffice_shared::{LoginRequest, ProfileSummary, SessionProfile};
use serde::de::DeserializeOwned;
use std::rc::Rc;
use tokio::sync::watch;

pub type AppReducer = fn(&ApplicationState, &Action) -> ApplicationState;
pub type AppStore = Store<ApplicationState, Hydrated<AppReducer>>;

// =========================================================
// Builder
// =========================================================

/// Collaborators left unset fall back to the production ones: a
/// [`FileStore`] under `storage_dir`, [`ReqwestTransport`], [`TracingSink`]
/// and an in-memory [`HistoryNavigator`].
pub struct BackOfficeBuilder {
    config: ClientConfig,
    storage: Option<Rc<dyn PersistentStore>>,
    transport: Option<Rc<dyn Transport>>,
    notifications: Option<Rc<dyn NotificationSink>>,
    navigator: Option<Rc<dyn Navigator>>,
    refresher: Option<Rc<dyn TokenRefresher>>,
}

impl BackOfficeBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            storage: None,
            transport: None,
            notifications: None,
            navigator: None,
            refresher: None,
        }
    }

    pub fn storage(mut self, storage: Rc<dyn PersistentStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn transport(mut self, transport: Rc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn notifications(mut self, sink: Rc<dyn NotificationSink>) -> Self {
        self.notifications = Some(sink);
        self
    }

    pub fn navigator(mut self, navigator: Rc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Replaces the refresher that calls `refresh_path` on the transport.
    pub fn refresher(mut self, refresher: Rc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn build(self) -> Result<BackOffice, SetupError> {
        let config = self.config;
        config.validate()?;

        let storage: Rc<dyn PersistentStore> = match self.storage {
            Some(storage) => storage,
            None => Rc::new(
                FileStore::open(config.storage_dir.clone())?.with_quota(config.storage_quota_bytes),
            ),
        };
        let transport: Rc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Rc::new(ReqwestTransport::new()),
        };
        let notifications: Rc<dyn NotificationSink> = match self.notifications {
            Some(sink) => sink,
            None => Rc::new(TracingSink),
        };
        let navigator: Rc<dyn Navigator> = match self.navigator {
            Some(navigator) => navigator,
            None => Rc::new(HistoryNavigator::new()),
        };
        let refresher: Rc<dyn TokenRefresher> = match self.refresher {
            Some(refresher) => refresher,
            None => Rc::new(HttpTokenRefresher::new(
                transport.clone(),
                config.url(&config.refresh_path),
            )),
        };

        let credentials = Rc::new(CredentialStore::new(
            storage.clone(),
            config.credential_key.clone(),
        ));
        let guard = RouteGuard::new(credentials.clone());
        let router = Rc::new(Router::new(guard.clone(), navigator));
        let loading = LoadingIndicator::new();

        // Outermost first: loading spans retries, errors see the final outcome
        let pipeline = Pipeline::new(transport)
            .with(LoadingInterceptor::new(loading.clone()))
            .with(ErrorInterceptor::new(notifications))
            .with(
                AuthInterceptor::new(
                    credentials.clone(),
                    refresher,
                    router.clone(),
                    config.auth_header.clone(),
                )
                .with_scheme(config.auth_scheme.clone())
                .with_public_url(config.url(&config.login_path))
                .with_public_url(config.url(&config.refresh_path)),
            );

        let reducer: AppReducer = app_reducer;
        let store = Store::new(
            ApplicationState::default(),
            Hydrated::new(reducer, storage, config.state_key.clone()),
        );

        tracing::info!(
            api = %config.api_base_url,
            authenticated = credentials.is_authenticated(),
            "back office client ready"
        );

        Ok(BackOffice {
            config,
            store,
            credentials,
            loading,
            guard,
            router,
            pipeline,
        })
    }
}

// =========================================================
// Client
// =========================================================

pub struct BackOffice {
    config: ClientConfig,
    store: AppStore,
    credentials: Rc<CredentialStore>,
    loading: LoadingIndicator,
    guard: RouteGuard,
    router: Rc<Router>,
    pipeline: Pipeline,
}

impl BackOffice {
    pub fn builder(config: ClientConfig) -> BackOfficeBuilder {
        BackOfficeBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> Rc<ApplicationState> {
        self.store.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<Rc<ApplicationState>> {
        self.store.subscribe()
    }

    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn can_activate(&self) -> GuardOutcome {
        self.guard.can_activate()
    }

    /// Navigates through the guard and records the route entered.
    pub fn navigate(&self, path: &str) -> AppRoute {
        let entered = self.router.go(path);
        self.store.dispatch(Action::with_payload(
            app::UI_ROUTE_CHANGED,
            serde_json::Value::from(entered.to_path()),
        ));
        entered
    }

    /// Sends through the pipeline. An expired session also drops the
    /// signed-in profile from the application state.
    pub async fn send(&self, req: HttpRequest) -> HttpResult<HttpResponse> {
        let result = self.pipeline.send(req).await;
        if let Err(HttpError::SessionExpired(_)) = &result {
            self.store.dispatch(Action::new(app::SESSION_LOGOUT));
            self.store.dispatch(Action::with_payload(
                app::UI_ROUTE_CHANGED,
                serde_json::Value::from(self.router.current_route().to_path()),
            ));
        }
        result
    }

    pub async fn send_json<T: DeserializeOwned>(&self, req: HttpRequest) -> HttpResult<T> {
        self.send(req).await?.json()
    }

    /// Sends a typed API request to its endpoint under `api_base_url`.
    pub async fn call<A: ApiRequest>(&self, request: &A) -> HttpResult<A::Response> {
        let req = HttpRequest::new(&self.config.url(A::PATH), A::METHOD).with_json(request)?;
        self.send_json(req).await
    }

    pub async fn login(&self, user: &str, password: &str) -> Result<ProfileSummary, SessionError> {
        let body = LoginRequest {
            user: user.to_string(),
            password: password.to_string(),
        };
        let req = HttpRequest::new(&self.config.url(&self.config.login_path), LoginRequest::METHOD)
            .with_json(&body)?;
        let profile: SessionProfile = self.send_json(req).await?;

        self.credentials.set_credential(Credential::from(&profile))?;
        let summary = profile.summary();
        let payload = serde_json::to_value(&summary).map_err(PersistenceError::from)?;
        self.store.dispatch(Action::with_payload(app::SESSION_LOGIN, payload));

        tracing::info!(role = %summary.role_code, "signed in");
        self.navigate(AppRoute::auth_success_redirect().to_path());
        Ok(summary)
    }

    pub fn logout(&self) {
        if let Err(e) = self.credentials.clear() {
            tracing::warn!(error = %e, "persisted credential could not be removed");
        }
        self.store.dispatch(Action::new(app::SESSION_LOGOUT));
        tracing::info!("signed out");
        self.navigate(AppRoute::auth_failure_redirect().to_path());
    }
}
