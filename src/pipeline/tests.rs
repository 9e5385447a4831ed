use super::auth::{AuthInterceptor, HttpTokenRefresher, TokenRefresher};
use super::errors::ErrorInterceptor;
use super::loading::LoadingInterceptor;
use super::*;
use crate::credential::{Credential, CredentialStore};
use crate::error::{ErrorKind, HttpError};
use crate::loading::LoadingIndicator;
use crate::notify::NotificationLog;
use crate::router::HistoryNavigator;
use crate::storage::MemoryStore;
use crate::testing::{FaultyStore, MockRefresher, MockTransport};
use serde_json::json;
use std::cell::Cell;

const URL: &str = "http://bank.test/api/clients";
const HEADER: &str = "X-Auth-Token";

// =========================================================
// Helpers
// =========================================================

struct Harness {
    transport: Rc<MockTransport>,
    refresher: Rc<MockRefresher>,
    credentials: Rc<CredentialStore>,
    navigator: HistoryNavigator,
    notifications: NotificationLog,
    loading: LoadingIndicator,
    pipeline: Pipeline,
}

fn harness() -> Harness {
    let transport = Rc::new(MockTransport::new());
    let refresher = Rc::new(MockRefresher::new());
    let credentials = Rc::new(CredentialStore::new(Rc::new(MemoryStore::new()), "session"));
    let navigator = HistoryNavigator::new();
    let notifications = NotificationLog::new();
    let loading = LoadingIndicator::new();

    let pipeline = Pipeline::new(transport.clone())
        .with(LoadingInterceptor::new(loading.clone()))
        .with(ErrorInterceptor::new(Rc::new(notifications.clone())))
        .with(AuthInterceptor::new(
            credentials.clone(),
            refresher.clone(),
            Rc::new(navigator.clone()),
            HEADER,
        ));

    Harness {
        transport,
        refresher,
        credentials,
        navigator,
        notifications,
        loading,
        pipeline,
    }
}

fn sent_tokens(transport: &MockTransport) -> Vec<Option<String>> {
    transport
        .requests
        .borrow()
        .iter()
        .map(|r| r.header(HEADER).map(str::to_string))
        .collect()
}

// =========================================================
// Credential propagation
// =========================================================

#[tokio::test]
async fn attaches_current_token() {
    let h = harness();
    h.credentials.set_credential(Credential::new("T", "R")).unwrap();
    h.transport.mock_response(URL, 200, json!([]));

    h.pipeline.send(HttpRequest::get(URL)).await.unwrap();
    assert_eq!(sent_tokens(&h.transport), vec![Some("T".to_string())]);
}

#[tokio::test]
async fn forwards_unmodified_without_token() {
    let h = harness();
    h.transport.mock_response(URL, 200, json!([]));
    h.pipeline.send(HttpRequest::get(URL)).await.unwrap();
    assert_eq!(sent_tokens(&h.transport), vec![None]);
}

#[tokio::test]
async fn scheme_prefixes_header_value() {
    let transport = Rc::new(MockTransport::new());
    let credentials = Rc::new(CredentialStore::new(Rc::new(MemoryStore::new()), "session"));
    credentials.set_credential(Credential::new("T", "R")).unwrap();
    let pipeline = Pipeline::new(transport.clone()).with(
        AuthInterceptor::new(
            credentials,
            Rc::new(MockRefresher::new()),
            Rc::new(HistoryNavigator::new()),
            "Authorization",
        )
        .with_scheme("Bearer"),
    );
    transport.mock_response(URL, 200, json!({}));

    pipeline.send(HttpRequest::get(URL)).await.unwrap();
    assert_eq!(
        transport.last_request().unwrap().header("authorization"),
        Some("Bearer T")
    );
}

// =========================================================
// 401 recovery
// =========================================================

#[tokio::test]
async fn refresh_then_single_retry_with_new_token() {
    let h = harness();
    h.credentials.set_credential(Credential::new("OLD", "R")).unwrap();
    h.refresher.succeed_with("NEW");
    h.transport.respond_with(|req| {
        if req.header(HEADER) == Some("NEW") {
            Ok(HttpResponse::new(200, "[1]"))
        } else {
            Ok(HttpResponse::new(401, ""))
        }
    });

    let clients: Vec<u32> = h.pipeline.send_json(HttpRequest::get(URL)).await.unwrap();
    assert_eq!(clients, vec![1]);
    assert_eq!(*h.refresher.calls.borrow(), vec!["R".to_string()]);
    assert_eq!(
        sent_tokens(&h.transport),
        vec![Some("OLD".to_string()), Some("NEW".to_string())]
    );
    assert_eq!(h.credentials.get_token().as_deref(), Some("NEW"));
    assert!(h.notifications.is_empty());
}

#[tokio::test]
async fn retry_is_bounded_to_one() {
    let h = harness();
    h.credentials.set_credential(Credential::new("OLD", "R")).unwrap();
    h.refresher.succeed_with("NEW");
    h.refresher.succeed_with("NEWER");
    h.transport.respond_with(|_| Ok(HttpResponse::new(401, "")));

    let err = h.pipeline.send(HttpRequest::get(URL)).await.unwrap_err();
    assert!(matches!(err, HttpError::SessionExpired(_)));
    assert_eq!(h.refresher.call_count(), 1);
    assert_eq!(h.transport.request_count(URL), 2);
    assert!(!h.credentials.is_authenticated());
    assert_eq!(h.navigator.current().as_deref(), Some("/login"));
}

#[tokio::test]
async fn failed_refresh_ends_session() {
    let h = harness();
    h.credentials.set_credential(Credential::new("OLD", "R")).unwrap();
    h.refresher.fail(401);
    h.transport.mock_response(URL, 401, json!(null));

    let err = h.pipeline.send(HttpRequest::get(URL)).await.unwrap_err();
    assert!(matches!(err, HttpError::SessionExpired(_)));
    assert_eq!(err.status(), 401);
    assert_eq!(h.transport.request_count(URL), 1);
    assert_eq!(h.credentials.get_token(), None);
    assert_eq!(h.navigator.history(), vec!["/login".to_string()]);

    let notes = h.notifications.entries();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, ErrorKind::SessionExpired);
    assert_eq!(notes[0].status, 401);
}

#[tokio::test]
async fn missing_refresh_token_ends_session_without_refresh() {
    let h = harness();
    h.credentials.set_credential(Credential::new("OLD", "")).unwrap();
    h.transport.mock_response(URL, 401, json!(null));

    let err = h.pipeline.send(HttpRequest::get(URL)).await.unwrap_err();
    assert!(matches!(err, HttpError::SessionExpired(_)));
    assert_eq!(h.refresher.call_count(), 0);
    assert!(!h.credentials.is_authenticated());
}

#[tokio::test]
async fn anonymous_401_is_returned_as_is() {
    let h = harness();
    h.transport
        .mock_response(URL, 401, json!({"message": "Invalid user or password"}));

    let err = h.pipeline.send(HttpRequest::post(URL)).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(h.refresher.call_count(), 0);
    assert!(h.navigator.history().is_empty());
    let notes = h.notifications.entries();
    assert_eq!(notes[0].kind, ErrorKind::AuthenticationRejected);
    assert_eq!(notes[0].message, "Invalid user or password");
}

#[tokio::test]
async fn non_401_failures_are_not_retried() {
    let h = harness();
    h.credentials.set_credential(Credential::new("T", "R")).unwrap();
    h.transport.mock_response(URL, 503, json!({"message": "maintenance"}));

    let err = h.pipeline.send(HttpRequest::get(URL)).await.unwrap_err();
    assert_eq!(err.status(), 503);
    assert_eq!(h.refresher.call_count(), 0);
    assert_eq!(h.transport.request_count(URL), 1);
    assert!(h.credentials.is_authenticated());
}

#[tokio::test]
async fn refreshed_token_is_kept_when_it_cannot_be_persisted() {
    let transport = Rc::new(MockTransport::new());
    let refresher = Rc::new(MockRefresher::new());
    let storage = Rc::new(FaultyStore::new());
    let credentials = Rc::new(CredentialStore::new(storage.clone(), "session"));
    credentials.set_credential(Credential::new("OLD", "R")).unwrap();
    let pipeline = Pipeline::new(transport.clone()).with(AuthInterceptor::new(
        credentials.clone(),
        refresher.clone(),
        Rc::new(HistoryNavigator::new()),
        HEADER,
    ));

    storage.fail_set(true);
    refresher.succeed_with("NEW");
    transport.respond_with(|req| {
        if req.header(HEADER) == Some("NEW") {
            Ok(HttpResponse::new(200, "[]"))
        } else {
            Ok(HttpResponse::new(401, ""))
        }
    });

    pipeline.send(HttpRequest::get(URL)).await.unwrap();
    assert_eq!(credentials.get_token().as_deref(), Some("NEW"));

    // The next request goes out with the renewed token, no second refresh
    pipeline.send(HttpRequest::get(URL)).await.unwrap();
    assert_eq!(refresher.call_count(), 1);
    assert_eq!(
        sent_tokens(&transport),
        vec![
            Some("OLD".to_string()),
            Some("NEW".to_string()),
            Some("NEW".to_string())
        ]
    );
    assert!(credentials.is_authenticated());
}

#[tokio::test]
async fn public_endpoints_skip_token_and_recovery() {
    let login = "http://bank.test/api/auth/login";
    let transport = Rc::new(MockTransport::new());
    let refresher = Rc::new(MockRefresher::new());
    let credentials = Rc::new(CredentialStore::new(Rc::new(MemoryStore::new()), "session"));
    credentials.set_credential(Credential::new("T", "R")).unwrap();
    let navigator = HistoryNavigator::new();
    let pipeline = Pipeline::new(transport.clone()).with(
        AuthInterceptor::new(
            credentials.clone(),
            refresher.clone(),
            Rc::new(navigator.clone()),
            HEADER,
        )
        .with_public_url(login),
    );
    transport.respond_with(|_| {
        Ok(HttpResponse::new(
            401,
            json!({"message": "Invalid user or password"}).to_string(),
        ))
    });

    for url in [login.to_string(), format!("{login}?lang=es")] {
        let err = pipeline.send(HttpRequest::post(&url)).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(transport.last_request().unwrap().header(HEADER), None);
    }
    assert_eq!(refresher.call_count(), 0);
    assert!(credentials.is_authenticated());
    assert!(navigator.history().is_empty());
}

// =========================================================
// Error reporting
// =========================================================

#[tokio::test]
async fn failures_reach_caller_and_sink() {
    let h = harness();
    h.transport.mock_network_error(URL);
    h.transport.mock_response(URL, 404, json!({"message": "Client not found"}));

    let err = h.pipeline.send(HttpRequest::get(URL)).await.unwrap_err();
    assert!(matches!(err, HttpError::Network(_)));
    let err = h.pipeline.send(HttpRequest::get(URL)).await.unwrap_err();
    assert_eq!(err.status(), 404);

    let notes = h.notifications.drain();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].kind, ErrorKind::NetworkFailure);
    assert_eq!(notes[0].status, 0);
    assert_eq!(notes[1].kind, ErrorKind::RequestRejected);
    assert_eq!(notes[1].message, "Client not found");
    assert!(notes[1].request_id.is_some());
}

#[tokio::test]
async fn success_is_not_reported() {
    let h = harness();
    h.transport.mock_response(URL, 201, json!({"id": 1}));
    let resp = h.pipeline.send(HttpRequest::post(URL)).await.unwrap();
    assert_eq!(resp.status, 201);
    assert!(h.notifications.is_empty());
}

// =========================================================
// Loading
// =========================================================

#[tokio::test]
async fn loading_is_raised_during_request_and_released_after() {
    let h = harness();
    let observed = Rc::new(Cell::new(false));
    let probe = h.loading.clone();
    let seen = observed.clone();
    h.transport.respond_with(move |_| {
        seen.set(probe.is_loading());
        Ok(HttpResponse::new(500, ""))
    });

    assert!(h.pipeline.send(HttpRequest::get(URL)).await.is_err());
    assert!(observed.get());
    assert_eq!(h.loading.pending(), 0);
    assert!(!h.loading.is_loading());
}

#[tokio::test]
async fn loading_released_when_request_is_dropped() {
    let h = harness();
    h.transport.mock_response(URL, 200, json!([]));
    {
        let fut = h.pipeline.send(HttpRequest::get(URL));
        drop(fut);
    }
    assert_eq!(h.loading.pending(), 0);

    let mut fut = Box::pin(h.pipeline.send(HttpRequest::get(URL)));
    // Poll once so the loading stage begins, then abandon the request
    let _ = futures::poll!(fut.as_mut());
    drop(fut);
    assert_eq!(h.loading.pending(), 0);
}

// =========================================================
// HttpTokenRefresher
// =========================================================

#[tokio::test]
async fn http_refresher_posts_refresh_token() {
    let transport = Rc::new(MockTransport::new());
    let url = "http://bank.test/api/auth/refresh";
    transport.mock_response(url, 200, json!({"token": "NEW", "refreshToken": "R2"}));
    let refresher = HttpTokenRefresher::new(transport.clone(), url);

    let renewed = refresher.refresh("R1").await.unwrap();
    assert_eq!(renewed.token, "NEW");
    assert_eq!(renewed.refresh_token.as_deref(), Some("R2"));

    let sent = transport.last_request().unwrap();
    let body: serde_json::Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"refreshToken": "R1"}));
}

#[tokio::test]
async fn http_refresher_reports_rejection() {
    let transport = Rc::new(MockTransport::new());
    let url = "http://bank.test/api/auth/refresh";
    transport.mock_response(url, 401, json!(null));
    let refresher = HttpTokenRefresher::new(transport, url);
    assert!(refresher.refresh("R1").await.unwrap_err().is_unauthorized());
}
