use super::*;

use std::collections::VecDeque;

use async_trait::async_trait;
use steptrail_protocols::Credentials;

use crate::session::Session;
use crate::step::ActionKind;
use crate::testing::{snapshot, PAGE};
use crate::transport::MemoryCredentialStore;

const ACCESS: &str = "access-token-0123456789abcdefghij";
const FRESH: &str = "access-token-9876543210zyxwvutsrq";

#[derive(Default)]
struct ScriptedTransport {
    save_results: Mutex<VecDeque<Result<SessionId, TransportError>>>,
    refresh_result: Mutex<Option<Result<String, TransportError>>>,
    failing_steps: Vec<u64>,
    saves: Mutex<Vec<(String, SaveSessionRequest)>>,
    images: Mutex<Vec<(String, SaveImageRequest)>>,
    refresh_calls: Mutex<usize>,
}

impl ScriptedTransport {
    fn with_saves(results: Vec<Result<SessionId, TransportError>>) -> Self {
        Self {
            save_results: Mutex::new(results.into()),
            ..Default::default()
        }
    }

    fn refresh_with(self, result: Result<String, TransportError>) -> Self {
        *self.refresh_result.lock() = Some(result);
        self
    }
}

#[async_trait]
impl SessionTransport for ScriptedTransport {
    async fn save_session(
        &self,
        access_token: &str,
        request: &SaveSessionRequest,
    ) -> Result<SessionId, TransportError> {
        self.saves
            .lock()
            .push((access_token.to_string(), request.clone()));
        self.save_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(SessionId("default".to_string())))
    }

    async fn save_image(
        &self,
        access_token: &str,
        request: &SaveImageRequest,
    ) -> Result<(), TransportError> {
        self.images
            .lock()
            .push((access_token.to_string(), request.clone()));
        if self.failing_steps.contains(&request.step_id) {
            return Err(TransportError::Network("connection reset".to_string()));
        }
        Ok(())
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<String, TransportError> {
        *self.refresh_calls.lock() += 1;
        self.refresh_result
            .lock()
            .take()
            .unwrap_or(Err(TransportError::Unauthorized))
    }
}

fn keys() -> KeyDerivation {
    KeyDerivation::new("test-salt", 1_000)
}

fn credentials(refresh: Option<&str>) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::new(Some(Credentials::new(
        ACCESS,
        refresh.map(str::to_string),
    ))))
}

fn saver(transport: &Arc<ScriptedTransport>, store: &Arc<MemoryCredentialStore>) -> SessionSaver {
    SessionSaver::new(transport.clone(), store.clone(), keys())
}

fn session() -> Session {
    let mut session = Session::new();
    session.seed_navigate(PAGE);
    session.try_append(ActionKind::Click, PAGE, snapshot("/html/body/a", "a"), None);
    session.try_append(ActionKind::Click, PAGE, snapshot("/html/body/button", "button"), None);
    session
}

fn shots() -> Vec<Screenshot> {
    (2..=3)
        .map(|step_id| Screenshot {
            step_id,
            x: 60.0,
            y: 40.0,
            img_binary: "data:image/png;base64,AAAA".to_string(),
        })
        .collect()
}

fn sid(id: &str) -> Result<SessionId, TransportError> {
    Ok(SessionId(id.to_string()))
}

#[tokio::test]
async fn test_save_success() {
    let transport = Arc::new(ScriptedTransport::with_saves(vec![sid("s-1")]));
    let store = credentials(Some("refresh"));
    let saver = saver(&transport, &store);
    let session = session();

    let report = saver
        .save("  checkout  ", session.entries(), &shots())
        .await
        .unwrap();
    assert_eq!(report.session_id, SessionId("s-1".to_string()));
    assert_eq!(report.session_name, "checkout");
    assert_eq!(report.images_uploaded, 2);
    assert_eq!(report.images_failed, 0);
    assert_eq!(saver.saved_names(), vec!["checkout".to_string()]);

    let saves = transport.saves.lock().clone();
    assert_eq!(saves.len(), 1);
    let (token, request) = &saves[0];
    assert_eq!(token, ACCESS);
    assert_eq!(request.session_name, "checkout");

    let opened = keys().derive(ACCESS).open(&request.data).unwrap();
    let entries: serde_json::Value = serde_json::from_slice(&opened.plaintext).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 3);
    assert_eq!(entries[0]["action"], "navigate");

    let images = transport.images.lock().clone();
    assert!(images.iter().all(|(token, r)| token == ACCESS && r.session_id.0 == "s-1"));
}

#[tokio::test]
async fn test_name_required() {
    let transport = Arc::new(ScriptedTransport::default());
    let saver = saver(&transport, &credentials(None));

    let err = saver.save("   ", session().entries(), &[]).await.unwrap_err();
    assert!(matches!(err, SaveError::NameRequired));
    assert!(transport.saves.lock().is_empty());
}

#[tokio::test]
async fn test_duplicate_name_rejected_locally() {
    let transport = Arc::new(ScriptedTransport::default());
    let saver = saver(&transport, &credentials(None));
    let session = session();

    saver.save("checkout", session.entries(), &[]).await.unwrap();
    let err = saver.save("checkout ", session.entries(), &[]).await.unwrap_err();
    assert!(matches!(err, SaveError::DuplicateName(name) if name == "checkout"));
    assert_eq!(transport.saves.lock().len(), 1);
}

#[tokio::test]
async fn test_not_authenticated() {
    let transport = Arc::new(ScriptedTransport::default());
    let store = Arc::new(MemoryCredentialStore::new(None));
    let saver = saver(&transport, &store);

    let err = saver.save("checkout", session().entries(), &[]).await.unwrap_err();
    assert!(matches!(err, SaveError::NotAuthenticated));
}

#[tokio::test]
async fn test_expired_token_refreshes_and_retries_once() {
    let transport = Arc::new(
        ScriptedTransport::with_saves(vec![Err(TransportError::Unauthorized), sid("s-2")])
            .refresh_with(Ok(FRESH.to_string())),
    );
    let store = credentials(Some("refresh"));
    let saver = saver(&transport, &store);

    let report = saver.save("checkout", session().entries(), &shots()).await.unwrap();
    assert_eq!(report.session_id.0, "s-2");
    assert_eq!(*transport.refresh_calls.lock(), 1);
    assert_eq!(store.load().await.unwrap().access_token, FRESH);

    let saves = transport.saves.lock().clone();
    assert_eq!(saves.len(), 2);
    assert_eq!(saves[1].0, FRESH);
    assert!(keys().derive(FRESH).open(&saves[1].1.data).is_ok());

    let images = transport.images.lock().clone();
    assert!(images.iter().all(|(token, _)| token == FRESH));
}

#[tokio::test]
async fn test_refresh_failure_forces_reauthentication() {
    let transport = Arc::new(
        ScriptedTransport::with_saves(vec![Err(TransportError::Unauthorized)]).refresh_with(Err(
            TransportError::Rejected {
                status: 401,
                message: "refresh expired".to_string(),
            },
        )),
    );
    let store = credentials(Some("refresh"));
    let saver = saver(&transport, &store);

    let err = saver.save("checkout", session().entries(), &[]).await.unwrap_err();
    assert!(matches!(err, SaveError::ReauthenticationRequired));
    assert!(store.load().await.is_none());
    assert_eq!(transport.saves.lock().len(), 1);
    assert!(saver.saved_names().is_empty());
}

#[tokio::test]
async fn test_missing_refresh_token_forces_reauthentication() {
    let transport = Arc::new(ScriptedTransport::with_saves(vec![Err(TransportError::Unauthorized)]));
    let store = credentials(None);
    let saver = saver(&transport, &store);

    let err = saver.save("checkout", session().entries(), &[]).await.unwrap_err();
    assert!(matches!(err, SaveError::ReauthenticationRequired));
    assert_eq!(*transport.refresh_calls.lock(), 0);
    assert!(store.load().await.is_none());
}

#[tokio::test]
async fn test_retry_is_not_repeated() {
    let transport = Arc::new(
        ScriptedTransport::with_saves(vec![
            Err(TransportError::Unauthorized),
            Err(TransportError::Unauthorized),
        ])
        .refresh_with(Ok(FRESH.to_string())),
    );
    let saver = saver(&transport, &credentials(Some("refresh")));

    let err = saver.save("checkout", session().entries(), &[]).await.unwrap_err();
    assert!(matches!(err, SaveError::Transport(TransportError::Unauthorized)));
    assert_eq!(*transport.refresh_calls.lock(), 1);
    assert_eq!(transport.saves.lock().len(), 2);
}

#[tokio::test]
async fn test_rejection_is_not_retried() {
    let transport = Arc::new(ScriptedTransport::with_saves(vec![Err(TransportError::Rejected {
        status: 500,
        message: "boom".to_string(),
    })]));
    let saver = saver(&transport, &credentials(Some("refresh")));

    let err = saver.save("checkout", session().entries(), &[]).await.unwrap_err();
    assert!(matches!(err, SaveError::Transport(TransportError::Rejected { status: 500, .. })));
    assert_eq!(*transport.refresh_calls.lock(), 0);
    assert!(saver.saved_names().is_empty());
}

#[tokio::test]
async fn test_image_failures_do_not_fail_save() {
    let transport = Arc::new(ScriptedTransport {
        failing_steps: vec![2],
        ..ScriptedTransport::with_saves(vec![sid("s-3")])
    });
    let saver = saver(&transport, &credentials(None));

    let report = saver.save("checkout", session().entries(), &shots()).await.unwrap();
    assert_eq!(report.images_uploaded, 1);
    assert_eq!(report.images_failed, 1);
    assert_eq!(transport.images.lock().len(), 2);
}
