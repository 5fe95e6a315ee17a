use super::*;
use crate::session::{Activity, SessionStatus};

#[test]
fn sessions_url_is_document_scoped() {
    let config = EngineConfig::new("http://localhost:3000/api", "ws://localhost:3000/ws");
    let backend = HttpSessionBackend::new(&config).expect("build backend");

    assert_eq!(backend.sessions_url(42), "http://localhost:3000/api/documents/42/sessions");
}

#[test]
fn parse_session_accepts_backend_record() {
    let body = r#"{
        "sessionId": "s1",
        "documentId": 42,
        "userId": "u9",
        "status": "active",
        "activity": "viewing",
        "joinedAt": "2026-08-21T09:00:00Z"
    }"#;

    let session = parse_session(body).expect("parse");
    assert_eq!(session.session_id, "s1");
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.activity, Activity::Viewing);
}

#[test]
fn parse_session_rejects_malformed_body() {
    let err = parse_session("<html>busy</html>").expect_err("should fail");
    assert!(matches!(err, SessionError::Parse(_)), "got {err:?}");
}
