use std::sync::{Arc, Mutex};

use serde_json::json;

use super::*;

// =============================================================================
// RECORDING OBSERVER
// =============================================================================

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn observer(&self) -> Box<dyn SessionObserver> {
        Box::new(RecorderObserver { calls: Arc::clone(&self.calls) })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("recorder lock").clone()
    }
}

struct RecorderObserver {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecorderObserver {
    fn push(&self, entry: String) {
        self.calls.lock().expect("recorder lock").push(entry);
    }
}

impl SessionObserver for RecorderObserver {
    fn on_user_joined(&mut self, event: &CollaborationEvent) {
        self.push(format!("user_joined:{}", event.user_id));
    }

    fn on_user_left(&mut self, event: &CollaborationEvent) {
        self.push(format!("user_left:{}", event.user_id));
    }

    fn on_comment_added(&mut self, event: &CollaborationEvent) {
        let text = event.data["text"].as_str().unwrap_or("-");
        self.push(format!("comment_added:{text}"));
    }

    fn on_presence_update(&mut self, event: &CollaborationEvent) {
        self.push(format!("presence:{:?}", event.kind));
    }

    fn on_notification(&mut self, notification: &Notification) {
        self.push(format!("notification:{}", notification.title));
    }

    fn on_invalidate(&mut self, document_id: i64) {
        self.push(format!("invalidate:{document_id}"));
    }

    fn on_session_joined(&mut self, session: &CollaborationSession) {
        self.push(format!("session_joined:{}", session.session_id));
    }

    fn on_join_failed(&mut self, error: &SessionError) {
        self.push(format!("join_failed:{error}"));
    }
}

fn event_frame(kind: &str, document_id: i64, user_id: &str, data: serde_json::Value) -> String {
    json!({
        "type": "collaboration_event",
        "event": {
            "type": kind,
            "documentId": document_id,
            "userId": user_id,
            "data": data,
            "timestamp": "T"
        }
    })
    .to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[test]
fn comment_added_dispatches_exactly_once() {
    let recorder = Recorder::default();
    let mut router = Router::new(recorder.observer());

    router.dispatch(&event_frame("comment_added", 42, "u9", json!({"text": "hi"})));

    assert_eq!(recorder.calls(), vec!["comment_added:hi", "invalidate:42"]);
}

#[test]
fn user_joined_and_left_invalidate_cached_state() {
    let recorder = Recorder::default();
    let mut router = Router::new(recorder.observer());

    router.dispatch(&event_frame("user_joined", 1, "u2", json!({})));
    router.dispatch(&event_frame("user_left", 1, "u2", json!({})));

    assert_eq!(
        recorder.calls(),
        vec!["user_joined:u2", "invalidate:1", "user_left:u2", "invalidate:1"]
    );
}

#[test]
fn presence_update_shares_the_presence_path() {
    let recorder = Recorder::default();
    let mut router = Router::new(recorder.observer());

    router.dispatch(&event_frame("presence_update", 7, "u3", json!({"activity": "editing"})));

    assert_eq!(recorder.calls(), vec!["presence:PresenceUpdate", "invalidate:7"]);
}

#[test]
fn cursor_and_selection_route_to_presence_without_invalidate() {
    let recorder = Recorder::default();
    let mut router = Router::new(recorder.observer());

    router.dispatch(&event_frame("cursor_move", 7, "u3", json!({"page": 1})));
    router.dispatch(&event_frame("selection_change", 7, "u3", json!({"start": 0, "end": 4})));

    assert_eq!(recorder.calls(), vec!["presence:CursorMove", "presence:SelectionChange"]);
}

#[test]
fn notification_reaches_the_observer() {
    let recorder = Recorder::default();
    let mut router = Router::new(recorder.observer());

    router.dispatch(
        &json!({
            "type": "notification",
            "notification": {"title": "Heads up", "message": "Document locked"}
        })
        .to_string(),
    );

    assert_eq!(recorder.calls(), vec!["notification:Heads up"]);
}

#[test]
fn malformed_frames_are_dropped() {
    let recorder = Recorder::default();
    let mut router = Router::new(recorder.observer());

    router.dispatch("not json at all");
    router.dispatch(r#"{"type": "collaboration_event"}"#);
    router.dispatch(r#"{"documentId": 42}"#);

    assert!(recorder.calls().is_empty(), "got {:?}", recorder.calls());
}

#[test]
fn unknown_event_kind_invokes_no_observer() {
    let recorder = Recorder::default();
    let mut router = Router::new(recorder.observer());

    router.dispatch(&event_frame("emoji_reaction", 42, "u9", json!({"emoji": "tada"})));

    assert!(recorder.calls().is_empty(), "got {:?}", recorder.calls());
}

#[test]
fn unknown_envelope_invokes_no_observer() {
    let recorder = Recorder::default();
    let mut router = Router::new(recorder.observer());

    router.dispatch(r#"{"type": "heartbeat", "seq": 9}"#);

    assert!(recorder.calls().is_empty());
}

#[test]
fn join_notifications_are_forwarded() {
    let recorder = Recorder::default();
    let mut router = Router::new(recorder.observer());

    let session = CollaborationSession {
        session_id: "s1".into(),
        document_id: 42,
        user_id: "u1".into(),
        status: crate::session::SessionStatus::Active,
        activity: crate::session::Activity::Viewing,
        cursor_position: None,
        selection: None,
        joined_at: chrono::Utc::now(),
        left_at: None,
    };
    router.notify_session_joined(&session);
    router.notify_join_failed(&SessionError::Api { status: 503, body: "busy".into() });

    assert_eq!(
        recorder.calls(),
        vec!["session_joined:s1", "join_failed:session response error: status 503"]
    );
}
