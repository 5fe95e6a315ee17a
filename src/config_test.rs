use std::sync::{Mutex, MutexGuard};

use super::*;

/// Process environment is shared test state; every env-touching test holds
/// this lock for its whole body.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clean_env() -> MutexGuard<'static, ()> {
    let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    unsafe {
        std::env::remove_var("COLLAB_HTTP_BASE");
        std::env::remove_var("COLLAB_WS_URL");
        std::env::remove_var("COLLAB_RECONNECT_DELAY_MS");
        std::env::remove_var("COLLAB_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("COLLAB_CONNECT_TIMEOUT_SECS");
    }
    guard
}

#[test]
fn from_env_defaults() {
    let _env = clean_env();

    let cfg = EngineConfig::from_env();
    assert_eq!(cfg.http_base, DEFAULT_HTTP_BASE);
    assert_eq!(cfg.ws_url, DEFAULT_WS_URL);
    assert_eq!(cfg.reconnect_delay, Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS));
    assert_eq!(cfg.request_timeout, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    assert_eq!(cfg.connect_timeout, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
    assert_eq!(cfg, EngineConfig::default());
}

#[test]
fn from_env_overrides() {
    let _env = clean_env();
    unsafe {
        std::env::set_var("COLLAB_HTTP_BASE", "https://collab.example.test/api/");
        std::env::set_var("COLLAB_WS_URL", "wss://collab.example.test/ws");
        std::env::set_var("COLLAB_RECONNECT_DELAY_MS", "250");
        std::env::set_var("COLLAB_REQUEST_TIMEOUT_SECS", "3");
    }

    let cfg = EngineConfig::from_env();
    assert_eq!(cfg.http_base, "https://collab.example.test/api");
    assert_eq!(cfg.ws_url, "wss://collab.example.test/ws");
    assert_eq!(cfg.reconnect_delay, Duration::from_millis(250));
    assert_eq!(cfg.request_timeout, Duration::from_secs(3));
    assert_eq!(cfg.connect_timeout, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));

    unsafe {
        std::env::remove_var("COLLAB_HTTP_BASE");
        std::env::remove_var("COLLAB_WS_URL");
        std::env::remove_var("COLLAB_RECONNECT_DELAY_MS");
        std::env::remove_var("COLLAB_REQUEST_TIMEOUT_SECS");
    }
}

#[test]
fn from_env_ignores_unparseable_values() {
    let _env = clean_env();
    unsafe {
        std::env::set_var("COLLAB_RECONNECT_DELAY_MS", "soon");
    }

    let cfg = EngineConfig::from_env();
    assert_eq!(cfg.reconnect_delay, Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS));

    unsafe {
        std::env::remove_var("COLLAB_RECONNECT_DELAY_MS");
    }
}

#[test]
fn new_trims_trailing_slash() {
    let cfg = EngineConfig::new("http://localhost:9000/api/", "ws://localhost:9000/ws");
    assert_eq!(cfg.http_base, "http://localhost:9000/api");
    assert_eq!(cfg.reconnect_delay, Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS));
}
