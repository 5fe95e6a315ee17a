//! Session API client — the request/response seam to the collaboration
//! backend.
//!
//! The engine only ever talks to [`SessionBackend`], so tests substitute a
//! mock while production wires in [`HttpSessionBackend`]. Pure parsing lives
//! in `parse_session` for testability.

use async_trait::async_trait;
use tracing::debug;

use crate::config::EngineConfig;
use crate::session::{CollaborationSession, CreateSessionRequest, SessionError};

// =============================================================================
// TRAIT
// =============================================================================

/// Async seam for session creation. Enables mocking in tests.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Create a session scoped to a document.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the request fails, the backend rejects
    /// it, or the response body is malformed.
    async fn create_session(
        &self,
        document_id: i64,
        request: &CreateSessionRequest,
    ) -> Result<CollaborationSession, SessionError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// Production backend: `POST {base}/documents/{id}/sessions`.
pub struct HttpSessionBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSessionBackend {
    /// Build the HTTP client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::HttpClientBuild`] if the underlying client
    /// cannot be constructed.
    pub fn new(config: &EngineConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SessionError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.http_base.clone() })
    }

    fn sessions_url(&self, document_id: i64) -> String {
        format!("{}/documents/{document_id}/sessions", self.base_url)
    }
}

#[async_trait]
impl SessionBackend for HttpSessionBackend {
    async fn create_session(
        &self,
        document_id: i64,
        request: &CreateSessionRequest,
    ) -> Result<CollaborationSession, SessionError> {
        let url = self.sessions_url(document_id);
        debug!(%document_id, url, "session: create request");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| SessionError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SessionError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(SessionError::Api { status, body: text });
        }

        parse_session(&text)
    }
}

/// Decode a create-session response body.
fn parse_session(text: &str) -> Result<CollaborationSession, SessionError> {
    serde_json::from_str(text).map_err(|e| SessionError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;
