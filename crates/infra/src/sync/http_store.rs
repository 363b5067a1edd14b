//! HTTP remote session store
//!
//! Implements the core `SessionStore` port against the hosted session
//! API. One resource per user: `GET`/`PUT`/`DELETE
//! /users/{user_id}/session`, where the `PUT` is an insert-or-replace so
//! the store never holds more than one active session per user.

use std::time::Duration;

use async_trait::async_trait;
use repforge_core::session::SessionStore;
use repforge_domain::{Result, SyncConfig, WorkoutSession};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::errors::SyncError;

/// Configuration for the remote session store client
#[derive(Debug, Clone)]
pub struct HttpSessionStoreConfig {
    /// Base URL for the session API
    pub base_url: String,
    /// Bearer token, if the deployment requires one
    pub api_token: Option<String>,
    /// Timeout for each request
    pub timeout: Duration,
}

impl HttpSessionStoreConfig {
    /// Build from the application sync config.
    pub fn from_sync_config(config: &SyncConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone(),
            timeout: Duration::from_secs(config.request_timeout_seconds),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    session_id: String,
}

/// Remote session store over HTTP
pub struct HttpSessionStore {
    client: reqwest::Client,
    config: HttpSessionStoreConfig,
}

impl HttpSessionStore {
    /// Create a client with the given configuration.
    pub fn new(config: HttpSessionStoreConfig) -> std::result::Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn session_url(&self, user_id: &str) -> String {
        format!("{}/users/{}/session", self.config.base_url.trim_end_matches('/'), user_id)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> std::result::Result<Response, SyncError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("Request failed: {e}")))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SyncError::Auth(format!("Rejected with status {}", response.status())))
            }
            status if status.is_server_error() => {
                Err(SyncError::Server(format!("Server returned {status}")))
            }
            _ => Ok(response),
        }
    }

    #[instrument(skip(self))]
    async fn get_session(
        &self,
        user_id: &str,
    ) -> std::result::Result<Option<WorkoutSession>, SyncError> {
        let response = self.send(self.client.get(self.session_url(user_id))).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let session = response
                    .json()
                    .await
                    .map_err(|e| SyncError::Client(format!("Malformed session body: {e}")))?;
                Ok(Some(session))
            }
            status => Err(SyncError::Client(format!("Unexpected status {status}"))),
        }
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn put_session(
        &self,
        session: &WorkoutSession,
    ) -> std::result::Result<String, SyncError> {
        let url = self.session_url(&session.user_id);
        let response = self.send(self.client.put(url).json(session)).await?;

        if !response.status().is_success() {
            return Err(SyncError::Client(format!(
                "Upsert rejected with status {}",
                response.status()
            )));
        }

        let body: UpsertResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Client(format!("Malformed upsert response: {e}")))?;
        debug!(session_id = %body.session_id, "session upserted");
        Ok(body.session_id)
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, user_id: &str) -> std::result::Result<(), SyncError> {
        let response = self.send(self.client.delete(self.session_url(user_id))).await?;

        match response.status() {
            // Deleting a missing row keeps finalize idempotent
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(SyncError::Client(format!("Delete rejected with status {status}"))),
        }
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn fetch_active(&self, user_id: &str) -> Result<Option<WorkoutSession>> {
        Ok(self.get_session(user_id).await?)
    }

    async fn upsert_active(&self, session: &WorkoutSession) -> Result<String> {
        Ok(self.put_session(session).await?)
    }

    async fn delete_active(&self, user_id: &str) -> Result<()> {
        Ok(self.delete_session(user_id).await?)
    }
}
