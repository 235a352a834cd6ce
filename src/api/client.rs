//! HTTP client for the StudyDeck remote store.
//!
//! The remote store is a small JSON-over-HTTP service: `/register`,
//! `/login`, `/logout`, `/verify` for authentication and `/data` for
//! reading and writing the whole document. Authenticated calls carry the
//! bearer token; the teardown-time beacon write carries it as a query
//! parameter instead, because a page being torn down cannot set headers
//! on a fire-and-forget send.

use std::time::Duration;

use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{AuthSuccess, Document, UserProfile};

use super::ApiError;

/// HTTP request timeout in seconds.
/// Bounds verify/load calls so an unresponsive store cannot starve the
/// cache of its stale-value fallback.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Interface to the remote authoritative store. `ApiClient` is the real
/// implementation; tests substitute a counting mock.
pub trait RemoteStore {
    fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> impl std::future::Future<Output = Result<AuthSuccess, ApiError>> + Send;

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<AuthSuccess, ApiError>> + Send;

    fn logout(&self, token: &str)
        -> impl std::future::Future<Output = Result<(), ApiError>> + Send;

    fn verify(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserProfile, ApiError>> + Send;

    fn read_document(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Document, ApiError>> + Send;

    fn write_document(
        &self,
        token: &str,
        document: &Document,
    ) -> impl std::future::Future<Output = Result<(), ApiError>> + Send;

    /// Best-effort fire-and-forget write for page teardown. Returns as soon
    /// as the send is handed off; the response is never awaited and any
    /// failure is invisible to the caller.
    fn send_beacon(&self, token: &str, document: &Document);
}

#[derive(Debug, Deserialize)]
struct AuthEnvelope {
    #[serde(default)]
    success: bool,
    token: Option<String>,
    user: Option<UserProfile>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyEnvelope {
    #[serde(default)]
    success: bool,
    user: Option<UserProfile>,
}

/// API client for the StudyDeck remote store.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_auth(response: reqwest::Response) -> Result<AuthSuccess, ApiError> {
        let envelope: AuthEnvelope = response.json().await?;
        match (envelope.success, envelope.token, envelope.user) {
            (true, Some(token), Some(user)) => Ok(AuthSuccess { token, user }),
            _ => Err(ApiError::InvalidResponse(
                envelope
                    .error
                    .unwrap_or_else(|| "missing token or user in auth response".to_string()),
            )),
        }
    }
}

impl RemoteStore for ApiClient {
    async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthSuccess, ApiError> {
        let response = self
            .client
            .post(self.url("/register"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "firstName": first_name,
                "lastName": last_name,
            }))
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_auth(response).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ApiError> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_auth(response).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/logout"))
            .bearer_auth(token)
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    async fn verify(&self, token: &str) -> Result<UserProfile, ApiError> {
        let response = self
            .client
            .get(self.url("/verify"))
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let envelope: VerifyEnvelope = response.json().await?;
        match (envelope.success, envelope.user) {
            (true, Some(user)) => Ok(user),
            _ => Err(ApiError::InvalidResponse(
                "missing user in verify response".to_string(),
            )),
        }
    }

    async fn read_document(&self, token: &str) -> Result<Document, ApiError> {
        let response = self
            .client
            .get(self.url("/data"))
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn write_document(&self, token: &str, document: &Document) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url("/data"))
            .bearer_auth(token)
            .json(document)
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    fn send_beacon(&self, token: &str, document: &Document) {
        // Serialize before handing off so the spawned task owns its payload
        // and the caller can tear down immediately.
        let body = match serde_json::to_vec(document) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to serialize document for beacon write");
                return;
            }
        };

        let url = format!("{}/data?token={}", self.base_url, token);
        let client = self.client.clone();
        tokio::spawn(async move {
            match client
                .post(&url)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
            {
                Ok(response) => debug!(status = %response.status(), "Beacon write completed"),
                Err(e) => debug!(error = %e, "Beacon write failed"),
            }
        });
    }
}
