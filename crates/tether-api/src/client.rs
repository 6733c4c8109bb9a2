// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Tether backend.
//!
//! Provides [`BackendClient`] which handles URL construction, bearer
//! authentication, `{data: ...}` envelope unwrapping and status mapping.

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use tether_config::model::BackendConfig;
use tether_core::types::{CallRecord, InitiatedCall, RegisterDeviceRequest};
use tether_core::{CallSignalingApi, DeviceToken, DeviceTokenApi, SessionToken, TetherError};

use crate::envelope::{self, JoinResponse};

/// HTTP client for backend communication.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a client for `config.base_url` with the configured timeout.
    pub fn new(config: &BackendConfig) -> Result<Self, TetherError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TetherError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, TetherError> {
        let raw = format!("{}{path}", self.base_url);
        let parsed = if query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, query)
        };
        parsed.map_err(|e| TetherError::Config(format!("invalid backend URL `{raw}`: {e}")))
    }

    /// Sends an authorized request and returns the raw successful response.
    async fn send(
        &self,
        method: Method,
        url: Url,
        session: &SessionToken,
        body: Option<Value>,
    ) -> Result<reqwest::Response, TetherError> {
        let endpoint = url.path().to_string();
        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(session.expose());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| TetherError::Backend {
            message: format!("HTTP request to {endpoint} failed: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(method = %method, endpoint = %endpoint, status = %status, "backend response received");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            warn!(endpoint = %endpoint, "backend rejected session token");
            return Err(TetherError::Unauthenticated);
        }

        let message = match envelope::error_message(&body) {
            Some(detail) => format!("{endpoint} returned {status}: {detail}"),
            None => format!("{endpoint} returned {status}"),
        };
        Err(TetherError::Backend {
            message,
            status: Some(status.as_u16()),
            source: None,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TetherError> {
        let body: Value = response.json().await.map_err(|e| TetherError::Backend {
            message: format!("failed to read response body: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;
        envelope::unwrap_data(body).map_err(|e| TetherError::Backend {
            message: format!("failed to parse response body: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl DeviceTokenApi for BackendClient {
    async fn register_device_token(
        &self,
        session: &SessionToken,
        request: &RegisterDeviceRequest,
    ) -> Result<(), TetherError> {
        let url = self.url("/device-tokens/register", &[])?;
        let body = serde_json::to_value(request).map_err(|e| TetherError::Internal(e.to_string()))?;
        self.send(Method::POST, url, session, Some(body)).await?;
        Ok(())
    }

    async fn unregister_device_token(
        &self,
        session: &SessionToken,
        token: &DeviceToken,
    ) -> Result<(), TetherError> {
        let url = self.url("/device-tokens/unregister", &[])?;
        let body = json!({ "token": token.as_str() });
        self.send(Method::DELETE, url, session, Some(body)).await?;
        Ok(())
    }
}

#[async_trait]
impl CallSignalingApi for BackendClient {
    async fn initiate_call(
        &self,
        session: &SessionToken,
        receiver_id: &str,
    ) -> Result<InitiatedCall, TetherError> {
        let url = self.url("/call/initiate", &[])?;
        let body = json!({ "receiverId": receiver_id });
        let response = self.send(Method::POST, url, session, Some(body)).await?;
        Self::read_json(response).await
    }

    async fn join_token(
        &self,
        session: &SessionToken,
        channel_name: &str,
    ) -> Result<String, TetherError> {
        let url = self.url("/call/join", &[("channelName", channel_name)])?;
        let response = self.send(Method::GET, url, session, None).await?;
        let join: JoinResponse = Self::read_json(response).await?;
        Ok(join.token)
    }

    async fn end_call(
        &self,
        session: &SessionToken,
        channel_name: &str,
    ) -> Result<(), TetherError> {
        let url = self.url("/call/end", &[("channelName", channel_name)])?;
        self.send(Method::POST, url, session, None).await?;
        Ok(())
    }

    async fn call_history(&self, session: &SessionToken) -> Result<Vec<CallRecord>, TetherError> {
        let url = self.url("/call/history", &[])?;
        let response = self.send(Method::GET, url, session, None).await?;
        Self::read_json(response).await
    }
}
