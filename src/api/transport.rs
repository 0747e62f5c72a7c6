//! HTTP Transport
//!
//! The one place a call actually suspends. The transport hands back every
//! response it receives, whatever the status; classifying statuses is the
//! client's job.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::error::{ApiError, ApiResult};
use super::request::{IncomingResponse, OutgoingRequest};

/// Sends a fully shaped request over the wire
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> ApiResult<IncomingResponse>;
}

/// Transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport; without a timeout a hung call stays pending
    pub fn new(timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> ApiResult<IncomingResponse> {
        let url = request.url()?;

        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in &request.headers {
            let value = reqwest::header::HeaderValue::from_str(value).map_err(|e| {
                ApiError::InvalidRequest(format!("header {}: {}", name, e))
            })?;
            builder = builder.header(name.as_str(), value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(IncomingResponse {
            status,
            headers,
            body,
        })
    }
}
