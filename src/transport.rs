use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::{Result, TableTalkError};
use crate::models::{InferenceRequest, InferenceResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[async_trait]
pub trait Transport: Send + Sync {
    async fn chat(&self, req: &InferenceRequest) -> Result<InferenceResponse>;
}

/// Client for the hosted inference endpoint's OpenAI-compatible
/// chat-completions route. One request per send action; failures are
/// classified and surfaced to the caller, never retried.
pub struct HostedTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HostedTransport {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TableTalkError::InferenceTransport(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Transport for HostedTransport {
    async fn chat(&self, req: &InferenceRequest) -> Result<InferenceResponse> {
        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .map_err(|e| TableTalkError::InferenceTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TableTalkError::InferenceTransport(format!(
                "inference endpoint returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TableTalkError::MalformedResponse(e.to_string()))
    }
}
