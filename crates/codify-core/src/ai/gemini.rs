use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::CompletionService;
use crate::config::Config;
use crate::error::RemoteCallError;

const GEMINI_PATH: &str = "/api/v1/ai/gemini";

#[derive(Serialize)]
struct GeminiRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    product: Option<GeminiProduct>,
}

#[derive(Deserialize)]
struct GeminiProduct {
    response: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_url)
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, GEMINI_PATH)
    }

    pub async fn query(&self, message: &str) -> Result<String, RemoteCallError> {
        let url = self.endpoint();

        // `.json()` sets Content-Type: application/json
        let response = self
            .client
            .post(&url)
            .json(&GeminiRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteCallError::Status(status));
        }

        let body = response.text().await?;
        parse_reply(&body)
    }
}

/// Pull `product.response` out of a success body.
fn parse_reply(body: &str) -> Result<String, RemoteCallError> {
    let parsed: GeminiResponse =
        serde_json::from_str(body).map_err(RemoteCallError::MalformedBody)?;

    parsed
        .product
        .and_then(|product| product.response)
        .ok_or(RemoteCallError::MissingResponse)
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, message: &str) -> Result<String, RemoteCallError> {
        self.query(message).await
    }
}
