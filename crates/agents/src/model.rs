use std::future::Future;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use wayfarer_core::{InvocationContext, Prompt};

use crate::config::ModelSettings;
use crate::error::InvocationError;

pub trait CompletionModel: Send + Sync {
    fn model_name(&self) -> &str;

    fn complete(
        &self,
        context: &InvocationContext,
        prompt: &Prompt,
    ) -> impl Future<Output = Result<String, InvocationError>> + Send;
}

#[derive(Debug, Clone)]
pub struct OpenAiModel {
    client: Client,
    settings: ModelSettings,
}

impl OpenAiModel {
    pub fn new(settings: ModelSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(6))
            .timeout(settings.timeout)
            .build()
            .context("failed to build model HTTP client")?;
        Ok(Self { client, settings })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }
}

impl CompletionModel for OpenAiModel {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn complete(
        &self,
        context: &InvocationContext,
        prompt: &Prompt,
    ) -> Result<String, InvocationError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(InvocationError::NotConfigured)?;

        let payload = json!({
            "model": self.settings.model,
            "input": [
                {
                    "role": "system",
                    "content": [{ "type": "input_text", "text": prompt.system }]
                },
                {
                    "role": "user",
                    "content": [{ "type": "input_text", "text": prompt.user }]
                }
            ],
            "metadata": {
                "session_id": context.session_id.to_string(),
                "user_id": context.user_id,
                "domain": context.domain.as_code()
            }
        });

        let response = self
            .client
            .post(format!(
                "{}/responses",
                self.settings.base_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InvocationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        output_text(&body)
            .filter(|text| !text.trim().is_empty())
            .ok_or(InvocationError::EmptyCompletion)
    }
}

/// Text of a Responses API payload: `output_text` when present, otherwise
/// every `output_text` content part joined by blank lines.
pub fn output_text(payload: &Value) -> Option<String> {
    if let Some(value) = payload.get("output_text").and_then(Value::as_str) {
        return Some(value.to_string());
    }
    let chunks = payload
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>();

    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join("\n\n"))
    }
}
