use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use wayfarer_core::{DomainKind, TravelRequest};

use crate::error::InvocationError;
use crate::model::CompletionModel;
use crate::recommend::RecommendationAgent;

pub trait RecommendationClient: Send + Sync {
    fn kind(&self) -> DomainKind;

    fn call(
        &self,
        request: &TravelRequest,
    ) -> impl Future<Output = Result<Value, InvocationError>> + Send;
}

impl<M> RecommendationClient for RecommendationAgent<M>
where
    M: CompletionModel,
{
    fn kind(&self) -> DomainKind {
        RecommendationAgent::kind(self)
    }

    async fn call(&self, request: &TravelRequest) -> Result<Value, InvocationError> {
        Ok(self.reply(request).await)
    }
}

#[derive(Debug, Clone)]
pub struct RemoteRecommendation {
    kind: DomainKind,
    url: String,
    client: Client,
}

impl RemoteRecommendation {
    pub fn new(kind: DomainKind, url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(timeout)
            .build()
            .context("failed to build service HTTP client")?;
        Ok(Self {
            kind,
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RecommendationClient for RemoteRecommendation {
    fn kind(&self) -> DomainKind {
        self.kind
    }

    async fn call(&self, request: &TravelRequest) -> Result<Value, InvocationError> {
        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(InvocationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(domain = %self.kind, url = %self.url, bytes = body.len(), "service replied");
        // Services that answer with prose instead of JSON are passed on as text.
        Ok(match serde_json::from_str::<Value>(&body) {
            Ok(value) => value,
            Err(_) => Value::String(body),
        })
    }
}

pub enum ServiceEndpoint<M> {
    Local(RecommendationAgent<M>),
    Remote(RemoteRecommendation),
}

impl<M> ServiceEndpoint<M> {
    pub fn describe(&self) -> String {
        match self {
            Self::Local(_) => "local".to_string(),
            Self::Remote(remote) => remote.url().to_string(),
        }
    }
}

impl<M> RecommendationClient for ServiceEndpoint<M>
where
    M: CompletionModel,
{
    fn kind(&self) -> DomainKind {
        match self {
            Self::Local(agent) => agent.kind(),
            Self::Remote(remote) => remote.kind(),
        }
    }

    async fn call(&self, request: &TravelRequest) -> Result<Value, InvocationError> {
        match self {
            Self::Local(agent) => RecommendationClient::call(agent, request).await,
            Self::Remote(remote) => remote.call(request).await,
        }
    }
}
