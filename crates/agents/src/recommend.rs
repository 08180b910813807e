use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use wayfarer_core::{
    extract, render_prompt, service_reply, DomainKind, ExtractionResult, InvocationContext,
    TravelRequest,
};
use wayfarer_observability::AppMetrics;

use crate::error::InvocationError;
use crate::model::CompletionModel;

const PREVIEW_CHARS: usize = 200;

pub struct RecommendationAgent<M> {
    kind: DomainKind,
    model: Arc<M>,
    timeout: Duration,
    metrics: Arc<AppMetrics>,
}

impl<M> Clone for RecommendationAgent<M> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            model: Arc::clone(&self.model),
            timeout: self.timeout,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<M> RecommendationAgent<M>
where
    M: CompletionModel,
{
    pub fn new(kind: DomainKind, model: Arc<M>, timeout: Duration, metrics: Arc<AppMetrics>) -> Self {
        Self {
            kind,
            model,
            timeout,
            metrics,
        }
    }

    pub fn kind(&self) -> DomainKind {
        self.kind
    }

    #[instrument(skip(self, request), fields(domain = %self.kind, model = self.model.model_name()))]
    pub async fn recommend(&self, request: &TravelRequest) -> ExtractionResult {
        self.metrics.inc_recommendation();

        let result = match self.complete(request).await {
            Ok(text) => {
                let result = extract(&text, self.kind);
                if result.is_empty() {
                    warn!(preview = %preview(&text), "model reply held no usable list");
                }
                result
            }
            Err(err) => {
                self.metrics.inc_model_failure();
                warn!(error_kind = err.kind(), error = %err, "model invocation failed");
                ExtractionResult::Empty
            }
        };

        if result.is_empty() {
            self.metrics.inc_empty_result();
        }
        info!(records = result.len(), "recommendation finished");
        result
    }

    pub async fn reply(&self, request: &TravelRequest) -> Value {
        service_reply(self.kind, &self.recommend(request).await)
    }

    async fn complete(&self, request: &TravelRequest) -> Result<String, InvocationError> {
        let prompt = render_prompt(self.kind, request);
        let context = InvocationContext::new(self.kind);
        debug!(session_id = %context.session_id, "invoking model");

        self.metrics.inc_model_call();
        tokio::time::timeout(self.timeout, self.model.complete(&context, &prompt))
            .await
            .map_err(|_| InvocationError::Timeout)?
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
