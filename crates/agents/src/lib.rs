pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod recommend;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use wayfarer_core::DomainKind;
use wayfarer_observability::AppMetrics;

pub use client::{RecommendationClient, RemoteRecommendation, ServiceEndpoint};
pub use config::{AgentConfig, ModelSettings};
pub use coordinator::{normalize_reply, Coordinator};
pub use error::InvocationError;
pub use model::{CompletionModel, OpenAiModel};
pub use recommend::RecommendationAgent;

pub struct TravelDesk<M> {
    flights: RecommendationAgent<M>,
    lodging: RecommendationAgent<M>,
    activities: RecommendationAgent<M>,
    coordinator: Coordinator<ServiceEndpoint<M>>,
}

impl<M> TravelDesk<M>
where
    M: CompletionModel,
{
    pub fn new(model: Arc<M>, config: &AgentConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let agent = |kind| {
            RecommendationAgent::new(kind, model.clone(), config.model.timeout, metrics.clone())
        };
        let flights = agent(DomainKind::Flights);
        let lodging = agent(DomainKind::Lodging);
        let activities = agent(DomainKind::Activities);

        let endpoint = |local: &RecommendationAgent<M>| -> Result<ServiceEndpoint<M>> {
            Ok(match config.remote_url(local.kind()) {
                Some(url) => ServiceEndpoint::Remote(RemoteRecommendation::new(
                    local.kind(),
                    url,
                    config.service_timeout,
                )?),
                None => ServiceEndpoint::Local(local.clone()),
            })
        };
        let coordinator = Coordinator::new(
            endpoint(&flights)?,
            endpoint(&lodging)?,
            endpoint(&activities)?,
            metrics,
        );

        for kind in DomainKind::ALL {
            info!(
                domain = %kind,
                endpoint = %coordinator.client(kind).describe(),
                model = model.model_name(),
                "recommendation service wired"
            );
        }

        Ok(Self {
            flights,
            lodging,
            activities,
            coordinator,
        })
    }

    pub fn agent(&self, kind: DomainKind) -> &RecommendationAgent<M> {
        match kind {
            DomainKind::Flights => &self.flights,
            DomainKind::Lodging => &self.lodging,
            DomainKind::Activities => &self.activities,
        }
    }

    pub fn coordinator(&self) -> &Coordinator<ServiceEndpoint<M>> {
        &self.coordinator
    }
}
