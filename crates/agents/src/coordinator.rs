use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, instrument, warn};
use wayfarer_core::{
    extract_from_value, extract_with_keys, CombinedPlan, DomainKind, ExtractionResult,
    TravelRequest,
};
use wayfarer_observability::AppMetrics;

use crate::client::RecommendationClient;

pub struct Coordinator<C> {
    flights: C,
    lodging: C,
    activities: C,
    metrics: Arc<AppMetrics>,
}

impl<C> Coordinator<C>
where
    C: RecommendationClient,
{
    pub fn new(flights: C, lodging: C, activities: C, metrics: Arc<AppMetrics>) -> Self {
        debug_assert_eq!(flights.kind(), DomainKind::Flights);
        debug_assert_eq!(lodging.kind(), DomainKind::Lodging);
        debug_assert_eq!(activities.kind(), DomainKind::Activities);
        Self {
            flights,
            lodging,
            activities,
            metrics,
        }
    }

    pub fn client(&self, kind: DomainKind) -> &C {
        match kind {
            DomainKind::Flights => &self.flights,
            DomainKind::Lodging => &self.lodging,
            DomainKind::Activities => &self.activities,
        }
    }

    /// Dropping the returned future cancels the calls still running.
    #[instrument(skip_all, fields(destination = %request.destination))]
    pub async fn plan(&self, request: &TravelRequest) -> CombinedPlan {
        let started = Instant::now();
        self.metrics.inc_plan();

        let (flights, lodging, activities) = tokio::join!(
            self.gather(&self.flights, request),
            self.gather(&self.lodging, request),
            self.gather(&self.activities, request),
        );
        let plan = CombinedPlan {
            flights,
            lodging,
            activities,
        };

        self.metrics.observe_plan_latency(started.elapsed());
        info!(
            flights = plan.flights.len(),
            lodging = plan.lodging.len(),
            activities = plan.activities.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "plan assembled"
        );
        plan
    }

    async fn gather(&self, client: &C, request: &TravelRequest) -> ExtractionResult {
        let kind = client.kind();
        match client.call(request).await {
            Ok(raw) => normalize_reply(kind, &raw),
            Err(err) => {
                warn!(domain = %kind, error_kind = err.kind(), error = %err, "service call failed");
                ExtractionResult::Empty
            }
        }
    }
}

/// Falls back to re-extracting text a service leaked under its key or as a
/// JSON-encoded string.
pub fn normalize_reply(kind: DomainKind, raw: &Value) -> ExtractionResult {
    let keys = kind.reply_keys();
    let first = extract_from_value(raw, &keys, kind);
    if !first.is_empty() {
        return first;
    }

    let second = match raw {
        Value::Object(map) => keys
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(Value::as_str)
            .map(|text| extract_with_keys(text, &keys, kind)),
        Value::String(text) => serde_json::from_str::<Value>(text.trim())
            .ok()
            .filter(Value::is_string)
            .map(|inner| extract_from_value(&inner, &keys, kind)),
        _ => None,
    };
    second.unwrap_or_default()
}
