use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    plans_total: AtomicU64,
    recommendations_total: AtomicU64,
    model_calls_total: AtomicU64,
    model_failures_total: AtomicU64,
    empty_results_total: AtomicU64,
    total_plan_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub plans_total: u64,
    pub recommendations_total: u64,
    pub model_calls_total: u64,
    pub model_failures_total: u64,
    pub empty_results_total: u64,
    pub avg_plan_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_plan(&self) {
        self.plans_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_recommendation(&self) {
        self.recommendations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_model_call(&self) {
        self.model_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_model_failure(&self) {
        self.model_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_empty_result(&self) {
        self.empty_results_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_plan_latency(&self, duration: Duration) {
        self.total_plan_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let plans = self.plans_total.load(Ordering::Relaxed);
        let latency = self.total_plan_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            plans_total: plans,
            recommendations_total: self.recommendations_total.load(Ordering::Relaxed),
            model_calls_total: self.model_calls_total.load(Ordering::Relaxed),
            model_failures_total: self.model_failures_total.load(Ordering::Relaxed),
            empty_results_total: self.empty_results_total.load(Ordering::Relaxed),
            avg_plan_latency_millis: if plans == 0 {
                0.0
            } else {
                latency as f64 / plans as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,wayfarer_api=info,wayfarer_agents=info,wayfarer_core=warn",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
