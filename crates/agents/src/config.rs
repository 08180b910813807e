use std::env;
use std::time::Duration;

use wayfarer_core::DomainKind;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_SERVICE_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECONDS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: ModelSettings,
    pub service_timeout: Duration,
    pub flights_url: Option<String>,
    pub lodging_url: Option<String>,
    pub activities_url: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            service_timeout: Duration::from_secs(DEFAULT_SERVICE_TIMEOUT_SECONDS),
            flights_url: None,
            lodging_url: None,
            activities_url: None,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let api_key = non_empty_var("WAYFARER_OPENAI_API_KEY").or_else(|| non_empty_var("OPENAI_API_KEY"));

        Self {
            model: ModelSettings {
                api_key,
                model: non_empty_var("WAYFARER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: non_empty_var("WAYFARER_OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                timeout: seconds_var("WAYFARER_MODEL_TIMEOUT_SECONDS", DEFAULT_MODEL_TIMEOUT_SECONDS),
            },
            service_timeout: seconds_var(
                "WAYFARER_SERVICE_TIMEOUT_SECONDS",
                DEFAULT_SERVICE_TIMEOUT_SECONDS,
            ),
            flights_url: non_empty_var("WAYFARER_FLIGHTS_URL"),
            lodging_url: non_empty_var("WAYFARER_LODGING_URL"),
            activities_url: non_empty_var("WAYFARER_ACTIVITIES_URL"),
        }
    }

    pub fn remote_url(&self, kind: DomainKind) -> Option<&str> {
        match kind {
            DomainKind::Flights => self.flights_url.as_deref(),
            DomainKind::Lodging => self.lodging_url.as_deref(),
            DomainKind::Activities => self.activities_url.as_deref(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn seconds_var(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        env::var(name)
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(default),
    )
}
