use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::RequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Flights,
    Lodging,
    Activities,
}

impl DomainKind {
    pub const ALL: [DomainKind; 3] = [Self::Flights, Self::Lodging, Self::Activities];

    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Flights => &["flights"],
            Self::Lodging => &["hotels", "stays"],
            Self::Activities => &["activities"],
        }
    }

    pub fn wire_key(self) -> &'static str {
        match self {
            Self::Flights => "flights",
            Self::Lodging => "stays",
            Self::Activities => "activities",
        }
    }

    pub fn plan_key(self) -> &'static str {
        match self {
            Self::Flights => "flights",
            Self::Lodging => "stay",
            Self::Activities => "activities",
        }
    }

    pub fn sentinel(self) -> &'static str {
        match self {
            Self::Flights => "No flights returned.",
            Self::Lodging => "No stay options returned.",
            Self::Activities => "No activities found.",
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Flights => "flights",
            Self::Lodging => "lodging",
            Self::Activities => "activities",
        }
    }

    pub fn reply_keys(self) -> Vec<&'static str> {
        let mut keys = self.keys().to_vec();
        if !keys.contains(&self.wire_key()) {
            keys.push(self.wire_key());
        }
        keys
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for DomainKind {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "flight" | "flights" => Ok(Self::Flights),
            "lodging" | "stay" | "stays" | "hotel" | "hotels" => Ok(Self::Lodging),
            "activity" | "activities" => Ok(Self::Activities),
            other => Err(RequestError::UnknownDomain(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
}

impl TravelRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.destination.trim().is_empty() {
            return Err(RequestError::MissingDestination);
        }
        if self.end_date < self.start_date {
            return Err(RequestError::DateOrder {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(RequestError::InvalidBudget(self.budget));
        }
        Ok(())
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn budget_label(&self) -> String {
        if self.budget.fract() == 0.0 && self.budget.abs() < 1e15 {
            format!("{}", self.budget as i64)
        } else {
            format!("{:.2}", self.budget)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Flight {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LodgingOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Activity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

const NAME_FIELDS: &[&str] = &["name", "title"];
const DESCRIPTION_FIELDS: &[&str] = &["description", "summary"];
const PRICE_FIELDS: &[&str] = &["price_estimate", "price", "estimated_price"];
const DURATION_FIELDS: &[&str] = &["duration", "duration_in_hours", "duration_hours"];
const AMENITY_FIELDS: &[&str] = &["amenities"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecommendationRecord {
    Flight(Flight),
    Lodging(LodgingOption),
    Activity(Activity),
}

impl RecommendationRecord {
    pub fn from_value(kind: DomainKind, value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let record = match kind {
            DomainKind::Flights => Self::Flight(Flight {
                name: field(map, NAME_FIELDS),
                description: field(map, DESCRIPTION_FIELDS),
                price_estimate: field(map, PRICE_FIELDS),
                duration: field(map, DURATION_FIELDS),
            }),
            DomainKind::Lodging => Self::Lodging(LodgingOption {
                name: field(map, NAME_FIELDS),
                description: field(map, DESCRIPTION_FIELDS),
                price_estimate: field(map, PRICE_FIELDS),
                amenities: field(map, AMENITY_FIELDS),
            }),
            DomainKind::Activities => Self::Activity(Activity {
                name: field(map, NAME_FIELDS),
                description: field(map, DESCRIPTION_FIELDS),
                price_estimate: field(map, PRICE_FIELDS),
                duration: field(map, DURATION_FIELDS),
            }),
        };
        Some(record)
    }

    pub fn kind(&self) -> DomainKind {
        match self {
            Self::Flight(_) => DomainKind::Flights,
            Self::Lodging(_) => DomainKind::Lodging,
            Self::Activity(_) => DomainKind::Activities,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Flight(flight) => flight.name.as_deref(),
            Self::Lodging(option) => option.name.as_deref(),
            Self::Activity(activity) => activity.name.as_deref(),
        }
    }
}

fn field(map: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| map.get(*name))
        .find_map(value_to_text)
}

pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(items) => {
            let parts = items.iter().filter_map(value_to_text).collect::<Vec<_>>();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Normalized outcome of one recommendation lookup. A model that found
/// nothing and a reply nobody could parse both end up as `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtractionResult {
    Found(Vec<RecommendationRecord>),
    #[default]
    Empty,
}

impl ExtractionResult {
    pub fn from_records(records: Vec<RecommendationRecord>) -> Self {
        if records.is_empty() {
            Self::Empty
        } else {
            Self::Found(records)
        }
    }

    pub fn from_values(kind: DomainKind, values: &[Value]) -> Self {
        Self::from_records(
            values
                .iter()
                .filter_map(|value| RecommendationRecord::from_value(kind, value))
                .collect(),
        )
    }

    pub fn records(&self) -> &[RecommendationRecord] {
        match self {
            Self::Found(records) => records,
            Self::Empty => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.records().serialize(serializer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CombinedPlan {
    pub flights: ExtractionResult,
    pub lodging: ExtractionResult,
    pub activities: ExtractionResult,
}

impl CombinedPlan {
    pub fn slot(&self, kind: DomainKind) -> &ExtractionResult {
        match kind {
            DomainKind::Flights => &self.flights,
            DomainKind::Lodging => &self.lodging,
            DomainKind::Activities => &self.activities,
        }
    }

    pub fn is_empty(&self) -> bool {
        DomainKind::ALL.iter().all(|kind| self.slot(*kind).is_empty())
    }

    pub fn to_envelope(&self) -> PlanEnvelope {
        PlanEnvelope {
            flights: PlanSlot::new(&self.flights, DomainKind::Flights),
            stay: PlanSlot::new(&self.lodging, DomainKind::Lodging),
            activities: PlanSlot::new(&self.activities, DomainKind::Activities),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEnvelope {
    pub flights: PlanSlot,
    pub stay: PlanSlot,
    pub activities: PlanSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PlanSlot {
    Records(Vec<RecommendationRecord>),
    Sentinel(&'static str),
}

impl PlanSlot {
    fn new(result: &ExtractionResult, kind: DomainKind) -> Self {
        if result.is_empty() {
            Self::Sentinel(kind.sentinel())
        } else {
            Self::Records(result.records().to_vec())
        }
    }
}

pub fn service_reply(kind: DomainKind, result: &ExtractionResult) -> Value {
    let mut body = Map::new();
    body.insert(
        kind.wire_key().to_string(),
        serde_json::to_value(result).unwrap_or_else(|_| Value::Array(Vec::new())),
    );
    Value::Object(body)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationContext {
    pub session_id: Uuid,
    pub user_id: String,
    pub domain: DomainKind,
}

impl InvocationContext {
    pub fn new(domain: DomainKind) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id: format!("user_{}", domain.as_code()),
            domain,
        }
    }
}
