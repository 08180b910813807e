use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use crate::models::{DomainKind, ExtractionResult};

const FENCE: &str = "```";

static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("valid json fence regex")
});

// Only tried after JSON_BLOCK; a closing fence can pose as an untagged opener.
static BARE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("valid bare fence regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    FencedBlock,
    FenceStripped,
    LineTrimmed,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::FencedBlock => "fenced_block",
            Self::FenceStripped => "fence_stripped",
            Self::LineTrimmed => "line_trimmed",
        }
    }
}

/// Runs the fallback chain and returns the first non-empty list found under
/// one of `keys`, together with the strategy that found it.
pub fn locate_list(raw: &str, keys: &[&str]) -> Option<(Strategy, Vec<Value>)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(list) = parse_and_lookup(trimmed, keys) {
        return Some((Strategy::Direct, list));
    }

    let fenced = [&*JSON_BLOCK, &*BARE_BLOCK].into_iter().find_map(|pattern| {
        pattern
            .captures_iter(trimmed)
            .filter_map(|captures| captures.get(1))
            .find_map(|body| parse_and_lookup(body.as_str().trim(), keys))
    });
    if let Some(list) = fenced {
        return Some((Strategy::FencedBlock, list));
    }

    let stripped = trimmed.replace("```json", "").replace(FENCE, "");
    if let Some(list) = parse_and_lookup(stripped.trim(), keys) {
        return Some((Strategy::FenceStripped, list));
    }

    let mut lines = trimmed.split('\n').collect::<Vec<_>>();
    if lines.first().is_some_and(|line| line.contains(FENCE)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.contains(FENCE)) {
        lines.pop();
    }
    parse_and_lookup(lines.join("\n").trim(), keys).map(|list| (Strategy::LineTrimmed, list))
}

pub fn extract_list(raw: &str, keys: &[&str]) -> Option<Vec<Value>> {
    locate_list(raw, keys).map(|(_, list)| list)
}

pub fn extract(raw: &str, kind: DomainKind) -> ExtractionResult {
    extract_with_keys(raw, kind.keys(), kind)
}

pub fn extract_with_keys(raw: &str, keys: &[&str], kind: DomainKind) -> ExtractionResult {
    match locate_list(raw, keys) {
        Some((strategy, items)) => {
            let result = ExtractionResult::from_values(kind, &items);
            debug!(
                domain = %kind,
                strategy = strategy.as_str(),
                items = items.len(),
                records = result.len(),
                "recovered list from completion"
            );
            result
        }
        None => {
            debug!(domain = %kind, "no extraction strategy recovered a list");
            ExtractionResult::Empty
        }
    }
}

pub fn extract_from_value(value: &Value, keys: &[&str], kind: DomainKind) -> ExtractionResult {
    match value {
        Value::String(text) => extract_with_keys(text, keys, kind),
        Value::Array(items) => ExtractionResult::from_values(kind, items),
        Value::Object(_) => lookup(value, keys)
            .map(|items| ExtractionResult::from_values(kind, &items))
            .unwrap_or_default(),
        _ => ExtractionResult::Empty,
    }
}

pub fn lookup(document: &Value, keys: &[&str]) -> Option<Vec<Value>> {
    let object = document.as_object()?;
    keys.iter().find_map(|key| match object.get(*key) {
        Some(Value::Array(items)) if !items.is_empty() => Some(items.clone()),
        _ => None,
    })
}

fn parse_and_lookup(candidate: &str, keys: &[&str]) -> Option<Vec<Value>> {
    if candidate.is_empty() {
        return None;
    }
    let document = serde_json::from_str::<Value>(candidate).ok()?;
    lookup(&document, keys)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fence {
    Bare,
    Json,
    Inline,
    Tagged(&'static str),
}

pub fn render(kind: DomainKind, result: &ExtractionResult, fence: Fence) -> String {
    let mut body = serde_json::Map::new();
    body.insert(kind.keys()[0].to_string(), json!(result));
    let document = Value::Object(body).to_string();

    match fence {
        Fence::Bare => document,
        Fence::Json => format!("```json\n{document}\n```"),
        Fence::Inline => format!("```json{document}```"),
        Fence::Tagged(tag) => format!("```{tag}\n{document}\n```"),
    }
}
