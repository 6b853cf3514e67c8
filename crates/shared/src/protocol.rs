use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{HexagramNumber, Variant},
    error::BackendFailure,
};

/// Literal payload that terminates the verify-all event stream.
pub const STREAM_DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigram {
    pub name: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub korean: Option<String>,
    pub description: String,
    pub concept: String,
}

/// Trigram as embedded in hexagrams and duality pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrigramRef {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hexagram {
    pub number: HexagramNumber,
    pub name: String,
    pub upper: TrigramRef,
    pub lower: TrigramRef,
    pub mathematical_meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Reduced hexagram returned by the search endpoint; trigrams are names only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub number: HexagramNumber,
    pub name: String,
    pub upper: String,
    pub lower: String,
    pub mathematical_meaning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub model_type: Variant,
    pub total_hexagrams: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_trigrams: Option<u32>,
    pub mathematical_coverage: f64,
    #[serde(default)]
    pub duality_pairs: Vec<Value>,
    #[serde(default)]
    pub empty_combinations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualityPair {
    pub pair1: TrigramRef,
    pub pair2: TrigramRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrigramsResponse {
    pub trigrams: Vec<Trigram>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexagramsResponse {
    pub hexagrams: Vec<Hexagram>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualityResponse {
    pub duality_pairs: Vec<DualityPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hexagrams: Vec<SearchHit>,
}

/// One row of the dashboard summary table. Cells are shown verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummaryRow {
    #[serde(rename = "괘", default)]
    pub trigram: Value,
    #[serde(rename = "개념", default)]
    pub concept: Value,
    #[serde(rename = "검증값", default)]
    pub measured: Value,
    #[serde(rename = "실제값", default)]
    pub expected: Value,
    #[serde(rename = "오차", default)]
    pub error: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardPayload {
    #[serde(default)]
    pub verification_count: u32,
    #[serde(default)]
    pub plot_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_plot: Option<String>,
    #[serde(default)]
    pub summary: Vec<DashboardSummaryRow>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VerificationPayload {
    #[serde(default)]
    pub concept: String,
    #[serde(default)]
    pub description: String,
    /// Plot name to base64-encoded PNG, in backend order.
    #[serde(default)]
    pub plots: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Map<String, Value>>,
}

impl VerificationPayload {
    /// Plots whose payload is a string, in backend order.
    pub fn plot_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.plots
            .iter()
            .filter_map(|(name, data)| data.as_str().map(|data| (name.as_str(), data)))
    }
}

/// `results` of the verify-all document: either keyed by concept or a list
/// of `{concept, result}` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultEntries {
    Keyed(Map<String, Value>),
    Listed(Vec<Value>),
}

impl Default for ResultEntries {
    fn default() -> Self {
        ResultEntries::Keyed(Map::new())
    }
}

impl ResultEntries {
    pub fn len(&self) -> usize {
        match self {
            ResultEntries::Keyed(map) => map.len(),
            ResultEntries::Listed(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A concept the backend could not verify during a verify-all run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConceptFailure {
    #[serde(default)]
    pub concept: String,
    #[serde(default)]
    pub error: Value,
}

impl ConceptFailure {
    pub fn message(&self) -> String {
        match &self.error {
            Value::Null => String::new(),
            other => value_text(other),
        }
    }
}

/// Aggregate "all results" document. A partially failed run still carries
/// the concepts that succeeded next to `errors`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllResultsPayload {
    #[serde(default)]
    pub results: ResultEntries,
    #[serde(default)]
    pub errors: Vec<ConceptFailure>,
}

impl AllResultsPayload {
    /// Whether `value` is a verify-all document, successful or not.
    pub fn is_document(value: &Value) -> bool {
        value.get("results").is_some_and(|results| results.is_object() || results.is_array())
    }

    /// Entries decoded as verification payloads. The map key, or a listed
    /// entry's position, stands in for a missing concept name; entries that
    /// are bare result maps become the result.
    pub fn entries(&self) -> Vec<(String, VerificationPayload)> {
        match &self.results {
            ResultEntries::Keyed(map) => map
                .iter()
                .map(|(key, value)| entry(key.clone(), value))
                .collect(),
            ResultEntries::Listed(items) => items
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    let key = value
                        .get("concept")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| index.to_string());
                    entry(key, value)
                })
                .collect(),
        }
    }
}

fn entry(key: String, value: &Value) -> (String, VerificationPayload) {
    let mut payload = match value {
        Value::Object(map)
            if map.contains_key("result")
                || map.contains_key("plots")
                || map.contains_key("description") =>
        {
            serde_json::from_value::<VerificationPayload>(value.clone()).unwrap_or_default()
        }
        Value::Object(map) => VerificationPayload {
            result: Some(map.clone()),
            ..VerificationPayload::default()
        },
        _ => VerificationPayload::default(),
    };
    if payload.concept.is_empty() {
        payload.concept = key.clone();
    }
    (key, payload)
}

/// One decoded `data:` payload of the verify-all stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    Log(String),
    Error(String),
    Done,
    /// Well-formed JSON carrying neither `log` nor `error`.
    Other,
}

#[derive(Debug, Deserialize)]
struct RawStreamMessage {
    #[serde(default)]
    log: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl StreamFrame {
    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        if data == STREAM_DONE_SENTINEL {
            return Ok(StreamFrame::Done);
        }
        let raw: RawStreamMessage = serde_json::from_str(data)?;
        let frame = match (raw.log, raw.error) {
            (Some(log), _) if is_truthy(&log) => StreamFrame::Log(value_text(&log)),
            (_, Some(error)) if is_truthy(&error) => StreamFrame::Error(value_text(&error)),
            _ => StreamFrame::Other,
        };
        Ok(frame)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Backend response that is either the typed payload or a reported failure.
#[derive(Debug, Clone)]
pub enum Envelope<T> {
    Success(T),
    Failure(BackendFailure),
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Splits on the `success` flag; a missing flag counts as failure.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if success {
            Ok(Envelope::Success(serde_json::from_value(value)?))
        } else {
            Ok(Envelope::Failure(serde_json::from_value(value)?))
        }
    }

    pub fn into_result(self) -> Result<T, BackendFailure> {
        match self {
            Envelope::Success(payload) => Ok(payload),
            Envelope::Failure(failure) => Err(failure),
        }
    }
}
