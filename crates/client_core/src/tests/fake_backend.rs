use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::{Concept, HexagramNumber, Variant},
    protocol::{
        Analysis, DashboardPayload, DualityPair, Hexagram, ModelInfo, SearchHit, Trigram,
        TrigramRef, VerificationPayload,
    },
};

use crate::{BackendClient, ClientError, VerificationFeed};

/// In-process backend. Every call is recorded under a key such as
/// `hexagrams:concrete` or `search:abstract:pi`; keys can be made to fail or
/// to answer late.
#[derive(Default)]
pub(crate) struct FakeBackend {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    next_call_delays: Mutex<HashMap<String, Duration>>,
    search_hits: Mutex<HashMap<String, Vec<SearchHit>>>,
    dashboard: Mutex<Option<Result<DashboardPayload, String>>>,
    verifications: Mutex<HashMap<Concept, Result<VerificationPayload, String>>>,
    queued_verifications: Mutex<HashMap<Concept, VecDeque<VerificationPayload>>>,
    feeds: Mutex<VecDeque<VerificationFeed>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn fail(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub(crate) fn delay(&self, key: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(key.to_string(), delay);
    }

    /// Delays only the next call recorded under `key`.
    pub(crate) fn delay_next(&self, key: &str, delay: Duration) {
        self.next_call_delays
            .lock()
            .unwrap()
            .insert(key.to_string(), delay);
    }

    pub(crate) fn set_search_hits(&self, query: &str, hits: Vec<SearchHit>) {
        self.search_hits
            .lock()
            .unwrap()
            .insert(query.to_string(), hits);
    }

    pub(crate) fn set_dashboard(&self, result: Result<DashboardPayload, String>) {
        *self.dashboard.lock().unwrap() = Some(result);
    }

    pub(crate) fn set_verification(
        &self,
        concept: Concept,
        result: Result<VerificationPayload, String>,
    ) {
        self.verifications.lock().unwrap().insert(concept, result);
    }

    /// Answers the next calls for `concept` in order, before any fixed result.
    /// Each call takes its payload when it starts.
    pub(crate) fn queue_verification(&self, concept: Concept, payload: VerificationPayload) {
        self.queued_verifications
            .lock()
            .unwrap()
            .entry(concept)
            .or_default()
            .push_back(payload);
    }

    pub(crate) fn push_feed(&self, feed: VerificationFeed) {
        self.feeds.lock().unwrap().push_back(feed);
    }

    async fn enter(&self, key: String) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(key.clone());
        let next_delay = self.next_call_delays.lock().unwrap().remove(&key);
        let delay = next_delay.or_else(|| self.delays.lock().unwrap().get(&key).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&key) {
            return Err(ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        Ok(())
    }
}

pub(crate) fn trigram_ref(name: &str) -> TrigramRef {
    TrigramRef {
        name: name.to_string(),
        symbol: "☰".to_string(),
        description: format!("{name} trigram"),
    }
}

pub(crate) fn hexagram(variant: Variant, number: u32) -> Hexagram {
    Hexagram {
        number: HexagramNumber(number),
        name: format!("{variant} hexagram {number}"),
        upper: trigram_ref("건"),
        lower: trigram_ref("곤"),
        mathematical_meaning: format!("{variant} meaning {number}"),
        description: None,
        examples: vec![format!("{variant} example")],
    }
}

pub(crate) fn search_hit(number: u32, name: &str) -> SearchHit {
    SearchHit {
        number: HexagramNumber(number),
        name: name.to_string(),
        upper: "건".to_string(),
        lower: "곤".to_string(),
        mathematical_meaning: format!("{name} meaning"),
    }
}

pub(crate) fn trigrams_for(variant: Variant) -> Vec<Trigram> {
    ["건", "곤"]
        .into_iter()
        .map(|name| Trigram {
            name: name.to_string(),
            symbol: "☰".to_string(),
            korean: None,
            description: format!("{variant} {name}"),
            concept: format!("{variant} concept"),
        })
        .collect()
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        self.enter("models".to_string()).await?;
        Ok(Variant::ALL
            .into_iter()
            .map(|variant| ModelInfo {
                id: variant.as_str().to_string(),
                name: variant.label().to_string(),
                description: String::new(),
            })
            .collect())
    }

    async fn trigrams(&self, variant: Variant) -> Result<Vec<Trigram>, ClientError> {
        self.enter(format!("trigrams:{variant}")).await?;
        Ok(trigrams_for(variant))
    }

    async fn hexagrams(&self, variant: Variant) -> Result<Vec<Hexagram>, ClientError> {
        self.enter(format!("hexagrams:{variant}")).await?;
        Ok((1..=4).map(|number| hexagram(variant, number)).collect())
    }

    async fn analysis(&self, variant: Variant) -> Result<Analysis, ClientError> {
        self.enter(format!("analysis:{variant}")).await?;
        Ok(Analysis {
            model_type: variant,
            total_hexagrams: 4,
            total_trigrams: Some(2),
            mathematical_coverage: 100.0,
            duality_pairs: vec![serde_json::json!(["건", "곤"])],
            empty_combinations: Vec::new(),
        })
    }

    async fn duality(&self, variant: Variant) -> Result<Vec<DualityPair>, ClientError> {
        self.enter(format!("duality:{variant}")).await?;
        Ok(vec![DualityPair {
            pair1: trigram_ref("건"),
            pair2: trigram_ref("곤"),
        }])
    }

    async fn search(&self, variant: Variant, query: &str) -> Result<Vec<SearchHit>, ClientError> {
        self.enter(format!("search:{variant}:{query}")).await?;
        Ok(self
            .search_hits
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn dashboard(&self) -> Result<DashboardPayload, ClientError> {
        self.enter("dashboard".to_string()).await?;
        match self.dashboard.lock().unwrap().clone() {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(message)) => Err(ClientError::Backend(message)),
            None => Ok(DashboardPayload::default()),
        }
    }

    async fn verification(&self, concept: Concept) -> Result<VerificationPayload, ClientError> {
        let queued = self
            .queued_verifications
            .lock()
            .unwrap()
            .get_mut(&concept)
            .and_then(VecDeque::pop_front);
        self.enter(format!("verification:{concept}")).await?;
        if let Some(payload) = queued {
            return Ok(payload);
        }
        match self.verifications.lock().unwrap().get(&concept).cloned() {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(message)) => Err(ClientError::Backend(message)),
            None => Ok(VerificationPayload {
                concept: concept.to_string(),
                ..VerificationPayload::default()
            }),
        }
    }

    async fn verification_feed(&self) -> Result<VerificationFeed, ClientError> {
        self.enter("verification_feed".to_string()).await?;
        self.feeds
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ClientError::Status(StatusCode::NOT_FOUND))
    }
}
