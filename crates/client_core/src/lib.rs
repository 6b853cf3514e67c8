use std::time::Duration;

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{Concept, Variant},
    error::BackendFailure,
    protocol::{
        AllResultsPayload, Analysis, DashboardPayload, DualityPair, DualityResponse, Envelope,
        Hexagram, HexagramsResponse, ModelInfo, ModelsResponse, SearchHit, SearchResponse,
        Trigram, TrigramsResponse, VerificationPayload,
    },
};
use tracing::{debug, info};
use url::Url;

pub mod browser;
pub mod dashboard;
pub mod endpoints;
pub mod error;
pub mod generation;
pub mod sse;
pub mod stream;

pub use browser::{BrowserOptions, ModelBrowser, ModelSnapshot, SearchOutcome};
pub use dashboard::{LoadOutcome, StreamOutcome, VerificationDashboard};
pub use endpoints::Endpoints;
pub use error::ClientError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Event stream of the verify-all endpoint, or the aggregate document a
/// backend returns when it does not stream.
pub enum VerificationFeed {
    Events(BoxStream<'static, Result<String, ClientError>>),
    Aggregate(AllResultsPayload),
}

#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn models(&self) -> Result<Vec<ModelInfo>, ClientError>;
    async fn trigrams(&self, variant: Variant) -> Result<Vec<Trigram>, ClientError>;
    async fn hexagrams(&self, variant: Variant) -> Result<Vec<Hexagram>, ClientError>;
    async fn analysis(&self, variant: Variant) -> Result<Analysis, ClientError>;
    async fn duality(&self, variant: Variant) -> Result<Vec<DualityPair>, ClientError>;
    async fn search(&self, variant: Variant, query: &str) -> Result<Vec<SearchHit>, ClientError>;
    async fn dashboard(&self) -> Result<DashboardPayload, ClientError>;
    async fn verification(&self, concept: Concept) -> Result<VerificationPayload, ClientError>;
    async fn verification_feed(&self) -> Result<VerificationFeed, ClientError>;
}

/// [`BackendClient`] over HTTP. JSON calls carry a per-request timeout; the
/// verify-all stream only a connect timeout, since it stays open while the
/// backend works.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    endpoints: Endpoints,
    request_timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        let endpoints = Endpoints::new(base_url)?;
        let http = Client::builder().connect_timeout(request_timeout).build()?;
        info!(base_url = %endpoints.base(), timeout_secs = request_timeout.as_secs(), "backend: client ready");
        Ok(Self {
            http,
            endpoints,
            request_timeout,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!(%url, "backend: GET");
        let response = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Verification endpoints wrap their payload in a `success` flag.
    async fn get_envelope<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let value: Value = self.get_json(url).await?;
        Envelope::<T>::from_value(value)?
            .into_result()
            .map_err(|failure| ClientError::Backend(failure.message().to_string()))
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<BackendFailure>(body) {
        Ok(BackendFailure {
            error: Some(message),
            ..
        }) => ClientError::Backend(message),
        _ => ClientError::Status(status),
    }
}

fn is_event_stream(content_type: Option<&header::HeaderValue>) -> bool {
    content_type
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("text/event-stream"))
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        let response: ModelsResponse = self.get_json(self.endpoints.models()).await?;
        Ok(response.models)
    }

    async fn trigrams(&self, variant: Variant) -> Result<Vec<Trigram>, ClientError> {
        let response: TrigramsResponse = self.get_json(self.endpoints.trigrams(variant)).await?;
        Ok(response.trigrams)
    }

    async fn hexagrams(&self, variant: Variant) -> Result<Vec<Hexagram>, ClientError> {
        let response: HexagramsResponse = self.get_json(self.endpoints.hexagrams(variant)).await?;
        Ok(response.hexagrams)
    }

    async fn analysis(&self, variant: Variant) -> Result<Analysis, ClientError> {
        self.get_json(self.endpoints.analysis(variant)).await
    }

    async fn duality(&self, variant: Variant) -> Result<Vec<DualityPair>, ClientError> {
        let response: DualityResponse = self.get_json(self.endpoints.duality(variant)).await?;
        Ok(response.duality_pairs)
    }

    async fn search(&self, variant: Variant, query: &str) -> Result<Vec<SearchHit>, ClientError> {
        let response: SearchResponse = self.get_json(self.endpoints.search(variant, query)).await?;
        Ok(response.hexagrams)
    }

    async fn dashboard(&self) -> Result<DashboardPayload, ClientError> {
        self.get_envelope(self.endpoints.dashboard()).await
    }

    async fn verification(&self, concept: Concept) -> Result<VerificationPayload, ClientError> {
        self.get_envelope(self.endpoints.verification(concept)).await
    }

    async fn verification_feed(&self) -> Result<VerificationFeed, ClientError> {
        let url = self.endpoints.verification_all();
        debug!(%url, "backend: opening verification stream");
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "text/event-stream, application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(status_error(status, &body));
        }

        if is_event_stream(response.headers().get(header::CONTENT_TYPE)) {
            info!("backend: verification stream open");
            return Ok(VerificationFeed::Events(
                sse::data_stream(response.bytes_stream()).boxed(),
            ));
        }

        let body = response.bytes().await?;
        let value: Value = serde_json::from_slice(&body)?;
        let payload = if AllResultsPayload::is_document(&value) {
            serde_json::from_value::<AllResultsPayload>(value)?
        } else {
            Envelope::<AllResultsPayload>::from_value(value)?
                .into_result()
                .map_err(|failure| ClientError::Backend(failure.message().to_string()))?
        };
        info!(
            results = payload.results.len(),
            failures = payload.errors.len(),
            "backend: verification results received as one document"
        );
        Ok(VerificationFeed::Aggregate(payload))
    }
}

#[cfg(test)]
#[path = "tests/fake_backend.rs"]
pub(crate) mod fake_backend;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
