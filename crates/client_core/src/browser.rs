//! Model browser controller.

use std::sync::Arc;

use shared::{
    domain::Variant,
    protocol::{Analysis, DualityPair, Hexagram, ModelInfo, Trigram},
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use view::{
    browser::{
        render_load_error, render_model, render_search_error, render_search_results,
        render_selection, render_unloaded, ModelView,
    },
    PanelId, PanelUpdate, RenderTarget,
};

use crate::{
    error::ClientError,
    generation::RequestGeneration,
    BackendClient,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Render load failures into the status panel instead of only logging them.
    pub surface_load_errors: bool,
}

/// All four datasets of one variant, fetched together.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    pub variant: Variant,
    pub trigrams: Vec<Trigram>,
    pub hexagrams: Vec<Hexagram>,
    pub analysis: Analysis,
    pub duality: Vec<DualityPair>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank query; the results panel was emptied without a request.
    Cleared,
    /// A newer search started before this one returned.
    Stale,
    Rendered { hits: usize },
}

struct BrowserState {
    variant: Variant,
    snapshot: Option<Arc<ModelSnapshot>>,
    selected: Option<Hexagram>,
}

pub struct ModelBrowser {
    backend: Arc<dyn BackendClient>,
    target: Arc<dyn RenderTarget>,
    options: BrowserOptions,
    inner: Mutex<BrowserState>,
    loads: RequestGeneration,
    searches: RequestGeneration,
}

impl ModelBrowser {
    pub fn new(backend: Arc<dyn BackendClient>, target: Arc<dyn RenderTarget>) -> Arc<Self> {
        Self::with_options(backend, target, BrowserOptions::default())
    }

    pub fn with_options(
        backend: Arc<dyn BackendClient>,
        target: Arc<dyn RenderTarget>,
        options: BrowserOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            target,
            options,
            inner: Mutex::new(BrowserState {
                variant: Variant::default(),
                snapshot: None,
                selected: None,
            }),
            loads: RequestGeneration::new(),
            searches: RequestGeneration::new(),
        })
    }

    pub async fn variant(&self) -> Variant {
        self.inner.lock().await.variant
    }

    pub async fn snapshot(&self) -> Option<Arc<ModelSnapshot>> {
        self.inner.lock().await.snapshot.clone()
    }

    pub async fn selected(&self) -> Option<Hexagram> {
        self.inner.lock().await.selected.clone()
    }

    pub async fn models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        self.backend.models().await
    }

    /// Fetches the four datasets of `variant` concurrently and replaces the
    /// snapshot only when all of them arrive. On failure the previous snapshot
    /// stays. A load overtaken by a newer one is dropped.
    pub async fn load_data(&self, variant: Variant) -> Result<(), ClientError> {
        let ticket = self.loads.begin();
        debug!(%variant, "browser: loading model data");

        let (trigrams, hexagrams, analysis, duality) = futures::join!(
            self.backend.trigrams(variant),
            self.backend.hexagrams(variant),
            self.backend.analysis(variant),
            self.backend.duality(variant),
        );
        let loaded = (|| {
            Ok::<_, ClientError>(ModelSnapshot {
                variant,
                trigrams: trigrams?,
                hexagrams: hexagrams?,
                analysis: analysis?,
                duality: duality?,
            })
        })();

        if !self.loads.is_current(ticket) {
            debug!(%variant, "browser: discarding superseded load");
            return loaded.map(|_| ());
        }

        match loaded {
            Ok(snapshot) => {
                info!(
                    %variant,
                    trigrams = snapshot.trigrams.len(),
                    hexagrams = snapshot.hexagrams.len(),
                    duality_pairs = snapshot.duality.len(),
                    "browser: model data loaded"
                );
                self.inner.lock().await.snapshot = Some(Arc::new(snapshot));
                if self.options.surface_load_errors {
                    self.target.apply(PanelUpdate::html(PanelId::LoadStatus, ""));
                }
                Ok(())
            }
            Err(err) => {
                error!(%variant, error = %err, "browser: model data load failed; keeping previous data");
                if self.options.surface_load_errors {
                    self.target.apply(PanelUpdate::html(
                        PanelId::LoadStatus,
                        render_load_error(variant, &err.user_message()),
                    ));
                }
                Err(err)
            }
        }
    }

    /// Redraws every data panel from the current snapshot.
    pub async fn render_all(&self) {
        let state = self.inner.lock().await;
        let updates = match state.snapshot.as_deref() {
            Some(snapshot) => render_model(&ModelView {
                variant: snapshot.variant,
                trigrams: &snapshot.trigrams,
                hexagrams: &snapshot.hexagrams,
                analysis: &snapshot.analysis,
                duality: &snapshot.duality,
                selected: state.selected.as_ref(),
            }),
            None => render_unloaded(),
        };
        self.target.apply_all(updates);
    }

    /// Switches the variant used by searches without loading its data.
    pub async fn set_variant(&self, variant: Variant) {
        self.inner.lock().await.variant = variant;
    }

    pub async fn select_variant(&self, variant: Variant) -> Result<(), ClientError> {
        {
            let mut state = self.inner.lock().await;
            if state.variant != variant {
                info!(from = %state.variant, to = %variant, "browser: switching model");
            }
            state.variant = variant;
        }
        let loaded = self.load_data(variant).await;
        self.render_all().await;
        loaded
    }

    pub async fn select_hexagram(&self, hexagram: &Hexagram) {
        let mut state = self.inner.lock().await;
        state.selected = Some(hexagram.clone());
        let hexagrams = state
            .snapshot
            .as_deref()
            .map(|snapshot| snapshot.hexagrams.as_slice())
            .unwrap_or_default();
        self.target
            .apply_all(render_selection(hexagrams, state.selected.as_ref()));
    }

    pub async fn clear_selection(&self) {
        let mut state = self.inner.lock().await;
        state.selected = None;
        let hexagrams = state
            .snapshot
            .as_deref()
            .map(|snapshot| snapshot.hexagrams.as_slice())
            .unwrap_or_default();
        self.target.apply_all(render_selection(hexagrams, None));
    }

    /// Searches the current variant. Only the most recent search may render.
    pub async fn search_hexagrams(&self, query: &str) -> Result<SearchOutcome, ClientError> {
        if query.trim().is_empty() {
            self.searches.invalidate();
            self.target
                .apply(PanelUpdate::html(PanelId::SearchResults, ""));
            return Ok(SearchOutcome::Cleared);
        }

        let ticket = self.searches.begin();
        let variant = self.variant().await;
        let result = self.backend.search(variant, query).await;
        if !self.searches.is_current(ticket) {
            debug!(%variant, query, "browser: discarding superseded search");
            return Ok(SearchOutcome::Stale);
        }

        match result {
            Ok(hits) => {
                info!(%variant, query, hits = hits.len(), "browser: search complete");
                self.target.apply(PanelUpdate::html(
                    PanelId::SearchResults,
                    render_search_results(query, &hits),
                ));
                Ok(SearchOutcome::Rendered { hits: hits.len() })
            }
            Err(err) => {
                warn!(%variant, query, error = %err, "browser: search failed");
                self.target.apply(PanelUpdate::html(
                    PanelId::SearchResults,
                    render_search_error(&err.user_message()),
                ));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/browser_tests.rs"]
mod tests;
