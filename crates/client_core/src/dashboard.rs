//! Verification dashboard controller.

use std::{collections::HashMap, sync::Arc};

use futures::StreamExt;
use shared::{
    domain::{Concept, Tab},
    protocol::{StreamFrame, VerificationPayload},
};
use tokio::{sync::Mutex, task::AbortHandle};
use tracing::{debug, error, info, warn};
use view::{
    verification::{
        render_all_results, render_dashboard, render_error, render_loading, render_log,
        render_status, render_verification,
    },
    PanelId, PanelUpdate, RenderTarget,
};

use crate::{
    error::ClientError,
    generation::RequestGeneration,
    stream::{LogStream, StreamPhase},
    BackendClient, VerificationFeed,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Rendered,
    /// A newer request for the same panel started before this one returned.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Errored,
    /// Closed or replaced by a newer stream before finishing.
    Superseded,
}

/// Share of the eight concepts that have been verified.
pub fn completion_pct(verification_count: u32) -> f64 {
    f64::from(verification_count.min(Concept::ALL.len() as u32)) / Concept::ALL.len() as f64 * 100.0
}

struct DashboardState {
    current_tab: Tab,
    results: HashMap<Concept, VerificationPayload>,
    log: LogStream,
    /// Identifies the stream allowed to write `log`.
    stream_id: u64,
}

struct ActiveStream {
    id: u64,
    abort: AbortHandle,
}

pub struct VerificationDashboard {
    backend: Arc<dyn BackendClient>,
    target: Arc<dyn RenderTarget>,
    inner: Mutex<DashboardState>,
    active_stream: Mutex<Option<ActiveStream>>,
    dashboard_requests: RequestGeneration,
    concept_requests: HashMap<Concept, RequestGeneration>,
}

impl VerificationDashboard {
    pub fn new(backend: Arc<dyn BackendClient>, target: Arc<dyn RenderTarget>) -> Arc<Self> {
        Arc::new(Self {
            backend,
            target,
            inner: Mutex::new(DashboardState {
                current_tab: Tab::default(),
                results: HashMap::new(),
                log: LogStream::new(),
                stream_id: 0,
            }),
            active_stream: Mutex::new(None),
            dashboard_requests: RequestGeneration::new(),
            concept_requests: Concept::ALL
                .into_iter()
                .map(|concept| (concept, RequestGeneration::new()))
                .collect(),
        })
    }

    /// Resets the counters to 0 / 0 / 0%.
    pub fn init(&self) {
        self.target.apply_all(render_status(0, 0, 0.0));
    }

    pub async fn current_tab(&self) -> Tab {
        self.inner.lock().await.current_tab
    }

    pub async fn select_tab(&self, tab: Tab) {
        let mut state = self.inner.lock().await;
        if state.current_tab != tab {
            debug!(?tab, "dashboard: tab selected");
        }
        state.current_tab = tab;
    }

    /// Last verification rendered for `concept`.
    pub async fn verification_result(&self, concept: Concept) -> Option<VerificationPayload> {
        self.inner.lock().await.results.get(&concept).cloned()
    }

    pub async fn stream_phase(&self) -> StreamPhase {
        self.inner.lock().await.log.phase()
    }

    pub async fn log_text(&self) -> String {
        self.inner.lock().await.log.text().to_string()
    }

    /// Loads the summary dashboard. Closes a running verify-all stream, which
    /// draws into the same panel.
    pub async fn load_dashboard(&self) -> Result<LoadOutcome, ClientError> {
        self.close_stream().await;
        let ticket = self.dashboard_requests.begin();
        self.target
            .apply(PanelUpdate::html(PanelId::DashboardResults, render_loading()));

        let result = self.backend.dashboard().await;
        if !self.dashboard_requests.is_current(ticket) {
            debug!("dashboard: discarding superseded dashboard response");
            return result.map(|_| LoadOutcome::Stale);
        }

        match result {
            Ok(payload) => {
                info!(
                    verifications = payload.verification_count,
                    plots = payload.plot_count,
                    rows = payload.summary.len(),
                    "dashboard: summary loaded"
                );
                self.target.apply(PanelUpdate::html(
                    PanelId::DashboardResults,
                    render_dashboard(&payload),
                ));
                self.target.apply_all(render_status(
                    payload.verification_count,
                    payload.plot_count,
                    completion_pct(payload.verification_count),
                ));
                Ok(LoadOutcome::Rendered)
            }
            Err(err) => {
                warn!(error = %err, "dashboard: summary load failed");
                self.target.apply(PanelUpdate::html(
                    PanelId::DashboardResults,
                    render_error(&err.user_message()),
                ));
                Err(err)
            }
        }
    }

    pub async fn load_verification(&self, concept: Concept) -> Result<LoadOutcome, ClientError> {
        let panel = PanelId::ConceptResults(concept);
        let requests = &self.concept_requests[&concept];
        let ticket = requests.begin();
        self.target.apply(PanelUpdate::html(panel, render_loading()));

        let result = self.backend.verification(concept).await;
        if !requests.is_current(ticket) {
            debug!(%concept, "dashboard: discarding superseded verification response");
            return result.map(|_| LoadOutcome::Stale);
        }

        match result {
            Ok(payload) => {
                info!(
                    %concept,
                    plots = payload.plot_entries().count(),
                    "dashboard: verification loaded"
                );
                self.target
                    .apply(PanelUpdate::html(panel, render_verification(&payload)));
                self.inner.lock().await.results.insert(concept, payload);
                Ok(LoadOutcome::Rendered)
            }
            Err(err) => {
                warn!(%concept, error = %err, "dashboard: verification failed");
                self.target
                    .apply(PanelUpdate::html(panel, render_error(&err.user_message())));
                Err(err)
            }
        }
    }

    /// Runs the verify-all stream into the dashboard panel until it completes,
    /// fails, or is replaced by a newer call. Any earlier stream is closed first.
    pub async fn stream_all_verifications(self: &Arc<Self>) -> StreamOutcome {
        self.dashboard_requests.invalidate();
        // Held until the abort handle is stored so `close_stream` always finds it.
        let mut active = self.active_stream.lock().await;
        let stream_id = {
            let mut state = self.inner.lock().await;
            state.stream_id += 1;
            state.log.connect();
            self.render_log(&state.log);
            state.stream_id
        };
        info!(stream_id, "dashboard: starting verification stream");

        let dashboard = Arc::clone(self);
        let task = tokio::spawn(async move { dashboard.run_stream(stream_id).await });
        let previous = active.replace(ActiveStream {
            id: stream_id,
            abort: task.abort_handle(),
        });
        drop(active);
        if let Some(previous) = previous {
            debug!(stream_id = previous.id, "dashboard: closing previous stream");
            previous.abort.abort();
        }

        let outcome = match task.await {
            Ok(Some(StreamPhase::Completed)) => StreamOutcome::Completed,
            Ok(Some(_)) => StreamOutcome::Errored,
            Ok(None) => StreamOutcome::Superseded,
            Err(err) if err.is_cancelled() => StreamOutcome::Superseded,
            Err(err) => {
                error!(stream_id, error = %err, "dashboard: stream task failed");
                StreamOutcome::Errored
            }
        };

        let mut active = self.active_stream.lock().await;
        if active.as_ref().is_some_and(|active| active.id == stream_id) {
            active.take();
        }
        info!(stream_id, ?outcome, "dashboard: verification stream finished");
        outcome
    }

    /// Closes the running stream, if any. Its buffer stays as last drawn and
    /// an unfinished phase returns to idle.
    pub async fn close_stream(&self) {
        let mut active = self.active_stream.lock().await;
        let mut state = self.inner.lock().await;
        state.stream_id += 1;
        state.log.close();
        if let Some(active) = active.take() {
            debug!(stream_id = active.id, "dashboard: closing stream");
            active.abort.abort();
        }
    }

    /// Returns the phase the stream ended in, or `None` when a newer stream
    /// took over the buffer.
    async fn run_stream(self: Arc<Self>, stream_id: u64) -> Option<StreamPhase> {
        let feed = match self.backend.verification_feed().await {
            Ok(feed) => feed,
            Err(err) => {
                warn!(stream_id, error = %err, "dashboard: verification stream failed to open");
                return self.apply_to_log(stream_id, LogStream::transport_error).await;
            }
        };

        let mut events = match feed {
            VerificationFeed::Events(events) => events,
            VerificationFeed::Aggregate(payload) => {
                let mut state = self.inner.lock().await;
                if state.stream_id != stream_id {
                    return None;
                }
                info!(stream_id, results = payload.results.len(), "dashboard: rendering aggregate results");
                for failure in &payload.errors {
                    warn!(stream_id, concept = %failure.concept, message = %failure.message(), "dashboard: concept failed verification");
                }
                state.log.complete_silently();
                self.target.apply(PanelUpdate::html(
                    PanelId::DashboardResults,
                    render_all_results(&payload),
                ));
                return Some(state.log.phase());
            }
        };

        while let Some(item) = events.next().await {
            let phase = match item {
                Ok(data) => match StreamFrame::parse(&data) {
                    Ok(frame) => {
                        if let StreamFrame::Error(message) = &frame {
                            warn!(stream_id, message = %message, "dashboard: backend reported verification error");
                        }
                        self.apply_to_log(stream_id, |log| log.receive(&frame)).await
                    }
                    Err(err) => {
                        warn!(stream_id, error = %err, "dashboard: ignoring malformed stream message");
                        self.apply_to_log(stream_id, LogStream::receive_malformed).await
                    }
                },
                Err(err) => {
                    warn!(stream_id, error = %err, "dashboard: verification stream broke");
                    self.apply_to_log(stream_id, LogStream::transport_error).await
                }
            };
            match phase {
                Some(phase) if phase.is_terminal() => return Some(phase),
                Some(_) => {}
                None => return None,
            }
        }

        let err = ClientError::Stream("closed before completion".to_string());
        warn!(stream_id, error = %err, "dashboard: verification stream ended early");
        self.apply_to_log(stream_id, LogStream::transport_error).await
    }

    async fn apply_to_log(
        &self,
        stream_id: u64,
        update: impl FnOnce(&mut LogStream),
    ) -> Option<StreamPhase> {
        let mut state = self.inner.lock().await;
        if state.stream_id != stream_id {
            return None;
        }
        update(&mut state.log);
        self.render_log(&state.log);
        Some(state.log.phase())
    }

    fn render_log(&self, log: &LogStream) {
        self.target.apply(PanelUpdate::html(
            PanelId::DashboardResults,
            render_log(log.text(), log.failed()),
        ));
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
