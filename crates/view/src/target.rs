use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

use crate::panel::{Content, PanelId, PanelUpdate};

/// Adapter binding panel updates to whatever actually displays them.
pub trait RenderTarget: Send + Sync {
    fn apply(&self, update: PanelUpdate);

    fn apply_all(&self, updates: Vec<PanelUpdate>) {
        for update in updates {
            self.apply(update);
        }
    }
}

/// Keeps the latest content per panel and counts writes.
#[derive(Default)]
pub struct MemoryTarget {
    inner: Mutex<MemoryTargetState>,
}

#[derive(Default)]
struct MemoryTargetState {
    panels: BTreeMap<PanelId, Content>,
    writes: u64,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self, panel: PanelId) -> Option<Content> {
        self.lock().panels.get(&panel).cloned()
    }

    /// Panel content as a string; empty when the panel was never written.
    pub fn html(&self, panel: PanelId) -> String {
        self.content(panel)
            .map(|content| content.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> BTreeMap<PanelId, Content> {
        self.lock().panels.clone()
    }

    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryTargetState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RenderTarget for MemoryTarget {
    fn apply(&self, update: PanelUpdate) {
        let mut guard = self.lock();
        guard.writes += 1;
        guard.panels.insert(update.panel, update.content);
    }
}
