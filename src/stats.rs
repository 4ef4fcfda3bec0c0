//! Process-wide project statistics store.
//!
//! Other parts of the application record per-project figures here. The
//! dashboard never reads or owns the store: it only asks for a reset when it
//! unmounts, through `ProjectStatsStore`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// The one capability the dashboard needs from the stats store.
pub trait ProjectStatsStore: Send + Sync {
    fn reset_project_stats(&self);
}

#[derive(Debug, Default)]
pub struct ProjectStats {
    /// Event count per project id.
    counts: Mutex<HashMap<String, u64>>,
    resets: AtomicU64,
}

impl ProjectStats {
    pub fn global() -> Arc<ProjectStats> {
        static STORE: OnceLock<Arc<ProjectStats>> = OnceLock::new();
        STORE.get_or_init(|| Arc::new(ProjectStats::default())).clone()
    }

    #[cfg(test)]
    pub(crate) fn record(&self, project_id: &str, events: u64) {
        *self
            .counts
            .lock()
            .entry(project_id.to_string())
            .or_default() += events;
    }

    #[cfg(test)]
    pub(crate) fn get(&self, project_id: &str) -> Option<u64> {
        self.counts.lock().get(project_id).copied()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.counts.lock().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn reset_count(&self) -> u64 {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ProjectStatsStore for ProjectStats {
    fn reset_project_stats(&self) {
        let cleared = {
            let mut counts = self.counts.lock();
            let n = counts.len();
            counts.clear();
            n
        };
        self.resets.fetch_add(1, Ordering::SeqCst);
        log::debug!("ProjectStats: reset ({} projects cleared)", cleared);
    }
}
