#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use region_overlay::{
    DirectoryOptions, PresentationRegistry, RegionDirectory, Scheduler, ViewId,
};

pub fn directory() -> RegionDirectory {
    RegionDirectory::new().expect("tokio runtime for directory")
}

pub fn directory_with_threshold(prune_threshold: usize) -> RegionDirectory {
    RegionDirectory::with_scheduler(
        Scheduler::current().expect("tokio runtime for scheduler"),
        DirectoryOptions { prune_threshold },
    )
}

pub fn view(raw: u64) -> ViewId {
    ViewId::from_raw(raw)
}

pub fn views(registry: &PresentationRegistry) -> Vec<u64> {
    registry
        .snapshot()
        .slots()
        .iter()
        .map(|slot| slot.view().raw())
        .collect()
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Tracks the highest number of slots ever published under `name`.
pub struct PeakCount {
    peak: Arc<AtomicUsize>,
    task: tokio::task::JoinHandle<()>,
}

impl PeakCount {
    pub fn watch(registry: &PresentationRegistry, name: &str) -> Self {
        let peak = Arc::new(AtomicUsize::new(registry.count(name)));
        let recorded = Arc::clone(&peak);
        let mut rx = registry.subscribe();
        let name = name.to_owned();
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let count = rx.borrow_and_update().count(&name);
                recorded.fetch_max(count, Ordering::SeqCst);
            }
        });
        Self { peak, task }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Drop for PeakCount {
    fn drop(&mut self) {
        self.task.abort();
    }
}
