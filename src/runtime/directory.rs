//! Region directory: region identifier → [`PresentationRegistry`].
//!
//! The directory is created once by the host and handed to whatever needs to present
//! overlays. Registries are created on first use. Render surfaces report attach/detach
//! through [`RegionDirectory::mark_live`] / [`RegionDirectory::mark_dead`]; those marks
//! only steer pruning and never affect `present`/`dismiss`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::debug;

use crate::config::{EnvConfig, DEFAULT_PRUNE_THRESHOLD};
use crate::error::OverlayError;
use crate::runtime::queue::{PresentationQueue, QueueOptions};
use crate::runtime::registry::{PresentationRegistry, RegionSnapshot};
use crate::runtime::scheduler::Scheduler;

/// Region used when the caller does not name one.
pub const DEFAULT_REGION: &str = "region-overlay-global";

/// Caller-chosen region key.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn global() -> Self {
        Self(DEFAULT_REGION.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_global(&self) -> bool {
        self.0 == DEFAULT_REGION
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::global()
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RegionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&RegionId> for RegionId {
    fn from(value: &RegionId) -> Self {
        value.clone()
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attachment state reported by render surfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Liveness {
    /// No surface has attached yet.
    #[default]
    Unattached,
    Live,
    /// The surface that was drawing this region went away.
    Detached,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryOptions {
    /// Entry count past which an insertion triggers a pruning pass.
    pub prune_threshold: usize,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
        }
    }
}

impl From<&EnvConfig> for DirectoryOptions {
    fn from(config: &EnvConfig) -> Self {
        Self {
            prune_threshold: config.prune_threshold,
        }
    }
}

struct DirectoryEntry {
    registry: PresentationRegistry,
    liveness: Liveness,
    /// Surfaces currently attached; the entry is `Live` while this is non-zero.
    attached: usize,
}

impl DirectoryEntry {
    /// Not live, nothing on screen, and nobody outside the directory holding it.
    fn is_abandoned(&self) -> bool {
        self.liveness != Liveness::Live
            && self.registry.is_empty()
            && self.registry.handle_count() == 1
    }
}

struct DirectoryInner {
    scheduler: Scheduler,
    options: DirectoryOptions,
    entries: Mutex<HashMap<RegionId, DirectoryEntry>>,
}

/// Cheaply cloneable handle to the process-wide region map.
#[derive(Clone)]
pub struct RegionDirectory {
    inner: Arc<DirectoryInner>,
}

impl fmt::Debug for RegionDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionDirectory")
            .field("regions", &self.len())
            .field("options", &self.inner.options)
            .finish()
    }
}

impl RegionDirectory {
    /// Creates a directory driven by the current tokio runtime.
    pub fn new() -> Result<Self, OverlayError> {
        Ok(Self::with_scheduler(
            Scheduler::current()?,
            DirectoryOptions::default(),
        ))
    }

    pub fn with_scheduler(scheduler: Scheduler, options: DirectoryOptions) -> Self {
        Self {
            inner: Arc::new(DirectoryInner {
                scheduler,
                options,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn options(&self) -> &DirectoryOptions {
        &self.inner.options
    }

    /// Returns the registry for `region`, creating it on first access.
    pub fn get_or_create(&self, region: impl Into<RegionId>) -> PresentationRegistry {
        let region = region.into();
        let mut entries = self.lock();
        if let Some(entry) = entries.get(&region) {
            return entry.registry.clone();
        }

        let registry = PresentationRegistry::new(region.clone(), self.inner.scheduler.clone());
        debug!(region = %region, "region created");
        entries.insert(
            region,
            DirectoryEntry {
                registry: registry.clone(),
                liveness: Liveness::Unattached,
                attached: 0,
            },
        );
        if entries.len() > self.inner.options.prune_threshold {
            prune_locked(&mut entries);
        }
        registry
    }

    /// Registry for [`DEFAULT_REGION`].
    pub fn global(&self) -> PresentationRegistry {
        self.get_or_create(RegionId::global())
    }

    /// Attach hook. Adopts `registry` when the region has no entry yet; otherwise the
    /// stored registry stays authoritative.
    ///
    /// Calls are counted: a region stays live until every attach has been matched by a
    /// [`RegionDirectory::mark_dead`].
    pub fn mark_live(&self, region: impl Into<RegionId>, registry: &PresentationRegistry) {
        let region = region.into();
        let mut entries = self.lock();
        match entries.get_mut(&region) {
            Some(entry) => {
                if !entry.registry.ptr_eq(registry) {
                    debug!(region = %region, "attach with foreign registry; keeping stored one");
                }
                entry.liveness = Liveness::Live;
                entry.attached += 1;
            }
            None => {
                entries.insert(
                    region.clone(),
                    DirectoryEntry {
                        registry: registry.clone(),
                        liveness: Liveness::Live,
                        attached: 1,
                    },
                );
            }
        }
        debug!(region = %region, "region live");
    }

    /// Detach hook. The region turns `Detached` once its last attachment is gone.
    /// Unknown regions are ignored.
    pub fn mark_dead(&self, region: impl Into<RegionId>) {
        let region = region.into();
        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(&region) {
            entry.attached = entry.attached.saturating_sub(1);
            if entry.attached == 0 {
                entry.liveness = Liveness::Detached;
                debug!(region = %region, "region detached");
            } else {
                debug!(region = %region, remaining = entry.attached, "surface detached");
            }
        }
    }

    pub fn subscribe(&self, region: impl Into<RegionId>) -> watch::Receiver<RegionSnapshot> {
        self.get_or_create(region).subscribe()
    }

    /// Builds a queue presenting into `region`.
    pub fn queue(&self, region: impl Into<RegionId>, options: QueueOptions) -> PresentationQueue {
        PresentationQueue::new(self.get_or_create(region), options)
    }

    /// Drops abandoned entries: not live, empty, and not referenced outside the
    /// directory. Returns how many were removed.
    pub fn prune(&self) -> usize {
        prune_locked(&mut self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, region: impl Into<RegionId>) -> bool {
        self.lock().contains_key(&region.into())
    }

    pub fn liveness(&self, region: impl Into<RegionId>) -> Option<Liveness> {
        self.lock().get(&region.into()).map(|entry| entry.liveness)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RegionId, DirectoryEntry>> {
        match self.inner.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn prune_locked(entries: &mut HashMap<RegionId, DirectoryEntry>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_abandoned());
    let removed = before - entries.len();
    if removed > 0 {
        debug!(removed, remaining = entries.len(), "pruned regions");
    }
    removed
}
