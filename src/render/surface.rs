//! Render-surface side of a region.
//!
//! A surface attaches to one region, follows its snapshots, and resolves each slot into
//! something drawable. Attaching marks the region live in the directory; once the last
//! attachment of a region is dropped it is marked dead so the directory may prune it.

use tokio::sync::watch;
use tracing::trace;

use crate::core::animation::Transition;
use crate::core::geometry::Point;
use crate::core::view::ViewId;
use crate::runtime::directory::{RegionDirectory, RegionId};
use crate::runtime::registry::{PresentationRegistry, RegionSnapshot, SlotId};

/// Measured size of the host region.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// One slot, ready to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderedSlot {
    pub slot: SlotId,
    pub view: ViewId,
    pub position: Point,
    pub opacity: f64,
    pub scale: f64,
    /// How to animate from the previously drawn state; `None` means jump.
    pub transition: Option<Transition>,
    /// Paint order, bottom first.
    pub z: usize,
}

impl RenderedSlot {
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && self.scale > 0.0
    }
}

/// Resolves a snapshot against the surface size. Slots without a position are centred.
pub fn resolve_frame(snapshot: &RegionSnapshot, size: SurfaceSize) -> Vec<RenderedSlot> {
    snapshot
        .slots()
        .iter()
        .enumerate()
        .map(|(z, slot)| RenderedSlot {
            slot: slot.id(),
            view: slot.view(),
            position: slot.state().position.unwrap_or_else(|| size.center()),
            opacity: slot.state().opacity,
            scale: slot.state().scale,
            transition: slot.transition().copied(),
            z,
        })
        .collect()
}

/// Live subscription of a render surface to one region.
pub struct SurfaceAttachment {
    directory: RegionDirectory,
    region: RegionId,
    registry: PresentationRegistry,
    snapshots: watch::Receiver<RegionSnapshot>,
}

impl std::fmt::Debug for SurfaceAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceAttachment")
            .field("region", &self.region)
            .field("revision", &self.snapshots.borrow().revision())
            .finish()
    }
}

impl SurfaceAttachment {
    /// Attach hook: subscribes to `region` and marks it live.
    pub fn attach(directory: &RegionDirectory, region: impl Into<RegionId>) -> Self {
        let region = region.into();
        let registry = directory.get_or_create(region.clone());
        directory.mark_live(region.clone(), &registry);
        let snapshots = registry.subscribe();
        Self {
            directory: directory.clone(),
            region,
            registry,
            snapshots,
        }
    }

    pub fn region(&self) -> &RegionId {
        &self.region
    }

    pub fn registry(&self) -> &PresentationRegistry {
        &self.registry
    }

    /// Latest snapshot, without marking it seen.
    pub fn snapshot(&self) -> RegionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Whether a snapshot newer than the last drawn frame is available.
    pub fn has_changed(&self) -> bool {
        self.snapshots.has_changed().unwrap_or(false)
    }

    /// Waits for the next published snapshot and returns it.
    pub async fn changed(&mut self) -> RegionSnapshot {
        if self.snapshots.changed().await.is_err() {
            trace!(region = %self.region, "registry sender gone");
        }
        self.snapshots.borrow_and_update().clone()
    }

    /// Resolves the latest snapshot and marks it seen.
    pub fn frame(&mut self, size: SurfaceSize) -> Vec<RenderedSlot> {
        let snapshot = self.snapshots.borrow_and_update().clone();
        resolve_frame(&snapshot, size)
    }
}

impl Drop for SurfaceAttachment {
    fn drop(&mut self) {
        self.directory.mark_dead(self.region.clone());
    }
}
