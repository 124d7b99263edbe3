//! Animated overlays injected into named regions of a host UI.
//!
//! Invariant: a region's slot list is only mutated through its
//! [`PresentationRegistry`]; render surfaces observe it through [`RegionSnapshot`]s.
//!
//! # Public API Overview
//! - Obtain per-region registries from a [`RegionDirectory`] and `present`/`dismiss`
//!   overlays directly, in [`PresentMode::Replace`] or [`PresentMode::Stack`] mode.
//! - Sequence overlays through a [`PresentationQueue`]: build items with
//!   `push_view` → `reach`* → `finish`, then `show`.
//! - Draw a region with a [`SurfaceAttachment`], which resolves snapshots into
//!   [`RenderedSlot`]s and reports attach/detach to the directory.
//! - Configure from the environment with [`EnvConfig`] and install logging with
//!   [`logging::init`].

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod render;
pub mod runtime;

/// Animation data and interpolation.
pub use crate::core::animation::{AnimationStep, Transition, VisualState};
pub use crate::core::easing::Easing;
/// Position resolution along an axis.
pub use crate::core::geometry::{resolve, Axis, AxisOrth, Point};
/// Opaque view handles and the render-side content store.
pub use crate::core::view::{ViewId, ViewRegistry};

/// Environment configuration and the crate error type.
pub use crate::config::EnvConfig;
pub use crate::error::OverlayError;

/// Region directory, registries and queues.
pub use crate::runtime::directory::{
    DirectoryOptions, Liveness, RegionDirectory, RegionId, DEFAULT_REGION,
};
pub use crate::runtime::queue::{
    ItemBuilder, LineOut, PresentationQueue, Priority, QueueItem, QueueOptions, QueuePhase,
    SingleStepPolicy,
};
pub use crate::runtime::registry::{
    PresentMode, PresentationRegistry, RegionSnapshot, Slot, SlotId,
};
pub use crate::runtime::scheduler::{Scheduler, TimerHandle};

/// Render surface adapter.
pub use crate::render::surface::{resolve_frame, RenderedSlot, SurfaceAttachment, SurfaceSize};
