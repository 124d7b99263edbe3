//! Render-surface side.

pub mod surface;

pub use surface::{resolve_frame, RenderedSlot, SurfaceAttachment, SurfaceSize};
