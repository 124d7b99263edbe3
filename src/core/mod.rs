//! Plain data: positions, easing, animation steps and view handles.

pub mod animation;
pub mod easing;
pub mod geometry;
pub mod view;
