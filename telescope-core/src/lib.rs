//! # Telescope core
//!
//! Everything needed to hold and draw an infinitely zoomable canvas using only `f64` world math
//! and `f32` GPU data: a graph of bounded reference frames, the camera solver that keeps gestures
//! pinned, chunked stroke geometry, and a baked tile cache. Actual pixels are the business of a
//! [`render::RenderBackend`] implementation.

pub mod camera;
pub mod canvas;
pub mod card;
pub mod color;
pub mod config;
pub mod cull;
pub mod frame;
pub mod geometry;
pub mod id;
pub mod render;
pub mod stroke;
pub mod tile;
pub mod units;
pub mod util;

pub use camera::CameraState;
pub use canvas::Canvas;
pub use config::CanvasConfig;
pub use frame::{FrameGraph, FrameId};
use id::UniqueID;

/// World-space vector type. Everything in frame-local space is `f64`, and is only ever narrowed
/// to `f32` once it is relative to the camera.
pub type DVec2 = cgmath::Vector2<f64>;
