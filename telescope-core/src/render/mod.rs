//! # Render
//!
//! The canvas never talks to a GPU directly. Each tick it produces a sequence of passes and
//! [`DrawCall`]s against a [`RenderBackend`], which owns every buffer and texture. Everything
//! crossing this boundary is `f32` and camera-relative, so nothing large ever reaches the GPU.

pub mod pass;
pub mod recording;

pub use pass::FrameStats;
pub use recording::RecordingBackend;

use crate::{color::Color, geometry::StrokeVertex, util, DVec2};
use az::Az;

/// Backend-owned vertex buffer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct BufferHandle(pub u64);
/// Backend-owned square render target, also sampleable.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TextureHandle(pub u64);

/// Per-draw transform record, laid out for direct upload as push constants or a uniform.
///
/// A vertex at `position` lands on screen at
/// `R(rotation_angle) * (position + screen_relative_offset) * zoom_scale + viewport / 2`,
/// in logical pixels from the top left.
#[derive(Copy, Clone, PartialEq, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct DrawTransform {
    /// Geometry origin minus the camera pan, in the drawing frame's units.
    pub screen_relative_offset: [f32; 2],
    pub zoom_scale: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub rotation_angle: f32,
    /// Stroke half width in pixels at this zoom. Informational, strokes arrive pre-extruded.
    pub stroke_half_width_pixels: f32,
}
impl DrawTransform {
    #[must_use]
    pub fn new(offset: DVec2, zoom: f64, viewport: DVec2, rotation: f64) -> Self {
        Self {
            screen_relative_offset: [offset.x.az::<f32>(), offset.y.az::<f32>()],
            zoom_scale: zoom.az::<f32>(),
            viewport_width: viewport.x.az::<f32>(),
            viewport_height: viewport.y.az::<f32>(),
            rotation_angle: rotation.az::<f32>(),
            stroke_half_width_pixels: 0.0,
        }
    }
    #[must_use]
    pub fn with_half_width(self, world_half_width: f64) -> Self {
        Self {
            stroke_half_width_pixels: (world_half_width * f64::from(self.zoom_scale)).az::<f32>(),
            ..self
        }
    }
    /// Where a local `position` ends up on screen, as a backend would compute it.
    #[must_use]
    pub fn apply(&self, position: [f32; 2]) -> DVec2 {
        let relative = DVec2::new(
            f64::from(position[0]) + f64::from(self.screen_relative_offset[0]),
            f64::from(position[1]) + f64::from(self.screen_relative_offset[1]),
        );
        util::rotate(relative, f64::from(self.rotation_angle)) * f64::from(self.zoom_scale)
            + DVec2::new(
                f64::from(self.viewport_width) / 2.0,
                f64::from(self.viewport_height) / 2.0,
            )
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PassTarget {
    Screen,
    Texture(TextureHandle),
}

#[derive(Clone, PartialEq, Debug)]
pub enum DrawCall {
    /// A range of a triangle-list vertex buffer.
    Strokes {
        buffer: BufferHandle,
        transform: DrawTransform,
        vertices: std::ops::Range<u32>,
    },
    /// A whole texture, stretched over a quad centered on the transform's offset.
    TexturedQuad {
        texture: TextureHandle,
        transform: DrawTransform,
        half_extent: [f32; 2],
    },
    SolidQuad {
        color: Color,
        transform: DrawTransform,
        half_extent: [f32; 2],
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend out of memory")]
    OutOfMemory,
    #[error("can't create an empty resource")]
    Empty,
    #[error("no pass is open")]
    NoPass,
    #[error("a pass is already open")]
    PassAlreadyOpen,
    #[error("unknown resource handle")]
    UnknownHandle,
}

/// The consumer of draw calls.
///
/// Submission is fire-and-forget: once `submit` returns, the canvas assumes the draw happened.
pub trait RenderBackend {
    /// Upload an immutable triangle list.
    ///
    /// # Errors
    /// When the backend can't hold the data.
    fn create_vertex_buffer(&mut self, vertices: &[StrokeVertex])
        -> Result<BufferHandle, BackendError>;
    /// Release a buffer. Unknown handles are ignored.
    fn release_buffer(&mut self, buffer: BufferHandle);
    /// Allocate a square `size` x `size` render target.
    ///
    /// # Errors
    /// When the backend can't hold the texture.
    fn create_texture(&mut self, size: u32) -> Result<TextureHandle, BackendError>;
    /// Start drawing into `target`, optionally clearing it first.
    ///
    /// # Errors
    /// If a pass is already open or the target is unknown.
    fn begin_pass(&mut self, target: PassTarget, clear: Option<Color>) -> Result<(), BackendError>;
    /// # Errors
    /// If no pass is open.
    fn end_pass(&mut self) -> Result<(), BackendError>;
    fn submit(&mut self, call: DrawCall);
}

#[cfg(test)]
mod test {
    use super::DrawTransform;
    use crate::DVec2;

    #[test]
    fn transform_places_offset_at_center() {
        let transform = DrawTransform::new(
            DVec2::new(-10.0, 5.0),
            2.0,
            DVec2::new(800.0, 600.0),
            0.0,
        );
        let screen = transform.apply([10.0, -5.0]);
        assert!((screen.x - 400.0).abs() < 1e-9);
        assert!((screen.y - 300.0).abs() < 1e-9);
        let screen = transform.apply([11.0, -5.0]);
        assert!((screen.x - 402.0).abs() < 1e-9);
        assert_eq!(transform.with_half_width(1.5).stroke_half_width_pixels, 3.0);
    }
}
