//! # Strokes
//!
//! A committed stroke is an immutable, pre-tessellated triangle list stored relative to its own
//! origin and split into triangle-aligned chunks, each of which carries its local bounds so that
//! the renderer can skip the parts that aren't on screen.

use crate::{
    color::Color,
    geometry::{self, StrokeVertex, TessellationParams},
    render::BufferHandle,
    util::Rect,
    DVec2,
};

pub type StrokeID = crate::UniqueID<Stroke>;

/// A contiguous, triangle-aligned span of a stroke's vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeChunk {
    pub vertices: std::ops::Range<u32>,
    /// Bounds of every vertex position in the span, relative to the stroke origin.
    pub bounds: Rect,
}

/// How a stroke is drawn, fixed at the moment it began.
#[derive(Clone, Copy, Debug)]
pub struct StrokeBrush {
    /// On-screen width when drawn, logical pixels.
    pub width_px: f32,
    pub color: Color,
    pub smoothing_subdivisions: usize,
}
impl From<&crate::config::BrushConfig> for StrokeBrush {
    fn from(config: &crate::config::BrushConfig) -> Self {
        Self {
            width_px: config.width_px,
            color: config.color,
            smoothing_subdivisions: config.smoothing_subdivisions,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StrokeError {
    #[error("stroke has no points")]
    NoPoints,
    #[error("zoom {0} is not a usable creation zoom")]
    InvalidZoom(f64),
    #[error("stroke width {0} must be finite and positive")]
    InvalidWidth(f32),
    #[error("{0} vertices don't fit a 32 bit index")]
    TooManyVertices(usize),
}

/// Smooth and tessellate points (already relative to `origin`) with a brush, at a zoom.
///
/// The brush width is in pixels, so the world half-width shrinks as `zoom` grows and the stroke
/// looks exactly `width_px` wide at the moment it is drawn.
#[must_use]
pub fn tessellate_brush(points: &[DVec2], brush: &StrokeBrush, zoom: f64) -> Vec<StrokeVertex> {
    let smoothed = geometry::catmull_rom(points, brush.smoothing_subdivisions);
    geometry::tess::tessellate(
        &smoothed,
        &TessellationParams {
            half_width: world_half_width(brush.width_px, zoom),
            color: brush.color,
        },
    )
}

fn world_half_width(width_px: f32, zoom: f64) -> f64 {
    f64::from(width_px) / 2.0 / zoom
}

/// Split a triangle list into chunks of at most `chunk_vertices` (a multiple of three).
///
/// # Errors
/// If the vertex count can't be addressed by `u32`.
pub fn chunk(
    vertices: &[StrokeVertex],
    chunk_vertices: u32,
) -> Result<Vec<StrokeChunk>, StrokeError> {
    use az::CheckedAs;
    let too_many = || StrokeError::TooManyVertices(vertices.len());
    vertices.len().checked_as::<u32>().ok_or_else(too_many)?;

    let chunk_vertices = chunk_vertices.max(3) - chunk_vertices.max(3) % 3;
    let mut start = 0u32;
    vertices
        .chunks(chunk_vertices as usize)
        .map(|span| {
            let len = span.len().checked_as::<u32>().ok_or_else(too_many)?;
            let chunk = StrokeChunk {
                vertices: start..start + len,
                bounds: geometry::bounds_of(span),
            };
            start += len;
            Ok(chunk)
        })
        .collect()
}

pub struct Stroke {
    id: StrokeID,
    origin: DVec2,
    vertices: Vec<StrokeVertex>,
    chunks: Vec<StrokeChunk>,
    bounds: Rect,
    buffer: Option<BufferHandle>,
    brush: StrokeBrush,
    zoom_at_creation: f64,
}
impl Stroke {
    /// Build a stroke from points in its owner's space. The first point becomes the origin.
    ///
    /// # Errors
    /// With no points, a non-positive zoom or width, or a ludicrous vertex count.
    pub fn build(
        points: &[DVec2],
        brush: StrokeBrush,
        zoom_at_creation: f64,
        chunk_vertices: u32,
    ) -> Result<Self, StrokeError> {
        if !(zoom_at_creation.is_finite() && zoom_at_creation > 0.0) {
            return Err(StrokeError::InvalidZoom(zoom_at_creation));
        }
        if !(brush.width_px.is_finite() && brush.width_px > 0.0) {
            return Err(StrokeError::InvalidWidth(brush.width_px));
        }
        let origin = *points.first().ok_or(StrokeError::NoPoints)?;
        let local: Vec<DVec2> = points.iter().map(|&point| point - origin).collect();
        let vertices = tessellate_brush(&local, &brush, zoom_at_creation);
        Self::from_vertices(origin, vertices, brush, zoom_at_creation, chunk_vertices)
    }
    /// Wrap an already tessellated triangle list.
    ///
    /// # Errors
    /// If there are no vertices, or too many.
    pub fn from_vertices(
        origin: DVec2,
        vertices: Vec<StrokeVertex>,
        brush: StrokeBrush,
        zoom_at_creation: f64,
        chunk_vertices: u32,
    ) -> Result<Self, StrokeError> {
        if vertices.is_empty() {
            return Err(StrokeError::NoPoints);
        }
        let chunks = chunk(&vertices, chunk_vertices)?;
        let bounds = chunks
            .iter()
            .fold(Rect::EMPTY, |rect, chunk| rect.union(chunk.bounds));
        Ok(Self {
            id: StrokeID::next(),
            origin,
            vertices,
            chunks,
            bounds,
            buffer: None,
            brush,
            zoom_at_creation,
        })
    }
    #[must_use]
    pub fn id(&self) -> StrokeID {
        self.id
    }
    #[must_use]
    pub fn origin(&self) -> DVec2 {
        self.origin
    }
    #[must_use]
    pub fn vertices(&self) -> &[StrokeVertex] {
        &self.vertices
    }
    #[must_use]
    pub fn chunks(&self) -> &[StrokeChunk] {
        &self.chunks
    }
    #[must_use]
    pub fn brush(&self) -> &StrokeBrush {
        &self.brush
    }
    #[must_use]
    pub fn zoom_at_creation(&self) -> f64 {
        self.zoom_at_creation
    }
    /// Half of the stroke's width in its owner's units. Constant, so the stroke scales with zoom.
    #[must_use]
    pub fn world_half_width(&self) -> f64 {
        world_half_width(self.brush.width_px, self.zoom_at_creation)
    }
    /// Bounds relative to the origin.
    #[must_use]
    pub fn local_bounds(&self) -> Rect {
        self.bounds
    }
    /// Bounds in the owner's space.
    #[must_use]
    pub fn world_bounds(&self) -> Rect {
        self.bounds.translated(self.origin)
    }
    #[must_use]
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }
    pub fn set_buffer(&mut self, buffer: BufferHandle) -> Option<BufferHandle> {
        self.buffer.replace(buffer)
    }
    pub fn take_buffer(&mut self) -> Option<BufferHandle> {
        self.buffer.take()
    }
}
impl std::fmt::Debug for Stroke {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stroke")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("vertices", &self.vertices.len())
            .field("chunks", &self.chunks.len())
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}
