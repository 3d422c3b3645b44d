//! # Cards
//!
//! Movable, rotatable rectangles living in a frame. A card carries its own strokes, stored in
//! the card's rotated local space with the card center at the origin, so moving or turning the
//! card carries its drawing along for free.
//!
//! Card-local and frame-local space are related by
//! `frame = origin + R(rotation) * local`.

use crate::{
    color::Color,
    geometry::tess::{self, TessellationParams},
    render::{BufferHandle, RenderBackend, TextureHandle},
    stroke::{Stroke, StrokeBrush},
    units::{Length, Resolution},
    util::{self, Rect},
    DVec2,
};

pub type CardID = crate::UniqueID<Card>;

/// Upper bound on pattern lines per axis, in case of a silly spacing.
const MAX_PATTERN_LINES: usize = 4096;

/// Ruled paper.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinedConfig {
    pub spacing: Length,
    pub line_width: Length,
    pub line_color: Color,
    pub background: Color,
}
impl Default for LinedConfig {
    fn default() -> Self {
        Self {
            spacing: Length::Point(24.0),
            line_width: Length::Point(1.0),
            line_color: Color::from_srgba8([160, 190, 230, 255]),
            background: Color::WHITE,
        }
    }
}

/// Graph paper.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    pub spacing: Length,
    pub line_width: Length,
    pub line_color: Color,
    pub background: Color,
}
impl Default for GridConfig {
    fn default() -> Self {
        Self {
            spacing: Length::Point(18.0),
            line_width: Length::Point(0.75),
            line_color: Color::from_srgba8([200, 200, 200, 255]),
            background: Color::WHITE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, strum::AsRefStr)]
pub enum CardContent {
    SolidColor(Color),
    /// A backend texture, stretched over the card.
    Image { texture: TextureHandle },
    Lined(LinedConfig),
    Grid(GridConfig),
    /// A blank surface meant for drawing on.
    Drawing { background: Color },
}
impl CardContent {
    /// The flat fill under everything else, if any.
    #[must_use]
    pub fn background_color(&self) -> Option<Color> {
        match self {
            Self::SolidColor(color) | Self::Drawing { background: color } => Some(*color),
            Self::Lined(LinedConfig { background, .. })
            | Self::Grid(GridConfig { background, .. }) => {
                Some(*background)
            }
            Self::Image { .. } => None,
        }
    }
}

pub struct Card {
    id: CardID,
    origin: DVec2,
    size: DVec2,
    rotation: f64,
    creation_zoom: f64,
    content: CardContent,
    editing: bool,
    strokes: Vec<Stroke>,
    /// Tessellated background pattern. Cleared whenever anything it depends on changes.
    background: Option<Stroke>,
    /// Set when building the background failed, so it isn't retried every tick.
    background_failed: bool,
}
impl Card {
    #[must_use]
    pub fn new(origin: DVec2, size: DVec2, creation_zoom: f64, content: CardContent) -> Self {
        Self {
            id: CardID::next(),
            origin,
            size,
            rotation: 0.0,
            creation_zoom,
            content,
            editing: false,
            strokes: Vec::new(),
            background: None,
            background_failed: false,
        }
    }
    #[must_use]
    pub fn id(&self) -> CardID {
        self.id
    }
    #[must_use]
    pub fn origin(&self) -> DVec2 {
        self.origin
    }
    pub fn set_origin(&mut self, origin: DVec2) {
        self.origin = origin;
    }
    #[must_use]
    pub fn size(&self) -> DVec2 {
        self.size
    }
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }
    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
    }
    #[must_use]
    pub fn creation_zoom(&self) -> f64 {
        self.creation_zoom
    }
    #[must_use]
    pub fn content(&self) -> &CardContent {
        &self.content
    }
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editing
    }
    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }
    pub(crate) fn strokes_mut(&mut self) -> &mut Vec<Stroke> {
        &mut self.strokes
    }
    /// The cached background pattern, if it's been built.
    #[must_use]
    pub fn background(&self) -> Option<&Stroke> {
        self.background.as_ref()
    }
    /// Change the size. Returns the buffer of the now stale background, for release.
    #[must_use = "the stale background buffer must be released"]
    pub fn set_size(&mut self, size: DVec2) -> Option<BufferHandle> {
        self.size = size;
        self.invalidate_background()
    }
    /// Change the content. Returns the buffer of the now stale background, for release.
    #[must_use = "the stale background buffer must be released"]
    pub fn set_content(&mut self, content: CardContent) -> Option<BufferHandle> {
        self.content = content;
        self.invalidate_background()
    }
    /// Change the zoom that point-sized decorations are measured at. Returns the buffer of the
    /// now stale background, for release.
    #[must_use = "the stale background buffer must be released"]
    pub fn set_creation_zoom(&mut self, zoom: f64) -> Option<BufferHandle> {
        if zoom.is_finite() && zoom > 0.0 {
            self.creation_zoom = zoom;
        }
        self.invalidate_background()
    }
    fn invalidate_background(&mut self) -> Option<BufferHandle> {
        self.background_failed = false;
        self.background.take().and_then(|mut stroke| stroke.take_buffer())
    }
    /// Every backend buffer this card holds, emptying them out. For deletion.
    pub(crate) fn take_buffers(&mut self) -> impl Iterator<Item = BufferHandle> + '_ {
        self.background
            .iter_mut()
            .chain(self.strokes.iter_mut())
            .filter_map(Stroke::take_buffer)
    }

    /// Frame-local point to card-local.
    #[must_use]
    pub fn to_local(&self, point: DVec2) -> DVec2 {
        util::rotate(point - self.origin, -self.rotation)
    }
    /// Card-local point to frame-local.
    #[must_use]
    pub fn to_frame(&self, local: DVec2) -> DVec2 {
        self.origin + util::rotate(local, self.rotation)
    }
    /// Is a frame-local point on the card? Edges count.
    #[must_use]
    pub fn contains_point(&self, point: DVec2) -> bool {
        let local = self.to_local(point);
        let half = self.size / 2.0;
        local.x.abs() <= half.x && local.y.abs() <= half.y
    }
    /// Card-local extent, centered on zero.
    #[must_use]
    pub fn local_rect(&self) -> Rect {
        Rect::centered(DVec2::new(0.0, 0.0), self.size)
    }
    /// Axis aligned frame-local bounds of the rotated card.
    #[must_use]
    pub fn frame_bounds(&self) -> Rect {
        let half = self.size / 2.0;
        Rect::from_points(
            [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)]
                .into_iter()
                .map(|(x, y)| self.to_frame(DVec2::new(half.x * x, half.y * y))),
        )
    }
    /// Lines of the background pattern, card-local, with their color and world half-width.
    #[must_use]
    pub fn pattern_lines(
        &self,
        resolution: Resolution,
    ) -> Option<(Vec<(DVec2, DVec2)>, Color, f64)> {
        let (spacing, width, color, vertical) = match &self.content {
            CardContent::Lined(lined) => (lined.spacing, lined.line_width, lined.line_color, false),
            CardContent::Grid(grid) => (grid.spacing, grid.line_width, grid.line_color, true),
            _ => return None,
        };
        let spacing = spacing.into_world(resolution, self.creation_zoom);
        let half_width = width.into_world(resolution, self.creation_zoom) / 2.0;
        if !(spacing.is_finite() && spacing > 0.0 && half_width.is_finite() && half_width > 0.0) {
            return None;
        }
        let half = self.size / 2.0;
        // Offsets from one edge, strictly inside the card.
        let offsets = |extent: f64| {
            (1..=MAX_PATTERN_LINES).map_while(move |k| {
                #[allow(clippy::cast_precision_loss)]
                let offset = spacing * k as f64;
                (offset < extent).then_some(offset)
            })
        };

        let mut lines: Vec<(DVec2, DVec2)> = offsets(self.size.y)
            .map(|offset| {
                let y = -half.y + offset;
                (DVec2::new(-half.x, y), DVec2::new(half.x, y))
            })
            .collect();
        if vertical {
            lines.extend(offsets(self.size.x).map(|offset| {
                let x = -half.x + offset;
                (DVec2::new(x, -half.y), DVec2::new(x, half.y))
            }));
        }
        Some((lines, color, half_width))
    }
    /// Build and upload the background pattern if it isn't cached yet.
    pub(crate) fn ensure_background(
        &mut self,
        backend: &mut dyn RenderBackend,
        resolution: Resolution,
        chunk_vertices: u32,
    ) -> Option<&Stroke> {
        if self.background.is_none() && !self.background_failed {
            let (lines, color, half_width) = self.pattern_lines(resolution)?;
            let vertices = tess::bars(&lines, &TessellationParams { half_width, color });
            #[allow(clippy::cast_possible_truncation)]
            let width_px = (half_width * 2.0 * self.creation_zoom) as f32;
            let brush = StrokeBrush {
                width_px,
                color,
                smoothing_subdivisions: 0,
            };
            let built = Stroke::from_vertices(
                DVec2::new(0.0, 0.0),
                vertices,
                brush,
                self.creation_zoom,
                chunk_vertices,
            )
            .map_err(|err| err.to_string())
            .and_then(|mut stroke| {
                let buffer = backend
                    .create_vertex_buffer(stroke.vertices())
                    .map_err(|err| err.to_string())?;
                stroke.set_buffer(buffer);
                Ok(stroke)
            });
            match built {
                Ok(stroke) => self.background = Some(stroke),
                Err(err) => {
                    log::warn!("background of {} unavailable: {err}", self.id);
                    self.background_failed = true;
                }
            }
        }
        self.background.as_ref()
    }
}
impl std::fmt::Debug for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Card")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("size", &self.size)
            .field("rotation", &self.rotation)
            .field("content", &self.content.as_ref())
            .field("editing", &self.editing)
            .field("strokes", &self.strokes.len())
            .finish_non_exhaustive()
    }
}
