//! # Config
//!
//! Every tunable of the canvas in one place. Defaults are the values the canvas is designed
//! around; the binary layers a settings file on top.

use crate::color::Color;

bitflags::bitflags! {
    /// Which tiers of the frame graph a render tick draws. Handy for debugging the
    /// traversal, everything is on by default.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct RenderTiers : u8 {
        /// The active frame's parent, drawn behind everything.
        const PARENT =   0b0000_0001;
        /// The active frame itself.
        const ACTIVE =   0b0000_0010;
        /// Immediate children of the active frame, drawn in front.
        const CHILDREN = 0b0000_0100;
        /// The stroke currently under the pen.
        const LIVE =     0b0000_1000;
    }
}
impl Default for RenderTiers {
    fn default() -> Self {
        Self::all()
    }
}

/// Reference frame transition thresholds.
#[derive(Clone, Debug)]
pub struct FrameConfig {
    /// Zoom past which the camera drills into a child frame.
    pub drill_down_zoom: f64,
    /// Zoom under which the camera pops up into the parent frame.
    pub pop_up_zoom: f64,
    /// Distance in parent units under which an existing child is re-entered instead of creating a
    /// sibling. A heuristic - nothing about precision depends on it.
    pub reentry_radius: f64,
    /// Tiers magnified more than this are not drawn at all.
    pub max_magnification: f64,
    /// The root has nowhere to pop up to, so its zoom is clamped here instead.
    pub min_root_zoom: f64,
}
impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            drill_down_zoom: 1000.0,
            pop_up_zoom: 0.5,
            reentry_radius: 50.0,
            max_magnification: 1.0e9,
            min_root_zoom: 0.01,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TileConfig {
    pub enabled: bool,
    /// Edge length of a tile, in frame-local units.
    pub tile_world_size: f64,
    /// Edge length of a baked tile texture, in pixels.
    pub texture_size: u32,
    /// Inclusive zoom band where baked tiles are used instead of raw strokes.
    pub zoom_band: (f64, f64),
    /// Upper bound on tiles baked during a single tick. The rest fall back to raw strokes.
    pub max_bakes_per_tick: usize,
}
impl Default for TileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tile_world_size: 512.0,
            texture_size: 512,
            zoom_band: (0.5, 2.0),
            max_bakes_per_tick: 8,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BrushConfig {
    /// Stroke width on screen at the moment of drawing, in logical pixels.
    pub width_px: f32,
    pub color: Color,
    /// Catmull-Rom samples inserted per input segment.
    pub smoothing_subdivisions: usize,
    /// Input points closer than this (in screen pixels) to the previous one are dropped.
    pub min_point_spacing_px: f64,
}
impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            width_px: 3.0,
            color: Color::BLACK,
            smoothing_subdivisions: 4,
            min_point_spacing_px: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CanvasConfig {
    pub frames: FrameConfig,
    pub tiles: TileConfig,
    pub brush: BrushConfig,
    /// Most vertices in a single stroke chunk. See [`Self::chunk_vertices`].
    pub max_chunk_vertices: u32,
    /// Let fingers draw as well as styluses. When off, a lone finger pans.
    pub finger_draws: bool,
    pub tiers: RenderTiers,
    /// Used to turn point-sized card decorations into pixels.
    pub resolution: crate::units::Resolution,
}
impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            frames: FrameConfig::default(),
            tiles: TileConfig::default(),
            brush: BrushConfig::default(),
            // 256 segment quads.
            max_chunk_vertices: 1536,
            finger_draws: false,
            tiers: RenderTiers::default(),
            resolution: crate::units::Resolution::default(),
        }
    }
}
impl CanvasConfig {
    /// The chunk size actually used: at least one triangle, and a whole number of them.
    #[must_use]
    pub fn chunk_vertices(&self) -> u32 {
        let requested = self.max_chunk_vertices.max(3);
        requested - requested % 3
    }
}
