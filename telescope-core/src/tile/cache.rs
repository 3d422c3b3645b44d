use super::Tile;
use crate::{
    camera::CameraState,
    color::Color,
    config::TileConfig,
    frame::{Frame, FrameId},
    render::{
        pass::{self, FrameStats, LocalView},
        PassTarget, RenderBackend,
    },
    stroke::Stroke,
    util::Rect,
    DVec2,
};

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct BakeReport {
    pub baked: usize,
    /// Tiles left dirty because the backend refused them.
    pub failed: usize,
}

/// Policy and baking for the per-frame tile grids.
#[derive(Clone, Debug)]
pub struct TileCache {
    config: TileConfig,
}
impl TileCache {
    #[must_use]
    pub fn new(config: TileConfig) -> Self {
        Self { config }
    }
    #[must_use]
    pub fn config(&self) -> &TileConfig {
        &self.config
    }
    /// Whether a tier at `zoom` is drawn from tiles. Outside the band the tiles would be visibly
    /// blurry or wastefully fine, so raw strokes are drawn instead.
    #[must_use]
    pub fn should_use_tile_cache(&self, zoom: f64) -> bool {
        let (min, max) = self.config.zoom_band;
        self.config.enabled && zoom >= min && zoom <= max
    }
    /// Pixels per frame unit inside a baked tile.
    #[must_use]
    pub fn tile_zoom(&self) -> f64 {
        f64::from(self.config.texture_size) / self.config.tile_world_size
    }
    /// The camera a tile is baked through: centered on the tile, unrotated, exactly covering it.
    #[must_use]
    pub fn tile_camera(&self, tile: &Tile, frame: FrameId) -> CameraState {
        let size = f64::from(self.config.texture_size);
        CameraState {
            pan_offset: tile.rect.center(),
            zoom_scale: self.tile_zoom(),
            rotation: 0.0,
            active_frame: frame,
            viewport: DVec2::new(size, size),
        }
    }
    /// Dirty every tile of `frame` under a newly committed stroke.
    pub fn mark_dirty(&self, frame: &mut Frame, stroke: &Stroke) -> usize {
        if !self.config.enabled {
            return 0;
        }
        frame.tiles_mut().mark_dirty(&stroke.world_bounds())
    }
    /// Does the tile grid fully show this stroke already?
    #[must_use]
    pub fn is_stroke_covered_by_tiles(&self, frame: &Frame, stroke: &Stroke) -> bool {
        self.config.enabled && frame.tiles().is_covered(&stroke.world_bounds())
    }
    /// Bake dirty tiles of `frame` until `budget` runs out, those touching `priority` first.
    ///
    /// A tile whose texture can't be allocated or drawn into stays dirty, and the strokes over
    /// it keep being drawn raw.
    pub fn bake_dirty_tiles(
        &self,
        frame: &mut Frame,
        frame_id: FrameId,
        backend: &mut dyn RenderBackend,
        budget: &mut usize,
        priority: Option<&Rect>,
        stats: &mut FrameStats,
    ) -> BakeReport {
        let mut report = BakeReport::default();
        let (strokes, grid) = frame.strokes_and_tiles_mut();
        let mut keys = grid.dirty_keys();
        if let Some(priority) = priority {
            // Stable, so ties keep key order.
            keys.sort_by_key(|key| !grid.key_rect(*key).intersects(priority));
        }

        for key in keys {
            if *budget == 0 {
                break;
            }
            let Some(tile) = grid.get_mut(&key) else {
                continue;
            };
            match self.bake_one(tile, frame_id, strokes, backend, stats) {
                Ok(()) => {
                    *budget -= 1;
                    report.baked += 1;
                    stats.tiles_baked += 1;
                }
                Err(err) => {
                    log::warn!("tile {key:?} of {frame_id} not baked: {err}");
                    report.failed += 1;
                    // Allocation failures won't get better within this tick.
                    break;
                }
            }
        }
        report
    }
    fn bake_one(
        &self,
        tile: &mut Tile,
        frame_id: FrameId,
        strokes: &[Stroke],
        backend: &mut dyn RenderBackend,
        stats: &mut FrameStats,
    ) -> Result<(), crate::render::BackendError> {
        let texture = match tile.texture {
            Some(texture) => texture,
            None => {
                let texture = backend.create_texture(self.config.texture_size)?;
                tile.texture = Some(texture);
                texture
            }
        };
        let camera = self.tile_camera(tile, frame_id);
        let view = LocalView::canvas(&camera);

        backend.begin_pass(PassTarget::Texture(texture), Some(Color::TRANSPARENT))?;
        for stroke in strokes {
            // Anything further away can't reach the tile even with its width.
            let reach = stroke.world_bounds().expanded(stroke.world_half_width());
            if reach.intersects(&tile.rect) {
                pass::draw_stroke(backend, stroke, &view, stats);
            }
        }
        backend.end_pass()?;
        tile.dirty = false;
        Ok(())
    }
}
