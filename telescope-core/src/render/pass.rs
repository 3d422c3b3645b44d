//! # Render pass
//!
//! One tick of drawing: bake whatever tiles are dirty and wanted, then draw every tier back to
//! front into the screen pass, then whatever the caller wants on top (the live stroke).
//!
//! Per tier the order is fixed: clean tiles, then any stroke the tiles don't fully cover, then
//! cards. Outside the tile zoom band every stroke is drawn raw.

use super::{BackendError, DrawCall, DrawTransform, PassTarget, RenderBackend};
use crate::{
    camera::CameraState,
    card::Card,
    color::Color,
    config::CanvasConfig,
    cull::{self, CullView},
    frame::{traverse, FrameGraph, TierPlan},
    stroke::Stroke,
    tile::TileCache,
    util, DVec2,
};
use az::Az;

pub const CLEAR_COLOR: Color = Color::WHITE;

/// What one tick did.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct FrameStats {
    pub tiers_drawn: usize,
    /// Tiers skipped for being too magnified.
    pub tiers_culled: usize,
    pub chunks_submitted: usize,
    pub chunks_culled: usize,
    pub tiles_drawn: usize,
    pub tiles_baked: usize,
    /// Strokes not drawn because baked tiles already show them.
    pub strokes_from_tiles: usize,
    /// Strokes with no backend buffer.
    pub strokes_skipped: usize,
    pub cards_drawn: usize,
    pub draw_calls: usize,
}
impl std::ops::AddAssign for FrameStats {
    fn add_assign(&mut self, rhs: Self) {
        self.tiers_drawn += rhs.tiers_drawn;
        self.tiers_culled += rhs.tiers_culled;
        self.chunks_submitted += rhs.chunks_submitted;
        self.chunks_culled += rhs.chunks_culled;
        self.tiles_drawn += rhs.tiles_drawn;
        self.tiles_baked += rhs.tiles_baked;
        self.strokes_from_tiles += rhs.strokes_from_tiles;
        self.strokes_skipped += rhs.strokes_skipped;
        self.cards_drawn += rhs.cards_drawn;
        self.draw_calls += rhs.draw_calls;
    }
}

/// Placement of some local space relative to a camera: geometry at local `p` ends up on screen
/// at `R(rotation) * (p + base_offset) * zoom + viewport / 2`.
#[derive(Copy, Clone, Debug)]
pub struct LocalView {
    pub base_offset: DVec2,
    pub rotation: f64,
    pub zoom: f64,
    pub viewport: DVec2,
}
impl LocalView {
    /// Frame-local geometry.
    #[must_use]
    pub fn canvas(camera: &CameraState) -> Self {
        Self {
            base_offset: -camera.pan_offset,
            rotation: camera.rotation_f64(),
            zoom: camera.zoom_scale,
            viewport: camera.viewport,
        }
    }
    /// Geometry in a card's rotated local space.
    #[must_use]
    pub fn card(camera: &CameraState, card: &Card) -> Self {
        Self::placed(camera, card.origin(), card.rotation())
    }
    /// Geometry in a space centered on frame-local `origin`, rotated by `rotation`.
    #[must_use]
    pub fn placed(camera: &CameraState, origin: DVec2, rotation: f64) -> Self {
        Self {
            base_offset: util::rotate(origin - camera.pan_offset, -rotation),
            rotation: camera.rotation_f64() + rotation,
            zoom: camera.zoom_scale,
            viewport: camera.viewport,
        }
    }
    #[must_use]
    pub fn cull_view(&self) -> CullView {
        CullView {
            viewport: self.viewport,
            rotation: self.rotation,
            zoom: self.zoom,
        }
    }
    /// Transform for geometry whose local origin is at `origin`.
    #[must_use]
    pub fn transform(&self, origin: DVec2) -> DrawTransform {
        DrawTransform::new(origin + self.base_offset, self.zoom, self.viewport, self.rotation)
    }
}

fn half_extent(v: DVec2) -> [f32; 2] {
    [v.x.az::<f32>(), v.y.az::<f32>()]
}

/// Submit the visible chunks of one stroke.
pub fn draw_stroke(
    backend: &mut dyn RenderBackend,
    stroke: &Stroke,
    view: &LocalView,
    stats: &mut FrameStats,
) {
    let Some(buffer) = stroke.buffer() else {
        log::trace!("{} has no buffer", stroke.id());
        stats.strokes_skipped += 1;
        return;
    };
    let offset = stroke.origin() + view.base_offset;
    let pad = stroke.world_half_width() * view.zoom;
    let (ranges, counts) = cull::visible_ranges(stroke.chunks(), &view.cull_view(), offset, pad);
    stats.chunks_submitted += counts.visible;
    stats.chunks_culled += counts.culled;

    let transform = view.transform(stroke.origin()).with_half_width(stroke.world_half_width());
    for vertices in ranges {
        backend.submit(DrawCall::Strokes {
            buffer,
            transform,
            vertices,
        });
        stats.draw_calls += 1;
    }
}

/// Draw a card and everything on it, if any of it is on screen.
pub fn draw_card(
    backend: &mut dyn RenderBackend,
    card: &mut Card,
    camera: &CameraState,
    config: &CanvasConfig,
    stats: &mut FrameStats,
) {
    let view = LocalView::card(camera, card);
    if !view
        .cull_view()
        .rect_visible(&card.local_rect(), view.base_offset, 0.0)
    {
        return;
    }
    stats.cards_drawn += 1;
    let center = DVec2::new(0.0, 0.0);
    let half = half_extent(card.size() / 2.0);

    if let crate::card::CardContent::Image { texture } = *card.content() {
        backend.submit(DrawCall::TexturedQuad {
            texture,
            transform: view.transform(center),
            half_extent: half,
        });
        stats.draw_calls += 1;
    } else if let Some(color) = card.content().background_color() {
        backend.submit(DrawCall::SolidQuad {
            color,
            transform: view.transform(center),
            half_extent: half,
        });
        stats.draw_calls += 1;
    }
    if let Some(pattern) =
        card.ensure_background(backend, config.resolution, config.chunk_vertices())
    {
        draw_stroke(backend, pattern, &view, stats);
    }
    for stroke in card.strokes() {
        draw_stroke(backend, stroke, &view, stats);
    }
}

/// Draw one frame as seen through `camera`: tiles or raw strokes, then cards.
fn draw_tier(
    backend: &mut dyn RenderBackend,
    graph: &mut FrameGraph,
    camera: &CameraState,
    config: &CanvasConfig,
    tiles: &TileCache,
    stats: &mut FrameStats,
) {
    let Some(frame) = graph.frame_mut(camera.active_frame) else {
        return;
    };
    let view = LocalView::canvas(camera);
    let use_tiles = tiles.should_use_tile_cache(camera.zoom_scale);

    if use_tiles {
        let cull = view.cull_view();
        for tile in frame.tiles().iter().filter(|tile| tile.is_valid()) {
            if !cull.rect_visible(&tile.rect, view.base_offset, 0.0) {
                continue;
            }
            let Some(texture) = tile.texture else {
                continue;
            };
            backend.submit(DrawCall::TexturedQuad {
                texture,
                transform: view.transform(tile.rect.center()),
                half_extent: half_extent(tile.rect.half_extent()),
            });
            stats.tiles_drawn += 1;
            stats.draw_calls += 1;
        }
    }

    let raw = if use_tiles {
        let frame = &*frame;
        either::Either::Left(frame.strokes().iter().filter(move |stroke| {
            !tiles.is_stroke_covered_by_tiles(frame, stroke)
        }))
    } else {
        either::Either::Right(frame.strokes().iter())
    };
    let mut drawn = 0;
    for stroke in raw {
        draw_stroke(backend, stroke, &view, stats);
        drawn += 1;
    }
    stats.strokes_from_tiles += frame.strokes().len() - drawn;

    for card in frame.cards_mut() {
        draw_card(backend, card, camera, config, stats);
    }
}

/// Bake dirty tiles of every tier that will be drawn from tiles, within the tick's budget.
fn bake_tiers(
    backend: &mut dyn RenderBackend,
    graph: &mut FrameGraph,
    plan: &TierPlan,
    tiles: &TileCache,
    stats: &mut FrameStats,
) {
    let mut budget = tiles.config().max_bakes_per_tick;
    for tier in &plan.tiers {
        if budget == 0 {
            break;
        }
        if !tiles.should_use_tile_cache(tier.camera.zoom_scale) {
            continue;
        }
        let Some(frame) = graph.frame_mut(tier.frame) else {
            continue;
        };
        let visible = tier.camera.visible_world_rect();
        tiles.bake_dirty_tiles(frame, tier.frame, backend, &mut budget, Some(&visible), stats);
    }
}

/// Run one full tick. `overlay` is called inside the screen pass, after everything else, with
/// the tier plan so it can find its frame's camera.
///
/// # Errors
/// If the screen pass can't be opened or closed. Bake failures only fall back to raw drawing.
pub fn render_tick(
    backend: &mut dyn RenderBackend,
    graph: &mut FrameGraph,
    camera: &CameraState,
    config: &CanvasConfig,
    tiles: &TileCache,
    overlay: impl FnOnce(&mut dyn RenderBackend, &TierPlan, &mut FrameStats),
) -> Result<FrameStats, BackendError> {
    let mut stats = FrameStats::default();
    let plan = traverse::plan_tiers(graph, camera, &config.frames, config.tiers);
    stats.tiers_drawn = plan.tiers.len();
    stats.tiers_culled = plan.culled;

    bake_tiers(backend, graph, &plan, tiles, &mut stats);

    backend.begin_pass(PassTarget::Screen, Some(CLEAR_COLOR))?;
    for tier in &plan.tiers {
        draw_tier(backend, graph, &tier.camera, config, tiles, &mut stats);
    }
    overlay(backend, &plan, &mut stats);
    backend.end_pass()?;

    log::trace!("tick: {stats:?}");
    Ok(stats)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        card::CardContent,
        frame::FrameId,
        render::{recording::Recorded, RecordingBackend},
        stroke::StrokeBrush,
    };

    fn brush() -> StrokeBrush {
        StrokeBrush {
            width_px: 2.0,
            color: Color::BLACK,
            smoothing_subdivisions: 0,
        }
    }
    fn uploaded(backend: &mut RecordingBackend, points: &[DVec2]) -> Stroke {
        let mut stroke = Stroke::build(points, brush(), 1.0, 1536).unwrap();
        let buffer = backend.create_vertex_buffer(stroke.vertices()).unwrap();
        stroke.set_buffer(buffer);
        stroke
    }

    #[test]
    fn stroke_draw_lands_where_the_camera_says() {
        let mut backend = RecordingBackend::new();
        let stroke = uploaded(&mut backend, &[DVec2::new(10.0, 10.0), DVec2::new(30.0, 10.0)]);
        let mut camera = CameraState::new(FrameId::ROOT, DVec2::new(800.0, 600.0));
        camera.pan_offset = DVec2::new(5.0, -2.0);
        camera.zoom_scale = 3.0;
        camera.rotation = 0.4;

        let mut stats = FrameStats::default();
        draw_stroke(&mut backend, &stroke, &LocalView::canvas(&camera), &mut stats);
        assert_eq!(stats.draw_calls, 1);
        let Some((_, DrawCall::Strokes { transform, .. })) = backend.draws().next() else {
            panic!("expected a stroke draw");
        };
        // The first point is the stroke origin, local (0, 0).
        let expected = camera.world_to_screen(DVec2::new(10.0, 10.0));
        let actual = transform.apply([0.0, 0.0]);
        assert!((expected - actual).x.abs() < 1e-3 && (expected - actual).y.abs() < 1e-3);
    }
    #[test]
    fn card_strokes_follow_the_card() {
        let mut backend = RecordingBackend::new();
        let mut card = Card::new(
            DVec2::new(40.0, 20.0),
            DVec2::new(100.0, 60.0),
            1.0,
            CardContent::Drawing {
                background: Color::WHITE,
            },
        );
        card.set_rotation(0.8);
        let local_point = DVec2::new(10.0, -5.0);
        let stroke = uploaded(&mut backend, &[local_point, local_point + DVec2::new(5.0, 0.0)]);
        card.strokes_mut().push(stroke);

        let mut camera = CameraState::new(FrameId::ROOT, DVec2::new(800.0, 600.0));
        camera.rotation = -0.3;
        camera.zoom_scale = 2.0;
        let mut stats = FrameStats::default();
        draw_card(&mut backend, &mut card, &camera, &CanvasConfig::default(), &mut stats);
        assert_eq!(stats.cards_drawn, 1);

        let strokes: Vec<_> = backend
            .draws()
            .filter_map(|(_, call)| match call {
                DrawCall::Strokes { transform, .. } => Some(*transform),
                _ => None,
            })
            .collect();
        assert_eq!(strokes.len(), 1);
        let expected = camera.world_to_screen(card.to_frame(local_point));
        let actual = strokes[0].apply([0.0, 0.0]);
        assert!((expected - actual).x.abs() < 1e-3 && (expected - actual).y.abs() < 1e-3);
        // Background first.
        assert!(matches!(
            backend.commands().first(),
            Some(Recorded::Draw(DrawCall::SolidQuad { .. }))
        ));
    }
    #[test]
    fn strokes_without_buffers_are_skipped() {
        let mut backend = RecordingBackend::new();
        let stroke =
            Stroke::build(&[DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0)], brush(), 1.0, 1536)
                .unwrap();
        let camera = CameraState::new(FrameId::ROOT, DVec2::new(800.0, 600.0));
        let mut stats = FrameStats::default();
        draw_stroke(&mut backend, &stroke, &LocalView::canvas(&camera), &mut stats);
        assert_eq!(stats.strokes_skipped, 1);
        assert!(backend.commands().is_empty());
    }
}
