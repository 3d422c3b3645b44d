//! # Canvas
//!
//! The one object a frontend holds. Owns the camera, the frame graph, gesture state, tile policy
//! and the stroke currently being drawn, and routes input events to them. Everything it draws goes
//! through whatever [`RenderBackend`] is handed to [`Canvas::render_tick`].

use cgmath::InnerSpace;

use crate::{
    camera::{
        CameraState, CardDrag, GestureController, GestureOutcome, GestureUpdate, PanEvent,
        PanTarget,
    },
    card::{Card, CardContent, CardID},
    config::{CanvasConfig, RenderTiers},
    frame::{traverse, DrawTarget, Frame, FrameError, FrameGraph, FrameId},
    render::{
        pass::{self, FrameStats, LocalView},
        BackendError, BufferHandle, RenderBackend,
    },
    stroke::{Stroke, StrokeBrush, StrokeError, StrokeID},
    tile::TileCache,
    DVec2,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::AsRefStr)]
pub enum ToolType {
    Stylus,
    Finger,
}

/// A single contact, in screen space.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum DrawEvent {
    Began { screen: DVec2, tool: ToolType },
    Moved { screen: DVec2, tool: ToolType },
    Ended { screen: DVec2, tool: ToolType },
    Cancelled { tool: ToolType },
}
impl DrawEvent {
    #[must_use]
    pub fn tool(&self) -> ToolType {
        match self {
            Self::Began { tool, .. }
            | Self::Moved { tool, .. }
            | Self::Ended { tool, .. }
            | Self::Cancelled { tool } => *tool,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CommitError {
    #[error("bad stroke: {0}")]
    Stroke(#[from] StrokeError),
    #[error("can't upload stroke: {0}")]
    Backend(#[from] BackendError),
    #[error("{0:?} went away before the stroke finished")]
    TargetGone(DrawTarget),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("{0} not found")]
    FrameNotFound(FrameId),
    #[error("card {1} not found in {0}")]
    CardNotFound(FrameId, CardID),
}

/// The stroke under the stylus right now. Points are in the target's space.
struct LiveStroke {
    target: DrawTarget,
    points: Vec<DVec2>,
    last_screen: DVec2,
    zoom: f64,
    brush: StrokeBrush,
}

/// Uploaded live geometry for a single tick.
struct LiveGeometry {
    stroke: Stroke,
    frame: FrameId,
    /// Card placement, when drawing into one.
    placement: Option<(DVec2, f64)>,
}

pub struct Canvas {
    config: CanvasConfig,
    graph: FrameGraph,
    camera: CameraState,
    gestures: GestureController,
    tiles: TileCache,
    live: Option<LiveStroke>,
    /// Buffers orphaned by edits and deletions, released at the start of the next tick.
    pending_release: Vec<BufferHandle>,
    last_stats: FrameStats,
}
impl Canvas {
    #[must_use]
    pub fn new(config: CanvasConfig, viewport: DVec2) -> Self {
        let graph = FrameGraph::new(config.tiles.tile_world_size);
        let camera = CameraState::new(graph.root(), viewport);
        Self {
            tiles: TileCache::new(config.tiles.clone()),
            config,
            graph,
            camera,
            gestures: GestureController::new(),
            live: None,
            pending_release: Vec::new(),
            last_stats: FrameStats::default(),
        }
    }
    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }
    #[must_use]
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }
    #[must_use]
    pub fn graph(&self) -> &FrameGraph {
        &self.graph
    }
    #[must_use]
    pub fn gestures(&self) -> &GestureController {
        &self.gestures
    }
    #[must_use]
    pub fn tile_cache(&self) -> &TileCache {
        &self.tiles
    }
    /// Stats of the most recent [`Self::render_tick`].
    #[must_use]
    pub fn last_stats(&self) -> &FrameStats {
        &self.last_stats
    }
    pub fn set_viewport(&mut self, viewport: DVec2) {
        self.camera.viewport = viewport;
    }

    // ========== Queries ==========
    pub fn frames(&self) -> impl Iterator<Item = (FrameId, &Frame)> + '_ {
        self.graph.frames()
    }
    #[must_use]
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.graph.frame(id)
    }
    #[must_use]
    pub fn strokes(&self, frame: FrameId) -> Option<&[Stroke]> {
        self.graph.frame(frame).map(Frame::strokes)
    }
    #[must_use]
    pub fn cards(&self, frame: FrameId) -> Option<&[Card]> {
        self.graph.frame(frame).map(Frame::cards)
    }
    #[must_use]
    pub fn card(&self, frame: FrameId, card: CardID) -> Option<&Card> {
        self.graph.frame(frame)?.card(card)
    }
    /// Topmost card of `frame` under a frame-local point.
    #[must_use]
    pub fn hit_test(&self, frame: FrameId, world: DVec2) -> Option<CardID> {
        self.graph
            .frame(frame)?
            .cards()
            .iter()
            .rev()
            .find(|card| card.contains_point(world))
            .map(Card::id)
    }
    /// Where the stroke in progress is going, if any.
    #[must_use]
    pub fn live_target(&self) -> Option<DrawTarget> {
        self.live.as_ref().map(|live| live.target)
    }

    // ========== Input ==========
    /// Route a contact. Styluses always draw, fingers draw or pan according to
    /// [`CanvasConfig::finger_draws`].
    ///
    /// # Errors
    /// If the finished stroke couldn't be built or uploaded. It is dropped either way.
    pub fn handle_draw(
        &mut self,
        event: DrawEvent,
        backend: &mut dyn RenderBackend,
    ) -> Result<Option<StrokeID>, CommitError> {
        if event.tool() == ToolType::Finger && !self.config.finger_draws {
            let pan = match event {
                DrawEvent::Began { screen, .. } => PanEvent::Began(screen),
                DrawEvent::Moved { screen, .. } => PanEvent::Moved(screen),
                DrawEvent::Ended { .. } | DrawEvent::Cancelled { .. } => PanEvent::Ended,
            };
            self.handle_pan(pan);
            return Ok(None);
        }
        match event {
            DrawEvent::Began { screen, .. } => {
                if self.live.is_some() {
                    log::debug!("new stroke began before the last ended, dropping the old one");
                }
                self.live = self.begin_stroke(screen);
                Ok(None)
            }
            DrawEvent::Moved { screen, .. } => {
                self.drop_stale_live();
                self.extend_stroke(screen);
                Ok(None)
            }
            DrawEvent::Ended { screen, .. } => {
                self.drop_stale_live();
                self.extend_stroke(screen);
                match self.live.take() {
                    Some(live) => self.commit(live, backend).map(Some),
                    None => Ok(None),
                }
            }
            DrawEvent::Cancelled { .. } => {
                if let Some(live) = self.live.take() {
                    log::debug!("stroke into {:?} cancelled", live.target);
                }
                Ok(None)
            }
        }
    }
    /// Feed a pinch or rotation update to the camera.
    ///
    /// # Errors
    /// If a frame transition failed, see [`GestureController::handle`].
    pub fn handle_gesture(&mut self, update: &GestureUpdate) -> Result<GestureOutcome, FrameError> {
        let outcome =
            self.gestures
                .handle(update, &mut self.graph, &mut self.camera, &self.config.frames);
        self.drop_stale_live();
        outcome
    }
    pub fn handle_pan(&mut self, event: PanEvent) {
        match event {
            PanEvent::Began(screen) => {
                let active = self.camera.active_frame;
                let world = self.camera.screen_to_world(screen);
                let target = self
                    .hit_test(active, world)
                    .filter(|&card| self.card(active, card).is_some_and(Card::is_editing))
                    .map_or(PanTarget::Camera, |card| PanTarget::Card(active, card));
                self.gestures.begin_pan(screen, target);
            }
            PanEvent::Moved(screen) => {
                if let Some(drag) = self.gestures.move_pan(screen, &mut self.camera) {
                    self.drag_card(drag);
                }
            }
            PanEvent::Ended => self.gestures.end_pan(),
        }
    }
    fn drag_card(&mut self, drag: CardDrag) {
        // The delta is in the active frame, which may have changed since the drag began.
        let active = self.camera.active_frame;
        let zero = DVec2::new(0.0, 0.0);
        let mapped = self
            .graph
            .map_adjacent(drag.world_delta, active, drag.frame)
            .zip(self.graph.map_adjacent(zero, active, drag.frame));
        let card = self
            .graph
            .frame_mut(drag.frame)
            .and_then(|frame| frame.card_mut(drag.card));
        match (mapped, card) {
            (Some((delta, base)), Some(card)) => card.set_origin(card.origin() + (delta - base)),
            _ => {
                log::debug!("dragged card {} is out of reach, ending drag", drag.card);
                self.gestures.end_pan();
            }
        }
    }

    // ========== Live stroke ==========
    /// The camera as seen from `frame`, if it is adjacent to the active one.
    fn camera_in(&self, frame: FrameId) -> Option<CameraState> {
        let active = self.camera.active_frame;
        if frame == active {
            Some(self.camera.clone())
        } else if self.graph.frame(active)?.parent() == Some(frame) {
            traverse::parent_camera(&self.camera, &self.graph)
        } else if self.graph.frame(frame)?.parent() == Some(active) {
            traverse::child_camera(&self.camera, &self.graph, frame)
        } else {
            None
        }
    }
    /// Map a screen point into the space of `target`.
    fn capture(&self, target: DrawTarget, screen: DVec2) -> Option<DVec2> {
        let world = self.camera_in(target.frame())?.screen_to_world(screen);
        match target {
            DrawTarget::Canvas(_) => Some(world),
            DrawTarget::Card(frame, card) => Some(self.card(frame, card)?.to_local(world)),
        }
    }
    fn begin_stroke(&self, screen: DVec2) -> Option<LiveStroke> {
        let active = self.camera.active_frame;
        let world = self.camera.screen_to_world(screen);
        let target = match self.hit_test(active, world) {
            Some(card) if self.card(active, card).is_some_and(Card::is_editing) => {
                DrawTarget::Card(active, card)
            }
            _ => DrawTarget::Canvas(active),
        };
        let point = self.capture(target, screen)?;
        Some(LiveStroke {
            target,
            points: vec![point],
            last_screen: screen,
            zoom: self.camera.zoom_scale,
            brush: StrokeBrush::from(&self.config.brush),
        })
    }
    fn extend_stroke(&mut self, screen: DVec2) {
        let Some(live) = self.live.as_ref() else {
            return;
        };
        if (screen - live.last_screen).magnitude() < self.config.brush.min_point_spacing_px {
            return;
        }
        let Some(point) = self.capture(live.target, screen) else {
            return;
        };
        if let Some(live) = self.live.as_mut() {
            live.points.push(point);
            live.last_screen = screen;
        }
    }
    /// A stroke can keep going across one transition, but not two.
    fn drop_stale_live(&mut self) {
        let active = self.camera.active_frame;
        let stale = self
            .live
            .as_ref()
            .is_some_and(|live| !self.graph.is_adjacent(active, live.target.frame()));
        if !stale {
            return;
        }
        if let Some(live) = self.live.take() {
            log::debug!(
                "stroke into {} cancelled, camera moved on to {active}",
                live.target.frame()
            );
        }
    }
    fn commit(
        &mut self,
        live: LiveStroke,
        backend: &mut dyn RenderBackend,
    ) -> Result<StrokeID, CommitError> {
        let mut stroke = Stroke::build(
            &live.points,
            live.brush,
            live.zoom,
            self.config.chunk_vertices(),
        )?;
        let buffer = backend.create_vertex_buffer(stroke.vertices())?;
        stroke.set_buffer(buffer);
        let id = stroke.id();

        let frame = self.graph.frame_mut(live.target.frame());
        let placed = match (live.target, frame) {
            (DrawTarget::Canvas(_), Some(frame)) => {
                self.tiles.mark_dirty(frame, &stroke);
                frame.strokes_mut().push(stroke);
                true
            }
            (DrawTarget::Card(_, card), Some(frame)) => match frame.card_mut(card) {
                Some(card) => {
                    card.strokes_mut().push(stroke);
                    true
                }
                None => false,
            },
            (_, None) => false,
        };
        if placed {
            log::debug!("committed {id} into {:?}", live.target);
            Ok(id)
        } else {
            backend.release_buffer(buffer);
            Err(CommitError::TargetGone(live.target))
        }
    }
    /// Build and upload this tick's copy of the live stroke.
    fn live_geometry(&self, backend: &mut dyn RenderBackend) -> Option<LiveGeometry> {
        let live = self.live.as_ref()?;
        let placement = match live.target {
            DrawTarget::Canvas(_) => None,
            DrawTarget::Card(frame, card) => {
                let card = self.card(frame, card)?;
                Some((card.origin(), card.rotation()))
            }
        };
        let built = Stroke::build(
            &live.points,
            live.brush,
            live.zoom,
            self.config.chunk_vertices(),
        )
        .map_err(CommitError::from)
        .and_then(|mut stroke| {
            let buffer = backend.create_vertex_buffer(stroke.vertices())?;
            stroke.set_buffer(buffer);
            Ok(stroke)
        });
        match built {
            Ok(stroke) => Some(LiveGeometry {
                stroke,
                frame: live.target.frame(),
                placement,
            }),
            Err(err) => {
                log::debug!("live stroke not drawn: {err}");
                None
            }
        }
    }

    // ========== Cards ==========
    /// Place a new card at the center of the view, `size_px` big on screen and upright.
    ///
    /// # Errors
    /// If the active frame is missing.
    pub fn add_card(
        &mut self,
        size_px: DVec2,
        content: CardContent,
    ) -> Result<CardID, CanvasError> {
        let zoom = self.camera.zoom_scale;
        let mut card = Card::new(self.camera.pan_offset, size_px / zoom, zoom, content);
        card.set_rotation(-self.camera.rotation_f64());
        let id = card.id();
        let active = self.camera.active_frame;
        self.graph
            .frame_mut(active)
            .ok_or(CanvasError::FrameNotFound(active))?
            .cards_mut()
            .push(card);
        log::debug!("card {id} ({}) added to {active}", content.as_ref());
        Ok(id)
    }
    /// # Errors
    /// If there's no such card.
    pub fn remove_card(&mut self, frame: FrameId, card: CardID) -> Result<(), CanvasError> {
        let cards = self
            .graph
            .frame_mut(frame)
            .ok_or(CanvasError::FrameNotFound(frame))?
            .cards_mut();
        let index = cards
            .iter()
            .position(|c| c.id() == card)
            .ok_or(CanvasError::CardNotFound(frame, card))?;
        let mut removed = cards.remove(index);
        self.pending_release.extend(removed.take_buffers());
        if self.live_target() == Some(DrawTarget::Card(frame, card)) {
            self.live = None;
        }
        Ok(())
    }
    fn card_mut(&mut self, frame: FrameId, card: CardID) -> Result<&mut Card, CanvasError> {
        self.graph
            .frame_mut(frame)
            .ok_or(CanvasError::FrameNotFound(frame))?
            .card_mut(card)
            .ok_or(CanvasError::CardNotFound(frame, card))
    }
    /// # Errors
    /// If there's no such card.
    pub fn set_card_origin(
        &mut self,
        frame: FrameId,
        card: CardID,
        origin: DVec2,
    ) -> Result<(), CanvasError> {
        self.card_mut(frame, card)?.set_origin(origin);
        Ok(())
    }
    /// # Errors
    /// If there's no such card.
    pub fn set_card_rotation(
        &mut self,
        frame: FrameId,
        card: CardID,
        rotation: f64,
    ) -> Result<(), CanvasError> {
        self.card_mut(frame, card)?.set_rotation(rotation);
        Ok(())
    }
    /// # Errors
    /// If there's no such card.
    pub fn set_card_size(
        &mut self,
        frame: FrameId,
        card: CardID,
        size: DVec2,
    ) -> Result<(), CanvasError> {
        let stale = self.card_mut(frame, card)?.set_size(size);
        self.pending_release.extend(stale);
        Ok(())
    }
    /// # Errors
    /// If there's no such card.
    pub fn set_card_content(
        &mut self,
        frame: FrameId,
        card: CardID,
        content: CardContent,
    ) -> Result<(), CanvasError> {
        let stale = self.card_mut(frame, card)?.set_content(content);
        self.pending_release.extend(stale);
        Ok(())
    }
    /// # Errors
    /// If there's no such card.
    pub fn set_card_creation_zoom(
        &mut self,
        frame: FrameId,
        card: CardID,
        zoom: f64,
    ) -> Result<(), CanvasError> {
        let stale = self.card_mut(frame, card)?.set_creation_zoom(zoom);
        self.pending_release.extend(stale);
        Ok(())
    }
    /// # Errors
    /// If there's no such card.
    pub fn set_card_editing(
        &mut self,
        frame: FrameId,
        card: CardID,
        editing: bool,
    ) -> Result<(), CanvasError> {
        self.card_mut(frame, card)?.set_editing(editing);
        Ok(())
    }

    // ========== Rendering ==========
    /// Draw one frame. See [`pass::render_tick`].
    ///
    /// # Errors
    /// If the backend refused to open or close the screen pass.
    pub fn render_tick(
        &mut self,
        backend: &mut dyn RenderBackend,
    ) -> Result<FrameStats, BackendError> {
        for buffer in self.pending_release.drain(..) {
            backend.release_buffer(buffer);
        }
        self.drop_stale_live();
        let live = if self.config.tiers.contains(RenderTiers::LIVE) {
            self.live_geometry(backend)
        } else {
            None
        };

        let result = pass::render_tick(
            backend,
            &mut self.graph,
            &self.camera,
            &self.config,
            &self.tiles,
            |backend, plan, stats| {
                let Some(live) = live.as_ref() else {
                    return;
                };
                let Some(tier) = plan.tiers.iter().find(|tier| tier.frame == live.frame) else {
                    return;
                };
                let view = match live.placement {
                    Some((origin, rotation)) => LocalView::placed(&tier.camera, origin, rotation),
                    None => LocalView::canvas(&tier.camera),
                };
                pass::draw_stroke(backend, &live.stroke, &view, stats);
            },
        );
        if let Some(buffer) = live.and_then(|mut live| live.stroke.take_buffer()) {
            backend.release_buffer(buffer);
        }

        let stats = result?;
        self.last_stats = stats;
        Ok(stats)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        camera::GesturePhase,
        card::LinedConfig,
        color::Color,
        render::{DrawCall, PassTarget, RecordingBackend},
    };

    fn canvas() -> Canvas {
        Canvas::new(CanvasConfig::default(), DVec2::new(800.0, 600.0))
    }
    fn stylus(
        canvas: &mut Canvas,
        backend: &mut RecordingBackend,
        points: &[(f64, f64)],
    ) -> Option<StrokeID> {
        let tool = ToolType::Stylus;
        let screen = |&(x, y): &(f64, f64)| DVec2::new(x, y);
        let (first, rest) = points.split_first().unwrap();
        canvas
            .handle_draw(DrawEvent::Began { screen: screen(first), tool }, backend)
            .unwrap();
        for point in rest {
            canvas
                .handle_draw(DrawEvent::Moved { screen: screen(point), tool }, backend)
                .unwrap();
        }
        let last = screen(points.last().unwrap());
        canvas
            .handle_draw(DrawEvent::Ended { screen: last, tool }, backend)
            .unwrap()
    }

    #[test]
    fn stylus_commits_onto_active_frame() {
        let mut canvas = canvas();
        let mut backend = RecordingBackend::new();
        let id = stylus(
            &mut canvas,
            &mut backend,
            &[(100.0, 100.0), (150.0, 120.0), (200.0, 100.0)],
        );
        assert!(id.is_some());

        let root = canvas.graph().root();
        let strokes = canvas.strokes(root).unwrap();
        assert_eq!(strokes.len(), 1);
        assert_eq!(Some(strokes[0].id()), id);
        assert!(strokes[0].buffer().is_some());
        // Top-left screen origin, view centered on the world origin.
        assert_eq!(strokes[0].origin(), DVec2::new(-300.0, -200.0));
        assert!(!canvas.frame(root).unwrap().tiles().dirty_keys().is_empty());
        assert_eq!(canvas.live_target(), None);
    }
    #[test]
    fn cancel_discards_everything() {
        let mut canvas = canvas();
        let mut backend = RecordingBackend::new();
        let tool = ToolType::Stylus;
        canvas
            .handle_draw(DrawEvent::Began { screen: DVec2::new(10.0, 10.0), tool }, &mut backend)
            .unwrap();
        canvas
            .handle_draw(DrawEvent::Moved { screen: DVec2::new(90.0, 10.0), tool }, &mut backend)
            .unwrap();
        canvas.render_tick(&mut backend).unwrap();
        canvas
            .handle_draw(DrawEvent::Cancelled { tool }, &mut backend)
            .unwrap();
        assert!(canvas.strokes(canvas.graph().root()).unwrap().is_empty());
        assert_eq!(backend.live_buffers(), 0);
    }
    #[test]
    fn live_stroke_is_drawn_and_released() {
        let mut canvas = canvas();
        let mut backend = RecordingBackend::new();
        let tool = ToolType::Stylus;
        canvas
            .handle_draw(DrawEvent::Began { screen: DVec2::new(10.0, 10.0), tool }, &mut backend)
            .unwrap();
        canvas
            .handle_draw(DrawEvent::Moved { screen: DVec2::new(90.0, 40.0), tool }, &mut backend)
            .unwrap();
        let stats = canvas.render_tick(&mut backend).unwrap();
        assert!(stats.chunks_submitted >= 1);
        assert!(backend
            .draws()
            .any(|(target, call)| target == PassTarget::Screen
                && matches!(call, DrawCall::Strokes { .. })));
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(canvas.last_stats(), &stats);
    }
    #[test]
    fn finger_pans_when_not_drawing() {
        let mut canvas = canvas();
        let mut backend = RecordingBackend::new();
        let tool = ToolType::Finger;
        canvas
            .handle_draw(DrawEvent::Began { screen: DVec2::new(100.0, 100.0), tool }, &mut backend)
            .unwrap();
        canvas
            .handle_draw(DrawEvent::Moved { screen: DVec2::new(150.0, 100.0), tool }, &mut backend)
            .unwrap();
        canvas
            .handle_draw(DrawEvent::Ended { screen: DVec2::new(150.0, 100.0), tool }, &mut backend)
            .unwrap();
        assert_eq!(canvas.camera().pan_offset, DVec2::new(-50.0, 0.0));
        assert!(canvas.strokes(canvas.graph().root()).unwrap().is_empty());
    }
    #[test]
    fn editing_card_takes_strokes_and_drags() {
        let mut canvas = canvas();
        let mut backend = RecordingBackend::new();
        let root = canvas.graph().root();
        let card = canvas
            .add_card(DVec2::new(300.0, 200.0), CardContent::Drawing { background: Color::WHITE })
            .unwrap();
        assert_eq!(canvas.hit_test(root, DVec2::new(0.0, 0.0)), Some(card));
        assert_eq!(canvas.hit_test(root, DVec2::new(200.0, 0.0)), None);

        // Not editing: draws over it onto the canvas.
        stylus(&mut canvas, &mut backend, &[(400.0, 300.0), (420.0, 310.0)]).unwrap();
        assert_eq!(canvas.strokes(root).unwrap().len(), 1);

        canvas.set_card_editing(root, card, true).unwrap();
        stylus(&mut canvas, &mut backend, &[(410.0, 300.0), (430.0, 310.0)]).unwrap();
        let on_card = canvas.card(root, card).unwrap().strokes();
        assert_eq!(on_card.len(), 1);
        assert_eq!(on_card[0].origin(), DVec2::new(10.0, 0.0));
        assert_eq!(canvas.strokes(root).unwrap().len(), 1);

        let camera = canvas.camera().clone();
        canvas.handle_pan(PanEvent::Began(DVec2::new(400.0, 300.0)));
        canvas.handle_pan(PanEvent::Moved(DVec2::new(420.0, 300.0)));
        canvas.handle_pan(PanEvent::Ended);
        assert_eq!(canvas.camera(), &camera);
        assert_eq!(canvas.card(root, card).unwrap().origin(), DVec2::new(20.0, 0.0));
    }
    #[test]
    fn card_setters_and_queries() {
        let mut canvas = canvas();
        let mut backend = RecordingBackend::new();
        let root = canvas.graph().root();
        let card = canvas
            .add_card(
                DVec2::new(100.0, 40.0),
                CardContent::Grid(crate::card::GridConfig::default()),
            )
            .unwrap();
        canvas.set_card_editing(root, card, true).unwrap();
        stylus(&mut canvas, &mut backend, &[(400.0, 300.0), (410.0, 305.0)]).unwrap();
        stylus(&mut canvas, &mut backend, &[(10.0, 10.0), (30.0, 10.0)]).unwrap();
        let targets: Vec<DrawTarget> = canvas
            .graph()
            .strokes_with_targets(root)
            .map(|(target, _)| target)
            .collect();
        assert_eq!(targets, vec![DrawTarget::Canvas(root), DrawTarget::Card(root, card)]);

        canvas.set_card_origin(root, card, DVec2::new(100.0, 0.0)).unwrap();
        canvas
            .set_card_rotation(root, card, std::f64::consts::FRAC_PI_2)
            .unwrap();
        let bounds = canvas.card(root, card).unwrap().frame_bounds();
        // Turned a quarter, the long side runs along y.
        assert!((bounds.max.x - 120.0).abs() < 1e-9);
        assert!((bounds.max.y - 50.0).abs() < 1e-9);
        assert_eq!(canvas.hit_test(root, DVec2::new(100.0, 45.0)), Some(card));

        canvas.render_tick(&mut backend).unwrap();
        assert!(canvas.card(root, card).unwrap().background().is_some());
        let with_pattern = backend.live_buffers();
        canvas.set_card_size(root, card, DVec2::new(50.0, 50.0)).unwrap();
        canvas.set_card_creation_zoom(root, card, 4.0).unwrap();
        assert!((canvas.card(root, card).unwrap().creation_zoom() - 4.0).abs() < 1e-12);
        // The stale pattern goes on the next tick and a fresh one replaces it.
        canvas.render_tick(&mut backend).unwrap();
        assert_eq!(backend.live_buffers(), with_pattern);

        let missing = crate::card::CardID::next();
        assert_eq!(
            canvas.set_card_origin(root, missing, DVec2::new(0.0, 0.0)),
            Err(CanvasError::CardNotFound(root, missing))
        );
        assert!(canvas.tile_cache().should_use_tile_cache(canvas.camera().zoom_scale));
        assert_eq!(canvas.gestures().pan_target(), None);
    }
    #[test]
    fn removed_card_buffers_are_released_next_tick() {
        let mut canvas = canvas();
        let mut backend = RecordingBackend::new();
        let root = canvas.graph().root();
        let card = canvas
            .add_card(DVec2::new(300.0, 200.0), CardContent::Drawing { background: Color::WHITE })
            .unwrap();
        canvas.set_card_editing(root, card, true).unwrap();
        stylus(&mut canvas, &mut backend, &[(400.0, 300.0), (430.0, 310.0)]).unwrap();
        assert_eq!(backend.live_buffers(), 1);

        canvas.remove_card(root, card).unwrap();
        assert_eq!(canvas.remove_card(root, card), Err(CanvasError::CardNotFound(root, card)));
        assert_eq!(backend.live_buffers(), 1);
        canvas.render_tick(&mut backend).unwrap();
        assert_eq!(backend.live_buffers(), 0);
    }
    #[test]
    fn stale_background_is_released() {
        let mut canvas = canvas();
        let mut backend = RecordingBackend::new();
        let root = canvas.graph().root();
        let card = canvas
            .add_card(DVec2::new(300.0, 300.0), CardContent::Lined(LinedConfig::default()))
            .unwrap();
        canvas.render_tick(&mut backend).unwrap();
        assert!(canvas.card(root, card).unwrap().background().is_some());
        assert_eq!(backend.live_buffers(), 1);

        canvas
            .set_card_content(root, card, CardContent::SolidColor(Color::BLACK))
            .unwrap();
        assert!(canvas.card(root, card).unwrap().background().is_none());
        canvas.render_tick(&mut backend).unwrap();
        assert_eq!(backend.live_buffers(), 0);
    }
    #[test]
    fn live_stroke_survives_one_transition_only() {
        let mut canvas = canvas();
        let mut backend = RecordingBackend::new();
        let tool = ToolType::Stylus;
        let center = DVec2::new(400.0, 300.0);
        canvas
            .handle_draw(DrawEvent::Began { screen: center, tool }, &mut backend)
            .unwrap();
        let root = canvas.graph().root();

        let zoom = |canvas: &mut Canvas, phase| {
            canvas
                .handle_gesture(&GestureUpdate::pinch(phase, 2000.0, center, 2))
                .unwrap()
        };
        zoom(&mut canvas, GesturePhase::Began);
        zoom(&mut canvas, GesturePhase::Changed);
        assert_ne!(canvas.camera().active_frame, root);
        assert_eq!(canvas.live_target(), Some(DrawTarget::Canvas(root)));
        // Still drawing into the parent, through its tier.
        canvas
            .handle_draw(DrawEvent::Moved { screen: DVec2::new(420.0, 300.0), tool }, &mut backend)
            .unwrap();
        canvas.render_tick(&mut backend).unwrap();
        assert_eq!(backend.live_buffers(), 0);

        zoom(&mut canvas, GesturePhase::Changed);
        assert_eq!(canvas.live_target(), None);
        let committed = canvas
            .handle_draw(DrawEvent::Ended { screen: center, tool }, &mut backend)
            .unwrap();
        assert_eq!(committed, None);
        assert!(canvas.strokes(root).unwrap().is_empty());
    }
}
