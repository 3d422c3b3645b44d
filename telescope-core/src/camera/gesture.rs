//! # Gestures
//!
//! Pinch and rotation share a single anchor: a world point locked under a screen point when the
//! first of them begins. Every update applies its delta to zoom or rotation and then solves the
//! pan so the anchor sits under the right pixel, so nothing ever drifts no matter how long the
//! gesture runs or how many frames it crosses.
//!
//! Only one gesture *owns* the anchor at a time. The owner drags the anchor along with its
//! centroid; the other gesture just pivots about wherever the anchor is.

use super::CameraState;
use crate::{
    card::CardID,
    config::FrameConfig,
    frame::{self, transition::Transitions, FrameError, FrameGraph, FrameId},
    DVec2,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::AsRefStr)]
pub enum GestureKind {
    Pinch,
    Rotation,
}
impl GestureKind {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Pinch => Self::Rotation,
            Self::Rotation => Self::Pinch,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    /// Treated exactly like `Ended`.
    Cancelled,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct GestureUpdate {
    pub kind: GestureKind,
    pub phase: GesturePhase,
    /// Zoom factor since the previous update. Pinch only.
    pub scale: f64,
    /// Radians since the previous update. Rotation only.
    pub rotation: f64,
    /// Screen-space center of the touches.
    pub centroid: DVec2,
    pub touches: usize,
}
impl GestureUpdate {
    #[must_use]
    pub fn pinch(phase: GesturePhase, scale: f64, centroid: DVec2, touches: usize) -> Self {
        Self {
            kind: GestureKind::Pinch,
            phase,
            scale,
            rotation: 0.0,
            centroid,
            touches,
        }
    }
    #[must_use]
    pub fn rotation(phase: GesturePhase, rotation: f64, centroid: DVec2, touches: usize) -> Self {
        Self {
            kind: GestureKind::Rotation,
            phase,
            scale: 1.0,
            rotation,
            centroid,
            touches,
        }
    }
}

/// Single-finger drag, in screen space.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum PanEvent {
    Began(DVec2),
    Moved(DVec2),
    Ended,
}

/// What a pan moves.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PanTarget {
    Camera,
    Card(FrameId, CardID),
}

/// A card should move by `world_delta`, in its frame's units.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CardDrag {
    pub frame: FrameId,
    pub card: CardID,
    pub world_delta: DVec2,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct GestureAnchor {
    /// Locked point, in the active frame.
    pub world: DVec2,
    pub screen: DVec2,
    pub owner: Option<GestureKind>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum GestureOutcome {
    /// Gesture started, and took the anchor if it was free.
    Began,
    /// Camera updated, crossing these frame transitions on the way.
    Applied(Transitions),
    /// The owner's touch count changed. Anchor moved, camera untouched.
    Relocked,
    /// The owner ended while the other gesture continues, which now owns the anchor.
    HandedOff(GestureKind),
    Ended,
}

#[derive(Copy, Clone, Debug)]
struct Tracked {
    centroid: DVec2,
    touches: usize,
}

#[derive(Copy, Clone, Debug)]
struct PanState {
    last: DVec2,
    target: PanTarget,
}

#[derive(Debug)]
pub struct GestureController {
    anchor: GestureAnchor,
    pinch: Option<Tracked>,
    rotation: Option<Tracked>,
    pan: Option<PanState>,
}
impl Default for GestureController {
    fn default() -> Self {
        Self {
            anchor: GestureAnchor {
                world: DVec2::new(0.0, 0.0),
                screen: DVec2::new(0.0, 0.0),
                owner: None,
            },
            pinch: None,
            rotation: None,
            pan: None,
        }
    }
}
impl GestureController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn anchor(&self) -> &GestureAnchor {
        &self.anchor
    }
    /// Is a pinch or rotation in progress?
    #[must_use]
    pub fn is_gesturing(&self) -> bool {
        self.pinch.is_some() || self.rotation.is_some()
    }
    #[must_use]
    pub fn pan_target(&self) -> Option<PanTarget> {
        self.pan.map(|pan| pan.target)
    }
    fn slot(&mut self, kind: GestureKind) -> &mut Option<Tracked> {
        match kind {
            GestureKind::Pinch => &mut self.pinch,
            GestureKind::Rotation => &mut self.rotation,
        }
    }
    /// Pin whatever is under `screen` right now.
    pub fn lock_anchor(&mut self, screen: DVec2, camera: &CameraState, owner: Option<GestureKind>) {
        self.anchor = GestureAnchor {
            world: camera.screen_to_world(screen),
            screen,
            owner,
        };
    }
    /// Feed one gesture update through, mutating the camera and possibly the frame graph.
    ///
    /// # Errors
    /// If a frame transition failed. The camera is left valid but may not be in band.
    pub fn handle(
        &mut self,
        update: &GestureUpdate,
        graph: &mut FrameGraph,
        camera: &mut CameraState,
        config: &FrameConfig,
    ) -> Result<GestureOutcome, FrameError> {
        let kind = update.kind;
        let tracked = Tracked {
            centroid: update.centroid,
            touches: update.touches,
        };
        match update.phase {
            GesturePhase::Began => {
                *self.slot(kind) = Some(tracked);
                if self.anchor.owner.is_none() {
                    self.lock_anchor(update.centroid, camera, Some(kind));
                }
                Ok(GestureOutcome::Began)
            }
            GesturePhase::Changed => {
                let previous = self.slot(kind).replace(tracked);
                let owns = self.anchor.owner == Some(kind);
                match previous {
                    // Never saw it begin. Adopt it and carry on.
                    None if self.anchor.owner.is_none() => {
                        self.lock_anchor(update.centroid, camera, Some(kind));
                    }
                    Some(previous) if owns && previous.touches != update.touches => {
                        log::debug!(
                            "{} touches {} -> {}, re-locking anchor",
                            kind.as_ref(),
                            previous.touches,
                            update.touches
                        );
                        self.lock_anchor(update.centroid, camera, Some(kind));
                        return Ok(GestureOutcome::Relocked);
                    }
                    _ => (),
                }
                self.apply(update, graph, camera, config)
                    .map(GestureOutcome::Applied)
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                *self.slot(kind) = None;
                if self.anchor.owner != Some(kind) {
                    return Ok(GestureOutcome::Ended);
                }
                let other = kind.other();
                if let Some(remaining) = *self.slot(other) {
                    self.lock_anchor(remaining.centroid, camera, Some(other));
                    log::debug!("anchor handed off to {}", other.as_ref());
                    Ok(GestureOutcome::HandedOff(other))
                } else {
                    self.anchor.owner = None;
                    Ok(GestureOutcome::Ended)
                }
            }
        }
    }
    fn apply(
        &mut self,
        update: &GestureUpdate,
        graph: &mut FrameGraph,
        camera: &mut CameraState,
        config: &FrameConfig,
    ) -> Result<Transitions, FrameError> {
        match update.kind {
            GestureKind::Pinch => {
                if update.scale.is_finite() && update.scale > 0.0 {
                    camera.zoom_scale *= update.scale;
                }
            }
            GestureKind::Rotation => {
                if update.rotation.is_finite() {
                    #[allow(clippy::cast_possible_truncation)]
                    let radians = update.rotation as f32;
                    camera.rotation += radians;
                }
            }
        }
        // The owner carries the anchor with it, anyone else pivots in place.
        let desired = if self.anchor.owner == Some(update.kind) {
            update.centroid
        } else {
            self.anchor.screen
        };
        camera.solve_pan(self.anchor.world, desired);
        self.anchor.screen = desired;

        let transitions = frame::apply_transitions(graph, camera, desired, config)?;
        if !transitions.is_empty() {
            // Same pixel, new frame's coordinates.
            self.anchor.world = camera.screen_to_world(desired);
        }
        Ok(transitions)
    }
    pub fn begin_pan(&mut self, screen: DVec2, target: PanTarget) {
        self.pan = Some(PanState {
            last: screen,
            target,
        });
    }
    /// Move an in-progress pan to `screen`. Camera pans are applied here. Card drags are returned
    /// for the owner of the card to apply.
    pub fn move_pan(&mut self, screen: DVec2, camera: &mut CameraState) -> Option<CardDrag> {
        let pan = self.pan.as_mut()?;
        let delta = screen - pan.last;
        pan.last = screen;
        match pan.target {
            PanTarget::Camera => {
                camera.pan_by(delta);
                None
            }
            PanTarget::Card(frame, card) => Some(CardDrag {
                frame,
                card,
                world_delta: camera.screen_delta_to_world(delta),
            }),
        }
    }
    pub fn end_pan(&mut self) {
        self.pan = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use GesturePhase::{Began, Changed, Ended};

    fn setup() -> (GestureController, FrameGraph, CameraState, FrameConfig) {
        let graph = FrameGraph::new(512.0);
        let mut camera = CameraState::new(graph.root(), DVec2::new(800.0, 600.0));
        camera.pan_offset = DVec2::new(17.0, -4.0);
        camera.rotation = 0.3;
        (GestureController::new(), graph, camera, FrameConfig::default())
    }
    fn close(a: DVec2, b: DVec2) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn pinch_keeps_anchor_under_centroid() {
        let (mut gestures, mut graph, mut camera, config) = setup();
        let start = DVec2::new(300.0, 200.0);
        let world = camera.screen_to_world(start);
        gestures
            .handle(&GestureUpdate::pinch(Began, 1.0, start, 2), &mut graph, &mut camera, &config)
            .unwrap();

        let mut centroid = start;
        for step in 0..20 {
            centroid += DVec2::new(3.0, -1.5);
            let scale = if step % 3 == 0 { 0.9 } else { 1.2 };
            gestures
                .handle(
                    &GestureUpdate::pinch(Changed, scale, centroid, 2),
                    &mut graph,
                    &mut camera,
                    &config,
                )
                .unwrap();
            // The grabbed point follows the fingers.
            assert!(close(camera.screen_to_world(centroid), world));
        }
    }
    #[test]
    fn rotation_pivots_about_pinch_anchor() {
        let (mut gestures, mut graph, mut camera, config) = setup();
        let pinch_at = DVec2::new(500.0, 350.0);
        let world = camera.screen_to_world(pinch_at);
        gestures
            .handle(
                &GestureUpdate::pinch(Began, 1.0, pinch_at, 2),
                &mut graph,
                &mut camera,
                &config,
            )
            .unwrap();
        let rotate_at = DVec2::new(510.0, 340.0);
        gestures
            .handle(
                &GestureUpdate::rotation(Began, 0.0, rotate_at, 2),
                &mut graph,
                &mut camera,
                &config,
            )
            .unwrap();
        assert_eq!(gestures.anchor().owner, Some(GestureKind::Pinch));

        gestures
            .handle(
                &GestureUpdate::rotation(Changed, 0.2, rotate_at, 2),
                &mut graph,
                &mut camera,
                &config,
            )
            .unwrap();
        assert!(close(camera.screen_to_world(pinch_at), world));
    }
    #[test]
    fn touch_count_change_relocks() {
        let (mut gestures, mut graph, mut camera, config) = setup();
        let start = DVec2::new(300.0, 200.0);
        gestures
            .handle(&GestureUpdate::pinch(Began, 1.0, start, 2), &mut graph, &mut camera, &config)
            .unwrap();
        let before = camera.clone();

        // A third finger lands, the centroid jumps.
        let jumped = DVec2::new(420.0, 260.0);
        let outcome = gestures
            .handle(
                &GestureUpdate::pinch(Changed, 1.3, jumped, 3),
                &mut graph,
                &mut camera,
                &config,
            )
            .unwrap();
        assert_eq!(outcome, GestureOutcome::Relocked);
        assert_eq!(camera, before);
        assert_eq!(gestures.anchor().screen, jumped);
        assert!(close(gestures.anchor().world, camera.screen_to_world(jumped)));
    }
    #[test]
    fn owner_hands_off() {
        let (mut gestures, mut graph, mut camera, config) = setup();
        gestures
            .handle(
                &GestureUpdate::pinch(Began, 1.0, DVec2::new(100.0, 100.0), 2),
                &mut graph,
                &mut camera,
                &config,
            )
            .unwrap();
        let rotate_at = DVec2::new(150.0, 120.0);
        gestures
            .handle(
                &GestureUpdate::rotation(Changed, 0.1, rotate_at, 2),
                &mut graph,
                &mut camera,
                &config,
            )
            .unwrap();
        let before = camera.clone();

        let outcome = gestures
            .handle(
                &GestureUpdate::pinch(Ended, 1.0, DVec2::new(100.0, 100.0), 0),
                &mut graph,
                &mut camera,
                &config,
            )
            .unwrap();
        assert_eq!(outcome, GestureOutcome::HandedOff(GestureKind::Rotation));
        assert_eq!(camera, before);
        assert_eq!(gestures.anchor().screen, rotate_at);

        gestures
            .handle(
                &GestureUpdate::rotation(GesturePhase::Cancelled, 0.0, rotate_at, 0),
                &mut graph,
                &mut camera,
                &config,
            )
            .unwrap();
        assert_eq!(gestures.anchor().owner, None);
        assert!(!gestures.is_gesturing());
    }
    #[test]
    fn anchor_survives_drill_mid_gesture() {
        let (mut gestures, mut graph, mut camera, config) = setup();
        let at = DVec2::new(250.0, 420.0);
        gestures
            .handle(&GestureUpdate::pinch(Began, 1.0, at, 2), &mut graph, &mut camera, &config)
            .unwrap();
        let mut drilled = 0;
        for _ in 0..40 {
            let outcome = gestures
                .handle(
                    &GestureUpdate::pinch(Changed, 1.6, at, 2),
                    &mut graph,
                    &mut camera,
                    &config,
                )
                .unwrap();
            if let GestureOutcome::Applied(transitions) = outcome {
                drilled += transitions.len();
            }
            assert!(close(camera.screen_to_world(at), gestures.anchor().world));
            assert!(camera.zoom_scale <= config.drill_down_zoom);
        }
        assert!(drilled >= 2);
        assert_ne!(camera.active_frame, graph.root());
    }
    #[test]
    fn pan_moves_camera_or_card() {
        let (mut gestures, _graph, mut camera, _config) = setup();
        gestures.begin_pan(DVec2::new(10.0, 10.0), PanTarget::Camera);
        let grabbed = camera.screen_to_world(DVec2::new(10.0, 10.0));
        assert_eq!(gestures.move_pan(DVec2::new(40.0, 25.0), &mut camera), None);
        assert!((camera.screen_to_world(DVec2::new(40.0, 25.0)) - grabbed).x.abs() < 1e-9);
        gestures.end_pan();
        assert_eq!(gestures.move_pan(DVec2::new(0.0, 0.0), &mut camera), None);

        let card = CardID::next();
        gestures.begin_pan(DVec2::new(0.0, 0.0), PanTarget::Card(FrameId::ROOT, card));
        let before = camera.clone();
        let drag = gestures.move_pan(DVec2::new(5.0, 0.0), &mut camera).unwrap();
        assert_eq!(camera, before);
        assert_eq!(drag.card, card);
        assert!(close(drag.world_delta, camera.screen_delta_to_world(DVec2::new(5.0, 0.0))));
    }
}
