//! # Camera
//!
//! The camera maps logical screen pixels (origin at the top left) to the active frame's local
//! space. Rotation and zoom pivot about the center of the viewport:
//!
//! `world = pan + R(-rotation) * (screen - viewport / 2) / zoom`
//!
//! There is no accumulated matrix anywhere. Every update re-solves `pan` from the gesture anchor
//! directly, so no error builds up over a long gesture.

pub mod gesture;

pub use gesture::{
    CardDrag, GestureAnchor, GestureController, GestureKind, GestureOutcome, GesturePhase,
    GestureUpdate, PanEvent, PanTarget,
};

use crate::{cull::CullView, frame::FrameId, util, DVec2};

#[derive(Clone, Debug, PartialEq)]
pub struct CameraState {
    /// The point of the active frame at the center of the viewport.
    /// Not the top-left pixel: zoom and rotation pivot about the center.
    pub pan_offset: DVec2,
    /// Screen pixels per active frame unit.
    pub zoom_scale: f64,
    /// Radians. Positive turns the content counter-clockwise in a y-up sense.
    pub rotation: f32,
    pub active_frame: FrameId,
    /// Size of the view in logical pixels.
    pub viewport: DVec2,
}
impl CameraState {
    /// Camera looking at the origin of `frame` at unit zoom.
    #[must_use]
    pub fn new(frame: FrameId, viewport: DVec2) -> Self {
        Self {
            pan_offset: DVec2::new(0.0, 0.0),
            zoom_scale: 1.0,
            rotation: 0.0,
            active_frame: frame,
            viewport,
        }
    }
    #[must_use]
    pub fn rotation_f64(&self) -> f64 {
        f64::from(self.rotation)
    }
    /// Middle of the viewport, in screen space.
    #[must_use]
    pub fn screen_center(&self) -> DVec2 {
        self.viewport / 2.0
    }
    /// The frame-local vector from the pan point to whatever lies under `screen`.
    fn screen_to_relative(&self, screen: DVec2) -> DVec2 {
        util::rotate(screen - self.screen_center(), -self.rotation_f64()) / self.zoom_scale
    }
    #[must_use]
    pub fn screen_to_world(&self, screen: DVec2) -> DVec2 {
        self.pan_offset + self.screen_to_relative(screen)
    }
    #[must_use]
    pub fn world_to_screen(&self, world: DVec2) -> DVec2 {
        util::rotate(world - self.pan_offset, self.rotation_f64()) * self.zoom_scale
            + self.screen_center()
    }
    /// Screen-space motion to frame-local motion. Rotation and zoom only, no pan.
    #[must_use]
    pub fn screen_delta_to_world(&self, delta: DVec2) -> DVec2 {
        util::rotate(delta, -self.rotation_f64()) / self.zoom_scale
    }
    /// Solve the pan so that `anchor_world` sits exactly under `desired_screen`, given the
    /// current zoom and rotation.
    pub fn solve_pan(&mut self, anchor_world: DVec2, desired_screen: DVec2) {
        self.pan_offset = anchor_world - self.screen_to_relative(desired_screen);
    }
    /// Move the content by a screen-space amount.
    pub fn pan_by(&mut self, screen_delta: DVec2) {
        self.pan_offset -= self.screen_delta_to_world(screen_delta);
    }
    /// Multiply the zoom, keeping whatever is under `pivot` in place.
    /// Non-finite or non-positive factors are ignored.
    pub fn scale_about(&mut self, pivot: DVec2, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let anchor = self.screen_to_world(pivot);
        self.zoom_scale *= factor;
        self.solve_pan(anchor, pivot);
    }
    /// Rotate, keeping whatever is under `pivot` in place.
    pub fn rotate_about(&mut self, pivot: DVec2, radians: f32) {
        if !radians.is_finite() {
            return;
        }
        let anchor = self.screen_to_world(pivot);
        self.rotation += radians;
        self.solve_pan(anchor, pivot);
    }
    /// The frame-local region under the viewport, as an axis aligned rect.
    #[must_use]
    pub fn visible_world_rect(&self) -> util::Rect {
        let corners = [
            DVec2::new(0.0, 0.0),
            DVec2::new(self.viewport.x, 0.0),
            DVec2::new(0.0, self.viewport.y),
            self.viewport,
        ];
        util::Rect::from_points(corners.into_iter().map(|corner| self.screen_to_world(corner)))
    }
    #[must_use]
    pub fn cull_view(&self) -> CullView {
        CullView {
            viewport: self.viewport,
            rotation: self.rotation_f64(),
            zoom: self.zoom_scale,
        }
    }
}

#[cfg(test)]
mod test {
    use super::CameraState;
    use crate::{frame::FrameId, DVec2};

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).x.abs() < 1e-9 && (a - b).y.abs() < 1e-9
    }
    fn camera() -> CameraState {
        CameraState::new(FrameId::ROOT, DVec2::new(800.0, 600.0))
    }

    #[test]
    fn center_maps_to_pan() {
        let mut camera = camera();
        camera.pan_offset = DVec2::new(12.0, -3.0);
        camera.zoom_scale = 7.0;
        camera.rotation = 1.2;
        assert!(close(camera.screen_to_world(DVec2::new(400.0, 300.0)), camera.pan_offset));
    }
    #[test]
    fn world_screen_round_trip() {
        let mut camera = camera();
        camera.pan_offset = DVec2::new(-250.0, 80.5);
        camera.zoom_scale = 3.5;
        camera.rotation = -0.7;
        for screen in [DVec2::new(0.0, 0.0), DVec2::new(123.0, 456.0), DVec2::new(800.0, 1.0)] {
            let back = camera.world_to_screen(camera.screen_to_world(screen));
            assert!(close(back, screen), "{back:?} != {screen:?}");
        }
    }
    #[test]
    fn scale_and_rotate_keep_pivot() {
        let mut camera = camera();
        let pivot = DVec2::new(600.0, 120.0);
        let before = camera.screen_to_world(pivot);
        camera.scale_about(pivot, 2.5);
        camera.rotate_about(pivot, 0.3);
        camera.scale_about(pivot, 0.1);
        assert!(close(camera.screen_to_world(pivot), before));
        // Garbage is ignored.
        camera.scale_about(pivot, f64::NAN);
        camera.scale_about(pivot, -1.0);
        assert!((camera.zoom_scale - 0.25).abs() < 1e-12);
    }
    #[test]
    fn pan_follows_finger() {
        let mut camera = camera();
        camera.zoom_scale = 2.0;
        camera.rotation = std::f32::consts::FRAC_PI_2;
        let grabbed = camera.screen_to_world(DVec2::new(100.0, 100.0));
        camera.pan_by(DVec2::new(30.0, -20.0));
        assert!((camera.screen_to_world(DVec2::new(130.0, 80.0)) - grabbed).x.abs() < 1e-5);
        assert!((camera.screen_to_world(DVec2::new(130.0, 80.0)) - grabbed).y.abs() < 1e-5);
    }
}
