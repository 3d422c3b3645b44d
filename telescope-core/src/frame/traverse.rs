//! Which frames a tick draws, and through which camera.
//!
//! Only three tiers are ever visited: the active frame's parent, the active frame, and the
//! active frame's immediate children. Anything further out is either too small to see or too
//! magnified to represent.

use super::{FrameGraph, FrameId};
use crate::{camera::CameraState, config::{FrameConfig, RenderTiers}};

#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::AsRefStr)]
pub enum TierKind {
    Parent,
    Active,
    Child,
}

/// A frame to draw, with the camera re-expressed in that frame's units.
#[derive(Clone, Debug)]
pub struct Tier {
    pub frame: FrameId,
    pub kind: TierKind,
    pub camera: CameraState,
}

#[derive(Clone, Debug, Default)]
pub struct TierPlan {
    /// Back to front.
    pub tiers: smallvec::SmallVec<[Tier; 4]>,
    /// Tiers skipped for being too magnified to draw.
    pub culled: usize,
}

/// The camera as seen from the active frame's parent.
#[must_use]
pub fn parent_camera(camera: &CameraState, graph: &FrameGraph) -> Option<CameraState> {
    let frame = graph.frame(camera.active_frame)?;
    let parent = frame.parent()?;
    Some(CameraState {
        pan_offset: frame.to_parent(camera.pan_offset),
        zoom_scale: camera.zoom_scale * frame.scale_relative_to_parent(),
        active_frame: parent,
        ..camera.clone()
    })
}

/// The camera as seen from a child of the active frame.
#[must_use]
pub fn child_camera(
    camera: &CameraState,
    graph: &FrameGraph,
    child: FrameId,
) -> Option<CameraState> {
    let frame = graph.frame(child)?;
    Some(CameraState {
        pan_offset: frame.from_parent(camera.pan_offset),
        zoom_scale: camera.zoom_scale / frame.scale_relative_to_parent(),
        active_frame: child,
        ..camera.clone()
    })
}

/// Build the list of tiers to draw this tick, back to front.
#[must_use]
pub fn plan_tiers(
    graph: &FrameGraph,
    camera: &CameraState,
    config: &FrameConfig,
    enabled: RenderTiers,
) -> TierPlan {
    let mut plan = TierPlan::default();
    let mut push = |kind: TierKind, camera: CameraState| {
        let zoom = camera.zoom_scale;
        if !zoom.is_finite() || zoom > config.max_magnification || zoom <= 0.0 {
            log::trace!("{} tier {} culled at zoom {zoom}", kind.as_ref(), camera.active_frame);
            plan.culled += 1;
        } else {
            plan.tiers.push(Tier {
                frame: camera.active_frame,
                kind,
                camera,
            });
        }
    };

    if enabled.contains(RenderTiers::PARENT) {
        if let Some(parent) = parent_camera(camera, graph) {
            push(TierKind::Parent, parent);
        }
    }
    if enabled.contains(RenderTiers::ACTIVE) {
        push(TierKind::Active, camera.clone());
    }
    if enabled.contains(RenderTiers::CHILDREN) {
        if let Some(active) = graph.frame(camera.active_frame) {
            for &child in active.children() {
                if let Some(child) = child_camera(camera, graph, child) {
                    push(TierKind::Child, child);
                }
            }
        }
    }
    plan
}
