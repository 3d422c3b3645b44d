//! Moving the camera between frames as the zoom leaves the comfortable band.
//!
//! Every transition keeps one anchor point pinned: the world point under `anchor_screen` before
//! the hop is exactly the point under `anchor_screen` after it, just expressed in the new frame.

use super::{FrameError, FrameGraph, FrameId};
use crate::{camera::CameraState, config::FrameConfig, DVec2};

/// Upper bound on hops in one [`apply_transitions`] call. Each hop moves the zoom by orders of
/// magnitude, so this is never reached by real input.
const MAX_TRANSITIONS: usize = 16;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Transition {
    DrillDown {
        from: FrameId,
        to: FrameId,
        /// False if an existing child was re-entered.
        created: bool,
    },
    PopUp {
        from: FrameId,
        to: FrameId,
    },
}
impl Transition {
    #[must_use]
    pub fn to(&self) -> FrameId {
        match self {
            Self::DrillDown { to, .. } | Self::PopUp { to, .. } => *to,
        }
    }
}

pub type Transitions = smallvec::SmallVec<[Transition; 2]>;

/// Move the camera into a child of the active frame.
///
/// A nearby existing child is re-entered if doing so would leave the zoom inside the band,
/// otherwise a new child is created centered on the anchor with a scale equal to the current
/// zoom. Either way, the anchor stays under `anchor_screen`.
///
/// # Errors
/// If the active frame doesn't exist, or the current zoom can't be used as a scale.
pub fn drill_down(
    graph: &mut FrameGraph,
    camera: &mut CameraState,
    anchor_world: DVec2,
    anchor_screen: DVec2,
    config: &FrameConfig,
) -> Result<Transition, FrameError> {
    use cgmath::MetricSpace;
    let from = camera.active_frame;
    let zoom = camera.zoom_scale;
    let active = graph.frame(from).ok_or(FrameError::NotFound(from))?;

    let reentry = active
        .children()
        .iter()
        .filter_map(|&id| {
            let child = graph.frame(id)?;
            let distance = child.origin_in_parent().distance(anchor_world);
            let new_zoom = zoom / child.scale_relative_to_parent();
            let in_band = new_zoom > config.pop_up_zoom && new_zoom < config.drill_down_zoom;
            (distance <= config.reentry_radius && in_band).then_some((id, distance))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(id, _)| id);

    let (to, created) = match reentry {
        Some(id) => (id, false),
        None => (graph.create_child(from, anchor_world, zoom)?, true),
    };
    let child = graph.frame(to).ok_or(FrameError::NotFound(to))?;
    let anchor_local = child.from_parent(anchor_world);

    camera.zoom_scale = zoom / child.scale_relative_to_parent();
    camera.active_frame = to;
    camera.solve_pan(anchor_local, anchor_screen);

    log::debug!(
        "drill down {from} -> {to} ({}), zoom {zoom} -> {}",
        if created { "new" } else { "re-entered" },
        camera.zoom_scale
    );
    Ok(Transition::DrillDown { from, to, created })
}

/// Move the camera into the active frame's parent. `None` at the root, with the camera untouched.
pub fn pop_up(
    graph: &FrameGraph,
    camera: &mut CameraState,
    anchor_world: DVec2,
    anchor_screen: DVec2,
) -> Option<Transition> {
    let from = camera.active_frame;
    let frame = graph.frame(from)?;
    let to = frame.parent()?;

    let parent_anchor = frame.to_parent(anchor_world);
    let zoom = camera.zoom_scale;
    camera.zoom_scale = zoom * frame.scale_relative_to_parent();
    camera.active_frame = to;
    camera.solve_pan(parent_anchor, anchor_screen);

    log::debug!("pop up {from} -> {to}, zoom {zoom} -> {}", camera.zoom_scale);
    Some(Transition::PopUp { from, to })
}

/// Drill and pop until the zoom is back inside the band, or nothing more can be done.
///
/// At the root there is nowhere to pop to, so the zoom is clamped to
/// [`FrameConfig::min_root_zoom`] instead, still about the anchor.
///
/// # Errors
/// If a drill fails. Transitions already taken stay taken.
pub fn apply_transitions(
    graph: &mut FrameGraph,
    camera: &mut CameraState,
    anchor_screen: DVec2,
    config: &FrameConfig,
) -> Result<Transitions, FrameError> {
    let mut taken = Transitions::new();
    while taken.len() < MAX_TRANSITIONS {
        let anchor_world = camera.screen_to_world(anchor_screen);
        let transition = if camera.zoom_scale >= config.drill_down_zoom {
            Some(drill_down(graph, camera, anchor_world, anchor_screen, config)?)
        } else if camera.zoom_scale < config.pop_up_zoom {
            pop_up(graph, camera, anchor_world, anchor_screen)
        } else {
            None
        };
        match transition {
            Some(transition) => taken.push(transition),
            None => break,
        }
    }
    if taken.len() == MAX_TRANSITIONS {
        log::warn!("gave up on frame transitions at zoom {}", camera.zoom_scale);
    }

    let at_root = graph
        .frame(camera.active_frame)
        .is_some_and(|frame| frame.parent().is_none());
    if at_root && camera.zoom_scale < config.min_root_zoom {
        let anchor_world = camera.screen_to_world(anchor_screen);
        camera.zoom_scale = config.min_root_zoom;
        camera.solve_pan(anchor_world, anchor_screen);
    }
    Ok(taken)
}
