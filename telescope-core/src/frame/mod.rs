//! # Frame graph
//!
//! An infinite canvas can't be stored in one coordinate space - an `f64` runs out of precision
//! long before the user runs out of patience. Instead, content lives in a tree of bounded
//! *frames*. Each child frame is a patch of its parent, magnified by `scale` around
//! `origin_in_parent`:
//!
//! `child = (parent - origin_in_parent) * scale`
//!
//! The camera only ever lives in one frame at a time (the *active* frame), and hops between
//! parent and child as the zoom crosses thresholds, see [`transition`]. Frames are never
//! destroyed, so a [`FrameId`] is valid for the lifetime of the graph.

pub mod transition;
pub mod traverse;

pub use transition::{apply_transitions, drill_down, pop_up, Transition};
pub use traverse::{plan_tiers, Tier, TierKind, TierPlan};

use crate::{
    card::{Card, CardID},
    stroke::Stroke,
    tile::TileGrid,
    DVec2,
};

/// Index of a frame in its [`FrameGraph`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct FrameId(usize);
impl FrameId {
    pub const ROOT: Self = Self(0);
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}
impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame#{}", self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("frame scale {0} must be finite and positive")]
    InvalidScale(f64),
    #[error("frame origin must be finite")]
    InvalidOrigin,
    #[error("{0} not found")]
    NotFound(FrameId),
}

/// Where new strokes go: straight onto a frame, or into a card that lives in one.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DrawTarget {
    Canvas(FrameId),
    Card(FrameId, CardID),
}
impl DrawTarget {
    #[must_use]
    pub fn frame(&self) -> FrameId {
        match self {
            Self::Canvas(frame) | Self::Card(frame, _) => *frame,
        }
    }
}

pub struct Frame {
    parent: Option<FrameId>,
    children: Vec<FrameId>,
    origin_in_parent: DVec2,
    scale: f64,
    depth: u32,
    strokes: Vec<Stroke>,
    cards: Vec<Card>,
    tiles: TileGrid,
}
impl Frame {
    fn new(
        parent: Option<FrameId>,
        origin_in_parent: DVec2,
        scale: f64,
        depth: u32,
        tile_world_size: f64,
    ) -> Self {
        Self {
            parent,
            children: Vec::new(),
            origin_in_parent,
            scale,
            depth,
            strokes: Vec::new(),
            cards: Vec::new(),
            tiles: TileGrid::new(tile_world_size),
        }
    }
    #[must_use]
    pub fn parent(&self) -> Option<FrameId> {
        self.parent
    }
    #[must_use]
    pub fn children(&self) -> &[FrameId] {
        &self.children
    }
    /// Where this frame's origin sits in the parent. Zero for the root.
    #[must_use]
    pub fn origin_in_parent(&self) -> DVec2 {
        self.origin_in_parent
    }
    /// One parent unit is this many local units. One for the root.
    #[must_use]
    pub fn scale_relative_to_parent(&self) -> f64 {
        self.scale
    }
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
    #[must_use]
    pub fn card(&self, id: CardID) -> Option<&Card> {
        self.cards.iter().find(|card| card.id() == id)
    }
    #[must_use]
    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }
    /// Map a point of this frame into its parent.
    #[must_use]
    pub fn to_parent(&self, local: DVec2) -> DVec2 {
        self.origin_in_parent + local / self.scale
    }
    /// Map a point of the parent into this frame.
    #[must_use]
    pub fn from_parent(&self, parent: DVec2) -> DVec2 {
        (parent - self.origin_in_parent) * self.scale
    }
    pub(crate) fn strokes_mut(&mut self) -> &mut Vec<Stroke> {
        &mut self.strokes
    }
    pub(crate) fn cards_mut(&mut self) -> &mut Vec<Card> {
        &mut self.cards
    }
    pub(crate) fn card_mut(&mut self, id: CardID) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.id() == id)
    }
    /// Strokes and tiles at once, for baking.
    pub(crate) fn strokes_and_tiles_mut(&mut self) -> (&[Stroke], &mut TileGrid) {
        (&self.strokes, &mut self.tiles)
    }
    pub(crate) fn tiles_mut(&mut self) -> &mut TileGrid {
        &mut self.tiles
    }
}
impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("origin_in_parent", &self.origin_in_parent)
            .field("scale", &self.scale)
            .field("strokes", &self.strokes.len())
            .field("cards", &self.cards.len())
            .finish_non_exhaustive()
    }
}

/// Arena of every frame ever entered. The root is always at index zero.
#[derive(Debug)]
pub struct FrameGraph {
    frames: Vec<Frame>,
    tile_world_size: f64,
}
impl FrameGraph {
    #[must_use]
    pub fn new(tile_world_size: f64) -> Self {
        Self {
            frames: vec![Frame::new(
                None,
                DVec2::new(0.0, 0.0),
                1.0,
                0,
                tile_world_size,
            )],
            tile_world_size,
        }
    }
    #[must_use]
    pub fn root(&self) -> FrameId {
        FrameId::ROOT
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    /// Never true, the root always exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
    #[must_use]
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.0)
    }
    pub(crate) fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id.0)
    }
    /// Every frame reachable from the root, depth first, children in creation order.
    pub fn frames(&self) -> impl Iterator<Item = (FrameId, &Frame)> + '_ {
        let mut stack = vec![FrameId::ROOT];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let frame = &self.frames[id.0];
            stack.extend(frame.children.iter().rev().copied());
            Some((id, frame))
        })
    }
    /// Create a child of `parent`, centered on `origin` (parent units) and magnified by `scale`.
    ///
    /// # Errors
    /// If the parent doesn't exist, the scale isn't a finite positive number, or the origin isn't
    /// finite.
    pub fn create_child(
        &mut self,
        parent: FrameId,
        origin: DVec2,
        scale: f64,
    ) -> Result<FrameId, FrameError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(FrameError::InvalidScale(scale));
        }
        if !(origin.x.is_finite() && origin.y.is_finite()) {
            return Err(FrameError::InvalidOrigin);
        }
        let depth = self.frame(parent).ok_or(FrameError::NotFound(parent))?.depth + 1;
        let id = FrameId(self.frames.len());
        self.frames.push(Frame::new(
            Some(parent),
            origin,
            scale,
            depth,
            self.tile_world_size,
        ));
        self.frames[parent.0].children.push(id);
        Ok(id)
    }
    /// Total magnification of `id` relative to the root: the product of every scale along the
    /// way. Can overflow to infinity for absurdly deep frames.
    #[must_use]
    pub fn effective_zoom(&self, id: FrameId) -> Option<f64> {
        let mut frame = self.frame(id)?;
        let mut zoom = 1.0;
        loop {
            zoom *= frame.scale;
            match frame.parent {
                Some(parent) => frame = &self.frames[parent.0],
                None => return Some(zoom),
            }
        }
    }
    /// Is `other` the same frame as `id`, its parent, or one of its children?
    #[must_use]
    pub fn is_adjacent(&self, id: FrameId, other: FrameId) -> bool {
        if id == other {
            return true;
        }
        let (Some(a), Some(b)) = (self.frame(id), self.frame(other)) else {
            return false;
        };
        a.parent == Some(other) || b.parent == Some(id)
    }
    /// Map a point from `from` into an adjacent frame `to`.
    #[must_use]
    pub fn map_adjacent(&self, point: DVec2, from: FrameId, to: FrameId) -> Option<DVec2> {
        if from == to {
            return Some(point);
        }
        let from_frame = self.frame(from)?;
        let to_frame = self.frame(to)?;
        if from_frame.parent == Some(to) {
            Some(from_frame.to_parent(point))
        } else if to_frame.parent == Some(from) {
            Some(to_frame.from_parent(point))
        } else {
            None
        }
    }
    /// Every stroke of a frame, on the canvas and in its cards, along with their target.
    pub fn strokes_with_targets(
        &self,
        id: FrameId,
    ) -> impl Iterator<Item = (DrawTarget, &Stroke)> + '_ {
        self.frame(id).into_iter().flat_map(move |frame| {
            let canvas = frame
                .strokes
                .iter()
                .map(move |stroke| (DrawTarget::Canvas(id), stroke));
            let cards = frame.cards.iter().flat_map(move |card| {
                card.strokes()
                    .iter()
                    .map(move |stroke| (DrawTarget::Card(id, card.id()), stroke))
            });
            canvas.chain(cards)
        })
    }
}
