//! # Chunk culling
//!
//! Visibility is decided in *camera-relative screen space*: the frame's coordinates minus the
//! camera pan, times zoom, but not yet rotated. In that space a chunk is an axis aligned box and
//! the viewport is a rectangle centered on the origin and rotated by the inverse camera
//! rotation, so an exact separating-axis test needs only four axes.

use crate::{stroke::StrokeChunk, util::Rect, DVec2};

/// The viewport, as seen by the culler.
#[derive(Copy, Clone, Debug)]
pub struct CullView {
    /// Logical pixel size of the viewport.
    pub viewport: DVec2,
    /// Camera rotation, radians.
    pub rotation: f64,
    pub zoom: f64,
}
impl CullView {
    /// Is a box, already in camera-relative screen space, at least partially on screen?
    ///
    /// Touching counts as visible. Anything non-finite is not.
    #[must_use]
    pub fn box_visible(&self, center: DVec2, half_extent: DVec2) -> bool {
        let finite = |v: DVec2| v.x.is_finite() && v.y.is_finite();
        if !finite(center) || !finite(half_extent) || !finite(self.viewport) {
            return false;
        }
        let view_half = self.viewport / 2.0;

        // Cheap radius reject before the exact test.
        let reach = half_extent.x.hypot(half_extent.y) + view_half.x.hypot(view_half.y);
        if center.x.hypot(center.y) > reach {
            return false;
        }

        // Viewport axes in this space.
        let (sin, cos) = self.rotation.sin_cos();
        let u = DVec2::new(cos, -sin);
        let v = DVec2::new(sin, cos);

        // Box axes.
        let view_on_x = u.x.abs() * view_half.x + v.x.abs() * view_half.y;
        let view_on_y = u.y.abs() * view_half.x + v.y.abs() * view_half.y;
        if center.x.abs() > half_extent.x + view_on_x
            || center.y.abs() > half_extent.y + view_on_y
        {
            return false;
        }
        // Viewport axes.
        let box_on_u = u.x.abs() * half_extent.x + u.y.abs() * half_extent.y;
        let box_on_v = v.x.abs() * half_extent.x + v.y.abs() * half_extent.y;
        let center_on_u = center.x * u.x + center.y * u.y;
        let center_on_v = center.x * v.x + center.y * v.y;
        center_on_u.abs() <= box_on_u + view_half.x && center_on_v.abs() <= box_on_v + view_half.y
    }
    /// Is a local rect visible, once offset by `offset` (geometry origin minus pan) and padded by
    /// `pad_px` screen pixels on each side?
    #[must_use]
    pub fn rect_visible(&self, rect: &Rect, offset: DVec2, pad_px: f64) -> bool {
        if rect.is_empty() {
            return false;
        }
        let center = (rect.center() + offset) * self.zoom;
        let half = rect.half_extent() * self.zoom + DVec2::new(pad_px, pad_px);
        self.box_visible(center, half)
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct CullCounts {
    pub visible: usize,
    pub culled: usize,
}

/// Ranges of vertices to draw, with adjacent visible chunks merged.
pub type VisibleRanges = smallvec::SmallVec<[std::ops::Range<u32>; 4]>;

/// Cull every chunk of a stroke, returning the coalesced vertex ranges of the visible ones.
#[must_use]
pub fn visible_ranges(
    chunks: &[StrokeChunk],
    view: &CullView,
    offset: DVec2,
    pad_px: f64,
) -> (VisibleRanges, CullCounts) {
    let mut mask = bitvec::vec::BitVec::<usize, bitvec::order::Lsb0>::repeat(false, chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        if view.rect_visible(&chunk.bounds, offset, pad_px) {
            mask.set(index, true);
        }
    }
    let visible = mask.count_ones();
    let counts = CullCounts {
        visible,
        culled: chunks.len() - visible,
    };

    let mut ranges = VisibleRanges::new();
    for index in mask.iter_ones() {
        let span = &chunks[index].vertices;
        match ranges.last_mut() {
            // Chunks partition the vertices, so the previous visible chunk ending where this one
            // starts means they were neighbors.
            Some(last) if last.end == span.start => last.end = span.end,
            _ => ranges.push(span.clone()),
        }
    }
    (ranges, counts)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        color::Color,
        stroke::{Stroke, StrokeBrush},
        util,
    };

    fn view(rotation: f64) -> CullView {
        CullView {
            viewport: DVec2::new(800.0, 600.0),
            rotation,
            zoom: 1.0,
        }
    }

    #[test]
    fn box_against_rotated_viewport() {
        let unrotated = view(0.0);
        // Just outside the right edge.
        assert!(!unrotated.box_visible(DVec2::new(410.0, 0.0), DVec2::new(5.0, 5.0)));
        // Touching it.
        assert!(unrotated.box_visible(DVec2::new(405.0, 0.0), DVec2::new(5.0, 5.0)));

        // Quarter turn, the wide axis now runs along y in this space.
        let turned = view(std::f64::consts::FRAC_PI_2);
        assert!(!turned.box_visible(DVec2::new(350.0, 0.0), DVec2::new(1.0, 1.0)));
        assert!(turned.box_visible(DVec2::new(0.0, 350.0), DVec2::new(1.0, 1.0)));

        // Inside the AABB of a 45 degree viewport, but past its corner. Only the viewport axes
        // catch this one.
        let diagonal = view(std::f64::consts::FRAC_PI_4);
        let corner_gap = DVec2::new(480.0, 100.0);
        assert!(!diagonal.box_visible(corner_gap, DVec2::new(1.0, 1.0)));
    }
    #[test]
    fn non_finite_is_invisible() {
        let v = view(0.0);
        assert!(!v.box_visible(DVec2::new(f64::NAN, 0.0), DVec2::new(1.0, 1.0)));
        assert!(!v.box_visible(DVec2::new(0.0, 0.0), DVec2::new(f64::INFINITY, 1.0)));
    }
    #[test]
    fn ranges_coalesce() {
        let chunk = |start: u32, x: f64| StrokeChunk {
            vertices: start..start + 3,
            bounds: Rect::new(DVec2::new(x, 0.0), DVec2::new(x + 1.0, 1.0)),
        };
        // Visible, visible, hidden, visible.
        let chunks = [chunk(0, 0.0), chunk(3, 10.0), chunk(6, 5000.0), chunk(9, 20.0)];
        let (ranges, counts) = visible_ranges(&chunks, &view(0.0), DVec2::new(0.0, 0.0), 0.0);
        assert_eq!(ranges.as_slice(), &[0..6, 9..12]);
        assert_eq!(counts, CullCounts { visible: 3, culled: 1 });
    }
    #[test]
    fn cull_is_sound() {
        // A spiral from the middle of the view out well past its corners.
        let points: Vec<DVec2> = (0..600)
            .map(|i| {
                let t = f64::from(i) * 0.05;
                DVec2::new(t.cos(), t.sin()) * (100.0 * t)
            })
            .collect();
        let brush = StrokeBrush {
            width_px: 6.0,
            color: Color::BLACK,
            smoothing_subdivisions: 0,
        };
        let stroke = Stroke::build(&points, brush, 1.0, 60).unwrap();
        let pan = DVec2::new(150.0, -40.0);
        let offset = stroke.origin() - pan;

        for rotation in [0.0, 0.4, 1.9, -2.7] {
            for zoom in [0.5, 1.0, 3.0] {
                let view = CullView {
                    viewport: DVec2::new(800.0, 600.0),
                    rotation,
                    zoom,
                };
                let pad = stroke.world_half_width() * zoom;
                let (ranges, counts) = visible_ranges(stroke.chunks(), &view, offset, pad);
                assert!(counts.culled > 0, "test stroke should be partly off screen");

                for (index, vertex) in stroke.vertices().iter().enumerate() {
                    let local = DVec2::new(
                        f64::from(vertex.position[0]),
                        f64::from(vertex.position[1]),
                    );
                    let screen = util::rotate(local + offset, rotation) * zoom;
                    let on_screen = screen.x.abs() <= 400.0 && screen.y.abs() <= 300.0;
                    if on_screen {
                        let index = u32::try_from(index).unwrap();
                        assert!(
                            ranges.iter().any(|range| range.contains(&index)),
                            "vertex {index} is on screen but was culled"
                        );
                    }
                }
                // And nothing entirely off screen was drawn.
                for chunk in stroke.chunks() {
                    if !view.rect_visible(&chunk.bounds, offset, pad) {
                        assert!(!ranges.iter().any(|range| range.contains(&chunk.vertices.start)));
                    }
                }
            }
        }
    }
}
