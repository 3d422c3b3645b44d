//! # Tessellation
//!
//! Turns a centerline into a flat-colored triangle list. Segments are extruded into quads in
//! parallel, and both ends get a round cap. Input with fewer than two distinct points becomes a
//! dot so that a tap still leaves a mark.

use crate::{color::Color, DVec2};
use az::Az;
use rayon::prelude::*;

/// Segments used for a full circle. Caps use half as many.
pub const DOT_SEGMENTS: usize = 16;
pub const CAP_SEGMENTS: usize = DOT_SEGMENTS / 2;

/// A single vertex of a stroke triangle list, relative to the stroke's origin.
#[derive(Copy, Clone, PartialEq, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct StrokeVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}
impl StrokeVertex {
    fn new(position: DVec2, color: Color) -> Self {
        Self {
            position: [position.x.az::<f32>(), position.y.az::<f32>()],
            color: color.as_array(),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct TessellationParams {
    /// Half the stroke width, in the same units as the points.
    pub half_width: f64,
    pub color: Color,
}

/// Perpendicular of `v`, rotated a quarter turn counter-clockwise.
fn perp(v: DVec2) -> DVec2 {
    DVec2::new(-v.y, v.x)
}

/// Drop consecutive points too close to tell apart. Always keeps the first point.
fn distinct_points(points: &[DVec2], epsilon: f64) -> Vec<DVec2> {
    use cgmath::MetricSpace;
    let epsilon2 = epsilon * epsilon;
    let mut out: Vec<DVec2> = Vec::with_capacity(points.len());
    for &point in points {
        if !(point.x.is_finite() && point.y.is_finite()) {
            continue;
        }
        match out.last() {
            Some(&last) if last.distance2(point) <= epsilon2 => (),
            _ => out.push(point),
        }
    }
    out
}

/// Per-point unit normals from averaged neighboring segment directions.
fn normals(points: &[DVec2]) -> Vec<DVec2> {
    use cgmath::InnerSpace;
    let directions: Vec<DVec2> = points
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).normalize())
        .collect();

    (0..points.len())
        .map(|i| {
            let before = i.checked_sub(1).map(|i| directions[i]);
            let after = directions.get(i).copied();
            let tangent = match (before, after) {
                (Some(a), Some(b)) => {
                    let sum = a + b;
                    // Hairpin, the average vanishes. Fall back on the incoming direction.
                    if sum.magnitude2() < 1e-12 {
                        a
                    } else {
                        sum.normalize()
                    }
                }
                (Some(d), None) | (None, Some(d)) => d,
                (None, None) => DVec2::new(1.0, 0.0),
            };
            perp(tangent)
        })
        .collect()
}

/// Triangle fan of a circular arc around `center`, from `start` sweeping counter-clockwise
/// through `sweep` radians.
fn arc(
    center: DVec2,
    radius: f64,
    start: f64,
    sweep: f64,
    segments: usize,
    color: Color,
) -> impl Iterator<Item = StrokeVertex> {
    #[allow(clippy::cast_precision_loss)]
    let step = sweep / segments as f64;
    let point_at = move |k: usize| {
        #[allow(clippy::cast_precision_loss)]
        let angle = start + step * k as f64;
        let (sin, cos) = angle.sin_cos();
        center + DVec2::new(cos, sin) * radius
    };
    (0..segments).flat_map(move |k| {
        [
            StrokeVertex::new(center, color),
            StrokeVertex::new(point_at(k), color),
            StrokeVertex::new(point_at(k + 1), color),
        ]
    })
}

/// A filled circle, for strokes that never moved.
#[must_use]
pub fn dot(center: DVec2, params: &TessellationParams) -> Vec<StrokeVertex> {
    arc(
        center,
        params.half_width,
        0.0,
        std::f64::consts::TAU,
        DOT_SEGMENTS,
        params.color,
    )
    .collect()
}

/// Tessellate a polyline into a round-capped triangle list.
///
/// The output is ordered start cap, segments in order, end cap, so that consecutive vertex ranges
/// stay spatially close, which is what makes chunked culling worthwhile.
#[must_use]
pub fn tessellate(points: &[DVec2], params: &TessellationParams) -> Vec<StrokeVertex> {
    let points = distinct_points(points, params.half_width.abs() * 1e-4 + 1e-12);
    match points.as_slice() {
        [] => return Vec::new(),
        [center] => return dot(*center, params),
        _ => (),
    }
    let half_width = params.half_width;
    let color = params.color;
    let normals = normals(&points);

    // Left and right edge of the stroke at each point.
    let sections: Vec<(DVec2, DVec2)> = points
        .iter()
        .zip(normals.iter())
        .map(|(&point, &normal)| (point + normal * half_width, point - normal * half_width))
        .collect();

    let mut vertices = Vec::with_capacity(sections.len() * 6 + CAP_SEGMENTS * 6);

    let (start, end) = (points[0], points[points.len() - 1]);
    let (start_normal, end_normal) = (normals[0], normals[normals.len() - 1]);
    let angle_of = |v: DVec2| v.y.atan2(v.x);

    // Start cap sweeps from the left edge backwards around to the right edge.
    vertices.extend(arc(
        start,
        half_width,
        angle_of(start_normal),
        std::f64::consts::PI,
        CAP_SEGMENTS,
        color,
    ));

    let body: Vec<StrokeVertex> = sections
        .par_windows(2)
        // Each window is tiny, no use splitting it further.
        .flat_map_iter(|window| {
            let [(l0, r0), (l1, r1)] = window else {
                unreachable!()
            };
            [
                StrokeVertex::new(*l0, color),
                StrokeVertex::new(*r0, color),
                StrokeVertex::new(*l1, color),
                StrokeVertex::new(*l1, color),
                StrokeVertex::new(*r0, color),
                StrokeVertex::new(*r1, color),
            ]
        })
        .collect();
    vertices.extend(body);

    // End cap sweeps from the right edge forwards around to the left edge.
    vertices.extend(arc(
        end,
        half_width,
        angle_of(-end_normal),
        std::f64::consts::PI,
        CAP_SEGMENTS,
        color,
    ));

    vertices
}

/// Independent straight bars, used for procedural card backgrounds. No caps, no joins.
#[must_use]
pub fn bars(segments: &[(DVec2, DVec2)], params: &TessellationParams) -> Vec<StrokeVertex> {
    use cgmath::InnerSpace;
    segments
        .par_iter()
        .flat_map_iter(|&(a, b)| -> smallvec::SmallVec<[StrokeVertex; 6]> {
            let direction = b - a;
            if direction.magnitude2() <= 0.0 {
                return smallvec::SmallVec::new();
            }
            let offset = perp(direction.normalize()) * params.half_width;
            let color = params.color;
            smallvec::smallvec![
                StrokeVertex::new(a + offset, color),
                StrokeVertex::new(a - offset, color),
                StrokeVertex::new(b + offset, color),
                StrokeVertex::new(b + offset, color),
                StrokeVertex::new(a - offset, color),
                StrokeVertex::new(b - offset, color),
            ]
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(half_width: f64) -> TessellationParams {
        TessellationParams {
            half_width,
            color: Color::BLACK,
        }
    }

    #[test]
    fn degenerate_input_is_a_dot() {
        let same = [DVec2::new(5.0, 5.0); 4];
        let vertices = tessellate(&same, &params(2.0));
        assert_eq!(vertices.len(), DOT_SEGMENTS * 3);
        let bounds = crate::geometry::bounds_of(&vertices);
        assert!((bounds.min.x - 3.0).abs() < 1e-4);
        assert!((bounds.max.y - 7.0).abs() < 1e-4);

        assert!(tessellate(&[], &params(2.0)).is_empty());
    }
    #[test]
    fn line_is_triangle_list_with_caps() {
        let line = [DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), DVec2::new(20.0, 0.0)];
        let vertices = tessellate(&line, &params(1.0));
        assert_eq!(vertices.len() % 3, 0);
        assert_eq!(vertices.len(), 2 * CAP_SEGMENTS * 3 + 2 * 6);

        let bounds = crate::geometry::bounds_of(&vertices);
        // Caps reach one half-width past the ends.
        assert!((bounds.min.x + 1.0).abs() < 1e-4);
        assert!((bounds.max.x - 21.0).abs() < 1e-4);
        assert!((bounds.min.y + 1.0).abs() < 1e-4);
        assert!((bounds.max.y - 1.0).abs() < 1e-4);
    }
    #[test]
    fn hairpin_is_finite() {
        let hairpin = [DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), DVec2::new(0.0, 0.0)];
        let vertices = tessellate(&hairpin, &params(1.0));
        assert!(vertices
            .iter()
            .all(|v| v.position.iter().all(|c| c.is_finite())));
    }
    #[test]
    fn bars_skip_empty_segments() {
        let segments = [
            (DVec2::new(0.0, 0.0), DVec2::new(0.0, 10.0)),
            (DVec2::new(3.0, 3.0), DVec2::new(3.0, 3.0)),
        ];
        assert_eq!(bars(&segments, &params(0.5)).len(), 6);
    }
}
