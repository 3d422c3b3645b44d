//! # Geometry
//! Turning pen input into something a GPU can draw: Catmull-Rom smoothing of the raw samples
//! ([`smooth`]) and tessellation of the smoothed centerline into a triangle list ([`tess`]).

pub mod smooth;
pub mod tess;

pub use smooth::catmull_rom;
pub use tess::{StrokeVertex, TessellationParams};

use crate::{util::Rect, DVec2};

/// Bounding rect of the positions of some vertices. Empty for an empty slice.
#[must_use]
pub fn bounds_of(vertices: &[StrokeVertex]) -> Rect {
    Rect::from_points(vertices.iter().map(|vertex| {
        DVec2::new(
            f64::from(vertex.position[0]),
            f64::from(vertex.position[1]),
        )
    }))
}

