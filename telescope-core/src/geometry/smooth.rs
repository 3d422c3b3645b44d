use crate::DVec2;

/// Uniform Catmull-Rom interpolation through every input point, inserting `subdivisions` extra
/// samples into each segment. End segments reuse their endpoint as the missing neighbor.
///
/// Fewer than three points (or zero subdivisions) have nothing to smooth and are returned as-is.
#[must_use]
pub fn catmull_rom(points: &[DVec2], subdivisions: usize) -> Vec<DVec2> {
    if points.len() < 3 || subdivisions == 0 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let steps = subdivisions + 1;
    let mut out = Vec::with_capacity(last * steps + 1);

    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];

        out.push(p1);
        for step in 1..steps {
            #[allow(clippy::cast_precision_loss)]
            let t = step as f64 / steps as f64;
            out.push(sample(p0, p1, p2, p3, t));
        }
    }
    out.push(points[last]);
    out
}

fn sample(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2, t: f64) -> DVec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    (p1 * 2.0
        + (p2 - p0) * t
        + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
        * 0.5
}

#[cfg(test)]
mod test {
    use super::catmull_rom;
    use crate::DVec2;

    #[test]
    fn passes_through_control_points() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 5.0),
            DVec2::new(20.0, -5.0),
            DVec2::new(30.0, 0.0),
        ];
        let smooth = catmull_rom(&points, 3);
        assert_eq!(smooth.len(), 3 * 4 + 1);
        for (i, point) in points.iter().enumerate() {
            assert_eq!(smooth[i * 4], *point);
        }
        assert_eq!(*smooth.last().unwrap(), points[3]);
    }
    #[test]
    fn collinear_input_stays_collinear() {
        let points: Vec<_> = (0..5).map(|i| DVec2::new(f64::from(i), 0.0)).collect();
        let smooth = catmull_rom(&points, 4);
        assert!(smooth.iter().all(|p| p.y.abs() < 1e-12));
        // Monotonic along x, no overshoot on an evenly spaced line.
        assert!(smooth.windows(2).all(|w| w[1].x >= w[0].x));
    }
    #[test]
    fn short_input_untouched() {
        let points = [DVec2::new(1.0, 2.0), DVec2::new(3.0, 4.0)];
        assert_eq!(catmull_rom(&points, 8), points.to_vec());
    }
}
