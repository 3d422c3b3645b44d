//! Physical lengths, for things that are specified in points but drawn in world units (card
//! backgrounds, mostly).

/// Constant varies by who you ask - but this is the one defined by W3C.
pub const PT_PER_IN: f32 = 72.0;
pub const IN_PER_PT: f32 = 1.0 / PT_PER_IN;

/// A length that doesn't know about the world scale yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Logical pixels, as the touch layer reports them.
    Logical(f32),
    /// Typographic points, as defined by W3C.
    Point(f32),
}
impl Length {
    #[must_use]
    pub fn value(self) -> f32 {
        match self {
            Self::Logical(x) | Self::Point(x) => x,
        }
    }
    /// Convert into logical pixels, under the given resolution.
    #[must_use]
    pub fn into_logical(self, resolution: Resolution) -> f32 {
        match self {
            Self::Logical(l) => l,
            Self::Point(p) => resolution.into_dpi() * (p * IN_PER_PT),
        }
    }
    /// Convert into world units of a frame that was at `zoom` when the owning object was created.
    ///
    /// Things sized this way look the same on screen as they did at creation, and then scale with
    /// the content like everything else.
    #[must_use]
    pub fn into_world(self, resolution: Resolution, zoom: f64) -> f64 {
        f64::from(self.into_logical(resolution)) / zoom
    }
}

/// Relationship between logical pixels and physical units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolution {
    /// Dots (logical pixels) per inch
    Dpi(f32),
}
impl Resolution {
    /// One logical pixel per point, the usual arrangement on touch devices.
    pub const POINT_PIXELS: Self = Self::Dpi(PT_PER_IN);
    #[must_use]
    pub fn into_dpi(self) -> f32 {
        match self {
            Self::Dpi(dpi) => dpi,
        }
    }
}
impl Default for Resolution {
    fn default() -> Self {
        Self::POINT_PIXELS
    }
}

#[cfg(test)]
mod test {
    use super::{Length, Resolution};
    #[test]
    fn points_scale_with_creation_zoom() {
        let spacing = Length::Point(24.0);
        assert!((spacing.into_world(Resolution::POINT_PIXELS, 1.0) - 24.0).abs() < 1e-9);
        assert!((spacing.into_world(Resolution::POINT_PIXELS, 4.0) - 6.0).abs() < 1e-9);
        assert!((spacing.into_logical(Resolution::Dpi(144.0)) - 48.0).abs() < 1e-4);
    }
}
