/// A premultiplied, linear color.
/// All fully transparent values are normalized to transparent black, and no channel is ever NaN.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct Color([f32; 4]);
impl Color {
    pub const TRANSPARENT: Self = Self([0.0; 4]);
    pub const WHITE: Self = Self([1.0; 4]);
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 1.0]);
    /// Create a color from premultiplied linear channels. None if any channel is NaN.
    #[must_use]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Option<Self> {
        if [r, g, b, a].iter().any(|c| c.is_nan()) {
            return None;
        }
        if a <= 0.0 {
            Some(Self::TRANSPARENT)
        } else {
            Some(Self([r, g, b, a]))
        }
    }
    /// Convert from straight-alpha sRGB bytes, as color pickers report them.
    #[must_use]
    pub fn from_srgba8([r, g, b, a]: [u8; 4]) -> Self {
        fn to_linear(c: u8) -> f32 {
            let c = f32::from(c) / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        let alpha = f32::from(a) / 255.0;
        if alpha == 0.0 {
            return Self::TRANSPARENT;
        }
        Self([
            to_linear(r) * alpha,
            to_linear(g) * alpha,
            to_linear(b) * alpha,
            alpha,
        ])
    }
    #[must_use]
    pub fn as_array(&self) -> [f32; 4] {
        self.0
    }
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.0[3]
    }
}
impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}
