use crate::util::{FiniteF32, FiniteF32Error};

/// A straight (non-premultiplied) RGBA color, components nominally in `[0, 1]`.
///
/// Components are not clamped, only required to be finite.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, bytemuck::Zeroable, Debug)]
pub struct Color([FiniteF32; 4]);
impl Color {
    pub const TRANSPARENT: Self = Self([FiniteF32::ZERO; 4]);
    pub const WHITE: Self = Self([FiniteF32::ONE; 4]);
    pub const BLACK: Self = Self([
        FiniteF32::ZERO,
        FiniteF32::ZERO,
        FiniteF32::ZERO,
        FiniteF32::ONE,
    ]);
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Result<Self, FiniteF32Error> {
        Ok(Self([
            FiniteF32::new(r)?,
            FiniteF32::new(g)?,
            FiniteF32::new(b)?,
            FiniteF32::new(a)?,
        ]))
    }
    pub fn from_rgba([r, g, b, a]: [f32; 4]) -> Result<Self, FiniteF32Error> {
        Self::new(r, g, b, a)
    }
    /// Convert from hue, saturation, brightness, alpha. Hue is in turns, `[0, 1)`,
    /// wrapping outside of that range.
    pub fn from_hsba([hue, saturation, brightness, alpha]: [f32; 4]) -> Result<Self, FiniteF32Error> {
        // Validate up front, the arithmetic below would happily spread a NaN around.
        for component in [hue, saturation, brightness, alpha] {
            FiniteF32::new(component)?;
        }
        let hue = hue.rem_euclid(1.0) * 6.0;
        let chroma = brightness * saturation;
        let x = chroma * (1.0 - ((hue % 2.0) - 1.0).abs());
        let m = brightness - chroma;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (r, g, b) = match hue.floor() as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            // 5, and 6 from rounding right below a full turn.
            _ => (chroma, 0.0, x),
        };
        Self::new(r + m, g + m, b + m, alpha)
    }
    #[must_use]
    pub fn as_array(&self) -> [f32; 4] {
        self.0.map(FiniteF32::get)
    }
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.0[3].get()
    }
    /// Quantize to 8 bit straight RGBA.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgba8(&self) -> [u8; 4] {
        self.as_array()
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}
impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
