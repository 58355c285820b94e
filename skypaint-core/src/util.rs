//! Utility types, used throughout the crate.

/// A float which is finite - never NaN nor infinite.
// Because of the preconditions invalidating many bitpatterns, this is not Pod.
#[derive(Copy, Clone, PartialEq, PartialOrd, bytemuck::NoUninit, bytemuck::Zeroable, Debug)]
#[repr(transparent)]
pub struct FiniteF32(f32);
impl FiniteF32 {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);
    pub fn new(val: f32) -> Result<Self, FiniteF32Error> {
        if val.is_finite() {
            Ok(Self(val))
        } else {
            Err(FiniteF32Error::NotFinite)
        }
    }
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for FiniteF32 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<f32> for FiniteF32 {
    type Error = FiniteF32Error;
    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
impl From<FiniteF32> for f32 {
    fn from(value: FiniteF32) -> Self {
        value.get()
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiniteF32Error {
    #[error("not finite")]
    NotFinite,
}

// No component is ever NaN, so PartialEq acts like Eq.
impl Eq for FiniteF32 {}
#[allow(clippy::derive_ord_xor_partial_ord)]
impl Ord for FiniteF32 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Safety: finite floats always compare as Some.
        unsafe { self.partial_cmp(other).unwrap_unchecked() }
    }
}
impl std::hash::Hash for FiniteF32 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u32(self.0.to_bits());
    }
}

/// Check every component of a point is finite.
#[must_use]
pub fn is_finite_point(point: ultraviolet::Vec3) -> bool {
    point.x.is_finite() && point.y.is_finite() && point.z.is_finite()
}

/// Transform a point by `matrix`, taking `w = 1`. Affine use only - no perspective divide.
#[must_use]
pub fn transform_point(matrix: &ultraviolet::Mat4, point: ultraviolet::Vec3) -> ultraviolet::Vec3 {
    (*matrix * ultraviolet::Vec4::new(point.x, point.y, point.z, 1.0)).xyz()
}
