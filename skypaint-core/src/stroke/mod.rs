//! # Strokes
//!
//! One continuous line drawn in space: an ordered list of points, a color, and a tube radius.
//! Tessellation is not done here - a stroke only holds a handle to whatever visual the
//! [`Scene`](crate::scene::Scene) built for it, and asks for a rebuild when it changes.

pub mod record;
pub use record::StrokeRecord;

use ultraviolet::Vec3;

use crate::color::Color;
use crate::scene::{Parent, Scene, VisualID};

/// Radius used when none is given, and for records written before radius was stored.
pub const DEFAULT_RADIUS: f32 = 1E-2;

/// Identity of a stroke. Unlike [`crate::FuzzID`], this is carried through save and load.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StrokeID(pub uuid::Uuid);
impl StrokeID {
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}
impl Default for StrokeID {
    fn default() -> Self {
        Self::new()
    }
}
impl std::fmt::Display for StrokeID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stroke#{}", self.0.simple())
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum StrokeError {
    #[error("radius must be finite and positive, got {0}")]
    InvalidRadius(f32),
    #[error("point is not finite")]
    NonFinitePoint,
    #[error("color is not finite")]
    NonFiniteColor,
}

fn check_radius(radius: f32) -> Result<f32, StrokeError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(StrokeError::InvalidRadius(radius))
    }
}

pub struct Stroke {
    id: StrokeID,
    points: Vec<Vec3>,
    color: Color,
    /// Radius the stroke was designed with. Never changes.
    original_radius: f32,
    /// Radius currently drawn with, differs from `original_radius` while a staged group is scaled.
    radius: f32,
    visual: Option<VisualID>,
    /// Data changed since `visual` was built.
    dirty: bool,
}
impl Stroke {
    /// An empty stroke. Fails if `radius` is not finite and positive.
    pub fn new(id: StrokeID, color: Color, radius: f32) -> Result<Self, StrokeError> {
        let radius = check_radius(radius)?;
        Ok(Self {
            id,
            points: Vec::new(),
            color,
            original_radius: radius,
            radius,
            visual: None,
            dirty: true,
        })
    }
    /// A stroke with the given points.
    pub fn with_points(
        id: StrokeID,
        color: Color,
        radius: f32,
        points: Vec<Vec3>,
    ) -> Result<Self, StrokeError> {
        let mut this = Self::new(id, color, radius)?;
        this.replace_points(points)?;
        Ok(this)
    }
    #[must_use]
    pub fn id(&self) -> StrokeID {
        self.id
    }
    pub(crate) fn set_id(&mut self, id: StrokeID) {
        self.id = id;
    }
    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
    #[must_use]
    pub fn last_point(&self) -> Option<Vec3> {
        self.points.last().copied()
    }
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }
    #[must_use]
    pub fn original_radius(&self) -> f32 {
        self.original_radius
    }
    #[must_use]
    pub fn visual(&self) -> Option<VisualID> {
        self.visual
    }
    /// Whether the visual is out of date with respect to the data.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
    /// Re-set the color. The visual must be rebuilt afterwards.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.invalidate();
    }
    /// Draw at `original_radius * factor`. The visual must be rebuilt afterwards.
    pub fn scale_radius(&mut self, factor: f32) -> Result<(), StrokeError> {
        self.radius = check_radius(self.original_radius * factor)?;
        self.invalidate();
        Ok(())
    }
    pub(crate) fn push_point(&mut self, point: Vec3) {
        self.points.push(point);
        self.invalidate();
    }
    /// Swap the whole point list. Fails, leaving the stroke untouched, if any point is not finite.
    pub fn replace_points(&mut self, points: Vec<Vec3>) -> Result<(), StrokeError> {
        if !points.iter().copied().all(crate::util::is_finite_point) {
            return Err(StrokeError::NonFinitePoint);
        }
        self.points = points;
        self.invalidate();
        Ok(())
    }
    /// A fresh stroke with identical data and no visual.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self {
            id: self.id,
            points: self.points.clone(),
            color: self.color,
            original_radius: self.original_radius,
            radius: self.radius,
            visual: None,
            dirty: true,
        }
    }
    fn invalidate(&mut self) {
        self.dirty = true;
    }
    /// Ask the scene to (re)build this stroke's visual under `parent`. The previous visual, if any,
    /// is handed over to be replaced.
    pub fn rebuild_visual(&mut self, scene: &mut impl Scene, parent: Parent) {
        let visual = scene.build_stroke(self.visual, self, parent);
        self.visual = Some(visual);
        self.dirty = false;
    }
    /// Remove this stroke's visual from the scene, if any.
    pub fn drop_visual(&mut self, scene: &mut impl Scene) {
        if let Some(visual) = self.visual.take() {
            scene.remove(visual);
        }
        self.dirty = true;
    }
}
impl std::fmt::Debug for Stroke {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stroke")
            .field("id", &self.id)
            .field("points", &self.points.len())
            .field("color", &self.color)
            .field("radius", &self.radius)
            .finish_non_exhaustive()
    }
}
