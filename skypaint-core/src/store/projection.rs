use ultraviolet::{Vec2, Vec3};

use crate::stroke::StrokeRecord;

/// The plane a drawing is flattened onto for its thumbnail.
#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProjectionPlane {
    /// Points towards the viewer. Need not be normalized.
    pub normal: Vec3,
    pub point: Vec3,
}
impl Default for ProjectionPlane {
    /// Facing forward, through the origin.
    fn default() -> Self {
        Self {
            normal: Vec3::unit_z(),
            point: Vec3::zero(),
        }
    }
}
impl ProjectionPlane {
    /// Unit right and up vectors spanning the plane. A degenerate normal is treated as `+Z`.
    #[must_use]
    pub fn basis(&self) -> (Vec3, Vec3) {
        let normal = if crate::util::is_finite_point(self.normal) && self.normal.mag_sq() > 0.0 {
            self.normal.normalized()
        } else {
            Vec3::unit_z()
        };
        // Keep world up as "up" unless looking straight along it.
        let up = if normal.y.abs() < 0.99 {
            Vec3::unit_y()
        } else {
            Vec3::unit_z()
        };
        let right = up.cross(normal).normalized();
        (right, normal.cross(right))
    }
    /// Plane-local 2D coordinates of `point`, with `self.point` at the origin.
    #[must_use]
    pub fn project(&self, point: Vec3) -> Vec2 {
        let (right, up) = self.basis();
        let rel = point - self.point;
        Vec2::new(rel.dot(right), rel.dot(up))
    }
    /// Project every point of every record, keeping the grouping.
    #[must_use]
    pub fn project_records(&self, records: &[StrokeRecord]) -> Vec<Vec<Vec2>> {
        let (right, up) = self.basis();
        records
            .iter()
            .map(|record| {
                record
                    .points
                    .iter()
                    .map(|p| {
                        let rel = Vec3::from(*p) - self.point;
                        Vec2::new(rel.dot(right), rel.dot(up))
                    })
                    .collect()
            })
            .collect()
    }
}
