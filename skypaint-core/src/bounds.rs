//! # Bounding volumes
//!
//! An axis-aligned box around a set of points, used to size the staging handle and to
//! test whether a point lies within a staged group.
//!
//! The eight corners are the only stored state. Transforms are applied to the corners
//! themselves rather than by rescanning the source points, so an interactive drag costs
//! eight matrix multiplies per frame no matter how large the staged drawing is.

use ultraviolet::{Mat4, Vec3};

use crate::util::transform_point;

/// Names of the corners of a box. The discriminant encodes which extreme each axis takes:
/// bit 0 set for max X, bit 1 for max Y, bit 2 for max Z.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, strum::EnumIter, strum::EnumCount)]
#[repr(u8)]
pub enum Corner {
    MinXMinYMinZ = 0,
    MaxXMinYMinZ = 1,
    MinXMaxYMinZ = 2,
    MaxXMaxYMinZ = 3,
    MinXMinYMaxZ = 4,
    MaxXMinYMaxZ = 5,
    MinXMaxYMaxZ = 6,
    MaxXMaxYMaxZ = 7,
}
impl Corner {
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
    /// Pick this corner out of the given extremes.
    #[must_use]
    pub fn select(self, min: Vec3, max: Vec3) -> Vec3 {
        let bits = self as u8;
        Vec3::new(
            if bits & 0b001 == 0 { min.x } else { max.x },
            if bits & 0b010 == 0 { min.y } else { max.y },
            if bits & 0b100 == 0 { min.z } else { max.z },
        )
    }
}

/// Pairs of corners joined by an edge. Four along X, four along Y, four along Z.
const EDGES: [(Corner, Corner); 12] = [
    (Corner::MinXMinYMinZ, Corner::MaxXMinYMinZ),
    (Corner::MinXMaxYMinZ, Corner::MaxXMaxYMinZ),
    (Corner::MinXMinYMaxZ, Corner::MaxXMinYMaxZ),
    (Corner::MinXMaxYMaxZ, Corner::MaxXMaxYMaxZ),
    (Corner::MinXMinYMinZ, Corner::MinXMaxYMinZ),
    (Corner::MaxXMinYMinZ, Corner::MaxXMaxYMinZ),
    (Corner::MinXMinYMaxZ, Corner::MinXMaxYMaxZ),
    (Corner::MaxXMinYMaxZ, Corner::MaxXMaxYMaxZ),
    (Corner::MinXMinYMinZ, Corner::MinXMinYMaxZ),
    (Corner::MaxXMinYMinZ, Corner::MaxXMinYMaxZ),
    (Corner::MinXMaxYMinZ, Corner::MinXMaxYMaxZ),
    (Corner::MaxXMaxYMinZ, Corner::MaxXMaxYMaxZ),
];

/// Quads of the box, each wound around its outward normal: -X, +X, -Y, +Y, -Z, +Z.
const FACES: [[Corner; 4]; 6] = [
    [
        Corner::MinXMinYMinZ,
        Corner::MinXMinYMaxZ,
        Corner::MinXMaxYMaxZ,
        Corner::MinXMaxYMinZ,
    ],
    [
        Corner::MaxXMinYMinZ,
        Corner::MaxXMaxYMinZ,
        Corner::MaxXMaxYMaxZ,
        Corner::MaxXMinYMaxZ,
    ],
    [
        Corner::MinXMinYMinZ,
        Corner::MaxXMinYMinZ,
        Corner::MaxXMinYMaxZ,
        Corner::MinXMinYMaxZ,
    ],
    [
        Corner::MinXMaxYMinZ,
        Corner::MinXMaxYMaxZ,
        Corner::MaxXMaxYMaxZ,
        Corner::MaxXMaxYMinZ,
    ],
    [
        Corner::MinXMinYMinZ,
        Corner::MinXMaxYMinZ,
        Corner::MaxXMaxYMinZ,
        Corner::MaxXMinYMinZ,
    ],
    [
        Corner::MinXMinYMaxZ,
        Corner::MaxXMinYMaxZ,
        Corner::MaxXMaxYMaxZ,
        Corner::MinXMaxYMaxZ,
    ],
];

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BoundingVolume {
    /// Indexed by [`Corner::index`]
    corners: [Vec3; 8],
}
impl BoundingVolume {
    /// Scan the points once for their extremes. `None` if there are no points.
    pub fn build(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), point| {
            (min.min_by_component(point), max.max_by_component(point))
        });
        Some(Self::from_extremes(min, max))
    }
    /// Box spanning the two given points. Components are sorted, so any two opposite
    /// corners will do.
    #[must_use]
    pub fn from_extremes(a: Vec3, b: Vec3) -> Self {
        let min = a.min_by_component(b);
        let max = a.max_by_component(b);
        let mut corners = [Vec3::zero(); 8];
        for corner in <Corner as strum::IntoEnumIterator>::iter() {
            corners[corner.index()] = corner.select(min, max);
        }
        Self { corners }
    }
    #[must_use]
    pub fn corner(&self, corner: Corner) -> Vec3 {
        self.corners[corner.index()]
    }
    #[must_use]
    pub fn corners(&self) -> &[Vec3; 8] {
        &self.corners
    }
    /// Average of all eight corners.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.corners.iter().fold(Vec3::zero(), |sum, c| sum + *c) / 8.0
    }
    #[must_use]
    pub fn edges(&self) -> [(Vec3, Vec3); 12] {
        EDGES.map(|(a, b)| (self.corner(a), self.corner(b)))
    }
    #[must_use]
    pub fn faces(&self) -> [[Vec3; 4]; 6] {
        FACES.map(|face| face.map(|corner| self.corner(corner)))
    }
    /// Componentwise minimum over the current corners.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.corners[1..]
            .iter()
            .fold(self.corners[0], |min, c| min.min_by_component(*c))
    }
    /// Componentwise maximum over the current corners.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.corners[1..]
            .iter()
            .fold(self.corners[0], |max, c| max.max_by_component(*c))
    }
    /// Size of the axis-aligned extent.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max() - self.min()
    }
    /// Move every corner by `matrix`.
    ///
    /// Successive calls compose by left-multiplication: applying `a` then `b` leaves the
    /// same corners as applying `b * a` once.
    pub fn apply_transform(&mut self, matrix: &Mat4) {
        for corner in &mut self.corners {
            *corner = transform_point(matrix, *corner);
        }
    }
    /// Inclusive test against the box's current axis-aligned extent.
    ///
    /// After a rotation the corners describe an oriented box, but this still tests
    /// against the axis-aligned box enclosing them. Good enough for grabbing a staged
    /// group, not an exact hit test.
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        (min.x..=max.x).contains(&point.x)
            && (min.y..=max.y).contains(&point.y)
            && (min.z..=max.z).contains(&point.z)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).mag() < 1e-4
    }

    #[test]
    fn empty_is_none() {
        assert!(BoundingVolume::build(std::iter::empty()).is_none());
    }
    #[test]
    fn single_point_is_degenerate() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let volume = BoundingVolume::build([p]).unwrap();
        assert!(volume.corners().iter().all(|c| *c == p));
        assert_eq!(volume.size(), Vec3::zero());
        assert!(volume.contains_point(p));
    }
    #[test]
    fn named_corners() {
        let volume = BoundingVolume::build([
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(1.0, 4.0, -2.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        assert_eq!(volume.corner(Corner::MinXMinYMinZ), Vec3::new(-1.0, 0.0, -2.0));
        assert_eq!(volume.corner(Corner::MaxXMaxYMaxZ), Vec3::new(1.0, 4.0, 2.0));
        assert_eq!(volume.corner(Corner::MaxXMinYMaxZ), Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(volume.center(), Vec3::new(0.0, 2.0, 0.0));
    }
    #[test]
    fn edges_and_faces() {
        let volume = BoundingVolume::from_extremes(Vec3::zero(), Vec3::new(1.0, 2.0, 3.0));
        let edges = volume.edges();
        // Four edges along each axis with the matching length.
        for (axis, length) in [(0, 1.0), (1, 2.0), (2, 3.0)] {
            let along: Vec<_> = edges
                .iter()
                .filter(|(a, b)| {
                    let d = *b - *a;
                    let parts = [d.x, d.y, d.z];
                    (parts[axis] - length).abs() < 1e-6
                        && parts.iter().filter(|c| c.abs() > 1e-6).count() == 1
                })
                .collect();
            assert_eq!(along.len(), 4, "axis {axis}");
        }
        for face in volume.faces() {
            // Every face is planar along one axis.
            let planar = [
                face.iter().all(|c| c.x == face[0].x),
                face.iter().all(|c| c.y == face[0].y),
                face.iter().all(|c| c.z == face[0].z),
            ];
            assert_eq!(planar.iter().filter(|p| **p).count(), 1);
        }
    }
    #[test]
    fn containment_is_inclusive() {
        let volume = BoundingVolume::from_extremes(Vec3::zero(), Vec3::one());
        assert!(volume.contains_point(Vec3::one()));
        assert!(volume.contains_point(Vec3::new(0.5, 0.0, 1.0)));
        assert!(!volume.contains_point(Vec3::new(0.5, 1.01, 0.5)));
        assert!(!volume.contains_point(Vec3::new(-0.01, 0.5, 0.5)));
    }
    #[test]
    fn containment_after_rotation_uses_enclosing_box() {
        let mut volume = BoundingVolume::from_extremes(Vec3::zero(), Vec3::new(2.0, 1.0, 1.0));
        // Half turn about Z puts the "min" corner above the "max" corner on X and Y.
        volume.apply_transform(&Mat4::from_rotation_z(std::f32::consts::PI));
        assert!(volume.contains_point(Vec3::new(-1.0, -0.5, 0.5)));
        assert!(!volume.contains_point(Vec3::new(1.0, 0.5, 0.5)));
    }
    #[test]
    fn transform_moves_corners_not_points() {
        let mut volume = BoundingVolume::from_extremes(Vec3::zero(), Vec3::one());
        volume.apply_transform(&Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(volume.corner(Corner::MinXMinYMinZ), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(volume.center(), Vec3::new(1.5, 0.5, 0.5)));
    }

    fn point() -> impl Strategy<Value = Vec3> {
        (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0)
            .prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn build_is_ordered_and_centered(points in prop::collection::vec(point(), 1..64)) {
            let volume = BoundingVolume::build(points.iter().copied()).unwrap();
            let min = volume.corner(Corner::MinXMinYMinZ);
            let max = volume.corner(Corner::MaxXMaxYMaxZ);
            prop_assert!(min.x <= max.x && min.y <= max.y && min.z <= max.z);

            let mean = volume.corners().iter().fold(Vec3::zero(), |s, c| s + *c) / 8.0;
            prop_assert!(close(volume.center(), mean));
            for p in &points {
                prop_assert!(volume.contains_point(*p));
            }
        }

        #[test]
        fn incremental_transforms_compose(
            points in prop::collection::vec(point(), 1..32),
            angle_a in -3.0f32..3.0,
            angle_b in -3.0f32..3.0,
            shift in point(),
            scale in 0.1f32..4.0,
        ) {
            let t1 = Mat4::from_translation(shift) * Mat4::from_rotation_y(angle_a);
            let t2 = Mat4::from_scale(scale) * Mat4::from_rotation_x(angle_b);

            let mut stepped = BoundingVolume::build(points.iter().copied()).unwrap();
            stepped.apply_transform(&t1);
            stepped.apply_transform(&t2);

            let mut once = BoundingVolume::build(points.iter().copied()).unwrap();
            once.apply_transform(&(t2 * t1));

            for (a, b) in stepped.corners().iter().zip(once.corners()) {
                // Relative tolerance, corners reach a few hundred units out.
                prop_assert!((*a - *b).mag() <= 1e-3 * (1.0 + b.mag()));
            }
        }
    }
}
