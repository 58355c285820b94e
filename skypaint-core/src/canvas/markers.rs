//! # Erase markers
//!
//! Strokes are erased whole. To find which stroke an eraser touched, a sparse trail of markers
//! is dropped along every finished stroke, each pointing back at its owner.

use smallvec::SmallVec;
use ultraviolet::Vec3;

use crate::scene::{Scene, VisualID};
use crate::stroke::{Stroke, StrokeID};

pub type MarkerID = crate::FuzzID<EraseMarker>;

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct EraseMarker {
    pub id: MarkerID,
    /// Stroke erased when this marker is hit.
    pub stroke: StrokeID,
    pub position: Vec3,
    /// Index of the stroke point the marker was placed at.
    pub point_index: usize,
}

#[derive(Copy, Clone, Debug)]
struct Placed {
    marker: EraseMarker,
    visual: VisualID,
}

#[derive(Default, Debug)]
pub struct MarkerSet {
    by_stroke: hashbrown::HashMap<StrokeID, SmallVec<[Placed; 8]>>,
    owners: hashbrown::HashMap<MarkerID, StrokeID>,
}
impl MarkerSet {
    /// Drop markers at every `stride`th point of `stroke`, starting at the first.
    /// Returns how many were placed.
    pub(crate) fn place_along(
        &mut self,
        stroke: &Stroke,
        stride: usize,
        scene: &mut impl Scene,
    ) -> usize {
        let stride = stride.max(1);
        let owner = stroke.id();
        let placed = self.by_stroke.entry(owner).or_default();
        let before = placed.len();
        for (point_index, position) in stroke.points().iter().enumerate().step_by(stride) {
            let marker = EraseMarker {
                id: MarkerID::default(),
                stroke: owner,
                position: *position,
                point_index,
            };
            let visual = scene.place_marker(&marker);
            self.owners.insert(marker.id, owner);
            placed.push(Placed { marker, visual });
        }
        placed.len() - before
    }
    /// Remove every marker of `stroke`, returning how many there were.
    pub(crate) fn remove_stroke(&mut self, stroke: StrokeID, scene: &mut impl Scene) -> usize {
        let Some(placed) = self.by_stroke.remove(&stroke) else {
            return 0;
        };
        for Placed { marker, visual } in &placed {
            self.owners.remove(&marker.id);
            scene.remove(*visual);
        }
        placed.len()
    }
    pub(crate) fn clear(&mut self, scene: &mut impl Scene) {
        for (_, placed) in self.by_stroke.drain() {
            for Placed { visual, .. } in placed {
                scene.remove(visual);
            }
        }
        self.owners.clear();
    }
    /// Which stroke a marker belongs to. `None` once that stroke is erased.
    #[must_use]
    pub fn owner(&self, marker: MarkerID) -> Option<StrokeID> {
        self.owners.get(&marker).copied()
    }
    pub fn for_stroke(&self, stroke: StrokeID) -> impl Iterator<Item = &EraseMarker> + '_ {
        self.by_stroke
            .get(&stroke)
            .into_iter()
            .flat_map(|placed| placed.iter().map(|p| &p.marker))
    }
    pub fn iter(&self) -> impl Iterator<Item = &EraseMarker> + '_ {
        self.by_stroke
            .values()
            .flat_map(|placed| placed.iter().map(|p| &p.marker))
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
    /// Owners of every marker within `reach` of `center`, each listed once.
    #[must_use]
    pub fn touching(&self, center: Vec3, reach: f32) -> Vec<StrokeID> {
        if !reach.is_finite() || reach < 0.0 {
            return Vec::new();
        }
        let reach_sq = reach * reach;
        self.by_stroke
            .iter()
            .filter(|(_, placed)| {
                placed
                    .iter()
                    .any(|p| (p.marker.position - center).mag_sq() <= reach_sq)
            })
            .map(|(owner, _)| *owner)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::Color;
    use crate::scene::{Headless, Parent};

    fn line(points: usize) -> Stroke {
        Stroke::with_points(
            StrokeID::new(),
            Color::WHITE,
            0.01,
            (0..points)
                .map(|i| Vec3::new(i as f32 * 0.01, 0.0, 0.0))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn every_fifth_point() {
        let mut scene = Headless::default();
        let mut markers = MarkerSet::default();
        let stroke = line(12);
        assert_eq!(markers.place_along(&stroke, 5, &mut scene), 3);

        let mut indices: Vec<_> = markers.for_stroke(stroke.id()).map(|m| m.point_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, [0, 5, 10]);
        assert!(markers.for_stroke(stroke.id()).all(|m| m.stroke == stroke.id()));
        assert_eq!(scene.live(Parent::Root), 3);
    }
    #[test]
    fn single_point_gets_one_marker() {
        let mut scene = Headless::default();
        let mut markers = MarkerSet::default();
        assert_eq!(markers.place_along(&line(1), 5, &mut scene), 1);
    }
    #[test]
    fn remove_clears_owners_and_visuals() {
        let mut scene = Headless::default();
        let mut markers = MarkerSet::default();
        let a = line(6);
        let b = line(3);
        markers.place_along(&a, 5, &mut scene);
        markers.place_along(&b, 5, &mut scene);
        let marker = markers.for_stroke(a.id()).next().unwrap().id;
        assert_eq!(markers.owner(marker), Some(a.id()));

        assert_eq!(markers.remove_stroke(a.id(), &mut scene), 2);
        assert_eq!(markers.owner(marker), None);
        assert_eq!(markers.len(), 1);
        assert_eq!(scene.live(Parent::Root), 1);
        assert_eq!(markers.remove_stroke(a.id(), &mut scene), 0);
    }
    #[test]
    fn touching_finds_owner_once() {
        let mut scene = Headless::default();
        let mut markers = MarkerSet::default();
        let stroke = line(11);
        markers.place_along(&stroke, 5, &mut scene);
        // Markers at x = 0.0, 0.05, 0.1. A wide probe covers all three.
        assert_eq!(markers.touching(Vec3::new(0.05, 0.0, 0.0), 1.0), [stroke.id()]);
        assert!(markers.touching(Vec3::new(0.025, 0.0, 0.0), 0.01).is_empty());
        // Squared, this would reach everything.
        assert!(markers.touching(Vec3::new(0.05, 0.0, 0.0), -1.0).is_empty());
        assert!(markers.touching(Vec3::new(0.05, 0.0, 0.0), f32::NAN).is_empty());
    }
}
