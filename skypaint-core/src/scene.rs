//! # Scene
//!
//! The canvas never meshes or draws anything itself. Everything visible - stroke tubes, erase
//! markers, the staging handle, the containment walls - is reported to a [`Scene`], which
//! owns the actual render objects. Handles handed back by the scene are opaque [`VisualID`]s.
//!
//! Staged strokes live under the staging anchor rather than the root, so moving the anchor
//! moves the whole group without touching each stroke.

use ultraviolet::{Mat4, Vec3};

use crate::canvas::markers::EraseMarker;
use crate::stroke::Stroke;

pub struct Visual;
pub type VisualID = crate::FuzzID<Visual>;

/// Which transform a visual is attached to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Parent {
    /// World space.
    Root,
    /// The staging anchor's local space. See [`Scene::set_anchor_transform`].
    Anchor,
}

/// A static box giving the drag gesture something to hit, anywhere in the usable volume.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ContainmentWall {
    pub center: Vec3,
    pub size: Vec3,
}
impl ContainmentWall {
    /// Six thin walls, `extent` apart, forming a box around the origin.
    #[must_use]
    pub fn enclosure(extent: f32, thickness: f32) -> [Self; 6] {
        let half = 0.5 * extent;
        let flat_z = Vec3::new(extent, extent, thickness);
        let flat_y = Vec3::new(extent, thickness, extent);
        let flat_x = Vec3::new(thickness, extent, extent);
        [
            Self { center: Vec3::new(0.0, 0.0, -half), size: flat_z },
            Self { center: Vec3::new(0.0, 0.0, half), size: flat_z },
            Self { center: Vec3::new(0.0, -half, 0.0), size: flat_y },
            Self { center: Vec3::new(0.0, half, 0.0), size: flat_y },
            Self { center: Vec3::new(-half, 0.0, 0.0), size: flat_x },
            Self { center: Vec3::new(half, 0.0, 0.0), size: flat_x },
        ]
    }
}

/// Grab target around a staged group, in the anchor's local space. Centered on the anchor.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct StagingHandle {
    pub half_extents: Vec3,
}

pub trait Scene {
    /// Build the visual for `stroke` under `parent`, replacing `previous` if given.
    fn build_stroke(&mut self, previous: Option<VisualID>, stroke: &Stroke, parent: Parent) -> VisualID;
    /// Place an (invisible) erase probe target.
    fn place_marker(&mut self, marker: &EraseMarker) -> VisualID;
    /// Remove a stroke or marker visual.
    fn remove(&mut self, visual: VisualID);
    /// The staging anchor moved. Everything parented to [`Parent::Anchor`] follows.
    fn set_anchor_transform(&mut self, transform: &Mat4);
    /// Show, resize, or (with `None`) hide the staging handle.
    fn set_staging_handle(&mut self, handle: Option<&StagingHandle>);
    /// (Re)install the static containment walls.
    fn install_containment(&mut self, walls: &[ContainmentWall; 6]);
}

/// A scene that renders nothing, only keeping track of what would be on screen.
#[derive(Default, Debug)]
pub struct Headless {
    live: hashbrown::HashMap<VisualID, Parent>,
    anchor: Option<Mat4>,
    handle: Option<StagingHandle>,
    containment_installs: usize,
    rebuilds: usize,
}
impl Headless {
    /// Number of visuals currently alive under `parent`.
    #[must_use]
    pub fn live(&self, parent: Parent) -> usize {
        self.live.values().filter(|p| **p == parent).count()
    }
    #[must_use]
    pub fn contains(&self, visual: VisualID) -> bool {
        self.live.contains_key(&visual)
    }
    #[must_use]
    pub fn anchor(&self) -> Option<Mat4> {
        self.anchor
    }
    #[must_use]
    pub fn handle(&self) -> Option<StagingHandle> {
        self.handle
    }
    /// How many times the containment walls were installed.
    #[must_use]
    pub fn containment_installs(&self) -> usize {
        self.containment_installs
    }
    /// How many stroke visuals were built in total.
    #[must_use]
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }
}
impl Scene for Headless {
    fn build_stroke(&mut self, previous: Option<VisualID>, _: &Stroke, parent: Parent) -> VisualID {
        self.rebuilds += 1;
        // Rebuilding in place keeps the handle.
        let id = previous.unwrap_or_default();
        self.live.insert(id, parent);
        id
    }
    fn place_marker(&mut self, _: &EraseMarker) -> VisualID {
        let id = VisualID::default();
        self.live.insert(id, Parent::Root);
        id
    }
    fn remove(&mut self, visual: VisualID) {
        if self.live.remove(&visual).is_none() {
            log::debug!("removing unknown visual {visual}");
        }
    }
    fn set_anchor_transform(&mut self, transform: &Mat4) {
        self.anchor = Some(*transform);
    }
    fn set_staging_handle(&mut self, handle: Option<&StagingHandle>) {
        self.handle = handle.copied();
    }
    fn install_containment(&mut self, _: &[ContainmentWall; 6]) {
        self.containment_installs += 1;
    }
}
