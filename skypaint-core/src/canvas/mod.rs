//! # Painting canvas
//!
//! The single owner of everything drawn. Three jobs:
//! * live capture of strokes from a stream of fingertip positions ([`capture`]),
//! * a staging area where a loaded drawing is moved around as one piece before being merged
//!   in or thrown away ([`staging`]),
//! * whole-stroke erasing via [`markers`].
//!
//! Every mutation takes `&mut self`. A host with several threads should put the canvas
//! behind a single mutex.

pub mod capture;
pub mod markers;
pub mod staging;

pub use capture::AddPointOutcome;
pub use markers::{EraseMarker, MarkerID, MarkerSet};
pub use staging::Staging;

use ultraviolet::Vec3;

use crate::color::Color;
use crate::scene::{ContainmentWall, Headless, Parent, Scene};
use crate::stroke::{Stroke, StrokeError, StrokeID, StrokeRecord, DEFAULT_RADIUS};

/// Tunables for capture, erasing, and the containment walls.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// A jump further than this between two samples is a tracking glitch, and ends the stroke.
    pub teleport_distance: f32,
    /// Samples closer than this to the previous point are dropped.
    pub duplicate_epsilon: f32,
    /// An erase marker is placed every this many points.
    pub marker_stride: usize,
    /// Hit radius of an erase marker.
    pub marker_radius: f32,
    /// Edge length of the containment box.
    pub containment_extent: f32,
    /// Thickness of each containment wall.
    pub containment_thickness: f32,
    /// How long the clear control must be held to wipe the canvas.
    pub clear_hold_ms: u64,
}
impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            teleport_distance: 0.1,
            duplicate_epsilon: 1E-9,
            marker_stride: 5,
            marker_radius: 0.01,
            containment_extent: 1E2,
            containment_thickness: 1E-2,
            clear_hold_ms: 1000,
        }
    }
}

/// What a new stroke is drawn with. Chosen by the palette, outside of the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolSettings {
    color: Color,
    radius: f32,
    eraser: bool,
}
impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            radius: DEFAULT_RADIUS,
            eraser: false,
        }
    }
}
impl ToolSettings {
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }
    #[must_use]
    pub fn eraser(&self) -> bool {
        self.eraser
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("a group is already staged, confirm or cancel it first")]
    AlreadyStaged,
    #[error("scale factor must be finite and positive, got {0}")]
    InvalidScale(f32),
    #[error(transparent)]
    Stroke(#[from] StrokeError),
}

/// Tracks a press on the "clear" control. Holding it long enough means "wipe everything".
#[derive(Clone, Copy, Debug)]
pub struct ClearHold {
    pressed_at: Option<std::time::Instant>,
    threshold: std::time::Duration,
}
impl ClearHold {
    #[must_use]
    pub fn new(threshold: std::time::Duration) -> Self {
        Self {
            pressed_at: None,
            threshold,
        }
    }
    pub fn press(&mut self, now: std::time::Instant) {
        self.pressed_at = Some(now);
    }
    /// True if the press started at least `threshold` ago. Consumes the press either way.
    pub fn release(&mut self, now: std::time::Instant) -> bool {
        self.pressed_at
            .take()
            .is_some_and(|at| now.saturating_duration_since(at) > self.threshold)
    }
}

pub struct PaintingCanvas<S: Scene = Headless> {
    config: CanvasConfig,
    tools: ToolSettings,
    scene: S,
    committed: Vec<Stroke>,
    capture: capture::Capture,
    staging: Option<Staging>,
    markers: MarkerSet,
}
impl Default for PaintingCanvas<Headless> {
    fn default() -> Self {
        Self::new(Headless::default(), CanvasConfig::default())
    }
}
impl<S: Scene> PaintingCanvas<S> {
    /// An empty canvas. The containment walls are installed into `scene` right away.
    pub fn new(scene: S, config: CanvasConfig) -> Self {
        let mut this = Self {
            config,
            tools: ToolSettings::default(),
            scene,
            committed: Vec::new(),
            capture: capture::Capture::default(),
            staging: None,
            markers: MarkerSet::default(),
        };
        this.install_containment();
        this
    }
    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }
    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }
    #[must_use]
    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }
    /// Color for strokes started from now on. The stroke in progress keeps its color.
    pub fn set_active_color(&mut self, color: Color) {
        self.tools.color = color;
    }
    /// Radius for strokes started from now on.
    pub fn set_active_radius(&mut self, radius: f32) -> Result<(), CanvasError> {
        if radius.is_finite() && radius > 0.0 {
            self.tools.radius = radius;
            Ok(())
        } else {
            Err(StrokeError::InvalidRadius(radius).into())
        }
    }
    pub fn set_eraser_mode(&mut self, eraser: bool) {
        self.tools.eraser = eraser;
    }
    /// Committed strokes, oldest first. Includes the stroke in progress.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.committed
    }
    #[must_use]
    pub fn stroke(&self, id: StrokeID) -> Option<&Stroke> {
        self.committed.iter().rfind(|stroke| stroke.id() == id)
    }
    fn stroke_index(&self, id: StrokeID) -> Option<usize> {
        self.committed.iter().rposition(|stroke| stroke.id() == id)
    }
    #[must_use]
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }
    /// Resolve a marker hit from an external collision test to the stroke it erases.
    #[must_use]
    pub fn marker_owner(&self, marker: MarkerID) -> Option<StrokeID> {
        self.markers.owner(marker)
    }
    /// Delete a committed stroke along with its markers. Returns false if no such stroke.
    pub fn erase_stroke(&mut self, id: StrokeID) -> bool {
        let Some(index) = self.stroke_index(id) else {
            return false;
        };
        let mut stroke = self.committed.remove(index);
        stroke.drop_visual(&mut self.scene);
        self.markers.remove_stroke(id, &mut self.scene);
        if self.capture.stroke == Some(id) {
            self.capture.stroke = None;
        }
        log::trace!("erased {id}");
        true
    }
    /// Erase every stroke with a marker inside a spherical probe. Does nothing unless the
    /// eraser is the active tool, or if `radius` is negative or not finite. Returns the
    /// erased strokes.
    pub fn probe_erase(&mut self, center: Vec3, radius: f32) -> Vec<StrokeID> {
        if !self.tools.eraser || !radius.is_finite() || radius < 0.0 {
            return Vec::new();
        }
        let touched = self
            .markers
            .touching(center, radius + self.config.marker_radius);
        touched
            .into_iter()
            .filter(|id| self.erase_stroke(*id))
            .collect()
    }
    /// Wipe the committed drawing. The staging area is left alone.
    pub fn reset(&mut self) {
        for stroke in &mut self.committed {
            stroke.drop_visual(&mut self.scene);
        }
        self.committed.clear();
        self.markers.clear(&mut self.scene);
        self.capture = capture::Capture::default();
        self.install_containment();
        log::debug!("canvas reset");
    }
    /// A hold tracker using the configured clear duration.
    #[must_use]
    pub fn clear_hold(&self) -> ClearHold {
        ClearHold::new(std::time::Duration::from_millis(self.config.clear_hold_ms))
    }
    /// Snapshot the committed drawing for saving, relative to `origin`.
    #[must_use]
    pub fn snapshot_records(&self, origin: Vec3) -> Vec<StrokeRecord> {
        self.committed
            .iter()
            .filter(|stroke| !stroke.points().is_empty())
            .map(|stroke| StrokeRecord::from_stroke(stroke, origin))
            .collect()
    }
    fn install_containment(&mut self) {
        let walls = ContainmentWall::enclosure(
            self.config.containment_extent,
            self.config.containment_thickness,
        );
        self.scene.install_containment(&walls);
    }
    /// Drop erase markers along a finished stroke.
    fn seal(&mut self, index: usize) {
        let stroke = &self.committed[index];
        let placed = self
            .markers
            .place_along(stroke, self.config.marker_stride, &mut self.scene);
        log::trace!("{} finished with {placed} markers", stroke.id());
    }
    /// Put a new stroke at the end of the drawing with its visual built.
    fn commit(&mut self, mut stroke: Stroke) -> usize {
        if self.stroke(stroke.id()).is_some() {
            let fresh = StrokeID::new();
            log::debug!("{} already drawn, committing as {fresh}", stroke.id());
            stroke.set_id(fresh);
        }
        stroke.rebuild_visual(&mut self.scene, Parent::Root);
        self.committed.push(stroke);
        self.committed.len() - 1
    }
}
