//! # Live capture
//!
//! Turns a stream of tracked fingertip positions into strokes. Samples from hand tracking are
//! noisy: the very first one after a gesture starts is often stale, and the tracker sometimes
//! loses the hand and reports it somewhere far away. So:
//! * The first sample of a gesture only primes the cursor, it is never drawn.
//! * A sample further than [`CanvasConfig::teleport_distance`](super::CanvasConfig) from the
//!   previous one ends the stroke in progress. What was drawn so far stays.
//! * A sample on top of the previous point is dropped.

use ultraviolet::Vec3;

use super::{PaintingCanvas, Scene};
use crate::color::Color;
use crate::scene::Parent;
use crate::stroke::{Stroke, StrokeID};

/// What [`PaintingCanvas::add_point`] did with a sample.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AddPointOutcome {
    /// First sample of a gesture, used only to prime the cursor.
    Primed,
    /// Too far from the last sample. Any stroke in progress was ended.
    Teleported,
    /// Same as the stroke's last point.
    Duplicate,
    /// A new stroke was started with this sample as its first point.
    Started(StrokeID),
    Appended(StrokeID),
    /// Position was not finite.
    Rejected,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct Capture {
    /// Stroke being drawn, if any. It is already part of the committed list.
    pub(super) stroke: Option<StrokeID>,
    pub(super) current_position: Vec3,
    /// Next sample only primes `current_position`.
    pub(super) discard_next: bool,
    /// Between [`PaintingCanvas::begin_if_needed`] and [`PaintingCanvas::finish_stroke`].
    pub(super) engaged: bool,
}
impl Default for Capture {
    fn default() -> Self {
        Self {
            stroke: None,
            current_position: Vec3::zero(),
            discard_next: true,
            engaged: false,
        }
    }
}

impl<S: Scene> PaintingCanvas<S> {
    /// Call whenever a drag gesture reports movement, before [`Self::add_point`]. Only the
    /// first call of a gesture does anything: it arms the first-sample discard.
    pub fn begin_if_needed(&mut self) {
        if !self.capture.engaged {
            self.capture.engaged = true;
            self.capture.discard_next = true;
        }
    }
    /// The stroke being drawn, if any.
    #[must_use]
    pub fn in_progress(&self) -> Option<&Stroke> {
        self.capture.stroke.and_then(|id| self.stroke(id))
    }
    /// Feed one fingertip sample. `id` names the stroke should this sample start one.
    pub fn add_point(&mut self, id: StrokeID, position: Vec3) -> AddPointOutcome {
        if !crate::util::is_finite_point(position) {
            log::trace!("dropping non-finite sample");
            return AddPointOutcome::Rejected;
        }
        if std::mem::take(&mut self.capture.discard_next) {
            self.capture.engaged = true;
            self.capture.current_position = position;
            return AddPointOutcome::Primed;
        }

        let jump = (position - self.capture.current_position).mag();
        self.capture.current_position = position;
        if jump > self.config.teleport_distance {
            if let Some(aborted) = self.capture.stroke.take() {
                log::debug!("{aborted} ended by a {jump} jump");
                if let Some(index) = self.stroke_index(aborted) {
                    self.seal(index);
                }
            }
            return AddPointOutcome::Teleported;
        }

        let (index, started) = match self.capture.stroke.and_then(|id| self.stroke_index(id)) {
            Some(index) => (index, false),
            None => {
                let stroke = match Stroke::new(id, self.tools.color, self.tools.radius) {
                    Ok(stroke) => stroke,
                    Err(err) => {
                        log::warn!("can't start a stroke: {err}");
                        return AddPointOutcome::Rejected;
                    }
                };
                let index = self.commit(stroke);
                self.capture.stroke = Some(self.committed[index].id());
                (index, true)
            }
        };

        let stroke = &mut self.committed[index];
        if let Some(last) = stroke.last_point() {
            if (position - last).mag() < self.config.duplicate_epsilon {
                return AddPointOutcome::Duplicate;
            }
        }
        stroke.push_point(position);
        stroke.rebuild_visual(&mut self.scene, Parent::Root);
        if started {
            AddPointOutcome::Started(stroke.id())
        } else {
            AddPointOutcome::Appended(stroke.id())
        }
    }
    /// Give the stroke in progress a new color. Returns false if nothing is being drawn.
    pub fn recolor_in_progress(&mut self, color: Color) -> bool {
        let Some(index) = self.capture.stroke.and_then(|id| self.stroke_index(id)) else {
            return false;
        };
        let stroke = &mut self.committed[index];
        stroke.set_color(color);
        stroke.rebuild_visual(&mut self.scene, Parent::Root);
        true
    }
    /// End the gesture, and the stroke in progress with it, placing its erase markers.
    /// Returns the finished stroke, or `None` if nothing was being drawn.
    pub fn finish_stroke(&mut self) -> Option<StrokeID> {
        self.capture.engaged = false;
        let id = self.capture.stroke.take()?;
        let index = self.stroke_index(id)?;
        self.committed[index].rebuild_visual(&mut self.scene, Parent::Root);
        self.seal(index);
        Some(id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_sample_only_primes() {
        let mut canvas = PaintingCanvas::default();
        let id = StrokeID::new();
        assert_eq!(canvas.add_point(id, Vec3::zero()), AddPointOutcome::Primed);
        assert!(canvas.strokes().is_empty());
        assert_eq!(
            canvas.add_point(id, Vec3::new(0.01, 0.0, 0.0)),
            AddPointOutcome::Started(id)
        );
        assert_eq!(canvas.strokes()[0].points(), [Vec3::new(0.01, 0.0, 0.0)]);
    }
    #[test]
    fn teleport_sequence() {
        let mut canvas = PaintingCanvas::default();
        let id = StrokeID::new();
        canvas.begin_if_needed();
        let p0 = Vec3::zero();
        let p1 = Vec3::new(0.05, 0.0, 0.0);
        let p2 = Vec3::new(0.5, 0.0, 0.0);
        assert_eq!(canvas.add_point(id, p0), AddPointOutcome::Primed);
        assert_eq!(canvas.add_point(id, p1), AddPointOutcome::Started(id));
        assert_eq!(canvas.add_point(id, p2), AddPointOutcome::Teleported);

        assert_eq!(canvas.strokes().len(), 1);
        assert_eq!(canvas.strokes()[0].points(), [p1]);
        assert!(canvas.in_progress().is_none());
        // The aborted stroke is still erasable.
        assert_eq!(canvas.markers().for_stroke(id).count(), 1);

        // Capture continues from the teleported position, as a new stroke.
        let next = canvas.add_point(id, Vec3::new(0.51, 0.0, 0.0));
        let AddPointOutcome::Started(second) = next else {
            panic!("expected a new stroke, got {next:?}");
        };
        // The requested id is already taken by the aborted stroke.
        assert_ne!(second, id);
        assert_eq!(canvas.strokes().len(), 2);
    }
    #[test]
    fn teleport_before_any_stroke() {
        let mut canvas = PaintingCanvas::default();
        let id = StrokeID::new();
        canvas.begin_if_needed();
        assert_eq!(canvas.add_point(id, Vec3::zero()), AddPointOutcome::Primed);
        assert_eq!(
            canvas.add_point(id, Vec3::new(0.2, 0.0, 0.0)),
            AddPointOutcome::Teleported
        );
        assert!(canvas.strokes().is_empty());
        assert!(canvas.markers().is_empty());
        assert_eq!(
            canvas.add_point(id, Vec3::new(0.25, 0.0, 0.0)),
            AddPointOutcome::Started(id)
        );
        assert_eq!(canvas.strokes()[0].points(), [Vec3::new(0.25, 0.0, 0.0)]);
    }
    #[test]
    fn begin_every_sample_after_teleport() {
        let mut canvas = PaintingCanvas::default();
        let samples = [0.0, 0.01, 0.5, 0.51, 0.52].map(|x| Vec3::new(x, 0.0, 0.0));
        let outcomes: Vec<_> = samples
            .iter()
            .map(|p| {
                canvas.begin_if_needed();
                canvas.add_point(StrokeID::new(), *p)
            })
            .collect();
        assert_eq!(outcomes[0], AddPointOutcome::Primed);
        assert!(matches!(outcomes[1], AddPointOutcome::Started(_)));
        assert_eq!(outcomes[2], AddPointOutcome::Teleported);
        // Still the same gesture, so drawing resumes without another priming sample.
        assert!(matches!(outcomes[3], AddPointOutcome::Started(_)));
        assert!(matches!(outcomes[4], AddPointOutcome::Appended(_)));
        assert_eq!(canvas.strokes().len(), 2);
    }
    #[test]
    fn duplicates_dropped() {
        let mut canvas = PaintingCanvas::default();
        let id = StrokeID::new();
        canvas.add_point(id, Vec3::zero());
        canvas.add_point(id, Vec3::one() * 0.01);
        assert_eq!(canvas.add_point(id, Vec3::one() * 0.01), AddPointOutcome::Duplicate);
        assert_eq!(canvas.strokes()[0].points().len(), 1);
        assert_eq!(
            canvas.add_point(id, Vec3::one() * 0.02),
            AddPointOutcome::Appended(id)
        );
    }
    #[test]
    fn begin_rearms_only_when_idle() {
        let mut canvas = PaintingCanvas::default();
        let id = StrokeID::new();
        canvas.add_point(id, Vec3::zero());
        canvas.add_point(id, Vec3::new(0.01, 0.0, 0.0));
        // Mid-stroke, a new gesture callback must not swallow a sample.
        canvas.begin_if_needed();
        assert_eq!(
            canvas.add_point(id, Vec3::new(0.02, 0.0, 0.0)),
            AddPointOutcome::Appended(id)
        );
        assert_eq!(canvas.finish_stroke(), Some(id));

        canvas.begin_if_needed();
        assert_eq!(
            canvas.add_point(StrokeID::new(), Vec3::new(0.03, 0.0, 0.0)),
            AddPointOutcome::Primed
        );
    }
    #[test]
    fn finish_places_markers() {
        let mut canvas = PaintingCanvas::default();
        let id = StrokeID::new();
        canvas.add_point(id, Vec3::zero());
        for i in 0..12 {
            canvas.add_point(id, Vec3::new(i as f32 * 0.01, 0.0, 0.0));
        }
        // Nothing is erasable mid-stroke.
        assert!(canvas.markers().is_empty());
        assert_eq!(canvas.finish_stroke(), Some(id));
        let mut indices: Vec<_> = canvas.markers().for_stroke(id).map(|m| m.point_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, [0, 5, 10]);
        assert_eq!(canvas.finish_stroke(), None);
    }
    #[test]
    fn new_strokes_use_active_tools() {
        let mut canvas = PaintingCanvas::default();
        let red = Color::new(1.0, 0.0, 0.0, 1.0).unwrap();
        canvas.set_active_color(red);
        canvas.set_active_radius(0.05).unwrap();
        let id = StrokeID::new();
        canvas.add_point(id, Vec3::zero());
        canvas.add_point(id, Vec3::zero());
        // Changing tools mid-stroke leaves the stroke alone.
        canvas.set_active_color(Color::WHITE);
        canvas.add_point(id, Vec3::new(0.01, 0.0, 0.0));
        let stroke = canvas.in_progress().unwrap();
        assert_eq!(stroke.color(), red);
        assert_eq!(stroke.radius(), 0.05);
        assert_eq!(stroke.points().len(), 2);
    }
    #[test]
    fn recolor_in_progress_rebuilds() {
        let mut canvas = PaintingCanvas::default();
        let red = Color::new(1.0, 0.0, 0.0, 1.0).unwrap();
        assert!(!canvas.recolor_in_progress(red));

        let id = StrokeID::new();
        canvas.add_point(id, Vec3::zero());
        canvas.add_point(id, Vec3::zero());
        let rebuilds = canvas.scene().rebuilds();
        assert!(canvas.recolor_in_progress(red));
        assert_eq!(canvas.scene().rebuilds(), rebuilds + 1);
        assert_eq!(canvas.in_progress().unwrap().color(), red);
        assert!(!canvas.in_progress().unwrap().is_dirty());
        // Later strokes still use the active color.
        assert_eq!(canvas.tools().color(), Color::WHITE);

        canvas.finish_stroke();
        assert!(!canvas.recolor_in_progress(Color::WHITE));
        assert_eq!(canvas.stroke(id).unwrap().color(), red);
    }
    #[test]
    fn finish_forces_rebuild() {
        let mut canvas = PaintingCanvas::default();
        let id = StrokeID::new();
        canvas.add_point(id, Vec3::zero());
        canvas.add_point(id, Vec3::zero());
        let rebuilds = canvas.scene().rebuilds();
        assert_eq!(canvas.finish_stroke(), Some(id));
        assert_eq!(canvas.scene().rebuilds(), rebuilds + 1);
    }
    #[test]
    fn non_finite_rejected() {
        let mut canvas = PaintingCanvas::default();
        let id = StrokeID::new();
        assert_eq!(
            canvas.add_point(id, Vec3::new(f32::NAN, 0.0, 0.0)),
            AddPointOutcome::Rejected
        );
        // The discard is still armed.
        assert_eq!(canvas.add_point(id, Vec3::zero()), AddPointOutcome::Primed);
    }
    #[test]
    fn erasing_in_progress_stops_capture() {
        let mut canvas = PaintingCanvas::default();
        let id = StrokeID::new();
        canvas.add_point(id, Vec3::zero());
        canvas.add_point(id, Vec3::zero());
        assert!(canvas.erase_stroke(id));
        assert!(canvas.in_progress().is_none());
        assert_eq!(canvas.finish_stroke(), None);
    }
}
