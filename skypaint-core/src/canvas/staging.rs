//! # Staging
//!
//! A loaded drawing is not merged straight into the canvas. It is copied into a staging area
//! first, where it can be moved, rotated and scaled as a single group, then either confirmed
//! (baked into the committed drawing) or cancelled.
//!
//! Staged points are stored relative to the group's initial center. All movement happens on
//! a single anchor transform, so a drag costs one matrix multiply instead of touching every
//! point. The bounding volume is carried along for hit testing the group.

use ultraviolet::{Mat4, Vec3};

use super::{CanvasError, PaintingCanvas, Scene};
use crate::bounds::BoundingVolume;
use crate::scene::{Parent, StagingHandle};
use crate::stroke::{Stroke, StrokeID, StrokeRecord};
use crate::util::transform_point;

#[derive(Debug)]
pub struct Staging {
    /// Points in anchor-local space.
    strokes: Vec<Stroke>,
    /// World-space volume, transformed alongside the anchor.
    volume: BoundingVolume,
    anchor: Mat4,
    /// World-space center at staging time. Local points are relative to this.
    offset: Vec3,
    /// Absolute scale last set by [`PaintingCanvas::apply_group_rescale`].
    scale: f32,
}
impl Staging {
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }
    #[must_use]
    pub fn volume(&self) -> &BoundingVolume {
        &self.volume
    }
    #[must_use]
    pub fn anchor(&self) -> Mat4 {
        self.anchor
    }
    #[must_use]
    pub fn offset(&self) -> Vec3 {
        self.offset
    }
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

impl<S: Scene> PaintingCanvas<S> {
    /// Copy `strokes` into the staging area. Returns `Ok(false)` if there was nothing with any
    /// points to stage.
    ///
    /// Strokes whose id is already drawn, or repeated within `strokes`, are given a fresh id.
    pub fn stage_strokes(&mut self, strokes: &[Stroke]) -> Result<bool, CanvasError> {
        if self.staging.is_some() {
            return Err(CanvasError::AlreadyStaged);
        }
        let mut copies: Vec<Stroke> = strokes
            .iter()
            .filter(|stroke| !stroke.points().is_empty())
            .map(Stroke::deep_copy)
            .collect();
        if copies.len() != strokes.len() {
            log::debug!("skipping {} empty strokes", strokes.len() - copies.len());
        }
        let Some(volume) =
            BoundingVolume::build(copies.iter().flat_map(|s| s.points().iter().copied()))
        else {
            return Ok(false);
        };

        let mut seen = hashbrown::HashSet::with_capacity(copies.len());
        for copy in &mut copies {
            if self.stroke(copy.id()).is_some() || !seen.insert(copy.id()) {
                let fresh = StrokeID::new();
                log::debug!("{} already present, staging as {fresh}", copy.id());
                copy.set_id(fresh);
                seen.insert(fresh);
            }
        }

        let offset = volume.center();
        let anchor = Mat4::from_translation(offset);
        self.scene.set_anchor_transform(&anchor);
        for copy in &mut copies {
            let local = copy.points().iter().map(|p| *p - offset).collect();
            copy.replace_points(local)?;
            copy.rebuild_visual(&mut self.scene, Parent::Anchor);
        }
        let handle = StagingHandle {
            half_extents: volume.size() * 0.5,
        };
        self.scene.set_staging_handle(Some(&handle));

        log::debug!("staged {} strokes around {offset:?}", copies.len());
        self.staging = Some(Staging {
            strokes: copies,
            volume,
            anchor,
            offset,
            scale: 1.0,
        });
        Ok(true)
    }
    /// Decode `records` relative to `origin` and stage the result.
    pub fn stage_records(
        &mut self,
        records: &[StrokeRecord],
        origin: Vec3,
    ) -> Result<bool, CanvasError> {
        if self.staging.is_some() {
            return Err(CanvasError::AlreadyStaged);
        }
        let strokes = records
            .iter()
            .map(|record| record.to_stroke(origin))
            .collect::<Result<Vec<_>, _>>()?;
        self.stage_strokes(&strokes)
    }
    #[must_use]
    pub fn is_staged(&self) -> bool {
        self.staging.is_some()
    }
    #[must_use]
    pub fn staging(&self) -> Option<&Staging> {
        self.staging.as_ref()
    }
    /// Staged strokes, in anchor-local space. Empty when nothing is staged.
    #[must_use]
    pub fn staged_strokes(&self) -> &[Stroke] {
        self.staging
            .as_ref()
            .map(|s| s.strokes.as_slice())
            .unwrap_or_default()
    }
    #[must_use]
    pub fn staging_volume(&self) -> Option<&BoundingVolume> {
        self.staging.as_ref().map(|s| &s.volume)
    }
    /// The anchor transform, or identity when nothing is staged.
    #[must_use]
    pub fn staging_transform(&self) -> Mat4 {
        self.staging.as_ref().map_or_else(Mat4::identity, |s| s.anchor)
    }
    #[must_use]
    pub fn staging_offset(&self) -> Option<Vec3> {
        self.staging.as_ref().map(|s| s.offset)
    }
    /// Whether `point` lies in the staged group's bounds.
    #[must_use]
    pub fn is_point_in_staging(&self, point: Vec3) -> bool {
        self.staging
            .as_ref()
            .is_some_and(|s| s.volume.contains_point(point))
    }
    /// Move the staged group by a world-space `matrix`, applied after the current transform.
    /// Returns false if nothing is staged.
    pub fn apply_group_transform(&mut self, matrix: &Mat4) -> bool {
        let Some(staging) = self.staging.as_mut() else {
            return false;
        };
        staging.anchor = *matrix * staging.anchor;
        staging.volume.apply_transform(matrix);
        self.scene.set_anchor_transform(&staging.anchor);
        true
    }
    /// As [`Self::apply_group_transform`], but with `matrix` acting about the group's current
    /// center rather than the world origin.
    pub fn apply_group_transform_about_center(&mut self, matrix: &Mat4) -> bool {
        let Some(center) = self.staging.as_ref().map(|s| s.volume.center()) else {
            return false;
        };
        let about = Mat4::from_translation(center) * *matrix * Mat4::from_translation(-center);
        self.apply_group_transform(&about)
    }
    /// Scale the staged group about its center to `factor` times its staged size. Each
    /// stroke's radius becomes its original radius times `factor`.
    pub fn apply_group_rescale(&mut self, factor: f32) -> Result<bool, CanvasError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(CanvasError::InvalidScale(factor));
        }
        let Some(staging) = self.staging.as_ref() else {
            return Ok(false);
        };
        if staging.strokes.iter().any(|s| {
            let radius = s.original_radius() * factor;
            !radius.is_finite() || radius <= 0.0
        }) {
            return Err(CanvasError::InvalidScale(factor));
        }
        let ratio = factor / staging.scale;
        self.apply_group_transform_about_center(&Mat4::from_scale(ratio));

        let Some(staging) = self.staging.as_mut() else {
            return Ok(false);
        };
        staging.scale = factor;
        for stroke in &mut staging.strokes {
            stroke.scale_radius(factor)?;
            stroke.rebuild_visual(&mut self.scene, Parent::Anchor);
        }
        Ok(true)
    }
    /// Bake the staged group into the drawing at its current placement. Returns how many
    /// strokes were committed, zero if nothing was staged.
    pub fn confirm_staging(&mut self) -> usize {
        let Some(staging) = self.staging.take() else {
            return 0;
        };
        let mut confirmed = 0;
        for mut staged in staging.strokes {
            staged.drop_visual(&mut self.scene);
            let world = staged
                .points()
                .iter()
                .map(|p| transform_point(&staging.anchor, *p))
                .collect();
            match Stroke::with_points(staged.id(), staged.color(), staged.radius(), world) {
                Ok(baked) => {
                    let index = self.commit(baked);
                    self.seal(index);
                    confirmed += 1;
                }
                Err(err) => log::warn!("dropping staged {}: {err}", staged.id()),
            }
        }
        self.scene.set_staging_handle(None);
        self.scene.set_anchor_transform(&Mat4::identity());
        log::debug!("confirmed {confirmed} staged strokes");
        confirmed
    }
    /// Throw away the staged group. Returns false if nothing was staged.
    pub fn cancel_staging(&mut self) -> bool {
        let Some(staging) = self.staging.take() else {
            return false;
        };
        for mut staged in staging.strokes {
            staged.drop_visual(&mut self.scene);
        }
        self.scene.set_staging_handle(None);
        self.scene.set_anchor_transform(&Mat4::identity());
        true
    }
}
