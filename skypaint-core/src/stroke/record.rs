//! # Stroke records
//!
//! The on-disk form of a stroke. Points are stored relative to a reference origin chosen by the
//! caller, so a saved drawing can be loaded back somewhere else.
//!
//! Colors have been written two ways over time. Records now carry an explicit `colorEncoding`,
//! and are always written as RGBA. Without it, the older convention is assumed: a record with a
//! `maxRadius` stored its color as hue/saturation/brightness/alpha, one without stored RGBA.
//! That rule is inferred from the files seen in the wild, not something the old writers promised.

use ultraviolet::Vec3;

use super::{Stroke, StrokeError, StrokeID, DEFAULT_RADIUS};
use crate::color::Color;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorEncoding {
    Rgba,
    Hsba,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("color must have exactly 4 components, found {0}")]
    ColorArity(usize),
    #[error("color is not finite")]
    NonFiniteColor,
}

/// A stroke as stored. Built with [`StrokeRecord::from_stroke`], turned back into a
/// stroke with [`StrokeRecord::to_stroke`].
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawRecord", rename_all = "camelCase")]
pub struct StrokeRecord {
    pub points: Vec<[f32; 3]>,
    /// Always straight RGBA in memory, whatever the file said.
    pub color: [f32; 4],
    pub max_radius: f32,
    pub color_encoding: ColorEncoding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StrokeID>,
}

/// Everything a record may or may not contain, before the color is sorted out.
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    points: Vec<[f32; 3]>,
    color: Vec<f32>,
    max_radius: Option<f32>,
    color_encoding: Option<ColorEncoding>,
    id: Option<StrokeID>,
}

impl TryFrom<RawRecord> for StrokeRecord {
    type Error = RecordError;
    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let components: [f32; 4] = raw
            .color
            .as_slice()
            .try_into()
            .map_err(|_| RecordError::ColorArity(raw.color.len()))?;

        let encoding = raw.color_encoding.unwrap_or(if raw.max_radius.is_some() {
            ColorEncoding::Hsba
        } else {
            ColorEncoding::Rgba
        });
        let color = match encoding {
            ColorEncoding::Rgba => Color::from_rgba(components),
            ColorEncoding::Hsba => Color::from_hsba(components),
        }
        .map_err(|_| RecordError::NonFiniteColor)?;

        Ok(Self {
            points: raw.points,
            color: color.as_array(),
            max_radius: raw.max_radius.unwrap_or(DEFAULT_RADIUS),
            color_encoding: ColorEncoding::Rgba,
            id: raw.id,
        })
    }
}

impl StrokeRecord {
    /// Snapshot a stroke, storing its points relative to `origin`.
    #[must_use]
    pub fn from_stroke(stroke: &Stroke, origin: Vec3) -> Self {
        Self {
            points: stroke
                .points()
                .iter()
                .map(|p| {
                    let rel = *p - origin;
                    [rel.x, rel.y, rel.z]
                })
                .collect(),
            color: stroke.color().as_array(),
            max_radius: stroke.radius(),
            color_encoding: ColorEncoding::Rgba,
            id: Some(stroke.id()),
        }
    }
    /// Rebuild a stroke placed relative to `origin`. Records without an id get a fresh one.
    pub fn to_stroke(&self, origin: Vec3) -> Result<Stroke, StrokeError> {
        let color = Color::from_rgba(self.color).map_err(|_| StrokeError::NonFiniteColor)?;
        let points = self
            .points
            .iter()
            .map(|p| Vec3::from(*p) + origin)
            .collect();
        Stroke::with_points(
            self.id.unwrap_or_default(),
            color,
            self.max_radius,
            points,
        )
    }
}

/// Encode a batch of records, in order.
pub fn encode(records: &[StrokeRecord]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(records)
}

/// Decode a batch of records. Any malformed record fails the whole batch.
pub fn decode(bytes: &[u8]) -> Result<Vec<StrokeRecord>, serde_json::Error> {
    serde_json::from_slice(bytes)
}
