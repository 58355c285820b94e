//! Software thumbnail renderer. Strokes are flattened onto the projection plane, fit to the
//! image, and drawn as round-capped lines of their tube radius.

use skypaint_core::store::{ProjectionPlane, Thumbnailer};
use skypaint_core::stroke::StrokeRecord;
use ultraviolet::Vec2;

#[derive(Clone, Copy, Debug)]
pub struct PngThumbnailer {
    pub background: [u8; 4],
    /// Fraction of the edge left empty on each side.
    pub margin: f32,
}
impl Default for PngThumbnailer {
    fn default() -> Self {
        Self {
            background: [0, 0, 0, 255],
            margin: 0.05,
        }
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.mag_sq();
    let t = if len_sq > 0.0 {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).mag()
}

/// Straight-alpha source-over.
fn blend(dst: &mut image::Rgba<u8>, src: [f32; 4]) {
    let d = dst.0.map(|c| f32::from(c) / 255.0);
    let sa = src[3].clamp(0.0, 1.0);
    let out_a = sa + d[3] * (1.0 - sa);
    if out_a <= 0.0 {
        dst.0 = [0; 4];
        return;
    }
    let mut out = [0.0; 4];
    for c in 0..3 {
        out[c] = (src[c].clamp(0.0, 1.0) * sa + d[c] * d[3] * (1.0 - sa)) / out_a;
    }
    out[3] = out_a;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let out = out.map(|c| (c * 255.0).round() as u8);
    dst.0 = out;
}

/// Pixels covered by one stroke. Each is blended once, so overlapping segments of a
/// translucent stroke don't darken.
struct Coverage {
    size: u32,
    mask: Vec<bool>,
    touched: Vec<(u32, u32)>,
}
impl Coverage {
    fn new(size: u32) -> Self {
        Self {
            size,
            mask: vec![false; size as usize * size as usize],
            touched: Vec::new(),
        }
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn segment(&mut self, a: Vec2, b: Vec2, radius: f32) {
        let limit = self.size as f32;
        let lo = |v: f32| (v - radius).floor().clamp(0.0, limit) as u32;
        let hi = |v: f32| (v + radius).ceil().clamp(0.0, limit) as u32;
        for y in lo(a.y.min(b.y))..hi(a.y.max(b.y)) {
            for x in lo(a.x.min(b.x))..hi(a.x.max(b.x)) {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(center, a, b) > radius {
                    continue;
                }
                let index = y as usize * self.size as usize + x as usize;
                if !std::mem::replace(&mut self.mask[index], true) {
                    self.touched.push((x, y));
                }
            }
        }
    }
    fn flush(&mut self, image: &mut image::RgbaImage, color: [f32; 4]) {
        for (x, y) in self.touched.drain(..) {
            self.mask[y as usize * self.size as usize + x as usize] = false;
            blend(image.get_pixel_mut(x, y), color);
        }
    }
}

impl PngThumbnailer {
    #[must_use]
    pub fn rasterize(
        &self,
        records: &[StrokeRecord],
        plane: &ProjectionPlane,
        size: u32,
    ) -> image::RgbaImage {
        let mut image = image::RgbaImage::from_pixel(size, size, image::Rgba(self.background));
        let projected = plane.project_records(records);

        let bounds = projected
            .iter()
            .flatten()
            .fold(None::<(Vec2, Vec2)>, |bounds, p| {
                Some(match bounds {
                    None => (*p, *p),
                    Some((min, max)) => (min.min_by_component(*p), max.max_by_component(*p)),
                })
            });
        let Some((min, max)) = bounds else {
            return image;
        };
        let pad = records.iter().map(|r| r.max_radius).fold(0.0, f32::max);
        let min = min - Vec2::broadcast(pad);
        let max = max + Vec2::broadcast(pad);
        let extent = (max.x - min.x).max(max.y - min.y).max(f32::EPSILON);
        let edge = size as f32;
        let scale = edge * (1.0 - 2.0 * self.margin.clamp(0.0, 0.49)) / extent;
        let center = (min + max) * 0.5;
        // Image rows go down.
        let to_pixel = |p: Vec2| {
            let rel = (p - center) * scale;
            Vec2::new(0.5 * edge + rel.x, 0.5 * edge - rel.y)
        };

        let mut coverage = Coverage::new(size);
        for (record, points) in records.iter().zip(&projected) {
            let radius = (record.max_radius * scale).max(0.5);
            let pixels: Vec<Vec2> = points.iter().copied().map(to_pixel).collect();
            match pixels.as_slice() {
                [] => continue,
                [only] => coverage.segment(*only, *only, radius),
                _ => {
                    for pair in pixels.windows(2) {
                        coverage.segment(pair[0], pair[1], radius);
                    }
                }
            }
            coverage.flush(&mut image, record.color);
        }
        image
    }
}

impl Thumbnailer for PngThumbnailer {
    type Error = image::ImageError;
    fn render(
        &self,
        records: &[StrokeRecord],
        plane: &ProjectionPlane,
        size: u32,
    ) -> Result<Vec<u8>, Self::Error> {
        let image = self.rasterize(records, plane, size);
        let mut bytes = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}
