//! # Stroke store
//!
//! Saved drawings, one record per save. A record is a small directory-like bundle named after
//! when it was saved, holding [`STROKES_FILE`] (the encoded strokes) and [`THUMBNAIL_FILE`]
//! (a PNG preview). Where the bundles actually live is up to a [`RecordStorage`].

pub mod fs;
pub mod memory;
pub mod projection;

pub use fs::FsStorage;
pub use memory::MemoryStorage;
pub use projection::ProjectionPlane;

use crate::stroke::{record, StrokeRecord};

pub const STROKES_FILE: &str = "strokes.json";
pub const THUMBNAIL_FILE: &str = "thumbnail.png";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed strokes: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode strokes: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("no save named {0}")]
    NotFound(SaveName),
    #[error("thumbnail: {0}")]
    Thumbnail(String),
    #[error("{0:?} is not a valid save name")]
    InvalidName(String),
}

/// Name of one save. Made from the local time of saving, so names sort chronologically.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SaveName(String);
impl SaveName {
    pub const FORMAT: &'static str = "%Y-%m-%d_%H-%M-%S";
    #[must_use]
    pub fn at<Tz: chrono::TimeZone>(time: &chrono::DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self(time.format(Self::FORMAT).to_string())
    }
    #[must_use]
    pub fn now() -> Self {
        Self::at(&chrono::Local::now())
    }
    /// Disambiguate a name taken earlier in the same second.
    #[must_use]
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}-{n}", self.0))
    }
    /// Accepts any name that's usable as a single path component.
    pub fn parse(name: &str) -> Result<Self, StoreError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\', '\0'])
            && name.len() <= 255;
        if valid {
            Ok(Self(name.to_owned()))
        } else {
            Err(StoreError::InvalidName(name.to_owned()))
        }
    }
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl std::fmt::Display for SaveName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
impl std::str::FromStr for SaveName {
    type Err = StoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Where record bundles are kept. Implementations use interior mutability so a store can
/// be shared.
pub trait RecordStorage {
    /// Every record, in no particular order.
    fn list(&self) -> Result<Vec<SaveName>, StoreError>;
    /// Make a new, empty record. Fails if it already exists.
    fn create(&self, name: &SaveName) -> Result<(), StoreError>;
    /// Write one file into an existing record, replacing it if present.
    fn put(&self, name: &SaveName, file: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn get(&self, name: &SaveName, file: &str) -> Result<Vec<u8>, StoreError>;
    /// Remove a record and everything in it.
    fn remove(&self, name: &SaveName) -> Result<(), StoreError>;
}

/// Renders the preview image stored next to each save.
pub trait Thumbnailer {
    type Error: std::fmt::Display;
    /// Encode a square PNG `size` pixels on a side, of `records` flattened onto `plane`.
    fn render(
        &self,
        records: &[StrokeRecord],
        plane: &ProjectionPlane,
        size: u32,
    ) -> Result<Vec<u8>, Self::Error>;
}

pub struct StrokeStore<B: RecordStorage, T: Thumbnailer> {
    storage: B,
    thumbnailer: T,
    /// Logical thumbnail edge, before display scaling.
    thumbnail_size: u32,
}
impl<B: RecordStorage, T: Thumbnailer> StrokeStore<B, T> {
    pub fn new(storage: B, thumbnailer: T, thumbnail_size: u32) -> Self {
        Self {
            storage,
            thumbnailer,
            thumbnail_size,
        }
    }
    pub fn storage(&self) -> &B {
        &self.storage
    }
    /// Thumbnail edge in pixels at the given display scale. Never zero.
    #[must_use]
    pub fn thumbnail_pixels(&self, display_scale: f32) -> u32 {
        let scale = if display_scale.is_finite() && display_scale > 0.0 {
            display_scale
        } else {
            1.0
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pixels = (self.thumbnail_size as f32 * scale).round() as u32;
        pixels.max(1)
    }
    /// Every save, newest first.
    pub fn list_dirs(&self) -> Result<Vec<SaveName>, StoreError> {
        let mut names = self
            .storage
            .list()
            .inspect_err(|err| log::warn!("listing saves failed: {err}"))?;
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }
    pub fn read_strokes(&self, name: &SaveName) -> Result<Vec<StrokeRecord>, StoreError> {
        let bytes = self.storage.get(name, STROKES_FILE)?;
        record::decode(&bytes)
            .map_err(StoreError::Decode)
            .inspect_err(|err| log::warn!("reading {name}: {err}"))
    }
    /// The stored PNG, undecoded.
    pub fn read_image(&self, name: &SaveName) -> Result<Vec<u8>, StoreError> {
        self.storage
            .get(name, THUMBNAIL_FILE)
            .inspect_err(|err| log::warn!("reading thumbnail of {name}: {err}"))
    }
    /// Save `records` with a preview under a name made from the current time.
    pub fn write(
        &self,
        records: &[StrokeRecord],
        plane: &ProjectionPlane,
        display_scale: f32,
    ) -> Result<SaveName, StoreError> {
        self.write_as(SaveName::now(), records, plane, display_scale)
    }
    /// As [`Self::write`], with an explicit base name. `-N` is appended if it's taken.
    ///
    /// Nothing is left behind on failure.
    pub fn write_as(
        &self,
        base: SaveName,
        records: &[StrokeRecord],
        plane: &ProjectionPlane,
        display_scale: f32,
    ) -> Result<SaveName, StoreError> {
        let json = record::encode(records).map_err(StoreError::Encode)?;
        let png = self
            .thumbnailer
            .render(records, plane, self.thumbnail_pixels(display_scale))
            .map_err(|err| StoreError::Thumbnail(err.to_string()))?;

        let name = self.free_name(base)?;
        self.storage.create(&name)?;
        let written = self
            .storage
            .put(&name, STROKES_FILE, &json)
            .and_then(|()| self.storage.put(&name, THUMBNAIL_FILE, &png));
        if let Err(err) = written {
            log::warn!("writing {name} failed, removing it: {err}");
            if let Err(cleanup) = self.storage.remove(&name) {
                log::warn!("cleaning up {name} failed: {cleanup}");
            }
            return Err(err);
        }
        log::info!("saved {} strokes as {name}", records.len());
        Ok(name)
    }
    pub fn delete(&self, name: &SaveName) -> Result<(), StoreError> {
        self.storage
            .remove(name)
            .inspect_err(|err| log::warn!("deleting {name}: {err}"))?;
        log::info!("deleted {name}");
        Ok(())
    }
    fn free_name(&self, base: SaveName) -> Result<SaveName, StoreError> {
        let taken: hashbrown::HashSet<SaveName> = self.storage.list()?.into_iter().collect();
        if !taken.contains(&base) {
            return Ok(base);
        }
        (2..)
            .map(|n| base.with_suffix(n))
            .find(|name| !taken.contains(name))
            .ok_or_else(|| StoreError::InvalidName(base.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::Color;
    use crate::stroke::{Stroke, StrokeID};
    use ultraviolet::Vec3;

    /// Writes the record count as the "image".
    struct CountThumbnails;
    impl Thumbnailer for CountThumbnails {
        type Error = std::convert::Infallible;
        fn render(
            &self,
            records: &[StrokeRecord],
            _: &ProjectionPlane,
            size: u32,
        ) -> Result<Vec<u8>, Self::Error> {
            Ok(vec![records.len() as u8, size as u8])
        }
    }
    struct BrokenThumbnails;
    impl Thumbnailer for BrokenThumbnails {
        type Error = &'static str;
        fn render(&self, _: &[StrokeRecord], _: &ProjectionPlane, _: u32) -> Result<Vec<u8>, Self::Error> {
            Err("no renderer")
        }
    }
    /// Refuses to store the strokes file.
    struct NoStrokes(MemoryStorage);
    impl RecordStorage for NoStrokes {
        fn list(&self) -> Result<Vec<SaveName>, StoreError> {
            self.0.list()
        }
        fn create(&self, name: &SaveName) -> Result<(), StoreError> {
            self.0.create(name)
        }
        fn put(&self, name: &SaveName, file: &str, bytes: &[u8]) -> Result<(), StoreError> {
            if file == STROKES_FILE {
                Err(std::io::Error::other("disk full").into())
            } else {
                self.0.put(name, file, bytes)
            }
        }
        fn get(&self, name: &SaveName, file: &str) -> Result<Vec<u8>, StoreError> {
            self.0.get(name, file)
        }
        fn remove(&self, name: &SaveName) -> Result<(), StoreError> {
            self.0.remove(name)
        }
    }

    fn records() -> Vec<StrokeRecord> {
        let stroke = Stroke::with_points(
            StrokeID::new(),
            Color::WHITE,
            0.01,
            vec![Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.2, 1.1, 1.0)],
        )
        .unwrap();
        vec![StrokeRecord::from_stroke(&stroke, Vec3::one())]
    }
    fn base() -> SaveName {
        SaveName::parse("2025-05-24_10-00-00").unwrap()
    }

    #[test]
    fn names_from_time() {
        use chrono::TimeZone;
        let time = chrono::Utc.with_ymd_and_hms(2025, 5, 24, 9, 3, 7).unwrap();
        assert_eq!(SaveName::at(&time).as_str(), "2025-05-24_09-03-07");
        assert!(base() < base().with_suffix(2));
    }
    #[test]
    fn name_validation() {
        assert!(SaveName::parse("").is_err());
        assert!(SaveName::parse("..").is_err());
        assert!(SaveName::parse(".hidden").is_err());
        assert!(SaveName::parse("a/b").is_err());
        assert!("2025-05-24_10-00-00".parse::<SaveName>().is_ok());
    }
    #[test]
    fn write_list_read_delete() {
        let store = StrokeStore::new(MemoryStorage::default(), CountThumbnails, 100);
        let records = records();
        let name = store
            .write_as(base(), &records, &ProjectionPlane::default(), 2.0)
            .unwrap();
        assert_eq!(name, base());
        assert_eq!(store.list_dirs().unwrap(), [name.clone()]);
        assert_eq!(store.read_strokes(&name).unwrap(), records);
        assert_eq!(store.read_image(&name).unwrap(), [1, 200]);

        store.delete(&name).unwrap();
        assert!(store.list_dirs().unwrap().is_empty());
        assert!(matches!(store.read_strokes(&name), Err(StoreError::NotFound(_))));
        assert!(matches!(store.read_image(&name), Err(StoreError::NotFound(_))));
        assert!(store.delete(&name).is_err());
    }
    #[test]
    fn same_second_gets_suffix() {
        let store = StrokeStore::new(MemoryStorage::default(), CountThumbnails, 100);
        let plane = ProjectionPlane::default();
        let first = store.write_as(base(), &records(), &plane, 1.0).unwrap();
        let second = store.write_as(base(), &records(), &plane, 1.0).unwrap();
        let third = store.write_as(base(), &records(), &plane, 1.0).unwrap();
        assert_eq!(second, base().with_suffix(2));
        assert_eq!(third, base().with_suffix(3));
        // Newest first.
        assert_eq!(store.list_dirs().unwrap(), [third, second, first]);
    }
    #[test]
    fn failed_strokes_write_leaves_nothing() {
        let store = StrokeStore::new(NoStrokes(MemoryStorage::default()), CountThumbnails, 100);
        let err = store
            .write_as(base(), &records(), &ProjectionPlane::default(), 1.0)
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(store.list_dirs().unwrap().is_empty());
    }
    #[test]
    fn failed_thumbnail_writes_nothing() {
        let store = StrokeStore::new(MemoryStorage::default(), BrokenThumbnails, 100);
        let err = store
            .write_as(base(), &records(), &ProjectionPlane::default(), 1.0)
            .unwrap_err();
        assert!(matches!(err, StoreError::Thumbnail(msg) if msg == "no renderer"));
        assert!(store.list_dirs().unwrap().is_empty());
    }
    #[test]
    fn malformed_strokes_reported() {
        let store = StrokeStore::new(MemoryStorage::default(), CountThumbnails, 100);
        let name = base();
        store.storage().create(&name).unwrap();
        store
            .storage()
            .put(&name, STROKES_FILE, br#"[{"points": [], "color": [1, 1]}]"#)
            .unwrap();
        assert!(matches!(store.read_strokes(&name), Err(StoreError::Decode(_))));
    }
    #[test]
    fn thumbnail_pixels_never_zero() {
        let store = StrokeStore::new(MemoryStorage::default(), CountThumbnails, 100);
        assert_eq!(store.thumbnail_pixels(1.5), 150);
        assert_eq!(store.thumbnail_pixels(0.0), 100);
        assert_eq!(store.thumbnail_pixels(f32::NAN), 100);
        assert_eq!(store.thumbnail_pixels(1e-6), 1);
    }
}
