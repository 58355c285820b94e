use std::path::{Path, PathBuf};

use super::{RecordStorage, SaveName, StoreError};

/// Records as subdirectories of a root directory.
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}
impl FsStorage {
    /// Use `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        log::debug!("storing strokes in {}", root.display());
        Ok(Self { root })
    }
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
    fn dir(&self, name: &SaveName) -> PathBuf {
        self.root.join(name.as_str())
    }
}

/// Turn "no such file" into a [`StoreError::NotFound`] for `name`.
fn not_found_as(name: &SaveName) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(name.clone())
        } else {
            StoreError::Io(err)
        }
    }
}

impl RecordStorage for FsStorage {
    fn list(&self) -> Result<Vec<SaveName>, StoreError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            // Hidden and non-UTF8 entries aren't ours.
            match entry.file_name().to_str().map(SaveName::parse) {
                Some(Ok(name)) => names.push(name),
                _ => log::trace!("skipping {}", entry.path().display()),
            }
        }
        Ok(names)
    }
    fn create(&self, name: &SaveName) -> Result<(), StoreError> {
        std::fs::create_dir(self.dir(name))?;
        Ok(())
    }
    fn put(&self, name: &SaveName, file: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let dir = self.dir(name);
        if !dir.is_dir() {
            return Err(StoreError::NotFound(name.clone()));
        }
        std::fs::write(dir.join(file), bytes)?;
        Ok(())
    }
    fn get(&self, name: &SaveName, file: &str) -> Result<Vec<u8>, StoreError> {
        std::fs::read(self.dir(name).join(file)).map_err(not_found_as(name))
    }
    fn remove(&self, name: &SaveName) -> Result<(), StoreError> {
        std::fs::remove_dir_all(self.dir(name)).map_err(not_found_as(name))
    }
}
