use std::collections::BTreeMap;

use super::{RecordStorage, SaveName, StoreError};

type Files = BTreeMap<String, Vec<u8>>;

/// Keeps every record in memory. Nothing survives the process.
#[derive(Default, Debug)]
pub struct MemoryStorage {
    records: parking_lot::RwLock<BTreeMap<SaveName, Files>>,
}
impl RecordStorage for MemoryStorage {
    fn list(&self) -> Result<Vec<SaveName>, StoreError> {
        Ok(self.records.read().keys().cloned().collect())
    }
    fn create(&self, name: &SaveName) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.contains_key(name) {
            return Err(std::io::Error::from(std::io::ErrorKind::AlreadyExists).into());
        }
        records.insert(name.clone(), Files::new());
        Ok(())
    }
    fn put(&self, name: &SaveName, file: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let files = records
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.clone()))?;
        files.insert(file.to_owned(), bytes.to_vec());
        Ok(())
    }
    fn get(&self, name: &SaveName, file: &str) -> Result<Vec<u8>, StoreError> {
        self.records
            .read()
            .get(name)
            .and_then(|files| files.get(file))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.clone()))
    }
    fn remove(&self, name: &SaveName) -> Result<(), StoreError> {
        self.records
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.clone()))
    }
}
