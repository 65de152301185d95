use crate::error::IoError;
use crate::io::DocumentIo;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// In-memory backend that counts every access per location.
///
/// Useful for fixtures and for asserting how many fetches an operation made.
#[derive(Debug, Default)]
pub struct MemoryIo {
    documents: RwLock<HashMap<String, Vec<u8>>>,
    reads: RwLock<HashMap<String, usize>>,
    writes: RwLock<HashMap<String, usize>>,
}

impl MemoryIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a JSON document without counting it as a write.
    pub fn insert(&self, location: impl Into<String>, doc: &Value) {
        let bytes = doc.to_string().into_bytes();
        self.documents.write().insert(location.into(), bytes);
    }

    /// Parsed document at `location`, if any.
    pub fn get(&self, location: &str) -> Option<Value> {
        self.documents
            .read()
            .get(location)
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }

    pub fn contains(&self, location: &str) -> bool {
        self.documents.read().contains_key(location)
    }

    /// Stored locations, sorted.
    pub fn locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = self.documents.read().keys().cloned().collect();
        locations.sort();
        locations
    }

    /// Number of `read` calls made against `location`, successful or not.
    pub fn read_count(&self, location: &str) -> usize {
        self.reads.read().get(location).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.read().values().sum()
    }

    pub fn write_count(&self, location: &str) -> usize {
        self.writes.read().get(location).copied().unwrap_or(0)
    }
}

impl DocumentIo for MemoryIo {
    fn read(&self, location: &str) -> Result<Vec<u8>, IoError> {
        *self.reads.write().entry(location.to_string()).or_insert(0) += 1;
        self.documents
            .read()
            .get(location)
            .cloned()
            .ok_or_else(|| IoError::NotFound {
                location: location.to_string(),
            })
    }

    fn write(&self, location: &str, bytes: &[u8]) -> Result<(), IoError> {
        *self.writes.write().entry(location.to_string()).or_insert(0) += 1;
        self.documents
            .write()
            .insert(location.to_string(), bytes.to_vec());
        Ok(())
    }
}
