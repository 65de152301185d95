use crate::error::{IoError, StacError};
use serde_json::Value;

/// Reads and writes raw documents at opaque locations.
///
/// Implementations must be shareable across threads; the graph holds them
/// behind an `Arc`.
pub trait DocumentIo: Send + Sync {
    /// Bytes stored at `location`.
    fn read(&self, location: &str) -> Result<Vec<u8>, IoError>;

    /// Replace whatever is stored at `location`.
    fn write(&self, location: &str, bytes: &[u8]) -> Result<(), IoError>;

    /// Read and parse a JSON document.
    fn read_json(&self, location: &str) -> Result<Value, StacError> {
        let bytes = self.read(location)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StacError::format(format!("{} is not valid JSON: {}", location, e)))
    }

    /// Serialize and write a JSON document, pretty-printed.
    fn write_json(&self, location: &str, doc: &Value) -> Result<(), StacError> {
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| StacError::format(format!("failed to encode {}: {}", location, e)))?;
        self.write(location, &bytes)?;
        Ok(())
    }
}
