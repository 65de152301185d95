use crate::error::IoError;
use crate::href;
use crate::io::DocumentIo;
use std::path::PathBuf;
use url::Url;

/// Local filesystem backend.
///
/// Accepts plain paths and `file://` URLs. Parent directories are created on
/// write.
#[derive(Debug, Clone, Default)]
pub struct FileSystemIo;

impl FileSystemIo {
    pub fn new() -> Self {
        Self
    }

    fn path_for(&self, location: &str) -> Result<PathBuf, IoError> {
        if !href::is_url(location) {
            return Ok(PathBuf::from(location));
        }
        let url = Url::parse(location).map_err(|e| IoError::Unsupported {
            location: location.to_string(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "file" {
            return Err(IoError::Unsupported {
                location: location.to_string(),
                reason: format!("scheme '{}' is not served by the filesystem", url.scheme()),
            });
        }
        url.to_file_path().map_err(|_| IoError::Unsupported {
            location: location.to_string(),
            reason: "file URL has no local path".to_string(),
        })
    }
}

impl DocumentIo for FileSystemIo {
    fn read(&self, location: &str) -> Result<Vec<u8>, IoError> {
        let path = self.path_for(location)?;
        match std::fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!(location, bytes = bytes.len(), "read document");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(IoError::NotFound {
                location: location.to_string(),
            }),
            Err(source) => Err(IoError::Read {
                location: location.to_string(),
                source,
            }),
        }
    }

    fn write(&self, location: &str, bytes: &[u8]) -> Result<(), IoError> {
        let path = self.path_for(location)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| IoError::Write {
                location: location.to_string(),
                source,
            })?;
        }
        std::fs::write(&path, bytes).map_err(|source| IoError::Write {
            location: location.to_string(),
            source,
        })?;
        tracing::debug!(location, bytes = bytes.len(), "wrote document");
        Ok(())
    }
}

/// Canonical absolute form of a local path, for use as a root location.
///
/// The path must exist.
pub fn canonical_location(path: &std::path::Path) -> Result<String, IoError> {
    let canonical = dunce::canonicalize(path).map_err(|source| IoError::Read {
        location: path.display().to_string(),
        source,
    })?;
    Ok(canonical.to_string_lossy().replace('\\', "/"))
}
