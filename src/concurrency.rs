//! Shared access to a graph across threads
//!
//! A graph is single-writer: resolution caches nodes and rewrites links, so
//! even lookups that may perform I/O need exclusive access. `SharedGraph`
//! wraps one graph in a read-write lock; pure reads (document rendering,
//! path derivation, cached lookups) share the read side.

use crate::error::StacError;
use crate::graph::Graph;
use crate::types::NodeHandle;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;
use std::sync::Arc;

/// Cloneable handle to one graph shared between threads.
#[derive(Clone)]
pub struct SharedGraph {
    inner: Arc<RwLock<Graph>>,
}

impl SharedGraph {
    pub fn new(graph: Graph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Shared access for operations that never touch the I/O port.
    pub fn read(&self) -> RwLockReadGuard<'_, Graph> {
        self.inner.read()
    }

    /// Exclusive access for resolution and structural edits.
    pub fn write(&self) -> RwLockWriteGuard<'_, Graph> {
        self.inner.write()
    }

    /// Run `f` with exclusive access.
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut Graph) -> T) -> T {
        f(&mut self.inner.write())
    }

    /// Load a document under the write lock.
    pub fn load(&self, location: &str) -> Result<NodeHandle, StacError> {
        self.inner.write().read(location)
    }

    pub fn get_root(&self, handle: NodeHandle) -> Result<NodeHandle, StacError> {
        self.inner.write().get_root(handle)
    }

    pub fn to_document(&self, handle: NodeHandle) -> Result<Value, StacError> {
        self.inner.read().to_document(handle)
    }

    /// The wrapped graph, if this is the last handle.
    pub fn into_inner(self) -> Result<Graph, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<Graph> for SharedGraph {
    fn from(graph: Graph) -> Self {
        Self::new(graph)
    }
}
