//! Catalog Graph
//!
//! Arena that owns every node reachable in one session. Links between nodes
//! are either handles into the arena or unresolved locations; resolution
//! fetches a location through the [`DocumentIo`] port, parses it and binds
//! the link to the new arena slot.
//!
//! Nodes are never dropped from the arena while the graph lives. A location
//! cache maps every fetched (or explicitly located) document to its slot, so
//! two links naming the same location resolve to the same node and a
//! back-reference to an already loaded parent costs no I/O.

mod edit;
mod persist;
mod resolve;

pub use resolve::Members;

use crate::config::{ResolutionConfig, StacConfig};
use crate::error::StacError;
use crate::io::{DocumentIo, FileSystemIo};
use crate::link::{LinkTarget, Rel};
use crate::node::Node;
use crate::types::{NodeHandle, STAC_VERSION};
use crate::validation::{SchemaValidator, ValidationMode, ValidationResult};
use crate::href;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Owner of all nodes and their resolution state.
pub struct Graph {
    nodes: Vec<Node>,
    by_location: HashMap<String, NodeHandle>,
    io: Arc<dyn DocumentIo>,
    config: ResolutionConfig,
    validation_mode: ValidationMode,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.len())
            .field("locations", &self.by_location.len())
            .field("config", &self.config)
            .field("validation_mode", &self.validation_mode)
            .finish()
    }
}

impl Graph {
    /// Graph backed by the local filesystem.
    pub fn new() -> Self {
        Self::with_io(Arc::new(FileSystemIo::new()))
    }

    pub fn with_io(io: Arc<dyn DocumentIo>) -> Self {
        Self::with_config(io, ResolutionConfig::default())
    }

    pub fn with_config(io: Arc<dyn DocumentIo>, config: ResolutionConfig) -> Self {
        Self {
            nodes: Vec::new(),
            by_location: HashMap::new(),
            io,
            config,
            validation_mode: ValidationMode::default(),
        }
    }

    /// Graph using the resolution settings and validation mode of a loaded
    /// configuration.
    pub fn from_config(io: Arc<dyn DocumentIo>, config: &StacConfig) -> Self {
        let mut graph = Self::with_config(io, config.resolution);
        graph.validation_mode = config.validation.mode;
        graph
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.validation_mode
    }

    pub fn io(&self) -> &Arc<dyn DocumentIo> {
        &self.io
    }

    pub fn config(&self) -> ResolutionConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add an in-memory node. A node with a `self` location is registered in
    /// the location cache unless another node already claims it.
    pub fn insert(&mut self, node: Node) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        if let Some(location) = node.self_href() {
            self.by_location
                .entry(location.to_string())
                .or_insert(handle);
        }
        self.nodes.push(node);
        handle
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle.0)
    }

    /// # Panics
    ///
    /// If `handle` was not issued by this graph.
    pub fn node(&self, handle: NodeHandle) -> &Node {
        &self.nodes[handle.0]
    }

    /// # Panics
    ///
    /// If `handle` was not issued by this graph.
    pub fn node_mut(&mut self, handle: NodeHandle) -> &mut Node {
        &mut self.nodes[handle.0]
    }

    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        (0..self.nodes.len()).map(NodeHandle)
    }

    /// Node loaded from or located at `location`, if any.
    pub fn lookup(&self, location: &str) -> Option<NodeHandle> {
        self.by_location.get(location).copied()
    }

    /// Load the document at `location`, or return the node already loaded
    /// from there.
    pub fn read(&mut self, location: &str) -> Result<NodeHandle, StacError> {
        match self.lookup(location) {
            Some(handle) => Ok(handle),
            None => self.load(location, None),
        }
    }

    /// Replace a node's `self` location.
    pub fn set_self(&mut self, handle: NodeHandle, location: impl Into<String>) -> Result<(), StacError> {
        let location = location.into();
        let node = self.checked(handle)?;
        if let Some(previous) = node.self_href().map(str::to_string) {
            if self.by_location.get(&previous) == Some(&handle) {
                self.by_location.remove(&previous);
            }
        }
        self.by_location.entry(location.clone()).or_insert(handle);
        self.nodes[handle.0].set_self_href(location);
        Ok(())
    }

    /// Canonical location of a node.
    ///
    /// The node's own `self` location when it has one; otherwise derived from
    /// the nearest located ancestor as `<ancestor dir>/<id>/<layout file>`.
    /// Follows only in-memory links and never performs I/O. `None` when no
    /// ancestor carries a location.
    pub fn full_path(&self, handle: NodeHandle) -> Option<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = handle;
        let mut anchor = None;
        for _ in 0..=self.config.max_hops {
            let node = self.get(current)?;
            if let Some(location) = node.self_href() {
                anchor = Some(location.to_string());
                break;
            }
            if !seen.insert(current) {
                return None;
            }
            chain.push(current);
            let up = node.link(&Rel::Parent).or_else(|| node.link(&Rel::Root))?;
            match &up.target {
                LinkTarget::Resolved { node: next, .. } if *next != current => current = *next,
                LinkTarget::Unresolved { href, based, .. } if *based || href::is_absolute(href) => {
                    anchor = Some(href.clone());
                    break;
                }
                _ => return None,
            }
        }
        let mut path = anchor?;
        for step in chain.into_iter().rev() {
            let node = &self.nodes[step.0];
            let dir = href::join(&href::dirname(&path), &node.id);
            path = href::join(&dir, &node.node_type().layout_file_name(&node.id));
        }
        Some(path)
    }

    /// Drop a cached resolution so the next access fetches again.
    ///
    /// Unresolved links are left alone. Links bound to in-memory nodes that
    /// were never fetched have no location to fall back to and are rejected.
    pub fn invalidate(&mut self, handle: NodeHandle, link_index: usize) -> Result<(), StacError> {
        let link = self
            .checked(handle)?
            .links
            .get(link_index)
            .ok_or_else(|| StacError::NotFound(format!("link {} of {}", link_index, handle)))?;
        let (target, location) = match &link.target {
            LinkTarget::Unresolved { .. } => return Ok(()),
            LinkTarget::Resolved { node, href: Some(href) } => (*node, href.clone()),
            LinkTarget::Resolved { node, href: None } => {
                return Err(StacError::InvalidEdit(format!(
                    "{} link of {} targets in-memory node {} with no location",
                    link.rel,
                    self.describe(handle),
                    node
                )))
            }
        };
        if self.by_location.get(&location) == Some(&target) {
            self.by_location.remove(&location);
        }
        let link = &mut self.nodes[handle.0].links[link_index];
        let hint = link.rel.target_hint();
        tracing::debug!(node = %handle, location = %location, "invalidated cached resolution");
        link.target = LinkTarget::Unresolved {
            href: location,
            hint,
            based: true,
        };
        Ok(())
    }

    /// Serialize a node and hand it to `validator`.
    ///
    /// In `Reject` mode a failed validation becomes `StacError::Validation`;
    /// in `Collect` mode the diagnostics are returned.
    pub fn validate(
        &self,
        handle: NodeHandle,
        validator: &dyn SchemaValidator,
        mode: ValidationMode,
    ) -> Result<ValidationResult, StacError> {
        let doc = self.to_document(handle)?;
        let node = self.checked(handle)?;
        let version = node.stac_version.as_deref().unwrap_or(STAC_VERSION);
        let result = validator.validate(&doc, node.node_type(), version)?;
        if !result.ok {
            tracing::warn!(node = %self.describe(handle), failures = result.messages.len(), "validation failed");
        }
        match mode {
            ValidationMode::Reject => result.into_result(),
            ValidationMode::Collect => Ok(result),
        }
    }

    /// [`Graph::validate`] in the configured validation mode.
    pub fn check(&self, handle: NodeHandle, validator: &dyn SchemaValidator) -> Result<ValidationResult, StacError> {
        self.validate(handle, validator, self.validation_mode)
    }

    fn checked(&self, handle: NodeHandle) -> Result<&Node, StacError> {
        self.get(handle)
            .ok_or_else(|| StacError::NotFound(format!("node {} is not in this graph", handle)))
    }

    /// Human-readable name of a node for diagnostics.
    fn describe(&self, handle: NodeHandle) -> String {
        match self.get(handle) {
            Some(node) => match node.self_href() {
                Some(location) => format!("{} {} ({})", node.node_type(), node.id, location),
                None => format!("{} {}", node.node_type(), node.id),
            },
            None => handle.to_string(),
        }
    }
}
