//! Lazy link resolution, member iteration and the root walk.

use super::Graph;
use crate::document;
use crate::error::StacError;
use crate::href;
use crate::link::{LinkTarget, Rel};
use crate::types::{NodeHandle, NodeType};
use std::collections::HashSet;
use tracing::debug;

impl Graph {
    /// Resolve the link at `link_index` of `from`.
    ///
    /// A resolved link returns its cached target without I/O. Otherwise the
    /// href is used as the location when it was read with its document, or
    /// made absolute against the node's location when it was not; a node already
    /// loaded from that location is reused, else the document is fetched,
    /// parsed and added to the arena. Fetch failures surface as
    /// `Resolution`, parse failures as `Format`.
    pub fn resolve_link(&mut self, from: NodeHandle, link_index: usize) -> Result<NodeHandle, StacError> {
        let link = self
            .checked(from)?
            .links
            .get(link_index)
            .ok_or_else(|| StacError::NotFound(format!("link {} of {}", link_index, from)))?;
        let (location, hint) = match &link.target {
            LinkTarget::Resolved { node, .. } => return Ok(*node),
            LinkTarget::Unresolved { href, hint, based } => {
                (self.link_location(from, href, *based), *hint)
            }
        };

        let target = match self.lookup(&location) {
            Some(cached) => {
                debug!(location = %location, node = %cached, "resolved from location cache");
                cached
            }
            None => self.load(&location, hint)?,
        };
        self.nodes[from.0].links[link_index].target = LinkTarget::Resolved {
            node: target,
            href: Some(location),
        };
        Ok(target)
    }

    /// First link of `rel`, resolved. `NotFound` when there is none.
    pub fn resolve(&mut self, from: NodeHandle, rel: &Rel) -> Result<NodeHandle, StacError> {
        self.try_resolve(from, rel)?.ok_or_else(|| {
            StacError::NotFound(format!("{} has no {} link", self.describe(from), rel))
        })
    }

    /// First link of `rel`, resolved, or `None` when there is no such link.
    pub fn try_resolve(&mut self, from: NodeHandle, rel: &Rel) -> Result<Option<NodeHandle>, StacError> {
        let index = self
            .checked(from)?
            .links
            .iter()
            .position(|link| &link.rel == rel);
        match index {
            Some(index) => self.resolve_link(from, index).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_parent(&mut self, handle: NodeHandle) -> Result<Option<NodeHandle>, StacError> {
        self.try_resolve(handle, &Rel::Parent)
    }

    /// Owning collection of an item, through its `collection` link.
    pub fn get_collection(&mut self, handle: NodeHandle) -> Result<Option<NodeHandle>, StacError> {
        self.try_resolve(handle, &Rel::Collection)
    }

    /// Top of the tree containing `handle`.
    ///
    /// A `root` link is followed directly. Without one, `parent` links are
    /// walked iteratively until a node with no parent is reached. A walk
    /// longer than the configured hop guard, or one that revisits a node,
    /// fails with `Resolution`.
    pub fn get_root(&mut self, handle: NodeHandle) -> Result<NodeHandle, StacError> {
        self.checked(handle)?;
        let max_hops = self.config.max_hops;
        let mut visited = HashSet::new();
        let mut current = handle;
        for hops in 0..=max_hops {
            if !visited.insert(current) {
                return Err(StacError::resolution(
                    self.describe(handle),
                    format!("parent chain loops back to {} after {} hops", self.describe(current), hops),
                ));
            }
            if let Some(root) = self.try_resolve(current, &Rel::Root)? {
                debug!(node = %handle, root = %root, hops, "root found by link");
                return Ok(root);
            }
            match self.try_resolve(current, &Rel::Parent)? {
                Some(parent) => current = parent,
                None => {
                    debug!(node = %handle, root = %current, hops, "root found by parent walk");
                    return Ok(current);
                }
            }
        }
        Err(StacError::resolution(
            self.describe(handle),
            format!("root walk exceeded {} hops", max_hops),
        ))
    }

    /// Lazily resolved `child` targets in link order.
    pub fn iter_children(&mut self, handle: NodeHandle) -> Members<'_> {
        Members::new(self, handle, Rel::Child)
    }

    /// Lazily resolved `item` targets in link order.
    pub fn iter_items(&mut self, handle: NodeHandle) -> Members<'_> {
        Members::new(self, handle, Rel::Item)
    }

    /// First child with the given id.
    pub fn get_child(&mut self, handle: NodeHandle, id: &str) -> Result<Option<NodeHandle>, StacError> {
        self.find_member(handle, &Rel::Child, id)
    }

    /// First item with the given id.
    pub fn get_item(&mut self, handle: NodeHandle, id: &str) -> Result<Option<NodeHandle>, StacError> {
        self.find_member(handle, &Rel::Item, id)
    }

    /// Link index and target of the first `rel` member with `id`.
    ///
    /// Already resolved members are checked first so that an unreadable
    /// sibling does not hide a member that is in memory.
    pub(super) fn find_member_link(
        &mut self,
        handle: NodeHandle,
        rel: &Rel,
        id: &str,
    ) -> Result<Option<(usize, NodeHandle)>, StacError> {
        let indices = self.checked(handle)?.link_indices(rel);
        for &index in &indices {
            if let Some(target) = self.nodes[handle.0].links[index].node() {
                if self.nodes[target.0].id == id {
                    return Ok(Some((index, target)));
                }
            }
        }
        for index in indices {
            if self.nodes[handle.0].links[index].is_resolved() {
                continue;
            }
            let target = self.resolve_link(handle, index)?;
            if self.nodes[target.0].id == id {
                return Ok(Some((index, target)));
            }
        }
        Ok(None)
    }

    fn find_member(&mut self, handle: NodeHandle, rel: &Rel, id: &str) -> Result<Option<NodeHandle>, StacError> {
        Ok(self.find_member_link(handle, rel, id)?.map(|(_, target)| target))
    }

    /// Fetch, parse and register the document at a location.
    pub(super) fn load(&mut self, location: &str, hint: Option<NodeType>) -> Result<NodeHandle, StacError> {
        debug!(location, hint = ?hint, "fetching document");
        let bytes = self
            .io
            .read(location)
            .map_err(|e| StacError::resolution_from(location, e.into()))?;
        let doc = serde_json::from_slice(&bytes)
            .map_err(|e| StacError::format(format!("{} is not valid JSON: {}", location, e)))?;
        let mut node = document::from_document_with_hint(doc, Some(location), hint)?;
        // Where a document was read from wins over the `self` it declares.
        if node.self_href() != Some(location) {
            node.set_self_href(location);
        }
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(node);
        self.by_location.insert(location.to_string(), handle);
        debug!(location, node = %handle, "loaded document");
        Ok(handle)
    }

    /// Location an unresolved href of `from` points at: the href itself once
    /// based, else made absolute against the location of `from` when it has one.
    pub(super) fn link_location(&self, from: NodeHandle, raw_href: &str, based: bool) -> String {
        if href::is_absolute(raw_href) {
            return href::make_absolute(raw_href, raw_href);
        }
        if based {
            return raw_href.to_string();
        }
        let base = self.nodes[from.0]
            .self_href()
            .map(str::to_string)
            .or_else(|| self.full_path(from));
        match base {
            Some(base) => href::make_absolute(raw_href, &base),
            None => raw_href.to_string(),
        }
    }
}

/// Restartable lazy sequence of a node's `child` or `item` targets.
///
/// Each step resolves one link; a failed resolution is yielded as an error
/// and iteration continues with the next sibling.
pub struct Members<'g> {
    graph: &'g mut Graph,
    node: NodeHandle,
    rel: Rel,
    next: usize,
}

impl<'g> Members<'g> {
    fn new(graph: &'g mut Graph, node: NodeHandle, rel: Rel) -> Self {
        Self {
            graph,
            node,
            rel,
            next: 0,
        }
    }
}

impl Iterator for Members<'_> {
    type Item = Result<NodeHandle, StacError>;

    fn next(&mut self) -> Option<Self::Item> {
        let links = &self.graph.get(self.node)?.links;
        let offset = links[self.next.min(links.len())..]
            .iter()
            .position(|link| link.rel == self.rel)?;
        let index = self.next + offset;
        self.next = index + 1;
        Some(self.graph.resolve_link(self.node, index))
    }
}
