//! Serializing nodes with computed link hrefs, and writing trees back out.

use super::Graph;
use crate::document;
use crate::error::StacError;
use crate::href;
use crate::link::{Link, LinkTarget, Rel};
use crate::types::NodeHandle;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

impl Graph {
    /// Render a node as a document.
    ///
    /// Unresolved links keep their stored href, except that a relative
    /// location read with a document is rewritten against this node's
    /// location. A resolved link is written relative to this node's location
    /// when the target's location is in the same tree, absolute otherwise.
    /// Targets with no derivable location fall back to the default layout
    /// below this node.
    pub fn to_document(&self, handle: NodeHandle) -> Result<Value, StacError> {
        let node = self.checked(handle)?;
        let base = self.location_of(handle);
        document::to_document(node, |link| self.render_href(link, base.as_deref()))
    }

    fn location_of(&self, handle: NodeHandle) -> Option<String> {
        self.nodes[handle.0]
            .self_href()
            .map(str::to_string)
            .or_else(|| self.full_path(handle))
    }

    fn render_href(&self, link: &Link, base: Option<&str>) -> String {
        let (target, fetched_from) = match &link.target {
            LinkTarget::Unresolved { href, based: true, .. } if !href::is_absolute(href) => {
                return match base {
                    Some(base) => href::make_relative(href, base),
                    None => href.clone(),
                };
            }
            LinkTarget::Unresolved { href, .. } => return href.clone(),
            LinkTarget::Resolved { node, href } => (*node, href),
        };
        let location = self.location_of(target).or_else(|| fetched_from.clone());
        match (location, base) {
            (Some(location), Some(base)) if href::same_tree(&location, base) => {
                href::make_relative(&location, base)
            }
            (Some(location), _) => location,
            (None, _) => {
                let node = &self.nodes[target.0];
                format!("./{}/{}", node.id, node.node_type().layout_file_name(&node.id))
            }
        }
    }

    /// Resolve the whole tree under `root` and give every node the default
    /// layout location below `root_href`.
    ///
    /// Performs I/O for any member not yet loaded.
    pub fn normalize_hrefs(&mut self, root: NodeHandle, root_href: &str) -> Result<(), StacError> {
        self.set_self(root, root_href)?;
        let mut queue = VecDeque::from([root]);
        let mut seen = HashSet::from([root]);
        while let Some(parent) = queue.pop_front() {
            let members: Vec<usize> = self.nodes[parent.0]
                .links
                .iter()
                .enumerate()
                .filter(|(_, link)| matches!(link.rel, Rel::Child | Rel::Item))
                .map(|(index, _)| index)
                .collect();
            let parent_dir = self.nodes[parent.0]
                .self_href()
                .map(href::dirname)
                .unwrap_or_default();
            for index in members {
                let member = self.resolve_link(parent, index)?;
                if !seen.insert(member) {
                    continue;
                }
                let node = &self.nodes[member.0];
                let dir = href::join(&parent_dir, &node.id);
                let location = href::join(&dir, &node.node_type().layout_file_name(&node.id));
                self.set_self(member, location)?;
                queue.push_back(member);
            }
        }
        debug!(root = %root, nodes = seen.len(), root_href, "normalized hrefs");
        Ok(())
    }

    /// Write `root` and every in-memory node reachable through resolved
    /// `child`/`item` links to its location. Unresolved members are left
    /// untouched. Returns the written locations in write order.
    pub fn save(&self, root: NodeHandle) -> Result<Vec<String>, StacError> {
        self.checked(root)?;
        let mut written = Vec::new();
        let mut queue = VecDeque::from([root]);
        let mut seen = HashSet::from([root]);
        while let Some(handle) = queue.pop_front() {
            let location = self.location_of(handle).ok_or_else(|| {
                StacError::resolution(
                    self.describe(handle),
                    "no self location and no located ancestor; set one or normalize hrefs first",
                )
            })?;
            let doc = self.to_document(handle)?;
            self.io.write_json(&location, &doc)?;
            info!(location = %location, node = %handle, "wrote document");
            written.push(location);

            for link in &self.nodes[handle.0].links {
                if !matches!(link.rel, Rel::Child | Rel::Item) {
                    continue;
                }
                if let Some(member) = link.node() {
                    if seen.insert(member) {
                        queue.push_back(member);
                    }
                }
            }
        }
        Ok(written)
    }
}
