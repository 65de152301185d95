//! Structural edits: attaching and detaching children and items while
//! keeping `parent`/`root`/`collection` back-references consistent.

use super::Graph;
use crate::error::StacError;
use crate::link::{Link, LinkTarget, Rel};
use crate::node::NodeKind;
use crate::types::{NodeHandle, NodeType};
use serde_json::Map;
use std::collections::HashSet;
use tracing::debug;

const JSON: &str = "application/json";
const GEOJSON: &str = "application/geo+json";

/// Replace the first `rel` link with `link` and drop any others of that role.
fn replace_link(links: &mut Vec<Link>, link: Link) {
    let rel = link.rel.clone();
    match links.iter().position(|l| l.rel == rel) {
        Some(first) => {
            links[first] = link;
            let mut index = 0;
            links.retain(|l| {
                let keep = l.rel != rel || index == first;
                index += 1;
                keep
            });
        }
        None => links.push(link),
    }
}

fn link_to(rel: Rel, target: LinkTarget) -> Link {
    Link {
        rel,
        target,
        media_type: Some(JSON.to_string()),
        title: None,
        extra_fields: Map::new(),
    }
}

impl Graph {
    /// Append a `child` link from `parent` to `child` and point the child's
    /// `parent` and `root` links back into this tree.
    ///
    /// Fails with `Type` if either node is an Item and with `Cycle` if
    /// `child` is `parent` or one of its ancestors; a failed edit leaves both
    /// nodes unchanged. The ancestor walk follows in-memory links and the
    /// location cache only.
    pub fn add_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<(), StacError> {
        self.ensure_container(parent, "add_child")?;
        let child_type = self.checked(child)?.node_type();
        if child_type == NodeType::Item {
            return Err(StacError::Type {
                operation: "add_child",
                expected: "Catalog or Collection",
                found: child_type,
            });
        }
        self.ensure_not_ancestor(parent, child)?;
        self.attach(parent, child, Rel::Child);
        Ok(())
    }

    /// Append an `item` link from `parent` to `item`.
    ///
    /// When `parent` is a Collection the item's `collection` field and link
    /// are set as well.
    pub fn add_item(&mut self, parent: NodeHandle, item: NodeHandle) -> Result<(), StacError> {
        self.ensure_container(parent, "add_item")?;
        let item_type = self.checked(item)?.node_type();
        if item_type != NodeType::Item {
            return Err(StacError::Type {
                operation: "add_item",
                expected: "Item",
                found: item_type,
            });
        }
        self.attach(parent, item, Rel::Item);

        if self.nodes[parent.0].node_type() == NodeType::Collection {
            let collection_id = self.nodes[parent.0].id.clone();
            let node = &mut self.nodes[item.0];
            if let NodeKind::Item(fields) = &mut node.kind {
                fields.collection = Some(collection_id);
            }
            replace_link(
                &mut node.links,
                link_to(
                    Rel::Collection,
                    LinkTarget::Resolved {
                        node: parent,
                        href: None,
                    },
                ),
            );
        }
        Ok(())
    }

    /// Remove the first child with `id` and clear its back-references to
    /// `parent`. Returns the detached node, which stays in the arena.
    pub fn remove_child(&mut self, parent: NodeHandle, id: &str) -> Result<NodeHandle, StacError> {
        self.remove_member(parent, Rel::Child, id)
    }

    /// Remove the first item with `id`; see [`Graph::remove_child`].
    pub fn remove_item(&mut self, parent: NodeHandle, id: &str) -> Result<NodeHandle, StacError> {
        self.remove_member(parent, Rel::Item, id)
    }

    fn remove_member(&mut self, parent: NodeHandle, rel: Rel, id: &str) -> Result<NodeHandle, StacError> {
        let (index, member) = self
            .find_member_link(parent, &rel, id)?
            .ok_or_else(|| StacError::NotFound(format!("{} '{}' of {}", rel, id, self.describe(parent))))?;
        self.nodes[parent.0].links.remove(index);
        self.detach(parent, member);
        debug!(parent = %parent, member = %member, rel = %rel, id, "removed member");
        Ok(member)
    }

    fn ensure_container(&self, parent: NodeHandle, operation: &'static str) -> Result<(), StacError> {
        let found = self.checked(parent)?.node_type();
        if found.is_container() {
            Ok(())
        } else {
            Err(StacError::Type {
                operation,
                expected: "Catalog or Collection",
                found,
            })
        }
    }

    /// Walk up from `parent`; reaching `child` means the edit would close a
    /// loop. Unloaded ancestors are compared by location and end the walk.
    fn ensure_not_ancestor(&self, parent: NodeHandle, child: NodeHandle) -> Result<(), StacError> {
        let cycle = || StacError::Cycle {
            node: self.describe(child),
            ancestor: self.describe(parent),
        };
        let child_location = self.nodes[child.0].self_href();
        let max_hops = self.config.max_hops;
        let mut visited = HashSet::new();
        let mut current = parent;
        for _ in 0..=max_hops {
            if current == child {
                return Err(cycle());
            }
            if !visited.insert(current) {
                return Err(StacError::resolution(
                    self.describe(parent),
                    format!("ancestors of {} form a loop", self.describe(current)),
                ));
            }
            let Some(link) = self.nodes[current.0].link(&Rel::Parent) else {
                return Ok(());
            };
            current = match &link.target {
                LinkTarget::Resolved { node, .. } => *node,
                LinkTarget::Unresolved { href, based, .. } => {
                    let location = self.link_location(current, href, *based);
                    if child_location == Some(location.as_str()) {
                        return Err(cycle());
                    }
                    match self.lookup(&location) {
                        Some(loaded) => loaded,
                        None => return Ok(()),
                    }
                }
            };
        }
        Err(StacError::resolution(
            self.describe(parent),
            format!("ancestor walk exceeded {} hops", max_hops),
        ))
    }

    fn attach(&mut self, parent: NodeHandle, member: NodeHandle, rel: Rel) {
        let media_type = if rel == Rel::Item { GEOJSON } else { JSON };
        let links = &mut self.nodes[parent.0].links;
        if !links.iter().any(|l| l.rel == rel && l.points_to(member)) {
            links.push(Link::resolved(rel.clone(), member).with_media_type(media_type));
        }

        replace_link(
            &mut self.nodes[member.0].links,
            link_to(
                Rel::Parent,
                LinkTarget::Resolved {
                    node: parent,
                    href: None,
                },
            ),
        );
        match self.root_target_of(parent) {
            Some(root) => self.set_subtree_root(member, root),
            // Root unknown without I/O: drop the old tree's root so the next
            // root walk goes through the new parent.
            None => self.clear_subtree_root(member),
        }
        debug!(parent = %parent, member = %member, rel = %rel, "attached member");
    }

    /// Target a member of `parent`'s tree should use as its root, if known
    /// without I/O.
    fn root_target_of(&self, parent: NodeHandle) -> Option<LinkTarget> {
        let node = &self.nodes[parent.0];
        match node.link(&Rel::Root) {
            Some(link) => Some(link.target.clone()),
            None if node.link(&Rel::Parent).is_none() => Some(LinkTarget::Resolved {
                node: parent,
                href: None,
            }),
            None => None,
        }
    }

    /// `top` and its in-memory descendants.
    fn subtree(&self, top: NodeHandle) -> Vec<NodeHandle> {
        let mut seen = HashSet::from([top]);
        let mut stack = vec![top];
        let mut order = Vec::new();
        while let Some(current) = stack.pop() {
            order.push(current);
            for link in &self.nodes[current.0].links {
                if !matches!(link.rel, Rel::Child | Rel::Item) {
                    continue;
                }
                if let Some(next) = link.node() {
                    if seen.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }
        order
    }

    fn set_subtree_root(&mut self, top: NodeHandle, root: LinkTarget) {
        for handle in self.subtree(top) {
            replace_link(
                &mut self.nodes[handle.0].links,
                link_to(Rel::Root, root.clone()),
            );
        }
    }

    /// Remove `top`'s root link and the matching root links below it.
    fn clear_subtree_root(&mut self, top: NodeHandle) {
        let Some(old_root) = self.nodes[top.0].link(&Rel::Root).map(|l| l.target.clone()) else {
            return;
        };
        for handle in self.subtree(top) {
            let stale = self.nodes[handle.0]
                .link(&Rel::Root)
                .is_some_and(|link| self.same_target(&link.target, &old_root));
            if stale {
                self.nodes[handle.0].links.retain(|l| l.rel != Rel::Root);
            }
        }
    }

    fn same_target(&self, a: &LinkTarget, b: &LinkTarget) -> bool {
        match (a, b) {
            (LinkTarget::Resolved { node: x, .. }, LinkTarget::Resolved { node: y, .. }) => x == y,
            (LinkTarget::Unresolved { href: x, .. }, LinkTarget::Unresolved { href: y, .. }) => x == y,
            (LinkTarget::Resolved { node, href }, LinkTarget::Unresolved { href: other, .. })
            | (LinkTarget::Unresolved { href: other, .. }, LinkTarget::Resolved { node, href }) => {
                href.as_deref() == Some(other.as_str())
                    || self.nodes[node.0].self_href() == Some(other.as_str())
            }
        }
    }

    /// Clear `member`'s back-references to `parent`. The detached subtree is
    /// re-rooted at `member`.
    fn detach(&mut self, parent: NodeHandle, member: NodeHandle) {
        let parent_target = LinkTarget::Resolved {
            node: parent,
            href: None,
        };
        let old_root = self.root_target_of(parent);

        let back_refs: Vec<usize> = self.nodes[member.0]
            .links
            .iter()
            .enumerate()
            .filter(|(_, link)| {
                let points_back = self.same_target(&link.target, &parent_target);
                match link.rel {
                    Rel::Parent | Rel::Collection => points_back,
                    Rel::Root => {
                        points_back
                            || old_root
                                .as_ref()
                                .is_some_and(|root| self.same_target(&link.target, root))
                    }
                    _ => false,
                }
            })
            .map(|(index, _)| index)
            .collect();
        let cleared_root = back_refs
            .iter()
            .any(|&index| self.nodes[member.0].links[index].rel == Rel::Root);
        for index in back_refs.into_iter().rev() {
            self.nodes[member.0].links.remove(index);
        }

        let parent_id = self.nodes[parent.0].id.clone();
        let parent_is_collection = self.nodes[parent.0].node_type() == NodeType::Collection;
        if let NodeKind::Item(fields) = &mut self.nodes[member.0].kind {
            if parent_is_collection && fields.collection.as_deref() == Some(parent_id.as_str()) {
                fields.collection = None;
            }
        }

        if cleared_root {
            if let Some(old_root) = old_root {
                let new_root = LinkTarget::Resolved {
                    node: member,
                    href: None,
                };
                for handle in self.subtree(member).into_iter().skip(1) {
                    let stale = self.nodes[handle.0]
                        .link(&Rel::Root)
                        .is_some_and(|link| self.same_target(&link.target, &old_root));
                    if stale {
                        replace_link(
                            &mut self.nodes[handle.0].links,
                            link_to(Rel::Root, new_root.clone()),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryIo;
    use crate::node::{Extent, Node};
    use serde_json::json;
    use std::sync::Arc;

    fn graph() -> Graph {
        Graph::with_io(Arc::new(MemoryIo::new()))
    }

    #[test]
    fn test_add_child_links_both_ways() {
        let mut graph = graph();
        let root = graph.insert(Node::catalog("root", "Root"));
        let child = graph.insert(Node::catalog("child", "Child"));
        graph.add_child(root, child).unwrap();

        assert!(graph.node(root).link(&Rel::Child).unwrap().points_to(child));
        assert!(graph.node(child).link(&Rel::Parent).unwrap().points_to(root));
        assert!(graph.node(child).link(&Rel::Root).unwrap().points_to(root));
        assert_eq!(graph.get_parent(child).unwrap(), Some(root));
        assert_eq!(graph.get_root(child).unwrap(), root);
    }

    #[test]
    fn test_add_child_propagates_root_to_descendants() {
        let mut graph = graph();
        let root = graph.insert(Node::catalog("root", "Root"));
        let mid = graph.insert(Node::catalog("mid", "Mid"));
        let leaf = graph.insert(Node::item("leaf"));
        graph.add_item(mid, leaf).unwrap();
        assert!(graph.node(leaf).link(&Rel::Root).unwrap().points_to(mid));

        graph.add_child(root, mid).unwrap();
        assert!(graph.node(leaf).link(&Rel::Root).unwrap().points_to(root));
        assert_eq!(graph.node(leaf).link_indices(&Rel::Root).len(), 1);
    }

    #[test]
    fn test_attach_under_unrooted_parent_drops_stale_root() {
        let mut graph = graph();
        let old_root = graph.insert(Node::catalog("old", "Old"));
        let member = graph.insert(Node::catalog("member", "Member"));
        let leaf = graph.insert(Node::item("leaf"));
        graph.add_child(old_root, member).unwrap();
        graph.add_item(member, leaf).unwrap();
        assert!(graph.node(leaf).link(&Rel::Root).unwrap().points_to(old_root));

        let mut parent = Node::catalog("parent", "Parent");
        parent.set_self_href("/new/sub/catalog.json");
        parent.add_link(Link::new(Rel::Parent, "../catalog.json")).unwrap();
        let parent = graph.insert(parent);
        graph.add_child(parent, member).unwrap();

        assert!(graph.node(member).link(&Rel::Root).is_none());
        assert!(graph.node(leaf).link(&Rel::Root).is_none());
        assert!(graph.node(member).link(&Rel::Parent).unwrap().points_to(parent));
        assert_eq!(graph.get_parent(member).unwrap(), Some(parent));
    }

    #[test]
    fn test_reparenting_replaces_parent_link() {
        let mut graph = graph();
        let a = graph.insert(Node::catalog("a", "A"));
        let b = graph.insert(Node::catalog("b", "B"));
        let child = graph.insert(Node::catalog("child", "Child"));
        graph.add_child(a, child).unwrap();
        graph.add_child(b, child).unwrap();
        assert_eq!(graph.node(child).link_indices(&Rel::Parent).len(), 1);
        assert!(graph.node(child).link(&Rel::Parent).unwrap().points_to(b));
    }

    #[test]
    fn test_cycle_is_rejected_and_links_unchanged() {
        let mut graph = graph();
        let a = graph.insert(Node::catalog("a", "A"));
        let b = graph.insert(Node::catalog("b", "B"));
        graph.add_child(a, b).unwrap();
        let a_links = graph.node(a).links().to_vec();
        let b_links = graph.node(b).links().to_vec();

        let err = graph.add_child(b, a).unwrap_err();
        assert!(matches!(err, StacError::Cycle { .. }));
        assert_eq!(graph.node(a).links(), a_links.as_slice());
        assert_eq!(graph.node(b).links(), b_links.as_slice());

        assert!(matches!(graph.add_child(a, a), Err(StacError::Cycle { .. })));
    }

    #[test]
    fn test_cycle_detected_through_unloaded_parent_location() {
        let mut graph = graph();
        let mut top = Node::catalog("top", "Top");
        top.set_self_href("/stac/catalog.json");
        let top = graph.insert(top);
        let mut sub = Node::catalog("sub", "Sub");
        sub.add_link(Link::new(Rel::Parent, "/stac/catalog.json")).unwrap();
        let sub = graph.insert(sub);

        assert!(matches!(graph.add_child(sub, top), Err(StacError::Cycle { .. })));
    }

    #[test]
    fn test_variant_mismatches_are_type_errors() {
        let mut graph = graph();
        let catalog = graph.insert(Node::catalog("c", "C"));
        let other = graph.insert(Node::catalog("o", "O"));
        let item = graph.insert(Node::item("i"));

        assert!(matches!(
            graph.add_item(catalog, other),
            Err(StacError::Type { operation: "add_item", found: NodeType::Catalog, .. })
        ));
        assert!(matches!(
            graph.add_child(catalog, item),
            Err(StacError::Type { operation: "add_child", found: NodeType::Item, .. })
        ));
        let second = graph.insert(Node::item("j"));
        assert!(matches!(
            graph.add_item(item, second),
            Err(StacError::Type { found: NodeType::Item, .. })
        ));
        assert!(graph.node(catalog).links().is_empty());
    }

    #[test]
    fn test_add_item_to_collection_sets_collection() {
        let mut graph = graph();
        let collection = graph.insert(Node::collection("col", "d", "MIT", Extent::unbounded()));
        let item = graph.insert(Node::item("scene"));
        graph.add_item(collection, item).unwrap();

        let node = graph.node(item);
        assert_eq!(node.item_fields().unwrap().collection.as_deref(), Some("col"));
        assert!(node.link(&Rel::Collection).unwrap().points_to(collection));
        assert_eq!(
            graph.node(collection).link(&Rel::Item).unwrap().media_type.as_deref(),
            Some("application/geo+json")
        );

        let removed = graph.remove_item(collection, "scene").unwrap();
        assert_eq!(removed, item);
        let node = graph.node(item);
        assert_eq!(node.item_fields().unwrap().collection, None);
        assert!(node.link(&Rel::Collection).is_none());
        assert!(node.link(&Rel::Parent).is_none());
        assert!(node.link(&Rel::Root).is_none());
    }

    #[test]
    fn test_remove_child_reroots_subtree() {
        let mut graph = graph();
        let root = graph.insert(Node::catalog("root", "Root"));
        let mid = graph.insert(Node::catalog("mid", "Mid"));
        let leaf = graph.insert(Node::item("leaf"));
        graph.add_child(root, mid).unwrap();
        graph.add_item(mid, leaf).unwrap();

        assert_eq!(graph.remove_child(root, "mid").unwrap(), mid);
        assert!(graph.node(root).link(&Rel::Child).is_none());
        assert!(graph.node(mid).link(&Rel::Parent).is_none());
        assert!(graph.node(mid).link(&Rel::Root).is_none());
        assert!(graph.node(leaf).link(&Rel::Parent).unwrap().points_to(mid));
        assert!(graph.node(leaf).link(&Rel::Root).unwrap().points_to(mid));
        assert_eq!(graph.get_root(leaf).unwrap(), mid);
    }

    #[test]
    fn test_remove_missing_member_is_not_found() {
        let mut graph = graph();
        let root = graph.insert(Node::catalog("root", "Root"));
        assert!(matches!(
            graph.remove_child(root, "ghost"),
            Err(StacError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_loaded_child_clears_location_back_references() {
        let io = Arc::new(MemoryIo::new());
        io.insert(
            "/stac/catalog.json",
            &json!({"type": "Catalog", "id": "root", "description": "d", "links": [
                {"rel": "self", "href": "/stac/catalog.json"},
                {"rel": "child", "href": "./sub/catalog.json"}
            ]}),
        );
        io.insert(
            "/stac/sub/catalog.json",
            &json!({"type": "Catalog", "id": "sub", "description": "d", "links": [
                {"rel": "root", "href": "../catalog.json"},
                {"rel": "parent", "href": "../catalog.json"},
                {"rel": "license", "href": "https://example.com/LICENSE"}
            ]}),
        );
        let mut graph = Graph::with_io(io.clone());
        let root = graph.read("/stac/catalog.json").unwrap();
        let sub = graph.remove_child(root, "sub").unwrap();

        let rels: Vec<&str> = graph.node(sub).links().iter().map(|l| l.rel.as_str()).collect();
        assert_eq!(rels, vec!["self", "license"]);
        assert_eq!(graph.node(root).link_indices(&Rel::Child).len(), 0);
        assert_eq!(io.read_count("/stac/catalog.json"), 1);
    }
}
