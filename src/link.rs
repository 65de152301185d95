//! Links
//!
//! A link is a typed, directed edge from one node to a related node or
//! resource. Its target is either a node already materialized in the graph
//! arena or an unresolved location that the resolution engine fetches on
//! first access.

use crate::types::{NodeHandle, NodeType};
use serde_json::{Map, Value};
use std::fmt;

/// Relation role of a link.
///
/// The first variants are the roles the graph interprets; `Other` carries
/// any role that is only passed through to serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rel {
    SelfLink,
    Root,
    Parent,
    Child,
    Item,
    Collection,
    Other(String),
}

impl Rel {
    pub fn as_str(&self) -> &str {
        match self {
            Rel::SelfLink => "self",
            Rel::Root => "root",
            Rel::Parent => "parent",
            Rel::Child => "child",
            Rel::Item => "item",
            Rel::Collection => "collection",
            Rel::Other(rel) => rel,
        }
    }

    /// Roles whose targets point up the hierarchy and are kept consistent by
    /// structural edits rather than set freely.
    pub fn is_back_reference(&self) -> bool {
        matches!(self, Rel::Root | Rel::Parent | Rel::Collection)
    }

    /// Node type implied by the role, when there is one.
    pub fn target_hint(&self) -> Option<NodeType> {
        match self {
            Rel::Item => Some(NodeType::Item),
            Rel::Collection => Some(NodeType::Collection),
            _ => None,
        }
    }
}

impl From<&str> for Rel {
    fn from(value: &str) -> Self {
        match value {
            "self" => Rel::SelfLink,
            "root" => Rel::Root,
            "parent" => Rel::Parent,
            "child" => Rel::Child,
            "item" => Rel::Item,
            "collection" => Rel::Collection,
            other => Rel::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a link points.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    /// Not loaded yet: a location plus an optional hint of what lives there.
    ///
    /// `based` is set once `href` has been resolved against the location of
    /// the document it came from; such an href is used as-is. Otherwise a
    /// relative `href` is taken relative to the owning node's location.
    Unresolved {
        href: String,
        hint: Option<NodeType>,
        based: bool,
    },
    /// A node in the graph arena. `href` remembers the location it was
    /// fetched from, if any, so the resolution can be invalidated.
    Resolved {
        node: NodeHandle,
        href: Option<String>,
    },
}

/// A typed edge from a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub rel: Rel,
    pub target: LinkTarget,
    pub media_type: Option<String>,
    pub title: Option<String>,
    /// Link keys the graph does not model.
    pub extra_fields: Map<String, Value>,
}

impl Link {
    /// Unresolved link to a location.
    pub fn new(rel: impl Into<Rel>, href: impl Into<String>) -> Self {
        let rel = rel.into();
        let hint = rel.target_hint();
        Self {
            rel,
            target: LinkTarget::Unresolved {
                href: href.into(),
                hint,
                based: false,
            },
            media_type: None,
            title: None,
            extra_fields: Map::new(),
        }
    }

    /// Link to a node already held in the graph.
    pub fn resolved(rel: impl Into<Rel>, node: NodeHandle) -> Self {
        Self {
            rel: rel.into(),
            target: LinkTarget::Resolved { node, href: None },
            media_type: None,
            title: None,
            extra_fields: Map::new(),
        }
    }

    /// Unresolved link to an href already resolved to a full location.
    pub fn located(rel: impl Into<Rel>, location: impl Into<String>) -> Self {
        let mut link = Self::new(rel, location);
        if let LinkTarget::Unresolved { based, .. } = &mut link.target {
            *based = true;
        }
        link
    }

    /// The `self` link carrying a node's canonical location.
    pub fn self_href(href: impl Into<String>) -> Self {
        Self::located(Rel::SelfLink, href).with_media_type("application/json")
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.target, LinkTarget::Resolved { .. })
    }

    /// Handle of the target when resolved.
    pub fn node(&self) -> Option<NodeHandle> {
        match self.target {
            LinkTarget::Resolved { node, .. } => Some(node),
            LinkTarget::Unresolved { .. } => None,
        }
    }

    /// Stored location: the unresolved href, or where a resolved target came from.
    pub fn href(&self) -> Option<&str> {
        match &self.target {
            LinkTarget::Unresolved { href, .. } => Some(href),
            LinkTarget::Resolved { href, .. } => href.as_deref(),
        }
    }

    pub fn points_to(&self, handle: NodeHandle) -> bool {
        self.node() == Some(handle)
    }
}

impl From<String> for Rel {
    fn from(value: String) -> Self {
        Rel::from(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_round_trip() {
        for raw in ["self", "root", "parent", "child", "item", "collection", "license"] {
            assert_eq!(Rel::from(raw).as_str(), raw);
        }
        assert_eq!(Rel::from("license"), Rel::Other("license".to_string()));
    }

    #[test]
    fn test_item_links_carry_hint() {
        let link = Link::new(Rel::Item, "./a/a.json");
        assert_eq!(
            link.target,
            LinkTarget::Unresolved {
                href: "./a/a.json".to_string(),
                hint: Some(NodeType::Item),
                based: false
            }
        );
        assert!(!link.is_resolved());
        assert_eq!(link.href(), Some("./a/a.json"));
    }

    #[test]
    fn test_self_links_hold_full_locations() {
        let link = Link::self_href("data/catalog.json");
        assert!(matches!(link.target, LinkTarget::Unresolved { based: true, .. }));
        assert_eq!(link.media_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_resolved_link_has_no_href_until_fetched() {
        let link = Link::resolved(Rel::Child, NodeHandle(3));
        assert!(link.points_to(NodeHandle(3)));
        assert_eq!(link.href(), None);
    }
}
