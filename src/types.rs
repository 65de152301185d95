//! Core types shared across the graph, document and extension layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// STAC version stamped on nodes authored in memory.
pub const STAC_VERSION: &str = "1.0.0";

/// Handle to a node stored in a [`Graph`](crate::graph::Graph) arena.
///
/// Handles are only meaningful for the graph that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) usize);

impl NodeHandle {
    /// Arena slot of this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of catalog node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Catalog,
    Collection,
    Item,
}

impl NodeType {
    /// Value of the `type` discriminator in the document format.
    pub fn discriminator(self) -> &'static str {
        match self {
            NodeType::Catalog => "Catalog",
            NodeType::Collection => "Collection",
            NodeType::Item => "Feature",
        }
    }

    /// Map a `type` discriminator back to a variant.
    pub fn from_discriminator(value: &str) -> Option<Self> {
        match value {
            "Catalog" => Some(NodeType::Catalog),
            "Collection" => Some(NodeType::Collection),
            "Feature" => Some(NodeType::Item),
            _ => None,
        }
    }

    /// File name used by the default layout for nodes of this type.
    pub fn layout_file_name(self, id: &str) -> String {
        match self {
            NodeType::Catalog => "catalog.json".to_string(),
            NodeType::Collection => "collection.json".to_string(),
            NodeType::Item => format!("{}.json", id),
        }
    }

    /// Catalogs and Collections may hold children and items.
    pub fn is_container(self) -> bool {
        !matches!(self, NodeType::Item)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Catalog => "Catalog",
            NodeType::Collection => "Collection",
            NodeType::Item => "Item",
        };
        f.write_str(name)
    }
}
