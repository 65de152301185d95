//! Variant-specific modeled fields.

use crate::types::NodeType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Modeled fields of each node variant.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Catalog(CatalogFields),
    Collection(CollectionFields),
    Item(ItemFields),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Catalog(_) => NodeType::Catalog,
            NodeKind::Collection(_) => NodeType::Collection,
            NodeKind::Item(_) => NodeType::Item,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogFields {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionFields {
    pub description: String,
    pub license: String,
    pub extent: Extent,
    /// Collection-level assets; `None` when the document had no `assets` key.
    pub assets: Option<IndexMap<String, Asset>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    /// GeoJSON geometry, or `Value::Null`.
    pub geometry: Value,
    /// Kept as JSON numbers so integer coordinates are written back unchanged.
    pub bbox: Option<Vec<Number>>,
    /// The document carried an explicit `"bbox": null`.
    pub null_bbox: bool,
    /// `None` when the document had no `assets` key.
    pub assets: Option<IndexMap<String, Asset>>,
    /// Identifier of the owning collection.
    pub collection: Option<String>,
}

impl Default for ItemFields {
    fn default() -> Self {
        Self {
            geometry: Value::Null,
            bbox: None,
            null_bbox: false,
            assets: Some(IndexMap::new()),
            collection: None,
        }
    }
}

/// Spatial and temporal extent of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
    #[serde(flatten)]
    pub extra_fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub bbox: Vec<Vec<Number>>,
    #[serde(flatten)]
    pub extra_fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub interval: Vec<[Option<String>; 2]>,
    #[serde(flatten)]
    pub extra_fields: Map<String, Value>,
}

impl Extent {
    /// Whole-world extent with an open temporal interval.
    pub fn unbounded() -> Self {
        let bbox = [-180, -90, 180, 90].into_iter().map(Number::from).collect();
        Self {
            spatial: SpatialExtent {
                bbox: vec![bbox],
                extra_fields: Map::new(),
            },
            temporal: TemporalExtent {
                interval: vec![[None, None]],
                extra_fields: Map::new(),
            },
            extra_fields: Map::new(),
        }
    }

    /// Spatial bounding boxes as floats.
    pub fn bboxes(&self) -> Vec<Vec<f64>> {
        self.spatial
            .bbox
            .iter()
            .map(|bbox| bbox.iter().filter_map(Number::as_f64).collect())
            .collect()
    }
}

/// A resource referenced by an item or collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Every other asset key, including extension fields.
    #[serde(flatten)]
    pub extra_fields: Map<String, Value>,
}

impl Asset {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: None,
            media_type: None,
            roles: None,
            extra_fields: Map::new(),
        }
    }

    /// The asset href resolved against its owner's location.
    pub fn absolute_href(&self, owner_location: Option<&str>) -> String {
        match owner_location {
            Some(base) => crate::href::make_absolute(&self.href, base),
            None => self.href.clone(),
        }
    }
}
