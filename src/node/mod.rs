//! Catalog Nodes
//!
//! A node is one STAC object: a Catalog, a Collection or an Item. Every node
//! owns an ordered list of outbound links, an identifier, and two passthrough
//! maps (`properties` and `extra_fields`) that survive a load/save cycle even
//! for keys nothing here interprets.
//!
//! Links to parents, roots and members are maintained by the graph's
//! structural edits; the node only exposes edits that cannot break
//! bidirectional consistency.

pub mod fields;

pub use fields::{
    Asset, CatalogFields, CollectionFields, Extent, ItemFields, NodeKind, SpatialExtent,
    TemporalExtent,
};

use crate::error::StacError;
use crate::link::{Link, LinkTarget, Rel};
use crate::types::{NodeType, STAC_VERSION};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// A catalog, collection or item.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// `None` when the source document carried no `stac_version`.
    pub stac_version: Option<String>,
    /// `None` when the source document carried no `stac_extensions` key.
    pub stac_extensions: Option<Vec<String>>,
    pub(crate) links: Vec<Link>,
    /// Item `properties` block; for catalogs and collections, a `properties`
    /// key if the document had one.
    pub properties: Map<String, Value>,
    /// Top-level document keys not modeled here.
    pub extra_fields: Map<String, Value>,
}

impl Node {
    fn with_kind(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            stac_version: Some(STAC_VERSION.to_string()),
            stac_extensions: Some(Vec::new()),
            links: Vec::new(),
            properties: Map::new(),
            extra_fields: Map::new(),
        }
    }

    pub fn catalog(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            NodeKind::Catalog(CatalogFields {
                description: description.into(),
            }),
        )
    }

    pub fn collection(
        id: impl Into<String>,
        description: impl Into<String>,
        license: impl Into<String>,
        extent: Extent,
    ) -> Self {
        Self::with_kind(
            id,
            NodeKind::Collection(CollectionFields {
                description: description.into(),
                license: license.into(),
                extent,
                assets: None,
            }),
        )
    }

    /// Item without geometry and with a null `datetime`.
    pub fn item(id: impl Into<String>) -> Self {
        let mut node = Self::with_kind(id, NodeKind::Item(ItemFields::default()));
        node.properties.insert("datetime".to_string(), Value::Null);
        node
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn is_item(&self) -> bool {
        self.node_type() == NodeType::Item
    }

    /// Outbound links in authored or document order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// First link with the given role.
    pub fn link(&self, rel: &Rel) -> Option<&Link> {
        self.links.iter().find(|link| &link.rel == rel)
    }

    /// Positions of every link with the given role, in link order.
    pub fn link_indices(&self, rel: &Rel) -> Vec<usize> {
        self.links
            .iter()
            .enumerate()
            .filter(|(_, link)| &link.rel == rel)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Canonical location from the `self` link.
    pub fn self_href(&self) -> Option<&str> {
        self.link(&Rel::SelfLink).and_then(Link::href)
    }

    /// Replace the `self` link. Exactly one exists afterwards.
    pub fn set_self_href(&mut self, href: impl Into<String>) {
        let link = Link::self_href(href);
        match self.links.iter().position(|l| l.rel == Rel::SelfLink) {
            Some(idx) => {
                self.links[idx] = link;
                let mut seen = false;
                self.links.retain(|l| {
                    if l.rel != Rel::SelfLink {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.links.insert(0, link),
        }
    }

    pub fn clear_self_href(&mut self) {
        self.links.retain(|l| l.rel != Rel::SelfLink);
    }

    /// Append a link to an external location.
    ///
    /// `self` links replace the existing one. Links to in-memory nodes and
    /// back-references to in-memory parents go through the graph instead.
    pub fn add_link(&mut self, link: Link) -> Result<(), StacError> {
        if link.rel == Rel::SelfLink {
            return match link.target {
                LinkTarget::Unresolved { href, .. } => {
                    self.set_self_href(href);
                    Ok(())
                }
                LinkTarget::Resolved { .. } => Err(StacError::InvalidEdit(
                    "a self link must carry a location".to_string(),
                )),
            };
        }
        if link.is_resolved() {
            return Err(StacError::InvalidEdit(format!(
                "{} links to in-memory nodes are managed by the graph",
                link.rel
            )));
        }
        self.links.push(link);
        Ok(())
    }

    /// Remove every link with a passthrough role.
    pub fn remove_links(&mut self, rel: &Rel) -> Result<usize, StacError> {
        if matches!(rel, Rel::Other(_)) {
            let before = self.links.len();
            self.links.retain(|l| &l.rel != rel);
            Ok(before - self.links.len())
        } else {
            Err(StacError::InvalidEdit(format!(
                "{} links are managed by the graph",
                rel
            )))
        }
    }

    pub fn description(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Catalog(fields) => Some(&fields.description),
            NodeKind::Collection(fields) => Some(&fields.description),
            NodeKind::Item(_) => self.properties.get("description").and_then(Value::as_str),
        }
    }

    pub fn title(&self) -> Option<&str> {
        let source = if self.is_item() {
            &self.properties
        } else {
            &self.extra_fields
        };
        source.get("title").and_then(Value::as_str)
    }

    /// The map extension fields live in: `properties` for items, the
    /// top-level passthrough map for catalogs and collections.
    pub fn extension_fields(&self) -> &Map<String, Value> {
        if self.is_item() {
            &self.properties
        } else {
            &self.extra_fields
        }
    }

    pub fn extension_fields_mut(&mut self) -> &mut Map<String, Value> {
        if self.is_item() {
            &mut self.properties
        } else {
            &mut self.extra_fields
        }
    }

    pub fn item_fields(&self) -> Option<&ItemFields> {
        match &self.kind {
            NodeKind::Item(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn item_fields_mut(&mut self) -> Option<&mut ItemFields> {
        match &mut self.kind {
            NodeKind::Item(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn collection_fields(&self) -> Option<&CollectionFields> {
        match &self.kind {
            NodeKind::Collection(fields) => Some(fields),
            _ => None,
        }
    }

    /// Assets of an item or collection.
    pub fn assets(&self) -> Option<&IndexMap<String, Asset>> {
        match &self.kind {
            NodeKind::Item(ItemFields { assets, .. })
            | NodeKind::Collection(CollectionFields { assets, .. }) => assets.as_ref(),
            NodeKind::Catalog(_) => None,
        }
    }

    /// Mutable assets; creates the asset map on first use.
    pub fn assets_mut(&mut self) -> Option<&mut IndexMap<String, Asset>> {
        match &mut self.kind {
            NodeKind::Item(ItemFields { assets, .. })
            | NodeKind::Collection(CollectionFields { assets, .. }) => {
                Some(assets.get_or_insert_with(IndexMap::new))
            }
            NodeKind::Catalog(_) => None,
        }
    }

    /// Item bounding box as floats.
    pub fn bbox(&self) -> Option<Vec<f64>> {
        self.item_fields()
            .and_then(|fields| fields.bbox.as_ref())
            .map(|bbox| bbox.iter().filter_map(Number::as_f64).collect())
    }

    /// Set an item's geometry and bounding box together.
    pub fn set_geometry(&mut self, geometry: Value, bbox: Option<Vec<f64>>) -> Result<(), StacError> {
        let node_type = self.node_type();
        let fields = self.item_fields_mut().ok_or(StacError::Type {
            operation: "set_geometry",
            expected: "Item",
            found: node_type,
        })?;
        let bbox = match bbox {
            Some(values) => Some(
                values
                    .into_iter()
                    .map(|v| {
                        Number::from_f64(v)
                            .ok_or_else(|| StacError::format("bbox values must be finite"))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        fields.geometry = geometry;
        fields.bbox = bbox;
        fields.null_bbox = false;
        Ok(())
    }

    /// Item `properties.datetime`.
    pub fn datetime(&self) -> Result<Option<DateTime<Utc>>, StacError> {
        match self.properties.get("datetime") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|e| {
                    StacError::format(format!("item {} has invalid datetime {}: {}", self.id, raw, e))
                }),
            Some(other) => Err(StacError::format(format!(
                "item {} datetime must be a string, got {}",
                self.id, other
            ))),
        }
    }

    pub fn set_datetime(&mut self, datetime: Option<DateTime<Utc>>) {
        let value = match datetime {
            Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => Value::Null,
        };
        self.properties.insert("datetime".to_string(), value);
    }
}
