//! Document Serialization
//!
//! Converts nodes to and from the canonical JSON document shape:
//!
//! ```text
//! { "type": ..., "stac_version": ..., "id": ..., <modeled fields>,
//!   "links": [ {"rel", "href", "type"?}, ... ], <passthrough fields> }
//! ```
//!
//! Keys that are not modeled land in `extra_fields` (or, for links and assets,
//! their own passthrough maps) and are written back verbatim. Relative link
//! hrefs are resolved against the document location on load, so a loaded node
//! stores absolute locations only.

mod infer;

use crate::error::StacError;
use crate::href;
use crate::link::{Link, LinkTarget, Rel};
use crate::node::{
    Asset, CatalogFields, CollectionFields, Extent, ItemFields, Node, NodeKind,
};
use crate::types::NodeType;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

/// Parse a document read from `location`.
pub fn from_document(doc: Value, location: Option<&str>) -> Result<Node, StacError> {
    from_document_with_hint(doc, location, None)
}

/// Parse a document, using `hint` when the document has no `type` field.
pub fn from_document_with_hint(
    doc: Value,
    location: Option<&str>,
    hint: Option<NodeType>,
) -> Result<Node, StacError> {
    let mut map = match doc {
        Value::Object(map) => map,
        other => {
            return Err(StacError::format(format!(
                "document must be a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let node_type = match map.shift_remove("type") {
        Some(Value::String(raw)) => NodeType::from_discriminator(&raw).ok_or_else(|| {
            StacError::format(format!("unrecognized type discriminator '{}'", raw))
        })?,
        Some(other) => {
            return Err(StacError::format(format!(
                "type discriminator must be a string, got {}",
                json_kind(&other)
            )))
        }
        None => match hint.or_else(|| infer::infer_node_type(&map)) {
            Some(inferred) => {
                warn!(location = ?location, node_type = %inferred, "document has no type; inferred variant");
                inferred
            }
            None => {
                return Err(StacError::format(
                    "document has no type and its variant cannot be inferred",
                ))
            }
        },
    };

    let id = take_string(&mut map, "id")?
        .ok_or_else(|| StacError::format(format!("{} document is missing 'id'", node_type)))?;
    let object = format!("{} {}", node_type, id);

    let stac_version = take_string(&mut map, "stac_version")?;
    let stac_extensions = match map.shift_remove("stac_extensions") {
        None => None,
        Some(Value::Array(values)) => Some(
            values
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    other => Err(StacError::format(format!(
                        "{}: stac_extensions entries must be strings, got {}",
                        object,
                        json_kind(&other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(other) => {
            return Err(StacError::format(format!(
                "{}: stac_extensions must be an array, got {}",
                object,
                json_kind(&other)
            )))
        }
    };

    let links = match map.shift_remove("links") {
        None => Vec::new(),
        Some(Value::Array(values)) => values
            .into_iter()
            .map(|v| parse_link(v, location, &object))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(StacError::format(format!(
                "{}: links must be an array, got {}",
                object,
                json_kind(&other)
            )))
        }
    };

    let mut properties = Map::new();
    let kind = match node_type {
        NodeType::Catalog => NodeKind::Catalog(CatalogFields {
            description: require_string(&mut map, "description", &object)?,
        }),
        NodeType::Collection => {
            let description = require_string(&mut map, "description", &object)?;
            let license = require_string(&mut map, "license", &object)?;
            let extent_value = map
                .shift_remove("extent")
                .ok_or_else(|| StacError::format(format!("{} is missing 'extent'", object)))?;
            let extent: Extent = serde_json::from_value(extent_value)
                .map_err(|e| StacError::format(format!("{}: malformed extent: {}", object, e)))?;
            let assets = match map.shift_remove("assets") {
                Some(value) => Some(parse_assets(value, &object)?),
                None => None,
            };
            NodeKind::Collection(CollectionFields {
                description,
                license,
                extent,
                assets,
            })
        }
        NodeType::Item => {
            let geometry = map
                .shift_remove("geometry")
                .ok_or_else(|| StacError::format(format!("{} is missing 'geometry'", object)))?;
            check_geometry(&geometry, &object)?;
            let (bbox, null_bbox) = match map.shift_remove("bbox") {
                None => (None, false),
                Some(Value::Null) => (None, true),
                Some(value) => (Some(parse_bbox(value, &object)?), false),
            };
            if !geometry.is_null() && bbox.is_none() {
                return Err(StacError::format(format!(
                    "{} has a geometry but no bbox",
                    object
                )));
            }
            properties = match map.shift_remove("properties") {
                Some(Value::Object(props)) => props,
                Some(other) => {
                    return Err(StacError::format(format!(
                        "{}: properties must be an object, got {}",
                        object,
                        json_kind(&other)
                    )))
                }
                None => {
                    return Err(StacError::format(format!(
                        "{} is missing 'properties'",
                        object
                    )))
                }
            };
            let assets = match map.shift_remove("assets") {
                Some(value) => Some(parse_assets(value, &object)?),
                None => None,
            };
            let collection = take_string(&mut map, "collection")?;
            NodeKind::Item(ItemFields {
                geometry,
                bbox,
                null_bbox,
                assets,
                collection,
            })
        }
    };

    if node_type != NodeType::Item && matches!(map.get("properties"), Some(Value::Object(_))) {
        if let Some(Value::Object(props)) = map.shift_remove("properties") {
            properties = props;
        }
    }

    debug!(id = %id, node_type = %node_type, links = links.len(), extra = map.len(), "parsed document");

    Ok(Node {
        id,
        kind,
        stac_version,
        stac_extensions,
        links,
        properties,
        extra_fields: map,
    })
}

/// Render a node as a document.
///
/// `href_for` supplies the href of each link; the graph uses it to compute
/// locations of in-memory targets.
pub fn to_document<F>(node: &Node, href_for: F) -> Result<Value, StacError>
where
    F: Fn(&Link) -> String,
{
    let mut map = Map::new();
    map.insert(
        "type".to_string(),
        Value::String(node.node_type().discriminator().to_string()),
    );
    if let Some(version) = &node.stac_version {
        map.insert("stac_version".to_string(), Value::String(version.clone()));
    }
    if let Some(extensions) = &node.stac_extensions {
        map.insert(
            "stac_extensions".to_string(),
            Value::Array(extensions.iter().cloned().map(Value::String).collect()),
        );
    }
    map.insert("id".to_string(), Value::String(node.id.clone()));

    match &node.kind {
        NodeKind::Catalog(fields) => {
            map.insert(
                "description".to_string(),
                Value::String(fields.description.clone()),
            );
        }
        NodeKind::Collection(fields) => {
            map.insert(
                "description".to_string(),
                Value::String(fields.description.clone()),
            );
            map.insert("license".to_string(), Value::String(fields.license.clone()));
            map.insert("extent".to_string(), to_json(&fields.extent, &node.id)?);
        }
        NodeKind::Item(fields) => {
            map.insert("geometry".to_string(), fields.geometry.clone());
            match &fields.bbox {
                Some(bbox) => {
                    map.insert(
                        "bbox".to_string(),
                        Value::Array(bbox.iter().cloned().map(Value::Number).collect()),
                    );
                }
                None if fields.null_bbox => {
                    map.insert("bbox".to_string(), Value::Null);
                }
                None => {}
            }
            map.insert(
                "properties".to_string(),
                Value::Object(node.properties.clone()),
            );
        }
    }

    map.insert(
        "links".to_string(),
        Value::Array(
            node.links
                .iter()
                .map(|link| render_link(link, href_for(link)))
                .collect(),
        ),
    );

    match &node.kind {
        NodeKind::Item(fields) => {
            if let Some(assets) = &fields.assets {
                map.insert("assets".to_string(), to_json(assets, &node.id)?);
            }
            if let Some(collection) = &fields.collection {
                map.insert("collection".to_string(), Value::String(collection.clone()));
            }
        }
        NodeKind::Collection(CollectionFields {
            assets: Some(assets),
            ..
        }) => {
            map.insert("assets".to_string(), to_json(assets, &node.id)?);
        }
        _ => {}
    }

    if !node.is_item() && !node.properties.is_empty() {
        map.insert(
            "properties".to_string(),
            Value::Object(node.properties.clone()),
        );
    }

    for (key, value) in &node.extra_fields {
        if map.contains_key(key) {
            warn!(id = %node.id, key = %key, "extra field shadows a modeled field; skipped");
            continue;
        }
        map.insert(key.clone(), value.clone());
    }

    Ok(Value::Object(map))
}

/// Render a node using only the hrefs stored on its links.
///
/// Links to in-memory nodes that were never fetched have no stored href and
/// are rendered with an empty one; use the graph to compute them instead.
pub fn to_document_standalone(node: &Node) -> Result<Value, StacError> {
    to_document(node, |link| link.href().unwrap_or_default().to_string())
}

fn render_link(link: &Link, href: String) -> Value {
    let mut map = Map::new();
    map.insert("rel".to_string(), Value::String(link.rel.as_str().to_string()));
    map.insert("href".to_string(), Value::String(href));
    if let Some(media_type) = &link.media_type {
        map.insert("type".to_string(), Value::String(media_type.clone()));
    }
    if let Some(title) = &link.title {
        map.insert("title".to_string(), Value::String(title.clone()));
    }
    for (key, value) in &link.extra_fields {
        map.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Value::Object(map)
}

fn parse_link(value: Value, location: Option<&str>, object: &str) -> Result<Link, StacError> {
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(StacError::format(format!(
                "{}: link must be an object, got {}",
                object,
                json_kind(&other)
            )))
        }
    };
    let rel = take_string(&mut map, "rel")?
        .ok_or_else(|| StacError::format(format!("{}: link is missing 'rel'", object)))?;
    let raw_href = take_string(&mut map, "href")?
        .ok_or_else(|| StacError::format(format!("{}: {} link is missing 'href'", object, rel)))?;
    let href = match location {
        Some(base) if !href::is_absolute(&raw_href) => href::make_absolute(&raw_href, base),
        _ => raw_href,
    };
    let rel = Rel::from(rel);
    let hint = rel.target_hint();
    Ok(Link {
        rel,
        target: LinkTarget::Unresolved {
            href,
            hint,
            based: location.is_some(),
        },
        media_type: take_string(&mut map, "type")?,
        title: take_string(&mut map, "title")?,
        extra_fields: map,
    })
}

fn parse_assets(value: Value, object: &str) -> Result<IndexMap<String, Asset>, StacError> {
    serde_json::from_value(value)
        .map_err(|e| StacError::format(format!("{}: malformed assets: {}", object, e)))
}

fn check_geometry(geometry: &Value, object: &str) -> Result<(), StacError> {
    match geometry {
        Value::Null => Ok(()),
        Value::Object(map) if map.get("type").is_some_and(Value::is_string) => Ok(()),
        _ => Err(StacError::format(format!(
            "{}: geometry must be null or a GeoJSON object with a type",
            object
        ))),
    }
}

fn parse_bbox(value: Value, object: &str) -> Result<Vec<Number>, StacError> {
    let malformed = || StacError::format(format!("{}: bbox must be 4 or 6 numbers", object));
    let values = match value {
        Value::Array(values) if values.len() == 4 || values.len() == 6 => values,
        _ => return Err(malformed()),
    };
    values
        .into_iter()
        .map(|v| match v {
            Value::Number(n) => Ok(n),
            _ => Err(malformed()),
        })
        .collect()
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<Option<String>, StacError> {
    match map.shift_remove(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(StacError::format(format!(
            "'{}' must be a string, got {}",
            key,
            json_kind(&other)
        ))),
    }
}

fn require_string(
    map: &mut Map<String, Value>,
    key: &str,
    object: &str,
) -> Result<String, StacError> {
    take_string(map, key)?
        .ok_or_else(|| StacError::format(format!("{} is missing '{}'", object, key)))
}

fn to_json<T: serde::Serialize>(value: &T, id: &str) -> Result<Value, StacError> {
    serde_json::to_value(value)
        .map_err(|e| StacError::format(format!("failed to serialize {}: {}", id, e)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
