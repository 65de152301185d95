//! Best-effort variant inference for documents without a `type` field.
//!
//! Only consulted after the explicit discriminator and any link-role hint.

use crate::types::NodeType;
use serde_json::{Map, Value};

fn has_temporal_properties(properties: &Value) -> bool {
    properties
        .as_object()
        .map(|props| {
            props.contains_key("datetime")
                || props.contains_key("start_datetime")
                || props.contains_key("end_datetime")
        })
        .unwrap_or(false)
}

fn has_member_links(doc: &Map<String, Value>) -> bool {
    doc.get("links")
        .and_then(Value::as_array)
        .map(|links| {
            links.iter().any(|link| {
                matches!(
                    link.get("rel").and_then(Value::as_str),
                    Some("child") | Some("item")
                )
            })
        })
        .unwrap_or(false)
}

/// Guess the variant of an untyped document.
pub(crate) fn infer_node_type(doc: &Map<String, Value>) -> Option<NodeType> {
    if doc.contains_key("geometry") || doc.get("properties").is_some_and(has_temporal_properties) {
        return Some(NodeType::Item);
    }
    if doc.contains_key("extent") {
        return Some(NodeType::Collection);
    }
    if has_member_links(doc) || doc.contains_key("description") {
        return Some(NodeType::Catalog);
    }
    None
}
