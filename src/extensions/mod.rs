//! Extensions
//!
//! A node declares the extensions it implements by listing their schema URIs
//! in `stac_extensions`. Extension fields themselves live in the node's
//! passthrough maps, so the helpers here only manage the declarations and
//! typed views over those maps.

pub mod datacube;

pub use datacube::DatacubeExtension;

use crate::node::Node;

/// True if `uri` is listed in the node's `stac_extensions`.
pub fn has_extension(node: &Node, uri: &str) -> bool {
    node.stac_extensions
        .as_ref()
        .is_some_and(|uris| uris.iter().any(|u| u == uri))
}

/// Declare `uri`. Returns false if it was already declared.
pub fn add_extension(node: &mut Node, uri: &str) -> bool {
    if has_extension(node, uri) {
        return false;
    }
    node.stac_extensions
        .get_or_insert_with(Vec::new)
        .push(uri.to_string());
    true
}

/// Drop every declaration of `uri`. Returns false if none existed.
pub fn remove_extension(node: &mut Node, uri: &str) -> bool {
    match node.stac_extensions.as_mut() {
        Some(uris) => {
            let before = uris.len();
            uris.retain(|u| u != uri);
            uris.len() != before
        }
        None => false,
    }
}
