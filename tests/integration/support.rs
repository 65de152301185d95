use serde_json::{json, Value};
use stac_graph::MemoryIo;
use std::sync::Arc;

pub fn catalog_doc(id: &str, links: Value) -> Value {
    json!({
        "type": "Catalog",
        "stac_version": "1.0.0",
        "id": id,
        "description": format!("{} catalog", id),
        "links": links,
    })
}

pub fn item_doc(id: &str, links: Value) -> Value {
    json!({
        "type": "Feature",
        "stac_version": "1.0.0",
        "id": id,
        "geometry": null,
        "properties": {"datetime": "2021-06-01T00:00:00Z"},
        "links": links,
        "assets": {},
    })
}

/// Store seeded with `(location, document)` pairs.
pub fn seeded(documents: Vec<(&str, Value)>) -> Arc<MemoryIo> {
    let io = Arc::new(MemoryIo::new());
    for (location, doc) in documents {
        io.insert(location, &doc);
    }
    io
}

/// `count` catalogs at `/chain/n{i}.json`, each pointing at the previous one
/// as its parent. `n0` has no parent.
pub fn parent_chain(count: usize) -> Arc<MemoryIo> {
    let io = Arc::new(MemoryIo::new());
    for i in 0..count {
        let links = if i == 0 {
            json!([])
        } else {
            json!([{"rel": "parent", "href": format!("n{}.json", i - 1)}])
        };
        io.insert(format!("/chain/n{}.json", i), &catalog_doc(&format!("n{}", i), links));
    }
    io
}
