use serde_json::json;
use stac_graph::document::{from_document, to_document_standalone};
use stac_graph::io::filesystem::canonical_location;
use stac_graph::{Extent, FileSystemIo, Graph, MemoryIo, Node};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::integration::support::{catalog_doc, item_doc};

#[test]
fn unmodeled_top_level_field_survives_round_trip() {
    let doc = json!({
        "type": "Catalog",
        "stac_version": "1.0.0",
        "id": "root",
        "description": "Root",
        "links": [{"rel": "license", "href": "https://example.com/LICENSE", "title": "License"}],
        "custom_ext": {"k": 1}
    });

    let node = from_document(doc.clone(), None).unwrap();
    assert_eq!(node.extra_fields["custom_ext"], json!({"k": 1}));

    let out = to_document_standalone(&node).unwrap();
    assert_eq!(out["custom_ext"], json!({"k": 1}));
    assert_eq!(out["links"], doc["links"]);
    assert_eq!(from_document(out, None).unwrap(), node);
}

#[test]
fn item_round_trip_keeps_properties_and_asset_fields() {
    let mut doc = item_doc("scene", json!([{"rel": "via", "href": "https://example.com/source"}]));
    doc["properties"]["eo:cloud_cover"] = json!(12.5);
    doc["assets"] = json!({
        "thumbnail": {"href": "./thumb.png", "type": "image/png", "proj:shape": [64, 64]}
    });

    let node = from_document(doc, Some("/data/scene/scene.json")).unwrap();
    let asset = &node.assets().unwrap()["thumbnail"];
    assert_eq!(asset.extra_fields["proj:shape"], json!([64, 64]));
    assert_eq!(
        asset.absolute_href(Some("/data/scene/scene.json")),
        "/data/scene/thumb.png"
    );

    let reparsed = from_document(to_document_standalone(&node).unwrap(), None).unwrap();
    assert_eq!(reparsed.properties, node.properties);
    assert_eq!(reparsed.assets(), node.assets());
}

#[test]
fn tree_saved_to_disk_reloads_lazily() {
    let temp_dir = TempDir::new().unwrap();
    let base = canonical_location(temp_dir.path()).unwrap();
    let root_href = format!("{}/catalog.json", base);

    let io = Arc::new(FileSystemIo::new());
    let mut graph = Graph::with_io(io.clone());
    let mut root = Node::catalog("root", "Root");
    root.extra_fields.insert("custom_ext".into(), json!({"k": 1}));
    let root = graph.insert(root);
    let collection = graph.insert(Node::collection("c", "C", "MIT", Extent::unbounded()));
    let item = graph.insert(Node::item("scene"));
    graph.add_child(root, collection).unwrap();
    graph.add_item(collection, item).unwrap();

    graph.normalize_hrefs(root, &root_href).unwrap();
    let written = graph.save(root).unwrap();

    assert_eq!(written.len(), 3);
    for location in &written {
        assert!(Path::new(location).exists(), "{} not written", location);
    }
    assert!(temp_dir.path().join("c/scene/scene.json").exists());

    let mut reloaded = Graph::with_io(io);
    let root = reloaded.read(&root_href).unwrap();
    assert_eq!(reloaded.node(root).extra_fields["custom_ext"], json!({"k": 1}));

    let collection = reloaded.get_child(root, "c").unwrap().unwrap();
    let item = reloaded.get_item(collection, "scene").unwrap().unwrap();
    assert_eq!(reloaded.get_root(item).unwrap(), root);
    assert_eq!(reloaded.get_collection(item).unwrap(), Some(collection));
    assert_eq!(
        reloaded.node(item).item_fields().unwrap().collection.as_deref(),
        Some("c")
    );
}

#[test]
fn tree_under_relative_location_saves_relative_hrefs_and_reloads() {
    let io = Arc::new(MemoryIo::new());
    io.insert("data/catalog.json", &catalog_doc("root", json!([])));

    let mut graph = Graph::with_io(io.clone());
    let root = graph.read("data/catalog.json").unwrap();
    let sub = graph.insert(Node::catalog("sub", "Sub"));
    graph.add_child(root, sub).unwrap();
    let written = graph.save(root).unwrap();
    assert_eq!(written, vec!["data/catalog.json", "data/sub/catalog.json"]);

    let saved_root = io.get("data/catalog.json").unwrap();
    assert_eq!(saved_root["links"][0]["href"], json!("./catalog.json"));
    assert_eq!(saved_root["links"][1]["href"], json!("./sub/catalog.json"));
    let saved_sub = io.get("data/sub/catalog.json").unwrap();
    assert_eq!(saved_sub["links"][0]["href"], json!("../catalog.json"));

    let mut reloaded = Graph::with_io(io);
    let root = reloaded.read("data/catalog.json").unwrap();
    let sub = reloaded.get_child(root, "sub").unwrap().unwrap();
    assert_eq!(reloaded.node(sub).self_href(), Some("data/sub/catalog.json"));
    assert_eq!(reloaded.get_root(sub).unwrap(), root);
}

#[test]
fn missing_file_is_a_resolution_error() {
    let temp_dir = TempDir::new().unwrap();
    let base = canonical_location(temp_dir.path()).unwrap();
    std::fs::write(
        temp_dir.path().join("catalog.json"),
        json!({
            "type": "Catalog",
            "id": "root",
            "description": "Root",
            "links": [{"rel": "child", "href": "./missing/catalog.json"}]
        })
        .to_string(),
    )
    .unwrap();

    let mut graph = Graph::with_io(Arc::new(FileSystemIo::new()));
    let root = graph.read(&format!("{}/catalog.json", base)).unwrap();
    let err = graph.iter_children(root).next().unwrap().unwrap_err();
    assert!(err.is_resolution());
}
