use serde_json::json;
use stac_graph::config::ResolutionConfig;
use stac_graph::{Graph, Rel, StacError};

use crate::integration::support::{catalog_doc, item_doc, parent_chain, seeded};

#[test]
fn child_resolves_relative_to_parent_location_with_one_fetch() {
    let io = seeded(vec![
        (
            "/root/catalog.json",
            catalog_doc("root", json!([{"rel": "child", "href": "sub/catalog.json"}])),
        ),
        ("/root/sub/catalog.json", catalog_doc("sub", json!([]))),
    ]);
    let mut graph = Graph::with_io(io.clone());
    let root = graph.read("/root/catalog.json").unwrap();

    let children: Vec<_> = graph.iter_children(root).collect::<Result<_, _>>().unwrap();

    assert_eq!(children.len(), 1);
    assert_eq!(io.read_count("/root/sub/catalog.json"), 1);
    assert_eq!(io.total_reads(), 2);
    assert_eq!(
        graph.node(children[0]).self_href(),
        Some("/root/sub/catalog.json")
    );
}

#[test]
fn child_of_relative_location_resolves_against_it_once() {
    let io = seeded(vec![
        (
            "data/catalog.json",
            catalog_doc("root", json!([{"rel": "child", "href": "sub/catalog.json"}])),
        ),
        (
            "data/sub/catalog.json",
            catalog_doc("sub", json!([{"rel": "parent", "href": "../catalog.json"}])),
        ),
    ]);
    let mut graph = Graph::with_io(io.clone());
    let root = graph.read("data/catalog.json").unwrap();

    let children: Vec<_> = graph.iter_children(root).collect::<Result<_, _>>().unwrap();

    assert_eq!(children.len(), 1);
    assert_eq!(io.read_count("data/sub/catalog.json"), 1);
    assert_eq!(
        graph.node(children[0]).self_href(),
        Some("data/sub/catalog.json")
    );
    assert_eq!(graph.get_parent(children[0]).unwrap(), Some(root));
    assert_eq!(io.total_reads(), 2);
}

#[test]
fn resolving_twice_fetches_once() {
    let io = seeded(vec![
        (
            "/root/catalog.json",
            catalog_doc("root", json!([{"rel": "child", "href": "./sub/catalog.json"}])),
        ),
        (
            "/root/sub/catalog.json",
            catalog_doc(
                "sub",
                json!([
                    {"rel": "parent", "href": "../catalog.json"},
                    {"rel": "root", "href": "../catalog.json"}
                ]),
            ),
        ),
    ]);
    let mut graph = Graph::with_io(io.clone());
    let root = graph.read("/root/catalog.json").unwrap();

    let first = graph.resolve(root, &Rel::Child).unwrap();
    let second = graph.resolve(root, &Rel::Child).unwrap();
    assert_eq!(first, second);

    // Back-references land on the node already in memory.
    assert_eq!(graph.get_parent(first).unwrap(), Some(root));
    assert_eq!(graph.get_root(first).unwrap(), root);

    assert_eq!(io.read_count("/root/sub/catalog.json"), 1);
    assert_eq!(io.read_count("/root/catalog.json"), 1);
}

#[test]
fn missing_link_role_is_not_found() {
    let io = seeded(vec![("/root/catalog.json", catalog_doc("root", json!([])))]);
    let mut graph = Graph::with_io(io);
    let root = graph.read("/root/catalog.json").unwrap();

    assert!(matches!(
        graph.resolve(root, &Rel::Child),
        Err(StacError::NotFound(_))
    ));
    assert_eq!(graph.get_parent(root).unwrap(), None);
}

#[test]
fn unreadable_child_does_not_hide_its_siblings() {
    let io = seeded(vec![
        (
            "/root/catalog.json",
            catalog_doc(
                "root",
                json!([
                    {"rel": "child", "href": "./gone/catalog.json"},
                    {"rel": "child", "href": "./here/catalog.json"}
                ]),
            ),
        ),
        ("/root/here/catalog.json", catalog_doc("here", json!([]))),
    ]);
    let mut graph = Graph::with_io(io);
    let root = graph.read("/root/catalog.json").unwrap();

    let results: Vec<_> = graph.iter_children(root).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].as_ref().unwrap_err().is_resolution());
    let here = *results[1].as_ref().unwrap();
    assert_eq!(graph.node(here).id, "here");

    // The failed link stays unresolved; the good one stays bound.
    let links = graph.node(root).links();
    assert!(!links[1].is_resolved());
    assert!(links[2].is_resolved());
}

#[test]
fn root_walk_over_parent_chain_fetches_each_ancestor_once() {
    let io = parent_chain(10);
    let mut graph = Graph::with_io(io.clone());
    let leaf = graph.read("/chain/n9.json").unwrap();

    let root = graph.get_root(leaf).unwrap();

    assert_eq!(graph.node(root).id, "n0");
    assert_eq!(io.total_reads(), 10);
    assert_eq!(graph.get_root(leaf).unwrap(), root);
    assert_eq!(io.total_reads(), 10);
}

#[test]
fn root_walk_longer_than_hop_guard_fails() {
    let io = parent_chain(10);
    let mut graph = Graph::with_config(io, ResolutionConfig { max_hops: 3 });
    let leaf = graph.read("/chain/n9.json").unwrap();

    let err = graph.get_root(leaf).unwrap_err();
    assert!(err.is_resolution());
    assert!(err.to_string().contains("3 hops"));
}

#[test]
fn root_walk_through_parent_loop_fails() {
    let io = seeded(vec![
        (
            "/loop/a.json",
            catalog_doc("a", json!([{"rel": "parent", "href": "b.json"}])),
        ),
        (
            "/loop/b.json",
            catalog_doc("b", json!([{"rel": "parent", "href": "a.json"}])),
        ),
    ]);
    let mut graph = Graph::with_io(io.clone());
    let a = graph.read("/loop/a.json").unwrap();

    assert!(graph.get_root(a).unwrap_err().is_resolution());
    assert_eq!(io.total_reads(), 2);
}

#[test]
fn item_reaches_its_collection_through_cache() {
    let io = seeded(vec![
        (
            "/c/collection.json",
            json!({
                "type": "Collection",
                "stac_version": "1.0.0",
                "id": "c",
                "description": "A collection",
                "license": "MIT",
                "extent": {
                    "spatial": {"bbox": [[-180.0, -90.0, 180.0, 90.0]]},
                    "temporal": {"interval": [[null, null]]}
                },
                "links": [{"rel": "item", "href": "./i/i.json"}]
            }),
        ),
        (
            "/c/i/i.json",
            item_doc(
                "i",
                json!([
                    {"rel": "collection", "href": "../collection.json"},
                    {"rel": "parent", "href": "../collection.json"}
                ]),
            ),
        ),
    ]);
    let mut graph = Graph::with_io(io.clone());
    let collection = graph.read("/c/collection.json").unwrap();
    let item = graph.get_item(collection, "i").unwrap().unwrap();

    assert_eq!(graph.get_collection(item).unwrap(), Some(collection));
    assert_eq!(graph.get_item(collection, "nope").unwrap(), None);
    assert_eq!(io.read_count("/c/collection.json"), 1);
}
