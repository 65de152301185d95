use serde_json::json;
use stac_graph::{Extent, Graph, Link, MemoryIo, Node, NodeType, Rel, StacError};
use std::sync::Arc;

use crate::integration::support::{catalog_doc, seeded};

fn graph() -> Graph {
    Graph::with_io(Arc::new(MemoryIo::new()))
}

fn rels(graph: &Graph, node: stac_graph::NodeHandle) -> Vec<String> {
    graph
        .node(node)
        .links()
        .iter()
        .map(|l| l.rel.to_string())
        .collect()
}

#[test]
fn mutual_children_are_rejected_and_leave_links_untouched() {
    let mut graph = graph();
    let a = graph.insert(Node::catalog("a", "A"));
    let b = graph.insert(Node::catalog("b", "B"));
    graph.add_child(a, b).unwrap();

    let a_before: Vec<Link> = graph.node(a).links().to_vec();
    let b_before: Vec<Link> = graph.node(b).links().to_vec();

    let err = graph.add_child(b, a).unwrap_err();
    assert!(matches!(err, StacError::Cycle { .. }));
    assert_eq!(graph.node(a).links(), a_before.as_slice());
    assert_eq!(graph.node(b).links(), b_before.as_slice());
}

#[test]
fn deep_cycle_and_self_child_are_rejected() {
    let mut graph = graph();
    let a = graph.insert(Node::catalog("a", "A"));
    let b = graph.insert(Node::catalog("b", "B"));
    let c = graph.insert(Node::catalog("c", "C"));
    graph.add_child(a, b).unwrap();
    graph.add_child(b, c).unwrap();

    assert!(matches!(graph.add_child(c, a), Err(StacError::Cycle { .. })));
    assert!(matches!(graph.add_child(c, c), Err(StacError::Cycle { .. })));
}

#[test]
fn variant_mismatches_are_type_errors() {
    let mut graph = graph();
    let catalog = graph.insert(Node::catalog("root", "Root"));
    let item = graph.insert(Node::item("scene"));
    let other = graph.insert(Node::item("other"));

    assert!(matches!(
        graph.add_child(catalog, item),
        Err(StacError::Type { found: NodeType::Item, .. })
    ));
    assert!(matches!(
        graph.add_item(item, other),
        Err(StacError::Type { operation: "add_item", .. })
    ));
    assert!(matches!(
        graph.add_item(catalog, catalog),
        Err(StacError::Type { found: NodeType::Catalog, .. })
    ));
    assert!(graph.node(catalog).links().is_empty());
}

#[test]
fn link_order_is_kept_through_iteration_and_serialization() {
    let io = seeded(vec![
        (
            "/order/catalog.json",
            catalog_doc(
                "root",
                json!([
                    {"rel": "child", "href": "./x/catalog.json"},
                    {"rel": "child", "href": "./y/catalog.json"},
                    {"rel": "item", "href": "./z/z.json"}
                ]),
            ),
        ),
        ("/order/x/catalog.json", catalog_doc("x", json!([]))),
        ("/order/y/catalog.json", catalog_doc("y", json!([]))),
    ]);
    let mut graph = Graph::with_io(io);
    let root = graph.read("/order/catalog.json").unwrap();

    let children: Vec<_> = graph.iter_children(root).map(|child| child.unwrap()).collect();
    let ids: Vec<&str> = children.iter().map(|c| graph.node(*c).id.as_str()).collect();
    assert_eq!(ids, vec!["x", "y"]);

    let doc = graph.to_document(root).unwrap();
    let links: Vec<(&str, &str)> = doc["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| (l["rel"].as_str().unwrap(), l["href"].as_str().unwrap()))
        .collect();
    assert_eq!(
        links,
        vec![
            ("self", "/order/catalog.json"),
            ("child", "./x/catalog.json"),
            ("child", "./y/catalog.json"),
            ("item", "/order/z/z.json"),
        ]
    );
}

#[test]
fn added_members_get_parent_and_root_links() {
    let mut graph = graph();
    let root = graph.insert(Node::catalog("root", "Root"));
    let collection = graph.insert(Node::collection("c", "C", "MIT", Extent::unbounded()));
    let item = graph.insert(Node::item("scene"));
    graph.add_child(root, collection).unwrap();
    graph.add_item(collection, item).unwrap();

    assert_eq!(rels(&graph, root), vec!["child"]);
    assert_eq!(rels(&graph, collection), vec!["parent", "root", "item"]);
    assert_eq!(rels(&graph, item), vec!["parent", "root", "collection"]);

    assert_eq!(graph.get_root(item).unwrap(), root);
    assert_eq!(graph.get_collection(item).unwrap(), Some(collection));
    assert_eq!(
        graph.node(item).item_fields().unwrap().collection.as_deref(),
        Some("c")
    );
}

#[test]
fn removed_subtree_is_rerooted_at_the_removed_member() {
    let mut graph = graph();
    let root = graph.insert(Node::catalog("root", "Root"));
    let collection = graph.insert(Node::collection("c", "C", "MIT", Extent::unbounded()));
    let item = graph.insert(Node::item("scene"));
    graph.add_child(root, collection).unwrap();
    graph.add_item(collection, item).unwrap();

    let removed = graph.remove_child(root, "c").unwrap();
    assert_eq!(removed, collection);
    assert!(graph.node(root).links().is_empty());
    assert_eq!(graph.get_parent(collection).unwrap(), None);
    assert_eq!(graph.get_root(item).unwrap(), collection);

    assert!(matches!(
        graph.remove_child(root, "c"),
        Err(StacError::NotFound(_))
    ));
}

#[test]
fn removed_item_loses_its_collection() {
    let mut graph = graph();
    let collection = graph.insert(Node::collection("c", "C", "MIT", Extent::unbounded()));
    let item = graph.insert(Node::item("scene"));
    graph.add_item(collection, item).unwrap();

    graph.remove_item(collection, "scene").unwrap();

    assert_eq!(graph.get_collection(item).unwrap(), None);
    assert_eq!(graph.node(item).item_fields().unwrap().collection, None);
    assert!(!graph.node(item).links().iter().any(|l| l.rel == Rel::Parent));
}
