use serde_json::json;
use stac_graph::config::ConfigLoader;
use stac_graph::extensions::datacube::{Dimension, SCHEMA_URI};
use stac_graph::extensions::{has_extension, DatacubeExtension};
use stac_graph::io::filesystem::canonical_location;
use stac_graph::{
    FileSystemIo, Graph, JsonSchemaValidator, MemoryIo, Node, NodeType, StacError,
    ValidationMode,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::integration::support::parent_chain;

fn datacube_fixture() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/datacube/item.json");
    canonical_location(&path).unwrap()
}

#[test]
fn datacube_item_loads_from_disk() {
    let mut graph = Graph::with_io(Arc::new(FileSystemIo::new()));
    let item = graph.read(&datacube_fixture()).unwrap();
    assert!(has_extension(graph.node(item), SCHEMA_URI));

    let ext = DatacubeExtension::ext(graph.node_mut(item), false).unwrap();
    let dimensions = ext.dimensions().unwrap();
    let names: Vec<&str> = dimensions.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["x", "y", "pressure_levels", "time", "spectral"]);

    match &dimensions["pressure_levels"] {
        Dimension::VerticalSpatial(dim) => {
            assert_eq!(dim.unit(), Some("Pa"));
            assert_eq!(dim.extent(), Some(vec![Some(0.0), Some(1000.0)]));
        }
        other => panic!("unexpected dimension {:?}", other),
    }
    assert_eq!(ext.variables().unwrap()["tmax"].unit(), Some("degrees C"));
}

#[test]
fn datacube_edits_are_written_back() {
    let io = Arc::new(MemoryIo::new());
    let mut graph = Graph::with_io(io.clone());
    let mut node = Node::item("cube");
    node.set_self_href("/cubes/cube.json");
    let item = graph.insert(node);

    {
        let mut ext = DatacubeExtension::ext(graph.node_mut(item), true).unwrap();
        let mut dimensions = indexmap::IndexMap::new();
        dimensions.insert(
            "band".to_string(),
            Dimension::from_value(json!({"type": "bands", "values": ["red", "nir"]})).unwrap(),
        );
        ext.apply(&dimensions);
    }
    graph.save(item).unwrap();

    let saved = io.get("/cubes/cube.json").unwrap();
    assert_eq!(saved["stac_extensions"], json!([SCHEMA_URI]));
    assert_eq!(
        saved["properties"]["cube:dimensions"]["band"]["values"],
        json!(["red", "nir"])
    );
}

fn validator() -> JsonSchemaValidator {
    let mut validator = JsonSchemaValidator::new();
    validator
        .register_core(
            NodeType::Catalog,
            "1.0.0",
            &json!({
                "type": "object",
                "required": ["id", "description", "title"],
                "properties": {"title": {"type": "string"}}
            }),
        )
        .unwrap();
    validator
}

#[test]
fn validation_rejects_or_collects() {
    let mut graph = Graph::with_io(Arc::new(MemoryIo::new()));
    let untitled = graph.insert(Node::catalog("root", "Root"));
    let validator = validator();

    let err = graph
        .validate(untitled, &validator, ValidationMode::Reject)
        .unwrap_err();
    assert!(matches!(err, StacError::Validation { .. }));

    let result = graph
        .validate(untitled, &validator, ValidationMode::Collect)
        .unwrap();
    assert!(!result.ok);
    assert!(!result.messages.is_empty());

    let mut titled = Node::catalog("titled", "Titled");
    titled.extra_fields.insert("title".into(), json!("A title"));
    let titled = graph.insert(titled);
    assert!(graph
        .validate(titled, &validator, ValidationMode::Reject)
        .unwrap()
        .ok);
}

#[test]
fn validation_without_a_core_schema_is_not_found() {
    let mut graph = Graph::with_io(Arc::new(MemoryIo::new()));
    let item = graph.insert(Node::item("scene"));
    assert!(matches!(
        graph.validate(item, &validator(), ValidationMode::Collect),
        Err(StacError::NotFound(_))
    ));
}

#[test]
fn loaded_configuration_drives_graph_and_validator() {
    let temp_dir = TempDir::new().unwrap();
    let schema_dir = temp_dir.path().join("schemas");
    std::fs::create_dir(&schema_dir).unwrap();
    std::fs::write(
        schema_dir.join("catalog.json"),
        json!({"type": "object", "required": ["title"]}).to_string(),
    )
    .unwrap();
    let config_path = temp_dir.path().join("stac.toml");
    std::fs::write(
        &config_path,
        format!(
            "[resolution]\nmax_hops = 3\n\n[validation]\nmode = \"collect\"\nschema_dir = \"{}\"\n",
            schema_dir.display()
        ),
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_path).unwrap();
    let validator = JsonSchemaValidator::from_config(&config.validation, "1.0.0").unwrap();

    let mut graph = Graph::from_config(Arc::new(MemoryIo::new()), &config);
    assert_eq!(graph.validation_mode(), ValidationMode::Collect);
    let untitled = graph.insert(Node::catalog("root", "Root"));
    let result = graph.check(untitled, &validator).unwrap();
    assert!(!result.ok);

    let mut chained = Graph::from_config(parent_chain(10), &config);
    let leaf = chained.read("/chain/n9.json").unwrap();
    assert!(chained.get_root(leaf).unwrap_err().to_string().contains("3 hops"));
}
