//! Datacube extension
//!
//! Typed access to `cube:dimensions` and `cube:variables` on Collections,
//! Items and Assets. Dimensions and variables are thin wrappers over their
//! JSON objects; unknown keys inside them are kept as they are.

use crate::error::StacError;
use crate::extensions::{add_extension, has_extension};
use crate::node::{Asset, Node, NodeKind};
use indexmap::IndexMap;
use serde_json::{Map, Value};

pub const SCHEMA_URI: &str = "https://stac-extensions.github.io/datacube/v1.0.0/schema.json";

pub const DIMENSIONS_PROP: &str = "cube:dimensions";
pub const VARIABLES_PROP: &str = "cube:variables";

const DIM_TYPE: &str = "type";
const DIM_DESCRIPTION: &str = "description";
const DIM_AXIS: &str = "axis";
const DIM_EXTENT: &str = "extent";
const DIM_VALUES: &str = "values";
const DIM_STEP: &str = "step";
const DIM_REFERENCE_SYSTEM: &str = "reference_system";
const DIM_UNIT: &str = "unit";

const VAR_TYPE: &str = "type";
const VAR_DESCRIPTION: &str = "description";
const VAR_DIMENSIONS: &str = "dimensions";
const VAR_VALUES: &str = "values";
const VAR_EXTENT: &str = "extent";
const VAR_STEP: &str = "step";
const VAR_UNIT: &str = "unit";
const VAR_SHAPE: &str = "shape";
const VAR_CHUNKS: &str = "chunks";
const VAR_ATTRS: &str = "attrs";

const DIMENSION_OBJECT: &str = "cube:dimension";
const VARIABLE_OBJECT: &str = "cube:variables";

fn required<'v>(properties: &'v Map<String, Value>, object: &str, key: &str) -> Result<&'v Value, StacError> {
    match properties.get(key) {
        None | Some(Value::Null) => Err(StacError::missing(object, key)),
        Some(value) => Ok(value),
    }
}

fn required_str<'v>(properties: &'v Map<String, Value>, object: &str, key: &str) -> Result<&'v str, StacError> {
    required(properties, object, key)?
        .as_str()
        .ok_or_else(|| StacError::format(format!("{} '{}' must be a string", object, key)))
}

fn set_or_remove(properties: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            properties.insert(key.to_string(), value);
        }
        None => {
            properties.shift_remove(key);
        }
    }
}

fn opt_str<'v>(properties: &'v Map<String, Value>, key: &str) -> Option<&'v str> {
    properties.get(key).and_then(Value::as_str)
}

fn opt_array<'v>(properties: &'v Map<String, Value>, key: &str) -> Option<&'v Vec<Value>> {
    properties.get(key).and_then(Value::as_array)
}

fn float_values(values: &[Value]) -> Vec<Option<f64>> {
    values.iter().map(Value::as_f64).collect()
}

fn float_array(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|v| Value::from(*v)).collect())
}

fn optional_float_array(values: &[Option<f64>]) -> Value {
    Value::Array(
        values
            .iter()
            .map(|v| v.map(Value::from).unwrap_or(Value::Null))
            .collect(),
    )
}

fn integer_array(values: &[u64]) -> Value {
    Value::Array(values.iter().map(|v| Value::from(*v)).collect())
}

fn string_array(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

/// Accessors shared by every dimension variant.
macro_rules! dimension_common {
    ($name:ident) => {
        impl $name {
            pub fn new(properties: Map<String, Value>) -> Self {
                Self { properties }
            }

            pub fn properties(&self) -> &Map<String, Value> {
                &self.properties
            }

            pub fn properties_mut(&mut self) -> &mut Map<String, Value> {
                &mut self.properties
            }

            pub fn dim_type(&self) -> Result<&str, StacError> {
                required_str(&self.properties, DIMENSION_OBJECT, DIM_TYPE)
            }

            pub fn set_dim_type(&mut self, dim_type: impl Into<String>) {
                self.properties
                    .insert(DIM_TYPE.to_string(), Value::String(dim_type.into()));
            }

            pub fn description(&self) -> Option<&str> {
                opt_str(&self.properties, DIM_DESCRIPTION)
            }

            pub fn set_description(&mut self, description: Option<String>) {
                set_or_remove(&mut self.properties, DIM_DESCRIPTION, description.map(Value::String));
            }

            /// Remove `step` entirely; `set_step(None)` instead marks the
            /// dimension as irregularly spaced.
            pub fn clear_step(&mut self) {
                self.properties.shift_remove(DIM_STEP);
            }
        }
    };
}

/// Horizontal spatial (`x`/`y`) dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalSpatialDimension {
    properties: Map<String, Value>,
}

/// Vertical spatial (`z`) dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalSpatialDimension {
    properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemporalDimension {
    properties: Map<String, Value>,
}

/// Any dimension type other than spatial or temporal.
#[derive(Debug, Clone, PartialEq)]
pub struct AdditionalDimension {
    properties: Map<String, Value>,
}

dimension_common!(HorizontalSpatialDimension);
dimension_common!(VerticalSpatialDimension);
dimension_common!(TemporalDimension);
dimension_common!(AdditionalDimension);

impl HorizontalSpatialDimension {
    pub fn axis(&self) -> Result<&str, StacError> {
        required_str(&self.properties, DIMENSION_OBJECT, DIM_AXIS)
    }

    pub fn set_axis(&mut self, axis: impl Into<String>) {
        self.properties
            .insert(DIM_AXIS.to_string(), Value::String(axis.into()));
    }

    pub fn extent(&self) -> Result<Vec<f64>, StacError> {
        required(&self.properties, DIMENSION_OBJECT, DIM_EXTENT)?
            .as_array()
            .and_then(|values| values.iter().map(Value::as_f64).collect())
            .ok_or_else(|| StacError::format("spatial dimension extent must be numbers"))
    }

    pub fn set_extent(&mut self, extent: &[f64]) {
        self.properties
            .insert(DIM_EXTENT.to_string(), float_array(extent));
    }

    pub fn values(&self) -> Option<Vec<f64>> {
        opt_array(&self.properties, DIM_VALUES)
            .and_then(|values| values.iter().map(Value::as_f64).collect())
    }

    pub fn set_values(&mut self, values: Option<&[f64]>) {
        set_or_remove(&mut self.properties, DIM_VALUES, values.map(float_array));
    }

    pub fn step(&self) -> Option<f64> {
        self.properties.get(DIM_STEP).and_then(Value::as_f64)
    }

    pub fn set_step(&mut self, step: Option<f64>) {
        self.properties.insert(
            DIM_STEP.to_string(),
            step.map(Value::from).unwrap_or(Value::Null),
        );
    }

    /// EPSG code, WKT2 string or PROJJSON object.
    pub fn reference_system(&self) -> Option<&Value> {
        self.properties.get(DIM_REFERENCE_SYSTEM)
    }

    pub fn set_reference_system(&mut self, reference_system: Option<Value>) {
        set_or_remove(&mut self.properties, DIM_REFERENCE_SYSTEM, reference_system);
    }
}

impl VerticalSpatialDimension {
    pub fn axis(&self) -> Result<&str, StacError> {
        required_str(&self.properties, DIMENSION_OBJECT, DIM_AXIS)
    }

    pub fn set_axis(&mut self, axis: impl Into<String>) {
        self.properties
            .insert(DIM_AXIS.to_string(), Value::String(axis.into()));
    }

    /// Open-ended bounds are `None`.
    pub fn extent(&self) -> Option<Vec<Option<f64>>> {
        opt_array(&self.properties, DIM_EXTENT).map(|values| float_values(values))
    }

    pub fn set_extent(&mut self, extent: Option<&[Option<f64>]>) {
        set_or_remove(&mut self.properties, DIM_EXTENT, extent.map(optional_float_array));
    }

    /// Numbers or strings.
    pub fn values(&self) -> Option<&Vec<Value>> {
        opt_array(&self.properties, DIM_VALUES)
    }

    pub fn set_values(&mut self, values: Option<Vec<Value>>) {
        set_or_remove(&mut self.properties, DIM_VALUES, values.map(Value::Array));
    }

    pub fn step(&self) -> Option<f64> {
        self.properties.get(DIM_STEP).and_then(Value::as_f64)
    }

    pub fn set_step(&mut self, step: Option<f64>) {
        self.properties.insert(
            DIM_STEP.to_string(),
            step.map(Value::from).unwrap_or(Value::Null),
        );
    }

    pub fn unit(&self) -> Option<&str> {
        opt_str(&self.properties, DIM_UNIT)
    }

    pub fn set_unit(&mut self, unit: Option<String>) {
        set_or_remove(&mut self.properties, DIM_UNIT, unit.map(Value::String));
    }

    pub fn reference_system(&self) -> Option<&Value> {
        self.properties.get(DIM_REFERENCE_SYSTEM)
    }

    pub fn set_reference_system(&mut self, reference_system: Option<Value>) {
        set_or_remove(&mut self.properties, DIM_REFERENCE_SYSTEM, reference_system);
    }
}

impl TemporalDimension {
    /// ISO 8601 bounds; open-ended bounds are `None`.
    pub fn extent(&self) -> Option<Vec<Option<String>>> {
        opt_array(&self.properties, DIM_EXTENT).map(|values| {
            values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect()
        })
    }

    pub fn set_extent(&mut self, extent: Option<&[Option<String>]>) {
        let value = extent.map(|bounds| {
            Value::Array(
                bounds
                    .iter()
                    .map(|b| b.clone().map(Value::String).unwrap_or(Value::Null))
                    .collect(),
            )
        });
        set_or_remove(&mut self.properties, DIM_EXTENT, value);
    }

    pub fn values(&self) -> Option<Vec<String>> {
        opt_array(&self.properties, DIM_VALUES).and_then(|values| {
            values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect()
        })
    }

    pub fn set_values(&mut self, values: Option<&[String]>) {
        set_or_remove(&mut self.properties, DIM_VALUES, values.map(string_array));
    }

    /// ISO 8601 duration.
    pub fn step(&self) -> Option<&str> {
        opt_str(&self.properties, DIM_STEP)
    }

    pub fn set_step(&mut self, step: Option<String>) {
        self.properties.insert(
            DIM_STEP.to_string(),
            step.map(Value::String).unwrap_or(Value::Null),
        );
    }
}

impl AdditionalDimension {
    pub fn extent(&self) -> Option<Vec<Option<f64>>> {
        opt_array(&self.properties, DIM_EXTENT).map(|values| float_values(values))
    }

    pub fn set_extent(&mut self, extent: Option<&[Option<f64>]>) {
        set_or_remove(&mut self.properties, DIM_EXTENT, extent.map(optional_float_array));
    }

    /// Numbers or strings.
    pub fn values(&self) -> Option<&Vec<Value>> {
        opt_array(&self.properties, DIM_VALUES)
    }

    pub fn set_values(&mut self, values: Option<Vec<Value>>) {
        set_or_remove(&mut self.properties, DIM_VALUES, values.map(Value::Array));
    }

    pub fn step(&self) -> Option<f64> {
        self.properties.get(DIM_STEP).and_then(Value::as_f64)
    }

    pub fn set_step(&mut self, step: Option<f64>) {
        self.properties.insert(
            DIM_STEP.to_string(),
            step.map(Value::from).unwrap_or(Value::Null),
        );
    }

    pub fn unit(&self) -> Option<&str> {
        opt_str(&self.properties, DIM_UNIT)
    }

    pub fn set_unit(&mut self, unit: Option<String>) {
        set_or_remove(&mut self.properties, DIM_UNIT, unit.map(Value::String));
    }

    pub fn reference_system(&self) -> Option<&Value> {
        self.properties.get(DIM_REFERENCE_SYSTEM)
    }

    pub fn set_reference_system(&mut self, reference_system: Option<Value>) {
        set_or_remove(&mut self.properties, DIM_REFERENCE_SYSTEM, reference_system);
    }
}

/// One entry of `cube:dimensions`.
#[derive(Debug, Clone, PartialEq)]
pub enum Dimension {
    HorizontalSpatial(HorizontalSpatialDimension),
    VerticalSpatial(VerticalSpatialDimension),
    Temporal(TemporalDimension),
    Additional(AdditionalDimension),
}

impl Dimension {
    /// Pick the variant from `type` and, for spatial dimensions, `axis`.
    ///
    /// Temporal is keyed off `type` alone, so an additional dimension typed
    /// `temporal` is read as temporal.
    pub fn from_properties(properties: Map<String, Value>) -> Result<Self, StacError> {
        let dim_type = required_str(&properties, DIMENSION_OBJECT, DIM_TYPE)?.to_string();
        let dimension = match dim_type.as_str() {
            "spatial" => {
                let vertical = required_str(&properties, DIMENSION_OBJECT, DIM_AXIS)? == "z";
                if vertical {
                    Dimension::VerticalSpatial(VerticalSpatialDimension::new(properties))
                } else {
                    Dimension::HorizontalSpatial(HorizontalSpatialDimension::new(properties))
                }
            }
            "temporal" => Dimension::Temporal(TemporalDimension::new(properties)),
            _ => Dimension::Additional(AdditionalDimension::new(properties)),
        };
        Ok(dimension)
    }

    pub fn from_value(value: Value) -> Result<Self, StacError> {
        match value {
            Value::Object(properties) => Self::from_properties(properties),
            _ => Err(StacError::format("cube:dimensions entries must be objects")),
        }
    }

    pub fn properties(&self) -> &Map<String, Value> {
        match self {
            Dimension::HorizontalSpatial(d) => d.properties(),
            Dimension::VerticalSpatial(d) => d.properties(),
            Dimension::Temporal(d) => d.properties(),
            Dimension::Additional(d) => d.properties(),
        }
    }

    pub fn dim_type(&self) -> Result<&str, StacError> {
        required_str(self.properties(), DIMENSION_OBJECT, DIM_TYPE)
    }

    pub fn description(&self) -> Option<&str> {
        opt_str(self.properties(), DIM_DESCRIPTION)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.properties().clone())
    }
}

/// One entry of `cube:variables`.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    properties: Map<String, Value>,
}

impl Variable {
    pub fn new(properties: Map<String, Value>) -> Self {
        Self { properties }
    }

    pub fn from_value(value: Value) -> Result<Self, StacError> {
        match value {
            Value::Object(properties) => Ok(Self::new(properties)),
            _ => Err(StacError::format("cube:variables entries must be objects")),
        }
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.properties
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.properties.clone())
    }

    /// `data` or `auxiliary`.
    pub fn var_type(&self) -> Result<&str, StacError> {
        required_str(&self.properties, VARIABLE_OBJECT, VAR_TYPE)
    }

    pub fn set_var_type(&mut self, var_type: impl Into<String>) {
        self.properties
            .insert(VAR_TYPE.to_string(), Value::String(var_type.into()));
    }

    /// Names of the dimensions the variable spans.
    pub fn dimensions(&self) -> Result<Vec<String>, StacError> {
        required(&self.properties, VARIABLE_OBJECT, VAR_DIMENSIONS)?
            .as_array()
            .and_then(|names| {
                names
                    .iter()
                    .map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .ok_or_else(|| StacError::format("cube:variables dimensions must be strings"))
    }

    pub fn set_dimensions(&mut self, dimensions: &[String]) {
        self.properties
            .insert(VAR_DIMENSIONS.to_string(), string_array(dimensions));
    }

    pub fn description(&self) -> Option<&str> {
        opt_str(&self.properties, VAR_DESCRIPTION)
    }

    pub fn set_description(&mut self, description: Option<String>) {
        set_or_remove(&mut self.properties, VAR_DESCRIPTION, description.map(Value::String));
    }

    pub fn values(&self) -> Option<&Vec<Value>> {
        opt_array(&self.properties, VAR_VALUES)
    }

    pub fn set_values(&mut self, values: Option<Vec<Value>>) {
        set_or_remove(&mut self.properties, VAR_VALUES, values.map(Value::Array));
    }

    /// Bounds as numbers or strings; open-ended bounds are null.
    pub fn extent(&self) -> Option<&Vec<Value>> {
        opt_array(&self.properties, VAR_EXTENT)
    }

    pub fn set_extent(&mut self, extent: Option<Vec<Value>>) {
        set_or_remove(&mut self.properties, VAR_EXTENT, extent.map(Value::Array));
    }

    pub fn step(&self) -> Option<f64> {
        self.properties.get(VAR_STEP).and_then(Value::as_f64)
    }

    pub fn set_step(&mut self, step: Option<f64>) {
        self.properties.insert(
            VAR_STEP.to_string(),
            step.map(Value::from).unwrap_or(Value::Null),
        );
    }

    pub fn unit(&self) -> Option<&str> {
        opt_str(&self.properties, VAR_UNIT)
    }

    pub fn set_unit(&mut self, unit: Option<String>) {
        set_or_remove(&mut self.properties, VAR_UNIT, unit.map(Value::String));
    }

    pub fn shape(&self) -> Option<Vec<u64>> {
        opt_array(&self.properties, VAR_SHAPE)
            .and_then(|values| values.iter().map(Value::as_u64).collect())
    }

    pub fn set_shape(&mut self, shape: Option<&[u64]>) {
        set_or_remove(&mut self.properties, VAR_SHAPE, shape.map(integer_array));
    }

    pub fn chunks(&self) -> Option<Vec<u64>> {
        opt_array(&self.properties, VAR_CHUNKS)
            .and_then(|values| values.iter().map(Value::as_u64).collect())
    }

    pub fn set_chunks(&mut self, chunks: Option<&[u64]>) {
        set_or_remove(&mut self.properties, VAR_CHUNKS, chunks.map(integer_array));
    }

    pub fn attrs(&self) -> Option<&Map<String, Value>> {
        self.properties.get(VAR_ATTRS).and_then(Value::as_object)
    }

    pub fn set_attrs(&mut self, attrs: Option<Map<String, Value>>) {
        set_or_remove(&mut self.properties, VAR_ATTRS, attrs.map(Value::Object));
    }
}

/// Datacube view over the map that holds a node's or asset's extension fields.
#[derive(Debug)]
pub struct DatacubeExtension<'a> {
    properties: &'a mut Map<String, Value>,
    /// Owning item's properties, read when the asset itself lacks a field.
    fallback: Option<&'a Map<String, Value>>,
    object: String,
}

fn not_applicable(node: &Node) -> StacError {
    StacError::ExtensionType(format!(
        "Datacube extension does not apply to type {}",
        node.node_type()
    ))
}

fn ensure_declared(node: &mut Node, add_if_missing: bool) -> Result<(), StacError> {
    if has_extension(node, SCHEMA_URI) {
        return Ok(());
    }
    if add_if_missing {
        add_extension(node, SCHEMA_URI);
        return Ok(());
    }
    Err(StacError::ExtensionNotImplemented {
        extension: SCHEMA_URI.to_string(),
        object: format!("{} {}", node.node_type(), node.id),
    })
}

impl<'a> DatacubeExtension<'a> {
    pub fn schema_uri() -> &'static str {
        SCHEMA_URI
    }

    /// View over an Item's `properties` or a Collection's top-level fields.
    ///
    /// Catalogs are rejected with `ExtensionType`. Without the schema URI in
    /// `stac_extensions` this fails with `ExtensionNotImplemented`, unless
    /// `add_if_missing` declares it.
    pub fn ext(node: &'a mut Node, add_if_missing: bool) -> Result<Self, StacError> {
        if matches!(node.kind, NodeKind::Catalog(_)) {
            return Err(not_applicable(node));
        }
        ensure_declared(node, add_if_missing)?;
        let object = format!("{} {}", node.node_type(), node.id);
        Ok(Self {
            properties: node.extension_fields_mut(),
            fallback: None,
            object,
        })
    }

    /// View over the asset `key` of `owner`. The declaration is checked (or
    /// added) on the owner.
    pub fn ext_asset(owner: &'a mut Node, key: &str, add_if_missing: bool) -> Result<Self, StacError> {
        if matches!(owner.kind, NodeKind::Catalog(_)) {
            return Err(not_applicable(owner));
        }
        ensure_declared(owner, add_if_missing)?;
        let object = format!("asset '{}' of {} {}", key, owner.node_type(), owner.id);
        let Node {
            kind, properties, ..
        } = owner;
        let properties: &'a Map<String, Value> = properties;
        let (assets, fallback) = match kind {
            NodeKind::Item(fields) => (
                fields.assets.get_or_insert_with(IndexMap::new),
                Some(properties),
            ),
            NodeKind::Collection(fields) => (fields.assets.get_or_insert_with(IndexMap::new), None),
            NodeKind::Catalog(_) => {
                return Err(StacError::ExtensionType(
                    "Datacube extension does not apply to type Catalog".to_string(),
                ))
            }
        };
        let asset = assets
            .get_mut(key)
            .ok_or_else(|| StacError::NotFound(object.clone()))?;
        Ok(Self {
            properties: &mut asset.extra_fields,
            fallback,
            object,
        })
    }

    /// View over an asset with no owning node; always applicable.
    pub fn ext_ownerless(asset: &'a mut Asset) -> Self {
        let object = format!("asset {}", asset.href);
        Self {
            properties: &mut asset.extra_fields,
            fallback: None,
            object,
        }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .get(key)
            .or_else(|| self.fallback.and_then(|fallback| fallback.get(key)))
    }

    /// Parsed `cube:dimensions`, in document order.
    pub fn dimensions(&self) -> Result<IndexMap<String, Dimension>, StacError> {
        let raw = self
            .get(DIMENSIONS_PROP)
            .and_then(Value::as_object)
            .ok_or_else(|| StacError::missing(self.object.clone(), DIMENSIONS_PROP))?;
        raw.iter()
            .map(|(name, value)| Ok((name.clone(), Dimension::from_value(value.clone())?)))
            .collect()
    }

    pub fn set_dimensions(&mut self, dimensions: &IndexMap<String, Dimension>) {
        let value: Map<String, Value> = dimensions
            .iter()
            .map(|(name, dimension)| (name.clone(), dimension.to_value()))
            .collect();
        self.properties
            .insert(DIMENSIONS_PROP.to_string(), Value::Object(value));
    }

    /// Replace the dimensions in one step.
    pub fn apply(&mut self, dimensions: &IndexMap<String, Dimension>) {
        self.set_dimensions(dimensions);
    }

    /// Parsed `cube:variables`, in document order.
    pub fn variables(&self) -> Result<IndexMap<String, Variable>, StacError> {
        let raw = self
            .get(VARIABLES_PROP)
            .and_then(Value::as_object)
            .ok_or_else(|| StacError::missing(self.object.clone(), VARIABLES_PROP))?;
        raw.iter()
            .map(|(name, value)| Ok((name.clone(), Variable::from_value(value.clone())?)))
            .collect()
    }

    pub fn set_variables(&mut self, variables: &IndexMap<String, Variable>) {
        let value: Map<String, Value> = variables
            .iter()
            .map(|(name, variable)| (name.clone(), variable.to_value()))
            .collect();
        self.properties
            .insert(VARIABLES_PROP.to_string(), Value::Object(value));
    }
}
