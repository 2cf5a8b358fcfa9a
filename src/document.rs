//! Document assembly - turns resources into a JSON:API document.

use serde_json::{Map, Value};

use crate::error::SerializationError;
use crate::metadata::{metadata, JsonApiResource, Resource};
use crate::relationship::assemble_relationships;
use crate::types::{PrimaryData, ResourceObject};

/// A top-level JSON:API document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct JsonApiDocument {
    pub data: PrimaryData,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub links: Map<String, Value>,
}

impl JsonApiDocument {
    /// Convert into a JSON tree.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError::Json` if an attribute value cannot be encoded.
    pub fn to_value(&self) -> Result<Value, SerializationError> {
        serde_json::to_value(self).map_err(|source| SerializationError::Json { source })
    }
}

/// Assemble a document whose primary data is a single resource object.
///
/// # Errors
///
/// Returns `SerializationError` if `entity` or one of its relationship targets
/// lacks required metadata.
pub fn assemble<T: JsonApiResource>(entity: &T) -> Result<JsonApiDocument, SerializationError> {
    let object = resource_object(entity)?;
    Ok(JsonApiDocument {
        data: PrimaryData::One(Box::new(object)),
        links: Map::new(),
    })
}

/// Assemble a document whose primary data is an array of resource objects.
///
/// An empty slice yields `"data": []`. When `T` declares a location, the
/// document links to it as `self`.
///
/// # Errors
///
/// Returns `SerializationError` if `T` or any relationship target lacks
/// required metadata.
pub fn assemble_collection<T: JsonApiResource>(
    entities: &[T],
) -> Result<JsonApiDocument, SerializationError> {
    let data = resource_objects(entities)?;
    let metadata = metadata::<T>()?;

    let mut links = Map::new();
    if let Some(location) = metadata.location() {
        links.insert("self".to_string(), Value::String(location.to_string()));
    }

    Ok(JsonApiDocument {
        data: PrimaryData::Many(data),
        links,
    })
}

/// Build the resource objects of a homogeneous collection, in order.
///
/// # Errors
///
/// Returns `SerializationError` if `T` lacks required metadata or any element
/// has no usable id; ids are checked for every element before any object is
/// assembled.
pub fn resource_objects<T: JsonApiResource>(
    entities: &[T],
) -> Result<Vec<ResourceObject>, SerializationError> {
    let metadata = metadata::<T>()?;
    for entity in entities {
        metadata.id(entity)?;
    }

    entities
        .iter()
        .map(|entity| resource_object(entity))
        .collect()
}

/// Build the resource object of one resource.
///
/// Links hold the declared static links followed by `self` (`location/id`)
/// when the type declares a location.
pub fn resource_object(resource: &dyn Resource) -> Result<ResourceObject, SerializationError> {
    let resource_type = resource.resolve_type()?;
    let id = resource.resolve_id()?;
    let attributes = resource.resolve_attributes()?;

    let mut links = resource.resolve_static_links()?;
    if let Some(location) = resource.resolve_location()? {
        links.insert(
            "self".to_string(),
            Value::String(format!("{}/{}", location, id)),
        );
    }

    let relationships = assemble_relationships(resource)?;

    Ok(ResourceObject {
        resource_type,
        id,
        attributes,
        links,
        relationships,
    })
}
