//! Core types for JSON:API document assembly.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Media type of every JSON:API response body.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Prefix that marks a public accessor as an implicit attribute getter.
pub const GETTER_PREFIX: &str = "get";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Visibility of a declared member.
///
/// Public fields become attributes implicitly; private ones only when renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
}

/// Shape of a declared accessor method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Number of parameters besides the receiver.
    pub params: usize,
    /// Whether the method returns a value.
    pub returns_value: bool,
}

impl Signature {
    /// Zero-argument, value-returning accessor.
    pub const GETTER: Signature = Signature {
        params: 0,
        returns_value: true,
    };

    /// Whether the method can be read as an attribute or identifier.
    pub fn is_gettable(&self) -> bool {
        self.params == 0 && self.returns_value
    }
}

/// HTTP status attached to a built response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const ACCEPTED: StatusCode = StatusCode(202);

    /// Create a status from its numeric code.
    ///
    /// Returns `None` outside the 100..=599 range.
    pub fn from_u16(code: u16) -> Option<Self> {
        (100..=599).contains(&code).then_some(StatusCode(code))
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimal `{id, type}` reference to a resource.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResourceIdentifier {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// Inline linkage of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum RelationshipData {
    One(ResourceIdentifier),
    Many(Vec<ResourceIdentifier>),
}

/// `{ "self": <uri> }` member of a links-only relationship.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SelfLink {
    #[serde(rename = "self")]
    pub href: String,
}

/// One entry of a `relationships` object.
///
/// Serializes as `{"data": ...}` or `{"links": {"self": ...}}`, never both.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum RelationshipEntry {
    #[serde(rename = "data")]
    Data(RelationshipData),
    #[serde(rename = "links")]
    Links(SelfLink),
}

/// Named relationship entries in insertion order.
///
/// Inserting an existing name replaces its entry in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships(Vec<(String, RelationshipEntry)>);

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: RelationshipEntry) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = entry,
            None => self.0.push((name, entry)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RelationshipEntry> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelationshipEntry)> {
        self.0.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}

impl Serialize for Relationships {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, entry) in &self.0 {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

/// One domain entity in the output document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub links: Map<String, Value>,
    #[serde(skip_serializing_if = "Relationships::is_empty")]
    pub relationships: Relationships,
}

/// Primary data of a document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    One(Box<ResourceObject>),
    Many(Vec<ResourceObject>),
}

impl PrimaryData {
    pub fn is_collection(&self) -> bool {
        matches!(self, PrimaryData::Many(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identifier(id: &str) -> ResourceIdentifier {
        ResourceIdentifier {
            id: id.into(),
            resource_type: "simple".into(),
        }
    }

    #[test]
    fn signature_gettable() {
        assert_eq!(
            Signature::GETTER,
            Signature {
                params: 0,
                returns_value: true
            }
        );
        assert!(Signature::GETTER.is_gettable());
        assert!(!Signature {
            params: 1,
            returns_value: true
        }
        .is_gettable());
        assert!(!Signature {
            params: 0,
            returns_value: false
        }
        .is_gettable());
    }

    #[test]
    fn status_code_range() {
        assert_eq!(StatusCode::default(), StatusCode::OK);
        assert_eq!(StatusCode::from_u16(201), Some(StatusCode::CREATED));
        assert_eq!(StatusCode::from_u16(99), None);
        assert_eq!(StatusCode::from_u16(600), None);
        assert_eq!(StatusCode::ACCEPTED.to_string(), "202");
    }

    #[test]
    fn identifier_has_exactly_two_fields() {
        let value = serde_json::to_value(identifier("1")).unwrap();
        assert_eq!(value, json!({ "id": "1", "type": "simple" }));
    }

    #[test]
    fn relationship_entry_shapes() {
        let one = RelationshipEntry::Data(RelationshipData::One(identifier("1")));
        assert_eq!(
            serde_json::to_value(one).unwrap(),
            json!({ "data": { "id": "1", "type": "simple" } })
        );

        let many = RelationshipEntry::Data(RelationshipData::Many(vec![
            identifier("1"),
            identifier("2"),
        ]));
        assert_eq!(
            serde_json::to_value(many).unwrap()["data"]
                .as_array()
                .unwrap()
                .len(),
            2
        );

        let links = RelationshipEntry::Links(SelfLink {
            href: "comments".into(),
        });
        assert_eq!(
            serde_json::to_value(links).unwrap(),
            json!({ "links": { "self": "comments" } })
        );
    }

    #[test]
    fn relationships_insert_replaces_in_place() {
        let mut relationships = Relationships::new();
        relationships.insert(
            "a",
            RelationshipEntry::Data(RelationshipData::One(identifier("1"))),
        );
        relationships.insert(
            "b",
            RelationshipEntry::Data(RelationshipData::One(identifier("2"))),
        );
        relationships.insert(
            "a",
            RelationshipEntry::Data(RelationshipData::One(identifier("3"))),
        );

        assert_eq!(relationships.len(), 2);
        let names: Vec<&str> = relationships.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(
            relationships.get("a"),
            Some(&RelationshipEntry::Data(RelationshipData::One(identifier(
                "3"
            ))))
        );
    }

    #[test]
    fn resource_object_omits_empty_members() {
        let object = ResourceObject {
            resource_type: "simple".into(),
            id: "1".into(),
            attributes: Map::new(),
            links: Map::new(),
            relationships: Relationships::new(),
        };
        let value = serde_json::to_value(object).unwrap();
        assert_eq!(value, json!({ "type": "simple", "id": "1", "attributes": {} }));
    }
}
