//! JSON:API Response Builder
//!
//! Serializes annotated domain types into JSON:API documents and assembles
//! HTTP responses around them.
//!
//! A type declares its JSON:API metadata once by implementing
//! [`JsonApiResource`]; documents and responses are then built from plain
//! values.
//!
//! # Example
//!
//! ```
//! use jsonapi_response::{Field, JsonApiResource, JsonApiResponse, ResourceDescriptor, ResponseOptions};
//! use serde_json::json;
//!
//! struct Article {
//!     id: String,
//!     title: String,
//! }
//!
//! impl JsonApiResource for Article {
//!     fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
//!         resource
//!             .resource_type("articles")
//!             .location("articles")
//!             .field(Field::private("id", |a: &Article| json!(a.id)).id())
//!             .field(Field::public("title", |a: &Article| json!(a.title)))
//!     }
//! }
//!
//! let article = Article { id: "1".into(), title: "JSON:API".into() };
//! let options = ResponseOptions::parse("http://example.com/articles/1").unwrap();
//! let response = JsonApiResponse::builder(options)
//!     .data(&article)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(response.status().as_u16(), 200);
//! assert_eq!(response.content_type(), "application/vnd.api+json");
//! assert_eq!(
//!     response.body(),
//!     &json!({
//!         "data": {
//!             "type": "articles",
//!             "id": "1",
//!             "attributes": { "title": "JSON:API" },
//!             "links": { "self": "http://example.com/articles/1" }
//!         },
//!         "links": { "self": "http://example.com/articles/1" }
//!     })
//! );
//! ```
//!
//! # Attribute Rules
//!
//! | Declaration | Attribute |
//! |-------------|-----------|
//! | public field | field name |
//! | private field | none |
//! | renamed field or method | the given name |
//! | id field or method | none (becomes `id`) |
//! | public method `getX` | `x`, unless already present |
//!
//! # Links
//!
//! Relative links are resolved against the root of the request URI when a
//! response is built; absolute links pass through unchanged.

mod document;
mod error;
mod link;
mod loader;
mod metadata;
mod relationship;
mod response;
mod types;
mod validator;

pub use document::{
    assemble, assemble_collection, resource_object, resource_objects, JsonApiDocument,
};
pub use error::{
    ConfigurationError, DocumentError, LinkError, LoadError, ResponseError, SerializationError,
    ValidateError,
};
pub use link::{absolutize, absolutize_links, parse_base, request_root, BaseUri};
pub use loader::{load_document, load_document_str};
pub use metadata::{
    metadata, simple_name, Field, JsonApiResource, Link, Method, Related,
    RelationshipDeclaration, Relationship, Resource, ResourceDescriptor, ResourceMetadata,
};
pub use relationship::{
    assemble_relationships, related_entry, relationship_entry, resource_identifier,
};
pub use response::{
    Buildable, Collection, JsonApiResponse, PrimaryShape, RequiredEntity, ResponseOptions, Single,
    WithRelationship,
};
pub use types::{
    json_type_name, PrimaryData, RelationshipData, RelationshipEntry, Relationships,
    ResourceIdentifier, ResourceObject, SelfLink, Signature, StatusCode, Visibility,
    GETTER_PREFIX, JSONAPI_MEDIA_TYPE,
};
pub use validator::{validate_document, validate_document_file};
