//! Response building - staged assembly of a JSON:API response.
//!
//! The builder moves through three states, each a distinct type:
//!
//! | State | Reached by | Allows |
//! |-------|------------|--------|
//! | [`RequiredEntity`] | [`JsonApiResponse::builder`] | `data`, `data_collection` |
//! | [`Buildable`] | setting the primary data | `add_link`, `build`, and `add_relationship` for single resources |
//! | [`WithRelationship`] | adding a relationship | everything `Buildable<Single>` allows, plus `include` |
//!
//! Calling `build` before `data` or adding a relationship to a collection does
//! not compile.

use std::any::type_name;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::document::{resource_object, resource_objects, JsonApiDocument};
use crate::error::{LinkError, ResponseError, SerializationError};
use crate::link::{absolutize_links, parse_base, BaseUri};
use crate::metadata::{simple_name, JsonApiResource, Related, Resource};
use crate::relationship::related_entry;
use crate::types::{PrimaryData, ResourceObject, StatusCode, JSONAPI_MEDIA_TYPE};

/// Options for building a response.
#[derive(Debug, Clone)]
pub struct ResponseOptions {
    /// Absolute URI of the current request; root for relative links.
    pub request_uri: BaseUri,
    /// Status of the built response.
    pub status: StatusCode,
    /// When false, links are emitted exactly as declared.
    pub absolutize_links: bool,
}

impl ResponseOptions {
    /// Create options with status `200 OK` and link absolutization enabled.
    pub fn new(request_uri: BaseUri) -> Self {
        Self {
            request_uri,
            status: StatusCode::OK,
            absolutize_links: true,
        }
    }

    /// Create options from a request URI string.
    ///
    /// # Errors
    ///
    /// Returns `LinkError::InvalidBase` if `request_uri` is not an absolute URI.
    pub fn parse(request_uri: &str) -> Result<Self, LinkError> {
        parse_base(request_uri).map(Self::new)
    }

    /// Set the response status.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Enable or disable link absolutization at build time.
    pub fn absolutize_links(mut self, enabled: bool) -> Self {
        self.absolutize_links = enabled;
        self
    }

    /// The request URI without query or fragment.
    fn self_link(&self) -> String {
        self.request_uri.without_query()
    }
}

/// A finished JSON:API response.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonApiResponse {
    status: StatusCode,
    body: Value,
}

impl JsonApiResponse {
    /// Start building a response for the given request.
    pub fn builder(options: ResponseOptions) -> RequiredEntity {
        RequiredEntity { options }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Always `application/vnd.api+json`.
    pub fn content_type(&self) -> &'static str {
        JSONAPI_MEDIA_TYPE
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for JsonApiResponse {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status.as_u16())
            .unwrap_or(axum::http::StatusCode::OK);
        (
            status,
            [(axum::http::header::CONTENT_TYPE, JSONAPI_MEDIA_TYPE)],
            self.body.to_string(),
        )
            .into_response()
    }
}

/// Shape of the primary data held by a [`Buildable`].
pub trait PrimaryShape {
    fn into_primary(self) -> PrimaryData;
}

/// Primary data is one resource object.
#[derive(Debug, Clone)]
pub struct Single {
    object: Box<ResourceObject>,
    class: &'static str,
}

/// Primary data is an array of resource objects.
#[derive(Debug, Clone)]
pub struct Collection(Vec<ResourceObject>);

impl PrimaryShape for Single {
    fn into_primary(self) -> PrimaryData {
        PrimaryData::One(self.object)
    }
}

impl PrimaryShape for Collection {
    fn into_primary(self) -> PrimaryData {
        PrimaryData::Many(self.0)
    }
}

/// Builder state before primary data is set.
#[derive(Debug)]
pub struct RequiredEntity {
    options: ResponseOptions,
}

impl RequiredEntity {
    /// Set a single resource as primary data.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if `entity` or a relationship target lacks
    /// required metadata.
    pub fn data<T: JsonApiResource>(self, entity: &T) -> Result<Buildable<Single>, SerializationError> {
        let single = Single {
            object: Box::new(resource_object(entity)?),
            class: type_name::<T>(),
        };
        Ok(self.into_buildable(single))
    }

    /// Set a collection of resources as primary data.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if any element or relationship target lacks
    /// required metadata.
    pub fn data_collection<T: JsonApiResource>(
        self,
        entities: &[T],
    ) -> Result<Buildable<Collection>, SerializationError> {
        let objects = resource_objects(entities)?;
        Ok(self.into_buildable(Collection(objects)))
    }

    /// The document links to the request URI as `self`, replacing any
    /// location-based document link.
    fn into_buildable<S>(self, data: S) -> Buildable<S> {
        let self_link = self.options.self_link();
        debug!(self_link = %self_link, "primary data set");
        let mut links = Map::new();
        links.insert("self".to_string(), Value::String(self_link));
        Buildable {
            options: self.options,
            data,
            links,
        }
    }
}

/// Builder state with primary data; ready to build.
#[derive(Debug)]
pub struct Buildable<S> {
    options: ResponseOptions,
    data: S,
    links: Map<String, Value>,
}

impl<S: PrimaryShape> Buildable<S> {
    /// Add or replace a document-level link.
    ///
    /// `reference` may be relative; it is absolutized by [`Buildable::build`].
    pub fn add_link(mut self, name: impl Into<String>, reference: impl Into<String>) -> Self {
        self.links
            .insert(name.into(), Value::String(reference.into()));
        self
    }

    /// Override the response status.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.options.status = status;
        self
    }

    /// Document-level links added so far, before absolutization.
    pub fn links(&self) -> &Map<String, Value> {
        &self.links
    }

    /// Finish the document and pair it with status and media type.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError` if the document cannot be encoded or one of its
    /// links cannot be resolved against the request URI.
    pub fn build(self) -> Result<JsonApiResponse, ResponseError> {
        let document = JsonApiDocument {
            data: self.data.into_primary(),
            links: self.links,
        };
        let mut body = document.to_value()?;

        if self.options.absolutize_links {
            absolutize_links(&mut body, &self.options.request_uri)?;
        }

        debug!(status = %self.options.status, "built JSON:API response");
        Ok(JsonApiResponse {
            status: self.options.status,
            body,
        })
    }
}

impl Buildable<Single> {
    /// Add a relationship named after the related entity's type.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError::Relationship` if `entity` lacks required
    /// metadata.
    pub fn add_relationship<R: JsonApiResource>(
        self,
        entity: &R,
    ) -> Result<WithRelationship, SerializationError> {
        self.add_named_relationship(simple_name(type_name::<R>()), entity)
    }

    /// Add a to-one relationship under `name`.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError::Relationship` if `entity` lacks required
    /// metadata.
    pub fn add_named_relationship<R: JsonApiResource>(
        self,
        name: impl Into<String>,
        entity: &R,
    ) -> Result<WithRelationship, SerializationError> {
        self.insert_relationship(name.into(), &Related::One(entity))
    }

    /// Add a to-many relationship under `name`.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError::Relationship` if any entity lacks required
    /// metadata.
    pub fn add_named_relationship_many<R: JsonApiResource>(
        self,
        name: impl Into<String>,
        entities: &[R],
    ) -> Result<WithRelationship, SerializationError> {
        let related = Related::Many(entities.iter().map(|e| e as &dyn Resource).collect());
        self.insert_relationship(name.into(), &related)
    }

    fn insert_relationship(
        mut self,
        name: String,
        related: &Related<'_>,
    ) -> Result<WithRelationship, SerializationError> {
        let entry = related_entry(related).map_err(|source| SerializationError::Relationship {
            class: self.data.class.to_string(),
            name: name.clone(),
            source,
        })?;
        debug!(relationship = %name, "relationship added");
        self.data.object.relationships.insert(name, entry);
        Ok(WithRelationship { inner: self })
    }
}

/// Builder state after at least one relationship was added.
#[derive(Debug)]
pub struct WithRelationship {
    inner: Buildable<Single>,
}

impl WithRelationship {
    /// See [`Buildable::add_link`].
    pub fn add_link(self, name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            inner: self.inner.add_link(name, reference),
        }
    }

    /// See [`Buildable::status`].
    pub fn status(self, status: StatusCode) -> Self {
        Self {
            inner: self.inner.status(status),
        }
    }

    /// See [`Buildable::add_relationship`].
    pub fn add_relationship<R: JsonApiResource>(self, entity: &R) -> Result<Self, SerializationError> {
        self.inner.add_relationship(entity)
    }

    /// See [`Buildable::add_named_relationship`].
    pub fn add_named_relationship<R: JsonApiResource>(
        self,
        name: impl Into<String>,
        entity: &R,
    ) -> Result<Self, SerializationError> {
        self.inner.add_named_relationship(name, entity)
    }

    /// See [`Buildable::add_named_relationship_many`].
    pub fn add_named_relationship_many<R: JsonApiResource>(
        self,
        name: impl Into<String>,
        entities: &[R],
    ) -> Result<Self, SerializationError> {
        self.inner.add_named_relationship_many(name, entities)
    }

    /// Reserved for compound documents; currently leaves the document unchanged.
    pub fn include(self, relationship: &str) -> Self {
        warn!(relationship, "included resources are not supported; ignoring");
        self
    }

    /// See [`Buildable::links`].
    pub fn links(&self) -> &Map<String, Value> {
        self.inner.links()
    }

    /// See [`Buildable::build`].
    pub fn build(self) -> Result<JsonApiResponse, ResponseError> {
        self.inner.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Field, ResourceDescriptor};
    use serde_json::json;

    struct SimplePojo {
        id: String,
    }

    impl JsonApiResource for SimplePojo {
        fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
            resource
                .resource_type("simple")
                .field(Field::public("id", |s: &SimplePojo| json!(s.id)).id())
                .field(Field::public("anotherAttribute", |_: &SimplePojo| json!("something")))
                .field(Field::public("yetAnother", |_: &SimplePojo| json!(42)))
        }
    }

    fn options() -> ResponseOptions {
        ResponseOptions::parse("http://BASEPATH/simple?page=1#top").unwrap()
    }

    #[test]
    fn options_defaults() {
        let options = options();
        assert_eq!(options.status, StatusCode::OK);
        assert!(options.absolutize_links);
        assert_eq!(options.self_link(), "http://BASEPATH/simple");
    }

    #[test]
    fn options_reject_relative_uri() {
        assert!(matches!(
            ResponseOptions::parse("simple/1"),
            Err(LinkError::InvalidBase { .. })
        ));
    }

    #[test]
    fn build_sets_status_and_media_type() {
        let response = JsonApiResponse::builder(options().status(StatusCode::CREATED))
            .data(&SimplePojo { id: "idValue".into() })
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.content_type(), "application/vnd.api+json");
        assert_eq!(response.body()["data"]["id"], json!("idValue"));
    }

    #[test]
    fn relative_links_kept_when_absolutization_disabled() {
        let response = JsonApiResponse::builder(options().absolutize_links(false))
            .data(&SimplePojo { id: "1".into() })
            .unwrap()
            .add_link("next", "simple?page=2")
            .build()
            .unwrap();

        assert_eq!(response.body()["links"]["next"], json!("simple?page=2"));
    }

    #[test]
    fn links_are_absolutized_at_build_time() {
        let buildable = JsonApiResponse::builder(options())
            .data(&SimplePojo { id: "1".into() })
            .unwrap()
            .add_link("related", "location");

        assert_eq!(buildable.links()["related"], json!("location"));

        let response = buildable.build().unwrap();
        assert_eq!(
            response.body()["links"]["related"],
            json!("http://BASEPATH/location")
        );
    }

    #[test]
    fn default_relationship_name_is_type_name() {
        let response = JsonApiResponse::builder(options())
            .data(&SimplePojo { id: "1".into() })
            .unwrap()
            .add_relationship(&SimplePojo { id: "2".into() })
            .unwrap()
            .include("SimplePojo")
            .build()
            .unwrap();

        assert_eq!(
            response.body()["data"]["relationships"]["SimplePojo"]["data"],
            json!({ "id": "2", "type": "simple" })
        );
    }
}
