//! Metadata resolution - discovers a resource's type, id, attributes, links and
//! relationships from the descriptor its type registers.
//!
//! A resource type implements [`JsonApiResource`] and lists its members once:
//!
//! | Declaration | Becomes |
//! |-------------|---------|
//! | `Field::public` | attribute under the field name |
//! | `Field::private` | nothing, unless renamed |
//! | `.rename("x")` on a field or method | attribute `x`, regardless of visibility |
//! | `.id()` on a field or method | the resource id, never an attribute |
//! | `Method::public("getName", ..)` | attribute `name`, unless a field produced it |
//! | `Link::new(member, target)` | static entry in the resource's `links` |
//! | `Relationship::to_one` / `to_many` / `external` | entry in `relationships` |
//!
//! Descriptors are compiled and validated on first use and cached for the rest of
//! the process.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::ConfigurationError;
use crate::types::{Signature, Visibility, GETTER_PREFIX};

type Read<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Relate<T> = Box<dyn for<'a> Fn(&'a T) -> Related<'a> + Send + Sync>;
type Compiled<T> = Result<Arc<ResourceMetadata<T>>, ConfigurationError>;
type Registry = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// A domain type that can be rendered as a JSON:API resource object.
///
/// # Example
///
/// ```
/// use jsonapi_response::{Field, JsonApiResource, ResourceDescriptor};
/// use serde_json::json;
///
/// struct Article {
///     id: String,
///     title: String,
/// }
///
/// impl JsonApiResource for Article {
///     fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
///         resource
///             .resource_type("articles")
///             .field(Field::private("id", |a: &Article| json!(a.id)).id())
///             .field(Field::public("title", |a: &Article| json!(a.title)))
///     }
/// }
/// ```
pub trait JsonApiResource: Sized + 'static {
    /// Declare the resource's metadata on the given descriptor.
    fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self>;
}

/// Type-erased access to a resource's resolved metadata.
///
/// Implemented for every [`JsonApiResource`]; relationship targets are handled
/// through this trait so one relationship may point at different types.
pub trait Resource {
    /// Fully qualified name of the underlying type.
    fn class_name(&self) -> &'static str;

    fn resolve_type(&self) -> Result<String, ConfigurationError>;

    fn resolve_id(&self) -> Result<String, ConfigurationError>;

    /// Base path declared for self links, if any.
    fn resolve_location(&self) -> Result<Option<String>, ConfigurationError>;

    fn resolve_attributes(&self) -> Result<Map<String, Value>, ConfigurationError>;

    fn resolve_static_links(&self) -> Result<Map<String, Value>, ConfigurationError>;

    fn resolve_relationships(
        &self,
    ) -> Result<Vec<(String, RelationshipDeclaration<'_>)>, ConfigurationError>;
}

impl<T: JsonApiResource> Resource for T {
    fn class_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn resolve_type(&self) -> Result<String, ConfigurationError> {
        Ok(metadata::<T>()?.resource_type().to_string())
    }

    fn resolve_id(&self) -> Result<String, ConfigurationError> {
        metadata::<T>()?.id(self)
    }

    fn resolve_location(&self) -> Result<Option<String>, ConfigurationError> {
        Ok(metadata::<T>()?.location().map(String::from))
    }

    fn resolve_attributes(&self) -> Result<Map<String, Value>, ConfigurationError> {
        Ok(metadata::<T>()?.attributes(self))
    }

    fn resolve_static_links(&self) -> Result<Map<String, Value>, ConfigurationError> {
        Ok(metadata::<T>()?.static_links())
    }

    fn resolve_relationships(
        &self,
    ) -> Result<Vec<(String, RelationshipDeclaration<'_>)>, ConfigurationError> {
        Ok(metadata::<T>()?.relationships(self))
    }
}

/// Last path segment of a type name, without generic arguments.
///
/// `my_app::models::Person` becomes `Person`.
pub fn simple_name(class: &str) -> &str {
    let base = class.split('<').next().unwrap_or(class);
    base.rsplit("::").next().unwrap_or(base)
}

/// Related value(s) of an inline relationship.
pub enum Related<'a> {
    One(&'a dyn Resource),
    Many(Vec<&'a dyn Resource>),
}

/// A relationship as declared on one instance.
pub enum RelationshipDeclaration<'a> {
    /// Links-only relationship pointing at an external location.
    External(String),
    /// Relationship carrying resource identifiers of the related value(s).
    Inline(Related<'a>),
}

/// A data member of a resource type.
pub struct Field<T> {
    name: String,
    visibility: Visibility,
    read: Read<T>,
    id: bool,
    rename: Option<String>,
}

impl<T> Field<T> {
    pub fn public<F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self::new(name.into(), Visibility::Public, Box::new(read))
    }

    pub fn private<F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self::new(name.into(), Visibility::Private, Box::new(read))
    }

    fn new(name: String, visibility: Visibility, read: Read<T>) -> Self {
        Self {
            name,
            visibility,
            read,
            id: false,
            rename: None,
        }
    }

    /// Mark this field as the resource identifier.
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Serialize under an explicit attribute name.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }
}

/// An accessor method of a resource type.
pub struct Method<T> {
    name: String,
    visibility: Visibility,
    signature: Signature,
    read: Option<Read<T>>,
    id: bool,
    rename: Option<String>,
}

impl<T> Method<T> {
    /// Public zero-argument accessor.
    pub fn public<F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self::new(name.into(), Visibility::Public, Signature::GETTER, Some(Box::new(read)))
    }

    /// Private zero-argument accessor.
    pub fn private<F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self::new(name.into(), Visibility::Private, Signature::GETTER, Some(Box::new(read)))
    }

    /// A method that cannot be read: it takes parameters or returns nothing.
    pub fn opaque(name: impl Into<String>, visibility: Visibility, signature: Signature) -> Self {
        Self::new(name.into(), visibility, signature, None)
    }

    fn new(
        name: String,
        visibility: Visibility,
        signature: Signature,
        read: Option<Read<T>>,
    ) -> Self {
        Self {
            name,
            visibility,
            signature,
            read,
            id: false,
            rename: None,
        }
    }

    /// Mark this accessor as the resource identifier.
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Serialize under an explicit attribute name.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    fn readable(&self) -> Option<&Read<T>> {
        if self.signature.is_gettable() {
            self.read.as_ref()
        } else {
            None
        }
    }

    /// Attribute name implied by a `getX` accessor: `getStringAttr` -> `stringAttr`.
    /// Renamed accessors imply nothing.
    fn getter_attribute(&self) -> Option<String> {
        if self.visibility != Visibility::Public
            || self.rename.is_some()
            || self.readable().is_none()
        {
            return None;
        }
        let rest = self.name.strip_prefix(GETTER_PREFIX)?;
        let mut chars = rest.chars();
        let first = chars.next()?;
        Some(first.to_lowercase().chain(chars).collect())
    }
}

/// A static link declared on a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    member: String,
    name: Option<String>,
    target: String,
}

impl Link {
    pub fn new(member: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            name: None,
            target: target.into(),
        }
    }

    /// Serialize under an explicit link name instead of the member name.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn serialized_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.member)
    }
}

/// Attribute contributors, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    RenamedField,
    PublicField,
    RenamedMethod,
    Getter,
}

enum Target<T> {
    Inline(Relate<T>),
    External(String),
}

/// A relationship declared on a member.
pub struct Relationship<T> {
    member: String,
    name: Option<String>,
    target: Target<T>,
}

impl<T: 'static> Relationship<T> {
    /// To-one relationship to the value returned by `related`.
    pub fn to_one<R, F>(member: impl Into<String>, related: F) -> Self
    where
        R: Resource + 'static,
        F: for<'a> Fn(&'a T) -> &'a R + Send + Sync + 'static,
    {
        Self::inline(member.into(), relate(move |owner: &T| Related::One(related(owner))))
    }

    /// To-many relationship over a homogeneous slice.
    pub fn to_many<R, F>(member: impl Into<String>, related: F) -> Self
    where
        R: Resource + 'static,
        F: for<'a> Fn(&'a T) -> &'a [R] + Send + Sync + 'static,
    {
        Self::inline(
            member.into(),
            relate(move |owner: &T| {
                Related::Many(related(owner).iter().map(|r| r as &dyn Resource).collect())
            }),
        )
    }

    /// To-many relationship whose elements may be of different types.
    pub fn to_many_mixed<F>(member: impl Into<String>, related: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> Vec<&'a dyn Resource> + Send + Sync + 'static,
    {
        Self::inline(member.into(), relate(move |owner: &T| Related::Many(related(owner))))
    }

    /// Links-only relationship whose data lives at `location`.
    pub fn external(member: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            name: None,
            target: Target::External(location.into()),
        }
    }

    fn inline(member: String, relate: Relate<T>) -> Self {
        Self {
            member,
            name: None,
            target: Target::Inline(relate),
        }
    }
}

impl<T> Relationship<T> {
    /// Serialize under an explicit relationship name instead of the member name.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn serialized_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.member)
    }
}

fn relate<T, F>(f: F) -> Relate<T>
where
    F: for<'a> Fn(&'a T) -> Related<'a> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Declarations collected from [`JsonApiResource::describe`].
///
/// Members keep their declaration order; it decides id precedence and
/// attribute order.
pub struct ResourceDescriptor<T> {
    resource_type: Option<String>,
    location: Option<String>,
    fields: Vec<Field<T>>,
    methods: Vec<Method<T>>,
    links: Vec<Link>,
    relationships: Vec<Relationship<T>>,
}

impl<T> Default for ResourceDescriptor<T> {
    fn default() -> Self {
        Self {
            resource_type: None,
            location: None,
            fields: Vec::new(),
            methods: Vec::new(),
            links: Vec::new(),
            relationships: Vec::new(),
        }
    }
}

impl<T> ResourceDescriptor<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The JSON:API `type` of every instance.
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Base path for self links; instances link to `location/id`.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn field(mut self, field: Field<T>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: Method<T>) -> Self {
        self.methods.push(method);
        self
    }

    pub fn link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn relationship(mut self, relationship: Relationship<T>) -> Self {
        self.relationships.push(relationship);
        self
    }
}

/// Validated metadata of one resource type.
pub struct ResourceMetadata<T> {
    class: &'static str,
    resource_type: String,
    location: Option<String>,
    fields: Vec<Field<T>>,
    methods: Vec<Method<T>>,
    links: Vec<Link>,
    relationships: Vec<Relationship<T>>,
}

impl<T> ResourceMetadata<T> {
    /// Validate a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the descriptor has no resource type, no
    /// readable id member, or a renamed method that cannot be read.
    pub fn compile(
        class: &'static str,
        descriptor: ResourceDescriptor<T>,
    ) -> Result<Self, ConfigurationError> {
        let ResourceDescriptor {
            resource_type,
            location,
            fields,
            methods,
            links,
            relationships,
        } = descriptor;

        let resource_type = resource_type
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigurationError::MissingType {
                class: class.to_string(),
            })?;

        let has_id = fields.iter().any(|f| f.id)
            || methods.iter().any(|m| m.id && m.readable().is_some());
        if !has_id {
            return Err(ConfigurationError::MissingId {
                class: class.to_string(),
            });
        }

        if let Some(method) = methods
            .iter()
            .find(|m| m.rename.is_some() && m.readable().is_none())
        {
            return Err(ConfigurationError::UngettableAccessor {
                class: class.to_string(),
                member: method.name.clone(),
            });
        }

        Ok(Self {
            class,
            resource_type,
            location: location.filter(|l| !l.is_empty()),
            fields,
            methods,
            links,
            relationships,
        })
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Resolve the id of an instance.
    ///
    /// Id fields are tried before id methods, each in declaration order; the
    /// first member yielding a string wins.
    pub fn id(&self, instance: &T) -> Result<String, ConfigurationError> {
        let fields = self
            .fields
            .iter()
            .filter(|f| f.id)
            .map(|f| (&f.name, (f.read)(instance)));
        let methods = self
            .methods
            .iter()
            .filter(|m| m.id)
            .filter_map(|m| m.readable().map(|read| (&m.name, read(instance))));

        for (member, value) in fields.chain(methods) {
            if let Value::String(id) = value {
                if id.is_empty() {
                    return Err(ConfigurationError::EmptyId {
                        class: self.class.to_string(),
                        member: member.clone(),
                    });
                }
                return Ok(id);
            }
        }

        Err(ConfigurationError::MissingId {
            class: self.class.to_string(),
        })
    }

    /// Resolve the visible attributes of an instance.
    ///
    /// When several members produce the same name, the strongest contributor
    /// wins: renamed field, then public field, then renamed method, then
    /// getter. Among equals the first declared wins. A name keeps the position
    /// of its first contributor.
    pub fn attributes(&self, instance: &T) -> Map<String, Value> {
        let fields = self.fields.iter().filter(|f| !f.id).filter_map(|field| {
            match (&field.rename, field.visibility) {
                (Some(rename), _) => Some((rename.clone(), Rank::RenamedField, &field.read)),
                (None, Visibility::Public) => {
                    Some((field.name.clone(), Rank::PublicField, &field.read))
                }
                (None, Visibility::Private) => None,
            }
        });
        let methods = self.methods.iter().filter(|m| !m.id).filter_map(|method| {
            let read = method.readable()?;
            match &method.rename {
                Some(rename) => Some((rename.clone(), Rank::RenamedMethod, read)),
                None => Some((method.getter_attribute()?, Rank::Getter, read)),
            }
        });

        let mut winners: Vec<(String, Rank, &Read<T>)> = Vec::new();
        for (name, rank, read) in fields.chain(methods) {
            match winners.iter_mut().find(|(existing, _, _)| *existing == name) {
                Some(winner) if rank < winner.1 => *winner = (name, rank, read),
                Some(_) => {}
                None => winners.push((name, rank, read)),
            }
        }

        winners
            .into_iter()
            .map(|(name, _, read)| (name, read(instance)))
            .collect()
    }

    pub fn static_links(&self) -> Map<String, Value> {
        self.links
            .iter()
            .map(|link| {
                (
                    link.serialized_name().to_string(),
                    Value::String(link.target.clone()),
                )
            })
            .collect()
    }

    pub fn relationships<'a>(&self, instance: &'a T) -> Vec<(String, RelationshipDeclaration<'a>)> {
        self.relationships
            .iter()
            .map(|relationship| {
                let declaration = match &relationship.target {
                    Target::External(location) => {
                        RelationshipDeclaration::External(location.clone())
                    }
                    Target::Inline(relate) => RelationshipDeclaration::Inline(relate(instance)),
                };
                (relationship.serialized_name().to_string(), declaration)
            })
            .collect()
    }
}

/// Fetch the metadata of `T`, compiling and caching it on first use.
///
/// Rejected descriptors are cached as well, so a misconfigured type fails the
/// same way on every call.
///
/// # Errors
///
/// Returns the `ConfigurationError` produced when `T`'s descriptor was compiled.
pub fn metadata<T: JsonApiResource>() -> Result<Arc<ResourceMetadata<T>>, ConfigurationError> {
    let registry = REGISTRY.get_or_init(Registry::default);
    let key = TypeId::of::<T>();
    let class = type_name::<T>();

    if let Some(entry) = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        let entry: &(dyn Any + Send + Sync) = &**entry;
        if let Some(compiled) = entry.downcast_ref::<Compiled<T>>() {
            trace!(class, "resource metadata cache hit");
            return compiled.clone();
        }
    }

    // Compiled outside the lock: `describe` may itself look up other types.
    let compiled: Compiled<T> =
        ResourceMetadata::compile(class, T::describe(ResourceDescriptor::new())).map(Arc::new);
    match &compiled {
        Ok(metadata) => debug!(
            class,
            resource_type = metadata.resource_type(),
            "compiled resource metadata"
        ),
        Err(error) => debug!(class, %error, "rejected resource metadata"),
    }

    let mut registry = registry.write().unwrap_or_else(PoisonError::into_inner);
    let entry = registry
        .entry(key)
        .or_insert_with(|| Arc::new(compiled.clone()));
    let entry: &(dyn Any + Send + Sync) = &**entry;
    entry
        .downcast_ref::<Compiled<T>>()
        .cloned()
        .unwrap_or(compiled)
}
