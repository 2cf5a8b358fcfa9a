//! Relationship assembly - builds `relationships` entries from declarations.

use crate::error::{ConfigurationError, SerializationError};
use crate::metadata::{Related, RelationshipDeclaration, Resource};
use crate::types::{
    RelationshipData, RelationshipEntry, Relationships, ResourceIdentifier, SelfLink,
};

/// Build the `{id, type}` identifier of a related resource.
///
/// # Errors
///
/// Returns `ConfigurationError` if the target has no resource type or id.
pub fn resource_identifier(target: &dyn Resource) -> Result<ResourceIdentifier, ConfigurationError> {
    let resource_type = target.resolve_type()?;
    let id = target.resolve_id()?;
    Ok(ResourceIdentifier { id, resource_type })
}

/// Build the entry for inline related value(s).
///
/// Each element of a to-many relationship is resolved on its own, so mixed
/// types are allowed.
pub fn related_entry(related: &Related<'_>) -> Result<RelationshipEntry, ConfigurationError> {
    let data = match related {
        Related::One(target) => RelationshipData::One(resource_identifier(*target)?),
        Related::Many(targets) => RelationshipData::Many(
            targets
                .iter()
                .map(|target| resource_identifier(*target))
                .collect::<Result<_, _>>()?,
        ),
    };
    Ok(RelationshipEntry::Data(data))
}

/// Build the entry for one relationship declaration.
///
/// An external location always yields a links-only entry, without looking at
/// any related value.
pub fn relationship_entry(
    declaration: &RelationshipDeclaration<'_>,
) -> Result<RelationshipEntry, ConfigurationError> {
    match declaration {
        RelationshipDeclaration::External(location) => Ok(RelationshipEntry::Links(SelfLink {
            href: location.clone(),
        })),
        RelationshipDeclaration::Inline(related) => related_entry(related),
    }
}

/// Assemble every declared relationship of `owner`.
///
/// # Errors
///
/// Returns `SerializationError::Relationship` naming the owner and the
/// relationship when a target cannot be identified.
pub fn assemble_relationships(owner: &dyn Resource) -> Result<Relationships, SerializationError> {
    let mut relationships = Relationships::new();

    for (name, declaration) in owner.resolve_relationships()? {
        let entry =
            relationship_entry(&declaration).map_err(|source| SerializationError::Relationship {
                class: owner.class_name().to_string(),
                name: name.clone(),
                source,
            })?;
        relationships.insert(name, entry);
    }

    Ok(relationships)
}
