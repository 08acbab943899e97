//! Entity Data Model (EDM)
//!
//! The consumer only reads metadata. The model is an arena: every entity
//! type, complex type and association is stored once and addressed by its
//! [`FullQualifiedName`]; base types are followed iteratively by name, so
//! there are no reference cycles and an [`Edm`] can be shared by any number
//! of concurrent reads.

mod builder;
mod entity_info;
mod simple_type;

pub use builder::{navigation, EdmBuilder};
pub use entity_info::EntityInfo;
pub use simple_type::{
    EdmLiteralKind, EdmSimpleTypeError, EdmSimpleTypeKind, SimpleValue, TargetType,
};

use ahash::AHashMap;
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Errors raised by metadata lookups
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EdmError {
    #[error("Entity type not found: {0}")]
    EntityTypeNotFound(String),

    #[error("Complex type not found: {0}")]
    ComplexTypeNotFound(String),

    #[error("Association not found: {0}")]
    AssociationNotFound(String),

    #[error("Association {association} has no end with role {role}")]
    RoleNotFound { association: String, role: String },

    #[error("Entity set not found: {0}")]
    EntitySetNotFound(String),

    #[error("Function import not found: {0}")]
    FunctionImportNotFound(String),

    #[error("No entity set related to {entity_set} via {navigation}")]
    NoRelatedEntitySet {
        entity_set: String,
        navigation: String,
    },

    #[error("Base type chain of {0} is cyclic")]
    CyclicBaseType(String),
}

/// Namespace-qualified type name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullQualifiedName {
    pub namespace: String,
    pub name: String,
}

impl FullQualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FullQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Navigation multiplicity of an association end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    One,
    ZeroToOne,
    Many,
}

/// Property facets relevant to reading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    /// `None` means nullable
    pub nullable: Option<bool>,
    pub max_length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl Facets {
    pub fn not_nullable() -> Self {
        Self {
            nullable: Some(false),
            ..Self::default()
        }
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(true)
    }
}

/// Type of a structural property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    Simple(EdmSimpleTypeKind),
    Complex(FullQualifiedName),
}

/// Syndication element a property can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyndicationTarget {
    AuthorEmail,
    AuthorName,
    AuthorUri,
    ContributorEmail,
    ContributorName,
    ContributorUri,
    Published,
    Rights,
    Summary,
    Title,
    Updated,
}

/// Alternate payload location of a property value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMappingTarget {
    Syndication(SyndicationTarget),
    /// Element `element` in namespace `namespace_uri`
    Custom {
        namespace_uri: String,
        namespace_prefix: String,
        element: String,
    },
}

/// Customizable feed mapping declared on a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizableFeedMapping {
    pub target: FeedMappingTarget,
    /// `true` when the value is also written to the properties block
    pub keep_in_content: bool,
}

/// Structural property of an entity or complex type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub property_type: PropertyType,
    pub facets: Facets,
    pub mapping: Option<CustomizableFeedMapping>,
}

impl Property {
    pub fn simple(name: impl Into<String>, kind: EdmSimpleTypeKind) -> Self {
        Self {
            name: name.into(),
            property_type: PropertyType::Simple(kind),
            facets: Facets::default(),
            mapping: None,
        }
    }

    pub fn complex(name: impl Into<String>, type_name: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            property_type: PropertyType::Complex(type_name),
            facets: Facets::default(),
            mapping: None,
        }
    }

    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = facets;
        self
    }

    pub fn with_mapping(mut self, target: FeedMappingTarget, keep_in_content: bool) -> Self {
        self.mapping = Some(CustomizableFeedMapping {
            target,
            keep_in_content,
        });
        self
    }

    pub fn simple_kind(&self) -> Option<EdmSimpleTypeKind> {
        match self.property_type {
            PropertyType::Simple(kind) => Some(kind),
            PropertyType::Complex(_) => None,
        }
    }
}

/// Navigation property of an entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationProperty {
    pub name: String,
    pub relationship: FullQualifiedName,
    pub from_role: String,
    pub to_role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    pub name: FullQualifiedName,
    pub base_type: Option<FullQualifiedName>,
    pub key_properties: Vec<String>,
    pub properties: Vec<Property>,
    pub navigation_properties: Vec<NavigationProperty>,
    pub has_stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexType {
    pub name: FullQualifiedName,
    pub base_type: Option<FullQualifiedName>,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationEnd {
    pub role: String,
    pub entity_type: FullQualifiedName,
    pub multiplicity: Multiplicity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub name: FullQualifiedName,
    pub ends: [AssociationEnd; 2],
}

impl Association {
    pub fn end(&self, role: &str) -> Option<&AssociationEnd> {
        self.ends.iter().find(|end| end.role == role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySet {
    pub name: String,
    pub entity_type: FullQualifiedName,
}

/// Binds the two roles of an association to entity sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationSet {
    pub name: String,
    pub association: FullQualifiedName,
    /// `(role, entity set name)` pairs
    pub ends: [(String, String); 2],
}

/// Shape a function import returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Property(PropertyType),
    Entity(FullQualifiedName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionImport {
    pub name: String,
    pub return_type: ReturnType,
    pub multiplicity: Multiplicity,
    pub entity_set: Option<String>,
}

impl FunctionImport {
    /// Property describing one element of a collection result
    pub fn element_property(&self) -> Option<Property> {
        match &self.return_type {
            ReturnType::Property(property_type) => Some(Property {
                name: self.name.clone(),
                property_type: property_type.clone(),
                facets: Facets::default(),
                mapping: None,
            }),
            ReturnType::Entity(_) => None,
        }
    }
}

/// Resolved metadata model
#[derive(Debug, Clone, Default)]
pub struct Edm {
    pub(crate) entity_types: AHashMap<FullQualifiedName, EntityType>,
    pub(crate) complex_types: AHashMap<FullQualifiedName, ComplexType>,
    pub(crate) associations: AHashMap<FullQualifiedName, Association>,
    pub(crate) entity_sets: IndexMap<String, EntitySet>,
    pub(crate) association_sets: Vec<AssociationSet>,
    pub(crate) function_imports: IndexMap<String, FunctionImport>,
}

impl Edm {
    pub fn builder() -> EdmBuilder {
        EdmBuilder::new()
    }

    pub fn entity_type(&self, name: &FullQualifiedName) -> Result<&EntityType, EdmError> {
        self.entity_types
            .get(name)
            .ok_or_else(|| EdmError::EntityTypeNotFound(name.to_string()))
    }

    pub fn complex_type(&self, name: &FullQualifiedName) -> Result<&ComplexType, EdmError> {
        self.complex_types
            .get(name)
            .ok_or_else(|| EdmError::ComplexTypeNotFound(name.to_string()))
    }

    pub fn association(&self, name: &FullQualifiedName) -> Result<&Association, EdmError> {
        self.associations
            .get(name)
            .ok_or_else(|| EdmError::AssociationNotFound(name.to_string()))
    }

    pub fn entity_set(&self, name: &str) -> Result<&EntitySet, EdmError> {
        self.entity_sets
            .get(name)
            .ok_or_else(|| EdmError::EntitySetNotFound(name.to_string()))
    }

    pub fn function_import(&self, name: &str) -> Result<&FunctionImport, EdmError> {
        self.function_imports
            .get(name)
            .ok_or_else(|| EdmError::FunctionImportNotFound(name.to_string()))
    }

    /// Entity type followed by its base types, most derived first
    pub fn entity_type_chain(&self, name: &FullQualifiedName) -> Result<Vec<&EntityType>, EdmError> {
        let mut chain = Vec::new();
        let mut current = Some(name);
        while let Some(type_name) = current {
            if chain.len() > self.entity_types.len() {
                return Err(EdmError::CyclicBaseType(name.to_string()));
            }
            let entity_type = self.entity_type(type_name)?;
            chain.push(entity_type);
            current = entity_type.base_type.as_ref();
        }
        Ok(chain)
    }

    /// Property of a complex type, walking its base types
    pub fn complex_property(
        &self,
        complex_type: &FullQualifiedName,
        name: &str,
    ) -> Result<Option<&Property>, EdmError> {
        let mut current = Some(complex_type);
        let mut steps = 0;
        while let Some(type_name) = current {
            steps += 1;
            if steps > self.complex_types.len() + 1 {
                return Err(EdmError::CyclicBaseType(complex_type.to_string()));
            }
            let ct = self.complex_type(type_name)?;
            if let Some(property) = ct.properties.iter().find(|p| p.name == name) {
                return Ok(Some(property));
            }
            current = ct.base_type.as_ref();
        }
        Ok(None)
    }

    /// Multiplicity of the target end of a navigation property
    pub fn navigation_multiplicity(&self, navigation: &NavigationProperty) -> Result<Multiplicity, EdmError> {
        let association = self.association(&navigation.relationship)?;
        association
            .end(&navigation.to_role)
            .map(|end| end.multiplicity)
            .ok_or_else(|| EdmError::RoleNotFound {
                association: association.name.to_string(),
                role: navigation.to_role.clone(),
            })
    }

    /// Entity set reached from `entity_set` through `navigation`
    ///
    /// Association sets are consulted first; without a matching association
    /// set the unique entity set of the target type is used.
    pub fn related_entity_set(
        &self,
        entity_set: &EntitySet,
        navigation: &NavigationProperty,
    ) -> Result<&EntitySet, EdmError> {
        let not_found = || EdmError::NoRelatedEntitySet {
            entity_set: entity_set.name.clone(),
            navigation: navigation.name.clone(),
        };

        for set in &self.association_sets {
            if set.association != navigation.relationship {
                continue;
            }
            let from = set.ends.iter().find(|(role, _)| *role == navigation.from_role);
            let to = set.ends.iter().find(|(role, _)| *role == navigation.to_role);
            if let (Some((_, from_set)), Some((_, to_set))) = (from, to) {
                if *from_set == entity_set.name {
                    return self.entity_set(to_set);
                }
            }
        }

        let association = self.association(&navigation.relationship)?;
        let target = association.end(&navigation.to_role).ok_or_else(|| EdmError::RoleNotFound {
            association: association.name.to_string(),
            role: navigation.to_role.clone(),
        })?;
        let mut candidates = self
            .entity_sets
            .values()
            .filter(|set| set.entity_type == target.entity_type);
        match (candidates.next(), candidates.next()) {
            (Some(set), None) => Ok(set),
            _ => Err(not_found()),
        }
    }
}
