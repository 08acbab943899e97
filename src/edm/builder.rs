//! Builder for an in-memory [`Edm`]

use super::*;

/// Collects type and container definitions into an [`Edm`]
#[derive(Debug, Default)]
pub struct EdmBuilder {
    edm: Edm,
}

impl EdmBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity type
    pub fn entity_type(
        self,
        name: FullQualifiedName,
        base_type: Option<FullQualifiedName>,
        key_properties: &[&str],
        properties: Vec<Property>,
        navigation_properties: Vec<NavigationProperty>,
    ) -> Self {
        self.add_entity_type(EntityType {
            name,
            base_type,
            key_properties: key_properties.iter().map(|k| k.to_string()).collect(),
            properties,
            navigation_properties,
            has_stream: false,
        })
    }

    /// Add an entity type whose instances are media-link entries
    pub fn media_entity_type(
        self,
        name: FullQualifiedName,
        base_type: Option<FullQualifiedName>,
        key_properties: &[&str],
        properties: Vec<Property>,
        navigation_properties: Vec<NavigationProperty>,
    ) -> Self {
        self.add_entity_type(EntityType {
            name,
            base_type,
            key_properties: key_properties.iter().map(|k| k.to_string()).collect(),
            properties,
            navigation_properties,
            has_stream: true,
        })
    }

    pub fn add_entity_type(mut self, entity_type: EntityType) -> Self {
        self.edm
            .entity_types
            .insert(entity_type.name.clone(), entity_type);
        self
    }

    pub fn complex_type(
        mut self,
        name: FullQualifiedName,
        base_type: Option<FullQualifiedName>,
        properties: Vec<Property>,
    ) -> Self {
        self.edm.complex_types.insert(
            name.clone(),
            ComplexType {
                name,
                base_type,
                properties,
            },
        );
        self
    }

    /// Add an association from two `(role, entity type, multiplicity)` ends
    pub fn association(
        mut self,
        name: FullQualifiedName,
        first: (&str, FullQualifiedName, Multiplicity),
        second: (&str, FullQualifiedName, Multiplicity),
    ) -> Self {
        let end = |(role, entity_type, multiplicity): (&str, FullQualifiedName, Multiplicity)| {
            AssociationEnd {
                role: role.to_string(),
                entity_type,
                multiplicity,
            }
        };
        self.edm.associations.insert(
            name.clone(),
            Association {
                name,
                ends: [end(first), end(second)],
            },
        );
        self
    }

    pub fn entity_set(mut self, name: &str, entity_type: FullQualifiedName) -> Self {
        self.edm.entity_sets.insert(
            name.to_string(),
            EntitySet {
                name: name.to_string(),
                entity_type,
            },
        );
        self
    }

    /// Bind an association to entity sets with two `(role, entity set)` ends
    pub fn association_set(
        mut self,
        name: &str,
        association: FullQualifiedName,
        first: (&str, &str),
        second: (&str, &str),
    ) -> Self {
        self.edm.association_sets.push(AssociationSet {
            name: name.to_string(),
            association,
            ends: [
                (first.0.to_string(), first.1.to_string()),
                (second.0.to_string(), second.1.to_string()),
            ],
        });
        self
    }

    pub fn function_import(mut self, function_import: FunctionImport) -> Self {
        self.edm
            .function_imports
            .insert(function_import.name.clone(), function_import);
        self
    }

    pub fn build(self) -> Edm {
        self.edm
    }
}

/// Shorthand for a navigation property definition
pub fn navigation(
    name: &str,
    relationship: FullQualifiedName,
    from_role: &str,
    to_role: &str,
) -> NavigationProperty {
    NavigationProperty {
        name: name.to_string(),
        relationship,
        from_role: from_role.to_string(),
        to_role: to_role.to_string(),
    }
}
