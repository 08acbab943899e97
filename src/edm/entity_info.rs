//! Read-only view of one entity set and its entity type

use super::{
    Edm, EdmError, EntitySet, EntityType, FeedMappingTarget, Multiplicity, NavigationProperty,
    Property,
};

/// Metadata queries the consumer issues while reading entries of one set
#[derive(Debug, Clone, Copy)]
pub struct EntityInfo<'e> {
    edm: &'e Edm,
    entity_set: &'e EntitySet,
    entity_type: &'e EntityType,
}

impl<'e> EntityInfo<'e> {
    pub fn new(edm: &'e Edm, entity_set: &'e EntitySet) -> Result<Self, EdmError> {
        let entity_type = edm.entity_type(&entity_set.entity_type)?;
        // Surface broken base-type chains before any payload is read
        edm.entity_type_chain(&entity_set.entity_type)?;
        Ok(Self {
            edm,
            entity_set,
            entity_type,
        })
    }

    pub fn edm(&self) -> &'e Edm {
        self.edm
    }

    pub fn entity_set(&self) -> &'e EntitySet {
        self.entity_set
    }

    pub fn entity_type(&self) -> &'e EntityType {
        self.entity_type
    }

    fn chain(&self) -> impl Iterator<Item = &'e EntityType> + 'e {
        let edm = self.edm;
        std::iter::successors(Some(self.entity_type), move |current| {
            current
                .base_type
                .as_ref()
                .and_then(|base| edm.entity_type(base).ok())
        })
    }

    /// Structural property by name, including inherited ones
    pub fn property(&self, name: &str) -> Option<&'e Property> {
        self.chain()
            .flat_map(|t| t.properties.iter())
            .find(|p| p.name == name)
    }

    /// Navigation property by name, including inherited ones
    pub fn navigation_property(&self, name: &str) -> Option<&'e NavigationProperty> {
        self.chain()
            .flat_map(|t| t.navigation_properties.iter())
            .find(|n| n.name == name)
    }

    pub fn has_stream(&self) -> bool {
        self.chain().any(|t| t.has_stream)
    }

    /// Property whose customizable feed mapping points to `target`
    pub fn mapped_property(&self, target: &FeedMappingTarget) -> Option<&'e Property> {
        self.chain()
            .flat_map(|t| t.properties.iter())
            .find(|p| p.mapping.as_ref().map(|m| &m.target) == Some(target))
    }

    /// Custom-mapped property for an element in a foreign namespace
    pub fn custom_mapped_property(&self, namespace_uri: &str, element: &str) -> Option<&'e Property> {
        self.chain()
            .flat_map(|t| t.properties.iter())
            .find(|p| match p.mapping.as_ref().map(|m| &m.target) {
                Some(FeedMappingTarget::Custom {
                    namespace_uri: uri,
                    element: name,
                    ..
                }) => uri == namespace_uri && name == element,
                _ => false,
            })
    }

    /// Entity info of the navigation target plus the target multiplicity
    pub fn navigate(&self, navigation: &NavigationProperty) -> Result<(EntityInfo<'e>, Multiplicity), EdmError> {
        let multiplicity = self.edm.navigation_multiplicity(navigation)?;
        let target_set = self.edm.related_entity_set(self.entity_set, navigation)?;
        Ok((EntityInfo::new(self.edm, target_set)?, multiplicity))
    }
}
