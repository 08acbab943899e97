//! Read configuration

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::callback::OnReadInlineContent;
use crate::edm::TargetType;

/// Per-property host type overrides
///
/// Keys are property paths with segments joined by `/`: `"Age"`,
/// `"Location/City/PostalCode"`, or `"ne_Team/Id"` for a property of inline
/// content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMappings {
    mappings: IndexMap<String, TargetType>,
}

impl TypeMappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, target: TargetType) {
        self.mappings.insert(path.into(), target);
    }

    pub fn get(&self, path: &str) -> Option<TargetType> {
        self.mappings.get(path).copied()
    }

    /// Look up `name` below the complex property path `prefix`
    pub fn get_nested(&self, prefix: &str, name: &str) -> Option<TargetType> {
        if prefix.is_empty() {
            self.get(name)
        } else {
            self.get(&format!("{}/{}", prefix, name))
        }
    }

    /// Mappings re-rooted below `segment`
    pub fn scoped(&self, segment: &str) -> TypeMappings {
        let prefix = format!("{}/", segment);
        let mappings = self
            .mappings
            .iter()
            .filter_map(|(path, target)| {
                path.strip_prefix(&prefix)
                    .map(|rest| (rest.to_string(), *target))
            })
            .collect();
        TypeMappings { mappings }
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Configuration of one read call
///
/// Immutable once built. A callback may hand out a different instance for
/// each nesting level through
/// [`OnReadInlineContent::receive_read_properties`].
#[derive(Clone)]
pub struct ReadProperties {
    merge_semantic: bool,
    callback: Option<Rc<dyn OnReadInlineContent>>,
    type_mappings: TypeMappings,
    validate_facets: bool,
}

impl Default for ReadProperties {
    fn default() -> Self {
        Self {
            merge_semantic: false,
            callback: None,
            type_mappings: TypeMappings::default(),
            validate_facets: true,
        }
    }
}

impl fmt::Debug for ReadProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadProperties")
            .field("merge_semantic", &self.merge_semantic)
            .field("callback", &self.callback.is_some())
            .field("type_mappings", &self.type_mappings)
            .field("validate_facets", &self.validate_facets)
            .finish()
    }
}

impl ReadProperties {
    pub fn builder() -> ReadPropertiesBuilder {
        ReadPropertiesBuilder::default()
    }

    /// Partial (patch-style) payload
    pub fn is_merge(&self) -> bool {
        self.merge_semantic
    }

    pub fn callback(&self) -> Option<&Rc<dyn OnReadInlineContent>> {
        self.callback.as_ref()
    }

    pub fn type_mappings(&self) -> &TypeMappings {
        &self.type_mappings
    }

    pub fn validate_facets(&self) -> bool {
        self.validate_facets
    }

    /// Properties for inline content of `navigation` when no callback
    /// intercepts it
    pub(crate) fn scoped(&self, navigation: &str) -> ReadProperties {
        ReadProperties {
            type_mappings: self.type_mappings.scoped(navigation),
            ..self.clone()
        }
    }
}

/// Builder for [`ReadProperties`]
#[derive(Default)]
pub struct ReadPropertiesBuilder {
    properties: ReadProperties,
}

impl ReadPropertiesBuilder {
    pub fn merge_semantic(mut self, merge: bool) -> Self {
        self.properties.merge_semantic = merge;
        self
    }

    pub fn callback(mut self, callback: Rc<dyn OnReadInlineContent>) -> Self {
        self.properties.callback = Some(callback);
        self
    }

    pub fn type_mapping(mut self, path: impl Into<String>, target: TargetType) -> Self {
        self.properties.type_mappings.insert(path, target);
        self
    }

    pub fn type_mappings(mut self, mappings: TypeMappings) -> Self {
        self.properties.type_mappings = mappings;
        self
    }

    pub fn validate_facets(mut self, validate: bool) -> Self {
        self.properties.validate_facets = validate;
        self
    }

    pub fn build(self) -> ReadProperties {
        self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let props = ReadProperties::default();
        assert!(!props.is_merge());
        assert!(props.validate_facets());
        assert!(props.callback().is_none());
        assert!(props.type_mappings().is_empty());
    }

    #[test]
    fn test_scoped_type_mappings() {
        let props = ReadProperties::builder()
            .type_mapping("Age", TargetType::I64)
            .type_mapping("ne_Team/Id", TargetType::String)
            .type_mapping("ne_Team/nt_Employees/Age", TargetType::I64)
            .build();

        let team = props.scoped("ne_Team");
        assert_eq!(team.type_mappings().get("Id"), Some(TargetType::String));
        assert_eq!(team.type_mappings().get("Age"), None);
        assert_eq!(
            team.type_mappings().scoped("nt_Employees").get("Age"),
            Some(TargetType::I64)
        );
    }

    #[test]
    fn test_nested_lookup() {
        let mut mappings = TypeMappings::new();
        mappings.insert("Location/City/PostalCode", TargetType::I32);
        assert_eq!(
            mappings.get_nested("Location/City", "PostalCode"),
            Some(TargetType::I32)
        );
        assert_eq!(mappings.get_nested("", "PostalCode"), None);
    }
}
