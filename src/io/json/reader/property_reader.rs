//! JSON property values

use super::cursor::{JsonCursor, JsonToken};
use crate::edm::{Edm, EdmLiteralKind, EdmSimpleTypeKind, Property, PropertyType};
use crate::error::{invalid_value, EntityProviderError, MessageKey, Result};
use crate::io::insert_property;
use crate::io::json::{METADATA, RESULTS};
use crate::read_properties::ReadProperties;
use crate::types::{PropertyMap, PropertyValue};

/// JSON token kinds a simple type accepts
fn accepts_token(kind: EdmSimpleTypeKind, token: JsonToken) -> bool {
    use EdmSimpleTypeKind::*;
    match kind {
        Boolean => token == JsonToken::Boolean,
        Byte | SByte | Int16 | Int32 => token == JsonToken::Number,
        Int64 | Single | Double | Decimal => {
            matches!(token, JsonToken::String | JsonToken::Number)
        }
        Binary | DateTime | DateTimeOffset | Guid | String | Time => token == JsonToken::String,
    }
}

pub(crate) struct JsonPropertyReader<'a> {
    edm: &'a Edm,
    read_properties: &'a ReadProperties,
}

impl<'a> JsonPropertyReader<'a> {
    pub fn new(edm: &'a Edm, read_properties: &'a ReadProperties) -> Self {
        Self {
            edm,
            read_properties,
        }
    }

    /// Value at the cursor; `prefix` is the path of the enclosing complex
    /// property, empty at the entity level
    pub fn read_value(&self, cursor: &mut JsonCursor, property: &Property, prefix: &str) -> Result<PropertyValue> {
        if cursor.peek() == JsonToken::Null {
            cursor.next_null()?;
            if self.read_properties.validate_facets() && !property.facets.is_nullable() {
                return Err(EntityProviderError::new(MessageKey::InvalidNullProperty)
                    .with_content(&property.name));
            }
            return Ok(PropertyValue::Null);
        }

        match &property.property_type {
            PropertyType::Simple(kind) => {
                let token = cursor.peek();
                if !accepts_token(*kind, token) {
                    return Err(EntityProviderError::new(MessageKey::InvalidSimpleType)
                        .with_content(&property.name));
                }
                let (_, literal) = cursor.next_literal()?;
                let facets = self
                    .read_properties
                    .validate_facets()
                    .then_some(&property.facets);
                let target = self
                    .read_properties
                    .type_mappings()
                    .get_nested(prefix, &property.name);
                kind.value_of_string(&literal, EdmLiteralKind::Json, facets, target)
                    .map(PropertyValue::Simple)
                    .map_err(|err| invalid_value(&property.name, err))
            }
            PropertyType::Complex(type_name) => {
                let path = if prefix.is_empty() {
                    property.name.clone()
                } else {
                    format!("{}/{}", prefix, property.name)
                };
                let mut members = PropertyMap::new();
                cursor.begin_object()?;
                while cursor.has_next() {
                    let name = cursor.next_name()?;
                    if name == METADATA {
                        self.check_complex_metadata(cursor, &type_name.to_string())?;
                        continue;
                    }
                    let member = self.edm.complex_property(type_name, &name)?.ok_or_else(|| {
                        EntityProviderError::new(MessageKey::InvalidProperty).with_content(&name)
                    })?;
                    let value = self.read_value(cursor, member, &path)?;
                    insert_property(&mut members, &member.name, value)?;
                }
                cursor.end_object()?;
                Ok(PropertyValue::Complex(members))
            }
        }
    }

    fn check_complex_metadata(&self, cursor: &mut JsonCursor, expected: &str) -> Result<()> {
        cursor.begin_object()?;
        while cursor.has_next() {
            let key = cursor.next_name()?;
            if key == "type" {
                let declared = cursor.next_string()?;
                if declared != expected {
                    return Err(EntityProviderError::new(MessageKey::InvalidComplexType)
                        .with_content(expected)
                        .with_content(declared));
                }
            } else {
                cursor.skip_value()?;
            }
        }
        cursor.end_object()
    }

    /// `{"d": {"Name": value}}` or `{"Name": value}`
    pub fn read_property_document(&self, cursor: &mut JsonCursor, property: &Property) -> Result<PropertyMap> {
        let wrapped = super::enter_envelope(cursor)?;
        cursor.begin_object()?;
        let name = cursor.next_name()?;
        if name != property.name {
            return Err(EntityProviderError::new(MessageKey::InvalidProperty).with_content(name));
        }
        let value = self.read_value(cursor, property, "")?;
        cursor.end_object()?;
        super::leave_envelope(cursor, wrapped)?;

        let mut map = PropertyMap::new();
        map.insert(property.name.clone(), value);
        Ok(map)
    }

    /// `{"d": [...]}`, `{"d": {"results": [...]}}` or a bare array
    pub fn read_collection_document(
        &self,
        cursor: &mut JsonCursor,
        element_property: &Property,
    ) -> Result<Vec<PropertyValue>> {
        let wrapped = super::enter_envelope(cursor)?;
        let values = if cursor.peek() == JsonToken::BeginObject {
            let mut values = None;
            cursor.begin_object()?;
            while cursor.has_next() {
                let name = cursor.next_name()?;
                match name.as_str() {
                    RESULTS if values.is_some() => {
                        return Err(EntityProviderError::new(MessageKey::DoubleResultsArray))
                    }
                    RESULTS => values = Some(self.read_elements(cursor, element_property)?),
                    METADATA => cursor.skip_value()?,
                    _ => {
                        return Err(EntityProviderError::new(MessageKey::InvalidContent)
                            .with_content(name)
                            .with_content(&element_property.name))
                    }
                }
            }
            cursor.end_object()?;
            values.ok_or_else(|| EntityProviderError::new(MessageKey::MissingResultsArray))?
        } else {
            self.read_elements(cursor, element_property)?
        };
        super::leave_envelope(cursor, wrapped)?;
        Ok(values)
    }

    fn read_elements(&self, cursor: &mut JsonCursor, element_property: &Property) -> Result<Vec<PropertyValue>> {
        let mut values = Vec::new();
        cursor.begin_array()?;
        while cursor.has_next() {
            values.push(self.read_value(cursor, element_property, "")?);
        }
        cursor.end_array()?;
        Ok(values)
    }
}
