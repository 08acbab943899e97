//! Structural properties in `m:properties` and single-property documents

use std::io::BufRead;

use super::cursor::{XmlCursor, XmlEvent, XmlStartTag};
use crate::edm::{Edm, EdmLiteralKind, EntityInfo, Property, PropertyType};
use crate::error::{invalid_value, EntityProviderError, MessageKey, Result};
use crate::io::insert_property;
use crate::io::xml::{DATA_NS, METADATA_NS};
use crate::read_properties::ReadProperties;
use crate::types::{PropertyMap, PropertyValue};

/// Reads property elements against the metadata
pub(crate) struct XmlPropertyReader<'a> {
    edm: &'a Edm,
    read_properties: &'a ReadProperties,
}

impl<'a> XmlPropertyReader<'a> {
    pub fn new(edm: &'a Edm, read_properties: &'a ReadProperties) -> Self {
        Self {
            edm,
            read_properties,
        }
    }

    /// Children of `m:properties`, up to and including its end tag
    pub fn read_properties<R: BufRead>(
        &self,
        cursor: &mut XmlCursor<R>,
        info: &EntityInfo<'_>,
        properties: &mut PropertyMap,
    ) -> Result<()> {
        loop {
            match cursor.next_tag()? {
                XmlEvent::Start(tag) if tag.name.in_namespace(DATA_NS) => {
                    let property = info.property(&tag.name.local).ok_or_else(|| {
                        EntityProviderError::new(MessageKey::InvalidProperty).with_content(&tag.name.local)
                    })?;
                    let value = self.read_value(cursor, &tag, property, "")?;
                    insert_property(properties, &property.name, value)?;
                }
                XmlEvent::Start(tag) => {
                    log::trace!("Skipping foreign element {}", tag.name);
                    cursor.skip_element()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Value of the property element whose start tag was just consumed
    ///
    /// `prefix` is the path of the enclosing complex property, empty at the
    /// entity level.
    pub fn read_value<R: BufRead>(
        &self,
        cursor: &mut XmlCursor<R>,
        tag: &XmlStartTag,
        property: &Property,
        prefix: &str,
    ) -> Result<PropertyValue> {
        if tag.attribute(Some(METADATA_NS), "null") == Some("true") {
            if self.read_properties.validate_facets() && !property.facets.is_nullable() {
                return Err(EntityProviderError::new(MessageKey::InvalidNullProperty)
                    .with_content(&property.name));
            }
            cursor.skip_element()?;
            return Ok(PropertyValue::Null);
        }

        let declared_type = tag.attribute(Some(METADATA_NS), "type");
        match &property.property_type {
            PropertyType::Simple(kind) => {
                if let Some(declared) = declared_type {
                    if declared != kind.to_string() {
                        return Err(EntityProviderError::new(MessageKey::InvalidSimpleType)
                            .with_content(&property.name));
                    }
                }
                let text = cursor.element_text()?;
                let facets = self
                    .read_properties
                    .validate_facets()
                    .then_some(&property.facets);
                let target = self
                    .read_properties
                    .type_mappings()
                    .get_nested(prefix, &property.name);
                kind.value_of_string(&text, EdmLiteralKind::Default, facets, target)
                    .map(PropertyValue::Simple)
                    .map_err(|err| invalid_value(&property.name, err))
            }
            PropertyType::Complex(type_name) => {
                if let Some(declared) = declared_type {
                    if declared != type_name.to_string() {
                        return Err(EntityProviderError::new(MessageKey::InvalidComplexType)
                            .with_content(type_name)
                            .with_content(declared));
                    }
                }
                let path = if prefix.is_empty() {
                    property.name.clone()
                } else {
                    format!("{}/{}", prefix, property.name)
                };
                let mut members = PropertyMap::new();
                loop {
                    match cursor.next_tag()? {
                        XmlEvent::Start(child) if child.name.in_namespace(DATA_NS) => {
                            let member = self
                                .edm
                                .complex_property(type_name, &child.name.local)?
                                .ok_or_else(|| {
                                    EntityProviderError::new(MessageKey::InvalidProperty)
                                        .with_content(&child.name.local)
                                })?;
                            let value = self.read_value(cursor, &child, member, &path)?;
                            insert_property(&mut members, &member.name, value)?;
                        }
                        XmlEvent::Start(_) => cursor.skip_element()?,
                        _ => break,
                    }
                }
                Ok(PropertyValue::Complex(members))
            }
        }
    }

    /// Document holding exactly one property element
    pub fn read_property_document<R: BufRead>(
        &self,
        cursor: &mut XmlCursor<R>,
        property: &Property,
    ) -> Result<PropertyMap> {
        let root = cursor.root_element()?;
        if !root.name.is(DATA_NS, &property.name) {
            return Err(EntityProviderError::new(MessageKey::MissingTag).with_content(&property.name));
        }
        let value = self.read_value(cursor, &root, property, "")?;
        cursor.expect_end_of_document()?;

        let mut map = PropertyMap::new();
        map.insert(property.name.clone(), value);
        Ok(map)
    }

    /// Collection document of a function import: `element` children of the
    /// root, each read as `element_property`
    pub fn read_collection_document<R: BufRead>(
        &self,
        cursor: &mut XmlCursor<R>,
        element_property: &Property,
    ) -> Result<Vec<PropertyValue>> {
        let root = cursor.root_element()?;
        if !root.name.in_namespace(DATA_NS) {
            return Err(EntityProviderError::new(MessageKey::MissingTag).with_content(&element_property.name));
        }
        let mut values = Vec::new();
        loop {
            match cursor.next_tag()? {
                XmlEvent::Start(tag) if tag.name.is(DATA_NS, "element") => {
                    values.push(self.read_value(cursor, &tag, element_property, "")?);
                }
                XmlEvent::Start(tag) => {
                    return Err(EntityProviderError::new(MessageKey::InvalidContent)
                        .with_content(&tag.name.local)
                        .with_content(&root.name.local));
                }
                _ => break,
            }
        }
        cursor.expect_end_of_document()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edm::{EdmSimpleTypeKind, Facets, FullQualifiedName, SimpleValue, TargetType};

    fn edm() -> Edm {
        Edm::builder()
            .complex_type(
                FullQualifiedName::new("T", "c_City"),
                None,
                vec![
                    Property::simple("PostalCode", EdmSimpleTypeKind::String),
                    Property::simple("CityName", EdmSimpleTypeKind::String),
                ],
            )
            .build()
    }

    fn read(xml: &str, property: &Property, props: &ReadProperties) -> Result<PropertyMap> {
        let edm = edm();
        let mut cursor = XmlCursor::new(xml.as_bytes());
        XmlPropertyReader::new(&edm, props).read_property_document(&mut cursor, property)
    }

    const NS: &str = r#"xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata""#;

    #[test]
    fn test_simple_property_document() {
        let property = Property::simple("Age", EdmSimpleTypeKind::Int32);
        let map = read(&format!("<d:Age {NS}>67</d:Age>"), &property, &ReadProperties::default()).unwrap();
        assert_eq!(map["Age"], PropertyValue::Simple(SimpleValue::Int32(67)));
    }

    #[test]
    fn test_type_mapping_applies() {
        let property = Property::simple("Age", EdmSimpleTypeKind::Int32);
        let props = ReadProperties::builder().type_mapping("Age", TargetType::I64).build();
        let map = read(&format!("<d:Age {NS}>67</d:Age>"), &property, &props).unwrap();
        assert_eq!(map["Age"], PropertyValue::Simple(SimpleValue::Int64(67)));
    }

    #[test]
    fn test_complex_property_document() {
        let property = Property::complex("City", FullQualifiedName::new("T", "c_City"));
        let xml = format!(
            r#"<d:City {NS} m:type="T.c_City"><d:PostalCode>69124</d:PostalCode><d:CityName>Heidelberg</d:CityName></d:City>"#
        );
        let map = read(&xml, &property, &ReadProperties::default()).unwrap();
        let city = map["City"].as_complex().unwrap();
        assert_eq!(city["CityName"].as_simple().and_then(SimpleValue::as_str), Some("Heidelberg"));
    }

    #[test]
    fn test_wrong_complex_type() {
        let property = Property::complex("City", FullQualifiedName::new("T", "c_City"));
        let xml = format!(r#"<d:City {NS} m:type="T.c_Other"/>"#);
        let err = read(&xml, &property, &ReadProperties::default()).unwrap_err();
        assert_eq!(err.key(), MessageKey::InvalidComplexType);
    }

    #[test]
    fn test_null_for_non_nullable() {
        let property =
            Property::simple("Age", EdmSimpleTypeKind::Int32).with_facets(Facets::not_nullable());
        let xml = format!(r#"<d:Age {NS} m:null="true"/>"#);
        let err = read(&xml, &property, &ReadProperties::default()).unwrap_err();
        assert_eq!(err.key(), MessageKey::InvalidNullProperty);

        let lenient = ReadProperties::builder().validate_facets(false).build();
        let map = read(&xml, &property, &lenient).unwrap();
        assert!(map["Age"].is_null());
    }

    #[test]
    fn test_unconvertible_value() {
        let property = Property::simple("Age", EdmSimpleTypeKind::Int32);
        let err = read(&format!("<d:Age {NS}>old</d:Age>"), &property, &ReadProperties::default())
            .unwrap_err();
        assert_eq!(err.key(), MessageKey::InvalidPropertyValue);
        assert!(err.cause().is_some());
    }
}
