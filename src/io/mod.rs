//! Payload reading for Atom/XML and JSON documents
//!
//! [`EntityReader`] picks the format from the response content type and
//! hands the document to the matching consumer. Everything below this module
//! shares the same error keys, so callers can treat both formats alike.

pub(crate) mod inline_content;
pub mod json;
pub mod xml;

use std::io::{BufReader, Read};

use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, UTF_8};

use crate::edm::{
    Edm, EdmLiteralKind, EdmSimpleTypeKind, EntityInfo, Property, PropertyType, SimpleValue,
    TargetType,
};
use crate::error::{invalid_value, EntityProviderError, MessageKey, Result};
use crate::read_properties::ReadProperties;
use crate::types::{DeltaFeed, Entry, ErrorContext, Feed, PropertyMap, PropertyValue};
use json::JsonEntityConsumer;
use xml::XmlEntityConsumer;

/// Wire format of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Atom or plain XML
    Xml,
    /// Verbose JSON
    Json,
}

impl PayloadFormat {
    /// Format for a content type such as `application/atom+xml;type=entry`
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let mut parts = content_type.split(';');
        let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();

        for parameter in parts {
            let (name, value) = match parameter.split_once('=') {
                Some(pair) => pair,
                None => continue,
            };
            if !name.trim().eq_ignore_ascii_case("charset") {
                continue;
            }
            let label = value.trim().trim_matches('"');
            if Encoding::for_label(label.as_bytes()) != Some(UTF_8) {
                return Err(EntityProviderError::new(MessageKey::UnsupportedCharacterEncoding)
                    .with_content(label));
            }
        }

        match mime.as_str() {
            "application/atom+xml" | "application/xml" | "text/xml" => Ok(PayloadFormat::Xml),
            "application/json" => Ok(PayloadFormat::Json),
            _ => Err(EntityProviderError::new(MessageKey::UnsupportedContentType)
                .with_content(content_type)),
        }
    }
}

/// Reads OData payloads of one content type against a metadata model
///
/// ```ignore
/// let reader = EntityReader::new(&edm, "application/atom+xml")?
///     .with_properties(ReadProperties::builder().merge_semantic(true).build());
/// let entry = reader.read_entry("Employees", response_body)?;
/// ```
#[derive(Debug)]
pub struct EntityReader<'a> {
    edm: &'a Edm,
    content_type: String,
    format: PayloadFormat,
    read_properties: ReadProperties,
}

impl<'a> EntityReader<'a> {
    pub fn new(edm: &'a Edm, content_type: &str) -> Result<Self> {
        let format = PayloadFormat::from_content_type(content_type)?;
        log::debug!("Reading {:?} payloads for content type {}", format, content_type);
        Ok(Self {
            edm,
            content_type: content_type.to_string(),
            format,
            read_properties: ReadProperties::default(),
        })
    }

    /// Set the read properties.
    pub fn with_properties(mut self, read_properties: ReadProperties) -> Self {
        self.read_properties = read_properties;
        self
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    pub fn read_properties(&self) -> &ReadProperties {
        &self.read_properties
    }

    fn entity_info(&self, entity_set: &str) -> Result<EntityInfo<'a>> {
        Ok(EntityInfo::new(self.edm, self.edm.entity_set(entity_set)?)?)
    }

    fn xml(&self) -> XmlEntityConsumer<'_> {
        XmlEntityConsumer::new(self.edm, &self.read_properties)
    }

    fn json(&self) -> JsonEntityConsumer<'_> {
        JsonEntityConsumer::new(self.edm, &self.read_properties)
    }

    /// Single entry of `entity_set`
    pub fn read_entry<R: Read>(&self, entity_set: &str, input: R) -> Result<Entry> {
        let info = self.entity_info(entity_set)?;
        match self.format {
            PayloadFormat::Xml => self.xml().read_entry(info, BufReader::new(input)),
            PayloadFormat::Json => self.json().read_entry(info, input),
        }
    }

    /// Feed of `entity_set`; deletion markers are dropped
    pub fn read_feed<R: Read>(&self, entity_set: &str, input: R) -> Result<Feed> {
        self.read_delta_feed(entity_set, input).map(DeltaFeed::into_feed)
    }

    /// Feed of `entity_set` together with its deletion markers
    pub fn read_delta_feed<R: Read>(&self, entity_set: &str, input: R) -> Result<DeltaFeed> {
        let info = self.entity_info(entity_set)?;
        match self.format {
            PayloadFormat::Xml => self.xml().read_delta_feed(info, BufReader::new(input)),
            PayloadFormat::Json => self.json().read_delta_feed(info, input),
        }
    }

    /// Document holding exactly one property
    pub fn read_property<R: Read>(&self, property: &Property, input: R) -> Result<PropertyMap> {
        match self.format {
            PayloadFormat::Xml => self.xml().read_property(property, BufReader::new(input)),
            PayloadFormat::Json => self.json().read_property(property, input),
        }
    }

    /// Raw `$value` of a simple property
    ///
    /// The body is not in either payload format; Binary values are returned
    /// verbatim, everything else is parsed from its text form.
    pub fn read_property_value<R: Read>(
        &self,
        property: &Property,
        input: R,
        target: Option<TargetType>,
    ) -> Result<PropertyValue> {
        let kind = match &property.property_type {
            PropertyType::Simple(kind) => *kind,
            PropertyType::Complex(_) => {
                return Err(EntityProviderError::new(MessageKey::IllegalArgument)
                    .with_content(&property.name))
            }
        };
        let bytes = read_binary(input)?;
        if kind == EdmSimpleTypeKind::Binary {
            return Ok(PropertyValue::Simple(SimpleValue::Binary(bytes)));
        }

        let text = String::from_utf8(bytes).map_err(|err| {
            EntityProviderError::new(MessageKey::MalformedInput)
                .with_content("text")
                .with_source(err)
        })?;
        let facets = self
            .read_properties
            .validate_facets()
            .then_some(&property.facets);
        kind.value_of_string(&text, EdmLiteralKind::Default, facets, target)
            .map(PropertyValue::Simple)
            .map_err(|err| invalid_value(&property.name, err))
    }

    /// Collection result of a function import
    pub fn read_collection<R: Read>(&self, function_import: &str, input: R) -> Result<Vec<PropertyValue>> {
        let element_property = self
            .edm
            .function_import(function_import)?
            .element_property()
            .ok_or_else(|| {
                EntityProviderError::new(MessageKey::IllegalArgument).with_content(function_import)
            })?;
        match self.format {
            PayloadFormat::Xml => self.xml().read_collection(&element_property, BufReader::new(input)),
            PayloadFormat::Json => self.json().read_collection(&element_property, input),
        }
    }

    /// Error document returned by the service
    pub fn read_error_document<R: Read>(&self, input: R) -> Result<ErrorContext> {
        match self.format {
            PayloadFormat::Xml => self
                .xml()
                .read_error_document(BufReader::new(input), &self.content_type),
            PayloadFormat::Json => self.json().read_error_document(input, &self.content_type),
        }
    }

    /// `$links` document with one URI
    pub fn read_link<R: Read>(&self, input: R) -> Result<String> {
        match self.format {
            PayloadFormat::Xml => self.xml().read_link(BufReader::new(input)),
            PayloadFormat::Json => self.json().read_link(input),
        }
    }

    /// `$links` document with any number of URIs
    pub fn read_links<R: Read>(&self, input: R) -> Result<Vec<String>> {
        match self.format {
            PayloadFormat::Xml => self.xml().read_links(BufReader::new(input)),
            PayloadFormat::Json => self.json().read_links(input),
        }
    }

    /// Media resource body
    pub fn read_binary<R: Read>(&self, input: R) -> Result<Vec<u8>> {
        read_binary(input)
    }
}

fn read_binary<R: Read>(mut input: R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Insert a property value, rejecting a second occurrence of the same name
pub(crate) fn insert_property(map: &mut PropertyMap, name: &str, value: PropertyValue) -> Result<()> {
    if map.contains_key(name) {
        return Err(EntityProviderError::new(MessageKey::DoubleProperty).with_content(name));
    }
    map.insert(name.to_string(), value);
    Ok(())
}

/// Non-negative inline count of a feed
pub(crate) fn parse_inline_count(text: &str) -> Result<u32> {
    text.trim().parse::<u32>().map_err(|err| {
        EntityProviderError::new(MessageKey::InlineCountInvalid)
            .with_content(text)
            .with_source(err)
    })
}

/// Deletion time of a delta-feed marker
pub(crate) fn parse_deletion_time(literal: &str, literal_kind: EdmLiteralKind) -> Result<DateTime<Utc>> {
    let invalid = |cause: Option<crate::edm::EdmSimpleTypeError>| {
        let err = EntityProviderError::new(MessageKey::InvalidDeletedEntryMetadata).with_content(literal);
        match cause {
            Some(cause) => err.with_source(cause),
            None => err,
        }
    };
    match EdmSimpleTypeKind::DateTimeOffset.value_of_string(
        literal,
        literal_kind,
        None,
        Some(TargetType::DateTimeUtc),
    ) {
        Ok(SimpleValue::DateTime(when)) => Ok(when),
        Ok(_) => Err(invalid(None)),
        Err(err) => Err(invalid(Some(err))),
    }
}
