//! Atom/XML payload consumer

mod cursor;
mod entry_reader;
mod error_reader;
mod feed_reader;
mod link_reader;
mod property_reader;

use cursor::XmlCursor;
use property_reader::XmlPropertyReader;

use std::io::BufRead;

use super::ATOM_NS;
use crate::edm::{Edm, EntityInfo, Property};
use crate::error::{EntityProviderError, MessageKey, Result};
use crate::read_properties::ReadProperties;
use crate::types::{DeltaFeed, Entry, ErrorContext, PropertyValue, PropertyMap};

/// Entry points for XML documents
pub(crate) struct XmlEntityConsumer<'a> {
    edm: &'a Edm,
    read_properties: &'a ReadProperties,
}

impl<'a> XmlEntityConsumer<'a> {
    pub fn new(edm: &'a Edm, read_properties: &'a ReadProperties) -> Self {
        Self {
            edm,
            read_properties,
        }
    }

    pub fn read_entry<R: BufRead>(&self, info: EntityInfo<'_>, input: R) -> Result<Entry> {
        let mut cursor = XmlCursor::new(input);
        let root = cursor.root_element()?;
        if !root.name.is(ATOM_NS, "entry") {
            return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("entry"));
        }
        let entry = entry_reader::read_entry(&mut cursor, &root, info, self.read_properties)?;
        cursor.expect_end_of_document()?;
        Ok(entry)
    }

    pub fn read_delta_feed<R: BufRead>(&self, info: EntityInfo<'_>, input: R) -> Result<DeltaFeed> {
        let mut cursor = XmlCursor::new(input);
        let root = cursor.root_element()?;
        if !root.name.is(ATOM_NS, "feed") {
            return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("feed"));
        }
        let delta = feed_reader::read_feed_content(&mut cursor, info, self.read_properties)?;
        cursor.expect_end_of_document()?;
        Ok(delta)
    }

    pub fn read_property<R: BufRead>(&self, property: &Property, input: R) -> Result<PropertyMap> {
        let mut cursor = XmlCursor::new(input);
        XmlPropertyReader::new(self.edm, self.read_properties).read_property_document(&mut cursor, property)
    }

    pub fn read_collection<R: BufRead>(&self, element_property: &Property, input: R) -> Result<Vec<PropertyValue>> {
        let mut cursor = XmlCursor::new(input);
        XmlPropertyReader::new(self.edm, self.read_properties)
            .read_collection_document(&mut cursor, element_property)
    }

    pub fn read_error_document<R: BufRead>(&self, input: R, content_type: &str) -> Result<ErrorContext> {
        error_reader::read_error_document(&mut XmlCursor::new(input), content_type)
    }

    pub fn read_link<R: BufRead>(&self, input: R) -> Result<String> {
        link_reader::read_link(&mut XmlCursor::new(input))
    }

    pub fn read_links<R: BufRead>(&self, input: R) -> Result<Vec<String>> {
        link_reader::read_links(&mut XmlCursor::new(input))
    }
}
