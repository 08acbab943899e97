//! JSON payload consumer

mod cursor;
mod entry_reader;
mod error_reader;
mod feed_reader;
mod link_reader;
mod property_reader;

use cursor::JsonCursor;
use property_reader::JsonPropertyReader;

use std::io::Read;

use super::ENVELOPE;
use crate::edm::{Edm, EntityInfo, Property};
use crate::error::Result;
use crate::read_properties::ReadProperties;
use crate::types::{DeltaFeed, Entry, ErrorContext, PropertyMap, PropertyValue};

/// Step into the `{"d": ...}` envelope when the document has one
fn enter_envelope(cursor: &mut JsonCursor) -> Result<bool> {
    if cursor.peek_first_name() != Some(ENVELOPE) {
        return Ok(false);
    }
    cursor.begin_object()?;
    cursor.next_name()?;
    Ok(true)
}

fn leave_envelope(cursor: &mut JsonCursor, wrapped: bool) -> Result<()> {
    if wrapped {
        cursor.end_object()?;
    }
    cursor.expect_end_of_document()
}

/// Entry points for JSON documents
pub(crate) struct JsonEntityConsumer<'a> {
    edm: &'a Edm,
    read_properties: &'a ReadProperties,
}

impl<'a> JsonEntityConsumer<'a> {
    pub fn new(edm: &'a Edm, read_properties: &'a ReadProperties) -> Self {
        Self {
            edm,
            read_properties,
        }
    }

    pub fn read_entry<R: Read>(&self, info: EntityInfo<'_>, input: R) -> Result<Entry> {
        let mut cursor = JsonCursor::from_reader(input)?;
        let wrapped = enter_envelope(&mut cursor)?;
        let entry = entry_reader::read_entry(&mut cursor, info, self.read_properties)?;
        leave_envelope(&mut cursor, wrapped)?;
        Ok(entry)
    }

    pub fn read_delta_feed<R: Read>(&self, info: EntityInfo<'_>, input: R) -> Result<DeltaFeed> {
        let mut cursor = JsonCursor::from_reader(input)?;
        let wrapped = enter_envelope(&mut cursor)?;
        let delta = feed_reader::read_feed_value(&mut cursor, info, self.read_properties)?;
        leave_envelope(&mut cursor, wrapped)?;
        Ok(delta)
    }

    pub fn read_property<R: Read>(&self, property: &Property, input: R) -> Result<PropertyMap> {
        let mut cursor = JsonCursor::from_reader(input)?;
        JsonPropertyReader::new(self.edm, self.read_properties).read_property_document(&mut cursor, property)
    }

    pub fn read_collection<R: Read>(&self, element_property: &Property, input: R) -> Result<Vec<PropertyValue>> {
        let mut cursor = JsonCursor::from_reader(input)?;
        JsonPropertyReader::new(self.edm, self.read_properties)
            .read_collection_document(&mut cursor, element_property)
    }

    pub fn read_error_document<R: Read>(&self, input: R, content_type: &str) -> Result<ErrorContext> {
        error_reader::read_error_document(&mut JsonCursor::from_reader(input)?, content_type)
    }

    pub fn read_link<R: Read>(&self, input: R) -> Result<String> {
        link_reader::read_link(&mut JsonCursor::from_reader(input)?)
    }

    pub fn read_links<R: Read>(&self, input: R) -> Result<Vec<String>> {
        link_reader::read_links(&mut JsonCursor::from_reader(input)?)
    }
}
