//! Atom `feed` elements, including delta markers

use std::io::BufRead;

use super::cursor::{XmlCursor, XmlEvent, XmlStartTag};
use super::entry_reader::read_entry;
use crate::edm::{EdmLiteralKind, EntityInfo};
use crate::error::{EntityProviderError, MessageKey, Result};
use crate::io::{parse_deletion_time, parse_inline_count};
use crate::io::xml::{ATOM_NS, METADATA_NS, TOMBSTONE_NS};
use crate::read_properties::ReadProperties;
use crate::types::{DeletedEntryMetadata, DeltaFeed};

/// Reads the children of a feed whose start tag was just consumed, up to and
/// including its end tag
pub(crate) fn read_feed_content<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    info: EntityInfo<'_>,
    read_properties: &ReadProperties,
) -> Result<DeltaFeed> {
    let mut delta = DeltaFeed::default();
    loop {
        let tag = match cursor.next_tag()? {
            XmlEvent::Start(tag) => tag,
            _ => break,
        };
        if tag.name.is(ATOM_NS, "entry") {
            let entry = read_entry(cursor, &tag, info, read_properties)?;
            delta.feed.entries.push(entry);
        } else if tag.name.is(METADATA_NS, "count") {
            let text = cursor.element_text()?;
            if delta.feed.feed_metadata.inline_count.is_some() {
                return Err(EntityProviderError::new(MessageKey::DoubleInlineCount));
            }
            delta.feed.feed_metadata.inline_count = Some(parse_inline_count(&text)?);
        } else if tag.name.is(ATOM_NS, "link") {
            read_feed_link(&tag, &mut delta)?;
            cursor.skip_element()?;
        } else if tag.name.is(TOMBSTONE_NS, "deleted-entry") {
            delta.deleted_entries.push(read_deleted_entry(&tag)?);
            cursor.skip_element()?;
        } else {
            cursor.skip_element()?;
        }
    }
    log::debug!(
        "Read feed with {} entries and {} deleted entries",
        delta.feed.entries.len(),
        delta.deleted_entries.len()
    );
    Ok(delta)
}

fn read_feed_link(tag: &XmlStartTag, delta: &mut DeltaFeed) -> Result<()> {
    let metadata = &mut delta.feed.feed_metadata;
    match tag.attribute(None, "rel") {
        Some("next") => {
            if metadata.next_link.is_some() {
                return Err(EntityProviderError::new(MessageKey::DoubleNextLink));
            }
            metadata.next_link = Some(tag.required_attribute(None, "href")?.to_string());
        }
        Some("delta") => {
            if metadata.delta_link.is_some() {
                return Err(EntityProviderError::new(MessageKey::DoubleDeltaLink));
            }
            metadata.delta_link = Some(tag.required_attribute(None, "href")?.to_string());
        }
        _ => {}
    }
    Ok(())
}

fn read_deleted_entry(tag: &XmlStartTag) -> Result<DeletedEntryMetadata> {
    let uri = tag.required_attribute(None, "ref")?.to_string();
    let when = tag
        .attribute(None, "when")
        .map(|when| parse_deletion_time(when, EdmLiteralKind::Default))
        .transpose()?;
    Ok(DeletedEntryMetadata { uri, when })
}
