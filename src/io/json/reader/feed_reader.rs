//! JSON feeds, including delta deletion markers

use super::cursor::{invalid_state, JsonCursor, JsonToken};
use super::entry_reader::read_entry;
use crate::edm::{EdmLiteralKind, EntityInfo};
use crate::error::{EntityProviderError, MessageKey, Result};
use crate::io::json::{COUNT, DELTA, NEXT, ODATA_CONTEXT, RESULTS};
use crate::io::{parse_deletion_time, parse_inline_count};
use crate::read_properties::ReadProperties;
use crate::types::{DeletedEntryMetadata, DeltaFeed};

/// Feed at the cursor: either a feed object or a bare entry array
pub(crate) fn read_feed_value(
    cursor: &mut JsonCursor,
    info: EntityInfo<'_>,
    read_properties: &ReadProperties,
) -> Result<DeltaFeed> {
    match cursor.peek() {
        JsonToken::BeginArray => {
            let mut delta = DeltaFeed::default();
            read_results_array(cursor, info, read_properties, &mut delta)?;
            Ok(delta)
        }
        JsonToken::BeginObject => read_feed_object(cursor, info, read_properties),
        other => Err(invalid_state(JsonToken::BeginObject, other)),
    }
}

/// `{"results": [...], "__count": .., "__next": .., "__delta": ..}`
pub(crate) fn read_feed_object(
    cursor: &mut JsonCursor,
    info: EntityInfo<'_>,
    read_properties: &ReadProperties,
) -> Result<DeltaFeed> {
    let mut delta = DeltaFeed::default();
    let mut results_found = false;

    cursor.begin_object()?;
    while cursor.has_next() {
        let name = cursor.next_name()?;
        let metadata = &mut delta.feed.feed_metadata;
        match name.as_str() {
            RESULTS => {
                if results_found {
                    return Err(EntityProviderError::new(MessageKey::DoubleResultsArray));
                }
                results_found = true;
                read_results_array(cursor, info, read_properties, &mut delta)?;
            }
            COUNT => {
                if metadata.inline_count.is_some() {
                    return Err(EntityProviderError::new(MessageKey::DoubleInlineCount));
                }
                let (_, text) = match cursor.peek() {
                    JsonToken::String | JsonToken::Number => cursor.next_literal()?,
                    other => return Err(invalid_state(JsonToken::String, other)),
                };
                metadata.inline_count = Some(parse_inline_count(&text)?);
            }
            NEXT => {
                if metadata.next_link.is_some() {
                    return Err(EntityProviderError::new(MessageKey::DoubleNextLink));
                }
                metadata.next_link = Some(cursor.next_string()?);
            }
            DELTA => {
                if metadata.delta_link.is_some() {
                    return Err(EntityProviderError::new(MessageKey::DoubleDeltaLink));
                }
                metadata.delta_link = Some(cursor.next_string()?);
            }
            _ => {
                return Err(EntityProviderError::new(MessageKey::InvalidContent)
                    .with_content(name)
                    .with_content("feed"))
            }
        }
    }
    cursor.end_object()?;

    if !results_found {
        return Err(EntityProviderError::new(MessageKey::MissingResultsArray));
    }
    Ok(delta)
}

/// Array of entries and deletion markers, appended to `delta`
pub(crate) fn read_results_array(
    cursor: &mut JsonCursor,
    info: EntityInfo<'_>,
    read_properties: &ReadProperties,
    delta: &mut DeltaFeed,
) -> Result<()> {
    cursor.begin_array()?;
    while cursor.has_next() {
        if cursor.peek_first_name() == Some(ODATA_CONTEXT) {
            delta.deleted_entries.push(read_deleted_entry(cursor, info)?);
        } else {
            delta.feed.entries.push(read_entry(cursor, info, read_properties)?);
        }
    }
    cursor.end_array()?;
    log::debug!(
        "Read {} entries and {} deleted entries",
        delta.feed.entries.len(),
        delta.deleted_entries.len()
    );
    Ok(())
}

/// `{"@odata.context": "$metadata#Set/$deletedEntity", "id": .., "when": ..}`
fn read_deleted_entry(cursor: &mut JsonCursor, info: EntityInfo<'_>) -> Result<DeletedEntryMetadata> {
    let expected_context = format!("$metadata#{}/$deletedEntity", info.entity_set().name);
    let mut uri = None;
    let mut when = None;

    cursor.begin_object()?;
    while cursor.has_next() {
        let name = cursor.next_name()?;
        match name.as_str() {
            ODATA_CONTEXT => {
                let context = cursor.next_string()?;
                if !context.ends_with(&expected_context) {
                    return Err(EntityProviderError::new(MessageKey::InvalidContent)
                        .with_content(context)
                        .with_content(ODATA_CONTEXT));
                }
            }
            "id" => uri = Some(cursor.next_string()?),
            "when" => {
                let literal = cursor.next_string()?;
                when = Some(parse_deletion_time(&literal, EdmLiteralKind::Json)?);
            }
            _ => {
                return Err(EntityProviderError::new(MessageKey::InvalidContent)
                    .with_content(name)
                    .with_content("deletedEntity"))
            }
        }
    }
    cursor.end_object()?;

    let uri = uri.ok_or_else(|| {
        EntityProviderError::new(MessageKey::MissingAttribute)
            .with_content("id")
            .with_content("deletedEntity")
    })?;
    Ok(DeletedEntryMetadata { uri, when })
}
