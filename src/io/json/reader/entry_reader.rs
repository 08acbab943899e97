//! JSON entry objects

use super::cursor::{invalid_state, JsonCursor, JsonToken};
use super::feed_reader::{read_feed_object, read_results_array};
use super::property_reader::JsonPropertyReader;
use crate::edm::{EntityInfo, Multiplicity, NavigationProperty};
use crate::error::{EntityProviderError, MessageKey, Result};
use crate::io::inline_content::{child_read_properties, InlineContent, InlineDispatcher};
use crate::io::insert_property;
use crate::io::json::{DEFERRED, METADATA, ODATA_CONTEXT};
use crate::read_properties::ReadProperties;
use crate::types::Entry;

/// Reads the entry object at the cursor
pub(crate) fn read_entry(
    cursor: &mut JsonCursor,
    info: EntityInfo<'_>,
    read_properties: &ReadProperties,
) -> Result<Entry> {
    let mut reader = JsonEntryReader {
        info,
        read_properties,
        entry: Entry::default(),
        dispatcher: InlineDispatcher::new(),
        inline_navigations: Vec::new(),
    };
    reader.read(cursor)?;
    reader.synthesize_association_uris();
    let JsonEntryReader {
        entry, dispatcher, ..
    } = reader;
    dispatcher.finish(&entry, read_properties)?;
    Ok(entry)
}

struct JsonEntryReader<'e, 'p> {
    info: EntityInfo<'e>,
    read_properties: &'p ReadProperties,
    entry: Entry,
    dispatcher: InlineDispatcher,
    /// Navigations whose content was inlined rather than deferred
    inline_navigations: Vec<String>,
}

impl<'e, 'p> JsonEntryReader<'e, 'p> {
    fn read(&mut self, cursor: &mut JsonCursor) -> Result<()> {
        if self.info.has_stream() {
            self.entry.media_metadata_mut();
        }

        cursor.begin_object()?;
        while cursor.has_next() {
            let name = cursor.next_name()?;
            if name == METADATA {
                self.read_metadata(cursor)?;
            } else if name == ODATA_CONTEXT {
                cursor.skip_value()?;
            } else if let Some(property) = self.info.property(&name) {
                let value = JsonPropertyReader::new(self.info.edm(), self.read_properties)
                    .read_value(cursor, property, "")?;
                insert_property(&mut self.entry.properties, &property.name, value)?;
            } else if let Some(navigation) = self.info.navigation_property(&name) {
                self.read_navigation(cursor, navigation)?;
            } else {
                return Err(EntityProviderError::new(MessageKey::InvalidProperty).with_content(name));
            }
        }
        cursor.end_object()
    }

    fn read_metadata(&mut self, cursor: &mut JsonCursor) -> Result<()> {
        cursor.begin_object()?;
        while cursor.has_next() {
            let key = cursor.next_name()?;
            match key.as_str() {
                "id" => self.entry.metadata.id = Some(cursor.next_string()?),
                "uri" => self.entry.metadata.uri = Some(cursor.next_string()?),
                "etag" => self.entry.metadata.etag = Some(cursor.next_string()?),
                "type" => {
                    let declared = cursor.next_string()?;
                    let expected = self.info.entity_type().name.to_string();
                    if declared != expected {
                        return Err(EntityProviderError::new(MessageKey::InvalidEntityType)
                            .with_content(expected)
                            .with_content(declared));
                    }
                }
                "edit_media" => self.entry.media_metadata_mut().edit_link = Some(cursor.next_string()?),
                "media_src" => self.entry.media_metadata_mut().source_link = Some(cursor.next_string()?),
                "media_etag" => self.entry.media_metadata_mut().etag = Some(cursor.next_string()?),
                "content_type" => {
                    self.entry.media_metadata_mut().content_type = Some(cursor.next_string()?)
                }
                _ => {
                    return Err(EntityProviderError::new(MessageKey::InvalidContent)
                        .with_content(key)
                        .with_content(METADATA))
                }
            }
        }
        cursor.end_object()
    }

    fn read_navigation(&mut self, cursor: &mut JsonCursor, navigation: &NavigationProperty) -> Result<()> {
        if cursor.peek_first_name() == Some(DEFERRED) {
            return self.read_deferred(cursor, navigation);
        }

        let (target, multiplicity) = self.info.navigate(navigation)?;
        let is_feed = multiplicity == Multiplicity::Many;
        let invalid_inline = |expected: &str| {
            EntityProviderError::new(MessageKey::InvalidInlineContent)
                .with_content(&navigation.name)
                .with_content(expected)
        };

        let child_properties = child_read_properties(self.read_properties, navigation)?;
        let content = match cursor.peek() {
            JsonToken::Null if is_feed => return Err(invalid_inline("feed")),
            JsonToken::Null => {
                cursor.next_null()?;
                InlineContent::Entry(None)
            }
            JsonToken::BeginObject if is_feed => {
                InlineContent::Feed(read_feed_object(cursor, target, &child_properties)?.into_feed())
            }
            JsonToken::BeginObject => {
                InlineContent::Entry(Some(read_entry(cursor, target, &child_properties)?))
            }
            JsonToken::BeginArray if is_feed => {
                let mut delta = Default::default();
                read_results_array(cursor, target, &child_properties, &mut delta)?;
                InlineContent::Feed(delta.into_feed())
            }
            JsonToken::BeginArray => return Err(invalid_inline("entry")),
            other => return Err(invalid_state(JsonToken::BeginObject, other)),
        };

        log::debug!("Read inline content for {}", navigation.name);
        self.inline_navigations.push(navigation.name.clone());
        self.dispatcher.deliver(
            &mut self.entry,
            self.read_properties,
            child_properties,
            navigation,
            content,
        )
    }

    /// `{"__deferred": {"uri": ...}}`
    fn read_deferred(&mut self, cursor: &mut JsonCursor, navigation: &NavigationProperty) -> Result<()> {
        cursor.begin_object()?;
        while cursor.has_next() {
            let name = cursor.next_name()?;
            if name != DEFERRED {
                cursor.skip_value()?;
                continue;
            }
            cursor.begin_object()?;
            while cursor.has_next() {
                if cursor.next_name()? == "uri" {
                    let uri = cursor.next_string()?;
                    self.entry.metadata.add_association_uri(&navigation.name, uri);
                } else {
                    cursor.skip_value()?;
                }
            }
            cursor.end_object()?;
        }
        cursor.end_object()
    }

    /// Inline content carries no link of its own; outside merge mode the
    /// association URI is derived from the entry URI
    fn synthesize_association_uris(&mut self) {
        if self.read_properties.is_merge() {
            return;
        }
        let base = match self.entry.metadata.uri.clone() {
            Some(uri) => uri,
            None => return,
        };
        for navigation in &self.inline_navigations {
            if self.entry.metadata.association_uris(navigation).is_empty() {
                self.entry
                    .metadata
                    .add_association_uri(navigation, format!("{}/{}", base, navigation));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edm::{navigation, EdmSimpleTypeKind, Edm, FullQualifiedName, Property, SimpleValue};
    use crate::types::PropertyValue;

    fn edm() -> Edm {
        let room = FullQualifiedName::new("T", "Room");
        let employee = FullQualifiedName::new("T", "Employee");
        let association = FullQualifiedName::new("T", "RoomEmployees");
        Edm::builder()
            .entity_type(
                room.clone(),
                None,
                &["Id"],
                vec![
                    Property::simple("Id", EdmSimpleTypeKind::String),
                    Property::simple("Seats", EdmSimpleTypeKind::Int16),
                ],
                vec![navigation("nr_Employees", association.clone(), "r_Room", "r_Employees")],
            )
            .entity_type(
                employee.clone(),
                None,
                &["EmployeeId"],
                vec![Property::simple("EmployeeId", EdmSimpleTypeKind::String)],
                vec![navigation("ne_Room", association.clone(), "r_Employees", "r_Room")],
            )
            .association(
                association.clone(),
                ("r_Room", room.clone(), Multiplicity::One),
                ("r_Employees", employee.clone(), Multiplicity::Many),
            )
            .entity_set("Rooms", room)
            .entity_set("Employees", employee)
            .association_set("RoomEmployees", association, ("r_Room", "Rooms"), ("r_Employees", "Employees"))
            .build()
    }

    fn read(json: &str, props: &ReadProperties) -> Result<Entry> {
        let edm = edm();
        let info = EntityInfo::new(&edm, edm.entity_set("Rooms")?)?;
        let mut cursor = JsonCursor::from_reader(json.as_bytes())?;
        read_entry(&mut cursor, info, props)
    }

    #[test]
    fn test_deferred_navigation() {
        let json = r#"{"__metadata":{"uri":"http://host/Rooms('1')","type":"T.Room","etag":"W/\"1\""},
            "Id":"1","Seats":66,
            "nr_Employees":{"__deferred":{"uri":"http://host/Rooms('1')/nr_Employees"}}}"#;
        let entry = read(json, &ReadProperties::default()).unwrap();
        assert_eq!(entry.metadata.etag.as_deref(), Some("W/\"1\""));
        assert_eq!(entry.property("Seats"), Some(&PropertyValue::Simple(SimpleValue::Int16(66))));
        assert_eq!(entry.metadata.association_uris("nr_Employees"), ["http://host/Rooms('1')/nr_Employees"]);
        assert!(entry.property("nr_Employees").is_none());
        assert!(!entry.contains_inline_entry());
    }

    #[test]
    fn test_inline_feed_synthesizes_association_uri() {
        let json = r#"{"__metadata":{"uri":"http://host/Rooms('1')"},"Id":"1",
            "nr_Employees":{"results":[{"EmployeeId":"1"},{"EmployeeId":"2"}]}}"#;
        let entry = read(json, &ReadProperties::default()).unwrap();
        let feed = entry.property("nr_Employees").and_then(PropertyValue::as_feed).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(entry.metadata.association_uris("nr_Employees"), ["http://host/Rooms('1')/nr_Employees"]);

        let merge = ReadProperties::builder().merge_semantic(true).build();
        let entry = read(json, &merge).unwrap();
        assert!(entry.metadata.association_uris("nr_Employees").is_empty());
    }

    #[test]
    fn test_null_for_many_navigation() {
        let err = read(r#"{"Id":"1","nr_Employees":null}"#, &ReadProperties::default()).unwrap_err();
        assert_eq!(err.key(), MessageKey::InvalidInlineContent);
    }

    #[test]
    fn test_wrong_entity_type() {
        let err = read(r#"{"__metadata":{"type":"T.Building"},"Id":"1"}"#, &ReadProperties::default())
            .unwrap_err();
        assert_eq!(err.key(), MessageKey::InvalidEntityType);
    }

    #[test]
    fn test_unknown_metadata_key() {
        let err = read(r#"{"__metadata":{"foo":"bar"},"Id":"1"}"#, &ReadProperties::default()).unwrap_err();
        assert_eq!(err.key(), MessageKey::InvalidContent);
    }

    #[test]
    fn test_duplicate_property() {
        let err = read(r#"{"Id":"1","Id":"2"}"#, &ReadProperties::default()).unwrap_err();
        assert_eq!(err.key(), MessageKey::DoubleProperty);
    }
}
