//! Atom `entry` elements

use std::io::BufRead;

use super::cursor::{invalid_state, XmlCursor, XmlEvent, XmlStartTag};
use super::feed_reader::read_feed_content;
use super::property_reader::XmlPropertyReader;
use crate::edm::{
    EdmLiteralKind, EntityInfo, FeedMappingTarget, Multiplicity, NavigationProperty, Property,
    SyndicationTarget,
};
use crate::error::{invalid_value, EntityProviderError, MessageKey, Result};
use crate::io::inline_content::{child_read_properties, InlineContent, InlineDispatcher};
use crate::io::insert_property;
use crate::io::xml::{ATOM_NS, METADATA_NS, RELATED_LINK_REL_PREFIX};
use crate::read_properties::ReadProperties;
use crate::types::{Entry, PropertyValue};

/// Reads one entry whose start tag was just consumed, up to and including
/// its end tag
pub(crate) fn read_entry<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    start: &XmlStartTag,
    info: EntityInfo<'_>,
    read_properties: &ReadProperties,
) -> Result<Entry> {
    let mut reader = XmlEntryReader {
        info,
        read_properties,
        entry: Entry::default(),
        dispatcher: InlineDispatcher::new(),
    };
    reader.read(cursor, start)?;
    let XmlEntryReader {
        entry, dispatcher, ..
    } = reader;
    dispatcher.finish(&entry, read_properties)?;
    Ok(entry)
}

struct XmlEntryReader<'e, 'p> {
    info: EntityInfo<'e>,
    read_properties: &'p ReadProperties,
    entry: Entry,
    dispatcher: InlineDispatcher,
}

impl<'e, 'p> XmlEntryReader<'e, 'p> {
    fn read<R: BufRead>(&mut self, cursor: &mut XmlCursor<R>, start: &XmlStartTag) -> Result<()> {
        if self.info.has_stream() {
            self.entry.media_metadata_mut();
        }
        if let Some(etag) = start.attribute(Some(METADATA_NS), "etag") {
            self.entry.metadata.etag = Some(etag.to_string());
        }

        loop {
            let tag = match cursor.next_tag()? {
                XmlEvent::Start(tag) => tag,
                _ => return Ok(()),
            };
            if tag.name.in_namespace(ATOM_NS) {
                match tag.name.local.as_str() {
                    "id" => self.entry.metadata.id = Some(cursor.element_text()?),
                    "link" => self.read_link(cursor, &tag)?,
                    "content" => self.read_content(cursor, &tag)?,
                    "category" => {
                        self.check_category(&tag)?;
                        cursor.skip_element()?;
                    }
                    "author" => self.read_person(cursor, PERSON_AUTHOR)?,
                    "contributor" => self.read_person(cursor, PERSON_CONTRIBUTOR)?,
                    local => match syndication_target(local) {
                        Some(target) => {
                            self.read_mapped(cursor, &FeedMappingTarget::Syndication(target))?
                        }
                        None => cursor.skip_element()?,
                    },
                }
            } else if tag.name.is(METADATA_NS, "properties") {
                if !self.info.has_stream() {
                    return Err(EntityProviderError::new(MessageKey::InvalidParentTag)
                        .with_content("content")
                        .with_content("properties"));
                }
                XmlPropertyReader::new(self.info.edm(), self.read_properties)
                    .read_properties(cursor, &self.info, &mut self.entry.properties)?;
            } else if let Some(namespace) = tag.name.namespace.clone() {
                self.read_custom_mapped(cursor, &namespace, &tag.name.local)?;
            } else {
                cursor.skip_element()?;
            }
        }
    }

    fn check_category(&self, tag: &XmlStartTag) -> Result<()> {
        let expected = self.info.entity_type().name.to_string();
        match tag.attribute(None, "term") {
            Some(term) if term != expected => Err(EntityProviderError::new(MessageKey::InvalidEntityType)
                .with_content(expected)
                .with_content(term)),
            _ => Ok(()),
        }
    }

    fn read_content<R: BufRead>(&mut self, cursor: &mut XmlCursor<R>, tag: &XmlStartTag) -> Result<()> {
        if let Some(src) = tag.attribute(None, "src") {
            let media = self.entry.media_metadata_mut();
            media.source_link = Some(src.to_string());
            media.content_type = tag.attribute(None, "type").map(str::to_string);
            return cursor.skip_element();
        }

        loop {
            match cursor.next_tag()? {
                XmlEvent::Start(child) if child.name.is(METADATA_NS, "properties") => {
                    if self.info.has_stream() {
                        return Err(EntityProviderError::new(MessageKey::InvalidParentTag)
                            .with_content("entry")
                            .with_content("properties"));
                    }
                    XmlPropertyReader::new(self.info.edm(), self.read_properties)
                        .read_properties(cursor, &self.info, &mut self.entry.properties)?;
                }
                XmlEvent::Start(_) => cursor.skip_element()?,
                _ => return Ok(()),
            }
        }
    }

    fn read_link<R: BufRead>(&mut self, cursor: &mut XmlCursor<R>, tag: &XmlStartTag) -> Result<()> {
        let rel = tag.required_attribute(None, "rel")?;
        let href = tag.required_attribute(None, "href")?;

        if let Some(name) = rel.strip_prefix(RELATED_LINK_REL_PREFIX) {
            let navigation = self.info.navigation_property(name).ok_or_else(|| {
                EntityProviderError::new(MessageKey::InvalidProperty).with_content(name)
            })?;
            self.entry.metadata.add_association_uri(name, href);
            return self.read_navigation_link(cursor, tag, navigation);
        }

        match rel {
            "edit" => self.entry.metadata.uri = Some(href.to_string()),
            "edit-media" => {
                let etag = tag.attribute(Some(METADATA_NS), "etag").map(str::to_string);
                let media = self.entry.media_metadata_mut();
                media.edit_link = Some(href.to_string());
                media.etag = etag;
            }
            _ => {}
        }
        cursor.skip_element()
    }

    fn read_navigation_link<R: BufRead>(
        &mut self,
        cursor: &mut XmlCursor<R>,
        link: &XmlStartTag,
        navigation: &NavigationProperty,
    ) -> Result<()> {
        loop {
            match cursor.next_tag()? {
                XmlEvent::Start(tag) if tag.name.is(METADATA_NS, "inline") => {
                    self.read_inline(cursor, link, navigation)?;
                }
                XmlEvent::Start(_) => cursor.skip_element()?,
                _ => return Ok(()),
            }
        }
    }

    /// Content of `m:inline`, up to and including its end tag
    fn read_inline<R: BufRead>(
        &mut self,
        cursor: &mut XmlCursor<R>,
        link: &XmlStartTag,
        navigation: &NavigationProperty,
    ) -> Result<()> {
        let (target, multiplicity) = self.info.navigate(navigation)?;
        let is_feed = multiplicity == Multiplicity::Many;
        let expected = if is_feed { "feed" } else { "entry" };
        let invalid_inline = || {
            EntityProviderError::new(MessageKey::InvalidInlineContent)
                .with_content(&navigation.name)
                .with_content(expected)
        };

        if let Some(link_type) = link.attribute(None, "type") {
            if !link_type.replace(' ', "").contains(&format!("type={}", expected)) {
                return Err(invalid_inline());
            }
        }

        let child_properties = child_read_properties(self.read_properties, navigation)?;
        let mut content = None;
        loop {
            match cursor.next_event()? {
                XmlEvent::Text(text) if text.trim().is_empty() => continue,
                XmlEvent::Start(tag) if content.is_none() && tag.name.is(ATOM_NS, expected) => {
                    content = Some(if is_feed {
                        let delta = read_feed_content(cursor, target, &child_properties)?;
                        InlineContent::Feed(delta.into_feed())
                    } else {
                        InlineContent::Entry(Some(read_entry(cursor, &tag, target, &child_properties)?))
                    });
                }
                XmlEvent::End(_) => break,
                _ => return Err(invalid_inline()),
            }
        }

        let content = content.unwrap_or(if is_feed {
            InlineContent::Feed(Default::default())
        } else {
            InlineContent::Entry(None)
        });
        log::debug!("Read inline {} for {}", expected, navigation.name);
        self.dispatcher.deliver(
            &mut self.entry,
            self.read_properties,
            child_properties,
            navigation,
            content,
        )
    }

    /// Property mapped to `target` that is read from the alternate location
    fn mapped_property(&self, target: &FeedMappingTarget) -> Option<&'e Property> {
        if self.read_properties.is_merge() {
            return None;
        }
        self.info
            .mapped_property(target)
            .filter(|p| p.mapping.as_ref().is_some_and(|m| !m.keep_in_content))
    }

    fn read_mapped<R: BufRead>(&mut self, cursor: &mut XmlCursor<R>, target: &FeedMappingTarget) -> Result<()> {
        match self.mapped_property(target) {
            Some(property) => self.read_mapped_value(cursor, property),
            None => cursor.skip_element(),
        }
    }

    fn read_custom_mapped<R: BufRead>(&mut self, cursor: &mut XmlCursor<R>, namespace: &str, local: &str) -> Result<()> {
        let property = match self.info.custom_mapped_property(namespace, local) {
            Some(property) if !self.read_properties.is_merge() => property,
            _ => return cursor.skip_element(),
        };
        if property.mapping.as_ref().is_some_and(|m| m.keep_in_content) {
            return cursor.skip_element();
        }
        self.read_mapped_value(cursor, property)
    }

    fn read_mapped_value<R: BufRead>(&mut self, cursor: &mut XmlCursor<R>, property: &Property) -> Result<()> {
        let text = cursor.element_text()?;
        let kind = property.simple_kind().ok_or_else(|| {
            EntityProviderError::new(MessageKey::InvalidSimpleType).with_content(&property.name)
        })?;
        let facets = self
            .read_properties
            .validate_facets()
            .then_some(&property.facets);
        let target = self.read_properties.type_mappings().get(&property.name);
        let value = kind
            .value_of_string(&text, EdmLiteralKind::Default, facets, target)
            .map_err(|err| invalid_value(&property.name, err))?;
        insert_property(&mut self.entry.properties, &property.name, PropertyValue::Simple(value))
    }

    fn read_person<R: BufRead>(&mut self, cursor: &mut XmlCursor<R>, targets: [SyndicationTarget; 3]) -> Result<()> {
        loop {
            match cursor.next_tag()? {
                XmlEvent::Start(tag) if tag.name.in_namespace(ATOM_NS) => {
                    let target = match tag.name.local.as_str() {
                        "name" => targets[0],
                        "email" => targets[1],
                        "uri" => targets[2],
                        _ => {
                            cursor.skip_element()?;
                            continue;
                        }
                    };
                    self.read_mapped(cursor, &FeedMappingTarget::Syndication(target))?;
                }
                XmlEvent::Start(_) => cursor.skip_element()?,
                XmlEvent::End(_) => return Ok(()),
                other => return Err(invalid_state("tag", &other)),
            }
        }
    }
}

const PERSON_AUTHOR: [SyndicationTarget; 3] = [
    SyndicationTarget::AuthorName,
    SyndicationTarget::AuthorEmail,
    SyndicationTarget::AuthorUri,
];

const PERSON_CONTRIBUTOR: [SyndicationTarget; 3] = [
    SyndicationTarget::ContributorName,
    SyndicationTarget::ContributorEmail,
    SyndicationTarget::ContributorUri,
];

fn syndication_target(local: &str) -> Option<SyndicationTarget> {
    match local {
        "title" => Some(SyndicationTarget::Title),
        "summary" => Some(SyndicationTarget::Summary),
        "rights" => Some(SyndicationTarget::Rights),
        "updated" => Some(SyndicationTarget::Updated),
        "published" => Some(SyndicationTarget::Published),
        _ => None,
    }
}
