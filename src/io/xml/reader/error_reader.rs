//! `m:error` documents

use std::io::BufRead;

use super::cursor::{XmlCursor, XmlEvent};
use crate::error::{EntityProviderError, MessageKey, Result};
use crate::io::xml::METADATA_NS;
use crate::types::{ErrorContext, Locale};

pub(crate) fn read_error_document<R: BufRead>(cursor: &mut XmlCursor<R>, content_type: &str) -> Result<ErrorContext> {
    let root = cursor.root_element()?;
    if !root.name.is(METADATA_NS, "error") {
        return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("error"));
    }

    let mut context = ErrorContext {
        content_type: content_type.to_string(),
        ..ErrorContext::default()
    };
    loop {
        let tag = match cursor.next_tag()? {
            XmlEvent::Start(tag) => tag,
            _ => break,
        };
        if !tag.name.in_namespace(METADATA_NS) {
            cursor.skip_element()?;
            continue;
        }
        match tag.name.local.as_str() {
            "code" => context.error_code = Some(cursor.element_text()?),
            "message" => {
                context.locale = tag.attribute_local("lang").and_then(Locale::parse);
                context.message = Some(cursor.element_text()?);
            }
            "innererror" => context.inner_error = Some(collect_text(cursor)?),
            _ => cursor.skip_element()?,
        }
    }
    cursor.expect_end_of_document()?;

    if context.error_code.is_none() {
        return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("code"));
    }
    if context.message.is_none() {
        return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("message"));
    }
    Ok(context)
}

/// All text below the current element, nested elements flattened
fn collect_text<R: BufRead>(cursor: &mut XmlCursor<R>) -> Result<String> {
    let mut text = String::new();
    let mut depth = 1usize;
    while depth > 0 {
        match cursor.next_event()? {
            XmlEvent::Start(_) => depth += 1,
            XmlEvent::End(_) => depth -= 1,
            XmlEvent::Text(chunk) => text.push_str(&chunk),
            XmlEvent::Eof => return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("innererror")),
        }
    }
    Ok(text)
}
