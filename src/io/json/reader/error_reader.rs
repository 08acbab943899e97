//! `{"error": {...}}` documents

use super::cursor::{JsonCursor, JsonToken};
use crate::error::{EntityProviderError, MessageKey, Result};
use crate::types::{ErrorContext, Locale};

pub(crate) fn read_error_document(cursor: &mut JsonCursor, content_type: &str) -> Result<ErrorContext> {
    let mut context = ErrorContext {
        content_type: content_type.to_string(),
        ..ErrorContext::default()
    };

    cursor.begin_object()?;
    let name = cursor.next_name()?;
    if name != "error" {
        return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("error"));
    }
    cursor.begin_object()?;
    while cursor.has_next() {
        let name = cursor.next_name()?;
        match name.as_str() {
            "code" => context.error_code = Some(cursor.next_string()?),
            "message" => read_message(cursor, &mut context)?,
            "innererror" => {
                context.inner_error = Some(match cursor.peek() {
                    JsonToken::String => cursor.next_string()?,
                    _ => cursor.next_value()?.to_string(),
                })
            }
            _ => cursor.skip_value()?,
        }
    }
    cursor.end_object()?;
    cursor.end_object()?;
    cursor.expect_end_of_document()?;

    if context.error_code.is_none() {
        return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("code"));
    }
    if context.message.is_none() {
        return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("message"));
    }
    Ok(context)
}

/// `{"lang": "en-US", "value": "..."}`
fn read_message(cursor: &mut JsonCursor, context: &mut ErrorContext) -> Result<()> {
    cursor.begin_object()?;
    while cursor.has_next() {
        match cursor.next_name()?.as_str() {
            "lang" => context.locale = Locale::parse(&cursor.next_string()?),
            "value" => context.message = Some(cursor.next_string()?),
            _ => cursor.skip_value()?,
        }
    }
    cursor.end_object()
}
