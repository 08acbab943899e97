//! `$links` documents

use super::cursor::{JsonCursor, JsonToken};
use crate::error::{EntityProviderError, MessageKey, Result};
use crate::io::json::{COUNT, RESULTS};

/// `{"d": {"uri": ...}}`
pub(crate) fn read_link(cursor: &mut JsonCursor) -> Result<String> {
    let wrapped = super::enter_envelope(cursor)?;
    let uri = read_uri_object(cursor)?;
    super::leave_envelope(cursor, wrapped)?;
    Ok(uri)
}

/// `{"d": [{"uri": ...}, ...]}` or `{"d": {"results": [...], "__count": ..}}`
pub(crate) fn read_links(cursor: &mut JsonCursor) -> Result<Vec<String>> {
    let wrapped = super::enter_envelope(cursor)?;
    let links = if cursor.peek() == JsonToken::BeginObject {
        let mut links = None;
        cursor.begin_object()?;
        while cursor.has_next() {
            let name = cursor.next_name()?;
            match name.as_str() {
                RESULTS if links.is_some() => {
                    return Err(EntityProviderError::new(MessageKey::DoubleResultsArray))
                }
                RESULTS => links = Some(read_uri_array(cursor)?),
                COUNT => cursor.skip_value()?,
                _ => {
                    return Err(EntityProviderError::new(MessageKey::InvalidContent)
                        .with_content(name)
                        .with_content("links"))
                }
            }
        }
        cursor.end_object()?;
        links.ok_or_else(|| EntityProviderError::new(MessageKey::MissingResultsArray))?
    } else {
        read_uri_array(cursor)?
    };
    super::leave_envelope(cursor, wrapped)?;
    Ok(links)
}

fn read_uri_array(cursor: &mut JsonCursor) -> Result<Vec<String>> {
    let mut links = Vec::new();
    cursor.begin_array()?;
    while cursor.has_next() {
        links.push(read_uri_object(cursor)?);
    }
    cursor.end_array()?;
    Ok(links)
}

fn read_uri_object(cursor: &mut JsonCursor) -> Result<String> {
    let mut uri = None;
    cursor.begin_object()?;
    while cursor.has_next() {
        let name = cursor.next_name()?;
        if name == "uri" {
            uri = Some(cursor.next_string()?);
        } else {
            return Err(EntityProviderError::new(MessageKey::InvalidContent)
                .with_content(name)
                .with_content("uri"));
        }
    }
    cursor.end_object()?;
    uri.ok_or_else(|| EntityProviderError::new(MessageKey::MissingAttribute).with_content("uri"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(json: &str) -> JsonCursor {
        JsonCursor::from_reader(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_single_link() {
        let uri = read_link(&mut cursor(r#"{"d":{"uri":"http://host/Rooms('1')"}}"#)).unwrap();
        assert_eq!(uri, "http://host/Rooms('1')");
    }

    #[test]
    fn test_links_shapes() {
        let plain = r#"{"d":[{"uri":"http://host/Employees('1')"},{"uri":"http://host/Employees('2')"}]}"#;
        let with_count =
            r#"{"d":{"__count":"2","results":[{"uri":"http://host/Employees('1')"},{"uri":"http://host/Employees('2')"}]}}"#;
        for json in [plain, with_count] {
            let links = read_links(&mut cursor(json)).unwrap();
            assert_eq!(links.len(), 2);
            assert_eq!(links[0], "http://host/Employees('1')");
        }
    }

    #[test]
    fn test_link_without_uri() {
        let err = read_link(&mut cursor(r#"{"d":{}}"#)).unwrap_err();
        assert_eq!(err.key(), MessageKey::MissingAttribute);
    }
}
