//! `$links` documents

use std::io::BufRead;

use super::cursor::{XmlCursor, XmlEvent};
use crate::error::{EntityProviderError, MessageKey, Result};
use crate::io::xml::{DATA_NS, METADATA_NS};

/// `<uri>` document with a single link
pub(crate) fn read_link<R: BufRead>(cursor: &mut XmlCursor<R>) -> Result<String> {
    let root = cursor.root_element()?;
    if !root.name.is(DATA_NS, "uri") {
        return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("uri"));
    }
    let uri = cursor.element_text()?;
    cursor.expect_end_of_document()?;
    Ok(uri.trim().to_string())
}

/// `<links>` document with any number of `<uri>` children
pub(crate) fn read_links<R: BufRead>(cursor: &mut XmlCursor<R>) -> Result<Vec<String>> {
    let root = cursor.root_element()?;
    if !root.name.is(DATA_NS, "links") {
        return Err(EntityProviderError::new(MessageKey::MissingTag).with_content("links"));
    }
    let mut links = Vec::new();
    loop {
        match cursor.next_tag()? {
            XmlEvent::Start(tag) if tag.name.is(DATA_NS, "uri") => {
                links.push(cursor.element_text()?.trim().to_string());
            }
            XmlEvent::Start(tag) if tag.name.is(METADATA_NS, "count") => cursor.skip_element()?,
            XmlEvent::Start(tag) => {
                return Err(EntityProviderError::new(MessageKey::InvalidContent)
                    .with_content(&tag.name.local)
                    .with_content("links"))
            }
            _ => break,
        }
    }
    cursor.expect_end_of_document()?;
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_links() {
        let xml = r#"<links xmlns="http://schemas.microsoft.com/ado/2007/08/dataservices">
            <uri>http://host/service/Employees('1')</uri>
            <uri>http://host/service/Employees('2')</uri>
        </links>"#;
        let mut cursor = XmlCursor::new(xml.as_bytes());
        let links = read_links(&mut cursor).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1], "http://host/service/Employees('2')");
    }

    #[test]
    fn test_read_single_link() {
        let xml = r#"<uri xmlns="http://schemas.microsoft.com/ado/2007/08/dataservices">http://host/service/Rooms('1')</uri>"#;
        let mut cursor = XmlCursor::new(xml.as_bytes());
        assert_eq!(read_link(&mut cursor).unwrap(), "http://host/service/Rooms('1')");
    }

    #[test]
    fn test_wrong_root() {
        let mut cursor = XmlCursor::new("<links/>".as_bytes());
        assert_eq!(read_links(&mut cursor).unwrap_err().key(), MessageKey::MissingTag);
    }
}
