//! Pull cursor over namespace-resolved XML events

use std::borrow::Cow;
use std::io::BufRead;

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::{BoxedCause, EntityProviderError, MessageKey, Result};

/// Namespace-qualified element or attribute name
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlName {
    pub namespace: Option<String>,
    pub local: String,
}

impl XmlName {
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local == local
    }

    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }
}

impl std::fmt::Display for XmlName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Start tag with resolved attributes (`xmlns` declarations removed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlStartTag {
    pub name: XmlName,
    pub attributes: Vec<(XmlName, String)>,
}

impl XmlStartTag {
    /// Attribute value; `None` namespace matches unqualified attributes
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.namespace.as_deref() == namespace && name.local == local)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value by local name in any namespace
    pub fn attribute_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.local == local)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute that must be present
    pub fn required_attribute(&self, namespace: Option<&str>, local: &str) -> Result<&str> {
        self.attribute(namespace, local).ok_or_else(|| {
            EntityProviderError::new(MessageKey::MissingAttribute)
                .with_content(local)
                .with_content(&self.name.local)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum XmlEvent {
    Start(XmlStartTag),
    End(XmlName),
    Text(String),
    Eof,
}

impl XmlEvent {
    fn describe(&self) -> String {
        match self {
            XmlEvent::Start(tag) => format!("start tag '{}'", tag.name.local),
            XmlEvent::End(name) => format!("end tag '{}'", name.local),
            XmlEvent::Text(text) => format!("text '{}'", text.trim()),
            XmlEvent::Eof => "end of document".to_string(),
        }
    }
}

pub(crate) fn malformed(err: impl Into<BoxedCause>) -> EntityProviderError {
    EntityProviderError::new(MessageKey::MalformedInput)
        .with_content("XML")
        .with_source(err)
}

/// Raised when the event at a structural position is not the expected one
pub(crate) fn invalid_state(expected: &str, found: &XmlEvent) -> EntityProviderError {
    EntityProviderError::new(MessageKey::InvalidState)
        .with_content(expected)
        .with_content(found.describe())
}

fn resolve_namespace(resolve: ResolveResult<'_>) -> Option<String> {
    match resolve {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            log::warn!("Unknown namespace prefix: {}", String::from_utf8_lossy(&prefix));
            None
        }
    }
}

fn is_namespace_declaration(name: &quick_xml::name::QName<'_>) -> bool {
    match name.prefix() {
        Some(prefix) => prefix.as_ref() == b"xmlns",
        None => name.local_name().as_ref() == b"xmlns",
    }
}

fn resolve_entity(raw: &str) -> Result<String> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.to_string());
    }
    let code = raw.strip_prefix('#').and_then(|rest| {
        match rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => rest.parse::<u32>().ok(),
        }
    });
    code.and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| malformed(format!("Unknown entity reference &{};", raw)))
}

/// Cursor over an XML document
///
/// Empty elements are reported as a start tag directly followed by its end
/// tag. CDATA sections and entity references are reported as text; comments,
/// processing instructions and the document type are skipped.
pub(crate) struct XmlCursor<R: BufRead> {
    reader: NsReader<R>,
}

impl<R: BufRead> XmlCursor<R> {
    pub fn new(input: R) -> Self {
        let mut reader = NsReader::from_reader(input);
        let config = reader.config_mut();
        config.trim_text(false);
        config.expand_empty_elements = true;
        Self { reader }
    }

    fn attributes(&self, start: &BytesStart<'_>) -> Result<Vec<(XmlName, String)>> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(malformed)?;
            if is_namespace_declaration(&attr.key) {
                continue;
            }
            let (resolve, _) = self.reader.resolve_attribute(attr.key);
            let name = XmlName {
                namespace: resolve_namespace(resolve),
                local: String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
            };
            let value = attr.unescape_value().map_err(malformed)?.into_owned();
            attributes.push((name, value));
        }
        Ok(attributes)
    }

    pub fn next_event(&mut self) -> Result<XmlEvent> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let (resolve, event) = self
                .reader
                .read_resolved_event_into(&mut buf)
                .map_err(malformed)?;
            let event = match event {
                Event::Start(ref start) => {
                    let name = XmlName {
                        namespace: resolve_namespace(resolve),
                        local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                    };
                    XmlEvent::Start(XmlStartTag {
                        name,
                        attributes: self.attributes(start)?,
                    })
                }
                Event::End(ref end) => {
                    let (resolve, _) = self.reader.resolve_element(end.name());
                    XmlEvent::End(XmlName {
                        namespace: resolve_namespace(resolve),
                        local: String::from_utf8_lossy(end.local_name().as_ref()).into_owned(),
                    })
                }
                Event::Text(text) => XmlEvent::Text(text.decode().map_err(malformed)?.into_owned()),
                Event::CData(data) => XmlEvent::Text(String::from_utf8_lossy(&data).into_owned()),
                Event::GeneralRef(reference) => {
                    let raw = reference.decode().map_err(malformed)?;
                    XmlEvent::Text(resolve_entity(&raw)?)
                }
                Event::Decl(decl) => {
                    if let Some(encoding) = decl.encoding() {
                        let label = encoding.map_err(malformed)?;
                        check_encoding(&label)?;
                    }
                    continue;
                }
                Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
                Event::Empty(_) => continue,
                Event::Eof => XmlEvent::Eof,
            };
            log::trace!("XML event: {:?}", event);
            return Ok(event);
        }
    }

    /// Next start or end tag, skipping whitespace
    pub fn next_tag(&mut self) -> Result<XmlEvent> {
        loop {
            match self.next_event()? {
                XmlEvent::Text(text) if text.trim().is_empty() => continue,
                event @ (XmlEvent::Start(_) | XmlEvent::End(_)) => return Ok(event),
                other => return Err(invalid_state("tag", &other)),
            }
        }
    }

    /// First start tag of the document
    pub fn root_element(&mut self) -> Result<XmlStartTag> {
        match self.next_tag()? {
            XmlEvent::Start(tag) => Ok(tag),
            other => Err(invalid_state("root element", &other)),
        }
    }

    /// Text content of the element whose start tag was just consumed,
    /// consuming its end tag
    pub fn element_text(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                XmlEvent::Text(chunk) => text.push_str(&chunk),
                XmlEvent::End(_) => return Ok(text),
                other => return Err(invalid_state("text", &other)),
            }
        }
    }

    /// Skip the rest of the element whose start tag was just consumed
    pub fn skip_element(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_event()? {
                XmlEvent::Start(_) => depth += 1,
                XmlEvent::End(_) => depth -= 1,
                XmlEvent::Text(_) => {}
                XmlEvent::Eof => return Err(invalid_state("end tag", &XmlEvent::Eof)),
            }
        }
        Ok(())
    }

    /// Only whitespace may follow the root element
    pub fn expect_end_of_document(&mut self) -> Result<()> {
        loop {
            match self.next_event()? {
                XmlEvent::Eof => return Ok(()),
                XmlEvent::Text(text) if text.trim().is_empty() => continue,
                other => {
                    return Err(EntityProviderError::new(MessageKey::EndDocumentExpected)
                        .with_content(other.describe()))
                }
            }
        }
    }
}

fn check_encoding(label: &Cow<'_, [u8]>) -> Result<()> {
    match encoding_rs::Encoding::for_label(label) {
        Some(encoding) if encoding == encoding_rs::UTF_8 => Ok(()),
        _ => Err(EntityProviderError::new(MessageKey::UnsupportedCharacterEncoding)
            .with_content(String::from_utf8_lossy(label))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOM: &str = "http://www.w3.org/2005/Atom";

    fn cursor(xml: &str) -> XmlCursor<&[u8]> {
        XmlCursor::new(xml.as_bytes())
    }

    #[test]
    fn test_resolves_namespaces_and_attributes() {
        let mut c = cursor(r#"<a:entry xmlns:a="http://www.w3.org/2005/Atom"><a:link rel="self" href="x"/></a:entry>"#);
        let root = c.root_element().unwrap();
        assert!(root.name.is(ATOM, "entry"));
        assert!(root.attributes.is_empty());

        match c.next_tag().unwrap() {
            XmlEvent::Start(link) => {
                assert!(link.name.is(ATOM, "link"));
                assert_eq!(link.attribute(None, "rel"), Some("self"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(c.next_tag().unwrap(), XmlEvent::End(_)));
        assert!(matches!(c.next_tag().unwrap(), XmlEvent::End(_)));
        c.expect_end_of_document().unwrap();
    }

    #[test]
    fn test_element_text_joins_entities() {
        let mut c = cursor("<t>a &amp; b &#65;</t>");
        c.root_element().unwrap();
        assert_eq!(c.element_text().unwrap(), "a & b A");
    }

    #[test]
    fn test_skip_element() {
        let mut c = cursor("<r><x><y/><z>t</z></x><w/></r>");
        c.root_element().unwrap();
        c.next_tag().unwrap();
        c.skip_element().unwrap();
        match c.next_tag().unwrap() {
            XmlEvent::Start(tag) => assert_eq!(tag.name.local, "w"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_encoding_declaration() {
        let mut c = cursor(r#"<?xml version="1.0" encoding="UTF-8"?><r/>"#);
        assert!(c.root_element().is_ok());

        let mut c = cursor(r#"<?xml version="1.0" encoding="iso-8859-1"?><r/>"#);
        let err = c.root_element().unwrap_err();
        assert_eq!(err.key(), MessageKey::UnsupportedCharacterEncoding);
    }

    #[test]
    fn test_trailing_content() {
        let mut c = cursor("<r/><extra/>");
        c.root_element().unwrap();
        c.next_tag().unwrap();
        let err = c.expect_end_of_document().unwrap_err();
        assert_eq!(err.key(), MessageKey::EndDocumentExpected);
    }

    #[test]
    fn test_malformed_input() {
        fn drain(c: &mut XmlCursor<&[u8]>) -> Result<()> {
            while c.next_event()? != XmlEvent::Eof {}
            Ok(())
        }
        let mut c = cursor("<r><x></r>");
        let err = drain(&mut c).unwrap_err();
        assert_eq!(err.key(), MessageKey::MalformedInput);
    }
}
