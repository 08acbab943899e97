//! Pull cursor over JSON tokens
//!
//! The document is tokenized up front by `serde_json` into a flat event
//! list, so duplicate keys and key order survive exactly as sent. Numbers
//! keep their literal text (`arbitrary_precision`), never a float rendering.

use std::fmt;
use std::io::Read;

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::{EntityProviderError, MessageKey, Result};

/// Kind of the next token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JsonToken {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Name,
    String,
    Number,
    Boolean,
    Null,
    EndDocument,
}

impl fmt::Display for JsonToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonToken::BeginObject => "BEGIN_OBJECT",
            JsonToken::EndObject => "END_OBJECT",
            JsonToken::BeginArray => "BEGIN_ARRAY",
            JsonToken::EndArray => "END_ARRAY",
            JsonToken::Name => "NAME",
            JsonToken::String => "STRING",
            JsonToken::Number => "NUMBER",
            JsonToken::Boolean => "BOOLEAN",
            JsonToken::Null => "NULL",
            JsonToken::EndDocument => "END_DOCUMENT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum JsonEvent {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Name(String),
    String(String),
    /// Textual form of the number
    Number(String),
    Bool(bool),
    Null,
    EndDocument,
}

impl JsonEvent {
    fn token(&self) -> JsonToken {
        match self {
            JsonEvent::BeginObject => JsonToken::BeginObject,
            JsonEvent::EndObject => JsonToken::EndObject,
            JsonEvent::BeginArray => JsonToken::BeginArray,
            JsonEvent::EndArray => JsonToken::EndArray,
            JsonEvent::Name(_) => JsonToken::Name,
            JsonEvent::String(_) => JsonToken::String,
            JsonEvent::Number(_) => JsonToken::Number,
            JsonEvent::Bool(_) => JsonToken::Boolean,
            JsonEvent::Null => JsonToken::Null,
            JsonEvent::EndDocument => JsonToken::EndDocument,
        }
    }
}

/// Map key under which `arbitrary_precision` hands a number's literal text
/// to `visit_map`
const NUMBER_TOKEN: &str = "$serde_json::private::Number";

/// Records every value it is fed as flat events
struct EventRecorder<'a>(&'a mut Vec<JsonEvent>);

impl<'de, 'a> DeserializeSeed<'de> for EventRecorder<'a> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'a> Visitor<'de> for EventRecorder<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<(), E> {
        self.0.push(JsonEvent::Bool(v));
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<(), E> {
        self.0.push(JsonEvent::Number(v.to_string()));
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<(), E> {
        self.0.push(JsonEvent::Number(v.to_string()));
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<(), E> {
        self.0.push(JsonEvent::Number(v.to_string()));
        Ok(())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<(), E> {
        self.0.push(JsonEvent::String(v.to_string()));
        Ok(())
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<(), E> {
        self.0.push(JsonEvent::String(v));
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<(), E> {
        self.0.push(JsonEvent::Null);
        Ok(())
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let events = self.0;
        events.push(JsonEvent::BeginArray);
        while seq.next_element_seed(EventRecorder(&mut *events))?.is_some() {}
        events.push(JsonEvent::EndArray);
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let events = self.0;
        let mut key = map.next_key::<String>()?;
        if key.as_deref() == Some(NUMBER_TOKEN) {
            let literal: String = map.next_value()?;
            events.push(JsonEvent::Number(literal));
            return Ok(());
        }

        events.push(JsonEvent::BeginObject);
        while let Some(name) = key {
            events.push(JsonEvent::Name(name));
            map.next_value_seed(EventRecorder(&mut *events))?;
            key = map.next_key::<String>()?;
        }
        events.push(JsonEvent::EndObject);
        Ok(())
    }
}

fn json_error(err: serde_json::Error) -> EntityProviderError {
    match err.classify() {
        serde_json::error::Category::Io => EntityProviderError::new(MessageKey::ExceptionOccurred)
            .with_content(err.to_string())
            .with_source(err),
        _ => EntityProviderError::new(MessageKey::MalformedInput)
            .with_content("JSON")
            .with_source(err),
    }
}

static END_DOCUMENT: JsonEvent = JsonEvent::EndDocument;

/// Cursor over one JSON document
pub(crate) struct JsonCursor {
    events: Vec<JsonEvent>,
    position: usize,
}

impl JsonCursor {
    pub fn from_reader<R: Read>(input: R) -> Result<Self> {
        let mut events = Vec::new();
        let mut deserializer = serde_json::Deserializer::from_reader(input);
        EventRecorder(&mut events)
            .deserialize(&mut deserializer)
            .map_err(json_error)?;
        deserializer.end().map_err(|err| {
            EntityProviderError::new(MessageKey::EndDocumentExpected)
                .with_content(err.to_string())
                .with_source(err)
        })?;
        events.push(JsonEvent::EndDocument);
        log::trace!("JSON document tokenized into {} events", events.len());
        Ok(Self { events, position: 0 })
    }

    fn current(&self) -> &JsonEvent {
        self.events.get(self.position).unwrap_or(&END_DOCUMENT)
    }

    fn advance(&mut self) -> JsonEvent {
        let event = self.current().clone();
        if self.position < self.events.len() {
            self.position += 1;
        }
        event
    }

    fn expect(&mut self, token: JsonToken) -> Result<JsonEvent> {
        let found = self.peek();
        if found != token {
            return Err(invalid_state(token, found));
        }
        Ok(self.advance())
    }

    pub fn peek(&self) -> JsonToken {
        self.current().token()
    }

    /// First key of the object that starts at the cursor, without consuming
    pub fn peek_first_name(&self) -> Option<&str> {
        match (self.current(), self.events.get(self.position + 1)) {
            (JsonEvent::BeginObject, Some(JsonEvent::Name(name))) => Some(name),
            _ => None,
        }
    }

    /// `true` while the current object or array has more members
    pub fn has_next(&self) -> bool {
        !matches!(
            self.peek(),
            JsonToken::EndObject | JsonToken::EndArray | JsonToken::EndDocument
        )
    }

    pub fn begin_object(&mut self) -> Result<()> {
        self.expect(JsonToken::BeginObject).map(drop)
    }

    pub fn end_object(&mut self) -> Result<()> {
        self.expect(JsonToken::EndObject).map(drop)
    }

    pub fn begin_array(&mut self) -> Result<()> {
        self.expect(JsonToken::BeginArray).map(drop)
    }

    pub fn end_array(&mut self) -> Result<()> {
        self.expect(JsonToken::EndArray).map(drop)
    }

    pub fn next_name(&mut self) -> Result<String> {
        match self.expect(JsonToken::Name)? {
            JsonEvent::Name(name) => Ok(name),
            other => Err(invalid_state(JsonToken::Name, other.token())),
        }
    }

    pub fn next_string(&mut self) -> Result<String> {
        match self.expect(JsonToken::String)? {
            JsonEvent::String(value) => Ok(value),
            other => Err(invalid_state(JsonToken::String, other.token())),
        }
    }

    /// Text of a string, number or boolean token
    pub fn next_literal(&mut self) -> Result<(JsonToken, String)> {
        let token = self.peek();
        match self.current() {
            JsonEvent::String(_) | JsonEvent::Number(_) | JsonEvent::Bool(_) => {}
            _ => return Err(invalid_state(JsonToken::String, token)),
        }
        let text = match self.advance() {
            JsonEvent::String(text) | JsonEvent::Number(text) => text,
            JsonEvent::Bool(value) => value.to_string(),
            _ => String::new(),
        };
        Ok((token, text))
    }

    pub fn next_null(&mut self) -> Result<()> {
        self.expect(JsonToken::Null).map(drop)
    }

    /// Skip one complete value
    pub fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                JsonEvent::BeginObject | JsonEvent::BeginArray => depth += 1,
                JsonEvent::EndObject | JsonEvent::EndArray => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        invalid_state(JsonToken::BeginObject, JsonToken::EndObject)
                    })?
                }
                JsonEvent::Name(_) => continue,
                JsonEvent::EndDocument => {
                    return Err(invalid_state(JsonToken::BeginObject, JsonToken::EndDocument))
                }
                _ => {}
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Consume one complete value as a JSON tree
    pub fn next_value(&mut self) -> Result<serde_json::Value> {
        use serde_json::Value;

        match self.advance() {
            JsonEvent::Null => Ok(Value::Null),
            JsonEvent::Bool(value) => Ok(Value::Bool(value)),
            JsonEvent::String(value) => Ok(Value::String(value)),
            JsonEvent::Number(text) => serde_json::from_str(&text).map_err(json_error),
            JsonEvent::BeginArray => {
                let mut items = Vec::new();
                while self.has_next() {
                    items.push(self.next_value()?);
                }
                self.end_array()?;
                Ok(Value::Array(items))
            }
            JsonEvent::BeginObject => {
                let mut members = serde_json::Map::new();
                while self.has_next() {
                    let name = self.next_name()?;
                    members.insert(name, self.next_value()?);
                }
                self.end_object()?;
                Ok(Value::Object(members))
            }
            other => Err(invalid_state(JsonToken::BeginObject, other.token())),
        }
    }

    pub fn expect_end_of_document(&mut self) -> Result<()> {
        match self.peek() {
            JsonToken::EndDocument => Ok(()),
            other => Err(EntityProviderError::new(MessageKey::EndDocumentExpected).with_content(other)),
        }
    }
}

pub(crate) fn invalid_state(expected: JsonToken, found: JsonToken) -> EntityProviderError {
    EntityProviderError::new(MessageKey::InvalidState)
        .with_content(expected)
        .with_content(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(json: &str) -> JsonCursor {
        JsonCursor::from_reader(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_object_walk() {
        let mut c = cursor(r#"{"a": 1, "b": [true, null], "c": "x"}"#);
        c.begin_object().unwrap();
        assert_eq!(c.next_name().unwrap(), "a");
        assert_eq!(c.next_literal().unwrap(), (JsonToken::Number, "1".to_string()));
        assert_eq!(c.next_name().unwrap(), "b");
        c.begin_array().unwrap();
        assert_eq!(c.next_literal().unwrap(), (JsonToken::Boolean, "true".to_string()));
        c.next_null().unwrap();
        assert!(!c.has_next());
        c.end_array().unwrap();
        assert_eq!(c.next_name().unwrap(), "c");
        assert_eq!(c.next_string().unwrap(), "x");
        c.end_object().unwrap();
        c.expect_end_of_document().unwrap();
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let mut c = cursor(r#"{"a": 1, "a": 2}"#);
        c.begin_object().unwrap();
        assert_eq!(c.next_name().unwrap(), "a");
        c.skip_value().unwrap();
        assert_eq!(c.next_name().unwrap(), "a");
    }

    #[test]
    fn test_number_literal_is_kept() {
        let mut c = cursor(r#"[0.1234567890123456789, 5e1, 1.0, 18446744073709551616]"#);
        c.begin_array().unwrap();
        for literal in ["0.1234567890123456789", "5e1", "1.0", "18446744073709551616"] {
            assert_eq!(c.next_literal().unwrap(), (JsonToken::Number, literal.to_string()));
        }
        c.end_array().unwrap();
    }

    #[test]
    fn test_skip_nested_value() {
        let mut c = cursor(r#"{"a": {"b": [1, {"c": 2}]}, "d": 3}"#);
        c.begin_object().unwrap();
        c.next_name().unwrap();
        c.skip_value().unwrap();
        assert_eq!(c.next_name().unwrap(), "d");
    }

    #[test]
    fn test_wrong_token() {
        let mut c = cursor("[1]");
        let err = c.begin_object().unwrap_err();
        assert_eq!(err.key(), MessageKey::InvalidState);
        assert_eq!(err.content(), ["BEGIN_OBJECT", "BEGIN_ARRAY"]);
    }

    #[test]
    fn test_malformed_and_trailing_input() {
        let err = JsonCursor::from_reader(r#"{"a": }"#.as_bytes()).err().unwrap();
        assert_eq!(err.key(), MessageKey::MalformedInput);

        let err = JsonCursor::from_reader(r#"{} {}"#.as_bytes()).err().unwrap();
        assert_eq!(err.key(), MessageKey::EndDocumentExpected);
    }
}
