//! Error types for the payload consumer
//!
//! Every failure raised while reading a payload is an [`EntityProviderError`].
//! The error carries a stable [`MessageKey`] that classifies the failure
//! independently of the rendered text, the positional content that fills the
//! key's message template, and optionally the lower-level cause.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

use crate::edm::{EdmError, EdmSimpleTypeError};

/// Boxed lower-level cause attached to an [`EntityProviderError`]
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Stable identifier of a failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Caller passed an argument the consumer cannot work with
    IllegalArgument,
    /// Content type is neither XML/Atom nor JSON
    UnsupportedContentType,
    /// Declared character encoding is not UTF-8
    UnsupportedCharacterEncoding,
    /// The tokenizer rejected the input (broken XML/JSON syntax)
    MalformedInput,
    /// A collaborator (metadata lookup, I/O) failed
    ExceptionOccurred,
    /// Unexpected token at a structural position
    InvalidState,
    /// Unknown or misplaced key in a JSON structure
    InvalidContent,
    /// Element found below the wrong parent element
    InvalidParentTag,
    /// Mandatory attribute is missing
    MissingAttribute,
    /// Mandatory element is missing
    MissingTag,
    /// Content found after the root element/value
    EndDocumentExpected,
    /// Property name unknown to the entity or complex type
    InvalidProperty,
    /// Same property occurs twice in one entity
    DoubleProperty,
    /// Property value cannot be converted to its EDM type
    InvalidPropertyValue,
    /// Explicit null for a non-nullable property
    InvalidNullProperty,
    /// Declared entity type does not match the entity set
    InvalidEntityType,
    /// Declared complex type does not match the property
    InvalidComplexType,
    /// Declared simple type (or JSON token kind) does not match the property
    InvalidSimpleType,
    /// Inline content does not match the navigation property's multiplicity
    InvalidInlineContent,
    /// Inline count is negative or not a number
    InlineCountInvalid,
    /// Inline count occurs twice
    DoubleInlineCount,
    /// Next link occurs twice
    DoubleNextLink,
    /// Delta link occurs twice
    DoubleDeltaLink,
    /// Feed payload has no results array
    MissingResultsArray,
    /// Feed payload has two results arrays
    DoubleResultsArray,
    /// Deleted-entry marker carries an unparseable timestamp
    InvalidDeletedEntryMetadata,
    /// Inline-content callback reported an error
    CallbackFailed,
}

impl MessageKey {
    /// Stable upper-case name of the key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IllegalArgument => "ILLEGAL_ARGUMENT",
            Self::UnsupportedContentType => "UNSUPPORTED_CONTENT_TYPE",
            Self::UnsupportedCharacterEncoding => "UNSUPPORTED_CHARACTER_ENCODING",
            Self::MalformedInput => "MALFORMED_INPUT",
            Self::ExceptionOccurred => "EXCEPTION_OCCURRED",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidContent => "INVALID_CONTENT",
            Self::InvalidParentTag => "INVALID_PARENT_TAG",
            Self::MissingAttribute => "MISSING_ATTRIBUTE",
            Self::MissingTag => "MISSING_TAG",
            Self::EndDocumentExpected => "END_DOCUMENT_EXPECTED",
            Self::InvalidProperty => "INVALID_PROPERTY",
            Self::DoubleProperty => "DOUBLE_PROPERTY",
            Self::InvalidPropertyValue => "INVALID_PROPERTY_VALUE",
            Self::InvalidNullProperty => "INVALID_NULL_PROPERTY",
            Self::InvalidEntityType => "INVALID_ENTITYTYPE",
            Self::InvalidComplexType => "INVALID_COMPLEX_TYPE",
            Self::InvalidSimpleType => "INVALID_SIMPLE_TYPE",
            Self::InvalidInlineContent => "INVALID_INLINE_CONTENT",
            Self::InlineCountInvalid => "INLINECOUNT_INVALID",
            Self::DoubleInlineCount => "DOUBLE_INLINECOUNT",
            Self::DoubleNextLink => "DOUBLE_NEXT_LINK",
            Self::DoubleDeltaLink => "DOUBLE_DELTA_LINK",
            Self::MissingResultsArray => "MISSING_RESULTS_ARRAY",
            Self::DoubleResultsArray => "DOUBLE_RESULTS_ARRAY",
            Self::InvalidDeletedEntryMetadata => "INVALID_DELETED_ENTRY_METADATA",
            Self::CallbackFailed => "CALLBACK_FAILED",
        }
    }

    /// Message template; `{n}` is replaced by the n-th content token
    pub fn template(&self) -> &'static str {
        match self {
            Self::IllegalArgument => "Illegal argument: {0}",
            Self::UnsupportedContentType => "Unsupported content type '{0}'",
            Self::UnsupportedCharacterEncoding => "Unsupported character encoding '{0}'",
            Self::MalformedInput => "Malformed {0} input",
            Self::ExceptionOccurred => "Exception occurred: {0}",
            Self::InvalidState => "Expected {0} but found {1}",
            Self::InvalidContent => "Invalid content '{0}' in '{1}'",
            Self::InvalidParentTag => "Expected parent tag '{0}' for '{1}'",
            Self::MissingAttribute => "Missing attribute '{0}' at tag '{1}'",
            Self::MissingTag => "Missing tag '{0}'",
            Self::EndDocumentExpected => "End of document expected but found {0}",
            Self::InvalidProperty => "Invalid property '{0}'",
            Self::DoubleProperty => "Property '{0}' occurs more than once",
            Self::InvalidPropertyValue => "Invalid value for property '{0}'",
            Self::InvalidNullProperty => "Property '{0}' is not nullable",
            Self::InvalidEntityType => "Expected entity type '{0}' but found '{1}'",
            Self::InvalidComplexType => "Expected complex type '{0}' but found '{1}'",
            Self::InvalidSimpleType => "Invalid simple type for property '{0}'",
            Self::InvalidInlineContent => "Invalid inline content for '{0}', expected {1}",
            Self::InlineCountInvalid => "Invalid inline count '{0}'",
            Self::DoubleInlineCount => "Inline count occurs more than once",
            Self::DoubleNextLink => "Next link occurs more than once",
            Self::DoubleDeltaLink => "Delta link occurs more than once",
            Self::MissingResultsArray => "Feed payload has no results array",
            Self::DoubleResultsArray => "Results array occurs more than once",
            Self::InvalidDeletedEntryMetadata => "Invalid deleted entry metadata '{0}'",
            Self::CallbackFailed => "Inline content callback failed for '{0}'",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for payload reads
#[derive(Debug, Error)]
#[error("{key}: {}", render(.key, .content))]
pub struct EntityProviderError {
    key: MessageKey,
    content: Vec<String>,
    #[source]
    source: Option<BoxedCause>,
}

fn render(key: &MessageKey, content: &[String]) -> String {
    let mut message = key.template().to_string();
    for (index, token) in content.iter().enumerate() {
        message = message.replace(&format!("{{{}}}", index), token);
    }
    message
}

impl EntityProviderError {
    /// Create an error without content
    pub fn new(key: MessageKey) -> Self {
        Self {
            key,
            content: Vec::new(),
            source: None,
        }
    }

    /// Append one positional content token
    pub fn with_content(mut self, token: impl fmt::Display) -> Self {
        self.content.push(token.to_string());
        self
    }

    /// Attach the lower-level cause
    pub fn with_source(mut self, source: impl Into<BoxedCause>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The failure kind
    pub fn key(&self) -> MessageKey {
        self.key
    }

    /// Positional content tokens
    pub fn content(&self) -> &[String] {
        &self.content
    }

    /// The wrapped cause, if any
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

/// Result type alias for consumer operations
pub type Result<T> = std::result::Result<T, EntityProviderError>;

impl From<EdmError> for EntityProviderError {
    fn from(err: EdmError) -> Self {
        EntityProviderError::new(MessageKey::ExceptionOccurred)
            .with_content(err.to_string())
            .with_source(err)
    }
}

impl From<std::io::Error> for EntityProviderError {
    fn from(err: std::io::Error) -> Self {
        EntityProviderError::new(MessageKey::ExceptionOccurred)
            .with_content(err.to_string())
            .with_source(err)
    }
}

/// Wrap a codec failure for the named property
pub(crate) fn invalid_value(property: &str, err: EdmSimpleTypeError) -> EntityProviderError {
    EntityProviderError::new(MessageKey::InvalidPropertyValue)
        .with_content(property)
        .with_source(err)
}
