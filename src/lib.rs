//! # odata-consumer
//!
//! A pure Rust library for reading OData payloads against an entity data
//! model.
//!
//! Responses in Atom/XML or verbose JSON are turned into typed entries,
//! feeds and delta feeds. Every value is validated against the metadata and
//! parsed into a native Rust value.
//!
//! ## Features
//!
//! - Entries, feeds and delta feeds (deleted-entry markers)
//! - Single properties, raw `$value` bodies and function import collections
//! - `$links` documents and service error documents
//! - Inline navigation content, either nested into the parent entry or handed
//!   to an [`OnReadInlineContent`] callback
//! - Merge semantics for partial updates and per-property type mappings
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use odata_consumer::{EntityReader, ReadProperties};
//!
//! let reader = EntityReader::new(&edm, "application/atom+xml")?;
//! let entry = reader.read_entry("Employees", body.as_bytes())?;
//!
//! for (name, value) in &entry.properties {
//!     println!("{}: {:?}", name, value);
//! }
//! # Ok::<(), odata_consumer::error::EntityProviderError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`edm`] - metadata arena and the simple-value codec
//! - [`types`] - the values a read produces
//! - [`io`] - format detection and the XML and JSON consumers
//! - [`callback`] - hook for inline navigation content
//!
//! The library does not install a logger; it logs through the `log` facade.

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod callback;
pub mod edm;
pub mod error;
pub mod io;
pub mod read_properties;
pub mod types;

// Re-export commonly used types
pub use error::{EntityProviderError, MessageKey, Result};
pub use edm::{Edm, EdmBuilder, EdmSimpleTypeKind, FullQualifiedName, SimpleValue, TargetType};
pub use types::{DeltaFeed, Entry, ErrorContext, Feed, PropertyMap, PropertyValue};

// Re-export reading API
pub use callback::{OnReadInlineContent, ReadEntryResult, ReadFeedResult};
pub use io::{EntityReader, PayloadFormat};
pub use read_properties::{ReadProperties, ReadPropertiesBuilder, TypeMappings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reader_creation() {
        let edm = Edm::default();
        let reader = EntityReader::new(&edm, "application/json").unwrap();
        assert_eq!(reader.format(), PayloadFormat::Json);
        assert!(!reader.read_properties().is_merge());
    }
}
