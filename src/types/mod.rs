//! In-memory results of a payload read

mod entry;
mod error_context;
mod feed;

pub use entry::{Entry, EntryMetadata, ExpandSelectTree, MediaMetadata, PropertyMap, PropertyValue};
pub use error_context::{ErrorContext, Locale};
pub use feed::{DeletedEntryMetadata, DeltaFeed, Feed, FeedMetadata};
