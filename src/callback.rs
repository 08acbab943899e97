//! Inline content callback
//!
//! By default inline (expanded) navigation content is materialized into the
//! parent entry's property map. A caller that prefers to index nested results
//! itself installs an [`OnReadInlineContent`] in the [`ReadProperties`]; the
//! reader then leaves the navigation property absent and hands every nested
//! entry or feed to the callback once the parent entry is complete.

use std::error::Error as StdError;

use crate::edm::NavigationProperty;
use crate::read_properties::ReadProperties;
use crate::types::{Entry, Feed};

/// Error type callbacks may return
pub type CallbackError = Box<dyn StdError + Send + Sync + 'static>;

/// Inline entry read below a parent entry
#[derive(Debug, Clone)]
pub struct ReadEntryResult {
    /// Properties the nested read used
    pub read_properties: ReadProperties,
    pub navigation_property: NavigationProperty,
    /// `None` for explicitly empty inline content
    pub entry: Option<Entry>,
    /// Id of the parent entry (atom id, or the self uri)
    pub parent_entry_id: Option<String>,
}

/// Inline feed read below a parent entry
#[derive(Debug, Clone)]
pub struct ReadFeedResult {
    pub read_properties: ReadProperties,
    pub navigation_property: NavigationProperty,
    pub feed: Feed,
    pub parent_entry_id: Option<String>,
}

/// Receives inline content instead of the parent's property map
pub trait OnReadInlineContent {
    /// Read properties for the content below `navigation_property`
    ///
    /// Called before the nested read starts. The default keeps the current
    /// properties, so the same callback also receives grandchildren.
    fn receive_read_properties(
        &self,
        read_properties: &ReadProperties,
        navigation_property: &NavigationProperty,
    ) -> Result<ReadProperties, CallbackError> {
        let _ = navigation_property;
        Ok(read_properties.clone())
    }

    fn handle_read_entry(&self, result: ReadEntryResult) -> Result<(), CallbackError>;

    fn handle_read_feed(&self, result: ReadFeedResult) -> Result<(), CallbackError>;
}
