//! Placement of inline navigation content
//!
//! Both payload formats decide *what* a navigation occurrence holds; this
//! module decides *where* the result goes: into the parent's property map,
//! or to the caller's [`OnReadInlineContent`](crate::callback::OnReadInlineContent)
//! after the parent entry is complete.

use crate::callback::{ReadEntryResult, ReadFeedResult};
use crate::edm::NavigationProperty;
use crate::error::{EntityProviderError, MessageKey, Result};
use crate::read_properties::ReadProperties;
use crate::types::{Entry, ExpandSelectTree, Feed, PropertyValue};

/// Materialized content of one inline occurrence
#[derive(Debug)]
pub(crate) enum InlineContent {
    /// `None` for an explicitly empty inline marker
    Entry(Option<Entry>),
    Feed(Feed),
}

impl InlineContent {
    fn expand_select_tree(&self) -> ExpandSelectTree {
        match self {
            InlineContent::Entry(Some(entry)) => entry.expand_select_tree.clone(),
            InlineContent::Entry(None) => ExpandSelectTree::default(),
            InlineContent::Feed(feed) => feed.expand_select_tree(),
        }
    }
}

fn callback_failed(
    navigation: &NavigationProperty,
) -> impl FnOnce(crate::callback::CallbackError) -> EntityProviderError + '_ {
    move |err| {
        EntityProviderError::new(MessageKey::CallbackFailed)
            .with_content(&navigation.name)
            .with_source(err)
    }
}

/// Read properties for the nested read below `navigation`
pub(crate) fn child_read_properties(
    read_properties: &ReadProperties,
    navigation: &NavigationProperty,
) -> Result<ReadProperties> {
    match read_properties.callback() {
        Some(callback) => callback
            .receive_read_properties(read_properties, navigation)
            .map_err(callback_failed(navigation)),
        None => Ok(read_properties.scoped(&navigation.name)),
    }
}

struct PendingResult {
    navigation: NavigationProperty,
    read_properties: ReadProperties,
    content: InlineContent,
}

/// Collects inline results of one entry while it is being read
#[derive(Default)]
pub(crate) struct InlineDispatcher {
    pending: Vec<PendingResult>,
}

impl InlineDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of a nested read
    pub fn deliver(
        &mut self,
        entry: &mut Entry,
        read_properties: &ReadProperties,
        child_properties: ReadProperties,
        navigation: &NavigationProperty,
        content: InlineContent,
    ) -> Result<()> {
        if entry.expand_select_tree.link(&navigation.name).is_some() {
            return Err(EntityProviderError::new(MessageKey::DoubleProperty).with_content(&navigation.name));
        }
        entry
            .expand_select_tree
            .put_link(&navigation.name, content.expand_select_tree());

        if read_properties.callback().is_some() {
            log::debug!("Deferring inline content of {} to callback", navigation.name);
            self.pending.push(PendingResult {
                navigation: navigation.clone(),
                read_properties: child_properties,
                content,
            });
        } else {
            let value = match content {
                InlineContent::Entry(Some(child)) => PropertyValue::Entry(Box::new(child)),
                InlineContent::Entry(None) => PropertyValue::Null,
                InlineContent::Feed(feed) => PropertyValue::Feed(feed),
            };
            entry.properties.insert(navigation.name.clone(), value);
            entry.contains_inline_entry = true;
        }
        Ok(())
    }

    /// Hand deferred results to the callback once `entry` is complete
    pub fn finish(self, entry: &Entry, read_properties: &ReadProperties) -> Result<()> {
        let callback = match read_properties.callback() {
            Some(callback) => callback,
            None => return Ok(()),
        };
        let parent_entry_id = entry.metadata.identity().map(str::to_string);

        for pending in self.pending {
            let navigation = pending.navigation;
            let outcome = match pending.content {
                InlineContent::Entry(child) => callback.handle_read_entry(ReadEntryResult {
                    read_properties: pending.read_properties,
                    navigation_property: navigation.clone(),
                    entry: child,
                    parent_entry_id: parent_entry_id.clone(),
                }),
                InlineContent::Feed(feed) => callback.handle_read_feed(ReadFeedResult {
                    read_properties: pending.read_properties,
                    navigation_property: navigation.clone(),
                    feed,
                    parent_entry_id: parent_entry_id.clone(),
                }),
            };
            outcome.map_err(callback_failed(&navigation))?;
        }
        Ok(())
    }
}
