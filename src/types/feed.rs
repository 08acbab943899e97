//! Feeds and delta feeds

use chrono::{DateTime, Utc};

use super::{Entry, ExpandSelectTree};

/// Feed-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedMetadata {
    pub inline_count: Option<u32>,
    pub next_link: Option<String>,
    pub delta_link: Option<String>,
}

/// Ordered collection of entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    pub entries: Vec<Entry>,
    pub feed_metadata: FeedMetadata,
}

impl Feed {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union of the expand trees of all entries
    pub fn expand_select_tree(&self) -> ExpandSelectTree {
        let mut tree = ExpandSelectTree::default();
        for entry in &self.entries {
            tree.merge(&entry.expand_select_tree);
        }
        tree
    }
}

/// Marker for an entry removed since the previous read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedEntryMetadata {
    pub uri: String,
    pub when: Option<DateTime<Utc>>,
}

/// Feed plus deletion markers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaFeed {
    pub feed: Feed,
    pub deleted_entries: Vec<DeletedEntryMetadata>,
}

impl DeltaFeed {
    pub fn entries(&self) -> &[Entry] {
        &self.feed.entries
    }

    pub fn feed_metadata(&self) -> &FeedMetadata {
        &self.feed.feed_metadata
    }

    pub fn into_feed(self) -> Feed {
        self.feed
    }
}
