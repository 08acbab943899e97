//! Entry and property values

use indexmap::IndexMap;

use super::Feed;
use crate::edm::SimpleValue;

/// Ordered property name → value map
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// Value of one property in a [`PropertyMap`]
///
/// An absent property has no key in the map; `Null` records an explicit null
/// in the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Simple(SimpleValue),
    Complex(PropertyMap),
    Entry(Box<Entry>),
    Feed(Feed),
    Null,
}

impl PropertyValue {
    pub fn as_simple(&self) -> Option<&SimpleValue> {
        match self {
            Self::Simple(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&PropertyMap> {
        match self {
            Self::Complex(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Self::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_feed(&self) -> Option<&Feed> {
        match self {
            Self::Feed(feed) => Some(feed),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Identity and link information of an entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryMetadata {
    pub id: Option<String>,
    pub etag: Option<String>,
    pub uri: Option<String>,
    /// Navigation property name → link targets found in the payload
    pub association_uris: IndexMap<String, Vec<String>>,
}

impl EntryMetadata {
    /// Key under which inline results of this entry are reported
    ///
    /// The atom id when present, the self uri otherwise.
    pub fn identity(&self) -> Option<&str> {
        self.id.as_deref().or(self.uri.as_deref())
    }

    pub fn add_association_uri(&mut self, navigation: &str, uri: impl Into<String>) {
        self.association_uris
            .entry(navigation.to_string())
            .or_default()
            .push(uri.into());
    }

    pub fn association_uris(&self, navigation: &str) -> &[String] {
        self.association_uris
            .get(navigation)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Media resource information of a media-link entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    pub content_type: Option<String>,
    pub source_link: Option<String>,
    pub edit_link: Option<String>,
    pub etag: Option<String>,
}

/// Which navigation properties were expanded while reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandSelectTree {
    /// All structural properties selected
    pub all: bool,
    pub links: IndexMap<String, ExpandSelectTree>,
}

impl Default for ExpandSelectTree {
    fn default() -> Self {
        Self {
            all: true,
            links: IndexMap::new(),
        }
    }
}

impl ExpandSelectTree {
    pub fn put_link(&mut self, navigation: &str, subtree: ExpandSelectTree) {
        self.links.insert(navigation.to_string(), subtree);
    }

    pub fn link(&self, navigation: &str) -> Option<&ExpandSelectTree> {
        self.links.get(navigation)
    }

    /// Union with another tree, recursively
    pub fn merge(&mut self, other: &ExpandSelectTree) {
        self.all |= other.all;
        for (name, subtree) in &other.links {
            match self.links.get_mut(name) {
                Some(existing) => existing.merge(subtree),
                None => {
                    self.links.insert(name.clone(), subtree.clone());
                }
            }
        }
    }
}

/// One entity instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub properties: PropertyMap,
    pub metadata: EntryMetadata,
    /// Present only for media-link entries
    pub media_metadata: Option<MediaMetadata>,
    pub expand_select_tree: ExpandSelectTree,
    pub(crate) contains_inline_entry: bool,
}

impl Entry {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// `true` if at least one navigation property was materialized in place
    pub fn contains_inline_entry(&self) -> bool {
        self.contains_inline_entry
    }

    pub(crate) fn media_metadata_mut(&mut self) -> &mut MediaMetadata {
        self.media_metadata.get_or_insert_with(MediaMetadata::default)
    }
}
