//! Atom/XML payloads

mod reader;

pub(crate) use reader::XmlEntityConsumer;

/// Atom syndication namespace
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Data service metadata namespace (`m:`)
pub const METADATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

/// Data service data namespace (`d:`)
pub const DATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";

/// Atom tombstone namespace for deleted entries
pub const TOMBSTONE_NS: &str = "http://purl.org/atompub/tombstones/1.0";

/// `rel` prefix of navigation links; the navigation property name follows
pub const RELATED_LINK_REL_PREFIX: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/related/";
