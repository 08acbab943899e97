//! Verbose JSON payloads

mod reader;

pub(crate) use reader::JsonEntityConsumer;

pub(crate) const ENVELOPE: &str = "d";
pub(crate) const METADATA: &str = "__metadata";
pub(crate) const DEFERRED: &str = "__deferred";
pub(crate) const RESULTS: &str = "results";
pub(crate) const COUNT: &str = "__count";
pub(crate) const NEXT: &str = "__next";
pub(crate) const DELTA: &str = "__delta";
pub(crate) const ODATA_CONTEXT: &str = "@odata.context";
