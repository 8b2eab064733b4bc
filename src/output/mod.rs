pub mod dot;
pub mod json;

use anyhow::Result;
use std::io::Write;

use crate::crawler::CrawlResult;

pub use dot::DotWriter;
pub use json::JsonWriter;

/// Serializes a finished crawl
pub trait ResultWriter {
    /// File extension used for default output names
    fn ext(&self) -> &'static str;

    fn write(&self, out: &mut dyn Write, result: &CrawlResult) -> Result<()>;
}
