use anyhow::Result;
use std::io::Write;

use super::ResultWriter;
use crate::crawler::CrawlResult;

/// Writes the lookup table as a JSON object keyed by page URL
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWriter {
    pub pretty: bool,
}

impl ResultWriter for JsonWriter {
    fn ext(&self) -> &'static str {
        "json"
    }

    fn write(&self, out: &mut dyn Write, result: &CrawlResult) -> Result<()> {
        let table = result.lookup_table();
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, table)?;
        } else {
            serde_json::to_writer(&mut *out, table)?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{LookupTable, Page, PageId};
    use std::sync::Arc;
    use url::Url;

    fn small_result() -> Result<CrawlResult, Box<dyn std::error::Error>> {
        let root = Arc::new(Page::new(PageId(0), &Url::parse("http://testhost.local/")?));
        let about = Arc::new(Page::new(PageId(1), &Url::parse("http://testhost.local/about")?));
        root.set_assets(vec![Url::parse("http://testhost.local/logo.png")?]);
        root.set_links(vec![PageId(1)]);
        about.set_error(anyhow::anyhow!("non 200 status code received: 404"));
        Ok(CrawlResult::new(vec![root, about]))
    }

    #[test]
    fn test_json_shape() -> Result<(), Box<dyn std::error::Error>> {
        let result = small_result()?;
        let mut out = Vec::new();
        JsonWriter { pretty: false }.write(&mut out, &result)?;

        let written: serde_json::Value = serde_json::from_slice(&out)?;
        let expected = serde_json::json!({
            "http://testhost.local/": {
                "links": ["http://testhost.local/about"],
                "assets": ["http://testhost.local/logo.png"]
            },
            "http://testhost.local/about": {
                "error": "non 200 status code received: 404"
            }
        });
        assert_eq!(written, expected);
        Ok(())
    }

    #[test]
    fn test_pretty_decodes_to_same_table() -> Result<(), Box<dyn std::error::Error>> {
        let result = small_result()?;
        let mut out = Vec::new();
        JsonWriter { pretty: true }.write(&mut out, &result)?;

        let decoded: LookupTable = serde_json::from_slice(&out)?;
        assert_eq!(&decoded, result.lookup_table());
        assert!(String::from_utf8(out)?.contains('\n'));
        Ok(())
    }
}
