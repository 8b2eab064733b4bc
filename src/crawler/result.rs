use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::page::{Page, PageId};

/// Serializable record of a page with references only by string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecord {
    fn from_page(page: &Page, pages: &[Arc<Page>]) -> Self {
        match page.error() {
            Some(err) => Self {
                error: Some(err.to_string()),
                ..Self::default()
            },
            None => Self {
                links: Some(
                    page
                        .link_ids()
                        .iter()
                        .filter_map(|id| pages.get(id.0))
                        .map(|linked| linked.url().to_string())
                        .collect(),
                ),
                assets: Some(page.assets().iter().map(|a| a.to_string()).collect()),
                error: None,
            },
        }
    }
}

/// Canonical page URL to record, ordered by URL
pub type LookupTable = BTreeMap<String, PageRecord>;

/// Finished crawl: the page graph plus its lazily built lookup table
#[derive(Debug)]
pub struct CrawlResult {
    pages: Vec<Arc<Page>>,
    lookup: OnceCell<LookupTable>,
}

impl CrawlResult {
    /// `pages` must be ordered by id with the root first
    pub(crate) fn new(pages: Vec<Arc<Page>>) -> Self {
        debug_assert!(!pages.is_empty());
        Self {
            pages,
            lookup: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Page {
        &self.pages[0]
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(id.0).map(Arc::as_ref)
    }

    /// Pages linked from `page`, in document order with duplicates
    pub fn links<'a>(&'a self, page: &'a Page) -> impl Iterator<Item = &'a Page> + 'a {
        page.link_ids().iter().filter_map(|id| self.page(*id))
    }

    /// Every page of the crawl, ordered by id
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page table suitable for serialization. Built on first call, later and
    /// concurrent callers share the same table.
    ///
    /// Building the table does not release the page list: it also backs
    /// [`CrawlResult::links`], so both stay alive as long as the result.
    pub fn lookup_table(&self) -> &LookupTable {
        self.lookup.get_or_init(|| {
            self.pages
                .iter()
                .map(|page| {
                    (
                        page.url().to_string(),
                        PageRecord::from_page(page, &self.pages),
                    )
                })
                .collect()
        })
    }
}
