pub mod page;
pub mod table;
pub mod fetch;
pub mod scheduler;
pub mod result;


use log2::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub use fetch::{Fetcher, HttpFetcher, LoggingFetcher, PAGE_REQUEST_TIMEOUT_SEC};
pub use page::{Page, PageId};
pub use result::{CrawlResult, LookupTable, PageRecord};
pub use scheduler::Scheduler;
pub use table::{PageTable, Resolved, canonical_key};

/// Concurrent requests used when none are configured
pub const DEFAULT_MAX_REQUESTS: usize = 2;

#[derive(Error, Debug)]
pub enum CrawlError {
    /// The root URL could not be parsed, nothing was fetched
    #[error("malformed root URL '{url}': {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Single-host crawler. Holds only immutable settings and can run any
/// number of crawls.
#[derive(Clone)]
pub struct Crawler {
    max_requests: usize,
    fetcher: Arc<dyn Fetcher>,
}

impl Crawler {
    /// `max_requests == 0` selects [`DEFAULT_MAX_REQUESTS`]
    pub fn new(max_requests: usize, fetcher: Arc<dyn Fetcher>) -> Self {
        let max_requests = if max_requests == 0 {
            DEFAULT_MAX_REQUESTS
        } else {
            max_requests
        };
        Self {
            max_requests,
            fetcher,
        }
    }

    /// Crawler backed by [`HttpFetcher`]
    pub fn http(max_requests: usize, timeout: Duration) -> Self {
        Self::new(max_requests, Arc::new(HttpFetcher::new(timeout)))
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Crawls every page reachable from `root_url` without leaving its host.
    /// Returns once all discovered pages are fetched or failed.
    pub async fn crawl(&self, root_url: &str) -> Result<CrawlResult, CrawlError> {
        let root = Url::parse(root_url).map_err(|source| CrawlError::MalformedUrl {
            url: root_url.to_string(),
            source,
        })?;

        let table = PageTable::new(&root);
        let root_page = table.register_root(&root);
        info!(
            "Crawling {} with up to {} concurrent requests",
            root_page.url(),
            self.max_requests
        );

        let scheduler = Arc::new(Scheduler::new(
            self.max_requests,
            Arc::clone(&self.fetcher),
            table,
        ));
        scheduler.schedule(root_page).await;
        scheduler.wait().await;

        let pages = scheduler.table().finish();
        debug!("Crawl of {} finished with {} pages", root, pages.len());
        Ok(CrawlResult::new(pages))
    }
}
