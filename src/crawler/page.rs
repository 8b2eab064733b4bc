use log2::warn;
use once_cell::sync::OnceCell;
use std::fmt;
use url::Url;

/// Identifier of a page within one crawl, assigned at creation.
/// The root page is always `PageId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub usize);

/// Outcome of fetching a page, written once by the fetcher
#[derive(Debug)]
enum Outcome {
    Fetched { assets: Vec<Url> },
    Failed(anyhow::Error),
}

/// A single node in the site graph.
///
/// The URL is fixed at creation. Everything else is written exactly once by
/// the task that fetches the page, so readers never need a lock.
#[derive(Debug)]
pub struct Page {
    id: PageId,
    url: Url,
    outcome: OnceCell<Outcome>,
    links: OnceCell<Vec<PageId>>,
}

impl Page {
    /// Creates an unresolved page. The fragment is stripped from a copy of `url`,
    /// the caller's value is left alone.
    pub fn new(id: PageId, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            id,
            url,
            outcome: OnceCell::new(),
            links: OnceCell::new(),
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    /// URL used to fetch the page. Redirects are not reflected here.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Error recorded by the fetcher, if the fetch failed
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self.outcome.get() {
            Some(Outcome::Failed(err)) => Some(err),
            _ => None,
        }
    }

    pub fn assets(&self) -> &[Url] {
        match self.outcome.get() {
            Some(Outcome::Fetched { assets }) => assets,
            _ => &[],
        }
    }

    /// Ids of linked pages in document order, duplicates kept
    pub fn link_ids(&self) -> &[PageId] {
        self.links.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// True once the fetcher has recorded either assets or an error
    pub fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Marks the page as successfully fetched
    pub fn set_assets(&self, assets: Vec<Url>) {
        if self.outcome.set(Outcome::Fetched { assets }).is_err() {
            warn!("Page {} already resolved, ignoring assets", self.url);
        }
    }

    /// Marks the page as failed. Failure is terminal.
    pub fn set_error(&self, err: anyhow::Error) {
        if let Err(Outcome::Failed(err)) = self.outcome.set(Outcome::Failed(err)) {
            warn!("Page {} already resolved, dropping error: {}", self.url, err);
        }
    }

    pub(crate) fn set_links(&self, links: Vec<PageId>) {
        if self.links.set(links).is_err() {
            warn!("Links of page {} already set", self.url);
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
