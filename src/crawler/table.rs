use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use url::{Position, Url};

use super::page::{Page, PageId};

/// Dedup key for a link within one host: path plus query, no fragment
pub fn canonical_key(url: &Url) -> String {
    url[Position::BeforePath..Position::AfterQuery].to_string()
}

/// Host scope of a URL: host name plus explicit port, if any
fn host_scope(url: &Url) -> String {
    url[Position::BeforeHost..Position::AfterPort].to_string()
}

/// Pages for a batch of links, as returned by [`PageTable::resolve`]
#[derive(Debug, Default)]
pub struct Resolved {
    /// One id per same-host input link, in input order, duplicates kept
    pub pages: Vec<PageId>,
    /// Pages created by this call; each must be scheduled exactly once
    pub fresh: Vec<Arc<Page>>,
}

#[derive(Debug, Default)]
struct TableState {
    keys: HashMap<String, PageId>,
    pages: Vec<Arc<Page>>,
}

impl TableState {
    fn insert(&mut self, key: String, url: &Url) -> Arc<Page> {
        let id = PageId(self.pages.len());
        let page = Arc::new(Page::new(id, url));
        self.pages.push(Arc::clone(&page));
        self.keys.insert(key, id);
        page
    }
}

/// Visited-page memo for one host, keyed by canonical request identifier.
/// A page is created at most once per key.
#[derive(Debug)]
pub struct PageTable {
    host: String,
    state: Mutex<TableState>,
}

impl PageTable {
    pub fn new(root: &Url) -> Self {
        Self {
            host: host_scope(root),
            state: Mutex::new(TableState::default()),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Inserts the root page directly, it has no discovering parent.
    /// Always yields `PageId(0)` on a fresh table.
    pub fn register_root(&self, root: &Url) -> Arc<Page> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.insert(canonical_key(root), root)
    }

    /// Maps every same-host link to its single page, creating missing ones.
    /// The whole batch is resolved inside one critical section.
    pub fn resolve(&self, links: &[Url]) -> Resolved {
        let in_scope: Vec<(String, &Url)> = links
            .iter()
            .filter(|link| host_scope(link) == self.host)
            .map(|link| (canonical_key(link), link))
            .collect();

        let mut resolved = Resolved {
            pages: Vec::with_capacity(in_scope.len()),
            fresh: Vec::new(),
        };

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, link) in in_scope {
            let id = match state.keys.get(&key) {
                Some(id) => *id,
                None => {
                    let page = state.insert(key, link);
                    let id = page.id();
                    resolved.fresh.push(page);
                    id
                }
            };
            resolved.pages.push(id);
        }
        resolved
    }

    /// Number of distinct pages created so far
    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the key index and hands over every page, ordered by id
    pub fn finish(&self) -> Vec<Arc<Page>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.keys = HashMap::new();
        std::mem::take(&mut state.pages)
    }
}
