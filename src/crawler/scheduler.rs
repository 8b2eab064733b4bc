use anyhow::anyhow;
use log2::{debug, trace, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

use super::fetch::Fetcher;
use super::page::Page;
use super::table::PageTable;

/// Count of scheduled but unfinished fetch tasks
#[derive(Debug, Default)]
struct Outstanding {
    count: AtomicUsize,
    done: Notify,
}

impl Outstanding {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.done.notify_one();
        }
    }

    async fn wait(&self) {
        while self.count.load(Ordering::SeqCst) != 0 {
            self.done.notified().await;
        }
    }
}

/// Marks a fetch task finished when dropped, also when the fetcher panics.
/// A page the fetcher left unresolved is failed so its outcome is terminal.
struct Finished<'a> {
    outstanding: &'a Outstanding,
    page: &'a Page,
}

impl Drop for Finished<'_> {
    fn drop(&mut self) {
        if !self.page.is_resolved() {
            warn!("Fetch of {} did not complete", self.page.url());
            self.page.set_error(anyhow!("fetch did not complete"));
        }
        self.outstanding.finish();
    }
}

/// Bounded-concurrency traversal of one host
pub struct Scheduler {
    permits: Arc<Semaphore>,
    outstanding: Outstanding,
    fetcher: Arc<dyn Fetcher>,
    table: PageTable,
}

impl Scheduler {
    pub fn new(max_requests: usize, fetcher: Arc<dyn Fetcher>, table: PageTable) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_requests)),
            outstanding: Outstanding::default(),
            fetcher,
            table,
        }
    }

    pub fn table(&self) -> &PageTable {
        &self.table
    }

    /// Schedules a fetch of `page`. Suspends the caller while all request
    /// slots are taken.
    pub async fn schedule(self: &Arc<Self>, page: Arc<Page>) {
        // counted before the slot is taken so `wait` can not see zero early
        self.outstanding.add();
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // the semaphore is never closed
                self.outstanding.finish();
                return;
            }
        };
        self.spawn_fetch(page, permit);
    }

    /// Resolves once every scheduled page, and every page found from it, is done
    pub async fn wait(&self) {
        self.outstanding.wait().await;
    }

    fn spawn_fetch(self: &Arc<Self>, page: Arc<Page>, permit: OwnedSemaphorePermit) {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let _finished = Finished {
                outstanding: &scheduler.outstanding,
                page: &page,
            };
            trace!("Fetching {}", page.url());
            let links = scheduler.fetcher.fetch(&page).await;
            drop(permit);

            if !links.is_empty() {
                let resolved = scheduler.table.resolve(&links);
                debug!(
                    "{}: {} links, {} new pages",
                    page.url(),
                    resolved.pages.len(),
                    resolved.fresh.len()
                );
                page.set_links(resolved.pages);
                for fresh in resolved.fresh {
                    scheduler.schedule(fresh).await;
                }
            }
        });
    }
}
