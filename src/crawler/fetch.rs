use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log2::{debug, info};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use super::page::Page;

/// Default timeout for page requests in seconds
pub const PAGE_REQUEST_TIMEOUT_SEC: u64 = 10;

/// Asset selectors paired with the attribute holding the asset URL
const ASSET_SELECTORS: [(&str, &str); 3] = [
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("link[href]", "href"),
];

/// Fills out a page by some means and returns the links found on it.
///
/// On success the fetcher calls [`Page::set_assets`]; on failure it calls
/// [`Page::set_error`] and returns no links. Links do not need to be
/// restricted to the page's host, the crawler filters them.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, page: &Page) -> Vec<Url>;
}

/// Plain HTTP fetcher scraping links and assets out of the returned HTML
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(Client::new(), timeout)
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn get(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(anyhow!(
                "non 200 status code received: {}",
                response.status().as_u16()
            ));
        }

        Ok(response.text().await?)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(PAGE_REQUEST_TIMEOUT_SEC))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, page: &Page) -> Vec<Url> {
        let html = match self.get(page.url()).await {
            Ok(html) => html,
            Err(e) => {
                debug!("Failed to fetch {}: {}", page.url(), e);
                page.set_error(e);
                return Vec::new();
            }
        };

        let (links, assets) = match scrape_document(&html, page.url()) {
            Ok(found) => found,
            Err(e) => {
                page.set_error(e);
                return Vec::new();
            }
        };

        debug!(
            "Found {} links and {} assets on page {}",
            links.len(),
            assets.len(),
            page.url()
        );
        page.set_assets(assets);
        links
    }
}

/// Extracts same-host links and all assets from an HTML document.
/// Everything is resolved relative to `base`.
pub fn scrape_document(html: &str, base: &Url) -> Result<(Vec<Url>, Vec<Url>)> {
    let document = Html::parse_document(html);

    let anchors = Selector::parse("a[href]")
        .map_err(|e| anyhow!("Failed to parse <a> selector: {}", e))?;
    let links = document
        .select(&anchors)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(base, href))
        .collect();

    let mut assets = Vec::new();
    for (css, attr) in ASSET_SELECTORS {
        let selector = Selector::parse(css)
            .map_err(|e| anyhow!("Failed to parse {} selector: {}", css, e))?;
        assets.extend(
            document
                .select(&selector)
                .filter_map(|element| element.value().attr(attr))
                .filter(|src| !src.is_empty())
                .filter_map(|src| base.join(src).ok()),
        );
    }

    Ok((links, assets))
}

/// Resolves an `href` against `base`. Returns `None` for empty or broken
/// references, non-HTTP schemes and links leaving the host of `base`.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    if href.is_empty() {
        return None;
    }
    let url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if url.host_str() != base.host_str() || url.port() != base.port() {
        return None;
    }
    Some(url)
}

/// Logs every fetch before handing it to the wrapped fetcher
#[derive(Debug, Clone)]
pub struct LoggingFetcher<F> {
    inner: F,
}

impl<F: Fetcher> LoggingFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for LoggingFetcher<F> {
    async fn fetch(&self, page: &Page) -> Vec<Url> {
        info!("Fetching: {}", page.url());
        let links = self.inner.fetch(page).await;
        if let Some(err) = page.error() {
            info!("Failed: {} ({})", page.url(), err);
        }
        links
    }
}
