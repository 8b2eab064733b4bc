use anyhow::{Context, Result};
use log2::{error, info};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use sitegraph::config::Config;
use sitegraph::crawler::{Crawler, Fetcher, HttpFetcher, LoggingFetcher};

/// Indicates start time of a project, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

#[tokio::main]
async fn main() -> Result<()> {
    let _ = *START_TIME;
    let cfg = Config::new();
    cfg.validate()?;
    let _log2 = log2::stdout()
        .module(true) // include module name
        .module_with_line(true) // include line number from module
        // include only modules having this pattern
        .module_filter(|module| module.starts_with("sitegraph"))
        .level(cfg.log_level.to_string())
        .start();

    let http = HttpFetcher::new(cfg.request_timeout());
    let fetcher: Arc<dyn Fetcher> = if cfg.verbose {
        Arc::new(LoggingFetcher::new(http))
    } else {
        Arc::new(http)
    };

    let crawler = Crawler::new(cfg.max_requests, fetcher);
    info!("Using up to {} concurrent requests", crawler.max_requests());
    let result = match crawler.crawl(&cfg.root_url).await {
        Ok(result) => result,
        Err(e) => {
            error!("Crawler failed: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "Crawled {} pages in {:?}",
        result.len(),
        START_TIME.elapsed()
    );

    if let Some(writer) = cfg.writer() {
        let host = result.root().url().host_str().unwrap_or("output").to_string();
        let path = cfg.output_path(&host, writer.ext());
        if path == Path::new("-") {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            writer.write(&mut out, &result)?;
            writeln!(out)?;
        } else {
            let mut file = File::create(&path)
                .with_context(|| format!("Unable to open output file: {}", path.display()))?;
            writer
                .write(&mut file, &result)
                .with_context(|| format!("Unable to write output file: {}", path.display()))?;
            info!("Result written to {:?}", path);
        }
    }

    Ok(())
}
