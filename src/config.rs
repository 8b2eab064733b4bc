use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::crawler::{DEFAULT_MAX_REQUESTS, PAGE_REQUEST_TIMEOUT_SEC};
use crate::output::{DotWriter, JsonWriter, ResultWriter};

/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Output formats for the crawl result
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON lookup table keyed by page URL
    Json,
    /// Graphviz DOT digraph
    Dot,
    /// No output
    Off,
}

/// Program arguments. `crawler::Crawler` only receives the crawl settings.
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about = "Crawls one host and writes its page graph", long_about = None)]
pub struct Config {
    /// URL to start crawling from
    pub root_url: String,
    /// Maximum number of simultaneous requests, 0 selects the default
    #[arg(long, default_value_t = DEFAULT_MAX_REQUESTS)]
    pub max_requests: usize,
    /// Output format
    #[arg(short, long, default_value = "json", value_enum)]
    pub format: OutputFormat,
    /// Pretty print JSON output
    #[arg(long)]
    pub pretty: bool,
    /// Output file, defaults to the crawled host name. `-` writes to stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Timeout of a single page request in seconds
    #[arg(long, default_value_t = PAGE_REQUEST_TIMEOUT_SEC)]
    pub request_timeout: u64,
    /// Log every fetched page
    #[arg(short, long)]
    pub verbose: bool,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }
        if self.root_url.trim().is_empty() {
            anyhow::bail!("root_url must not be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Writer for the selected format, `None` when output is off
    pub fn writer(&self) -> Option<Box<dyn ResultWriter>> {
        match self.format {
            OutputFormat::Json => Some(Box::new(JsonWriter {
                pretty: self.pretty,
            })),
            OutputFormat::Dot => Some(Box::new(DotWriter)),
            OutputFormat::Off => None,
        }
    }

    /// Where to write the output: the configured path, or `<host>.<ext>`
    pub fn output_path(&self, host: &str, ext: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.{}", host, ext)))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::parse_from(["sitegraph", "http://testhost.local/"]);
        assert_eq!(cfg.max_requests, DEFAULT_MAX_REQUESTS);
        assert_eq!(cfg.format, OutputFormat::Json);
        assert!(!cfg.pretty);
        assert!(cfg.validate().is_ok());
        assert_eq!(
            cfg.output_path("testhost.local", "json"),
            PathBuf::from("testhost.local.json")
        );
    }

    #[test]
    fn test_flags() {
        let cfg = Config::parse_from([
            "sitegraph",
            "--max-requests",
            "8",
            "-f",
            "dot",
            "-o",
            "-",
            "--log-level",
            "debug",
            "http://testhost.local/",
        ]);
        assert_eq!(cfg.max_requests, 8);
        assert_eq!(cfg.format, OutputFormat::Dot);
        assert_eq!(cfg.output_path("testhost.local", "dot"), PathBuf::from("-"));
        assert_eq!(cfg.log_level.to_string(), "debug");
        assert_eq!(cfg.writer().map(|w| w.ext()), Some("dot"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cfg = Config::parse_from(["sitegraph", "--request-timeout", "0", "http://h/"]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_output_off() {
        let cfg = Config::parse_from(["sitegraph", "--format", "off", "http://h/"]);
        assert!(cfg.writer().is_none());
    }
}
