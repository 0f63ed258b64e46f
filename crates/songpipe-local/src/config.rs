//! Resolver configuration (defaults + `SONGPIPE_*` env overlay).

use crate::fallback::{DEFAULT_QUERY, DEFAULT_SEARCH_BASE};
use serde::{Deserialize, Serialize};
use songpipe_core::{is_http_url, Error, Result};
use std::time::Duration;

pub const DEFAULT_OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_BATCH: usize = 5;
pub const DEFAULT_CONCURRENCY: usize = 1;

const MAX_BATCH_LIMIT: usize = 50;
const CONCURRENCY_LIMIT: usize = 16;
const TIMEOUT_MIN_MS: u64 = 100;
const TIMEOUT_MAX_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolverConfig {
    /// oEmbed endpoint used for availability checks.
    pub oembed_endpoint: String,
    /// Search endpoint the fallback query is appended to.
    pub search_base: String,
    /// Search term used when title and artist are both empty.
    pub default_query: String,
    pub verify_timeout_ms: u64,
    /// Candidates beyond this many are dropped.
    pub max_batch: usize,
    /// Verifications in flight at once (1 = sequential).
    pub concurrency: usize,
    /// When false, canonical watch URLs are trusted without a network call.
    pub verify: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            oembed_endpoint: DEFAULT_OEMBED_ENDPOINT.to_string(),
            search_base: DEFAULT_SEARCH_BASE.to_string(),
            default_query: DEFAULT_QUERY.to_string(),
            verify_timeout_ms: DEFAULT_VERIFY_TIMEOUT_MS,
            max_batch: DEFAULT_MAX_BATCH,
            concurrency: DEFAULT_CONCURRENCY,
            verify: true,
        }
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env(key).and_then(|s| s.parse::<T>().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    match env(key)?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ResolverConfig {
    /// Defaults overlaid with `SONGPIPE_*` env vars. Empty or unparseable values are ignored.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            oembed_endpoint: env("SONGPIPE_OEMBED_ENDPOINT").unwrap_or(d.oembed_endpoint),
            search_base: env("SONGPIPE_SEARCH_BASE").unwrap_or(d.search_base),
            default_query: env("SONGPIPE_DEFAULT_QUERY").unwrap_or(d.default_query),
            verify_timeout_ms: env_parse("SONGPIPE_VERIFY_TIMEOUT_MS")
                .unwrap_or(d.verify_timeout_ms),
            max_batch: env_parse("SONGPIPE_MAX_BATCH").unwrap_or(d.max_batch),
            concurrency: env_parse("SONGPIPE_CONCURRENCY").unwrap_or(d.concurrency),
            verify: env_bool("SONGPIPE_VERIFY").unwrap_or(d.verify),
        }
        .clamped()
    }

    /// Clamp numeric knobs into their supported ranges.
    pub fn clamped(mut self) -> Self {
        self.max_batch = self.max_batch.clamp(1, MAX_BATCH_LIMIT);
        self.concurrency = self.concurrency.clamp(1, CONCURRENCY_LIMIT);
        self.verify_timeout_ms = self.verify_timeout_ms.clamp(TIMEOUT_MIN_MS, TIMEOUT_MAX_MS);
        self
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_http_url(self.oembed_endpoint.trim()) {
            return Err(Error::Config(format!(
                "oembed_endpoint is not an http(s) url: {}",
                self.oembed_endpoint
            )));
        }
        if !is_http_url(self.search_base.trim()) {
            return Err(Error::Config(format!(
                "search_base is not an http(s) url: {}",
                self.search_base
            )));
        }
        Ok(())
    }
}
