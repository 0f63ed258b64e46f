use crate::config::ResolverConfig;
use crate::youtube;
use serde::Deserialize;
use songpipe_core::{Availability, AvailabilityCheck, Error, Result};
use std::time::{Duration, Instant};

/// Availability check through YouTube's public oEmbed endpoint.
///
/// A 200 means the video exists and is embeddable/public; 401/403/404 mean removed, private
/// or blocked. No auth, no retries: one miss is enough to fall back.
#[derive(Debug, Clone)]
pub struct OEmbedVerifier {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl OEmbedVerifier {
    pub fn new(cfg: &ResolverConfig) -> Result<Self> {
        cfg.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("songpipe-local/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(cfg.verify_timeout())
            .timeout(cfg.verify_timeout())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self::with_client(
            client,
            cfg.oembed_endpoint.trim(),
            cfg.verify_timeout(),
        ))
    }

    pub fn with_client(client: reqwest::Client, endpoint: &str, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, watch_url: &str) -> Result<reqwest::Url> {
        let mut u = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.endpoint)))?;
        u.query_pairs_mut()
            .append_pair("url", watch_url)
            .append_pair("format", "json");
        Ok(u)
    }
}

#[async_trait::async_trait]
impl AvailabilityCheck for OEmbedVerifier {
    fn name(&self) -> &'static str {
        "youtube_oembed"
    }

    async fn check(&self, url: &str) -> Availability {
        // Only the canonical watch shape is verifiable here.
        if !youtube::is_watch_url(url) {
            tracing::debug!(url, "not a canonical watch url; skipping oembed check");
            return Availability::Unavailable;
        }
        let req_url = match self.request_url(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(error = %e, "oembed endpoint unusable");
                return Availability::Unknown;
            }
        };

        let t0 = Instant::now();
        let resp = match self.client.get(req_url).timeout(self.timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    url,
                    timeout = e.is_timeout(),
                    error = %e,
                    "oembed request failed"
                );
                return Availability::Unknown;
            }
        };

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            tracing::debug!(url, status = status.as_u16(), "oembed says unavailable");
            return Availability::Unavailable;
        }

        match resp.json::<OEmbedResponse>().await {
            Ok(body) => {
                tracing::debug!(
                    url,
                    title = body.title.as_deref().unwrap_or(""),
                    author = body.author_name.as_deref().unwrap_or(""),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "oembed confirmed"
                );
                Availability::Available
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "oembed 200 with malformed body");
                Availability::Unknown
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
}
