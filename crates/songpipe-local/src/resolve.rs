//! Candidate -> resolved reference orchestration.
//!
//! Sanitize, then verify canonical watch URLs, then fall back to a search URL. Every failure
//! degrades to the fallback; nothing here returns an error.

use crate::config::ResolverConfig;
use crate::fallback::build_fallback_with;
use crate::oembed::OEmbedVerifier;
use crate::sanitize::{sanitize_outcome, Sanitized};
use futures_util::StreamExt;
use songpipe_core::{
    Availability, AvailabilityCheck, CandidateReference, FallbackReason, Resolution,
    ResolvedReference, Result,
};

#[derive(Debug, Clone)]
pub struct Resolver<V> {
    verifier: V,
    cfg: ResolverConfig,
}

impl Resolver<OEmbedVerifier> {
    /// Resolver backed by the oEmbed verifier, configured from `cfg`.
    pub fn from_config(cfg: ResolverConfig) -> Result<Self> {
        let cfg = cfg.clamped();
        let verifier = OEmbedVerifier::new(&cfg)?;
        Ok(Self::new(verifier, cfg))
    }
}

impl<V: AvailabilityCheck> Resolver<V> {
    pub fn new(verifier: V, cfg: ResolverConfig) -> Self {
        Self {
            verifier,
            cfg: cfg.clamped(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.cfg
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    fn fallback_url(&self, c: &CandidateReference) -> String {
        build_fallback_with(
            &self.cfg.search_base,
            &self.cfg.default_query,
            c.title_str(),
            c.artist_str(),
        )
    }

    pub async fn resolve(&self, c: &CandidateReference) -> ResolvedReference {
        let (url, resolution) = match sanitize_outcome(c.url.as_deref()) {
            Sanitized::Unrecognized => (
                self.fallback_url(c),
                Resolution::Fallback {
                    reason: FallbackReason::Unrecognized,
                },
            ),
            Sanitized::Other { url } => (url, Resolution::Passthrough),
            Sanitized::Watch { url, .. } if !self.cfg.verify => (url, Resolution::Trusted),
            Sanitized::Watch { url, .. } => match self.verifier.check(&url).await {
                Availability::Available => (url, Resolution::Verified),
                Availability::Unavailable => (
                    self.fallback_url(c),
                    Resolution::Fallback {
                        reason: FallbackReason::Unavailable,
                    },
                ),
                Availability::Unknown => (
                    self.fallback_url(c),
                    Resolution::Fallback {
                        reason: FallbackReason::Unknown,
                    },
                ),
            },
        };
        tracing::debug!(
            title = c.title_str(),
            verifier = self.verifier.name(),
            ?resolution,
            url = url.as_str(),
            "resolved candidate"
        );
        ResolvedReference::from_candidate(c, url, resolution)
    }

    /// Resolve up to `max_batch` candidates. Output order always matches input order.
    pub async fn resolve_batch(&self, candidates: &[CandidateReference]) -> Vec<ResolvedReference> {
        let cap = self.cfg.max_batch;
        if candidates.len() > cap {
            tracing::debug!(
                given = candidates.len(),
                cap,
                "dropping candidates beyond batch cap"
            );
        }
        futures_util::stream::iter(candidates.iter().take(cap))
            .map(|c| self.resolve(c))
            .buffered(self.cfg.concurrency)
            .collect()
            .await
    }
}
