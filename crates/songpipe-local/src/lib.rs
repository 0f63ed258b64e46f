//! Local implementations of the songpipe pipeline: sanitizing, fallback search URLs,
//! oEmbed verification (reqwest) and batch resolution.

use songpipe_core::{CandidateReference, ResolvedReference, Result};

pub mod candidates;
pub mod config;
pub mod fallback;
pub mod oembed;
pub mod resolve;
pub mod sanitize;
pub mod youtube;

pub use candidates::parse_candidates;
pub use config::ResolverConfig;
pub use fallback::build_fallback;
pub use oembed::OEmbedVerifier;
pub use resolve::Resolver;
pub use sanitize::{sanitize, sanitize_outcome, Sanitized};

pub type LocalResolver = Resolver<OEmbedVerifier>;

/// Resolver configured from `SONGPIPE_*` env vars.
pub fn resolver_from_env() -> Result<LocalResolver> {
    Resolver::from_config(ResolverConfig::from_env())
}

/// Parse free-form model output and resolve the candidates in one go.
pub async fn resolve_text(resolver: &LocalResolver, text: &str) -> Result<Vec<ResolvedReference>> {
    let candidates: Vec<CandidateReference> = parse_candidates(text)?;
    Ok(resolver.resolve_batch(&candidates).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Router};
    use songpipe_core::{FallbackReason, Resolution};
    use std::collections::HashMap;

    #[tokio::test]
    async fn resolve_text_end_to_end_against_fixture_oembed() {
        let app = Router::new().route(
            "/oembed",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                match q.get("url").map(String::as_str) {
                    Some("https://www.youtube.com/watch?v=aaaaaaaaaaa") => {
                        (StatusCode::OK, r#"{"title":"Song A"}"#).into_response()
                    }
                    _ => (StatusCode::NOT_FOUND, "Not Found").into_response(),
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let resolver = Resolver::from_config(ResolverConfig {
            oembed_endpoint: format!("http://{addr}/oembed"),
            verify_timeout_ms: 2_000,
            ..ResolverConfig::default()
        })
        .unwrap();

        let text = r#"```json
[
  {"title":"Song A","artist":"Artist A","url":"https://youtu.be/aaaaaaaaaaa","reason":"bright"},
  {"title":"Song A","artist":"Artist A","url":"https://youtu.be/zzzzzzzzzzz"},
  {"title":"Song B","artist":"","url":""},
  {"title":"","artist":"","url":"not a url at all"}
]
```"#;
        let out = resolve_text(&resolver, text).await.unwrap();
        assert_eq!(out.len(), 4);

        assert_eq!(out[0].url, "https://www.youtube.com/watch?v=aaaaaaaaaaa");
        assert_eq!(out[0].resolution, Resolution::Verified);
        assert_eq!(out[0].reason.as_deref(), Some("bright"));

        assert_eq!(out[1].url, build_fallback("Song A", "Artist A"));
        assert_eq!(
            out[1].resolution,
            Resolution::Fallback {
                reason: FallbackReason::Unavailable
            }
        );

        assert_eq!(
            out[2].url,
            "https://www.youtube.com/results?search_query=Song%20B"
        );
        assert_eq!(
            out[3].url,
            "https://www.youtube.com/results?search_query=music"
        );
    }

    #[tokio::test]
    async fn mistyped_fields_degrade_to_the_fallback() {
        let resolver = Resolver::from_config(ResolverConfig::default()).unwrap();
        let out = resolve_text(&resolver, r#"[{"url":123,"title":"Song","artist":7}]"#)
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, build_fallback("Song", "7"));
        assert_eq!(
            out[0].resolution,
            Resolution::Fallback {
                reason: FallbackReason::Unrecognized
            }
        );
    }

    #[tokio::test]
    async fn resolve_text_propagates_parse_errors_only() {
        let resolver = Resolver::from_config(ResolverConfig::default()).unwrap();
        assert!(resolve_text(&resolver, "no songs today").await.is_err());
    }
}
