use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("verify failed: {0}")]
    Verify(String),
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// An unverified song suggestion, usually produced by a language model.
///
/// Every field is optional: upstream generators routinely omit or blank them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateReference {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub artist: Option<String>,
    #[serde(
        default,
        alias = "rawUrl",
        alias = "raw_url",
        alias = "link",
        deserialize_with = "lenient_string"
    )]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reason: Option<String>,
}

/// Strings as-is, numbers and bools stringified, anything else absent.
///
/// One mistyped field must not cost the whole record.
fn lenient_string<'de, D>(d: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

impl CandidateReference {
    pub fn new(title: &str, artist: &str, url: Option<&str>) -> Self {
        Self {
            title: Some(title.to_string()),
            artist: Some(artist.to_string()),
            url: url.map(|s| s.to_string()),
            reason: None,
        }
    }

    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn artist_str(&self) -> &str {
        self.artist.as_deref().unwrap_or("")
    }
}

/// Why a candidate ended up on the fallback search URL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No usable URL could be recovered from the candidate.
    Unrecognized,
    /// The verifier got a definitive "not there" answer.
    Unavailable,
    /// The verifier could not get an answer (transport error, timeout, bad body).
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// Canonical watch URL, confirmed reachable.
    Verified,
    /// Canonical watch URL used without a network check (verification disabled).
    Trusted,
    /// A valid non-watch URL, used as-is.
    Passthrough,
    Fallback { reason: FallbackReason },
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback { .. })
    }
}

/// A candidate after resolution. `url` is always a non-empty, parseable `http(s)` URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedReference {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub url: String,
    pub resolution: Resolution,
}

impl ResolvedReference {
    pub fn from_candidate(c: &CandidateReference, url: String, resolution: Resolution) -> Self {
        Self {
            title: c.title_str().to_string(),
            artist: c.artist_str().to_string(),
            reason: c.reason.clone(),
            url,
            resolution,
        }
    }
}

/// Outcome of a lightweight existence check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Existence check against an external service.
///
/// Implementations must not fail: every error is folded into `Unavailable` or `Unknown`.
#[async_trait::async_trait]
pub trait AvailabilityCheck: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, url: &str) -> Availability;

    async fn is_available(&self, url: &str) -> bool {
        self.check(url).await.is_available()
    }
}

/// True when `s` parses as an absolute `http`/`https` URL with a host.
pub fn is_http_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_accepts_raw_url_aliases() {
        let c: CandidateReference =
            serde_json::from_str(r#"{"title":"A","rawUrl":"https://youtu.be/x"}"#).unwrap();
        assert_eq!(c.url.as_deref(), Some("https://youtu.be/x"));
        let c: CandidateReference = serde_json::from_str(r#"{"link":"y"}"#).unwrap();
        assert_eq!(c.url.as_deref(), Some("y"));
        assert_eq!(c.title_str(), "");
    }

    #[test]
    fn candidate_fields_are_read_leniently() {
        let c: CandidateReference =
            serde_json::from_str(r#"{"title":5,"artist":true,"url":123,"reason":["x"]}"#)
                .unwrap();
        assert_eq!(c.title.as_deref(), Some("5"));
        assert_eq!(c.artist.as_deref(), Some("true"));
        assert_eq!(c.url.as_deref(), Some("123"));
        assert_eq!(c.reason, None);
        let c: CandidateReference = serde_json::from_str(r#"{"title":null,"link":{}}"#).unwrap();
        assert_eq!(c, CandidateReference::default());
    }

    #[test]
    fn resolution_serializes_tagged() {
        let r = Resolution::Fallback {
            reason: FallbackReason::Unavailable,
        };
        let v = serde_json::to_value(r).unwrap();
        assert_eq!(v["kind"], "fallback");
        assert_eq!(v["reason"], "unavailable");
        assert_eq!(serde_json::to_value(Resolution::Verified).unwrap()["kind"], "verified");
    }

    #[test]
    fn resolved_copies_metadata_through() {
        let mut c = CandidateReference::new("Song", "Band", None);
        c.reason = Some("calm".to_string());
        let r = ResolvedReference::from_candidate(
            &c,
            "https://example.com/".to_string(),
            Resolution::Passthrough,
        );
        assert_eq!(r.title, "Song");
        assert_eq!(r.artist, "Band");
        assert_eq!(r.reason.as_deref(), Some("calm"));
    }

    #[test]
    fn http_url_check() {
        assert!(is_http_url("https://www.youtube.com/watch?v=aaaaaaaaaaa"));
        assert!(is_http_url("http://127.0.0.1:8080/x"));
        assert!(!is_http_url("ftp://example.com/"));
        assert!(!is_http_url("not a url"));
        assert!(!is_http_url(""));
    }
}
