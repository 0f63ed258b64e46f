//! Untrusted text -> canonical URL normalization.
//!
//! Input is whatever a language model put in its `url` field: wrapped in quotes or angle
//! brackets, split across lines, followed by punctuation, percent-encoded twice, or not a
//! URL at all. Output is either a parseable `http(s)` URL or `Unrecognized`.
//!
//! Everything here is pure and must never panic.

use crate::youtube;
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

const WRAP_CHARS: &[char] = &['<', '>', '"', '\'', '`'];
const TRAILING_PUNCT: &[char] = &[')', ']', '}', '>', ',', ';', ':', '!', '?'];

/// Escapes of these bytes are kept as-is when decoding so that re-encoding cannot change
/// the URL's structure (or double-encode a literal `%`).
const URI_PRESERVED_ESCAPES: &[u8] = b";/?:@&=+$,#%";

/// Escaped on encode: everything except alphanumerics, unreserved and reserved URI
/// characters, and `%` (only preserved escapes remain after decoding).
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'#')
    .remove(b'%');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sanitized {
    /// Canonical watch URL for a YouTube video id.
    Watch { url: String, video_id: String },
    /// Some other valid `http(s)` URL.
    Other { url: String },
    Unrecognized,
}

impl Sanitized {
    pub fn url(&self) -> Option<&str> {
        match self {
            Sanitized::Watch { url, .. } | Sanitized::Other { url } => Some(url.as_str()),
            Sanitized::Unrecognized => None,
        }
    }

    pub fn into_url(self) -> Option<String> {
        match self {
            Sanitized::Watch { url, .. } | Sanitized::Other { url } => Some(url),
            Sanitized::Unrecognized => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("truncated percent escape at byte {0}")]
    TruncatedEscape(usize),
    #[error("invalid percent escape at byte {0}")]
    InvalidEscape(usize),
    #[error("decoded bytes are not valid utf-8")]
    InvalidUtf8,
}

/// One aliasing scheme for YouTube video ids. The first capture group is the id.
pub struct Alias {
    pub name: &'static str,
    pub pattern: Regex,
}

impl Alias {
    fn canonicalize(&self, s: &str) -> Option<String> {
        let id = self.pattern.captures(s)?.get(1)?.as_str();
        youtube::is_valid_video_id(id).then(|| youtube::canonical_watch_url(id))
    }
}

// Each pattern requires a non-host char (or start) before the host and a non-id char (or end)
// after the 11-char id, so `notyoutube.com` and 12-char ids never match.
pub static ALIASES: Lazy<Vec<Alias>> = Lazy::new(|| {
    vec![
        Alias {
            name: "short_link",
            pattern: Regex::new(
                r"(?i)(?:^|[^a-z0-9.-])(?:https?://)?(?:www\.)?youtu\.be/([a-z0-9_-]{11})(?:[^a-z0-9_-]|$)",
            )
            .unwrap(),
        },
        Alias {
            name: "alternate_path",
            pattern: Regex::new(
                r"(?i)(?:^|[^a-z0-9.-])(?:https?://)?(?:(?:www|m|music)\.)?youtube\.com/(?:shorts|embed|live|v)/([a-z0-9_-]{11})(?:[^a-z0-9_-]|$)",
            )
            .unwrap(),
        },
        Alias {
            name: "query_param",
            pattern: Regex::new(
                r"(?i)(?:^|[^a-z0-9.-])(?:https?://)?(?:(?:www|m|music)\.)?youtube\.com/watch/?\?(?:[^#\s]*&)?v=([a-z0-9_-]{11})(?:[^a-z0-9_-]|$)",
            )
            .unwrap(),
        },
    ]
});

static BARE_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:(?:www|m|music)\.)?(?:youtube\.com|youtu\.be)|www\.[a-z0-9-]+(?:\.[a-z0-9-]+)+)(?:[/?#:]|$)",
    )
    .unwrap()
});

/// Rewrite `s` through the first matching alias, if any.
pub fn canonicalize_alias(s: &str) -> Option<String> {
    ALIASES.iter().find_map(|a| a.canonicalize(s))
}

fn strip_wrapping(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || WRAP_CHARS.contains(&c))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip one pair of parentheses if it encloses the whole string.
fn strip_enclosing_parens(s: &str) -> &str {
    let Some(inner) = s.strip_prefix('(').and_then(|x| x.strip_suffix(')')) else {
        return s;
    };
    // "(a) (b)" is not enclosed: the first '(' closes before the end.
    let mut depth = 0usize;
    for ch in inner.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return s;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    inner.trim()
}

/// Peel wrapping chars, enclosing parens and trailing punctuation until nothing changes.
fn strip_edges(mut s: &str) -> &str {
    loop {
        let mut next = strip_wrapping(strip_enclosing_parens(strip_wrapping(s)));
        next = strip_wrapping(next.trim_end_matches(TRAILING_PUNCT));
        // "(https://a/b);" loses its ')' above; drop the orphaned '(' too.
        if !next.contains(')') {
            if let Some(rest) = next.strip_prefix('(') {
                next = rest.trim_start();
            }
        }
        if next.len() == s.len() {
            return s;
        }
        s = next;
    }
}

fn has_http_scheme(s: &str) -> bool {
    let lc = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lc.starts_with("http://") || lc.starts_with("https://")
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode percent escapes, except those of reserved characters (and `%` itself).
pub fn decode_uri(s: &str) -> Result<String, EncodingError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let hex = bytes
            .get(i + 1..i + 3)
            .ok_or(EncodingError::TruncatedEscape(i))?;
        let v = match (hex_val(hex[0]), hex_val(hex[1])) {
            (Some(hi), Some(lo)) => hi * 16 + lo,
            _ => return Err(EncodingError::InvalidEscape(i)),
        };
        if URI_PRESERVED_ESCAPES.contains(&v) {
            out.extend_from_slice(&bytes[i..i + 3]);
        } else {
            out.push(v);
        }
        i += 3;
    }
    String::from_utf8(out).map_err(|_| EncodingError::InvalidUtf8)
}

pub fn encode_uri(s: &str) -> String {
    utf8_percent_encode(s, URI_ENCODE_SET).to_string()
}

/// Decode-then-encode so escaping is normalized without double-encoding.
///
/// On a malformed escape only literal spaces are escaped.
pub fn reencode(s: &str) -> String {
    match decode_uri(s) {
        Ok(decoded) => encode_uri(&decoded),
        Err(e) => {
            tracing::debug!(error = %e, "percent re-encoding failed; escaping spaces only");
            s.replace(' ', "%20")
        }
    }
}

/// Normalize untrusted text into a canonical URL (see [`sanitize_outcome`]).
pub fn sanitize(raw: Option<&str>) -> Option<String> {
    sanitize_outcome(raw).into_url()
}

pub fn sanitize_outcome(raw: Option<&str>) -> Sanitized {
    let Some(raw) = raw else {
        return Sanitized::Unrecognized;
    };

    let s = collapse_whitespace(strip_wrapping(raw));
    let s = strip_edges(&s);
    if s.is_empty() {
        return Sanitized::Unrecognized;
    }

    if let Some(canonical) = canonicalize_alias(s) {
        return classify(&canonical);
    }

    let s = if !has_http_scheme(s) && BARE_DOMAIN.is_match(s) {
        format!("https://{s}")
    } else {
        s.to_string()
    };
    if !has_http_scheme(&s) {
        return Sanitized::Unrecognized;
    }

    classify(&reencode(&s))
}

fn classify(s: &str) -> Sanitized {
    let Ok(u) = url::Url::parse(s) else {
        return Sanitized::Unrecognized;
    };
    if !matches!(u.scheme(), "http" | "https") || u.host_str().map_or(true, str::is_empty) {
        return Sanitized::Unrecognized;
    }
    // Aliases the regex table doesn't cover (e.g. `/watch?feature=share&v=` on `m.`) still
    // collapse once parsed.
    if let Some(video_id) = youtube::youtube_video_id(&u) {
        return Sanitized::Watch {
            url: youtube::canonical_watch_url(&video_id),
            video_id,
        };
    }
    // A YouTube link without a usable video id is a dead end (`watch?v=hallucinated`,
    // `youtu.be/abc`). Only search pages are kept.
    if u.host_str().is_some_and(youtube::is_youtube_host) && !youtube::is_search_path(&u) {
        return Sanitized::Unrecognized;
    }
    Sanitized::Other { url: u.to_string() }
}
