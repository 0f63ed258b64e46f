//! Search-URL fallback built from free-text title/artist metadata.
//!
//! Total: every input (including empty strings) yields a parseable `https` URL with a
//! non-empty query.

use songpipe_core::is_http_url;

pub const DEFAULT_SEARCH_BASE: &str = "https://www.youtube.com/results";
pub const SEARCH_QUERY_PARAM: &str = "search_query";
pub const DEFAULT_QUERY: &str = "music";

/// Join title and artist into a single-line search query.
///
/// CR/LF become spaces, quote chars are dropped, backslash/pipe runs become a single space,
/// whitespace is collapsed.
pub fn clean_query(title: &str, artist: &str) -> String {
    let joined = format!("{title} {artist}");
    let mut out = String::with_capacity(joined.len());
    for ch in joined.chars() {
        match ch {
            '\r' | '\n' | '\\' | '|' => out.push(' '),
            '"' | '\'' | '`' => {}
            c => out.push(c),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn build_fallback(title: &str, artist: &str) -> String {
    build_fallback_with(DEFAULT_SEARCH_BASE, DEFAULT_QUERY, title, artist)
}

/// Like [`build_fallback`], with a configurable search endpoint and default term.
///
/// An unusable `base` (not an absolute http(s) URL) is replaced by [`DEFAULT_SEARCH_BASE`];
/// an empty `default_query` by [`DEFAULT_QUERY`].
pub fn build_fallback_with(base: &str, default_query: &str, title: &str, artist: &str) -> String {
    let mut q = clean_query(title, artist);
    if q.is_empty() {
        q = clean_query(default_query, "");
    }
    if q.is_empty() {
        q = DEFAULT_QUERY.to_string();
    }

    let base = base.trim();
    let base = if is_http_url(base) {
        base.trim_end_matches(['?', '&'])
    } else {
        DEFAULT_SEARCH_BASE
    };
    let sep = if base.contains('?') { '&' } else { '?' };
    format!(
        "{base}{sep}{SEARCH_QUERY_PARAM}={}",
        urlencoding::encode(&q)
    )
}
