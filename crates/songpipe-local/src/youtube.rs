//! YouTube URL helpers (host checks, video ids, canonical watch URLs).
//!
//! Pure and bounded: nothing here performs network IO.

pub const VIDEO_ID_LEN: usize = 11;
pub const CANONICAL_WATCH_BASE: &str = "https://www.youtube.com/watch?v=";

pub fn is_youtube_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    h == "youtube.com"
        || h == "www.youtube.com"
        || h == "m.youtube.com"
        || h == "music.youtube.com"
        || h == "youtu.be"
        || h == "www.youtu.be"
}

/// Video ids are exactly 11 chars of `[A-Za-z0-9_-]`.
pub fn is_valid_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

pub fn canonical_watch_url(id: &str) -> String {
    format!("{CANONICAL_WATCH_BASE}{id}")
}

/// Extract a video id from any recognized YouTube URL shape.
pub fn youtube_video_id(u: &url::Url) -> Option<String> {
    let host = u.host_str()?;
    if !is_youtube_host(host) {
        return None;
    }

    // youtu.be/<id>
    if host.to_ascii_lowercase().ends_with("youtu.be") {
        let seg = u.path_segments()?.next()?.trim();
        return is_valid_video_id(seg).then(|| seg.to_string());
    }

    // youtube.com/watch?v=<id>
    if u.path().trim_end_matches('/') == "/watch" {
        return u
            .query_pairs()
            .find_map(|(k, v)| (k == "v").then(|| v.trim().to_string()))
            .filter(|id| is_valid_video_id(id));
    }

    // youtube.com/shorts/<id>, /embed/<id>, /live/<id>, /v/<id>
    let mut segs = u.path_segments()?;
    let a = segs.next().unwrap_or("");
    let b = segs.next().unwrap_or("").trim();
    if matches!(a, "shorts" | "embed" | "live" | "v") && is_valid_video_id(b) {
        return Some(b.to_string());
    }

    None
}

/// `youtube.com/results`: a search page, valid without a video id.
pub fn is_search_path(u: &url::Url) -> bool {
    let Some(host) = u.host_str() else {
        return false;
    };
    is_youtube_host(host)
        && !host.to_ascii_lowercase().ends_with("youtu.be")
        && u.path().trim_end_matches('/') == "/results"
}

/// If `s` is already in the canonical "watchable resource" shape, return its video id.
///
/// Canonical shape: `http(s)://[www.|m.|music.]youtube.com/watch?v=<id>` with `v` as the only
/// query parameter and no fragment.
pub fn watch_video_id(s: &str) -> Option<String> {
    let u = url::Url::parse(s.trim()).ok()?;
    if !matches!(u.scheme(), "http" | "https") || u.fragment().is_some() {
        return None;
    }
    let host = u.host_str()?;
    if !is_youtube_host(host) || host.to_ascii_lowercase().ends_with("youtu.be") {
        return None;
    }
    if u.path() != "/watch" {
        return None;
    }
    let mut pairs = u.query_pairs();
    let (k, v) = pairs.next()?;
    if k != "v" || pairs.next().is_some() || !is_valid_video_id(&v) {
        return None;
    }
    Some(v.to_string())
}

pub fn is_watch_url(s: &str) -> bool {
    watch_video_id(s).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_video_id_variants() {
        for (raw, want) in [
            ("https://m.youtube.com/watch?feature=share&v=Kp7eSUU9oy8", "Kp7eSUU9oy8"),
            ("https://youtu.be/Zi_XLOBDo_Y?si=abc", "Zi_XLOBDo_Y"),
            ("https://youtube.com/shorts/4NRXx6U8ABQ", "4NRXx6U8ABQ"),
            ("https://www.youtube.com/live/jfKfPfyJRdk", "jfKfPfyJRdk"),
            ("https://music.youtube.com/watch?list=RDAMVM&v=lY2yjAdbvdQ", "lY2yjAdbvdQ"),
        ] {
            let u = url::Url::parse(raw).unwrap();
            assert_eq!(youtube_video_id(&u).as_deref(), Some(want), "url={raw}");
        }
    }

    #[test]
    fn search_pages_are_recognized() {
        let u = url::Url::parse("https://www.youtube.com/results?search_query=lofi").unwrap();
        assert!(is_search_path(&u));
        let u = url::Url::parse("https://youtu.be/results").unwrap();
        assert!(!is_search_path(&u));
        let u = url::Url::parse("https://example.com/results").unwrap();
        assert!(!is_search_path(&u));
    }

    #[test]
    fn youtube_video_id_rejects_wrong_length_and_foreign_hosts() {
        let u = url::Url::parse("https://youtu.be/short").unwrap();
        assert_eq!(youtube_video_id(&u), None);
        let u = url::Url::parse("https://www.youtube.com/watch?v=Kp7eSUU9oy8x").unwrap();
        assert_eq!(youtube_video_id(&u), None);
        let u = url::Url::parse("https://vimeo.com/watch?v=Kp7eSUU9oy8").unwrap();
        assert_eq!(youtube_video_id(&u), None);
    }

    #[test]
    fn watch_shape_is_strict() {
        assert_eq!(
            watch_video_id("https://www.youtube.com/watch?v=aaaaaaaaaaa").as_deref(),
            Some("aaaaaaaaaaa")
        );
        assert!(is_watch_url("http://youtube.com/watch?v=a-b_c1234XY"));
        assert!(!is_watch_url("https://youtu.be/aaaaaaaaaaa"));
        assert!(!is_watch_url(
            "https://www.youtube.com/watch?v=aaaaaaaaaaa&t=10"
        ));
        assert!(!is_watch_url("https://www.youtube.com/results?search_query=x"));
        assert!(!is_watch_url("https://example.com/watch?v=aaaaaaaaaaa"));
    }

    #[test]
    fn canonical_form() {
        assert_eq!(
            canonical_watch_url("aaaaaaaaaaa"),
            "https://www.youtube.com/watch?v=aaaaaaaaaaa"
        );
        assert!(is_watch_url(&canonical_watch_url("aaaaaaaaaaa")));
    }
}
