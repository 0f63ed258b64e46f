fn run(args: &[&str]) -> serde_json::Value {
    let bin = assert_cmd::cargo::cargo_bin!("songpipe");
    let out = std::process::Command::new(bin)
        .args(args)
        .env_remove("SONGPIPE_ENV_FILE")
        .env_remove("SONGPIPE_SEARCH_BASE")
        .env_remove("SONGPIPE_DEFAULT_QUERY")
        .output()
        .expect("run songpipe");
    assert!(
        out.status.success(),
        "songpipe {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("parse json")
}

#[test]
fn sanitize_collapses_aliases_offline() {
    for raw in [
        "https://youtu.be/aaaaaaaaaaa",
        "<https://www.youtube.com/shorts/aaaaaaaaaaa>",
        "\"youtube.com/watch?v=aaaaaaaaaaa&t=42\",",
    ] {
        let v = run(&["sanitize", raw]);
        assert_eq!(v["kind"].as_str(), Some("sanitize"));
        assert_eq!(v["outcome"].as_str(), Some("watch"), "raw={raw}");
        assert_eq!(
            v["url"].as_str(),
            Some("https://www.youtube.com/watch?v=aaaaaaaaaaa")
        );
    }
}

#[test]
fn sanitize_reports_unrecognized() {
    let v = run(&["sanitize", "not a url at all"]);
    assert_eq!(v["outcome"].as_str(), Some("unrecognized"));
    assert!(v["url"].is_null());
}

#[test]
fn fallback_never_degenerates() {
    let v = run(&["fallback"]);
    assert_eq!(
        v["url"].as_str(),
        Some("https://www.youtube.com/results?search_query=music")
    );
    let v = run(&["fallback", "--title", "Song B"]);
    assert_eq!(
        v["url"].as_str(),
        Some("https://www.youtube.com/results?search_query=Song%20B")
    );
}
