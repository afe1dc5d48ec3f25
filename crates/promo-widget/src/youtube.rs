//! YouTube video ID resolution and embed URL construction.

use std::sync::LazyLock;

use regex::Regex;

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid bare id regex"));

static URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:youtube(?:-nocookie)?\.com/(?:watch\?(?:[^#\s"'<>]*&(?:amp;)?)?v=|embed/|shorts/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})"#,
    )
    .expect("valid youtube url regex")
});

/// Resolves a YouTube video ID from a bare ID, a watch/short/embed/shorts
/// URL, or a raw `<iframe>` embed snippet.
///
/// Resolution is idempotent: feeding a resolved ID back in returns it.
#[must_use]
pub fn resolve_video_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if BARE_ID.is_match(raw) {
        return Some(raw.to_owned());
    }
    URL_ID
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Builds the embed URL for `video_id`.
///
/// Autoplay requires `mute=1` in modern browsers. Looping a single video
/// requires `playlist=<id>` alongside `loop=1`.
#[must_use]
pub fn embed_url(video_id: &str, autoplay: bool, looping: bool) -> String {
    let mut params: Vec<String> = vec!["playsinline=1".to_owned(), "rel=0".to_owned()];
    if autoplay {
        params.push("autoplay=1".to_owned());
        params.push("mute=1".to_owned());
    }
    if looping {
        params.push("loop=1".to_owned());
        params.push(format!("playlist={video_id}"));
    }
    format!(
        "https://www.youtube.com/embed/{video_id}?{}",
        params.join("&")
    )
}
