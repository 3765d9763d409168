//! Player URLs derived from a video reference.

use crate::protocol::VideoRef;

pub const EMBED_BASE: &str = "https://www.youtube.com/embed/";
pub const WATCH_BASE: &str = "https://www.youtube.com/watch?v=";

/// Autoplay, muted, inline playback.  Fixed; there are no variants.
pub const EMBED_FLAGS: &str = "autoplay=1&mute=1&playsinline=1";

pub fn embed_url(video: &VideoRef) -> String {
    format!("{}{}?{}", EMBED_BASE, video.as_str(), EMBED_FLAGS)
}

/// Watch-page URL handed to mpv (its ytdl hook cannot open embed pages).
pub fn watch_url(video: &VideoRef) -> String {
    format!("{}{}", WATCH_BASE, video.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_url_carries_all_flags() {
        let url = embed_url(&VideoRef::new("vid123"));
        assert_eq!(
            url,
            "https://www.youtube.com/embed/vid123?autoplay=1&mute=1&playsinline=1"
        );
        for flag in ["autoplay=1", "mute=1", "playsinline=1"] {
            assert!(url.contains(flag), "missing {flag} in {url}");
        }
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            watch_url(&VideoRef::new("-upyPouRrB8")),
            "https://www.youtube.com/watch?v=-upyPouRrB8"
        );
    }
}
