//! Content block definitions served by `GET /api/{mallId}/events/{pageId}`.
//!
//! ## Observed shape
//!
//! ```json
//! { "content_blocks": [
//!     { "type": "text", "text": "Summer sale\nup to 50%", "style": { "align": "center", "fontSize": 24 } },
//!     { "type": "image", "src": "https://cdn.example.com/banner.jpg",
//!       "regions": [ { "x": 0.1, "y": 0.6, "w": 0.3, "h": 0.1, "coupon": "6001,6002" } ] },
//!     { "type": "video", "youtubeId": "dQw4w9WgXcQ", "ratio": "16:9", "autoplay": true }
//! ] }
//! ```
//!
//! Blocks are rebuilt from server data on every page load and never persisted.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// One renderable unit of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        #[serde(default, deserialize_with = "lenient::string_or_empty")]
        text: String,
        #[serde(default)]
        style: TextStyle,
    },
    Image {
        #[serde(default, deserialize_with = "lenient::string_or_empty")]
        src: String,
        #[serde(default)]
        regions: Vec<Hotspot>,
    },
    Video(VideoBlock),
    /// Block types this runtime does not know how to draw.
    #[serde(other)]
    Unknown,
}

/// Presentation options for a text block. Every field is optional; the
/// renderer supplies defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub align: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub margin_top: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub margin_bottom: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub font_size: Option<String>,
    /// `"bold"`, `"normal"`, or a numeric weight such as `700`.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub font_weight: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub color: Option<String>,
}

/// A clickable overlay on an image block.
///
/// Coordinates are fractions of the rendered image box, so `x = 0.5` means
/// "starts halfway across".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    #[serde(default, deserialize_with = "lenient::fraction")]
    pub x: f64,
    #[serde(default, deserialize_with = "lenient::fraction")]
    pub y: f64,
    #[serde(default, deserialize_with = "lenient::fraction")]
    pub w: f64,
    #[serde(default, deserialize_with = "lenient::fraction")]
    pub h: f64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub href: Option<String>,
    /// Comma-separated coupon numbers issued when the region is clicked.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub coupon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoBlock {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub youtube_id: Option<String>,
    /// Raw URL or embed snippet, used when `youtube_id` is absent.
    #[serde(default, alias = "url", deserialize_with = "lenient::opt_string")]
    pub src: Option<String>,
    /// Aspect ratio as `"W:H"` or `"W/H"`. Defaults to 16:9.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub ratio: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub autoplay: bool,
    #[serde(default, rename = "loop", deserialize_with = "lenient::flag")]
    pub looping: bool,
}

impl VideoBlock {
    /// Parses [`Self::ratio`] into `(width, height)`, falling back to 16:9
    /// when absent or malformed.
    #[must_use]
    pub fn aspect_ratio(&self) -> (f64, f64) {
        const DEFAULT: (f64, f64) = (16.0, 9.0);

        let Some(raw) = self.ratio.as_deref() else {
            return DEFAULT;
        };
        let mut parts = raw.split([':', '/', 'x']);
        let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
            return DEFAULT;
        };
        match (w.trim().parse::<f64>(), h.trim().parse::<f64>()) {
            (Ok(w), Ok(h)) if w > 0.0 && h > 0.0 => (w, h),
            _ => DEFAULT,
        }
    }
}
