use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingEventKind {
    /// First page view for this visitor today.
    View,
    /// Repeat page view for this visitor on the same calendar day.
    Revisit,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Mobile,
    Desktop,
}

impl Device {
    /// Classifies a `User-Agent` string. Unknown or empty agents count as
    /// desktop.
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Self {
        const MOBILE_MARKERS: [&str; 5] = ["mobi", "android", "iphone", "ipad", "ipod"];
        let lower = user_agent.to_ascii_lowercase();
        if MOBILE_MARKERS.iter().any(|m| lower.contains(m)) {
            Device::Mobile
        } else {
            Device::Desktop
        }
    }
}

/// Body of `POST /api/{mallId}/track`. Never stored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub page_id: String,
    pub page_url: String,
    pub visitor_id: String,
    #[serde(rename = "type")]
    pub kind: TrackingEventKind,
    pub device: Device,
    pub referrer: String,
    pub timestamp: DateTime<Utc>,
    /// Value of the clicked element's track marker; only set for clicks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}
