//! Page-view and click tracking.
//!
//! The visitor ID lives in persistent storage under
//! `widget_visitor_<pageId>`. Whether a page view is a first `view` or a
//! `revisit` is decided once per (page, visitor, calendar day) through a
//! marker in session storage. Events are posted from spawned tasks and
//! never retried; failures only reach the debug log.

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use promo_client::MallClient;
use promo_core::{Device, TrackingEvent, TrackingEventKind, WidgetConfig};
use tokio::task::JoinHandle;

use crate::storage::{Storage, StorageError};

#[must_use]
pub fn visitor_key(page_id: &str) -> String {
    format!("widget_visitor_{page_id}")
}

fn visit_marker_prefix(page_id: &str, visitor_id: &str) -> String {
    format!("widget_visited_{page_id}_{visitor_id}_")
}

/// `widget_visited_<pageId>_<visitorId>_<YYYY-MM-DD>`.
#[must_use]
pub fn visit_marker_key(page_id: &str, visitor_id: &str, day: NaiveDate) -> String {
    format!(
        "{}{}",
        visit_marker_prefix(page_id, visitor_id),
        day.format("%Y-%m-%d")
    )
}

fn is_visit_marker(key: &str, prefix: &str) -> bool {
    key.strip_prefix(prefix)
        .is_some_and(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").is_ok())
}

/// Forgets the visitor: removes the stored visitor ID of `page_id` and the
/// visit markers recorded under that ID.
///
/// # Errors
///
/// The first [`StorageError`] from either backend.
pub fn clear_visitor(
    storage: &dyn Storage,
    session: &dyn Storage,
    page_id: &str,
) -> Result<(), StorageError> {
    let key = visitor_key(page_id);
    let removed = match storage.get(&key)? {
        Some(visitor_id) if !visitor_id.trim().is_empty() => {
            let prefix = visit_marker_prefix(page_id, &visitor_id);
            session.remove_matching(&|k| is_visit_marker(k, &prefix))?
        }
        _ => 0,
    };
    storage.remove(&key)?;
    tracing::debug!(page_id, removed, "cleared visitor state");
    Ok(())
}

/// Reuses the stored visitor ID or generates and persists a new one. A
/// failed read or write still yields an ID for this page load.
fn resolve_visitor_id(storage: &dyn Storage, page_id: &str) -> String {
    let key = visitor_key(page_id);
    match storage.get(&key) {
        Ok(Some(id)) if !id.trim().is_empty() => return id,
        Ok(_) => {}
        Err(e) => tracing::debug!(key = %key, error = %e, "visitor id read failed"),
    }

    let id = uuid::Uuid::new_v4().to_string();
    if let Err(e) = storage.set(&key, &id) {
        tracing::debug!(key = %key, error = %e, "visitor id write failed");
    }
    id
}

pub struct TrackingReporter {
    client: MallClient,
    session: Arc<dyn Storage>,
    page_id: String,
    page_url: String,
    referrer: String,
    device: Device,
    visitor_id: String,
}

impl std::fmt::Debug for TrackingReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingReporter")
            .field("page_id", &self.page_id)
            .field("visitor_id", &self.visitor_id)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl TrackingReporter {
    /// Resolves the visitor ID for `config.page_id` from `storage`.
    #[must_use]
    pub fn new(
        client: MallClient,
        config: &WidgetConfig,
        storage: &dyn Storage,
        session: Arc<dyn Storage>,
    ) -> Self {
        Self {
            client,
            session,
            visitor_id: resolve_visitor_id(storage, &config.page_id),
            page_id: config.page_id.clone(),
            page_url: config.page_url.clone(),
            referrer: config.referrer.clone(),
            device: Device::from_user_agent(&config.user_agent),
        }
    }

    #[must_use]
    pub fn visitor_id(&self) -> &str {
        &self.visitor_id
    }

    /// Classifies a page view on `day` and records the visit marker.
    ///
    /// The first call for a given day returns `View`; later calls return
    /// `Revisit`. If the session marker cannot be read the view counts as
    /// a first view.
    pub fn page_view_kind(&self, day: NaiveDate) -> TrackingEventKind {
        let key = visit_marker_key(&self.page_id, &self.visitor_id, day);
        match self.session.get(&key) {
            Ok(Some(_)) => TrackingEventKind::Revisit,
            Ok(None) | Err(_) => {
                if let Err(e) = self.session.set(&key, "1") {
                    tracing::debug!(key = %key, error = %e, "visit marker write failed");
                }
                TrackingEventKind::View
            }
        }
    }

    #[must_use]
    pub fn event(&self, kind: TrackingEventKind, element: Option<String>) -> TrackingEvent {
        TrackingEvent {
            page_id: self.page_id.clone(),
            page_url: self.page_url.clone(),
            visitor_id: self.visitor_id.clone(),
            kind,
            device: self.device,
            referrer: self.referrer.clone(),
            timestamp: Utc::now(),
            element,
        }
    }

    /// Sends the page-view event for today in the local calendar.
    pub fn track_page_view(&self) -> JoinHandle<()> {
        self.track_page_view_on(Local::now().date_naive())
    }

    pub fn track_page_view_on(&self, day: NaiveDate) -> JoinHandle<()> {
        let kind = self.page_view_kind(day);
        self.send(self.event(kind, None))
    }

    /// Sends a click event carrying the element's track marker.
    pub fn track_click(&self, marker: &str) -> JoinHandle<()> {
        self.send(self.event(TrackingEventKind::Click, Some(marker.to_owned())))
    }

    fn send(&self, event: TrackingEvent) -> JoinHandle<()> {
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.post_tracking_event(&event).await {
                tracing::debug!(kind = ?event.kind, error = %e, "tracking event dropped");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn config() -> WidgetConfig {
        let attrs = [
            ("data-page-id", "summer"),
            ("data-mall-id", "shop"),
            ("data-api-base", "http://127.0.0.1:9"),
            ("data-user-agent", "Mozilla/5.0 (iPhone)"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        WidgetConfig::from_attributes(&attrs).unwrap()
    }

    fn reporter(storage: &MemoryStorage, session: Arc<MemoryStorage>) -> TrackingReporter {
        let client = MallClient::new("http://127.0.0.1:9/api/shop", 1, "test", 0, 1).unwrap();
        TrackingReporter::new(client, &config(), storage, session)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn marker_key_format() {
        assert_eq!(
            visit_marker_key("summer", "v1", day(18)),
            "widget_visited_summer_v1_2026-10-18"
        );
    }

    #[test]
    fn visitor_id_is_generated_once_and_reused() {
        let storage = MemoryStorage::new();
        let session = Arc::new(MemoryStorage::new());
        let first = reporter(&storage, Arc::clone(&session));
        assert!(uuid::Uuid::parse_str(first.visitor_id()).is_ok());

        let second = reporter(&storage, session);
        assert_eq!(first.visitor_id(), second.visitor_id());
    }

    #[test]
    fn first_view_then_revisit_per_day() {
        let storage = MemoryStorage::new();
        let session = Arc::new(MemoryStorage::new());
        let tracker = reporter(&storage, session);

        assert_eq!(tracker.page_view_kind(day(18)), TrackingEventKind::View);
        assert_eq!(tracker.page_view_kind(day(18)), TrackingEventKind::Revisit);
        assert_eq!(tracker.page_view_kind(day(19)), TrackingEventKind::View);
    }

    #[test]
    fn clear_visitor_forgets_id_and_markers() {
        let storage = MemoryStorage::new();
        let session = Arc::new(MemoryStorage::new());
        let tracker = reporter(&storage, Arc::clone(&session));
        tracker.page_view_kind(day(18));
        session.set("widget_visited_other_v_2026-10-18", "1").unwrap();

        clear_visitor(&storage, &*session, "summer").unwrap();

        assert!(storage.get(&visitor_key("summer")).unwrap().is_none());
        assert_eq!(
            session.keys().unwrap(),
            vec!["widget_visited_other_v_2026-10-18".to_owned()]
        );
        let fresh = reporter(&storage, session);
        assert_ne!(fresh.visitor_id(), tracker.visitor_id());
    }

    #[test]
    fn clear_visitor_leaves_neighbouring_page_markers() {
        let storage = MemoryStorage::new();
        let session = Arc::new(MemoryStorage::new());
        let tracker = reporter(&storage, Arc::clone(&session));
        tracker.page_view_kind(day(18));
        storage.set(&visitor_key("summer_2"), "v1").unwrap();
        let neighbour = visit_marker_key("summer_2", "v1", day(18));
        session.set(&neighbour, "1").unwrap();

        clear_visitor(&storage, &*session, "summer").unwrap();

        assert_eq!(session.keys().unwrap(), vec![neighbour]);
        assert_eq!(
            storage.get(&visitor_key("summer_2")).unwrap().as_deref(),
            Some("v1")
        );
    }

    #[test]
    fn click_event_carries_marker_and_device() {
        let storage = MemoryStorage::new();
        let tracker = reporter(&storage, Arc::new(MemoryStorage::new()));
        let event = tracker.event(TrackingEventKind::Click, Some("hero-banner".to_owned()));
        assert_eq!(event.kind, TrackingEventKind::Click);
        assert_eq!(event.element.as_deref(), Some("hero-banner"));
        assert_eq!(event.device, Device::Mobile);
        assert_eq!(event.page_id, "summer");
    }

    #[tokio::test]
    async fn failed_delivery_is_swallowed() {
        let storage = MemoryStorage::new();
        let tracker = reporter(&storage, Arc::new(MemoryStorage::new()));
        // Nothing listens on port 9; the task must still complete cleanly.
        tracker.track_click("x").await.unwrap();
    }
}
