//! Tab navigation controller.
//!
//! Tab panels are identified as `tab-<n>`. Any clicked control whose href
//! (or `data-tab-link`) matches the tab-reference pattern is routed here:
//! the other panels are hidden, the control is marked active, the target
//! panel is shown, and a scroll target is produced once the panel exists.
//!
//! Panels may be registered after the click (grids render asynchronously),
//! so [`TabController::show_tab`] waits on a registration notification for
//! at most [`MAX_WAIT_ATTEMPTS`] × [`WAIT_INTERVAL`] before giving up.

use std::collections::BTreeSet;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Duration;

use regex::Regex;
use tokio::sync::Notify;

use crate::node::Element;

/// Pixels left between the viewport top and the panel after scrolling, to
/// clear the host page's sticky header.
pub const SCROLL_OFFSET_PX: u32 = 80;
pub const MAX_WAIT_ATTEMPTS: u32 = 20;
pub const WAIT_INTERVAL: Duration = Duration::from_millis(100);

static TAB_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#?tab[:\-\s]?(\d+)$").expect("valid tab reference regex"));

/// Extracts the tab number from `tab-3`, `tab:3`, `tab 3`, `tab3` or `#tab-3`.
#[must_use]
pub fn parse_tab_reference(href: &str) -> Option<u32> {
    TAB_REFERENCE
        .captures(href.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[must_use]
pub fn panel_id(tab: u32) -> String {
    format!("tab-{tab}")
}

/// Where the host page should scroll after a tab switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollTarget {
    pub panel_id: String,
    pub offset_px: u32,
}

#[derive(Debug, Default)]
struct TabState {
    panels: BTreeSet<String>,
    active_panel: Option<String>,
    active_control: Option<String>,
}

#[derive(Debug)]
pub struct TabController {
    active_color: String,
    state: Mutex<TabState>,
    registered: Notify,
}

impl TabController {
    #[must_use]
    pub fn new(active_color: &str) -> Self {
        Self {
            active_color: active_color.to_owned(),
            state: Mutex::new(TabState::default()),
            registered: Notify::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TabState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records that `panel_id` now exists in the rendered page.
    pub fn register_panel(&self, panel_id: &str) {
        self.lock().panels.insert(panel_id.to_owned());
        self.registered.notify_waiters();
    }

    /// Makes `panel_id` the visible panel without scrolling. Used for the
    /// initial state.
    pub fn activate(&self, panel_id: &str) {
        self.lock().active_panel = Some(panel_id.to_owned());
    }

    /// A panel is visible only while it is the active one.
    #[must_use]
    pub fn is_visible(&self, panel_id: &str) -> bool {
        self.lock().active_panel.as_deref() == Some(panel_id)
    }

    #[must_use]
    pub fn active_control(&self) -> Option<String> {
        self.lock().active_control.clone()
    }

    #[must_use]
    pub fn active_color(&self) -> &str {
        &self.active_color
    }

    fn has_panel(&self, panel_id: &str) -> bool {
        self.lock().panels.contains(panel_id)
    }

    /// Switches to `panel_id`, marking `control` (the clicked element's id)
    /// as active, then waits for the panel to exist and returns where to
    /// scroll. Returns `None` if the panel never shows up.
    pub async fn show_tab(&self, panel_id: &str, control: Option<&str>) -> Option<ScrollTarget> {
        {
            let mut state = self.lock();
            state.active_panel = Some(panel_id.to_owned());
            state.active_control = control.map(str::to_owned);
        }

        for _ in 0..MAX_WAIT_ATTEMPTS {
            let registered = self.registered.notified();
            if self.has_panel(panel_id) {
                return Some(ScrollTarget {
                    panel_id: panel_id.to_owned(),
                    offset_px: SCROLL_OFFSET_PX,
                });
            }
            let _ = tokio::time::timeout(WAIT_INTERVAL, registered).await;
        }

        if self.has_panel(panel_id) {
            return Some(ScrollTarget {
                panel_id: panel_id.to_owned(),
                offset_px: SCROLL_OFFSET_PX,
            });
        }

        tracing::warn!(panel_id, "tab panel never appeared; not scrolling");
        None
    }

    /// Renders the tab bar for `tab_count` tabs. The active tab's control
    /// uses the configured active color.
    #[must_use]
    pub fn render_nav(&self, tab_count: u32) -> Element {
        let state = self.lock();
        let mut nav = Element::new("nav").attr("class", "promo-tabs");
        for tab in 1..=tab_count {
            let panel = panel_id(tab);
            let control_id = format!("{panel}-control");
            let active = state.active_panel.as_deref() == Some(panel.as_str());
            let mut link = Element::new("a")
                .attr("id", control_id)
                .attr("href", format!("#{panel}"))
                .attr("data-tab-link", panel.clone())
                .text(format!("Tab {tab}"));
            if active {
                link.set_attr("class", "promo-tab active");
                link.set_attr(
                    "style",
                    format!("color:{};border-bottom:2px solid {};", self.active_color, self.active_color),
                );
            } else {
                link.set_attr("class", "promo-tab");
            }
            nav.append(link);
        }
        nav
    }
}
