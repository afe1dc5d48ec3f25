//! Page-level orchestration.
//!
//! [`Widget::init`] runs the startup sequence for one embedded page:
//! validate attributes, honour the clear flags, render the event's content
//! blocks, load every product grid and report the page view. The returned
//! handle exposes the page's global entry points (tab switching, coupon
//! download, click dispatch) and the background refresh pass.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use promo_client::MallClient;
use promo_core::{normalize_csv, AppConfig, GridSelector, WidgetConfig};
use reqwest::Url;
use tokio::task::JoinHandle;

use crate::blocks::{render_blocks, RenderOptions};
use crate::error::WidgetError;
use crate::grid::{render_grid, GridElement, GridLoader, GridState};
use crate::node::Element;
use crate::refresh::{refresh_all, RefreshSummary};
use crate::storage::{lock, Storage};
use crate::tabs::{panel_id, parse_tab_reference, ScrollTarget, TabController};
use crate::tracking::{clear_visitor, TrackingReporter};

/// Grid created from the page-level `data-direct-nos` attribute.
pub const PAGE_GRID_ID: &str = "promo-grid-page";

/// A coupon issuance in progress.
#[derive(Debug)]
pub struct CouponDownload {
    /// Page to open so the mall issues the coupons.
    pub url: Url,
    /// Completes once grid caches are dropped and every grid is reloaded
    /// with coupon pricing.
    pub reload: JoinHandle<()>,
}

/// What a click on the page resolved to.
#[derive(Debug)]
pub enum ClickOutcome {
    /// Nothing on the element is actionable.
    Ignored,
    /// Only a click event was reported.
    Tracked,
    Tab {
        panel_id: String,
        scroll: Option<ScrollTarget>,
    },
    Coupon(CouponDownload),
    GridRetried {
        grid_id: String,
        state: Option<GridState>,
    },
}

pub struct Widget {
    config: WidgetConfig,
    client: MallClient,
    loader: GridLoader,
    storage: Arc<dyn Storage>,
    tracker: TrackingReporter,
    tabs: TabController,
    options: RenderOptions,
    coupon_reload_delay: Duration,
    /// Rendered content blocks; `None` while the event definition is
    /// unavailable.
    content: Mutex<Option<Element>>,
    grids: Mutex<Vec<GridElement>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("page_id", &self.config.page_id)
            .field("mall_id", &self.config.mall_id)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl Widget {
    /// Initializes the widget for one page and runs the startup sequence.
    ///
    /// # Errors
    ///
    /// - [`WidgetError::Config`] if a required attribute is missing or a
    ///   value is malformed. Nothing else runs in that case.
    /// - [`WidgetError::Client`] if the HTTP client cannot be built.
    ///
    /// Network failures after that point are handled per component and do
    /// not fail initialization.
    pub async fn init(
        attrs: &HashMap<String, String>,
        app: &AppConfig,
        storage: Arc<dyn Storage>,
        session: Arc<dyn Storage>,
        grids: Vec<GridElement>,
    ) -> Result<Arc<Self>, WidgetError> {
        let config = WidgetConfig::from_attributes(attrs).inspect_err(|e| {
            tracing::warn!(error = %e, "widget configuration invalid; skipping initialization");
        })?;
        let widget = Arc::new(Self::new(config, app, storage, session, grids)?);
        widget.start().await;
        Ok(widget)
    }

    /// Builds the widget without touching the network. Applies the
    /// `clear-storage` and `clear-cookies` flags and resolves the visitor.
    ///
    /// # Errors
    ///
    /// [`WidgetError::Client`] if the HTTP client cannot be built.
    pub fn new(
        config: WidgetConfig,
        app: &AppConfig,
        storage: Arc<dyn Storage>,
        session: Arc<dyn Storage>,
        mut grids: Vec<GridElement>,
    ) -> Result<Self, WidgetError> {
        let client = MallClient::from_config(&config, app)?;

        if config.clear_storage {
            match storage.remove_matching(&|key| config.owns_cache_key(key)) {
                Ok(removed) => tracing::info!(page_id = %config.page_id, removed, "cleared grid cache"),
                Err(e) => tracing::warn!(page_id = %config.page_id, error = %e, "failed to clear grid cache"),
            }
        }
        if config.clear_cookies {
            if let Err(e) = clear_visitor(&*storage, &*session, &config.page_id) {
                tracing::warn!(page_id = %config.page_id, error = %e, "failed to clear visitor state");
            }
        }

        if let Some(ids) = config.direct_product_ids.as_deref() {
            if !grids.iter().any(|g| g.id == PAGE_GRID_ID) {
                grids.push(GridElement::new(
                    PAGE_GRID_ID,
                    GridSelector::from_parts(Some(ids), None),
                ));
            }
        }

        let tracker = TrackingReporter::new(client.clone(), &config, &*storage, session);
        let loader = GridLoader::new(
            client.clone(),
            Arc::clone(&storage),
            &config.page_id,
            app.product_limit,
        );

        Ok(Self {
            tabs: TabController::new(&config.active_color),
            options: RenderOptions::from_config(&config),
            coupon_reload_delay: Duration::from_millis(app.coupon_reload_delay_ms),
            content: Mutex::new(None),
            grids: Mutex::new(grids),
            pending: Mutex::new(Vec::new()),
            config,
            client,
            loader,
            storage,
            tracker,
        })
    }

    /// Renders content, loads grids and reports the page view.
    ///
    /// When the event definition cannot be fetched the page stays
    /// unrendered and no grid is loaded; the view is still reported.
    pub async fn start(&self) {
        if self.render_content().await {
            self.register_panels();
            self.load_all_grids().await;
        }
        self.track(self.tracker.track_page_view());
    }

    async fn render_content(&self) -> bool {
        match self.client.fetch_content_blocks(&self.config.page_id).await {
            Ok(blocks) => {
                let mut root = Element::new("div").attr("class", "promo-content");
                render_blocks(&mut root, &blocks, &self.options);
                tracing::debug!(page_id = %self.config.page_id, blocks = blocks.len(), "content rendered");
                *lock(&self.content) = Some(root);
                true
            }
            Err(e) => {
                tracing::error!(page_id = %self.config.page_id, error = %e, "failed to load event definition");
                false
            }
        }
    }

    fn register_panels(&self) {
        for tab in 1..=self.config.tab_count {
            self.tabs.register_panel(&panel_id(tab));
        }
        if self.config.tab_count > 0 {
            self.tabs.activate(&panel_id(1));
        }
    }

    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    #[must_use]
    pub fn tabs(&self) -> &TabController {
        &self.tabs
    }

    #[must_use]
    pub fn visitor_id(&self) -> &str {
        self.tracker.visitor_id()
    }

    #[must_use]
    pub fn is_rendered(&self) -> bool {
        lock(&self.content).is_some()
    }

    #[must_use]
    pub fn grid_state(&self, grid_id: &str) -> Option<GridState> {
        lock(&self.grids)
            .iter()
            .find(|g| g.id == grid_id)
            .map(|g| g.state.clone())
    }

    #[must_use]
    pub fn grid_ids(&self) -> Vec<String> {
        lock(&self.grids).iter().map(|g| g.id.clone()).collect()
    }

    /// Loads one grid: cache first, then the network. Returns the grid's
    /// final state, or `None` for an unknown ID.
    pub async fn load_grid(&self, grid_id: &str) -> Option<GridState> {
        let selector = {
            let mut grids = lock(&self.grids);
            let grid = grids.iter_mut().find(|g| g.id == grid_id)?;
            self.loader.begin(grid)
        };

        if let Some(selector) = selector {
            let result = self.loader.fetch_and_store(&selector).await;
            if let Some(grid) = lock(&self.grids).iter_mut().find(|g| g.id == grid_id) {
                grid.finish(result);
            }
        }
        self.grid_state(grid_id)
    }

    /// Loads every grid concurrently.
    pub async fn load_all_grids(&self) {
        let ids = self.grid_ids();
        join_all(ids.iter().map(|id| self.load_grid(id))).await;
    }

    /// Drops every grid's cache entry and loads all grids again.
    pub async fn reload_grids(&self) {
        let keys: Vec<String> = lock(&self.grids)
            .iter()
            .filter_map(|g| g.selector.as_ref())
            .map(|s| self.loader.cache_key(s))
            .collect();
        for key in &keys {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key = %key, error = %e, "failed to drop cache entry");
            }
        }
        self.load_all_grids().await;
    }

    /// One background refresh pass over every grid. Grids whose data
    /// changed show the new products.
    pub async fn refresh_grids(&self) -> RefreshSummary {
        let selectors: Vec<GridSelector> = lock(&self.grids)
            .iter()
            .filter_map(|g| g.selector.clone())
            .collect();

        let summary = refresh_all(&self.loader, &selectors).await;

        if !summary.updated.is_empty() {
            let mut grids = lock(&self.grids);
            for (selector, products) in &summary.updated {
                for grid in grids.iter_mut().filter(|g| g.selector.as_ref() == Some(selector)) {
                    grid.state = GridState::Ready(products.clone());
                }
            }
        }
        summary
    }

    /// Tab-show entry point. See [`TabController::show_tab`].
    pub async fn show_tab(&self, panel_id: &str, control: Option<&str>) -> Option<ScrollTarget> {
        self.tabs.show_tab(panel_id, control).await
    }

    /// Coupon download entry point.
    ///
    /// Returns the issuance URL for the caller to open. After the
    /// configured delay every grid's cache is dropped and the grids reload
    /// so coupon pricing shows up.
    ///
    /// # Errors
    ///
    /// [`WidgetError::Client`] if the issuance URL cannot be built.
    pub fn download_coupons(self: &Arc<Self>, coupon_csv: &str) -> Result<CouponDownload, WidgetError> {
        let coupons = normalize_csv(coupon_csv).unwrap_or_default();
        let url = self.client.coupon_download_url(&coupons)?;
        tracing::info!(page_id = %self.config.page_id, coupons = %coupons, "issuing coupons");

        let widget = Arc::clone(self);
        let delay = self.coupon_reload_delay;
        let reload = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            widget.reload_grids().await;
        });

        Ok(CouponDownload { url, reload })
    }

    /// Global click dispatcher. `target` holds the clicked element's
    /// attributes.
    ///
    /// A `data-track` marker is always reported. Then, in order: a coupon
    /// button downloads coupons, a retry button reloads its grid, a tab
    /// reference (`data-tab-link` or `href`) switches tabs.
    ///
    /// # Errors
    ///
    /// Same as [`Widget::download_coupons`].
    pub async fn handle_click(
        self: &Arc<Self>,
        target: &HashMap<String, String>,
    ) -> Result<ClickOutcome, WidgetError> {
        let get = |name: &str| {
            target
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let tracked = match get("data-track") {
            Some(marker) => {
                self.track(self.tracker.track_click(marker));
                true
            }
            None => false,
        };

        if let Some(coupons) = get("data-coupon") {
            return Ok(ClickOutcome::Coupon(self.download_coupons(coupons)?));
        }

        if get("data-action") == Some("retry-grid") {
            if let Some(grid_id) = get("data-grid-id") {
                let state = self.load_grid(grid_id).await;
                return Ok(ClickOutcome::GridRetried {
                    grid_id: grid_id.to_owned(),
                    state,
                });
            }
        }

        if let Some(tab) = get("data-tab-link")
            .or_else(|| get("href"))
            .and_then(parse_tab_reference)
        {
            let panel = panel_id(tab);
            let scroll = self.show_tab(&panel, get("id")).await;
            return Ok(ClickOutcome::Tab {
                panel_id: panel,
                scroll,
            });
        }

        Ok(if tracked {
            ClickOutcome::Tracked
        } else {
            ClickOutcome::Ignored
        })
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut pending = lock(&self.pending);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Waits for every tracking request sent so far.
    pub async fn flush_tracking(&self) {
        let handles = std::mem::take(&mut *lock(&self.pending));
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::debug!(error = %e, "tracking task did not complete");
            }
        }
    }

    /// Builds the page markup: content blocks, untabbed grids, then the tab
    /// bar and one panel per tab holding that tab's grids.
    #[must_use]
    pub fn render(&self) -> Element {
        let mut page = Element::new("div")
            .attr("class", "promo-widget")
            .attr("data-page-id", self.config.page_id.clone());

        let content = lock(&self.content).clone();
        if let Some(content) = content {
            page.append(content);
        }

        let tab_count = self.config.tab_count;
        let in_tab = |grid: &GridElement| {
            grid.panel
                .as_deref()
                .and_then(parse_tab_reference)
                .is_some_and(|n| (1..=tab_count).contains(&n))
        };

        let grids = lock(&self.grids);
        for grid in grids.iter().filter(|&g| !in_tab(g)) {
            page.append(render_grid(grid));
        }

        if tab_count > 0 {
            page.append(self.tabs.render_nav(tab_count));
            for tab in 1..=tab_count {
                let id = panel_id(tab);
                let mut section = Element::new("section")
                    .attr("id", id.clone())
                    .attr("class", "promo-tab-panel");
                if !self.tabs.is_visible(&id) {
                    section.set_attr("style", "display:none;");
                }
                for grid in grids
                    .iter()
                    .filter(|g| g.panel.as_deref().and_then(parse_tab_reference) == Some(tab))
                {
                    section.append(render_grid(grid));
                }
                page.append(section);
            }
        }
        page
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        self.render().to_html()
    }
}
