//! Product grids: cache-first loading and card rendering.
//!
//! Each grid element names either explicit product numbers
//! (`data-direct-nos`) or a category (`data-cate-no`). Loaded products are
//! persisted under the selector's cache key so later page views render
//! without touching the network.

use std::collections::HashMap;
use std::sync::Arc;

use promo_client::MallClient;
use promo_core::{GridSelector, PricePresentation, ProductRecord};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::WidgetError;
use crate::node::Element;
use crate::storage::Storage;

pub const DEFAULT_COLUMNS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridState {
    /// Nothing loaded yet, or the grid has no selector.
    Empty,
    Loading,
    Ready(Vec<ProductRecord>),
    /// Load failed; the message is shown next to the retry control.
    Failed(String),
}

/// One product grid placeholder in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridElement {
    pub id: String,
    pub selector: Option<GridSelector>,
    pub columns: u32,
    /// Tab panel the grid lives in, if any.
    pub panel: Option<String>,
    pub state: GridState,
}

impl GridElement {
    #[must_use]
    pub fn new(id: impl Into<String>, selector: Option<GridSelector>) -> Self {
        Self {
            id: id.into(),
            selector,
            columns: DEFAULT_COLUMNS,
            panel: None,
            state: GridState::Empty,
        }
    }

    /// Reads `data-direct-nos`, `data-cate-no`, `data-columns` and
    /// `data-panel`. An unusable column count falls back to
    /// [`DEFAULT_COLUMNS`].
    #[must_use]
    pub fn from_attributes(id: impl Into<String>, attrs: &HashMap<String, String>) -> Self {
        let get = |name: &str| attrs.get(name).map(String::as_str);
        let id = id.into();

        let columns = match get("data-columns").map(str::trim) {
            None | Some("") => DEFAULT_COLUMNS,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(grid_id = %id, columns = raw, "invalid column count; using default");
                    DEFAULT_COLUMNS
                }
            },
        };

        Self {
            selector: GridSelector::from_parts(get("data-direct-nos"), get("data-cate-no")),
            columns,
            panel: get("data-panel")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned),
            state: GridState::Empty,
            id,
        }
    }

    #[must_use]
    pub fn in_panel(mut self, panel: impl Into<String>) -> Self {
        self.panel = Some(panel.into());
        self
    }

    /// Applies the outcome of a network load.
    pub fn finish(&mut self, result: Result<Vec<ProductRecord>, WidgetError>) {
        self.state = match result {
            Ok(products) => {
                tracing::debug!(grid_id = %self.id, count = products.len(), "grid loaded");
                GridState::Ready(products)
            }
            Err(e) => {
                tracing::warn!(grid_id = %self.id, error = %e, "grid load failed");
                GridState::Failed(e.to_string())
            }
        };
    }
}

/// Whether a store actually wrote to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Updated,
    Unchanged,
}

/// Cache-first product loader for one page.
#[derive(Clone)]
pub struct GridLoader {
    client: MallClient,
    storage: Arc<dyn Storage>,
    page_id: String,
    limit: u32,
}

impl std::fmt::Debug for GridLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridLoader")
            .field("page_id", &self.page_id)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl GridLoader {
    #[must_use]
    pub fn new(client: MallClient, storage: Arc<dyn Storage>, page_id: &str, limit: u32) -> Self {
        Self {
            client,
            storage,
            page_id: page_id.to_owned(),
            limit,
        }
    }

    #[must_use]
    pub fn cache_key(&self, selector: &GridSelector) -> String {
        selector.cache_key(&self.page_id)
    }

    /// Reads the cached product list for `selector`.
    ///
    /// An entry that no longer parses is removed and reported as a miss.
    /// Storage read failures are also treated as a miss.
    #[must_use]
    pub fn cached(&self, selector: &GridSelector) -> Option<Vec<ProductRecord>> {
        let key = self.cache_key(selector);
        let raw = match self.storage.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(products) => Some(products),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding unreadable cache entry");
                if let Err(e) = self.storage.remove(&key) {
                    tracing::warn!(key = %key, error = %e, "failed to remove cache entry");
                }
                None
            }
        }
    }

    /// Fetches the products for `selector` from the API.
    ///
    /// # Errors
    ///
    /// [`WidgetError::Client`] for transport, status and decoding failures.
    pub async fn fetch(&self, selector: &GridSelector) -> Result<Vec<ProductRecord>, WidgetError> {
        let direct = selector.direct_csv();
        Ok(self
            .client
            .fetch_products(direct.as_deref(), selector.category_id(), self.limit)
            .await?)
    }

    /// Writes `products` under `key` unless the stored serialization is
    /// already byte-identical.
    ///
    /// # Errors
    ///
    /// - [`WidgetError::Serialize`] if the products cannot be encoded.
    /// - [`WidgetError::Storage`] if the backend read or write fails.
    pub fn store(&self, key: &str, products: &[ProductRecord]) -> Result<StoreOutcome, WidgetError> {
        let serialized = serde_json::to_string(products).map_err(|source| WidgetError::Serialize {
            key: key.to_owned(),
            source,
        })?;
        if self.storage.get(key)?.as_deref() == Some(serialized.as_str()) {
            return Ok(StoreOutcome::Unchanged);
        }
        self.storage.set(key, &serialized)?;
        Ok(StoreOutcome::Updated)
    }

    /// Fetches and persists. A failed write is logged; the fetched products
    /// are still returned for rendering.
    ///
    /// # Errors
    ///
    /// Same as [`GridLoader::fetch`].
    pub async fn fetch_and_store(&self, selector: &GridSelector) -> Result<Vec<ProductRecord>, WidgetError> {
        let products = self.fetch(selector).await?;
        let key = self.cache_key(selector);
        if let Err(e) = self.store(&key, &products) {
            tracing::warn!(key = %key, error = %e, "failed to cache products");
        }
        Ok(products)
    }

    /// Resolves `grid` synchronously where possible.
    ///
    /// Returns the selector that still needs a network load, after putting
    /// the grid in [`GridState::Loading`]. Returns `None` when the grid has
    /// no selector (left untouched) or the cache answered (now
    /// [`GridState::Ready`]).
    pub fn begin(&self, grid: &mut GridElement) -> Option<GridSelector> {
        let selector = grid.selector.clone()?;
        if let Some(products) = self.cached(&selector) {
            tracing::debug!(grid_id = %grid.id, count = products.len(), "grid served from cache");
            grid.state = GridState::Ready(products);
            return None;
        }
        grid.state = GridState::Loading;
        Some(selector)
    }

    /// Loads `grid`: cache hit renders immediately, a miss fetches and
    /// persists. The loading state never outlives this call.
    pub async fn load_panel(&self, grid: &mut GridElement) {
        if let Some(selector) = self.begin(grid) {
            let result = self.fetch_and_store(&selector).await;
            grid.finish(result);
        }
    }
}

/// Formats an amount in won with thousands separators, e.g. `12,900원`.
/// Fractions are rounded to the nearest won.
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped}원")
}

/// Renders `grid` according to its state.
#[must_use]
pub fn render_grid(grid: &GridElement) -> Element {
    let mut wrapper = Element::new("div")
        .attr("class", "promo-grid-wrapper")
        .attr("id", grid.id.clone());

    match &grid.state {
        GridState::Empty => {}
        GridState::Loading => {
            wrapper.append(
                Element::new("div")
                    .attr("class", "promo-loading")
                    .attr("role", "status")
                    .text("Loading..."),
            );
        }
        GridState::Failed(_) => {
            wrapper.append(
                Element::new("div")
                    .attr("class", "promo-grid-error")
                    .child(Element::new("p").text("상품을 불러오지 못했습니다."))
                    .child(
                        Element::new("button")
                            .attr("type", "button")
                            .attr("class", "promo-retry")
                            .attr("data-action", "retry-grid")
                            .attr("data-grid-id", grid.id.clone())
                            .text("다시 시도"),
                    ),
            );
        }
        GridState::Ready(products) => wrapper.append(render_products(products, grid.columns)),
    }
    wrapper
}

/// Lays out `products` as a CSS grid with `columns` equal tracks.
/// Placeholder records (no product number) are not shown.
#[must_use]
pub fn render_products(products: &[ProductRecord], columns: u32) -> Element {
    let columns = columns.max(1);
    let mut grid = Element::new("div").attr("class", "promo-grid").attr(
        "style",
        format!("display:grid;grid-template-columns:repeat({columns},minmax(0,1fr));gap:16px;"),
    );

    for product in products.iter().filter(|p| !p.is_placeholder()) {
        grid.append(render_card(product));
    }
    grid
}

fn render_card(product: &ProductRecord) -> Element {
    let mut card = Element::new("div")
        .attr("class", "promo-product")
        .attr("data-product-no", product.product_no.clone())
        .attr("data-track", format!("product-{}", product.product_no));

    if !product.list_image.is_empty() {
        card.append(
            Element::new("img")
                .attr("src", product.list_image.clone())
                .attr("alt", product.product_name.clone())
                .attr("loading", "lazy")
                .attr("style", "display:block;width:100%;height:auto;"),
        );
    }

    card.append(
        Element::new("p")
            .attr("class", "promo-product-name")
            .text(product.product_name.clone()),
    );

    if !product.summary_description.is_empty() {
        card.append(
            Element::new("p")
                .attr("class", "promo-product-summary")
                .text(product.summary_description.clone()),
        );
    }

    match product.price_presentation() {
        Some(presentation) => card.append(render_price(&presentation)),
        None => tracing::debug!(product_no = %product.product_no, "unparseable price; omitting"),
    }
    card
}

fn discount_badge(percent: Option<u32>) -> Option<Element> {
    percent.map(|p| Element::new("span").attr("class", "promo-discount").text(format!("{p}%")))
}

fn render_price(presentation: &PricePresentation) -> Element {
    let mut block = Element::new("div").attr("class", "promo-price");
    match presentation {
        PricePresentation::Plain { price } => {
            block.append(
                Element::new("span")
                    .attr("class", "promo-price-current")
                    .text(format_price(*price)),
            );
        }
        PricePresentation::Sale {
            original,
            sale,
            percent,
        } => {
            block.append(
                Element::new("del")
                    .attr("class", "promo-price-original")
                    .text(format_price(*original)),
            );
            if let Some(badge) = discount_badge(*percent) {
                block.append(badge);
            }
            block.append(
                Element::new("span")
                    .attr("class", "promo-price-sale")
                    .text(format_price(*sale)),
            );
        }
        PricePresentation::Benefit {
            original,
            benefit,
            percent,
        } => {
            block.set_attr("class", "promo-price promo-benefit");
            block.append(
                Element::new("del")
                    .attr("class", "promo-price-original")
                    .text(format_price(*original)),
            );
            block.append(
                Element::new("span")
                    .attr("class", "promo-benefit-label")
                    .text("쿠폰 적용가"),
            );
            if let Some(badge) = discount_badge(*percent) {
                block.append(badge);
            }
            block.append(
                Element::new("span")
                    .attr("class", "promo-price-benefit")
                    .text(format_price(*benefit)),
            );
        }
    }
    block
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod tests;
