//! Rendering, caching and tracking runtime for the promotional widget.
//!
//! [`Widget::init`] wires everything for one embedded page: content blocks
//! from the event definition, cache-first product grids, tab navigation,
//! coupon issuance and view/click tracking. [`build_refresh_scheduler`]
//! keeps grid caches fresh in the background.

pub mod blocks;
pub mod error;
pub mod grid;
pub mod node;
pub mod refresh;
pub mod storage;
pub mod tabs;
pub mod tracking;
pub mod widget;
pub mod youtube;

pub use blocks::{render_blocks, RenderOptions};
pub use error::WidgetError;
pub use grid::{format_price, render_grid, GridElement, GridLoader, GridState, StoreOutcome};
pub use node::{Element, Node};
pub use refresh::{build_refresh_scheduler, refresh_all, refresh_grid, RefreshSummary};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use tabs::{parse_tab_reference, ScrollTarget, TabController};
pub use tracking::TrackingReporter;
pub use widget::{ClickOutcome, CouponDownload, Widget, PAGE_GRID_ID};
pub use youtube::{embed_url, resolve_video_id};
