//! HTTP client for the mall API consumed by the promotional widget.
//!
//! Covers the event definition, single-product and category lookups (with
//! HTTP 429 backoff), normalization of the heterogeneous product payloads
//! into [`promo_core::ProductRecord`], and the fire-and-forget tracking POST.

pub mod client;
pub mod error;
pub mod normalize;
pub mod rate_limit;
pub mod types;

pub use client::{MallClient, DEFAULT_PRODUCT_LIMIT};
pub use error::ClientError;
pub use normalize::{normalize_listing, normalize_product, normalize_single};
pub use types::{EventPayload, ProductPayload, RawProduct};
