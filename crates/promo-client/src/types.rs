//! Mall API response types.
//!
//! ## Observed product shapes
//!
//! The single-product endpoint and the category listing do not agree on an
//! envelope:
//!
//! - `GET /products/{id}` returns a bare product object on most malls,
//!   `{ "product": {...} }` on some, and occasionally a one-element array.
//! - `GET /categories/{id}/products` returns either a raw array or
//!   `{ "products": [...] }`.
//!
//! Scalar types drift too: `price` may be `"12900.00"` or `12900`, and the
//! coupon-derived fields (`benefit_price`, `benefit_percentage`) are absent
//! unless `coupon_no` was passed. Every field is therefore optional here and
//! defaults are applied in [`crate::normalize`].
//!
//! ## Event definition
//!
//! `GET /events/{pageId}` returns `{ "content_blocks": [...] }`. Older pages
//! saved the block list as a JSON-encoded string in the same field, and a
//! few deployments return the bare array.

use promo_core::lenient;
use promo_core::ContentBlock;
use serde::Deserialize;
use serde_json::Value;

/// One product as the mall API returns it, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub product_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub product_name: Option<String>,
    #[serde(
        default,
        alias = "simple_description",
        deserialize_with = "lenient::opt_string"
    )]
    pub summary_description: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub price: Option<String>,
    #[serde(default, alias = "image", deserialize_with = "lenient::opt_string")]
    pub list_image: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sale_price: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub benefit_price: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub benefit_percentage: Option<String>,
}

/// Every product envelope the API is known to produce.
///
/// Variant order matters for `untagged` matching: `Single` accepts any
/// object, so it must stay last.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductPayload {
    List(Vec<RawProduct>),
    Listing { products: Vec<RawProduct> },
    Wrapped { product: RawProduct },
    Single(RawProduct),
}

impl ProductPayload {
    /// Collapses the payload to the one product a by-ID lookup refers to.
    /// Empty lists yield a default (empty) product.
    #[must_use]
    pub fn into_single(self) -> RawProduct {
        match self {
            ProductPayload::List(items) | ProductPayload::Listing { products: items } => {
                items.into_iter().next().unwrap_or_default()
            }
            ProductPayload::Wrapped { product } | ProductPayload::Single(product) => product,
        }
    }

    /// Collapses the payload to a listing. A bare object only counts as a
    /// one-item listing when it carries a product number.
    #[must_use]
    pub fn into_listing(self) -> Vec<RawProduct> {
        match self {
            ProductPayload::List(items) | ProductPayload::Listing { products: items } => items,
            ProductPayload::Wrapped { product } => vec![product],
            ProductPayload::Single(product) if product.product_no.is_some() => vec![product],
            ProductPayload::Single(_) => Vec::new(),
        }
    }
}

/// Envelope of `GET /events/{pageId}`.
///
/// Blocks are kept as raw JSON until [`EventPayload::into_blocks`] so one
/// malformed block cannot fail the whole definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Blocks(Vec<Value>),
    Definition(EventDefinition),
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDefinition {
    #[serde(default, alias = "blocks", alias = "contentBlocks")]
    pub content_blocks: BlockList,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BlockList {
    Inline(Vec<Value>),
    /// Block list stored as a JSON string.
    Encoded(String),
    Missing(()),
}

impl Default for BlockList {
    fn default() -> Self {
        BlockList::Inline(Vec::new())
    }
}

impl EventPayload {
    /// Returns the block list, decoding the string-encoded form if needed.
    /// Blocks that do not match any known shape are skipped.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when an encoded block list is not a JSON array.
    pub fn into_blocks(self) -> Result<Vec<ContentBlock>, serde_json::Error> {
        let raw = match self {
            EventPayload::Blocks(values)
            | EventPayload::Definition(EventDefinition {
                content_blocks: BlockList::Inline(values),
            }) => values,
            EventPayload::Definition(EventDefinition {
                content_blocks: BlockList::Encoded(encoded),
            }) => {
                if encoded.trim().is_empty() {
                    Vec::new()
                } else {
                    serde_json::from_str(&encoded)?
                }
            }
            EventPayload::Definition(EventDefinition {
                content_blocks: BlockList::Missing(()),
            }) => Vec::new(),
        };
        Ok(decode_blocks(raw))
    }
}

fn decode_blocks(values: Vec<Value>) -> Vec<ContentBlock> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(block) => Some(block),
            Err(e) => {
                tracing::debug!(index, error = %e, "skipping malformed content block");
                None
            }
        })
        .collect()
}
