//! Normalization from raw mall API shapes to [`promo_core::ProductRecord`].
//!
//! Normalization never fails: a missing field becomes an empty string (or
//! `None` for the optional price fields) so one malformed product cannot
//! take down a whole grid.

use promo_core::ProductRecord;

use crate::types::{ProductPayload, RawProduct};

/// Normalizes a single [`RawProduct`].
#[must_use]
pub fn normalize_product(raw: RawProduct) -> ProductRecord {
    if raw.product_no.is_none() {
        tracing::debug!("product payload has no product_no; keeping placeholder record");
    }

    ProductRecord {
        product_no: raw.product_no.unwrap_or_default(),
        product_name: raw.product_name.unwrap_or_default(),
        summary_description: raw.summary_description.unwrap_or_default(),
        price: raw.price.unwrap_or_default(),
        list_image: raw.list_image.map(absolute_image_url).unwrap_or_default(),
        sale_price: raw.sale_price,
        benefit_price: raw.benefit_price,
        benefit_percentage: raw.benefit_percentage,
    }
}

/// Normalizes the response of a by-ID lookup.
#[must_use]
pub fn normalize_single(payload: ProductPayload) -> ProductRecord {
    normalize_product(payload.into_single())
}

/// Normalizes the response of a category listing, preserving order.
#[must_use]
pub fn normalize_listing(payload: ProductPayload) -> Vec<ProductRecord> {
    payload
        .into_listing()
        .into_iter()
        .map(normalize_product)
        .collect()
}

/// CDN image paths are often protocol-relative (`//cdn...`); pin them to
/// https so the markup works when served from a file or an http page.
fn absolute_image_url(url: String) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
