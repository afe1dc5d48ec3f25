//! HTTP client for the mall API.

use std::time::Duration;

use futures::future::try_join_all;
use promo_core::{split_csv, AppConfig, ContentBlock, ProductRecord, TrackingEvent, WidgetConfig};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::normalize::{normalize_listing, normalize_single};
use crate::rate_limit::retry_with_backoff;
use crate::types::{EventPayload, ProductPayload};

/// Page size used for category listings when the caller has no preference.
pub const DEFAULT_PRODUCT_LIMIT: u32 = 300;

/// Client for the mall API rooted at `{API_BASE}/api/{mallId}`.
///
/// GET requests answered with HTTP 429 are retried with exponential backoff
/// up to `max_retries` additional attempts. Any other non-2xx status is
/// returned as [`ClientError::UnexpectedStatus`] without retrying.
#[derive(Debug, Clone)]
pub struct MallClient {
    client: Client,
    api_root: Url,
    /// Appended as `coupon_no` to product requests so the API fills in the
    /// `benefit_*` fields.
    coupon_nos: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl MallClient {
    /// Creates a client with a configured timeout, `User-Agent` and retry
    /// policy.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidUrl`] if `api_root` cannot be parsed as a base URL.
    /// - [`ClientError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(
        api_root: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ClientError> {
        let api_root = parse_base(api_root)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_root,
            coupon_nos: None,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Builds a client for the page described by `widget` using the
    /// process-level HTTP settings in `app`.
    ///
    /// # Errors
    ///
    /// Same as [`MallClient::new`].
    pub fn from_config(widget: &WidgetConfig, app: &AppConfig) -> Result<Self, ClientError> {
        Ok(Self::new(
            &widget.api_root(),
            app.http_timeout_secs,
            &app.user_agent,
            app.max_retries,
            app.retry_backoff_base_ms,
        )?
        .with_coupons(widget.coupon_nos.clone()))
    }

    /// Sets the coupon numbers appended to product requests.
    #[must_use]
    pub fn with_coupons(mut self, coupon_nos: Option<String>) -> Self {
        self.coupon_nos = coupon_nos.filter(|c| !c.trim().is_empty());
        self
    }

    /// Fetches the content blocks of an event page.
    ///
    /// # Errors
    ///
    /// Transport, status and decoding errors from the event endpoint.
    pub async fn fetch_content_blocks(&self, page_id: &str) -> Result<Vec<ContentBlock>, ClientError> {
        let url = self.endpoint(&["events", page_id], &[])?;
        let payload: EventPayload = self.get_json(url.clone(), "event definition").await?;
        payload
            .into_blocks()
            .map_err(|source| ClientError::Deserialize {
                context: format!("encoded content blocks from {url}"),
                source,
            })
    }

    /// Fetches products by explicit IDs or by category.
    ///
    /// - `direct_ids_csv` set (after trimming and dropping empties): one GET
    ///   per ID, issued concurrently; result order follows the ID order.
    /// - otherwise `category_id` set: one GET for the listing with `limit`.
    /// - otherwise: an empty list, no request.
    ///
    /// # Errors
    ///
    /// The first request error; a single failed ID fails the batch. HTTP 429
    /// is only surfaced once retries are exhausted.
    pub async fn fetch_products(
        &self,
        direct_ids_csv: Option<&str>,
        category_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ProductRecord>, ClientError> {
        let ids = direct_ids_csv.map(split_csv).unwrap_or_default();
        if !ids.is_empty() {
            tracing::debug!(count = ids.len(), "fetching products by id");
            return try_join_all(ids.iter().map(|id| self.fetch_product(id))).await;
        }

        match category_id.map(str::trim).filter(|c| !c.is_empty()) {
            Some(category_id) => self.fetch_category_products(category_id, limit).await,
            None => Ok(Vec::new()),
        }
    }

    /// Fetches and normalizes one product. A response without `product_no`
    /// yields a placeholder record rather than an error.
    ///
    /// # Errors
    ///
    /// Transport, status and decoding errors from the product endpoint.
    pub async fn fetch_product(&self, product_no: &str) -> Result<ProductRecord, ClientError> {
        let url = self.endpoint(&["products", product_no], &self.coupon_query())?;
        let payload: ProductPayload = self.get_json(url, "product").await?;
        Ok(normalize_single(payload))
    }

    /// Fetches and normalizes a category listing.
    ///
    /// # Errors
    ///
    /// Transport, status and decoding errors from the listing endpoint.
    pub async fn fetch_category_products(
        &self,
        category_id: &str,
        limit: u32,
    ) -> Result<Vec<ProductRecord>, ClientError> {
        let mut query = vec![("limit", limit.to_string())];
        query.extend(self.coupon_query());
        let url = self.endpoint(&["categories", category_id, "products"], &query)?;
        let payload: ProductPayload = self.get_json(url, "category listing").await?;
        let products = normalize_listing(payload);
        tracing::debug!(category_id, count = products.len(), "fetched category listing");
        Ok(products)
    }

    /// Sends one tracking event. Never retried.
    ///
    /// # Errors
    ///
    /// Transport errors or a non-2xx status.
    pub async fn post_tracking_event(&self, event: &TrackingEvent) -> Result<(), ClientError> {
        let url = self.endpoint(&["track"], &[])?;
        let response = self.client.post(url.clone()).json(event).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }

    /// `{api_root}/coupons/download?coupon_no=<csv>`, the page the browser
    /// opens to issue coupons.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidUrl`] if the API root cannot take path segments.
    pub fn coupon_download_url(&self, coupon_csv: &str) -> Result<Url, ClientError> {
        self.endpoint(&["coupons", "download"], &[("coupon_no", coupon_csv.to_owned())])
    }

    fn coupon_query(&self) -> Vec<(&'static str, String)> {
        self.coupon_nos
            .iter()
            .map(|c| ("coupon_no", c.clone()))
            .collect()
    }

    /// Appends `segments` (percent-encoded) to the API root and sets `query`.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ClientError> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: self.api_root.to_string(),
                reason: "URL cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GETs `url` and decodes the body as `T`, retrying on HTTP 429.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, ClientError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(ClientError::RateLimited {
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(ClientError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<T>(&body).map_err(|source| ClientError::Deserialize {
                    context: format!("{context} from {url}"),
                    source,
                })
            }
        })
        .await
    }
}

fn parse_base(api_root: &str) -> Result<Url, ClientError> {
    let url = Url::parse(api_root.trim_end_matches('/')).map_err(|e| ClientError::InvalidUrl {
        url: api_root.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl {
            url: api_root.to_owned(),
            reason: "URL cannot be a base".to_owned(),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
