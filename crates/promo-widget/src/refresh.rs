//! Background refresh of cached product grids.
//!
//! Every grid's products are re-fetched on a fixed interval. The cache entry
//! is replaced wholesale, and only when the new serialization differs from
//! the stored one. Nothing expires on its own.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use promo_core::{GridSelector, ProductRecord};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::WidgetError;
use crate::grid::{GridLoader, StoreOutcome};
use crate::widget::Widget;

/// Result of refreshing one selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refreshed {
    pub outcome: StoreOutcome,
    pub products: Vec<ProductRecord>,
}

/// Totals for one refresh pass, plus the selectors whose data changed.
#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub updated: Vec<(GridSelector, Vec<ProductRecord>)>,
    pub unchanged: usize,
    pub failed: usize,
}

/// Re-fetches `selector` and writes the cache entry if it changed.
///
/// # Errors
///
/// Fetch failures and cache write failures. On error the existing cache
/// entry is left in place.
pub async fn refresh_grid(loader: &GridLoader, selector: &GridSelector) -> Result<Refreshed, WidgetError> {
    let products = loader.fetch(selector).await?;
    let outcome = loader.store(&loader.cache_key(selector), &products)?;
    Ok(Refreshed { outcome, products })
}

/// Refreshes each distinct selector concurrently. Failures are logged and
/// counted; they never abort the pass.
pub async fn refresh_all(loader: &GridLoader, selectors: &[GridSelector]) -> RefreshSummary {
    let mut distinct: Vec<&GridSelector> = Vec::with_capacity(selectors.len());
    for selector in selectors {
        if !distinct.contains(&selector) {
            distinct.push(selector);
        }
    }

    let results = join_all(distinct.iter().map(|s| refresh_grid(loader, s))).await;

    let mut summary = RefreshSummary::default();
    for (selector, result) in distinct.into_iter().zip(results) {
        match result {
            Ok(Refreshed {
                outcome: StoreOutcome::Updated,
                products,
            }) => summary.updated.push((selector.clone(), products)),
            Ok(Refreshed {
                outcome: StoreOutcome::Unchanged,
                ..
            }) => summary.unchanged += 1,
            Err(e) => {
                tracing::error!(key = %loader.cache_key(selector), error = %e, "refresh failed");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Builds and starts a scheduler that refreshes every grid of `widget`
/// once per `interval`.
///
/// The returned [`JobScheduler`] must be kept alive; dropping it stops the
/// refresher.
///
/// # Errors
///
/// [`WidgetError::Scheduler`] if the scheduler cannot be created, the job
/// cannot be registered, or the scheduler fails to start.
pub async fn build_refresh_scheduler(
    widget: Arc<Widget>,
    interval: Duration,
) -> Result<JobScheduler, WidgetError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let widget = Arc::clone(&widget);
        Box::pin(async move {
            tracing::debug!("refresh: starting pass");
            let summary = widget.refresh_grids().await;
            tracing::info!(
                updated = summary.updated.len(),
                unchanged = summary.unchanged,
                failed = summary.failed,
                "refresh: pass complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use promo_client::MallClient;
    use promo_core::ProductRecord;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::storage::{MemoryStorage, Storage};

    fn loader(server: &MockServer, storage: Arc<MemoryStorage>) -> GridLoader {
        let client = MallClient::new(&format!("{}/api/shop", server.uri()), 5, "test", 0, 1).unwrap();
        GridLoader::new(client, storage, "summer", 300)
    }

    fn listing(price: &str) -> serde_json::Value {
        json!({ "products": [{ "product_no": 1, "product_name": "Tee", "price": price }] })
    }

    #[tokio::test]
    async fn identical_data_causes_no_write() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/shop/categories/40/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing("1000")))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let loader = loader(&server, Arc::clone(&storage));
        let selector = GridSelector::Category("40".to_owned());

        let first = refresh_grid(&loader, &selector).await.unwrap();
        assert_eq!(first.outcome, StoreOutcome::Updated);
        assert_eq!(storage.write_count(), 1);

        let second = refresh_grid(&loader, &selector).await.unwrap();
        assert_eq!(second.outcome, StoreOutcome::Unchanged);
        assert_eq!(storage.write_count(), 1);
    }

    #[tokio::test]
    async fn changed_data_replaces_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/shop/categories/40/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing("1200")))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let loader = loader(&server, Arc::clone(&storage));
        let selector = GridSelector::Category("40".to_owned());
        let stale = vec![ProductRecord {
            product_no: "1".to_owned(),
            product_name: "Tee".to_owned(),
            price: "1000".to_owned(),
            ..ProductRecord::default()
        }];
        loader.store(&loader.cache_key(&selector), &stale).unwrap();

        let summary = refresh_all(&loader, &[selector.clone(), selector.clone()]).await;

        assert_eq!(summary.updated.len(), 1);
        assert_eq!(summary.updated[0].1[0].price, "1200");
        assert_eq!(storage.write_count(), 2);
        let cached = storage.get(&loader.cache_key(&selector)).unwrap().unwrap();
        assert!(cached.contains("\"1200\""), "{cached}");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_existing_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let loader = loader(&server, Arc::clone(&storage));
        let selector = GridSelector::Direct(vec!["1".to_owned()]);
        let key = loader.cache_key(&selector);
        storage.set(&key, "[]").unwrap();

        let summary = refresh_all(&loader, std::slice::from_ref(&selector)).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(storage.get(&key).unwrap().as_deref(), Some("[]"));
    }
}
