use std::sync::Arc;
use std::time::Duration;

use promo_core::AppConfig;
use promo_widget::build_refresh_scheduler;

use crate::page::{open_widget, PageArgs};

/// Loads the page once, then refreshes its grid caches every
/// `PROMO_REFRESH_INTERVAL_SECS` until ctrl-c or SIGTERM.
///
/// # Errors
///
/// Returns an error if the widget cannot be initialized or the refresh
/// scheduler cannot be started or stopped.
pub(crate) async fn run_watch(config: &AppConfig, page: &PageArgs) -> anyhow::Result<()> {
    let widget = open_widget(config, page).await?;
    let interval = Duration::from_secs(config.refresh_interval_secs);

    let mut scheduler = build_refresh_scheduler(Arc::clone(&widget), interval).await?;
    tracing::info!(
        page_id = %widget.config().page_id,
        interval_secs = config.refresh_interval_secs,
        grids = widget.grid_ids().len(),
        "refresher running"
    );

    shutdown_signal().await;
    scheduler.shutdown().await?;
    widget.flush_tracking().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping refresher");
}
