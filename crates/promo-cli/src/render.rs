use std::path::Path;

use anyhow::Context;
use promo_core::AppConfig;

use crate::page::{open_widget, PageArgs};

/// Renders one page to HTML, on stdout or into `out`.
///
/// # Errors
///
/// Returns an error if the widget cannot be initialized or the output file
/// cannot be written. Network failures inside the page are reported in the
/// log and reflected in the markup, not returned.
pub(crate) async fn run_render(config: &AppConfig, page: &PageArgs, out: Option<&Path>) -> anyhow::Result<()> {
    let widget = open_widget(config, page).await?;
    widget.flush_tracking().await;

    if !widget.is_rendered() {
        tracing::warn!(page_id = %widget.config().page_id, "event content unavailable; output has no content blocks");
    }

    let html = widget.to_html();
    match out {
        Some(path) => {
            std::fs::write(path, &html).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = html.len(), "page written");
        }
        None => println!("{html}"),
    }
    Ok(())
}
