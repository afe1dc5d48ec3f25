//! Page arguments shared by the `render` and `watch` commands.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use promo_core::AppConfig;
use promo_widget::{FileStorage, GridElement, MemoryStorage, Widget};

/// Grid ID used for the grid described by `--grid-*` flags.
pub(crate) const CLI_GRID_ID: &str = "promo-grid-cli";

#[derive(Debug, Args)]
pub struct PageArgs {
    /// Embed attribute as `name=value` (e.g. `page-id=summer`); a bare
    /// `name` sets a boolean flag. Repeatable.
    #[arg(long = "attr", value_name = "NAME=VALUE", value_parser = parse_attr)]
    pub attrs: Vec<(String, String)>,

    /// Comma-separated product numbers for an extra product grid
    #[arg(long)]
    pub grid_ids: Option<String>,

    /// Category whose products fill the extra product grid
    #[arg(long)]
    pub grid_category: Option<String>,

    /// Column count of the extra product grid
    #[arg(long)]
    pub grid_columns: Option<u32>,

    /// Tab panel holding the extra product grid (e.g. `tab-2`)
    #[arg(long)]
    pub grid_panel: Option<String>,
}

/// Parses `name=value` into an embed attribute, adding the `data-` prefix
/// when missing. A bare `name` yields an empty value.
pub(crate) fn parse_attr(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw.split_once('=').unwrap_or((raw, ""));
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("attribute name missing in \"{raw}\""));
    }
    let name = if name.starts_with("data-") {
        name.to_owned()
    } else {
        format!("data-{name}")
    };
    Ok((name, value.to_owned()))
}

impl PageArgs {
    #[must_use]
    pub fn attribute_map(&self) -> HashMap<String, String> {
        self.attrs.iter().cloned().collect()
    }

    /// The grid described by the `--grid-*` flags, if any selector was given.
    #[must_use]
    pub fn grids(&self) -> Vec<GridElement> {
        if self.grid_ids.is_none() && self.grid_category.is_none() {
            return Vec::new();
        }

        let mut attrs = HashMap::new();
        let fields = [
            ("data-direct-nos", self.grid_ids.as_ref()),
            ("data-cate-no", self.grid_category.as_ref()),
            ("data-panel", self.grid_panel.as_ref()),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                attrs.insert(name.to_owned(), value.clone());
            }
        }
        if let Some(columns) = self.grid_columns {
            attrs.insert("data-columns".to_owned(), columns.to_string());
        }

        vec![GridElement::from_attributes(CLI_GRID_ID, &attrs)]
    }
}

/// Runs the widget startup sequence for the page described by `page`,
/// with the product cache persisted at `config.storage_path`.
///
/// # Errors
///
/// Returns an error if the storage file cannot be opened or the widget
/// configuration is invalid.
pub(crate) async fn open_widget(config: &AppConfig, page: &PageArgs) -> anyhow::Result<Arc<Widget>> {
    let storage = FileStorage::open(&config.storage_path)
        .with_context(|| format!("opening storage at {}", config.storage_path.display()))?;

    let widget = Widget::init(
        &page.attribute_map(),
        config,
        Arc::new(storage),
        Arc::new(MemoryStorage::new()),
        page.grids(),
    )
    .await?;
    Ok(widget)
}
