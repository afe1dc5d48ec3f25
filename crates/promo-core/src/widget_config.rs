//! Page-level configuration read once from the embed script's attributes.
//!
//! The embedding page carries its settings as `data-*` attributes on the
//! script tag. [`WidgetConfig::from_attributes`] validates them up front so
//! every component receives an explicit, already-parsed config instead of
//! re-reading markup.

use std::collections::HashMap;

use crate::ConfigError;

/// Settings for one embedded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub page_id: String,
    pub mall_id: String,
    /// API origin without a trailing slash.
    pub api_base: String,
    pub tab_count: u32,
    pub active_color: String,
    /// Normalized comma-separated coupon numbers used to bias pricing.
    pub coupon_nos: Option<String>,
    /// Normalized comma-separated product numbers for the page-level grid.
    pub direct_product_ids: Option<String>,
    pub ignore_text: bool,
    pub autoplay_all: bool,
    pub loop_all: bool,
    pub clear_cookies: bool,
    pub clear_storage: bool,
    pub page_url: String,
    pub referrer: String,
    pub user_agent: String,
}

pub const DEFAULT_ACTIVE_COLOR: &str = "#1e2b4c";

/// Trims each comma-separated entry and drops empties. Returns `None` when
/// nothing is left.
#[must_use]
pub fn normalize_csv(raw: &str) -> Option<String> {
    let joined = split_csv(raw).join(",");
    (!joined.is_empty()).then_some(joined)
}

/// Splits a comma-separated list, trimming entries and dropping empties.
#[must_use]
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn attr<'a>(attrs: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    attrs
        .get(&format!("data-{name}"))
        .or_else(|| attrs.get(name))
        .map(String::as_str)
}

fn parse_flag(attr: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        // A bare attribute (`data-ignore-text`) is present with an empty value.
        "" | "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidAttribute {
            attr: attr.to_owned(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

impl WidgetConfig {
    /// Builds the config from embed attributes.
    ///
    /// Keys may be given with or without the `data-` prefix.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingAttribute`] when `page-id`, `mall-id` or
    ///   `api-base` is absent or blank.
    /// - [`ConfigError::InvalidAttribute`] when a flag or `tab-count` cannot
    ///   be parsed, or `api-base` is not an http(s) URL.
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| attr(attrs, name);

        let require = |name: &str| -> Result<String, ConfigError> {
            get(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| ConfigError::MissingAttribute(format!("data-{name}")))
        };

        let flag = |name: &str| -> Result<bool, ConfigError> {
            get(name).map_or(Ok(false), |raw| parse_flag(&format!("data-{name}"), raw))
        };

        let page_id = require("page-id")?;
        let mall_id = require("mall-id")?;
        let api_base = require("api-base")?.trim_end_matches('/').to_owned();
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(ConfigError::InvalidAttribute {
                attr: "data-api-base".to_owned(),
                reason: format!("\"{api_base}\" is not an http(s) URL"),
            });
        }

        let tab_count = match get("tab-count").map(str::trim).filter(|v| !v.is_empty()) {
            None => 0,
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::InvalidAttribute {
                attr: "data-tab-count".to_owned(),
                reason: e.to_string(),
            })?,
        };

        let active_color = get("active-color")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_ACTIVE_COLOR)
            .to_owned();

        Ok(Self {
            page_id,
            mall_id,
            api_base,
            tab_count,
            active_color,
            coupon_nos: get("coupon-nos").and_then(normalize_csv),
            direct_product_ids: get("direct-nos").and_then(normalize_csv),
            ignore_text: flag("ignore-text")?,
            autoplay_all: flag("autoplay-all")?,
            loop_all: flag("loop-all")?,
            clear_cookies: flag("clear-cookies")?,
            clear_storage: flag("clear-storage")?,
            page_url: get("page-url").unwrap_or_default().to_owned(),
            referrer: get("referrer").unwrap_or_default().to_owned(),
            user_agent: get("user-agent").unwrap_or_default().to_owned(),
        })
    }

    /// `{api_base}/api/{mall_id}`, the prefix shared by every endpoint.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api/{}", self.api_base, self.mall_id)
    }

    /// Whether `key` is a product cache entry of this page.
    #[must_use]
    pub fn owns_cache_key(&self, key: &str) -> bool {
        GridSelector::from_cache_key(&self.page_id, key).is_some()
    }
}

/// What a grid element displays: an explicit product list or a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GridSelector {
    Direct(Vec<String>),
    Category(String),
}

impl GridSelector {
    /// Derives the selector from a grid's configured attributes. Explicit
    /// product numbers take precedence over a category.
    #[must_use]
    pub fn from_parts(direct_ids: Option<&str>, category_id: Option<&str>) -> Option<Self> {
        if let Some(ids) = direct_ids.map(split_csv).filter(|ids| !ids.is_empty()) {
            return Some(GridSelector::Direct(ids));
        }
        category_id
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| GridSelector::Category(c.to_owned()))
    }

    /// Storage key for this selector on `page_id`.
    ///
    /// `widgetCache_<page>_direct_<ids>` or `widgetCache_<page>_cat_<id>`.
    #[must_use]
    pub fn cache_key(&self, page_id: &str) -> String {
        match self {
            GridSelector::Direct(ids) => format!("widgetCache_{page_id}_direct_{}", ids.join(",")),
            GridSelector::Category(id) => format!("widgetCache_{page_id}_cat_{id}"),
        }
    }

    /// Inverse of [`Self::cache_key`]: the selector stored under `key` if the
    /// key belongs to `page_id`.
    ///
    /// Product and category numbers never contain `_`. A key with `_` in its
    /// tail belongs to a page whose ID merely starts with `page_id`.
    #[must_use]
    pub fn from_cache_key(page_id: &str, key: &str) -> Option<Self> {
        let rest = key
            .strip_prefix("widgetCache_")?
            .strip_prefix(page_id)?
            .strip_prefix('_')?;
        let (kind, value) = rest.split_once('_')?;
        if value.is_empty() || value.contains('_') {
            return None;
        }
        match kind {
            "direct" => {
                let ids = split_csv(value);
                (!ids.is_empty()).then_some(GridSelector::Direct(ids))
            }
            "cat" => Some(GridSelector::Category(value.to_owned())),
            _ => None,
        }
    }

    /// Product numbers as a normalized comma-separated list, if direct.
    #[must_use]
    pub fn direct_csv(&self) -> Option<String> {
        match self {
            GridSelector::Direct(ids) => Some(ids.join(",")),
            GridSelector::Category(_) => None,
        }
    }

    #[must_use]
    pub fn category_id(&self) -> Option<&str> {
        match self {
            GridSelector::Direct(_) => None,
            GridSelector::Category(id) => Some(id),
        }
    }
}

#[cfg(test)]
#[path = "widget_config_test.rs"]
mod tests;
