//! Content block renderer.
//!
//! Turns the event definition's ordered [`ContentBlock`] list into one
//! subtree per block under a single root container.

use promo_core::{ContentBlock, Hotspot, TextStyle, VideoBlock, WidgetConfig};

use crate::node::{css_percent, Element, Node};
use crate::tabs::{parse_tab_reference, panel_id};
use crate::youtube::{embed_url, resolve_video_id};

/// Page-level switches that affect block rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub ignore_text: bool,
    pub autoplay_all: bool,
    pub loop_all: bool,
    /// Whether the target runtime understands CSS `aspect-ratio`. When not,
    /// video containers use the padding-top ratio box instead.
    pub supports_aspect_ratio: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ignore_text: false,
            autoplay_all: false,
            loop_all: false,
            supports_aspect_ratio: true,
        }
    }
}

impl RenderOptions {
    #[must_use]
    pub fn from_config(config: &WidgetConfig) -> Self {
        Self {
            ignore_text: config.ignore_text,
            autoplay_all: config.autoplay_all,
            loop_all: config.loop_all,
            ..Self::default()
        }
    }
}

/// Clears `root` and appends one subtree per block, in order.
///
/// Text blocks are omitted when `ignore_text` is set; video blocks without
/// a resolvable ID and unknown block types are skipped.
pub fn render_blocks(root: &mut Element, blocks: &[ContentBlock], options: &RenderOptions) {
    root.clear();
    for (index, block) in blocks.iter().enumerate() {
        if let Some(node) = render_block(block, options) {
            root.append(node);
        } else {
            tracing::debug!(index, "content block skipped");
        }
    }
}

/// Renders one block, or `None` when the block is skipped.
#[must_use]
pub fn render_block(block: &ContentBlock, options: &RenderOptions) -> Option<Element> {
    match block {
        ContentBlock::Text { .. } if options.ignore_text => None,
        ContentBlock::Text { text, style } => Some(render_text(text, style)),
        ContentBlock::Image { src, regions } => Some(render_image(src, regions)),
        ContentBlock::Video(video) => render_video(video, options),
        ContentBlock::Unknown => None,
    }
}

/// Bare numbers are treated as pixels; anything else is passed through.
fn css_length(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.is_empty() && raw.parse::<f64>().is_ok() {
        format!("{raw}px")
    } else {
        raw.to_owned()
    }
}

/// Drops characters that could break out of an inline `style` declaration.
fn css_value(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>' | '"'))
        .collect::<String>()
        .trim()
        .to_owned()
}

fn render_text(text: &str, style: &TextStyle) -> Element {
    let align = match style.align.as_deref().map(str::trim) {
        Some(a @ ("left" | "right" | "center" | "justify")) => a,
        _ => "center",
    };
    let margin_top = style.margin_top.as_deref().map_or_else(|| "0".to_owned(), css_length);
    let margin_bottom = style.margin_bottom.as_deref().map_or_else(|| "0".to_owned(), css_length);
    let font_size = style.font_size.as_deref().map_or_else(|| "16px".to_owned(), css_length);
    let font_weight = style.font_weight.as_deref().unwrap_or("normal");
    let color = style.color.as_deref().unwrap_or("#333333");

    let mut el = Element::new("div").attr("class", "promo-text").attr(
        "style",
        format!(
            "text-align:{align};margin:{} 0 {} 0;font-size:{};font-weight:{};color:{};line-height:1.5;",
            css_value(&margin_top),
            css_value(&margin_bottom),
            css_value(&font_size),
            css_value(font_weight),
            css_value(color),
        ),
    );

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            el.append(Element::new("br"));
        }
        if !line.is_empty() {
            el.append(Node::Text(line.trim_end_matches('\r').to_owned()));
        }
    }
    el
}

fn render_image(src: &str, regions: &[Hotspot]) -> Element {
    let mut wrapper = Element::new("div")
        .attr("class", "promo-image")
        .attr("style", "position:relative;width:100%;")
        .child(
            Element::new("img")
                .attr("src", src)
                .attr("alt", "")
                .attr("loading", "lazy")
                .attr("style", "display:block;width:100%;height:auto;"),
        );

    for region in regions {
        if let Some(overlay) = render_hotspot(region) {
            wrapper.append(overlay);
        }
    }
    wrapper
}

fn hotspot_box(region: &Hotspot) -> String {
    let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    format!(
        "position:absolute;left:{};top:{};width:{};height:{};",
        css_percent(clamp(region.x)),
        css_percent(clamp(region.y)),
        css_percent(clamp(region.w)),
        css_percent(clamp(region.h)),
    )
}

/// Coupon regions become invisible buttons; tab references become in-page
/// tab links; other hrefs open in a new tab. Regions with neither are
/// dropped.
fn render_hotspot(region: &Hotspot) -> Option<Element> {
    let position = hotspot_box(region);

    if let Some(coupon) = region.coupon.as_deref().and_then(promo_core::normalize_csv) {
        return Some(
            Element::new("button")
                .attr("type", "button")
                .attr("class", "promo-hotspot promo-coupon")
                .attr("data-coupon", coupon)
                .attr("aria-label", "Download coupon")
                .attr(
                    "style",
                    format!("{position}background:transparent;border:0;padding:0;opacity:0;cursor:pointer;"),
                ),
        );
    }

    let href = region.href.as_deref()?.trim();
    if href.is_empty() {
        return None;
    }

    let link = Element::new("a")
        .attr("class", "promo-hotspot")
        .attr("style", format!("{position}display:block;"));

    if let Some(tab) = parse_tab_reference(href) {
        let panel = panel_id(tab);
        return Some(
            link.attr("href", format!("#{panel}"))
                .attr("data-tab-link", panel),
        );
    }

    Some(
        link.attr("href", absolute_url(href))
            .attr("target", "_blank")
            .attr("rel", "noopener noreferrer"),
    )
}

/// Prefixes `https://` when `href` carries no scheme.
#[must_use]
pub fn absolute_url(href: &str) -> String {
    let href = href.trim();
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{rest}");
    }
    let has_scheme = href
        .split_once(':')
        .is_some_and(|(scheme, _)| {
            !scheme.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        });
    if has_scheme {
        href.to_owned()
    } else {
        format!("https://{href}")
    }
}

fn render_video(video: &VideoBlock, options: &RenderOptions) -> Option<Element> {
    let id = video
        .youtube_id
        .as_deref()
        .and_then(resolve_video_id)
        .or_else(|| video.src.as_deref().and_then(resolve_video_id))?;

    let autoplay = video.autoplay || options.autoplay_all;
    let looping = video.looping || options.loop_all;
    let (w, h) = video.aspect_ratio();

    let iframe = Element::new("iframe")
        .attr("src", embed_url(&id, autoplay, looping))
        .attr("title", "YouTube video")
        .attr("allow", "autoplay; encrypted-media; picture-in-picture")
        .attr("allowfullscreen", "")
        .attr(
            "style",
            "position:absolute;top:0;left:0;width:100%;height:100%;border:0;",
        );

    let container_style = if options.supports_aspect_ratio {
        format!("position:relative;width:100%;aspect-ratio:{w}/{h};")
    } else {
        format!(
            "position:relative;width:100%;height:0;padding-top:{};",
            css_percent(h / w)
        )
    };

    Some(
        Element::new("div")
            .attr("class", "promo-video")
            .attr("data-video-id", id)
            .attr("style", container_style)
            .child(iframe),
    )
}

#[cfg(test)]
#[path = "blocks_test.rs"]
mod tests;
