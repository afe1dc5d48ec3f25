use super::*;

fn text(t: &str) -> ContentBlock {
    ContentBlock::Text {
        text: t.to_owned(),
        style: TextStyle::default(),
    }
}

fn image(regions: Vec<Hotspot>) -> ContentBlock {
    ContentBlock::Image {
        src: "https://cdn.example.com/banner.jpg".to_owned(),
        regions,
    }
}

fn video(id: Option<&str>, src: Option<&str>) -> ContentBlock {
    ContentBlock::Video(VideoBlock {
        youtube_id: id.map(str::to_owned),
        src: src.map(str::to_owned),
        ..VideoBlock::default()
    })
}

fn region(href: Option<&str>, coupon: Option<&str>) -> Hotspot {
    Hotspot {
        x: 0.1,
        y: 0.25,
        w: 0.5,
        h: 0.125,
        href: href.map(str::to_owned),
        coupon: coupon.map(str::to_owned),
    }
}

fn render(blocks: &[ContentBlock], options: &RenderOptions) -> Element {
    let mut root = Element::new("div");
    render_blocks(&mut root, blocks, options);
    root
}

#[test]
fn one_top_level_node_per_block_in_order() {
    let blocks = vec![text("a"), image(vec![]), video(Some("dQw4w9WgXcQ"), None), text("b")];
    let root = render(&blocks, &RenderOptions::default());
    let classes: Vec<&str> = root
        .child_elements()
        .map(|e| e.get_attr("class").unwrap_or_default())
        .collect();
    assert_eq!(
        classes,
        vec!["promo-text", "promo-image", "promo-video", "promo-text"]
    );
}

#[test]
fn ignore_text_omits_text_blocks_only() {
    let blocks = vec![text("a"), image(vec![]), text("b")];
    let options = RenderOptions {
        ignore_text: true,
        ..RenderOptions::default()
    };
    let root = render(&blocks, &options);
    assert_eq!(root.children.len(), 1);
    assert!(root.child_elements().all(|e| e.has_class("promo-image")));
}

#[test]
fn render_clears_previous_content() {
    let mut root = Element::new("div").child(Element::new("p").text("stale"));
    render_blocks(&mut root, &[text("fresh")], &RenderOptions::default());
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.text_content(), "fresh");
}

#[test]
fn text_is_escaped_and_newlines_become_breaks() {
    let root = render(&[text("<b>Sale</b>\nToday & tomorrow")], &RenderOptions::default());
    let html = root.to_html();
    assert!(html.contains("&lt;b&gt;Sale&lt;/b&gt;<br>Today &amp; tomorrow"), "{html}");
}

#[test]
fn text_style_applies_defaults_and_pixels() {
    let block = ContentBlock::Text {
        text: "x".to_owned(),
        style: TextStyle {
            align: Some("left".to_owned()),
            font_size: Some("24".to_owned()),
            font_weight: Some("700".to_owned()),
            margin_top: Some("1.5em".to_owned()),
            ..TextStyle::default()
        },
    };
    let el = render_block(&block, &RenderOptions::default()).unwrap();
    let style = el.get_attr("style").unwrap();
    assert!(style.contains("text-align:left;"), "{style}");
    assert!(style.contains("margin:1.5em 0 0 0;"), "{style}");
    assert!(style.contains("font-size:24px;"), "{style}");
    assert!(style.contains("font-weight:700;"), "{style}");
    assert!(style.contains("color:#333333;"), "{style}");
}

#[test]
fn text_style_cannot_inject_declarations() {
    let block = ContentBlock::Text {
        text: "x".to_owned(),
        style: TextStyle {
            color: Some("red;background:url(x)".to_owned()),
            align: Some("middle".to_owned()),
            ..TextStyle::default()
        },
    };
    let el = render_block(&block, &RenderOptions::default()).unwrap();
    let style = el.get_attr("style").unwrap();
    assert!(!style.contains("red;"), "{style}");
    assert!(style.contains("text-align:center;"), "{style}");
}

#[test]
fn image_hotspots_use_fractional_positions() {
    let el = render_block(
        &image(vec![region(Some("https://shop.example.com/sale"), None)]),
        &RenderOptions::default(),
    )
    .unwrap();
    let spots = el.find_all(&|e| e.has_class("promo-hotspot"));
    assert_eq!(spots.len(), 1);
    let style = spots[0].get_attr("style").unwrap();
    assert!(
        style.starts_with("position:absolute;left:10%;top:25%;width:50%;height:12.5%;"),
        "{style}"
    );
    assert_eq!(spots[0].get_attr("target"), Some("_blank"));
    assert_eq!(spots[0].get_attr("href"), Some("https://shop.example.com/sale"));
}

#[test]
fn coupon_hotspot_renders_invisible_button() {
    let el = render_block(
        &image(vec![region(Some("https://ignored.example.com"), Some(" 6001, 6002 "))]),
        &RenderOptions::default(),
    )
    .unwrap();
    let buttons = el.find_all(&|e| e.tag == "button");
    assert_eq!(buttons.len(), 1);
    assert_eq!(buttons[0].get_attr("data-coupon"), Some("6001,6002"));
    assert!(buttons[0].get_attr("style").unwrap().contains("opacity:0;"));
    assert!(el.find_all(&|e| e.tag == "a").is_empty());
}

#[test]
fn tab_reference_hotspot_becomes_tab_link() {
    for href in ["tab-2", "tab:2", "TAB 2", "tab2", "#tab-2"] {
        let el = render_block(&image(vec![region(Some(href), None)]), &RenderOptions::default())
            .unwrap();
        let links = el.find_all(&|e| e.tag == "a");
        assert_eq!(links[0].get_attr("href"), Some("#tab-2"), "href: {href}");
        assert_eq!(links[0].get_attr("data-tab-link"), Some("tab-2"), "href: {href}");
        assert_eq!(links[0].get_attr("target"), None, "href: {href}");
    }
}

#[test]
fn hotspot_without_action_is_dropped() {
    let el = render_block(&image(vec![region(None, None), region(Some("  "), None)]), &RenderOptions::default())
        .unwrap();
    assert!(el.find_all(&|e| e.has_class("promo-hotspot")).is_empty());
}

#[test]
fn hotspot_coordinates_are_clamped() {
    let mut r = region(Some("https://x.example.com"), None);
    r.x = -0.5;
    r.w = 3.0;
    r.h = f64::NAN;
    let el = render_block(&image(vec![r]), &RenderOptions::default()).unwrap();
    let spot = el.find_all(&|e| e.has_class("promo-hotspot"))[0];
    let style = spot.get_attr("style").unwrap();
    assert!(style.contains("left:0%;"), "{style}");
    assert!(style.contains("width:100%;"), "{style}");
    assert!(style.contains("height:0%;"), "{style}");
}

#[test]
fn absolute_url_prefixes_missing_scheme() {
    assert_eq!(absolute_url("shop.example.com/a"), "https://shop.example.com/a");
    assert_eq!(absolute_url("//cdn.example.com/a"), "https://cdn.example.com/a");
    assert_eq!(absolute_url("http://shop.example.com"), "http://shop.example.com");
    assert_eq!(absolute_url("mailto:help@example.com"), "mailto:help@example.com");
}

#[test]
fn video_without_resolvable_id_is_skipped() {
    let blocks = vec![video(None, Some("https://vimeo.com/1")), video(None, None)];
    let root = render(&blocks, &RenderOptions::default());
    assert!(root.children.is_empty());
}

#[test]
fn video_resolves_id_from_src_url() {
    let el = render_block(
        &video(None, Some("https://youtu.be/dQw4w9WgXcQ")),
        &RenderOptions::default(),
    )
    .unwrap();
    assert_eq!(el.get_attr("data-video-id"), Some("dQw4w9WgXcQ"));
}

#[test]
fn page_flags_are_ored_into_video_params() {
    let options = RenderOptions {
        autoplay_all: true,
        loop_all: true,
        ..RenderOptions::default()
    };
    let el = render_block(&video(Some("dQw4w9WgXcQ"), None), &options).unwrap();
    let iframe = el.find_all(&|e| e.tag == "iframe")[0];
    let src = iframe.get_attr("src").unwrap();
    assert!(src.contains("autoplay=1&mute=1"), "{src}");
    assert!(src.contains("loop=1&playlist=dQw4w9WgXcQ"), "{src}");
}

#[test]
fn block_flags_apply_without_page_flags() {
    let block = ContentBlock::Video(VideoBlock {
        youtube_id: Some("dQw4w9WgXcQ".to_owned()),
        looping: true,
        ..VideoBlock::default()
    });
    let el = render_block(&block, &RenderOptions::default()).unwrap();
    let src = el.find_all(&|e| e.tag == "iframe")[0].get_attr("src").unwrap().to_owned();
    assert!(src.contains("loop=1&playlist=dQw4w9WgXcQ"), "{src}");
    assert!(!src.contains("autoplay"), "{src}");
}

#[test]
fn video_uses_aspect_ratio_when_supported() {
    let block = ContentBlock::Video(VideoBlock {
        youtube_id: Some("dQw4w9WgXcQ".to_owned()),
        ratio: Some("4:3".to_owned()),
        ..VideoBlock::default()
    });
    let el = render_block(&block, &RenderOptions::default()).unwrap();
    assert!(el.get_attr("style").unwrap().contains("aspect-ratio:4/3;"));
}

#[test]
fn video_falls_back_to_padding_box() {
    let options = RenderOptions {
        supports_aspect_ratio: false,
        ..RenderOptions::default()
    };
    let el = render_block(&video(Some("dQw4w9WgXcQ"), None), &options).unwrap();
    let style = el.get_attr("style").unwrap();
    assert!(style.contains("height:0;padding-top:56.25%;"), "{style}");
    assert!(!style.contains("aspect-ratio"), "{style}");
}

#[test]
fn unknown_blocks_render_nothing() {
    let root = render(&[ContentBlock::Unknown, text("x")], &RenderOptions::default());
    assert_eq!(root.children.len(), 1);
}
