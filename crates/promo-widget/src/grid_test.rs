use super::*;
use crate::storage::MemoryStorage;

fn product(no: &str, price: &str) -> ProductRecord {
    ProductRecord {
        product_no: no.to_owned(),
        product_name: format!("Product {no}"),
        summary_description: "Soft cotton".to_owned(),
        price: price.to_owned(),
        list_image: format!("https://cdn.example.com/{no}.jpg"),
        ..ProductRecord::default()
    }
}

/// A client that would fail any request; cache hits must not need it.
fn offline_loader(storage: Arc<MemoryStorage>) -> GridLoader {
    let client = MallClient::new("http://127.0.0.1:9/api/mall", 1, "test", 0, 1).unwrap();
    GridLoader::new(client, storage, "summer", 300)
}

fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn format_price_groups_thousands() {
    assert_eq!(format_price(Decimal::new(1000, 0)), "1,000원");
    assert_eq!(format_price(Decimal::new(1_290_000, 2)), "12,900원");
    assert_eq!(format_price(Decimal::new(999, 0)), "999원");
    assert_eq!(format_price(Decimal::new(1_234_567, 0)), "1,234,567원");
    assert_eq!(format_price(Decimal::ZERO), "0원");
    assert_eq!(format_price(Decimal::new(9995, 1)), "1,000원");
}

#[test]
fn grid_attributes_prefer_direct_ids() {
    let grid = GridElement::from_attributes(
        "g1",
        &attrs(&[
            ("data-direct-nos", " 11, 12 ,"),
            ("data-cate-no", "40"),
            ("data-columns", "3"),
            ("data-panel", "tab-2"),
        ]),
    );
    assert_eq!(
        grid.selector,
        Some(GridSelector::Direct(vec!["11".to_owned(), "12".to_owned()]))
    );
    assert_eq!(grid.columns, 3);
    assert_eq!(grid.panel.as_deref(), Some("tab-2"));
}

#[test]
fn grid_attributes_default_columns() {
    let grid = GridElement::from_attributes("g", &attrs(&[("data-cate-no", "40"), ("data-columns", "0")]));
    assert_eq!(grid.columns, DEFAULT_COLUMNS);
    assert_eq!(grid.selector, Some(GridSelector::Category("40".to_owned())));

    let bare = GridElement::from_attributes("g", &attrs(&[]));
    assert!(bare.selector.is_none());
}

#[tokio::test]
async fn grid_without_selector_is_left_alone() {
    let storage = Arc::new(MemoryStorage::new());
    let loader = offline_loader(Arc::clone(&storage));
    let mut grid = GridElement::new("g", None);
    loader.load_panel(&mut grid).await;
    assert_eq!(grid.state, GridState::Empty);
    assert_eq!(storage.write_count(), 0);
}

#[tokio::test]
async fn cache_hit_renders_without_network() {
    let storage = Arc::new(MemoryStorage::new());
    let loader = offline_loader(Arc::clone(&storage));
    let selector = GridSelector::Category("40".to_owned());
    let products = vec![product("1", "1000")];
    loader.store(&loader.cache_key(&selector), &products).unwrap();

    let mut grid = GridElement::new("g", Some(selector));
    loader.load_panel(&mut grid).await;

    assert_eq!(grid.state, GridState::Ready(products));
}

#[tokio::test]
async fn cache_round_trip_renders_identical_text() {
    let storage = Arc::new(MemoryStorage::new());
    let loader = offline_loader(Arc::clone(&storage));
    let selector = GridSelector::Direct(vec!["1".to_owned(), "2".to_owned(), "3".to_owned()]);
    let mut discounted = product("2", "12,900");
    discounted.sale_price = Some("9900".to_owned());
    let mut coupon = product("3", "20000.00");
    coupon.benefit_price = Some("15000.00".to_owned());
    coupon.benefit_percentage = Some("25".to_owned());
    let products = vec![product("1", "1000"), discounted, coupon];

    let direct = render_products(&products, DEFAULT_COLUMNS);

    loader.store(&loader.cache_key(&selector), &products).unwrap();
    let mut grid = GridElement::new("g", Some(selector));
    loader.load_panel(&mut grid).await;
    let GridState::Ready(cached) = &grid.state else {
        panic!("expected Ready, got {:?}", grid.state);
    };
    let from_cache = render_products(cached, DEFAULT_COLUMNS);

    assert_eq!(direct.text_content(), from_cache.text_content());
    assert_eq!(direct.to_html(), from_cache.to_html());
}

#[tokio::test]
async fn corrupt_cache_entry_is_dropped_and_load_fails_offline() {
    let storage = Arc::new(MemoryStorage::new());
    let loader = offline_loader(Arc::clone(&storage));
    let selector = GridSelector::Category("40".to_owned());
    let key = loader.cache_key(&selector);
    storage.set(&key, "{not json").unwrap();

    let mut grid = GridElement::new("g", Some(selector));
    loader.load_panel(&mut grid).await;

    assert!(storage.get(&key).unwrap().is_none());
    assert!(matches!(grid.state, GridState::Failed(_)), "{:?}", grid.state);
}

#[test]
fn store_skips_identical_serialization() {
    let storage = Arc::new(MemoryStorage::new());
    let loader = offline_loader(Arc::clone(&storage));
    let products = vec![product("1", "1000")];

    assert_eq!(loader.store("k", &products).unwrap(), StoreOutcome::Updated);
    assert_eq!(loader.store("k", &products).unwrap(), StoreOutcome::Unchanged);
    assert_eq!(storage.write_count(), 1);

    let changed = vec![product("1", "1100")];
    assert_eq!(loader.store("k", &changed).unwrap(), StoreOutcome::Updated);
    assert_eq!(storage.write_count(), 2);
}

#[test]
fn ready_grid_uses_column_count() {
    let mut grid = GridElement::new("g", None);
    grid.columns = 3;
    grid.state = GridState::Ready(vec![product("1", "1000"), ProductRecord::default()]);
    let el = render_grid(&grid);
    let inner = el.find_all(&|e| e.has_class("promo-grid"))[0];
    assert!(inner
        .get_attr("style")
        .unwrap()
        .contains("grid-template-columns:repeat(3,minmax(0,1fr));"));
    // Placeholder records are not rendered.
    assert_eq!(inner.children.len(), 1);
}

#[test]
fn loading_and_failed_states_render_indicators() {
    let mut grid = GridElement::new("g7", None);
    grid.state = GridState::Loading;
    assert_eq!(render_grid(&grid).find_all(&|e| e.has_class("promo-loading")).len(), 1);

    grid.state = GridState::Failed("boom".to_owned());
    let el = render_grid(&grid);
    assert!(el.find_all(&|e| e.has_class("promo-loading")).is_empty());
    let retry = el.find_all(&|e| e.get_attr("data-action") == Some("retry-grid"));
    assert_eq!(retry.len(), 1);
    assert_eq!(retry[0].get_attr("data-grid-id"), Some("g7"));
}

#[test]
fn card_shows_exactly_one_price_presentation() {
    let plain = render_products(&[product("1", "1000")], 4);
    assert_eq!(plain.find_all(&|e| e.has_class("promo-price")).len(), 1);
    assert!(plain.text_content().contains("1,000원"));
    assert!(plain.find_all(&|e| e.tag == "del").is_empty());

    let mut sale = product("2", "1000");
    sale.sale_price = Some("750".to_owned());
    let el = render_products(&[sale], 4);
    let discount = el.find_all(&|e| e.has_class("promo-discount"));
    assert_eq!(discount[0].text_content(), "25%");
    assert_eq!(el.find_all(&|e| e.has_class("promo-price-sale"))[0].text_content(), "750원");

    let mut benefit = product("3", "1000");
    benefit.sale_price = Some("900".to_owned());
    benefit.benefit_price = Some("800".to_owned());
    let el = render_products(&[benefit], 4);
    assert_eq!(el.find_all(&|e| e.has_class("promo-price")).len(), 1);
    assert_eq!(el.find_all(&|e| e.has_class("promo-benefit")).len(), 1);
    assert!(el.find_all(&|e| e.has_class("promo-price-sale")).is_empty());
    assert_eq!(el.find_all(&|e| e.has_class("promo-discount"))[0].text_content(), "20%");
}
