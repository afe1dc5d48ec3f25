use clap::Args;
use promo_client::MallClient;
use promo_core::AppConfig;

#[derive(Debug, Args)]
pub struct ProductsArgs {
    /// API origin, e.g. `https://api.example.com`
    #[arg(long)]
    pub api_base: String,

    #[arg(long)]
    pub mall_id: String,

    /// Comma-separated product numbers; takes precedence over `--category`
    #[arg(long)]
    pub ids: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Listing size for `--category` (defaults to `PROMO_PRODUCT_LIMIT`)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Comma-separated coupon numbers used to compute benefit prices
    #[arg(long)]
    pub coupons: Option<String>,
}

/// Fetches products and prints them as pretty JSON.
///
/// # Errors
///
/// Returns an error if neither `--ids` nor `--category` is given, the
/// client cannot be built, or the fetch fails.
pub(crate) async fn run_products(config: &AppConfig, args: &ProductsArgs) -> anyhow::Result<()> {
    if args.ids.is_none() && args.category.is_none() {
        anyhow::bail!("pass --ids or --category");
    }

    let api_root = format!("{}/api/{}", args.api_base.trim_end_matches('/'), args.mall_id);
    let client = MallClient::new(
        &api_root,
        config.http_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_ms,
    )?
    .with_coupons(args.coupons.clone());

    let products = client
        .fetch_products(
            args.ids.as_deref(),
            args.category.as_deref(),
            args.limit.unwrap_or(config.product_limit),
        )
        .await?;

    tracing::info!(count = products.len(), "products fetched");
    println!("{}", serde_json::to_string_pretty(&products)?);
    Ok(())
}
