mod page;
mod products;
mod render;
mod watch;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::page::PageArgs;
use crate::products::ProductsArgs;

#[derive(Debug, Parser)]
#[command(name = "promo-cli")]
#[command(about = "Promotional widget command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the widget for one page and print the rendered HTML
    Render {
        #[command(flatten)]
        page: PageArgs,

        /// Write the HTML to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fetch products by ID or category and print them as JSON
    Products(ProductsArgs),
    /// Keep a page's product grid caches fresh until interrupted
    Watch {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = promo_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(env = %config.env, "configuration loaded");

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Render { page, out }) => render::run_render(&config, &page, out.as_deref()).await,
        Some(Commands::Products(args)) => products::run_products(&config, &args).await,
        Some(Commands::Watch { page }) => watch::run_watch(&config, &page).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
