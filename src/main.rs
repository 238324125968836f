use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::KeyResolver;
use crate::registry::PageRegistry;

mod app;
mod browser;
mod cli;
pub mod commands;
mod config;
mod editor;
mod page;
mod pages;
mod record;
mod registry;
mod search;
mod source;
mod theme;
pub mod tui;
mod ui;

pub use theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = cli::Args::parse();

    let config = config::load()?;
    let mut registry = PageRegistry::new();
    pages::register_all(&mut registry, &config.data);
    if registry.is_empty() {
        return Err(eyre!("No pages are registered"));
    }

    if args.list_pages {
        for provider in registry.providers() {
            println!("{:<16}{:<20}{}", provider.key(), provider.display_name(), provider.description());
        }
        return Ok(());
    }

    let _guard = initialize_logging()?;
    info!("Starting medboard with {} pages", registry.len());

    let resolver = Arc::new(KeyResolver::new(Arc::new(config.keybindings.clone())));
    let theme = theme::theme_from_name(&config.theme.name);

    let mut app = App::new(registry, &config, resolver, theme);
    app.apply_cli_args(&args, config.last_page.as_deref())?;
    app.run().await?;

    info!("Exiting medboard");
    Ok(())
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = dirs::data_local_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("medboard").join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "medboard.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}
