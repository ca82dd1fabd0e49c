mod app;
mod cli;
mod format;

use std::io::Write;

use clap::Parser;
use marquee_api::{TimeWindow, TmdbClient};
use marquee_core::config::AppConfig;
use marquee_core::{Catalog, FavoritesStore, JsonFileBackend, ListingKind};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cli::{Cli, Command, ConfigAction, FavoritesAction};

const REDACTED: &str = "<redacted>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose);

    let config = AppConfig::load()?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Config { action } => config_command(action, &config, &mut stdout)?,
        Command::Trending { week, paging } => {
            let window = if week {
                TimeWindow::Week
            } else {
                TimeWindow::Day
            };
            build_app(&config)?
                .listing(ListingKind::Trending(window), paging.pages, &mut stdout)
                .await?;
        }
        Command::NowPlaying { paging } => {
            build_app(&config)?
                .listing(ListingKind::NowPlaying, paging.pages, &mut stdout)
                .await?;
        }
        Command::Search { term, paging } => {
            build_app(&config)?
                .search(&term.join(" "), paging.pages, &mut stdout)
                .await?;
        }
        Command::Movie { id } => build_app(&config)?.movie(id, &mut stdout).await?,
        Command::Trailer { id, open } => {
            build_app(&config)?
                .trailer(id, open, &mut stdout)
                .await?;
        }
        Command::Favorites { action } => {
            build_app(&config)?
                .favorites_command(action.unwrap_or(FavoritesAction::List), &mut stdout)
                .await?;
        }
    }

    stdout.flush()?;
    Ok(())
}

/// TMDB client plus the on-disk favorites store. Fails without credentials.
fn build_app(
    config: &AppConfig,
) -> Result<App<TmdbClient, JsonFileBackend>, Box<dyn std::error::Error>> {
    let Some(auth) = config.auth() else {
        return Err(format!(
            "no TMDB credentials: set TMDB_TOKEN or TMDB_API_KEY, or add api.access_token to {}",
            AppConfig::config_path().display()
        )
        .into());
    };
    let client = TmdbClient::new(auth)
        .with_base_url(&config.api.base_url)?
        .with_language(config.api.language.clone());

    let favorites_path = config.favorites_path();
    tracing::debug!(path = ?favorites_path, "favorites storage");
    let favorites = FavoritesStore::open(JsonFileBackend::new(favorites_path));

    Ok(App::new(
        Catalog::new(client, config.retry_policy()),
        favorites,
        config.api.image_base_url.clone(),
    ))
}

/// Log to stderr so listings on stdout stay pipeable.
fn init_logging(verbose: u8) -> tracing_appender::non_blocking::WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let default_directive = match verbose {
        0 => "marquee=info",
        1 => "marquee=debug",
        _ => "marquee=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .init();
    guard
}

fn config_command(
    action: ConfigAction,
    config: &AppConfig,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Path => {
            writeln!(out, "config:    {}", AppConfig::config_path().display())?;
            writeln!(out, "favorites: {}", config.favorites_path().display())?;
        }
        ConfigAction::Show => {
            let mut shown = config.clone();
            if shown.api.access_token.is_some() {
                shown.api.access_token = Some(REDACTED.into());
            }
            if shown.api.api_key.is_some() {
                shown.api.api_key = Some(REDACTED.into());
            }
            write!(out, "{}", toml::to_string_pretty(&shown)?)?;
        }
        ConfigAction::Init => {
            config.save()?;
            writeln!(out, "wrote {}", AppConfig::config_path().display())?;
        }
    }
    Ok(())
}
