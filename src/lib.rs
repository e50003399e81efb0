//! apodcache - Astronomy Picture of the Day cache
//!
//! Downloads NASA's Astronomy Picture of the Day, stores each distinct image
//! exactly once in a content-addressable local cache (SHA-256 keyed, SQLite
//! metadata) and optionally sets it as the desktop background.

pub mod apod;
pub mod cache;
pub mod cli;
pub mod config;
pub mod desktop;
pub mod error;
pub mod logging;
pub mod manager;

use anyhow::{Context, Result};
use chrono::Local;

use crate::apod::ApodClient;
use crate::cache::{CacheLocation, CacheRecord, MetadataStore};
use crate::cli::{Cli, Commands, FetchArgs, ListArgs, ShowArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::manager::{CacheError, CacheManager};

/// Run the command described by `cli`.
///
/// Logging must already be initialized. Errors wrapping a
/// [`CacheError`] keep it reachable through `downcast_ref` so the caller can
/// pick an exit code with [`ExitCode::from_error`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::try_load_from_path(path)?,
        None => Config::load(),
    };
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = Some(dir);
    }
    let location = config.cache_location()?;
    log::debug!("Image cache dir: {}", location.dir().display());

    match cli.command {
        Commands::Fetch(args) => run_fetch(&config, location, &args),
        Commands::List(args) => run_list(&location, &args),
        Commands::Show(args) => run_show(&location, &args),
    }
}

fn run_fetch(config: &Config, location: CacheLocation, args: &FetchArgs) -> Result<ExitCode> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let client = ApodClient::new(&config.api_url, config.api_key.clone(), config.timeout())
        .map_err(CacheError::from)?;
    let manager = CacheManager::open(location, client)?;
    let record = manager
        .ensure_cached(date)
        .with_context(|| format!("Failed to cache APOD for {date}"))?;

    print_record(&record, args.json)?;

    if config.set_background && !args.no_background {
        if let Err(e) = desktop::set_desktop_background(&record.file_path) {
            log::warn!("Could not set desktop background: {}", e);
        }
    }
    Ok(ExitCode::Success)
}

fn run_list(location: &CacheLocation, args: &ListArgs) -> Result<ExitCode> {
    let store = MetadataStore::initialize(location).map_err(CacheError::from)?;

    if args.json {
        let records = store.list().map_err(CacheError::from)?;
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        let titles = store.all_titles().map_err(CacheError::from)?;
        if titles.is_empty() {
            log::info!("The image cache is empty");
        }
        for title in titles {
            println!("{title}");
        }
    }
    Ok(ExitCode::Success)
}

fn run_show(location: &CacheLocation, args: &ShowArgs) -> Result<ExitCode> {
    let store = MetadataStore::initialize(location).map_err(CacheError::from)?;
    let record = store
        .get_by_id(args.id)
        .map_err(CacheError::from)?
        .with_context(|| format!("No cached image with id {}", args.id))?;

    print_record(&record, args.json)?;
    Ok(ExitCode::Success)
}

fn print_record(record: &CacheRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        println!("id:       {}", record.id);
        println!("title:    {}", record.title);
        println!("file:     {}", record.file_path.display());
        println!("sha256:   {}", record.content_hash);
        println!();
        println!("{}", record.explanation);
    }
    Ok(())
}
