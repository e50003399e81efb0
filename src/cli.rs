//! Command-line interface definitions for apodcache.
//!
//! # Example
//!
//! ```bash
//! # Cache today's picture and set it as the desktop background
//! apodcache fetch
//!
//! # Cache a specific date without touching the desktop
//! apodcache fetch 2022-05-01 --no-background
//!
//! # List everything in the cache
//! apodcache list
//!
//! # Show one record as JSON
//! apodcache show 3 --json
//! ```

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::apod::parse_apod_date;

/// Download NASA's Astronomy Picture of the Day into a local cache.
///
/// Images are stored once per unique content, no matter how many dates
/// point at them.
#[derive(Debug, Parser)]
#[command(name = "apodcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Image cache directory (overrides configuration)
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Cache the picture for a date and set it as the desktop background
    Fetch(FetchArgs),
    /// List cached pictures
    List(ListArgs),
    /// Show a cached picture by id
    Show(ShowArgs),
}

/// Arguments for the fetch subcommand.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// APOD date (YYYY-MM-DD, from 1995-06-16 to today; default: today)
    #[arg(value_name = "DATE", value_parser = parse_apod_date)]
    pub date: Option<NaiveDate>,

    /// Do not change the desktop background
    #[arg(long)]
    pub no_background: bool,

    /// Print the resulting record as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the list subcommand.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print full records as JSON instead of titles
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the show subcommand.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Record id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Print the record as JSON
    #[arg(long)]
    pub json: bool,
}
