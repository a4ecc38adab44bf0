mod config;
mod feed;
mod fetch;
mod filter;
mod record;
mod request;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;

use crate::config::Config;

/// Command-line arguments for amo-rss. Every flag can also be supplied
/// through its environment variable, which is how scheduled CI runs drive
/// the program.
#[derive(Parser, Debug)]
#[command(name = "amo-rss")]
#[command(version, about = "Generate RSS feeds of the latest add-on releases on addons.mozilla.org")]
pub struct Cli {
    /// Full AMO search API URL, used verbatim (overrides the query flags)
    #[arg(long, env = "AMO_SEARCH_URL")]
    pub search_url: Option<String>,

    /// Add-on type to filter by (e.g. extension, theme)
    #[arg(long = "type", env = "AMO_TYPE")]
    pub addon_type: Option<String>,

    /// Free-text search query
    #[arg(short, long, env = "AMO_QUERY")]
    pub query: Option<String>,

    /// Number of results to request per page
    #[arg(long, env = "AMO_PAGE_SIZE", default_value_t = 50)]
    pub page_size: usize,

    /// Maximum number of results to collect across all pages
    #[arg(long, env = "AMO_MAX_ITEMS", default_value_t = 200)]
    pub max_items: usize,

    /// Drop results older than this many days (0 keeps everything)
    #[arg(long, env = "AMO_MAX_AGE_DAYS", default_value_t = 0)]
    pub max_age_days: i64,

    /// Directory the feed file is written into
    #[arg(long, env = "AMO_OUTDIR", default_value = "public")]
    pub outdir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::from_cli(cli);

    let client = fetch::build_client()?;
    let records = fetch::collect_records(&cfg, |url| fetch::fetch_page(&client, url));
    let records = filter::recent_only(records, cfg.max_age_days, Utc::now());

    let channel = feed::build_channel(&records);
    let path = feed::write_feed(&cfg, &channel)?;
    println!(
        "RSS feed generated: {} ({} items)",
        path.display(),
        channel.items().len()
    );

    Ok(())
}
