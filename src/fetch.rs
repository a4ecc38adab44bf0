use std::time::Duration;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use reqwest::blocking::Client;

use crate::config::Config;
use crate::record::{CatalogRecord, SearchPage};
use crate::request;

/// How long a single page request may take before it is abandoned.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// How much of an error response body is echoed into the warning.
const ERROR_BODY_LIMIT: usize = 1000;

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("amo-rss/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Fetch and decode a single page of search results.
pub fn fetch_page(client: &Client, url: &str) -> Result<SearchPage> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        bail!("HTTP {status} from {url}: {}", truncate(&body, ERROR_BODY_LIMIT));
    }

    response
        .json::<SearchPage>()
        .with_context(|| format!("Failed to decode search results from {url}"))
}

/// Walk the paginated search results, concatenating pages until a stop
/// condition is hit: a failed request, an empty page, the item cap, or the
/// end of pagination. The server's `next` link is authoritative when
/// present; otherwise (and only when the start URL was built from
/// parameters) the page counter is advanced until a short page shows up.
///
/// Fetch failures are warnings, not errors: whatever was collected so far
/// still becomes a feed. The page source is a closure so the walk can be
/// exercised without a network.
pub fn collect_records<F>(cfg: &Config, mut fetch: F) -> Vec<CatalogRecord>
where
    F: FnMut(&str) -> Result<SearchPage>,
{
    let explicit = cfg.search_url.is_some();
    let mut page = 1;
    let mut url = match &cfg.search_url {
        Some(given) => given.clone(),
        None => request::build_search_url(cfg, page),
    };
    let mut records = Vec::new();

    loop {
        let batch = match fetch(&url) {
            Ok(batch) => batch,
            Err(err) => {
                eprintln!("{} {err:#}", "warning:".yellow());
                break;
            }
        };

        let count = batch.results.len();
        if count == 0 {
            break;
        }
        records.extend(batch.results);
        println!("Fetched {count} results ({} collected)", records.len());

        if records.len() >= cfg.max_items {
            break;
        }

        match batch.next {
            Some(next) => url = next,
            None if explicit => break,
            None => {
                // A short page is the last page in self-driven pagination.
                if count < cfg.page_size {
                    break;
                }
                page += 1;
                url = request::build_search_url(cfg, page);
            }
        }
    }

    records.truncate(cfg.max_items);
    records
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
