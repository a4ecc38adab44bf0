use std::path::PathBuf;

use crate::Cli;

/// Resolved settings for one run, derived from CLI flags and their
/// environment-variable twins.
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit API URL; when set, the query flags below are ignored.
    pub search_url: Option<String>,
    pub addon_type: Option<AddonType>,
    pub query: Option<String>,
    pub page_size: usize,
    pub max_items: usize,
    /// Recency cutoff in days; zero or negative means unlimited.
    pub max_age_days: i64,
    pub outdir: PathBuf,
}

/// A normalised add-on type: the token the API expects and the singular
/// label the output file is named after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonType {
    pub token: String,
    pub label: String,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Config {
        Config {
            search_url: cli.search_url.filter(|s| !s.trim().is_empty()),
            addon_type: cli
                .addon_type
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(normalize_type),
            query: cli.query.filter(|s| !s.is_empty()),
            page_size: cli.page_size,
            max_items: cli.max_items,
            max_age_days: cli.max_age_days,
            outdir: cli.outdir,
        }
    }

    /// Filename for this run's feed: type-specific when a type filter was
    /// requested, the combined name otherwise.
    pub fn output_filename(&self) -> String {
        match &self.addon_type {
            Some(addon_type) => format!("amo_latest_{}s.xml", addon_type.label),
            None => "amo_latest_addons.xml".to_string(),
        }
    }
}

/// Map a user-supplied type to the API token and the filename label.
/// Recognised aliases (plural and internal forms included) resolve to the
/// canonical pair; anything else is passed to the API as given, with a
/// sanitised copy as the label.
pub fn normalize_type(raw: &str) -> AddonType {
    let lowered = raw.trim().to_lowercase();
    let known = match lowered.as_str() {
        "theme" | "themes" | "statictheme" | "static-theme" => Some(("statictheme", "theme")),
        "extension" | "extensions" => Some(("extension", "extension")),
        "dictionary" | "dictionaries" => Some(("dictionary", "dictionary")),
        "language" | "languages" | "langpack" | "langpacks" => Some(("language", "language")),
        _ => None,
    };
    match known {
        Some((token, label)) => AddonType {
            token: token.to_string(),
            label: label.to_string(),
        },
        None => AddonType {
            label: sanitize_label(&lowered),
            token: lowered,
        },
    }
}

/// Keep only alphanumerics, underscores and hyphens, lowercased; the result
/// is embedded in the output filename.
fn sanitize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .to_lowercase()
}
