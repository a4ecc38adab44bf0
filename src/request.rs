use url::form_urlencoded;

use crate::config::Config;

/// AMO v5 search endpoint.
pub const SEARCH_ENDPOINT: &str = "https://addons.mozilla.org/api/v5/addons/search/";

/// Build the search URL for one page of results, sorted by last update.
/// Values are percent-encoded, so free-text queries cannot leak extra
/// parameters into the query string. A run with an explicit search URL
/// never calls this.
pub fn build_search_url(cfg: &Config, page: usize) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("sort", "updated");
    query.append_pair("page_size", &cfg.page_size.to_string());
    query.append_pair("page", &page.to_string());
    if let Some(addon_type) = &cfg.addon_type {
        query.append_pair("type", &addon_type.token);
    }
    if let Some(text) = &cfg.query {
        query.append_pair("q", text);
    }
    format!("{SEARCH_ENDPOINT}?{}", query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::normalize_type;
    use std::path::PathBuf;

    fn base_config() -> Config {
        Config {
            search_url: None,
            addon_type: None,
            query: None,
            page_size: 50,
            max_items: 200,
            max_age_days: 0,
            outdir: PathBuf::from("public"),
        }
    }

    #[test]
    fn default_url_has_sort_size_and_page() {
        let url = build_search_url(&base_config(), 1);
        assert!(url.starts_with(SEARCH_ENDPOINT));
        assert!(url.contains("sort=updated"));
        assert!(url.contains("page_size=50"));
        assert!(url.contains("page=1"));
        assert!(!url.contains("type="));
        assert!(!url.contains("q="));
    }

    #[test]
    fn page_number_is_threaded_through() {
        let url = build_search_url(&base_config(), 4);
        assert!(url.contains("page=4"));
    }

    #[test]
    fn type_filter_uses_the_api_token() {
        let cfg = Config {
            addon_type: Some(normalize_type("theme")),
            ..base_config()
        };
        assert!(build_search_url(&cfg, 1).contains("type=statictheme"));
    }

    #[test]
    fn query_text_is_encoded() {
        let cfg = Config {
            query: Some("dark mode & more".to_string()),
            ..base_config()
        };
        let url = build_search_url(&cfg, 1);
        assert!(url.contains("q=dark+mode+%26+more"));
    }
}
