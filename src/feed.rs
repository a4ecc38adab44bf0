use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rss::{Channel, ChannelBuilder, EnclosureBuilder, GuidBuilder, Item, ItemBuilder};

use crate::config::Config;
use crate::filter;
use crate::record::CatalogRecord;

const CHANNEL_TITLE: &str = "Latest Mozilla Add-on Releases";
const CHANNEL_DESCRIPTION: &str =
    "RSS feed of the latest add-on updates from Mozilla Add-ons (AMO)";
const CHANNEL_LINK: &str = "https://addons.mozilla.org/";
const ADDON_PAGE_BASE: &str = "https://addons.mozilla.org/en-US/firefox/addon/";

/// Render the collected records into an RSS 2.0 channel, one item per
/// record, preserving the API's result order.
pub fn build_channel(records: &[CatalogRecord]) -> Channel {
    ChannelBuilder::default()
        .title(CHANNEL_TITLE)
        .description(CHANNEL_DESCRIPTION)
        .link(CHANNEL_LINK)
        .language(Some("en-us".to_string()))
        .items(records.iter().map(render_item).collect::<Vec<_>>())
        .build()
}

/// Serialize the channel and write this run's feed file, overwriting any
/// previous contents. Returns the path written.
pub fn write_feed(cfg: &Config, channel: &Channel) -> Result<PathBuf> {
    fs::create_dir_all(&cfg.outdir).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            cfg.outdir.display()
        )
    })?;

    let path = cfg.outdir.join(cfg.output_filename());
    let xml = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{channel}");
    fs::write(&path, xml).with_context(|| format!("Failed to write feed to '{}'", path.display()))?;
    Ok(path)
}

/// Map one catalog record to a feed item. Every part is optional on its
/// own: a record with nothing but a slug still renders.
fn render_item(record: &CatalogRecord) -> Item {
    let name = record.name.best();
    let version = record.version();
    let title = if name.is_empty() && version.is_empty() {
        "Unknown".to_string()
    } else {
        format!("{name} v{version}")
    };

    let icon = record.icon();

    let pub_date = record
        .timestamp()
        .as_deref()
        .and_then(filter::parse_timestamp)
        .map(|stamp| stamp.to_rfc2822());

    let enclosure = icon.as_deref().map(|url| {
        EnclosureBuilder::default()
            .url(url)
            .mime_type(mime_for(url))
            .build()
    });

    // The GUID element is always present, even when empty.
    let guid = GuidBuilder::default()
        .value(record.guid())
        .permalink(false)
        .build();

    let slug = record.slug.render().unwrap_or_default();

    ItemBuilder::default()
        .title(Some(title))
        .description(Some(description_html(record, &name, &version, icon.as_deref())))
        .link(Some(format!("{ADDON_PAGE_BASE}{slug}/")))
        .pub_date(pub_date)
        .enclosure(enclosure)
        .author(record.author())
        .guid(Some(guid))
        .build()
}

/// Compose the HTML body shown by feed readers: icon, header, summary, and
/// a footer of whichever metadata fragments the record could produce.
fn description_html(
    record: &CatalogRecord,
    name: &str,
    version: &str,
    icon: Option<&str>,
) -> String {
    let mut parts = Vec::new();

    if let Some(url) = icon {
        parts.push(format!(
            r#"<img src="{url}" alt="icon" style="float:left;margin:0 10px 6px 0;width:64px;height:64px;"/>"#
        ));
    }

    if version.is_empty() {
        parts.push(format!("<div><strong>{name}</strong></div>"));
    } else {
        parts.push(format!("<div><strong>{name} v{version}</strong></div>"));
    }

    let summary = match record.summary.best() {
        s if s.is_empty() => "No description available".to_string(),
        s => s,
    };
    parts.push(format!("<div>{summary}</div>"));

    let mut meta = Vec::new();
    if let Some(author) = record.author() {
        meta.push(format!("Author: {author}"));
    }
    if let Some(users) = record.user_count() {
        meta.push(format!("Users: {users}"));
    }
    if let Some(rating) = record.rating() {
        meta.push(format!("Rating: {rating}"));
    }
    let categories = record.categories();
    if !categories.is_empty() {
        meta.push(format!("Categories: {}", categories.join(", ")));
    }
    let permissions = record.permissions();
    if !permissions.is_empty() {
        meta.push(format!("Permissions: {}", permissions.join(", ")));
    }
    if let Some(homepage) = record.homepage_line() {
        meta.push(homepage);
    }
    if let Some(minimum) = record.min_compatible_version() {
        meta.push(format!("Requires Firefox \u{2265} {minimum}"));
    }
    if let Some(id) = record.display_id() {
        meta.push(format!("ID: {id}"));
    }

    if !meta.is_empty() {
        parts.push(format!(
            r#"<div style="margin-top:6px;color:#666;font-size:0.95em;">{}</div>"#,
            meta.join(" \u{2022} ")
        ));
    }

    parts.join("\n")
}

fn mime_for(url: &str) -> &'static str {
    let lowered = url.to_ascii_lowercase();
    if lowered.ends_with(".jpg") || lowered.ends_with(".jpeg") {
        "image/jpeg"
    } else if lowered.ends_with(".gif") {
        "image/gif"
    } else {
        "image/png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<CatalogRecord> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn single_result_page_renders_one_item() {
        let records = records(json!([
            {"name": "Foo", "current_version": {"version": "1.0"}, "slug": "foo"}
        ]));
        let channel = build_channel(&records);

        assert_eq!(channel.items().len(), 1);
        let item = &channel.items()[0];
        assert_eq!(item.title(), Some("Foo v1.0"));
        assert_eq!(
            item.link(),
            Some("https://addons.mozilla.org/en-US/firefox/addon/foo/")
        );
        assert_eq!(item.pub_date(), None);
        assert_eq!(item.guid().map(|g| g.value()), Some("foo"));
    }

    #[test]
    fn channel_metadata_is_fixed() {
        let channel = build_channel(&[]);
        assert_eq!(channel.title(), CHANNEL_TITLE);
        assert_eq!(channel.link(), CHANNEL_LINK);
        assert_eq!(channel.language(), Some("en-us"));
        assert!(channel.items().is_empty());
    }

    #[test]
    fn item_count_matches_record_count() {
        let records = records(json!([{}, {"slug": "a"}, {"name": "B"}]));
        assert_eq!(build_channel(&records).items().len(), 3);
    }

    #[test]
    fn title_is_unknown_without_name_and_version() {
        let records = records(json!([{"slug": "mystery"}]));
        assert_eq!(build_channel(&records).items()[0].title(), Some("Unknown"));
    }

    #[test]
    fn pub_date_is_rfc2822() {
        let records = records(json!([
            {"slug": "x", "last_updated": "2024-06-01T08:30:00Z"}
        ]));
        let channel = build_channel(&records);
        assert_eq!(
            channel.items()[0].pub_date(),
            Some("Sat, 1 Jun 2024 08:30:00 +0000")
        );
    }

    #[test]
    fn enclosure_only_when_an_icon_resolved() {
        let with_icon = records(json!([{"icon_url": "https://cdn/icon.png"}]));
        let channel = build_channel(&with_icon);
        let enclosure = channel.items()[0].enclosure().unwrap();
        assert_eq!(enclosure.url(), "https://cdn/icon.png");
        assert_eq!(enclosure.mime_type(), "image/png");

        let without = records(json!([{"slug": "plain"}]));
        assert!(build_channel(&without).items()[0].enclosure().is_none());
    }

    #[test]
    fn mime_type_follows_the_extension() {
        assert_eq!(mime_for("https://cdn/a.jpg"), "image/jpeg");
        assert_eq!(mime_for("https://cdn/a.JPEG"), "image/jpeg");
        assert_eq!(mime_for("https://cdn/a.gif"), "image/gif");
        assert_eq!(mime_for("https://cdn/a.svg"), "image/png");
    }

    #[test]
    fn description_contains_all_fragments() {
        let records = records(json!([{
            "name": "Foo",
            "summary": "Does things",
            "current_version": {
                "version": "2.1",
                "compatibility": {"firefox": {"min": "102.0"}}
            },
            "slug": "foo",
            "id": 99,
            "icons": {"64": "https://cdn/icon64.png"},
            "authors": [{"name": "Jane"}],
            "average_daily_users": 1200,
            "rating": 4.5,
            "categories": [{"name": "Privacy"}],
            "permissions": ["tabs"],
            "homepage": "https://example.com"
        }]));
        let channel = build_channel(&records);
        let description = channel.items()[0].description().unwrap();

        assert!(description.contains(r#"<img src="https://cdn/icon64.png""#));
        assert!(description.contains("<div><strong>Foo v2.1</strong></div>"));
        assert!(description.contains("<div>Does things</div>"));
        assert!(description.contains("Author: Jane"));
        assert!(description.contains("Users: 1200"));
        assert!(description.contains("Rating: 4.5"));
        assert!(description.contains("Categories: Privacy"));
        assert!(description.contains("Permissions: tabs"));
        assert!(description.contains("Homepage: https://example.com"));
        assert!(description.contains("Requires Firefox \u{2265} 102.0"));
        assert!(description.contains("ID: 99"));
        assert!(description.contains(" \u{2022} "));
    }

    #[test]
    fn description_defaults_without_metadata() {
        let records = records(json!([{"name": "Bare"}]));
        let channel = build_channel(&records);
        let description = channel.items()[0].description().unwrap();

        assert!(description.contains("No description available"));
        assert!(!description.contains("<img"));
        assert!(!description.contains("margin-top:6px"));
    }

    #[test]
    fn serialized_channel_round_trips() {
        let records = records(json!([
            {"name": "Foo", "slug": "foo"},
            {"name": "Bar", "slug": "bar", "last_updated": "2024-06-01T00:00:00Z"}
        ]));
        let channel = build_channel(&records);

        let reparsed = Channel::read_from(channel.to_string().as_bytes()).unwrap();
        assert_eq!(reparsed.items().len(), 2);
        assert_eq!(reparsed.items()[0].title(), Some("Foo v"));
        assert_eq!(reparsed.title(), CHANNEL_TITLE);
    }

    #[test]
    fn write_feed_emits_declaration_and_type_specific_name() {
        let outdir = std::env::temp_dir().join(format!("amo-rss-test-{}", std::process::id()));
        let cfg = Config {
            search_url: None,
            addon_type: Some(crate::config::normalize_type("theme")),
            query: None,
            page_size: 50,
            max_items: 200,
            max_age_days: 0,
            outdir: outdir.clone(),
        };

        let channel = build_channel(&[]);
        let path = write_feed(&cfg, &channel).unwrap();
        assert!(path.ends_with("amo_latest_themes.xml"));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(written.contains("<rss"));

        fs::remove_dir_all(&outdir).unwrap();
    }
}
