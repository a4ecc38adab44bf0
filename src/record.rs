use serde::Deserialize;
use serde_json::{Map, Value};

/// One page of search results as returned by the AMO API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchPage {
    pub results: Vec<CatalogRecord>,
    /// Absolute URL of the following page, when the server provides one.
    pub next: Option<String>,
}

/// A single add-on listing from the search API.
///
/// The API guarantees none of these fields, and several of them change shape
/// between records (string vs. locale mapping, list vs. mapping, object vs.
/// bare value). Each such field is modelled as an untagged enum with a
/// catch-all variant, so an unexpected shape decodes as "missing" instead of
/// failing the whole record. Extraction happens through the accessor methods
/// below; all of them are total.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogRecord {
    pub name: Localized,
    pub summary: Localized,
    pub slug: Scalar,
    pub id: Scalar,
    pub current_version: Maybe<CurrentVersion>,
    pub icons: Icons,
    pub icon_url: Scalar,
    pub thumbnail_url: Scalar,
    pub preview_url: Scalar,
    pub authors: Entries,
    pub average_daily_users: Scalar,
    pub weekly_downloads: Scalar,
    pub users: Scalar,
    pub user_count: Scalar,
    pub rating: Scalar,
    pub average_rating: Scalar,
    pub categories: Entries,
    pub permissions: Entries,
    pub required_permissions: Entries,
    pub homepage: Homepage,
    pub homepage_url: Homepage,
    pub website: Homepage,
    pub url: Homepage,
    pub last_updated: Scalar,
    pub created: Scalar,
}

/// The `current_version` object, when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurrentVersion {
    pub version: Scalar,
    pub created: Scalar,
    pub rating: Scalar,
    pub compatibility: Tree,
    pub file: Maybe<FileInfo>,
    pub files: Maybe<Vec<FileInfo>>,
}

/// A version's uploaded file entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    pub created: Scalar,
    pub applications: Tree,
    pub application: Tree,
}

/// A field that is either a plain string or a locale-keyed mapping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum Localized {
    #[default]
    Missing,
    Text(String),
    Map(Map<String, Value>),
    Other(Value),
}

impl Localized {
    /// Resolve to a single string: `en-US`, then `en`, then the first value
    /// in the mapping in its stored order, else empty. Never fails, even on
    /// an empty mapping.
    pub fn best(&self) -> String {
        match self {
            Localized::Text(text) => text.clone(),
            Localized::Map(map) => ["en-US", "en"]
                .iter()
                .find_map(|locale| map.get(*locale).and_then(text_of))
                .or_else(|| map.values().find_map(text_of))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

/// A leaf value that may arrive as a number or a string.
///
/// `render` is the single way out: it yields a display string only for
/// non-empty, non-zero values, so absent and falsy inputs alike produce no
/// metadata fragment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl Scalar {
    pub fn render(&self) -> Option<String> {
        match self {
            Scalar::Int(n) if *n != 0 => Some(n.to_string()),
            Scalar::Float(f) if *f != 0.0 => Some(f.to_string()),
            Scalar::Text(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// The `icons` field: a size-keyed mapping, or a list of URLs or objects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum Icons {
    #[default]
    Missing,
    Sizes(Map<String, Value>),
    List(Vec<Value>),
    Other(Value),
}

/// A field that is a list of loosely shaped entries, or sometimes a bare
/// string (permissions have been seen as both).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum Entries {
    #[default]
    Missing,
    List(Vec<Value>),
    Text(String),
    Other(Value),
}

/// A homepage-like field: a bare URL string or a structured link object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum Homepage {
    #[default]
    Missing,
    Text(String),
    Obj(Map<String, Value>),
    Other(Value),
}

/// A nested object whose keys we probe (compatibility matrices and per-file
/// application maps).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum Tree {
    #[default]
    Missing,
    Map(Map<String, Value>),
    Other(Value),
}

impl Tree {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Tree::Map(map) => map.get(key),
            _ => None,
        }
    }
}

/// A typed value or whatever else the API sent instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Maybe<T> {
    Value(T),
    Other(Value),
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Maybe::Other(Value::Null)
    }
}

impl<T> Maybe<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Maybe::Value(v) => Some(v),
            Maybe::Other(_) => None,
        }
    }
}

/// Icon size keys probed in preference order.
const ICON_SIZES: [&str; 4] = ["64", "48", "32", "16"];
/// Application keys probed in the version-level compatibility matrix.
const MATRIX_APPS: [&str; 2] = ["firefox", "firefox_desktop"];
/// Application keys probed in per-file application maps.
const FILE_APPS: [&str; 3] = ["firefox", "firefox-desktop", "firefox_android"];

impl CatalogRecord {
    /// Version string of the current version, or empty.
    pub fn version(&self) -> String {
        self.current_version
            .value()
            .and_then(|cv| cv.version.render())
            .unwrap_or_default()
    }

    /// Resolve an icon URL, trying the size-keyed mapping (64 down to 16,
    /// then any value), the list form, and finally the top-level fallback
    /// fields. First non-empty hit wins.
    pub fn icon(&self) -> Option<String> {
        let from_icons = match &self.icons {
            Icons::Sizes(sizes) => ICON_SIZES
                .iter()
                .find_map(|size| sizes.get(*size).and_then(text_of))
                .or_else(|| sizes.values().find_map(text_of)),
            Icons::List(entries) => entries.first().and_then(|entry| match entry {
                Value::Object(obj) => ["url", "src"]
                    .iter()
                    .find_map(|key| obj.get(*key).and_then(text_of)),
                other => text_of(other),
            }),
            _ => None,
        };

        first_of([
            from_icons,
            self.icon_url.render(),
            self.thumbnail_url.render(),
            self.preview_url.render(),
        ])
    }

    /// Name of the first author entry, whether it is an object or a string.
    pub fn author(&self) -> Option<String> {
        match &self.authors {
            Entries::List(entries) => entries.first().and_then(|entry| match entry {
                Value::Object(obj) => obj.get("name").and_then(text_of),
                other => text_of(other),
            }),
            _ => None,
        }
    }

    /// Best available popularity figure.
    pub fn user_count(&self) -> Option<String> {
        first_of([
            self.average_daily_users.render(),
            self.weekly_downloads.render(),
            self.users.render(),
            self.user_count.render(),
        ])
    }

    pub fn rating(&self) -> Option<String> {
        first_of([
            self.current_version
                .value()
                .and_then(|cv| cv.rating.render()),
            self.rating.render(),
            self.average_rating.render(),
        ])
    }

    /// Category names; object entries contribute their `name` or `slug`.
    pub fn categories(&self) -> Vec<String> {
        match &self.categories {
            Entries::List(entries) => entries
                .iter()
                .filter_map(|entry| match entry {
                    Value::Object(obj) => ["name", "slug"]
                        .iter()
                        .find_map(|key| obj.get(*key).and_then(text_of)),
                    other => text_of(other),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Declared permissions; `required_permissions` is consulted when
    /// `permissions` yields nothing.
    pub fn permissions(&self) -> Vec<String> {
        let primary = entry_values(&self.permissions);
        if !primary.is_empty() {
            return primary;
        }
        entry_values(&self.required_permissions)
    }

    /// Formatted homepage line from the first of the homepage-like fields
    /// that produces one.
    pub fn homepage_line(&self) -> Option<String> {
        [&self.homepage, &self.homepage_url, &self.website, &self.url]
            .into_iter()
            .find_map(format_homepage)
    }

    /// Lowest host-application version the current version declares support
    /// for: the compatibility matrix first, then each file's application
    /// maps, then the singular file entry.
    pub fn min_compatible_version(&self) -> Option<String> {
        let cv = self.current_version.value()?;

        let from_matrix = MATRIX_APPS
            .iter()
            .find_map(|app| cv.compatibility.get(app).and_then(min_of));
        if from_matrix.is_some() {
            return from_matrix;
        }

        let files = cv.files.value().map(Vec::as_slice).unwrap_or(&[]);
        for info in files {
            for apps in [&info.applications, &info.application] {
                if let Some(found) = FILE_APPS
                    .iter()
                    .find_map(|app| apps.get(app).and_then(min_of))
                {
                    return Some(found);
                }
            }
        }

        cv.file
            .value()
            .and_then(|info| info.applications.get("firefox").and_then(min_of))
    }

    /// Best available timestamp string: version-file creation, version
    /// creation, catalog last-update, catalog creation.
    pub fn timestamp(&self) -> Option<String> {
        let cv = self.current_version.value();
        first_of([
            cv.and_then(|v| v.file.value()).and_then(|f| f.created.render()),
            cv.and_then(|v| v.created.render()),
            self.last_updated.render(),
            self.created.render(),
        ])
    }

    /// Identifier shown in the metadata footer (id first, slug as fallback).
    pub fn display_id(&self) -> Option<String> {
        first_of([self.id.render(), self.slug.render()])
    }

    /// Feed GUID: slug, else stringified id, else empty.
    pub fn guid(&self) -> String {
        first_of([self.slug.render(), self.id.render()]).unwrap_or_default()
    }
}

/// First candidate that produced a value, in order. Every "try field A,
/// else B, else C" chain funnels through this.
fn first_of<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}

/// A displayable string from a JSON leaf: non-empty strings pass through,
/// numbers are stringified, everything else is ignored.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn entry_values(entries: &Entries) -> Vec<String> {
    match entries {
        Entries::List(list) => list.iter().filter_map(text_of).collect(),
        Entries::Text(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn format_homepage(field: &Homepage) -> Option<String> {
    match field {
        Homepage::Text(s) if !s.is_empty() => Some(format!("Homepage: {s}")),
        Homepage::Obj(obj) if !obj.is_empty() => {
            for key in ["url", "homepage"] {
                if let Some(Value::Object(map)) = obj.get(key) {
                    if let Some(line) = locale_url_line(map) {
                        return Some(line);
                    }
                }
            }
            if let Some(Value::Object(outgoing)) = obj.get("outgoing") {
                // The outgoing wrapper is either a locale map itself or
                // another url/homepage wrapper around one.
                if let Some(line) = locale_url_line(outgoing) {
                    return Some(line);
                }
                for key in ["url", "homepage"] {
                    if let Some(Value::Object(inner)) = outgoing.get(key) {
                        if let Some(line) = locale_url_line(inner) {
                            return Some(line);
                        }
                    }
                }
            }
            Some(format!("Homepage: {}", Value::Object(obj.clone())))
        }
        _ => None,
    }
}

/// Render `Homepage (<locale>): <url>` from the first usable locale entry.
fn locale_url_line(map: &Map<String, Value>) -> Option<String> {
    map.iter()
        .find_map(|(locale, value)| text_of(value).map(|url| format!("Homepage ({locale}): {url}")))
}

fn min_of(entry: &Value) -> Option<String> {
    ["min_version", "min"]
        .iter()
        .find_map(|key| entry.get(key).and_then(text_of))
}
