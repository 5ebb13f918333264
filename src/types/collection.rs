use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Title given to tabs whose source has none.
pub const DEFAULT_TAB_TITLE: &str = "Untitled";

/// Name given to collections whose source has neither `name` nor legacy `title`.
pub const DEFAULT_COLLECTION_NAME: &str = "Untitled collection";

/// The fixed palette a collection can be tagged with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollectionColor {
    #[default]
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
}

impl CollectionColor {
    pub const ALL: [CollectionColor; 8] = [
        CollectionColor::Grey,
        CollectionColor::Blue,
        CollectionColor::Red,
        CollectionColor::Yellow,
        CollectionColor::Green,
        CollectionColor::Pink,
        CollectionColor::Purple,
        CollectionColor::Cyan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionColor::Grey => "grey",
            CollectionColor::Blue => "blue",
            CollectionColor::Red => "red",
            CollectionColor::Yellow => "yellow",
            CollectionColor::Green => "green",
            CollectionColor::Pink => "pink",
            CollectionColor::Purple => "purple",
            CollectionColor::Cyan => "cyan",
        }
    }

    /// Case-insensitive lookup; `gray` is accepted as an alias of `grey`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        if lower == "gray" {
            return Some(CollectionColor::Grey);
        }
        Self::ALL.iter().copied().find(|c| c.as_str() == lower)
    }
}

/// A saved URL inside a collection, in canonical form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tab {
    pub fn new(url: &str, title: Option<&str>, description: Option<&str>, now: DateTime<Utc>) -> Self {
        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TAB_TITLE)
            .to_string();
        let description = elide_description(description, &title);
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            url: url.to_string(),
            description,
            updated_at: Some(now),
        }
    }

    /// Merge priority; an unstamped tab counts as the epoch.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or_default()
    }
}

/// A named, colored, ordered group of tabs, in canonical form.
///
/// Field declaration order is the serialized key order, which the change
/// detection against the remote gist relies on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub color: CollectionColor,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub tabs: Vec<Tab>,
}

impl Collection {
    pub fn new(name: &str, color: CollectionColor, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            color,
            created_at: now,
            updated_at: Some(now),
            tabs: Vec::new(),
        }
    }

    /// Merge priority; an unstamped collection counts as the epoch.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or_default()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    pub fn tab_index(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }
}

/// A tab as it arrives from an untrusted source (UI, remote gist, import file).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawTab {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A collection as it arrives from an untrusted source.
///
/// `title` is the legacy spelling of `name`; it is only consulted when `name` is absent.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawCollection {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tabs: Vec<RawTab>,
}

impl From<Tab> for RawTab {
    fn from(tab: Tab) -> Self {
        Self {
            id: Some(tab.id),
            title: Some(tab.title),
            url: Some(tab.url),
            description: tab.description,
            updated_at: tab.updated_at,
        }
    }
}

impl From<Collection> for RawCollection {
    fn from(c: Collection) -> Self {
        Self {
            id: Some(c.id),
            name: Some(c.name),
            title: None,
            color: Some(c.color.as_str().to_string()),
            created_at: Some(c.created_at),
            updated_at: c.updated_at,
            tabs: c.tabs.into_iter().map(RawTab::from).collect(),
        }
    }
}

impl From<&Collection> for RawCollection {
    fn from(c: &Collection) -> Self {
        RawCollection::from(c.clone())
    }
}

/// Keeps a description only when it carries information beyond the title.
pub fn elide_description(description: Option<&str>, title: &str) -> Option<String> {
    description
        .filter(|d| !d.is_empty() && *d != title)
        .map(str::to_string)
}

/// Accepts RFC 3339 strings or epoch milliseconds; anything else reads as absent.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}
