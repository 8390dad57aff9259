//! Frontmatter detection, extraction, and typed attribute access.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::Layout;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    Malformed(#[from] serde_yaml::Error),

    #[error("Frontmatter must be a key/value mapping")]
    NotAMapping,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^\x{FEFF}?---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n(.*))?$").unwrap()
    })
}

/// Whether `raw` opens with a frontmatter block.
pub fn has_frontmatter(raw: &str) -> bool {
    frontmatter_regex().is_match(raw)
}

/// Attribute map plus the body text that follows the block.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub attrs: AttributeReader,
    pub body: String,
}

/// Split `raw` into its attribute block and body.
///
/// Content without a block yields empty attributes and the full text as body.
/// A block that is present but not valid YAML is an error, never "absent".
///
/// # Example
///
/// ```
/// use ter_core::frontmatter::extract;
///
/// let raw = "---\ntitle: My Post\ntags: [rust]\n---\n# Hello World\n";
/// let extracted = extract(raw).unwrap();
/// assert_eq!(extracted.attrs.title(), Some("My Post".to_string()));
/// assert!(extracted.body.starts_with("# Hello World"));
/// ```
pub fn extract(raw: &str) -> Result<Extracted, FrontmatterError> {
    let Some(captures) = frontmatter_regex().captures(raw) else {
        return Ok(Extracted {
            attrs: AttributeReader::default(),
            body: raw.to_string(),
        });
    };

    let yaml = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    let attrs = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => return Err(FrontmatterError::NotAMapping),
        }
    };

    Ok(Extracted {
        attrs: AttributeReader::new(attrs),
        body: body.to_string(),
    })
}

/// Typed, read-only view over a frontmatter mapping.
///
/// Each accessor returns `None` when the key is absent or its value cannot be
/// read as the requested type; callers apply the documented page defaults.
#[derive(Debug, Clone, Default)]
pub struct AttributeReader {
    attrs: Mapping,
}

impl AttributeReader {
    pub fn new(attrs: Mapping) -> Self {
        Self { attrs }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    fn first_of(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// `title`; blank strings count as absent.
    pub fn title(&self) -> Option<String> {
        self.get("title").and_then(non_blank_string)
    }

    /// `description`; blank strings count as absent.
    pub fn description(&self) -> Option<String> {
        self.get("description").and_then(non_blank_string)
    }

    /// Publish date from `date` or `datePublished`.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.first_of(&["date", "datePublished"]).and_then(parse_date)
    }

    /// Update date from `updated`, `dateUpdated` or `lastmod`.
    pub fn date_updated(&self) -> Option<DateTime<Utc>> {
        self.first_of(&["updated", "dateUpdated", "lastmod"])
            .and_then(parse_date)
    }

    /// `tags` as a list. Accepts a YAML sequence or a comma/space separated
    /// string. Absent key gives `None`; an empty list is `Some(vec![])`.
    pub fn tags(&self) -> Option<Vec<String>> {
        match self.get("tags")? {
            Value::Sequence(items) => Some(
                items
                    .iter()
                    .filter_map(scalar_string)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            Value::String(s) => Some(
                s.split(|c: char| c == ',' || c.is_whitespace())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            Value::Null => None,
            other => scalar_string(other).map(|s| vec![s]),
        }
    }

    /// Boolean flag. YAML booleans plus `true`/`false`/`yes`/`no` strings.
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether any of `keys` is present, whatever its value.
    pub fn has_any<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().any(|k| self.get(k.as_ref()).is_some())
    }

    /// `layout`: `log` or `grid`. Anything else is ignored.
    pub fn layout(&self) -> Option<Layout> {
        self.get("layout")
            .and_then(Value::as_str)
            .and_then(Layout::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_blank_string(value: &Value) -> Option<String> {
    scalar_string(value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
