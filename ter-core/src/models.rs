//! Content model: pages, headings, and navigation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Marks listing pages. Ordinary content pages carry no index kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageIndex {
    Dir,
    Tag,
}

/// How a page's children are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Log,
    Grid,
}

impl Layout {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "log" => Some(Layout::Log),
            "grid" => Some(Layout::Grid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Log => "log",
            Layout::Grid => "grid",
        }
    }
}

/// A heading found in a page body, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub text: String,
    pub level: u8,
    /// Anchor id, unique within the page
    pub slug: String,
}

/// Deepest heading level that takes part in navigation
pub const TOC_MAX_LEVEL: u8 = 2;

/// One table-of-contents node with its nested subheadings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry<'a> {
    pub heading: &'a Heading,
    pub children: Vec<&'a Heading>,
}

/// A single page of the site: one per content file or directory.
///
/// Identity is the URL pathname; see [`Page::pathname`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Canonical absolute location
    pub url: Url,

    /// Set for directory and tag listings
    pub index: Option<PageIndex>,

    pub title: Option<String>,
    pub description: Option<String>,

    pub date_published: Option<DateTime<Utc>>,
    pub date_updated: Option<DateTime<Utc>>,

    /// Category labels as written; may repeat
    pub tags: Option<Vec<String>>,

    /// Rendered body
    pub html: String,

    /// Absolute internal link targets found in the body
    pub links: Vec<Url>,

    pub headings: Vec<Heading>,

    pub pinned: bool,
    pub ignored: bool,
    pub log: bool,
    pub show_header: bool,
    pub show_title: bool,
    pub show_description: bool,
    pub show_meta: bool,
    pub show_toc: bool,

    pub layout: Option<Layout>,

    /// File the page was built from; `None` for synthetic pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

impl Page {
    /// A page at `url` with every field at its default.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            index: None,
            title: None,
            description: None,
            date_published: None,
            date_updated: None,
            tags: None,
            html: String::new(),
            links: Vec::new(),
            headings: Vec::new(),
            pinned: false,
            ignored: false,
            log: true,
            show_header: true,
            show_title: true,
            show_description: true,
            show_meta: true,
            show_toc: false,
            layout: None,
            source_path: None,
        }
    }

    /// Identity key
    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    pub fn is_dir(&self) -> bool {
        self.index == Some(PageIndex::Dir)
    }

    /// Tags as a slice; pages without tags have none.
    pub fn tag_list(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list().iter().any(|t| t == tag)
    }

    /// Display title, falling back to the last path segment.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| last_segment(self.pathname()))
    }

    /// Headings that take part in navigation (levels 1 and 2).
    pub fn toc(&self) -> Vec<&Heading> {
        self.headings
            .iter()
            .filter(|h| h.level <= TOC_MAX_LEVEL)
            .collect()
    }

    /// Navigation headings nested one level deep: each level-2 heading sits
    /// under the level-1 heading before it.
    pub fn toc_tree(&self) -> Vec<TocEntry<'_>> {
        let mut entries: Vec<TocEntry<'_>> = Vec::new();
        let mut under_top = false;

        for heading in self.toc() {
            if heading.level > 1 && under_top {
                if let Some(parent) = entries.last_mut() {
                    parent.children.push(heading);
                    continue;
                }
            }
            if heading.level == 1 {
                under_top = true;
            }
            entries.push(TocEntry {
                heading,
                children: Vec::new(),
            });
        }

        entries
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.pathname() == other.pathname()
    }
}

impl Eq for Page {}

impl std::hash::Hash for Page {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.pathname().hash(state);
    }
}

/// One step of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub slug: String,
    pub url: String,
    pub current: bool,
}

/// Parent directory of a URL pathname. The root is its own parent.
///
/// ```
/// use ter_core::models::parent_path;
///
/// assert_eq!(parent_path("/notes/rust"), "/notes");
/// assert_eq!(parent_path("/notes"), "/");
/// assert_eq!(parent_path("/"), "/");
/// ```
pub fn parent_path(pathname: &str) -> &str {
    let trimmed = if pathname.len() > 1 {
        pathname.trim_end_matches('/')
    } else {
        pathname
    };
    match trimmed.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &trimmed[..idx],
    }
}

/// Whether `pathname` is `ancestor` or lies below it, matching whole segments.
pub fn is_within(pathname: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return pathname.starts_with('/');
    }
    let ancestor = ancestor.trim_end_matches('/');
    match pathname.strip_prefix(ancestor) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

fn last_segment(pathname: &str) -> &str {
    pathname
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}
