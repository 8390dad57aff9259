//! Site building logic - turns source entries into pages.
//!
//! Building happens in two phases. First every entry becomes a [`Page`]
//! independently (in parallel); then the complete set is checked for
//! pathname conflicts and handed to [`crate::graph::GraphIndex`].

use crate::{
    config::{Config, ConfigError},
    frontmatter::{self, AttributeReader, FrontmatterError},
    markdown::{MarkdownAdapter, MarkdownError, MarkdownProcessor},
    models::{Heading, Page, PageIndex},
    slug::slugify,
    urls::{page_url, with_trailing_slash},
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use url::Url;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to read {path:?}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed frontmatter in {path:?}: {source}")]
    FrontmatterMalformed {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("Failed to render {path:?}: {source}")]
    MarkdownParse {
        path: PathBuf,
        #[source]
        source: MarkdownError,
    },

    #[error("Duplicate url {pathname}: {first} and {second}")]
    DuplicateUrl {
        pathname: String,
        first: String,
        second: String,
    },

    #[error("Failed to walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{path:?} is not inside the input directory {root:?}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A file-system entry as yielded by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

impl SourceEntry {
    pub fn new(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name, is_dir }
    }
}

/// What kind of page an entry produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// An ordinary Markdown file
    Content,
    /// `index.md`, standing in for its directory
    DirIndex,
    /// A directory without an index file
    PlainDir,
}

const INDEX_FILE: &str = "index.md";

impl EntryKind {
    /// Classify an entry; `None` means it yields no page of its own.
    pub fn classify(entry: &SourceEntry) -> Option<Self> {
        if entry.is_dir {
            if entry.path.join(INDEX_FILE).is_file() || has_index_file(&entry.path) {
                None
            } else {
                Some(EntryKind::PlainDir)
            }
        } else if entry.name.eq_ignore_ascii_case(INDEX_FILE) {
            Some(EntryKind::DirIndex)
        } else if is_markdown(&entry.name) {
            Some(EntryKind::Content)
        } else {
            None
        }
    }
}

fn is_markdown(name: &str) -> bool {
    name.len() > 3 && name.to_ascii_lowercase().ends_with(".md")
}

fn strip_markdown_ext(name: &str) -> &str {
    if is_markdown(name) {
        &name[..name.len() - 3]
    } else {
        name
    }
}

/// Case-insensitive lookup for `index.md` on case-sensitive file systems.
fn has_index_file(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                e.file_name().to_string_lossy().eq_ignore_ascii_case(INDEX_FILE)
                    && e.path().is_file()
            })
        })
        .unwrap_or(false)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// Walk `root` and return every directory and Markdown file, sorted by name.
///
/// Names starting with `.` or `_` are pruned along with their subtrees; the
/// root itself is always yielded. Entry paths are canonical, so a root like
/// `.` still yields a named root entry.
pub fn discover_entries(root: &Path) -> Result<Vec<SourceEntry>, BuildError> {
    let root = fs::canonicalize(root).map_err(|source| BuildError::SourceRead {
        path: root.to_path_buf(),
        source,
    })?;
    let mut entries = Vec::new();

    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));

    for entry in walker {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: source.path().map_or_else(|| root.clone(), Path::to_path_buf),
            source,
        })?;

        if entry.file_type().is_dir() {
            entries.push(SourceEntry::new(entry.path(), true));
        } else if is_markdown(&entry.file_name().to_string_lossy()) {
            entries.push(SourceEntry::new(entry.path(), false));
        } else {
            tracing::debug!("Skipping non-markdown file {:?}", entry.path());
        }
    }

    Ok(entries)
}

/// Builds one [`Page`] per source entry.
pub struct PageFactory<A = MarkdownProcessor> {
    input_root: PathBuf,
    base_url: Url,
    ignore_keys: Vec<String>,
    tag_index: Option<String>,
    adapter: A,
}

impl PageFactory<MarkdownProcessor> {
    pub fn new(input_root: impl Into<PathBuf>, base_url: &Url, ignore_keys: Vec<String>) -> Self {
        Self::with_adapter(input_root, base_url, ignore_keys, MarkdownProcessor::new())
    }

    pub fn from_config(config: &Config) -> Result<Self, BuildError> {
        let factory = Self::new(config.input_dir(), &config.base_url()?, config.ignore_keys.clone())
            .with_tag_index(&config.tag_index);
        Ok(factory)
    }
}

impl<A: MarkdownAdapter> PageFactory<A> {
    pub fn with_adapter(
        input_root: impl Into<PathBuf>,
        base_url: &Url,
        ignore_keys: Vec<String>,
        adapter: A,
    ) -> Self {
        let input_root = input_root.into();
        Self {
            input_root: fs::canonicalize(&input_root).unwrap_or(input_root),
            base_url: with_trailing_slash(base_url.clone()),
            ignore_keys,
            tag_index: None,
            adapter,
        }
    }

    /// Enable the synthetic tag listing page at `slug` (empty disables it).
    pub fn with_tag_index(mut self, slug: &str) -> Self {
        let slug = slugify(slug);
        self.tag_index = if slug.is_empty() { None } else { Some(slug) };
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the page for one entry, or `None` if the entry yields no page.
    pub fn build_page(&self, entry: &SourceEntry) -> Result<Option<Page>, BuildError> {
        let Some(kind) = EntryKind::classify(entry) else {
            return Ok(None);
        };

        let page = match kind {
            EntryKind::Content => self.content_page(entry)?,
            EntryKind::DirIndex => self.dir_index_page(entry)?,
            EntryKind::PlainDir => self.plain_dir_page(entry)?,
        };

        tracing::debug!("Built {} from {:?}", page.pathname(), entry.path);
        Ok(Some(page))
    }

    /// Build every entry, then verify pathnames are unique.
    ///
    /// Any single failure aborts the whole build. Output order follows
    /// `entries`, with the tag listing page (if any) last.
    pub fn build_all(&self, entries: &[SourceEntry]) -> Result<Vec<Page>, BuildError> {
        let built: Vec<Option<Page>> = entries
            .par_iter()
            .map(|entry| self.build_page(entry))
            .collect::<Result<_, _>>()?;

        let mut pages: Vec<Page> = built.into_iter().flatten().collect();

        check_unique(&pages)?;

        if let Some(tag_page) = self.tag_index_page(&pages) {
            pages.push(tag_page);
        }

        tracing::info!("Built {} pages", pages.len());
        Ok(pages)
    }

    /// Synthetic tag listing page, when enabled, needed, and not shadowed.
    fn tag_index_page(&self, pages: &[Page]) -> Option<Page> {
        let slug = self.tag_index.as_deref()?;
        if pages
            .iter()
            .filter(|p| !p.ignored)
            .all(|p| p.tag_list().is_empty())
        {
            return None;
        }

        let mut page = Page::new(page_url(&self.base_url, &[slug]));
        if pages.iter().any(|p| p.pathname() == page.pathname()) {
            tracing::warn!(
                "A source page already occupies {}, skipping the tag index",
                page.pathname()
            );
            return None;
        }

        page.index = Some(PageIndex::Tag);
        page.title = Some("Tags".to_string());
        Some(page)
    }

    fn content_page(&self, entry: &SourceEntry) -> Result<Page, BuildError> {
        let rel = self.relative(&entry.path)?;
        let mut segments = dir_segments(rel.parent().unwrap_or(Path::new("")));
        segments.push(slugify(strip_markdown_ext(&entry.name)));

        let page = Page::new(page_url(&self.base_url, &segments));
        let fallback = strip_markdown_ext(&entry.name).to_string();
        self.render_source(page, &entry.path, &path_string(&rel), false, fallback)
    }

    fn dir_index_page(&self, entry: &SourceEntry) -> Result<Page, BuildError> {
        let rel = self.relative(&entry.path)?;
        let rel_dir = rel.parent().unwrap_or(Path::new("")).to_path_buf();

        let mut page = Page::new(page_url(&self.base_url, &dir_segments(&rel_dir)));
        page.index = Some(PageIndex::Dir);

        let fallback = entry
            .path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let current = if rel_dir.as_os_str().is_empty() {
            ".".to_string()
        } else {
            path_string(&rel_dir)
        };
        self.render_source(page, &entry.path, &current, true, fallback)
    }

    fn plain_dir_page(&self, entry: &SourceEntry) -> Result<Page, BuildError> {
        let rel = self.relative(&entry.path)?;
        let mut page = Page::new(page_url(&self.base_url, &dir_segments(&rel)));
        page.index = Some(PageIndex::Dir);
        page.title = Some(entry.name.clone());
        Ok(page)
    }

    /// Read, split off frontmatter, render, and back-fill the title.
    fn render_source(
        &self,
        mut page: Page,
        path: &Path,
        current_path: &str,
        is_dir_index: bool,
        fallback_title: String,
    ) -> Result<Page, BuildError> {
        let raw = fs::read_to_string(path).map_err(|source| BuildError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;

        let body = if frontmatter::has_frontmatter(&raw) {
            let extracted =
                frontmatter::extract(&raw).map_err(|source| BuildError::FrontmatterMalformed {
                    path: path.to_path_buf(),
                    source,
                })?;
            apply_attributes(&mut page, &extracted.attrs, &self.ignore_keys);
            extracted.body
        } else {
            raw
        };

        let rendered = self
            .adapter
            .parse(&body, current_path, &self.base_url, is_dir_index)
            .map_err(|source| BuildError::MarkdownParse {
                path: path.to_path_buf(),
                source,
            })?;

        page.html = rendered.html;
        page.links = rendered.links;
        page.headings = rendered.headings;
        page.source_path = Some(path.to_path_buf());

        if page.title.is_none() {
            page.title = Some(title_from_headings(&page.headings).unwrap_or(fallback_title));
        }

        Ok(page)
    }

    fn relative(&self, path: &Path) -> Result<PathBuf, BuildError> {
        if let Ok(rel) = path.strip_prefix(&self.input_root) {
            return Ok(rel.to_path_buf());
        }

        let resolved = fs::canonicalize(path).map_err(|source| BuildError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;
        resolved
            .strip_prefix(&self.input_root)
            .map(Path::to_path_buf)
            .map_err(|_| BuildError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.input_root.clone(),
            })
    }
}

/// Copy frontmatter-derived fields onto `page`, applying documented defaults.
fn apply_attributes(page: &mut Page, attrs: &AttributeReader, ignore_keys: &[String]) {
    page.title = attrs.title();
    page.description = attrs.description();
    page.date_published = attrs.date();
    page.date_updated = attrs.date_updated();
    page.tags = attrs.tags();
    page.layout = attrs.layout();
    page.pinned = attrs.bool("pinned").unwrap_or(false);
    page.ignored = attrs.has_any(ignore_keys);
    page.log = attrs.bool("log").unwrap_or(true);
    page.show_header = attrs.bool("showHeader").unwrap_or(true);
    page.show_title = attrs.bool("showTitle").unwrap_or(true);
    page.show_description = attrs.bool("showDescription").unwrap_or(true);
    page.show_meta = attrs.bool("showMeta").unwrap_or(true);
    page.show_toc = attrs.bool("toc").unwrap_or(false);
}

fn title_from_headings(headings: &[Heading]) -> Option<String> {
    headings
        .iter()
        .find(|h| h.level == 1 && !h.text.is_empty())
        .map(|h| h.text.clone())
}

fn dir_segments(rel_dir: &Path) -> Vec<String> {
    rel_dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(slugify(&name.to_string_lossy())),
            _ => None,
        })
        .collect()
}

fn path_string(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn describe_source(page: &Page) -> String {
    match &page.source_path {
        Some(path) => path.display().to_string(),
        None => format!("<synthetic {}>", page.pathname()),
    }
}

/// Reject page sets in which two pages share a pathname.
pub fn check_unique(pages: &[Page]) -> Result<(), BuildError> {
    let mut seen: HashMap<&str, &Page> = HashMap::with_capacity(pages.len());
    for page in pages {
        if let Some(existing) = seen.insert(page.pathname(), page) {
            return Err(BuildError::DuplicateUrl {
                pathname: page.pathname().to_string(),
                first: describe_source(existing),
                second: describe_source(page),
            });
        }
    }
    Ok(())
}

/// Main site builder: walks the input directory and builds every page.
pub struct SiteBuilder {
    config: Config,
    factory: PageFactory,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Result<Self, BuildError> {
        let factory = PageFactory::from_config(&config)?;
        Ok(Self { config, factory })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the complete page set
    pub fn build(&self) -> Result<Vec<Page>, BuildError> {
        let input = self.config.input_dir();
        tracing::info!("Reading sources from {:?}", input);

        let entries = discover_entries(&input)?;
        tracing::info!("Found {} entries", entries.len());

        self.factory.build_all(&entries)
    }
}
