//! # ter-core
//!
//! Core library for the ter static wiki generator.
//!
//! This crate turns a directory of Markdown files into a graph of pages:
//! every file and directory becomes a [`Page`], and the [`graph`] module
//! answers questions about how pages relate (children, backlinks, tags).
//! Rendering the graph to a site is left to callers.
//!
//! ```no_run
//! use ter_core::{Config, GraphIndex, SiteBuilder};
//!
//! let config = Config::load_or_default("ter.yml")?;
//! let pages = SiteBuilder::new(config)?.build()?;
//! let graph = GraphIndex::new(&pages)?;
//! for (page, link) in graph.dead_links() {
//!     println!("{} -> {}", page.pathname(), link.path());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod config;
pub mod frontmatter;
pub mod graph;
pub mod markdown;
pub mod models;
pub mod slug;
pub mod sort;
pub mod urls;

pub use builder::{discover_entries, BuildError, EntryKind, PageFactory, SiteBuilder, SourceEntry};
pub use config::{Config, ConfigError};
pub use frontmatter::{AttributeReader, FrontmatterError};
pub use graph::GraphIndex;
pub use markdown::{MarkdownAdapter, MarkdownError, MarkdownProcessor, Rendered};
pub use models::{Crumb, Heading, Layout, Page, PageIndex};
pub use slug::slugify;
