//! Markdown processing: HTML rendering, link extraction, and heading collection.

pub mod links;
pub mod wikilinks;

use crate::models::Heading;
use crate::slug::SlugCounter;
use links::LinkResolver;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use thiserror::Error;
use url::Url;

pub use wikilinks::WikilinkTransformer;

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("Cannot resolve links for '{path}' against {base}: {source}")]
    Resolve {
        path: String,
        base: String,
        #[source]
        source: url::ParseError,
    },
}

/// Output of one Markdown parse
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    /// Absolute internal link targets, in document order
    pub links: Vec<Url>,
    /// Headings in document order with unique slugs
    pub headings: Vec<Heading>,
}

/// Turns Markdown text into HTML plus the link and heading data the page
/// graph needs. Implementations must be pure.
pub trait MarkdownAdapter: Send + Sync {
    /// `current_path` is the source path relative to the input root; for a
    /// directory index it is the directory's relative path.
    fn parse(
        &self,
        text: &str,
        current_path: &str,
        base_url: &Url,
        is_dir_index: bool,
    ) -> Result<Rendered, MarkdownError>;
}

/// Markdown processor backed by pulldown-cmark
#[derive(Debug, Clone)]
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownAdapter for MarkdownProcessor {
    fn parse(
        &self,
        text: &str,
        current_path: &str,
        base_url: &Url,
        is_dir_index: bool,
    ) -> Result<Rendered, MarkdownError> {
        let resolver = LinkResolver::new(base_url, current_path, is_dir_index)?;

        let events: Vec<Event> = Parser::new_ext(text, self.options).collect();

        let events = WikilinkTransformer::new().transform(events);

        let headings = collect_headings(&events);
        let events = attach_heading_ids(events, &headings);

        let (events, links) = resolver.rewrite(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(Rendered {
            html: html_output,
            links,
            headings,
        })
    }
}

fn collect_headings(events: &[Event]) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut counter = SlugCounter::new();
    for event in events {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            counter.reserve(id);
        }
    }

    let mut current: Option<(u8, Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((*level as u8, id.as_ref().map(|s| s.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, ref mut title)) = current {
                    title.push_str(text.as_ref());
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit_id, text)) = current.take() {
                    let text = text.trim().to_string();
                    let slug = match explicit_id {
                        Some(id) => id,
                        None => counter.unique(&text),
                    };
                    headings.push(Heading { text, level, slug });
                }
            }
            _ => {}
        }
    }

    headings
}

fn attach_heading_ids<'a>(events: Vec<Event<'a>>, headings: &[Heading]) -> Vec<Event<'a>> {
    let mut heading_iter = headings.iter();
    let mut result = Vec::with_capacity(events.len());

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                mut id,
                classes,
                attrs,
            }) => {
                if let Some(next) = heading_iter.next() {
                    if id.is_none() {
                        id = Some(CowStr::Boxed(next.slug.clone().into_boxed_str()));
                    }
                }
                result.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            other => result.push(other),
        }
    }

    result
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn parse(md: &str) -> Rendered {
        MarkdownProcessor::new()
            .parse(md, "notes/page.md", &base(), false)
            .unwrap()
    }

    #[test]
    fn test_basic_markdown() {
        let rendered = parse("# Hello\n\nWorld");
        insta::assert_snapshot!(rendered.html, @r#"
        <h1 id="hello">Hello</h1>
        <p>World</p>
        "#);
        assert_eq!(
            rendered.headings,
            vec![Heading {
                text: "Hello".to_string(),
                level: 1,
                slug: "hello".to_string(),
            }]
        );
    }

    #[test]
    fn test_tables() {
        let md = "| Header 1 | Header 2 |\n|----------|----------|\n| Cell 1   | Cell 2   |\n";
        let html = parse(md).html;
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Header 1</th>"));
    }

    #[test]
    fn test_duplicate_headings_get_unique_slugs() {
        let rendered = parse("## Setup\n\ntext\n\n## Setup\n\n### `code` Title\n");
        let slugs: Vec<_> = rendered.headings.iter().map(|h| h.slug.as_str()).collect();
        assert_eq!(slugs, vec!["setup", "setup-1", "code-title"]);
        assert_eq!(rendered.headings[2].level, 3);
        assert_eq!(rendered.headings[2].text, "code Title");
        assert!(rendered.html.contains(r#"<h2 id="setup-1">"#));
    }

    #[test]
    fn test_explicit_heading_id_kept() {
        let rendered = parse("# Intro {#start}\n");
        assert_eq!(rendered.headings[0].slug, "start");
        assert!(rendered.html.contains(r#"id="start""#));
    }

    #[test]
    fn test_generated_slugs_avoid_explicit_ids() {
        let slugs = |md: &str| -> Vec<String> {
            parse(md).headings.into_iter().map(|h| h.slug).collect()
        };
        assert_eq!(slugs("# Intro {#setup}\n\n## Setup\n"), vec!["setup", "setup-1"]);
        assert_eq!(slugs("## Setup\n\n# Later {#setup}\n"), vec!["setup-1", "setup"]);
    }

    #[test]
    fn test_links_are_resolved_and_reported() {
        let rendered = parse("[a](other.md) [b](/top) [c](https://rust-lang.org) [d](#here)");
        let paths: Vec<_> = rendered.links.iter().map(|u| u.path().to_string()).collect();
        assert_eq!(paths, vec!["/notes/other", "/top"]);
        assert!(rendered.html.contains(r#"href="/notes/other""#));
        assert!(rendered
            .html
            .contains(r#"<a href="https://rust-lang.org" rel="external">c</a>"#));
        assert!(rendered.html.contains(r##"href="#here""##));
    }

    #[test]
    fn test_wikilinks_reported() {
        let rendered = parse("See [[Memory Model]].");
        assert_eq!(rendered.links[0].path(), "/notes/memory-model");
    }

    #[test]
    fn test_dir_index_resolves_inside_directory() {
        let rendered = MarkdownProcessor::new()
            .parse("[x](child.md)", "notes", &base(), true)
            .unwrap();
        assert_eq!(rendered.links[0].path(), "/notes/child");
    }

    #[test]
    fn test_escape() {
        assert_eq!(html_escape(r#"<a href="x">"#), "&lt;a href=&quot;x&quot;&gt;");
    }
}
