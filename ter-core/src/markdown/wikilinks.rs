//! Wikilink transformation for [[target]] and [[target|text]] syntax.
//!
//! Targets are written as page names or relative paths. They become ordinary
//! link events whose destination is a relative path, so they are resolved and
//! reported exactly like inline Markdown links further down the pipeline.

use crate::slug::{heading_slug, slugify};
use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};

/// Transformer for wikilink syntax
#[derive(Debug, Default)]
pub struct WikilinkTransformer;

impl WikilinkTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Transform events, converting [[wikilinks]] to link events
    pub fn transform<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut result = Vec::with_capacity(events.len());
        let mut iter = events.into_iter().peekable();
        let mut in_code_block = false;

        while let Some(event) = iter.next() {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    result.push(Event::Start(Tag::CodeBlock(kind)));
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    result.push(Event::End(TagEnd::CodeBlock));
                }
                Event::Text(text) if !in_code_block => {
                    // pulldown splits text at brackets; merge consecutive runs
                    let mut merged = text.to_string();
                    while let Some(Event::Text(next)) = iter.peek() {
                        merged.push_str(next);
                        iter.next();
                    }

                    if merged.contains("[[") && merged.contains("]]") {
                        result.extend(self.process_wikilinks(&merged));
                    } else {
                        result.push(Event::Text(CowStr::Boxed(merged.into_boxed_str())));
                    }
                }
                other => result.push(other),
            }
        }

        result
    }

    fn process_wikilinks<'a>(&self, text: &str) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        let mut remaining = text;

        while let Some(start) = remaining.find("[[") {
            if start > 0 {
                events.push(owned_text(&remaining[..start]));
            }

            let Some(end) = remaining[start..].find("]]") else {
                remaining = &remaining[start..];
                break;
            };

            let inner = &remaining[start + 2..start + end];
            match self.create_link(inner) {
                Some(link) => events.extend(link),
                None => events.push(owned_text(&remaining[start..start + end + 2])),
            }
            remaining = &remaining[start + end + 2..];
        }

        if !remaining.is_empty() {
            events.push(owned_text(remaining));
        }

        events
    }

    fn create_link<'a>(&self, wikilink: &str) -> Option<Vec<Event<'a>>> {
        let (target, display) = match wikilink.split_once('|') {
            Some((target, display)) => (target.trim(), Some(display.trim())),
            None => (wikilink.trim(), None),
        };

        let (path, fragment) = match target.split_once('#') {
            Some((path, frag)) => (path.trim(), Some(frag.trim())),
            None => (target, None),
        };

        let dest = wikilink_destination(path, fragment)?;
        let display_text = display.filter(|d| !d.is_empty()).unwrap_or(target);

        Some(vec![
            Event::Start(Tag::Link {
                link_type: LinkType::Inline,
                dest_url: CowStr::Boxed(dest.into_boxed_str()),
                title: CowStr::Borrowed(""),
                id: CowStr::Borrowed(""),
            }),
            owned_text(display_text),
            Event::End(TagEnd::Link),
        ])
    }
}

/// Relative destination for a wikilink target, or `None` if it names nothing.
fn wikilink_destination(path: &str, fragment: Option<&str>) -> Option<String> {
    let absolute = path.starts_with('/');
    let segments: Vec<String> = path
        .split('/')
        .map(|segment| match segment.trim() {
            s @ (".." | ".") => s.to_string(),
            s => slugify(s),
        })
        .filter(|s| !s.is_empty())
        .collect();

    let fragment = fragment.filter(|f| !f.is_empty()).map(heading_slug);

    if segments.is_empty() && fragment.is_none() {
        return None;
    }

    let mut dest = segments.join("/");
    if absolute {
        dest.insert(0, '/');
    }
    if let Some(frag) = fragment {
        if dest.is_empty() {
            // same-page anchor
            return Some(format!("#{frag}"));
        }
        dest.push('#');
        dest.push_str(&frag);
    }
    Some(dest)
}

fn owned_text<'a>(text: &str) -> Event<'a> {
    Event::Text(CowStr::Boxed(text.to_string().into_boxed_str()))
}
