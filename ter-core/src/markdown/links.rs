//! Link resolution against the site base URL.

use super::{html_escape, MarkdownError};
use crate::urls::{is_internal, normalize_link, with_trailing_slash};
use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};
use url::Url;

/// Where a link destination points after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A page of this site, canonicalized
    Internal(Url),
    /// Another origin
    External,
    /// Same-page anchors, email links, and anything that does not parse
    Unchanged,
}

/// Resolves link destinations found in one page.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    base: Url,
    page: Url,
}

impl LinkResolver {
    pub fn new(
        base_url: &Url,
        current_path: &str,
        is_dir_index: bool,
    ) -> Result<Self, MarkdownError> {
        let base = with_trailing_slash(base_url.clone());

        let mut relative = current_path.replace('\\', "/");
        if relative == "." {
            relative.clear();
        }
        if is_dir_index && !relative.is_empty() && !relative.ends_with('/') {
            relative.push('/');
        }

        let page = base
            .join(&relative)
            .map_err(|source| MarkdownError::Resolve {
                path: current_path.to_string(),
                base: base.to_string(),
                source,
            })?;

        Ok(Self { base, page })
    }

    /// Resolve a destination as written in the source.
    ///
    /// Relative destinations resolve against the page, root-relative ones
    /// (`/x`) against the site base.
    pub fn resolve(&self, dest: &str) -> Target {
        let dest = dest.trim();
        if dest.is_empty() || dest.starts_with('#') {
            return Target::Unchanged;
        }

        let joined = match dest.strip_prefix('/') {
            Some(rest) if !rest.starts_with('/') => self.base.join(rest),
            _ => self.page.join(dest),
        };

        match joined {
            Ok(url) if is_internal(&url, &self.base) => {
                Target::Internal(normalize_link(&url, &self.base))
            }
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Target::External,
            Ok(_) | Err(_) => Target::Unchanged,
        }
    }

    /// Rewrite link events in place and collect internal targets.
    ///
    /// Internal links get root-relative hrefs; external links are emitted as
    /// raw anchors carrying `rel="external"`.
    pub fn rewrite<'a>(&self, events: Vec<Event<'a>>) -> (Vec<Event<'a>>, Vec<Url>) {
        let mut result = Vec::with_capacity(events.len());
        let mut links = Vec::new();
        let mut external_stack: Vec<bool> = Vec::new();

        for event in events {
            match event {
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let target = if link_type == LinkType::Email {
                        Target::Unchanged
                    } else {
                        self.resolve(&dest_url)
                    };

                    match target {
                        Target::Internal(url) => {
                            let href = root_relative(&url);
                            links.push(url);
                            external_stack.push(false);
                            result.push(Event::Start(Tag::Link {
                                link_type,
                                dest_url: CowStr::Boxed(href.into_boxed_str()),
                                title,
                                id,
                            }));
                        }
                        Target::External => {
                            external_stack.push(true);
                            let title_attr = if title.is_empty() {
                                String::new()
                            } else {
                                format!(" title=\"{}\"", html_escape(&title))
                            };
                            let anchor = format!(
                                "<a href=\"{}\" rel=\"external\"{}>",
                                html_escape(&dest_url),
                                title_attr
                            );
                            result.push(Event::InlineHtml(CowStr::Boxed(anchor.into_boxed_str())));
                        }
                        Target::Unchanged => {
                            external_stack.push(false);
                            result.push(Event::Start(Tag::Link {
                                link_type,
                                dest_url,
                                title,
                                id,
                            }));
                        }
                    }
                }
                Event::End(TagEnd::Link) => {
                    if external_stack.pop() == Some(true) {
                        result.push(Event::InlineHtml(CowStr::Borrowed("</a>")));
                    } else {
                        result.push(Event::End(TagEnd::Link));
                    }
                }
                other => result.push(other),
            }
        }

        (result, links)
    }
}

fn root_relative(url: &Url) -> String {
    let mut href = url.path().to_string();
    if let Some(query) = url.query() {
        href.push('?');
        href.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        href.push('#');
        href.push_str(fragment);
    }
    href
}
