//! Relationships between pages: children, backlinks, tags, breadcrumbs.
//!
//! The free functions are straightforward scans over a page slice.
//! [`GraphIndex`] answers the same queries from maps built once over a
//! complete, conflict-free page set.

use crate::builder::{check_unique, BuildError};
use crate::models::{is_within, parent_path, Crumb, Page};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Bound;
use url::Url;

/// Direct children of `current`; grandchildren are excluded.
pub fn get_child_pages<'a>(pages: &'a [Page], current: &Page) -> Vec<&'a Page> {
    let here = current.pathname();
    pages
        .iter()
        .filter(|p| p.pathname() != here && parent_path(p.pathname()) == here)
        .collect()
}

/// Tags of `current` and every page below it, at any depth.
pub fn get_child_tags<'a>(pages: &'a [Page], current: &Page) -> BTreeSet<&'a str> {
    pages
        .iter()
        .filter(|p| is_within(p.pathname(), current.pathname()))
        .flat_map(|p| p.tag_list())
        .map(String::as_str)
        .collect()
}

/// Pages linking to `current`, each at most once. Self-links do not count.
pub fn get_backlink_pages<'a>(pages: &'a [Page], current: &Page) -> Vec<&'a Page> {
    let here = current.pathname();
    let mut seen = HashSet::new();
    pages
        .iter()
        .filter(|p| p.pathname() != here)
        .filter(|p| p.links.iter().any(|link| link.path() == here))
        .filter(|p| seen.insert(p.pathname()))
        .collect()
}

/// Pages carrying `tag` (exact, case-sensitive).
pub fn get_pages_by_tag<'a>(pages: &'a [Page], tag: &str) -> Vec<&'a Page> {
    pages.iter().filter(|p| p.has_tag(tag)).collect()
}

pub fn get_all_tags(pages: &[Page]) -> BTreeSet<&str> {
    pages
        .iter()
        .flat_map(|p| p.tag_list())
        .map(String::as_str)
        .collect()
}

/// True when no page has the link's pathname. Always true for no pages.
pub fn is_dead_link(pages: &[Page], link: &Url) -> bool {
    !pages.iter().any(|p| p.pathname() == link.path())
}

/// Other pages sharing at least one tag with `current`, in input order.
pub fn get_related_pages<'a>(pages: &'a [Page], current: &Page) -> Vec<&'a Page> {
    let here = current.pathname();
    pages
        .iter()
        .filter(|p| p.pathname() != here)
        .filter(|p| p.tag_list().iter().any(|t| current.has_tag(t)))
        .collect()
}

/// Breadcrumb trail from the site root down to `page`.
///
/// ```
/// use ter_core::graph::crumbs;
/// use ter_core::Page;
/// use url::Url;
///
/// let page = Page::new(Url::parse("https://example.com/notes/rust").unwrap());
/// let trail: Vec<_> = crumbs(&page, "/").into_iter().map(|c| c.url).collect();
/// assert_eq!(trail, vec!["/", "/notes", "/notes/rust"]);
/// ```
pub fn crumbs(page: &Page, site_root: &str) -> Vec<Crumb> {
    let pathname = page.pathname();
    let root = if site_root.len() > 1 {
        site_root.trim_end_matches('/')
    } else {
        "/"
    };

    let rest = if is_within(pathname, root) {
        &pathname[if root == "/" { 0 } else { root.len() }..]
    } else {
        pathname
    };

    let mut trail = vec![Crumb {
        slug: "index".to_string(),
        url: root.to_string(),
        current: false,
    }];

    let mut url = if root == "/" { String::new() } else { root.to_string() };
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        url.push('/');
        url.push_str(segment);
        trail.push(Crumb {
            slug: segment.to_string(),
            url: url.clone(),
            current: false,
        });
    }

    if let Some(last) = trail.last_mut() {
        last.current = true;
    }
    trail
}

/// Precomputed relationship indices over a page set.
#[derive(Debug)]
pub struct GraphIndex<'a> {
    pages: &'a [Page],
    by_path: BTreeMap<&'a str, usize>,
    children: BTreeMap<&'a str, Vec<usize>>,
    backlinks: BTreeMap<&'a str, Vec<usize>>,
    by_tag: BTreeMap<&'a str, Vec<usize>>,
}

impl<'a> GraphIndex<'a> {
    /// Index `pages`, rejecting sets where two pages share a pathname.
    pub fn new(pages: &'a [Page]) -> Result<Self, BuildError> {
        check_unique(pages)?;

        let mut by_path = BTreeMap::new();
        let mut children: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        let mut backlinks: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        let mut by_tag: BTreeMap<&str, Vec<usize>> = BTreeMap::new();

        for (i, page) in pages.iter().enumerate() {
            let path = page.pathname();
            by_path.insert(path, i);

            let parent = parent_path(path);
            if parent != path {
                children.entry(parent).or_default().push(i);
            }

            for link in &page.links {
                let target = link.path();
                if target == path {
                    continue;
                }
                let sources = backlinks.entry(target).or_default();
                if sources.last() != Some(&i) {
                    sources.push(i);
                }
            }

            for tag in page.tag_list() {
                let members = by_tag.entry(tag.as_str()).or_default();
                if members.last() != Some(&i) {
                    members.push(i);
                }
            }
        }

        tracing::debug!(
            "Indexed {} pages, {} tags, {} link targets",
            pages.len(),
            by_tag.len(),
            backlinks.len()
        );

        Ok(Self {
            pages,
            by_path,
            children,
            backlinks,
            by_tag,
        })
    }

    pub fn pages(&self) -> &'a [Page] {
        self.pages
    }

    pub fn get(&self, pathname: &str) -> Option<&'a Page> {
        self.by_path.get(pathname).map(|&i| &self.pages[i])
    }

    pub fn children(&self, current: &Page) -> Vec<&'a Page> {
        self.lookup(&self.children, current.pathname())
    }

    pub fn backlinks(&self, current: &Page) -> Vec<&'a Page> {
        self.lookup(&self.backlinks, current.pathname())
    }

    pub fn pages_by_tag(&self, tag: &str) -> Vec<&'a Page> {
        self.lookup(&self.by_tag, tag)
    }

    pub fn all_tags(&self) -> BTreeSet<&'a str> {
        self.by_tag.keys().copied().collect()
    }

    pub fn child_tags(&self, current: &Page) -> BTreeSet<&'a str> {
        self.subtree(current.pathname())
            .into_iter()
            .flat_map(|p| p.tag_list())
            .map(String::as_str)
            .collect()
    }

    /// Like [`child_tags`](Self::child_tags), leaving out ignored pages.
    pub fn listed_child_tags(&self, current: &Page) -> BTreeSet<&'a str> {
        self.subtree(current.pathname())
            .into_iter()
            .filter(|p| !p.ignored)
            .flat_map(|p| p.tag_list())
            .map(String::as_str)
            .collect()
    }

    pub fn related(&self, current: &Page) -> Vec<&'a Page> {
        let here = current.pathname();
        let members: BTreeSet<usize> = current
            .tag_list()
            .iter()
            .filter_map(|t| self.by_tag.get(t.as_str()))
            .flatten()
            .copied()
            .filter(|&i| self.pages[i].pathname() != here)
            .collect();
        members.into_iter().map(|i| &self.pages[i]).collect()
    }

    pub fn is_dead_link(&self, link: &Url) -> bool {
        !self.by_path.contains_key(link.path())
    }

    /// Every internal link that points at no page, with the page holding it.
    pub fn dead_links(&self) -> Vec<(&'a Page, &'a Url)> {
        self.pages
            .iter()
            .flat_map(|p| p.links.iter().map(move |link| (p, link)))
            .filter(|(_, link)| self.is_dead_link(link))
            .collect()
    }

    fn lookup(&self, map: &BTreeMap<&'a str, Vec<usize>>, key: &str) -> Vec<&'a Page> {
        map.get(key)
            .map(|ids| ids.iter().map(|&i| &self.pages[i]).collect())
            .unwrap_or_default()
    }

    /// `ancestor` itself (if present) and every page below it.
    fn subtree(&self, ancestor: &str) -> Vec<&'a Page> {
        if ancestor == "/" {
            return self.pages.iter().collect();
        }

        let ancestor = ancestor.trim_end_matches('/');
        let prefix = format!("{ancestor}/");

        let mut found: Vec<usize> = self.by_path.get(ancestor).copied().into_iter().collect();
        found.extend(
            self.by_path
                .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
                .take_while(|(path, _)| path.starts_with(&prefix))
                .map(|(_, &i)| i),
        );
        found.into_iter().map(|i| &self.pages[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageIndex;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn page(path: &str, tags: &[&str], links: &[&str]) -> Page {
        let mut p = Page::new(base().join(path).unwrap());
        if !tags.is_empty() {
            p.tags = Some(tags.iter().map(|t| t.to_string()).collect());
        }
        p.links = links.iter().map(|l| base().join(l).unwrap()).collect();
        p
    }

    fn dir(path: &str) -> Page {
        let mut p = page(path, &[], &[]);
        p.index = Some(PageIndex::Dir);
        p
    }

    fn paths(pages: &[&Page]) -> Vec<String> {
        pages.iter().map(|p| p.pathname().to_string()).collect()
    }

    fn site() -> Vec<Page> {
        vec![
            dir("/"),
            page("/a", &["rust"], &["/b", "/b", "/a", "/missing"]),
            dir("/b"),
            page("/b/c", &["rust", "web"], &["/a"]),
            dir("/b/d"),
            page("/b/d/e", &["deep"], &["/b"]),
            page("/b-side", &["web"], &[]),
        ]
    }

    #[test]
    fn test_children_are_direct_only() {
        let pages = site();
        assert_eq!(paths(&get_child_pages(&pages, &pages[2])), vec!["/b/c", "/b/d"]);
        assert_eq!(
            paths(&get_child_pages(&pages, &pages[0])),
            vec!["/a", "/b", "/b-side"]
        );
        assert!(get_child_pages(&pages, &pages[1]).is_empty());
    }

    #[test]
    fn test_child_tags_anchor_on_segments() {
        let pages = site();
        let tags = get_child_tags(&pages, &pages[2]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["deep", "rust", "web"]);

        let only_b_side = get_child_tags(&pages, &pages[6]);
        assert_eq!(only_b_side.into_iter().collect::<Vec<_>>(), vec!["web"]);
    }

    #[test]
    fn test_backlinks_deduplicated_without_self() {
        let pages = site();
        assert_eq!(paths(&get_backlink_pages(&pages, &pages[2])), vec!["/a", "/b/d/e"]);
        assert_eq!(paths(&get_backlink_pages(&pages, &pages[1])), vec!["/b/c"]);
    }

    #[test]
    fn test_tags() {
        let pages = site();
        assert_eq!(paths(&get_pages_by_tag(&pages, "rust")), vec!["/a", "/b/c"]);
        assert!(get_pages_by_tag(&pages, "Rust").is_empty());
        assert_eq!(
            get_all_tags(&pages).into_iter().collect::<Vec<_>>(),
            vec!["deep", "rust", "web"]
        );
        assert_eq!(paths(&get_related_pages(&pages, &pages[3])), vec!["/a", "/b-side"]);
    }

    #[test]
    fn test_dead_links() {
        let pages = site();
        assert!(is_dead_link(&pages, &base().join("/missing").unwrap()));
        assert!(!is_dead_link(&pages, &base().join("/b/c").unwrap()));
        assert!(is_dead_link(&[], &base()));
    }

    #[test]
    fn test_index_matches_scans() {
        let pages = site();
        let index = GraphIndex::new(&pages).unwrap();

        for current in &pages {
            assert_eq!(index.children(current), get_child_pages(&pages, current));
            assert_eq!(index.backlinks(current), get_backlink_pages(&pages, current));
            assert_eq!(index.child_tags(current), get_child_tags(&pages, current));
            assert_eq!(index.related(current), get_related_pages(&pages, current));
            assert!(!index.is_dead_link(&current.url));
        }
        for tag in ["rust", "web", "deep", "none"] {
            assert_eq!(index.pages_by_tag(tag), get_pages_by_tag(&pages, tag));
        }
        assert_eq!(index.all_tags(), get_all_tags(&pages));

        let dead: Vec<_> = index
            .dead_links()
            .into_iter()
            .map(|(p, l)| (p.pathname(), l.path()))
            .collect();
        assert_eq!(dead, vec![("/a", "/missing")]);
    }

    #[test]
    fn test_listed_child_tags_skip_ignored_pages() {
        let mut secret = page("/d/secret", &["secret-project"], &[]);
        secret.ignored = true;
        let pages = vec![dir("/d"), page("/d/pub", &["public"], &[]), secret];
        let index = GraphIndex::new(&pages).unwrap();

        let listed: Vec<_> = index.listed_child_tags(&pages[0]).into_iter().collect();
        assert_eq!(listed, vec!["public"]);
        assert_eq!(index.child_tags(&pages[0]).len(), 2);
    }

    #[test]
    fn test_index_rejects_duplicates() {
        let pages = vec![page("/a", &[], &[]), page("/a", &["x"], &[])];
        assert!(matches!(
            GraphIndex::new(&pages),
            Err(BuildError::DuplicateUrl { .. })
        ));
    }

    #[test]
    fn test_crumbs() {
        let p = page("/b/d/e", &[], &[]);
        let trail = crumbs(&p, "/");
        let slugs: Vec<_> = trail.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["index", "b", "d", "e"]);
        assert!(trail.last().unwrap().current);
        assert!(!trail[0].current);

        let root = crumbs(&dir("/"), "/");
        assert_eq!(root.len(), 1);
        assert!(root[0].current);
    }

    #[test]
    fn test_crumbs_below_base_path() {
        let p = Page::new(Url::parse("https://example.com/wiki/notes/x").unwrap());
        let urls: Vec<_> = crumbs(&p, "/wiki").into_iter().map(|c| c.url).collect();
        assert_eq!(urls, vec!["/wiki", "/wiki/notes", "/wiki/notes/x"]);
    }
}
