//! Display ordering for page and tag listings.
//!
//! Pages sort newest first; undated pages follow every dated one. Ties are
//! broken by title, compared case-insensitively after folding accents. All
//! sorts are stable so unchanged input always yields the same order.

use crate::models::Page;
use deunicode::deunicode;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Total order on pages for anything shown to a reader.
pub fn compare(a: &Page, b: &Page) -> Ordering {
    let by_date = match (a.date_published, b.date_published) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_date
        .then_with(|| title_key(a).cmp(&title_key(b)))
        .then_with(|| a.display_title().cmp(b.display_title()))
}

fn title_key(page: &Page) -> String {
    deunicode(page.display_title()).to_lowercase()
}

pub fn sort_pages(pages: &mut [&Page]) {
    pages.sort_by(|a, b| compare(a, b));
}

/// Drop ignored pages, then sort the rest.
pub fn for_display<'a, I>(pages: I) -> Vec<&'a Page>
where
    I: IntoIterator<Item = &'a Page>,
{
    let mut listed: Vec<&Page> = pages.into_iter().filter(|p| !p.ignored).collect();
    sort_pages(&mut listed);
    listed
}

/// Pages sharing one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagGroup<'a> {
    pub tag: &'a str,
    pub pages: Vec<&'a Page>,
}

/// Group listable pages by tag: largest groups first, then by tag name.
pub fn tag_groups(pages: &[Page]) -> Vec<TagGroup<'_>> {
    let mut groups: BTreeMap<&str, Vec<&Page>> = BTreeMap::new();
    for page in pages.iter().filter(|p| !p.ignored) {
        for tag in page.tag_list() {
            let members = groups.entry(tag.as_str()).or_default();
            if !members.iter().any(|m| m.pathname() == page.pathname()) {
                members.push(page);
            }
        }
    }

    let mut groups: Vec<TagGroup<'_>> = groups
        .into_iter()
        .map(|(tag, mut pages)| {
            sort_pages(&mut pages);
            TagGroup { tag, pages }
        })
        .collect();

    groups.sort_by(|a, b| {
        b.pages
            .len()
            .cmp(&a.pages.len())
            .then_with(|| a.tag.cmp(b.tag))
    });
    groups
}
