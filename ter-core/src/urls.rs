//! URL construction for pages and link targets.
//!
//! Every path segment below the site base is slugified, so a directory page and
//! the pages inside it always agree on the directory part of their pathnames.

use crate::slug::slugify;
use percent_encoding::percent_decode_str;
use url::Url;

/// Ensure a site URL ends with a slash so joins stay below its path.
pub fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// URL of the page whose slugified segments below `base` are `segments`.
///
/// The result never ends with a slash unless it is the host root, so the
/// parent of any page pathname is exactly its directory page's pathname.
///
/// ```
/// use ter_core::urls::page_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/wiki/").unwrap();
/// assert_eq!(page_url(&base, &["notes", "rust"]).path(), "/wiki/notes/rust");
/// assert_eq!(page_url::<&str>(&base, &[]).path(), "/wiki");
/// ```
pub fn page_url<S: AsRef<str>>(base: &Url, segments: &[S]) -> Url {
    let mut path = base.path().to_string();
    let joined = segments
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    path.push_str(&joined);

    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.set_path(trim_path(&path));
    url
}

/// Drop a trailing slash, keeping `/` itself.
pub fn trim_path(path: &str) -> &str {
    if path.len() > 1 {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            "/"
        } else {
            trimmed
        }
    } else {
        path
    }
}

/// Whether `url` points into the site rooted at `base`.
pub fn is_internal(url: &Url, base: &Url) -> bool {
    url.origin() == base.origin()
}

/// Canonicalize an internal link target so it compares equal to page URLs.
///
/// Below the base path each segment is percent-decoded and slugified, a
/// trailing `.md` and a trailing `index` segment are dropped, and so is any
/// trailing slash. Query and fragment are kept. Targets outside the base path
/// only lose their trailing slash.
pub fn normalize_link(url: &Url, base: &Url) -> Url {
    let mut normalized = url.clone();
    let path = url.path();

    let Some(rest) = path.strip_prefix(base.path()) else {
        let trimmed = trim_path(path).to_string();
        normalized.set_path(&trimmed);
        return normalized;
    };

    let mut segments: Vec<String> = rest
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect();

    if let Some(last) = segments.last_mut() {
        if last.len() > 3 && last.to_ascii_lowercase().ends_with(".md") {
            last.truncate(last.len() - 3);
        }
        if last.eq_ignore_ascii_case("index") {
            segments.pop();
        }
    }

    let slugs: Vec<String> = segments.iter().map(|s| slugify(s)).collect();
    let rebuilt = page_url(base, &slugs);
    normalized.set_path(rebuilt.path());
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_page_url_root() {
        assert_eq!(page_url::<&str>(&base(), &[]).path(), "/");
        assert_eq!(page_url(&base(), &["a"]).path(), "/a");
    }

    #[test]
    fn test_trailing_slash() {
        let b = with_trailing_slash(Url::parse("https://example.com/wiki").unwrap());
        assert_eq!(b.path(), "/wiki/");
        assert_eq!(b.join("a").unwrap().path(), "/wiki/a");
    }

    #[test]
    fn test_normalize_link() {
        let link = base().join("Notes/My%20Page.md#intro").unwrap();
        let n = normalize_link(&link, &base());
        assert_eq!(n.path(), "/notes/my-page");
        assert_eq!(n.fragment(), Some("intro"));

        let dir = base().join("notes/index.md").unwrap();
        assert_eq!(normalize_link(&dir, &base()).path(), "/notes");

        let slash = base().join("b/").unwrap();
        assert_eq!(normalize_link(&slash, &base()).path(), "/b");
    }

    #[test]
    fn test_outside_base_path() {
        let base = Url::parse("https://example.com/wiki/").unwrap();
        let link = base.join("/Other/").unwrap();
        assert_eq!(normalize_link(&link, &base).path(), "/Other");
    }

    #[test]
    fn test_internal_origin() {
        let b = base();
        assert!(is_internal(&b.join("/x").unwrap(), &b));
        assert!(!is_internal(&Url::parse("https://other.org/x").unwrap(), &b));
        assert!(!is_internal(&Url::parse("mailto:me@example.com").unwrap(), &b));
    }
}
