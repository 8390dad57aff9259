//! Slug generation and normalization.

use deunicode::deunicode;
use regex::Regex;
use std::sync::OnceLock;

static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();

fn hyphen_runs() -> &'static Regex {
    HYPHEN_RUNS.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Transliterate to ASCII
/// - Lowercase
/// - Replace whitespace and underscores with hyphens
/// - Remove everything except ASCII alphanumerics, hyphens and dots
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use ter_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("Café Notes"), "cafe-notes");
/// ```
pub fn slugify(input: &str) -> String {
    let ascii = deunicode(input).to_lowercase();

    let cleaned: String = ascii
        .chars()
        .filter_map(|c| match c {
            ' ' | '_' | '\t' | '\n' | '-' => Some('-'),
            c if c.is_ascii_alphanumeric() || c == '.' => Some(c),
            _ => None,
        })
        .collect();

    let collapsed = hyphen_runs().replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

/// Slug for a heading anchor. Dots are not kept so anchors stay plain.
pub fn heading_slug(text: &str) -> String {
    let slug = slugify(&text.replace('.', ""));
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Hands out heading slugs that are unique within one document.
#[derive(Debug, Default)]
pub struct SlugCounter {
    seen: std::collections::HashMap<String, usize>,
}

impl SlugCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `slug` as taken without generating anything.
    pub fn reserve(&mut self, slug: &str) {
        self.seen.entry(slug.to_string()).or_insert(0);
    }

    /// Slugify `text`, suffixing `-1`, `-2`, ... on repeats.
    pub fn unique(&mut self, text: &str) -> String {
        let base = heading_slug(text);
        let mut candidate = base.clone();
        while let Some(count) = self.seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{}-{}", base, count);
        }
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}
