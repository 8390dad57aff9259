//! List tag groups.

use super::{build_pages, load_config};
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use ter_core::sort::tag_groups;

#[derive(Serialize)]
struct TagSummary<'a> {
    tag: &'a str,
    count: usize,
    pages: Vec<&'a str>,
}

/// Print tags, largest groups first.
pub fn list_tags(config_path: &Path, input: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path, input, None)?;
    let pages = build_pages(config)?;

    let summaries: Vec<TagSummary> = tag_groups(&pages)
        .into_iter()
        .map(|group| TagSummary {
            tag: group.tag,
            count: group.pages.len(),
            pages: group.pages.into_iter().map(|p| p.pathname()).collect(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else if summaries.is_empty() {
        println!("No tags found");
    } else {
        for summary in &summaries {
            println!("{} ({})", summary.tag, summary.count);
            for page in &summary.pages {
                println!("  {}", page);
            }
        }
    }

    Ok(())
}
