//! Verify link integrity across the page graph.

use super::{build_pages, load_config};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use ter_core::GraphIndex;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeadLink<'a> {
    page: &'a str,
    source: Option<String>,
    target: &'a str,
    href: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerificationSummary<'a> {
    pages: usize,
    dead_links: Vec<DeadLink<'a>>,
}

/// Build the site without writing output and report dead internal links.
///
/// Fails when at least one link points at no page.
pub fn verify_site(config_path: &Path, input: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path, input, None)?;
    let pages = build_pages(config)?;
    let graph =
        GraphIndex::new(&pages).context("Failed to resolve page graph for verification")?;

    let dead_links: Vec<DeadLink> = graph
        .dead_links()
        .into_iter()
        .map(|(page, link)| DeadLink {
            page: page.pathname(),
            source: page.source_path.as_ref().map(|p| p.display().to_string()),
            target: link.path(),
            href: link.as_str(),
        })
        .collect();

    let summary = VerificationSummary {
        pages: pages.len(),
        dead_links,
    };

    if json {
        let payload = serde_json::to_string_pretty(&summary)?;
        println!("{}", payload);
    } else {
        println!(
            "Verification complete: {} pages, {} dead links",
            summary.pages,
            summary.dead_links.len()
        );
        for dead in &summary.dead_links {
            let source = dead
                .source
                .as_deref()
                .map(|s| format!(" ({})", s))
                .unwrap_or_default();
            println!("- {}{} -> {}", dead.page, source, dead.target);
        }
    }

    if !summary.dead_links.is_empty() {
        anyhow::bail!("Found {} dead links", summary.dead_links.len());
    }

    Ok(())
}
