//! Build command implementation.

use super::{build_pages, load_config};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use ter_core::graph::crumbs;
use ter_core::models::TocEntry;
use ter_core::sort::{for_display, tag_groups};
use ter_core::urls::page_url;
use ter_core::{Crumb, GraphIndex, Layout, Page, PageIndex};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageRecord<'a> {
    url: &'a str,
    pathname: &'a str,
    index: Option<PageIndex>,
    title: &'a str,
    description: Option<&'a str>,
    date_published: Option<String>,
    date_updated: Option<String>,
    tags: &'a [String],
    child_tags: Vec<&'a str>,
    pinned: bool,
    log: bool,
    show_header: bool,
    show_title: bool,
    show_description: bool,
    show_meta: bool,
    show_toc: bool,
    layout: Option<Layout>,
    toc: Vec<TocEntry<'a>>,
    crumbs: Vec<Crumb>,
    children: Vec<&'a str>,
    backlinks: Vec<&'a str>,
    related: Vec<&'a str>,
    html: &'a str,
}

#[derive(Serialize)]
struct TagRecord<'a> {
    tag: &'a str,
    count: usize,
    pages: Vec<&'a str>,
}

#[derive(Serialize)]
struct SiteRecord<'a> {
    title: &'a str,
    url: &'a str,
    pages: Vec<PageRecord<'a>>,
    tags: Vec<TagRecord<'a>>,
}

/// Build the page graph and write it to `OUTPUT/pages.json`.
pub fn build_site(config_path: &Path, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, input, output)?;
    let base_url = config.base_url()?;
    let output_dir = config.output_dir();
    let pages = build_pages(config.clone())?;

    let graph = GraphIndex::new(&pages).context("Failed to resolve page graph")?;
    let site_root = page_url::<&str>(&base_url, &[]);

    let records: Vec<PageRecord> = for_display(graph.pages())
        .into_iter()
        .map(|page| page_record(&graph, page, site_root.path()))
        .collect();

    let tags: Vec<TagRecord> = tag_groups(graph.pages())
        .into_iter()
        .map(|group| TagRecord {
            tag: group.tag,
            count: group.pages.len(),
            pages: pathnames(group.pages),
        })
        .collect();

    let site = SiteRecord {
        title: &config.site.title,
        url: base_url.as_str(),
        pages: records,
        tags,
    };

    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
    let output_path = output_dir.join("pages.json");
    let json = serde_json::to_string_pretty(&site).context("Failed to serialize pages")?;
    fs::write(&output_path, json).context("Failed to write pages.json")?;

    tracing::info!("Generated pages.json with {} pages", site.pages.len());
    println!(
        "Built {} pages into {}",
        site.pages.len(),
        output_path.display()
    );

    Ok(())
}

fn page_record<'a>(graph: &GraphIndex<'a>, page: &'a Page, site_root: &str) -> PageRecord<'a> {
    PageRecord {
        url: page.url.as_str(),
        pathname: page.pathname(),
        index: page.index,
        title: page.display_title(),
        description: page.description.as_deref(),
        date_published: page.date_published.map(|d| d.to_rfc3339()),
        date_updated: page.date_updated.map(|d| d.to_rfc3339()),
        tags: page.tag_list(),
        child_tags: graph.listed_child_tags(page).into_iter().collect(),
        pinned: page.pinned,
        log: page.log,
        show_header: page.show_header,
        show_title: page.show_title,
        show_description: page.show_description,
        show_meta: page.show_meta,
        show_toc: page.show_toc,
        layout: page.layout,
        toc: page.toc_tree(),
        crumbs: crumbs(page, site_root),
        children: pathnames(for_display(graph.children(page))),
        backlinks: pathnames(for_display(graph.backlinks(page))),
        related: pathnames(for_display(graph.related(page))),
        html: &page.html,
    }
}

fn pathnames(pages: Vec<&Page>) -> Vec<&str> {
    pages.into_iter().map(Page::pathname).collect()
}
