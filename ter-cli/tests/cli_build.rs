use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

fn ter() -> Result<Command, Box<dyn std::error::Error>> {
    #[allow(deprecated)]
    let cmd = Command::cargo_bin("ter")?;
    Ok(cmd)
}

fn find_page<'a>(pages: &'a [Value], pathname: &str) -> &'a Value {
    pages
        .iter()
        .find(|p| p["pathname"] == pathname)
        .unwrap_or_else(|| panic!("no page {pathname}"))
}

#[test]
fn build_writes_page_graph() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let content = dir.path().join("content");
    write(&content, "a.md", "---\ntitle: Alpha\ntags: [rust]\n---\nSee [b](/b).")?;
    write(&content, "b/index.md", "---\ntitle: Beta\n---\n# Beta\n\n## Part\n")?;
    write(&content, "b/c.md", "---\ntitle: Gamma\ntags: [rust]\ndate: 2024-01-02\n---\n")?;
    write(&content, "hidden.md", "---\ndraft: true\n---\n[b](/b)")?;
    write(&content, "b/secret.md", "---\ntags: [secret-project]\nprivate: true\n---\n")?;

    ter()?
        .current_dir(dir.path())
        .args(["build", "content", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pages.json"));

    let json = fs::read_to_string(dir.path().join("out/pages.json"))?;
    let site: Value = serde_json::from_str(&json)?;
    let pages = site["pages"].as_array().expect("pages array");

    assert!(pages.iter().all(|p| p["pathname"] != "/hidden"));

    let b = find_page(pages, "/b");
    assert_eq!(b["title"], "Beta");
    assert_eq!(b["index"], "dir");
    assert_eq!(b["children"], serde_json::json!(["/b/c"]));
    assert_eq!(b["backlinks"], serde_json::json!(["/a"]));
    assert_eq!(b["childTags"], serde_json::json!(["rust"]));
    assert_eq!(b["toc"][0]["heading"]["slug"], "beta");
    assert_eq!(b["toc"][0]["children"][0]["text"], "Part");

    let c = find_page(pages, "/b/c");
    assert_eq!(c["related"], serde_json::json!(["/a"]));
    assert_eq!(c["crumbs"][1]["url"], "/b");
    assert_eq!(c["crumbs"][2]["current"], true);

    let tags = site["tags"].as_array().expect("tags array");
    assert_eq!(tags[0]["tag"], "rust");
    assert_eq!(tags[0]["count"], 2);
    assert_eq!(tags[0]["pages"], serde_json::json!(["/b/c", "/a"]));

    Ok(())
}

#[test]
fn build_uses_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("ter.yml"),
        r#"
site:
  title: "Test"
  url: "https://example.com/wiki/"
input_dir: "notes"
output_dir: "public"
"#,
    )?;
    write(&dir.path().join("notes"), "page.md", "# Page\n")?;

    ter()?.current_dir(dir.path()).arg("build").assert().success();

    let json = fs::read_to_string(dir.path().join("public/pages.json"))?;
    let site: Value = serde_json::from_str(&json)?;
    assert_eq!(site["title"], "Test");
    let pages = site["pages"].as_array().expect("pages array");
    let page = find_page(pages, "/wiki/page");
    assert_eq!(page["url"], "https://example.com/wiki/page");
    assert_eq!(page["title"], "Page");

    Ok(())
}

#[test]
fn build_in_current_dir_names_root_page() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "note.md", "# Note\n")?;

    ter()?.current_dir(dir.path()).arg("build").assert().success();

    let json = fs::read_to_string(dir.path().join("_site/pages.json"))?;
    let site: Value = serde_json::from_str(&json)?;
    let pages = site["pages"].as_array().expect("pages array");
    let name = fs::canonicalize(dir.path())?
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .expect("tempdir has a name");
    assert_eq!(find_page(pages, "/")["title"], name.as_str());
    find_page(pages, "/note");

    Ok(())
}

#[test]
fn verify_reports_dead_links() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "a.md", "[ok](b.md) [gone](missing.md) [web](https://rust-lang.org)")?;
    write(dir.path(), "b.md", "# B")?;

    let assert = ter()?
        .args(["verify", "--json"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Found 1 dead links"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let summary: Value = serde_json::from_str(&stdout)?;
    let dead = summary["deadLinks"].as_array().expect("dead links array");
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0]["page"], "/a");
    assert_eq!(dead[0]["target"], "/missing");

    Ok(())
}

#[test]
fn verify_passes_clean_site() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "a.md", "[b](b.md) and [[B]]")?;
    write(dir.path(), "b.md", "[back](a.md)")?;

    ter()?
        .arg("verify")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 dead links"));

    Ok(())
}

#[test]
fn tags_are_grouped_by_count() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "a.md", "---\ntags: [web, rust]\n---\n")?;
    write(dir.path(), "b.md", "---\ntags: rust, cli\n---\n")?;

    let assert = ter()?
        .args(["tags", "--json"])
        .arg(dir.path())
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let groups: Value = serde_json::from_str(&stdout)?;
    let names: Vec<_> = groups
        .as_array()
        .expect("json array")
        .iter()
        .map(|g| g["tag"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["rust", "cli", "web"]);
    assert_eq!(groups[0]["count"], 2);

    Ok(())
}

#[test]
fn malformed_frontmatter_fails_build() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "bad.md", "---\ntitle: [oops\n---\nbody")?;

    ter()?
        .current_dir(dir.path())
        .args(["build", ".", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed frontmatter"));

    assert!(!dir.path().join("out/pages.json").exists());
    Ok(())
}
