//! End-to-end runs of [`Publisher`] against [`MockApi`].

use std::fs;
use std::path::Path;
use std::time::Duration;

use docsync_nav::{NavNode, NavTree};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;
use crate::mock::{ApiCall, MockApi};

const FAST: RetryPolicy = RetryPolicy::new(3, Duration::ZERO);

/// Publish every page of `tree`, reading sources from `docs`, then upload
/// attachments from `site`.
fn publish(api: &MockApi, tree: &NavTree, docs: &Path, site: &Path, dry_run: bool) -> RunReport {
    let publisher = Publisher::new(api, "DOCS", dry_run, FAST);
    let mut ctx = RunContext::new(tree.clone(), "Docs Home");

    let pages: Vec<(usize, String, String)> = tree
        .pages()
        .map(|(index, node)| {
            let path = node.path.as_deref().unwrap();
            let markdown = fs::read_to_string(docs.join(path)).unwrap();
            (index, node.display_title().into_owned(), markdown)
        })
        .collect();

    for (index, _, markdown) in &pages {
        let returned = publisher.on_page_markdown(&mut ctx, *index, markdown);
        assert_eq!(returned, markdown.as_str());
    }
    for (_, title, _) in &pages {
        publisher.on_post_page(&mut ctx, title, site);
    }
    ctx.into_report()
}

fn write_file(dir: &Path, rel: &str, content: &[u8]) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn guides_tree() -> NavTree {
    NavTree::new(vec![
        NavNode::section("Guides", 0),
        NavNode::page(Some("Intro"), "guides/intro.md", 1),
    ])
}

struct Fixture {
    docs: TempDir,
    site: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            docs: TempDir::new().unwrap(),
            site: TempDir::new().unwrap(),
        };
        fixture.doc(
            "guides/intro.md",
            "# Intro\n\n![Diagram](img/diagram.png)\n",
        );
        fixture.asset("guides/img/diagram.png", b"PNG");
        fixture
    }

    fn doc(&self, rel: &str, markdown: &str) {
        write_file(self.docs.path(), rel, markdown.as_bytes());
    }

    fn asset(&self, rel: &str, data: &[u8]) {
        write_file(self.site.path(), rel, data);
    }

    fn publish(&self, api: &MockApi, tree: &NavTree, dry_run: bool) -> RunReport {
        publish(api, tree, self.docs.path(), self.site.path(), dry_run)
    }
}

#[test]
fn test_guides_scenario_creates_section_then_page() {
    let fixture = Fixture::new();
    let api = MockApi::new("DOCS").with_page("Docs Home", None);

    let report = fixture.publish(&api, &guides_tree(), false);

    let root_id = api.page("Docs Home").unwrap().id;
    let guides_id = api.page("Guides").unwrap().id;
    let pages: Vec<ApiCall> = api
        .mutations()
        .into_iter()
        .filter(|c| !matches!(c, ApiCall::CreateAttachment { .. }))
        .collect();
    assert_eq!(
        pages,
        vec![
            ApiCall::CreatePage {
                title: "Guides".to_owned(),
                parent_id: Some(root_id),
            },
            ApiCall::CreatePage {
                title: "Intro".to_owned(),
                parent_id: Some(guides_id),
            },
        ]
    );
    assert_eq!(report.pages_created, 1);
    assert_eq!(report.pages_updated, 0);
}

#[test]
fn test_second_run_is_idempotent() {
    let fixture = Fixture::new();
    let api = MockApi::new("DOCS").with_page("Docs Home", None);
    let tree = guides_tree();

    fixture.publish(&api, &tree, false);
    let version = api.page("Intro").unwrap().version;
    api.clear_calls();
    let report = fixture.publish(&api, &tree, false);

    assert!(api.mutations().is_empty());
    assert_eq!(api.page("Intro").unwrap().version, version);
    assert_eq!(api.attachment("Intro", "diagram.png").unwrap().version, 1);
    assert_eq!(report.pages_unchanged, 1);
    assert_eq!(report.attachments_unchanged, 1);
}

#[test]
fn test_local_change_updates_with_next_version() {
    let fixture = Fixture::new();
    let api = MockApi::new("DOCS").with_page("Docs Home", None);
    let tree = guides_tree();

    fixture.publish(&api, &tree, false);
    fixture.doc("guides/intro.md", "# Intro\n\nRewritten.\n");
    api.clear_calls();
    let report = fixture.publish(&api, &tree, false);

    let intro_id = api.page("Intro").unwrap().id;
    assert_eq!(
        api.mutations(),
        vec![ApiCall::UpdatePage {
            id: intro_id,
            title: "Intro".to_owned(),
            version: 2,
        }]
    );
    assert_eq!(report.pages_updated, 1);
}

#[test]
fn test_changed_attachment_is_reuploaded() {
    let fixture = Fixture::new();
    let api = MockApi::new("DOCS").with_page("Docs Home", None);
    let tree = guides_tree();

    fixture.publish(&api, &tree, false);
    fixture.asset("guides/img/diagram.png", b"PNG v2");
    let report = fixture.publish(&api, &tree, false);

    let stored = api.attachment("Intro", "diagram.png").unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(
        Fingerprint::from_change_comment(&stored.comment),
        Some(Fingerprint::of_bytes(b"PNG v2"))
    );
    assert_eq!(report.attachments_updated, 1);
}

#[test]
fn test_same_named_asset_of_other_page_is_ignored() {
    let fixture = Fixture::new();
    fixture.asset("reference/img/diagram.png", b"OTHER");
    let api = MockApi::new("DOCS").with_page("Docs Home", None);
    let tree = guides_tree();

    let first = fixture.publish(&api, &tree, false);
    api.clear_calls();
    let second = fixture.publish(&api, &tree, false);

    assert!(api.mutations().is_empty());
    assert_eq!(api.attachment("Intro", "diagram.png").unwrap().data, b"PNG");
    assert_eq!(first.attachments_created, 1);
    assert_eq!(second.attachments_unchanged, 1);
    assert_eq!(second.attachments_updated, 0);
}

#[test]
fn test_moved_page_is_left_untouched() {
    let fixture = Fixture::new();
    let api = MockApi::new("DOCS")
        .with_page("Docs Home", None)
        .with_page("Guides", Some("Docs Home"))
        .with_page("Archive", Some("Docs Home"))
        .with_page("Intro", Some("Archive"));

    let report = fixture.publish(&api, &guides_tree(), false);

    assert!(api.mutations().is_empty());
    assert_eq!(api.page("Intro").unwrap().version, 1);
    assert_eq!(report.pages_mismatched, 1);
    assert!(!report.has_failures());
    assert!(!report.is_clean());
}

#[test]
fn test_deep_page_creates_ancestors_in_order() {
    let fixture = Fixture::new();
    fixture.doc("guides/advanced/tuning.md", "Tuning notes\n");
    let tree = NavTree::new(vec![
        NavNode::section("Guides", 0),
        NavNode::section("Advanced", 1),
        NavNode::page(Some("Tuning"), "guides/advanced/tuning.md", 2),
    ]);
    let api = MockApi::new("DOCS").with_page("Docs Home", None);

    fixture.publish(&api, &tree, false);

    let created: Vec<(String, Option<String>)> = api
        .mutations()
        .into_iter()
        .filter_map(|c| match c {
            ApiCall::CreatePage { title, parent_id } => Some((title, parent_id)),
            _ => None,
        })
        .collect();
    let id = |title: &str| Some(api.page(title).unwrap().id);
    assert_eq!(
        created,
        vec![
            ("Guides".to_owned(), id("Docs Home")),
            ("Advanced".to_owned(), id("Guides")),
            ("Tuning".to_owned(), id("Advanced")),
        ]
    );
}

#[test]
fn test_dry_run_issues_no_writes() {
    let fixture = Fixture::new();
    let api = MockApi::new("DOCS").with_page("Docs Home", None);

    let report = fixture.publish(&api, &guides_tree(), true);

    assert!(api.mutations().is_empty());
    assert!(!api.calls().is_empty());
    assert!(api.page("Intro").is_none());
    assert_eq!(report.pages_created, 1);
    assert_eq!(report.attachments_skipped, 1);
    assert!(!report.has_failures());
}

#[test]
fn test_failing_page_does_not_stop_run() {
    let fixture = Fixture::new();
    let tree = intro_and_faq_tree(&fixture);
    let api = MockApi::new("DOCS")
        .with_page("Docs Home", None)
        .with_create_failures("Intro", 10);

    let report = fixture.publish(&api, &tree, false);

    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.pages_created, 1);
    assert_eq!(api.parent_title("FAQ").as_deref(), Some("Docs Home"));
    assert!(api.attachment("Intro", "diagram.png").is_none());
}

fn intro_and_faq_tree(fixture: &Fixture) -> NavTree {
    fixture.doc("faq.md", "Questions\n");
    NavTree::new(vec![
        NavNode::section("Guides", 0),
        NavNode::page(Some("Intro"), "guides/intro.md", 1),
        NavNode::page(Some("FAQ"), "faq.md", 0),
    ])
}

#[test]
fn test_failed_lookup_skips_only_that_page() {
    let fixture = Fixture::new();
    let tree = intro_and_faq_tree(&fixture);
    let api = MockApi::new("DOCS")
        .with_page("Docs Home", None)
        .with_search_failures("Intro", 1);

    let report = fixture.publish(&api, &tree, false);

    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.pages_created, 1);
    assert!(api.page("Intro").is_none());
    assert!(api.page("Guides").is_none());
    assert_eq!(api.parent_title("FAQ").as_deref(), Some("Docs Home"));
    assert_eq!(report.attachments_created, 0);

    let rerun = fixture.publish(&api, &tree, false);
    assert_eq!(rerun.pages_failed, 0);
    assert_eq!(api.parent_title("Intro").as_deref(), Some("Guides"));
}

#[test]
fn test_update_conflict_fails_page_and_run_continues() {
    let fixture = Fixture::new();
    let tree = intro_and_faq_tree(&fixture);
    let api = MockApi::new("DOCS")
        .with_page("Docs Home", None)
        .with_page("Guides", Some("Docs Home"))
        .with_page("Intro", Some("Guides"))
        .with_update_conflict("Intro");

    let report = fixture.publish(&api, &tree, false);

    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.pages_updated, 0);
    assert_eq!(report.pages_created, 1);
    assert_eq!(api.page("Intro").unwrap().version, 1);
    assert!(api.attachment("Intro", "diagram.png").is_none());
    assert_eq!(api.parent_title("FAQ").as_deref(), Some("Docs Home"));
}
