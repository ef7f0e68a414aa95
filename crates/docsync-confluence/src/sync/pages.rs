//! Page create/update with on-demand ancestor creation.

use docsync_renderer::escape_html;
use tracing::{debug, info, warn};

use super::SyncError;
use super::directory::{PageDirectory, ParentLookup, RemotePageRef};
use super::fingerprint::Fingerprint;
use super::resolver::AncestorPlan;
use super::retry::{RetryError, RetryPolicy};
use crate::api::ConfluenceApi;

/// Result of synchronizing one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Existing page received a new version.
    Updated,
    /// Existing page already has this body.
    Unchanged,
    /// Page was created under its resolved parent.
    Created,
    /// Page was created at the space root because its parent never became
    /// visible.
    CreatedAtSpaceRoot,
}

/// Reconciles single pages with the remote tree.
pub struct PageSynchronizer<'a, A: ?Sized> {
    directory: PageDirectory<'a, A>,
    retry: RetryPolicy,
}

impl<'a, A: ConfluenceApi + ?Sized> PageSynchronizer<'a, A> {
    pub fn new(directory: PageDirectory<'a, A>, retry: RetryPolicy) -> Self {
        Self { directory, retry }
    }

    /// Create or update the page `title` with `body` under `plan`.
    ///
    /// An existing page is only updated when its remote parent matches the
    /// planned parent. A missing page is created together with any missing
    /// parent and grandparent.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::HierarchyMismatch`] (without writing anything)
    /// when the page exists under another parent,
    /// [`SyncError::MainRootUnknown`] when ancestors must be created but the
    /// root page does not exist, and [`SyncError::NotVisible`] when a created
    /// grandparent never shows up in searches.
    pub fn sync(
        &self,
        title: &str,
        plan: &AncestorPlan,
        body: &str,
    ) -> Result<PageOutcome, SyncError> {
        match self.directory.find(title)? {
            Some(page) => self.update_existing(&page, plan, body),
            None => self.create_with_ancestors(title, plan, body),
        }
    }

    fn update_existing(
        &self,
        page: &RemotePageRef,
        plan: &AncestorPlan,
        body: &str,
    ) -> Result<PageOutcome, SyncError> {
        let title = page.title.as_str();
        let actual = match self.directory.parent_title_of(title)? {
            ParentLookup::Parent(parent) => Some(parent),
            ParentLookup::NoParent => None,
            ParentLookup::NotFound => return Err(SyncError::NotFound(title.to_owned())),
        };
        if actual.as_deref() != Some(plan.immediate_parent_title.as_str()) {
            return Err(SyncError::HierarchyMismatch {
                title: title.to_owned(),
                expected: plan.immediate_parent_title.clone(),
                actual,
            });
        }

        if page.fingerprint.as_ref() == Some(&Fingerprint::of_bytes(body.as_bytes())) {
            debug!(title, "Page body unchanged, skipping update");
            return Ok(PageOutcome::Unchanged);
        }

        self.directory.update(title, body)?;
        info!(title, "Updated page");
        Ok(PageOutcome::Updated)
    }

    fn create_with_ancestors(
        &self,
        title: &str,
        plan: &AncestorPlan,
        body: &str,
    ) -> Result<PageOutcome, SyncError> {
        let mut parent_id = self.page_id(&plan.immediate_parent_title)?;

        if parent_id.is_none() {
            let mut grandparent_id = self.page_id(&plan.grandparent_title)?;
            if grandparent_id.is_none() {
                let root_id = self
                    .page_id(&plan.root_title)?
                    .ok_or_else(|| SyncError::MainRootUnknown(plan.root_title.clone()))?;
                grandparent_id = self.create_ancestor(&plan.grandparent_title, Some(&root_id))?;
            }

            parent_id = match self
                .create_ancestor(&plan.immediate_parent_title, grandparent_id.as_deref())
            {
                Ok(id) => id,
                Err(SyncError::NotVisible { title: parent, attempts }) => {
                    warn!(
                        page = title,
                        parent = %parent,
                        attempts,
                        "Parent page not visible yet, creating page at space root"
                    );
                    self.create_page(title, None, body)?;
                    return Ok(PageOutcome::CreatedAtSpaceRoot);
                }
                Err(err) => return Err(err),
            };
        }

        self.create_page(title, parent_id.as_deref(), body)?;
        info!(title, parent = %plan.immediate_parent_title, "Created page");
        Ok(PageOutcome::Created)
    }

    /// ID of the page titled `title`, if it exists.
    fn page_id(&self, title: &str) -> Result<Option<String>, SyncError> {
        Ok(self.directory.find(title)?.map(|page| page.id))
    }

    /// Create a placeholder ancestor page and wait until searches find it.
    ///
    /// Returns `None` in dry-run mode.
    fn create_ancestor(
        &self,
        title: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<String>, SyncError> {
        let body = format!("<p>{}</p>", escape_html(title));
        if self.create_page(title, parent_id, &body)?.is_none() {
            return Ok(None);
        }

        self.retry
            .poll(|| self.page_id(title))
            .map(Some)
            .map_err(|err| settle(err, title))
    }

    /// Create a page, retrying failed attempts.
    ///
    /// A retry first checks whether a previous attempt went through after
    /// all, so at most one page is created.
    fn create_page(
        &self,
        title: &str,
        parent_id: Option<&str>,
        body: &str,
    ) -> Result<Option<RemotePageRef>, SyncError> {
        self.retry
            .retry(|attempt| {
                if attempt > 1
                    && let Some(page) = self.directory.find(title)?
                {
                    return Ok(Some(page));
                }
                self.directory.create(title, parent_id, body)
            })
            .map_err(|err| settle(err, title))
    }
}

fn settle(err: RetryError<SyncError>, title: &str) -> SyncError {
    match err {
        RetryError::Exhausted { source, .. } | RetryError::Failed(source) => source,
        RetryError::TimedOut { attempts } => SyncError::NotVisible {
            title: title.to_owned(),
            attempts,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::{ApiCall, MockApi};

    const FAST: RetryPolicy = RetryPolicy::new(3, Duration::ZERO);

    fn plan(parent: &str, grandparent: &str) -> AncestorPlan {
        AncestorPlan {
            immediate_parent_title: parent.to_owned(),
            grandparent_title: grandparent.to_owned(),
            root_title: "Docs Home".to_owned(),
        }
    }

    fn synchronizer(api: &MockApi, dry_run: bool) -> PageSynchronizer<'_, MockApi> {
        PageSynchronizer::new(PageDirectory::new(api, "DOCS", dry_run), FAST)
    }

    fn created(api: &MockApi) -> Vec<(String, Option<String>)> {
        api.mutations()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::CreatePage { title, parent_id } => Some((title, parent_id)),
                _ => None,
            })
            .collect()
    }

    fn id_of(api: &MockApi, title: &str) -> String {
        api.page(title).unwrap().id
    }

    #[test]
    fn test_existing_page_with_matching_parent_is_updated() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_page("Guides", Some("Docs Home"))
            .with_page("Intro", Some("Guides"));
        let sync = synchronizer(&api, false);

        let outcome = sync.sync("Intro", &plan("Guides", "Docs Home"), "<p>new</p>");

        assert_eq!(outcome.unwrap(), PageOutcome::Updated);
        let page = api.page("Intro").unwrap();
        assert_eq!(page.version, 2);
        assert_eq!(page.body, "<p>new</p>");
        assert_eq!(api.mutations().len(), 1);
    }

    #[test]
    fn test_unchanged_body_is_not_rewritten() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_page("Intro", Some("Docs Home"));
        let sync = synchronizer(&api, false);
        let plan = plan("Docs Home", "Docs Home");

        sync.sync("Intro", &plan, "<p>same</p>").unwrap();
        api.clear_calls();
        let outcome = sync.sync("Intro", &plan, "<p>same</p>").unwrap();

        assert_eq!(outcome, PageOutcome::Unchanged);
        assert!(api.mutations().is_empty());
        assert_eq!(api.page("Intro").unwrap().version, 2);
    }

    #[test]
    fn test_parent_mismatch_writes_nothing() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_page("Guides", Some("Docs Home"))
            .with_page("Reference", Some("Docs Home"))
            .with_page("Intro", Some("Reference"));
        let sync = synchronizer(&api, false);

        let err = sync
            .sync("Intro", &plan("Guides", "Docs Home"), "<p>new</p>")
            .unwrap_err();

        match err {
            SyncError::HierarchyMismatch {
                title,
                expected,
                actual,
            } => {
                assert_eq!(title, "Intro");
                assert_eq!(expected, "Guides");
                assert_eq!(actual.as_deref(), Some("Reference"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(api.mutations().is_empty());
    }

    #[test]
    fn test_page_at_space_root_mismatches_planned_parent() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_page("Intro", None);
        let sync = synchronizer(&api, false);

        let err = sync
            .sync("Intro", &plan("Docs Home", "Docs Home"), "<p>x</p>")
            .unwrap_err();

        assert!(matches!(err, SyncError::HierarchyMismatch { actual: None, .. }));
        assert!(api.mutations().is_empty());
    }

    #[test]
    fn test_missing_page_with_existing_parent() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_page("Guides", Some("Docs Home"));
        let sync = synchronizer(&api, false);

        let outcome = sync.sync("Intro", &plan("Guides", "Docs Home"), "<p>hi</p>");

        assert_eq!(outcome.unwrap(), PageOutcome::Created);
        assert_eq!(
            created(&api),
            vec![("Intro".to_owned(), Some(id_of(&api, "Guides")))]
        );
    }

    #[test]
    fn test_missing_parent_is_created_under_grandparent() {
        let api = MockApi::new("DOCS").with_page("Docs Home", None);
        let sync = synchronizer(&api, false);

        let outcome = sync.sync("Intro", &plan("Guides", "Docs Home"), "<p>hi</p>");

        assert_eq!(outcome.unwrap(), PageOutcome::Created);
        assert_eq!(
            created(&api),
            vec![
                ("Guides".to_owned(), Some(id_of(&api, "Docs Home"))),
                ("Intro".to_owned(), Some(id_of(&api, "Guides"))),
            ]
        );
        assert_eq!(api.page("Guides").unwrap().body, "<p>Guides</p>");
    }

    #[test]
    fn test_missing_chain_is_created_top_down() {
        let api = MockApi::new("DOCS").with_page("Docs Home", None);
        let sync = synchronizer(&api, false);

        let outcome = sync.sync("Tuning", &plan("Advanced", "Guides"), "<p>hi</p>");

        assert_eq!(outcome.unwrap(), PageOutcome::Created);
        assert_eq!(
            created(&api),
            vec![
                ("Guides".to_owned(), Some(id_of(&api, "Docs Home"))),
                ("Advanced".to_owned(), Some(id_of(&api, "Guides"))),
                ("Tuning".to_owned(), Some(id_of(&api, "Advanced"))),
            ]
        );
    }

    #[test]
    fn test_missing_root_fails_without_writes() {
        let api = MockApi::new("DOCS");
        let sync = synchronizer(&api, false);

        let err = sync
            .sync("Tuning", &plan("Advanced", "Guides"), "<p>hi</p>")
            .unwrap_err();

        assert!(matches!(err, SyncError::MainRootUnknown(root) if root == "Docs Home"));
        assert!(api.mutations().is_empty());
    }

    #[test]
    fn test_index_lag_is_polled_through() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_index_lag(2);
        let sync = synchronizer(&api, false);

        let outcome = sync.sync("Intro", &plan("Guides", "Docs Home"), "<p>hi</p>");

        assert_eq!(outcome.unwrap(), PageOutcome::Created);
        assert_eq!(api.parent_title("Intro").as_deref(), Some("Guides"));
    }

    #[test]
    fn test_invisible_parent_degrades_to_space_root() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_index_lag(10);
        let sync = synchronizer(&api, false);

        let outcome = sync.sync("Intro", &plan("Guides", "Docs Home"), "<p>hi</p>");

        assert_eq!(outcome.unwrap(), PageOutcome::CreatedAtSpaceRoot);
        assert_eq!(api.parent_title("Guides").as_deref(), Some("Docs Home"));
        assert_eq!(api.parent_title("Intro"), None);
    }

    #[test]
    fn test_invisible_grandparent_is_fatal() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_index_lag(10);
        let sync = synchronizer(&api, false);

        let err = sync
            .sync("Tuning", &plan("Advanced", "Guides"), "<p>hi</p>")
            .unwrap_err();

        assert!(matches!(err, SyncError::NotVisible { title, attempts: 3 } if title == "Guides"));
        assert!(api.page("Advanced").is_none());
        assert!(api.page("Tuning").is_none());
    }

    #[test]
    fn test_failed_create_is_retried() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_create_failures("Intro", 2);
        let sync = synchronizer(&api, false);

        let outcome = sync.sync("Intro", &plan("Docs Home", "Docs Home"), "<p>hi</p>");

        assert_eq!(outcome.unwrap(), PageOutcome::Created);
        assert!(api.page("Intro").is_some());
    }

    #[test]
    fn test_create_gives_up_after_bound() {
        let api = MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_create_failures("Intro", 5);
        let sync = synchronizer(&api, false);

        let err = sync
            .sync("Intro", &plan("Docs Home", "Docs Home"), "<p>hi</p>")
            .unwrap_err();

        assert!(matches!(err, SyncError::Transport(e) if e.status() == Some(503)));
        let attempts = api
            .calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::CreatePage { .. }))
            .count();
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_dry_run_only_reads() {
        let api = MockApi::new("DOCS").with_page("Docs Home", None);
        let sync = synchronizer(&api, true);

        let outcome = sync.sync("Tuning", &plan("Advanced", "Guides"), "<p>hi</p>");

        assert_eq!(outcome.unwrap(), PageOutcome::Created);
        assert!(api.mutations().is_empty());
    }
}
