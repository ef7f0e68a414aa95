//! Title-keyed view of the remote page tree.

use tracing::{debug, info};

use super::SyncError;
use super::fingerprint::Fingerprint;
use crate::api::{ConfluenceApi, NewPage, PageUpdate};
use crate::types::Content;

/// Remote page located by title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePageRef {
    pub id: String,
    pub title: String,
    pub version: u32,
    /// Fingerprint of the body written by the latest docsync update.
    pub fingerprint: Option<Fingerprint>,
}

impl RemotePageRef {
    fn from_content(content: Content) -> Self {
        let (version, fingerprint) = content.version.map_or((0, None), |v| {
            let fingerprint = v
                .message
                .as_deref()
                .and_then(Fingerprint::from_change_comment);
            (v.number, fingerprint)
        });
        Self {
            id: content.id,
            title: content.title,
            version,
            fingerprint,
        }
    }
}

/// Parent of a remote page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentLookup {
    /// Page has a parent with this title.
    Parent(String),
    /// Page sits at the space root.
    NoParent,
    /// Page does not exist.
    NotFound,
}

/// Pages of one space, addressed by title.
///
/// Titles are unique within a Confluence space, which makes them the join
/// key between navigation nodes and remote pages. Mutations are skipped
/// (and logged) in dry-run mode.
pub struct PageDirectory<'a, A: ?Sized> {
    api: &'a A,
    space: String,
    dry_run: bool,
}

impl<A: ?Sized> Clone for PageDirectory<'_, A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api,
            space: self.space.clone(),
            dry_run: self.dry_run,
        }
    }
}

impl<'a, A: ConfluenceApi + ?Sized> PageDirectory<'a, A> {
    pub fn new(api: &'a A, space: impl Into<String>, dry_run: bool) -> Self {
        Self {
            api,
            space: space.into(),
            dry_run,
        }
    }

    #[must_use]
    pub fn api(&self) -> &'a A {
        self.api
    }

    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Find a page by exact title.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AmbiguousResult`] when more than one page matches
    /// and [`SyncError::Transport`] when the search fails.
    pub fn find(&self, title: &str) -> Result<Option<RemotePageRef>, SyncError> {
        let mut results = self.api.find_pages(&self.space, title, &["version"])?;
        if results.len() > 1 {
            return Err(SyncError::AmbiguousResult {
                title: title.to_owned(),
                space: self.space.clone(),
                count: results.len(),
            });
        }
        Ok(results.pop().map(RemotePageRef::from_content))
    }

    /// Current version number of a page.
    ///
    /// # Errors
    ///
    /// Same as [`find`](Self::find).
    pub fn version_of(&self, title: &str) -> Result<Option<u32>, SyncError> {
        Ok(self.find(title)?.map(|page| page.version))
    }

    /// Title of a page's direct parent.
    ///
    /// # Errors
    ///
    /// Same as [`find`](Self::find), plus transport errors of the ancestor
    /// lookup.
    pub fn parent_title_of(&self, title: &str) -> Result<ParentLookup, SyncError> {
        let Some(page) = self.find(title)? else {
            return Ok(ParentLookup::NotFound);
        };
        let content = self.api.get_page(&page.id, &["ancestors"])?;
        Ok(content
            .parent_title()
            .map_or(ParentLookup::NoParent, |t| ParentLookup::Parent(t.to_owned())))
    }

    /// Create a page under `parent_id`, or at the space root.
    ///
    /// Returns `None` in dry-run mode.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] when the request fails.
    pub fn create(
        &self,
        title: &str,
        parent_id: Option<&str>,
        body: &str,
    ) -> Result<Option<RemotePageRef>, SyncError> {
        if self.dry_run {
            info!(title, parent_id, "Dry run: would create page");
            return Ok(None);
        }

        let comment = Fingerprint::of_bytes(body.as_bytes()).change_comment();
        let content = self.api.create_page(&NewPage {
            space: &self.space,
            title,
            parent_id,
            body,
            message: Some(&comment),
        })?;
        info!(title, id = %content.id, "Created page");
        Ok(Some(RemotePageRef::from_content(content)))
    }

    /// Replace a page body, writing the current version + 1.
    ///
    /// The version is read right before the write.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if the page is gone,
    /// [`SyncError::Conflict`] if the server rejects the version and
    /// [`SyncError::Transport`] for other failures.
    pub fn update(&self, title: &str, body: &str) -> Result<(), SyncError> {
        let page = self
            .find(title)?
            .ok_or_else(|| SyncError::NotFound(title.to_owned()))?;
        let version = page.version + 1;

        if self.dry_run {
            info!(title, version, "Dry run: would update page");
            return Ok(());
        }

        let comment = Fingerprint::of_bytes(body.as_bytes()).change_comment();
        let result = self.api.update_page(&PageUpdate {
            id: &page.id,
            space: &self.space,
            title,
            body,
            version,
            message: Some(&comment),
        });
        match result {
            Ok(_) => {
                debug!(title, version, "Updated page");
                Ok(())
            }
            Err(err) if err.status() == Some(409) => Err(SyncError::Conflict {
                title: title.to_owned(),
                version,
            }),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::{ApiCall, MockApi};

    fn api() -> MockApi {
        MockApi::new("DOCS")
            .with_page("Docs Home", None)
            .with_page("Guides", Some("Docs Home"))
    }

    #[test]
    fn test_find_existing_and_missing() {
        let api = api();
        let directory = PageDirectory::new(&api, "DOCS", false);

        let page = directory.find("Guides").unwrap().unwrap();
        assert_eq!(page.title, "Guides");
        assert_eq!(page.version, 1);
        assert_eq!(directory.find("Nope").unwrap(), None);
    }

    #[test]
    fn test_find_in_other_space_is_missing() {
        let api = api();
        let directory = PageDirectory::new(&api, "OTHER", false);
        assert_eq!(directory.find("Guides").unwrap(), None);
    }

    #[test]
    fn test_find_ambiguous_title() {
        let api = api().with_page("Dup", None).with_page("Dup", Some("Guides"));
        let directory = PageDirectory::new(&api, "DOCS", false);

        let err = directory.find("Dup").unwrap_err();
        assert!(matches!(err, SyncError::AmbiguousResult { count: 2, .. }));
    }

    #[test]
    fn test_parent_title_of() {
        let api = api();
        let directory = PageDirectory::new(&api, "DOCS", false);

        assert_eq!(
            directory.parent_title_of("Guides").unwrap(),
            ParentLookup::Parent("Docs Home".to_owned())
        );
        assert_eq!(
            directory.parent_title_of("Docs Home").unwrap(),
            ParentLookup::NoParent
        );
        assert_eq!(
            directory.parent_title_of("Nope").unwrap(),
            ParentLookup::NotFound
        );
    }

    #[test]
    fn test_update_writes_next_version() {
        let api = api();
        let directory = PageDirectory::new(&api, "DOCS", false);

        directory.update("Guides", "<p>v2</p>").unwrap();
        directory.update("Guides", "<p>v3</p>").unwrap();

        let page = api.page("Guides").unwrap();
        assert_eq!(page.version, 3);
        assert_eq!(page.body, "<p>v3</p>");
        assert_eq!(directory.version_of("Guides").unwrap(), Some(3));
    }

    #[test]
    fn test_update_records_body_fingerprint() {
        let api = api();
        let directory = PageDirectory::new(&api, "DOCS", false);

        directory.update("Guides", "<p>body</p>").unwrap();

        let page = directory.find("Guides").unwrap().unwrap();
        assert_eq!(
            page.fingerprint,
            Some(Fingerprint::of_bytes(b"<p>body</p>"))
        );
    }

    #[test]
    fn test_update_conflict() {
        let api = api().with_update_conflict("Guides");
        let directory = PageDirectory::new(&api, "DOCS", false);

        let err = directory.update("Guides", "<p>x</p>").unwrap_err();
        assert!(matches!(err, SyncError::Conflict { version: 2, .. }));
        assert_eq!(api.page("Guides").unwrap().version, 1);
    }

    #[test]
    fn test_update_missing_page() {
        let api = api();
        let directory = PageDirectory::new(&api, "DOCS", false);

        let err = directory.update("Nope", "<p>x</p>").unwrap_err();
        assert!(matches!(err, SyncError::NotFound(title) if title == "Nope"));
    }

    #[test]
    fn test_create_under_parent() {
        let api = api();
        let directory = PageDirectory::new(&api, "DOCS", false);
        let guides_id = api.page("Guides").unwrap().id;

        let created = directory
            .create("Intro", Some(&guides_id), "<p>hi</p>")
            .unwrap()
            .unwrap();

        assert_eq!(created.title, "Intro");
        assert_eq!(api.parent_title("Intro").as_deref(), Some("Guides"));
    }

    #[test]
    fn test_dry_run_skips_mutations() {
        let api = api();
        let directory = PageDirectory::new(&api, "DOCS", true);

        assert_eq!(directory.create("Intro", None, "<p>hi</p>").unwrap(), None);
        directory.update("Guides", "<p>new</p>").unwrap();

        assert!(api.mutations().is_empty());
        assert!(
            api.calls()
                .iter()
                .all(|c| matches!(c, ApiCall::FindPages { .. }))
        );
    }
}
