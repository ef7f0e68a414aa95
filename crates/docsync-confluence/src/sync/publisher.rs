//! Per-page publishing hooks.

use std::collections::HashSet;
use std::path::Path;

use docsync_renderer::{attachment_paths, render};
use tracing::{debug, error, warn};

use super::SyncError;
use super::attachments::{AttachmentFile, AttachmentSynchronizer, locate_file};
use super::context::{AttachmentRecord, RunContext};
use super::directory::PageDirectory;
use super::pages::{PageOutcome, PageSynchronizer};
use super::resolver::HierarchyResolver;
use super::retry::RetryPolicy;
use crate::api::ConfluenceApi;

/// Publishes navigation pages to one Confluence space.
///
/// Call [`on_page_markdown`](Self::on_page_markdown) for every page node and
/// then [`on_post_page`](Self::on_post_page) once the site is built. Errors
/// are logged and counted per node; one failing page never stops the run.
pub struct Publisher<'a, A: ?Sized> {
    pages: PageSynchronizer<'a, A>,
    attachments: AttachmentSynchronizer<'a, A>,
}

impl<'a, A: ConfluenceApi + ?Sized> Publisher<'a, A> {
    pub fn new(api: &'a A, space: &str, dry_run: bool, retry: RetryPolicy) -> Self {
        let directory = PageDirectory::new(api, space, dry_run);
        Self {
            pages: PageSynchronizer::new(directory.clone(), retry),
            attachments: AttachmentSynchronizer::new(directory),
        }
    }

    /// Synchronize the page node at `index` with `markdown` as its source.
    ///
    /// Returns the markdown unchanged. Files referenced by the page are
    /// registered for [`on_post_page`](Self::on_post_page) only when the page
    /// itself was synchronized.
    pub fn on_page_markdown<'m>(
        &self,
        ctx: &mut RunContext,
        index: usize,
        markdown: &'m str,
    ) -> &'m str {
        let progress = ctx.advance();
        let Some(node) = ctx.tree().get(index) else {
            warn!(index, "No navigation node at index");
            return markdown;
        };
        let title = node.display_title().into_owned();
        let page_dir = node
            .path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let plan = HierarchyResolver::new(ctx.tree(), ctx.root_title()).resolve(index);
        debug!(
            title = %title,
            current = progress.current,
            total = progress.total,
            parent = %plan.immediate_parent_title,
            grandparent = %plan.grandparent_title,
            "Publishing page"
        );

        let body = render(markdown);
        let result = self.pages.sync(&title, &plan, &body);

        match &result {
            Ok(outcome) => {
                if *outcome == PageOutcome::CreatedAtSpaceRoot {
                    warn!(title = %title, "Page created at space root, move it manually");
                }
                let records = attachment_paths(markdown)
                    .into_iter()
                    .map(|path| AttachmentRecord {
                        page_title: title.clone(),
                        page_dir: page_dir.clone(),
                        local_path: path.into(),
                    })
                    .collect();
                ctx.register_attachments(&title, records);
            }
            Err(SyncError::HierarchyMismatch {
                expected, actual, ..
            }) => {
                warn!(
                    title = %title,
                    expected = %expected,
                    actual = actual.as_deref().unwrap_or("<space root>"),
                    "Remote parent differs from nav, page left untouched"
                );
            }
            Err(err) => error!(title = %title, error = %err, "Failed to publish page"),
        }
        ctx.record_page(&result);
        markdown
    }

    /// Upload the files registered for `page_title`, resolved against the
    /// built site in `site_dir`.
    ///
    /// Attachments are keyed by file name on the remote, so only the first
    /// reference resolving to a given name is uploaded.
    pub fn on_post_page(&self, ctx: &mut RunContext, page_title: &str, site_dir: &Path) {
        let mut uploaded: HashSet<String> = HashSet::new();
        for record in ctx.take_attachments(page_title) {
            let Some(path) = locate_file(site_dir, &record.page_dir, &record.local_path) else {
                warn!(
                    page = page_title,
                    path = %record.local_path.display(),
                    "Attachment not found in site directory"
                );
                ctx.record_attachment(&Err(SyncError::NotFound(
                    record.local_path.display().to_string(),
                )));
                continue;
            };

            let result = AttachmentFile::load(page_title, &path).and_then(|file| {
                let filename = file.filename();
                if uploaded.insert(filename.clone()) {
                    self.attachments.sync(&file).map(Some)
                } else {
                    warn!(
                        page = page_title,
                        path = %path.display(),
                        filename = %filename,
                        "Another file with this name is already attached, skipping"
                    );
                    Ok(None)
                }
            });
            match result {
                Ok(None) => {}
                Ok(Some(outcome)) => ctx.record_attachment(&Ok(outcome)),
                Err(err) => {
                    error!(
                        page = page_title,
                        path = %path.display(),
                        error = %err,
                        "Failed to upload attachment"
                    );
                    ctx.record_attachment(&Err(err));
                }
            }
        }
    }
}
