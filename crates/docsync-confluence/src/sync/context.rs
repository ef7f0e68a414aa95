//! Per-run state shared by the publishing hooks.

use std::collections::HashMap;
use std::path::PathBuf;

use docsync_nav::NavTree;

use super::SyncError;
use super::attachments::AttachmentOutcome;
use super::pages::PageOutcome;

/// Local file referenced by a synchronized page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub page_title: String,
    /// Docs-relative directory of the page's markdown source.
    pub page_dir: PathBuf,
    /// Path as written in the markdown source.
    pub local_path: PathBuf,
}

/// Position of the page being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index of the current page, 0 before the first page.
    pub current: usize,
    pub total: usize,
}

/// Counters of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub pages_created: usize,
    pub pages_created_at_root: usize,
    pub pages_updated: usize,
    pub pages_unchanged: usize,
    pub pages_mismatched: usize,
    pub pages_failed: usize,
    pub attachments_created: usize,
    pub attachments_updated: usize,
    pub attachments_unchanged: usize,
    /// Attachments whose page does not exist on the remote.
    pub attachments_skipped: usize,
    pub attachments_failed: usize,
}

impl RunReport {
    /// Whether any page or attachment failed.
    ///
    /// Hierarchy mismatches are skips, not failures.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.pages_failed + self.attachments_failed > 0
    }

    /// Whether every node was published without failure or skip.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.has_failures() && self.pages_mismatched == 0
    }
}

/// State of one publishing run.
///
/// Owns the navigation tree, the progress counter and the attachments
/// registered by successfully synchronized pages.
#[derive(Debug)]
pub struct RunContext {
    tree: NavTree,
    root_title: String,
    progress: Progress,
    attachments: HashMap<String, Vec<AttachmentRecord>>,
    report: RunReport,
}

impl RunContext {
    #[must_use]
    pub fn new(tree: NavTree, root_title: impl Into<String>) -> Self {
        let total = tree.page_count();
        Self {
            tree,
            root_title: root_title.into(),
            progress: Progress { current: 0, total },
            attachments: HashMap::new(),
            report: RunReport::default(),
        }
    }

    #[must_use]
    pub fn tree(&self) -> &NavTree {
        &self.tree
    }

    #[must_use]
    pub fn root_title(&self) -> &str {
        &self.root_title
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Move to the next page.
    pub fn advance(&mut self) -> Progress {
        self.progress.current = (self.progress.current + 1).min(self.progress.total);
        self.progress
    }

    /// Count a page whose source could not be read and move past it.
    pub fn record_unreadable_page(&mut self) -> Progress {
        self.report.pages_failed += 1;
        self.advance()
    }

    /// Remember files referenced by a synchronized page.
    pub fn register_attachments(&mut self, page_title: &str, records: Vec<AttachmentRecord>) {
        if records.is_empty() {
            return;
        }
        self.attachments
            .entry(page_title.to_owned())
            .or_default()
            .extend(records);
    }

    /// Files registered for a page.
    #[must_use]
    pub fn attachments_of(&self, page_title: &str) -> &[AttachmentRecord] {
        self.attachments
            .get(page_title)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Remove and return the files registered for a page.
    pub fn take_attachments(&mut self, page_title: &str) -> Vec<AttachmentRecord> {
        self.attachments.remove(page_title).unwrap_or_default()
    }

    #[must_use]
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    #[must_use]
    pub fn into_report(self) -> RunReport {
        self.report
    }

    pub(crate) fn record_page(&mut self, result: &Result<PageOutcome, SyncError>) {
        let report = &mut self.report;
        match result {
            Ok(PageOutcome::Created) => report.pages_created += 1,
            Ok(PageOutcome::CreatedAtSpaceRoot) => report.pages_created_at_root += 1,
            Ok(PageOutcome::Updated) => report.pages_updated += 1,
            Ok(PageOutcome::Unchanged) => report.pages_unchanged += 1,
            Err(SyncError::HierarchyMismatch { .. }) => report.pages_mismatched += 1,
            Err(_) => report.pages_failed += 1,
        }
    }

    pub(crate) fn record_attachment(&mut self, result: &Result<AttachmentOutcome, SyncError>) {
        let report = &mut self.report;
        match result {
            Ok(AttachmentOutcome::Created) => report.attachments_created += 1,
            Ok(AttachmentOutcome::Updated) => report.attachments_updated += 1,
            Ok(AttachmentOutcome::Unchanged) => report.attachments_unchanged += 1,
            Ok(AttachmentOutcome::PageMissing) => report.attachments_skipped += 1,
            Err(_) => report.attachments_failed += 1,
        }
    }
}
