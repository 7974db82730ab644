use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    NoLogFiles,
    LogFileUnreadable,
    ManifestJsonInvalid,
    ManifestIncomplete,
    ManifestDuplicateConflict,
    NoArchives,
    ArchiveUnreadable,
    ArchiveJsonInvalid,
    ArchiveShapeUnexpected,
    ArchiveWriteFailed,
    ConversationMissingId,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoLogFiles => "no_log_files",
            Self::LogFileUnreadable => "log_file_unreadable",
            Self::ManifestJsonInvalid => "manifest_json_invalid",
            Self::ManifestIncomplete => "manifest_incomplete",
            Self::ManifestDuplicateConflict => "manifest_duplicate_conflict",
            Self::NoArchives => "no_archives",
            Self::ArchiveUnreadable => "archive_unreadable",
            Self::ArchiveJsonInvalid => "archive_json_invalid",
            Self::ArchiveShapeUnexpected => "archive_shape_unexpected",
            Self::ArchiveWriteFailed => "archive_write_failed",
            Self::ConversationMissingId => "conversation_missing_id",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::LogFileUnreadable
            | Self::ManifestJsonInvalid
            | Self::ArchiveUnreadable
            | Self::ArchiveJsonInvalid
            | Self::ArchiveWriteFailed => Severity::Error,
            Self::NoLogFiles
            | Self::ManifestIncomplete
            | Self::ManifestDuplicateConflict
            | Self::NoArchives
            | Self::ArchiveShapeUnexpected => Severity::Warn,
            Self::ConversationMissingId => Severity::Debug,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub path: PathBuf,
    pub block: Option<usize>,
    pub detail: String,
}

impl Issue {
    pub fn new(kind: IssueKind, path: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.as_ref().to_path_buf(),
            block: None,
            detail: detail.into(),
        }
    }

    pub fn in_block(mut self, ordinal: usize) -> Self {
        self.block = Some(ordinal);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path.display())?;
        if let Some(block) = self.block {
            write!(f, " (block {block})")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

pub trait IssueSink {
    fn report(&mut self, issue: Issue);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl IssueSink for TracingSink {
    fn report(&mut self, issue: Issue) {
        match issue.kind.severity() {
            Severity::Error => error!(kind = issue.kind.as_str(), "{issue}"),
            Severity::Warn => warn!(kind = issue.kind.as_str(), "{issue}"),
            Severity::Debug => debug!(kind = issue.kind.as_str(), "{issue}"),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub issues: Vec<Issue>,
}

impl CollectingSink {
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }
}

impl IssueSink for CollectingSink {
    fn report(&mut self, issue: Issue) {
        self.issues.push(issue);
    }
}

pub(crate) struct CountingSink<'a> {
    inner: &'a mut dyn IssueSink,
    counts: BTreeMap<String, usize>,
}

impl<'a> CountingSink<'a> {
    pub(crate) fn new(inner: &'a mut dyn IssueSink) -> Self {
        Self {
            inner,
            counts: BTreeMap::new(),
        }
    }

    pub(crate) fn into_counts(self) -> BTreeMap<String, usize> {
        self.counts
    }
}

impl IssueSink for CountingSink<'_> {
    fn report(&mut self, issue: Issue) {
        *self
            .counts
            .entry(issue.kind.as_str().to_string())
            .or_insert(0) += 1;
        self.inner.report(issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_file_kinds_are_errors_and_skip_record_kinds_are_lower() {
        assert_eq!(IssueKind::ManifestJsonInvalid.severity(), Severity::Error);
        assert_eq!(IssueKind::ArchiveJsonInvalid.severity(), Severity::Error);
        assert_eq!(IssueKind::ManifestIncomplete.severity(), Severity::Warn);
        assert_eq!(IssueKind::ConversationMissingId.severity(), Severity::Debug);
    }

    #[test]
    fn display_includes_path_block_and_detail() {
        let issue = Issue::new(
            IssueKind::ManifestIncomplete,
            "/logs/run.log",
            "missing conversation_id",
        )
        .in_block(2);
        assert_eq!(
            issue.to_string(),
            "manifest_incomplete /logs/run.log (block 2): missing conversation_id"
        );
    }

    #[test]
    fn counting_sink_tallies_and_forwards() {
        let mut collected = CollectingSink::default();
        let counts = {
            let mut counting = CountingSink::new(&mut collected);
            counting.report(Issue::new(IssueKind::NoArchives, "/a", ""));
            counting.report(Issue::new(IssueKind::NoArchives, "/b", ""));
            counting.report(Issue::new(IssueKind::ArchiveWriteFailed, "/c", "denied"));
            counting.into_counts()
        };

        assert_eq!(collected.issues.len(), 3);
        assert_eq!(counts.get("no_archives"), Some(&2));
        assert_eq!(counts.get("archive_write_failed"), Some(&1));
    }
}
