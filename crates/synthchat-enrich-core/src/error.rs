use crate::issue::IssueKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid manifest JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("manifest payload is not a JSON object")]
    NotAnObject,
    #[error("missing or empty generated_conversation.conversation_id")]
    MissingConversationId,
    #[error("missing or empty blueprint.key_companies")]
    MissingKeyCompanies,
    #[error("blueprint.key_companies is not a list of strings")]
    InvalidKeyCompanies,
}

impl ManifestError {
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            Self::InvalidJson(_) => IssueKind::ManifestJsonInvalid,
            _ => IssueKind::ManifestIncomplete,
        }
    }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to read archive: {0}")]
    Read(#[source] std::io::Error),
    #[error("invalid archive JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unexpected structure: expected an object with a `conversations` list")]
    UnexpectedShape,
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn issue_kind(&self) -> IssueKind {
        match self {
            Self::Read(_) => IssueKind::ArchiveUnreadable,
            Self::InvalidJson(_) => IssueKind::ArchiveJsonInvalid,
            Self::UnexpectedShape => IssueKind::ArchiveShapeUnexpected,
            Self::Write { .. } => IssueKind::ArchiveWriteFailed,
        }
    }
}
