use crate::error::ArchiveError;
use crate::issue::{Issue, IssueKind, IssueSink};
use crate::model::{ArchiveEntry, ManifestIndex};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub const ENRICHED_FIELD: &str = "key_companies";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub conversations: usize,
    pub enriched: usize,
    // Positions without a usable conversation_id.
    pub missing_ids: Vec<usize>,
}

impl JoinStats {
    pub fn modified(&self) -> bool {
        self.enriched > 0
    }
}

pub fn enrich_document(
    document: &mut Value,
    index: &ManifestIndex,
) -> Result<JoinStats, ArchiveError> {
    let conversations = document
        .as_object_mut()
        .and_then(|root| root.get_mut("conversations"))
        .and_then(Value::as_array_mut)
        .ok_or(ArchiveError::UnexpectedShape)?;

    let mut stats = JoinStats {
        conversations: conversations.len(),
        ..JoinStats::default()
    };

    for (position, conversation) in conversations.iter_mut().enumerate() {
        let Some(fields) = conversation.as_object_mut() else {
            stats.missing_ids.push(position);
            continue;
        };

        let companies = match fields.get("conversation_id") {
            Some(Value::String(id)) if !id.is_empty() => index.get(id),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                stats.missing_ids.push(position);
                continue;
            }
            // Non-string ids can never match a manifest.
            Some(_) => None,
        };

        if let Some(companies) = companies {
            let companies: Vec<Value> = companies.iter().cloned().map(Value::String).collect();
            fields.insert(ENRICHED_FIELD.to_string(), Value::Array(companies));
            stats.enriched += 1;
        }
    }

    Ok(stats)
}

pub fn load_archive(path: &Path) -> Result<Value, ArchiveError> {
    let content = std::fs::read_to_string(path).map_err(ArchiveError::Read)?;
    Ok(serde_json::from_str(&content)?)
}

#[derive(Debug)]
pub enum ArchiveOutcome {
    Modified { document: Value, stats: JoinStats },
    Unchanged { stats: JoinStats },
    Skipped,
}

pub fn join_archive(
    entry: &ArchiveEntry,
    index: &ManifestIndex,
    sink: &mut dyn IssueSink,
) -> ArchiveOutcome {
    let mut document = match load_archive(&entry.path) {
        Ok(document) => document,
        Err(exc) => {
            sink.report(Issue::new(exc.issue_kind(), &entry.path, exc.to_string()));
            return ArchiveOutcome::Skipped;
        }
    };

    let stats = match enrich_document(&mut document, index) {
        Ok(stats) => stats,
        Err(exc) => {
            sink.report(Issue::new(exc.issue_kind(), &entry.path, exc.to_string()));
            return ArchiveOutcome::Skipped;
        }
    };

    for position in &stats.missing_ids {
        sink.report(Issue::new(
            IssueKind::ConversationMissingId,
            &entry.path,
            format!("conversation {position} has no conversation_id"),
        ));
    }

    if stats.modified() {
        debug!(
            "enriched {} of {} conversations in {}",
            stats.enriched,
            stats.conversations,
            entry.path.display()
        );
        ArchiveOutcome::Modified { document, stats }
    } else {
        debug!("no manifest data found for {}", entry.path.display());
        ArchiveOutcome::Unchanged { stats }
    }
}
