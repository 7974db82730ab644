use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestBlock {
    pub source_file: PathBuf,
    pub ordinal: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    pub conversation_id: String,
    pub key_companies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestIndex {
    entries: HashMap<String, Vec<String>>,
}

impl ManifestIndex {
    pub fn insert(&mut self, record: ManifestRecord) -> Option<Vec<String>> {
        self.entries
            .insert(record.conversation_id, record.key_companies)
    }

    pub fn get(&self, conversation_id: &str) -> Option<&[String]> {
        self.entries.get(conversation_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ManifestRecord> for ManifestIndex {
    fn from_iter<I: IntoIterator<Item = ManifestRecord>>(iter: I) -> Self {
        let mut index = Self::default();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub partition: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub mirror: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub log_files_matched: usize,
    pub blocks_extracted: usize,
    pub manifests_recognized: usize,
    pub blocks_rejected: usize,
    pub duplicate_ids: usize,
    pub indexed_conversations: usize,
    pub archives_scanned: usize,
    pub archives_modified: usize,
    pub archives_written: usize,
    pub archives_skipped: usize,
    pub conversations_enriched: usize,
    pub issues: BTreeMap<String, usize>,
}

impl RunSummary {
    pub fn issue_count(&self, kind: &str) -> usize {
        self.issues.get(kind).copied().unwrap_or(0)
    }
}
