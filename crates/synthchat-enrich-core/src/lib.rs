pub mod error;
pub mod extract;
pub mod issue;
pub mod join;
pub mod manifest;
pub mod model;
pub mod walk;
pub mod writer;

use crate::extract::extract_blocks;
use crate::issue::{CountingSink, Issue, IssueKind, IssueSink};
use crate::join::{join_archive, ArchiveOutcome};
use crate::manifest::build_index;
use crate::walk::enumerate_archives;
use crate::writer::ShardedWriter;
use anyhow::{bail, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use synthchat_config::{EnrichConfig, MirrorPolicy};
use tracing::info;

pub use error::{ArchiveError, ManifestError};
pub use issue::{CollectingSink, TracingSink};
pub use model::{ArchiveEntry, ManifestBlock, ManifestIndex, ManifestRecord, RunSummary};

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub run_id: String,
    pub manifest_dir: PathBuf,
    pub synthetic_dir: PathBuf,
    pub output_dir: PathBuf,
    pub mirror: MirrorPolicy,
}

impl RunRequest {
    pub fn from_config(run_id: impl Into<String>, config: &EnrichConfig) -> Self {
        Self {
            run_id: run_id.into(),
            manifest_dir: config.manifest_path(),
            synthetic_dir: config.synthetic_path(),
            output_dir: config.output_path(),
            mirror: config.mirror,
        }
    }
}

fn validate_run_id(run_id: &str) -> Result<()> {
    if run_id.trim().is_empty() {
        bail!("run id must not be empty");
    }
    if run_id == "." || run_id == ".." || run_id.contains('/') || run_id.contains('\\') {
        bail!("run id `{run_id}` must be a single path component");
    }
    Ok(())
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

pub fn run_enrichment(request: &RunRequest, sink: &mut dyn IssueSink) -> Result<RunSummary> {
    validate_run_id(&request.run_id)?;
    let run_id = request.run_id.as_str();

    let input_root = request.synthetic_dir.join(run_id);
    let writer = ShardedWriter::new(&request.output_dir, run_id);
    if same_location(&input_root, writer.run_root()) {
        bail!(
            "output directory {} would overwrite the input corpus",
            writer.run_root().display()
        );
    }

    let started_at = Utc::now();
    info!("post-processing run_id: {run_id}");
    info!("manifest directory: {}", request.manifest_dir.display());
    info!("synthetic data directory: {}", request.synthetic_dir.display());
    info!(
        "output directory for merged files: {} (mirror={})",
        request.output_dir.display(),
        request.mirror.as_str()
    );

    let mut counting = CountingSink::new(sink);

    let extraction = extract_blocks(&request.manifest_dir, run_id, &mut counting)?;
    let build = build_index(&extraction.blocks, &mut counting);
    let index = build.index;

    let archives = enumerate_archives(&request.synthetic_dir, run_id)?;
    info!(
        "found {} synthetic JSON files under {}",
        archives.len(),
        input_root.display()
    );
    if archives.is_empty() {
        counting.report(Issue::new(
            IssueKind::NoArchives,
            &input_root,
            "no <advisor>/<client>.json archives",
        ));
    }

    let mut archives_modified = 0usize;
    let mut archives_written = 0usize;
    let mut archives_skipped = 0usize;
    let mut conversations_enriched = 0usize;

    for entry in &archives {
        match join_archive(entry, &index, &mut counting) {
            ArchiveOutcome::Modified { document, stats } => {
                archives_modified += 1;
                conversations_enriched += stats.enriched;
                match writer.write_document(&entry.partition, &entry.file_name, &document) {
                    Ok(target) => {
                        archives_written += 1;
                        info!("merged manifest data into file {}", target.display());
                    }
                    Err(exc) => counting.report(Issue::new(
                        exc.issue_kind(),
                        &entry.path,
                        exc.to_string(),
                    )),
                }
            }
            ArchiveOutcome::Unchanged { .. } => {
                if request.mirror == MirrorPolicy::Full {
                    match writer.copy_verbatim(entry) {
                        Ok(_) => archives_written += 1,
                        Err(exc) => counting.report(Issue::new(
                            exc.issue_kind(),
                            &entry.path,
                            exc.to_string(),
                        )),
                    }
                }
            }
            ArchiveOutcome::Skipped => archives_skipped += 1,
        }
    }

    info!(
        "merged manifest data into {} files out of {} synthetic files",
        archives_modified,
        archives.len()
    );

    Ok(RunSummary {
        run_id: run_id.to_string(),
        mirror: request.mirror.as_str().to_string(),
        started_at,
        finished_at: Utc::now(),
        log_files_matched: extraction.files.len(),
        blocks_extracted: extraction.blocks.len(),
        manifests_recognized: build.manifests_recognized,
        blocks_rejected: build.blocks_rejected,
        duplicate_ids: build.duplicate_ids,
        indexed_conversations: index.len(),
        archives_scanned: archives.len(),
        archives_modified,
        archives_written,
        archives_skipped,
        conversations_enriched,
        issues: counting.into_counts(),
    })
}
