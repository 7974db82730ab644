use crate::issue::{Issue, IssueKind, IssueSink};
use crate::model::ManifestBlock;
use anyhow::{Context, Result};
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const BEGIN_MARKER: &str = "---BEGIN_MANIFEST---";
pub const END_MARKER: &str = "---END_MANIFEST---";

const PREFIX_SEPARATOR: &str = " - ";

// Everything after the second " - ", or the whole line when there are fewer separators.
pub fn strip_log_prefix(line: &str) -> &str {
    let mut parts = line.splitn(3, PREFIX_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(_), Some(message)) => message.trim(),
        _ => line.trim(),
    }
}

#[derive(Debug, Default)]
enum ScanState {
    #[default]
    Idle,
    Capturing(Vec<String>),
}

#[derive(Debug)]
pub struct BlockScanner<'m> {
    begin: &'m str,
    end: &'m str,
    state: ScanState,
}

impl Default for BlockScanner<'static> {
    fn default() -> Self {
        Self::new(BEGIN_MARKER, END_MARKER)
    }
}

impl<'m> BlockScanner<'m> {
    pub fn new(begin: &'m str, end: &'m str) -> Self {
        Self {
            begin,
            end,
            state: ScanState::Idle,
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, ScanState::Capturing(_))
    }

    pub fn feed(&mut self, message: &str) -> Option<String> {
        if message == self.begin {
            // A second begin marker restarts the block.
            self.state = ScanState::Capturing(Vec::new());
            return None;
        }

        if message == self.end {
            return match std::mem::take(&mut self.state) {
                ScanState::Capturing(lines) => Some(lines.join("\n")),
                ScanState::Idle => {
                    debug!("end marker outside a manifest block ignored");
                    None
                }
            };
        }

        if let ScanState::Capturing(lines) = &mut self.state {
            lines.push(message.to_string());
        }
        None
    }

    // True when an unterminated block was dropped.
    pub fn finish(self) -> bool {
        self.is_capturing()
    }
}

pub fn scan_log_text(source_file: &Path, text: &str) -> Vec<ManifestBlock> {
    let mut scanner = BlockScanner::default();
    let mut blocks = Vec::new();

    for line in text.lines() {
        if let Some(block) = scanner.feed(strip_log_prefix(line)) {
            blocks.push(ManifestBlock {
                source_file: source_file.to_path_buf(),
                ordinal: blocks.len(),
                text: block,
            });
        }
    }

    if scanner.finish() {
        debug!(
            "discarding unterminated manifest block at end of {}",
            source_file.display()
        );
    }

    blocks
}

pub fn find_log_files(manifest_dir: &Path, run_id: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*{}*.log",
        Pattern::escape(&manifest_dir.to_string_lossy()),
        Pattern::escape(run_id)
    );

    let mut files = Vec::<PathBuf>::new();
    for entry in glob(&pattern).with_context(|| format!("invalid glob: {pattern}"))? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(exc) => warn!("glob iteration error: {exc}"),
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub files: Vec<PathBuf>,
    pub blocks: Vec<ManifestBlock>,
}

pub fn extract_blocks(
    manifest_dir: &Path,
    run_id: &str,
    sink: &mut dyn IssueSink,
) -> Result<Extraction> {
    let files = find_log_files(manifest_dir, run_id)?;
    info!(
        "found {} manifest log file(s) for run {} in {}",
        files.len(),
        run_id,
        manifest_dir.display()
    );

    if files.is_empty() {
        sink.report(Issue::new(
            IssueKind::NoLogFiles,
            manifest_dir,
            format!("no *{run_id}*.log files"),
        ));
    }

    let mut blocks = Vec::new();
    for path in &files {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(exc) => {
                sink.report(Issue::new(
                    IssueKind::LogFileUnreadable,
                    path,
                    exc.to_string(),
                ));
                continue;
            }
        };

        let found = scan_log_text(path, &text);
        debug!("{} manifest block(s) in {}", found.len(), path.display());
        blocks.extend(found);
    }

    Ok(Extraction { files, blocks })
}
