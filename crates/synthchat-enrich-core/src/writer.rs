use crate::error::ArchiveError;
use crate::model::ArchiveEntry;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::path::{Path, PathBuf};

const INDENT: &[u8] = b"    ";

pub fn to_pretty_json(document: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    document.serialize(&mut serializer)?;
    Ok(buf)
}

#[derive(Debug, Clone)]
pub struct ShardedWriter {
    run_root: PathBuf,
}

impl ShardedWriter {
    pub fn new(output_dir: &Path, run_id: &str) -> Self {
        Self {
            run_root: output_dir.join(run_id),
        }
    }

    pub fn run_root(&self) -> &Path {
        &self.run_root
    }

    pub fn target_path(&self, partition: &str, file_name: &str) -> PathBuf {
        self.run_root.join(partition).join(file_name)
    }

    fn ensure_partition(&self, partition: &str) -> Result<PathBuf, ArchiveError> {
        let dir = self.run_root.join(partition);
        std::fs::create_dir_all(&dir).map_err(|exc| ArchiveError::write(&dir, exc))?;
        Ok(dir)
    }

    pub fn write_document(
        &self,
        partition: &str,
        file_name: &str,
        document: &Value,
    ) -> Result<PathBuf, ArchiveError> {
        let target = self.ensure_partition(partition)?.join(file_name);
        let bytes = to_pretty_json(document).map_err(|exc| {
            ArchiveError::write(
                &target,
                std::io::Error::new(std::io::ErrorKind::InvalidData, exc),
            )
        })?;
        std::fs::write(&target, bytes).map_err(|exc| ArchiveError::write(&target, exc))?;
        Ok(target)
    }

    pub fn copy_verbatim(&self, entry: &ArchiveEntry) -> Result<PathBuf, ArchiveError> {
        let target = self.ensure_partition(&entry.partition)?.join(&entry.file_name);
        std::fs::copy(&entry.path, &target).map_err(|exc| ArchiveError::write(&target, exc))?;
        Ok(target)
    }
}
