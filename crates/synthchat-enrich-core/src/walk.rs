use crate::model::ArchiveEntry;
use anyhow::{Context, Result};
use glob::{glob, Pattern};
use std::path::Path;
use tracing::warn;

pub fn enumerate_archives(synthetic_dir: &Path, run_id: &str) -> Result<Vec<ArchiveEntry>> {
    let run_root = synthetic_dir.join(run_id);
    let pattern = format!("{}/*/*.json", Pattern::escape(&run_root.to_string_lossy()));

    let mut archives = Vec::<ArchiveEntry>::new();
    for entry in glob(&pattern).with_context(|| format!("invalid glob: {pattern}"))? {
        let path = match entry {
            Ok(path) => path,
            Err(exc) => {
                warn!("glob iteration error: {exc}");
                continue;
            }
        };

        if !path.is_file() {
            continue;
        }

        let partition = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().to_string());
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());

        if let (Some(partition), Some(file_name)) = (partition, file_name) {
            archives.push(ArchiveEntry {
                path,
                partition,
                file_name,
            });
        }
    }

    archives.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(archives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, "{}").expect("write");
    }

    #[test]
    fn yields_two_level_archives_with_partition_keys() {
        let dir = TempDir::new().expect("tempdir");
        touch(dir.path(), "run1/advisor_b/client_1.json");
        touch(dir.path(), "run1/advisor_a/client_2.json");
        touch(dir.path(), "run1/advisor_a/client_1.json");

        let archives = enumerate_archives(dir.path(), "run1").expect("walk");
        let keys: Vec<(&str, &str)> = archives
            .iter()
            .map(|a| (a.partition.as_str(), a.file_name.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("advisor_a", "client_1.json"),
                ("advisor_a", "client_2.json"),
                ("advisor_b", "client_1.json"),
            ]
        );
    }

    #[test]
    fn ignores_other_runs_other_depths_and_other_extensions() {
        let dir = TempDir::new().expect("tempdir");
        touch(dir.path(), "run1/top_level.json");
        touch(dir.path(), "run1/advisor/nested/deep.json");
        touch(dir.path(), "run1/advisor/notes.txt");
        touch(dir.path(), "run2/advisor/client.json");
        touch(dir.path(), "run1/advisor/client.json");

        let archives = enumerate_archives(dir.path(), "run1").expect("walk");
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].partition, "advisor");
        assert_eq!(archives[0].file_name, "client.json");
    }

    #[test]
    fn directories_named_like_archives_are_skipped() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("run1/advisor/odd.json")).expect("mkdir");

        let archives = enumerate_archives(dir.path(), "run1").expect("walk");
        assert!(archives.is_empty());
    }

    #[test]
    fn missing_run_directory_yields_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let archives = enumerate_archives(dir.path(), "absent").expect("walk");
        assert!(archives.is_empty());
    }
}
