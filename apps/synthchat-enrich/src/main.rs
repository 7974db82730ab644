mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, OutputFormat};
use synthchat_enrich_core::{run_enrichment, RunRequest, RunSummary, TracingSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn render_plain(summary: &RunSummary) -> String {
    let mut lines = vec![
        format!("run_id: {}", summary.run_id),
        format!("mirror: {}", summary.mirror),
        format!("started_at: {}", summary.started_at.to_rfc3339()),
        format!("finished_at: {}", summary.finished_at.to_rfc3339()),
        format!("log_files_matched: {}", summary.log_files_matched),
        format!("blocks_extracted: {}", summary.blocks_extracted),
        format!("manifests_recognized: {}", summary.manifests_recognized),
        format!("blocks_rejected: {}", summary.blocks_rejected),
        format!("duplicate_ids: {}", summary.duplicate_ids),
        format!("indexed_conversations: {}", summary.indexed_conversations),
        format!("archives_scanned: {}", summary.archives_scanned),
        format!("archives_modified: {}", summary.archives_modified),
        format!("archives_written: {}", summary.archives_written),
        format!("archives_skipped: {}", summary.archives_skipped),
        format!("conversations_enriched: {}", summary.conversations_enriched),
    ];
    for (kind, count) in &summary.issues {
        lines.push(format!("issues.{kind}: {count}"));
    }
    lines.join("\n")
}

fn render_summary(summary: &RunSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Plain => Ok(render_plain(summary)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(summary).context("failed to serialize run summary")
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = synthchat_config::resolve_config_path(args.config.clone());
    let mut config = synthchat_config::load_config_or_default(config_path.as_deref())
        .with_context(|| match &config_path {
            Some(path) => format!("failed to load config {}", path.display()),
            None => "failed to load default config".to_string(),
        })?;
    args.apply_overrides(&mut config.enrich);

    let request = RunRequest::from_config(args.run_id.as_str(), &config.enrich);
    let summary = run_enrichment(&request, &mut TracingSink)?;

    info!(
        "run {} complete: {} manifests recognized, {} archives scanned, {} modified",
        summary.run_id,
        summary.manifests_recognized,
        summary.archives_scanned,
        summary.archives_modified
    );
    println!("{}", render_summary(&summary, args.output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn summary() -> RunSummary {
        let now = Utc::now();
        RunSummary {
            run_id: "run1".to_string(),
            mirror: "sparse".to_string(),
            started_at: now,
            finished_at: now,
            log_files_matched: 1,
            blocks_extracted: 2,
            manifests_recognized: 1,
            blocks_rejected: 1,
            duplicate_ids: 0,
            indexed_conversations: 1,
            archives_scanned: 1,
            archives_modified: 1,
            archives_written: 1,
            archives_skipped: 0,
            conversations_enriched: 1,
            issues: BTreeMap::from([("manifest_json_invalid".to_string(), 1)]),
        }
    }

    #[test]
    fn plain_summary_lists_counts_and_issues() {
        let text = render_summary(&summary(), OutputFormat::Plain).expect("render");
        assert!(text.contains("blocks_extracted: 2"));
        assert!(text.contains("duplicate_ids: 0"));
        assert!(text.contains("started_at: "));
        assert!(text.contains("finished_at: "));
        assert!(text.contains("manifests_recognized: 1"));
        assert!(text.contains("archives_scanned: 1"));
        assert!(text.contains("archives_modified: 1"));
        assert!(text.contains("issues.manifest_json_invalid: 1"));
    }

    #[test]
    fn json_summary_is_machine_readable() {
        let text = render_summary(&summary(), OutputFormat::Json).expect("render");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["run_id"], "run1");
        assert_eq!(value["archives_modified"], 1);
        assert_eq!(value["issues"]["manifest_json_invalid"], 1);
    }
}
