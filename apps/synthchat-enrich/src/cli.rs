use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use synthchat_config::{EnrichConfig, MirrorPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MirrorArg {
    Sparse,
    Full,
}

impl From<MirrorArg> for MirrorPolicy {
    fn from(value: MirrorArg) -> Self {
        match value {
            MirrorArg::Sparse => Self::Sparse,
            MirrorArg::Full => Self::Full,
        }
    }
}

fn parse_run_id(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("run id must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "synthchat-enrich",
    about = "Merge manifest company entities into synthetic conversation archives"
)]
pub struct Cli {
    #[arg(long, alias = "run_id", value_name = "ID", value_parser = parse_run_id)]
    pub run_id: String,
    #[arg(long, alias = "manifest_dir", value_name = "DIR")]
    pub manifest_dir: Option<PathBuf>,
    #[arg(long, alias = "synthetic_dir", value_name = "DIR")]
    pub synthetic_dir: Option<PathBuf>,
    #[arg(long, alias = "output_dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub mirror: Option<MirrorArg>,
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub output: OutputFormat,
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut EnrichConfig) {
        if let Some(dir) = &self.manifest_dir {
            config.manifest_dir = dir.to_string_lossy().to_string();
        }
        if let Some(dir) = &self.synthetic_dir {
            config.synthetic_dir = dir.to_string_lossy().to_string();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.to_string_lossy().to_string();
        }
        if let Some(mirror) = self.mirror {
            config.mirror = mirror.into();
        }
    }
}
