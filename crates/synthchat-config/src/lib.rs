use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorPolicy {
    #[default]
    Sparse,
    Full,
}

impl MirrorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sparse => "sparse",
            Self::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnrichConfig {
    #[serde(default = "default_manifest_dir")]
    pub manifest_dir: String,
    #[serde(default = "default_synthetic_dir")]
    pub synthetic_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub mirror: MirrorPolicy,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub enrich: EnrichConfig,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            manifest_dir: default_manifest_dir(),
            synthetic_dir: default_synthetic_dir(),
            output_dir: default_output_dir(),
            mirror: MirrorPolicy::Sparse,
        }
    }
}

impl EnrichConfig {
    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.manifest_dir)
    }

    pub fn synthetic_path(&self) -> PathBuf {
        PathBuf::from(&self.synthetic_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

fn default_manifest_dir() -> String {
    "conversation_scripts".to_string()
}

fn default_synthetic_dir() -> String {
    "synthetic_data".to_string()
}

fn default_output_dir() -> String {
    "processed_synthetic_data".to_string()
}

pub fn expand_path(path: &str) -> String {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{}", home.to_string_lossy(), stripped);
        }
    }
    path.to_string()
}

fn home_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".synthchat")
            .join("config.toml")
    })
}

fn repo_default_config_path() -> PathBuf {
    PathBuf::from("config/synthchat.toml")
}

// Explicit and env paths are returned even when missing so the load reports them.
fn resolve_config_path_with_overrides(
    raw_path: Option<PathBuf>,
    env_keys: &[&str],
    home_path: Option<PathBuf>,
    repo_default: PathBuf,
) -> Option<PathBuf> {
    if let Some(path) = raw_path {
        return Some(path);
    }

    for key in env_keys {
        if let Ok(value) = std::env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
    }

    if let Some(path) = home_path {
        if path.exists() {
            return Some(path);
        }
    }

    if repo_default.exists() {
        return Some(repo_default);
    }

    None
}

pub fn resolve_config_path(raw_path: Option<PathBuf>) -> Option<PathBuf> {
    resolve_config_path_with_overrides(
        raw_path,
        &["SYNTHCHAT_CONFIG"],
        home_config_path(),
        repo_default_config_path(),
    )
}

fn normalize_config(mut cfg: AppConfig) -> AppConfig {
    cfg.enrich.manifest_dir = expand_path(&cfg.enrich.manifest_dir);
    cfg.enrich.synthetic_dir = expand_path(&cfg.enrich.synthetic_dir);
    cfg.enrich.output_dir = expand_path(&cfg.enrich.output_dir);
    cfg
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content).context("failed to parse TOML config")?;
    Ok(normalize_config(cfg))
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read config {}", path.as_ref().display()))?;
    parse_config(&content)
}

pub fn load_config_or_default(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(AppConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_temp_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("synthchat.toml");
        std::fs::write(&path, contents).expect("write temp config");
        path
    }

    #[test]
    fn resolve_order_prefers_cli_then_env_then_home_then_repo() {
        let raw = Some(PathBuf::from("/tmp/cli.toml"));
        let chosen = resolve_config_path_with_overrides(
            raw,
            &["SYNTHCHAT_CONFIG"],
            Some(PathBuf::from("/tmp/home.toml")),
            PathBuf::from("/tmp/repo.toml"),
        );
        assert_eq!(chosen, Some(PathBuf::from("/tmp/cli.toml")));
    }

    #[test]
    fn resolve_order_prefers_env_over_home_and_repo() {
        let env_key = "SYNTHCHAT_CONFIG_TEST_KEY";
        std::env::set_var(env_key, "/tmp/from-env.toml");

        let chosen = resolve_config_path_with_overrides(
            None,
            &[env_key],
            Some(PathBuf::from("/tmp/from-home.toml")),
            PathBuf::from("/tmp/from-repo.toml"),
        );

        std::env::remove_var(env_key);
        assert_eq!(chosen, Some(PathBuf::from("/tmp/from-env.toml")));
    }

    #[test]
    fn resolve_order_uses_repo_when_home_missing() {
        let dir = TempDir::new().expect("tempdir");
        let repo_default = write_temp_config(&dir, "");

        let chosen = resolve_config_path_with_overrides(
            None,
            &["SYNTHCHAT_CONFIG_TEST_DOES_NOT_EXIST"],
            Some(PathBuf::from("/tmp/definitely-missing-home.toml")),
            repo_default.clone(),
        );

        assert_eq!(chosen, Some(repo_default));
    }

    #[test]
    fn resolve_returns_none_when_nothing_exists() {
        let chosen = resolve_config_path_with_overrides(
            None,
            &["SYNTHCHAT_CONFIG_TEST_ALSO_MISSING"],
            Some(PathBuf::from("/tmp/definitely-missing-home.toml")),
            PathBuf::from("/tmp/definitely-missing-repo.toml"),
        );
        assert_eq!(chosen, None);
    }

    #[test]
    fn empty_config_yields_default_directories() {
        let cfg = parse_config("").expect("empty config parses");
        assert_eq!(cfg.enrich.manifest_dir, "conversation_scripts");
        assert_eq!(cfg.enrich.synthetic_dir, "synthetic_data");
        assert_eq!(cfg.enrich.output_dir, "processed_synthetic_data");
        assert_eq!(cfg.enrich.mirror, MirrorPolicy::Sparse);
    }

    #[test]
    fn load_config_reads_enrich_section() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_temp_config(
            &dir,
            r#"
[enrich]
manifest_dir = "logs/manifests"
output_dir = "out"
mirror = "full"
"#,
        );

        let cfg = load_config(&path).expect("config loads");
        assert_eq!(cfg.enrich.manifest_dir, "logs/manifests");
        assert_eq!(cfg.enrich.synthetic_dir, "synthetic_data");
        assert_eq!(cfg.enrich.output_dir, "out");
        assert_eq!(cfg.enrich.mirror, MirrorPolicy::Full);
    }

    #[test]
    fn home_prefix_is_expanded() {
        let Some(home) = std::env::var_os("HOME") else {
            return;
        };
        let cfg = parse_config("[enrich]\noutput_dir = \"~/processed\"\n").expect("parse");
        assert_eq!(
            cfg.enrich.output_dir,
            format!("{}/processed", home.to_string_lossy())
        );
    }

    #[test]
    fn load_config_errors_when_path_missing() {
        let path = std::env::temp_dir().join("synthchat-missing-config-does-not-exist.toml");
        let err = load_config(&path).expect_err("missing config path should fail");
        assert!(
            err.to_string().contains("failed to read config"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn load_config_or_default_without_path_uses_defaults() {
        let cfg = load_config_or_default(None).expect("defaults");
        assert_eq!(cfg.enrich.mirror, MirrorPolicy::Sparse);
    }

    #[test]
    fn unknown_top_level_section_is_rejected() {
        let err = parse_config("[enrich]\n\n[unexpected]\nenabled = true\n")
            .expect_err("unknown top-level section should fail");
        assert!(
            format!("{err:#}").contains("unknown field `unexpected`"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn unknown_mirror_policy_is_rejected() {
        let err = parse_config("[enrich]\nmirror = \"partial\"\n")
            .expect_err("unknown mirror policy should fail");
        assert!(
            format!("{err:#}").contains("unknown variant `partial`"),
            "unexpected error: {err:#}"
        );
    }
}
