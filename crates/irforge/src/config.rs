use std::path::Path;

use anyhow::{Context, Result};
use irforge_contracts::{
    IRFORGE_CHECK_CONFIG_SCHEMA_VERSION, IRFORGE_CHECK_CONFIG_SCHEMA_VERSIONS_SUPPORTED,
};
use serde::{Deserialize, Serialize};

pub mod limits {
    pub const MAX_SOURCE_BYTES: usize = 4 * 1024 * 1024;
    pub const MAX_DIAGNOSTICS: usize = 1_000;

    pub fn max_source_bytes() -> usize {
        match std::env::var("IRFORGE_MAX_SOURCE_BYTES") {
            Ok(v) => v
                .parse::<usize>()
                .ok()
                .filter(|v| *v > 0)
                .unwrap_or(MAX_SOURCE_BYTES),
            Err(_) => MAX_SOURCE_BYTES,
        }
    }
}

/// Which syntax tree the checker walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TreeMode {
    #[default]
    Materialized,
    Flyweight,
}

impl TreeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TreeMode::Materialized => "materialized",
            TreeMode::Flyweight => "flyweight",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub tree: TreeMode,
    /// Package names usable as qualifiers besides the file's own package.
    pub known_packages: Vec<String>,
    pub max_diagnostics: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            tree: TreeMode::default(),
            known_packages: Vec::new(),
            max_diagnostics: limits::MAX_DIAGNOSTICS,
        }
    }
}

/// On-disk form of [`CheckOptions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<TreeMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_packages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_diagnostics: Option<usize>,
}

impl CheckConfig {
    pub fn into_options(self) -> CheckOptions {
        let defaults = CheckOptions::default();
        CheckOptions {
            tree: self.tree.unwrap_or(defaults.tree),
            known_packages: self.known_packages,
            max_diagnostics: self.max_diagnostics.unwrap_or(defaults.max_diagnostics),
        }
    }
}

pub fn parse_check_config(bytes: &[u8]) -> Result<CheckConfig> {
    let mut config: CheckConfig =
        serde_json::from_slice(bytes).context("parse check config JSON")?;
    config.schema_version = config.schema_version.trim().to_string();
    if !IRFORGE_CHECK_CONFIG_SCHEMA_VERSIONS_SUPPORTED
        .iter()
        .any(|v| *v == config.schema_version)
    {
        anyhow::bail!(
            "check config schema_version mismatch: expected one of {:?} got {:?}",
            IRFORGE_CHECK_CONFIG_SCHEMA_VERSIONS_SUPPORTED,
            config.schema_version
        );
    }
    for package in &mut config.known_packages {
        *package = package.trim().to_string();
        if package.is_empty() || package.split('.').any(str::is_empty) {
            anyhow::bail!("known_packages entries must be dotted names, got {:?}", package);
        }
    }
    if config.max_diagnostics == Some(0) {
        anyhow::bail!("max_diagnostics must be positive");
    }
    Ok(config)
}

pub fn load_check_config(path: &Path) -> Result<CheckConfig> {
    let bytes = std::fs::read(path).with_context(|| format!("read: {}", path.display()))?;
    parse_check_config(&bytes).with_context(|| format!("load: {}", path.display()))
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            schema_version: IRFORGE_CHECK_CONFIG_SCHEMA_VERSION.to_string(),
            tree: None,
            known_packages: Vec::new(),
            max_diagnostics: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = parse_check_config(
            format!(
                r#"{{"schema_version":"{IRFORGE_CHECK_CONFIG_SCHEMA_VERSION}","tree":"flyweight","known_packages":[" kotlin.io "]}}"#
            )
            .as_bytes(),
        )
        .expect("parse config");
        let options = config.into_options();
        assert_eq!(options.tree, TreeMode::Flyweight);
        assert_eq!(options.known_packages, vec!["kotlin.io".to_string()]);
        assert_eq!(options.max_diagnostics, limits::MAX_DIAGNOSTICS);
    }

    #[test]
    fn rejects_wrong_schema_and_unknown_fields() {
        assert!(parse_check_config(br#"{"schema_version":"irforge.check-config@9.9.9"}"#).is_err());
        let unknown = format!(
            r#"{{"schema_version":"{IRFORGE_CHECK_CONFIG_SCHEMA_VERSION}","colour":"red"}}"#
        );
        assert!(parse_check_config(unknown.as_bytes()).is_err());
    }

    #[test]
    fn rejects_malformed_package_names() {
        let bad = format!(
            r#"{{"schema_version":"{IRFORGE_CHECK_CONFIG_SCHEMA_VERSION}","known_packages":["a..b"]}}"#
        );
        assert!(parse_check_config(bad.as_bytes()).is_err());
    }
}
