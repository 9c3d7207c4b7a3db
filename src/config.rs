use crate::error::Result;
use crate::registry::validate_registry_url;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "depsync.toml";

pub const DEFAULT_PRIMARY_REGISTRY: &str = "https://clojars.org";
pub const DEFAULT_SECONDARY_REGISTRY: &str = "https://repo1.maven.org/maven2";

/// Workspace configuration, read from an optional `depsync.toml` at the
/// workspace root. Every field has a default so the file can be absent or
/// partial.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// GitHub organization whose libraries count as internal.
    pub github_org: String,
    /// Directory holding local clones used as the tag fallback source.
    pub clone_root: Option<PathBuf>,
    pub primary_registry: String,
    pub secondary_registry: String,
    /// Directory names skipped during declaration-file discovery.
    pub skip_dirs: Vec<String>,
    /// Maximum directory depth for discovery.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_org: String::new(),
            clone_root: None,
            primary_registry: DEFAULT_PRIMARY_REGISTRY.to_string(),
            secondary_registry: DEFAULT_SECONDARY_REGISTRY.to_string(),
            skip_dirs: default_skip_dirs(),
            max_depth: 3,
        }
    }
}

fn default_skip_dirs() -> Vec<String> {
    [".git", "target", "node_modules", ".cpcache"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = workspace.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        validate_registry_url(&config.primary_registry)?;
        validate_registry_url(&config.secondary_registry)?;
        Ok(config)
    }
}
