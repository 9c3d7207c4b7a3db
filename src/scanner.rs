use crate::config::Config;
use crate::error::{DepsyncError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const DEPS_FILE: &str = "deps.edn";

/// One discovered declaration file with its human-readable project label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub project: String,
}

/// Walks the workspace for `deps.edn` files, honoring the configured skip
/// list and depth limit. Discovery order is deterministic (sorted by path).
pub struct WorkspaceScanner {
    root: PathBuf,
    skip_dirs: Vec<String>,
    max_depth: usize,
}

impl WorkspaceScanner {
    pub fn new<P: AsRef<Path>>(root: P, config: &Config) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            skip_dirs: config.skip_dirs.clone(),
            max_depth: config.max_depth,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(DepsyncError::WorkspaceValidation(format!(
                "'{}' is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    pub fn discover(&self) -> Result<Vec<DiscoveredFile>> {
        self.validate()?;

        let mut found = Vec::new();
        self.walk(&self.root, 0, &mut found);
        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }

    fn walk(&self, dir: &Path, depth: usize, found: &mut Vec<DiscoveredFile>) {
        let candidate = dir.join(DEPS_FILE);
        if candidate.is_file() {
            found.push(DiscoveredFile {
                path: candidate,
                project: self.project_label(dir),
            });
        }

        if depth >= self.max_depth {
            return;
        }

        // An unreadable subdirectory degrades discovery, never aborts it.
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if std::env::var("DEPSYNC_VERBOSE").is_ok() {
                    eprintln!(
                        "[VERBOSE] Skipping unreadable directory {}: {}",
                        dir.display(),
                        e
                    );
                }
                return;
            }
        };

        for entry in entries {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if self.skip_dirs.iter().any(|skip| *skip == name) {
                continue;
            }

            self.walk(&path, depth + 1, found);
        }
    }

    fn project_label(&self, dir: &Path) -> String {
        match dir.strip_prefix(&self.root) {
            Ok(relative) if relative.as_os_str().is_empty() => "root".to_string(),
            Ok(relative) => relative.to_string_lossy().into_owned(),
            Err(_) => dir.to_string_lossy().into_owned(),
        }
    }
}
