use crate::depsfile::{self, Library};
use crate::resolve::{ResolvedTarget, TagInfo};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Longest sha still treated as a short form when picking a replacement.
const SHORT_SHA_MAX: usize = 12;

/// One declaration file, already slurped. The diff engine never touches
/// the filesystem itself.
#[derive(Debug, Clone)]
pub struct DeclarationFile {
    pub path: PathBuf,
    pub project: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateChange {
    Git {
        old_tag: String,
        old_sha: String,
        new_tag: String,
        new_sha: String,
    },
    Registry {
        old_version: String,
        new_version: String,
    },
}

/// One attributable change: enough context to report it and, separately,
/// to apply it.
#[derive(Debug, Clone)]
pub struct ChangeEntry {
    pub file: PathBuf,
    pub project: String,
    pub library: Library,
    pub change: CoordinateChange,
}

/// Prefix equality over the shared length, so a short sha matches the full
/// sha it abbreviates. Symmetric, and reflexive for non-empty shas.
pub fn sha_matches(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.starts_with(b) || b.starts_with(a))
}

/// Keep each file's sha-length convention: a short old sha gets the
/// resolved short sha (full as fallback), a full old sha gets the full one.
pub fn pick_sha(old_sha: &str, info: &TagInfo) -> String {
    if old_sha.len() <= SHORT_SHA_MAX {
        info.short_sha.clone().unwrap_or_else(|| info.sha.clone())
    } else {
        info.sha.clone()
    }
}

/// Compare every coordinate occurrence against its resolved target and
/// collect the minimal change set, deduplicated by (file, library). Pure
/// over already-slurped text and already-resolved targets.
pub fn compute_changes(
    files: &[DeclarationFile],
    targets: &HashMap<Library, ResolvedTarget>,
) -> Vec<ChangeEntry> {
    let mut changes = Vec::new();
    let mut seen: HashSet<(PathBuf, Library)> = HashSet::new();

    for file in files {
        for coordinate in depsfile::find_git_coordinates(&file.text) {
            let Some(ResolvedTarget::Git(info)) = targets.get(&coordinate.library) else {
                continue;
            };

            if coordinate.tag == info.tag && sha_matches(&coordinate.sha, &info.sha) {
                continue;
            }

            if !seen.insert((file.path.clone(), coordinate.library.clone())) {
                continue;
            }

            let new_sha = pick_sha(&coordinate.sha, info);
            changes.push(ChangeEntry {
                file: file.path.clone(),
                project: file.project.clone(),
                library: coordinate.library,
                change: CoordinateChange::Git {
                    old_tag: coordinate.tag,
                    old_sha: coordinate.sha,
                    new_tag: info.tag.clone(),
                    new_sha,
                },
            });
        }

        for coordinate in depsfile::find_registry_coordinates(&file.text) {
            let Some(ResolvedTarget::Registry(version)) = targets.get(&coordinate.library) else {
                continue;
            };

            if coordinate.version == *version {
                continue;
            }

            if !seen.insert((file.path.clone(), coordinate.library.clone())) {
                continue;
            }

            changes.push(ChangeEntry {
                file: file.path.clone(),
                project: file.project.clone(),
                library: coordinate.library,
                change: CoordinateChange::Registry {
                    old_version: coordinate.version,
                    new_version: version.clone(),
                },
            });
        }
    }

    changes
}

/// Apply one change to the file text it belongs to. Callers fold a file's
/// changes through this and write the final text once.
pub fn apply_to_text(text: &str, entry: &ChangeEntry) -> String {
    match &entry.change {
        CoordinateChange::Git {
            new_tag, new_sha, ..
        } => depsfile::update_git_coordinate(text, &entry.library, new_tag, new_sha),
        CoordinateChange::Registry { new_version, .. } => {
            depsfile::update_registry_coordinate(text, &entry.library, new_version)
        }
    }
}
