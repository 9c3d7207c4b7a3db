use crate::error::{DepsyncError, Result};
use std::path::Path;
use std::process::{Command, Output};

const SHORT_SHA_LEN: usize = 7;

/// One tag as listed by the VCS, before the resolution chain stamps it
/// with a provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub tag: String,
    pub sha: String,
    pub short_sha: Option<String>,
}

/// List the tags of `org/repo` on GitHub via `git ls-remote`.
pub fn list_remote_tags(org: &str, repo: &str) -> Result<Vec<TagEntry>> {
    validate_ref_component(org)?;
    validate_ref_component(repo)?;

    let url = format!("https://github.com/{}/{}.git", org, repo);
    if std::env::var("DEPSYNC_VERBOSE").is_ok() {
        eprintln!("[VERBOSE] Listing remote tags: {}", url);
    }

    let output = run_git(None, &["ls-remote", "--tags", "--refs", &url])?;
    ensure_success(&output, "git ls-remote")?;

    Ok(parse_ls_remote(&String::from_utf8_lossy(&output.stdout)))
}

/// List the tags of a local clone, newest version first when git supports
/// version sort. The resolution chain re-sorts regardless.
pub fn list_local_tags(repo_path: &Path) -> Result<Vec<TagEntry>> {
    validate_repo_path(repo_path)?;

    let output = run_git(
        Some(repo_path),
        &[
            "for-each-ref",
            "refs/tags",
            "--sort=-v:refname",
            "--format=%(objectname) %(refname:short)",
        ],
    )?;
    ensure_success(&output, "git for-each-ref")?;

    Ok(parse_for_each_ref(&String::from_utf8_lossy(&output.stdout)))
}

/// True when `git status --porcelain` reports nothing to commit.
pub fn is_working_directory_clean(repo_path: &Path) -> Result<bool> {
    validate_repo_path(repo_path)?;
    let output = run_git(Some(repo_path), &["status", "--porcelain"])?;
    ensure_success(&output, "git status")?;
    Ok(output.stdout.is_empty())
}

fn parse_ls_remote(stdout: &str) -> Vec<TagEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let (sha, refname) = line.split_once('\t')?;
            let tag = refname.strip_prefix("refs/tags/")?;
            if sha.is_empty() || tag.is_empty() {
                return None;
            }
            Some(TagEntry {
                tag: tag.to_string(),
                sha: sha.to_string(),
                short_sha: sha.get(..SHORT_SHA_LEN).map(str::to_string),
            })
        })
        .collect()
}

fn parse_for_each_ref(stdout: &str) -> Vec<TagEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let (sha, tag) = line.split_once(' ')?;
            if sha.is_empty() || tag.is_empty() {
                return None;
            }
            Some(TagEntry {
                tag: tag.to_string(),
                sha: sha.to_string(),
                short_sha: sha.get(..SHORT_SHA_LEN).map(str::to_string),
            })
        })
        .collect()
}

fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<Output> {
    let mut command = Command::new("git");
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.args(args).output().map_err(|e| {
        DepsyncError::Subprocess {
            command: format!("git {}", args.join(" ")),
            status: "spawn failed".to_string(),
            stderr: e.to_string(),
        }
    })
}

fn ensure_success(output: &Output, command: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    Err(DepsyncError::Subprocess {
        command: command.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

fn validate_ref_component(value: &str) -> Result<()> {
    if value.is_empty()
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(DepsyncError::Parse(value.to_string()));
    }
    Ok(())
}

fn validate_repo_path(path: &Path) -> Result<()> {
    let dangerous = [';', '|', '&', '$', '`', '\n', '\r'];
    let path_str = path.to_string_lossy();
    if let Some(ch) = dangerous.iter().find(|c| path_str.contains(**c)) {
        return Err(DepsyncError::WorkspaceValidation(format!(
            "Path contains dangerous character: '{}'",
            ch
        )));
    }
    Ok(())
}
