use crate::config::Config;
use crate::depsfile::{self, Library};
use crate::diff::{self, ChangeEntry, CoordinateChange, DeclarationFile};
use crate::error::{DepsyncError, Result};
use crate::git;
use crate::interaction::ChangeSelector;
use crate::migrate;
use crate::resolve::{ResolutionReport, ResolvedTarget, Resolver};
use crate::scanner::WorkspaceScanner;
use colored::Colorize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const OVERLAY_FILE: &str = "local-overrides.edn";

/// Check for available coordinate updates without touching any file.
pub fn execute_check<P: AsRef<Path>>(workspace: P, allow_pre_release: bool) -> Result<()> {
    let workspace = workspace.as_ref();
    println!(
        "{}",
        "Checking workspace dependency coordinates...".cyan().bold()
    );

    let (config, files) = load_workspace(workspace)?;
    let resolver = Resolver::new(&config)?;

    println!("\n{}", "2. Resolving latest versions...".yellow());
    let report = resolve_for_files(&resolver, &files, allow_pre_release, false);
    print_resolution_summary(&report);

    println!("\n{}", "3. Computing change set...".yellow());
    let changes = diff::compute_changes(&files, &report.targets);

    if changes.is_empty() {
        println!("\n{}", "All coordinates are up to date!".green().bold());
    } else {
        print_changes(&changes);
        println!("\n{}", "To apply these changes, run:".dimmed());
        println!("  {}", "depsync update".cyan());
    }

    Ok(())
}

/// Resolve, select, and apply coordinate updates in place.
pub fn execute_update<P: AsRef<Path>>(
    workspace: P,
    interactive: bool,
    allow_pre_release: bool,
    no_git: bool,
) -> Result<()> {
    let workspace = workspace.as_ref();
    println!("{}", "Starting coordinate update...".cyan().bold());

    let (config, files) = load_workspace(workspace)?;

    if !no_git && workspace.join(".git").is_dir() {
        println!("\n{}", "2. Checking Git status...".yellow());
        if !git::is_working_directory_clean(workspace)? {
            println!(
                "{}",
                "Warning: working directory has uncommitted changes".red()
            );
            println!("Please commit or stash your changes before proceeding.");
            return Ok(());
        }
        println!("{}", "Working directory is clean".green());
    } else if no_git {
        println!("\n{}", "2. Skipping Git checks (--no-git)".yellow());
    } else {
        println!(
            "\n{}",
            "2. Git repository not detected, skipping Git checks".yellow()
        );
    }

    let resolver = Resolver::new(&config)?;
    let mut selector = ChangeSelector::new(interactive);

    println!("\n{}", "3. Resolving latest versions...".yellow());
    let report = resolve_for_files(&resolver, &files, allow_pre_release, selector.is_enabled());
    print_resolution_summary(&report);

    println!("\n{}", "4. Computing change set...".yellow());
    let changes = diff::compute_changes(&files, &report.targets);

    if changes.is_empty() {
        println!("\n{}", "All coordinates are up to date!".green().bold());
        return Ok(());
    }

    print_changes(&changes);

    let selected = match selector.select(changes) {
        Ok(selected) => selected,
        Err(DepsyncError::UserCancelled) => {
            println!("\n{}", "Update cancelled by user.".yellow());
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if selected.is_empty() {
        println!("\n{}", "No changes selected; nothing to apply.".yellow());
        return Ok(());
    }

    println!("\n{}", "5. Applying changes...".yellow());
    let (applied, write_failures) = apply_changes(&files, &selected);

    println!(
        "{}",
        format!("Applied {} change(s)", applied).green().bold()
    );
    for (path, error) in &write_failures {
        println!(
            "  {} {}: {}",
            "✗".red(),
            path.display().to_string().red(),
            error
        );
    }

    Ok(())
}

/// Rewrite local-path coordinates to resolved remote ones and emit the
/// overlay file with the original paths.
pub fn execute_migrate<P: AsRef<Path>>(workspace: P) -> Result<()> {
    let workspace = workspace.as_ref();
    println!(
        "{}",
        "Migrating local-path coordinates to remote...".cyan().bold()
    );

    let (config, files) = load_workspace(workspace)?;
    let resolver = Resolver::new(&config)?;

    println!("\n{}", "2. Resolving remote coordinates...".yellow());

    let mut all_originals = Vec::new();
    let mut migrated_total = 0;
    let mut skipped_total = 0;

    for file in &files {
        let outcome = migrate::migrate_text(&file.text, |library| {
            migrate::migration_target(&resolver, library)
        });

        for (library, target) in &outcome.migrated {
            let rendered = match target {
                ResolvedTarget::Git(info) => format!("{} ({})", info.tag, info.source),
                ResolvedTarget::Registry(version) => version.clone(),
            };
            println!(
                "  {} {} -> {}",
                "✓".green(),
                format!("[{}] {}", file.project, library).white().bold(),
                rendered.green()
            );
        }
        for (library, error) in &outcome.skipped {
            println!(
                "  {} {}: {}",
                "✗".yellow(),
                format!("[{}] {}", file.project, library).white(),
                error
            );
        }

        migrated_total += outcome.migrated.len();
        skipped_total += outcome.skipped.len();
        all_originals.extend(outcome.originals.clone());

        if outcome.changed() {
            if let Err(e) = fs::write(&file.path, &outcome.text) {
                println!(
                    "  {} {}: {}",
                    "✗".red(),
                    file.path.display().to_string().red(),
                    e
                );
            }
        }
    }

    if migrated_total == 0 && skipped_total == 0 {
        println!("{}", "No local-path coordinates found.".yellow());
        return Ok(());
    }

    if !all_originals.is_empty() {
        println!("\n{}", "3. Writing overlay file...".yellow());
        let overlay_path = workspace.join(OVERLAY_FILE);
        let overlay = migrate::render_overlay(&all_originals);
        fs::write(&overlay_path, overlay).map_err(|e| DepsyncError::FileWrite {
            path: overlay_path.clone(),
            source: e,
        })?;
        println!(
            "{}",
            format!("Wrote {}", overlay_path.display()).green()
        );
    }

    println!(
        "\n{}",
        format!(
            "Migration complete: {} migrated, {} left untouched",
            migrated_total, skipped_total
        )
        .green()
        .bold()
    );

    Ok(())
}

fn load_workspace(workspace: &Path) -> Result<(Config, Vec<DeclarationFile>)> {
    println!("\n{}", "1. Scanning workspace...".yellow());
    let config = Config::load(workspace)?;
    let scanner = WorkspaceScanner::new(workspace, &config);
    let discovered = scanner.discover()?;

    if discovered.is_empty() {
        return Err(DepsyncError::WorkspaceValidation(format!(
            "No deps.edn files found under '{}'",
            workspace.display()
        )));
    }

    let mut files = Vec::with_capacity(discovered.len());
    for entry in discovered {
        let text = fs::read_to_string(&entry.path)?;
        files.push(DeclarationFile {
            path: entry.path,
            project: entry.project,
            text,
        });
    }

    println!(
        "{}",
        format!("Found {} declaration file(s)", files.len()).green()
    );
    for file in &files {
        println!("   • {} ({})", file.project.bright_cyan(), file.path.display().to_string().dimmed());
    }

    Ok((config, files))
}

/// Collect the distinct libraries per coordinate kind and resolve them in
/// one batch. Local-path coordinates are not resolved here; only the
/// migrate workflow touches those.
fn resolve_for_files(
    resolver: &Resolver,
    files: &[DeclarationFile],
    allow_pre_release: bool,
    quiet: bool,
) -> ResolutionReport {
    let mut git_libraries: BTreeSet<Library> = BTreeSet::new();
    let mut registry_libraries: BTreeSet<Library> = BTreeSet::new();

    for file in files {
        for coordinate in depsfile::find_git_coordinates(&file.text) {
            git_libraries.insert(coordinate.library);
        }
        for coordinate in depsfile::find_registry_coordinates(&file.text) {
            registry_libraries.insert(coordinate.library);
        }
    }

    resolver.resolve_targets(&git_libraries, &registry_libraries, allow_pre_release, quiet)
}

fn print_resolution_summary(report: &ResolutionReport) {
    println!(
        "{}",
        format!(
            "Resolved {} librarie(s), {} failure(s)",
            report.resolved_count(),
            report.failure_count()
        )
        .green()
    );

    for (library, error) in &report.failures {
        println!(
            "  {} {}: {}",
            "✗".yellow(),
            library.to_string().white(),
            error
        );
    }
}

fn print_changes(changes: &[ChangeEntry]) {
    println!(
        "\n{}",
        format!("Found {} pending change(s):", changes.len())
            .cyan()
            .bold()
    );

    for entry in changes {
        match &entry.change {
            CoordinateChange::Git {
                old_tag, new_tag, ..
            } => {
                println!(
                    "  • {} {} {} → {}",
                    format!("[{}]", entry.project).cyan(),
                    entry.library.to_string().white().bold(),
                    old_tag.red(),
                    new_tag.green().bold()
                );
            }
            CoordinateChange::Registry {
                old_version,
                new_version,
            } => {
                println!(
                    "  • {} {} {} → {}",
                    format!("[{}]", entry.project).cyan(),
                    entry.library.to_string().white().bold(),
                    old_version.red(),
                    new_version.green().bold()
                );
            }
        }
    }
}

/// Fold each file's selected changes through the rewriter and write the
/// result back. A write failure kills that file's update only; the rest of
/// the batch proceeds.
fn apply_changes(
    files: &[DeclarationFile],
    selected: &[ChangeEntry],
) -> (usize, Vec<(std::path::PathBuf, std::io::Error)>) {
    let mut applied = 0;
    let mut write_failures = Vec::new();

    for file in files {
        let file_changes: Vec<&ChangeEntry> =
            selected.iter().filter(|c| c.file == file.path).collect();
        if file_changes.is_empty() {
            continue;
        }

        let mut text = file.text.clone();
        for change in &file_changes {
            text = diff::apply_to_text(&text, change);
        }

        if text == file.text {
            continue;
        }

        match fs::write(&file.path, &text) {
            Ok(()) => applied += file_changes.len(),
            Err(e) => write_failures.push((file.path.clone(), e)),
        }
    }

    (applied, write_failures)
}
