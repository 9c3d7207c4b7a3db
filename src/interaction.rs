use crate::diff::{ChangeEntry, CoordinateChange};
use crate::error::{DepsyncError, Result};
use colored::Colorize;
use std::io::{self, Write};

/// Interactive subset selection over a computed change set.
///
/// When no interactive surface is available the full list is returned
/// unmodified; presentation layers rely on this default-to-all fallback.
pub struct ChangeSelector {
    enabled: bool,
    apply_all: bool,
}

impl ChangeSelector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            apply_all: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Walk the change set and keep the entries the user accepts.
    pub fn select(&mut self, changes: Vec<ChangeEntry>) -> Result<Vec<ChangeEntry>> {
        if !self.enabled {
            return Ok(changes);
        }

        let mut selected = Vec::with_capacity(changes.len());
        for change in changes {
            if self.confirm(&change)? {
                selected.push(change);
            }
        }
        Ok(selected)
    }

    fn confirm(&mut self, entry: &ChangeEntry) -> Result<bool> {
        let (old, new) = match &entry.change {
            CoordinateChange::Git {
                old_tag, new_tag, ..
            } => (old_tag.as_str(), new_tag.as_str()),
            CoordinateChange::Registry {
                old_version,
                new_version,
            } => (old_version.as_str(), new_version.as_str()),
        };

        let project_label = format!("[{}]", entry.project);
        println!(
            "\n{} {} {} {} to {}",
            project_label.cyan().bold(),
            entry.library.to_string().white().bold(),
            "from".dimmed(),
            old.red(),
            new.green().bold()
        );

        if self.apply_all {
            println!("{}", "Auto-applying (previously selected 'all').".dimmed());
            return Ok(true);
        }

        loop {
            print!("{}", "Apply this change? [Y/n/a/q]: ".bold());
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let decision = input.trim().to_lowercase();

            match decision.as_str() {
                "" | "y" | "yes" => {
                    return Ok(true);
                }
                "n" | "no" => {
                    println!("{}", "Skipping this change.".dimmed());
                    return Ok(false);
                }
                "a" | "all" => {
                    println!(
                        "{}",
                        "Applying this and all remaining changes.".green().bold()
                    );
                    self.apply_all = true;
                    return Ok(true);
                }
                "q" | "quit" => {
                    println!("{}", "Stopping at user request.".yellow());
                    return Err(DepsyncError::UserCancelled);
                }
                _ => {
                    println!(
                        "{}",
                        "Please answer with y(es), n(o), a(ll), or q(quit).".red()
                    );
                }
            }
        }
    }
}
