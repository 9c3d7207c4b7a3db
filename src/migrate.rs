use crate::depsfile::{self, Library, LocalCoordinate};
use crate::error::{DepsyncError, Result};
use crate::resolve::{ResolvedTarget, Resolver};
use jiff::Zoned;
use std::collections::HashSet;

/// Result of migrating one declaration file's local-path coordinates.
#[derive(Debug)]
pub struct MigrationOutcome {
    pub text: String,
    pub migrated: Vec<(Library, ResolvedTarget)>,
    pub skipped: Vec<(Library, DepsyncError)>,
    /// Original local coordinates, one per library, collected for the
    /// overlay file.
    pub originals: Vec<LocalCoordinate>,
}

impl MigrationOutcome {
    pub fn changed(&self) -> bool {
        !self.migrated.is_empty()
    }
}

/// Decide the remote form of a local library: internal libraries go
/// through the tag chain, everything else through the registry chain with
/// pre-releases excluded.
pub fn migration_target(resolver: &Resolver, library: &Library) -> Result<ResolvedTarget> {
    match resolver.require_internal(library) {
        Ok(()) => resolver.resolve_library_tag(library).map(ResolvedTarget::Git),
        Err(DepsyncError::NotGithubLib(_)) => resolver
            .resolve_registry_version(library, false)
            .map(ResolvedTarget::Registry),
        Err(e) => Err(e),
    }
}

/// Rewrite every local-path coordinate in `text` to the target produced by
/// `resolve`. Libraries that fail to resolve stay untouched and are
/// reported, never force-removed. A library declared locally more than
/// once is resolved once; the rewrite covers every occurrence.
pub fn migrate_text(
    text: &str,
    mut resolve: impl FnMut(&Library) -> Result<ResolvedTarget>,
) -> MigrationOutcome {
    let mut seen = HashSet::new();
    let originals: Vec<LocalCoordinate> = depsfile::find_local_coordinates(text)
        .into_iter()
        .filter(|local| seen.insert(local.library.clone()))
        .collect();
    let mut current = text.to_string();
    let mut migrated = Vec::new();
    let mut skipped = Vec::new();

    for local in &originals {
        match resolve(&local.library) {
            Ok(ResolvedTarget::Git(info)) => {
                current =
                    depsfile::replace_local_with_git(&current, &local.library, &info.tag, &info.sha);
                migrated.push((local.library.clone(), ResolvedTarget::Git(info)));
            }
            Ok(ResolvedTarget::Registry(version)) => {
                current =
                    depsfile::replace_local_with_registry(&current, &local.library, &version);
                migrated.push((local.library.clone(), ResolvedTarget::Registry(version)));
            }
            Err(e) => skipped.push((local.library.clone(), e)),
        }
    }

    MigrationOutcome {
        text: current,
        migrated,
        skipped,
        originals,
    }
}

/// Render the overlay declaration collecting the original local paths, for
/// developers who still want machine-local overrides. Generated output;
/// the core never parses it back.
pub fn render_overlay(locals: &[LocalCoordinate]) -> String {
    let date = Zoned::now().strftime("%Y-%m-%d").to_string();
    let mut out = String::new();
    out.push_str(&format!(";; Generated by depsync on {}.\n", date));
    out.push_str(";; Merge into :override-deps to keep machine-local checkouts.\n");
    out.push_str("{:override-deps\n {");

    for (idx, local) in locals.iter().enumerate() {
        if idx > 0 {
            out.push_str("\n  ");
        }
        out.push_str(&format!("{} {{:path \"{}\"}}", local.library, local.path));
    }

    out.push_str("}}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{TagInfo, TagSource};

    const SAMPLE: &str = r#"{:deps
 {acme/foo {:path "../foo"}
  metosin/reitit {:path "../reitit"}
  acme/broken {:path "../broken"}}}
"#;

    fn git_target(tag: &str, sha: &str) -> ResolvedTarget {
        ResolvedTarget::Git(TagInfo {
            tag: tag.to_string(),
            sha: sha.to_string(),
            short_sha: sha.get(..7).map(str::to_string),
            source: TagSource::Remote,
        })
    }

    #[test]
    fn migrates_internal_and_external_libraries() {
        let outcome = migrate_text(SAMPLE, |library| {
            if library.artifact == "foo" {
                Ok(git_target("v1.0.0", "abc1234567890abcdef"))
            } else if library.artifact == "reitit" {
                Ok(ResolvedTarget::Registry("0.7.2".to_string()))
            } else {
                Err(DepsyncError::NotFound(library.to_string()))
            }
        });

        assert_eq!(outcome.migrated.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.originals.len(), 3);

        let locals = depsfile::find_local_coordinates(&outcome.text);
        assert_eq!(locals.len(), 1);
        assert_eq!(locals[0].library, Library::new("acme", "broken"));

        let git = depsfile::find_git_coordinates(&outcome.text);
        assert_eq!(git.len(), 1);
        assert_eq!(git[0].tag, "v1.0.0");
        assert_eq!(git[0].sha, "abc1234567890abcdef");

        let registry = depsfile::find_registry_coordinates(&outcome.text);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry[0].version, "0.7.2");
    }

    #[test]
    fn duplicate_local_declarations_migrate_once() {
        let text = r#"{:deps {acme/foo {:path "../foo"}}
 :aliases {:dev {:extra-deps {acme/foo {:path "../foo"}}}}}"#;

        let outcome =
            migrate_text(text, |_| Ok(git_target("v1.0.0", "abc1234567890abcdef")));

        assert_eq!(outcome.migrated.len(), 1);
        assert_eq!(outcome.originals.len(), 1);
        assert!(depsfile::find_local_coordinates(&outcome.text).is_empty());
        assert_eq!(depsfile::find_git_coordinates(&outcome.text).len(), 2);
    }

    #[test]
    fn failed_resolutions_leave_the_text_untouched() {
        let outcome = migrate_text(SAMPLE, |library| {
            Err(DepsyncError::NotFound(library.to_string()))
        });
        assert_eq!(outcome.text, SAMPLE);
        assert!(!outcome.changed());
        assert_eq!(outcome.skipped.len(), 3);
    }

    #[test]
    fn overlay_collects_the_original_paths() {
        let locals = depsfile::find_local_coordinates(SAMPLE);
        let overlay = render_overlay(&locals);

        assert!(overlay.starts_with(";; Generated by depsync on "));
        assert!(overlay.contains(r#"acme/foo {:path "../foo"}"#));
        assert!(overlay.contains(r#"metosin/reitit {:path "../reitit"}"#));
        assert!(overlay.contains(":override-deps"));

        // The overlay is itself well-formed enough for the finders.
        let parsed = depsfile::find_local_coordinates(&overlay);
        assert_eq!(parsed.len(), 3);
    }
}
