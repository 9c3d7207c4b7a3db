use crate::config::Config;
use crate::depsfile::Library;
use crate::error::{DepsyncError, Result};
use crate::git::{self, TagEntry};
use crate::registry::{ClojarsClient, MavenCentralClient, RegistryClient};
use crate::version::{SemVer, is_pre_release};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

/// Where a resolved tag came from, for provenance reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSource {
    Remote,
    Local,
}

impl fmt::Display for TagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TagSource::Remote => "remote",
            TagSource::Local => "local",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub tag: String,
    pub sha: String,
    pub short_sha: Option<String>,
    pub source: TagSource,
}

impl TagInfo {
    fn from_entry(entry: TagEntry, source: TagSource) -> Self {
        Self {
            tag: entry.tag,
            sha: entry.sha,
            short_sha: entry.short_sha,
            source,
        }
    }
}

/// The best-known coordinate for a library after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    Git(TagInfo),
    Registry(String),
}

/// Pick the highest semver tag from a listing. Tags that do not parse are
/// ignored; `None` when nothing parses at all.
pub fn latest_tag(entries: &[TagEntry]) -> Option<&TagEntry> {
    entries
        .iter()
        .filter_map(|entry| SemVer::parse(&entry.tag).map(|semver| (semver, entry)))
        .max_by_key(|(semver, _)| *semver)
        .map(|(_, entry)| entry)
}

type TagFetch<'a> = Box<dyn FnOnce() -> Result<Vec<TagEntry>> + 'a>;

/// Evaluate tag sources in order until one yields tags. A failing or empty
/// source falls through to the next; a source that yields tags decides the
/// outcome, so unparseable tags fail right there instead of falling back.
fn run_tag_chain(library: &Library, attempts: Vec<(TagSource, TagFetch)>) -> Result<TagInfo> {
    for (source, fetch) in attempts {
        let entries = match fetch() {
            Ok(entries) => entries,
            Err(e) => {
                if std::env::var("DEPSYNC_VERBOSE").is_ok() {
                    eprintln!("[VERBOSE] {} tag source failed for {}: {}", source, library, e);
                }
                continue;
            }
        };

        if entries.is_empty() {
            continue;
        }

        return match latest_tag(&entries) {
            Some(best) => Ok(TagInfo::from_entry(best.clone(), source)),
            None => Err(DepsyncError::NoSemverTags(library.to_string())),
        };
    }

    Err(DepsyncError::NotFound(library.to_string()))
}

/// Resolves libraries to their best-known target coordinate: remote tags
/// with a local-clone fallback for internal libraries, and an ordered
/// registry chain for everything else.
pub struct Resolver {
    github_org: String,
    clone_root: Option<PathBuf>,
    registries: Vec<Box<dyn RegistryClient>>,
}

impl Resolver {
    pub fn new(config: &Config) -> Result<Self> {
        let registries: Vec<Box<dyn RegistryClient>> = vec![
            Box::new(ClojarsClient::with_base_url(config.primary_registry.clone())?),
            Box::new(MavenCentralClient::with_base_url(
                config.secondary_registry.clone(),
            )?),
        ];

        Ok(Self::with_clients(
            config.github_org.clone(),
            config.clone_root.clone(),
            registries,
        ))
    }

    pub fn with_clients(
        github_org: String,
        clone_root: Option<PathBuf>,
        registries: Vec<Box<dyn RegistryClient>>,
    ) -> Self {
        Self {
            github_org,
            clone_root,
            registries,
        }
    }

    /// Check a library against the internal naming convention: the group
    /// must equal the configured GitHub organization. Migration uses this
    /// to decide between the tag chain and the registry chain.
    pub fn require_internal(&self, library: &Library) -> Result<()> {
        if self.is_internal(library) {
            Ok(())
        } else {
            Err(DepsyncError::NotGithubLib(library.to_string()))
        }
    }

    pub fn is_internal(&self, library: &Library) -> bool {
        library.group == self.github_org
    }

    /// Resolve the newest tag of a git-hosted library: remote listing
    /// first, then a local clone when the remote is unreachable or empty.
    /// The library's group names the GitHub org, the artifact the repo.
    pub fn resolve_library_tag(&self, library: &Library) -> Result<TagInfo> {
        let org = library.group.clone();
        let repo = library.artifact.clone();

        let remote_repo = repo.clone();
        let mut attempts: Vec<(TagSource, TagFetch)> = vec![(
            TagSource::Remote,
            Box::new(move || git::list_remote_tags(&org, &remote_repo)),
        )];

        if let Some(clone_dir) = self
            .clone_root
            .as_ref()
            .map(|root| root.join(&repo))
            .filter(|dir| dir.is_dir())
        {
            attempts.push((
                TagSource::Local,
                Box::new(move || git::list_local_tags(&clone_dir)),
            ));
        }

        run_tag_chain(library, attempts)
    }

    /// Resolve the newest registry version: primary first, then secondary,
    /// each queried at most once. The pre-release policy applies to the
    /// selected version and never falls through to the next registry.
    pub fn resolve_registry_version(
        &self,
        library: &Library,
        allow_pre_release: bool,
    ) -> Result<String> {
        let mut selected = None;

        for registry in &self.registries {
            match registry.latest_version(library) {
                Ok(Some(version)) => {
                    selected = Some(version);
                    break;
                }
                Ok(None) => continue,
                Err(e) => {
                    if std::env::var("DEPSYNC_VERBOSE").is_ok() {
                        eprintln!(
                            "[VERBOSE] {} query failed for {}: {}",
                            registry.name(),
                            library,
                            e
                        );
                    }
                    continue;
                }
            }
        }

        let version = selected.ok_or_else(|| DepsyncError::NotFound(library.to_string()))?;

        if !allow_pre_release && is_pre_release(&version) {
            return Err(DepsyncError::PreRelease {
                library: library.to_string(),
                version,
            });
        }

        Ok(version)
    }

    /// Resolve a batch of libraries. Per-library failures never abort the
    /// batch; they are collected alongside the successes.
    pub fn resolve_targets(
        &self,
        git_libraries: &BTreeSet<Library>,
        registry_libraries: &BTreeSet<Library>,
        allow_pre_release: bool,
        quiet: bool,
    ) -> ResolutionReport {
        let total = git_libraries.len() + registry_libraries.len();
        let pb = ProgressBar::new(total as u64);
        if quiet {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:40}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        let mut report = ResolutionReport::default();

        for library in git_libraries {
            pb.set_message(format!("Resolving {}", library));
            match self.resolve_library_tag(library) {
                Ok(info) => {
                    report
                        .targets
                        .insert(library.clone(), ResolvedTarget::Git(info));
                }
                Err(e) => report.failures.push((library.clone(), e)),
            }
            pb.inc(1);
        }

        for library in registry_libraries {
            pb.set_message(format!("Resolving {}", library));
            match self.resolve_registry_version(library, allow_pre_release) {
                Ok(version) => {
                    report
                        .targets
                        .insert(library.clone(), ResolvedTarget::Registry(version));
                }
                Err(e) => report.failures.push((library.clone(), e)),
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        report
    }
}

#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub targets: HashMap<Library, ResolvedTarget>,
    pub failures: Vec<(Library, DepsyncError)>,
}

impl ResolutionReport {
    pub fn resolved_count(&self) -> usize {
        self.targets.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: &str, sha: &str) -> TagEntry {
        TagEntry {
            tag: tag.to_string(),
            sha: sha.to_string(),
            short_sha: sha.get(..7).map(str::to_string),
        }
    }

    fn library() -> Library {
        Library::new("acme", "foo")
    }

    #[test]
    fn latest_tag_picks_the_highest_semver() {
        let entries = vec![
            entry("v0.1.0", "aaa"),
            entry("v0.3.0", "ccc"),
            entry("v0.2.0", "bbb"),
        ];
        let best = latest_tag(&entries).unwrap();
        assert_eq!(best.tag, "v0.3.0");
        assert_eq!(best.sha, "ccc");
    }

    #[test]
    fn latest_tag_ignores_unparseable_tags() {
        let entries = vec![entry("nightly", "aaa"), entry("v1.0.0", "bbb")];
        assert_eq!(latest_tag(&entries).unwrap().tag, "v1.0.0");

        let junk = vec![entry("nightly", "aaa"), entry("latest", "bbb")];
        assert!(latest_tag(&junk).is_none());
    }

    #[test]
    fn chain_falls_back_to_the_local_source() {
        let attempts: Vec<(TagSource, TagFetch)> = vec![
            (
                TagSource::Remote,
                Box::new(|| {
                    Err(DepsyncError::Subprocess {
                        command: "git ls-remote".to_string(),
                        status: "exit status: 128".to_string(),
                        stderr: "network down".to_string(),
                    })
                }),
            ),
            (
                TagSource::Local,
                Box::new(|| Ok(vec![entry("v1.2.0", "ddd1111")])),
            ),
        ];

        let info = run_tag_chain(&library(), attempts).unwrap();
        assert_eq!(info.tag, "v1.2.0");
        assert_eq!(info.source, TagSource::Local);
    }

    #[test]
    fn chain_skips_empty_sources() {
        let attempts: Vec<(TagSource, TagFetch)> = vec![
            (TagSource::Remote, Box::new(|| Ok(vec![]))),
            (
                TagSource::Local,
                Box::new(|| Ok(vec![entry("v0.1.0", "aaa1111")])),
            ),
        ];

        let info = run_tag_chain(&library(), attempts).unwrap();
        assert_eq!(info.source, TagSource::Local);
    }

    #[test]
    fn unparseable_tags_fail_without_falling_back() {
        let attempts: Vec<(TagSource, TagFetch)> = vec![
            (
                TagSource::Remote,
                Box::new(|| Ok(vec![entry("nightly", "aaa")])),
            ),
            (
                TagSource::Local,
                Box::new(|| Ok(vec![entry("v1.0.0", "bbb")])),
            ),
        ];

        let err = run_tag_chain(&library(), attempts).unwrap_err();
        assert!(matches!(err, DepsyncError::NoSemverTags(_)));
    }

    #[test]
    fn exhausted_chain_reports_not_found() {
        let err = run_tag_chain(&library(), Vec::new()).unwrap_err();
        assert!(matches!(err, DepsyncError::NotFound(_)));
    }

    struct FakeRegistry {
        name: &'static str,
        version: Option<&'static str>,
    }

    impl RegistryClient for FakeRegistry {
        fn name(&self) -> &str {
            self.name
        }

        fn latest_version(&self, _library: &Library) -> Result<Option<String>> {
            Ok(self.version.map(str::to_string))
        }
    }

    fn resolver(registries: Vec<Box<dyn RegistryClient>>) -> Resolver {
        Resolver::with_clients("acme".to_string(), None, registries)
    }

    #[test]
    fn primary_registry_wins_when_it_answers() {
        let resolver = resolver(vec![
            Box::new(FakeRegistry {
                name: "primary",
                version: Some("1.2.3"),
            }),
            Box::new(FakeRegistry {
                name: "secondary",
                version: Some("9.9.9"),
            }),
        ]);

        let version = resolver
            .resolve_registry_version(&Library::new("other", "lib"), false)
            .unwrap();
        assert_eq!(version, "1.2.3");
    }

    #[test]
    fn secondary_registry_covers_primary_misses() {
        let resolver = resolver(vec![
            Box::new(FakeRegistry {
                name: "primary",
                version: None,
            }),
            Box::new(FakeRegistry {
                name: "secondary",
                version: Some("5.13.0"),
            }),
        ]);

        let version = resolver
            .resolve_registry_version(&Library::new("other", "lib"), false)
            .unwrap();
        assert_eq!(version, "5.13.0");
    }

    #[test]
    fn pre_release_policy_fails_instead_of_falling_through() {
        let resolver = resolver(vec![
            Box::new(FakeRegistry {
                name: "primary",
                version: Some("2.0.0-beta1"),
            }),
            Box::new(FakeRegistry {
                name: "secondary",
                version: Some("1.9.0"),
            }),
        ]);

        let library = Library::new("other", "lib");
        let err = resolver
            .resolve_registry_version(&library, false)
            .unwrap_err();
        assert!(matches!(err, DepsyncError::PreRelease { .. }));

        let allowed = resolver.resolve_registry_version(&library, true).unwrap();
        assert_eq!(allowed, "2.0.0-beta1");
    }

    #[test]
    fn empty_chain_is_not_found() {
        let resolver = resolver(vec![
            Box::new(FakeRegistry {
                name: "primary",
                version: None,
            }),
            Box::new(FakeRegistry {
                name: "secondary",
                version: None,
            }),
        ]);

        let err = resolver
            .resolve_registry_version(&Library::new("other", "lib"), false)
            .unwrap_err();
        assert!(matches!(err, DepsyncError::NotFound(_)));
    }

    #[test]
    fn internal_convention_requires_the_configured_org() {
        let resolver = resolver(Vec::new());
        assert!(resolver.require_internal(&Library::new("acme", "foo")).is_ok());
        assert!(matches!(
            resolver.require_internal(&Library::new("other", "foo")),
            Err(DepsyncError::NotGithubLib(_))
        ));
    }
}
