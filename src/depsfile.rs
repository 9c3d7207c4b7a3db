use crate::error::{DepsyncError, Result};
use regex::{Captures, Regex};
use std::fmt;
use std::ops::Range;

/// A qualified library name: two non-empty `group/artifact` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Library {
    pub group: String,
    pub artifact: String,
}

impl Library {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    pub fn parse(qualified: &str) -> Result<Self> {
        match qualified.split_once('/') {
            Some((group, artifact)) if !group.is_empty() && !artifact.is_empty() => {
                Ok(Self::new(group, artifact))
            }
            _ => Err(DepsyncError::Parse(qualified.to_string())),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}/{}", self.group, self.artifact)
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.artifact)
    }
}

/// A `lib {:git-tag "..." :git-sha "..."}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCoordinate {
    pub library: Library,
    pub tag: String,
    pub sha: String,
    #[allow(dead_code)]
    pub span: Range<usize>,
}

/// A `lib {:version "..."}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryCoordinate {
    pub library: Library,
    pub version: String,
    #[allow(dead_code)]
    pub span: Range<usize>,
}

/// A `lib {:path "..."}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCoordinate {
    pub library: Library,
    pub path: String,
}

const SYMBOL: &str = r"[A-Za-z0-9_.+-]+";

fn any_coordinate_pattern() -> Regex {
    let pattern = format!(r"({SYMBOL}/{SYMBOL})\s*\{{([^{{}}]*)\}}");
    Regex::new(&pattern).expect("coordinate pattern is valid")
}

/// Pattern for one specific library's coordinate map. The leading guard
/// keeps `acme/foo` from matching inside `notacme/foo`.
fn library_pattern(library: &Library) -> Regex {
    let pattern = format!(
        r"(^|[^A-Za-z0-9_.+/-]){}\s*\{{([^{{}}]*)\}}",
        regex::escape(&library.qualified())
    );
    Regex::new(&pattern).expect("escaped library pattern is valid")
}

fn key_pattern(key: &str) -> Regex {
    let pattern = format!(r#"(:{key}\s+)"([^"]*)""#);
    Regex::new(&pattern).expect("key pattern is valid")
}

fn key_value(body: &str, key: &str) -> Option<String> {
    key_pattern(key)
        .captures(body)
        .map(|caps| caps[2].to_string())
}

/// Find every git coordinate in the raw text. Total: malformed or empty
/// input simply yields no matches. Key order inside the map is irrelevant.
pub fn find_git_coordinates(text: &str) -> Vec<GitCoordinate> {
    any_coordinate_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let body = caps.get(2)?.as_str();
            let tag = key_value(body, "git-tag")?;
            let sha = key_value(body, "git-sha")?;
            let library = Library::parse(caps.get(1)?.as_str()).ok()?;
            let whole = caps.get(0)?;
            Some(GitCoordinate {
                library,
                tag,
                sha,
                span: whole.range(),
            })
        })
        .collect()
}

pub fn find_registry_coordinates(text: &str) -> Vec<RegistryCoordinate> {
    any_coordinate_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let body = caps.get(2)?.as_str();
            let version = key_value(body, "version")?;
            let library = Library::parse(caps.get(1)?.as_str()).ok()?;
            let whole = caps.get(0)?;
            Some(RegistryCoordinate {
                library,
                version,
                span: whole.range(),
            })
        })
        .collect()
}

pub fn find_local_coordinates(text: &str) -> Vec<LocalCoordinate> {
    any_coordinate_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let body = caps.get(2)?.as_str();
            let path = key_value(body, "path")?;
            let library = Library::parse(caps.get(1)?.as_str()).ok()?;
            Some(LocalCoordinate { library, path })
        })
        .collect()
}

fn replace_key_value(body: &str, key: &str, value: &str) -> String {
    key_pattern(key)
        .replace(body, |caps: &Captures| {
            format!("{}\"{}\"", &caps[1], value)
        })
        .into_owned()
}

/// Rewrite the body of every coordinate map of `library` in place, leaving
/// every other byte of the text untouched. A library may be declared more
/// than once in one file (`:deps` plus alias maps); all occurrences get the
/// same rewrite. No-op when the library is absent.
fn rewrite_body(text: &str, library: &Library, rewrite: impl Fn(&str) -> String) -> String {
    library_pattern(library)
        .replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            let body = &caps[2];
            let new_body = rewrite(body);
            // Splice the new body into the matched span verbatim.
            let body_start = whole.rfind(body).unwrap_or(0);
            format!(
                "{}{}{}",
                &whole[..body_start],
                new_body,
                &whole[body_start + body.len()..]
            )
        })
        .into_owned()
}

/// Replace the tag and sha values for `library`. Idempotent: applying the
/// coordinate's current values returns the text byte-for-byte unchanged.
pub fn update_git_coordinate(text: &str, library: &Library, tag: &str, sha: &str) -> String {
    rewrite_body(text, library, |body| {
        let body = replace_key_value(body, "git-tag", tag);
        replace_key_value(&body, "git-sha", sha)
    })
}

/// Replace the version value for `library`, with the same idempotence
/// contract as [`update_git_coordinate`].
pub fn update_registry_coordinate(text: &str, library: &Library, version: &str) -> String {
    rewrite_body(text, library, |body| {
        replace_key_value(body, "version", version)
    })
}

/// Turn a `:path` coordinate into a `:git-tag`/`:git-sha` coordinate in
/// place. Other keys inside the map survive.
pub fn replace_local_with_git(text: &str, library: &Library, tag: &str, sha: &str) -> String {
    let path_re = key_pattern("path");
    rewrite_body(text, library, |body| {
        path_re
            .replace(body, |_: &Captures| {
                format!(":git-tag \"{}\" :git-sha \"{}\"", tag, sha)
            })
            .into_owned()
    })
}

/// Turn a `:path` coordinate into a `:version` coordinate in place.
pub fn replace_local_with_registry(text: &str, library: &Library, version: &str) -> String {
    let path_re = key_pattern("path");
    rewrite_body(text, library, |body| {
        path_re
            .replace(body, |_: &Captures| format!(":version \"{}\"", version))
            .into_owned()
    })
}
