use regex::Regex;
use std::cmp::Ordering;

/// Markers that flag a version string as a pre-release.
const PRE_RELEASE_MARKERS: [&str; 6] = ["alpha", "beta", "rc", "snapshot", "milestone", "preview"];

/// A parsed semantic version triple. The optional suffix of the source
/// string (`-alpha.1`, `+build`, trailing junk) is dropped; callers keep
/// the raw string around when they care about pre-release detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    /// Parse a tag or version string of the form `v?<int>.<int>.<int><suffix>`.
    ///
    /// Total over arbitrary input: anything that does not contain three
    /// leading numeric groups yields `None`, never an error.
    pub fn parse(tag: &str) -> Option<Self> {
        let trimmed = tag.trim();
        let stripped = trimmed.strip_prefix('v').unwrap_or(trimmed);

        if let Ok(v) = semver::Version::parse(stripped) {
            return Some(SemVer {
                major: v.major,
                minor: v.minor,
                patch: v.patch,
            });
        }

        // Lenient fallback for tags semver rejects, e.g. "1.2.3.4" or "1.2.3final"
        let re = Regex::new(r"^(\d+)\.(\d+)\.(\d+)").expect("semver pattern is valid");
        let caps = re.captures(stripped)?;
        Some(SemVer {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch: caps[3].parse().ok()?,
        })
    }
}

/// True when the string contains one of the pre-release markers,
/// case-insensitively. Total, including for the empty string.
pub fn is_pre_release(version: &str) -> bool {
    let lower = version.to_lowercase();
    PRE_RELEASE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

pub fn is_stable(version: &str) -> bool {
    !is_pre_release(version)
}

/// Extract the numeric segments of a loosely-structured version string.
///
/// Every character outside `[0-9.]` acts as a separator, empty pieces are
/// dropped, and anything that still fails to parse counts as 0. This covers
/// registry versions that do not follow strict semver (`5.13.0`, `1.2.3.4`).
pub fn version_segments(version: &str) -> Vec<u64> {
    let normalized: String = version
        .chars()
        .map(|c| if c.is_ascii_digit() || c == '.' { c } else { '.' })
        .collect();

    normalized
        .split('.')
        .filter(|piece| !piece.is_empty())
        .map(|piece| piece.parse::<u64>().unwrap_or(0))
        .collect()
}

pub struct VersionComparator;

impl VersionComparator {
    /// Segment-wise comparison, right-padding the shorter sequence with
    /// zeros so that "1.0" and "1.0.0" compare equal.
    pub fn compare(a: &str, b: &str) -> Ordering {
        let sa = version_segments(a);
        let sb = version_segments(b);
        let len = sa.len().max(sb.len());

        for i in 0..len {
            let va = sa.get(i).copied().unwrap_or(0);
            let vb = sb.get(i).copied().unwrap_or(0);
            match va.cmp(&vb) {
                Ordering::Equal => continue,
                other => return other,
            }
        }

        Ordering::Equal
    }

    /// Strictly newer: `new` compares greater than `old`.
    pub fn is_newer(old: &str, new: &str) -> bool {
        Self::compare(new, old) == Ordering::Greater
    }

    /// Pick the highest version from a list, optionally restricted to
    /// stable versions. Returns the original string of the winner.
    pub fn latest(versions: &[String], stable_only: bool) -> Option<String> {
        versions
            .iter()
            .filter(|v| !stable_only || is_stable(v))
            .max_by(|a, b| Self::compare(a, b))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_prefixed_triples() {
        let expected = Some(SemVer {
            major: 1,
            minor: 2,
            patch: 3,
        });
        assert_eq!(SemVer::parse("1.2.3"), expected);
        assert_eq!(SemVer::parse("v1.2.3"), expected);
        assert_eq!(SemVer::parse("v1.2.3-alpha.1"), expected);
        assert_eq!(SemVer::parse("1.2.3.4"), expected);
    }

    #[test]
    fn parse_is_total() {
        assert_eq!(SemVer::parse(""), None);
        assert_eq!(SemVer::parse("latest"), None);
        assert_eq!(SemVer::parse("1.2"), None);
        assert_eq!(SemVer::parse("v"), None);
    }

    #[test]
    fn round_trips_constructed_triples() {
        for (major, minor, patch) in [(0, 0, 0), (1, 0, 9), (12, 34, 56)] {
            let tag = format!("v{}.{}.{}", major, minor, patch);
            assert_eq!(
                SemVer::parse(&tag),
                Some(SemVer {
                    major,
                    minor,
                    patch
                })
            );
        }
    }

    #[test]
    fn pre_release_markers_are_case_insensitive() {
        assert!(is_pre_release("1.0.0-ALPHA"));
        assert!(is_pre_release("2.0.0-SNAPSHOT"));
        assert!(is_pre_release("1.0.0-rc1"));
        assert!(is_pre_release("3.0.0-Milestone2"));
        assert!(!is_pre_release("1.0.0"));
        assert!(!is_pre_release(""));
    }

    #[test]
    fn stable_is_the_complement_of_pre_release() {
        for v in ["1.0.0", "1.0.0-beta", "", "preview", "5.13.0"] {
            assert_eq!(is_stable(v), !is_pre_release(v));
        }
    }

    #[test]
    fn segments_treat_non_digits_as_separators() {
        assert_eq!(version_segments("5.13.0"), vec![5, 13, 0]);
        assert_eq!(version_segments("1.2.3.4"), vec![1, 2, 3, 4]);
        assert_eq!(version_segments("1.0.0-rc1"), vec![1, 0, 0, 1]);
        assert_eq!(version_segments(""), Vec::<u64>::new());
        assert_eq!(version_segments("abc"), Vec::<u64>::new());
    }

    #[test]
    fn comparison_pads_shorter_sequences() {
        assert!(VersionComparator::is_newer("1.0", "1.0.1"));
        assert!(!VersionComparator::is_newer("1.0.1", "1.0"));
        assert_eq!(VersionComparator::compare("1.0", "1.0.0"), Ordering::Equal);
    }

    #[test]
    fn is_newer_is_a_strict_order() {
        let versions = ["1.0.0", "1.0.1", "1.1.0", "2.0.0", "1.0"];

        for v in versions {
            assert!(!VersionComparator::is_newer(v, v), "irreflexive for {v}");
        }

        for a in versions {
            for b in versions {
                if VersionComparator::is_newer(a, b) {
                    assert!(!VersionComparator::is_newer(b, a), "asymmetric {a}/{b}");
                }
            }
        }

        for a in versions {
            for b in versions {
                for c in versions {
                    if VersionComparator::is_newer(a, b) && VersionComparator::is_newer(b, c) {
                        assert!(VersionComparator::is_newer(a, c), "transitive {a}/{b}/{c}");
                    }
                }
            }
        }
    }

    #[test]
    fn compare_sign_agrees_with_is_newer() {
        let pairs = [("1.0.0", "1.0.1"), ("2.0", "1.9.9"), ("1.0", "1.0.0")];
        for (a, b) in pairs {
            match VersionComparator::compare(a, b) {
                Ordering::Less => assert!(VersionComparator::is_newer(a, b)),
                Ordering::Greater => assert!(VersionComparator::is_newer(b, a)),
                Ordering::Equal => {
                    assert!(!VersionComparator::is_newer(a, b));
                    assert!(!VersionComparator::is_newer(b, a));
                }
            }
        }
    }

    #[test]
    fn latest_respects_stability_filter() {
        let versions = vec![
            "1.0.0".to_string(),
            "1.1.0-alpha".to_string(),
            "1.0.1".to_string(),
        ];
        assert_eq!(
            VersionComparator::latest(&versions, false),
            Some("1.1.0-alpha".to_string())
        );
        assert_eq!(
            VersionComparator::latest(&versions, true),
            Some("1.0.1".to_string())
        );
    }
}
