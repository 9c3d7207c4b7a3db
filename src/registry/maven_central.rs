use crate::depsfile::Library;
use crate::error::{DepsyncError, Result};
use crate::registry::{RegistryClient, build_client, validate_registry_url};
use crate::version::VersionComparator;
use quick_xml::de::from_str;
use reqwest::blocking::Client;
use serde::Deserialize;

const DEFAULT_MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";
const MAX_METADATA_BYTES: usize = 10 * 1024 * 1024;

/// Maven Central metadata client, used as the secondary registry for
/// libraries Clojars does not host.
pub struct MavenCentralClient {
    client: Client,
    base_url: String,
}

impl MavenCentralClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_MAVEN_CENTRAL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self> {
        validate_registry_url(&base_url)?;
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn metadata_url(&self, library: &Library) -> String {
        let group_path = library.group.replace('.', "/");
        format!(
            "{}/{}/{}/maven-metadata.xml",
            self.base_url, group_path, library.artifact
        )
    }

    fn fetch_all_versions(&self, library: &Library) -> Result<Option<Vec<String>>> {
        let url = self.metadata_url(library);
        if std::env::var("DEPSYNC_VERBOSE").is_ok() {
            eprintln!("[VERBOSE] Fetching: {}", url);
        }

        let response = match self.client.get(&url).send() {
            Ok(resp) => resp,
            Err(e) => {
                if std::env::var("DEPSYNC_VERBOSE").is_ok() {
                    eprintln!("[VERBOSE] Request failed: {}", e);
                }
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            if std::env::var("DEPSYNC_VERBOSE").is_ok() {
                eprintln!("[VERBOSE] HTTP {}: {}", response.status(), url);
            }
            return Ok(None);
        }

        let text = response
            .text()
            .map_err(|e| DepsyncError::Io(std::io::Error::other(e)))?;

        if text.len() > MAX_METADATA_BYTES {
            return Err(DepsyncError::Io(std::io::Error::other(
                "Maven metadata response exceeded 10MB limit",
            )));
        }

        let metadata: MavenMetadata = match from_str(&text) {
            Ok(metadata) => metadata,
            Err(_) => return Ok(None),
        };

        Ok(Some(metadata.versioning.versions.version))
    }
}

impl RegistryClient for MavenCentralClient {
    fn name(&self) -> &str {
        "Maven Central"
    }

    fn latest_version(&self, library: &Library) -> Result<Option<String>> {
        match self.fetch_all_versions(library)? {
            Some(versions) if !versions.is_empty() => {
                Ok(VersionComparator::latest(&versions, false))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MavenMetadata {
    versioning: Versioning,
}

#[derive(Debug, Deserialize)]
struct Versioning {
    versions: Versions,
}

#[derive(Debug, Deserialize)]
struct Versions {
    version: Vec<String>,
}
