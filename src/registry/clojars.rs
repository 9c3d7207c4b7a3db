use crate::depsfile::Library;
use crate::error::Result;
use crate::registry::{RegistryClient, build_client, validate_registry_url};
use reqwest::blocking::Client;
use serde::Deserialize;

const DEFAULT_CLOJARS: &str = "https://clojars.org";

/// Clojars artifact API client. The API reports the newest version
/// directly, so no version list is fetched.
pub struct ClojarsClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ArtifactInfo {
    latest_version: Option<String>,
}

impl ClojarsClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_CLOJARS.to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self> {
        validate_registry_url(&base_url)?;
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn artifact_url(&self, library: &Library) -> String {
        format!(
            "{}/api/artifacts/{}/{}",
            self.base_url, library.group, library.artifact
        )
    }
}

impl RegistryClient for ClojarsClient {
    fn name(&self) -> &str {
        "Clojars"
    }

    fn latest_version(&self, library: &Library) -> Result<Option<String>> {
        let url = self.artifact_url(library);
        if std::env::var("DEPSYNC_VERBOSE").is_ok() {
            eprintln!("[VERBOSE] Fetching: {}", url);
        }

        let response = match self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
        {
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

        let info: ArtifactInfo = match response.json() {
            Ok(info) => info,
            Err(_) => return Ok(None),
        };

        Ok(info.latest_version.filter(|v| !v.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_artifact_urls() {
        let client = ClojarsClient::new().unwrap();
        let library = Library::new("metosin", "reitit");
        assert_eq!(
            client.artifact_url(&library),
            "https://clojars.org/api/artifacts/metosin/reitit"
        );
    }

    #[test]
    fn parses_artifact_payload() {
        let payload = r#"{"group_name":"metosin","jar_name":"reitit","latest_version":"0.7.2"}"#;
        let info: ArtifactInfo = serde_json::from_str(payload).unwrap();
        assert_eq!(info.latest_version.as_deref(), Some("0.7.2"));
    }

    #[test]
    fn rejects_private_base_urls() {
        assert!(ClojarsClient::with_base_url("https://localhost/api".to_string()).is_err());
    }

    #[test]
    #[ignore] // Requires network access
    fn fetches_a_known_artifact() {
        let client = ClojarsClient::new().unwrap();
        let library = Library::new("metosin", "reitit");
        let version = client.latest_version(&library).unwrap();
        assert!(version.is_some());
    }
}
