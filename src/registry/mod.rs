use crate::depsfile::Library;
use crate::error::{DepsyncError, Result};
use reqwest::blocking::Client;
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

pub mod clojars;
pub mod maven_central;

pub use clojars::ClojarsClient;
pub use maven_central::MavenCentralClient;

/// A version registry queried during resolution. A missing artifact or an
/// unreachable endpoint is a soft miss (`Ok(None)`); the chain moves on to
/// the next registry.
pub trait RegistryClient: Send + Sync {
    fn name(&self) -> &str;

    fn latest_version(&self, library: &Library) -> Result<Option<String>>;
}

pub(crate) fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent("depsync")
        .danger_accept_invalid_certs(false)
        .build()
        .map_err(|e| DepsyncError::Io(std::io::Error::other(e)))
}

pub fn validate_registry_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|_| DepsyncError::WorkspaceValidation(format!("Invalid registry URL: {url}")))?;

    match parsed.scheme() {
        "https" | "http" => {}
        scheme => {
            return Err(DepsyncError::WorkspaceValidation(format!(
                "Unsupported registry scheme: {scheme}"
            )));
        }
    }

    if let Some(host) = parsed.host_str() {
        if is_private_host(host) {
            return Err(DepsyncError::WorkspaceValidation(format!(
                "Registry host '{host}' is not allowed"
            )));
        }
    }

    Ok(())
}

fn is_private_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        match ip {
            IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
            IpAddr::V6(v6) => v6.is_loopback() || v6.is_unique_local(),
        }
    } else {
        false
    }
}
