use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("Failed to read file {path:?}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },

    #[error("Failed to write file {path:?}: {source}")]
    WriteFile { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse JSON in {path:?}: {source}")]
    ParseJson { path: PathBuf, source: serde_json::Error },

    #[error("Project manifest package.json not found at {path:?}")]
    ManifestMissing { path: PathBuf },

    #[error("Invalid manifest in {path:?}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Package {spec} not found: {reason}")]
    PackageNotFound { spec: String, reason: String },

    #[error("Registry unavailable for {url}: {reason}")]
    RegistryUnavailable { url: String, reason: String },

    #[error("Malformed registry response for {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("Invalid version range {value}: {reason}")]
    Semver { value: String, reason: String },

    #[error("Failed to serialize JSON: {reason}")]
    SerializeJson { reason: String },

    #[error("Failed to spawn {program}: {source}")]
    Spawn { program: String, source: std::io::Error },
}

impl PreflightError {
    /// Registry reads are idempotent, so transport-level failures are worth
    /// retrying. Not-found and malformed payloads are final.
    pub fn is_transient(&self) -> bool {
        matches!(self, PreflightError::RegistryUnavailable { .. })
    }
}
