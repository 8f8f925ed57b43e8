use crate::stats::Limits;
use crate::{PreflightError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub config: Limits,
}

#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
}

impl Project {
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = Some(start);

        while let Some(dir) = current {
            let candidate = dir.join("package.json");
            if candidate.is_file() {
                return Self::from_manifest_path(candidate);
            }
            current = dir.parent();
        }

        Err(PreflightError::ManifestMissing {
            path: start.to_path_buf(),
        })
    }

    pub fn from_manifest_path(path: PathBuf) -> Result<Self> {
        let data = fs::read_to_string(&path).map_err(|source| PreflightError::ReadFile {
            path: path.clone(),
            source,
        })?;

        let manifest: Manifest =
            serde_json::from_str(&data).map_err(|source| PreflightError::ParseJson {
                path: path.clone(),
                source,
            })?;

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| PreflightError::ManifestInvalid {
                path: path.clone(),
                reason: "manifest has no parent directory".into(),
            })?;

        Ok(Project {
            root,
            manifest_path: path,
            manifest,
        })
    }

    /// Root dependency set for a walk. Dev dependencies are merged in for
    /// the root manifest only; transitive packages contribute runtime
    /// dependencies alone. On a name collision the production range wins.
    pub fn root_dependencies(&self, include_dev: bool) -> BTreeMap<String, String> {
        let mut root = self.manifest.dependencies.clone();

        if include_dev {
            for (name, range) in self.manifest.dev_dependencies.iter() {
                root.entry(name.clone()).or_insert_with(|| range.clone());
            }
        }

        root
    }

    pub fn label(&self) -> String {
        match (self.manifest.name.as_deref(), self.manifest.version.as_deref()) {
            (Some(name), Some(version)) => format!("{}@{}", name, version),
            (Some(name), None) => name.to_string(),
            _ => self
                .root
                .file_name()
                .and_then(|os| os.to_str())
                .unwrap_or(".")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("package.json");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_manifest_with_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            r#"{
                "name": "fixture",
                "version": "1.0.0",
                "dependencies": { "express": "^4.17.0" },
                "devDependencies": { "mocha": "^10.0.0" },
                "config": {
                    "maxPackagesNumber": 100,
                    "maxSizeBites": 840400,
                    "allowedLicenseTypes": ["permissive", "publicDomain"]
                }
            }"#,
        );

        let project = Project::from_manifest_path(path).unwrap();
        assert_eq!(project.manifest.name.as_deref(), Some("fixture"));
        assert_eq!(project.manifest.config.max_packages_number, Some(100));
        assert_eq!(project.manifest.config.max_size_bytes, Some(840_400));
        assert_eq!(project.manifest.config.allowed_license_types.len(), 2);
        assert_eq!(project.label(), "fixture@1.0.0");
    }

    #[test]
    fn discover_walks_up_to_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), r#"{ "name": "up" }"#);
        let nested = dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        let project = Project::discover(&nested).unwrap();
        assert_eq!(project.manifest.name.as_deref(), Some("up"));
    }

    #[test]
    fn discover_fails_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::discover(dir.path()).unwrap_err();
        assert!(matches!(err, PreflightError::ManifestMissing { .. }));
    }

    #[test]
    fn root_dependencies_merges_dev_unless_production() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            r#"{
                "dependencies": { "a": "^1.0.0", "both": "^1.0.0" },
                "devDependencies": { "b": "^2.0.0", "both": "^9.9.9" }
            }"#,
        );
        let project = Project::from_manifest_path(path).unwrap();

        let merged = project.root_dependencies(true);
        assert_eq!(merged.len(), 3);
        // Production range wins the collision.
        assert_eq!(merged.get("both").map(String::as_str), Some("^1.0.0"));

        let production = project.root_dependencies(false);
        assert_eq!(production.len(), 2);
        assert!(!production.contains_key("b"));
    }
}
