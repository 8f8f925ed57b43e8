use crate::graph::PackageGraph;
use crate::license;
use crate::{PreflightError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use time::format_description::well_known::Rfc3339;

/// One row of the details view / JSON export. Rows come out sorted by
/// resolved identity since the graph is ordered.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsRow {
    pub name: String,
    pub version: String,
    pub license: String,
    pub license_type: String,
    pub size_bytes: u64,
    pub modified: Option<String>,
}

pub fn details_rows(graph: &PackageGraph) -> Vec<DetailsRow> {
    graph
        .packages
        .values()
        .map(|package| DetailsRow {
            name: package.id.name.clone(),
            version: package.id.version.clone(),
            license: package.license.clone(),
            license_type: license::classify(&package.license).name().to_string(),
            size_bytes: package.size_bytes,
            modified: package
                .modified_at
                .and_then(|stamp| stamp.format(&Rfc3339).ok()),
        })
        .collect()
}

pub fn details_to_json(graph: &PackageGraph) -> Result<String> {
    serde_json::to_string_pretty(&details_rows(graph)).map_err(|source| {
        PreflightError::SerializeJson {
            reason: source.to_string(),
        }
    })
}

pub fn export_details(graph: &PackageGraph, path: &Path) -> Result<()> {
    let json = details_to_json(graph)?;

    fs::write(path, json).map_err(|source| PreflightError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Export file name from user input: empty falls back to the default, and
/// a name without an extension gets `.json` appended.
pub fn export_file_name(input: &str) -> String {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return "licenseDetails.json".to_string();
    }

    if trimmed.contains('.') {
        trimmed.to_string()
    } else {
        format!("{}.json", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{PackageId, ResolvedPackage};
    use std::collections::BTreeMap;

    fn sample_graph() -> PackageGraph {
        let mut graph = PackageGraph::default();
        for (name, version, license, size) in [
            ("zeta", "1.0.0", "MIT", 64),
            ("alpha", "2.1.0", "GPL-3.0", 128),
        ] {
            let id = PackageId {
                name: name.to_string(),
                version: version.to_string(),
            };
            graph.packages.insert(
                id.clone(),
                ResolvedPackage {
                    id,
                    license: license.to_string(),
                    size_bytes: size,
                    modified_at: None,
                    dependencies: BTreeMap::new(),
                },
            );
        }
        graph
    }

    #[test]
    fn rows_are_sorted_by_identity() {
        let rows = details_rows(&sample_graph());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "alpha");
        assert_eq!(rows[1].name, "zeta");
        assert_eq!(rows[0].license_type, "protective");
    }

    #[test]
    fn json_export_has_expected_shape() {
        let json = details_to_json(&sample_graph()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "alpha");
        assert_eq!(rows[0]["license"], "GPL-3.0");
        assert_eq!(rows[0]["sizeBytes"], 128);
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        export_details(&sample_graph(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"alpha\""));
    }

    #[test]
    fn export_file_name_defaults_and_extends() {
        assert_eq!(export_file_name(""), "licenseDetails.json");
        assert_eq!(export_file_name("  "), "licenseDetails.json");
        assert_eq!(export_file_name("report"), "report.json");
        assert_eq!(export_file_name("report.json"), "report.json");
        assert_eq!(export_file_name("report.txt"), "report.txt");
    }
}
