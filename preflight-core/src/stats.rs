use crate::graph::PackageGraph;
use crate::license::{self, LicenseKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated totals over a resolved graph. Derived once, never mutated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub count: usize,
    pub total_size_bytes: u64,
    pub license_histogram: BTreeMap<String, u64>,
}

/// Pure reducer. Size is the plain sum over nodes — worst case, nothing
/// shared — since the tool reports maximal impact before an install.
pub fn aggregate(graph: &PackageGraph) -> GraphStats {
    let mut stats = GraphStats::default();

    for package in graph.packages.values() {
        stats.count += 1;
        stats.total_size_bytes += package.size_bytes;

        let license = if package.license.is_empty() {
            license::UNKNOWN
        } else {
            package.license.as_str()
        };

        *stats.license_histogram.entry(license.to_string()).or_insert(0) += 1;
    }

    stats
}

/// Install limits from the manifest `config` block. `maxSizeBites` is the
/// historical field name; `maxSizeBytes` is accepted as an alias.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Limits {
    #[serde(default, rename = "maxPackagesNumber")]
    pub max_packages_number: Option<usize>,
    #[serde(default, rename = "maxSizeBites", alias = "maxSizeBytes")]
    pub max_size_bytes: Option<u64>,
    #[serde(default, rename = "allowedLicenseTypes")]
    pub allowed_license_types: Vec<String>,
}

impl Limits {
    pub fn is_empty(&self) -> bool {
        self.max_packages_number.is_none()
            && self.max_size_bytes.is_none()
            && self.allowed_license_types.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LimitViolation {
    PackageCount { actual: usize, max: usize },
    TotalSize { actual: u64, max: u64 },
    License { license: String, kind: LicenseKind, count: u64 },
}

impl LimitViolation {
    pub fn describe(&self) -> String {
        match self {
            LimitViolation::PackageCount { actual, max } => {
                format!("package count {} exceeds limit {}", actual, max)
            }
            LimitViolation::TotalSize { actual, max } => {
                format!("total size {} bytes exceeds limit {} bytes", actual, max)
            }
            LimitViolation::License { license, kind, count } => {
                format!(
                    "license {} ({}) is not allowed ({} package{})",
                    license,
                    kind,
                    count,
                    if *count == 1 { "" } else { "s" }
                )
            }
        }
    }
}

/// Explicit evaluation result: every violated limit, in a value the caller
/// can inspect or render.
#[derive(Clone, Debug, Default)]
pub struct LimitReport {
    pub violations: Vec<LimitViolation>,
}

impl LimitReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check stats against manifest limits. Thresholds are strict: reaching a
/// limit counts as exceeding it. License checks compare classified kinds
/// against `allowedLicenseTypes` entries.
pub fn check_limits(stats: &GraphStats, limits: &Limits) -> LimitReport {
    let mut violations = Vec::new();

    if let Some(max) = limits.max_packages_number
        && stats.count >= max
    {
        violations.push(LimitViolation::PackageCount {
            actual: stats.count,
            max,
        });
    }

    if let Some(max) = limits.max_size_bytes
        && stats.total_size_bytes >= max
    {
        violations.push(LimitViolation::TotalSize {
            actual: stats.total_size_bytes,
            max,
        });
    }

    if !limits.allowed_license_types.is_empty() {
        for (license, count) in stats.license_histogram.iter() {
            let kind = license::classify(license);
            let allowed = limits
                .allowed_license_types
                .iter()
                .any(|entry| entry == kind.name());

            if !allowed {
                violations.push(LimitViolation::License {
                    license: license.clone(),
                    kind,
                    count: *count,
                });
            }
        }
    }

    LimitReport { violations }
}
