use crate::registry::types::{LicenseField, VersionMetadata};
use std::fmt;

/// Sentinel bucket for packages without a usable license declaration.
pub const UNKNOWN: &str = "UNKNOWN";

/// Rough protectiveness classes for license identifiers, used by the
/// details view and by `allowedLicenseTypes` manifest limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LicenseKind {
    PublicDomain,
    Permissive,
    WeaklyProtective,
    Protective,
    NetworkProtective,
    Uncategorized,
}

impl LicenseKind {
    /// Manifest-facing identifier, as accepted in `allowedLicenseTypes`.
    pub fn name(&self) -> &'static str {
        match self {
            LicenseKind::PublicDomain => "publicDomain",
            LicenseKind::Permissive => "permissive",
            LicenseKind::WeaklyProtective => "weaklyProtective",
            LicenseKind::Protective => "protective",
            LicenseKind::NetworkProtective => "networkProtective",
            LicenseKind::Uncategorized => "uncategorized",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LicenseKind::PublicDomain => "Public Domain",
            LicenseKind::Permissive => "Permissive",
            LicenseKind::WeaklyProtective => "Weakly Protective",
            LicenseKind::Protective => "Protective",
            LicenseKind::NetworkProtective => "Network Protective",
            LicenseKind::Uncategorized => "Uncategorized",
        }
    }
}

impl fmt::Display for LicenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a license identifier. Checks are ordered so that the more
/// specific GPL family members win over the bare GPL match.
pub fn classify(license: &str) -> LicenseKind {
    let id = license.to_ascii_uppercase();

    if id.is_empty() || id == UNKNOWN {
        return LicenseKind::Uncategorized;
    }

    let public_domain = ["UNLICENSE", "CC0", "WTFPL", "0BSD", "PUBLIC DOMAIN"];
    if public_domain.iter().any(|marker| id.contains(marker)) {
        return LicenseKind::PublicDomain;
    }

    if id.contains("AGPL") || id.contains("SSPL") {
        return LicenseKind::NetworkProtective;
    }

    if id.contains("LGPL") || id.contains("MPL") || id.contains("EPL") || id.contains("CDDL") {
        return LicenseKind::WeaklyProtective;
    }

    if id.contains("GPL") || id.contains("CC-BY-SA") || id.contains("EUPL") {
        return LicenseKind::Protective;
    }

    let permissive = [
        "MIT", "ISC", "BSD", "APACHE", "ZLIB", "X11", "ARTISTIC", "CC-BY", "UNICODE", "PYTHON",
        "BLUEOAK",
    ];
    if permissive.iter().any(|marker| id.contains(marker)) {
        return LicenseKind::Permissive;
    }

    LicenseKind::Uncategorized
}

/// Collapse the registry's license shapes (SPDX string, `{type}` object,
/// legacy `licenses` array) into one identifier.
pub fn normalize(meta: &VersionMetadata) -> String {
    match &meta.license {
        Some(LicenseField::Spdx(id)) if !id.trim().is_empty() => return id.trim().to_string(),
        Some(LicenseField::Object(object)) => {
            if let Some(id) = object.license_type.as_deref()
                && !id.trim().is_empty()
            {
                return id.trim().to_string();
            }
        }
        _ => {}
    }

    let legacy: Vec<&str> = meta
        .licenses
        .iter()
        .filter_map(|object| object.license_type.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();

    if legacy.is_empty() {
        UNKNOWN.to_string()
    } else {
        legacy.join(" OR ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::{LicenseObject, VersionMetadata};

    fn meta_with_license(license: Option<LicenseField>) -> VersionMetadata {
        VersionMetadata {
            version: "1.0.0".to_string(),
            license,
            ..Default::default()
        }
    }

    #[test]
    fn classifies_common_identifiers() {
        assert_eq!(classify("MIT"), LicenseKind::Permissive);
        assert_eq!(classify("Apache-2.0"), LicenseKind::Permissive);
        assert_eq!(classify("BSD-3-Clause"), LicenseKind::Permissive);
        assert_eq!(classify("GPL-3.0"), LicenseKind::Protective);
        assert_eq!(classify("LGPL-2.1"), LicenseKind::WeaklyProtective);
        assert_eq!(classify("MPL-2.0"), LicenseKind::WeaklyProtective);
        assert_eq!(classify("AGPL-3.0"), LicenseKind::NetworkProtective);
        assert_eq!(classify("CC0-1.0"), LicenseKind::PublicDomain);
        assert_eq!(classify("Unlicense"), LicenseKind::PublicDomain);
        assert_eq!(classify("SEE LICENSE IN LICENSE"), LicenseKind::Uncategorized);
        assert_eq!(classify(UNKNOWN), LicenseKind::Uncategorized);
    }

    #[test]
    fn normalizes_spdx_string() {
        let meta = meta_with_license(Some(LicenseField::Spdx("MIT".to_string())));
        assert_eq!(normalize(&meta), "MIT");
    }

    #[test]
    fn normalizes_object_form() {
        let meta = meta_with_license(Some(LicenseField::Object(LicenseObject {
            license_type: Some("BSD-2-Clause".to_string()),
        })));
        assert_eq!(normalize(&meta), "BSD-2-Clause");
    }

    #[test]
    fn normalizes_legacy_array() {
        let mut meta = meta_with_license(None);
        meta.licenses = vec![
            LicenseObject {
                license_type: Some("MIT".to_string()),
            },
            LicenseObject {
                license_type: Some("Apache-2.0".to_string()),
            },
        ];
        assert_eq!(normalize(&meta), "MIT OR Apache-2.0");
    }

    #[test]
    fn missing_license_becomes_unknown() {
        let meta = meta_with_license(None);
        assert_eq!(normalize(&meta), UNKNOWN);

        let empty = meta_with_license(Some(LicenseField::Spdx("  ".to_string())));
        assert_eq!(normalize(&empty), UNKNOWN);
    }
}
