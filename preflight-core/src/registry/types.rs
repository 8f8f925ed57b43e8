use serde::Deserialize;
use std::collections::BTreeMap;

/// Full registry document for one package name: every published version,
/// dist-tags, and publish timestamps.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Packument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionMetadata>,
    #[serde(default)]
    pub time: BTreeMap<String, serde_json::Value>,
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VersionMetadata {
    pub version: String,
    #[serde(default)]
    pub license: Option<LicenseField>,
    #[serde(default)]
    pub licenses: Vec<LicenseObject>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dist: DistInfo,
}

/// `license` in the wild is either an SPDX string or an object carrying a
/// `type` field.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum LicenseField {
    Spdx(String),
    Object(LicenseObject),
}

#[derive(Clone, Debug, Deserialize)]
pub struct LicenseObject {
    #[serde(default, rename = "type")]
    pub license_type: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DistInfo {
    #[serde(default, rename = "unpackedSize")]
    pub unpacked_size: Option<u64>,
    #[serde(default)]
    pub tarball: Option<String>,
}

impl Packument {
    /// Publish timestamp for one version, when the registry provided one.
    pub fn published_at(&self, version: &str) -> Option<&str> {
        self.time.get(version).and_then(|value| value.as_str())
    }
}
