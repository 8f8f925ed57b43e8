use crate::console;
use crate::{PreflightConfig, PreflightError, Result};
use reqwest::Client;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderValue};
use std::time::Instant;

pub mod types;

use types::Packument;

/// Read-only registry lookup. Injected into the fetcher so tests can swap
/// the HTTP client for a canned registry.
pub trait RegistryClient {
    fn packument(&self, name: &str) -> impl Future<Output = Result<Packument>> + Send;
}

pub struct HttpRegistry {
    client: Client,
    base_url: String,
}

impl HttpRegistry {
    pub fn new(config: &PreflightConfig) -> Self {
        HttpRegistry {
            client: Client::new(),
            base_url: config.registry_url.trim_end_matches('/').to_string(),
        }
    }
}

impl RegistryClient for HttpRegistry {
    async fn packument(&self, name: &str) -> Result<Packument> {
        let url = format!("{}/{}", self.base_url, encode_package_name(name));

        let request = self.client.get(&url).header(
            ACCEPT,
            HeaderValue::from_static(
                "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8, */*",
            ),
        );

        console::verbose(&format!("registry request: name={} url={}", name, url));
        let started = Instant::now();

        let response = request
            .send()
            .await
            .map_err(|source| PreflightError::RegistryUnavailable {
                url: url.clone(),
                reason: source.to_string(),
            })?;

        let status = response.status();
        console::verbose(&format!(
            "registry response: name={} status={} in {:.3}s",
            name,
            status.as_u16(),
            started.elapsed().as_secs_f64()
        ));

        if status == StatusCode::NOT_FOUND {
            return Err(PreflightError::PackageNotFound {
                spec: name.to_string(),
                reason: "registry returned 404".to_string(),
            });
        }

        if !status.is_success() {
            return Err(PreflightError::RegistryUnavailable {
                url,
                reason: format!("registry returned HTTP {}", status.as_u16()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| PreflightError::RegistryUnavailable {
                url: url.clone(),
                reason: source.to_string(),
            })?;

        let packument: Packument =
            serde_json::from_str(&body).map_err(|source| PreflightError::MalformedResponse {
                url: url.clone(),
                reason: source.to_string(),
            })?;

        console::verbose(&format!(
            "registry decode: name={} versions={} dist_tags={}",
            name,
            packument.versions.len(),
            packument.dist_tags.len()
        ));

        Ok(packument)
    }
}

fn encode_package_name(name: &str) -> String {
    if name.starts_with('@') {
        name.replace('/', "%2F")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::RegistryClient;
    use super::types::{DistInfo, LicenseField, Packument, VersionMetadata};
    use crate::{PreflightError, Result};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Canned registry for tests: packuments by name, plus per-name failure
    /// scripting and call counting.
    #[derive(Default)]
    pub(crate) struct StaticRegistry {
        packuments: BTreeMap<String, Packument>,
        unavailable: Vec<String>,
        flaky: Mutex<BTreeMap<String, u32>>,
        malformed: Vec<String>,
        calls: Mutex<BTreeMap<String, usize>>,
    }

    impl StaticRegistry {
        pub(crate) fn new() -> Self {
            StaticRegistry::default()
        }

        pub(crate) fn with_packument(mut self, packument: Packument) -> Self {
            self.packuments.insert(packument.name.clone(), packument);
            self
        }

        /// Every request for `name` fails with `RegistryUnavailable`.
        pub(crate) fn with_unavailable(mut self, name: &str) -> Self {
            self.unavailable.push(name.to_string());
            self
        }

        /// The first `failures` requests for `name` fail with
        /// `RegistryUnavailable`, then the canned packument is served.
        pub(crate) fn with_flaky(self, name: &str, failures: u32) -> Self {
            self.flaky
                .lock()
                .unwrap()
                .insert(name.to_string(), failures);
            self
        }

        pub(crate) fn with_malformed(mut self, name: &str) -> Self {
            self.malformed.push(name.to_string());
            self
        }

        pub(crate) fn calls(&self, name: &str) -> usize {
            self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
        }
    }

    impl RegistryClient for StaticRegistry {
        async fn packument(&self, name: &str) -> Result<Packument> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(name.to_string())
                .or_insert(0) += 1;

            if self.unavailable.iter().any(|n| n == name) {
                return Err(PreflightError::RegistryUnavailable {
                    url: format!("static://{}", name),
                    reason: "connection refused".to_string(),
                });
            }

            {
                let mut flaky = self.flaky.lock().unwrap();
                if let Some(remaining) = flaky.get_mut(name)
                    && *remaining > 0
                {
                    *remaining -= 1;
                    return Err(PreflightError::RegistryUnavailable {
                        url: format!("static://{}", name),
                        reason: "connection reset".to_string(),
                    });
                }
            }

            if self.malformed.iter().any(|n| n == name) {
                return Err(PreflightError::MalformedResponse {
                    url: format!("static://{}", name),
                    reason: "invalid type: null".to_string(),
                });
            }

            match self.packuments.get(name) {
                Some(packument) => Ok(packument.clone()),
                None => Err(PreflightError::PackageNotFound {
                    spec: name.to_string(),
                    reason: "registry returned 404".to_string(),
                }),
            }
        }
    }

    pub(crate) fn version_meta(
        version: &str,
        license: Option<&str>,
        size: u64,
        deps: &[(&str, &str)],
    ) -> VersionMetadata {
        VersionMetadata {
            version: version.to_string(),
            license: license.map(|l| LicenseField::Spdx(l.to_string())),
            licenses: Vec::new(),
            dependencies: deps
                .iter()
                .map(|(n, r)| (n.to_string(), r.to_string()))
                .collect(),
            dist: DistInfo {
                unpacked_size: Some(size),
                tarball: None,
            },
        }
    }

    /// Packument with a `latest` dist-tag pointing at the highest version.
    pub(crate) fn packument(name: &str, versions: Vec<VersionMetadata>) -> Packument {
        let mut map = BTreeMap::new();
        for meta in versions {
            map.insert(meta.version.clone(), meta);
        }

        let mut dist_tags = BTreeMap::new();
        if let Some(highest) = map.keys().next_back() {
            dist_tags.insert("latest".to_string(), highest.clone());
        }

        Packument {
            name: name.to_string(),
            versions: map,
            time: BTreeMap::new(),
            dist_tags,
        }
    }
}
