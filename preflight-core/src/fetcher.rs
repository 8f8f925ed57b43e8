use crate::console;
use crate::graph::{PackageId, ResolvedPackage};
use crate::license;
use crate::registry::RegistryClient;
use crate::registry::types::{Packument, VersionMetadata};
use crate::{PreflightConfig, PreflightError, Result};
use futures::lock::Mutex;
use preflight_semver::RangeSet;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Bounded exponential backoff for transient registry failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PreflightConfig) -> Self {
        RetryPolicy {
            attempts: config.fetch_retries.max(1),
            base_delay: config.retry_base_delay,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

/// Resolves one name/range pair to a concrete package record. Packuments
/// are memoized per name for the lifetime of the fetcher, so the many
/// ranges pointing at one package cost one registry read.
pub struct MetadataFetcher<R> {
    registry: R,
    retry: RetryPolicy,
    memo: Mutex<BTreeMap<String, Arc<Packument>>>,
}

impl<R: RegistryClient> MetadataFetcher<R> {
    pub fn new(registry: R, retry: RetryPolicy) -> Self {
        MetadataFetcher {
            registry,
            retry,
            memo: Mutex::new(BTreeMap::new()),
        }
    }

    /// Resolve `range` (exact version, semver range, or dist-tag) against
    /// the registry, picking the highest satisfying version.
    pub async fn resolve(&self, name: &str, range: &str) -> Result<ResolvedPackage> {
        let packument = self.packument(name).await?;
        let meta = select_version(name, range, &packument)?;
        Ok(build_resolved(name, &packument, meta))
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &R {
        &self.registry
    }

    async fn packument(&self, name: &str) -> Result<Arc<Packument>> {
        {
            let memo = self.memo.lock().await;
            if let Some(packument) = memo.get(name) {
                return Ok(packument.clone());
            }
        }

        let mut attempt = 0u32;

        let packument = loop {
            attempt += 1;

            match self.registry.packument(name).await {
                Ok(packument) => break packument,
                Err(err) if err.is_transient() && attempt < self.retry.attempts => {
                    let delay = self.retry.delay(attempt);
                    console::verbose(&format!(
                        "retrying {} after transient failure (attempt {}/{}): {}",
                        name, attempt, self.retry.attempts, err
                    ));
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        };

        let packument = Arc::new(packument);
        self.memo
            .lock()
            .await
            .insert(name.to_string(), packument.clone());

        Ok(packument)
    }
}

/// Dist-tags win over range parsing, so `latest` (and any other tag) maps
/// through the packument's tag table first.
fn select_version<'a>(
    name: &str,
    range: &str,
    packument: &'a Packument,
) -> Result<&'a VersionMetadata> {
    let trimmed = range.trim();

    if let Some(tagged) = packument.dist_tags.get(trimmed)
        && let Some(meta) = packument.versions.get(tagged)
    {
        return Ok(meta);
    }

    let ranges = RangeSet::parse(trimmed).map_err(|err| PreflightError::Semver {
        value: format!("{}@{}", name, range),
        reason: err.to_string(),
    })?;

    let best = ranges.max_satisfying(packument.versions.keys().map(String::as_str));

    match best.and_then(|version| packument.versions.get(version)) {
        Some(meta) => Ok(meta),
        None => Err(PreflightError::PackageNotFound {
            spec: format!("{}@{}", name, range),
            reason: "no published version satisfies the requested range".to_string(),
        }),
    }
}

fn build_resolved(name: &str, packument: &Packument, meta: &VersionMetadata) -> ResolvedPackage {
    let modified_at = packument
        .published_at(&meta.version)
        .or_else(|| packument.published_at("modified"))
        .and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok());

    ResolvedPackage {
        id: PackageId {
            name: name.to_string(),
            version: meta.version.clone(),
        },
        license: license::normalize(meta),
        size_bytes: meta.dist.unpacked_size.unwrap_or(0),
        modified_at,
        dependencies: meta.dependencies.clone(),
    }
}
