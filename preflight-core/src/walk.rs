use crate::fetcher::MetadataFetcher;
use crate::graph::{GraphBuilder, PackageGraph, ResolvedPackage};
use crate::registry::RegistryClient;
use crate::{PreflightConfig, Result};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A name/range pair discovered from a manifest. Refs are transient: they
/// exist only while queued, and only resolved identities reach the graph.
#[derive(Clone, Debug)]
pub struct PackageRef {
    pub name: String,
    pub range: String,
}

impl PackageRef {
    fn new(name: &str, range: &str) -> Self {
        PackageRef {
            name: name.to_string(),
            range: range.to_string(),
        }
    }

    /// Request identity, before resolution. Distinct from the resolved
    /// `name@version` identity the graph dedups on.
    fn request_key(&self) -> String {
        format!("{}::{}", self.name, self.range)
    }
}

#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Maximum simultaneous registry fetches.
    pub concurrency: usize,
}

impl WalkOptions {
    pub fn from_config(config: &PreflightConfig) -> Self {
        WalkOptions {
            concurrency: config.registry_concurrency.max(1),
        }
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions { concurrency: 16 }
    }
}

/// Walk the full transitive dependency graph of `roots`.
///
/// The frontier expands as each package resolves; a request key is
/// dispatched at most once, and resolved identities are deduplicated by the
/// graph builder, which also terminates cycles. The first fetch failure
/// aborts the walk and the partial graph is dropped with the builder.
pub async fn walk<R: RegistryClient>(
    fetcher: &MetadataFetcher<R>,
    roots: &BTreeMap<String, String>,
    options: &WalkOptions,
) -> Result<PackageGraph> {
    walk_with_progress(fetcher, roots, options, |_| {}).await
}

/// Same as [`walk`], invoking `on_resolved` from the coordinating loop each
/// time a new node enters the graph.
pub async fn walk_with_progress<R, F>(
    fetcher: &MetadataFetcher<R>,
    roots: &BTreeMap<String, String>,
    options: &WalkOptions,
    mut on_resolved: F,
) -> Result<PackageGraph>
where
    R: RegistryClient,
    F: FnMut(&ResolvedPackage),
{
    let mut builder = GraphBuilder::new();

    let mut frontier: VecDeque<PackageRef> = roots
        .iter()
        .map(|(name, range)| PackageRef::new(name, range))
        .collect();

    let mut requested: BTreeSet<String> = frontier.iter().map(PackageRef::request_key).collect();

    let mut in_flight = FuturesUnordered::new();

    // Single coordinating loop: every graph and bookkeeping mutation happens
    // between completions, so the dedup checks cannot race.
    while !frontier.is_empty() || !in_flight.is_empty() {
        while in_flight.len() < options.concurrency {
            let Some(next) = frontier.pop_front() else {
                break;
            };

            in_flight.push(async move { fetcher.resolve(&next.name, &next.range).await });
        }

        let Some(result) = in_flight.next().await else {
            break;
        };

        let package = result?;

        if builder.contains(&package.id) {
            // Another ref already resolved to this identity; do not
            // re-expand its dependencies.
            continue;
        }

        for (dep_name, dep_range) in package.dependencies.iter() {
            let dep = PackageRef::new(dep_name, dep_range);
            if requested.insert(dep.request_key()) {
                frontier.push_back(dep);
            }
        }

        on_resolved(&package);
        builder.insert(package);
    }

    Ok(builder.finish())
}
