use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;

/// Resolved identity of a package: concrete name and version.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// One resolved package. Constructed by the fetcher and never mutated
/// afterwards.
#[derive(Clone, Debug)]
pub struct ResolvedPackage {
    pub id: PackageId,
    pub license: String,
    pub size_bytes: u64,
    pub modified_at: Option<OffsetDateTime>,
    pub dependencies: BTreeMap<String, String>,
}

/// Deduplicated dependency graph keyed by resolved identity.
#[derive(Clone, Debug, Default)]
pub struct PackageGraph {
    pub packages: BTreeMap<PackageId, ResolvedPackage>,
}

impl PackageGraph {
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.packages.contains_key(id)
    }

    pub fn get(&self, id: &PackageId) -> Option<&ResolvedPackage> {
        self.packages.get(id)
    }
}

/// Owns the graph while a walk is in progress. Every insertion goes through
/// `insert`, which applies dedup by resolved identity; dropping the builder
/// discards the partial graph.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: PackageGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        GraphBuilder::default()
    }

    /// Returns false when `name@version` is already present; the caller must
    /// not expand the duplicate's dependencies.
    pub fn insert(&mut self, package: ResolvedPackage) -> bool {
        if self.graph.packages.contains_key(&package.id) {
            return false;
        }

        self.graph.packages.insert(package.id.clone(), package);
        true
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.graph.contains(id)
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn finish(self) -> PackageGraph {
        self.graph
    }
}
