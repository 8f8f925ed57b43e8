use crate::graph::{PackageGraph, PackageId};
use crate::stats::{self, GraphStats};

/// What a candidate install adds on top of a baseline graph: the packages
/// not already reachable from the project's existing dependencies, with
/// stats aggregated over only those.
#[derive(Clone, Debug)]
pub struct ImpactReport {
    pub new_packages: Vec<PackageId>,
    pub stats: GraphStats,
}

pub fn impact(candidate: &PackageGraph, baseline: &PackageGraph) -> ImpactReport {
    let mut added = PackageGraph::default();

    for (id, package) in candidate.packages.iter() {
        if !baseline.contains(id) {
            added.packages.insert(id.clone(), package.clone());
        }
    }

    ImpactReport {
        new_packages: added.packages.keys().cloned().collect(),
        stats: stats::aggregate(&added),
    }
}
