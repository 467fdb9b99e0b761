//! Cache of node pair manifests.
//!
//! A manifest gives, for each graph of a split (in the split order), the node pair selected by sampling or None.
//! Manifests are stored under
//! - `<root>/node-pairs-sd/distance=<d>/<split>.bson` for exact hop distance d
//! - `<root>/node-pairs-ct/alpha=<a>/<split>.bson` for commute time quantile a
//!
//! The cache is always consulted before any computation. On a miss, distances and matches are computed
//! in parallel over graphs, then pairs are drawn sequentially in split order from the caller random stream.

use anyhow::anyhow;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use cpu_time::ProcessTime;
use rand::Rng;
use rayon::prelude::*;

use crate::graph::distance::{commute_times, shortest_distances};
use crate::graph::{MolGraph, Split};
use crate::io::bson::{bson_dump_manifest, bson_load_manifest, ManifestBsonHeader};
use crate::io::csv::GraphSource;

use super::sampler::{choose_pair, matches_at_distance, matches_at_quantile, NodePair};

/// how node pairs are selected
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PairMode {
    /// pairs at exact hop distance
    ShortestDistance(usize),
    /// pairs at nearest rank quantile alpha of commute times
    CommuteTime(f64),
} // end of PairMode

impl PairMode {
    /// exact hop distance mode, distance must be at least 1
    pub fn shortest_distance(distance: usize) -> anyhow::Result<Self> {
        if distance == 0 {
            return Err(anyhow!("distance must be at least 1 to get pairs of distinct nodes"));
        }
        Ok(PairMode::ShortestDistance(distance))
    }

    /// commute time quantile mode, alpha must be in [0,1]
    pub fn commute_time(alpha: f64) -> anyhow::Result<Self> {
        if !(0. ..=1.).contains(&alpha) {
            return Err(anyhow!("quantile alpha must be in [0,1], got {}", alpha));
        }
        Ok(PairMode::CommuteTime(alpha))
    }

    /// "sd" or "ct"
    pub fn get_tag(&self) -> &'static str {
        match self {
            PairMode::ShortestDistance(_) => "sd",
            PairMode::CommuteTime(_) => "ct",
        }
    }

    /// parameter as written in paths. Floats use the shortest representation that round trips,
    /// with a trailing .0 for integral values (0.1, 0.5, 1.0)
    pub fn get_parameter(&self) -> String {
        match self {
            PairMode::ShortestDistance(distance) => format!("{}", distance),
            PairMode::CommuteTime(alpha) => format!("{:?}", alpha),
        }
    }

    /// directory relative to cache root : node-pairs-sd/distance=4 or node-pairs-ct/alpha=0.5
    pub fn get_relative_dir(&self) -> PathBuf {
        let sub = match self {
            PairMode::ShortestDistance(_) => format!("distance={}", self.get_parameter()),
            PairMode::CommuteTime(_) => format!("alpha={}", self.get_parameter()),
        };
        Path::new(&format!("node-pairs-{}", self.get_tag())).join(sub)
    }

    /// checks the parameter, as variants can be built without the constructors
    pub fn check(&self) -> anyhow::Result<()> {
        match *self {
            PairMode::ShortestDistance(distance) => PairMode::shortest_distance(distance).map(|_| ()),
            PairMode::CommuteTime(alpha) => PairMode::commute_time(alpha).map(|_| ()),
        }
    }

    /// candidate pairs of a graph. The choice among them is done by the caller.
    pub fn get_matches(&self, graph: &MolGraph) -> anyhow::Result<Vec<(usize, usize)>> {
        self.check()?;
        match self {
            PairMode::ShortestDistance(distance) => Ok(matches_at_distance(&shortest_distances(graph), *distance)),
            PairMode::CommuteTime(alpha) => Ok(matches_at_quantile(&commute_times(graph)?, *alpha)),
        }
    }
} // end of impl PairMode

/// The sequence of node pairs (or absence) of a split, one entry per graph in split order
#[derive(Clone, Debug, PartialEq)]
pub struct NodePairManifest {
    pairs: Vec<Option<NodePair>>,
}

impl NodePairManifest {
    pub fn new(pairs: Vec<Option<NodePair>>) -> Self {
        NodePairManifest { pairs }
    }

    /// number of entries (graphs of the split)
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// entry at position idx
    pub fn get(&self, idx: usize) -> Option<NodePair> {
        self.pairs.get(idx).copied().flatten()
    }

    pub fn get_pairs(&self) -> &[Option<NodePair>] {
        &self.pairs
    }

    /// number of graphs without pair
    pub fn get_nb_absent(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_none()).count()
    }
} // end of impl NodePairManifest

/// computes the manifest of graphs. Matches are computed in parallel, choices are sequential.
pub fn compute_manifest<R: Rng>(graphs: &[MolGraph], mode: &PairMode, rng: &mut R) -> anyhow::Result<NodePairManifest> {
    let matches: Vec<Vec<(usize, usize)>> = graphs
        .par_iter()
        .map(|graph| mode.get_matches(graph))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let pairs = matches.iter().map(|m| choose_pair(m, rng)).collect();
    Ok(NodePairManifest::new(pairs))
} // end of compute_manifest

/// manifests stored under a root directory
pub struct NodePairCache {
    root: PathBuf,
}

impl NodePairCache {
    pub fn new(root: &Path) -> Self {
        NodePairCache { root: root.to_path_buf() }
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// path of the manifest of split for mode
    pub fn manifest_path(&self, split: Split, mode: &PairMode) -> PathBuf {
        self.root.join(mode.get_relative_dir()).join(format!("{}.bson", split.as_str()))
    }

    /// reload manifest if present, None if not in cache
    pub fn load(&self, split: Split, mode: &PairMode) -> anyhow::Result<Option<NodePairManifest>> {
        let path = self.manifest_path(split, mode);
        if !path.is_file() {
            return Ok(None);
        }
        let (header, pairs) = bson_load_manifest(&path)?;
        if header.mode != mode.get_tag() || header.parameter != mode.get_parameter() || header.split != split.as_str() {
            log::error!("manifest {} has header {:?}", path.display(), header);
            return Err(anyhow!("manifest {} does not match its cache key", path.display()));
        }
        Ok(Some(NodePairManifest::new(pairs)))
    }

    /// dump manifest
    pub fn store(&self, split: Split, mode: &PairMode, manifest: &NodePairManifest) -> anyhow::Result<()> {
        let path = self.manifest_path(split, mode);
        let header = ManifestBsonHeader::new(mode.get_tag(), &mode.get_parameter(), split.as_str(), manifest.len());
        bson_dump_manifest(&header, manifest.get_pairs(), &path)
    }

    /// returns the manifest of split from cache, computing and storing it on a miss.
    pub fn get_or_compute<R: Rng>(
        &self,
        source: &dyn GraphSource,
        split: Split,
        mode: &PairMode,
        rng: &mut R,
    ) -> anyhow::Result<NodePairManifest> {
        if let Some(manifest) = self.load(split, mode)? {
            let nb_graphs = source.load_split(split)?.len();
            if manifest.len() != nb_graphs {
                log::error!(
                    "manifest {} has {} entries, split {} has {} graphs",
                    self.manifest_path(split, mode).display(),
                    manifest.len(),
                    split,
                    nb_graphs
                );
                return Err(anyhow!("corrupt node pair cache for split {}", split));
            }
            log::info!(
                "node pairs of {} split {} reloaded from {}",
                source.get_name(),
                split,
                self.manifest_path(split, mode).display()
            );
            return Ok(manifest);
        }
        log::info!("computing node pairs of {} split {} mode {:?}", source.get_name(), split, mode);
        let cpu_start = ProcessTime::now();
        let sys_start = SystemTime::now();
        //
        let graphs = source.load_split(split)?;
        let manifest = compute_manifest(&graphs, mode, rng)?;
        log::info!(
            "node pairs computed sys time(s) {:.2e} cpu time(s) {:.2e}, {} graphs, {} without pair",
            sys_start.elapsed().map(|d| d.as_secs_f64()).unwrap_or(0.),
            cpu_start.elapsed().as_secs_f64(),
            manifest.len(),
            manifest.get_nb_absent()
        );
        self.store(split, mode, &manifest)?;
        Ok(manifest)
    } // end of get_or_compute
} // end of impl NodePairCache

//========================================================================================

// end of mod tests
