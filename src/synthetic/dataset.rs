//! Assembly of synthetic datasets.
//!
//! Each graph of a base split is labeled from the node pair at its position in the manifest,
//! graphs without pair are dropped, the relative order of kept graphs is preserved.
//! The position in the manifest is the graph position in the split, there is no hidden counter.

use anyhow::anyhow;

use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::{MolGraph, Split};
use crate::io::csv::GraphSource;

use super::cache::{NodePairCache, NodePairManifest, PairMode};
use super::transform::{label, LabeledGraph};

/// labels graphs with manifest, dropping graphs with no pair.
/// A manifest not fitting the graphs (length or node ranks) is an error.
pub fn assemble<R: Rng>(graphs: &[MolGraph], manifest: &NodePairManifest, rng: &mut R) -> anyhow::Result<SyntheticDataset> {
    if graphs.len() != manifest.len() {
        log::error!("assemble : {} graphs but manifest has {} entries", graphs.len(), manifest.len());
        return Err(anyhow!("manifest length {} does not match split size {}", manifest.len(), graphs.len()));
    }
    for (position, graph) in graphs.iter().enumerate() {
        if let Some(pair) = manifest.get(position) {
            let nb_nodes = graph.get_nb_nodes();
            if pair.first() >= nb_nodes || pair.second() >= nb_nodes {
                log::error!("assemble : pair {:?} at position {} out of range for {} nodes", pair, position, nb_nodes);
                return Err(anyhow!("corrupt node pair cache, pair {:?} at position {} out of range", pair, position));
            }
        }
    }
    let data: Vec<LabeledGraph> = graphs
        .iter()
        .enumerate()
        .filter_map(|(position, graph)| label(graph, manifest.get(position), rng))
        .collect();
    log::debug!("assemble kept {} graphs out of {}", data.len(), graphs.len());
    Ok(SyntheticDataset { data })
} // end of assemble

/// In memory dataset of labeled graphs with stable positions
#[derive(Clone, Debug, Default)]
pub struct SyntheticDataset {
    data: Vec<LabeledGraph>,
}

impl SyntheticDataset {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&LabeledGraph> {
        self.data.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledGraph> {
        self.data.iter()
    }

    /// batches in dataset order, the last one may be smaller
    pub fn batches(&self, batch_size: usize) -> anyhow::Result<impl Iterator<Item = Batch> + '_> {
        if batch_size == 0 {
            return Err(anyhow!("batch size must be positive"));
        }
        Ok(self.data.chunks(batch_size).map(|chunk| Batch::collate(&chunk.iter().collect::<Vec<_>>())))
    }

    /// batches after a shuffle of positions drawn from rng. The dataset itself is not reordered.
    pub fn shuffled_batches<R: Rng>(&self, batch_size: usize, rng: &mut R) -> anyhow::Result<Vec<Batch>> {
        if batch_size == 0 {
            return Err(anyhow!("batch size must be positive"));
        }
        let mut positions: Vec<usize> = (0..self.data.len()).collect();
        positions.shuffle(rng);
        let batches = positions
            .chunks(batch_size)
            .map(|chunk| Batch::collate(&chunk.iter().map(|p| &self.data[*p]).collect::<Vec<_>>()))
            .collect();
        Ok(batches)
    }
} // end of impl SyntheticDataset

/// Graphs of a batch merged in one disconnected graph, as consumed by message passing models.
#[derive(Clone, Debug)]
pub struct Batch {
    /// node features of all graphs, stacked
    pub x: Array2<f32>,
    /// directed edges (both orientations) with node ranks shifted by graph offsets
    pub edge_index: Vec<(usize, usize)>,
    /// for each node the rank of its graph in the batch
    pub batch: Vec<usize>,
    /// graph targets
    pub y: Array1<f32>,
} // end of Batch

impl Batch {
    pub fn collate(graphs: &[&LabeledGraph]) -> Self {
        let nb_nodes: usize = graphs.iter().map(|g| g.get_graph().get_nb_nodes()).sum();
        let nb_features = graphs.iter().map(|g| g.get_features().ncols()).max().unwrap_or(1);
        let mut x = Array2::<f32>::zeros((nb_nodes, nb_features));
        let mut edge_index = Vec::<(usize, usize)>::new();
        let mut batch = Vec::<usize>::with_capacity(nb_nodes);
        let mut offset = 0;
        for (rank, labeled) in graphs.iter().enumerate() {
            let features = labeled.get_features();
            let (n, width) = features.dim();
            x.slice_mut(ndarray::s![offset..offset + n, 0..width]).assign(features);
            for &(i, j) in labeled.get_graph().get_edges() {
                edge_index.push((offset + i, offset + j));
                edge_index.push((offset + j, offset + i));
            }
            batch.extend(std::iter::repeat(rank).take(n));
            offset += n;
        }
        let y = graphs.iter().map(|g| g.get_target()).collect::<Array1<f32>>();
        Batch { x, edge_index, batch, y }
    } // end of collate

    /// number of graphs in batch
    pub fn get_nb_graphs(&self) -> usize {
        self.y.len()
    }
} // end of impl Batch

/// The three splits of a synthetic ZINC dataset (SyntheticZINC_SD or SyntheticZINC_CT according to mode)
pub struct SyntheticZinc {
    pub train: SyntheticDataset,
    pub val: SyntheticDataset,
    pub test: SyntheticDataset,
    mode: PairMode,
}

impl SyntheticZinc {
    /// graph regression
    pub const TASK_NAME: &'static str = "graph-r";
    /// one scalar feature per node
    pub const NUM_FEATURES: usize = 1;
    /// one scalar target
    pub const NUM_CLASSES: usize = 1;

    /// builds train, val, test in that order. Node pairs come from cache (computed on a miss),
    /// labels are drawn from rng.
    pub fn build<R: Rng>(source: &dyn GraphSource, cache: &NodePairCache, mode: PairMode, rng: &mut R) -> anyhow::Result<Self> {
        let mut datasets = Vec::<SyntheticDataset>::with_capacity(3);
        for split in Split::ALL {
            let manifest = cache.get_or_compute(source, split, &mode, rng)?;
            let graphs = source.load_split(split)?;
            let dataset = assemble(&graphs, &manifest, rng)?;
            log::info!(
                "SyntheticZinc {} split {} : {} graphs kept out of {}",
                mode.get_tag(),
                split,
                dataset.len(),
                graphs.len()
            );
            datasets.push(dataset);
        }
        let test = datasets.pop().unwrap_or_default();
        let val = datasets.pop().unwrap_or_default();
        let train = datasets.pop().unwrap_or_default();
        Ok(SyntheticZinc { train, val, test, mode })
    } // end of build

    /// dataset name as used in results directories
    pub fn get_name(&self) -> &'static str {
        match self.mode {
            PairMode::ShortestDistance(_) => "SyntheticZINC_SD",
            PairMode::CommuteTime(_) => "SyntheticZINC_CT",
        }
    }

    pub fn get_mode(&self) -> PairMode {
        self.mode
    }
} // end of impl SyntheticZinc

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use crate::io::csv::InMemorySource;
    use crate::synthetic::sampler::NodePair;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn path_graph(n: usize) -> MolGraph {
        let edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        MolGraph::new(n, 1, &edges).unwrap()
    }

    #[test]
    fn absent_are_dropped_in_order() {
        log_init_test();
        let graphs = vec![path_graph(2), path_graph(3), path_graph(4), path_graph(5)];
        let manifest = NodePairManifest::new(vec![Some(NodePair(0, 1)), None, Some(NodePair(3, 0)), Some(NodePair(1, 4))]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let dataset = assemble(&graphs, &manifest, &mut rng).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.get(0).unwrap().get_graph().get_nb_nodes(), 2);
        assert_eq!(dataset.get(1).unwrap().get_graph().get_nb_nodes(), 4);
        assert_eq!(dataset.get(1).unwrap().get_pair(), NodePair(3, 0));
        assert_eq!(dataset.get(2).unwrap().get_graph().get_nb_nodes(), 5);
        assert!(dataset.get(3).is_none());
        // length mismatch is an error
        let short = NodePairManifest::new(vec![None]);
        assert!(assemble(&graphs, &short, &mut rng).is_err());
        // node rank beyond the graph is an error
        let beyond = NodePairManifest::new(vec![None, None, Some(NodePair(0, 4)), None]);
        assert!(assemble(&graphs, &beyond, &mut rng).is_err());
    }

    #[test]
    fn cached_pairs_out_of_range() {
        log_init_test();
        let root = std::env::temp_dir().join(format!("graphdrop-zinc-range-{}", std::process::id()));
        let source = InMemorySource::new("ZINC").with_split(Split::Train, vec![path_graph(3)]);
        let cache = NodePairCache::new(&root);
        let mode = PairMode::shortest_distance(1).unwrap();
        // right length, node 7 does not exist in a 3 nodes graph
        let stale = NodePairManifest::new(vec![Some(NodePair(0, 7))]);
        cache.store(Split::Train, &mode, &stale).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let res = SyntheticZinc::build(&source, &cache, mode, &mut rng);
        assert!(res.is_err());
        assert!(format!("{:#}", res.err().unwrap()).contains("corrupt node pair cache"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn batches_collate() {
        log_init_test();
        let graphs = vec![path_graph(2), path_graph(3), path_graph(4)];
        let manifest = NodePairManifest::new(vec![Some(NodePair(0, 1)), Some(NodePair(0, 2)), Some(NodePair(1, 3))]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(12);
        let dataset = assemble(&graphs, &manifest, &mut rng).unwrap();
        let batches: Vec<Batch> = dataset.batches(2).unwrap().collect();
        assert_eq!(batches.len(), 2);
        let first = &batches[0];
        assert_eq!(first.get_nb_graphs(), 2);
        assert_eq!(first.x.dim(), (5, 1));
        assert_eq!(first.batch, vec![0, 0, 1, 1, 1]);
        // 1 edge + 2 edges, both orientations
        assert_eq!(first.edge_index.len(), 6);
        assert!(first.edge_index.contains(&(2, 3)) && first.edge_index.contains(&(4, 3)));
        assert_eq!(first.y[1], dataset.get(1).unwrap().get_target());
        assert_eq!(first.x[[2, 0]], dataset.get(1).unwrap().get_features()[[0, 0]]);
        //
        let shuffled = dataset.shuffled_batches(2, &mut rng).unwrap();
        let total: usize = shuffled.iter().map(|b| b.get_nb_graphs()).sum();
        assert_eq!(total, 3);
        assert!(dataset.batches(0).is_err());
        assert!(dataset.shuffled_batches(0, &mut rng).is_err());
    }

    #[test]
    fn build_three_splits() {
        log_init_test();
        let root = std::env::temp_dir().join(format!("graphdrop-zinc-{}", std::process::id()));
        let source = InMemorySource::new("ZINC")
            .with_split(Split::Train, vec![path_graph(3), path_graph(6), path_graph(5)])
            .with_split(Split::Val, vec![path_graph(2), path_graph(7)])
            .with_split(Split::Test, vec![path_graph(4)]);
        let cache = NodePairCache::new(&root);
        let mode = PairMode::shortest_distance(3).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
        let zinc = SyntheticZinc::build(&source, &cache, mode, &mut rng).unwrap();
        assert_eq!(zinc.get_name(), "SyntheticZINC_SD");
        assert_eq!(zinc.train.len(), 2);
        assert_eq!(zinc.val.len(), 1);
        assert_eq!(zinc.test.len(), 1);
        for labeled in zinc.train.iter() {
            let pair = labeled.get_pair();
            assert_eq!((pair.0 as i64 - pair.1 as i64).abs(), 3);
        }
        // second build reuses cache : same pairs
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let again = SyntheticZinc::build(&source, &cache, mode, &mut rng).unwrap();
        let pairs: Vec<NodePair> = zinc.train.iter().map(|g| g.get_pair()).collect();
        let pairs_again: Vec<NodePair> = again.train.iter().map(|g| g.get_pair()).collect();
        assert_eq!(pairs, pairs_again);
        let _ = std::fs::remove_dir_all(&root);
    }
} // end of mod tests
