//! Load base dataset splits (molecules as small graphs) from a csv export.
//!
//! For each split there are 2 files in the directory :
//! - `<split>_nodes.csv` with header `graph,num_nodes,num_features`, one record by graph, graphs numbered 0..G-1 in order.
//! - `<split>_edges.csv` with header `graph,source,target`, the edge_index of each graph (both orientations can be present).
//!
//! A graph with no record in the edge file has no edge.

use anyhow::{anyhow, Context};

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::graph::{MolGraph, Split};

/// The source of base graphs, split by split. Instances are returned in a fixed order,
/// which is the order node pair manifests are indexed by.
pub trait GraphSource {
    /// a name for logs
    fn get_name(&self) -> &str;
    /// returns all graphs of a split in their fixed order
    fn load_split(&self, split: Split) -> anyhow::Result<Vec<MolGraph>>;
} // end of trait GraphSource

#[derive(Debug, Deserialize)]
struct NodeRecord {
    graph: usize,
    num_nodes: usize,
    num_features: usize,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    graph: usize,
    source: usize,
    target: usize,
}

/// graphs stored as csv files in a directory
pub struct CsvGraphSource {
    name: String,
    dir: PathBuf,
    /// already loaded splits
    loaded: Mutex<HashMap<Split, Vec<MolGraph>>>,
} // end of CsvGraphSource

impl CsvGraphSource {
    pub fn new(name: &str, dir: &Path) -> Self {
        CsvGraphSource {
            name: String::from(name),
            dir: dir.to_path_buf(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// path of node file of a split
    pub fn get_nodes_path(&self, split: Split) -> PathBuf {
        self.dir.join(format!("{}_nodes.csv", split.as_str()))
    }

    /// path of edge file of a split
    pub fn get_edges_path(&self, split: Split) -> PathBuf {
        self.dir.join(format!("{}_edges.csv", split.as_str()))
    }

    fn read_split(&self, split: Split) -> anyhow::Result<Vec<MolGraph>> {
        let nodes_path = self.get_nodes_path(split);
        log::info!("CsvGraphSource {} reading {:?}", self.name, nodes_path);
        let file = OpenOptions::new().read(true).open(&nodes_path).map_err(|e| {
            log::error!("CsvGraphSource could not open file {:?}", nodes_path.as_os_str());
            anyhow!("could not open file {:?} : {}", nodes_path, e)
        })?;
        let mut rdr = ReaderBuilder::new().flexible(false).from_reader(file);
        let mut shapes = Vec::<(usize, usize)>::new();
        for result in rdr.deserialize() {
            let record: NodeRecord = result.with_context(|| format!("bad record in {:?}", nodes_path))?;
            if record.graph != shapes.len() {
                return Err(anyhow!(
                    "graphs must be numbered in order in {:?}, expected {} got {}",
                    nodes_path,
                    shapes.len(),
                    record.graph
                ));
            }
            shapes.push((record.num_nodes, record.num_features));
        }
        //
        let edges_path = self.get_edges_path(split);
        let mut edge_index = vec![Vec::<(usize, usize)>::new(); shapes.len()];
        if edges_path.exists() {
            let file = OpenOptions::new()
                .read(true)
                .open(&edges_path)
                .with_context(|| format!("could not open file {:?}", edges_path))?;
            let mut rdr = ReaderBuilder::new().flexible(false).from_reader(file);
            for result in rdr.deserialize() {
                let record: EdgeRecord = result.with_context(|| format!("bad record in {:?}", edges_path))?;
                if record.graph >= shapes.len() {
                    return Err(anyhow!("edge of unknown graph {} in {:?}", record.graph, edges_path));
                }
                edge_index[record.graph].push((record.source, record.target));
            }
        } else {
            log::warn!("no edge file {:?}, graphs of split {} have no edges", edges_path, split);
        }
        //
        let mut graphs = Vec::<MolGraph>::with_capacity(shapes.len());
        for (g, &(nb_nodes, nb_features)) in shapes.iter().enumerate() {
            let graph = MolGraph::new(nb_nodes, nb_features, &edge_index[g])
                .with_context(|| format!("graph {} of split {}", g, split))?;
            graphs.push(graph);
        }
        log::info!("CsvGraphSource {} split {} : {} graphs", self.name, split, graphs.len());
        Ok(graphs)
    } // end of read_split
} // end of impl CsvGraphSource

impl GraphSource for CsvGraphSource {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn load_split(&self, split: Split) -> anyhow::Result<Vec<MolGraph>> {
        let mut loaded = self.loaded.lock();
        if let Some(graphs) = loaded.get(&split) {
            return Ok(graphs.clone());
        }
        let graphs = self.read_split(split)?;
        loaded.insert(split, graphs.clone());
        Ok(graphs)
    }
} // end of impl GraphSource for CsvGraphSource

/// graphs given in memory, useful for tests and for sources produced by other tools
pub struct InMemorySource {
    name: String,
    splits: HashMap<Split, Vec<MolGraph>>,
}

impl InMemorySource {
    pub fn new(name: &str) -> Self {
        InMemorySource {
            name: String::from(name),
            splits: HashMap::new(),
        }
    }

    /// set the graphs of a split
    pub fn with_split(mut self, split: Split, graphs: Vec<MolGraph>) -> Self {
        self.splits.insert(split, graphs);
        self
    }
} // end of impl InMemorySource

impl GraphSource for InMemorySource {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn load_split(&self, split: Split) -> anyhow::Result<Vec<MolGraph>> {
        self.splits
            .get(&split)
            .cloned()
            .ok_or_else(|| anyhow!("source {} has no split {}", self.name, split))
    }
} // end of impl GraphSource for InMemorySource

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn load_csv_split() {
        log_init_test();
        let dir = std::env::temp_dir().join(format!("graphdrop-csv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("train_nodes.csv"),
            "graph,num_nodes,num_features\n0,3,1\n1,2,1\n2,1,1\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("train_edges.csv"),
            "graph,source,target\n0,0,1\n0,1,0\n0,1,2\n0,2,1\n1,0,1\n1,1,0\n",
        )
        .unwrap();
        let source = CsvGraphSource::new("ZINC", &dir);
        let graphs = source.load_split(Split::Train).unwrap();
        assert_eq!(graphs.len(), 3);
        assert_eq!(graphs[0].get_nb_nodes(), 3);
        assert_eq!(graphs[0].get_nb_edges(), 2);
        assert_eq!(graphs[1].get_nb_edges(), 1);
        assert_eq!(graphs[2].get_nb_edges(), 0);
        // second load comes from memory
        assert_eq!(source.load_split(Split::Train).unwrap(), graphs);
        // missing split
        assert!(source.load_split(Split::Test).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unordered_graphs_rejected() {
        log_init_test();
        let dir = std::env::temp_dir().join(format!("graphdrop-csv-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("val_nodes.csv"), "graph,num_nodes,num_features\n1,3,1\n").unwrap();
        let source = CsvGraphSource::new("ZINC", &dir);
        assert!(source.load_split(Split::Val).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
} // end of mod tests
