//! module to do bson io for node pair manifests
//!
//!  Data are formatted in bson Documents written one after the other in the file.
//!
//! 1. A header document with key "header". See struct [ManifestBsonHeader]
//! - a version index
//! - mode ("sd" for shortest distance, "ct" for commute time) and its parameter as a string
//! - split name
//! - number of pairs and number of chunk documents following
//!
//! 2. Chunk documents, key "pairs", each an array of at most [CHUNK_SIZE] entries.
//!    An entry is either Null (no pair for the graph at this position) or an array of 2 i64 node ranks.
//!    **bson requires usize to be encoded as i64.**
//!
//! The file is first written in a temporary file in the same directory, synced and then renamed
//! so a reader never sees a truncated manifest.

// Note : a Bson document must not be larger than 16Mb!
// So we need to have many Documents in the file dumped

use anyhow::{anyhow, Context};

use std::fs::OpenOptions;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::synthetic::sampler::NodePair;

/// current version of dump format
pub const MANIFEST_VERSION: i64 = 1;

/// maximum number of pairs in one document
pub const CHUNK_SIZE: usize = 10_000;

/// This structure defines the header of the bson manifest file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestBsonHeader {
    /// version of dump format
    pub version: i64,
    /// "sd" or "ct"
    pub mode: String,
    /// parameter of mode as written in cache directory name
    pub parameter: String,
    /// split name
    pub split: String,
    /// number of entries
    pub nb_pairs: i64,
    /// number of chunk documents
    pub nb_chunks: i64,
} // end of ManifestBsonHeader

impl ManifestBsonHeader {
    pub fn new(mode: &str, parameter: &str, split: &str, nb_pairs: usize) -> Self {
        let nb_chunks = (nb_pairs + CHUNK_SIZE - 1) / CHUNK_SIZE;
        ManifestBsonHeader {
            version: MANIFEST_VERSION,
            mode: String::from(mode),
            parameter: String::from(parameter),
            split: String::from(split),
            nb_pairs: nb_pairs as i64,
            nb_chunks: nb_chunks as i64,
        }
    }
} // end of impl ManifestBsonHeader

fn pair_to_bson(pair: &Option<NodePair>) -> Bson {
    match pair {
        Some(pair) => Bson::Array(vec![Bson::Int64(pair.0 as i64), Bson::Int64(pair.1 as i64)]),
        None => Bson::Null,
    }
}

fn bson_to_pair(value: &Bson) -> anyhow::Result<Option<NodePair>> {
    match value {
        Bson::Null => Ok(None),
        Bson::Array(ranks) if ranks.len() == 2 => {
            let mut decoded = [0usize; 2];
            for (k, rank) in ranks.iter().enumerate() {
                decoded[k] = match rank {
                    Bson::Int64(r) if *r >= 0 => *r as usize,
                    Bson::Int32(r) if *r >= 0 => *r as usize,
                    _ => return Err(anyhow!("bad node rank in manifest : {:?}", rank)),
                };
            }
            Ok(Some(NodePair(decoded[0], decoded[1])))
        }
        _ => Err(anyhow!("bad manifest entry : {:?}", value)),
    }
} // end of bson_to_pair

/// dump pairs in path, atomically.
pub fn bson_dump_manifest(header: &ManifestBsonHeader, pairs: &[Option<NodePair>], path: &Path) -> anyhow::Result<()> {
    log::debug!("entering bson_dump_manifest {}", path.display());
    //
    let dir = path.parent().ok_or_else(|| anyhow!("no parent directory for {}", path.display()))?;
    std::fs::create_dir_all(dir).with_context(|| format!("could not create directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("no file name in {}", path.display()))?
        .to_string_lossy();
    let tmp_path = dir.join(format!(".{}.tmp-{}", file_name, std::process::id()));
    //
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(|e| {
            log::error!("could not open file : {}", tmp_path.display());
            anyhow!("could not open file : {} , {}", tmp_path.display(), e)
        })?;
    let mut bufwriter = BufWriter::new(file);
    let mut doc = Document::new();
    doc.insert("header", bson::to_bson(header)?);
    doc.to_writer(&mut bufwriter).map_err(|e| {
        log::error!("dump of bson header failed in {}", tmp_path.display());
        anyhow!("dump of bson failed: {}", e)
    })?;
    for (num, chunk) in pairs.chunks(CHUNK_SIZE).enumerate() {
        let mut doc = Document::new();
        let data: Vec<Bson> = chunk.iter().map(pair_to_bson).collect();
        doc.insert("pairs", data);
        doc.to_writer(&mut bufwriter).map_err(|e| {
            log::error!("bson dump error in chunk {num}");
            anyhow!("bson dump error for chunk {num} {}", e)
        })?;
    }
    bufwriter.flush()?;
    let file = bufwriter.into_inner().map_err(|e| anyhow!("could not flush {} : {}", tmp_path.display(), e))?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path).with_context(|| format!("could not rename {} to {}", tmp_path.display(), path.display()))?;
    //
    log::info!("bson dump of {} pairs in file {} finished", pairs.len(), path.display());
    Ok(())
} // end of bson_dump_manifest

/// reload header and pairs from path
pub fn bson_load_manifest(path: &Path) -> anyhow::Result<(ManifestBsonHeader, Vec<Option<NodePair>>)> {
    log::debug!("entering bson_load_manifest, file name : {:?}", path);
    let file = OpenOptions::new().read(true).open(path).map_err(|e| {
        log::error!("reload of bson manifest failed");
        anyhow!("reload failed: {}", e)
    })?;
    let mut bufreader = BufReader::new(file);
    let doc = Document::from_reader(&mut bufreader).map_err(|e| {
        log::error!("could not load document from file {}", path.display());
        anyhow!(e)
    })?;
    let bson_header = doc
        .get("header")
        .ok_or_else(|| anyhow!("could not find header in document of {}", path.display()))?
        .clone();
    let header: ManifestBsonHeader = bson::from_bson(bson_header)?;
    log::debug!("header : {:?}", header);
    if header.version != MANIFEST_VERSION {
        log::error!("header format version : {}", header.version);
        return Err(anyhow!("format version error, inconsistent with header"));
    }
    //
    let nb_pairs = usize::try_from(header.nb_pairs).map_err(|_| anyhow!("bad number of pairs {}", header.nb_pairs))?;
    let mut pairs = Vec::<Option<NodePair>>::with_capacity(nb_pairs);
    for num in 0..header.nb_chunks {
        let doc = Document::from_reader(&mut bufreader).map_err(|e| {
            log::error!("could not load chunk {num} from file {}", path.display());
            anyhow!(e)
        })?;
        let chunk = doc
            .get_array("pairs")
            .map_err(|e| anyhow!("could not get pairs of chunk {num} : {}", e))?;
        for value in chunk {
            pairs.push(bson_to_pair(value)?);
        }
    }
    if pairs.len() != nb_pairs {
        log::error!("manifest {} announces {} pairs, got {}", path.display(), nb_pairs, pairs.len());
        return Err(anyhow!("truncated manifest {}", path.display()));
    }
    Ok((header, pairs))
} // end of bson_load_manifest

//========================================================================================

// end of mod tests
