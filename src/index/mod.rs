//! The on-disk anytime index
//!
//! An index directory holds two files: `index.cbor` with the primary key
//! table and the vocabulary, and `postings.dat`, one contiguous blob of
//! impact-ordered postings segments. Each vocabulary entry points at the
//! segments of one term, highest impact first; each segment is a
//! delta-encoded, compressed run of the document ids sharing one
//! quantised impact. The first byte of the blob names the codec family
//! the index was written with.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::base::DocId;
use crate::codec::{self, Codec};
use crate::errors::Error;
use crate::utils::buffer::{Buffer, MemoryBuffer, MmapBuffer};

pub const INDEX_CBOR: &str = "index.cbor";
pub const POSTINGS_DAT: &str = "postings.dat";

/// One impact segment of a term's postings
#[derive(Serialize, Deserialize, Clone)]
pub struct SegmentInformation {
    /// The quantised impact shared by every posting in the segment
    pub impact: u32,

    /// Number of document ids
    pub length: usize,

    /// Position within the postings blob
    pub position_range: (u64, u64),
}

/// Vocabulary entry: where a term's postings live
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct TermInformation {
    /// Segments in decreasing impact order
    pub segments: Vec<SegmentInformation>,

    /// Maximum impact over all segments
    pub max_impact: u32,

    /// Total number of postings
    pub length: usize,
}

/// Everything `index.cbor` stores
#[derive(Serialize, Deserialize)]
struct IndexInformation {
    primary_keys: Vec<String>,
    terms: HashMap<String, TermInformation>,
}

/// A loaded index: metadata in memory, postings resident or memory-mapped
pub struct AnytimeIndex {
    terms: HashMap<String, TermInformation>,
    primary_keys: Arc<Vec<String>>,
    postings: Box<dyn Buffer>,
}

impl AnytimeIndex {
    pub fn load(path: &Path, in_memory: bool) -> Result<Self, Error> {
        info!("Loading index from {}", path.display());
        let info_file = File::options().read(true).open(path.join(INDEX_CBOR))?;
        let information: IndexInformation = ciborium::de::from_reader(info_file)
            .map_err(|e| Error::Corrupt(format!("cannot read the index information: {}", e)))?;

        let postings_path = path.join(POSTINGS_DAT);
        let postings: Box<dyn Buffer> = if in_memory {
            Box::new(MemoryBuffer::new(&postings_path)?)
        } else {
            Box::new(MmapBuffer::new(&postings_path)?)
        };

        let blob_size = postings.data().len() as u64;
        for (term, term_information) in &information.terms {
            for segment in &term_information.segments {
                let (start, end) = segment.position_range;
                if start > end || end > blob_size {
                    return Err(Error::Corrupt(format!(
                        "a postings segment of term {} points outside the blob",
                        term
                    )));
                }
            }
        }

        debug!(
            "Loaded {} documents, {} terms, {} postings bytes",
            information.primary_keys.len(),
            information.terms.len(),
            postings.data().len()
        );
        Ok(Self {
            terms: information.terms,
            primary_keys: Arc::new(information.primary_keys),
            postings,
        })
    }

    pub fn documents(&self) -> u32 {
        self.primary_keys.len() as u32
    }

    /// The primary key table, ordered by internal document id
    pub fn primary_keys(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.primary_keys)
    }

    pub fn term(&self, token: &str) -> Option<&TermInformation> {
        self.terms.get(token)
    }

    /// Raw bytes of one postings segment
    pub fn postings(&self, position_range: (u64, u64)) -> &[u8] {
        self.postings
            .slice(position_range.0 as usize, position_range.1 as usize)
    }

    /// The decompressor this index was written with, chosen by the
    /// blob's leading family byte
    pub fn codec(&self) -> Arc<dyn Codec> {
        codec::for_family(self.postings.data().first().copied())
    }
}

/// Serializes already-quantised postings into the on-disk form. This is
/// not an indexing pipeline: scoring and quantisation happen upstream.
pub struct IndexWriter {
    codec: Arc<dyn Codec>,
    primary_keys: Vec<String>,
    postings: BTreeMap<String, BTreeMap<u32, Vec<DocId>>>,
}

impl IndexWriter {
    pub fn new(primary_keys: Vec<String>, codec: Arc<dyn Codec>) -> Self {
        Self {
            codec,
            primary_keys,
            postings: BTreeMap::new(),
        }
    }

    /// Record the postings of one term as `(document id, impact)` pairs.
    /// At most one posting per (term, document) pair; ids may arrive in
    /// any order.
    pub fn add(&mut self, term: &str, postings: &[(DocId, u32)]) {
        let by_impact = self.postings.entry(term.to_string()).or_default();
        for &(document_id, impact) in postings {
            by_impact.entry(impact).or_default().push(document_id);
        }
    }

    /// Write `index.cbor` and `postings.dat` under `path`
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let mut blob = vec![self.codec.family()];
        let mut terms = HashMap::new();

        for (term, by_impact) in &self.postings {
            let mut information = TermInformation::default();

            // highest impact first
            for (&impact, ids) in by_impact.iter().rev() {
                let mut ids = ids.clone();
                ids.sort_unstable();

                let mut deltas = Vec::with_capacity(ids.len());
                let mut previous = 0;
                for &id in &ids {
                    if !deltas.is_empty() && id <= previous {
                        return Err(Error::DuplicatePosting {
                            term: term.clone(),
                            document_id: id,
                        });
                    }
                    deltas.push(id - previous);
                    previous = id;
                }

                let start = blob.len() as u64;
                self.codec.encode(&mut blob, &deltas);
                information.segments.push(SegmentInformation {
                    impact,
                    length: ids.len(),
                    position_range: (start, blob.len() as u64),
                });
                information.max_impact = information.max_impact.max(impact);
                information.length += ids.len();
            }
            terms.insert(term.clone(), information);
        }

        std::fs::write(path.join(POSTINGS_DAT), &blob)?;

        let info_file = File::options()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path.join(INDEX_CBOR))?;
        let information = IndexInformation {
            primary_keys: self.primary_keys.clone(),
            terms,
        };
        ciborium::ser::into_writer(&information, info_file)
            .map_err(|e| Error::Corrupt(format!("cannot save the index information: {}", e)))?;
        info!(
            "Wrote {} terms over {} documents to {}",
            information.terms.len(),
            information.primary_keys.len(),
            path.display()
        );
        Ok(())
    }
}
