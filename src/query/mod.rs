//! Everything necessary to process a query
//!
//! A query object owns its accumulator arena, top-k slots and
//! decompression scratch; it is allocated once (`init`) and reused across
//! queries (`rewind`). The three retrieval strategies are a closed set
//! selected by [`get_by_name`], so the per-posting hot path is
//! monomorphised.

pub mod block_max;
pub mod heap;
pub mod simple;
pub mod top_k_heap;

pub use block_max::BlockMaxQuery;
pub use heap::HeapQuery;
pub use simple::SimpleQuery;

use std::sync::Arc;

use log::{info, warn};

use crate::accumulator::{SimpleAccumulators, TwoDAccumulators};
use crate::base::{DocId, Element, MAX_DOCUMENTS, MAX_TOP_K};
use crate::codec::{cumulative_sum, Codec};
use crate::errors::Error;
use crate::parser;

/// Extra scratch elements past the collection size, so decoders may
/// overshoot the requested count
const DECODE_SLACK: usize = 64;

/// Outcome of feeding postings to a query: `Done` means a caller-supplied
/// lower bound proved the top-k final and the rest of the query can be
/// skipped. Not an error; no results are discarded.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Done,
}

/// One ranked result. `get_next` hands these out by value; the primary
/// key is copied out of the key table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocidRsvPair<E> {
    pub document_id: DocId,
    pub primary_key: String,
    pub rsv: E,
}

/// State every retrieval strategy shares: the codec, the decompression
/// scratch, the primary key table and the owned parsed query
pub(crate) struct QueryCore<E: Element> {
    pub codec: Arc<dyn Codec>,
    pub scratch: Vec<u32>,
    pub documents: u32,
    pub top_k: u32,
    pub impact: E,
    pub primary_keys: Arc<Vec<String>>,
    pub parsed_query: Vec<String>,
}

impl<E: Element> QueryCore<E> {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            codec,
            scratch: Vec::new(),
            documents: 0,
            top_k: 0,
            impact: E::ONE,
            primary_keys: Arc::new(Vec::new()),
            parsed_query: Vec::new(),
        }
    }

    pub fn init(
        &mut self,
        primary_keys: Arc<Vec<String>>,
        documents: u32,
        top_k: u32,
    ) -> Result<(), Error> {
        if top_k == 0 {
            return Err(Error::ZeroTopK);
        }
        if top_k > MAX_TOP_K {
            return Err(Error::TopKTooLarge(top_k));
        }
        if documents == 0 {
            return Err(Error::EmptyCollection);
        }
        if documents > MAX_DOCUMENTS {
            return Err(Error::TooManyDocuments(documents as u64));
        }
        self.primary_keys = primary_keys;
        self.documents = documents;
        self.top_k = top_k;
        self.scratch = vec![0u32; documents as usize + DECODE_SLACK];
        Ok(())
    }

    pub fn rewind(&mut self) {
        self.parsed_query.clear();
        self.impact = E::ZERO;
    }

    pub fn parse(&mut self, query: &str) {
        self.parsed_query = parser::parse(query);
    }

    pub fn terms(&self) -> &[String] {
        &self.parsed_query
    }

    /// Decode a compressed d-gap segment into the scratch and recover
    /// absolute document ids in place
    pub fn decode_to_scratch(&mut self, integers: usize, compressed: &[u8]) -> Result<(), Error> {
        if integers > self.documents as usize {
            return Err(Error::Corrupt(format!(
                "a postings segment of {} ids exceeds the collection size of {}",
                integers, self.documents
            )));
        }
        self.codec.decode(&mut self.scratch, integers, compressed)?;
        cumulative_sum(&mut self.scratch[..integers]);
        Ok(())
    }
}

/// A query evaluator of any of the retrieval strategies
pub enum AnytimeQuery<E: Element> {
    Simple(SimpleQuery<E>),
    Heap1d(HeapQuery<E, SimpleAccumulators<E>>),
    Heap2d(HeapQuery<E, TwoDAccumulators<E>>),
    BlockMax(BlockMaxQuery<E>),
}

/// Build an evaluator from an accumulator manager name, normally taken
/// from configuration. Unknown names fall back to `2d_heap`.
pub fn get_by_name<E: Element>(name: &str, codec: Arc<dyn Codec>) -> AnytimeQuery<E> {
    info!("Accumulator manager: {}", name);
    match name {
        "simple" => AnytimeQuery::Simple(SimpleQuery::new(codec)),
        "1d_heap" => AnytimeQuery::Heap1d(HeapQuery::new(codec)),
        "2d_heap" => AnytimeQuery::Heap2d(HeapQuery::new(codec)),
        "blockmax" => AnytimeQuery::BlockMax(BlockMaxQuery::new(codec)),
        other => {
            warn!("Unknown accumulator manager {}, using 2d_heap", other);
            AnytimeQuery::Heap2d(HeapQuery::new(codec))
        }
    }
}

macro_rules! each_strategy {
    ($self: expr, $query: ident => $body: expr) => {
        match $self {
            AnytimeQuery::Simple($query) => $body,
            AnytimeQuery::Heap1d($query) => $body,
            AnytimeQuery::Heap2d($query) => $body,
            AnytimeQuery::BlockMax($query) => $body,
        }
    };
}

impl<E: Element> AnytimeQuery<E> {
    pub fn init(
        &mut self,
        primary_keys: Arc<Vec<String>>,
        documents: u32,
        top_k: u32,
        width_hint: usize,
    ) -> Result<(), Error> {
        each_strategy!(self, query => query.init(primary_keys, documents, top_k, width_hint))
    }

    pub fn rewind(&mut self, smallest_possible_rsv: E, top_k_lower_bound: E, largest_possible_rsv: E) {
        each_strategy!(self, query => {
            query.rewind(smallest_possible_rsv, top_k_lower_bound, largest_possible_rsv)
        })
    }

    pub fn parse(&mut self, query_text: &str) {
        each_strategy!(self, query => query.parse(query_text))
    }

    pub fn terms(&self) -> &[String] {
        each_strategy!(self, query => query.terms())
    }

    pub fn add_rsv(&mut self, document_id: DocId, score: E) -> Progress {
        each_strategy!(self, query => query.add_rsv(document_id, score))
    }

    pub fn decode_and_process(
        &mut self,
        impact: E,
        integers: usize,
        compressed: &[u8],
    ) -> Result<Progress, Error> {
        each_strategy!(self, query => query.decode_and_process(impact, integers, compressed))
    }

    pub fn sort(&mut self) {
        each_strategy!(self, query => query.sort())
    }

    pub fn get_first(&mut self) -> Option<DocidRsvPair<E>> {
        each_strategy!(self, query => query.get_first())
    }

    pub fn get_next(&mut self) -> Option<DocidRsvPair<E>> {
        each_strategy!(self, query => query.get_next())
    }

    pub fn top_k(&self) -> u32 {
        each_strategy!(self, query => query.top_k())
    }
}
