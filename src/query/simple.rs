//! Simple-arena evaluator: postings are folded into a flat arena with no
//! top-k bookkeeping at all; the top-k is extracted by a single arena
//! scan inside `sort`

use std::sync::Arc;

use crate::accumulator::{Accumulators, SimpleAccumulators};
use crate::base::{DocId, Element};
use crate::codec::Codec;
use crate::errors::Error;
use crate::query::{top_k_heap, DocidRsvPair, Progress, QueryCore};

pub struct SimpleQuery<E: Element> {
    core: QueryCore<E>,
    accumulators: SimpleAccumulators<E>,
    slots: Vec<DocId>,
    needed_for_top_k: u32,
    sorted: bool,
    next_result_location: u32,
}

impl<E: Element> SimpleQuery<E> {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            core: QueryCore::new(codec),
            accumulators: SimpleAccumulators::default(),
            slots: Vec::new(),
            needed_for_top_k: 0,
            sorted: false,
            next_result_location: 0,
        }
    }

    /// Initialise the object. Must be called before first use.
    pub fn init(
        &mut self,
        primary_keys: Arc<Vec<String>>,
        documents: u32,
        top_k: u32,
        width_hint: usize,
    ) -> Result<(), Error> {
        self.core.init(primary_keys, documents, top_k)?;
        self.accumulators.init(documents, width_hint)?;
        self.slots = vec![0; top_k as usize];
        self.rewind(E::ZERO, E::ONE, E::ZERO);
        Ok(())
    }

    /// Clear this object after use, ready for the next query
    pub fn rewind(&mut self, _smallest_possible_rsv: E, _top_k_lower_bound: E, _largest_possible_rsv: E) {
        self.sorted = false;
        self.accumulators.rewind();
        self.needed_for_top_k = self.core.top_k;
        self.core.rewind();
    }

    pub fn parse(&mut self, query_text: &str) {
        self.core.parse(query_text);
    }

    pub fn terms(&self) -> &[String] {
        self.core.terms()
    }

    pub fn top_k(&self) -> u32 {
        self.core.top_k
    }

    /// Add `score` to the accumulator of `document_id`. Never terminates
    /// early; the top-k is not tracked until `sort`.
    #[inline]
    pub fn add_rsv(&mut self, document_id: DocId, score: E) -> Progress {
        self.accumulators.add(document_id, score);
        Progress::Continue
    }

    /// Set the impact then decode and fold one postings segment into the
    /// accumulators
    pub fn decode_and_process(
        &mut self,
        impact: E,
        integers: usize,
        compressed: &[u8],
    ) -> Result<Progress, Error> {
        self.core.impact = impact;
        self.core.decode_to_scratch(integers, compressed)?;
        for at in 0..integers {
            let document_id = self.core.scratch[at];
            self.accumulators.add(document_id, self.core.impact);
        }
        Ok(Progress::Continue)
    }

    /// Scan the arena once, building the top-k heap from the non-zero
    /// accumulators, then order the filled slots best-first. Idempotent
    /// within a query.
    pub fn sort(&mut self) {
        if !self.sorted {
            let arena = &self.accumulators;
            let key = |id: DocId| (arena.get(id), id);

            for document_id in 0..arena.size() {
                let value = arena.get(document_id);
                if value == E::ZERO {
                    continue;
                }
                if self.needed_for_top_k > 0 {
                    self.needed_for_top_k -= 1;
                    self.slots[self.needed_for_top_k as usize] = document_id;
                    if self.needed_for_top_k == 0 {
                        top_k_heap::make_heap(&mut self.slots, key);
                    }
                } else if key(document_id) > key(self.slots[0]) {
                    top_k_heap::push_back(&mut self.slots, document_id, key);
                }
            }

            let offset = self.needed_for_top_k as usize;
            top_k_heap::sort_descending(&mut self.slots[offset..], key);
            self.sorted = true;
        }
    }

    /// Return the top result
    pub fn get_first(&mut self) -> Option<DocidRsvPair<E>> {
        self.sort();
        self.next_result_location = 0;
        self.get_next()
    }

    /// After `get_first`, return the next result
    pub fn get_next(&mut self) -> Option<DocidRsvPair<E>> {
        if self.next_result_location >= self.core.top_k - self.needed_for_top_k {
            return None;
        }
        let at = self.needed_for_top_k + self.next_result_location;
        let document_id = self.slots[at as usize];
        self.next_result_location += 1;
        Some(DocidRsvPair {
            document_id,
            primary_key: self.core.primary_keys[document_id as usize].clone(),
            rsv: self.accumulators.get(document_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NoneCodec;

    fn keys(documents: u32) -> Arc<Vec<String>> {
        Arc::new((0..documents).map(|i| format!("doc-{}", i)).collect())
    }

    fn collect(query: &mut SimpleQuery<u16>) -> Vec<(DocId, u16)> {
        let mut results = Vec::new();
        let mut next = query.get_first();
        while let Some(pair) = next {
            results.push((pair.document_id, pair.rsv));
            next = query.get_next();
        }
        results
    }

    #[test]
    fn test_rsv_accumulation() {
        let mut query: SimpleQuery<u16> = SimpleQuery::new(Arc::new(NoneCodec));
        query.init(keys(1024), 1024, 2, 0).unwrap();

        let _ = query.add_rsv(2, 10);
        let _ = query.add_rsv(3, 20);
        let _ = query.add_rsv(2, 2);
        let _ = query.add_rsv(1, 1);
        let _ = query.add_rsv(1, 14);

        assert_eq!(collect(&mut query), [(3, 20), (1, 15)]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut query: SimpleQuery<u16> = SimpleQuery::new(Arc::new(NoneCodec));
        query.init(keys(64), 64, 2, 0).unwrap();

        let _ = query.add_rsv(5, 4);
        let _ = query.add_rsv(9, 2);
        query.sort();
        query.sort();

        assert_eq!(collect(&mut query), [(5, 4), (9, 2)]);
    }

    #[test]
    fn test_all_equal_prefers_higher_ids() {
        let mut query: SimpleQuery<u16> = SimpleQuery::new(Arc::new(NoneCodec));
        query.init(keys(16), 16, 3, 0).unwrap();
        for document_id in 0..16 {
            let _ = query.add_rsv(document_id, 6);
        }
        assert_eq!(collect(&mut query), [(15, 6), (14, 6), (13, 6)]);
    }
}
