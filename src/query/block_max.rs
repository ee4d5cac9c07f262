//! Block-max evaluator: accumulation tracks a per-row maximum instead of
//! a heap, and `sort` skips every row whose maximum cannot reach the
//! bottom of the top-k heap

use std::sync::Arc;

use crate::accumulator::{Accumulators, BlockMaxAccumulators};
use crate::base::{DocId, Element};
use crate::codec::Codec;
use crate::errors::Error;
use crate::query::{top_k_heap, DocidRsvPair, Progress, QueryCore};

pub struct BlockMaxQuery<E: Element> {
    core: QueryCore<E>,
    accumulators: BlockMaxAccumulators<E>,
    slots: Vec<DocId>,
    needed_for_top_k: u32,
    sorted: bool,
    next_result_location: u32,
}

impl<E: Element> BlockMaxQuery<E> {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            core: QueryCore::new(codec),
            accumulators: BlockMaxAccumulators::default(),
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

    /// Add `score` to the accumulator of `document_id`, keeping that
    /// row's maximum current. Never terminates early.
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

    /// Build the top-k by scanning the block maxima: a row whose maximum
    /// does not beat the bottom of the heap is skipped whole. The scan
    /// walks full rows; cells past the collection size were zeroed at
    /// `init` and can never pass the comparison. Idempotent within a
    /// query.
    pub fn sort(&mut self) {
        if !self.sorted {
            let arena = &self.accumulators;
            let key = |id: DocId| (arena.get(id), id);
            let width = arena.width() as u32;
            let mut bottom_of_heap = E::ZERO;

            for block in 0..arena.blocks() {
                if arena.block_max()[block] <= bottom_of_heap {
                    continue;
                }
                // a candidate somewhere in this row
                let start = block as u32 * width;
                for document_id in start..start + width {
                    if arena.get(document_id) <= bottom_of_heap {
                        continue;
                    }
                    if self.needed_for_top_k > 0 {
                        self.needed_for_top_k -= 1;
                        self.slots[self.needed_for_top_k as usize] = document_id;
                        if self.needed_for_top_k == 0 {
                            top_k_heap::make_heap(&mut self.slots, key);
                            bottom_of_heap = arena.get(self.slots[0]);
                        }
                    } else {
                        top_k_heap::push_back(&mut self.slots, document_id, key);
                        bottom_of_heap = arena.get(self.slots[0]);
                    }
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

    fn collect(query: &mut BlockMaxQuery<u16>) -> Vec<(DocId, u16)> {
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
        let mut query: BlockMaxQuery<u16> = BlockMaxQuery::new(Arc::new(NoneCodec));
        query.init(keys(1024), 1024, 2, 0).unwrap();

        let _ = query.add_rsv(2, 10);
        let _ = query.add_rsv(3, 20);
        let _ = query.add_rsv(2, 2);
        let _ = query.add_rsv(1, 1);
        let _ = query.add_rsv(1, 14);

        assert_eq!(collect(&mut query), [(3, 20), (1, 15)]);
    }

    #[test]
    fn test_single_touched_row() {
        let mut query: BlockMaxQuery<u16> = BlockMaxQuery::new(Arc::new(NoneCodec));
        query.init(keys(64), 64, 1, 3).unwrap();

        let _ = query.add_rsv(33, 9);
        assert_eq!(collect(&mut query), [(33, 9)]);
    }

    #[test]
    fn test_partial_last_row() {
        let mut query: BlockMaxQuery<u16> = BlockMaxQuery::new(Arc::new(NoneCodec));
        query.init(keys(60), 60, 3, 3).unwrap();

        let _ = query.add_rsv(59, 2);
        let _ = query.add_rsv(58, 4);
        // the allocated cells past document 59 must never surface
        assert_eq!(collect(&mut query), [(58, 4), (59, 2)]);
    }

    #[test]
    fn test_reuse_after_rewind() {
        let mut query: BlockMaxQuery<u16> = BlockMaxQuery::new(Arc::new(NoneCodec));
        query.init(keys(64), 64, 2, 0).unwrap();

        let _ = query.add_rsv(10, 5);
        assert_eq!(collect(&mut query), [(10, 5)]);

        query.rewind(0, 1, 0);
        let _ = query.add_rsv(11, 6);
        assert_eq!(collect(&mut query), [(11, 6)]);
    }
}
