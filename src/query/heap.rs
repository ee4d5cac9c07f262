//! Heap-maintenance evaluator: the top-k heap is kept current on every
//! `add_rsv`, which costs a bound check per posting and buys early
//! termination when the caller supplies an Oracle lower bound
//!
//! Generic over the arena so `1d_heap` (flat array) and `2d_heap`
//! (dirty-flag rows) share the algorithm.

use std::sync::Arc;

use crate::accumulator::Accumulators;
use crate::base::{DocId, Element};
use crate::codec::Codec;
use crate::errors::Error;
use crate::query::{top_k_heap, DocidRsvPair, Progress, QueryCore};

pub struct HeapQuery<E: Element, A: Accumulators<E>> {
    core: QueryCore<E>,
    accumulators: A,
    /// Top-k arena indices; filled back-to-front, heap-ordered once full
    slots: Vec<DocId>,
    /// How many results are still missing from the top-k
    needed_for_top_k: u32,
    /// Lowest score currently able to enter the top-k
    top_k_lower_bound: E,
    sorted: bool,
    next_result_location: u32,
}

impl<E: Element, A: Accumulators<E>> HeapQuery<E, A> {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            core: QueryCore::new(codec),
            accumulators: A::default(),
            slots: Vec::new(),
            needed_for_top_k: 0,
            top_k_lower_bound: E::ONE,
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

    /// Clear this object after use, ready for the next query. A
    /// `top_k_lower_bound` other than one is an Oracle bound: once the
    /// top-k fills with scores at or above it, the result is final.
    pub fn rewind(&mut self, _smallest_possible_rsv: E, top_k_lower_bound: E, _largest_possible_rsv: E) {
        self.sorted = false;
        self.accumulators.rewind();
        self.needed_for_top_k = self.core.top_k;
        self.top_k_lower_bound = top_k_lower_bound;
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

    /// Add `score` to the accumulator of `document_id` and keep the top-k
    /// heap current. Returns `Done` exactly when an Oracle bound proves
    /// the top-k final.
    #[inline]
    pub fn add_rsv(&mut self, document_id: DocId, score: E) -> Progress {
        let value = self.accumulators.add(document_id, score);

        // cannot enter the top-k
        if value < self.top_k_lower_bound {
            return Progress::Continue;
        }

        // the heap is not full yet, so change only happens for a first
        // crossing of the bound
        if self.needed_for_top_k > 0 {
            if value.wrapping_sub(score) < self.top_k_lower_bound {
                self.needed_for_top_k -= 1;
                self.slots[self.needed_for_top_k as usize] = document_id;
                if self.needed_for_top_k == 0 {
                    let arena = &self.accumulators;
                    top_k_heap::make_heap(&mut self.slots, |id| (arena.get(id), id));
                    if self.top_k_lower_bound != E::ONE {
                        // the Oracle bound is met, the top-k is final
                        return Progress::Done;
                    }
                    self.top_k_lower_bound = self.accumulators.get(self.slots[0]);
                }
            }
            return Progress::Continue;
        }

        let arena = &self.accumulators;
        let key = |id: DocId| (arena.get(id), id);

        // equal to the bottom of the heap: the tie-break decides
        if value == self.top_k_lower_bound {
            if document_id < self.slots[0] {
                return Progress::Continue;
            }
            top_k_heap::push_back(&mut self.slots, document_id, key);
            self.top_k_lower_bound = self.accumulators.get(self.slots[0]);
            return Progress::Continue;
        }

        // above the bottom of the heap: either a new entry (the old value
        // was below the bound, or lost the tie-break) or a promotion
        let old = value.wrapping_sub(score);
        if old < self.top_k_lower_bound
            || (old == self.top_k_lower_bound && document_id < self.slots[0])
        {
            top_k_heap::push_back(&mut self.slots, document_id, key);
        } else {
            let at = top_k_heap::find(&self.slots, document_id)
                .expect("a promoted accumulator must already be in the heap");
            top_k_heap::promote(&mut self.slots, at, key);
        }
        self.top_k_lower_bound = self.accumulators.get(self.slots[0]);
        Progress::Continue
    }

    /// Set the impact then decode and fold one postings segment into the
    /// accumulators, stopping at an Oracle `Done`
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
            if let Progress::Done = self.add_rsv(document_id, self.core.impact) {
                return Ok(Progress::Done);
            }
        }
        Ok(Progress::Continue)
    }

    /// Order the filled top-k slots best-first. Idempotent within a query.
    pub fn sort(&mut self) {
        if !self.sorted {
            let offset = self.needed_for_top_k as usize;
            let arena = &self.accumulators;
            top_k_heap::sort_descending(&mut self.slots[offset..], |id| (arena.get(id), id));
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
