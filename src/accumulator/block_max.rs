//! Accumulators paired with a per-row maximum, as used by impact-ordered
//! query processors that skip whole rows when extracting the top-k

use super::{check_documents, row_shift, Accumulators};
use crate::base::{DocId, Element};
use crate::errors::Error;

pub struct BlockMaxAccumulators<E: Element> {
    /// `max(accumulator)` over each row
    block_max: Vec<E>,
    /// `width * blocks` cells, indexed by document id
    accumulator: Vec<E>,

    width: usize,
    shift: u32,
    blocks: usize,
    documents: u32,
}

impl<E: Element> Default for BlockMaxAccumulators<E> {
    fn default() -> Self {
        Self {
            block_max: Vec::new(),
            accumulator: Vec::new(),
            width: 1,
            shift: 1,
            blocks: 0,
            documents: 0,
        }
    }
}

impl<E: Element> BlockMaxAccumulators<E> {
    pub fn block_max(&self) -> &[E] {
        &self.block_max
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn blocks(&self) -> usize {
        self.blocks
    }
}

impl<E: Element> Accumulators<E> for BlockMaxAccumulators<E> {
    fn init(&mut self, documents: u32, width_hint: usize) -> Result<(), Error> {
        check_documents(documents)?;
        self.documents = documents;
        self.shift = row_shift(documents, width_hint);
        self.width = 1usize << self.shift;
        self.blocks = (documents as usize + self.width - 1) / self.width;
        super::check_allocation(self.width, self.blocks)?;

        // The rectangle is rounded up so every block has a full row behind
        // it. The tail cells past `documents` are zeroed here, once: rewind
        // never touches them, and the top-k scan relies on them staying
        // zero forever.
        self.accumulator = vec![E::ZERO; self.width * self.blocks];
        self.block_max = vec![E::ZERO; self.blocks];
        Ok(())
    }

    #[inline(always)]
    fn add(&mut self, id: DocId, score: E) -> E {
        let cell = &mut self.accumulator[id as usize];
        *cell = cell.wrapping_add(score);
        let value = *cell;

        let block = (id >> self.shift) as usize;
        if value > self.block_max[block] {
            self.block_max[block] = value;
        }
        value
    }

    #[inline(always)]
    fn get(&self, id: DocId) -> E {
        self.accumulator[id as usize]
    }

    fn size(&self) -> u32 {
        self.documents
    }

    fn rewind(&mut self) {
        self.accumulator[..self.documents as usize].fill(E::ZERO);
        self.block_max.fill(E::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_invariant<E: Element>(arena: &BlockMaxAccumulators<E>) {
        for block in 0..arena.blocks() {
            let start = block * arena.width();
            let row_max = (start..start + arena.width())
                .map(|id| arena.get(id as DocId))
                .max()
                .unwrap();
            assert!(arena.block_max()[block] >= row_max);
        }
    }

    #[test]
    fn test_add_tracks_block_max() {
        let mut arena = BlockMaxAccumulators::<u16>::default();
        arena.init(64, 3).unwrap();

        arena.add(33, 9);
        assert_eq!(arena.get(33), 9);
        assert_eq!(arena.block_max()[4], 9);
        assert_eq!(arena.block_max()[3], 0);
        block_invariant(&arena);

        arena.add(32, 4);
        assert_eq!(arena.block_max()[4], 9);
        arena.add(32, 7);
        assert_eq!(arena.block_max()[4], 11);
        block_invariant(&arena);
    }

    #[test]
    fn test_partial_last_row_tail_stays_zero() {
        let mut arena = BlockMaxAccumulators::<u16>::default();
        arena.init(60, 3).unwrap();
        assert_eq!(arena.blocks(), 8);

        arena.add(59, 3);
        arena.rewind();
        arena.add(59, 5);

        // cells 60..64 are allocated but can never hold a score
        for id in 60..64 {
            assert_eq!(arena.get(id), 0);
        }
        assert_eq!(arena.block_max()[7], 5);
    }

    #[test]
    fn test_rewind_clears_both_arrays() {
        let mut arena = BlockMaxAccumulators::<u16>::default();
        arena.init(64, 0).unwrap();
        arena.add(5, 10);
        arena.add(40, 2);
        arena.rewind();

        for id in 0..64 {
            assert_eq!(arena.get(id), 0);
        }
        assert!(arena.block_max().iter().all(|&m| m == 0));
    }
}
