//! Flat accumulator array, zeroed in full at the start of each query

use super::{check_documents, Accumulators};
use crate::base::{DocId, Element};
use crate::errors::Error;

/// Cheapest per-posting cost, most expensive reset: `rewind` touches every
/// accumulator.
pub struct SimpleAccumulators<E: Element> {
    accumulator: Vec<E>,
    documents: u32,
}

impl<E: Element> Default for SimpleAccumulators<E> {
    fn default() -> Self {
        Self {
            accumulator: Vec::new(),
            documents: 0,
        }
    }
}

impl<E: Element> Accumulators<E> for SimpleAccumulators<E> {
    fn init(&mut self, documents: u32, _width_hint: usize) -> Result<(), Error> {
        check_documents(documents)?;
        self.documents = documents;
        self.accumulator = vec![E::ZERO; documents as usize];
        Ok(())
    }

    #[inline(always)]
    fn add(&mut self, id: DocId, score: E) -> E {
        let cell = &mut self.accumulator[id as usize];
        *cell = cell.wrapping_add(score);
        *cell
    }

    #[inline(always)]
    fn get(&self, id: DocId) -> E {
        self.accumulator[id as usize]
    }

    fn size(&self) -> u32 {
        self.documents
    }

    fn rewind(&mut self) {
        self.accumulator.fill(E::ZERO);
    }
}
