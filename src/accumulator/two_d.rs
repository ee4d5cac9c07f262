//! Accumulators kept as a 2-D rectangle of rows guarded by dirty flags
//!
//! Resetting between queries only touches one flag byte per row; a row is
//! zeroed lazily the first time one of its accumulators is written. Row
//! width is a whole power of two so locating a flag is a shift rather
//! than a mod.

use super::{check_documents, row_shift, Accumulators};
use crate::base::{DocId, Element};
use crate::errors::Error;

const DIRTY: u8 = 0xFF;

pub struct TwoDAccumulators<E: Element> {
    /// One byte per row; non-zero means the row has not been written this
    /// query and its logical values are zero
    dirty_flag: Vec<u8>,
    /// `width * rows` cells, indexed by document id
    accumulator: Vec<E>,

    width: usize,
    shift: u32,
    rows: usize,
    documents: u32,
}

impl<E: Element> Default for TwoDAccumulators<E> {
    fn default() -> Self {
        Self {
            dirty_flag: Vec::new(),
            accumulator: Vec::new(),
            width: 1,
            shift: 1,
            rows: 0,
            documents: 0,
        }
    }
}

impl<E: Element> TwoDAccumulators<E> {
    /// Zero the row holding `id` if it has not been written this query
    #[inline(always)]
    fn clean(&mut self, id: DocId) {
        let row = (id >> self.shift) as usize;
        if self.dirty_flag[row] != 0 {
            let start = row << self.shift;
            self.accumulator[start..start + self.width].fill(E::ZERO);
            self.dirty_flag[row] = 0;
        }
    }

    #[cfg(test)]
    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    #[cfg(test)]
    pub(crate) fn width(&self) -> usize {
        self.width
    }
}

impl<E: Element> Accumulators<E> for TwoDAccumulators<E> {
    fn init(&mut self, documents: u32, width_hint: usize) -> Result<(), Error> {
        check_documents(documents)?;
        self.documents = documents;
        self.shift = row_shift(documents, width_hint);
        self.width = 1usize << self.shift;

        // Round the rectangle up so the last row is complete even when the
        // width does not divide the number of documents
        self.rows = (documents as usize + self.width - 1) / self.width;
        super::check_allocation(self.width, self.rows)?;
        self.accumulator = vec![E::ZERO; self.width * self.rows];
        self.dirty_flag = vec![DIRTY; self.rows];
        Ok(())
    }

    #[inline(always)]
    fn add(&mut self, id: DocId, score: E) -> E {
        self.clean(id);
        let cell = &mut self.accumulator[id as usize];
        *cell = cell.wrapping_add(score);
        *cell
    }

    #[inline(always)]
    fn get(&self, id: DocId) -> E {
        if self.dirty_flag[(id >> self.shift) as usize] != 0 {
            E::ZERO
        } else {
            self.accumulator[id as usize]
        }
    }

    fn size(&self) -> u32 {
        self.documents
    }

    fn rewind(&mut self) {
        self.dirty_flag.fill(DIRTY);
    }
}
