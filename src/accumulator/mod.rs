//! Accumulator arenas: one score cell per document in the collection
//!
//! Three storage strategies trade per-posting cost against the cost of
//! resetting the arena between queries. All of them hold the accumulators
//! in a flat rectangle indexed by document id, so a cell index doubles as
//! the document id.

pub mod block_max;
pub mod simple;
pub mod two_d;

pub use block_max::BlockMaxAccumulators;
pub use simple::SimpleAccumulators;
pub use two_d::TwoDAccumulators;

use crate::base::{DocId, Element, MAX_DOCUMENTS};
use crate::errors::Error;
use crate::utils::maths::floor_log2;

/// Storage contract shared by the arena variants
pub trait Accumulators<E: Element>: Default + Send {
    /// Configure for a collection of `documents` accumulators. Must be
    /// called before first use; allocates once.
    fn init(&mut self, documents: u32, width_hint: usize) -> Result<(), Error>;

    /// `accumulator[id] += score`, returning the updated value
    fn add(&mut self, id: DocId, score: E) -> E;

    /// Current logical value (zero when the cell was not touched since the
    /// last rewind)
    fn get(&self, id: DocId) -> E;

    /// The number of accumulators asked for, which may be fewer than are
    /// allocated
    fn size(&self) -> u32;

    /// Clear the accumulators ready for the next query
    fn rewind(&mut self);
}

/// Row width for the rectangle arenas: `2^width_hint` when a hint is
/// given, otherwise the power of two nearest below `sqrt(documents)`,
/// which balances row-reset cost against the per-row array size.
pub(crate) fn row_shift(documents: u32, width_hint: usize) -> u32 {
    if width_hint >= 1 {
        // 2^31 cells already fail the allocation check, so wider hints
        // need not shift further
        (width_hint as u32).min(31)
    } else {
        floor_log2((documents as f64).sqrt() as usize)
    }
}

pub(crate) fn check_documents(documents: u32) -> Result<(), Error> {
    if documents == 0 {
        return Err(Error::EmptyCollection);
    }
    if documents > MAX_DOCUMENTS {
        return Err(Error::TooManyDocuments(documents as u64));
    }
    Ok(())
}

/// The rectangle arenas allocate whole rows; the allocation may exceed
/// the collection size but never one and a half times the document bound
pub(crate) fn check_allocation(width: usize, rows: usize) -> Result<(), Error> {
    let allocated = width as u64 * rows as u64;
    let bound = MAX_DOCUMENTS as u64 + MAX_DOCUMENTS as u64 / 2;
    if allocated > bound {
        return Err(Error::ArenaTooLarge(allocated));
    }
    Ok(())
}
