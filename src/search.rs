//! The anytime search driver
//!
//! One query is one pass over the impact segments of its terms, best
//! impact first. Stopping early, on an Oracle `Done` or on the postings
//! budget, always keeps the most valuable postings processed so far.

use log::debug;

use crate::base::Element;
use crate::errors::Error;
use crate::index::{AnytimeIndex, SegmentInformation};
use crate::query::{AnytimeQuery, Progress};

#[derive(Default, Clone, Copy)]
pub struct SearchOptions {
    /// Process at most this many `(term, impact)` segments; `None` runs
    /// the query to completion
    pub segment_budget: Option<usize>,

    /// An Oracle score: no document scoring below this can enter the
    /// top-k. Once the top-k fills, the heap strategies stop the query.
    pub oracle_lower_bound: Option<u32>,
}

/// Evaluate `query_text` against `index`, leaving the evaluator ready for
/// `get_first`/`get_next`
pub fn search<E: Element>(
    index: &AnytimeIndex,
    query: &mut AnytimeQuery<E>,
    query_text: &str,
    options: &SearchOptions,
) -> Result<(), Error> {
    let top_k_lower_bound = match options.oracle_lower_bound {
        Some(bound) => E::from_u32(bound.max(1)),
        None => E::ONE,
    };
    query.rewind(E::ZERO, top_k_lower_bound, E::MAX);
    query.parse(query_text);
    let terms = query.terms().to_vec();

    // Gather the segments of every query term, then order them across
    // terms by decreasing impact
    let mut planned: Vec<&SegmentInformation> = Vec::new();
    for term in &terms {
        match index.term(term) {
            Some(information) => planned.extend(information.segments.iter()),
            None => debug!("Term {} is not in the vocabulary", term),
        }
    }
    planned.sort_by(|a, b| b.impact.cmp(&a.impact));

    if let Some(budget) = options.segment_budget {
        if planned.len() > budget {
            debug!(
                "Anytime budget keeps {} of {} segments",
                budget,
                planned.len()
            );
            planned.truncate(budget);
        }
    }

    for segment in planned {
        let compressed = index.postings(segment.position_range);
        let progress =
            query.decode_and_process(E::from_u32(segment.impact), segment.length, compressed)?;
        if let Progress::Done = progress {
            debug!("The top-k is final, stopping the query");
            break;
        }
    }
    Ok(())
}
