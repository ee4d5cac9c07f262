//! Impact-ordered, anytime query processing
//!
//! The index stores, for each term, runs of document ids grouped by
//! quantised impact; a query is evaluated by folding those runs into an
//! accumulator arena, best impact first, and can be stopped at any point
//! with the best results found so far. Retrieval strategies trade arena
//! reset cost, per-posting bookkeeping and early termination against one
//! another; see [`query::get_by_name`].

pub mod accumulator;
pub mod base;
pub mod codec;
pub mod errors;
pub mod index;
pub mod parser;
pub mod query;
pub mod run_export;
pub mod search;
pub mod utils;
