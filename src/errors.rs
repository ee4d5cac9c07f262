//! Error types for index loading and query evaluation

use thiserror::Error;

use crate::base::{DocId, MAX_DOCUMENTS, MAX_TOP_K};

#[derive(Error, Debug)]
pub enum Error {
    #[error("the collection holds {0} documents, more than the maximum of {MAX_DOCUMENTS}")]
    TooManyDocuments(u64),

    #[error("top-k of {0} exceeds the maximum of {MAX_TOP_K}")]
    TopKTooLarge(u32),

    #[error("a collection must hold at least one document")]
    EmptyCollection,

    #[error("a rectangle of {0} accumulators exceeds the allocation bound")]
    ArenaTooLarge(u64),

    #[error("duplicate posting for document {document_id} of term {term}")]
    DuplicatePosting { term: String, document_id: DocId },

    #[error("top-k must be at least one")]
    ZeroTopK,

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
