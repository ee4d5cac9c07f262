//! Export a result list in TREC run format
//!
//! Six space-separated columns per result:
//! `<topic-id> Q0 <primary-key> <rank> <rsv> <run-name>`, best result
//! first, suitable for evaluation with trec_eval.

use std::io::{self, Write};

use crate::base::Element;
use crate::query::AnytimeQuery;

pub fn run_export_trec<E: Element>(
    stream: &mut dyn Write,
    topic_id: &str,
    result: &mut AnytimeQuery<E>,
    run_name: &str,
    include_internal_ids: bool,
) -> io::Result<()> {
    let mut current = 0usize;
    let mut next = result.get_first();
    while let Some(document) = next {
        current += 1;
        write!(
            stream,
            "{} Q0 {} {} {} {}",
            topic_id,
            document.primary_key,
            current,
            document.rsv.to_u32(),
            run_name
        )?;
        if include_internal_ids {
            write!(
                stream,
                "(ID:{}->{})",
                document.document_id,
                document.rsv.to_u32()
            )?;
        }
        writeln!(stream)?;
        next = result.get_next();
    }
    Ok(())
}
