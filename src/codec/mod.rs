//! Integer codecs for the delta-encoded document id lists
//!
//! Every codec carries the delta stream: `encode` consumes d-gaps and
//! `decode` reproduces them. Recovering absolute document ids is the
//! evaluator's job, through [`cumulative_sum`], so the convention holds
//! engine-wide whichever family an index was written with.

use std::sync::Arc;

use log::warn;

use crate::errors::Error;

pub mod none;
pub mod simdbp;
pub mod vbyte;

pub use none::NoneCodec;
pub use simdbp::SimdBpCodec;
pub use vbyte::VByteCodec;

/// Family marker stored as the first byte of a postings blob
pub const FAMILY_NONE: u8 = b's';
pub const FAMILY_VBYTE: u8 = b'v';
pub const FAMILY_SIMDBP: u8 = b'p';

/// An interchangeable integer codec. Implementations are stateless, so one
/// instance can be shared by any number of evaluators.
pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;

    /// The family marker this codec writes into a postings blob
    fn family(&self) -> u8;

    /// Append the encoded form of `values` to `encoded`
    fn encode(&self, encoded: &mut Vec<u8>, values: &[u32]);

    /// Decode exactly `integers` values into the front of `decoded`
    fn decode(&self, decoded: &mut [u32], integers: usize, encoded: &[u8]) -> Result<(), Error>;
}

/// In-place prefix sum turning a d-gap sequence into absolute ids
#[inline]
pub fn cumulative_sum(buffer: &mut [u32]) {
    let mut id = 0u32;
    for value in buffer.iter_mut() {
        id = id.wrapping_add(*value);
        *value = id;
    }
}

/// Return the codec named by a postings blob's leading family byte.
/// Unknown markers (and an empty blob) fall back to the uncompressed
/// family.
pub fn for_family(family: Option<u8>) -> Arc<dyn Codec> {
    match family {
        Some(FAMILY_VBYTE) => Arc::new(VByteCodec),
        Some(FAMILY_SIMDBP) => Arc::new(SimdBpCodec),
        Some(FAMILY_NONE) | None => Arc::new(NoneCodec),
        Some(other) => {
            warn!("Unknown codec family {:#x}, assuming uncompressed", other);
            Arc::new(NoneCodec)
        }
    }
}

/// Return a codec by its configuration name
pub fn get_by_name(name: &str) -> Arc<dyn Codec> {
    match name {
        "vbyte" => Arc::new(VByteCodec),
        "simdbp" => Arc::new(SimdBpCodec),
        "none" => Arc::new(NoneCodec),
        other => {
            warn!("Unknown codec name {}, assuming uncompressed", other);
            Arc::new(NoneCodec)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumulative_sum() {
        let mut buffer = [1, 1, 1, 2, 5];
        cumulative_sum(&mut buffer);
        assert_eq!(buffer, [1, 2, 3, 5, 10]);
    }

    #[test]
    fn test_family_dispatch() {
        assert_eq!(for_family(Some(FAMILY_VBYTE)).name(), "vbyte");
        assert_eq!(for_family(Some(FAMILY_SIMDBP)).name(), "simdbp");
        assert_eq!(for_family(Some(FAMILY_NONE)).name(), "none");
        assert_eq!(for_family(Some(b'?')).name(), "none");
        assert_eq!(for_family(None).name(), "none");
    }
}
