//! The identity codec: a verbatim little-endian u32 stream

use byteorder::{ByteOrder, LittleEndian};

use super::{Codec, FAMILY_NONE};
use crate::errors::Error;

pub struct NoneCodec;

impl Codec for NoneCodec {
    fn name(&self) -> &'static str {
        "none"
    }

    fn family(&self) -> u8 {
        FAMILY_NONE
    }

    fn encode(&self, encoded: &mut Vec<u8>, values: &[u32]) {
        let start = encoded.len();
        encoded.resize(start + 4 * values.len(), 0);
        LittleEndian::write_u32_into(values, &mut encoded[start..]);
    }

    fn decode(&self, decoded: &mut [u32], integers: usize, encoded: &[u8]) -> Result<(), Error> {
        if encoded.len() < 4 * integers {
            return Err(Error::Corrupt(format!(
                "uncompressed sequence of {} bytes holds fewer than {} integers",
                encoded.len(),
                integers
            )));
        }
        LittleEndian::read_u32_into(&encoded[..4 * integers], &mut decoded[..integers]);
        Ok(())
    }
}
