//! SIMD-BP128: full blocks of 128 integers are bit-packed with a one-byte
//! width prefix; a partial tail block falls back to variable-byte

use bitpacking::{BitPacker, BitPacker4x};

use super::{vbyte, Codec, FAMILY_SIMDBP};
use crate::errors::Error;

pub const BLOCK_LEN: usize = BitPacker4x::BLOCK_LEN;

pub struct SimdBpCodec;

impl Codec for SimdBpCodec {
    fn name(&self) -> &'static str {
        "simdbp"
    }

    fn family(&self) -> u8 {
        FAMILY_SIMDBP
    }

    fn encode(&self, encoded: &mut Vec<u8>, values: &[u32]) {
        let bitpacker = BitPacker4x::new();
        for chunk in values.chunks(BLOCK_LEN) {
            if chunk.len() == BLOCK_LEN {
                let num_bits = bitpacker.num_bits(chunk);
                encoded.push(num_bits);
                let start = encoded.len();
                encoded.resize(start + BitPacker4x::compressed_block_size(num_bits), 0);
                bitpacker.compress(chunk, &mut encoded[start..], num_bits);
            } else {
                for &value in chunk {
                    vbyte::encode_one(encoded, value);
                }
            }
        }
    }

    fn decode(&self, decoded: &mut [u32], integers: usize, encoded: &[u8]) -> Result<(), Error> {
        let bitpacker = BitPacker4x::new();
        let mut at = 0usize;
        for chunk in decoded[..integers].chunks_mut(BLOCK_LEN) {
            if chunk.len() == BLOCK_LEN {
                let num_bits = *encoded
                    .get(at)
                    .ok_or_else(|| Error::Corrupt("bit-packed sequence ends early".to_string()))?;
                at += 1;
                let block_size = BitPacker4x::compressed_block_size(num_bits);
                if encoded.len() < at + block_size {
                    return Err(Error::Corrupt(format!(
                        "bit-packed block of {} bytes is truncated",
                        block_size
                    )));
                }
                at += bitpacker.decompress(&encoded[at..at + block_size], chunk, num_bits);
            } else {
                for slot in chunk.iter_mut() {
                    let (value, consumed) = vbyte::decode_one(&encoded[at..])?;
                    *slot = value;
                    at += consumed;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(values: &[u32]) {
        let mut encoded = Vec::new();
        SimdBpCodec.encode(&mut encoded, values);

        let mut decoded = vec![0u32; values.len()];
        SimdBpCodec.decode(&mut decoded, values.len(), &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_tail_only() {
        round_trip(&[1, 7, 0, 300, 2]);
    }

    #[test]
    fn test_exact_blocks() {
        let values: Vec<u32> = (0..2 * BLOCK_LEN as u32).map(|i| (i * 7) % 1000).collect();
        round_trip(&values);
    }

    #[test]
    fn test_blocks_and_tail() {
        let values: Vec<u32> = (0..BLOCK_LEN as u32 + 37).map(|i| i % 256 + 1).collect();
        round_trip(&values);
    }

    #[test]
    fn test_constant_block() {
        // a zero-gap block packs down to the width prefix alone
        let values = vec![0u32; BLOCK_LEN];
        let mut encoded = Vec::new();
        SimdBpCodec.encode(&mut encoded, &values);
        assert_eq!(encoded.len(), 1);

        let mut decoded = vec![1u32; BLOCK_LEN];
        SimdBpCodec.decode(&mut decoded, BLOCK_LEN, &encoded).unwrap();
        assert!(decoded.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_truncated_input() {
        let values: Vec<u32> = (0..BLOCK_LEN as u32).collect();
        let mut encoded = Vec::new();
        SimdBpCodec.encode(&mut encoded, &values);
        encoded.truncate(encoded.len() - 1);

        let mut decoded = vec![0u32; BLOCK_LEN];
        let result = SimdBpCodec.decode(&mut decoded, BLOCK_LEN, &encoded);
        assert!(matches!(result, Err(Error::Corrupt(_))));
    }
}
