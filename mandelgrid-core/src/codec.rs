//! Tag-prefixed chunk serialization.
//!
//! A serialized chunk is one tag byte followed by a body:
//!
//! - tag `0`, Raw: exactly `W·W` bytes, the flattened row-major grid;
//! - tag `1`, RLE: fixed 5-byte runs `(count: u32 LE, value: u8)` whose
//!   counts must sum to exactly `W·W`.
//!
//! Chunks are dominated by uniform interior and border regions, so RLE is
//! close to optimal for them; [`encode_chunk`] emits whichever form is
//! smaller. Worker-to-coordinator submission does not go through this module:
//! it is always the untagged raw grid, since both ends know the size.

use crate::chunk::Chunk;
use crate::config::GridConfig;
use crate::error::{Error, Result};

const TAG_RAW: u8 = 0;
const TAG_RLE: u8 = 1;

/// Bytes per RLE run: a u32 count plus a u8 value.
const RLE_RUN_LEN: usize = 5;

/// Serialize a chunk, choosing whichever of Raw/RLE is smaller. The output
/// is always tag-prefixed.
pub fn encode_chunk(chunk: &Chunk) -> Vec<u8> {
    let raw = chunk.as_bytes();
    let rle = encode_rle_body(raw);
    if rle.len() < raw.len() {
        let mut out = Vec::with_capacity(1 + rle.len());
        out.push(TAG_RLE);
        out.extend_from_slice(&rle);
        out
    } else {
        let mut out = Vec::with_capacity(1 + raw.len());
        out.push(TAG_RAW);
        out.extend_from_slice(raw);
        out
    }
}

/// Deserialize a tag-prefixed chunk payload.
pub fn decode_chunk(payload: &[u8], config: &GridConfig) -> Result<Chunk> {
    let (&tag, body) = payload
        .split_first()
        .ok_or_else(|| Error::Format("empty chunk payload".to_string()))?;
    match tag {
        TAG_RAW => Chunk::from_bytes(body.to_vec(), config),
        TAG_RLE => Chunk::from_bytes(decode_rle_body(body, config.chunk_len())?, config),
        other => Err(Error::Format(format!(
            "unknown serialization tag {other:#04x}"
        ))),
    }
}

fn encode_rle_body(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut iter = bytes.iter();
    let Some(&first) = iter.next() else {
        return out;
    };
    let mut value = first;
    let mut count: u32 = 1;
    for &b in iter {
        if b == value {
            count += 1;
        } else {
            push_run(&mut out, count, value);
            value = b;
            count = 1;
        }
    }
    push_run(&mut out, count, value);
    out
}

fn push_run(out: &mut Vec<u8>, count: u32, value: u8) {
    out.extend_from_slice(&count.to_le_bytes());
    out.push(value);
}

fn decode_rle_body(body: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    if body.len() % RLE_RUN_LEN != 0 {
        return Err(Error::Format(format!(
            "RLE body of {} bytes is not a whole number of {}-byte runs",
            body.len(),
            RLE_RUN_LEN
        )));
    }
    let mut out = Vec::with_capacity(expected_len);
    for run in body.chunks_exact(RLE_RUN_LEN) {
        let mut quad = [0u8; 4];
        quad.copy_from_slice(&run[0..4]);
        let count = u32::from_le_bytes(quad) as usize;
        let value = run[4];
        if out.len() + count > expected_len {
            return Err(Error::Format(format!(
                "RLE runs overflow the chunk: {} + {} > {}",
                out.len(),
                count,
                expected_len
            )));
        }
        out.resize(out.len() + count, value);
    }
    if out.len() != expected_len {
        return Err(Error::Format(format!(
            "RLE runs reconstruct {} bytes, expected {}",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}
