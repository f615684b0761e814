//! Yaz0 envelope (§4.9): the run-length+back-reference compression Nintendo
//! wraps around BYML (and other) files on disk. Implemented natively here;
//! the header is 16 bytes (`Yaz0`, big-endian uncompressed size, alignment,
//! reserved) followed by a standard LZSS byte stream gated by an 8-bit
//! group flag per 8 tokens.

use std::borrow::Cow;

const MAGIC: [u8; 4] = *b"Yaz0";
const HEADER_LEN: usize = 16;
const WINDOW: usize = 0x1000;
const MIN_MATCH: usize = 3;
const MAX_SHORT_MATCH: usize = 0x12 - 1;
const MAX_LONG_MATCH: usize = 0xff + 0x12;

/// Errors decompressing or decoding a Yaz0 envelope.
#[derive(Debug, thiserror::Error)]
pub enum Yaz0Error {
    #[error("invalid Yaz0 magic, expected `Yaz0`, found {0:02x?}")]
    BadMagic([u8; 4]),
    #[error("truncated Yaz0 stream at output offset {0}")]
    Truncated(usize),
    #[error("back-reference at output offset {0} reaches before the start of the buffer")]
    BadBackref(usize),
}

/// Decompresses a Yaz0-framed buffer.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Yaz0Error> {
    if data.len() < HEADER_LEN || data[0..4] != MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(data.get(0..4).unwrap_or(&[0, 0, 0, 0]));
        return Err(Yaz0Error::BadMagic(magic));
    }
    let uncompressed_size = u32::from_be_bytes(data[4..8].try_into().unwrap()) as usize;
    let payload = &data[HEADER_LEN..];
    let mut out = Vec::with_capacity(uncompressed_size);
    let mut pos = 0usize;
    let mut group = 0u8;
    let mut group_bits = 0u32;

    while out.len() < uncompressed_size {
        if group_bits == 0 {
            group = *payload.get(pos).ok_or(Yaz0Error::Truncated(out.len()))?;
            pos += 1;
            group_bits = 8;
        }
        if group & 0x80 != 0 {
            let byte = *payload.get(pos).ok_or(Yaz0Error::Truncated(out.len()))?;
            pos += 1;
            out.push(byte);
        } else {
            let b0 = *payload.get(pos).ok_or(Yaz0Error::Truncated(out.len()))?;
            let b1 = *payload.get(pos + 1).ok_or(Yaz0Error::Truncated(out.len()))?;
            pos += 2;
            let distance = (((b0 & 0x0f) as usize) << 8 | b1 as usize) + 1;
            let length = if b0 >> 4 == 0 {
                let b2 = *payload.get(pos).ok_or(Yaz0Error::Truncated(out.len()))?;
                pos += 1;
                b2 as usize + 0x12
            } else {
                (b0 >> 4) as usize + 2
            };
            let start = out
                .len()
                .checked_sub(distance)
                .ok_or(Yaz0Error::BadBackref(out.len()))?;
            for i in 0..length {
                let byte = out[start + i];
                out.push(byte);
            }
        }
        group <<= 1;
        group_bits -= 1;
    }
    Ok(out)
}

/// Decompresses `data` if it carries a Yaz0 header, otherwise returns it
/// unchanged. Used by loaders that accept both framed and plain input.
pub fn decompress_if(data: &[u8]) -> Result<Cow<[u8]>, Yaz0Error> {
    if data.starts_with(&MAGIC) {
        Ok(Cow::Owned(decompress(data)?))
    } else {
        Ok(Cow::Borrowed(data))
    }
}

fn longest_match(data: &[u8], pos: usize, search_depth: usize) -> Option<(usize, usize)> {
    let window_start = pos.saturating_sub(WINDOW);
    let max_len = MAX_LONG_MATCH.min(data.len() - pos);
    if max_len < MIN_MATCH {
        return None;
    }
    let mut best_len = 0;
    let mut best_distance = 0;
    let mut checked = 0;
    for candidate in (window_start..pos).rev() {
        if checked >= search_depth {
            break;
        }
        checked += 1;
        if data[candidate] != data[pos] {
            continue;
        }
        let mut len = 0;
        while len < max_len && data[candidate + len] == data[pos + len] {
            len += 1;
        }
        if len > best_len {
            best_len = len;
            best_distance = pos - candidate;
            if best_len >= MAX_LONG_MATCH {
                break;
            }
        }
    }
    if best_len >= MIN_MATCH {
        Some((best_distance, best_len))
    } else {
        None
    }
}

/// Compresses `data` into a Yaz0 envelope, searching up to `search_depth`
/// candidate back-references per position (higher is slower but denser;
/// the public `compress`/`compress_with_level` pick this for the caller).
fn compress_with_search_depth(data: &[u8], search_depth: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + data.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&[0u8; 8]); // alignment + reserved, unused on this path

    let mut pos = 0usize;
    let mut group_pos = out.len();
    out.push(0); // placeholder group byte
    let mut group = 0u8;
    let mut group_bits = 0u32;
    let mut pending = Vec::new();

    while pos < data.len() {
        if group_bits == 8 {
            out[group_pos] = group;
            out.append(&mut pending);
            group_pos = out.len();
            out.push(0);
            group = 0;
            group_bits = 0;
        }
        let m = longest_match(data, pos, search_depth);
        group <<= 1;
        match m {
            Some((distance, length)) => {
                let dist_bits = (distance - 1) as u16;
                if length <= MAX_SHORT_MATCH {
                    let b0 = (((length - 2) as u8) << 4) | ((dist_bits >> 8) as u8 & 0x0f);
                    let b1 = (dist_bits & 0xff) as u8;
                    pending.push(b0);
                    pending.push(b1);
                } else {
                    let b0 = (dist_bits >> 8) as u8 & 0x0f;
                    let b1 = (dist_bits & 0xff) as u8;
                    let b2 = (length - 0x12) as u8;
                    pending.push(b0);
                    pending.push(b1);
                    pending.push(b2);
                }
                pos += length;
            }
            None => {
                group |= 1;
                pending.push(data[pos]);
                pos += 1;
            }
        }
        group_bits += 1;
    }
    if group_bits > 0 {
        group <<= 8 - group_bits;
        out[group_pos] = group;
        out.append(&mut pending);
    } else {
        out.truncate(group_pos);
    }
    out
}

/// Search-effort knob for [`compress_with_level`], `0` (fastest, weakest
/// compression) through `9` (slowest, densest).
const LEVEL_DEPTHS: [usize; 10] = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512];

/// Compresses `data` at the given level, `0` (fastest) through `9`
/// (smallest output). Out-of-range levels clamp to the nearest end.
pub fn compress_with_level(data: &[u8], level: u8) -> Vec<u8> {
    let depth = LEVEL_DEPTHS[(level as usize).min(LEVEL_DEPTHS.len() - 1)];
    compress_with_search_depth(data, depth)
}

/// Compresses `data` at a reasonable default level.
pub fn compress(data: &[u8]) -> Vec<u8> {
    compress_with_level(data, 6)
}

/// Compresses `data` at `level` only if `should_compress` is set, otherwise
/// returns it unchanged. Mirrors [`decompress_if`] for callers (the CLI
/// binaries) that decide compression from a file extension rather than
/// content sniffing.
pub fn compress_if(data: &[u8], should_compress: bool, level: u8) -> Cow<[u8]> {
    if should_compress {
        Cow::Owned(compress_with_level(data, level))
    } else {
        Cow::Borrowed(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) {
        let compressed = compress(data);
        assert_eq!(&compressed[0..4], b"Yaz0");
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn empty_input() {
        round_trip(&[]);
    }

    #[test]
    fn repeated_bytes() {
        round_trip(&[0x41; 500]);
    }

    #[test]
    fn mixed_literals_and_runs() {
        let mut data = Vec::new();
        for i in 0..2000u32 {
            data.push((i % 17) as u8);
        }
        round_trip(&data);
    }

    #[test]
    fn bad_magic_rejected() {
        assert!(matches!(
            decompress(&[0u8; 16]),
            Err(Yaz0Error::BadMagic(_))
        ));
    }

    #[test]
    fn decompress_if_passthrough() {
        let plain = b"not compressed".to_vec();
        let result = decompress_if(&plain).unwrap();
        assert_eq!(&*result, plain.as_slice());
    }

    #[test]
    fn levels_all_round_trip() {
        let data = b"the quick brown fox jumps over the lazy dog the quick brown fox".to_vec();
        for level in 0..=9u8 {
            let compressed = compress_with_level(&data, level);
            assert_eq!(decompress(&compressed).unwrap(), data);
        }
    }
}
