use std::collections::HashMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{EncodingError, Result};

/// Maximum number of entries one header block can carry.
pub const MAX_HEADER_COUNT: usize = u16::MAX as usize;

/// Maximum encoded length of a single key or value.
pub const MAX_ENTRY_LEN: usize = u16::MAX as usize;

/// Encode application headers into the binary header block.
///
/// Wire format, big-endian:
/// ```text
/// ┌──────────┬─────────────────────────────────────────────┐
/// │ nh (2B)  │ nh × ( klen (2B) key  vlen (2B) value )     │
/// └──────────┴─────────────────────────────────────────────┘
/// ```
/// Entries are written in sorted key order so equal maps encode to equal
/// bytes.
pub fn encode_header_block(headers: &HashMap<String, String>) -> Result<Bytes> {
    if headers.len() > MAX_HEADER_COUNT {
        return Err(EncodingError::TooManyHeaders {
            count: headers.len(),
            max: MAX_HEADER_COUNT,
        });
    }

    let mut buf = BytesMut::with_capacity(2 + headers.len() * 16);
    buf.put_u16(headers.len() as u16);

    let mut keys: Vec<&String> = headers.keys().collect();
    keys.sort();

    for key in keys {
        put_entry(&mut buf, key)?;
        put_entry(&mut buf, &headers[key])?;
    }

    Ok(buf.freeze())
}

/// Decode a binary header block back into a map.
///
/// Rejects truncated blocks, trailing bytes, and non-UTF-8 entries. On
/// duplicate keys the last entry wins, matching merge semantics elsewhere.
pub fn decode_header_block(block: &[u8]) -> Result<HashMap<String, String>> {
    let mut src = block;
    if src.remaining() < 2 {
        return Err(EncodingError::Truncated);
    }
    let count = src.get_u16() as usize;

    let mut headers = HashMap::with_capacity(count);
    for _ in 0..count {
        let key = get_entry(&mut src)?;
        let value = get_entry(&mut src)?;
        headers.insert(key, value);
    }

    if src.has_remaining() {
        return Err(EncodingError::TrailingBytes(src.remaining()));
    }

    Ok(headers)
}

fn put_entry(buf: &mut BytesMut, entry: &str) -> Result<()> {
    if entry.len() > MAX_ENTRY_LEN {
        return Err(EncodingError::EntryTooLong {
            len: entry.len(),
            max: MAX_ENTRY_LEN,
        });
    }
    buf.put_u16(entry.len() as u16);
    buf.put_slice(entry.as_bytes());
    Ok(())
}

fn get_entry(src: &mut &[u8]) -> Result<String> {
    if src.remaining() < 2 {
        return Err(EncodingError::Truncated);
    }
    let len = src.get_u16() as usize;
    if src.remaining() < len {
        return Err(EncodingError::Truncated);
    }
    let entry = std::str::from_utf8(&src[..len])?.to_string();
    src.advance(len);
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HashMap<String, String> {
        HashMap::from([
            ("trace-id".to_string(), "abc123".to_string()),
            ("tenant".to_string(), "acme".to_string()),
        ])
    }

    #[test]
    fn encode_decode_roundtrip() {
        let headers = sample();
        let block = encode_header_block(&headers).unwrap();
        let decoded = decode_header_block(&block).unwrap();
        assert_eq!(decoded, headers);
    }

    #[test]
    fn empty_map_is_two_bytes() {
        let block = encode_header_block(&HashMap::new()).unwrap();
        assert_eq!(block.as_ref(), &[0, 0]);
        assert!(decode_header_block(&block).unwrap().is_empty());
    }

    #[test]
    fn encoding_is_deterministic() {
        let headers = sample();
        let first = encode_header_block(&headers).unwrap();
        let second = encode_header_block(&headers).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn truncated_block_rejected() {
        let block = encode_header_block(&sample()).unwrap();
        let cut = &block[..block.len() - 3];
        assert!(matches!(
            decode_header_block(cut),
            Err(EncodingError::Truncated)
        ));
    }

    #[test]
    fn missing_count_rejected() {
        assert!(matches!(
            decode_header_block(&[0x01]),
            Err(EncodingError::Truncated)
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode_header_block(&sample()).unwrap().to_vec();
        bytes.push(0xAA);
        assert!(matches!(
            decode_header_block(&bytes),
            Err(EncodingError::TrailingBytes(1))
        ));
    }

    #[test]
    fn non_utf8_entry_rejected() {
        // count=1, klen=2, then invalid UTF-8 key bytes
        let bytes = [0x00, 0x01, 0x00, 0x02, 0xff, 0xfe, 0x00, 0x00];
        assert!(matches!(
            decode_header_block(&bytes),
            Err(EncodingError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn oversized_value_rejected() {
        let headers = HashMap::from([("k".to_string(), "v".repeat(MAX_ENTRY_LEN + 1))]);
        assert!(matches!(
            encode_header_block(&headers),
            Err(EncodingError::EntryTooLong { .. })
        ));
    }
}
