//! Wire codec for notifier keys
//!
//! The channel carries nothing but keys: a stream of 4-byte unsigned
//! integers in host byte order. There is no framing beyond 4-byte
//! alignment, so a read may end in the middle of a key. `KeyDecoder`
//! keeps those trailing bytes until the next read completes them.

use crate::constants::KEY_WIRE_SIZE;
use crate::key::NotifyKey;

/// Encode one key for the wire
#[inline]
pub fn encode_key(key: NotifyKey) -> [u8; KEY_WIRE_SIZE] {
    key.as_u32().to_ne_bytes()
}

/// Stream decoder that reassembles keys split across reads
#[derive(Debug, Default)]
pub struct KeyDecoder {
    /// Bytes of an incomplete key carried over from the previous read
    tail: [u8; KEY_WIRE_SIZE],
    tail_len: usize,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, appending complete keys to `out` in arrival order
    ///
    /// Returns the number of keys appended. Up to 3 leftover bytes are
    /// retained for the next call.
    pub fn feed(&mut self, mut bytes: &[u8], out: &mut Vec<NotifyKey>) -> usize {
        let before = out.len();

        if self.tail_len > 0 {
            let need = KEY_WIRE_SIZE - self.tail_len;
            let take = need.min(bytes.len());
            self.tail[self.tail_len..self.tail_len + take].copy_from_slice(&bytes[..take]);
            self.tail_len += take;
            bytes = &bytes[take..];

            if self.tail_len < KEY_WIRE_SIZE {
                return 0;
            }
            out.push(NotifyKey::new(u32::from_ne_bytes(self.tail)));
            self.tail_len = 0;
        }

        let chunks = bytes.chunks_exact(KEY_WIRE_SIZE);
        let rest = chunks.remainder();
        for chunk in chunks {
            let mut raw = [0u8; KEY_WIRE_SIZE];
            raw.copy_from_slice(chunk);
            out.push(NotifyKey::new(u32::from_ne_bytes(raw)));
        }

        self.tail[..rest.len()].copy_from_slice(rest);
        self.tail_len = rest.len();

        out.len() - before
    }

    /// Number of buffered bytes waiting for the rest of a key
    #[inline]
    pub fn pending(&self) -> usize {
        self.tail_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(keys: &[u32]) -> Vec<u8> {
        keys.iter()
            .flat_map(|k| encode_key(NotifyKey::new(*k)))
            .collect()
    }

    #[test]
    fn test_whole_keys() {
        let mut dec = KeyDecoder::new();
        let mut out = Vec::new();

        let n = dec.feed(&wire(&[7, 0, u32::MAX]), &mut out);
        assert_eq!(n, 3);
        assert_eq!(out, vec![NotifyKey::new(7), NotifyKey::new(0), NotifyKey::new(u32::MAX)]);
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn test_key_split_two_and_two() {
        let mut dec = KeyDecoder::new();
        let mut out = Vec::new();
        let bytes = wire(&[0xA1B2_C3D4]);

        assert_eq!(dec.feed(&bytes[..2], &mut out), 0);
        assert_eq!(dec.pending(), 2);
        assert!(out.is_empty());

        assert_eq!(dec.feed(&bytes[2..], &mut out), 1);
        assert_eq!(out, vec![NotifyKey::new(0xA1B2_C3D4)]);
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn test_split_across_many_reads() {
        let mut dec = KeyDecoder::new();
        let mut out = Vec::new();
        let bytes = wire(&[1, 2, 3]);

        // 12 bytes delivered as 5 + 1 + 1 + 5
        dec.feed(&bytes[..5], &mut out);
        assert_eq!(out.len(), 1);
        dec.feed(&bytes[5..6], &mut out);
        dec.feed(&bytes[6..7], &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(dec.pending(), 3);
        dec.feed(&bytes[7..], &mut out);

        assert_eq!(out, vec![NotifyKey::new(1), NotifyKey::new(2), NotifyKey::new(3)]);
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn test_empty_feed() {
        let mut dec = KeyDecoder::new();
        let mut out = Vec::new();
        assert_eq!(dec.feed(&[], &mut out), 0);
        assert_eq!(dec.pending(), 0);
    }
}
