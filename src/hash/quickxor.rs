//! QuickXorHash, the content hash OneDrive reports for every file.
//!
//! Input bytes are XORed into a 160-bit state, each successive byte shifted
//! 11 bits further than the previous one (wrapping at 160). The file length
//! is XORed into the last 64 bits of the result.
//!
//! The shift pattern repeats every 160 input bytes and a byte's position in
//! that cycle fixes its bit offset, so the state can be kept as 1760
//! byte-wide lanes (byte `k` goes to lane `k % 1760`) and folded into the
//! 160-bit value once at the end.

use crate::base64::base64_encode;

/// Digest width in bits.
const WIDTH_BITS: usize = 160;
/// Bit shift applied per input byte.
const SHIFT: usize = 11;
/// Input bytes before the lane pattern repeats.
const LANES: usize = SHIFT * WIDTH_BITS;

/// Digest length in bytes.
pub const DIGEST_LEN: usize = WIDTH_BITS / 8;

/// Streaming QuickXorHash state.
#[derive(Clone)]
pub struct QuickXorHash {
    lanes: Box<[u8; LANES]>,
    len: u64,
}

impl Default for QuickXorHash {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QuickXorHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuickXorHash").field("len", &self.len).finish()
    }
}

impl QuickXorHash {
    pub fn new() -> Self {
        Self {
            lanes: Box::new([0u8; LANES]),
            len: 0,
        }
    }

    /// Feed more input.
    pub fn update(&mut self, data: &[u8]) {
        let mut lane = (self.len % LANES as u64) as usize;
        for &byte in data {
            self.lanes[lane] ^= byte;
            lane += 1;
            if lane == LANES {
                lane = 0;
            }
        }
        self.len += data.len() as u64;
    }

    /// Total bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw 20-byte digest.
    pub fn finalize(&self) -> [u8; DIGEST_LEN] {
        // One spare byte catches bits that spill past bit 159.
        let mut acc = [0u8; DIGEST_LEN + 1];
        for (index, &byte) in self.lanes.iter().enumerate() {
            let offset = (index * SHIFT) % WIDTH_BITS;
            let wide = (byte as u16) << (offset % 8);
            acc[offset / 8] ^= wide as u8;
            acc[offset / 8 + 1] ^= (wide >> 8) as u8;
        }
        acc[0] ^= acc[DIGEST_LEN];

        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&acc[..DIGEST_LEN]);
        for (slot, len_byte) in digest[DIGEST_LEN - 8..]
            .iter_mut()
            .zip(self.len.to_le_bytes())
        {
            *slot ^= len_byte;
        }
        digest
    }

    /// Digest in the base64 form the service reports.
    pub fn to_base64(&self) -> String {
        base64_encode(&self.finalize())
    }
}

/// Hash a byte slice in one call.
pub fn quickxor_base64(data: &[u8]) -> String {
    let mut hasher = QuickXorHash::new();
    hasher.update(data);
    hasher.to_base64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        let cases: [(&[u8], &str); 5] = [
            (b"", "AAAAAAAAAAAAAAAAAAAAAAAAAAA="),
            (b"a", "YQAAAAAAAAAAAAAAAQAAAAAAAAA="),
            (b"hello world", "aCgDG9jwBhDc4Q1yawMZAAAAAAA="),
            (b"Hello, World!", "SCgDG9jwBhaA4ApvnQMbyBACAAA="),
            (
                b"The quick brown fox jumps over the lazy dog",
                "bMSlbysmxJL6S75XwfMcQZOpcr4=",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(quickxor_base64(input), expected, "{:?}", input);
        }
    }

    #[test]
    fn test_vectors_past_one_lane_cycle() {
        let repeated: Vec<u8> = (0..=255u8).cycle().take(2560).collect();
        assert_eq!(quickxor_base64(&repeated), "AAAAAAAAAAAAAAAAAAoAAAAAAAA=");

        let long: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(quickxor_base64(&long), "w5L+yXEbQ4GhItZONbG3zV6jdSU=");
    }

    #[test]
    fn test_split_updates_match_single_update() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i.wrapping_mul(31) % 256) as u8).collect();
        let whole = quickxor_base64(&data);

        for split in [1usize, 159, 160, 1759, 1760, 1761, 4096] {
            let mut hasher = QuickXorHash::new();
            for piece in data.chunks(split) {
                hasher.update(piece);
            }
            assert_eq!(hasher.to_base64(), whole, "split {}", split);
            assert_eq!(hasher.len(), data.len() as u64);
        }
    }

    #[test]
    fn test_order_sensitive_and_deterministic() {
        assert_eq!(quickxor_base64(b"ab"), "YRADAAAAAAAAAAAAAgAAAAAAAAA=");
        assert_eq!(quickxor_base64(b"ba"), "YggDAAAAAAAAAAAAAgAAAAAAAAA=");
        assert_eq!(quickxor_base64(b"ab"), quickxor_base64(b"ab"));
    }
}
