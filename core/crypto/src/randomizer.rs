//! Reversible marker-byte randomization.
//!
//! Before encryption the plaintext is cut into windows of
//! [`RANDOMIZER_WINDOW`] bytes and one random marker byte (value 128..=255)
//! is dropped into each window at a random position. Two messages that
//! start with the same plaintext therefore almost never share a leading
//! cipher block, even if an IV were ever repeated.
//!
//! Markers are told apart from data by their high bit, so this only works
//! for 7-bit plaintext. [`first_non_ascii`] lets callers enforce that.

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

use crate::protocol::{MARKER_MIN, RANDOMIZER_WINDOW};

/// Length of `randomize` output for an input of `len` bytes.
pub fn randomized_len(len: usize) -> usize {
    len + len.div_ceil(RANDOMIZER_WINDOW)
}

/// Randomize `data` using the operating system RNG.
///
/// # Preconditions
/// - Every byte of `data` is below 128
pub fn randomize(data: &[u8]) -> Vec<u8> {
    randomize_with(data, &mut OsRng)
}

/// Randomize `data` using the given cryptographically secure RNG.
///
/// # Postconditions
/// - Output length is `randomized_len(data.len())`
/// - Each window of input contributes its bytes in order plus exactly one
///   marker, placed uniformly among the window's positions
pub fn randomize_with<R: RngCore + CryptoRng>(data: &[u8], rng: &mut R) -> Vec<u8> {
    let mut out = Vec::with_capacity(randomized_len(data.len()));

    for chunk in data.chunks(RANDOMIZER_WINDOW) {
        // The marker may land before, between or after the chunk's bytes,
        // so there are chunk.len() + 1 candidate slots.
        let slot = rng.gen_range(0..=chunk.len());
        let marker = rng.gen_range(MARKER_MIN..=u8::MAX);

        out.extend_from_slice(&chunk[..slot]);
        out.push(marker);
        out.extend_from_slice(&chunk[slot..]);
    }

    out
}

/// Strip marker bytes, keeping everything below 128 in order.
pub fn derandomize(data: &[u8]) -> Vec<u8> {
    data.iter().copied().filter(|b| *b < MARKER_MIN).collect()
}

/// Position and value of the first byte that `derandomize` would drop.
pub fn first_non_ascii(data: &[u8]) -> Option<(usize, u8)> {
    data.iter()
        .copied()
        .enumerate()
        .find(|(_, b)| *b >= MARKER_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_roundtrip() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let randomized = randomize(data);
        assert_eq!(derandomize(&randomized), data);
    }

    #[test]
    fn test_empty_input() {
        assert!(randomize(b"").is_empty());
        assert!(derandomize(b"").is_empty());
    }

    #[test]
    fn test_lengths_at_window_edges() {
        for (len, expected) in [(1, 2), (15, 16), (16, 17), (17, 19), (32, 34), (33, 36)] {
            let data = vec![b'a'; len];
            assert_eq!(randomize(&data).len(), expected, "input length {}", len);
            assert_eq!(randomized_len(len), expected);
        }
    }

    #[test]
    fn test_one_marker_per_window() {
        let data = vec![b'x'; 100];
        let out = randomize(&data);

        let markers = out.iter().filter(|b| **b >= MARKER_MIN).count();
        assert_eq!(markers, 7);

        for window in out.chunks(RANDOMIZER_WINDOW + 1) {
            assert_eq!(window.iter().filter(|b| **b >= MARKER_MIN).count(), 1);
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let data = b"HELLO";
        let a = randomize_with(data, &mut StdRng::seed_from_u64(7));
        let b = randomize_with(data, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_marker_positions_vary() {
        let data = vec![0u8; 16];
        let mut rng = StdRng::seed_from_u64(42);
        let positions: std::collections::HashSet<usize> = (0..200)
            .map(|_| {
                randomize_with(&data, &mut rng)
                    .iter()
                    .position(|b| *b >= MARKER_MIN)
                    .unwrap()
            })
            .collect();
        // 17 slots, 200 draws
        assert!(positions.len() > 10);
    }

    #[test]
    fn test_derandomize_drops_high_bytes() {
        assert_eq!(derandomize(&[0x80, b'a', 0xFF, b'b', 0xC3]), b"ab");
    }

    #[test]
    fn test_first_non_ascii() {
        assert_eq!(first_non_ascii(b"plain ascii"), None);
        assert_eq!(first_non_ascii("caf\u{e9}".as_bytes()), Some((3, 0xC3)));
    }
}
