//! The djb2 string hash (Bernstein): seed 5381, then `hash * 33 + byte` per byte.

use std::hash::{BuildHasherDefault, Hasher};

/// Initial value of the djb2 recurrence
const SEED: u64 = 5381;

/// Hashes `bytes` with djb2, wrapping on overflow.
///
/// ```
/// use djb2_table::djb2;
///
/// assert_eq!(djb2(b""), 5381);
/// assert_eq!(djb2(b"a"), 5381 * 33 + 97);
/// ```
#[must_use]
pub fn djb2(bytes: &[u8]) -> u64 {
    bytes.iter().fold(SEED, |hash, &byte| fold(hash, byte))
}

/// One step of the recurrence
#[inline]
fn fold(hash: u64, byte: u8) -> u64 {
    // (hash << 5) + hash == hash * 33
    hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(u64::from(byte))
}

/// [`Hasher`] that feeds every written byte through djb2.
///
/// Note that `str`'s `Hash` impl appends a `0xff` terminator, so hashing a
/// `&str` through this hasher does not give the same digest as [`djb2`] on its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Djb2Hasher(u64);

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self(SEED)
    }
}

impl Hasher for Djb2Hasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0 = bytes.iter().fold(self.0, |hash, &byte| fold(hash, byte));
    }
}

/// Builds [`Djb2Hasher`]s, for plugging djb2 into `std` collections
pub type BuildDjb2 = BuildHasherDefault<Djb2Hasher>;
