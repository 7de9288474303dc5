//! Random id generation for groups and blocks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Characters used in generated ids. Excludes quotes, `&`, `<`, `>`, `\` and
/// whitespace so ids survive XML attributes and JSON strings unescaped.
pub const ID_SOUP: &[u8] =
    b"!#$%()*+,-./:;=?@[]^_`{|}~ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug)]
pub struct IdGenerator {
    rng: StdRng,
    len: usize,
}

impl IdGenerator {
    #[must_use]
    pub fn from_entropy(len: usize) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            len,
        }
    }

    /// Deterministic sequence for tests and reproducible replays.
    #[must_use]
    pub fn seeded(seed: u64, len: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            len,
        }
    }

    pub fn next_id(&mut self) -> String {
        (0..self.len.max(1))
            .map(|_| char::from(ID_SOUP[self.rng.gen_range(0..ID_SOUP.len())]))
            .collect()
    }
}
