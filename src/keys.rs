use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

pub const KEY_LEN: usize = 8;
const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of record keys. Keys tie a `.conf` row to its payoff and strategy
/// files.
pub trait KeyGenerator: fmt::Debug {
    fn next_key(&mut self) -> String;
}

/// Random 8-character `[A-Z0-9]` keys.
#[derive(Debug, Clone)]
pub struct RandomKeys {
    rng: StdRng,
}

impl RandomKeys {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl KeyGenerator for RandomKeys {
    fn next_key(&mut self) -> String {
        (0..KEY_LEN)
            .map(|_| KEY_ALPHABET[self.rng.gen_range(0..KEY_ALPHABET.len())] as char)
            .collect()
    }
}

/// Deterministic keys `K0000000`, `K0000001`, ...
#[derive(Debug, Clone, Default)]
pub struct SequentialKeys {
    next: u32,
}

impl SequentialKeys {
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }
}

impl KeyGenerator for SequentialKeys {
    fn next_key(&mut self) -> String {
        let key = format!("K{:07}", self.next % 10_000_000);
        self.next = self.next.wrapping_add(1);
        key
    }
}

pub fn is_valid_key(key: &str) -> bool {
    key.len() == KEY_LEN && key.bytes().all(|b| KEY_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_keys_use_the_key_alphabet() {
        let mut keys = RandomKeys::from_entropy();
        for _ in 0..64 {
            let key = keys.next_key();
            assert!(is_valid_key(&key), "bad key {key}");
        }
    }

    #[test]
    fn seeded_keys_are_reproducible() {
        let mut a = RandomKeys::seeded(7);
        let mut b = RandomKeys::seeded(7);
        for _ in 0..8 {
            assert_eq!(a.next_key(), b.next_key());
        }
    }

    #[test]
    fn sequential_keys_count_up() {
        let mut keys = SequentialKeys::starting_at(41);
        assert_eq!(keys.next_key(), "K0000041");
        assert_eq!(keys.next_key(), "K0000042");
        assert!(is_valid_key("K0000042"));
        assert!(!is_valid_key("k0000042"));
    }
}
