//! Injectable randomness for customer generation and shop ordering.
//!
//! Game logic only ever talks to [`RandomSource`]; the runtime hands it a
//! seeded [`CountingRng`] from an [`RngBundle`], tests hand it a
//! [`ScriptedRandom`].

use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::Sha256;
use std::ops::RangeInclusive;

/// Minimal random capability required by the game rules.
pub trait RandomSource {
    /// Uniform index in `0..bound`. Returns 0 when `bound` is 0.
    fn below(&mut self, bound: usize) -> usize;
}

/// Fisher-Yates shuffle driven by a [`RandomSource`].
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}

/// Pick one element uniformly, `None` on an empty slice.
pub fn choose<'a, T>(items: &'a [T], rng: &mut dyn RandomSource) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.below(items.len()))
}

/// Uniform value within an inclusive range.
pub fn in_range(range: &RangeInclusive<usize>, rng: &mut dyn RandomSource) -> usize {
    let (start, end) = (*range.start(), *range.end());
    if end <= start {
        return start;
    }
    start + rng.below(end - start + 1)
}

/// Deterministic bundle of RNG streams segregated by game domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    customers: CountingRng<SmallRng>,
    shop: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            customers: CountingRng::new(derive_stream_seed(seed, b"customers")),
            shop: CountingRng::new(derive_stream_seed(seed, b"shop")),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream used while serving customers: queue generation, avatars, rejections.
    pub const fn customers(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.customers
    }

    /// Stream used for shop ordering when a run is (re)started.
    pub const fn shop(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.shop
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

impl<R: RngCore> RandomSource for CountingRng<R> {
    fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        self.gen_range(0..bound)
    }
}

/// Replays a fixed sequence of draws, wrapping around when exhausted.
///
/// Each draw is reduced modulo the requested bound.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    script: Vec<usize>,
    cursor: usize,
}

impl ScriptedRandom {
    #[must_use]
    pub fn new(script: Vec<usize>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Always draws 0, so picks take the first entry.
    #[must_use]
    pub fn zeros() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        let value = if self.script.is_empty() {
            0
        } else {
            self.script[self.cursor % self.script.len()]
        };
        self.cursor = self.cursor.saturating_add(1);
        value % bound
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
