//! Deterministic random number generation
//!
//! One master `ChaCha8Rng` is seeded from the battle setup. Independent
//! per-team streams are derived from it on first use, so a fixed seed and a
//! fixed request order reproduce the same roster and layout.

use std::collections::BTreeMap;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct RngManager {
    master: ChaCha8Rng,
    streams: BTreeMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: BTreeMap::new(),
        }
    }

    /// The master generator, for work that is not tied to a single team.
    pub fn master(&mut self) -> &mut ChaCha8Rng {
        &mut self.master
    }

    pub fn stream(&mut self, name: &str) -> StreamRng<'_> {
        let master = &mut self.master;
        let entry = self
            .streams
            .entry(name.to_string())
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(master.next_u64()));
        StreamRng { inner: entry }
    }
}

impl Default for RngManager {
    fn default() -> Self {
        Self::new(42)
    }
}

pub struct StreamRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for StreamRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Helper functions for common random operations
pub trait RngExt {
    fn random_f32(&mut self, min: f32, max: f32) -> f32;
    fn random_bool(&mut self, probability: f32) -> bool;
}

impl<R: Rng + ?Sized> RngExt for R {
    fn random_f32(&mut self, min: f32, max: f32) -> f32 {
        self.gen::<f32>() * (max - min) + min
    }

    fn random_bool(&mut self, probability: f32) -> bool {
        self.gen::<f32>() < probability
    }
}
