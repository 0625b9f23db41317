//! Genetic operators over bit vector designs.
//!
//! Each worker owns its own `DesignRng`, so reproduction never contends on a
//! shared random source.

use rand::prelude::*;

use crate::schema::Design;

/// Random number generator wrapper for design operations.
#[derive(Debug, Clone)]
pub struct DesignRng {
    rng: StdRng,
}

impl DesignRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Underlying generator, for problem vector generation.
    pub fn inner(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Uniform crossover: each position takes `other`'s bit with
    /// probability `rate`.
    ///
    /// `rate` must lie in [0,1]; validated with the run configuration.
    pub fn crossover(&mut self, design: &mut Design, other: &Design, rate: f64) {
        debug_assert_eq!(design.len(), other.len());
        let bits = design.bits_mut();
        for (bit, &theirs) in bits.iter_mut().zip(other.bits()) {
            if self.rng.gen_bool(rate) {
                *bit = theirs;
            }
        }
    }

    /// Bit flip mutation: each position flips with probability `rate`.
    pub fn mutate(&mut self, design: &mut Design, rate: f64) {
        for bit in design.bits_mut() {
            if self.rng.gen_bool(rate) {
                *bit = !*bit;
            }
        }
    }

    /// Crossover with `other` followed by mutation. Always leaves the
    /// design unevaluated.
    pub fn reproduce(
        &mut self,
        design: &mut Design,
        other: &Design,
        crossover_rate: f64,
        mutation_rate: f64,
    ) {
        self.crossover(design, other, crossover_rate);
        self.mutate(design, mutation_rate);
        design.clear_fitness();
    }

    /// Uniform index in `0..len`.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }
}
