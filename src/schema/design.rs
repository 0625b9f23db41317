//! Design type: a fixed-length bit vector candidate with a cached fitness.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A candidate solution.
///
/// Equality and hashing only look at the bit vector. Two designs with the
/// same bits are the same design even when their cached fitness differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    /// Design parameters.
    bits: Vec<bool>,
    /// Cached fitness, present iff the design has been evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fitness: Option<f64>,
}

impl Design {
    /// Create an unevaluated design from a bit vector.
    pub fn new(bits: Vec<bool>) -> Self {
        Self {
            bits,
            fitness: None,
        }
    }

    /// Create a design with an already known fitness.
    pub fn with_fitness(bits: Vec<bool>, fitness: f64) -> Self {
        Self {
            bits,
            fitness: Some(fitness),
        }
    }

    /// Design parameters.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Mutable access to the design parameters.
    ///
    /// Any mutable access invalidates the cached fitness.
    pub fn bits_mut(&mut self) -> &mut [bool] {
        self.fitness = None;
        &mut self.bits
    }

    /// Vector length.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True for a zero-length vector.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Cached fitness, if evaluated.
    #[inline]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Evaluate with `f` unless a fitness is already cached.
    ///
    /// Returns the cached value. A second call never re-runs `f`.
    pub fn evaluate_with<F>(&mut self, f: F) -> f64
    where
        F: FnOnce(&[bool]) -> f64,
    {
        match self.fitness {
            Some(fitness) => fitness,
            None => {
                let fitness = f(&self.bits);
                self.fitness = Some(fitness);
                fitness
            }
        }
    }

    /// Drop the cached fitness.
    pub fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    /// Independent copy of the bit vector with no cached fitness.
    pub fn detached_copy(&self) -> Self {
        Self::new(self.bits.clone())
    }
}

impl PartialEq for Design {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for Design {}

impl Hash for Design {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        if let Some(fitness) = self.fitness {
            write!(f, " ({fitness:.6})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(design: &Design) -> u64 {
        let mut hasher = DefaultHasher::new();
        design.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut design = Design::new(vec![true, false, true, true]);
        let first = design.evaluate_with(|bits| bits.iter().filter(|&&b| b).count() as f64);
        let second = design.evaluate_with(|_| panic!("evaluated twice"));

        assert_eq!(first, 3.0);
        assert_eq!(second, 3.0);
        assert_eq!(design.fitness(), Some(3.0));
    }

    #[test]
    fn test_bits_mut_clears_fitness() {
        let mut design = Design::with_fitness(vec![false, false], 0.0);
        design.bits_mut()[0] = true;

        assert!(!design.is_evaluated());
        assert_eq!(design.bits(), &[true, false]);
    }

    #[test]
    fn test_detached_copy_is_independent() {
        let original = Design::with_fitness(vec![true, false, true], 0.5);
        let mut copy = original.detached_copy();
        assert_eq!(copy, original);
        assert!(copy.fitness().is_none());

        copy.bits_mut()[1] = true;
        assert_eq!(original.bits(), &[true, false, true]);
        assert_eq!(original.fitness(), Some(0.5));
    }

    #[test]
    fn test_display() {
        let design = Design::with_fitness(vec![true, false, true], 0.25);
        assert_eq!(design.to_string(), "101 (0.250000)");
        assert_eq!(Design::new(vec![false, true]).to_string(), "01");
    }

    #[test]
    fn test_serialization() {
        let design = Design::with_fitness(vec![true, false], 0.75);
        let json = serde_json::to_string(&design).unwrap();
        let parsed: Design = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, design);
        assert_eq!(parsed.fitness(), Some(0.75));

        let unevaluated: Design = serde_json::from_str(r#"{"bits":[false]}"#).unwrap();
        assert!(!unevaluated.is_evaluated());
    }

    proptest! {
        #[test]
        fn prop_equality_ignores_fitness(
            bits in proptest::collection::vec(any::<bool>(), 0..64),
            a in -1.0e6f64..1.0e6,
            b in -1.0e6f64..1.0e6,
        ) {
            let x = Design::with_fitness(bits.clone(), a);
            let y = Design::with_fitness(bits.clone(), b);
            let z = Design::new(bits);

            prop_assert_eq!(&x, &y);
            prop_assert_eq!(&x, &z);
            prop_assert_eq!(hash_of(&x), hash_of(&y));
            prop_assert_eq!(hash_of(&x), hash_of(&z));
        }

        #[test]
        fn prop_different_bits_differ(bits in proptest::collection::vec(any::<bool>(), 1..64), idx in 0usize..64) {
            let idx = idx % bits.len();
            let mut flipped = bits.clone();
            flipped[idx] = !flipped[idx];
            prop_assert_ne!(Design::new(bits), Design::new(flipped));
        }
    }
}
