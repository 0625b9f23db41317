//! Problem definitions and the registry that resolves them by name.
//!
//! A problem supplies fitness evaluation and random design vectors. Workers
//! call into the same problem instance concurrently, so implementations must
//! be `Send + Sync` and hold no per-call mutable state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use rand::rngs::StdRng;

use crate::schema::ConfigError;

/// Design vector length used by the built-in problems.
pub const DEFAULT_DESIGN_LENGTH: usize = 100;

/// A fitness landscape over fixed-length bit vectors.
pub trait Problem: Send + Sync + fmt::Debug {
    /// Registry identifier.
    fn name(&self) -> &str;

    /// Fitness of a design vector. Higher is better.
    fn evaluate(&self, bits: &[bool]) -> f64;

    /// A fresh random design vector. Every call within a run must return
    /// the same length.
    fn random_design_vector(&self, rng: &mut StdRng) -> Vec<bool>;
}

/// Factory producing a problem instance.
pub type ProblemFactory = fn() -> Arc<dyn Problem>;

/// Maps problem identifiers to factories. Resolved once at startup.
#[derive(Clone, Default)]
pub struct ProblemRegistry {
    factories: BTreeMap<String, ProblemFactory>,
}

impl ProblemRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in problem.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("one-max", one_max);
        registry.register("true-ratio", true_ratio);
        registry.register("leading-ones", leading_ones);
        registry
    }

    /// Register a factory under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, factory: ProblemFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Instantiate the problem registered as `name`.
    pub fn create(&self, name: &str) -> Result<Arc<dyn Problem>, ConfigError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ConfigError::UnknownProblem(name.to_string()))
    }

    /// Registered identifiers, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for ProblemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProblemRegistry")
            .field("problems", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn one_max() -> Arc<dyn Problem> {
    Arc::new(OneMax::new(DEFAULT_DESIGN_LENGTH))
}

fn true_ratio() -> Arc<dyn Problem> {
    Arc::new(TrueRatio::new(DEFAULT_DESIGN_LENGTH))
}

fn leading_ones() -> Arc<dyn Problem> {
    Arc::new(LeadingOnes::new(DEFAULT_DESIGN_LENGTH))
}

fn random_bits(rng: &mut StdRng, length: usize) -> Vec<bool> {
    (0..length).map(|_| rng.r#gen::<bool>()).collect()
}

/// Fraction of set bits.
#[derive(Debug, Clone)]
pub struct OneMax {
    length: usize,
}

impl OneMax {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Problem for OneMax {
    fn name(&self) -> &str {
        "one-max"
    }

    fn evaluate(&self, bits: &[bool]) -> f64 {
        if bits.is_empty() {
            return 0.0;
        }
        bits.iter().filter(|&&b| b).count() as f64 / bits.len() as f64
    }

    fn random_design_vector(&self, rng: &mut StdRng) -> Vec<bool> {
        random_bits(rng, self.length)
    }
}

/// Smoothed ratio of set bits: `(ones + 1) / (len + 2)`.
///
/// Never reaches 0 or 1, and is defined for empty vectors.
#[derive(Debug, Clone)]
pub struct TrueRatio {
    length: usize,
}

impl TrueRatio {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Problem for TrueRatio {
    fn name(&self) -> &str {
        "true-ratio"
    }

    fn evaluate(&self, bits: &[bool]) -> f64 {
        let ones = bits.iter().filter(|&&b| b).count() as f64;
        (ones + 1.0) / (bits.len() as f64 + 2.0)
    }

    fn random_design_vector(&self, rng: &mut StdRng) -> Vec<bool> {
        random_bits(rng, self.length)
    }
}

/// Length of the leading run of set bits, as a fraction of the vector length.
#[derive(Debug, Clone)]
pub struct LeadingOnes {
    length: usize,
}

impl LeadingOnes {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Problem for LeadingOnes {
    fn name(&self) -> &str {
        "leading-ones"
    }

    fn evaluate(&self, bits: &[bool]) -> f64 {
        if bits.is_empty() {
            return 0.0;
        }
        bits.iter().take_while(|&&b| b).count() as f64 / bits.len() as f64
    }

    fn random_design_vector(&self, rng: &mut StdRng) -> Vec<bool> {
        random_bits(rng, self.length)
    }
}
