//! Elite search - Parallel steady-state evolutionary optimization.
//!
//! This crate evolves fixed-length bit vectors with one thread per design.
//! Threads share a bounded archive of the best designs found so far and a
//! global evaluation budget, and never synchronize with each other beyond
//! non-blocking access to those two objects.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Designs, run configuration and result types
//! - `compute`: The archive, budget, workers, collector and orchestration
//!
//! # Example
//!
//! ```rust,no_run
//! use elite_search::{EliteSearch, RunConfig};
//!
//! let config = RunConfig {
//!     problem: "leading-ones".to_string(),
//!     population_size: 16,
//!     elite_size: 8,
//!     crossover_rate: 0.5,
//!     mutation_rate: 0.01,
//!     evaluation_budget: 20_000,
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//!
//! let result = EliteSearch::new(config)?.run()?;
//! if let Some(best) = result.best() {
//!     println!("Best design: {best}");
//! }
//! # Ok::<(), elite_search::EvolutionError>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EliteSearch, EvolutionError, Problem, ProblemRegistry};
pub use schema::{Design, RunConfig, RunResult};
