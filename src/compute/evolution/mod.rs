//! Parallel steady-state evolutionary search over bit vector designs.
//!
//! # Overview
//!
//! One worker thread owns each design of the initial population. Workers
//! never talk to each other directly. They share:
//!
//! - **Elite archive** (`archive`): the best K evaluated designs seen so far,
//!   with a live list and a published read-only snapshot
//! - **Evaluation budget** (`budget`): a global evaluation counter with a
//!   sticky termination flag
//!
//! Each worker repeats evaluate, admit, sample and reproduce until the budget
//! runs out. The **collector** (`collector`) waits for termination, ranks the
//! archive and writes the results. **Problems** (`problem`) are resolved by
//! name from a registry, and **genetic operators** (`genome`) implement
//! uniform crossover and bit flip mutation.
//!
//! # Example
//!
//! ```rust,no_run
//! use elite_search::compute::evolution::EliteSearch;
//! use elite_search::schema::RunConfig;
//!
//! let config = RunConfig {
//!     problem: "one-max".to_string(),
//!     population_size: 8,
//!     elite_size: 4,
//!     evaluation_budget: 5_000,
//!     ..Default::default()
//! };
//!
//! let search = EliteSearch::new(config)?;
//! let result = search.run()?;
//!
//! for (rank, fitness) in result.ranked_fitness.iter().enumerate() {
//!     println!("#{}: {:.4}", rank + 1, fitness);
//! }
//! # Ok::<(), elite_search::compute::evolution::EvolutionError>(())
//! ```

mod archive;
mod budget;
mod collector;
mod error;
mod genome;
mod problem;
mod search;
mod worker;

pub use archive::{Admission, DEFAULT_POLL_INTERVAL, EliteArchive, Sample};
pub use budget::EvaluationBudget;
pub use collector::{
    ArchiveExport, Collected, Collector, load_archive, save_archive, write_results,
};
pub use error::{EvolutionError, Result};
pub use genome::DesignRng;
pub use problem::{
    DEFAULT_DESIGN_LENGTH, LeadingOnes, OneMax, Problem, ProblemFactory, ProblemRegistry,
    TrueRatio,
};
pub use search::EliteSearch;
pub use worker::{Worker, WorkerContext, WorkerState};
