//! Result types produced by a completed run.

use serde::{Deserialize, Serialize};

use super::Design;

/// Final result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Elite fitness values, best to worst.
    pub ranked_fitness: Vec<f64>,
    /// Elite designs in the same order as `ranked_fitness`.
    pub elites: Vec<Design>,
    /// Statistics from the run.
    pub stats: RunStats,
    /// Per-worker counters.
    pub workers: Vec<WorkerStats>,
}

impl RunResult {
    /// Best design found, if the archive is not empty.
    pub fn best(&self) -> Option<&Design> {
        self.elites.first()
    }
}

/// Statistics from a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Evaluations counted against the budget.
    pub evaluations: u64,
    /// Configured budget.
    pub evaluation_budget: u64,
    /// Best fitness in the final archive.
    pub best_fitness: Option<f64>,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
    /// Archive counters at the end of the run.
    pub archive: ArchiveStats,
}

/// Archive activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveStats {
    /// Designs appended while the archive was below capacity.
    pub inserted: u64,
    /// Designs that evicted the minimum member.
    pub replaced: u64,
    /// Designs checked but not admitted.
    pub rejected: u64,
    /// Samples served from the live archive.
    pub live_samples: u64,
    /// Samples served from the published snapshot.
    pub stale_samples: u64,
    /// Sample attempts that found both tiers busy or empty.
    pub unavailable_samples: u64,
    /// Admission attempts that found the archive busy.
    pub contended_admissions: u64,
}

/// Counters for a single worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Worker index.
    pub id: usize,
    /// Evaluations this worker counted against the budget.
    pub evaluations: u64,
    /// Admission checks completed (accepted or rejected).
    pub admission_checks: u64,
    /// Admission checks that changed the archive.
    pub admitted: u64,
    /// Reproductions performed.
    pub offspring: u64,
    /// Polling retries spent waiting on the archive.
    pub retries: u64,
}
