//! Run orchestration: builds the initial population, starts one worker per
//! design plus the collector, and assembles the run result.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};
use rayon::prelude::*;

use crate::schema::{ConfigError, Design, RunConfig, RunResult, RunStats};

use super::archive::EliteArchive;
use super::budget::EvaluationBudget;
use super::collector::{Collector, load_archive};
use super::error::{EvolutionError, Result};
use super::genome::DesignRng;
use super::problem::{Problem, ProblemRegistry};
use super::worker::{Worker, WorkerContext};

/// A configured elite search, ready to run.
#[derive(Debug)]
pub struct EliteSearch {
    config: RunConfig,
    problem: Arc<dyn Problem>,
}

impl EliteSearch {
    /// Resolve the configured problem among the built-ins.
    pub fn new(config: RunConfig) -> Result<Self> {
        Self::with_registry(config, &ProblemRegistry::with_builtins())
    }

    /// Resolve the configured problem in `registry`.
    pub fn with_registry(config: RunConfig, registry: &ProblemRegistry) -> Result<Self> {
        let problem = registry.create(&config.problem)?;
        Self::with_problem(config, problem)
    }

    /// Use `problem` directly, ignoring `config.problem`.
    pub fn with_problem(config: RunConfig, problem: Arc<dyn Problem>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, problem })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn problem(&self) -> &Arc<dyn Problem> {
        &self.problem
    }

    /// Build the initial population from `seed`.
    ///
    /// Designs from `resume_from` fill the first slots with their fitness
    /// cleared. The remaining slots get fresh random vectors. Every vector
    /// must share the length of the first one.
    pub fn initial_population(&self, seed: u64) -> Result<Vec<Design>> {
        let size = self.config.population_size;
        let mut population = match &self.config.resume_from {
            Some(path) => {
                let export = load_archive(path)?;
                if export.problem != self.problem.name() {
                    warn!(
                        "Resuming from an archive of '{}' for problem '{}'",
                        export.problem,
                        self.problem.name()
                    );
                }
                info!(
                    "Resuming with {} designs from {}",
                    export.designs.len().min(size),
                    path.display()
                );
                export
                    .designs
                    .into_iter()
                    .take(size)
                    .map(|mut design| {
                        design.clear_fitness();
                        design
                    })
                    .collect()
            }
            None => Vec::with_capacity(size),
        };

        let mut rng = DesignRng::new(seed);
        let seeds: Vec<u64> = (population.len()..size).map(|_| rng.next_seed()).collect();
        let problem = &self.problem;
        let fresh: Vec<Design> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = DesignRng::new(seed);
                Design::new(problem.random_design_vector(rng.inner()))
            })
            .collect();
        population.extend(fresh);

        check_lengths(&population)?;
        Ok(population)
    }

    /// Run to completion and return the ranked archive.
    pub fn run(&self) -> Result<RunResult> {
        let master_seed = self.config.random_seed.unwrap_or_else(rand::random);
        let mut seeder = DesignRng::new(master_seed);
        let population = self.initial_population(seeder.next_seed())?;
        // Every design shares this length, checked by `initial_population`.
        let design_length = population.first().map_or(0, Design::len);
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        info!(
            "Starting search on '{}': {} workers, elite size {}, budget {}, design length {}, seed {}",
            self.problem.name(),
            population.len(),
            self.config.elite_size,
            self.config.evaluation_budget,
            design_length,
            master_seed
        );

        let archive = Arc::new(
            EliteArchive::new(self.config.elite_size).with_poll_interval(poll_interval),
        );
        let budget = Arc::new(EvaluationBudget::new(self.config.evaluation_budget));
        let ctx = WorkerContext {
            archive: Arc::clone(&archive),
            budget: Arc::clone(&budget),
            problem: Arc::clone(&self.problem),
            crossover_rate: self.config.crossover_rate,
            mutation_rate: self.config.mutation_rate,
            poll_interval,
        };

        let start = Instant::now();

        let collector = Collector::new(
            Arc::clone(&archive),
            Arc::clone(&budget),
            poll_interval,
            self.config.output.clone(),
            self.problem.name(),
            design_length,
        );
        let collector = spawn("collector".to_string(), &budget, move || collector.run())?;

        let mut workers = Vec::with_capacity(population.len());
        for (id, design) in population.into_iter().enumerate() {
            let worker = Worker::new(id, design, DesignRng::new(seeder.next_seed()), ctx.clone());
            match spawn(format!("worker-{id}"), &budget, move || worker.run()) {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    error!("Stopping after {} workers: {err}", workers.len());
                    budget.abort();
                    for handle in workers {
                        let _ = join(handle);
                    }
                    let _ = join(collector);
                    return Err(err);
                }
            }
        }

        let mut failure = None;
        let mut worker_stats = Vec::with_capacity(workers.len());
        for handle in workers {
            match join(handle) {
                Ok(stats) => worker_stats.push(stats),
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }
        let collected = join(collector);
        if let Some(err) = failure {
            return Err(err);
        }
        let collected = collected?;

        let elapsed_seconds = start.elapsed().as_secs_f64();
        let evaluations = budget.count();
        let stats = RunStats {
            evaluations,
            evaluation_budget: budget.target(),
            best_fitness: collected.ranked_fitness.first().copied(),
            elapsed_seconds,
            evaluations_per_second: if elapsed_seconds > 0.0 {
                evaluations as f64 / elapsed_seconds
            } else {
                0.0
            },
            archive: archive.stats(),
        };

        info!(
            "Search finished: {} evaluations in {:.2}s ({:.0}/s), best fitness {:?}",
            stats.evaluations,
            stats.elapsed_seconds,
            stats.evaluations_per_second,
            stats.best_fitness
        );

        Ok(RunResult {
            ranked_fitness: collected.ranked_fitness,
            elites: collected.elites,
            stats,
            workers: worker_stats,
        })
    }
}

/// Common design length of `designs`.
fn check_lengths(designs: &[Design]) -> std::result::Result<usize, ConfigError> {
    let expected = designs.first().map_or(0, Design::len);
    if expected == 0 {
        return Err(ConfigError::EmptyDesignVector);
    }
    match designs.iter().find(|d| d.len() != expected) {
        Some(design) => Err(ConfigError::DesignLengthMismatch {
            expected,
            found: design.len(),
        }),
        None => Ok(expected),
    }
}

/// Aborts the run if the owning thread unwinds.
struct AbortOnPanic(Arc<EvaluationBudget>);

impl Drop for AbortOnPanic {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

fn spawn<T, F>(
    name: String,
    budget: &Arc<EvaluationBudget>,
    task: F,
) -> Result<JoinHandle<Result<T>>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let guard = AbortOnPanic(Arc::clone(budget));
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let _guard = guard;
            task()
        })
        .map_err(|err| EvolutionError::ResourceExhaustion(format!("cannot spawn {name}: {err}")))
}

fn join<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    let name = handle.thread().name().unwrap_or("task").to_string();
    handle
        .join()
        .map_err(|_| EvolutionError::ProtocolViolation(format!("{name} panicked")))?
}
