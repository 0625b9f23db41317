//! Per-design worker driving the evaluate/admit/sample/reproduce cycle.
//!
//! Workers coordinate only through the shared [`EliteArchive`] and
//! [`EvaluationBudget`]. Every wait is a poll with a fixed backoff, and a
//! worker never holds an archive guard across a retry.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, trace};

use crate::schema::{Design, WorkerStats};

use super::archive::EliteArchive;
use super::budget::EvaluationBudget;
use super::error::{EvolutionError, Result};
use super::genome::DesignRng;
use super::problem::Problem;

/// Worker lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting to claim its initial design.
    Init,
    /// Evaluating the owned design and counting it against the budget.
    Evaluating,
    /// Offering the design to the archive.
    Admitting,
    /// Drawing a crossover parent from the archive.
    Sampling,
    /// Breeding the next design.
    Reproducing,
    /// Finished. No further shared-state access.
    Terminated,
}

/// Shared handles and run parameters common to all workers.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub archive: Arc<EliteArchive>,
    pub budget: Arc<EvaluationBudget>,
    pub problem: Arc<dyn Problem>,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub poll_interval: Duration,
}

/// A worker owning one design.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    state: WorkerState,
    /// Initial design, until claimed in `Init`.
    initial: Option<Design>,
    design: Option<Design>,
    parent: Option<Design>,
    rng: DesignRng,
    ctx: WorkerContext,
    stats: WorkerStats,
}

impl Worker {
    /// Create a worker that will claim `design` when it starts.
    pub fn new(id: usize, design: Design, rng: DesignRng, ctx: WorkerContext) -> Self {
        Self {
            id,
            state: WorkerState::Init,
            initial: Some(design),
            design: None,
            parent: None,
            rng,
            ctx,
            stats: WorkerStats {
                id,
                ..Default::default()
            },
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// The design currently owned by this worker.
    pub fn design(&self) -> Option<&Design> {
        self.design.as_ref()
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Run to termination.
    ///
    /// A fatal error aborts the whole run through the budget so the other
    /// tasks stop at their next checkpoint.
    pub fn run(mut self) -> Result<WorkerStats> {
        while self.state != WorkerState::Terminated {
            if let Err(err) = self.step() {
                error!("Worker {} failed: {err}", self.id);
                self.ctx.budget.abort();
                return Err(err);
            }
        }

        debug!(
            "Worker {} finished: {} evaluations, {} admitted, {} retries",
            self.id, self.stats.evaluations, self.stats.admitted, self.stats.retries
        );
        Ok(self.stats)
    }

    /// Advance one state transition.
    pub fn step(&mut self) -> Result<WorkerState> {
        self.state = match self.state {
            WorkerState::Init => self.claim()?,
            WorkerState::Evaluating => self.evaluate()?,
            WorkerState::Admitting => self.admit()?,
            WorkerState::Sampling => self.sample()?,
            WorkerState::Reproducing => self.reproduce()?,
            WorkerState::Terminated => WorkerState::Terminated,
        };
        Ok(self.state)
    }

    fn claim(&mut self) -> Result<WorkerState> {
        let design = self.initial.take().ok_or_else(|| {
            EvolutionError::ProtocolViolation(format!("worker {} has no design to claim", self.id))
        })?;
        self.design = Some(design);
        Ok(WorkerState::Evaluating)
    }

    fn evaluate(&mut self) -> Result<WorkerState> {
        if self.ctx.budget.termination_met() {
            return Ok(WorkerState::Terminated);
        }

        let problem = &self.ctx.problem;
        let design = self.design.as_mut().ok_or_else(|| unclaimed(self.id))?;
        design.evaluate_with(|bits| problem.evaluate(bits));
        self.stats.evaluations += 1;

        if self.ctx.budget.increment_and_check() {
            Ok(WorkerState::Terminated)
        } else {
            Ok(WorkerState::Admitting)
        }
    }

    fn admit(&mut self) -> Result<WorkerState> {
        let design = self.owned()?;
        match self.ctx.archive.try_admit(design)? {
            Some(admission) => {
                self.stats.admission_checks += 1;
                if admission.changed() {
                    self.stats.admitted += 1;
                }
                Ok(WorkerState::Sampling)
            }
            None => self.backoff(WorkerState::Admitting),
        }
    }

    fn sample(&mut self) -> Result<WorkerState> {
        match self.ctx.archive.sample_random(&mut self.rng)?.into_design() {
            Some(parent) => {
                self.parent = Some(parent);
                if self.ctx.budget.check_and_set_termination() {
                    Ok(WorkerState::Terminated)
                } else {
                    Ok(WorkerState::Reproducing)
                }
            }
            None => self.backoff(WorkerState::Sampling),
        }
    }

    fn reproduce(&mut self) -> Result<WorkerState> {
        let parent = self.parent.take().ok_or_else(|| {
            EvolutionError::ProtocolViolation(format!("worker {} has no parent", self.id))
        })?;

        // Breed from a private copy so no archived value is ever touched.
        let mut child = self.owned()?.detached_copy();
        self.rng.reproduce(
            &mut child,
            &parent,
            self.ctx.crossover_rate,
            self.ctx.mutation_rate,
        );
        self.design = Some(child);
        self.stats.offspring += 1;

        Ok(WorkerState::Evaluating)
    }

    /// Sleep before retrying `state`, unless the run has been aborted.
    fn backoff(&mut self, state: WorkerState) -> Result<WorkerState> {
        if self.ctx.budget.aborted() {
            return Ok(WorkerState::Terminated);
        }
        self.stats.retries += 1;
        trace!("Worker {} retrying {:?}", self.id, state);
        thread::sleep(self.ctx.poll_interval);
        Ok(state)
    }

    fn owned(&self) -> Result<&Design> {
        self.design.as_ref().ok_or_else(|| unclaimed(self.id))
    }
}

fn unclaimed(id: usize) -> EvolutionError {
    EvolutionError::ProtocolViolation(format!("worker {id} has not claimed a design"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::evolution::problem::OneMax;
    use rand::rngs::StdRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingProblem {
        calls: AtomicUsize,
    }

    impl Problem for CountingProblem {
        fn name(&self) -> &str {
            "counting"
        }

        fn evaluate(&self, bits: &[bool]) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            bits.iter().filter(|&&b| b).count() as f64
        }

        fn random_design_vector(&self, _rng: &mut StdRng) -> Vec<bool> {
            vec![false; 8]
        }
    }

    fn context(problem: Arc<dyn Problem>, elite: usize, budget: u64) -> WorkerContext {
        WorkerContext {
            archive: Arc::new(EliteArchive::new(elite)),
            budget: Arc::new(EvaluationBudget::new(budget)),
            problem,
            crossover_rate: 0.5,
            mutation_rate: 0.1,
            poll_interval: Duration::from_micros(100),
        }
    }

    #[test]
    fn test_state_sequence() {
        let ctx = context(Arc::new(OneMax::new(8)), 2, 10);
        let mut worker = Worker::new(0, Design::new(vec![true; 8]), DesignRng::new(1), ctx.clone());

        assert_eq!(worker.state(), WorkerState::Init);
        assert_eq!(worker.step().unwrap(), WorkerState::Evaluating);
        assert_eq!(worker.step().unwrap(), WorkerState::Admitting);
        assert_eq!(worker.design().unwrap().fitness(), Some(1.0));
        assert_eq!(worker.step().unwrap(), WorkerState::Sampling);
        assert_eq!(ctx.archive.len().unwrap(), 1);
        assert_eq!(worker.step().unwrap(), WorkerState::Reproducing);
        assert_eq!(worker.step().unwrap(), WorkerState::Evaluating);
        assert!(!worker.design().unwrap().is_evaluated());

        assert_eq!(ctx.budget.count(), 1);
        assert_eq!(worker.stats().offspring, 1);
    }

    #[test]
    fn test_reproduction_leaves_archive_untouched() {
        let mut ctx = context(Arc::new(OneMax::new(8)), 1, 10);
        ctx.mutation_rate = 1.0;
        let mut worker = Worker::new(0, Design::new(vec![false; 8]), DesignRng::new(2), ctx.clone());

        for _ in 0..5 {
            worker.step().unwrap();
        }
        assert_eq!(worker.state(), WorkerState::Evaluating);

        // Parent and child were both all-zero, so full mutation flips every bit.
        assert_eq!(worker.design().unwrap().bits(), &[true; 8]);
        let archived = ctx.archive.snapshot().unwrap();
        assert_eq!(archived[0].bits(), &[false; 8]);
        assert_eq!(archived[0].fitness(), Some(0.0));
    }

    #[test]
    fn test_runs_until_budget() {
        let problem = Arc::new(CountingProblem::default());
        let ctx = context(problem.clone(), 1, 5);
        let worker = Worker::new(0, Design::new(vec![false; 8]), DesignRng::new(3), ctx.clone());

        let stats = worker.run().unwrap();
        assert_eq!(stats.evaluations, 5);
        assert_eq!(problem.calls.load(Ordering::SeqCst), 5);
        assert_eq!(ctx.budget.count(), 5);
        assert!(ctx.budget.termination_met());
        // The final evaluation hits the budget before admission.
        assert_eq!(stats.admission_checks, 4);
    }

    #[test]
    fn test_evaluated_design_is_not_reevaluated() {
        let problem = Arc::new(CountingProblem::default());
        let ctx = context(problem.clone(), 1, 1);
        let design = Design::with_fitness(vec![true; 8], 42.0);
        let worker = Worker::new(0, design, DesignRng::new(4), ctx.clone());

        let stats = worker.run().unwrap();
        assert_eq!(stats.evaluations, 1);
        assert_eq!(problem.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_terminates_after_sampling_once_budget_spent() {
        let ctx = context(Arc::new(OneMax::new(8)), 2, 2);
        let mut a = Worker::new(0, Design::new(vec![true; 8]), DesignRng::new(6), ctx.clone());
        let mut b = Worker::new(1, Design::new(vec![false; 8]), DesignRng::new(7), ctx.clone());

        assert_eq!(a.step().unwrap(), WorkerState::Evaluating);
        assert_eq!(a.step().unwrap(), WorkerState::Admitting);
        assert_eq!(a.step().unwrap(), WorkerState::Sampling);
        assert!(!ctx.budget.termination_met());

        // The second evaluation spends the budget before `a` samples.
        assert_eq!(b.step().unwrap(), WorkerState::Evaluating);
        assert_eq!(b.step().unwrap(), WorkerState::Terminated);
        assert_eq!(ctx.budget.count(), 2);

        assert_eq!(a.step().unwrap(), WorkerState::Terminated);
        assert!(ctx.budget.termination_met());
        assert_eq!(a.stats().offspring, 0);
    }

    #[test]
    fn test_terminated_before_start() {
        let ctx = context(Arc::new(OneMax::new(8)), 1, 5);
        ctx.budget.abort();

        let worker = Worker::new(0, Design::new(vec![true; 8]), DesignRng::new(5), ctx.clone());
        let stats = worker.run().unwrap();
        assert_eq!(stats.evaluations, 0);
        assert_eq!(ctx.budget.count(), 0);
    }
}
