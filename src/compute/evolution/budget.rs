//! Shared evaluation counter with a sticky termination flag.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counts evaluations against a fixed target.
///
/// The count only grows and the termination flag, once set, is never
/// cleared. Setting the flag is idempotent, so any number of workers may
/// race to set it.
#[derive(Debug)]
pub struct EvaluationBudget {
    target: u64,
    count: AtomicU64,
    terminated: AtomicBool,
    aborted: AtomicBool,
}

impl EvaluationBudget {
    /// Create a budget of `target` evaluations.
    pub fn new(target: u64) -> Self {
        Self {
            target,
            count: AtomicU64::new(0),
            terminated: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
        }
    }

    /// Configured target.
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Evaluations counted so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Count one evaluation. Returns true once the target has been reached,
    /// setting the termination flag.
    pub fn increment_and_check(&self) -> bool {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= self.target {
            self.terminated.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Re-check the count without incrementing, setting the flag if the
    /// target has been reached.
    pub fn check_and_set_termination(&self) -> bool {
        if self.count() >= self.target {
            self.terminated.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Whether the termination flag is set.
    pub fn termination_met(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Stop the run early after a fatal error. Sets the termination flag so
    /// every task winds down at its next checkpoint.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.terminated.store(true, Ordering::SeqCst);
    }

    /// Whether the run was stopped by `abort`.
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_increment_reaches_target() {
        let budget = EvaluationBudget::new(3);
        assert!(!budget.increment_and_check());
        assert!(!budget.increment_and_check());
        assert!(!budget.termination_met());
        assert!(!budget.check_and_set_termination());

        assert!(budget.increment_and_check());
        assert!(budget.termination_met());
        assert_eq!(budget.count(), 3);
    }

    #[test]
    fn test_flag_is_sticky() {
        let budget = EvaluationBudget::new(1);
        assert!(budget.increment_and_check());
        assert!(budget.check_and_set_termination());
        assert!(budget.check_and_set_termination());

        // Counting past the target keeps reporting termination.
        assert!(budget.increment_and_check());
        assert!(budget.termination_met());
        assert_eq!(budget.count(), 2);
    }

    #[test]
    fn test_check_sets_flag() {
        let budget = EvaluationBudget::new(2);
        budget.count.store(2, Ordering::SeqCst);
        assert!(!budget.termination_met());
        assert!(budget.check_and_set_termination());
        assert!(budget.termination_met());
    }

    #[test]
    fn test_abort() {
        let budget = EvaluationBudget::new(100);
        budget.abort();
        assert!(budget.termination_met());
        assert!(budget.aborted());
        assert_eq!(budget.count(), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let budget = Arc::new(EvaluationBudget::new(1_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let budget = Arc::clone(&budget);
                thread::spawn(move || {
                    let mut reached = 0;
                    for _ in 0..250 {
                        if budget.increment_and_check() {
                            reached += 1;
                        }
                    }
                    reached
                })
            })
            .collect();

        let reached: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(budget.count(), 2_000);
        // Exactly the increments numbered 1000..=2000 observe the target.
        assert_eq!(reached, 1_001);
        assert!(budget.termination_met());
    }
}
