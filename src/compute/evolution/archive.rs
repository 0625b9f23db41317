//! Bounded elite archive shared by all workers.
//!
//! The live member list sits behind one mutex and a published read-only
//! snapshot behind a second, independent one. Nothing here blocks on a
//! guard: writers poll `try_lock` with a fixed backoff, and samplers fall
//! back from the live list to the snapshot, then give up with
//! [`Sample::Unavailable`] so the caller can retry.
//!
//! No operation holds both guards at once. An admission builds the next
//! snapshot while holding the live guard, releases it, then publishes. Each
//! snapshot carries a version so a slow publisher can never replace a newer
//! snapshot with an older one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;

use log::{debug, trace};

use crate::schema::{ArchiveStats, Design};

use super::error::{EvolutionError, Result};
use super::genome::DesignRng;

/// Default backoff between attempts to acquire the live guard.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Outcome of a completed admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// Appended while the archive was below capacity.
    Inserted,
    /// Replaced the minimum member, whose fitness is given.
    Replaced { evicted: f64 },
    /// Not better than the current minimum. Archive unchanged.
    Rejected,
}

impl Admission {
    /// True if the archive now holds the candidate.
    pub fn changed(&self) -> bool {
        !matches!(self, Admission::Rejected)
    }
}

/// Outcome of a sampling attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// Drawn from the live member list.
    Live(Design),
    /// Drawn from the published snapshot while the live list was busy.
    Stale(Design),
    /// Both tiers busy, or nothing admitted yet. Retry later.
    Unavailable,
}

impl Sample {
    /// The sampled design, if any.
    pub fn into_design(self) -> Option<Design> {
        match self {
            Sample::Live(design) | Sample::Stale(design) => Some(design),
            Sample::Unavailable => None,
        }
    }
}

#[derive(Debug)]
struct Member {
    design: Design,
    fitness: f64,
    /// Admission sequence number, used for stable ranking.
    seq: u64,
}

#[derive(Debug, Default)]
struct Live {
    members: Vec<Member>,
    next_seq: u64,
}

impl Live {
    fn next_member(&mut self, design: Design, fitness: f64) -> Member {
        let seq = self.next_seq;
        self.next_seq += 1;
        Member {
            design,
            fitness,
            seq,
        }
    }

    /// Index of the first member with the lowest fitness.
    fn min_index(&self) -> Option<usize> {
        let mut min: Option<(usize, f64)> = None;
        for (i, member) in self.members.iter().enumerate() {
            match min {
                Some((_, lowest)) if member.fitness >= lowest => {}
                _ => min = Some((i, member.fitness)),
            }
        }
        min.map(|(i, _)| i)
    }

    fn designs(&self) -> Arc<[Design]> {
        self.members.iter().map(|m| m.design.clone()).collect()
    }
}

#[derive(Debug)]
struct Published {
    version: u64,
    designs: Arc<[Design]>,
}

#[derive(Debug, Default)]
struct Counters {
    inserted: AtomicU64,
    replaced: AtomicU64,
    rejected: AtomicU64,
    live_samples: AtomicU64,
    stale_samples: AtomicU64,
    unavailable_samples: AtomicU64,
    contended_admissions: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Bounded best-K collection of evaluated designs.
#[derive(Debug)]
pub struct EliteArchive {
    capacity: usize,
    poll_interval: Duration,
    live: Mutex<Live>,
    published: Mutex<Published>,
    counters: Counters,
}

impl EliteArchive {
    /// Create an empty archive holding at most `capacity` designs.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            poll_interval: DEFAULT_POLL_INTERVAL,
            live: Mutex::new(Live::default()),
            published: Mutex::new(Published {
                version: 0,
                designs: Arc::from(Vec::new()),
            }),
            counters: Counters::default(),
        }
    }

    /// Set the backoff used while polling for the live guard.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Maximum number of members.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Single admission attempt.
    ///
    /// Returns `Ok(None)` if the live list is held by another operation.
    /// Otherwise the candidate has been checked and the outcome says
    /// whether it entered the archive.
    pub fn try_admit(&self, design: &Design) -> Result<Option<Admission>> {
        let fitness = design.fitness().ok_or(EvolutionError::NotEvaluated)?;

        let mut live = match self.live.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                Counters::bump(&self.counters.contended_admissions);
                return Ok(None);
            }
            Err(TryLockError::Poisoned(_)) => return Err(poisoned("live archive")),
        };

        let admission = if live.members.len() < self.capacity {
            let member = live.next_member(design.clone(), fitness);
            live.members.push(member);
            Admission::Inserted
        } else {
            match live.min_index() {
                Some(idx) if fitness > live.members[idx].fitness => {
                    let evicted = live.members[idx].fitness;
                    let member = live.next_member(design.clone(), fitness);
                    live.members[idx] = member;
                    Admission::Replaced { evicted }
                }
                _ => Admission::Rejected,
            }
        };

        let next = admission
            .changed()
            .then(|| (live.next_seq, live.designs()));
        drop(live);

        match admission {
            Admission::Inserted => Counters::bump(&self.counters.inserted),
            Admission::Replaced { evicted } => {
                debug!("Elite replaced: {evicted:.6} -> {fitness:.6}");
                Counters::bump(&self.counters.replaced);
            }
            Admission::Rejected => Counters::bump(&self.counters.rejected),
        }

        if let Some((version, designs)) = next {
            self.publish(version, designs)?;
        }

        Ok(Some(admission))
    }

    /// Admission that polls until the live guard is free.
    pub fn admit(&self, design: &Design) -> Result<Admission> {
        loop {
            if let Some(admission) = self.try_admit(design)? {
                return Ok(admission);
            }
            trace!("Archive busy, retrying admission");
            thread::sleep(self.poll_interval);
        }
    }

    /// Draw a uniformly random member.
    ///
    /// Tries the live list first, then the published snapshot. Never
    /// waits on either guard.
    pub fn sample_random(&self, rng: &mut DesignRng) -> Result<Sample> {
        match self.live.try_lock() {
            Ok(live) => {
                if live.members.is_empty() {
                    Counters::bump(&self.counters.unavailable_samples);
                    return Ok(Sample::Unavailable);
                }
                let design = live.members[rng.index(live.members.len())].design.clone();
                Counters::bump(&self.counters.live_samples);
                return Ok(Sample::Live(design));
            }
            Err(TryLockError::WouldBlock) => {}
            Err(TryLockError::Poisoned(_)) => return Err(poisoned("live archive")),
        }

        match self.published.try_lock() {
            Ok(published) if !published.designs.is_empty() => {
                let design = published.designs[rng.index(published.designs.len())].clone();
                Counters::bump(&self.counters.stale_samples);
                Ok(Sample::Stale(design))
            }
            Ok(_) | Err(TryLockError::WouldBlock) => {
                Counters::bump(&self.counters.unavailable_samples);
                Ok(Sample::Unavailable)
            }
            Err(TryLockError::Poisoned(_)) => Err(poisoned("archive snapshot")),
        }
    }

    /// Current members, best first. Equal fitness keeps admission order.
    pub fn snapshot(&self) -> Result<Vec<Design>> {
        let live = self.lock_live()?;
        let mut ranked: Vec<&Member> = live.members.iter().collect();
        ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness).then(a.seq.cmp(&b.seq)));
        Ok(ranked.into_iter().map(|m| m.design.clone()).collect())
    }

    /// Number of members.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock_live()?.members.len())
    }

    /// Check if archive is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Activity counters.
    pub fn stats(&self) -> ArchiveStats {
        let c = &self.counters;
        ArchiveStats {
            inserted: c.inserted.load(Ordering::Relaxed),
            replaced: c.replaced.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            live_samples: c.live_samples.load(Ordering::Relaxed),
            stale_samples: c.stale_samples.load(Ordering::Relaxed),
            unavailable_samples: c.unavailable_samples.load(Ordering::Relaxed),
            contended_admissions: c.contended_admissions.load(Ordering::Relaxed),
        }
    }

    /// Poll for the live guard.
    fn lock_live(&self) -> Result<MutexGuard<'_, Live>> {
        loop {
            match self.live.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => thread::sleep(self.poll_interval),
                Err(TryLockError::Poisoned(_)) => return Err(poisoned("live archive")),
            }
        }
    }

    /// Replace the published snapshot unless a newer one is already there.
    fn publish(&self, version: u64, designs: Arc<[Design]>) -> Result<()> {
        loop {
            match self.published.try_lock() {
                Ok(mut published) => {
                    if version > published.version {
                        *published = Published { version, designs };
                    }
                    return Ok(());
                }
                Err(TryLockError::WouldBlock) => thread::sleep(self.poll_interval),
                Err(TryLockError::Poisoned(_)) => return Err(poisoned("archive snapshot")),
            }
        }
    }
}

fn poisoned(what: &str) -> EvolutionError {
    EvolutionError::ProtocolViolation(format!("{what} guard poisoned by a panicking holder"))
}
