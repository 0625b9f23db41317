//! Collector task: waits for termination, ranks the archive and writes the
//! run artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::schema::{Design, OutputConfig};

use super::archive::EliteArchive;
use super::budget::EvaluationBudget;
use super::error::{EvolutionError, Result};

/// Persisted archive format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveExport {
    /// Problem the designs were evolved for.
    pub problem: String,
    /// Design vector length.
    pub design_length: usize,
    /// Archive capacity during the run.
    pub elite_size: usize,
    /// Evaluations counted when the archive was collected.
    pub evaluations: u64,
    /// Elite designs, best first.
    pub designs: Vec<Design>,
}

/// Ranked archive contents handed back by the collector.
#[derive(Debug, Clone)]
pub struct Collected {
    /// Elite designs, best first.
    pub elites: Vec<Design>,
    /// Fitness of each elite, in the same order.
    pub ranked_fitness: Vec<f64>,
}

/// Waits for the budget to run out and emits the final archive.
#[derive(Debug)]
pub struct Collector {
    archive: Arc<EliteArchive>,
    budget: Arc<EvaluationBudget>,
    poll_interval: Duration,
    output: OutputConfig,
    problem: String,
    design_length: usize,
}

impl Collector {
    pub fn new(
        archive: Arc<EliteArchive>,
        budget: Arc<EvaluationBudget>,
        poll_interval: Duration,
        output: OutputConfig,
        problem: impl Into<String>,
        design_length: usize,
    ) -> Self {
        Self {
            archive,
            budget,
            poll_interval,
            output,
            problem: problem.into(),
            design_length,
        }
    }

    /// Poll for termination, then rank and persist the archive.
    pub fn run(self) -> Result<Collected> {
        while !self.budget.termination_met() {
            thread::sleep(self.poll_interval);
        }
        if self.budget.aborted() {
            warn!("Run aborted, skipping artifact output");
            return Err(EvolutionError::Aborted);
        }

        let elites = self.archive.snapshot()?;
        let ranked_fitness = elites
            .iter()
            .map(|d| d.fitness().ok_or(EvolutionError::NotEvaluated))
            .collect::<Result<Vec<f64>>>()?;

        write_results(&self.output.results_path, &ranked_fitness)?;
        info!(
            "Wrote {} ranked fitness values to {}",
            ranked_fitness.len(),
            self.output.results_path.display()
        );

        let export = ArchiveExport {
            problem: self.problem,
            design_length: self.design_length,
            elite_size: self.archive.capacity(),
            evaluations: self.budget.count(),
            designs: elites,
        };
        save_archive(&self.output.archive_path, &export)?;
        info!("Saved elite archive to {}", self.output.archive_path.display());

        Ok(Collected {
            elites: export.designs,
            ranked_fitness,
        })
    }
}

/// Write one fitness value per line.
pub fn write_results<P: AsRef<Path>>(path: P, ranked_fitness: &[f64]) -> Result<()> {
    let path = path.as_ref();
    let write = || -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for fitness in ranked_fitness {
            writeln!(writer, "{fitness}")?;
        }
        writer.flush()
    };
    write().map_err(|source| persistence(path, source))
}

/// Save an archive export as pretty JSON.
pub fn save_archive<P: AsRef<Path>>(path: P, export: &ArchiveExport) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(export)?;
    fs::write(path, json).map_err(|source| persistence(path, source))
}

/// Load an archive export written by [`save_archive`].
pub fn load_archive<P: AsRef<Path>>(path: P) -> Result<ArchiveExport> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| EvolutionError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn persistence(path: &Path, source: io::Error) -> EvolutionError {
    EvolutionError::Persistence {
        path: PathBuf::from(path),
        source,
    }
}
