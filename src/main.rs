//! Elite search CLI - Run a parallel evolutionary search.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use elite_search::{
    EliteSearch, ProblemRegistry,
    schema::{RunConfig, RunResult},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let config = match args.get(1).map(String::as_str) {
        Some("--example") => {
            print_example_config();
            return;
        }
        Some("--list-problems") => {
            for name in ProblemRegistry::with_builtins().names() {
                println!("{name}");
            }
            return;
        }
        Some("--config") if args.len() == 3 => load_config(Path::new(&args[2])),
        Some(_) if args.len() == 7 => parse_positional(&args[1..]),
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    let search = EliteSearch::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let config = search.config();
    println!("Elite Search");
    println!("============");
    println!("Problem: {}", search.problem().name());
    println!("Population: {}", config.population_size);
    println!("Elite size: {}", config.elite_size);
    println!(
        "Crossover: {}, mutation: {}",
        config.crossover_rate, config.mutation_rate
    );
    println!("Evaluations: {}", config.evaluation_budget);
    println!();

    let result = search.run().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    print_summary(&result, config);
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <problem> <population> <elite> <crossover> <mutation> <evaluations>",
        program
    );
    eprintln!("       {} --config <run.json>", program);
    eprintln!();
    eprintln!("Run a parallel elite search over bit vector designs.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  problem      Problem identifier (see --list-problems)");
    eprintln!("  population   Number of designs, one worker thread each");
    eprintln!("  elite        Capacity of the elite archive");
    eprintln!("  crossover    Per-bit crossover probability in [0,1]");
    eprintln!("  mutation     Per-bit mutation probability in [0,1]");
    eprintln!("  evaluations  Total evaluation budget");
    eprintln!();
    eprintln!("Example configuration is generated with --example flag.");
}

fn load_config(path: &Path) -> RunConfig {
    let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    })
}

fn parse_positional(args: &[String]) -> RunConfig {
    RunConfig {
        problem: args[0].clone(),
        population_size: parse_arg(&args[1], "population size"),
        elite_size: parse_arg(&args[2], "elite size"),
        crossover_rate: parse_arg(&args[3], "crossover rate"),
        mutation_rate: parse_arg(&args[4], "mutation rate"),
        evaluation_budget: parse_arg(&args[5], "number of evaluations"),
        ..Default::default()
    }
}

fn parse_arg<T: FromStr>(value: &str, name: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("Error: the {} must be a number, got '{}'", name, value);
        std::process::exit(1);
    })
}

fn print_summary(result: &RunResult, config: &RunConfig) {
    let stats = &result.stats;

    println!("Ranked elite fitness:");
    for (rank, fitness) in result.ranked_fitness.iter().enumerate() {
        println!("  {:>3}. {:.6}", rank + 1, fitness);
    }
    if let Some(best) = result.best() {
        println!();
        println!("Best design: {}", best);
    }
    println!();
    println!(
        "Evaluations: {} of {} budgeted",
        stats.evaluations, stats.evaluation_budget
    );
    println!(
        "Archive: {} inserted, {} replaced, {} rejected",
        stats.archive.inserted, stats.archive.replaced, stats.archive.rejected
    );
    println!(
        "Samples: {} live, {} from snapshot, {} retried",
        stats.archive.live_samples, stats.archive.stale_samples, stats.archive.unavailable_samples
    );
    println!(
        "Time: {:.2}s ({:.0} evaluations/s)",
        stats.elapsed_seconds, stats.evaluations_per_second
    );
    println!();
    println!("Results written to {}", config.output.results_path.display());
    println!("Archive written to {}", config.output.archive_path.display());
}

fn print_example_config() {
    let config = RunConfig {
        random_seed: Some(42),
        ..Default::default()
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|e| {
            eprintln!("Error serializing config: {}", e);
            std::process::exit(1);
        })
    );
}
