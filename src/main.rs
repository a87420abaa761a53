use anyhow::Context;
use clap::Parser;
use fractal_evo::config::ConfigManager;
use fractal_evo::engines::evaluation::{CodeGenerator, CommandHarness, FitnessEvaluator, FractalNetTemplate};
use fractal_evo::engines::generation::{Checkpoint, ConsoleProgressCallback, EngineConfig, GeneticAlgorithm};
use fractal_evo::engines::metrics::SearchMetrics;
use fractal_evo::utils::atomic_write;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fractal-evo")]
#[command(about = "Genetic search over FractalNet architectures", long_about = None)]
#[command(version)]
struct Cli {
    /// Total generations to run, counting generations restored from a checkpoint.
    /// Negative values run none.
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    gens: i64,

    #[arg(long, default_value_t = 10)]
    pop: usize,

    /// Delete any existing checkpoint before starting
    #[arg(long)]
    clean: bool,

    /// TOML config file layered over the defaults
    #[arg(long, env = "FRACTAL_EVO_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,
}

fn run(cli: &Cli) -> anyhow::Result<f64> {
    let mut manager = ConfigManager::load(cli.config.as_deref()).context("Failed to load configuration")?;
    manager.update(|config| {
        config.evolution.population_size = cli.pop;
        config.evolution.num_generations = usize::try_from(cli.gens).unwrap_or(0);
        if cli.seed.is_some() {
            config.evolution.seed = cli.seed;
        }
    })?;
    let config = manager.into_inner();
    let evolution = config.evolution;

    let elitism_count = if evolution.elitism_count >= evolution.population_size {
        let clamped = evolution.population_size - 1;
        log::warn!(
            "Elitism count {} does not fit population {}, using {}",
            evolution.elitism_count,
            evolution.population_size,
            clamped
        );
        clamped
    } else {
        evolution.elitism_count
    };

    if cli.clean && Checkpoint::remove(&evolution.checkpoint_path)? {
        log::info!("Removed checkpoint {}", evolution.checkpoint_path.display());
    }

    let search_space = config
        .search_space
        .unwrap_or_else(FractalNetTemplate::search_space);

    let harness = CommandHarness::new(config.harness, &config.evaluation);
    let mut evaluator = FitnessEvaluator::new(FractalNetTemplate::new(), harness, config.evaluation);

    let mut engine = GeneticAlgorithm::new(EngineConfig {
        population_size: evolution.population_size,
        search_space,
        elitism_count,
        mutation_rate: evolution.mutation_rate,
        selection_method: evolution.selection_method,
        tournament_size: evolution.tournament_size,
        checkpoint_path: evolution.checkpoint_path.clone(),
        seed: evolution.seed,
    })
    .context("Failed to initialise genetic algorithm")?;

    let (best, history) = engine.run(evolution.num_generations, &mut evaluator, &mut ConsoleProgressCallback)?;

    if let Some(best) = &best {
        let code = evaluator.generator().generate(&best.chromosome)?;
        atomic_write(&evolution.best_model_path, code.as_bytes())
            .with_context(|| format!("Failed to write {}", evolution.best_model_path.display()))?;
        log::info!(
            "Best architecture ({:.2}%) saved to {}",
            best.score(),
            evolution.best_model_path.display()
        );
    }

    Ok(SearchMetrics::meta_score(&history))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match panic::catch_unwind(AssertUnwindSafe(|| run(&cli))) {
        Ok(Ok(meta_score)) => println!("META_SCORE: {:.4}", meta_score),
        Ok(Err(e)) => {
            log::error!("Search failed: {:#}", e);
            println!("META_SCORE: 0.0");
        }
        Err(_) => {
            log::error!("Search panicked");
            println!("META_SCORE: 0.0");
        }
    }
}
