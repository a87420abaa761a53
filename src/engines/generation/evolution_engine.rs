use crate::config::evolution::SelectionMethod;
use crate::engines::generation::{
    checkpoint::Checkpoint,
    genome::{Chromosome, Individual, SearchSpace},
    operators::*,
};
use crate::error::{EvalError, FractalEvoError};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub struct EngineConfig {
    pub population_size: usize,
    pub search_space: SearchSpace,
    pub elitism_count: usize,
    pub mutation_rate: f64,
    pub selection_method: SelectionMethod,
    pub tournament_size: usize,
    pub checkpoint_path: PathBuf,
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), FractalEvoError> {
        if self.population_size == 0 {
            return Err(FractalEvoError::Configuration(
                "Population size must be greater than 0".to_string(),
            ));
        }
        if self.elitism_count >= self.population_size {
            return Err(FractalEvoError::Configuration(format!(
                "Elitism count ({}) must be smaller than population size ({})",
                self.elitism_count, self.population_size
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(FractalEvoError::Configuration(
                "Mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(FractalEvoError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        self.search_space.validate()
    }
}

/// Scores one chromosome. Errors are recoverable: the engine logs them and
/// scores the candidate 0.0.
///
/// Implementations own `Chromosome::accuracy` and may attach it here.
/// Implementations that deduplicate candidates expose their seen set so the
/// engine can carry it through checkpoints.
pub trait FitnessFunction {
    fn evaluate(&mut self, chromosome: &mut Chromosome) -> Result<f64, EvalError>;

    fn seen_checksums(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn restore_seen(&mut self, _seen: BTreeSet<String>) {}
}

impl<F> FitnessFunction for F
where
    F: FnMut(&Chromosome) -> Result<f64, EvalError>,
{
    fn evaluate(&mut self, chromosome: &mut Chromosome) -> Result<f64, EvalError> {
        self(&*chromosome)
    }
}

pub trait ProgressCallback {
    fn on_generation_start(&mut self, generation: usize, total: usize);
    fn on_candidate_evaluated(&mut self, candidate_num: usize, total: usize, fitness: f64);
    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, best_ever: f64);
}

pub struct GeneticAlgorithm {
    config: EngineConfig,
    population: Vec<Individual>,
    generation: usize,
    best: Option<Individual>,
    history: Vec<f64>,
    restored_seen: Option<BTreeSet<String>>,
    rng: StdRng,
}

impl GeneticAlgorithm {
    /// Build the engine, resuming from `config.checkpoint_path` when a
    /// checkpoint is present there.
    pub fn new(config: EngineConfig) -> Result<Self, FractalEvoError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut engine = Self {
            config,
            population: Vec::new(),
            generation: 0,
            best: None,
            history: Vec::new(),
            restored_seen: None,
            rng,
        };

        match Checkpoint::load(&engine.config.checkpoint_path)? {
            Some(checkpoint) => engine.restore(checkpoint)?,
            None => engine.initialize_population(),
        }

        Ok(engine)
    }

    /// Run until `generations` generations have completed in total,
    /// counting those restored from a checkpoint.
    ///
    /// Returns the best individual ever evaluated and the per-generation
    /// best fitness history.
    pub fn run<F: FitnessFunction, C: ProgressCallback>(
        &mut self,
        generations: usize,
        fitness_fn: &mut F,
        callback: &mut C,
    ) -> Result<(Option<Individual>, Vec<f64>), FractalEvoError> {
        if let Some(seen) = self.restored_seen.take() {
            fitness_fn.restore_seen(seen);
        }

        while self.generation < generations {
            callback.on_generation_start(self.generation, generations);

            self.evaluate_population(fitness_fn, callback);

            let ranked = self.rank_population();
            let generation_best = ranked.first().map(Individual::score).unwrap_or(0.0);

            let next_generation = self.create_next_generation(&ranked);

            self.history.push(generation_best);
            let improved = match &self.best {
                Some(best) => generation_best > best.score(),
                None => true,
            };
            if improved {
                self.best = ranked.first().cloned();
            }

            let best_ever = self.best.as_ref().map(Individual::score).unwrap_or(0.0);
            callback.on_generation_complete(self.generation, generation_best, best_ever);

            self.population = next_generation;
            self.generation += 1;

            self.checkpoint(fitness_fn.seen_checksums())?;
        }

        Ok((self.best.clone(), self.history.clone()))
    }

    fn initialize_population(&mut self) {
        self.population = (0..self.config.population_size)
            .map(|_| Individual::new(random_chromosome(&self.config.search_space, &mut self.rng)))
            .collect();
    }

    fn restore(&mut self, checkpoint: Checkpoint) -> Result<(), FractalEvoError> {
        if checkpoint.population.len() != self.config.population_size {
            return Err(FractalEvoError::Checkpoint(format!(
                "Checkpoint population has {} individuals, expected {}",
                checkpoint.population.len(),
                self.config.population_size
            )));
        }

        log::info!(
            "Resuming from checkpoint {} at generation {} ({} architectures seen)",
            self.config.checkpoint_path.display(),
            checkpoint.generation,
            checkpoint.seen_checksums.len()
        );

        self.population = checkpoint.population;
        self.generation = checkpoint.generation;
        self.best = checkpoint.best;
        self.history = checkpoint.history;
        self.restored_seen = Some(checkpoint.seen_checksums);
        Ok(())
    }

    fn evaluate_population<F: FitnessFunction, C: ProgressCallback>(
        &mut self,
        fitness_fn: &mut F,
        callback: &mut C,
    ) {
        let total = self.population.len();

        for (i, individual) in self.population.iter_mut().enumerate() {
            if individual.is_evaluated() {
                continue;
            }

            let fitness = match fitness_fn.evaluate(&mut individual.chromosome) {
                Ok(score) if score.is_finite() => score,
                Ok(score) => {
                    log::warn!("  [{}] non-finite fitness {} scored as 0.0", i + 1, score);
                    0.0
                }
                Err(e) => {
                    log::warn!("  [{}] evaluation failed: {}", i + 1, e);
                    0.0
                }
            };

            individual.fitness = Some(fitness);
            callback.on_candidate_evaluated(i + 1, total, fitness);
        }
    }

    /// Descending by fitness; `sort_by` is stable so ties keep population order
    fn rank_population(&self) -> Vec<Individual> {
        let mut ranked = self.population.clone();
        ranked.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    fn create_next_generation(&mut self, ranked: &[Individual]) -> Vec<Individual> {
        let mut next_generation: Vec<Individual> = ranked
            .iter()
            .take(self.config.elitism_count)
            .cloned()
            .collect();

        while next_generation.len() < self.config.population_size {
            let parent1 = self.select(ranked).chromosome.clone();
            let parent2 = self.select(ranked).chromosome.clone();

            let mut child = uniform_crossover(&parent1, &parent2, &mut self.rng);
            mutate(
                &mut child,
                self.config.mutation_rate,
                &self.config.search_space,
                &mut self.rng,
            );
            next_generation.push(Individual::new(child));
        }

        next_generation
    }

    fn select<'a>(&mut self, ranked: &'a [Individual]) -> &'a Individual {
        match self.config.selection_method {
            SelectionMethod::Tournament => {
                tournament_selection(ranked, self.config.tournament_size, &mut self.rng)
            }
            SelectionMethod::Roulette => roulette_selection(ranked, &mut self.rng),
            SelectionMethod::Rank => rank_selection(ranked, &mut self.rng),
        }
    }

    fn checkpoint(&self, seen_checksums: BTreeSet<String>) -> Result<(), FractalEvoError> {
        let checkpoint = Checkpoint {
            population: self.population.clone(),
            generation: self.generation,
            best: self.best.clone(),
            history: self.history.clone(),
            seen_checksums,
            saved_at: Utc::now(),
        };
        checkpoint.save(&self.config.checkpoint_path)
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }
}
