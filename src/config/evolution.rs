use super::traits::ConfigSection;
use crate::error::FractalEvoError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub num_generations: usize,
    pub mutation_rate: f64,
    pub selection_method: SelectionMethod,
    pub elitism_count: usize,
    pub tournament_size: usize,
    pub checkpoint_path: PathBuf,
    pub best_model_path: PathBuf,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMethod {
    Tournament,
    Roulette,
    Rank,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            num_generations: 3,
            mutation_rate: 0.2,
            selection_method: SelectionMethod::Tournament,
            elitism_count: 5,
            tournament_size: 3,
            checkpoint_path: PathBuf::from("fractal_ga_ckpt.json"),
            best_model_path: PathBuf::from("best_fractal_model.py"),
            seed: None,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), FractalEvoError> {
        if self.population_size == 0 {
            return Err(FractalEvoError::Configuration(
                "Population size must be greater than 0".to_string(),
            ));
        }
        if self.mutation_rate < 0.0 || self.mutation_rate > 1.0 {
            return Err(FractalEvoError::Configuration(
                "Mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(FractalEvoError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
