use super::traits::ConfigSection;
use crate::error::FractalEvoError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where generated models and result records go, and the fixed short
/// training schedule every candidate gets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub arch_dir: PathBuf,
    pub stats_dir: PathBuf,
    /// Detailed summary the harness leaves behind after training
    pub summary_path: PathBuf,
    pub task: String,
    pub dataset: String,
    pub metric: String,
    pub batch: usize,
    pub epoch: usize,
    pub transform: String,
    /// Used when a chromosome carries no `lr` gene
    pub default_lr: f64,
    /// Used when a chromosome carries no `momentum` gene
    pub default_momentum: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            arch_dir: PathBuf::from("ga_fractal_arch"),
            stats_dir: PathBuf::from("stats"),
            summary_path: PathBuf::from("out").join("training_summary.json"),
            task: "img-classification".to_string(),
            dataset: "cifar-10".to_string(),
            metric: "acc".to_string(),
            batch: 32,
            epoch: 1,
            transform: "norm_256_flip".to_string(),
            default_lr: 0.01,
            default_momentum: 0.9,
        }
    }
}

impl ConfigSection for EvaluationConfig {
    fn section_name() -> &'static str {
        "evaluation"
    }

    fn validate(&self) -> Result<(), FractalEvoError> {
        if self.batch == 0 || self.epoch == 0 {
            return Err(FractalEvoError::Configuration(
                "Batch size and epoch count must be positive".to_string(),
            ));
        }
        if self.task.is_empty() || self.dataset.is_empty() {
            return Err(FractalEvoError::Configuration(
                "Task and dataset must be set".to_string(),
            ));
        }
        Ok(())
    }
}
