use super::traits::ConfigSection;
use crate::error::FractalEvoError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Program and leading arguments; harness flags and the model path are appended
    pub command: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub save_to_db: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_string(), "train_eval.py".to_string()],
            working_dir: None,
            save_to_db: false,
        }
    }
}

impl ConfigSection for HarnessConfig {
    fn section_name() -> &'static str {
        "harness"
    }

    fn validate(&self) -> Result<(), FractalEvoError> {
        if self.command.first().map_or(true, |program| program.is_empty()) {
            return Err(FractalEvoError::Configuration(
                "Harness command must name a program".to_string(),
            ));
        }
        Ok(())
    }
}
