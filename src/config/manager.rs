use super::{
    evaluation::EvaluationConfig, evolution::EvolutionConfig, harness::HarnessConfig,
    traits::ConfigSection,
};
use crate::engines::generation::genome::SearchSpace;
use crate::error::FractalEvoError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment overrides look like `FRACTAL_EVO__EVOLUTION__MUTATION_RATE=0.3`
pub const ENV_PREFIX: &str = "FRACTAL_EVO";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub evaluation: EvaluationConfig,
    pub harness: HarnessConfig,
    /// Overrides the generator's built-in search space when set
    pub search_space: Option<SearchSpace>,
}

/// Validate one section, naming it in the error
fn check<S: ConfigSection>(section: &S) -> Result<(), FractalEvoError> {
    section.validate().map_err(|e| match e {
        FractalEvoError::Configuration(msg) => {
            FractalEvoError::Configuration(format!("[{}] {}", S::section_name(), msg))
        }
        other => other,
    })
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), FractalEvoError> {
        check(&self.evolution)?;
        check(&self.evaluation)?;
        check(&self.harness)?;
        if let Some(space) = &self.search_space {
            space.validate()?;
        }
        Ok(())
    }
}

pub struct ConfigManager {
    config: AppConfig,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Layer defaults, then the optional TOML/JSON file, then environment
    /// overrides, and validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self, FractalEvoError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let config: AppConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(Self { config })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), FractalEvoError> {
        let toml_str = toml::to_string_pretty(&self.config)
            .map_err(|e| FractalEvoError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| FractalEvoError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    pub fn into_inner(self) -> AppConfig {
        self.config
    }

    pub fn update<F>(&mut self, f: F) -> Result<(), FractalEvoError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut updated = self.config.clone();
        f(&mut updated);
        updated.validate()?;
        self.config = updated;
        Ok(())
    }
}
