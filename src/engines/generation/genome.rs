//! Chromosome representation for the architecture search
//!
//! A chromosome is a named set of genes, one value per parameter of the
//! `SearchSpace`. The code generator turns it into a model source file;
//! two chromosomes that render to identical source are the same candidate
//! as far as evaluation is concerned (see `FitnessEvaluator`).
//!
//! Maps are `BTreeMap` so iteration order, serialization and the random
//! draws made while walking the genes are deterministic for a given seed.

use crate::error::FractalEvoError;
use crate::types::ParamValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchSpace {
    params: BTreeMap<String, Vec<ParamValue>>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.params
            .insert(name.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn values(&self, name: &str) -> Option<&[ParamValue]> {
        self.params.get(name).map(|v| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ParamValue>)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn validate(&self) -> Result<(), FractalEvoError> {
        if self.params.is_empty() {
            return Err(FractalEvoError::Configuration(
                "Search space must declare at least one parameter".to_string(),
            ));
        }
        if let Some((name, _)) = self.params.iter().find(|(_, values)| values.is_empty()) {
            return Err(FractalEvoError::Configuration(format!(
                "Search space parameter '{}' has no admissible values",
                name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    pub genes: BTreeMap<String, ParamValue>,
    /// Accuracy percentage, attached after the first evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Chromosome {
    pub fn new(genes: BTreeMap<String, ParamValue>) -> Self {
        Self { genes, accuracy: None }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.genes.get(name)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.genes.get(name).and_then(ParamValue::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.genes.get(name).and_then(ParamValue::as_i64)
    }
}

/// Population member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub chromosome: Chromosome,
    pub fitness: Option<f64>,
}

impl Individual {
    pub fn new(chromosome: Chromosome) -> Self {
        Self { chromosome, fitness: None }
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Fitness used for ranking; unevaluated individuals rank as 0.0
    pub fn score(&self) -> f64 {
        self.fitness.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_space() {
        assert!(SearchSpace::new().validate().is_err());
    }

    #[test]
    fn test_validate_rejects_param_without_values() {
        let space = SearchSpace::new()
            .with_param("a", [1i64, 2])
            .with_param("b", Vec::<i64>::new());
        let err = space.validate().unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_search_space_from_toml() {
        let space: SearchSpace = toml::from_str("n_columns = [2, 3]\ndropout = [0.0, 0.1]\n").unwrap();
        assert_eq!(space.len(), 2);
        assert_eq!(space.values("n_columns").unwrap()[1], ParamValue::Integer(3));
        assert!(space.validate().is_ok());
    }
}
