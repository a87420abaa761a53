use crate::engines::generation::genome::Individual;
use crate::error::FractalEvoError;
use crate::utils::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Resumable snapshot of a search, written after every generation.
///
/// `population` is the population about to be evaluated for generation
/// `generation` (0-based), i.e. `generation` generations have completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub population: Vec<Individual>,
    pub generation: usize,
    pub best: Option<Individual>,
    pub history: Vec<f64>,
    #[serde(default)]
    pub seen_checksums: BTreeSet<String>,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>, FractalEvoError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)?;
        let checkpoint: Checkpoint = serde_json::from_str(&contents).map_err(|e| {
            FractalEvoError::Checkpoint(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        if checkpoint.history.len() != checkpoint.generation {
            return Err(FractalEvoError::Checkpoint(format!(
                "History has {} entries but {} generations completed",
                checkpoint.history.len(),
                checkpoint.generation
            )));
        }

        Ok(Some(checkpoint))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FractalEvoError> {
        let json = serde_json::to_vec_pretty(self)?;
        atomic_write(path, &json)?;
        Ok(())
    }

    /// Remove a checkpoint if present (used by `--clean`)
    pub fn remove<P: AsRef<Path>>(path: P) -> Result<bool, FractalEvoError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::genome::Chromosome;
    use crate::types::ParamValue;

    fn sample() -> Checkpoint {
        let mut chromosome = Chromosome::default();
        chromosome.genes.insert("n_columns".to_string(), ParamValue::Integer(3));
        chromosome.genes.insert("lr".to_string(), ParamValue::Float(0.01));
        chromosome.accuracy = Some(42.5);
        let best = Individual {
            chromosome: chromosome.clone(),
            fitness: Some(42.5),
        };

        Checkpoint {
            population: vec![best.clone(), Individual::new(Chromosome::default())],
            generation: 2,
            best: Some(best),
            history: vec![30.0, 42.5],
            seen_checksums: ["abc".to_string()].into_iter().collect(),
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Checkpoint::load(dir.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.json");
        let checkpoint = sample();

        checkpoint.save(&path).unwrap();
        let loaded = Checkpoint::load(&path).unwrap().unwrap();

        assert_eq!(loaded.generation, 2);
        assert_eq!(loaded.population, checkpoint.population);
        assert_eq!(loaded.best.unwrap().chromosome.get_f64("lr"), Some(0.01));
        assert!(loaded.seen_checksums.contains("abc"));
    }

    #[test]
    fn test_corrupt_file_is_checkpoint_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.json");
        std::fs::write(&path, "{\"population\": [").unwrap();

        let err = Checkpoint::load(&path).unwrap_err();
        assert!(matches!(err, FractalEvoError::Checkpoint(_)));
    }

    #[test]
    fn test_remove_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.json");
        sample().save(&path).unwrap();

        assert!(Checkpoint::remove(&path).unwrap());
        assert!(!Checkpoint::remove(&path).unwrap());
    }
}
