use super::codegen::CodeGenerator;
use super::harness::{HarnessParams, TrainingHarness};
use super::record::{clear_summary, epoch_count, extract_accuracy, read_summary, resolve_record, write_record};
use crate::config::EvaluationConfig;
use crate::engines::generation::evolution_engine::FitnessFunction;
use crate::engines::generation::genome::Chromosome;
use crate::error::EvalError;
use crate::utils::{atomic_write, content_checksum};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Scores chromosomes by generating their model source and training it once.
///
/// Candidates are identified by the checksum of their generated source; a
/// checksum already evaluated scores 0.0 without touching the harness.
pub struct FitnessEvaluator<G: CodeGenerator, H: TrainingHarness> {
    generator: G,
    harness: H,
    config: EvaluationConfig,
    seen: BTreeSet<String>,
}

impl<G: CodeGenerator, H: TrainingHarness> FitnessEvaluator<G, H> {
    pub fn new(generator: G, harness: H, config: EvaluationConfig) -> Self {
        Self {
            generator,
            harness,
            config,
            seen: BTreeSet::new(),
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn harness(&self) -> &H {
        &self.harness
    }

    pub fn is_seen(&self, checksum: &str) -> bool {
        self.seen.contains(checksum)
    }

    pub fn model_name(&self, checksum: &str) -> String {
        format!(
            "{}_{}_{}-{}",
            self.config.task,
            self.config.dataset,
            self.generator.model_family(),
            checksum
        )
    }

    pub fn model_path(&self, checksum: &str) -> PathBuf {
        self.config
            .arch_dir
            .join(format!("{}.py", self.model_name(checksum)))
    }

    fn params_for(&self, chromosome: &Chromosome) -> HarnessParams {
        HarnessParams {
            lr: chromosome.get_f64("lr").unwrap_or(self.config.default_lr),
            momentum: chromosome
                .get_f64("momentum")
                .unwrap_or(self.config.default_momentum),
            batch: self.config.batch,
            epoch: self.config.epoch,
            transform: self.config.transform.clone(),
        }
    }

    /// Accuracy percentage of `chromosome`; 0.0 for a duplicate
    pub fn evaluate(&mut self, chromosome: &Chromosome) -> Result<f64, EvalError> {
        Ok(self.evaluate_unique(chromosome)?.unwrap_or(0.0))
    }

    /// `None` when the generated source was already evaluated
    fn evaluate_unique(&mut self, chromosome: &Chromosome) -> Result<Option<f64>, EvalError> {
        let code = self.generator.generate(chromosome)?;
        let checksum = content_checksum(&code);

        if self.seen.contains(&checksum) {
            log::info!("  - Duplicate (checksum: {}) -> skip", &checksum[..8]);
            return Ok(None);
        }

        log::info!("  - Evaluating unique arch (checksum: {}...)", &checksum[..8]);

        let model_path = self.model_path(&checksum);
        atomic_write(&model_path, code.as_bytes())?;

        let params = self.params_for(chromosome);
        clear_summary(&self.config.summary_path)?;
        let result = self.harness.evaluate(&model_path, &params)?;

        let summary = read_summary(&self.config.summary_path);
        let mut record = resolve_record(summary, &result);
        record.insert("uid".to_string(), Value::String(checksum.clone()));

        let epochs = epoch_count(&record, params.epoch);
        let record_path = write_record(&self.config.stats_dir, &self.model_name(&checksum), epochs, &record)?;
        log::debug!("  - Result record written to {}", record_path.display());

        let accuracy = extract_accuracy(&record, &result);
        log::info!("  - Eval result: {:.2}%", accuracy);

        self.seen.insert(checksum);
        Ok(Some(accuracy))
    }
}

impl<G: CodeGenerator, H: TrainingHarness> FitnessFunction for FitnessEvaluator<G, H> {
    fn evaluate(&mut self, chromosome: &mut Chromosome) -> Result<f64, EvalError> {
        match self.evaluate_unique(chromosome)? {
            Some(accuracy) => {
                chromosome.accuracy = Some(accuracy);
                Ok(accuracy)
            }
            None => Ok(0.0),
        }
    }

    fn seen_checksums(&self) -> BTreeSet<String> {
        self.seen.clone()
    }

    fn restore_seen(&mut self, seen: BTreeSet<String>) {
        self.seen.extend(seen);
    }
}
