//! Result records: which result a candidate's accuracy is read from, and
//! the per-architecture JSON files written after each evaluation.
//!
//! Source priority for the record:
//! 1. the harness's post-training summary file, when this evaluation's
//!    harness run wrote one (any earlier file is cleared beforehand)
//! 2. the harness's direct result, when it is a `Summary`
//! 3. an empty record
//!
//! Accuracy priority (fractions scaled to percent):
//! 1. `record.accuracy`
//! 2. `record.best_accuracy`
//! 3. a `Tuple` result's second element
//! 4. a `Score` result
//! 5. `0.0`

use super::harness::HarnessResult;
use crate::error::EvalError;
use crate::utils::atomic_write;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub type ResultRecord = Map<String, Value>;

/// Remove the summary left by a previous harness run so it cannot be read
/// back as this candidate's result.
pub fn clear_summary(path: &Path) -> Result<(), EvalError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Cleared previous training summary {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Read the harness summary file. An unreadable one is logged and treated
/// as an empty record.
pub fn read_summary(path: &Path) -> Option<ResultRecord> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            log::warn!("Failed to read training summary: {}", e);
            return Some(Map::new());
        }
    };

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            log::warn!("Training summary {} is not a JSON object", path.display());
            Some(Map::new())
        }
        Err(e) => {
            log::warn!("Failed to parse training summary: {}", e);
            Some(Map::new())
        }
    }
}

pub fn resolve_record(summary: Option<ResultRecord>, result: &HarnessResult) -> ResultRecord {
    match (summary, result) {
        (Some(summary), _) => summary,
        (None, HarnessResult::Summary(map)) => map.clone(),
        (None, _) => Map::new(),
    }
}

/// Epoch count that names the record file
pub fn epoch_count(record: &ResultRecord, requested: usize) -> u64 {
    let as_count = |v: &Value| v.as_u64().or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64));

    record
        .get("epoch_max")
        .and_then(as_count)
        .or_else(|| {
            record
                .get("training_summary")
                .and_then(|s| s.get("total_epochs"))
                .and_then(as_count)
        })
        .unwrap_or(requested as u64)
}

/// Accuracy percentage (0-100) following the documented priority order
pub fn extract_accuracy(record: &ResultRecord, result: &HarnessResult) -> f64 {
    let fraction = record
        .get("accuracy")
        .and_then(Value::as_f64)
        .or_else(|| record.get("best_accuracy").and_then(Value::as_f64))
        .or_else(|| match result {
            HarnessResult::Tuple(values) if values.len() >= 2 => Some(values[1]),
            HarnessResult::Score(score) => Some(*score),
            _ => None,
        })
        .filter(|f| f.is_finite());

    fraction.map(|f| f * 100.0).unwrap_or(0.0)
}

/// Write `{stats_dir}/{arch_name}/{epochs}.json`
pub fn write_record(stats_dir: &Path, arch_name: &str, epochs: u64, record: &ResultRecord) -> Result<PathBuf, EvalError> {
    let path = stats_dir.join(arch_name).join(format!("{}.json", epochs));
    let json = serde_json::to_vec_pretty(record)?;
    atomic_write(&path, &json)?;
    Ok(path)
}
