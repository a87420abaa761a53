use crate::config::{EvaluationConfig, HarnessConfig};
use crate::error::EvalError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Hyperparameter mapping handed to the harness (`prm`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessParams {
    pub lr: f64,
    pub momentum: f64,
    pub batch: usize,
    pub epoch: usize,
    pub transform: String,
}

/// What a harness run returned directly.
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessResult {
    /// Bare accuracy fraction
    Score(f64),
    /// Positional metrics, accuracy at index 1 (e.g. `[loss, accuracy]`)
    Tuple(Vec<f64>),
    /// Structured result mapping
    Summary(Map<String, Value>),
    Nothing,
}

impl HarnessResult {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(HarnessResult::Score).unwrap_or(HarnessResult::Nothing),
            // Non-numeric slots become NaN so positions are preserved
            Value::Array(items) => HarnessResult::Tuple(
                items.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)).collect(),
            ),
            Value::Object(map) => HarnessResult::Summary(map),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(HarnessResult::Score)
                .unwrap_or(HarnessResult::Nothing),
            Value::Bool(_) | Value::Null => HarnessResult::Nothing,
        }
    }

    /// Parse the harness's stdout: the last non-empty line is the result
    pub fn from_output(stdout: &str) -> Self {
        stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .and_then(|line| serde_json::from_str::<Value>(line).ok())
            .map(HarnessResult::from_json)
            .unwrap_or(HarnessResult::Nothing)
    }
}

pub trait TrainingHarness {
    fn evaluate(&mut self, model_path: &Path, params: &HarnessParams) -> Result<HarnessResult, EvalError>;
}

/// Runs the training harness as a child process and blocks until it exits.
pub struct CommandHarness {
    config: HarnessConfig,
    model_source_dir: PathBuf,
    task: String,
    dataset: String,
    metric: String,
}

impl CommandHarness {
    pub fn new(config: HarnessConfig, evaluation: &EvaluationConfig) -> Self {
        Self {
            config,
            model_source_dir: evaluation.arch_dir.clone(),
            task: evaluation.task.clone(),
            dataset: evaluation.dataset.clone(),
            metric: evaluation.metric.clone(),
        }
    }

    pub fn build_command(&self, model_path: &Path, params: &HarnessParams) -> Result<Command, EvalError> {
        let (program, leading) = self
            .config
            .command
            .split_first()
            .ok_or_else(|| EvalError::Harness("empty harness command".to_string()))?;

        let mut command = Command::new(program);
        command
            .args(leading)
            .arg("--model-source-package")
            .arg(&self.model_source_dir)
            .args(["--task", self.task.as_str()])
            .args(["--dataset", self.dataset.as_str()])
            .args(["--metric", self.metric.as_str()])
            .arg("--prm")
            .arg(serde_json::to_string(params)?);
        if !self.config.save_to_db {
            command.arg("--no-db");
        }
        command.arg(model_path);

        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }
        Ok(command)
    }
}

impl TrainingHarness for CommandHarness {
    fn evaluate(&mut self, model_path: &Path, params: &HarnessParams) -> Result<HarnessResult, EvalError> {
        let output = self
            .build_command(model_path, params)?
            .output()
            .map_err(|e| EvalError::Harness(format!("failed to launch {:?}: {}", self.config.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(EvalError::Harness(format!(
                "harness exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }

        Ok(HarnessResult::from_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_shapes() {
        assert_eq!(HarnessResult::from_json(json!(0.73)), HarnessResult::Score(0.73));
        assert_eq!(HarnessResult::from_json(json!("0.5")), HarnessResult::Score(0.5));
        assert_eq!(HarnessResult::from_json(json!(null)), HarnessResult::Nothing);

        match HarnessResult::from_json(json!([1.2, 0.61, "x"])) {
            HarnessResult::Tuple(values) => {
                assert_eq!(values[1], 0.61);
                assert!(values[2].is_nan());
            }
            other => panic!("expected tuple, got {:?}", other),
        }

        assert!(matches!(
            HarnessResult::from_json(json!({"accuracy": 0.4})),
            HarnessResult::Summary(_)
        ));
    }

    #[test]
    fn test_from_output_uses_last_line() {
        let stdout = "epoch 1/1 ...\n{\"accuracy\": 0.62}\n\n";
        match HarnessResult::from_output(stdout) {
            HarnessResult::Summary(map) => assert_eq!(map["accuracy"], json!(0.62)),
            other => panic!("expected summary, got {:?}", other),
        }
        assert_eq!(HarnessResult::from_output("training done"), HarnessResult::Nothing);
    }

    #[test]
    fn test_build_command_appends_flags_and_model() {
        let harness = CommandHarness::new(
            HarnessConfig {
                command: vec!["python3".into(), "train.py".into()],
                ..Default::default()
            },
            &EvaluationConfig::default(),
        );
        let params = HarnessParams {
            lr: 0.01,
            momentum: 0.9,
            batch: 32,
            epoch: 1,
            transform: "norm_256_flip".into(),
        };

        let command = harness.build_command(Path::new("m.py"), &params).unwrap();
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(command.get_program(), "python3");
        assert_eq!(args.first().map(String::as_str), Some("train.py"));
        assert!(args.contains(&"--no-db".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("m.py"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_harness_error() {
        let mut harness = CommandHarness::new(
            HarnessConfig {
                command: vec!["false".into()],
                ..Default::default()
            },
            &EvaluationConfig::default(),
        );
        let params = HarnessParams {
            lr: 0.01,
            momentum: 0.9,
            batch: 32,
            epoch: 1,
            transform: "norm_256_flip".into(),
        };

        let err = harness.evaluate(Path::new("m.py"), &params).unwrap_err();
        assert!(matches!(err, EvalError::Harness(_)));
    }
}
