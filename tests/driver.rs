use std::path::Path;
use std::process::{Command, Output};

const CHECKPOINT: &str = "fractal_ga_ckpt.json";
const BEST_MODEL: &str = "best_fractal_model.py";

/// Harness command that can never launch, so every candidate scores 0.0
fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("fractal_evo.toml");
    std::fs::write(
        &path,
        r#"
[harness]
command = ["fractal-evo-missing-harness"]
"#,
    )
    .unwrap();
    path
}

fn run_driver(dir: &Path, args: &[&str]) -> Output {
    let config = write_config(dir);
    Command::new(env!("CARGO_BIN_EXE_fractal-evo"))
        .current_dir(dir)
        .env_remove("FRACTAL_EVO_CONFIG")
        .env("RUST_LOG", "error")
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .unwrap()
}

fn last_stdout_line(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .last()
        .unwrap_or_default()
        .to_string()
}

#[test]
fn test_corrupt_checkpoint_prints_zero_score() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CHECKPOINT), "{ not a checkpoint").unwrap();

    let output = run_driver(dir.path(), &["--gens", "1", "--pop", "2", "--seed", "3"]);

    assert!(output.status.success());
    assert_eq!(last_stdout_line(&output), "META_SCORE: 0.0");
    // left for inspection
    assert_eq!(
        std::fs::read_to_string(dir.path().join(CHECKPOINT)).unwrap(),
        "{ not a checkpoint"
    );
}

#[test]
fn test_clean_discards_corrupt_checkpoint_and_runs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CHECKPOINT), "{ not a checkpoint").unwrap();

    let output = run_driver(dir.path(), &["--clean", "--gens", "1", "--pop", "2", "--seed", "3"]);

    assert!(output.status.success());
    assert_eq!(last_stdout_line(&output), "META_SCORE: 0.0000");

    let checkpoint: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(CHECKPOINT)).unwrap()).unwrap();
    assert_eq!(checkpoint["generation"], serde_json::json!(1));
    assert_eq!(checkpoint["population"].as_array().unwrap().len(), 2);

    let best = std::fs::read_to_string(dir.path().join(BEST_MODEL)).unwrap();
    assert!(!best.is_empty());
}

#[test]
fn test_invalid_population_prints_zero_score() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_driver(dir.path(), &["--pop", "0"]);

    assert!(output.status.success());
    assert_eq!(last_stdout_line(&output), "META_SCORE: 0.0");
}

#[test]
fn test_negative_generations_run_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_driver(dir.path(), &["--gens", "-1", "--pop", "2"]);

    assert!(output.status.success());
    assert_eq!(last_stdout_line(&output), "META_SCORE: 0.0000");
    assert!(!dir.path().join(CHECKPOINT).exists());
    assert!(!dir.path().join(BEST_MODEL).exists());
}
