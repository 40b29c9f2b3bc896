//! Integration tests for the experiment harness.
//!
//! These run complete experiments from TOML text and files.

use std::io::Write;

use experiment::{
    render_summary, run_experiment_file, run_experiments, ExperimentConfig, ExperimentError,
};
use market_core::{PresentationMode, SimError};
use tempfile::NamedTempFile;

const PRIVATE_STREAM_EXPERIMENT: &str = r#"
[experiment]
num_experiments = 6
seed = 7

[environment]
mode = { kind = "private_stream", max_rounds = 15 }
tie_break = "seeded_random"

[houses]
distribution = "bimodal"
n_houses = 20

[[agents]]
name = "Greedy"
number = 3
policy = { kind = "greedy" }

[[agents]]
name = "Optimal_Stopping"
number = 3
policy = { kind = "optimal_stopping", exploration_fraction = 0.37 }
"#;

#[test]
fn test_experiment_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(PRIVATE_STREAM_EXPERIMENT.as_bytes()).unwrap();

    let summary = run_experiment_file(file.path()).unwrap();

    assert_eq!(summary.num_experiments, 6);
    assert_eq!(summary.rounds_taken.len(), 6);
    assert!(summary.rounds_taken.iter().all(|&r| r <= 15));
    for score in &summary.efficiency_scores {
        assert!((0.0..=1.0 + 1e-9).contains(score));
    }
    let names: Vec<_> = summary.policy_stats.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Greedy", "Optimal_Stopping"]);
}

#[test]
fn test_same_config_same_summary() {
    let config = ExperimentConfig::from_str(PRIVATE_STREAM_EXPERIMENT).unwrap();
    assert_eq!(
        config.environment.mode,
        PresentationMode::PrivateStream { max_rounds: Some(15) }
    );

    let first = run_experiments(&config).unwrap();
    let second = run_experiments(&config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_different_seed_changes_summary() {
    let mut config = ExperimentConfig::from_str(PRIVATE_STREAM_EXPERIMENT).unwrap();
    let first = run_experiments(&config).unwrap();
    config.experiment.seed = 8;
    let second = run_experiments(&config).unwrap();
    assert_ne!(first.efficiency_scores, second.efficiency_scores);
}

#[test]
fn test_default_experiment_runs() {
    let mut config = ExperimentConfig::default();
    config.experiment.num_experiments = 3;

    let summary = run_experiments(&config).unwrap();
    assert_eq!(summary.policy_stats.len(), 4);
    // 100 houses and 40 agents: every greedy agent matches in the first rounds
    let greedy = summary.policy("Greedy").unwrap();
    assert_eq!(greedy.matches, 30);
    assert_eq!(greedy.match_rate(), 1.0);

    let report = render_summary(&summary);
    assert!(report.contains("Threshold_8"));

    let json = summary.to_json().unwrap();
    assert!(json.contains("\"policy_stats\""));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = run_experiment_file(std::path::Path::new("/nonexistent/experiment.toml")).unwrap_err();
    assert!(matches!(err, ExperimentError::Config(_)));
}

#[test]
fn test_invalid_policy_is_a_simulation_error() {
    let toml = r#"
        [[agents]]
        name = "Broken"
        number = 2
        policy = { kind = "optimal_stopping", exploration_fraction = 1.5 }
    "#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();

    let err = run_experiment_file(file.path()).unwrap_err();
    assert!(matches!(
        err,
        ExperimentError::Simulation(SimError::InvalidConfiguration(_))
    ));
}
