//! Batch execution of independent market runs.

use market_core::{AgentSpec, Environment, RunOutcome, SimResult};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::ExperimentConfig;
use crate::summary::ExperimentSummary;

/// Runs a configured experiment one market at a time.
///
/// Policies are built once and shared by every run. Run `i` draws two
/// independent seeds from `seed + i`: one for its houses, one for its
/// environment (tie-breaks and private-stream pairing).
#[derive(Debug)]
pub struct ExperimentRunner {
    config: ExperimentConfig,
    specs: Vec<AgentSpec>,
}

impl ExperimentRunner {
    pub fn new(config: ExperimentConfig) -> SimResult<Self> {
        config.validate()?;
        let specs = config.agent_specs()?;
        Ok(Self { config, specs })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Seed used for run `index`
    pub fn seed_for(&self, index: usize) -> u64 {
        self.config.experiment.seed.wrapping_add(index as u64)
    }

    /// House and environment seeds for run `index`
    pub fn run_seeds(&self, index: usize) -> (u64, u64) {
        let mut master = SmallRng::seed_from_u64(self.seed_for(index));
        (master.gen(), master.gen())
    }

    /// Execute run `index` of the batch.
    pub fn run_one(&self, index: usize) -> SimResult<RunOutcome> {
        let (houses_seed, env_seed) = self.run_seeds(index);
        let mut rng = SmallRng::seed_from_u64(houses_seed);
        let houses = self.config.houses.generate(&mut rng)?;
        let env_config = self.config.environment.for_seed(env_seed);
        Environment::simulate(env_config, &self.specs, houses)
    }

    /// Execute every run and fold the results into a summary.
    pub fn run(&self) -> SimResult<ExperimentSummary> {
        let total = self.config.experiment.num_experiments;
        let entries = self
            .config
            .agents
            .iter()
            .map(|entry| (entry.name.as_str(), entry.number));
        let mut summary = ExperimentSummary::new(entries, total);

        tracing::info!(
            "Starting experiment: {} runs, {} agents, {} {} houses",
            total,
            self.config.population_size(),
            self.config.houses.n_houses(),
            self.config.houses.distribution_name()
        );

        let progress_every = (total / 10).max(1);
        for index in 0..total {
            let outcome = self.run_one(index)?;
            summary.record_run(&outcome);

            if (index + 1) % progress_every == 0 || index + 1 == total {
                tracing::info!("Completed {}/{} runs", index + 1, total);
            }
        }

        Ok(summary)
    }
}

/// Convenience wrapper: validate, run every experiment, summarize.
pub fn run_experiments(config: &ExperimentConfig) -> SimResult<ExperimentSummary> {
    ExperimentRunner::new(config.clone())?.run()
}
