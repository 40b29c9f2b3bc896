//! Plain-text rendering of an experiment summary.

use std::fmt;

use crate::summary::{ExperimentSummary, SeriesStats};

fn mean_std(stats: SeriesStats, precision: usize) -> String {
    format!("{:.p$} ± {:.p$}", stats.mean, stats.std, p = precision)
}

impl fmt::Display for ExperimentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Experiment Summary")?;
        writeln!(f, "==================")?;
        writeln!(f, "Experiments:     {}", self.num_experiments)?;
        writeln!(f, "Efficiency:      {}", mean_std(self.efficiency(), 3))?;
        writeln!(f, "Match rate:      {}", mean_std(self.match_rate(), 3))?;
        writeln!(f, "Rounds:          {}", mean_std(self.rounds(), 1))?;
        writeln!(f)?;

        let width = self
            .policy_stats
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(0)
            .max("Policy".len());

        writeln!(
            f,
            "{:<width$}  {:>10}  {:>11}  {:>10}  {:>8}  {:>9}",
            "Policy", "Match rate", "Avg quality", "Avg rounds", "Matches", "Unmatched",
        )?;
        writeln!(f, "{}", "-".repeat(width + 60))?;
        for stats in &self.policy_stats {
            writeln!(
                f,
                "{:<width$}  {:>10.3}  {:>11.2}  {:>10.1}  {:>8}  {:>9}",
                stats.name,
                stats.match_rate(),
                stats.mean_quality(),
                stats.mean_rounds_to_match(),
                stats.matches,
                stats.unmatches,
            )?;
        }
        Ok(())
    }
}

/// Render the summary as the report printed by `stopping_sim`.
pub fn render_summary(summary: &ExperimentSummary) -> String {
    summary.to_string()
}
