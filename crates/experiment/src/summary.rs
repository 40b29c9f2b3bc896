//! Experiment Statistics
//!
//! Accumulates per-run metrics and per-entry policy statistics across a batch.

use market_events::{AgentOutcome, RunOutcome};
use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of a series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: f64,
    pub std: f64,
}

impl SeriesStats {
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: variance.sqrt(),
        }
    }
}

/// Raw results for one agent specification entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyStats {
    pub name: String,
    pub matches: usize,
    pub unmatches: usize,
    /// Agents of this entry across all runs
    pub total_agents: usize,
    /// Quality of every house this entry's agents matched
    pub qualities: Vec<f64>,
    /// Offers seen by each agent at the moment it matched
    pub rounds_to_match: Vec<usize>,
}

impl PolicyStats {
    pub fn new(name: impl Into<String>, total_agents: usize) -> Self {
        Self {
            name: name.into(),
            total_agents,
            ..Default::default()
        }
    }

    pub fn record(&mut self, agent: &AgentOutcome) {
        match agent.quality {
            Some(quality) if agent.matched => {
                self.matches += 1;
                self.qualities.push(quality);
                self.rounds_to_match.push(agent.offers_seen);
            }
            _ => self.unmatches += 1,
        }
    }

    pub fn match_rate(&self) -> f64 {
        if self.total_agents == 0 {
            return 0.0;
        }
        self.matches as f64 / self.total_agents as f64
    }

    /// Average matched quality, 0 if nothing matched
    pub fn mean_quality(&self) -> f64 {
        SeriesStats::of(&self.qualities).mean
    }

    /// Average offers seen before matching, 0 if nothing matched
    pub fn mean_rounds_to_match(&self) -> f64 {
        let rounds: Vec<f64> = self.rounds_to_match.iter().map(|&r| r as f64).collect();
        SeriesStats::of(&rounds).mean
    }
}

/// Summary of multiple experiment runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub num_experiments: usize,
    pub efficiency_scores: Vec<f64>,
    pub match_rates: Vec<f64>,
    pub rounds_taken: Vec<u64>,
    /// One entry per agent specification, in configuration order
    pub policy_stats: Vec<PolicyStats>,
}

impl ExperimentSummary {
    /// Empty summary for `entries` of `(name, agents per run)`
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, usize)>, num_experiments: usize) -> Self {
        Self {
            num_experiments,
            efficiency_scores: Vec::with_capacity(num_experiments),
            match_rates: Vec::with_capacity(num_experiments),
            rounds_taken: Vec::with_capacity(num_experiments),
            policy_stats: entries
                .into_iter()
                .map(|(name, number)| PolicyStats::new(name, number * num_experiments))
                .collect(),
        }
    }

    /// Fold one run into the summary
    pub fn record_run(&mut self, outcome: &RunOutcome) {
        self.efficiency_scores.push(outcome.efficiency_score());
        self.match_rates.push(outcome.match_rate());
        self.rounds_taken.push(outcome.total_rounds);

        for agent in &outcome.agents {
            if let Some(stats) = self.policy_stats.iter_mut().find(|s| s.name == agent.group) {
                stats.record(agent);
            }
        }
    }

    pub fn policy(&self, name: &str) -> Option<&PolicyStats> {
        self.policy_stats.iter().find(|s| s.name == name)
    }

    pub fn efficiency(&self) -> SeriesStats {
        SeriesStats::of(&self.efficiency_scores)
    }

    pub fn match_rate(&self) -> SeriesStats {
        SeriesStats::of(&self.match_rates)
    }

    pub fn rounds(&self) -> SeriesStats {
        let rounds: Vec<f64> = self.rounds_taken.iter().map(|&r| r as f64).collect();
        SeriesStats::of(&rounds)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, group: &str, quality: Option<f64>, offers_seen: usize) -> AgentOutcome {
        AgentOutcome {
            agent_id: id.to_string(),
            group: group.to_string(),
            matched: quality.is_some(),
            house_id: quality.map(|_| "house_1".to_string()),
            quality,
            round_matched: quality.map(|_| offers_seen as u64),
            offers_seen,
        }
    }

    #[test]
    fn test_series_stats() {
        let stats = SeriesStats::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std, 2.0);
        assert_eq!(SeriesStats::of(&[]), SeriesStats::default());
    }

    #[test]
    fn test_record_run() {
        let mut summary = ExperimentSummary::new([("Greedy", 1), ("Threshold_8", 1)], 2);

        summary.record_run(&RunOutcome {
            agents: vec![
                agent("Greedy_1", "Greedy", Some(4.0), 1),
                agent("Threshold_8_1", "Threshold_8", None, 5),
            ],
            unmatched_houses: vec!["house_2".to_string()],
            total_rounds: 5,
            total_houses: 5,
            achieved_quality: 4.0,
            max_quality: 16.0,
            events: Vec::new(),
        });
        summary.record_run(&RunOutcome {
            agents: vec![
                agent("Greedy_1", "Greedy", Some(6.0), 1),
                agent("Threshold_8_1", "Threshold_8", Some(9.0), 3),
            ],
            unmatched_houses: Vec::new(),
            total_rounds: 3,
            total_houses: 3,
            achieved_quality: 15.0,
            max_quality: 15.0,
            events: Vec::new(),
        });

        assert_eq!(summary.efficiency_scores, vec![0.25, 1.0]);
        assert_eq!(summary.match_rates, vec![0.5, 1.0]);
        assert_eq!(summary.rounds().mean, 4.0);

        let greedy = summary.policy("Greedy").unwrap();
        assert_eq!(greedy.total_agents, 2);
        assert_eq!(greedy.matches, 2);
        assert_eq!(greedy.mean_quality(), 5.0);
        assert_eq!(greedy.match_rate(), 1.0);

        let picky = summary.policy("Threshold_8").unwrap();
        assert_eq!(picky.matches, 1);
        assert_eq!(picky.unmatches, 1);
        assert_eq!(picky.rounds_to_match, vec![3]);
        assert_eq!(picky.match_rate(), 0.5);
    }

    #[test]
    fn test_empty_policy_stats() {
        let stats = PolicyStats::new("Nobody", 0);
        assert_eq!(stats.match_rate(), 0.0);
        assert_eq!(stats.mean_quality(), 0.0);
        assert_eq!(stats.mean_rounds_to_match(), 0.0);
    }
}
