//! Market Environment
//!
//! Drives one run from a fresh population and a fixed house sequence.
//!
//! # Round structure
//!
//! ```text
//! Initializing ──▶ Running ──(houses exhausted | no active agents | round limit)──▶ Terminated
//!
//! each round:
//!   1. pick offers        (shared market: next house to everyone;
//!                          private stream: random distinct house per agent)
//!   2. decide             every presented agent, against state read at round start
//!   3. resolve            one acceptor wins outright, several go to the tie-break
//!   4. observe            everyone presented, except the winner, appends the quality
//!   5. check consistency  no house claimed twice, no agent matched twice
//! ```
//!
//! Decisions are all taken before any effect is applied, so no agent can
//! see another agent's choice from the same round. A finished environment
//! is consumed by [`Environment::finish`]; a new run needs a new instance.

use std::collections::{BTreeMap, HashSet};

use market_events::{top_quality_sum, EventKind, MarketEvent, RunOutcome};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::agent::{spawn_agents, Agent, AgentSpec};
use crate::error::{SimError, SimResult};
use crate::house::House;
use crate::policy::DecisionContext;

/// How houses reach agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresentationMode {
    /// One house per round, in generator order, offered to every active agent
    #[default]
    SharedMarket,
    /// Each round, active agents are paired at random with distinct available houses
    PrivateStream {
        /// Round limit; defaults to twice `min(agents, houses)`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_rounds: Option<u64>,
    },
}

/// Who wins when several agents accept the same house in one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The acceptor with the lowest population index
    #[default]
    LowestIndex,
    /// Uniform choice among acceptors, drawn from the environment's RNG
    SeededRandom,
}

/// Environment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub mode: PresentationMode,
    pub tie_break: TieBreak,
    /// Seed for tie-breaks and private-stream pairing
    pub seed: u64,
    /// Keep a per-decision event log in the outcome
    pub record_events: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            mode: PresentationMode::SharedMarket,
            tie_break: TieBreak::LowestIndex,
            seed: 42,
            record_events: false,
        }
    }
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Initializing,
    Running,
    Terminated,
}

/// One simulation run
#[derive(Debug)]
pub struct Environment {
    config: EnvironmentConfig,
    state: RunState,
    agents: Vec<Agent>,
    houses: Vec<House>,
    /// Agent index holding each house, by house position
    claimed_by: Vec<Option<usize>>,
    /// Next house to present in shared-market mode
    cursor: usize,
    max_rounds: u64,
    round: u64,
    rng: SmallRng,
    events: Vec<MarketEvent>,
    failure: Option<SimError>,
}

impl Environment {
    /// Validate the setup and build a fresh run. Nothing is presented yet.
    pub fn new(config: EnvironmentConfig, specs: &[AgentSpec], houses: Vec<House>) -> SimResult<Self> {
        let agents = spawn_agents(specs)?;

        let mut ids = HashSet::new();
        for house in &houses {
            if !house.quality.is_finite() {
                return Err(SimError::invalid(format!(
                    "house {} has non-finite quality {}",
                    house.id, house.quality
                )));
            }
            if !ids.insert(house.id.clone()) {
                return Err(SimError::invalid(format!("duplicate house id {}", house.id)));
            }
        }

        let max_rounds = match config.mode {
            PresentationMode::SharedMarket => houses.len() as u64,
            PresentationMode::PrivateStream { max_rounds } => {
                max_rounds.unwrap_or(2 * agents.len().min(houses.len()) as u64)
            }
        };

        Ok(Self {
            rng: SmallRng::seed_from_u64(config.seed),
            claimed_by: vec![None; houses.len()],
            config,
            state: RunState::Initializing,
            agents,
            houses,
            cursor: 0,
            max_rounds,
            round: 0,
            events: Vec::new(),
            failure: None,
        })
    }

    /// Build, run to completion, and return the outcome.
    pub fn simulate(config: EnvironmentConfig, specs: &[AgentSpec], houses: Vec<House>) -> SimResult<RunOutcome> {
        Self::new(config, specs, houses)?.finish()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn max_rounds(&self) -> u64 {
        self.max_rounds
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn houses(&self) -> &[House] {
        &self.houses
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_active()).count()
    }

    /// Houses nobody holds yet
    pub fn unclaimed_count(&self) -> usize {
        self.claimed_by.iter().filter(|c| c.is_none()).count()
    }

    /// Run one round. Returns `Ok(false)` once the run has terminated.
    ///
    /// A failed round terminates the run; the same error is returned on
    /// every later call.
    pub fn step(&mut self) -> SimResult<bool> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        match self.advance() {
            Ok(running) => Ok(running),
            Err(err) => {
                tracing::error!("Run aborted in round {}: {}", self.round, err);
                self.state = RunState::Terminated;
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Step until terminated.
    pub fn run(&mut self) -> SimResult<()> {
        while self.step()? {}
        Ok(())
    }

    /// Run to completion and hand back the read-only outcome.
    pub fn finish(mut self) -> SimResult<RunOutcome> {
        self.run()?;
        Ok(self.outcome())
    }

    fn advance(&mut self) -> SimResult<bool> {
        match self.state {
            RunState::Terminated => return Ok(false),
            RunState::Initializing => {
                tracing::debug!(
                    "Starting run: {} agents, {} houses, {:?}, tie-break {:?}",
                    self.agents.len(),
                    self.houses.len(),
                    self.config.mode,
                    self.config.tie_break
                );
                self.state = RunState::Running;
            }
            RunState::Running => {}
        }

        if self.is_exhausted() {
            self.terminate();
            return Ok(false);
        }

        self.round += 1;
        match self.config.mode {
            PresentationMode::SharedMarket => self.shared_round()?,
            PresentationMode::PrivateStream { .. } => self.private_round()?,
        }
        self.check_consistency()?;

        if self.is_exhausted() {
            self.terminate();
            return Ok(false);
        }
        Ok(true)
    }

    fn is_exhausted(&self) -> bool {
        let no_offers = match self.config.mode {
            PresentationMode::SharedMarket => self.cursor >= self.houses.len(),
            PresentationMode::PrivateStream { .. } => self.unclaimed_count() == 0,
        };
        no_offers || self.active_count() == 0 || self.round >= self.max_rounds
    }

    fn active_indices(&self) -> Vec<usize> {
        self.agents
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.index)
            .collect()
    }

    fn context(&self, agent: usize, houses_left: usize, agents_left: usize, remaining_offers: usize) -> DecisionContext {
        let offer_index = self.agents[agent].history().len();
        DecisionContext {
            round: self.round,
            offer_index,
            total_rounds: Some(self.max_rounds),
            total_houses: Some(self.houses.len()),
            houses_left,
            total_agents: self.agents.len(),
            agents_left,
            offer_horizon: Some(offer_index + remaining_offers),
        }
    }

    /// Present the next house to every active agent.
    fn shared_round(&mut self) -> SimResult<()> {
        let house_idx = self.cursor;
        self.cursor += 1;

        let active = self.active_indices();
        // unpresented houses, current one included
        let houses_left = self.houses.len() - house_idx;
        let offers: Vec<(usize, usize)> = active.iter().map(|&a| (a, house_idx)).collect();

        self.play_offers(&offers, houses_left, active.len(), houses_left)
    }

    /// Pair active agents with distinct random houses.
    fn private_round(&mut self) -> SimResult<()> {
        let active = self.active_indices();
        let available: Vec<usize> = (0..self.houses.len())
            .filter(|&h| self.claimed_by[h].is_none())
            .collect();
        let k = active.len().min(available.len());

        let mut agents: Vec<usize> = active.choose_multiple(&mut self.rng, k).copied().collect();
        agents.sort_unstable();
        let mut houses: Vec<usize> = available.choose_multiple(&mut self.rng, k).copied().collect();
        houses.shuffle(&mut self.rng);

        let offers: Vec<(usize, usize)> = agents.into_iter().zip(houses).collect();
        let rounds_left = (self.max_rounds - self.round + 1) as usize;
        let remaining_offers = rounds_left.min(available.len());

        self.play_offers(&offers, available.len(), active.len(), remaining_offers)
    }

    /// Decide every `(agent, house)` offer, then apply all effects together.
    fn play_offers(
        &mut self,
        offers: &[(usize, usize)],
        houses_left: usize,
        agents_left: usize,
        remaining_offers: usize,
    ) -> SimResult<()> {
        let mut acceptors: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

        for &(agent, house_idx) in offers {
            let ctx = self.context(agent, houses_left, agents_left, remaining_offers);
            let house = &self.houses[house_idx];
            let decision = self.agents[agent].evaluate(house, &ctx)?;

            let kind = if decision.is_accept() {
                acceptors.entry(house_idx).or_default().push(agent);
                EventKind::Accepted
            } else {
                EventKind::Rejected
            };
            self.record(kind, agent, Some(house_idx));
        }

        let mut winners = HashSet::new();
        for (&house_idx, candidates) in &acceptors {
            let winner = self.resolve(candidates);
            self.claim(house_idx, winner)?;
            winners.insert(winner);

            tracing::debug!(
                "Round {}: {} taken by {} ({} acceptors)",
                self.round,
                self.houses[house_idx].id,
                self.agents[winner].id,
                candidates.len()
            );

            for &loser in candidates.iter().filter(|&&a| a != winner) {
                self.record(EventKind::LostTieBreak, loser, Some(house_idx));
            }
        }

        for &(agent, house_idx) in offers {
            if !winners.contains(&agent) {
                let quality = self.houses[house_idx].quality;
                self.agents[agent].observe(quality);
            }
        }

        Ok(())
    }

    /// Pick the winner among agents (ascending index) that accepted the same house.
    fn resolve(&mut self, candidates: &[usize]) -> usize {
        if candidates.len() == 1 {
            return candidates[0];
        }
        match self.config.tie_break {
            TieBreak::LowestIndex => candidates.iter().copied().min().unwrap_or(candidates[0]),
            TieBreak::SeededRandom => *candidates.choose(&mut self.rng).unwrap_or(&candidates[0]),
        }
    }

    fn claim(&mut self, house_idx: usize, agent: usize) -> SimResult<()> {
        if let Some(holder) = self.claimed_by[house_idx] {
            return Err(SimError::violation(format!(
                "house {} claimed by {} and {}",
                self.houses[house_idx].id, self.agents[holder].id, self.agents[agent].id
            )));
        }
        self.agents[agent].assign(&self.houses[house_idx], self.round)?;
        self.claimed_by[house_idx] = Some(agent);
        self.record(EventKind::Matched, agent, Some(house_idx));
        Ok(())
    }

    /// Cross-check the claim table against the agents' own matches.
    fn check_consistency(&self) -> SimResult<()> {
        let mut holders = HashSet::new();
        let mut claimed = 0;

        for (house_idx, holder) in self.claimed_by.iter().enumerate() {
            let Some(agent) = *holder else { continue };
            claimed += 1;
            if !holders.insert(agent) {
                return Err(SimError::violation(format!(
                    "agent {} holds more than one house",
                    self.agents[agent].id
                )));
            }
            let house = &self.houses[house_idx];
            match self.agents[agent].matched() {
                Some(m) if m.house_id == house.id => {}
                _ => {
                    return Err(SimError::violation(format!(
                        "claim table gives {} to {} but the agent disagrees",
                        house.id, self.agents[agent].id
                    )))
                }
            }
        }

        let matched = self.agents.iter().filter(|a| a.matched().is_some()).count();
        if matched != claimed {
            return Err(SimError::violation(format!(
                "{} agents matched but {} houses claimed",
                matched, claimed
            )));
        }
        Ok(())
    }

    fn terminate(&mut self) {
        for agent in self.active_indices() {
            self.agents[agent].retire();
            self.record(EventKind::Exhausted, agent, None);
        }
        self.state = RunState::Terminated;

        let matched = self.agents.iter().filter(|a| a.matched().is_some()).count();
        tracing::debug!(
            "Run terminated after {} rounds: {}/{} agents matched",
            self.round,
            matched,
            self.agents.len()
        );
    }

    fn record(&mut self, kind: EventKind, agent: usize, house_idx: Option<usize>) {
        if !self.config.record_events {
            return;
        }
        let house = house_idx.map(|h| (self.houses[h].id.as_str(), self.houses[h].quality));
        self.events
            .push(MarketEvent::new(self.round, kind, self.agents[agent].id.0.clone(), house));
    }

    fn outcome(self) -> RunOutcome {
        let achieved_quality = self
            .agents
            .iter()
            .filter_map(|a| a.matched().map(|m| m.quality))
            .sum();
        let qualities: Vec<f64> = self.houses.iter().map(|h| h.quality).collect();
        let max_quality = top_quality_sum(&qualities, self.agents.len().min(self.houses.len()));
        let unmatched_houses = self
            .houses
            .iter()
            .zip(&self.claimed_by)
            .filter(|(_, holder)| holder.is_none())
            .map(|(house, _)| house.id.0.clone())
            .collect();

        RunOutcome {
            agents: self.agents.iter().map(Agent::to_outcome).collect(),
            unmatched_houses,
            total_rounds: self.round,
            total_houses: self.houses.len(),
            achieved_quality,
            max_quality,
            events: self.events,
        }
    }
}
