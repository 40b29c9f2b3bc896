//! Agents
//!
//! An agent binds a shared policy to the per-run state the environment
//! mutates: its observation history, its match, and whether it is still
//! in the market.

use std::fmt;
use std::sync::Arc;

use market_events::AgentOutcome;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::house::{House, HouseId};
use crate::policy::{Decision, DecisionContext, Policy, PolicyConfig};

/// Unique identifier for an agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Irrevocable binding of an agent to a house
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub house_id: HouseId,
    pub quality: f64,
    pub round: u64,
}

/// One participant in a run
#[derive(Debug, Clone)]
pub struct Agent {
    /// Position in the expanded population; lower index wins tie-breaks
    pub index: usize,
    pub id: AgentId,
    /// Specification entry this agent came from
    pub group: String,
    policy: Arc<dyn Policy>,
    history: Vec<f64>,
    matched: Option<Match>,
    active: bool,
    decisions: usize,
}

impl Agent {
    pub fn new(index: usize, id: impl Into<String>, group: impl Into<String>, policy: Arc<dyn Policy>) -> Self {
        Self {
            index,
            id: AgentId(id.into()),
            group: group.into(),
            policy,
            history: Vec::new(),
            matched: None,
            active: true,
            decisions: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Qualities observed so far, in order
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn matched(&self) -> Option<&Match> {
        self.matched.as_ref()
    }

    pub fn decisions(&self) -> usize {
        self.decisions
    }

    pub fn policy(&self) -> &dyn Policy {
        self.policy.as_ref()
    }

    /// Offers presented, counting the one the agent matched on
    pub fn offers_seen(&self) -> usize {
        self.history.len() + usize::from(self.matched.is_some())
    }

    /// Ask the policy about `offer`. Inactive agents never decide.
    pub fn evaluate(&mut self, offer: &House, ctx: &DecisionContext) -> SimResult<Decision> {
        if !self.active {
            return Err(SimError::violation(format!(
                "inactive agent {} was asked to decide on {}",
                self.id, offer.id
            )));
        }
        self.decisions += 1;
        Ok(self.policy.decide(&self.history, offer, ctx))
    }

    /// Record an offer the agent saw but did not end up matched to
    pub fn observe(&mut self, quality: f64) {
        self.history.push(quality);
    }

    /// Bind the agent to `house`; the history is frozen from here on.
    pub fn assign(&mut self, house: &House, round: u64) -> SimResult<()> {
        if let Some(existing) = &self.matched {
            return Err(SimError::violation(format!(
                "agent {} already matched to {}, cannot also take {}",
                self.id, existing.house_id, house.id
            )));
        }
        self.matched = Some(Match {
            house_id: house.id.clone(),
            quality: house.quality,
            round,
        });
        self.active = false;
        Ok(())
    }

    /// Leave the market unmatched
    pub fn retire(&mut self) {
        self.active = false;
    }

    pub fn to_outcome(&self) -> AgentOutcome {
        match &self.matched {
            Some(m) => AgentOutcome {
                agent_id: self.id.0.clone(),
                group: self.group.clone(),
                matched: true,
                house_id: Some(m.house_id.0.clone()),
                quality: Some(m.quality),
                round_matched: Some(m.round),
                offers_seen: self.offers_seen(),
            },
            None => AgentOutcome::unmatched(self.id.0.clone(), self.group.clone(), self.offers_seen()),
        }
    }
}

/// Where an agent specification gets its policy from
#[derive(Clone)]
pub enum PolicySource {
    /// One instance shared by every agent of the entry
    Shared(Arc<dyn Policy>),
    /// A fresh instance per agent
    Factory(Arc<dyn Fn() -> Arc<dyn Policy> + Send + Sync>),
}

impl PolicySource {
    fn instantiate(&self) -> Arc<dyn Policy> {
        match self {
            PolicySource::Shared(policy) => Arc::clone(policy),
            PolicySource::Factory(make) => make(),
        }
    }
}

impl fmt::Debug for PolicySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySource::Shared(policy) => f.debug_tuple("Shared").field(policy).finish(),
            PolicySource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// `number` agents named `<name>_1 .. <name>_<number>` sharing a policy source
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub policy: PolicySource,
    pub number: usize,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, policy: Arc<dyn Policy>, number: usize) -> Self {
        Self {
            name: name.into(),
            policy: PolicySource::Shared(policy),
            number,
        }
    }

    pub fn from_factory<F>(name: impl Into<String>, number: usize, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Policy> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            policy: PolicySource::Factory(Arc::new(factory)),
            number,
        }
    }

    pub fn from_config(name: impl Into<String>, config: &PolicyConfig, number: usize) -> SimResult<Self> {
        Ok(Self::new(name, config.build()?, number))
    }
}

/// Expand specifications into a fresh population, in specification order.
pub fn spawn_agents(specs: &[AgentSpec]) -> SimResult<Vec<Agent>> {
    let mut agents = Vec::new();

    for spec in specs {
        if spec.name.trim().is_empty() {
            return Err(SimError::invalid("agent specification name must not be empty"));
        }
        if spec.number == 0 {
            return Err(SimError::invalid(format!(
                "agent specification '{}' must have a positive number of agents",
                spec.name
            )));
        }
        for n in 1..=spec.number {
            let index = agents.len();
            agents.push(Agent::new(
                index,
                format!("{}_{}", spec.name, n),
                spec.name.clone(),
                spec.policy.instantiate(),
            ));
        }
    }

    if agents.is_empty() {
        return Err(SimError::invalid("agent specification yields zero agents"));
    }

    let mut ids: Vec<&str> = agents.iter().map(|a| a.id.0.as_str()).collect();
    ids.sort_unstable();
    if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
        return Err(SimError::invalid(format!("duplicate agent id {}", pair[0])));
    }

    Ok(agents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Greedy, Threshold};
    use crate::policy::tests::solo_context;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_spawn_names_and_indices() {
        let specs = vec![
            AgentSpec::new("Greedy", Arc::new(Greedy), 2),
            AgentSpec::new("Threshold_6", Arc::new(Threshold::new(6.0).unwrap()), 1),
        ];
        let agents = spawn_agents(&specs).unwrap();

        let ids: Vec<_> = agents.iter().map(|a| a.id.0.as_str()).collect();
        assert_eq!(ids, vec!["Greedy_1", "Greedy_2", "Threshold_6_1"]);
        assert_eq!(agents[2].index, 2);
        assert_eq!(agents[2].group, "Threshold_6");
        assert!(agents.iter().all(|a| a.is_active() && a.history().is_empty()));
    }

    #[test]
    fn test_zero_agents_is_invalid() {
        assert!(matches!(
            spawn_agents(&[]),
            Err(SimError::InvalidConfiguration(_))
        ));
        let specs = vec![AgentSpec::new("Greedy", Arc::new(Greedy), 0)];
        assert!(matches!(
            spawn_agents(&specs),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_are_invalid() {
        let specs = vec![
            AgentSpec::new("Greedy", Arc::new(Greedy), 1),
            AgentSpec::new("Greedy", Arc::new(Greedy), 1),
        ];
        assert!(spawn_agents(&specs).is_err());
    }

    #[test]
    fn test_factory_builds_one_policy_per_agent() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let specs = vec![AgentSpec::from_factory("Fresh", 3, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(Greedy) as Arc<dyn Policy>
        })];
        spawn_agents(&specs).unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_assign_once() {
        let mut agent = Agent::new(0, "Greedy_1", "Greedy", Arc::new(Greedy));
        agent.observe(3.0);

        let house = House::new("house_2", 6.0);
        agent.assign(&house, 2).unwrap();
        assert!(!agent.is_active());
        assert_eq!(agent.history(), &[3.0]);
        assert_eq!(agent.offers_seen(), 2);

        let other = House::new("house_3", 9.0);
        assert!(matches!(
            agent.assign(&other, 3),
            Err(SimError::ConsistencyViolation(_))
        ));
        assert_eq!(agent.matched().unwrap().house_id.as_str(), "house_2");
    }

    #[test]
    fn test_inactive_agent_cannot_decide() {
        let mut agent = Agent::new(0, "Greedy_1", "Greedy", Arc::new(Greedy));
        agent.retire();
        let house = House::new("house_1", 5.0);
        assert!(agent.evaluate(&house, &solo_context(0, 1)).is_err());
        assert_eq!(agent.decisions(), 0);
    }

    #[test]
    fn test_outcome_conversion() {
        let mut agent = Agent::new(0, "Greedy_1", "Greedy", Arc::new(Greedy));
        assert!(!agent.to_outcome().matched);

        agent.assign(&House::new("house_1", 4.5), 1).unwrap();
        let outcome = agent.to_outcome();
        assert!(outcome.matched);
        assert_eq!(outcome.house_id.as_deref(), Some("house_1"));
        assert_eq!(outcome.quality, Some(4.5));
        assert_eq!(outcome.round_matched, Some(1));
        assert_eq!(outcome.offers_seen, 1);
    }
}
