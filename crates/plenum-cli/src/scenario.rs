//! Scripted governance scenarios.
//!
//! A scenario is a TOML list of steps replayed against a fresh deployment.
//! Accounts are written either as `0x` addresses or as plain labels
//! (`"alice"`); `"governor"` and `"token"` name the deployed contracts.
//! Proposals are referred to by their description.

use anyhow::{bail, Context};
use plenum_governance::config::amount;
use plenum_governance::{
    description_hash, Action, Deployment, GovernanceError, GovernanceEvent, ProposalId,
    ProposalState, TokenCall, VoteSupport,
};
use plenum_types::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Parsed scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One scripted operation.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: StepAction,
    /// Error kind this step is expected to fail with
    #[serde(default)]
    pub expect_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    Mine {
        #[serde(default = "one")]
        blocks: u64,
    },
    Transfer {
        from: String,
        to: String,
        #[serde(with = "amount")]
        amount: u128,
    },
    Delegate {
        account: String,
        to: String,
    },
    Propose {
        proposer: String,
        description: String,
        #[serde(default)]
        calls: Vec<ScriptCall>,
    },
    Vote {
        voter: String,
        proposal: String,
        support: VoteSupport,
        #[serde(default)]
        reason: String,
    },
    Execute {
        proposal: String,
    },
    State {
        proposal: String,
    },
    ExpectState {
        proposal: String,
        state: ProposalState,
    },
}

impl StepAction {
    pub fn name(&self) -> &'static str {
        match self {
            StepAction::Mine { .. } => "mine",
            StepAction::Transfer { .. } => "transfer",
            StepAction::Delegate { .. } => "delegate",
            StepAction::Propose { .. } => "propose",
            StepAction::Vote { .. } => "vote",
            StepAction::Execute { .. } => "execute",
            StepAction::State { .. } => "state",
            StepAction::ExpectState { .. } => "expect_state",
        }
    }
}

/// Token call written in a `propose` step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ScriptCall {
    Mint {
        to: String,
        #[serde(with = "amount")]
        amount: u128,
    },
    Burn {
        #[serde(with = "amount")]
        amount: u128,
    },
    Transfer {
        to: String,
        #[serde(with = "amount")]
        amount: u128,
    },
}

fn one() -> u64 {
    1
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario '{}'", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse scenario '{}'", path.display()))
    }
}

/// Result of one replayed step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    pub height: u64,
    pub outcome: Outcome,
    pub events: Vec<GovernanceEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Step succeeded as expected
    Ok(String),
    /// Step failed with the expected error kind
    ExpectedError(String),
    /// Step did not behave as scripted
    Unexpected(String),
}

impl Outcome {
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Outcome::Unexpected(_))
    }
}

/// Replays steps against one deployment.
pub struct ScenarioRunner {
    deployment: Deployment,
    proposals: HashMap<String, (Vec<Action>, ProposalId)>,
}

impl ScenarioRunner {
    pub fn new(deployment: Deployment) -> Self {
        Self {
            deployment,
            proposals: HashMap::new(),
        }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Replay every step, stopping at the first unexpected outcome.
    pub fn run(&mut self, scenario: &Scenario) -> Vec<StepReport> {
        // Bootstrap events are not part of any step
        self.deployment.drain_events();

        let mut reports = Vec::with_capacity(scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            let height = self.deployment.clock().current();
            let outcome = self.run_step(step);
            let events = self.deployment.drain_events();
            debug!(index, action = step.action.name(), ?outcome, "step replayed");

            let stop = outcome.is_unexpected();
            reports.push(StepReport {
                index,
                action: step.action.name(),
                height,
                outcome,
                events,
            });
            if stop {
                break;
            }
        }
        reports
    }

    fn run_step(&mut self, step: &Step) -> Outcome {
        match (self.apply(&step.action), &step.expect_error) {
            (Ok(message), None) => Outcome::Ok(message),
            (Ok(message), Some(expected)) => {
                Outcome::Unexpected(format!("expected {} but step succeeded: {}", expected, message))
            }
            (Err(e), expected) => {
                let kind = e.downcast_ref::<GovernanceError>().map(GovernanceError::kind);
                match (kind, expected) {
                    (Some(kind), Some(expected)) if kind == expected.as_str() => {
                        Outcome::ExpectedError(format!("{}: {}", kind, e))
                    }
                    _ => Outcome::Unexpected(format!("{:#}", e)),
                }
            }
        }
    }

    fn apply(&mut self, action: &StepAction) -> anyhow::Result<String> {
        match action {
            StepAction::Mine { blocks } => {
                let height = self.deployment.clock().advance(*blocks);
                Ok(format!("mined {} block(s), now at {}", blocks, height))
            }
            StepAction::Transfer { from, to, amount } => {
                let (from, to) = (self.account(from)?, self.account(to)?);
                self.deployment.token().write().transfer(from, to, *amount)?;
                Ok(format!("{} -> {}: {}", from, to, amount))
            }
            StepAction::Delegate { account, to } => {
                let (account, to) = (self.account(account)?, self.account(to)?);
                self.deployment.token().write().delegate(account, to)?;
                Ok(format!("{} delegates to {}", account, to))
            }
            StepAction::Propose {
                proposer,
                description,
                calls,
            } => {
                let proposer = self.account(proposer)?;
                let actions = calls
                    .iter()
                    .map(|call| self.token_action(call))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                let id = self
                    .deployment
                    .governor_mut()
                    .propose(proposer, actions.clone(), description.as_str())?;
                self.proposals.insert(description.clone(), (actions, id));
                Ok(format!("proposal {} created", id.short()))
            }
            StepAction::Vote {
                voter,
                proposal,
                support,
                reason,
            } => {
                let voter = self.account(voter)?;
                let id = self.proposal_id(proposal)?;
                let weight = self
                    .deployment
                    .governor_mut()
                    .cast_vote_with_reason(id, voter, *support, reason.as_str())?;
                Ok(format!("{} voted {} with weight {}", voter, support, weight))
            }
            StepAction::Execute { proposal } => {
                // Unknown descriptions hash to an id the governor rejects itself
                let actions = self
                    .proposals
                    .get(proposal)
                    .map(|(actions, _)| actions.as_slice())
                    .unwrap_or(&[]);
                let id = self
                    .deployment
                    .governor_mut()
                    .execute(actions, description_hash(proposal))?;
                Ok(format!("proposal {} executed", id.short()))
            }
            StepAction::State { proposal } => {
                let id = self.proposal_id(proposal)?;
                let state = self.deployment.governor().state(id)?;
                Ok(format!("proposal {} is {}", id.short(), state))
            }
            StepAction::ExpectState { proposal, state } => {
                let id = self.proposal_id(proposal)?;
                let actual = self.deployment.governor().state(id)?;
                if actual != *state {
                    bail!("proposal {} is {}, expected {}", id.short(), actual, state);
                }
                Ok(format!("proposal {} is {}", id.short(), actual))
            }
        }
    }

    fn token_action(&self, call: &ScriptCall) -> anyhow::Result<Action> {
        let call = match call {
            ScriptCall::Mint { to, amount } => TokenCall::Mint {
                to: self.account(to)?,
                amount: *amount,
            },
            ScriptCall::Burn { amount } => TokenCall::Burn { amount: *amount },
            ScriptCall::Transfer { to, amount } => TokenCall::Transfer {
                to: self.account(to)?,
                amount: *amount,
            },
        };
        Ok(self.deployment.token_action(call)?)
    }

    fn proposal_id(&self, description: &str) -> anyhow::Result<ProposalId> {
        match self.proposals.get(description) {
            Some((_, id)) => Ok(*id),
            // Let the governor report unknown ids itself
            None => Ok(self
                .deployment
                .governor()
                .hash_proposal(&[], &description_hash(description))?),
        }
    }

    /// Resolve a scripted account name.
    pub fn account(&self, name: &str) -> anyhow::Result<Address> {
        match name {
            "governor" => Ok(self.deployment.governor_address()),
            "token" => Ok(self.deployment.token_address()),
            _ if name.starts_with("0x") || name.starts_with("0X") => name
                .parse()
                .with_context(|| format!("Invalid address '{}'", name)),
            _ => Ok(Address::from_label(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_governance::DeploymentConfig;

    const SCRIPT: &str = r#"
        [[step]]
        action = "transfer"
        from = "deployer"
        to = "alice"
        amount = 41

        [[step]]
        action = "mine"

        [[step]]
        action = "propose"
        proposer = "alice"
        description = "Mint 1000 to alice"

        [[step.calls]]
        call = "mint"
        to = "alice"
        amount = "1_000"

        [[step]]
        action = "vote"
        voter = "alice"
        proposal = "Mint 1000 to alice"
        support = "for"
        expect_error = "VotingNotActive"

        [[step]]
        action = "mine"
        blocks = 2

        [[step]]
        action = "vote"
        voter = "alice"
        proposal = "Mint 1000 to alice"
        support = "for"

        [[step]]
        action = "mine"
        blocks = 10

        [[step]]
        action = "expect_state"
        proposal = "Mint 1000 to alice"
        state = "succeeded"

        [[step]]
        action = "execute"
        proposal = "Mint 1000 to alice"

        [[step]]
        action = "expect_state"
        proposal = "Mint 1000 to alice"
        state = "executed"
    "#;

    fn runner() -> ScenarioRunner {
        let mut config = DeploymentConfig::default();
        config.token.initial_supply = 1000;
        config.governor.voting_period = 10;
        ScenarioRunner::new(Deployment::new(&config).unwrap())
    }

    #[test]
    fn test_parse_steps() {
        let scenario = Scenario::from_toml_str(SCRIPT).unwrap();
        assert_eq!(scenario.steps.len(), 10);
        assert!(matches!(scenario.steps[1].action, StepAction::Mine { blocks: 1 }));
        assert_eq!(scenario.steps[3].expect_error.as_deref(), Some("VotingNotActive"));
        match &scenario.steps[2].action {
            StepAction::Propose { calls, .. } => {
                assert!(matches!(calls[0], ScriptCall::Mint { amount: 1000, .. }));
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_full_scenario_passes() {
        let scenario = Scenario::from_toml_str(SCRIPT).unwrap();
        let mut runner = runner();
        let reports = runner.run(&scenario);

        assert_eq!(reports.len(), 10);
        assert!(reports.iter().all(|r| !r.outcome.is_unexpected()));
        assert!(matches!(reports[3].outcome, Outcome::ExpectedError(_)));
        assert!(reports[8]
            .events
            .iter()
            .any(|e| e.name() == "ProposalExecuted"));

        let alice = Address::from_label("alice");
        assert_eq!(runner.deployment().token().read().balance_of(alice), 1041);
    }

    #[test]
    fn test_stops_at_unexpected_failure() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[step]]
            action = "execute"
            proposal = "never proposed"

            [[step]]
            action = "mine"
            "#,
        )
        .unwrap();

        let reports = runner().run(&scenario);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].outcome.is_unexpected());
    }

    #[test]
    fn test_expected_error_that_does_not_happen() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[step]]
            action = "mine"
            expect_error = "Overflow"
            "#,
        )
        .unwrap();

        let reports = runner().run(&scenario);
        assert!(reports[0].outcome.is_unexpected());
    }

    #[test]
    fn test_unknown_proposal_kind() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[step]]
            action = "state"
            proposal = "missing"
            expect_error = "UnknownProposal"
            "#,
        )
        .unwrap();

        let reports = runner().run(&scenario);
        assert!(matches!(reports[0].outcome, Outcome::ExpectedError(_)));
    }

    #[test]
    fn test_execute_unknown_proposal_kind() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[step]]
            action = "execute"
            proposal = "never proposed"
            expect_error = "UnknownProposal"
            "#,
        )
        .unwrap();

        let reports = runner().run(&scenario);
        match &reports[0].outcome {
            Outcome::ExpectedError(msg) => assert!(msg.starts_with("UnknownProposal: "), "{}", msg),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_demo_scenarios_pass() {
        let config =
            DeploymentConfig::from_toml_str(include_str!("../../../demos/deployment.toml")).unwrap();
        for script in [
            include_str!("../../../demos/mint-proposal.toml"),
            include_str!("../../../demos/defeated.toml"),
        ] {
            let scenario = Scenario::from_toml_str(script).unwrap();
            let mut runner = ScenarioRunner::new(Deployment::new(&config).unwrap());
            let reports = runner.run(&scenario);
            assert_eq!(reports.len(), scenario.steps.len());
            assert!(reports.iter().all(|r| !r.outcome.is_unexpected()), "{:?}", reports);
        }
    }

    #[test]
    fn test_account_resolution() {
        let runner = runner();
        assert_eq!(
            runner.account("governor").unwrap(),
            runner.deployment().governor_address()
        );
        assert_eq!(runner.account("alice").unwrap(), Address::from_label("alice"));
        assert_eq!(
            runner
                .account("0x0101010101010101010101010101010101010101")
                .unwrap(),
            Address::from_bytes([1; 20])
        );
        assert!(runner.account("0xzz").is_err());
    }
}
