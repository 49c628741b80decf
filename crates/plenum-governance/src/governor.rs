//! Proposal governor.
//!
//! Owns the proposal registry and drives each proposal through its
//! lifecycle. Voting weight and quorum are read from a `Votes` source at the
//! proposal's snapshot height, never at the current height.

use plenum_types::{Address, Hash, Height};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::clock::BlockClock;
use crate::config::GovernorConfig;
use crate::error::GovernanceError;
use crate::events::{EventLog, GovernanceEvent};
use crate::executor::ActionExecutor;
use crate::proposal::{hash_proposal, Action, Proposal, ProposalId, ProposalState, VotingPhase};
use crate::tally::{quorum_of, VoteReceipt, VoteSupport};
use crate::votes::Votes;

/// Token-weighted governor.
#[derive(Debug)]
pub struct Governor<V, X> {
    address: Address,
    config: GovernorConfig,
    clock: BlockClock,
    votes: V,
    executor: X,
    proposals: HashMap<ProposalId, Proposal>,
    /// Proposal ids in creation order
    order: Vec<ProposalId>,
    events: EventLog,
}

impl<V: Votes, X: ActionExecutor> Governor<V, X> {
    /// Create a governor.
    pub fn new(address: Address, config: GovernorConfig, clock: BlockClock, votes: V, executor: X) -> Self {
        Self {
            address,
            config,
            clock,
            votes,
            executor,
            proposals: HashMap::new(),
            order: Vec::new(),
            events: EventLog::new(),
        }
    }

    /// Create a proposal snapshotted at the current height.
    pub fn propose(
        &mut self,
        proposer: Address,
        actions: Vec<Action>,
        description: impl Into<String>,
    ) -> Result<ProposalId, GovernanceError> {
        let description = description.into();
        if actions.is_empty() {
            return Err(GovernanceError::EmptyProposal);
        }

        let current = self.clock.current();
        let threshold = self.config.proposal_threshold;
        if threshold > 0 {
            let votes = match current.checked_sub(1) {
                Some(previous) => self.votes.get_past_votes(proposer, previous)?,
                None => 0,
            };
            if votes < threshold {
                warn!(proposer = %proposer, votes, threshold, "proposal rejected: below threshold");
                return Err(GovernanceError::BelowProposalThreshold { votes, threshold });
            }
        }

        let proposal = Proposal::new(
            proposer,
            actions,
            description,
            current,
            self.config.voting_delay,
            self.config.voting_period,
        )?;
        let id = proposal.id;

        if self.proposals.contains_key(&id) {
            warn!(proposal = %id.short(), "proposal rejected: duplicate");
            return Err(GovernanceError::DuplicateProposal(id));
        }

        info!(
            proposal = %id.short(),
            proposer = %proposer,
            snapshot = proposal.snapshot_height,
            vote_start = proposal.vote_start,
            vote_end = proposal.vote_end,
            "proposal created"
        );
        self.events.emit(GovernanceEvent::ProposalCreated {
            proposal_id: id,
            proposer,
            actions: proposal.actions.clone(),
            snapshot_height: proposal.snapshot_height,
            vote_start: proposal.vote_start,
            vote_end: proposal.vote_end,
            description: proposal.description.clone(),
        });

        self.proposals.insert(id, proposal);
        self.order.push(id);
        Ok(id)
    }

    /// Current state of a proposal.
    ///
    /// Computed fresh on every call from height, tally and the executed
    /// flag; calling it never changes anything.
    pub fn state(&self, id: ProposalId) -> Result<ProposalState, GovernanceError> {
        let proposal = self.get(id)?;

        if proposal.executed {
            return Ok(ProposalState::Executed);
        }

        match proposal.phase(self.clock.current()) {
            VotingPhase::NotStarted => Ok(ProposalState::Pending),
            VotingPhase::Open => Ok(ProposalState::Active),
            VotingPhase::Closed => {
                let quorum = self.quorum(proposal.snapshot_height)?;
                Ok(proposal.tally.outcome(quorum))
            }
        }
    }

    /// Cast a vote with an empty reason.
    pub fn cast_vote(
        &mut self,
        id: ProposalId,
        voter: Address,
        support: VoteSupport,
    ) -> Result<u128, GovernanceError> {
        self.cast_vote_with_reason(id, voter, support, "")
    }

    /// Cast a vote weighted by the voter's power at the snapshot height.
    ///
    /// Returns the weight counted. A zero weight is accepted and still uses
    /// up the voter's single vote.
    pub fn cast_vote_with_reason(
        &mut self,
        id: ProposalId,
        voter: Address,
        support: VoteSupport,
        reason: impl Into<String>,
    ) -> Result<u128, GovernanceError> {
        let state = self.state(id)?;
        if !state.can_vote() {
            warn!(proposal = %id.short(), voter = %voter, %state, "vote rejected: voting not active");
            return Err(GovernanceError::VotingNotActive(state));
        }

        let snapshot = self.get(id)?.snapshot_height;
        let weight = self.votes.get_past_votes(voter, snapshot)?;
        let reason = reason.into();

        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::UnknownProposal(id))?;
        proposal.record_vote(VoteReceipt {
            proposal_id: id,
            voter,
            support,
            weight,
            reason: reason.clone(),
        })?;

        info!(proposal = %id.short(), voter = %voter, %support, weight, "vote cast");
        self.events.emit(GovernanceEvent::VoteCast {
            voter,
            proposal_id: id,
            support,
            weight,
            reason,
        });
        Ok(weight)
    }

    /// Execute a succeeded proposal.
    ///
    /// The id is re-derived from the supplied actions and description hash,
    /// so a mismatched action list can never run under another proposal's
    /// approval. A failed execution leaves the proposal `Succeeded`.
    pub fn execute(&mut self, actions: &[Action], description_hash: Hash) -> Result<ProposalId, GovernanceError> {
        let id = hash_proposal(actions, &description_hash)?;

        let state = self.state(id)?;
        if !state.is_executable() {
            warn!(proposal = %id.short(), %state, "execution rejected");
            return Err(GovernanceError::NotSuccessful(state));
        }

        if let Err(e) = self.executor.execute(actions) {
            warn!(proposal = %id.short(), error = %e, "execution failed; proposal stays succeeded");
            return Err(e.into());
        }

        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::UnknownProposal(id))?;
        proposal.executed = true;

        info!(proposal = %id.short(), actions = actions.len(), "proposal executed");
        self.events.emit(GovernanceEvent::ProposalExecuted { proposal_id: id });
        Ok(id)
    }

    /// Quorum at `height`: the configured share of past total supply.
    pub fn quorum(&self, height: Height) -> Result<u128, GovernanceError> {
        let supply = self.votes.get_past_total_supply(height)?;
        Ok(quorum_of(supply, self.config.quorum_numerator))
    }

    /// Voting power of `account` at a past height.
    pub fn get_votes(&self, account: Address, height: Height) -> Result<u128, GovernanceError> {
        self.votes.get_past_votes(account, height)
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn proposal_snapshot(&self, id: ProposalId) -> Result<Height, GovernanceError> {
        Ok(self.get(id)?.snapshot_height)
    }

    pub fn proposal_deadline(&self, id: ProposalId) -> Result<Height, GovernanceError> {
        Ok(self.get(id)?.vote_end)
    }

    /// `(against, for, abstain)` totals.
    pub fn proposal_votes(&self, id: ProposalId) -> Result<(u128, u128, u128), GovernanceError> {
        let tally = self.get(id)?.tally;
        Ok((tally.against_votes, tally.for_votes, tally.abstain_votes))
    }

    pub fn has_voted(&self, id: ProposalId, account: Address) -> Result<bool, GovernanceError> {
        Ok(self.get(id)?.has_voted(&account))
    }

    pub fn receipt(&self, id: ProposalId, account: Address) -> Result<Option<&VoteReceipt>, GovernanceError> {
        Ok(self.get(id)?.receipt(&account))
    }

    /// Proposals in creation order.
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.order.iter().filter_map(|id| self.proposals.get(id))
    }

    pub fn proposal_count(&self) -> usize {
        self.order.len()
    }

    pub fn hash_proposal(
        &self,
        actions: &[Action],
        description_hash: &Hash,
    ) -> Result<ProposalId, GovernanceError> {
        hash_proposal(actions, description_hash)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn voting_delay(&self) -> u64 {
        self.config.voting_delay
    }

    pub fn voting_period(&self) -> u64 {
        self.config.voting_period
    }

    pub fn proposal_threshold(&self) -> u128 {
        self.config.proposal_threshold
    }

    pub fn clock(&self) -> &BlockClock {
        &self.clock
    }

    pub fn votes(&self) -> &V {
        &self.votes
    }

    /// Take buffered governor events.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        self.events.drain()
    }

    fn get(&self, id: ProposalId) -> Result<&Proposal, GovernanceError> {
        self.proposals.get(&id).ok_or(GovernanceError::UnknownProposal(id))
    }
}
