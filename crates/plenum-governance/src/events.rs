//! Observable governance events for external indexers.

use plenum_types::{Address, Hash, Height};
use serde::Serialize;

use crate::proposal::Action;
use crate::tally::VoteSupport;

/// Event emitted by the token, the ledger or the governor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    /// Token balance moved. Mints come from and burns go to the null account.
    Transfer {
        from: Address,
        to: Address,
        value: u128,
    },
    DelegateChanged {
        delegator: Address,
        from_delegate: Address,
        to_delegate: Address,
    },
    DelegateVotesChanged {
        delegate: Address,
        previous_votes: u128,
        new_votes: u128,
    },
    ProposalCreated {
        proposal_id: Hash,
        proposer: Address,
        actions: Vec<Action>,
        snapshot_height: Height,
        vote_start: Height,
        vote_end: Height,
        description: String,
    },
    VoteCast {
        voter: Address,
        proposal_id: Hash,
        support: VoteSupport,
        weight: u128,
        reason: String,
    },
    ProposalExecuted {
        proposal_id: Hash,
    },
}

impl GovernanceEvent {
    /// Event name as indexers see it.
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceEvent::Transfer { .. } => "Transfer",
            GovernanceEvent::DelegateChanged { .. } => "DelegateChanged",
            GovernanceEvent::DelegateVotesChanged { .. } => "DelegateVotesChanged",
            GovernanceEvent::ProposalCreated { .. } => "ProposalCreated",
            GovernanceEvent::VoteCast { .. } => "VoteCast",
            GovernanceEvent::ProposalExecuted { .. } => "ProposalExecuted",
        }
    }
}

/// Append-only buffer of emitted events, drained by the embedder.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<GovernanceEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: GovernanceEvent) {
        self.events.push(event);
    }

    /// Take every buffered event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
