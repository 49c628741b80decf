//! Vote tallies and the quorum evaluator.
//!
//! Quorum = floor(total_supply_at_snapshot * numerator / 100).
//! A proposal succeeds iff for + abstain >= quorum and for > against.

use plenum_types::{Address, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GovernanceError;
use crate::proposal::ProposalState;

/// Denominator of the quorum fraction (percentage points).
pub const QUORUM_DENOMINATOR: u128 = 100;

/// Vote support options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteSupport {
    /// Vote against
    Against,
    /// Vote in favor
    For,
    /// Abstain (counts toward quorum but not the for/against comparison)
    Abstain,
}

impl VoteSupport {
    /// Wire encoding: 0 = against, 1 = for, 2 = abstain.
    pub fn as_u8(&self) -> u8 {
        match self {
            VoteSupport::Against => 0,
            VoteSupport::For => 1,
            VoteSupport::Abstain => 2,
        }
    }
}

impl TryFrom<u8> for VoteSupport {
    type Error = GovernanceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VoteSupport::Against),
            1 => Ok(VoteSupport::For),
            2 => Ok(VoteSupport::Abstain),
            other => Err(GovernanceError::InvalidVoteType(other)),
        }
    }
}

impl FromStr for VoteSupport {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "against" => Ok(VoteSupport::Against),
            "for" => Ok(VoteSupport::For),
            "abstain" => Ok(VoteSupport::Abstain),
            other => other
                .parse::<u8>()
                .map_err(|_| GovernanceError::InvalidParameter(format!("unknown vote support '{}'", s)))
                .and_then(VoteSupport::try_from),
        }
    }
}

impl fmt::Display for VoteSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoteSupport::Against => "against",
            VoteSupport::For => "for",
            VoteSupport::Abstain => "abstain",
        };
        f.write_str(name)
    }
}

/// Weighted vote totals of one proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub for_votes: u128,
    pub against_votes: u128,
    pub abstain_votes: u128,
}

impl VoteTally {
    /// Tally with `weight` added to the `support` bucket.
    pub fn with_vote(&self, support: VoteSupport, weight: u128) -> Result<Self, GovernanceError> {
        let mut next = *self;
        let bucket = match support {
            VoteSupport::For => &mut next.for_votes,
            VoteSupport::Against => &mut next.against_votes,
            VoteSupport::Abstain => &mut next.abstain_votes,
        };
        *bucket = bucket
            .checked_add(weight)
            .ok_or(GovernanceError::Overflow("vote tally"))?;
        Ok(next)
    }

    /// Participation counted toward quorum.
    pub fn quorum_votes(&self) -> u128 {
        self.for_votes.saturating_add(self.abstain_votes)
    }

    pub fn quorum_reached(&self, quorum: u128) -> bool {
        self.quorum_votes() >= quorum
    }

    pub fn vote_succeeded(&self) -> bool {
        self.for_votes > self.against_votes
    }

    /// Terminal classification once voting has closed.
    pub fn outcome(&self, quorum: u128) -> ProposalState {
        if self.quorum_reached(quorum) && self.vote_succeeded() {
            ProposalState::Succeeded
        } else {
            ProposalState::Defeated
        }
    }
}

/// Quorum for a given supply, floored.
///
/// Splits the supply so that `supply * numerator` never has to be formed.
pub fn quorum_of(total_supply: u128, numerator: u128) -> u128 {
    let whole = total_supply / QUORUM_DENOMINATOR;
    let rest = total_supply % QUORUM_DENOMINATOR;
    whole
        .saturating_mul(numerator)
        .saturating_add(rest * numerator / QUORUM_DENOMINATOR)
}

/// Record of one cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteReceipt {
    pub proposal_id: Hash,
    pub voter: Address,
    pub support: VoteSupport,
    pub weight: u128,
    pub reason: String,
}
