//! Proposal records and lifecycle.
//!
//! Proposals go through states: Pending -> Active -> Succeeded/Defeated,
//! and Succeeded -> Executed. The state is never stored; it is derived from
//! the current height, the tally and the executed flag.

use borsh::BorshSerialize;
use plenum_types::{Address, Hash, Height};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::GovernanceError;
use crate::tally::{VoteReceipt, VoteTally};

/// Proposal identifier: blake3 over the borsh-encoded actions and description hash.
pub type ProposalId = Hash;

/// Proposal status in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    /// Created, voting not yet open
    Pending,
    /// Voting is open
    Active,
    /// Voting closed without reaching quorum or majority
    Defeated,
    /// Voting closed with quorum and majority
    Succeeded,
    /// Actions applied
    Executed,
}

impl ProposalState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Defeated | ProposalState::Executed)
    }

    pub fn can_vote(&self) -> bool {
        matches!(self, ProposalState::Active)
    }

    pub fn is_executable(&self) -> bool {
        matches!(self, ProposalState::Succeeded)
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One call a proposal performs when executed.
///
/// Field order is the borsh layout hashed into proposal ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize)]
pub struct Action {
    /// Contract to call
    pub target: Address,
    /// Native value sent along
    #[serde(default)]
    pub value: u128,
    /// Opaque call payload
    #[serde(with = "calldata_hex", default)]
    pub calldata: Vec<u8>,
}

impl Action {
    pub fn new(target: Address, value: u128, calldata: Vec<u8>) -> Self {
        Self { target, value, calldata }
    }
}

mod calldata_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// Hash of a proposal description.
pub fn description_hash(description: &str) -> Hash {
    Hash::compute(description.as_bytes())
}

/// Deterministic proposal id.
///
/// Identical action lists with identical descriptions always map to the same
/// id, which is what makes re-proposing detectable.
pub fn hash_proposal(
    actions: &[Action],
    description_hash: &Hash,
) -> Result<ProposalId, GovernanceError> {
    let encoded =
        borsh::to_vec(&actions).map_err(|e| GovernanceError::Serialization(e.to_string()))?;
    Ok(Hash::compute_multi(&[&encoded, description_hash.as_bytes()]))
}

/// Voting phase from height alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotingPhase {
    NotStarted,
    Open,
    Closed,
}

/// Governance proposal.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Address,
    pub actions: Vec<Action>,
    pub description: String,
    pub description_hash: Hash,
    /// Height whose finalized power and supply the vote is weighed against
    pub snapshot_height: Height,
    /// Voting opens strictly after this height
    pub vote_start: Height,
    /// Last height at which votes are accepted
    pub vote_end: Height,
    pub tally: VoteTally,
    pub executed: bool,
    receipts: HashMap<Address, VoteReceipt>,
}

impl Proposal {
    /// Create a new proposal snapshotted at `snapshot_height`.
    pub fn new(
        proposer: Address,
        actions: Vec<Action>,
        description: String,
        snapshot_height: Height,
        voting_delay: u64,
        voting_period: u64,
    ) -> Result<Self, GovernanceError> {
        let description_hash = description_hash(&description);
        let id = hash_proposal(&actions, &description_hash)?;
        let vote_start = snapshot_height
            .checked_add(voting_delay)
            .ok_or(GovernanceError::Overflow("vote start height"))?;
        let vote_end = vote_start
            .checked_add(voting_period)
            .ok_or(GovernanceError::Overflow("vote end height"))?;

        Ok(Self {
            id,
            proposer,
            actions,
            description,
            description_hash,
            snapshot_height,
            vote_start,
            vote_end,
            tally: VoteTally::default(),
            executed: false,
            receipts: HashMap::new(),
        })
    }

    /// Phase of the voting window at `current`.
    pub fn phase(&self, current: Height) -> VotingPhase {
        if current <= self.vote_start {
            VotingPhase::NotStarted
        } else if current <= self.vote_end {
            VotingPhase::Open
        } else {
            VotingPhase::Closed
        }
    }

    /// Record a vote, rejecting a second vote from the same voter.
    ///
    /// The tally is only touched if the receipt is accepted.
    pub fn record_vote(&mut self, receipt: VoteReceipt) -> Result<(), GovernanceError> {
        if self.receipts.contains_key(&receipt.voter) {
            return Err(GovernanceError::AlreadyVoted(receipt.voter));
        }

        self.tally = self.tally.with_vote(receipt.support, receipt.weight)?;
        self.receipts.insert(receipt.voter, receipt);
        Ok(())
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.receipts.contains_key(voter)
    }

    pub fn receipt(&self, voter: &Address) -> Option<&VoteReceipt> {
        self.receipts.get(voter)
    }

    pub fn voter_count(&self) -> usize {
        self.receipts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::VoteSupport;

    fn action(n: u8) -> Action {
        Action::new(Address::from_bytes([n; 20]), 0, vec![n, n])
    }

    fn proposal() -> Proposal {
        Proposal::new(
            Address::from_bytes([9; 20]),
            vec![action(1)],
            "Proposal to mint 1000wei".to_string(),
            10,
            1,
            50_400,
        )
        .unwrap()
    }

    #[test]
    fn test_window_heights() {
        let p = proposal();
        assert_eq!(p.snapshot_height, 10);
        assert_eq!(p.vote_start, 11);
        assert_eq!(p.vote_end, 50_411);
    }

    #[test]
    fn test_phase_boundaries() {
        let p = proposal();
        assert_eq!(p.phase(10), VotingPhase::NotStarted);
        assert_eq!(p.phase(11), VotingPhase::NotStarted);
        assert_eq!(p.phase(12), VotingPhase::Open);
        assert_eq!(p.phase(50_411), VotingPhase::Open);
        assert_eq!(p.phase(50_412), VotingPhase::Closed);
    }

    #[test]
    fn test_id_is_deterministic() {
        let desc = description_hash("same");
        let a = hash_proposal(&[action(1), action(2)], &desc).unwrap();
        let b = hash_proposal(&[action(1), action(2)], &desc).unwrap();
        assert_eq!(a, b);

        // Order, content and description all matter
        assert_ne!(a, hash_proposal(&[action(2), action(1)], &desc).unwrap());
        assert_ne!(a, hash_proposal(&[action(1)], &desc).unwrap());
        assert_ne!(
            a,
            hash_proposal(&[action(1), action(2)], &description_hash("other")).unwrap()
        );
    }

    #[test]
    fn test_id_matches_proposal() {
        let p = proposal();
        assert_eq!(p.id, hash_proposal(&p.actions, &p.description_hash).unwrap());
        assert_eq!(p.description_hash, description_hash("Proposal to mint 1000wei"));
    }

    #[test]
    fn test_id_is_blake3_of_borsh_actions_and_description() {
        let desc = description_hash("d");
        let actions = vec![Action::new(Address::from_bytes([1; 20]), 0, vec![9, 9])];
        let id = hash_proposal(&actions, &desc).unwrap();

        // Vec<(target, value, calldata)> shares the struct's borsh layout
        let tuples = vec![(Address::from_bytes([1; 20]), 0u128, vec![9u8, 9])];
        let mut preimage = borsh::to_vec(&tuples).unwrap();
        preimage.extend_from_slice(desc.as_bytes());
        assert_eq!(id, Hash::compute(&preimage));

        // u32 count, 20-byte target, u128 value, u32 calldata length, calldata
        let encoded = borsh::to_vec(&actions).unwrap();
        assert_eq!(encoded.len(), 4 + 20 + 16 + 4 + 2);
        assert_eq!(&encoded[..4], &1u32.to_le_bytes());
        assert_eq!(&encoded[40..44], &2u32.to_le_bytes());
    }

    #[test]
    fn test_calldata_boundaries_are_unambiguous() {
        let desc = description_hash("d");
        let split_a = vec![
            Action::new(Address::ZERO, 0, vec![1, 2]),
            Action::new(Address::ZERO, 0, vec![3]),
        ];
        let split_b = vec![
            Action::new(Address::ZERO, 0, vec![1]),
            Action::new(Address::ZERO, 0, vec![2, 3]),
        ];
        assert_ne!(
            hash_proposal(&split_a, &desc).unwrap(),
            hash_proposal(&split_b, &desc).unwrap()
        );
    }

    #[test]
    fn test_record_vote_once() {
        let mut p = proposal();
        let voter = Address::from_bytes([5; 20]);
        let receipt = VoteReceipt {
            proposal_id: p.id,
            voter,
            support: VoteSupport::For,
            weight: 41,
            reason: String::new(),
        };

        p.record_vote(receipt.clone()).unwrap();
        assert!(p.has_voted(&voter));
        assert_eq!(p.tally.for_votes, 41);
        assert_eq!(p.voter_count(), 1);

        let err = p.record_vote(VoteReceipt { support: VoteSupport::Against, ..receipt }).unwrap_err();
        assert_eq!(err, GovernanceError::AlreadyVoted(voter));
        assert_eq!(p.tally.against_votes, 0);
        assert_eq!(p.voter_count(), 1);
        assert_eq!(p.receipt(&voter).map(|r| r.support), Some(VoteSupport::For));
    }

    #[test]
    fn test_window_overflow() {
        let result = Proposal::new(Address::ZERO, vec![action(1)], String::new(), u64::MAX, 1, 1);
        assert!(matches!(result, Err(GovernanceError::Overflow(_))));
    }

    #[test]
    fn test_state_flags() {
        assert!(ProposalState::Defeated.is_terminal());
        assert!(ProposalState::Executed.is_terminal());
        assert!(!ProposalState::Succeeded.is_terminal());
        assert!(ProposalState::Active.can_vote());
        assert!(ProposalState::Succeeded.is_executable());
        assert_eq!(ProposalState::Succeeded.to_string(), "Succeeded");
    }

    #[test]
    fn test_action_json_uses_hex_calldata() {
        let json = serde_json::to_value(action(0xab)).unwrap();
        assert_eq!(json["calldata"], "0xabab");

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action(0xab));
    }
}
