use plenum_types::{Address, Hash, Height};
use thiserror::Error;

use crate::executor::ExecutionError;
use crate::proposal::ProposalState;

/// Errors that can occur in governance operations.
///
/// Every failing operation leaves state exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("Proposal already exists: {0}")]
    DuplicateProposal(Hash),

    #[error("Unknown proposal id: {0}")]
    UnknownProposal(Hash),

    #[error("Vote not currently active (proposal is {0})")]
    VotingNotActive(ProposalState),

    #[error("Already voted: {0}")]
    AlreadyVoted(Address),

    #[error("Proposal not successful (proposal is {0})")]
    NotSuccessful(ProposalState),

    #[error("Invalid query: height {height} is not yet finalized (current {current})")]
    InvalidQuery { height: Height, current: Height },

    #[error("Arithmetic overflow: {0}")]
    Overflow(&'static str),

    #[error("Action execution failed: {0}")]
    ActionExecutionFailed(#[from] ExecutionError),

    #[error("Empty proposal")]
    EmptyProposal,

    #[error("Proposer votes below proposal threshold: {votes} < {threshold}")]
    BelowProposalThreshold { votes: u128, threshold: u128 },

    #[error("Invalid vote type: {0}")]
    InvalidVoteType(u8),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient balance: {account} has {balance}, needs {required}")]
    InsufficientBalance {
        account: Address,
        balance: u128,
        required: u128,
    },

    #[error("Checkpoint out of order: last at {last}, attempted {attempted}")]
    CheckpointOutOfOrder { last: Height, attempted: Height },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GovernanceError {
    /// Stable name of the error kind, independent of the payload.
    pub fn kind(&self) -> &'static str {
        match self {
            GovernanceError::DuplicateProposal(_) => "DuplicateProposal",
            GovernanceError::UnknownProposal(_) => "UnknownProposal",
            GovernanceError::VotingNotActive(_) => "VotingNotActive",
            GovernanceError::AlreadyVoted(_) => "AlreadyVoted",
            GovernanceError::NotSuccessful(_) => "NotSuccessful",
            GovernanceError::InvalidQuery { .. } => "InvalidQuery",
            GovernanceError::Overflow(_) => "Overflow",
            GovernanceError::ActionExecutionFailed(_) => "ActionExecutionFailed",
            GovernanceError::EmptyProposal => "EmptyProposal",
            GovernanceError::BelowProposalThreshold { .. } => "BelowProposalThreshold",
            GovernanceError::InvalidVoteType(_) => "InvalidVoteType",
            GovernanceError::Unauthorized(_) => "Unauthorized",
            GovernanceError::InsufficientBalance { .. } => "InsufficientBalance",
            GovernanceError::CheckpointOutOfOrder { .. } => "CheckpointOutOfOrder",
            GovernanceError::InvalidParameter(_) => "InvalidParameter",
            GovernanceError::Serialization(_) => "Serialization",
        }
    }

    /// Whether retrying the same call later can succeed.
    ///
    /// Only a failed execution and a premature ledger query are worth
    /// retrying; everything else is a permanent rejection.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GovernanceError::ActionExecutionFailed(_) | GovernanceError::InvalidQuery { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GovernanceError::VotingNotActive(ProposalState::Pending);
        assert_eq!(err.to_string(), "Vote not currently active (proposal is Pending)");
    }

    #[test]
    fn test_invalid_query_display() {
        let err = GovernanceError::InvalidQuery { height: 10, current: 10 };
        assert!(err.to_string().contains("height 10"));
        assert!(err.to_string().contains("current 10"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(GovernanceError::EmptyProposal.kind(), "EmptyProposal");
        assert_eq!(
            GovernanceError::AlreadyVoted(Address::ZERO).kind(),
            "AlreadyVoted"
        );
    }

    #[test]
    fn test_retryable() {
        let failed = GovernanceError::ActionExecutionFailed(ExecutionError::UnknownTarget(
            Address::ZERO,
        ));
        assert!(failed.is_retryable());
        assert!(!GovernanceError::AlreadyVoted(Address::ZERO).is_retryable());
    }
}
