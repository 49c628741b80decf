//! Plenum Governance - Token-weighted on-chain governance.
//!
//! This crate provides:
//! - A checkpointed voting-power ledger with delegation
//! - A vote-tracking governance token
//! - Proposal lifecycle management and vote tallying
//! - Quorum evaluation against historical supply
//! - Atomic execution of passed proposals

pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod deployment;
pub mod error;
pub mod events;
pub mod executor;
pub mod governor;
pub mod ledger;
pub mod proposal;
pub mod tally;
pub mod token;
pub mod votes;

pub use clock::BlockClock;
pub use config::{ConfigError, DeploymentConfig, GovernorConfig, TokenConfig};
pub use deployment::{Deployment, SharedToken, TokenGovernor};
pub use error::GovernanceError;
pub use events::GovernanceEvent;
pub use executor::{ActionExecutor, ExecutionError, TokenCall, TokenExecutor};
pub use governor::Governor;
pub use ledger::VotingPowerLedger;
pub use proposal::{description_hash, hash_proposal, Action, Proposal, ProposalId, ProposalState};
pub use tally::{quorum_of, VoteReceipt, VoteSupport, VoteTally};
pub use token::VotesToken;
pub use votes::Votes;
