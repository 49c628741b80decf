//! Execution of passed proposals' action lists.
//!
//! The governor hands the full action list to an `ActionExecutor`, which must
//! apply all of it or none of it.

use borsh::{BorshDeserialize, BorshSerialize};
use parking_lot::RwLock;
use plenum_types::Address;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::proposal::Action;
use crate::token::VotesToken;

/// Errors an executor reports for a rejected batch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Unknown call target: {0}")]
    UnknownTarget(Address),

    #[error("Action {index} sends value {value} to a non-payable target")]
    NonZeroValue { index: usize, value: u128 },

    #[error("Action {index} has malformed calldata: {reason}")]
    MalformedCalldata { index: usize, reason: String },

    #[error("Action {index} reverted: {reason}")]
    Reverted { index: usize, reason: String },
}

/// Applies a proposal's actions.
pub trait ActionExecutor {
    /// Apply every action, or none of them if any fails.
    fn execute(&mut self, actions: &[Action]) -> Result<(), ExecutionError>;
}

/// Calls the governance token understands, borsh-encoded as calldata.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum TokenCall {
    /// Mint new tokens
    Mint { to: Address, amount: u128 },
    /// Burn tokens held by the governor
    Burn { amount: u128 },
    /// Send tokens held by the governor
    Transfer { to: Address, amount: u128 },
}

impl TokenCall {
    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        borsh::to_vec(self)
    }

    pub fn decode(calldata: &[u8]) -> std::io::Result<Self> {
        borsh::from_slice(calldata)
    }

    /// Wrap this call as an action targeting `token`.
    pub fn into_action(self, token: Address) -> std::io::Result<Action> {
        Ok(Action::new(token, 0, self.encode()?))
    }
}

/// Executes token calls on behalf of the governor.
///
/// The batch runs against a staged copy of the token while the write lock is
/// held; the copy replaces the live token only when every call succeeded.
#[derive(Debug, Clone)]
pub struct TokenExecutor {
    token: Arc<RwLock<VotesToken>>,
    token_address: Address,
    caller: Address,
}

impl TokenExecutor {
    pub fn new(token: Arc<RwLock<VotesToken>>, token_address: Address, caller: Address) -> Self {
        Self {
            token,
            token_address,
            caller,
        }
    }

    fn decode_all(&self, actions: &[Action]) -> Result<Vec<TokenCall>, ExecutionError> {
        actions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                if action.target != self.token_address {
                    return Err(ExecutionError::UnknownTarget(action.target));
                }
                if action.value != 0 {
                    return Err(ExecutionError::NonZeroValue {
                        index,
                        value: action.value,
                    });
                }
                TokenCall::decode(&action.calldata).map_err(|e| ExecutionError::MalformedCalldata {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    fn apply(&self, token: &mut VotesToken, index: usize, call: &TokenCall) -> Result<(), ExecutionError> {
        let result = match call {
            TokenCall::Mint { to, amount } => token.mint(self.caller, *to, *amount),
            TokenCall::Burn { amount } => token.burn(self.caller, *amount),
            TokenCall::Transfer { to, amount } => token.transfer(self.caller, *to, *amount),
        };
        result.map_err(|e| ExecutionError::Reverted {
            index,
            reason: e.to_string(),
        })
    }
}

impl ActionExecutor for TokenExecutor {
    fn execute(&mut self, actions: &[Action]) -> Result<(), ExecutionError> {
        let calls = self.decode_all(actions)?;

        let mut live = self.token.write();
        let mut staged = live.clone();
        for (index, call) in calls.iter().enumerate() {
            if let Err(e) = self.apply(&mut staged, index, call) {
                warn!(index, error = %e, "action batch rolled back");
                return Err(e);
            }
            debug!(index, ?call, "token call applied");
        }

        *live = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::BlockClock;
    use crate::votes::Votes;

    fn setup() -> (Arc<RwLock<VotesToken>>, TokenExecutor, Address) {
        let governor = Address::from_label("governor");
        let token_address = Address::from_label("token");
        let token = Arc::new(RwLock::new(VotesToken::new(
            "PlenumToken",
            "PLM",
            governor,
            BlockClock::starting_at(1),
        )));
        let executor = TokenExecutor::new(token.clone(), token_address, governor);
        (token, executor, token_address)
    }

    #[test]
    fn test_calldata_roundtrip() {
        let call = TokenCall::Mint {
            to: Address::from_label("alice"),
            amount: 1000,
        };
        let bytes = call.encode().unwrap();
        assert_eq!(TokenCall::decode(&bytes).unwrap(), call);
    }

    #[test]
    fn test_mint_batch_applies() {
        let (token, mut executor, token_address) = setup();
        let alice = Address::from_label("alice");
        let actions = vec![
            TokenCall::Mint { to: alice, amount: 600 }.into_action(token_address).unwrap(),
            TokenCall::Mint { to: alice, amount: 400 }.into_action(token_address).unwrap(),
        ];

        executor.execute(&actions).unwrap();
        assert_eq!(token.read().balance_of(alice), 1000);
        assert_eq!(token.get_votes(alice), 1000);
    }

    #[test]
    fn test_failing_call_rolls_back_batch() {
        let (token, mut executor, token_address) = setup();
        let alice = Address::from_label("alice");
        let actions = vec![
            TokenCall::Mint { to: alice, amount: 600 }.into_action(token_address).unwrap(),
            // Governor holds nothing to burn
            TokenCall::Burn { amount: 1 }.into_action(token_address).unwrap(),
        ];

        let err = executor.execute(&actions).unwrap_err();
        assert!(matches!(err, ExecutionError::Reverted { index: 1, .. }));
        assert_eq!(token.read().balance_of(alice), 0);
        assert_eq!(token.read().total_supply(), 0);
        assert!(token.write().drain_events().is_empty());
    }

    #[test]
    fn test_rejects_before_touching_token() {
        let (token, mut executor, token_address) = setup();
        let stranger = Address::from_label("stranger");

        let wrong_target = vec![Action::new(stranger, 0, vec![])];
        assert_eq!(
            executor.execute(&wrong_target),
            Err(ExecutionError::UnknownTarget(stranger))
        );

        let with_value = vec![Action::new(token_address, 5, vec![])];
        assert!(matches!(
            executor.execute(&with_value),
            Err(ExecutionError::NonZeroValue { index: 0, value: 5 })
        ));

        let garbage = vec![Action::new(token_address, 0, vec![0xff, 0x01])];
        assert!(matches!(
            executor.execute(&garbage),
            Err(ExecutionError::MalformedCalldata { index: 0, .. })
        ));

        assert_eq!(token.read().total_supply(), 0);
    }
}
