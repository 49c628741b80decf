//! Read-only view of historical voting power.

use parking_lot::RwLock;
use plenum_types::{Address, Height};
use std::sync::Arc;

use crate::error::GovernanceError;

/// Source of point-in-time voting power, as consumed by the governor.
///
/// Past queries only accept heights strictly below the current height, so
/// the block that triggers a query can never influence its answer.
pub trait Votes {
    /// Current voting power of `account`.
    fn get_votes(&self, account: Address) -> u128;

    /// Voting power of `account` as of `height`.
    fn get_past_votes(&self, account: Address, height: Height) -> Result<u128, GovernanceError>;

    /// Aggregate supply as of `height`.
    fn get_past_total_supply(&self, height: Height) -> Result<u128, GovernanceError>;

    /// Account that currently receives `account`'s voting power.
    fn delegates(&self, account: Address) -> Address;
}

impl<T: Votes> Votes for Arc<RwLock<T>> {
    fn get_votes(&self, account: Address) -> u128 {
        self.read().get_votes(account)
    }

    fn get_past_votes(&self, account: Address, height: Height) -> Result<u128, GovernanceError> {
        self.read().get_past_votes(account, height)
    }

    fn get_past_total_supply(&self, height: Height) -> Result<u128, GovernanceError> {
        self.read().get_past_total_supply(height)
    }

    fn delegates(&self, account: Address) -> Address {
        self.read().delegates(account)
    }
}
