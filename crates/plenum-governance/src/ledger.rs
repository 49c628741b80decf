//! Voting-power ledger.
//!
//! Tracks, per account, a checkpoint history of delegated voting power plus
//! one aggregate history for total supply. Holders contribute their voting
//! units (their token balance) to exactly one delegatee at a time, themselves
//! by default.
//!
//! Every mutating call is validated in full before anything is written, so
//! an error never leaves a half-applied move behind.

use plenum_types::{Address, Height};
use std::collections::HashMap;
use tracing::debug;

use crate::checkpoint::{Checkpoint, Checkpoints};
use crate::clock::BlockClock;
use crate::error::GovernanceError;
use crate::events::{EventLog, GovernanceEvent};
use crate::votes::Votes;

/// A planned change to one account's voting power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PowerChange {
    account: Address,
    previous: u128,
    new: u128,
}

/// Historical voting-power ledger.
#[derive(Debug, Clone)]
pub struct VotingPowerLedger {
    clock: BlockClock,
    /// holder -> delegatee (absent means self)
    delegation: HashMap<Address, Address>,
    /// holder -> voting units
    units: HashMap<Address, u128>,
    /// delegatee -> power history
    checkpoints: HashMap<Address, Checkpoints>,
    total_supply: Checkpoints,
    events: EventLog,
}

impl VotingPowerLedger {
    /// Create an empty ledger reading heights from `clock`.
    pub fn new(clock: BlockClock) -> Self {
        Self {
            clock,
            delegation: HashMap::new(),
            units: HashMap::new(),
            checkpoints: HashMap::new(),
            total_supply: Checkpoints::new(),
            events: EventLog::new(),
        }
    }

    pub fn clock(&self) -> &BlockClock {
        &self.clock
    }

    /// Move `amount` of voting power from `from` to `to`.
    ///
    /// No-op when `from == to` or `amount == 0`. The null account side of a
    /// move is skipped. Fails with `Overflow` if `from` would go negative or
    /// `to` would exceed `u128::MAX`.
    pub fn move_voting_power(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        let changes = self.plan_move(from, to, amount)?;
        self.apply(changes)
    }

    /// Redirect `account`'s voting units from its current delegatee to
    /// `delegatee`.
    pub fn delegate(&mut self, account: Address, delegatee: Address) -> Result<(), GovernanceError> {
        if account.is_zero() {
            return Err(GovernanceError::InvalidParameter(
                "null account cannot delegate".to_string(),
            ));
        }

        let previous = self.delegates(account);
        let units = self.voting_units(account);
        let changes = self.plan_move(previous, delegatee, units)?;

        if delegatee == account {
            self.delegation.remove(&account);
        } else {
            self.delegation.insert(account, delegatee);
        }

        debug!(
            delegator = %account,
            from = %previous,
            to = %delegatee,
            units,
            "delegation changed"
        );
        self.events.emit(GovernanceEvent::DelegateChanged {
            delegator: account,
            from_delegate: previous,
            to_delegate: delegatee,
        });
        self.apply(changes)
    }

    /// Hook for every balance change of the governance token.
    ///
    /// Mints (`from` is null) raise total supply, burns (`to` is null) lower
    /// it. The holders' voting units follow the balance and the matching
    /// power moves between their delegatees.
    pub fn transfer_voting_units(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        if amount == 0 || from == to {
            return Ok(());
        }

        let now = self.clock.current();

        let supply = if from.is_zero() {
            Some(
                self.total_supply
                    .latest()
                    .checked_add(amount)
                    .ok_or(GovernanceError::Overflow("total supply"))?,
            )
        } else if to.is_zero() {
            Some(
                self.total_supply
                    .latest()
                    .checked_sub(amount)
                    .ok_or(GovernanceError::Overflow("total supply"))?,
            )
        } else {
            None
        };
        if supply.is_some() {
            self.total_supply.check_writable(now)?;
        }

        let from_units = if from.is_zero() {
            None
        } else {
            Some(
                self.voting_units(from)
                    .checked_sub(amount)
                    .ok_or(GovernanceError::Overflow("voting units"))?,
            )
        };
        let to_units = if to.is_zero() {
            None
        } else {
            Some(
                self.voting_units(to)
                    .checked_add(amount)
                    .ok_or(GovernanceError::Overflow("voting units"))?,
            )
        };

        let changes = self.plan_move(self.delegates(from), self.delegates(to), amount)?;

        // Validated; commit.
        if let Some(supply) = supply {
            self.total_supply.push(now, supply)?;
            debug!(height = now, supply, "total supply checkpoint");
        }
        if let Some(units) = from_units {
            self.set_units(from, units);
        }
        if let Some(units) = to_units {
            self.set_units(to, units);
        }
        self.apply(changes)
    }

    /// Current voting units of `account`.
    pub fn voting_units(&self, account: Address) -> u128 {
        self.units.get(&account).copied().unwrap_or(0)
    }

    /// Current aggregate supply.
    pub fn total_supply(&self) -> u128 {
        self.total_supply.latest()
    }

    pub fn num_checkpoints(&self, account: Address) -> usize {
        self.checkpoints.get(&account).map(Checkpoints::len).unwrap_or(0)
    }

    pub fn checkpoint(&self, account: Address, index: usize) -> Option<Checkpoint> {
        self.checkpoints.get(&account).and_then(|cps| cps.get(index))
    }

    /// Sum of current voting power over every account with history.
    pub fn total_power(&self) -> Result<u128, GovernanceError> {
        self.checkpoints.values().try_fold(0u128, |acc, cps| {
            acc.checked_add(cps.latest())
                .ok_or(GovernanceError::Overflow("total power"))
        })
    }

    /// Take buffered delegation events.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        self.events.drain()
    }

    fn ensure_past(&self, height: Height) -> Result<(), GovernanceError> {
        let current = self.clock.current();
        if height >= current {
            return Err(GovernanceError::InvalidQuery { height, current });
        }
        Ok(())
    }

    fn set_units(&mut self, account: Address, units: u128) {
        if units == 0 {
            self.units.remove(&account);
        } else {
            self.units.insert(account, units);
        }
    }

    fn plan_move(
        &self,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<Vec<PowerChange>, GovernanceError> {
        let mut changes = Vec::with_capacity(2);
        if from == to || amount == 0 {
            return Ok(changes);
        }

        let now = self.clock.current();

        if !from.is_zero() {
            if let Some(cps) = self.checkpoints.get(&from) {
                cps.check_writable(now)?;
            }
            let previous = self.get_votes(from);
            let new = previous
                .checked_sub(amount)
                .ok_or(GovernanceError::Overflow("voting power underflow"))?;
            changes.push(PowerChange { account: from, previous, new });
        }

        if !to.is_zero() {
            if let Some(cps) = self.checkpoints.get(&to) {
                cps.check_writable(now)?;
            }
            let previous = self.get_votes(to);
            let new = previous
                .checked_add(amount)
                .ok_or(GovernanceError::Overflow("voting power"))?;
            changes.push(PowerChange { account: to, previous, new });
        }

        Ok(changes)
    }

    fn apply(&mut self, changes: Vec<PowerChange>) -> Result<(), GovernanceError> {
        let now = self.clock.current();
        for change in changes {
            // Writability was checked while planning, so this only fails if
            // the clock moved backwards in between.
            self.checkpoints
                .entry(change.account)
                .or_default()
                .push(now, change.new)?;
            debug!(
                delegate = %change.account,
                height = now,
                previous = change.previous,
                new = change.new,
                "voting power checkpoint"
            );
            self.events.emit(GovernanceEvent::DelegateVotesChanged {
                delegate: change.account,
                previous_votes: change.previous,
                new_votes: change.new,
            });
        }
        Ok(())
    }
}

impl Votes for VotingPowerLedger {
    fn get_votes(&self, account: Address) -> u128 {
        self.checkpoints
            .get(&account)
            .map(Checkpoints::latest)
            .unwrap_or(0)
    }

    fn get_past_votes(&self, account: Address, height: Height) -> Result<u128, GovernanceError> {
        self.ensure_past(height)?;
        Ok(self
            .checkpoints
            .get(&account)
            .map(|cps| cps.upper_lookup(height))
            .unwrap_or(0))
    }

    fn get_past_total_supply(&self, height: Height) -> Result<u128, GovernanceError> {
        self.ensure_past(height)?;
        Ok(self.total_supply.upper_lookup(height))
    }

    fn delegates(&self, account: Address) -> Address {
        self.delegation.get(&account).copied().unwrap_or(account)
    }
}
