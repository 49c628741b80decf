//! Governance token.
//!
//! A fungible token whose balances are the voting units of the ledger. Every
//! balance change is forwarded to the ledger before balances are written, so
//! the ledger's view never drifts from the token's. Minting is reserved to a
//! single minter, normally the governor itself.

use plenum_types::{Address, Height};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::clock::BlockClock;
use crate::config::TokenConfig;
use crate::error::GovernanceError;
use crate::events::{EventLog, GovernanceEvent};
use crate::ledger::VotingPowerLedger;
use crate::votes::Votes;

/// Vote-tracking token.
#[derive(Debug, Clone)]
pub struct VotesToken {
    name: String,
    symbol: String,
    decimals: u8,
    balances: HashMap<Address, u128>,
    minter: Address,
    ledger: VotingPowerLedger,
    events: EventLog,
}

impl VotesToken {
    /// Create a token with no supply.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, minter: Address, clock: BlockClock) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: 18,
            balances: HashMap::new(),
            minter,
            ledger: VotingPowerLedger::new(clock),
            events: EventLog::new(),
        }
    }

    /// Deploy a token and mint its initial supply.
    pub fn bootstrap(config: &TokenConfig, minter: Address, clock: BlockClock) -> Result<Self, GovernanceError> {
        let mut token = Self::new(config.name.clone(), config.symbol.clone(), minter, clock);
        token.decimals = config.decimals;

        if config.initial_supply > 0 {
            let recipient = config.initial_recipient.ok_or_else(|| {
                GovernanceError::InvalidParameter("initial supply requires a recipient".to_string())
            })?;
            if recipient.is_zero() {
                return Err(GovernanceError::InvalidParameter(
                    "initial recipient cannot be the null account".to_string(),
                ));
            }
            token.update(Address::ZERO, recipient, config.initial_supply)?;
        }

        info!(
            symbol = %token.symbol,
            minter = %minter,
            supply = token.total_supply(),
            "governance token deployed"
        );
        Ok(token)
    }

    /// Move `amount` from `from` to `to`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<(), GovernanceError> {
        if from.is_zero() || to.is_zero() {
            return Err(GovernanceError::InvalidParameter(
                "transfer involving the null account".to_string(),
            ));
        }
        self.update(from, to, amount)
    }

    /// Create `amount` new tokens for `to`. Only the minter may call this.
    pub fn mint(&mut self, caller: Address, to: Address, amount: u128) -> Result<(), GovernanceError> {
        if caller != self.minter {
            warn!(caller = %caller, "mint rejected: caller is not the minter");
            return Err(GovernanceError::Unauthorized(format!(
                "{} is not the minter",
                caller
            )));
        }
        if to.is_zero() {
            return Err(GovernanceError::InvalidParameter(
                "mint to the null account".to_string(),
            ));
        }
        self.update(Address::ZERO, to, amount)
    }

    /// Destroy `amount` of `from`'s tokens.
    pub fn burn(&mut self, from: Address, amount: u128) -> Result<(), GovernanceError> {
        if from.is_zero() {
            return Err(GovernanceError::InvalidParameter(
                "burn from the null account".to_string(),
            ));
        }
        self.update(from, Address::ZERO, amount)
    }

    /// Delegate `account`'s voting units to `delegatee`.
    pub fn delegate(&mut self, account: Address, delegatee: Address) -> Result<(), GovernanceError> {
        self.ledger.delegate(account, delegatee)?;
        self.collect_ledger_events();
        Ok(())
    }

    fn update(&mut self, from: Address, to: Address, amount: u128) -> Result<(), GovernanceError> {
        let from_balance = self.balance_of(from);
        if !from.is_zero() && from_balance < amount {
            return Err(GovernanceError::InsufficientBalance {
                account: from,
                balance: from_balance,
                required: amount,
            });
        }

        if from != to {
            let to_balance = if to.is_zero() {
                0
            } else {
                self.balance_of(to)
                    .checked_add(amount)
                    .ok_or(GovernanceError::Overflow("token balance"))?
            };

            // The ledger validates supply and units before writing anything.
            self.ledger.transfer_voting_units(from, to, amount)?;

            if !from.is_zero() {
                self.set_balance(from, from_balance - amount);
            }
            if !to.is_zero() {
                self.set_balance(to, to_balance);
            }
        }

        self.events.emit(GovernanceEvent::Transfer { from, to, value: amount });
        self.collect_ledger_events();
        Ok(())
    }

    fn set_balance(&mut self, account: Address, balance: u128) {
        if balance == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }

    fn collect_ledger_events(&mut self) {
        for event in self.ledger.drain_events() {
            self.events.emit(event);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn minter(&self) -> Address {
        self.minter
    }

    pub fn balance_of(&self, account: Address) -> u128 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply()
    }

    pub fn ledger(&self) -> &VotingPowerLedger {
        &self.ledger
    }

    pub fn current_height(&self) -> Height {
        self.ledger.clock().current()
    }

    /// Take buffered token and delegation events, in emission order.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        self.events.drain()
    }
}

impl Votes for VotesToken {
    fn get_votes(&self, account: Address) -> u128 {
        self.ledger.get_votes(account)
    }

    fn get_past_votes(&self, account: Address, height: Height) -> Result<u128, GovernanceError> {
        self.ledger.get_past_votes(account, height)
    }

    fn get_past_total_supply(&self, height: Height) -> Result<u128, GovernanceError> {
        self.ledger.get_past_total_supply(height)
    }

    fn delegates(&self, account: Address) -> Address {
        self.ledger.delegates(account)
    }
}
