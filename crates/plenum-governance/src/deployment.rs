//! Wiring of a complete governance deployment.
//!
//! A deployment owns one clock, one token (whose ledger is the source of
//! voting power) and one governor that is the token's sole minter.

use parking_lot::RwLock;
use plenum_types::Address;
use std::sync::Arc;
use tracing::info;

use crate::clock::BlockClock;
use crate::config::DeploymentConfig;
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::executor::{TokenCall, TokenExecutor};
use crate::governor::Governor;
use crate::proposal::Action;
use crate::token::VotesToken;

/// Token handle shared by the governor (reads) and its executor (writes).
pub type SharedToken = Arc<RwLock<VotesToken>>;

/// Governor over the shared token.
pub type TokenGovernor = Governor<SharedToken, TokenExecutor>;

/// A bootstrapped token and governor on a common clock.
#[derive(Debug)]
pub struct Deployment {
    clock: BlockClock,
    token: SharedToken,
    governor: TokenGovernor,
    token_address: Address,
    governor_address: Address,
}

impl Deployment {
    /// Validate `config`, deploy the token and mint its initial supply at
    /// height 1.
    pub fn new(config: &DeploymentConfig) -> Result<Self, GovernanceError> {
        config
            .validate()
            .map_err(|e| GovernanceError::InvalidParameter(e.to_string()))?;

        let clock = BlockClock::starting_at(1);
        let governor_address = Address::from_label(&format!("plenum/governor/{}", config.governor.name));
        let token_address = Address::from_label(&format!("plenum/token/{}", config.token.symbol));

        let token = Arc::new(RwLock::new(VotesToken::bootstrap(
            &config.token,
            governor_address,
            clock.clone(),
        )?));
        let executor = TokenExecutor::new(token.clone(), token_address, governor_address);
        let governor = Governor::new(
            governor_address,
            config.governor.clone(),
            clock.clone(),
            token.clone(),
            executor,
        );

        info!(
            governor = %governor_address,
            token = %token_address,
            voting_delay = config.governor.voting_delay,
            voting_period = config.governor.voting_period,
            quorum_numerator = config.governor.quorum_numerator as u64,
            "deployment ready"
        );

        Ok(Self {
            clock,
            token,
            governor,
            token_address,
            governor_address,
        })
    }

    pub fn clock(&self) -> &BlockClock {
        &self.clock
    }

    pub fn token(&self) -> &SharedToken {
        &self.token
    }

    pub fn governor(&self) -> &TokenGovernor {
        &self.governor
    }

    pub fn governor_mut(&mut self) -> &mut TokenGovernor {
        &mut self.governor
    }

    pub fn token_address(&self) -> Address {
        self.token_address
    }

    pub fn governor_address(&self) -> Address {
        self.governor_address
    }

    /// Encode `call` as an action addressed to this deployment's token.
    pub fn token_action(&self, call: TokenCall) -> Result<Action, GovernanceError> {
        call.into_action(self.token_address)
            .map_err(|e| GovernanceError::InvalidParameter(format!("calldata encoding: {}", e)))
    }

    /// Take buffered events: token and ledger events first, then governor
    /// events.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        let mut events = self.token.write().drain_events();
        events.extend(self.governor.drain_events());
        events
    }
}
