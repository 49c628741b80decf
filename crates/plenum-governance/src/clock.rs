//! Shared block-height clock.
//!
//! Every state-changing operation happens "in" the current block. Only
//! heights strictly below the current one are finalized history.

use plenum_types::Height;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic height counter shared by the ledger and the governor.
#[derive(Debug, Clone, Default)]
pub struct BlockClock {
    height: Arc<AtomicU64>,
}

impl BlockClock {
    /// Create a clock at height zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock at a given height.
    pub fn starting_at(height: Height) -> Self {
        Self {
            height: Arc::new(AtomicU64::new(height)),
        }
    }

    /// Height of the block currently being built.
    pub fn current(&self) -> Height {
        self.height.load(Ordering::Acquire)
    }

    /// Seal the current block. Returns the new current height.
    pub fn mine(&self) -> Height {
        self.advance(1)
    }

    /// Seal `blocks` blocks. Returns the new current height.
    pub fn advance(&self, blocks: u64) -> Height {
        let previous = self
            .height
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |h| {
                Some(h.saturating_add(blocks))
            })
            .unwrap_or_else(|h| h);
        previous.saturating_add(blocks)
    }
}
