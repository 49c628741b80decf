//! Checkpointed value history.
//!
//! A `Checkpoints` sequence records the value of a quantity each time it
//! changes, keyed by height. Storage grows with the number of changes, not
//! with elapsed heights, and a point-in-time read is a binary search.

use plenum_types::Height;
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// Value of a quantity as of a height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub height: Height,
    pub power: u128,
}

/// Ordered checkpoint history.
///
/// Heights strictly increase. A write at the height of the last entry
/// replaces that entry, so several changes in one block leave a single
/// checkpoint holding the block's final value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoints {
    entries: Vec<Checkpoint>,
}

impl Checkpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a write at `height` keeps the sequence ordered.
    pub fn check_writable(&self, height: Height) -> Result<(), GovernanceError> {
        match self.entries.last() {
            Some(last) if last.height > height => Err(GovernanceError::CheckpointOutOfOrder {
                last: last.height,
                attempted: height,
            }),
            _ => Ok(()),
        }
    }

    /// Record `power` at `height`, coalescing with a same-height entry.
    ///
    /// Returns the previous latest value.
    pub fn push(&mut self, height: Height, power: u128) -> Result<u128, GovernanceError> {
        self.check_writable(height)?;
        let previous = self.latest();

        match self.entries.last_mut() {
            Some(last) if last.height == height => last.power = power,
            _ => self.entries.push(Checkpoint { height, power }),
        }

        Ok(previous)
    }

    /// Most recent value, or zero if nothing was ever recorded.
    pub fn latest(&self) -> u128 {
        self.entries.last().map(|c| c.power).unwrap_or(0)
    }

    /// Value of the rightmost checkpoint whose height is `<= height`, or zero.
    pub fn upper_lookup(&self, height: Height) -> u128 {
        let idx = self.entries.partition_point(|c| c.height <= height);
        if idx == 0 {
            0
        } else {
            self.entries[idx - 1].power
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Checkpoint> {
        self.entries.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.entries.iter()
    }
}
