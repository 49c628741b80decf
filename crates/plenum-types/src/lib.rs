//! Plenum Types - Shared identity and digest types.
//!
//! This crate provides:
//! - Addresses (20-byte account identities, hex encoded)
//! - Hashes (32-byte blake3 digests, used for proposal ids)
//! - Block heights

pub mod address;
pub mod hash;
pub mod error;

#[cfg(any(feature = "serde", feature = "borsh"))]
mod serialization;

pub use address::Address;
pub use hash::Hash;
pub use error::TypesError;

/// Discrete logical clock value shared by every operation (a block number).
pub type Height = u64;
