//! Append-only ticket booking ledger.
//!
//! Bookings are queued in a pending pool and sealed into hash-linked blocks,
//! each carrying a proof-of-work nonce found relative to the previous block's
//! proof.
//!
//! - [`blockchain`] - transactions, blocks, proof-of-work and the [`Ledger`] handle
//! - [`booking`] - booking validation, CSV intake and the booking desk flow
//! - [`metrics`] - chain and proof-search metrics with CSV export
//! - [`config`] - environment configuration
//! - [`error`] - error type
//!
//! [`Ledger`]: blockchain::Ledger

pub mod blockchain;
pub mod booking;
pub mod config;
pub mod error;
pub mod metrics;

pub use blockchain::{Block, Ledger, Transaction};
pub use error::{LedgerError, Result};
