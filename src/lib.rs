//! UTXO Ledger - a single-node, append-only transactional ledger
//!
//! Blocks are chained by hash and persisted in sled. Ownership of funds is
//! tracked through unspent transaction outputs, re-derived from the chain on
//! every query:
//! - chain bootstrap and resume, one chain per store
//! - block append with an atomically updated head pointer
//! - backward iteration from head to genesis
//! - UTXO resolution, balances and first-fit spendable output selection
//! - an optional persisted UTXO index

pub mod core;
pub mod crypto;
pub mod mining;
pub mod storage;
pub mod cli;
pub mod error;
pub mod config;

pub use error::{LedgerError, Result};
