//! Embedded key-value storage for blocks and the optional UTXO index

pub mod database;

pub use database::{Database, LAST_HASH_KEY, TREE_BLOCKS, TREE_CHAINSTATE};
