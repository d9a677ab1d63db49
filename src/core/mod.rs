//! Core ledger components

pub mod blockchain;
pub mod block;
pub mod iterator;
pub mod transaction;
pub mod utxo;

pub use blockchain::Blockchain;
pub use block::{Block, BlockHeader};
pub use iterator::ChainIterator;
pub use transaction::{Transaction, TxInput, TxOutput};
pub use utxo::{UtxoSet, UtxoEntry};
