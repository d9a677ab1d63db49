use crate::core::{Block, UtxoEntry};
use crate::crypto::hash::{Hash256, Hashable};
use crate::{LedgerError, Result};
use sled::transaction::TransactionResult;
use sled::{Batch, Db, Tree};
use std::path::Path;
use std::sync::Arc;

// Database tree names (equivalent to buckets)
pub const TREE_BLOCKS: &str = "blocks";
pub const TREE_CHAINSTATE: &str = "chainstate";

/// Key in the blocks tree holding the hash of the current head block.
pub const LAST_HASH_KEY: &[u8] = b"lh";

#[derive(Debug, Clone)]
pub struct Database {
    db: Arc<Db>,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| LedgerError::Storage(format!("Failed to open database: {}", e)))?;

        Ok(Self {
            db: Arc::new(db),
        })
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.db
            .tree_names()
            .iter()
            .any(|tree| &tree[..] == name.as_bytes())
    }

    /// Opens the tree, creating it on first use.
    pub fn create_namespace(&self, name: &str) -> Result<Tree> {
        self.db.open_tree(name)
            .map_err(|e| LedgerError::Storage(format!("Failed to open tree {}: {}", name, e)))
    }

    /// Reads a key without creating the namespace as a side effect.
    pub fn get(&self, name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.has_namespace(name) {
            return Ok(None);
        }

        let tree = self.create_namespace(name)?;
        let value = tree.get(key)
            .map_err(|e| LedgerError::Storage(format!("Failed to read from {}: {}", name, e)))?;
        Ok(value.map(|v| v.to_vec()))
    }

    pub fn put(&self, name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let tree = self.create_namespace(name)?;
        tree.insert(key, value)
            .map_err(|e| LedgerError::Storage(format!("Failed to write to {}: {}", name, e)))?;
        Ok(())
    }

    // Chain operations

    /// A chain exists iff the blocks tree holds a head pointer. The value
    /// itself is not validated here.
    pub fn chain_exists(&self) -> Result<bool> {
        Ok(self.get(TREE_BLOCKS, LAST_HASH_KEY)?.is_some())
    }

    pub fn last_hash(&self) -> Result<Option<Hash256>> {
        match self.get(TREE_BLOCKS, LAST_HASH_KEY)? {
            Some(bytes) => Hash256::from_slice(&bytes)
                .map(Some)
                .ok_or_else(|| LedgerError::Storage("Invalid head hash length".to_string())),
            None => Ok(None),
        }
    }

    pub fn get_block(&self, hash: &Hash256) -> Result<Option<Block>> {
        match self.get(TREE_BLOCKS, hash.as_bytes())? {
            Some(data) => Ok(Some(Block::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    /// Stores the block under its hash and moves the head pointer to it in a
    /// single write transaction. Readers see both writes or neither.
    pub fn commit_block(&self, block: &Block) -> Result<Hash256> {
        let tree = self.create_namespace(TREE_BLOCKS)?;
        let block_hash = block.hash();
        let block_data = block.serialize()?;

        let result: TransactionResult<(), LedgerError> = tree.transaction(|tx_tree| {
            tx_tree.insert(&block_hash.as_bytes()[..], block_data.as_slice())?;
            tx_tree.insert(LAST_HASH_KEY, &block_hash.as_bytes()[..])?;
            Ok(())
        });
        result?;

        log::debug!("💾 Saved block {} as chain head", block_hash);
        Ok(block_hash)
    }

    // UTXO index operations

    pub fn get_utxo_entries(&self, txid: &Hash256) -> Result<Option<Vec<UtxoEntry>>> {
        match self.get(TREE_CHAINSTATE, txid.as_bytes())? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    pub fn get_all_utxo_entries(&self) -> Result<Vec<(Hash256, Vec<UtxoEntry>)>> {
        if !self.has_namespace(TREE_CHAINSTATE) {
            return Ok(Vec::new());
        }

        let tree = self.create_namespace(TREE_CHAINSTATE)?;
        let mut entries = Vec::new();

        for item in tree.iter() {
            let (key, value) = item
                .map_err(|e| LedgerError::Storage(format!("Failed to iterate UTXO index: {}", e)))?;
            let txid = Hash256::from_slice(&key)
                .ok_or_else(|| LedgerError::Storage("Invalid UTXO index key".to_string()))?;
            entries.push((txid, bincode::deserialize(&value)?));
        }

        Ok(entries)
    }

    /// Applies index changes atomically. An empty entry list removes the key.
    pub fn write_utxo_entries(&self, changes: &[(Hash256, Vec<UtxoEntry>)]) -> Result<()> {
        let tree = self.create_namespace(TREE_CHAINSTATE)?;
        let mut batch = Batch::default();

        for (txid, entries) in changes {
            if entries.is_empty() {
                batch.remove(&txid.as_bytes()[..]);
            } else {
                batch.insert(&txid.as_bytes()[..], bincode::serialize(entries)?);
            }
        }

        tree.apply_batch(batch)
            .map_err(|e| LedgerError::Storage(format!("Failed to update UTXO index: {}", e)))?;
        Ok(())
    }

    /// Replaces the whole index with `rows` in one batch, so readers see
    /// either the old index or the new one.
    pub fn replace_utxo_entries(&self, rows: &[(Hash256, Vec<UtxoEntry>)]) -> Result<()> {
        let tree = self.create_namespace(TREE_CHAINSTATE)?;
        let mut batch = Batch::default();

        for key in tree.iter().keys() {
            let key = key
                .map_err(|e| LedgerError::Storage(format!("Failed to iterate UTXO index: {}", e)))?;
            batch.remove(key);
        }
        for (txid, entries) in rows.iter().filter(|(_, entries)| !entries.is_empty()) {
            batch.insert(&txid.as_bytes()[..], bincode::serialize(entries)?);
        }

        tree.apply_batch(batch)
            .map_err(|e| LedgerError::Storage(format!("Failed to rebuild UTXO index: {}", e)))?;
        Ok(())
    }

    /// Removes the tree and everything in it. Returns false if it did not exist.
    pub fn drop_namespace(&self, name: &str) -> Result<bool> {
        self.db.drop_tree(name)
            .map_err(|e| LedgerError::Storage(format!("Failed to drop tree {}: {}", name, e)))
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()
            .map_err(|e| LedgerError::Storage(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}
