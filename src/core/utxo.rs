//! Optional persisted UTXO index.
//!
//! The chain itself never consults this index; its queries always re-derive
//! spend state from the blocks. The index is a cache built on request that
//! answers the same questions without walking the chain, and must agree with
//! [`Blockchain`] whenever it has been kept up to date.

use crate::core::{Block, Blockchain, TxOutput};
use crate::crypto::hash::Hash256;
use crate::storage::{Database, TREE_CHAINSTATE};
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// An unspent output and its position in the transaction that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub vout: u32,
    pub output: TxOutput,
}

#[derive(Debug)]
pub struct UtxoSet<'a> {
    chain: &'a Blockchain,
}

impl<'a> UtxoSet<'a> {
    pub fn new(chain: &'a Blockchain) -> Self {
        Self { chain }
    }

    fn db(&self) -> &Database {
        self.chain.database()
    }

    /// Rebuilds the index from scratch with one walk over the chain.
    pub fn reindex(&self) -> Result<usize> {
        let mut spent: HashMap<Hash256, HashSet<u32>> = HashMap::new();
        let mut changes = Vec::new();

        for block in self.chain.iter() {
            let block = block?;

            for tx in block.transactions.iter().filter(|tx| !tx.is_coinbase()) {
                for input in &tx.inputs {
                    spent
                        .entry(input.previous_output.txid)
                        .or_default()
                        .insert(input.previous_output.vout);
                }
            }

            for tx in block.transactions {
                let spent_here = spent.get(&tx.id);
                let entries: Vec<UtxoEntry> = tx
                    .outputs
                    .into_iter()
                    .enumerate()
                    .map(|(vout, output)| UtxoEntry { vout: vout as u32, output })
                    .filter(|entry| spent_here.map_or(true, |set| !set.contains(&entry.vout)))
                    .collect();

                if !entries.is_empty() {
                    changes.push((tx.id, entries));
                }
            }
        }

        self.db().replace_utxo_entries(&changes)?;

        log::info!("🔄 UTXO index rebuilt with {} transaction(s)", changes.len());
        Ok(changes.len())
    }

    /// Applies a freshly appended block to the index.
    pub fn update(&self, block: &Block) -> Result<()> {
        let mut pending: HashMap<Hash256, Vec<UtxoEntry>> = HashMap::new();

        for tx in &block.transactions {
            if !tx.is_coinbase() {
                for input in &tx.inputs {
                    let txid = input.previous_output.txid;
                    if !pending.contains_key(&txid) {
                        let stored = self.db().get_utxo_entries(&txid)?.ok_or_else(|| {
                            LedgerError::Transaction(format!("UTXO not found: {}", txid))
                        })?;
                        pending.insert(txid, stored);
                    }
                    if let Some(entries) = pending.get_mut(&txid) {
                        entries.retain(|entry| entry.vout != input.previous_output.vout);
                    }
                }
            }

            let created = tx
                .outputs
                .iter()
                .enumerate()
                .map(|(vout, output)| UtxoEntry { vout: vout as u32, output: output.clone() })
                .collect();
            pending.insert(tx.id, created);
        }

        let changes: Vec<(Hash256, Vec<UtxoEntry>)> = pending.into_iter().collect();
        self.db().write_utxo_entries(&changes)
    }

    /// Brings a built index up to date with a block the chain has already
    /// committed. An index that cannot absorb the block is dropped until the
    /// next `reindex`. Returns whether the index is still live.
    pub fn sync_block(&self, block: &Block) -> bool {
        if !self.db().has_namespace(TREE_CHAINSTATE) {
            return false;
        }

        match self.update(block) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("⚠️ UTXO index is stale and will be dropped: {}", e);
                if let Err(e) = self.db().drop_namespace(TREE_CHAINSTATE) {
                    log::warn!("Failed to drop stale UTXO index: {}", e);
                }
                false
            }
        }
    }

    pub fn find_utxo(&self, address: &str) -> Result<Vec<TxOutput>> {
        let mut utxos = Vec::new();
        for (_, entries) in self.db().get_all_utxo_entries()? {
            utxos.extend(
                entries
                    .into_iter()
                    .filter(|entry| entry.output.can_be_unlocked(address))
                    .map(|entry| entry.output),
            );
        }
        Ok(utxos)
    }

    pub fn get_balance(&self, address: &str) -> Result<u64> {
        Ok(self.find_utxo(address)?.iter().map(|output| output.value).sum())
    }

    /// First-fit selection over the index, in key order.
    pub fn find_spendable_outputs(&self, address: &str, amount: u64) -> Result<(u64, HashMap<Hash256, Vec<u32>>)> {
        let mut accumulated = 0u64;
        let mut selected: HashMap<Hash256, Vec<u32>> = HashMap::new();

        for (txid, entries) in self.db().get_all_utxo_entries()? {
            for entry in entries.iter().filter(|entry| entry.output.can_be_unlocked(address)) {
                if accumulated >= amount {
                    return Ok((accumulated, selected));
                }
                accumulated = accumulated.saturating_add(entry.output.value);
                selected.entry(txid).or_default().push(entry.vout);
            }
        }

        Ok((accumulated, selected))
    }

    /// Number of transactions with at least one unspent output.
    pub fn count(&self) -> Result<usize> {
        Ok(self.db().get_all_utxo_entries()?.len())
    }
}
