use crate::config::ChainParams;
use crate::core::{Block, ChainIterator, Transaction, TxOutput};
use crate::crypto::hash::Hash256;
use crate::storage::Database;
use crate::{LedgerError, Result};
use std::collections::{HashMap, HashSet};

/// Handle on the single chain held by a store.
///
/// The tip is written only by [`Blockchain::add_block`], after the store
/// has committed the new head. Every UTXO query walks the whole chain.
#[derive(Debug)]
pub struct Blockchain {
    tip: Hash256,
    db: Database,
    params: ChainParams,
}

/// Outputs of one transaction still spendable by the queried address.
#[derive(Debug, Clone)]
struct UnspentOutputs {
    tx: Transaction,
    vouts: Vec<u32>,
}

impl Blockchain {
    /// Creates a new chain whose genesis coinbase pays `address`.
    pub fn init(db: Database, address: &str, params: ChainParams) -> Result<Self> {
        if db.chain_exists()? {
            return Err(LedgerError::ChainExists);
        }

        // Seal before touching the store; commit_block opens the blocks tree.
        let coinbase = Transaction::new_coinbase(address, params.coinbase_reward, &params.genesis_data);
        let genesis = Block::genesis(coinbase, params.difficulty)?;
        let tip = db.commit_block(&genesis)?;

        log::info!("🌱 Genesis created: {}", tip);
        Ok(Self { tip, db, params })
    }

    /// Opens the chain already held by the store.
    pub fn resume(db: Database, params: ChainParams) -> Result<Self> {
        let tip = db.last_hash()?.ok_or(LedgerError::ChainNotFound)?;

        log::debug!("Resumed chain at {}", tip);
        Ok(Self { tip, db, params })
    }

    pub fn tip(&self) -> Hash256 {
        self.tip
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Seals `transactions` into a block on top of the current tip and makes
    /// it the new head. On failure neither the store nor the handle changes.
    pub fn add_block(&mut self, transactions: Vec<Transaction>) -> Result<Block> {
        if transactions.is_empty() {
            return Err(LedgerError::InvalidInput("A block needs at least one transaction".to_string()));
        }

        let block = Block::new(transactions, self.tip, self.params.difficulty)?;
        let hash = self.db.commit_block(&block)?;
        self.tip = hash;

        log::info!("✅ Block {} added with {} transaction(s)", hash, block.transaction_count());
        Ok(block)
    }

    pub fn iter(&self) -> ChainIterator {
        ChainIterator::new(self.tip, self.db.clone())
    }

    pub fn get_block(&self, hash: &Hash256) -> Result<Option<Block>> {
        self.db.get_block(hash)
    }

    /// Walks head to genesis collecting, per transaction, the outputs locked
    /// to `address` that no input in the chain has spent.
    ///
    /// Spends are accumulated as the walk goes back in time. An input always
    /// sits in the same block as, or a later block than, the output it spends,
    /// so recording a block's inputs before scanning its outputs means every
    /// spend is known by the time its output is reached.
    fn unspent_outputs(&self, address: &str) -> Result<Vec<UnspentOutputs>> {
        let mut spent: HashMap<Hash256, HashSet<u32>> = HashMap::new();
        let mut unspent = Vec::new();

        for block in self.iter() {
            let block = block?;

            for tx in block.transactions.iter().filter(|tx| !tx.is_coinbase()) {
                for input in tx.inputs.iter().filter(|input| input.can_unlock(address)) {
                    spent
                        .entry(input.previous_output.txid)
                        .or_default()
                        .insert(input.previous_output.vout);
                }
            }

            for tx in block.transactions {
                let spent_here = spent.get(&tx.id);
                let vouts: Vec<u32> = tx
                    .outputs
                    .iter()
                    .enumerate()
                    .filter(|(_, output)| output.can_be_unlocked(address))
                    .map(|(vout, _)| vout as u32)
                    .filter(|vout| spent_here.map_or(true, |set| !set.contains(vout)))
                    .collect();

                if !vouts.is_empty() {
                    unspent.push(UnspentOutputs { tx, vouts });
                }
            }
        }

        Ok(unspent)
    }

    /// Transactions holding at least one unspent output for `address`, newest first.
    pub fn find_unspent_transactions(&self, address: &str) -> Result<Vec<Transaction>> {
        Ok(self
            .unspent_outputs(address)?
            .into_iter()
            .map(|unspent| unspent.tx)
            .collect())
    }

    pub fn find_utxo(&self, address: &str) -> Result<Vec<TxOutput>> {
        let mut utxos = Vec::new();
        for unspent in self.unspent_outputs(address)? {
            for vout in unspent.vouts {
                utxos.push(unspent.tx.outputs[vout as usize].clone());
            }
        }
        Ok(utxos)
    }

    pub fn get_balance(&self, address: &str) -> Result<u64> {
        Ok(self.find_utxo(address)?.iter().map(|output| output.value).sum())
    }

    /// First-fit selection of unspent outputs until `amount` is covered.
    ///
    /// Returns the accumulated value, which is below `amount` when funds are
    /// insufficient, and the selected output indices per transaction id.
    pub fn find_spendable_outputs(&self, address: &str, amount: u64) -> Result<(u64, HashMap<Hash256, Vec<u32>>)> {
        let unspent = self.unspent_outputs(address)?;
        Ok(select_first_fit(&unspent, amount))
    }
}

fn select_first_fit(unspent: &[UnspentOutputs], amount: u64) -> (u64, HashMap<Hash256, Vec<u32>>) {
    let mut accumulated = 0u64;
    let mut selected: HashMap<Hash256, Vec<u32>> = HashMap::new();

    for entry in unspent {
        for &vout in &entry.vouts {
            if accumulated >= amount {
                return (accumulated, selected);
            }
            accumulated = accumulated.saturating_add(entry.tx.outputs[vout as usize].value);
            selected.entry(entry.tx.id).or_default().push(vout);
        }
    }

    (accumulated, selected)
}
