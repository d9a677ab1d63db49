use crate::core::Transaction;
use crate::crypto::hash::{Hash256, Hashable};
use crate::mining::ProofOfWork;
use crate::Result;
use serde::{Deserialize, Serialize};
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Zero for the genesis block.
    pub previous_hash: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u64,
    pub difficulty: u32,
    pub nonce: u64,
}

impl Block {
    /// Builds a block on top of `previous_hash` and seals it.
    pub fn new(transactions: Vec<Transaction>, previous_hash: Hash256, difficulty: u32) -> Result<Self> {
        let merkle_root = Self::calculate_merkle_root(&transactions);
        let timestamp = Utc::now().timestamp() as u64;

        let mut block = Self {
            header: BlockHeader {
                previous_hash,
                merkle_root,
                timestamp,
                difficulty,
                nonce: 0,
            },
            transactions,
        };

        ProofOfWork::new(difficulty).run(&mut block.header)?;
        Ok(block)
    }

    pub fn genesis(coinbase: Transaction, difficulty: u32) -> Result<Self> {
        Self::new(vec![coinbase], Hash256::zero(), difficulty)
    }

    pub fn calculate_merkle_root(transactions: &[Transaction]) -> Hash256 {
        if transactions.is_empty() {
            return Hash256::zero();
        }

        let mut hashes: Vec<Hash256> = transactions.iter().map(|tx| tx.id).collect();

        while hashes.len() > 1 {
            let mut next_level = Vec::new();

            for chunk in hashes.chunks(2) {
                let mut bytes = Vec::with_capacity(64);
                bytes.extend_from_slice(chunk[0].as_bytes());
                // Duplicate the last hash if odd number
                bytes.extend_from_slice(chunk.get(1).unwrap_or(&chunk[0]).as_bytes());
                next_level.push(Hash256::hash(&bytes));
            }

            hashes = next_level;
        }

        hashes[0]
    }

    pub fn is_genesis(&self) -> bool {
        self.header.previous_hash.is_zero()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

impl Hashable for Block {
    fn hash(&self) -> Hash256 {
        self.header.hash()
    }
}

impl Hashable for BlockHeader {
    fn hash(&self) -> Hash256 {
        let mut data = Vec::new();
        data.extend_from_slice(self.previous_hash.as_bytes());
        data.extend_from_slice(self.merkle_root.as_bytes());
        data.extend_from_slice(&self.timestamp.to_le_bytes());
        data.extend_from_slice(&self.difficulty.to_le_bytes());
        data.extend_from_slice(&self.nonce.to_le_bytes());

        Hash256::hash(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_block() {
        let coinbase = Transaction::new_coinbase("alice", 100, "genesis");
        let block = Block::genesis(coinbase.clone(), 4).unwrap();

        assert!(block.is_genesis());
        assert_eq!(block.header.difficulty, 4);
        assert_eq!(block.transactions, vec![coinbase]);
        assert!(ProofOfWork::new(4).validate(&block.header));
    }

    #[test]
    fn test_block_links_to_previous() {
        let genesis = Block::genesis(Transaction::new_coinbase("alice", 100, "genesis"), 2).unwrap();
        let next = Block::new(
            vec![Transaction::new_coinbase("bob", 100, "second")],
            genesis.hash(),
            2,
        )
        .unwrap();

        assert!(!next.is_genesis());
        assert_eq!(next.header.previous_hash, genesis.hash());
    }

    #[test]
    fn test_serialize_preserves_hash() {
        let block = Block::genesis(Transaction::new_coinbase("alice", 100, "genesis"), 2).unwrap();

        let bytes = block.serialize().unwrap();
        let decoded = Block::deserialize(&bytes).unwrap();

        assert_eq!(decoded.hash(), block.hash());
        assert_eq!(decoded, block);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(Block::deserialize(&[0xde, 0xad]).is_err());
    }

    #[test]
    fn test_merkle_root_calculation() {
        let transactions = vec![
            Transaction::new_coinbase("addr1", 1000, "test"),
            Transaction::new_coinbase("addr2", 1000, "test2"),
            Transaction::new_coinbase("addr3", 1000, "test3"),
        ];

        let root = Block::calculate_merkle_root(&transactions);
        assert_ne!(root, Hash256::zero());
        assert_ne!(root, Block::calculate_merkle_root(&transactions[..2]));
        assert_eq!(Block::calculate_merkle_root(&transactions[..1]), transactions[0].id);
        assert_eq!(Block::calculate_merkle_root(&[]), Hash256::zero());
    }
}
