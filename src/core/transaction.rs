use crate::core::Blockchain;
use crate::crypto::hash::{Hash256, Hashable};
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Output index carried by the single input of a coinbase transaction.
pub const COINBASE_VOUT: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Hash256,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub previous_output: OutPoint,
    /// Unlock authority. Address encoding and signatures live outside the
    /// ledger, so this is the spender's address as a plain string.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    /// Lock authority: the address allowed to spend this output.
    pub pub_key: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl Transaction {
    /// Builds a transaction from its parts and stamps its id.
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let mut tx = Self {
            id: Hash256::zero(),
            inputs,
            outputs,
        };
        tx.id = tx.hash();
        tx
    }

    pub fn new_coinbase(to: &str, value: u64, data: &str) -> Self {
        let data = if data.is_empty() {
            format!("Coins to {}", to)
        } else {
            data.to_string()
        };

        let input = TxInput {
            previous_output: OutPoint::null(),
            signature: data,
        };
        let output = TxOutput {
            value,
            pub_key: to.to_string(),
        };

        Self::new(vec![input], vec![output])
    }

    /// Builds a transfer of `amount` from `from` to `to`, funded first-fit from
    /// the unspent outputs the chain currently holds for `from`. Any excess is
    /// returned to `from` as a change output.
    pub fn new_transfer(from: &str, to: &str, amount: u64, chain: &Blockchain) -> Result<Self> {
        if amount == 0 {
            return Err(LedgerError::InvalidInput("Transfer amount must be positive".to_string()));
        }

        let (accumulated, spendable) = chain.find_spendable_outputs(from, amount)?;
        if accumulated < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        // HashMap iteration order is arbitrary; sort so the same selection
        // always produces the same transaction id.
        let mut selected: Vec<(Hash256, Vec<u32>)> = spendable.into_iter().collect();
        selected.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

        let mut inputs = Vec::new();
        for (txid, vouts) in selected {
            for vout in vouts {
                inputs.push(TxInput {
                    previous_output: OutPoint::new(txid, vout),
                    signature: from.to_string(),
                });
            }
        }

        let mut outputs = vec![TxOutput {
            value: amount,
            pub_key: to.to_string(),
        }];
        if accumulated > amount {
            outputs.push(TxOutput {
                value: accumulated - amount,
                pub_key: from.to_string(),
            });
        }

        Ok(Self::new(inputs, outputs))
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_output.is_null()
    }
}

impl Hashable for Transaction {
    /// Hash over everything except the id field itself.
    fn hash(&self) -> Hash256 {
        let mut data = Vec::new();

        data.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            data.extend_from_slice(input.previous_output.txid.as_bytes());
            data.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            data.extend_from_slice(&(input.signature.len() as u32).to_le_bytes());
            data.extend_from_slice(input.signature.as_bytes());
        }

        data.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            data.extend_from_slice(&output.value.to_le_bytes());
            data.extend_from_slice(&(output.pub_key.len() as u32).to_le_bytes());
            data.extend_from_slice(output.pub_key.as_bytes());
        }

        Hash256::hash(&data)
    }
}

impl TxInput {
    pub fn can_unlock(&self, address: &str) -> bool {
        self.signature == address
    }
}

impl TxOutput {
    pub fn can_be_unlocked(&self, address: &str) -> bool {
        self.pub_key == address
    }
}

impl OutPoint {
    pub fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }

    pub fn null() -> Self {
        Self {
            txid: Hash256::zero(),
            vout: COINBASE_VOUT,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == COINBASE_VOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coinbase_transaction() {
        let tx = Transaction::new_coinbase("alice", 100, "Genesis block");

        assert!(tx.is_coinbase());
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value, 100);
        assert!(tx.outputs[0].can_be_unlocked("alice"));
        assert!(!tx.outputs[0].can_be_unlocked("bob"));
    }

    #[test]
    fn test_coinbase_default_data() {
        let tx = Transaction::new_coinbase("alice", 100, "");
        assert_eq!(tx.inputs[0].signature, "Coins to alice");
    }

    #[test]
    fn test_transaction_id_is_content_hash() {
        let tx = Transaction::new_coinbase("alice", 1000, "test");

        assert_eq!(tx.id, tx.hash());
        assert_ne!(tx.id, Hash256::zero());

        let other = Transaction::new_coinbase("alice", 1001, "test");
        assert_ne!(tx.id, other.id);
    }

    #[test]
    fn test_regular_transaction_is_not_coinbase() {
        let funding = Transaction::new_coinbase("alice", 10, "test");
        let tx = Transaction::new(
            vec![TxInput {
                previous_output: OutPoint::new(funding.id, 0),
                signature: "alice".to_string(),
            }],
            vec![TxOutput { value: 10, pub_key: "bob".to_string() }],
        );

        assert!(!tx.is_coinbase());
        assert!(tx.inputs[0].can_unlock("alice"));
        assert!(!tx.inputs[0].can_unlock("bob"));
    }
}
