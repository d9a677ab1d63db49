use crate::config::Config;
use crate::core::{Blockchain, Transaction, UtxoSet};
use crate::crypto::hash::{Hash256, Hashable};
use crate::mining::ProofOfWork;
use crate::storage::Database;
use crate::{LedgerError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(about = "Single-node UTXO ledger backed by an embedded key-value store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, help = "Data directory")]
    pub data_dir: Option<String>,

    #[arg(long, help = "Proof-of-work difficulty in leading zero bits")]
    pub difficulty: Option<u32>,

    #[arg(long, help = "Enable debug logging")]
    pub debug: bool,

    #[arg(long, help = "Configuration file path")]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new chain whose genesis reward goes to ADDRESS
    CreateChain {
        #[arg(long)]
        address: String,
    },

    /// Show the spendable balance of an address
    Balance {
        #[arg(long)]
        address: String,
    },

    /// Transfer AMOUNT from one address to another in a new block
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
    },

    /// Print every block from the head back to genesis
    PrintChain,

    /// Show a single block by hash
    Block {
        hash: String,
    },

    /// Rebuild the persisted UTXO index from the chain
    ReindexUtxo,
}

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging once
    let _ = if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).try_init()
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init()
    };

    let mut config = match &cli.config {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load()?,
    };

    // Override config with CLI arguments
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir.into();
    }
    if let Some(difficulty) = cli.difficulty {
        config.chain.difficulty = difficulty;
    }

    std::fs::create_dir_all(&config.storage.data_dir)?;
    let db = Database::new(config.storage.db_path())?;

    let result = match cli.command {
        Commands::CreateChain { address } => create_chain(db.clone(), &config, &address),
        Commands::Balance { address } => balance(db.clone(), &config, &address),
        Commands::Send { from, to, amount } => send(db.clone(), &config, &from, &to, amount),
        Commands::PrintChain => print_chain(db.clone(), &config),
        Commands::Block { hash } => print_block(db.clone(), &config, &hash),
        Commands::ReindexUtxo => reindex_utxo(db.clone(), &config),
    };

    db.flush()?;
    Ok(result?)
}

fn create_chain(db: Database, config: &Config, address: &str) -> Result<()> {
    let chain = Blockchain::init(db, address, config.chain.clone())?;
    println!("📦 Genesis block hash: {}", chain.tip());
    println!("Done!");
    Ok(())
}

fn balance(db: Database, config: &Config, address: &str) -> Result<()> {
    let chain = Blockchain::resume(db, config.chain.clone())?;
    let balance = chain.get_balance(address)?;
    println!("Balance of {}: {}", address, balance);
    Ok(())
}

fn send(db: Database, config: &Config, from: &str, to: &str, amount: u64) -> Result<()> {
    let mut chain = Blockchain::resume(db, config.chain.clone())?;
    let tx = Transaction::new_transfer(from, to, amount, &chain)?;
    let block = chain.add_block(vec![tx])?;

    // The transfer is committed at this point; the index only follows it.
    UtxoSet::new(&chain).sync_block(&block);

    println!("💰 Sent {} from {} to {} in block {}", amount, from, to, block.hash());
    Ok(())
}

fn print_chain(db: Database, config: &Config) -> Result<()> {
    let chain = Blockchain::resume(db, config.chain.clone())?;

    for block in chain.iter() {
        let block = block?;
        let pow = ProofOfWork::new(block.header.difficulty);

        println!("Hash: {}", block.hash());
        if block.is_genesis() {
            println!("Previous hash: (genesis)");
        } else {
            println!("Previous hash: {}", block.header.previous_hash);
        }
        println!("PoW: {}", pow.validate(&block.header));
        for tx in &block.transactions {
            print_transaction(tx);
        }
        println!();
    }

    Ok(())
}

fn print_block(db: Database, config: &Config, hash: &str) -> Result<()> {
    let chain = Blockchain::resume(db, config.chain.clone())?;
    let hash = Hash256::from_hex(hash)
        .map_err(|e| LedgerError::InvalidInput(format!("Invalid block hash: {}", e)))?;

    match chain.get_block(&hash)? {
        Some(block) => {
            println!("📦 Block Information:");
            println!("Hash: {}", block.hash());
            println!("Previous hash: {}", block.header.previous_hash);
            println!("Timestamp: {}", block.header.timestamp);
            println!("Difficulty: {}", block.header.difficulty);
            println!("Nonce: {}", block.header.nonce);
            for tx in &block.transactions {
                print_transaction(tx);
            }
        }
        None => println!("❌ Block not found"),
    }

    Ok(())
}

fn reindex_utxo(db: Database, config: &Config) -> Result<()> {
    let chain = Blockchain::resume(db, config.chain.clone())?;
    let count = UtxoSet::new(&chain).reindex()?;
    println!("Done! There are {} transactions in the UTXO set.", count);
    Ok(())
}

fn print_transaction(tx: &Transaction) {
    println!("  Transaction {}{}", tx.id, if tx.is_coinbase() { " (coinbase)" } else { "" });
    if !tx.is_coinbase() {
        for input in &tx.inputs {
            println!(
                "    in:  {}:{} by {}",
                input.previous_output.txid, input.previous_output.vout, input.signature
            );
        }
    }
    for (vout, output) in tx.outputs.iter().enumerate() {
        println!("    out {}: {} to {}", vout, output.value, output.pub_key);
    }
}
