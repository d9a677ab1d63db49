use utxo_ledger::cli::commands::run_cli;
use utxo_ledger::LedgerError;

fn main() -> anyhow::Result<()> {
    if let Err(err) = run_cli() {
        // Refusing to create a second chain, or finding none, is reported
        // and ends the process without touching the store.
        if let Some(ledger_err) = err.downcast_ref::<LedgerError>() {
            if ledger_err.is_precondition() {
                log::warn!("{}", ledger_err);
                eprintln!("{}", ledger_err);
                std::process::exit(1);
            }
        }
        return Err(err);
    }

    Ok(())
}
