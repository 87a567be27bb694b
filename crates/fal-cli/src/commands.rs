use anyhow::Context;
use colored::Colorize;
use fal_ledger::{Actor, AmendmentDraft, AuditLedger, ReplayMode, TransactionDraft};
use fal_server::{FalServer, ServerConfig};
use fal_store::{FileRecordStore, JournalConfig, SyncMode};
use fal_types::{Transaction, TransactionId};
use serde::Serialize;

use crate::cli::*;

type LocalLedger = AuditLedger<FileRecordStore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let Cli {
        command,
        format,
        actor,
        actor_name,
        ..
    } = cli;
    let actor = Actor::new(actor.as_str(), actor_name);

    match command {
        Command::Serve(args) => cmd_serve(config, args),
        Command::Config(_) => cmd_config(&config, &format),
        command => {
            let ledger = open_ledger(&config)?;
            match command {
                Command::Record(args) => cmd_record(&ledger, &actor, args, &format),
                Command::Amend(args) => cmd_amend(&ledger, &actor, args, &format),
                Command::List(args) => cmd_list(&ledger, args, &format),
                Command::Show(args) => cmd_show(&ledger, args, &format),
                Command::Validate(args) => cmd_validate(&ledger, args, &format),
                Command::Approve(args) => cmd_approve(&ledger, &actor, args, &format),
                Command::Tamper(args) => cmd_tamper(&ledger, &actor, args),
                Command::Chain(args) => cmd_chain(&ledger, args, &format),
                Command::Audit(args) => cmd_audit(&ledger, args, &format),
                Command::Auditors(_) => cmd_auditors(&ledger, &format),
                Command::Serve(_) | Command::Config(_) => Ok(()),
            }
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(journal) = &cli.journal {
        config.journal_path = journal.clone();
    }
    Ok(config)
}

fn open_ledger(config: &ServerConfig) -> anyhow::Result<LocalLedger> {
    let journal = JournalConfig {
        sync_mode: if config.sync_writes {
            SyncMode::EveryWrite
        } else {
            SyncMode::OsDefault
        },
    };
    let store = FileRecordStore::open(&config.journal_path, journal)
        .with_context(|| format!("opening journal {}", config.journal_path.display()))?;
    let mode = if config.strict_replay {
        ReplayMode::Strict
    } else {
        ReplayMode::Flag
    };
    let ledger = AuditLedger::open(store, mode)?;

    let report = ledger.replay_report();
    if !report.is_clean() {
        eprintln!(
            "{} {} stored transaction(s) no longer match their hash:",
            "warning:".yellow().bold(),
            report.mismatched.len()
        );
        for id in &report.mismatched {
            eprintln!("  {}", id.to_string().red());
        }
    }
    Ok(ledger)
}

fn emit<T: Serialize>(format: &OutputFormat, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn print_transaction(tx: &Transaction) {
    let status = if tx.is_verified() {
        tx.status.to_string().green()
    } else {
        tx.status.to_string().yellow()
    };
    println!("{}  block #{}  {}", tx.id.to_string().yellow().bold(), tx.block_index, status);
    println!("  {} -> {}  {}", tx.from, tx.to, tx.amount.to_string().bold());
    println!("  {}", tx.description);
    println!("  Auditor: {}  at {}", tx.auditor, tx.timestamp);
    println!("  Hash: {}", tx.hash.dimmed());
    if let Some(by) = &tx.verified_by {
        println!("  Verified by {}", by.to_string().cyan());
    }
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    config.strict_replay |= args.strict;
    if config.tokens.is_empty() {
        tracing::warn!("no tokens configured; every authenticated route will answer 401");
    }

    let server = FalServer::open(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_record(
    ledger: &LocalLedger,
    actor: &Actor,
    args: RecordArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let draft = TransactionDraft::new(args.amount, args.from, args.to, args.description, args.auditor);
    let tx = ledger.record_transaction(&draft, actor)?;
    emit(format, &tx, || {
        println!("{} Transaction recorded", "✓".green().bold());
        print_transaction(&tx);
    })
}

fn cmd_amend(
    ledger: &LocalLedger,
    actor: &Actor,
    args: AmendArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let id = TransactionId::new(args.id);
    let outcome =
        ledger.amend_transaction(&id, &AmendmentDraft::new(args.amount, args.description), actor)?;
    emit(format, &outcome, || {
        println!(
            "{} {} amended; block #{} appended",
            "✓".green().bold(),
            id.to_string().yellow(),
            outcome.block.index
        );
        print_transaction(&outcome.amendment);
    })
}

fn cmd_list(ledger: &LocalLedger, args: ListArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut transactions = ledger.transactions()?;
    if let Some(limit) = args.limit {
        let skip = transactions.len().saturating_sub(limit);
        transactions.drain(..skip);
    }
    emit(format, &transactions, || {
        if transactions.is_empty() {
            println!("No transactions.");
        }
        for tx in &transactions {
            println!(
                "{} {:>4}  {:<10} {} -> {}  {}",
                tx.id.to_string().yellow(),
                tx.block_index,
                tx.status.to_string(),
                tx.from,
                tx.to,
                tx.amount.to_string().bold()
            );
        }
    })
}

fn cmd_show(ledger: &LocalLedger, args: IdArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let tx = ledger.transaction(&TransactionId::new(args.id))?;
    emit(format, &tx, || print_transaction(&tx))
}

fn cmd_validate(ledger: &LocalLedger, args: IdArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let id = TransactionId::new(args.id);
    let report = ledger.verify_integrity(&id)?;
    emit(format, &report, || {
        if report.is_valid {
            println!("{} {} matches its stored hash", "✓".green().bold(), id.to_string().yellow());
        } else {
            println!("{} {} has been altered", "✗".red().bold(), id.to_string().yellow());
        }
        println!("  Stored:     {}", report.stored_hash);
        println!("  Calculated: {}", report.calculated_hash);
    })
}

fn cmd_approve(
    ledger: &LocalLedger,
    actor: &Actor,
    args: IdArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let tx = ledger.verify_transaction(&TransactionId::new(args.id), actor)?;
    emit(format, &tx, || {
        println!("{} Transaction verified", "✓".green().bold());
        print_transaction(&tx);
    })
}

fn cmd_tamper(ledger: &LocalLedger, actor: &Actor, args: TamperArgs) -> anyhow::Result<()> {
    let id = TransactionId::new(args.id);
    ledger.simulate_tamper(&id, Some(args.amount), Some(&actor.id))?;
    println!(
        "{} Stored amount of {} overwritten without rehashing",
        "!".red().bold(),
        id.to_string().yellow()
    );
    Ok(())
}

fn cmd_chain(ledger: &LocalLedger, args: ChainArgs, format: &OutputFormat) -> anyhow::Result<()> {
    if args.blocks {
        let blocks = ledger.full_chain()?;
        return emit(format, &blocks, || {
            for block in &blocks {
                let label = block
                    .transaction()
                    .map(|tx| tx.id.to_string())
                    .unwrap_or_else(|| "genesis".into());
                println!(
                    "#{:<4} {}  prev {}  {}",
                    block.index,
                    block.hash.cyan(),
                    block.previous_hash.dimmed(),
                    label
                );
            }
        });
    }

    let info = ledger.chain_info()?;
    emit(format, &info, || {
        let integrity = if info.is_valid {
            "valid".green()
        } else {
            "BROKEN".red().bold()
        };
        println!("Blocks: {}", info.length.to_string().bold());
        println!("Transactions: {}", info.total_transactions);
        println!("Integrity: {integrity}");
        println!("Latest: #{} {}", info.latest_block.index, info.latest_block.hash.cyan());
    })
}

fn cmd_audit(ledger: &LocalLedger, args: IdArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let trail = ledger.audit_trail(&TransactionId::new(args.id))?;
    emit(format, &trail, || {
        for entry in &trail {
            println!(
                "{:>4}  {}  {:<18} by {}",
                entry.id,
                entry.timestamp,
                entry.action.as_str().cyan(),
                entry.performed_by
            );
        }
    })
}

fn cmd_auditors(ledger: &LocalLedger, format: &OutputFormat) -> anyhow::Result<()> {
    let auditors = ledger.auditors()?;
    emit(format, &auditors, || {
        for name in &auditors {
            println!("{name}");
        }
    })
}

fn cmd_config(config: &ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", config.to_toml()?),
    }
    Ok(())
}
