use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fal",
    about = "Financial Audit Ledger: tamper-evident transaction records",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Record store journal (overrides the config file)
    #[arg(long, global = true)]
    pub journal: Option<PathBuf>,

    /// Actor id recorded for local operations
    #[arg(long, global = true, default_value = "local")]
    pub actor: String,

    /// Display name recorded for local operations
    #[arg(long = "as", global = true, default_value = "Local Operator")]
    pub actor_name: String,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP API server
    Serve(ServeArgs),
    /// Record a new transaction
    Record(RecordArgs),
    /// Amend a transaction by appending a correcting block
    Amend(AmendArgs),
    /// List persisted transactions
    List(ListArgs),
    /// Show one transaction
    Show(IdArgs),
    /// Recompute a transaction's hash from its stored fields
    Validate(IdArgs),
    /// Mark a transaction verified
    Approve(IdArgs),
    /// Overwrite a stored amount without rehashing (demonstration)
    Tamper(TamperArgs),
    /// Show chain summary and integrity
    Chain(ChainArgs),
    /// Show the audit trail of a transaction
    Audit(IdArgs),
    /// List distinct auditors
    Auditors(AuditorsArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Refuse to start if a stored transaction fails its own hash
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct RecordArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub amount: f64,
    #[arg(long)]
    pub from: String,
    #[arg(long)]
    pub to: String,
    #[arg(short, long)]
    pub description: String,
    #[arg(long)]
    pub auditor: String,
}

#[derive(Args)]
pub struct AmendArgs {
    pub id: String,
    #[arg(long, allow_negative_numbers = true)]
    pub amount: f64,
    #[arg(short, long)]
    pub description: String,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args)]
pub struct TamperArgs {
    pub id: String,
    #[arg(long, allow_negative_numbers = true)]
    pub amount: f64,
}

#[derive(Args)]
pub struct ChainArgs {
    /// Print every block
    #[arg(long)]
    pub blocks: bool,
}

#[derive(Args)]
pub struct AuditorsArgs {}

#[derive(Args)]
pub struct ConfigArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record() {
        let cli = Cli::try_parse_from([
            "fal", "record", "--amount", "100", "--from", "A", "--to", "B", "-d", "test",
            "--auditor", "aud1",
        ])
        .unwrap();
        if let Command::Record(args) = cli.command {
            assert_eq!(args.amount, 100.0);
            assert_eq!(args.from, "A");
            assert_eq!(args.description, "test");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_amend() {
        let cli =
            Cli::try_parse_from(["fal", "amend", "tx_1_a", "--amount", "200", "-d", "fixed"]).unwrap();
        if let Command::Amend(args) = cli.command {
            assert_eq!(args.id, "tx_1_a");
            assert_eq!(args.amount, 200.0);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["fal", "serve", "--bind", "0.0.0.0:8080", "--strict"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
            assert!(args.strict);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "fal", "--journal", "/tmp/j", "--actor", "u-9", "--as", "Nina", "--format", "json",
            "chain",
        ])
        .unwrap();
        assert_eq!(cli.journal, Some(PathBuf::from("/tmp/j")));
        assert_eq!(cli.actor, "u-9");
        assert_eq!(cli.actor_name, "Nina");
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(matches!(cli.command, Command::Chain(_)));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["fal", "--verbose", "list"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn record_requires_fields() {
        assert!(Cli::try_parse_from(["fal", "record", "--amount", "1"]).is_err());
    }
}
