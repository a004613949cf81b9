//! TU-CLI: Thumbs-Up board command line
//!
//! Drives the chain client with a local keypair: create the shared account,
//! list, submit and upvote links, and tip their submitters.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use tu_chain_client::{
    derive_address, BoardApi, ChainClient, ClientConfig, Commitment, Entry, EntryId,
    HttpRpcNetwork, KeypairWallet, Lamports, Pubkey, TransactionReceipt,
};
use tu_telemetry::{init_telemetry, TelemetryConfig};

/// Default tip, in lamports.
const DEFAULT_TIP: Lamports = 100_000;

/// TU-CLI: Thumbs-Up board command line
#[derive(Parser, Debug)]
#[command(name = "tu-cli", version)]
#[command(about = "Submit, upvote and tip links on the shared Thumbs-Up board")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Keypair file (64-byte JSON array)
    #[arg(short, long)]
    keypair: Option<PathBuf>,

    /// Commitment level: processed, confirmed or finalized
    #[arg(long)]
    commitment: Option<Commitment>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Show the shared account address and bump
    Address,
    #[command(flatten)]
    Board(BoardCommand),
}

/// Subcommands that talk to the ledger through a connected wallet.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum BoardCommand {
    /// Create the shared account (once per program and seed)
    Init,
    /// List media entries, most votes first
    List {
        /// Show every entry in ledger order, unfiltered
        #[arg(long)]
        raw: bool,
    },
    /// Submit a link
    Submit {
        /// Link to submit
        link: String,
    },
    /// Upvote an entry by id
    Upvote {
        /// Entry id as listed
        id: String,
    },
    /// Send lamports to an address
    Tip {
        /// Recipient address (base58)
        to: Pubkey,
        /// Amount in lamports
        #[arg(default_value_t = DEFAULT_TIP)]
        amount: Lamports,
    },
    /// Tip the submitter of a listed entry
    TipEntry {
        /// Entry id as listed
        id: String,
        /// Amount in lamports
        #[arg(default_value_t = DEFAULT_TIP)]
        amount: Lamports,
    },
}

type Client = ChainClient<KeypairWallet<HttpRpcNetwork>, HttpRpcNetwork>;

/// File, then `TU_*` overrides from `lookup`, then flags.
fn resolve_config(args: &Args, lookup: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
    let config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let mut config = config.with_overrides(lookup)?;

    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(commitment) = args.commitment {
        config.commitment = commitment;
    }
    if let Some(path) = &args.keypair {
        config.keypair_path = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn default_keypair_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/solana/id.json"))
}

async fn connect_client(config: ClientConfig) -> Result<Client> {
    let Some(keypair_path) = config.keypair_path.clone().or_else(default_keypair_path) else {
        bail!("no keypair: pass --keypair or set keypair_path in the config file");
    };

    let network = Arc::new(HttpRpcNetwork::from_config(&config)?);
    let wallet = Arc::new(
        KeypairWallet::load(&keypair_path, network.clone(), config.commitment)
            .with_context(|| format!("loading keypair {}", keypair_path.display()))?,
    );
    let client = ChainClient::new(config, wallet, network)?;
    client.connect().await.context("connecting wallet")?;
    Ok(client)
}

fn print_entries(entries: &[Entry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No entries yet.");
    }
    for entry in entries {
        println!("{:>6}  {}", entry.votes, entry.link);
        println!("        id: {}", entry.id);
        println!("        by: {}", entry.submitter);
    }
    Ok(())
}

fn print_receipt(action: &str, receipt: &TransactionReceipt, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "action": action,
            "signature": receipt.signature.to_string(),
            "state": receipt.state.name(),
        });
        println!("{value}");
    } else {
        println!("{action}: {} ({})", receipt.signature, receipt.state);
    }
    Ok(())
}

async fn run_board(client: &Client, command: BoardCommand, json: bool) -> Result<()> {
    match command {
        BoardCommand::Init => {
            let receipt = client.initialize_account().await?;
            print_receipt("initialize", &receipt, json)
        }
        BoardCommand::List { raw } => {
            let entries = if raw {
                client.list_entries().await?
            } else {
                client.refresh().await?.to_vec()
            };
            info!("[tu-cli] Listed {} entries", entries.len());
            print_entries(&entries, json)
        }
        BoardCommand::Submit { link } => {
            let receipt = client.submit_entry(&link).await?;
            print_receipt("submit", &receipt, json)
        }
        BoardCommand::Upvote { id } => {
            let receipt = client.upvote(&EntryId::new(id)).await?;
            print_receipt("upvote", &receipt, json)
        }
        BoardCommand::Tip { to, amount } => {
            let receipt = client.tip(to, amount).await?;
            print_receipt("tip", &receipt, json)
        }
        BoardCommand::TipEntry { id, amount } => {
            client.refresh().await?;
            let receipt = client.tip_entry(&EntryId::new(id), amount).await?;
            print_receipt("tip", &receipt, json)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args, |key| std::env::var(key).ok())?;
    debug!(
        "[tu-cli] {:?} via {} at {} commitment",
        args.command, config.endpoint, config.commitment
    );

    match args.command {
        Command::Address => {
            let derived = derive_address(&config.program_id, config.seed.as_bytes())?;
            println!("{} (bump {})", derived.address, derived.bump);
            Ok(())
        }
        Command::Board(command) => {
            let client = connect_client(config).await?;
            run_board(&client, command, args.json).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_telemetry(&TelemetryConfig::for_tool("tu-cli"))?;
    run(args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tip_default_amount() {
        let args = Args::try_parse_from([
            "tu-cli",
            "tip",
            "EGWf3mBuwhvjmR134QfzKGMo8EgtsC4ieMP3D6mxWFXq",
        ])
        .unwrap();
        match args.command {
            Command::Board(BoardCommand::Tip { amount, .. }) => assert_eq!(amount, DEFAULT_TIP),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_recipient_rejected() {
        assert!(Args::try_parse_from(["tu-cli", "tip", "not-a-key"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "tu-cli",
            "--endpoint",
            "http://localhost:8899",
            "--commitment",
            "finalized",
            "--keypair",
            "/tmp/id.json",
            "list",
        ])
        .unwrap();
        let env = |key: &str| match key {
            "TU_ENDPOINT" => Some("http://ignored:8899".to_string()),
            "TU_SEED" => Some("base_account3".to_string()),
            _ => None,
        };
        let config = resolve_config(&args, env).unwrap();
        assert_eq!(config.endpoint, "http://localhost:8899");
        assert_eq!(config.commitment, Commitment::Finalized);
        assert_eq!(config.keypair_path, Some(PathBuf::from("/tmp/id.json")));
        assert_eq!(config.seed, "base_account3");
        assert_eq!(args.command, Command::Board(BoardCommand::List { raw: false }));
    }

    #[test]
    fn test_defaults_without_environment() {
        let args = Args::try_parse_from(["tu-cli", "address"]).unwrap();
        let config = resolve_config(&args, |_| None).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(args.command, Command::Address);
    }

    #[test]
    fn test_tip_entry_subcommand_name() {
        let args = Args::try_parse_from(["tu-cli", "tip-entry", "0xabc_link", "5"]).unwrap();
        assert_eq!(
            args.command,
            Command::Board(BoardCommand::TipEntry {
                id: "0xabc_link".into(),
                amount: 5
            })
        );
    }
}
