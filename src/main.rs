//! `esr`: EOSIO signing request wallet.
//!
//! # Architecture Overview
//!
//! ```text
//!   esr:… URI
//!       │
//!       ▼
//!   ┌─────────┐   ┌──────────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐
//!   │ request │──▶│ chain +      │──▶│ signing  │──▶│ broadcast │──▶│ callback │
//!   │ codec   │   │ template     │   │          │   │           │   │          │
//!   └─────────┘   └──────────────┘   └──────────┘   └───────────┘   └──────────┘
//!                        ▲                ▲
//!                  chain node        key from ESR_WALLET_PRIVATE_KEY
//! ```
//!
//! Configuration comes from a TOML file (`--config`); private keys only
//! from the environment.

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::json;

use esr_wallet::callback::Notifier;
use esr_wallet::chain::ChainClient;
use esr_wallet::config::{load_config, EsrConfig};
use esr_wallet::eosio::chain_id::ChainId;
use esr_wallet::lifecycle::{SessionOptions, SigningSession};
use esr_wallet::observability::logging::init_logging;
use esr_wallet::request::{RequestDocument, UriCodec};
use esr_wallet::signing::{select_key_provider, SoftwareKey, UnlockedKeys, WalletContext};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "esr")]
#[command(about = "Decode, resolve, sign and broadcast EOSIO signing requests", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a signing request as JSON
    Decode { uri: String },
    /// Encode a JSON request document into a URI
    Encode {
        file: PathBuf,
        /// Skip compression
        #[arg(long)]
        uncompressed: bool,
    },
    /// Resolve a request against the configured chain
    Resolve { uri: String },
    /// Sign a request with the configured wallet
    Sign {
        uri: String,
        /// Broadcast after signing if the request asks for it
        #[arg(long)]
        broadcast: bool,
    },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EsrConfig::default(),
    };
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    init_logging(level)?;

    match cli.command {
        Commands::Decode { uri } => {
            let request = UriCodec::new().decode(&uri)?;
            print_json(&serde_json::to_value(&request)?)?;
        }
        Commands::Encode { file, uncompressed } => {
            let document = read_document(&file)?;
            let client = client_for(&config, &document.chain_id.resolve())?;
            let request = document.into_request(&client).await?;
            let codec = if uncompressed {
                UriCodec::new().uncompressed()
            } else {
                UriCodec::new()
            };
            println!("{}", codec.encode(&request)?);
        }
        Commands::Resolve { uri } => {
            let wallet = wallet(&config)?;
            let session = SigningSession::new(wallet, session_options(&config, false));
            let request = session.decode(&uri)?;
            let client = client_for(&config, &request.chain_id.resolve())?;
            let resolved = session.resolve(&request, &client).await?;
            print_json(&serde_json::to_value(&resolved)?)?;
        }
        Commands::Sign { uri, broadcast } => {
            if !config.connection.sign {
                return Err("signing is disabled by configuration".into());
            }
            let wallet = wallet(&config)?;
            let mut keys = UnlockedKeys::new();
            if let Some(key) = SoftwareKey::from_env()? {
                keys.insert(key);
            }
            let provider = select_key_provider(wallet, &keys, None)?;
            let notifier = Notifier::new(config.connection.request_timeout())?;

            let session = SigningSession::new(wallet, session_options(&config, broadcast));
            let request = session.decode(&uri)?;
            let client = client_for(&config, &request.chain_id.resolve())?;
            let resolved = session.resolve(&request, &client).await?;
            let signed = session.sign(&request, &resolved, &*provider).await?;

            let mut output = json!({ "signed": serde_json::to_value(&signed)? });
            if session.should_broadcast(&request) {
                let outcome = session.broadcast(&request, &signed, &client, &notifier).await?;
                output["broadcast"] = serde_json::to_value(&outcome.result)?;
                output["callback"] = match outcome.callback {
                    Some(Ok(delivered)) => serde_json::to_value(delivered)?,
                    Some(Err(e)) => json!({ "error": e.to_string() }),
                    None => serde_json::Value::Null,
                };
            }
            print_json(&output)?;
        }
    }

    Ok(())
}

fn session_options(config: &EsrConfig, broadcast: bool) -> SessionOptions {
    SessionOptions {
        expire_in_seconds: config.connection.expire_in_seconds,
        broadcast: broadcast && config.connection.broadcast,
    }
}

fn wallet(config: &EsrConfig) -> CliResult<&WalletContext> {
    config
        .wallet
        .as_ref()
        .ok_or_else(|| "no [wallet] section in configuration".into())
}

fn client_for(config: &EsrConfig, chain_id: &ChainId) -> CliResult<ChainClient> {
    let blockchain = config
        .blockchain(chain_id)
        .ok_or_else(|| format!("no node configured for chain {chain_id}"))?;
    tracing::debug!(chain = %blockchain.name, node = %blockchain.node, "using chain node");
    Ok(ChainClient::new(&blockchain.node, config.connection.request_timeout())?)
}

fn read_document(path: &Path) -> CliResult<RequestDocument> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_json(value: &serde_json::Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
