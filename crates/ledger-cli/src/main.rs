use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{
    validate, Amount, ChainSnapshot, LedgerConfig, Node, PeerChainFetcher, ProofOfWork,
    RewardConfig, Transaction,
};
use ledger_net::HttpPeerFetcher;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Drive an in-process proof-of-work ledger")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Leading zero hex digits required by the puzzle (overrides config)
    #[arg(long, global = true)]
    difficulty: Option<usize>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine blocks on a fresh ledger and print the resulting chain
    Mine {
        /// Number of blocks to mine
        #[arg(long, default_value_t = 1)]
        blocks: usize,
        /// Transaction queued before the first block, as SENDER,RECEIVER,AMOUNT
        #[arg(long = "tx", value_parser = parse_transaction)]
        txs: Vec<Transaction>,
        /// Credit a mining reward to this receiver
        #[arg(long)]
        reward_to: Option<String>,
    },
    /// Check a chain snapshot ({"chain": [...], "length": n}) read from a file
    Validate {
        #[arg(long)]
        file: PathBuf,
    },
    /// Fetch a peer's chain and report whether it is valid
    Fetch {
        /// Peer URL or host:port
        #[arg(long)]
        peer: String,
    },
    /// Mine locally, then adopt the longest valid chain among peers
    Resolve {
        /// Peer URL or host:port (repeatable)
        #[arg(long = "peer", required = true)]
        peers: Vec<String>,
        /// Blocks to mine locally before resolving
        #[arg(long, default_value_t = 0)]
        blocks: usize,
    },
}

#[derive(Serialize)]
struct ResolveReport {
    replaced: bool,
    length: u64,
    valid: bool,
}

fn parse_transaction(raw: &str) -> Result<Transaction, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [sender, receiver, amount] = parts.as_slice() else {
        return Err(format!("expected SENDER,RECEIVER,AMOUNT, got {raw:?}"));
    };
    let amount = parse_amount(amount).ok_or_else(|| format!("invalid amount {amount:?}"))?;
    let tx = Transaction::new(*sender, *receiver, amount);
    tx.validate().map_err(|e| e.to_string())?;
    Ok(tx)
}

fn parse_amount(raw: &str) -> Option<Amount> {
    if let Ok(v) = raw.parse::<u64>() {
        return Some(Amount::from(v));
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Some(Amount::from(v));
    }
    raw.parse::<f64>().ok().and_then(Amount::from_f64)
}

fn load_config(cli: &Cli) -> Result<LedgerConfig> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::from_file(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    let fetcher = HttpPeerFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;

    match cli.cmd {
        Command::Mine {
            blocks,
            txs,
            reward_to,
        } => {
            if let Some(receiver) = reward_to {
                config.reward = Some(RewardConfig {
                    sender: None,
                    receiver,
                    amount: Amount::from(1u64),
                });
            }
            let node = Node::new(&config);
            for tx in txs {
                node.submit_transaction(tx.sender, tx.receiver, tx.amount);
            }
            for _ in 0..blocks {
                let block = node.mine().await?;
                info!(index = block.index, proof = block.proof, "mined");
            }
            print_json(&node.get_chain())?;
        }
        Command::Validate { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let snapshot: ChainSnapshot = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", file.display()))?;
            snapshot.check_length(&file.display().to_string())?;
            let pow = ProofOfWork::new(config.difficulty);
            match validate::validate_chain(&pow, &snapshot.chain) {
                Ok(()) => println!("valid ({} blocks)", snapshot.length),
                Err(violation) => bail!("invalid chain: {violation}"),
            }
        }
        Command::Fetch { peer } => {
            let authority = ledger_core::ledger::peer_authority(&peer)?;
            let snapshot = fetcher.fetch(&authority).await?;
            let pow = ProofOfWork::new(config.difficulty);
            match validate::validate_chain(&pow, &snapshot.chain) {
                Ok(()) => println!("{authority}: valid chain of {} blocks", snapshot.length),
                Err(violation) => bail!("{authority}: invalid chain: {violation}"),
            }
        }
        Command::Resolve { peers, blocks } => {
            let node = Node::new(&config);
            for peer in &peers {
                node.add_peer(peer)?;
            }
            for _ in 0..blocks {
                node.mine().await?;
            }
            let replaced = node.resolve_consensus(&fetcher).await;
            let snapshot = node.get_chain();
            print_json(&ResolveReport {
                replaced,
                length: snapshot.length,
                valid: node.check_valid(),
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transactions() {
        let tx = parse_transaction("A, B, 10").unwrap();
        assert_eq!(tx, Transaction::new("A", "B", Amount::from(10u64)));
        let tx = parse_transaction("A,B,2.5").unwrap();
        assert_eq!(tx.amount, Amount::from_f64(2.5).unwrap());
    }

    #[test]
    fn rejects_malformed_transactions() {
        assert!(parse_transaction("A,B").is_err());
        assert!(parse_transaction("A,B,ten").is_err());
        assert!(parse_transaction(",B,1").is_err());
        assert!(parse_transaction("A,B,-1").is_err());
    }
}
