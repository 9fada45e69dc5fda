//! CLI entry point for poll-board
//!
//! Drives the poll board against a simulated chain whose state lives in a
//! JSON file, so polls, votes, and instructors persist between invocations.
//!
//! # Usage
//!
//! Deploy a contract and create a poll as its owner:
//! ```bash
//! poll-board init --owner 0x1111111111111111111111111111111111111111
//! poll-board create "Lunch?" Pizza Tacos
//! ```
//!
//! Vote as someone else:
//! ```bash
//! poll-board --account 0x2222222222222222222222222222222222222222 vote 0 1
//! poll-board list
//! ```

mod output;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use poll_client::config::CONFIG_FILE;
use poll_client::{logging, Action, ClientConfig, CreatePollForm, PollBoard};
use poll_core::{Address, ChainId, PollId, Wallet, WalletEvent};
use poll_sim::{ContractShape, SimChain, SimWallet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default simulated chain state file.
const STATE_FILE: &str = "poll-board-chain.json";

#[derive(Parser)]
#[command(name = "poll-board")]
#[command(about = "On-chain poll board over a simulated wallet and chain", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Simulated chain state file
    #[arg(long, global = true, default_value = STATE_FILE)]
    state: PathBuf,

    /// Wallet account; defaults to the contract owner
    #[arg(long, global = true)]
    account: Option<Address>,

    /// Chain the wallet starts on (id, decimal or 0x-hex)
    #[arg(long, global = true)]
    wallet_chain: Option<ChainId>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a fresh contract into the state file
    Init {
        /// Contract owner
        #[arg(long)]
        owner: Address,

        /// Which contract revision to deploy
        #[arg(long, default_value_t = ContractShape::Full)]
        shape: ContractShape,

        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Show the board
    List,

    /// Vote for an option
    Vote {
        /// Poll index
        poll: u64,
        /// Option index
        option: u64,
    },

    /// Create a poll (owner or instructor)
    Create {
        /// Question text
        question: String,
        /// Two to ten options
        options: Vec<String>,
    },

    /// Close a poll (owner or instructor)
    Close {
        /// Poll index
        poll: u64,
    },

    /// Manage instructors (owner)
    #[command(subcommand)]
    Instructor(InstructorCommands),

    /// Show instructors replayed from contract events
    Roster,

    /// Show creation and vote history of a poll
    Activity {
        /// Poll index
        poll: u64,
    },

    /// Switch the wallet to the configured network, adding it if needed
    SwitchNetwork,
}

#[derive(Subcommand)]
enum InstructorCommands {
    /// Grant instructor rights
    Add {
        /// Account address
        address: String,
    },
    /// Revoke instructor rights
    Remove {
        /// Account address
        address: String,
    },
}

/// Wallet and state options shared by every board command.
struct WalletOptions {
    state: PathBuf,
    account: Option<Address>,
    wallet_chain: Option<ChainId>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        config: config_path,
        state,
        account,
        wallet_chain,
        verbose,
        command,
    } = Cli::parse();

    let mut config = ClientConfig::load_from(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    if verbose {
        config.logging.level = "debug".to_string();
    }
    config.validate()?;
    logging::init(&config.logging).map_err(anyhow::Error::msg)?;

    let options = WalletOptions {
        state,
        account,
        wallet_chain,
    };
    match command {
        Commands::Init {
            owner,
            shape,
            force,
        } => init_chain(&options.state, &config, owner, shape, force),
        command => run(&options, config, command).await,
    }
}

fn init_chain(
    state: &Path,
    config: &ClientConfig,
    owner: Address,
    shape: ContractShape,
    force: bool,
) -> Result<()> {
    if state.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            state.display()
        );
    }
    let contract = config.contract()?;
    let chain = SimChain::deploy(config.network.chain_id, contract, owner, shape);
    chain.save(state)?;
    tracing::info!(%contract, %owner, %shape, "Deployed contract");
    println!(
        "Deployed {shape} poll contract {contract} on {} (owner {owner})",
        config.network.chain_name
    );
    Ok(())
}

async fn run(options: &WalletOptions, config: ClientConfig, command: Commands) -> Result<()> {
    let chain = Arc::new(SimChain::load(&options.state).with_context(|| {
        format!(
            "loading chain state from {} (run `poll-board init` first)",
            options.state.display()
        )
    })?);
    let account = options.account.unwrap_or(chain.snapshot().owner);

    let mut wallet = SimWallet::new(chain.clone(), account).with_authorization();
    if let Some(chain_id) = options.wallet_chain {
        wallet = wallet.on_chain(chain_id);
    }
    let wallet = Arc::new(wallet);
    let board = PollBoard::new(config, Some(wallet.clone() as Arc<dyn Wallet>));

    let view = board.connect().await?;
    println!("{}\n", output::header(&view));

    match command {
        Commands::Init { .. } => bail!("init runs without a wallet session"),
        Commands::List => println!("{}", output::body(&view)),
        Commands::Vote { poll, option } => {
            act(
                &board,
                Action::Vote {
                    poll: PollId(poll),
                    option,
                },
            )
            .await?;
        }
        Commands::Create {
            question,
            options: choices,
        } => {
            let mut form = CreatePollForm::new();
            form.question = question;
            for index in 0..form.rows().len() {
                form.set_option(index, "")?;
            }
            for (index, text) in choices.into_iter().enumerate() {
                if index >= form.rows().len() {
                    form.add_option()?;
                }
                form.set_option(index, text)?;
            }
            act(&board, Action::create_from_form(&form)?).await?;
        }
        Commands::Close { poll } => act(&board, Action::ClosePoll(PollId(poll))).await?,
        Commands::Instructor(InstructorCommands::Add { address }) => {
            act(&board, Action::add_instructor(&address)?).await?;
        }
        Commands::Instructor(InstructorCommands::Remove { address }) => {
            act(&board, Action::remove_instructor(&address)?).await?;
        }
        Commands::Roster => println!("{}", output::roster(&board.roster().await?)),
        Commands::Activity { poll } => {
            println!("{}", output::activity(&board.activity(PollId(poll)).await?));
        }
        Commands::SwitchNetwork => {
            board.switch_network().await?;
            let view = board
                .handle_wallet_event(WalletEvent::ChainChanged(wallet.active_chain()))
                .await;
            println!("{}\n\n{}", output::header(&view), output::body(&view));
        }
    }

    chain.save(&options.state)?;
    Ok(())
}

/// Dispatch one action and print its status line and the refreshed board.
async fn act(board: &PollBoard, action: Action) -> Result<()> {
    let origin = action.origin();
    let result = board.dispatch(action).await;
    println!("{}", output::status(&board.status(origin)));
    result?;
    println!("\n{}", output::body(&board.view()));
    Ok(())
}
