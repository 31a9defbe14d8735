//! PredictChain CLI
//!
//! Browse markets, place bets, vote in governance and view profile rewards.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use predictchain::client::{DataClient, Toaster};
use predictchain::contracts::{
    ContractResult, Contracts, Dao, MarketContract, MarketFactory, NftRewards,
    ProposalType, RpcTransport, TxHandle, UserProfileContract, VoteChoice,
};
use predictchain::types::{MarketStatus, NewBet, NewUser, Position};
use predictchain::ui::{self, render};
use predictchain::{Config, MarketResult};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "predictchain")]
#[command(about = "Client for the PredictChain prediction market DAO")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Platform totals and featured markets
    Dashboard,

    /// List markets
    Markets {
        #[arg(short, long)]
        category: Option<String>,

        /// active, resolved or cancelled
        #[arg(short, long)]
        status: Option<MarketStatus>,
    },

    /// Show one market and its bets
    Market { id: i64 },

    /// Create a market in the registry
    CreateMarket {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        category: String,

        /// Days until betting closes
        #[arg(long, default_value = "30")]
        days: i64,

        /// Deploy through the market factory contract instead
        #[arg(long)]
        onchain: bool,
    },

    /// Bet on a market
    Bet {
        market_id: i64,

        /// yes or no
        position: Position,

        /// Stake in ETH
        amount: String,

        /// Send the stake to this market contract as well
        #[arg(long)]
        contract: Option<Address>,
    },

    /// Settle a market
    Resolve {
        id: i64,

        /// yes, no or cancelled
        result: MarketResult,
    },

    /// Link the configured wallet to a new user
    Register {
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Profile statistics and achievements
    Profile {
        /// Defaults to the configured wallet
        address: Option<Address>,

        /// Read stats from the UserProfile contract
        #[arg(long)]
        onchain: bool,
    },

    /// NFT reward gallery
    Rewards {
        /// all, earned or available
        #[arg(short, long, default_value = "all")]
        filter: ui::GalleryFilter,
    },

    /// Active governance proposals
    Proposals,

    /// Vote on a proposal
    Vote {
        proposal_id: u64,

        /// for or against
        choice: VoteChoice,
    },

    /// Submit a governance proposal
    Propose {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        /// PLATFORM_UPGRADE, PARAMETER_CHANGE, TREASURY_ALLOCATION or MARKET_APPROVAL
        #[arg(short = 'k', long = "type")]
        kind: Option<ProposalType>,
    },

    /// Execute a passed proposal
    Execute { proposal_id: u64 },

    /// Claim winnings, or a refund from a cancelled market
    Claim {
        market: Address,

        #[arg(long)]
        refund: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let data = DataClient::from_config(&config)?;
    let transport = RpcTransport::from_config(&config)?;
    let contracts = Contracts::new(Arc::new(transport), config.contracts.clone());
    let app = App {
        config,
        data,
        contracts,
    };

    let outcome = match cli.command {
        Commands::Dashboard => app.dashboard().await,
        Commands::Markets { category, status } => app.markets(category, status).await,
        Commands::Market { id } => app.market(id).await,
        Commands::CreateMarket {
            title,
            description,
            category,
            days,
            onchain,
        } => {
            let form = ui::CreateMarketForm {
                title,
                description,
                category,
                end_date: Some(Utc::now() + Duration::days(days)),
            };
            app.create_market(form, onchain).await
        }
        Commands::Bet {
            market_id,
            position,
            amount,
            contract,
        } => {
            let form = ui::BetForm {
                position: Some(position),
                amount,
            };
            app.bet(market_id, form, contract).await
        }
        Commands::Resolve { id, result } => app.resolve(id, result).await,
        Commands::Register { username } => app.register(username).await,
        Commands::Profile { address, onchain } => app.profile(address, onchain).await,
        Commands::Rewards { filter } => app.rewards(filter).await,
        Commands::Proposals => app.proposals().await,
        Commands::Vote {
            proposal_id,
            choice,
        } => app.vote(proposal_id, choice).await,
        Commands::Propose {
            title,
            description,
            kind,
        } => {
            let form = ui::ProposalForm {
                title,
                description,
                kind,
            };
            app.propose(form).await
        }
        Commands::Execute { proposal_id } => app.execute(proposal_id).await,
        Commands::Claim { market, refund } => app.claim(market, refund).await,
    };

    // Failures have already been reported as toasts
    print_toasts(app.data.toaster()).await;
    outcome
}

struct App {
    config: Config,
    data: DataClient,
    contracts: Contracts<RpcTransport>,
}

impl App {
    fn wallet(&self) -> Option<Address> {
        self.config.wallet_address
    }

    fn toaster(&self) -> &Arc<Toaster> {
        self.data.toaster()
    }

    /// Registry user for the configured wallet
    async fn current_user_id(&self) -> Result<Option<i64>> {
        let Some(wallet) = self.wallet() else {
            return Ok(None);
        };
        let user = self.data.user_by_wallet(&format!("{:?}", wallet)).await?;
        Ok(user.map(|u| u.id))
    }

    async fn dashboard(&self) -> Result<()> {
        let markets = self.data.markets(None, None).await?;
        let now = Utc::now();

        let stats = ui::DashboardStats::from_markets(&markets);
        let featured: Vec<_> = ui::featured_markets(&markets, 3)
            .into_iter()
            .map(|m| ui::MarketCardView::new(m, now))
            .collect();

        banner("PREDICTCHAIN DAO");
        println!("{}", render::dashboard(&stats, &featured));
        Ok(())
    }

    async fn markets(&self, category: Option<String>, status: Option<MarketStatus>) -> Result<()> {
        let markets = self.data.markets(category.as_deref(), status).await?;
        let now = Utc::now();
        let cards: Vec<_> = markets
            .iter()
            .map(|m| ui::MarketCardView::new(m, now))
            .collect();
        println!("{}", render::market_list(&cards));
        Ok(())
    }

    async fn market(&self, id: i64) -> Result<()> {
        let Some(market) = self.data.market(id).await? else {
            println!("No market selected.");
            return Ok(());
        };
        let bets = self.data.market_bets(id).await?.unwrap_or_default();

        println!("{}", render::market_card(&ui::MarketCardView::new(&market, Utc::now())));
        println!("{}\n", market.description);
        if let Some(address) = &market.contract_address {
            println!("Contract: {}\n", address);
        }
        println!("{}", render::bets(&bets));
        Ok(())
    }

    async fn create_market(&self, form: ui::CreateMarketForm, onchain: bool) -> Result<()> {
        let now = Utc::now();
        let creator = self.current_user_id().await?;
        if self.wallet().is_some() && creator.is_none() {
            warn!("Wallet is not registered; run `predictchain register` first");
        }

        let new_market = match form.into_new_market(creator, now) {
            Ok(market) => market,
            Err(e) => return self.form_failed("Invalid Market", e).await,
        };

        if onchain {
            let result = async {
                self.contracts
                    .factory()?
                    .create_market(
                        &new_market.title,
                        &new_market.description,
                        &new_market.category,
                        new_market.end_date,
                    )
                    .await
            }
            .await;
            return self
                .report_tx("Market Created", "Market deployment submitted", "Creation Failed", result)
                .await;
        }

        let market = self.data.create_market(&new_market).await?;
        println!("{}", render::market_card(&ui::MarketCardView::new(&market, now)));
        Ok(())
    }

    async fn bet(&self, market_id: i64, form: ui::BetForm, contract: Option<Address>) -> Result<()> {
        let (position, amount) = match form.validate(self.wallet().is_some()) {
            Ok(bet) => bet,
            Err(e) => return self.form_failed("Invalid Bet", e).await,
        };

        if let Some(address) = contract {
            let result = self.place_onchain_bet(address, position, amount).await;
            self.report_tx(
                "Bet Placed",
                &format!("Placed {} ETH on {}", amount, position),
                "Bet Failed",
                result,
            )
            .await?;
        }

        let Some(user_id) = self.current_user_id().await? else {
            anyhow::bail!("Wallet is not registered; run `predictchain register` first");
        };
        let bet = self
            .data
            .place_bet(
                market_id,
                &NewBet {
                    market_id,
                    user_id,
                    position,
                    amount,
                    tx_hash: None,
                    block_number: None,
                },
            )
            .await?;
        println!("{}", render::bets(std::slice::from_ref(&bet)));
        Ok(())
    }

    async fn place_onchain_bet(&self, address: Address, position: Position, amount: Decimal) -> ContractResult<TxHandle> {
        self.contracts.market(address)?.place_bet(position, amount).await
    }

    async fn resolve(&self, id: i64, result: MarketResult) -> Result<()> {
        let market = self.data.resolve_market(id, result).await?;
        println!("{}", render::market_card(&ui::MarketCardView::new(&market, Utc::now())));
        Ok(())
    }

    async fn register(&self, username: Option<String>) -> Result<()> {
        let wallet = self
            .wallet()
            .context("Set WALLET_ADDRESS to register a wallet")?;
        let user = self
            .data
            .create_user(&NewUser {
                wallet_address: Some(format!("{:?}", wallet)),
                username,
                password: None,
            })
            .await?;
        println!("Registered user #{} for {}", user.id, predictchain::wallet::shorten_address(&format!("{:?}", wallet)));
        Ok(())
    }

    async fn profile(&self, address: Option<Address>, onchain: bool) -> Result<()> {
        let address = address
            .or(self.wallet())
            .context("Pass an address or set WALLET_ADDRESS")?;
        let display = format!("{:?}", address);

        let profile = if onchain {
            let stats = async { self.contracts.user_profile()?.user_stats(address).await };
            match stats.await {
                Ok(stats) => ui::DerivedProfile::from_stats(&stats),
                Err(e) => {
                    warn!("{}", e.user_message());
                    ui::DerivedProfile::from_address(&display)
                }
            }
        } else {
            ui::DerivedProfile::from_address(&display)
        };

        println!("{}", render::profile(&display, &profile));
        Ok(())
    }

    async fn rewards(&self, filter: ui::GalleryFilter) -> Result<()> {
        let earned = match self.wallet() {
            Some(wallet) => {
                let milestones = async { self.contracts.nft_rewards()?.user_milestones(wallet).await };
                milestones.await.unwrap_or_else(|e| {
                    warn!("{}", e.user_message());
                    Vec::new()
                })
            }
            None => Vec::new(),
        };

        let gallery = ui::Gallery::new(&earned);
        println!("{}", render::gallery(&gallery, filter));
        Ok(())
    }

    async fn proposals(&self) -> Result<()> {
        let dao = self.contracts.dao()?;
        let (proposals, quorum) = futures::try_join!(dao.active_proposals(), dao.quorum())?;
        let now = Utc::now();

        let views: Vec<_> = proposals
            .iter()
            .map(|p| ui::ProposalView::new(p, quorum, now))
            .collect();
        let stats = ui::GovernanceStats::from_views(&views);

        banner("GOVERNANCE");
        println!(
            "Active: {} | Total votes: {} | Quorum reached: {}\n",
            stats.active, stats.total_votes, stats.quorum_reached
        );
        if views.is_empty() {
            println!("No active proposals.");
        }
        for view in &views {
            println!("{}", render::proposal_card(view));
        }

        if let Some(wallet) = self.wallet() {
            match dao.voting_power(wallet).await {
                Ok(power) => println!("Your voting power: {}", power),
                Err(e) => debug!("Voting power unavailable: {}", e),
            }
        }
        Ok(())
    }

    async fn vote(&self, proposal_id: u64, choice: VoteChoice) -> Result<()> {
        let choice = match ui::validate_vote(self.wallet().is_some(), choice) {
            Ok(choice) => choice,
            Err(e) => return self.form_failed("Connect Wallet", e).await,
        };

        let result = async { self.contracts.dao()?.vote(proposal_id, choice).await }.await;
        self.report_tx(
            "Vote Cast",
            &format!("Successfully voted {} on proposal #{}", choice, proposal_id),
            "Vote Failed",
            result,
        )
        .await
    }

    async fn propose(&self, form: ui::ProposalForm) -> Result<()> {
        let kind = match form.validate(self.wallet().is_some()) {
            Ok(kind) => kind,
            Err(e) => return self.form_failed("Invalid Proposal", e).await,
        };

        let result = async {
            self.contracts
                .dao()?
                .create_proposal(&form.title, &form.description, kind)
                .await
        }
        .await;
        self.report_tx("Proposal Created", &format!("{} submitted", kind.label()), "Proposal Failed", result)
            .await
    }

    async fn execute(&self, proposal_id: u64) -> Result<()> {
        let result = async { self.contracts.dao()?.execute_proposal(proposal_id).await }.await;
        self.report_tx(
            "Proposal Executed",
            &format!("Proposal #{} executed", proposal_id),
            "Execution Failed",
            result,
        )
        .await
    }

    async fn claim(&self, market: Address, refund: bool) -> Result<()> {
        let result = async {
            let contract = self.contracts.market(market)?;
            if refund {
                contract.claim_refund().await
            } else {
                contract.claim_winnings().await
            }
        }
        .await;
        let title = if refund { "Refund Claimed" } else { "Winnings Claimed" };
        self.report_tx(title, "Funds are on their way to your wallet", "Claim Failed", result)
            .await
    }

    async fn form_failed(&self, title: &str, error: ui::FormError) -> Result<()> {
        self.toaster().error(title, error.message()).await;
        Err(error.into())
    }

    /// Toast the outcome of a contract write
    async fn report_tx(
        &self,
        success: &str,
        description: &str,
        failure: &str,
        result: ContractResult<TxHandle>,
    ) -> Result<()> {
        match result {
            Ok(tx) => {
                self.toaster()
                    .success(success, format!("{} (tx {})", description, tx))
                    .await;
                Ok(())
            }
            Err(e) => {
                self.toaster().error(failure, e.user_message()).await;
                Err(anyhow::Error::new(e))
            }
        }
    }
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(70));
    println!("  {}", title);
    println!("{}\n", "=".repeat(70));
}

async fn print_toasts(toaster: &Toaster) {
    for toast in toaster.drain().await {
        println!("{}", render::toast(&toast));
    }
}
