//! Presentation layer
//!
//! Display-only derivations behind the market, governance, profile and reward
//! screens, plus the form checks run before anything is sent. Nothing here
//! persists state; [`render`] turns the views into terminal text for the CLI.

pub mod dashboard;
pub mod display;
pub mod forms;
pub mod governance;
pub mod profile;
pub mod render;
pub mod rewards;

pub use dashboard::{featured_markets, DashboardStats, MarketCardView};
pub use display::{
    days_left, days_left_label, format_eth, quorum_met, stake_split, status_badge, time_remaining,
    vote_split, Split,
};
pub use forms::{validate_vote, BetForm, CreateMarketForm, FormError, ProposalForm, CATEGORIES};
pub use governance::{GovernanceStats, ProposalView};
pub use profile::{wallet_hash, Achievement, DerivedProfile};
pub use rewards::{Gallery, GalleryFilter, GalleryItem, Rarity, RewardDefinition, CATALOG};
