//! Terminal rendering for the CLI

use super::dashboard::{DashboardStats, MarketCardView};
use super::governance::ProposalView;
use super::profile::DerivedProfile;
use super::rewards::{Gallery, GalleryFilter, Rarity};
use crate::client::{Toast, ToastVariant};
use crate::types::Bet;
use crate::wallet::shorten_address;
use colored::{ColoredString, Colorize};
use std::fmt::Write;

const WIDTH: usize = 70;

fn rule() -> String {
    "-".repeat(WIDTH)
}

fn badge(text: &str) -> ColoredString {
    match text {
        "Active" => text.green().bold(),
        "YES Won" => text.green(),
        "NO Won" => text.red(),
        _ => text.dimmed(),
    }
}

fn rarity(r: Rarity) -> ColoredString {
    let text = r.as_str();
    match r {
        Rarity::Common => text.white(),
        Rarity::Uncommon => text.green(),
        Rarity::Rare => text.blue(),
        Rarity::Epic => text.magenta(),
        Rarity::Legendary => text.yellow().bold(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

pub fn market_card(card: &MarketCardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} \"{}\"  [{}]", card.id, truncate(&card.title, 50), badge(card.badge));
    let _ = writeln!(
        out,
        "   {} | {} {}% / {} {}%",
        card.category.cyan(),
        "YES".green(),
        card.split.first,
        "NO".red(),
        card.split.second
    );
    let _ = writeln!(
        out,
        "   Volume: {} | Participants: {} | {}",
        card.volume, card.participants, card.time_left
    );
    out
}

pub fn market_list(cards: &[MarketCardView]) -> String {
    if cards.is_empty() {
        return "No markets found.\n".to_string();
    }
    let mut out = format!("MARKETS ({})\n{}\n", cards.len(), rule());
    for card in cards {
        out.push_str(&market_card(card));
        out.push('\n');
    }
    out
}

pub fn dashboard(stats: &DashboardStats, featured: &[MarketCardView]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "DASHBOARD".bold());
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Total Markets: {}", stats.total_markets);
    let _ = writeln!(out, "Total Volume:  {}", stats.volume_label());
    let _ = writeln!(out, "Active:        {}", stats.active_markets);
    let _ = writeln!(out, "Participants:  {}", stats.participants);
    if !featured.is_empty() {
        let _ = writeln!(out, "\nFEATURED\n{}", rule());
        for card in featured {
            out.push_str(&market_card(card));
        }
    }
    out
}

pub fn bets(bets: &[Bet]) -> String {
    if bets.is_empty() {
        return "No bets yet.\n".to_string();
    }
    let mut out = String::new();
    for bet in bets {
        let side = match bet.position {
            crate::types::Position::Yes => bet.position.to_string().green(),
            crate::types::Position::No => bet.position.to_string().red(),
        };
        let _ = writeln!(
            out,
            "   bet #{} market #{} user #{}: {} {} ETH{}",
            bet.id,
            bet.market_id,
            bet.user_id,
            side,
            bet.amount.normalize(),
            if bet.claimed { " (claimed)" } else { "" }
        );
    }
    out
}

pub fn proposal_card(view: &ProposalView) -> String {
    let mut out = String::new();
    let _ = write!(out, "#{} {} [{}] [{}]", view.id, view.title.bold(), view.kind_label, view.status);
    if view.quorum_met {
        let _ = write!(out, " {}", "Quorum Met".green());
    }
    out.push('\n');
    let _ = writeln!(out, "   {}", truncate(&view.description, 64));
    let _ = writeln!(
        out,
        "   {} {} ({}%) | {} {} ({}%) | {}",
        "For:".green(),
        view.votes_for,
        view.split.first,
        "Against:".red(),
        view.votes_against,
        view.split.second,
        view.time_remaining
    );
    if view.can_execute {
        let _ = writeln!(out, "   {}", "Ready to execute".yellow());
    }
    out
}

pub fn profile(address: &str, profile: &DerivedProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "PROFILE".bold(), shorten_address(address));
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Rank:        {} (level {})", profile.rank.cyan(), profile.level);
    let _ = writeln!(out, "XP to next:  {}", profile.xp_to_next_level);
    let _ = writeln!(
        out,
        "Predictions: {} ({} correct, {}% accuracy)",
        profile.total_predictions, profile.correct_predictions, profile.accuracy
    );
    let _ = writeln!(out, "Earnings:    {} ETH", profile.total_earnings);
    let _ = writeln!(out, "Reputation:  {}", profile.reputation);
    let _ = writeln!(out, "\nACHIEVEMENTS");
    for achievement in &profile.achievements {
        let mark = if achievement.unlocked {
            "✓".green()
        } else {
            "·".dimmed()
        };
        let _ = writeln!(out, " {} {} {}: {}", mark, achievement.icon, achievement.name, achievement.description);
    }
    out
}

pub fn gallery(gallery: &Gallery, filter: GalleryFilter) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "NFT REWARDS {}/{} collected ({}%)",
        gallery.earned_count(),
        gallery.total(),
        gallery.progress_percent()
    );
    let _ = writeln!(out, "{}", rule());
    for item in gallery.items(filter) {
        let reward = item.reward;
        let state = if item.earned {
            "earned".green()
        } else {
            "locked".dimmed()
        };
        let _ = writeln!(out, "{} {} [{}] [{}] {}", reward.image, reward.name.bold(), rarity(reward.rarity), reward.kind.as_str(), state);
        if item.earned {
            let _ = writeln!(out, "   {}", reward.description);
        } else {
            let _ = writeln!(out, "   Requirement: {}", reward.requirement);
        }
    }
    out
}

pub fn toast(toast: &Toast) -> String {
    match toast.variant {
        ToastVariant::Default => format!("{} {}", toast.title.green().bold(), toast.description),
        ToastVariant::Destructive => format!("{} {}", toast.title.red().bold(), toast.description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::dashboard::fixtures::market;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_market_card_lines() {
        plain();
        let card = MarketCardView::new(&market(4, (dec!(1), dec!(3)), 2), Utc::now());
        let text = market_card(&card);
        assert!(text.starts_with("#4 \"Market number 4\"  [Active]"));
        assert!(text.contains("YES 25% / NO 75%"));
        assert!(text.contains("Volume: 4 ETH | Participants: 2 | 10d left"));
        assert_eq!(market_list(&[]), "No markets found.\n");
    }

    #[test]
    fn test_profile_and_gallery() {
        plain();
        let text = profile("0x742d35Cc6634C0532925a3b844Bc454e4438f44e", &DerivedProfile::from_address("a"));
        assert!(text.contains("PROFILE 0x742d...f44e"));
        assert!(text.contains("Expert Predictor (level 7)"));

        let text = gallery(&Gallery::new(&[5]), GalleryFilter::Earned);
        assert!(text.starts_with("NFT REWARDS 1/8 collected (13%)"));
        assert!(text.contains("Market Maker"));
        assert!(!text.contains("Win Streak"));
    }

    #[test]
    fn test_toast() {
        plain();
        let t = Toast {
            title: "Bet Failed".to_string(),
            description: "Market is not accepting bets".to_string(),
            variant: ToastVariant::Destructive,
        };
        assert_eq!(toast(&t), "Bet Failed Market is not accepting bets");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long market title", 10), "a very ...");
    }
}
