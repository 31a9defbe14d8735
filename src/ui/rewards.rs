//! NFT reward catalog and gallery state

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    Achievement,
    Milestone,
    Seasonal,
    Special,
}

impl RewardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Achievement => "achievement",
            RewardKind::Milestone => "milestone",
            RewardKind::Seasonal => "seasonal",
            RewardKind::Special => "special",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardDefinition {
    /// Milestone id passed to `awardMilestone`
    pub milestone: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub image: &'static str,
    pub rarity: Rarity,
    pub kind: RewardKind,
    pub requirement: &'static str,
}

pub const CATALOG: [RewardDefinition; 8] = [
    RewardDefinition {
        milestone: 0,
        name: "First Prediction",
        description: "Commemorates your very first prediction on PredictChain DAO",
        image: "🎯",
        rarity: Rarity::Common,
        kind: RewardKind::Achievement,
        requirement: "Place your first bet",
    },
    RewardDefinition {
        milestone: 1,
        name: "Accuracy Master",
        description: "Achieved 80% accuracy rate over 25 predictions",
        image: "🏹",
        rarity: Rarity::Rare,
        kind: RewardKind::Achievement,
        requirement: "Reach 80% accuracy over 25 predictions",
    },
    RewardDefinition {
        milestone: 2,
        name: "Big Winner",
        description: "Won over 10 ETH from successful predictions",
        image: "💎",
        rarity: Rarity::Epic,
        kind: RewardKind::Milestone,
        requirement: "Win more than 10 ETH",
    },
    RewardDefinition {
        milestone: 3,
        name: "DAO Founder",
        description: "Early adopter badge for joining in the first 1000 users",
        image: "👑",
        rarity: Rarity::Legendary,
        kind: RewardKind::Special,
        requirement: "Be among the first 1000 users",
    },
    RewardDefinition {
        milestone: 4,
        name: "Governance Guardian",
        description: "Participated in 10+ DAO governance votes",
        image: "🛡️",
        rarity: Rarity::Rare,
        kind: RewardKind::Achievement,
        requirement: "Vote on 10 proposals",
    },
    RewardDefinition {
        milestone: 5,
        name: "Market Maker",
        description: "Created your first prediction market",
        image: "⚡",
        rarity: Rarity::Uncommon,
        kind: RewardKind::Achievement,
        requirement: "Create a prediction market",
    },
    RewardDefinition {
        milestone: 6,
        name: "Season 1 Champion",
        description: "Top 100 predictor in Season 1",
        image: "🏆",
        rarity: Rarity::Legendary,
        kind: RewardKind::Seasonal,
        requirement: "Finish in the top 100 this season",
    },
    RewardDefinition {
        milestone: 7,
        name: "Win Streak",
        description: "Achieved 5 consecutive correct predictions",
        image: "🔥",
        rarity: Rarity::Epic,
        kind: RewardKind::Achievement,
        requirement: "Win 5 predictions in a row",
    },
];

/// Gallery tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GalleryFilter {
    #[default]
    All,
    Earned,
    Available,
}

impl FromStr for GalleryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(GalleryFilter::All),
            "earned" => Ok(GalleryFilter::Earned),
            "available" => Ok(GalleryFilter::Available),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryItem {
    pub reward: &'static RewardDefinition,
    pub earned: bool,
}

/// Catalog joined with the milestones a wallet holds
#[derive(Debug, Clone)]
pub struct Gallery {
    items: Vec<GalleryItem>,
}

impl Gallery {
    pub fn new(earned_milestones: &[u8]) -> Self {
        let items = CATALOG
            .iter()
            .map(|reward| GalleryItem {
                reward,
                earned: earned_milestones.contains(&reward.milestone),
            })
            .collect();
        Self { items }
    }

    pub fn items(&self, filter: GalleryFilter) -> Vec<GalleryItem> {
        self.items
            .iter()
            .copied()
            .filter(|item| match filter {
                GalleryFilter::All => true,
                GalleryFilter::Earned => item.earned,
                GalleryFilter::Available => !item.earned,
            })
            .collect()
    }

    pub fn earned_count(&self) -> usize {
        self.items.iter().filter(|item| item.earned).count()
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Collection progress, rounded to a whole percent
    pub fn progress_percent(&self) -> u32 {
        if self.items.is_empty() {
            return 0;
        }
        ((self.earned_count() as f64 / self.total() as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_milestones_are_unique() {
        let mut ids: Vec<u8> = CATALOG.iter().map(|r| r.milestone).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_gallery_filters() {
        let gallery = Gallery::new(&[0, 1, 2, 42]);
        assert_eq!(gallery.total(), 8);
        assert_eq!(gallery.earned_count(), 3);
        assert_eq!(gallery.items(GalleryFilter::All).len(), 8);
        assert_eq!(gallery.items(GalleryFilter::Available).len(), 5);

        let earned: Vec<_> = gallery
            .items(GalleryFilter::Earned)
            .iter()
            .map(|item| item.reward.name)
            .collect();
        assert_eq!(earned, vec!["First Prediction", "Accuracy Master", "Big Winner"]);
    }

    #[test]
    fn test_progress() {
        assert_eq!(Gallery::new(&[]).progress_percent(), 0);
        assert_eq!(Gallery::new(&[0, 1, 2]).progress_percent(), 38);
        assert_eq!(Gallery::new(&[0, 1, 2, 3, 4, 5, 6, 7]).progress_percent(), 100);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("Earned".parse::<GalleryFilter>().unwrap(), GalleryFilter::Earned);
        assert!("mine".parse::<GalleryFilter>().is_err());
    }
}
