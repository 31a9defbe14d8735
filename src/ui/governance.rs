//! Proposal card state

use super::display::{quorum_met, time_remaining, vote_split, Split};
use crate::contracts::{Proposal, ProposalStatus};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalView {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub kind_label: &'static str,
    pub status: ProposalStatus,
    pub votes_for: u128,
    pub votes_against: u128,
    pub split: Split,
    pub quorum_met: bool,
    pub time_remaining: String,
    /// Voting buttons are shown while the proposal is active and open
    pub can_vote: bool,
    /// Passed proposals, or active ones past their deadline with quorum
    pub can_execute: bool,
}

impl ProposalView {
    pub fn new(proposal: &Proposal, quorum: u128, now: DateTime<Utc>) -> Self {
        let open = proposal.end_time > now;
        let quorum_met = quorum_met(proposal.votes_for, proposal.votes_against, quorum);
        let can_execute = match proposal.status {
            ProposalStatus::Passed => true,
            ProposalStatus::Active => !open && quorum_met && proposal.votes_for > proposal.votes_against,
            ProposalStatus::Rejected | ProposalStatus::Executed => false,
        };

        Self {
            id: proposal.id,
            title: proposal.title.clone(),
            description: proposal.description.clone(),
            kind_label: proposal.kind.label(),
            status: proposal.status,
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
            split: vote_split(proposal.votes_for, proposal.votes_against),
            quorum_met,
            time_remaining: time_remaining(proposal.end_time, now),
            can_vote: proposal.status == ProposalStatus::Active && open,
            can_execute,
        }
    }
}

/// Header counters on the governance page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GovernanceStats {
    pub active: usize,
    pub total_votes: u128,
    pub quorum_reached: usize,
}

impl GovernanceStats {
    pub fn from_views(views: &[ProposalView]) -> Self {
        views.iter().fold(Self::default(), |mut stats, view| {
            if view.status == ProposalStatus::Active {
                stats.active += 1;
            }
            stats.total_votes += view.votes_for + view.votes_against;
            if view.quorum_met {
                stats.quorum_reached += 1;
            }
            stats
        })
    }
}
