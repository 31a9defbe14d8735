//! Client-side form validation for market creation, betting and governance

use crate::contracts::{ProposalType, VoteChoice};
use crate::error::FieldError;
use crate::types::{NewMarket, Position};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Market categories offered by the creation form, as (value, label)
pub const CATEGORIES: [(&str, &str); 8] = [
    ("cryptocurrency", "Cryptocurrency"),
    ("politics", "Politics"),
    ("technology", "Technology"),
    ("sports", "Sports"),
    ("entertainment", "Entertainment"),
    ("economy", "Economy"),
    ("science", "Science"),
    ("other", "Other"),
];

pub fn category_label(value: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, label)| *label)
}

/// Why a form could not be submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// No wallet connected; the message names the blocked action
    WalletRequired(String),
    Fields(Vec<FieldError>),
}

impl FormError {
    fn wallet(action: &str) -> Self {
        FormError::WalletRequired(format!("Please connect your wallet to {}.", action))
    }

    /// Text for a destructive toast
    pub fn message(&self) -> String {
        match self {
            FormError::WalletRequired(message) => message.clone(),
            FormError::Fields(fields) => fields
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for FormError {}

#[derive(Debug, Clone, Default)]
pub struct CreateMarketForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub end_date: Option<DateTime<Utc>>,
}

impl CreateMarketForm {
    pub fn validate(&self, wallet_connected: bool, now: DateTime<Utc>) -> Result<(), FormError> {
        if !wallet_connected {
            return Err(FormError::wallet("create a market"));
        }

        let mut errors = Vec::new();
        if self.title.trim().chars().count() < 10 {
            errors.push(FieldError::new("title", "Title must be at least 10 characters"));
        }
        if self.description.trim().chars().count() < 20 {
            errors.push(FieldError::new(
                "description",
                "Description must be at least 20 characters",
            ));
        }
        if category_label(&self.category).is_none() {
            errors.push(FieldError::new("category", "Please select a category"));
        }
        match self.end_date {
            None => errors.push(FieldError::new("endDate", "Please select an end date")),
            Some(end) if end <= now => {
                errors.push(FieldError::new("endDate", "End date must be in the future"))
            }
            Some(_) => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormError::Fields(errors))
        }
    }

    /// Validate and build the registry payload
    pub fn into_new_market(
        self,
        creator_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<NewMarket, FormError> {
        self.validate(creator_id.is_some(), now)?;
        let creator_id = creator_id.ok_or_else(|| FormError::wallet("create a market"))?;
        let end_date = self
            .end_date
            .ok_or_else(|| FormError::Fields(vec![FieldError::new("endDate", "Please select an end date")]))?;

        Ok(NewMarket {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            creator_id,
            contract_address: None,
            end_date,
            metadata: None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BetForm {
    pub position: Option<Position>,
    /// Raw text from the amount input
    pub amount: String,
}

impl BetForm {
    /// Returns the chosen side and a positive amount
    pub fn validate(&self, wallet_connected: bool) -> Result<(Position, Decimal), FormError> {
        if !wallet_connected {
            return Err(FormError::wallet("place a bet"));
        }

        let amount = self.amount.trim().parse::<Decimal>().ok().filter(|a| *a > Decimal::ZERO);
        match (self.position, amount) {
            (Some(position), Some(amount)) => Ok((position, amount)),
            _ => Err(FormError::Fields(vec![FieldError::new(
                "amount",
                "Please select a position and enter a valid amount.",
            )])),
        }
    }
}

pub fn validate_vote(wallet_connected: bool, choice: VoteChoice) -> Result<VoteChoice, FormError> {
    if wallet_connected {
        Ok(choice)
    } else {
        Err(FormError::wallet("vote on proposals"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProposalForm {
    pub title: String,
    pub description: String,
    pub kind: Option<ProposalType>,
}

impl ProposalForm {
    pub fn validate(&self, wallet_connected: bool) -> Result<ProposalType, FormError> {
        if !wallet_connected {
            return Err(FormError::wallet("create a proposal"));
        }

        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if self.description.trim().is_empty() {
            errors.push(FieldError::new("description", "Description is required"));
        }
        match (self.kind, errors.is_empty()) {
            (Some(kind), true) => Ok(kind),
            (None, _) => {
                errors.push(FieldError::new("type", "Please select a proposal type"));
                Err(FormError::Fields(errors))
            }
            (Some(_), false) => Err(FormError::Fields(errors)),
        }
    }
}
