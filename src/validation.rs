//! Request payload validation for the registry endpoints
//!
//! Mirrors the insert schemas of the relational store: required fields must be
//! present and non-empty, amounts must be positive, wallet addresses must be
//! 20-byte hex strings.

use crate::error::FieldError;
use crate::types::{MarketPatch, NewBet, NewMarket, NewUser};
use crate::wallet::is_wallet_address;
use chrono::Utc;
use rust_decimal::Decimal;

fn require_text(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "Required"));
    }
}

fn check_wallet(errors: &mut Vec<FieldError>, field: &str, value: Option<&str>) {
    if let Some(address) = value {
        if !is_wallet_address(address) {
            errors.push(FieldError::new(field, "Invalid wallet address"));
        }
    }
}

pub fn validate_new_market(market: &NewMarket) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    require_text(&mut errors, "title", &market.title);
    require_text(&mut errors, "category", &market.category);
    if market.creator_id <= 0 {
        errors.push(FieldError::new("creatorId", "Must be a positive id"));
    }
    if market.end_date <= Utc::now() {
        errors.push(FieldError::new("endDate", "End date must be in the future"));
    }
    check_wallet(&mut errors, "contractAddress", market.contract_address.as_deref());
    finish(errors)
}

pub fn validate_market_patch(patch: &MarketPatch) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if let Some(title) = &patch.title {
        require_text(&mut errors, "title", title);
    }
    if let Some(category) = &patch.category {
        require_text(&mut errors, "category", category);
    }
    check_wallet(&mut errors, "contractAddress", patch.contract_address.as_deref());
    finish(errors)
}

pub fn validate_new_bet(bet: &NewBet) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if bet.user_id <= 0 {
        errors.push(FieldError::new("userId", "Must be a positive id"));
    }
    if bet.amount <= Decimal::ZERO {
        errors.push(FieldError::new("amount", "Amount must be greater than zero"));
    }
    if let Some(block) = bet.block_number {
        if block < 0 {
            errors.push(FieldError::new("blockNumber", "Must not be negative"));
        }
    }
    finish(errors)
}

pub fn validate_new_user(user: &NewUser) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    match user.wallet_address.as_deref() {
        Some(address) => check_wallet(&mut errors, "walletAddress", Some(address)),
        None if user.username.is_none() => {
            errors.push(FieldError::new("walletAddress", "Required"));
        }
        None => {}
    }
    if let Some(username) = &user.username {
        require_text(&mut errors, "username", username);
    }
    if user.password.is_some() && user.username.is_none() {
        errors.push(FieldError::new("username", "Required when a password is set"));
    }
    finish(errors)
}

fn finish(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
