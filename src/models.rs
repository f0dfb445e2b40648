// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub r#type: String,
    pub currency: String,
}

/// Category type tag. Unset on a category means "inherit from the
/// nearest ancestor that has one".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Necessity,
    Extra,
    Investment,
    Transfer,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Necessity => "necessity",
            CategoryType::Extra => "extra",
            CategoryType::Investment => "investment",
            CategoryType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "necessity" => Ok(CategoryType::Necessity),
            "extra" => Ok(CategoryType::Extra),
            "investment" => Ok(CategoryType::Investment),
            "transfer" => Ok(CategoryType::Transfer),
            other => Err(format!(
                "Unknown category type '{}', expected necessity|extra|investment|transfer",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub category_type: Option<CategoryType>,
    pub is_shared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: Option<i64>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub payee: Option<String>,
    pub category_id: Option<i64>,
    pub is_shared: bool,
    pub split_percentage: Decimal, // 0..=100, the owner's share of the cost
    pub is_classified: bool,
    pub confidence: Option<u8>, // 0..=100
    pub notes: Option<String>,
}

/// One debt record between the two partners, derived from a single
/// shared transaction. Never deleted; settlement only closes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub id: i64,
    pub debtor_user_id: i64,
    pub creditor_user_id: i64,
    pub amount: Decimal, // always > 0
    pub description: String,
    pub transaction_id: Option<i64>,
    pub is_settled: bool,
    pub settled_date: Option<NaiveDate>,
}
