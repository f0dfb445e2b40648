// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by the classification and ledger engines.
///
/// These are data-state violations, not transient faults: none of them
/// is retried. The CLI layer wraps them in `anyhow` for display.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No categories defined; run `splitledger init` first")]
    EmptyTaxonomy,

    #[error("Transaction {0} is not marked shared")]
    NotShared(i64),

    #[error("Transaction {0} is not classified yet")]
    NotClassified(i64),

    /// Internal consistency guard. The idempotency check in
    /// `record_if_shared` should make this unreachable.
    #[error("Balance entry already exists for transaction {0}")]
    DuplicateEntry(i64),

    #[error("No outstanding balance between users {0} and {1}")]
    NoOutstandingBalance(i64, i64),

    #[error("Settlement date {as_of} precedes latest shared transaction date {latest}")]
    InvalidDateOrder { as_of: NaiveDate, latest: NaiveDate },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
