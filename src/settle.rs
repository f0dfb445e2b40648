// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::ledger::{Household, unsettled_between};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

/// Outcome of closing the outstanding entries between the pair.
/// `debtor`/`creditor` are `None` when the settlement was a wash.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementResult {
    pub closed_entries: usize,
    pub net_amount: Decimal,
    pub debtor: Option<i64>,
    pub creditor: Option<i64>,
    pub settled_date: NaiveDate,
}

/// Close every unsettled balance entry between the household pair as a
/// single unit, recording `as_of` as the settlement date.
///
/// All entries close together or none do; a zero net still closes the
/// selected entries (a wash) without money changing hands.
pub fn settle(
    conn: &mut Connection,
    household: &Household,
    as_of: NaiveDate,
) -> Result<SettlementResult, LedgerError> {
    let txn = conn.transaction()?;

    let entries = unsettled_between(&txn, household.user_a, household.user_b)?;
    if entries.is_empty() {
        return Err(LedgerError::NoOutstandingBalance(
            household.user_a,
            household.user_b,
        ));
    }

    // Settling before the debts existed would misdate the ledger.
    let latest: Option<NaiveDate> = txn.query_row(
        "SELECT MAX(t.date) FROM balance_entries b
         JOIN transactions t ON b.transaction_id = t.id
         WHERE b.is_settled=0
           AND ((b.debtor_user_id=?1 AND b.creditor_user_id=?2)
             OR (b.debtor_user_id=?2 AND b.creditor_user_id=?1))",
        params![household.user_a, household.user_b],
        |r| r.get(0),
    )?;
    if let Some(latest) = latest {
        if as_of < latest {
            return Err(LedgerError::InvalidDateOrder { as_of, latest });
        }
    }

    let mut net = Decimal::ZERO;
    for e in &entries {
        if e.debtor_user_id == household.user_a {
            net += e.amount;
        } else {
            net -= e.amount;
        }
    }

    let closed = txn.execute(
        "UPDATE balance_entries SET is_settled=1, settled_date=?1
         WHERE is_settled=0
           AND ((debtor_user_id=?2 AND creditor_user_id=?3)
             OR (debtor_user_id=?3 AND creditor_user_id=?2))",
        params![as_of, household.user_a, household.user_b],
    )?;
    txn.commit()?;

    let (debtor, creditor) = if net > Decimal::ZERO {
        (Some(household.user_a), Some(household.user_b))
    } else if net < Decimal::ZERO {
        (Some(household.user_b), Some(household.user_a))
    } else {
        (None, None)
    };
    Ok(SettlementResult {
        closed_entries: closed,
        net_amount: net.abs(),
        debtor,
        creditor,
        settled_date: as_of,
    })
}
