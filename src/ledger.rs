// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::models::{BalanceEntry, Transaction};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::{Decimal, RoundingStrategy};

/// The two-partner household, passed explicitly so the engine never
/// leans on process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Household {
    pub user_a: i64,
    pub user_b: i64,
}

impl Household {
    pub fn new(user_a: i64, user_b: i64) -> Result<Household, LedgerError> {
        if user_a == user_b {
            return Err(LedgerError::InvalidInput(
                "Household partners must be distinct users".into(),
            ));
        }
        Ok(Household { user_a, user_b })
    }

    /// Load the household from the users table, which must hold exactly
    /// two users.
    pub fn load(conn: &Connection) -> Result<Household, LedgerError> {
        let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
        let ids: Vec<i64> = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        match ids.as_slice() {
            [a, b] => Household::new(*a, *b),
            _ => Err(LedgerError::InvalidInput(format!(
                "Household needs exactly two users, found {}",
                ids.len()
            ))),
        }
    }

    pub fn contains(&self, user_id: i64) -> bool {
        user_id == self.user_a || user_id == self.user_b
    }

    pub fn partner_of(&self, user_id: i64) -> Result<i64, LedgerError> {
        if user_id == self.user_a {
            Ok(self.user_b)
        } else if user_id == self.user_b {
            Ok(self.user_a)
        } else {
            Err(LedgerError::InvalidInput(format!(
                "User {} is not part of the household",
                user_id
            )))
        }
    }
}

/// The non-owning partner's share of a transaction:
/// `|amount| * (100 - split) / 100`, rounded half-to-even to 2dp so many
/// small splits don't drift in one partner's favor.
pub fn shared_portion(amount: Decimal, split_percentage: Decimal) -> Decimal {
    let hundred = Decimal::from(100);
    let mut share = (amount.abs() * (hundred - split_percentage) / hundred)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    // Pin the scale so stored amounts always read "12.50", not "12.5".
    share.rescale(2);
    share
}

/// Derive the balance entry a shared classified transaction owes the
/// payer, creating it at most once.
///
/// Returns the existing entry unchanged if one already references the
/// transaction, and `None` when the rounded share is zero.
pub fn record_if_shared(
    conn: &Connection,
    household: &Household,
    tx: &Transaction,
) -> Result<Option<BalanceEntry>, LedgerError> {
    if !tx.is_shared {
        return Err(LedgerError::NotShared(tx.id));
    }
    if !tx.is_classified {
        return Err(LedgerError::NotClassified(tx.id));
    }
    if tx.split_percentage < Decimal::ZERO || tx.split_percentage > Decimal::from(100) {
        return Err(LedgerError::InvalidInput(format!(
            "Split percentage {} out of range 0-100",
            tx.split_percentage
        )));
    }
    let debtor = household.partner_of(tx.user_id)?;

    if let Some(existing) = entry_for_transaction(conn, tx.id)? {
        return Ok(Some(existing));
    }

    let share = shared_portion(tx.amount, tx.split_percentage);
    if share.is_zero() {
        return Ok(None);
    }

    let description = format!("Shared expense portion: {}", tx.description);
    let inserted = conn.execute(
        "INSERT INTO balance_entries(debtor_user_id, creditor_user_id, amount, description, transaction_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![debtor, tx.user_id, share.to_string(), description, tx.id],
    );
    match inserted {
        Ok(_) => {}
        // UNIQUE(transaction_id) is the at-most-once backstop.
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(LedgerError::DuplicateEntry(tx.id));
        }
        Err(e) => return Err(e.into()),
    }
    let entry = entry_for_transaction(conn, tx.id)?
        .ok_or_else(|| LedgerError::InvalidInput(format!("Entry for {} vanished", tx.id)))?;
    Ok(Some(entry))
}

/// Recompute the open entry's amount after the transaction's split
/// changed, keeping entry and transaction in step.
///
/// Returns `None` when no entry references the transaction. A settled
/// entry is immutable and rejected; a split that leaves no partner
/// share is rejected rather than zeroing the entry, since entries are
/// closed, never shrunk to nothing.
pub fn resync_shared_entry(
    conn: &Connection,
    tx: &Transaction,
) -> Result<Option<BalanceEntry>, LedgerError> {
    let Some(entry) = entry_for_transaction(conn, tx.id)? else {
        return Ok(None);
    };
    if entry.is_settled {
        return Err(LedgerError::InvalidInput(format!(
            "Balance entry for transaction {} is settled and cannot change",
            tx.id
        )));
    }
    let share = shared_portion(tx.amount, tx.split_percentage);
    if share.is_zero() {
        return Err(LedgerError::InvalidInput(format!(
            "Split {}% leaves no partner share for transaction {}; settle the entry instead",
            tx.split_percentage, tx.id
        )));
    }
    conn.execute(
        "UPDATE balance_entries SET amount=?1 WHERE id=?2",
        params![share.to_string(), entry.id],
    )?;
    Ok(Some(BalanceEntry {
        amount: share,
        ..entry
    }))
}

/// Signed aggregate of unsettled entries: positive means `user_a` owes
/// `user_b`.
pub fn net_balance(conn: &Connection, user_a: i64, user_b: i64) -> Result<Decimal, LedgerError> {
    let mut net = Decimal::ZERO;
    for e in unsettled_between(conn, user_a, user_b)? {
        if e.debtor_user_id == user_a {
            net += e.amount;
        } else {
            net -= e.amount;
        }
    }
    Ok(net)
}

/// Unsettled entries between the pair, in either direction, ordered by id.
pub fn unsettled_between(
    conn: &Connection,
    user_a: i64,
    user_b: i64,
) -> Result<Vec<BalanceEntry>, LedgerError> {
    let mut stmt = conn.prepare(
        "SELECT id, debtor_user_id, creditor_user_id, amount, description, transaction_id, is_settled, settled_date
         FROM balance_entries
         WHERE is_settled=0
           AND ((debtor_user_id=?1 AND creditor_user_id=?2) OR (debtor_user_id=?2 AND creditor_user_id=?1))
         ORDER BY id",
    )?;
    let rows = stmt.query_map(params![user_a, user_b], entry_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn entry_for_transaction(
    conn: &Connection,
    transaction_id: i64,
) -> Result<Option<BalanceEntry>, LedgerError> {
    let mut stmt = conn.prepare(
        "SELECT id, debtor_user_id, creditor_user_id, amount, description, transaction_id, is_settled, settled_date
         FROM balance_entries WHERE transaction_id=?1",
    )?;
    Ok(stmt
        .query_row(params![transaction_id], entry_from_row)
        .optional()?)
}

/// Whether the transaction is referenced by a settled balance entry, in
/// which case it is immutable.
pub fn locked_by_settlement(conn: &Connection, transaction_id: i64) -> Result<bool, LedgerError> {
    let locked: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM balance_entries WHERE transaction_id=?1 AND is_settled=1)",
        params![transaction_id],
        |r| r.get(0),
    )?;
    Ok(locked)
}

pub fn fetch_transaction(conn: &Connection, id: i64) -> Result<Transaction, LedgerError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, account_id, date, amount, currency, description, payee, category_id,
                is_shared, split_percentage, is_classified, confidence, notes
         FROM transactions WHERE id=?1",
    )?;
    let tx = stmt
        .query_row(params![id], |r| {
            Ok(Transaction {
                id: r.get(0)?,
                user_id: r.get(1)?,
                account_id: r.get(2)?,
                date: r.get(3)?,
                amount: decimal_column(r, 4)?,
                currency: r.get(5)?,
                description: r.get(6)?,
                payee: r.get(7)?,
                category_id: r.get(8)?,
                is_shared: r.get(9)?,
                split_percentage: decimal_column(r, 10)?,
                is_classified: r.get(11)?,
                confidence: r.get(12)?,
                notes: r.get(13)?,
            })
        })
        .optional()?;
    tx.ok_or_else(|| LedgerError::InvalidInput(format!("Transaction {} not found", id)))
}

fn entry_from_row(r: &rusqlite::Row<'_>) -> Result<BalanceEntry, rusqlite::Error> {
    Ok(BalanceEntry {
        id: r.get(0)?,
        debtor_user_id: r.get(1)?,
        creditor_user_id: r.get(2)?,
        amount: decimal_column(r, 3)?,
        description: r.get(4)?,
        transaction_id: r.get(5)?,
        is_settled: r.get(6)?,
        settled_date: r.get(7)?,
    })
}

/// Amounts are stored as TEXT; parse failures surface as conversion
/// errors on the offending column.
fn decimal_column(r: &rusqlite::Row<'_>, idx: usize) -> Result<Decimal, rusqlite::Error> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
