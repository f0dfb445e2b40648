// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::models::Transaction;
use crate::taxonomy::Taxonomy;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::collections::HashSet;

/// Minimum token-overlap similarity for a historical match to be reused.
pub const MIN_SIMILARITY: f64 = 0.5;

// Unicode-aware so accented letters survive normalization.
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// A previously classified transaction, as seen by the matcher.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub payee: Option<String>,
    pub category_id: i64,
}

/// Any source of prior classified transactions for a user. The SQLite
/// connection is the stock implementation; alternate matchers can bring
/// their own.
pub trait HistorySource {
    fn classified_history(&self, user_id: i64) -> Result<Vec<HistoryEntry>, LedgerError>;
}

impl HistorySource for Connection {
    fn classified_history(&self, user_id: i64) -> Result<Vec<HistoryEntry>, LedgerError> {
        let mut stmt = self.prepare(
            "SELECT id, date, description, payee, category_id FROM transactions
             WHERE user_id=?1 AND is_classified=1 AND category_id IS NOT NULL
             ORDER BY date DESC, id ASC",
        )?;
        let rows = stmt.query_map([user_id], |r| {
            Ok(HistoryEntry {
                id: r.get(0)?,
                date: r.get(1)?,
                description: r.get(2)?,
                payee: r.get(3)?,
                category_id: r.get(4)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// A classification proposal. The caller applies it; a confidence of 0
/// means "fallback, leave unclassified and queue for manual review".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposal {
    pub category_id: i64,
    pub confidence: u8,
}

impl Proposal {
    /// Whether the caller should set `is_classified` when applying.
    pub fn auto_apply(&self) -> bool {
        self.confidence > 0
    }
}

/// Case-fold and strip punctuation, collapsing whitespace runs.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_WORD.replace_all(&lowered, " ").trim().to_string()
}

fn word_set(normalized: &str) -> HashSet<&str> {
    normalized.split_whitespace().collect()
}

fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// Assign a category and confidence to `tx` from the user's history.
///
/// Exact normalized matches replay the prior decision at confidence 100.
/// Otherwise the best Jaccard word-overlap match above [`MIN_SIMILARITY`]
/// wins, with confidence `round(score * 100)`. Ties go to the most
/// recent entry by date, then the lowest id, so repeated calls with the
/// same inputs always return the same proposal. With no usable match the
/// taxonomy's fallback is proposed at confidence 0.
pub fn classify(
    tx: &Transaction,
    taxonomy: &Taxonomy,
    history: &[HistoryEntry],
) -> Result<Proposal, LedgerError> {
    if taxonomy.is_empty() {
        return Err(LedgerError::EmptyTaxonomy);
    }
    let desc = normalize(&tx.description);
    if desc.is_empty() {
        return Err(LedgerError::InvalidInput(format!(
            "Transaction {} has an empty description",
            tx.id
        )));
    }
    let payee = tx.payee.as_deref().map(normalize).filter(|p| !p.is_empty());

    // Deterministic memoization of prior decisions.
    if let Some(entry) = best_entry(history, |e| {
        let exact_desc = normalize(&e.description) == desc;
        let exact_payee = match (&payee, &e.payee) {
            (Some(p), Some(ep)) => normalize(ep) == *p,
            _ => false,
        };
        if exact_desc || exact_payee { 1.0 } else { 0.0 }
    }) {
        return Ok(Proposal {
            category_id: entry.category_id,
            confidence: 100,
        });
    }

    let words = word_set(&desc);
    let mut best: Option<(f64, &HistoryEntry)> = None;
    for e in history {
        let e_norm = normalize(&e.description);
        let score = jaccard(&words, &word_set(&e_norm));
        if score < MIN_SIMILARITY {
            continue;
        }
        best = match best {
            Some((bs, be)) if !prefer(score, e, bs, be) => Some((bs, be)),
            _ => Some((score, e)),
        };
    }
    if let Some((score, entry)) = best {
        return Ok(Proposal {
            category_id: entry.category_id,
            confidence: (score * 100.0).round() as u8,
        });
    }

    Ok(Proposal {
        category_id: taxonomy.fallback(),
        confidence: 0,
    })
}

/// Pick the history entry maximizing `score`, breaking ties by most
/// recent date then lowest id. Returns None if no entry scores > 0.
fn best_entry<'a, F>(history: &'a [HistoryEntry], score: F) -> Option<&'a HistoryEntry>
where
    F: Fn(&HistoryEntry) -> f64,
{
    let mut best: Option<(f64, &HistoryEntry)> = None;
    for e in history {
        let s = score(e);
        if s <= 0.0 {
            continue;
        }
        best = match best {
            Some((bs, be)) if !prefer(s, e, bs, be) => Some((bs, be)),
            _ => Some((s, e)),
        };
    }
    best.map(|(_, e)| e)
}

fn prefer(score: f64, entry: &HistoryEntry, best_score: f64, best: &HistoryEntry) -> bool {
    if score != best_score {
        return score > best_score;
    }
    if entry.date != best.date {
        return entry.date > best.date;
    }
    entry.id < best.id
}
