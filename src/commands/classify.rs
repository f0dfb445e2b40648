// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::classify::{HistorySource, classify};
use crate::error::LedgerError;
use crate::ledger::{self, Household};
use crate::taxonomy::Taxonomy;
use crate::utils::{id_for_user, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("run", sub)) => run(conn, sub),
        _ => Ok(()),
    }
}

#[derive(Serialize)]
pub struct ClassifyOutcome {
    pub transaction_id: i64,
    pub description: String,
    pub category: String,
    pub confidence: u8,
    pub applied: bool,
}

fn run(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let taxonomy = Taxonomy::load(conn)?;
    let user_filter = match sub.get_one::<String>("user") {
        Some(name) => Some(id_for_user(conn, name.trim())?),
        None => None,
    };

    let mut sql =
        String::from("SELECT id FROM transactions WHERE is_classified=0 ORDER BY date, id");
    if user_filter.is_some() {
        sql = String::from(
            "SELECT id FROM transactions WHERE is_classified=0 AND user_id=?1 ORDER BY date, id",
        );
    }
    let mut stmt = conn.prepare(&sql)?;
    let ids: Vec<i64> = match user_filter {
        Some(uid) => stmt
            .query_map(params![uid], |r| r.get(0))?
            .collect::<Result<_, _>>()?,
        None => stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<_, _>>()?,
    };

    let mut outcomes = Vec::new();
    for id in ids {
        let tx = ledger::fetch_transaction(conn, id)?;
        let history = conn.classified_history(tx.user_id)?;
        let proposal = match classify(&tx, &taxonomy, &history) {
            Ok(p) => p,
            // Bad rows stay in the review queue; the batch keeps going.
            Err(LedgerError::InvalidInput(msg)) => {
                eprintln!("Skipping transaction {}: {}", id, msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let applied = proposal.auto_apply();
        if applied {
            conn.execute(
                "UPDATE transactions SET category_id=?1, confidence=?2, is_classified=1 WHERE id=?3",
                params![proposal.category_id, proposal.confidence as i64, id],
            )?;
            if tx.is_shared {
                let household = Household::load(conn)?;
                let tx = ledger::fetch_transaction(conn, id)?;
                ledger::record_if_shared(conn, &household, &tx)?;
            }
        }
        let category = taxonomy
            .get(proposal.category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        outcomes.push(ClassifyOutcome {
            transaction_id: id,
            description: tx.description,
            category,
            confidence: proposal.confidence,
            applied,
        });
    }

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &outcomes)? {
        let rows = outcomes
            .iter()
            .map(|o| {
                vec![
                    o.transaction_id.to_string(),
                    o.description.clone(),
                    o.category.clone(),
                    o.confidence.to_string(),
                    if o.applied { "applied" } else { "review" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Tx", "Description", "Category", "Conf", "Status"], rows)
        );
        let pending = outcomes.iter().filter(|o| !o.applied).count();
        if pending > 0 {
            println!("{} transaction(s) need manual review (tx set-category)", pending);
        }
    }
    Ok(())
}
