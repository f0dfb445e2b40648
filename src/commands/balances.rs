// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, Household};
use crate::settle;
use crate::utils::{maybe_print_json, name_for_user, parse_date, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(conn, sub),
        Some(("net", _)) => net(conn),
        Some(("settle", sub)) => run_settle(conn, sub),
        _ => Ok(()),
    }
}

#[derive(Serialize)]
pub struct BalanceRow {
    pub id: i64,
    pub debtor: String,
    pub creditor: String,
    pub amount: String,
    pub description: String,
    pub transaction_id: Option<i64>,
    pub settled: bool,
    pub settled_date: Option<String>,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let include_settled = sub.get_flag("all");
    let sql = if include_settled {
        "SELECT id, debtor_user_id, creditor_user_id, amount, description, transaction_id, is_settled, settled_date
         FROM balance_entries ORDER BY id"
    } else {
        "SELECT id, debtor_user_id, creditor_user_id, amount, description, transaction_id, is_settled, settled_date
         FROM balance_entries WHERE is_settled=0 ORDER BY id"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, i64>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<i64>>(5)?,
            r.get::<_, bool>(6)?,
            r.get::<_, Option<String>>(7)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, debtor_id, creditor_id, amount, description, tx_id, settled, settled_date) = row?;
        data.push(BalanceRow {
            id,
            debtor: name_for_user(conn, debtor_id)?,
            creditor: name_for_user(conn, creditor_id)?,
            amount,
            description,
            transaction_id: tx_id,
            settled,
            settled_date,
        });
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.debtor.clone(),
                    b.creditor.clone(),
                    b.amount.clone(),
                    b.description.clone(),
                    if b.settled {
                        b.settled_date.clone().unwrap_or_default()
                    } else {
                        "open".to_string()
                    },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Debtor", "Creditor", "Amount", "Description", "Status"],
                rows
            )
        );
    }
    Ok(())
}

fn net(conn: &Connection) -> Result<()> {
    let household = Household::load(conn)?;
    let net = ledger::net_balance(conn, household.user_a, household.user_b)?;
    let a = name_for_user(conn, household.user_a)?;
    let b = name_for_user(conn, household.user_b)?;
    if net > Decimal::ZERO {
        println!("{} owes {} {}", a, b, net.round_dp(2));
    } else if net < Decimal::ZERO {
        println!("{} owes {} {}", b, a, net.abs().round_dp(2));
    } else {
        println!("{} and {} are even", a, b);
    }
    Ok(())
}

fn run_settle(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let household = Household::load(conn)?;
    let result = settle::settle(conn, &household, as_of)?;
    match (result.debtor, result.creditor) {
        (Some(d), Some(c)) => println!(
            "Settled {} entries on {}: {} pays {} {}",
            result.closed_entries,
            result.settled_date,
            name_for_user(conn, d)?,
            name_for_user(conn, c)?,
            result.net_amount.round_dp(2)
        ),
        _ => println!(
            "Settled {} entries on {}: balances were even, nothing changes hands",
            result.closed_entries, result.settled_date
        ),
    }
    Ok(())
}
