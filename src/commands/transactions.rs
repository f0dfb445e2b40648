// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, Household};
use crate::utils::{
    fmt_money, id_for_account, id_for_category, id_for_user, maybe_print_json, name_for_user,
    parse_date, parse_decimal, parse_split, pretty_table,
};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("set-category", sub)) => set_category(conn, sub)?,
        Some(("share", sub)) => share(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let description = sub.get_one::<String>("description").unwrap().trim();
    let payee = sub.get_one::<String>("payee").map(|s| s.trim().to_string());
    let note = sub.get_one::<String>("note").map(|s| s.to_string());
    let shared = sub.get_flag("shared");
    let split = match sub.get_one::<String>("split") {
        Some(s) => parse_split(s)?,
        None => Decimal::from(50),
    };

    if description.is_empty() {
        anyhow::bail!("Transaction description must not be empty");
    }

    let user_id = id_for_user(conn, user.trim())?;
    let account_id = match sub.get_one::<String>("account") {
        Some(a) => Some(id_for_account(conn, a.trim())?),
        None => None,
    };
    let currency = match (sub.get_one::<String>("currency"), account_id) {
        (Some(c), _) => c.to_uppercase(),
        (None, Some(aid)) => conn.query_row(
            "SELECT currency FROM accounts WHERE id=?1",
            params![aid],
            |r| r.get(0),
        )?,
        (None, None) => "EUR".to_string(),
    };

    // A manual category is a manual classification.
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(id_for_category(conn, c.trim())?),
        None => None,
    };
    let classified = category_id.is_some();
    let confidence: Option<i64> = if classified { Some(100) } else { None };

    conn.execute(
        "INSERT INTO transactions(user_id, account_id, date, amount, currency, description, payee,
                                  category_id, is_shared, split_percentage, is_classified, confidence, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            user_id,
            account_id,
            date,
            amount.to_string(),
            currency,
            description,
            payee,
            category_id,
            shared,
            split.to_string(),
            classified,
            confidence,
            note
        ],
    )?;
    let tx_id = conn.last_insert_rowid();
    println!(
        "Recorded {} on {} '{}' for {} (tx {})",
        fmt_money(&amount, &currency),
        date,
        description,
        user,
        tx_id
    );

    if shared && classified {
        let household = Household::load(conn)?;
        let tx = ledger::fetch_transaction(conn, tx_id)?;
        if let Some(entry) = ledger::record_if_shared(conn, &household, &tx)? {
            println!(
                "Partner {} owes {} {}",
                name_for_user(conn, entry.debtor_user_id)?,
                name_for_user(conn, entry.creditor_user_id)?,
                fmt_money(&entry.amount, &currency)
            );
        }
    }
    Ok(())
}

fn set_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let category = sub.get_one::<String>("category").unwrap();
    if ledger::locked_by_settlement(conn, id)? {
        anyhow::bail!("Transaction {} is part of a settled balance and cannot change", id);
    }
    let cat_id = id_for_category(conn, category.trim())?;
    let updated = conn.execute(
        "UPDATE transactions SET category_id=?1, is_classified=1, confidence=100 WHERE id=?2",
        params![cat_id, id],
    )?;
    if updated == 0 {
        anyhow::bail!("Transaction {} not found", id);
    }
    println!("Transaction {} categorized as '{}'", id, category);

    let tx = ledger::fetch_transaction(conn, id)?;
    if tx.is_shared {
        let household = Household::load(conn)?;
        if let Some(entry) = ledger::record_if_shared(conn, &household, &tx)? {
            println!(
                "Partner {} owes {} {}",
                name_for_user(conn, entry.debtor_user_id)?,
                name_for_user(conn, entry.creditor_user_id)?,
                fmt_money(&entry.amount, &tx.currency)
            );
        }
    }
    Ok(())
}

fn share(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    if ledger::locked_by_settlement(conn, id)? {
        anyhow::bail!("Transaction {} is part of a settled balance and cannot change", id);
    }
    match sub.get_one::<String>("split") {
        Some(s) => {
            let split = parse_split(s)?;
            conn.execute(
                "UPDATE transactions SET is_shared=1, split_percentage=?1 WHERE id=?2",
                params![split.to_string(), id],
            )?
        }
        None => conn.execute("UPDATE transactions SET is_shared=1 WHERE id=?1", params![id])?,
    };
    let tx = ledger::fetch_transaction(conn, id)?;
    println!("Transaction {} marked shared at {}%", id, tx.split_percentage);

    if tx.is_classified {
        // An open entry follows the new split; otherwise record afresh.
        let entry = match ledger::resync_shared_entry(conn, &tx)? {
            Some(entry) => Some(entry),
            None => {
                let household = Household::load(conn)?;
                ledger::record_if_shared(conn, &household, &tx)?
            }
        };
        if let Some(entry) = entry {
            println!(
                "Partner {} owes {} {}",
                name_for_user(conn, entry.debtor_user_id)?,
                name_for_user(conn, entry.creditor_user_id)?,
                fmt_money(&entry.amount, &tx.currency)
            );
        }
    } else {
        println!("Not classified yet; the balance entry is recorded after classification");
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.user.clone(),
                    r.description.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.category.clone(),
                    if r.shared { "yes" } else { "" }.to_string(),
                    r.confidence.map(|c| c.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "User", "Description", "Amount", "CCY", "Category", "Shared", "Conf"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub user: String,
    pub description: String,
    pub amount: String,
    pub currency: String,
    pub category: String,
    pub shared: bool,
    pub confidence: Option<i64>,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, u.name, t.description, t.amount, t.currency, c.name, t.is_shared, t.confidence
         FROM transactions t
         LEFT JOIN users u ON t.user_id=u.id
         LEFT JOIN categories c ON t.category_id=c.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(user) = sub.get_one::<String>("user") {
        sql.push_str(" AND u.name=?");
        params_vec.push(user.into());
    }
    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.into());
    }
    if sub.get_flag("unclassified") {
        sql.push_str(" AND t.is_classified=0");
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = if params_vec.is_empty() {
        stmt.query([])?
    } else {
        let params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        stmt.query(rusqlite::params_from_iter(params))?
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let category: Option<String> = r.get(6)?;
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            user: r.get(2)?,
            description: r.get(3)?,
            amount: r.get(4)?,
            currency: r.get(5)?,
            category: category.unwrap_or_default(),
            shared: r.get(7)?,
            confidence: r.get(8)?,
        });
    }
    Ok(data)
}
