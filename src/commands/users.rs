// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            let email = sub.get_one::<String>("email").unwrap().trim().to_string();
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
            if count >= 2 {
                anyhow::bail!("Household already has two partners; more are not supported");
            }
            conn.execute(
                "INSERT INTO users(name, email) VALUES (?1, ?2)",
                params![name, email],
            )?;
            println!("Added partner '{}' <{}>", name, email);
        }
        Some(("list", sub)) => {
            let data = list_rows(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|u| vec![u.id.to_string(), u.name.clone(), u.email.clone()])
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Email"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
}

fn list_rows(conn: &Connection) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, name, email FROM users ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok(UserRow {
            id: r.get(0)?,
            name: r.get(1)?,
            email: r.get(2)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
