// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let r#type = sub.get_one::<String>("type").unwrap();
            let currency = sub.get_one::<String>("currency").unwrap().to_uppercase();
            conn.execute(
                "INSERT INTO accounts(name, type, currency) VALUES (?1, ?2, ?3)",
                params![name, r#type, currency],
            )?;
            println!("Added account '{}' ({}, {})", name, r#type, currency);
        }
        Some(("list", _)) => {
            let mut stmt =
                conn.prepare("SELECT name, type, currency FROM accounts ORDER BY name")?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, t, c) = row?;
                data.push(vec![n, t, c]);
            }
            println!("{}", pretty_table(&["Account", "Type", "Currency"], data));
        }
        _ => {}
    }
    Ok(())
}
