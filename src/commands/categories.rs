// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CategoryType;
use crate::taxonomy::Taxonomy;
use crate::utils::{id_for_category, maybe_print_json, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::str::FromStr;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            let parent_id = match sub.get_one::<String>("parent") {
                Some(p) => Some(id_for_category(conn, p.trim())?),
                None => None,
            };
            let ctype = match sub.get_one::<String>("type") {
                Some(t) => Some(CategoryType::from_str(t).map_err(|e| anyhow!(e))?),
                None => None,
            };
            let shared = sub.get_flag("shared");
            conn.execute(
                "INSERT INTO categories(name, parent_id, category_type, is_shared) VALUES (?1, ?2, ?3, ?4)",
                params![name, parent_id, ctype.map(|t| t.as_str()), shared],
            )?;
            // A bad parent chain should never land in the table.
            Taxonomy::load(conn)?;
            println!("Added category '{}'", name);
        }
        Some(("list", sub)) => {
            let taxonomy = Taxonomy::load(conn)?;
            let mut data: Vec<CategoryRow> = taxonomy
                .iter()
                .map(|c| CategoryRow {
                    id: c.id,
                    name: c.name.clone(),
                    parent: c
                        .parent_id
                        .and_then(|p| taxonomy.get(p))
                        .map(|p| p.name.clone()),
                    effective_type: taxonomy.effective_type(c.id).map(|t| t.to_string()),
                    shared: c.is_shared,
                })
                .collect();
            data.sort_by(|a, b| a.name.cmp(&b.name));
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.name.clone(),
                            c.parent.clone().unwrap_or_default(),
                            c.effective_type.clone().unwrap_or_default(),
                            if c.shared { "yes" } else { "" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Category", "Parent", "Type", "Shared"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute("DELETE FROM categories WHERE name=?1", params![name])?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct CategoryRow {
    id: i64,
    name: String,
    parent: Option<String>,
    effective_type: Option<String>,
    shared: bool,
}
