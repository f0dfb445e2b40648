// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Splitledger", "splitledger"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("splitledger.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    open_at(&db_path()?)
}

pub fn open_at(path: &Path) -> Result<Connection> {
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL,
        currency TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        parent_id INTEGER,
        category_type TEXT CHECK(category_type IN ('necessity','extra','investment','transfer')),
        is_shared INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(parent_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        account_id INTEGER,
        date TEXT NOT NULL,
        amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        description TEXT NOT NULL,
        payee TEXT,
        category_id INTEGER,
        is_shared INTEGER NOT NULL DEFAULT 0,
        split_percentage TEXT NOT NULL DEFAULT '50',
        is_classified INTEGER NOT NULL DEFAULT 0,
        confidence INTEGER,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE SET NULL,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);

    CREATE TABLE IF NOT EXISTS balance_entries(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        debtor_user_id INTEGER NOT NULL,
        creditor_user_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        description TEXT NOT NULL,
        transaction_id INTEGER UNIQUE,
        is_settled INTEGER NOT NULL DEFAULT 0,
        settled_date TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        CHECK(debtor_user_id != creditor_user_id),
        FOREIGN KEY(debtor_user_id) REFERENCES users(id),
        FOREIGN KEY(creditor_user_id) REFERENCES users(id),
        FOREIGN KEY(transaction_id) REFERENCES transactions(id)
    );
    CREATE INDEX IF NOT EXISTS idx_balance_entries_settled ON balance_entries(is_settled);
    "#,
    )?;
    seed_default_categories(conn)?;
    Ok(())
}

/// Seed the fallback category and the four typed roots. Idempotent;
/// user-created categories and manual edits are left alone.
fn seed_default_categories(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO categories(name) VALUES ('Uncategorized')",
        [],
    )?;
    for (name, ctype, shared) in [
        ("Necessities", "necessity", 1),
        ("Extras", "extra", 1),
        ("Investments", "investment", 0),
        ("Transfers", "transfer", 0),
    ] {
        conn.execute(
            "INSERT OR IGNORE INTO categories(name, category_type, is_shared) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, ctype, shared],
        )?;
    }
    Ok(())
}
