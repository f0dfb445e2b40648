// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use splitledger::error::LedgerError;
use splitledger::ledger::{Household, fetch_transaction, net_balance, record_if_shared};
use splitledger::settle::settle;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE users(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, email TEXT NOT NULL UNIQUE);
        CREATE TABLE categories(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, parent_id INTEGER, category_type TEXT, is_shared INTEGER NOT NULL DEFAULT 0);
        CREATE TABLE transactions(
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
            notes TEXT
        );
        CREATE TABLE balance_entries(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            debtor_user_id INTEGER NOT NULL,
            creditor_user_id INTEGER NOT NULL,
            amount TEXT NOT NULL,
            description TEXT NOT NULL,
            transaction_id INTEGER UNIQUE,
            is_settled INTEGER NOT NULL DEFAULT 0,
            settled_date TEXT,
            CHECK(debtor_user_id != creditor_user_id)
        );
        INSERT INTO users(name,email) VALUES('Alice','alice@example.com');
        INSERT INTO users(name,email) VALUES('Bob','bob@example.com');
        INSERT INTO categories(name) VALUES('Uncategorized');
        INSERT INTO categories(name, category_type, is_shared) VALUES('Necessities','necessity',1);
    "#,
    )
    .unwrap();
    conn
}

fn shared_expense(conn: &Connection, household: &Household, user_id: i64, date: &str, amount: &str) {
    conn.execute(
        "INSERT INTO transactions(user_id, date, amount, currency, description, category_id, is_shared, split_percentage, is_classified, confidence)
         VALUES (?1, ?2, ?3, 'EUR', 'shared expense', 2, 1, '50', 1, 100)",
        params![user_id, date, amount],
    )
    .unwrap();
    let tx = fetch_transaction(conn, conn.last_insert_rowid()).unwrap();
    record_if_shared(conn, household, &tx).unwrap();
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn settles_net_between_the_pair() {
    let mut conn = setup();
    let household = Household::new(1, 2).unwrap();
    shared_expense(&conn, &household, 1, "2025-06-01", "-100.00");
    shared_expense(&conn, &household, 2, "2025-06-05", "-40.00");

    let result = settle(&mut conn, &household, date("2025-06-30")).unwrap();
    assert_eq!(result.closed_entries, 2);
    assert_eq!(result.net_amount, dec("30.00"));
    // Alice fronted more, so Bob pays her.
    assert_eq!(result.debtor, Some(2));
    assert_eq!(result.creditor, Some(1));
    assert_eq!(result.settled_date, date("2025-06-30"));

    assert_eq!(net_balance(&conn, 1, 2).unwrap(), Decimal::ZERO);
    let open: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM balance_entries WHERE is_settled=0",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(open, 0);
    let settled_dates: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM balance_entries WHERE settled_date='2025-06-30'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(settled_dates, 2);
}

#[test]
fn wash_settlement_closes_entries_without_direction() {
    let mut conn = setup();
    let household = Household::new(1, 2).unwrap();
    shared_expense(&conn, &household, 1, "2025-06-01", "-50.00");
    shared_expense(&conn, &household, 2, "2025-06-02", "-50.00");

    let result = settle(&mut conn, &household, date("2025-06-30")).unwrap();
    assert_eq!(result.closed_entries, 2);
    assert_eq!(result.net_amount, Decimal::ZERO);
    assert_eq!(result.debtor, None);
    assert_eq!(result.creditor, None);
}

#[test]
fn settling_with_nothing_outstanding_is_rejected() {
    let mut conn = setup();
    let household = Household::new(1, 2).unwrap();
    let err = settle(&mut conn, &household, date("2025-06-30")).unwrap_err();
    assert!(matches!(err, LedgerError::NoOutstandingBalance(1, 2)));
}

#[test]
fn settlement_date_before_latest_transaction_is_rejected_atomically() {
    let mut conn = setup();
    let household = Household::new(1, 2).unwrap();
    shared_expense(&conn, &household, 1, "2025-06-01", "-100.00");
    shared_expense(&conn, &household, 2, "2025-06-20", "-40.00");

    let err = settle(&mut conn, &household, date("2025-06-10")).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidDateOrder { .. }));

    // Nothing may close on a rejected settlement.
    let open: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM balance_entries WHERE is_settled=0",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(open, 2);
}

#[test]
fn entries_outside_the_pair_are_untouched() {
    let mut conn = setup();
    let household = Household::new(1, 2).unwrap();
    shared_expense(&conn, &household, 1, "2025-06-01", "-100.00");
    conn.execute(
        "INSERT INTO users(name,email) VALUES('Carol','carol@example.com')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO balance_entries(debtor_user_id, creditor_user_id, amount, description)
         VALUES (3, 1, '12.00', 'outside the household')",
        [],
    )
    .unwrap();

    let result = settle(&mut conn, &household, date("2025-06-30")).unwrap();
    assert_eq!(result.closed_entries, 1);

    let outside_open: bool = conn
        .query_row(
            "SELECT is_settled=0 FROM balance_entries WHERE debtor_user_id=3",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert!(outside_open);
}

#[test]
fn settled_entries_do_not_resettle() {
    let mut conn = setup();
    let household = Household::new(1, 2).unwrap();
    shared_expense(&conn, &household, 1, "2025-06-01", "-100.00");
    settle(&mut conn, &household, date("2025-06-30")).unwrap();

    let err = settle(&mut conn, &household, date("2025-07-31")).unwrap_err();
    assert!(matches!(err, LedgerError::NoOutstandingBalance(_, _)));
}
