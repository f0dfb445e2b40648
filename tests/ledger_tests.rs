// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use splitledger::error::LedgerError;
use splitledger::ledger::{
    Household, fetch_transaction, net_balance, record_if_shared, resync_shared_entry,
    shared_portion,
};

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

fn insert_tx(
    conn: &Connection,
    user_id: i64,
    date: &str,
    amount: &str,
    shared: bool,
    split: &str,
    classified: bool,
) -> i64 {
    conn.execute(
        "INSERT INTO transactions(user_id, date, amount, currency, description, category_id, is_shared, split_percentage, is_classified, confidence)
         VALUES (?1, ?2, ?3, 'EUR', 'groceries run', 2, ?4, ?5, ?6, ?7)",
        params![user_id, date, amount, shared, split, classified, if classified { Some(100_i64) } else { None }],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn entry_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM balance_entries", [], |r| r.get(0))
        .unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn shared_portion_splits_and_rounds_half_to_even() {
    assert_eq!(shared_portion(dec("-10.00"), dec("50")), dec("5.00"));
    assert_eq!(shared_portion(dec("10.00"), dec("50")), dec("5.00"));
    assert_eq!(shared_portion(dec("-100.00"), dec("70")), dec("30.00"));
    // 2.225 and 2.175 land on the half; even neighbor wins.
    assert_eq!(shared_portion(dec("-4.45"), dec("50")), dec("2.22"));
    assert_eq!(shared_portion(dec("-4.35"), dec("50")), dec("2.18"));
    assert_eq!(shared_portion(dec("-0.01"), dec("50")), dec("0.00"));
}

#[test]
fn non_shared_transaction_is_rejected_and_records_nothing() {
    let conn = setup();
    let household = Household::new(1, 2).unwrap();
    let id = insert_tx(&conn, 1, "2025-06-01", "-10.00", false, "50", true);
    let tx = fetch_transaction(&conn, id).unwrap();
    let err = record_if_shared(&conn, &household, &tx).unwrap_err();
    assert!(matches!(err, LedgerError::NotShared(_)));
    assert_eq!(entry_count(&conn), 0);
}

#[test]
fn unclassified_transaction_is_rejected() {
    let conn = setup();
    let household = Household::new(1, 2).unwrap();
    let id = insert_tx(&conn, 1, "2025-06-01", "-10.00", true, "50", false);
    let tx = fetch_transaction(&conn, id).unwrap();
    let err = record_if_shared(&conn, &household, &tx).unwrap_err();
    assert!(matches!(err, LedgerError::NotClassified(_)));
    assert_eq!(entry_count(&conn), 0);
}

#[test]
fn records_partner_share_for_shared_expense() {
    let conn = setup();
    let household = Household::new(1, 2).unwrap();
    let id = insert_tx(&conn, 1, "2025-06-01", "-100.00", true, "50", true);
    let tx = fetch_transaction(&conn, id).unwrap();
    let entry = record_if_shared(&conn, &household, &tx).unwrap().unwrap();
    assert_eq!(entry.debtor_user_id, 2);
    assert_eq!(entry.creditor_user_id, 1);
    assert_eq!(entry.amount, dec("50.00"));
    assert_eq!(entry.transaction_id, Some(id));
    assert!(!entry.is_settled);
}

#[test]
fn recording_twice_yields_exactly_one_entry() {
    let conn = setup();
    let household = Household::new(1, 2).unwrap();
    let id = insert_tx(&conn, 1, "2025-06-01", "-100.00", true, "50", true);
    let tx = fetch_transaction(&conn, id).unwrap();
    let first = record_if_shared(&conn, &household, &tx).unwrap().unwrap();
    let second = record_if_shared(&conn, &household, &tx).unwrap().unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(entry_count(&conn), 1);
}

#[test]
fn zero_share_is_suppressed() {
    let conn = setup();
    let household = Household::new(1, 2).unwrap();
    let id = insert_tx(&conn, 1, "2025-06-01", "-0.01", true, "50", true);
    let tx = fetch_transaction(&conn, id).unwrap();
    assert!(record_if_shared(&conn, &household, &tx).unwrap().is_none());
    assert_eq!(entry_count(&conn), 0);
}

#[test]
fn owner_outside_household_is_rejected() {
    let conn = setup();
    conn.execute(
        "INSERT INTO users(name,email) VALUES('Mallory','m@example.com')",
        [],
    )
    .unwrap();
    let household = Household::new(1, 2).unwrap();
    let id = insert_tx(&conn, 3, "2025-06-01", "-10.00", true, "50", true);
    let tx = fetch_transaction(&conn, id).unwrap();
    let err = record_if_shared(&conn, &household, &tx).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
}

#[test]
fn split_percentage_out_of_range_is_rejected() {
    let conn = setup();
    let household = Household::new(1, 2).unwrap();
    let id = insert_tx(&conn, 1, "2025-06-01", "-10.00", true, "140", true);
    let tx = fetch_transaction(&conn, id).unwrap();
    let err = record_if_shared(&conn, &household, &tx).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
}

#[test]
fn split_change_resyncs_the_open_entry() {
    let conn = setup();
    let household = Household::new(1, 2).unwrap();
    let id = insert_tx(&conn, 1, "2025-06-01", "-100.00", true, "50", true);
    let tx = fetch_transaction(&conn, id).unwrap();
    let entry = record_if_shared(&conn, &household, &tx).unwrap().unwrap();
    assert_eq!(entry.amount, dec("50.00"));

    conn.execute(
        "UPDATE transactions SET split_percentage='80' WHERE id=?1",
        params![id],
    )
    .unwrap();
    let tx = fetch_transaction(&conn, id).unwrap();
    let entry = resync_shared_entry(&conn, &tx).unwrap().unwrap();
    assert_eq!(entry.amount, dec("20.00"));

    let stored: String = conn
        .query_row(
            "SELECT amount FROM balance_entries WHERE transaction_id=?1",
            params![id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(stored, "20.00");
    assert_eq!(entry_count(&conn), 1);
}

#[test]
fn resync_refuses_a_split_that_zeroes_the_entry() {
    let conn = setup();
    let household = Household::new(1, 2).unwrap();
    let id = insert_tx(&conn, 1, "2025-06-01", "-100.00", true, "50", true);
    let tx = fetch_transaction(&conn, id).unwrap();
    record_if_shared(&conn, &household, &tx).unwrap();

    conn.execute(
        "UPDATE transactions SET split_percentage='100' WHERE id=?1",
        params![id],
    )
    .unwrap();
    let tx = fetch_transaction(&conn, id).unwrap();
    let err = resync_shared_entry(&conn, &tx).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    let stored: String = conn
        .query_row(
            "SELECT amount FROM balance_entries WHERE transaction_id=?1",
            params![id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(stored, "50.00", "a rejected resync leaves the entry alone");
}

#[test]
fn resync_without_an_entry_is_a_noop() {
    let conn = setup();
    let id = insert_tx(&conn, 1, "2025-06-01", "-100.00", true, "50", true);
    let tx = fetch_transaction(&conn, id).unwrap();
    assert!(resync_shared_entry(&conn, &tx).unwrap().is_none());
}

#[test]
fn net_balance_is_antisymmetric() {
    let conn = setup();
    let household = Household::new(1, 2).unwrap();
    for (user, amount) in [(1, "-100.00"), (2, "-40.00"), (1, "-7.50")] {
        let id = insert_tx(&conn, user, "2025-06-01", amount, true, "50", true);
        let tx = fetch_transaction(&conn, id).unwrap();
        record_if_shared(&conn, &household, &tx).unwrap();
    }
    let ab = net_balance(&conn, 1, 2).unwrap();
    let ba = net_balance(&conn, 2, 1).unwrap();
    assert_eq!(ab, -ba);
    // Bob owes 50 + 3.75, Alice owes 20; positive means user_a owes.
    assert_eq!(ab, dec("-33.75"));
}

#[test]
fn household_rejects_identical_partners() {
    assert!(matches!(
        Household::new(5, 5),
        Err(LedgerError::InvalidInput(_))
    ));
}

#[test]
fn household_load_requires_exactly_two_users() {
    let conn = setup();
    let h = Household::load(&conn).unwrap();
    assert_eq!((h.user_a, h.user_b), (1, 2));
    conn.execute(
        "INSERT INTO users(name,email) VALUES('Mallory','m@example.com')",
        [],
    )
    .unwrap();
    assert!(matches!(
        Household::load(&conn),
        Err(LedgerError::InvalidInput(_))
    ));
}
