// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

//! Transaction-level reconciliation and rollover tests.
//!
//! These run against a real PostgreSQL instance and are skipped when
//! DATABASE_URL is not set. Every test seeds its own rows with unique ids so
//! the suite can share a database.

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::str::FromStr;

use memberpay::config::{CommissionConfig, DatabaseConfig};
use memberpay::db::{init_database, Database, DbConnection};
use memberpay::models::{MonthlyArchive, Sale, Salesperson, User};
use memberpay::notifications::CompletedPayment;
use memberpay::reconcile::{reconcile_completed_payment, ReconcileOutcome};
use memberpay::schema::{monthly_archives, processed_orders, sales, salespersons, users};
use memberpay::worker::run_monthly_rollover;

async fn test_database() -> Option<Database> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(
        init_database(&DatabaseConfig {
            url,
            max_connections: 2,
        })
        .await
        .expect("connect to test database"),
    )
}

fn commission_config() -> CommissionConfig {
    CommissionConfig {
        rate: BigDecimal::from_str("0.20").unwrap(),
        membership_days: 14,
    }
}

fn unique(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn payment(user_id: &str, order_id: &str, amount: &str) -> CompletedPayment {
    CompletedPayment {
        order_id: order_id.to_string(),
        user_id: user_id.to_string(),
        salesperson_id: None,
        payer_email: Some("member@example.com".to_string()),
        amount: BigDecimal::from_str(amount).unwrap(),
        currency: "USD".to_string(),
    }
}

async fn seed_user(conn: &mut DbConnection, user_id: &str, salesperson_id: Option<&str>) {
    let now = Utc::now();
    diesel::insert_into(users::table)
        .values((
            users::id.eq(user_id),
            users::payment_status.eq("unpaid"),
            users::salesperson_id.eq(salesperson_id),
            users::created_at.eq(now),
            users::updated_at.eq(now),
        ))
        .execute(conn)
        .await
        .expect("seed user");
}

#[tokio::test]
async fn duplicate_redelivery_applies_nothing() {
    let Some(db) = test_database().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let mut conn = db.get_connection().await.unwrap();

    let rep = unique("rep");
    let user = unique("user");
    let order = unique("order");
    seed_user(&mut conn, &user, Some(&rep)).await;

    let config = commission_config();
    let pay = payment(&user, &order, "100.00");

    let first = reconcile_completed_payment(&mut conn, &config, &pay, Utc::now())
        .await
        .unwrap();
    assert_eq!(
        first,
        ReconcileOutcome::Applied {
            commission: Some(BigDecimal::from_str("20.00").unwrap()),
        }
    );

    // Same notification again: ledger conflict, no second credit.
    let second = reconcile_completed_payment(&mut conn, &config, &pay, Utc::now())
        .await
        .unwrap();
    assert_eq!(second, ReconcileOutcome::DuplicateOrder);

    let sp = salespersons::table
        .find(&rep)
        .first::<Salesperson>(&mut conn)
        .await
        .unwrap();
    assert_eq!(sp.total_commission, BigDecimal::from_str("20.00").unwrap());
    assert_eq!(sp.total_sales, 1);

    let audit_rows = sales::table
        .filter(sales::order_id.eq(&order))
        .load::<Sale>(&mut conn)
        .await
        .unwrap();
    assert_eq!(audit_rows.len(), 1);
    assert_eq!(
        audit_rows[0].commission,
        BigDecimal::from_str("20.00").unwrap()
    );

    let stored = users::table
        .find(&user)
        .first::<User>(&mut conn)
        .await
        .unwrap();
    assert_eq!(stored.payment_status, "paid");
    assert!(stored.membership_expires_at.is_some());
    assert_eq!(stored.last_order_id.as_deref(), Some(order.as_str()));
}

#[tokio::test]
async fn commission_accrues_on_top_of_prior_total() {
    let Some(db) = test_database().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let mut conn = db.get_connection().await.unwrap();

    let rep = unique("rep");
    let user = unique("user");
    seed_user(&mut conn, &user, Some(&rep)).await;

    let config = commission_config();

    // First sale establishes C, second must land at exactly C + A * r.
    for order in [unique("order"), unique("order")] {
        reconcile_completed_payment(&mut conn, &config, &payment(&user, &order, "100.00"), Utc::now())
            .await
            .unwrap();
    }

    let sp = salespersons::table
        .find(&rep)
        .first::<Salesperson>(&mut conn)
        .await
        .unwrap();
    assert_eq!(sp.total_commission, BigDecimal::from_str("40.00").unwrap());
    assert_eq!(sp.total_sales, 2);

    let audit_rows = sales::table
        .filter(sales::salesperson_id.eq(&rep))
        .load::<Sale>(&mut conn)
        .await
        .unwrap();
    assert_eq!(audit_rows.len(), 2);
}

#[tokio::test]
async fn unknown_user_leaves_no_writes() {
    let Some(db) = test_database().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let mut conn = db.get_connection().await.unwrap();

    let order = unique("order");
    let outcome = reconcile_completed_payment(
        &mut conn,
        &commission_config(),
        &payment(&unique("ghost"), &order, "100.00"),
        Utc::now(),
    )
    .await
    .unwrap();
    assert_eq!(outcome, ReconcileOutcome::UserNotFound);

    // Not even the idempotency ledger: a redelivery after the user is
    // provisioned must still be able to apply.
    let ledger_rows: i64 = processed_orders::table
        .filter(processed_orders::order_id.eq(&order))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(ledger_rows, 0);
}

#[tokio::test]
async fn rollover_archives_then_resets() {
    let Some(db) = test_database().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let mut conn = db.get_connection().await.unwrap();

    let rep = unique("rep");
    let user = unique("user");
    seed_user(&mut conn, &user, Some(&rep)).await;

    let config = commission_config();
    reconcile_completed_payment(
        &mut conn,
        &config,
        &payment(&user, &unique("order"), "100.00"),
        Utc::now(),
    )
    .await
    .unwrap();

    // Constant period is safe: the rep id is unique per run, and archive
    // writes merge on conflict.
    let period = "2099-01".to_string();
    run_monthly_rollover(&mut conn, &period, Utc::now())
        .await
        .unwrap();

    let archive = monthly_archives::table
        .find((&rep, &period))
        .first::<MonthlyArchive>(&mut conn)
        .await
        .unwrap();
    assert_eq!(archive.earnings, BigDecimal::from_str("20.00").unwrap());
    assert_eq!(archive.sales_count, 1);

    let sp = salespersons::table
        .find(&rep)
        .first::<Salesperson>(&mut conn)
        .await
        .unwrap();
    assert_eq!(sp.current_period_earnings, BigDecimal::from(0));
    assert_eq!(sp.current_period_sales, 0);
    // Cumulative totals survive the reset.
    assert_eq!(sp.total_commission, BigDecimal::from_str("20.00").unwrap());

    // Rerun for the same period: the now-zero record is skipped, the
    // existing snapshot keeps its nonzero values.
    run_monthly_rollover(&mut conn, &period, Utc::now())
        .await
        .unwrap();
    let archive = monthly_archives::table
        .find((&rep, &period))
        .first::<MonthlyArchive>(&mut conn)
        .await
        .unwrap();
    assert_eq!(archive.earnings, BigDecimal::from_str("20.00").unwrap());
}
