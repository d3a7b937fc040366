// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

//! Monthly commission rollover.
//!
//! A background task sleeps until the next UTC month boundary, then archives
//! every salesperson's current-period totals under the month that just ended
//! and zeroes the counters. Archives merge on write, so a rerun for the same
//! period is harmless; salespersons with no activity get only the reset.

use anyhow::{anyhow, Result};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use std::sync::Arc;
use tracing::{error, info};

use crate::db::Database;
use crate::error::ServiceError;
use crate::models::{NewMonthlyArchive, Salesperson};
use crate::period;
use crate::schema::{monthly_archives, salespersons};

pub struct RolloverWorker {
    db: Arc<Database>,
}

#[derive(Debug)]
pub struct RolloverSummary {
    pub archived: usize,
    pub reset: usize,
}

impl RolloverWorker {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Run forever, firing once at each month boundary.
    pub async fn run(self) -> Result<()> {
        loop {
            let now = Utc::now();
            let boundary = period::next_month_start(now);
            let wait = (boundary - now)
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);
            info!(fire_at = %boundary, "Rollover scheduled");
            tokio::time::sleep(wait).await;

            let fired = Utc::now();
            let period_key = period::previous_month_key(fired);
            match self.rollover(&period_key).await {
                Ok(summary) => info!(
                    period = %period_key,
                    archived = summary.archived,
                    reset = summary.reset,
                    "Monthly rollover complete"
                ),
                Err(e) => error!(period = %period_key, "Monthly rollover failed: {}", e),
            }
        }
    }

    /// Roll over a specific period. Split out from the schedule loop so
    /// operators can rerun a missed period by hand.
    pub async fn rollover(&self, period_key: &str) -> Result<RolloverSummary> {
        let mut conn = self
            .db
            .get_connection()
            .await
            .map_err(|e| anyhow!("Failed to get database connection: {}", e))?;
        let summary = run_monthly_rollover(&mut conn, period_key, Utc::now()).await?;
        Ok(summary)
    }
}

/// Whether a salesperson earned anything this period. Zero-valued records
/// are reset but never archived.
fn has_current_activity(sp: &Salesperson) -> bool {
    sp.current_period_sales != 0 || sp.current_period_earnings != BigDecimal::from(0)
}

/// Archive-and-reset every salesperson in one transaction.
pub async fn run_monthly_rollover(
    conn: &mut AsyncPgConnection,
    period_key: &str,
    now: DateTime<Utc>,
) -> Result<RolloverSummary, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|conn| {
        async move {
            let all = salespersons::table
                .for_update()
                .load::<Salesperson>(conn)
                .await?;

            let mut archived = 0;
            for sp in &all {
                if has_current_activity(sp) {
                    let archive = NewMonthlyArchive {
                        salesperson_id: sp.id.clone(),
                        period_key: period_key.to_string(),
                        earnings: sp.current_period_earnings.clone(),
                        sales_count: sp.current_period_sales,
                        archived_at: now,
                    };
                    diesel::insert_into(monthly_archives::table)
                        .values(&archive)
                        .on_conflict((
                            monthly_archives::salesperson_id,
                            monthly_archives::period_key,
                        ))
                        .do_update()
                        .set(&archive)
                        .execute(conn)
                        .await?;
                    archived += 1;
                }

                diesel::update(salespersons::table.find(&sp.id))
                    .set((
                        salespersons::current_period_earnings.eq(BigDecimal::from(0)),
                        salespersons::current_period_sales.eq(0),
                    ))
                    .execute(conn)
                    .await?;
            }

            Ok(RolloverSummary {
                archived,
                reset: all.len(),
            })
        }
        .scope_boxed()
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn salesperson(earnings: &str, count: i32) -> Salesperson {
        Salesperson {
            id: "rep-1".to_string(),
            total_commission: BigDecimal::from_str(earnings).unwrap(),
            total_sales: count,
            current_period_earnings: BigDecimal::from_str(earnings).unwrap(),
            current_period_sales: count,
            monthly_totals: serde_json::json!({}),
            yearly_totals: serde_json::json!({}),
            last_sale_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn zero_period_records_are_not_archived() {
        assert!(!has_current_activity(&salesperson("0", 0)));
        assert!(!has_current_activity(&salesperson("0.00", 0)));
    }

    #[test]
    fn nonzero_earnings_or_count_are_archived() {
        assert!(has_current_activity(&salesperson("20.00", 1)));
        assert!(has_current_activity(&salesperson("0", 1)));
        assert!(has_current_activity(&salesperson("0.01", 0)));
    }
}
