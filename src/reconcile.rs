// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

//! Payment reconciliation: the one atomic unit of work in this service.
//!
//! A completed-payment notification updates the member's record, credits the
//! referring salesperson, and appends an audit row, all inside a single
//! database transaction. Both the user and salesperson rows are locked with
//! FOR UPDATE so concurrent deliveries racing on the same salesperson
//! serialize instead of losing increments. The processor order id doubles as
//! an idempotency key: a redelivered notification hits the ledger conflict
//! and applies nothing.

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{info, warn};

use crate::config::CommissionConfig;
use crate::error::ServiceError;
use crate::models::salesperson::bump_period_total;
use crate::models::{
    NewProcessedOrder, NewSale, NewSalesperson, PaymentUpdate, Salesperson, User,
};
use crate::notifications::CompletedPayment;
use crate::period;
use crate::schema::{processed_orders, sales, salespersons, users};

/// How a reconciliation attempt ended. All three variants are acknowledged
/// upstream with a success status; only storage failures surface as errors.
#[derive(Debug, PartialEq)]
pub enum ReconcileOutcome {
    /// User updated; commission credited when a salesperson was referenced.
    Applied { commission: Option<BigDecimal> },
    /// Order id already in the ledger, nothing applied.
    DuplicateOrder,
    /// Referenced user does not exist, nothing applied.
    UserNotFound,
}

/// Commission owed on a paid amount, rounded half-up to cents.
pub fn compute_commission(amount: &BigDecimal, rate: &BigDecimal) -> BigDecimal {
    (amount * rate).with_scale_round(2, RoundingMode::HalfUp)
}

/// Each successful payment resets the membership clock; the window is never
/// added onto an existing unexpired period.
pub fn membership_expiry(now: DateTime<Utc>, membership_days: i64) -> DateTime<Utc> {
    now + Duration::days(membership_days)
}

/// Apply a completed payment. Runs steps 1-6 of the reconciliation contract
/// as one transaction; any error rolls back every write.
pub async fn reconcile_completed_payment(
    conn: &mut AsyncPgConnection,
    config: &CommissionConfig,
    payment: &CompletedPayment,
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|conn| {
        async move {
            // Lock the user row for the duration of the transaction.
            let user = users::table
                .find(&payment.user_id)
                .for_update()
                .first::<User>(conn)
                .await
                .optional()?;

            let Some(user) = user else {
                warn!(
                    user_id = %payment.user_id,
                    order_id = %payment.order_id,
                    "Payment references unknown user, skipping"
                );
                return Ok(ReconcileOutcome::UserNotFound);
            };

            // Idempotency ledger: a conflict means this order was already
            // applied by an earlier delivery.
            let inserted = diesel::insert_into(processed_orders::table)
                .values(&NewProcessedOrder {
                    order_id: payment.order_id.clone(),
                    processed_at: now,
                })
                .on_conflict(processed_orders::order_id)
                .do_nothing()
                .execute(conn)
                .await?;

            if inserted == 0 {
                info!(
                    order_id = %payment.order_id,
                    "Duplicate payment notification, already applied"
                );
                return Ok(ReconcileOutcome::DuplicateOrder);
            }

            diesel::update(users::table.find(&payment.user_id))
                .set(&PaymentUpdate {
                    payment_status: "paid".to_string(),
                    membership_expires_at: membership_expiry(now, config.membership_days),
                    last_payment_amount: payment.amount.clone(),
                    last_payment_currency: payment.currency.clone(),
                    last_payment_at: now,
                    last_order_id: payment.order_id.clone(),
                    email: payment.payer_email.clone(),
                    updated_at: now,
                })
                .execute(conn)
                .await?;

            // The user's stored attribution wins over the notification's.
            let salesperson_ref = user
                .salesperson_id
                .clone()
                .or_else(|| payment.salesperson_id.clone());

            let Some(salesperson_id) = salesperson_ref else {
                info!(
                    user_id = %payment.user_id,
                    order_id = %payment.order_id,
                    "No salesperson reference, membership updated without commission"
                );
                return Ok(ReconcileOutcome::Applied { commission: None });
            };

            let earned = compute_commission(&payment.amount, &config.rate);
            let month = period::month_key(now);
            let year = period::year_key(now);

            let existing = salespersons::table
                .find(&salesperson_id)
                .for_update()
                .first::<Salesperson>(conn)
                .await
                .optional()?;

            match existing {
                Some(sp) => {
                    let mut monthly = sp.monthly_totals.clone();
                    let mut yearly = sp.yearly_totals.clone();
                    bump_period_total(&mut monthly, &month, &earned);
                    bump_period_total(&mut yearly, &year, &earned);

                    diesel::update(salespersons::table.find(&salesperson_id))
                        .set((
                            salespersons::total_commission
                                .eq(sp.total_commission + &earned),
                            salespersons::total_sales.eq(sp.total_sales + 1),
                            salespersons::current_period_earnings
                                .eq(sp.current_period_earnings + &earned),
                            salespersons::current_period_sales
                                .eq(sp.current_period_sales + 1),
                            salespersons::monthly_totals.eq(monthly),
                            salespersons::yearly_totals.eq(yearly),
                            salespersons::last_sale_at.eq(now),
                        ))
                        .execute(conn)
                        .await?;
                }
                None => {
                    // First attributed sale creates the record.
                    let mut monthly = serde_json::json!({});
                    let mut yearly = serde_json::json!({});
                    bump_period_total(&mut monthly, &month, &earned);
                    bump_period_total(&mut yearly, &year, &earned);
                    diesel::insert_into(salespersons::table)
                        .values(&NewSalesperson {
                            id: salesperson_id.clone(),
                            total_commission: earned.clone(),
                            total_sales: 1,
                            current_period_earnings: earned.clone(),
                            current_period_sales: 1,
                            monthly_totals: monthly,
                            yearly_totals: yearly,
                            last_sale_at: Some(now),
                            created_at: now,
                        })
                        .execute(conn)
                        .await?;
                }
            }

            diesel::insert_into(sales::table)
                .values(&NewSale {
                    salesperson_id: salesperson_id.clone(),
                    user_id: payment.user_id.clone(),
                    order_id: payment.order_id.clone(),
                    period_key: month,
                    amount: payment.amount.clone(),
                    currency: payment.currency.clone(),
                    commission: earned.clone(),
                    created_at: now,
                })
                .execute(conn)
                .await?;

            info!(
                user_id = %payment.user_id,
                salesperson_id = %salesperson_id,
                order_id = %payment.order_id,
                commission = %earned,
                "Reconciled payment with commission"
            );

            Ok(ReconcileOutcome::Applied {
                commission: Some(earned),
            })
        }
        .scope_boxed()
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn commission_is_exact_at_the_example_rate() {
        let amount = BigDecimal::from_str("100.00").unwrap();
        let rate = BigDecimal::from_str("0.20").unwrap();
        assert_eq!(
            compute_commission(&amount, &rate),
            BigDecimal::from_str("20.00").unwrap()
        );
    }

    #[test]
    fn commission_rounds_half_up_to_cents() {
        let amount = BigDecimal::from_str("33.33").unwrap();
        let rate = BigDecimal::from_str("0.10").unwrap();
        // 3.333 -> 3.33
        assert_eq!(
            compute_commission(&amount, &rate),
            BigDecimal::from_str("3.33").unwrap()
        );

        let amount = BigDecimal::from_str("33.35").unwrap();
        // 3.335 -> 3.34
        assert_eq!(
            compute_commission(&amount, &rate),
            BigDecimal::from_str("3.34").unwrap()
        );
    }

    #[test]
    fn accumulated_commissions_do_not_drift() {
        let rate = BigDecimal::from_str("0.20").unwrap();
        let small = BigDecimal::from_str("0.05").unwrap();
        let mut total = BigDecimal::from(0);
        for _ in 0..10_000 {
            total += compute_commission(&small, &rate);
        }
        assert_eq!(total, BigDecimal::from_str("100.00").unwrap());
    }

    #[test]
    fn expiry_resets_rather_than_extends() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let expiry = membership_expiry(now, 14);
        assert_eq!(expiry, Utc.with_ymd_and_hms(2025, 6, 24, 12, 0, 0).unwrap());
        // A later payment computes from its own "now", independent of any
        // previous expiry.
        let later = Utc.with_ymd_and_hms(2025, 6, 12, 12, 0, 0).unwrap();
        assert_eq!(
            membership_expiry(later, 14),
            Utc.with_ymd_and_hms(2025, 6, 26, 12, 0, 0).unwrap()
        );
    }
}
