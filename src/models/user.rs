// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A member account. Accounts are provisioned outside this service;
/// reconciliation only updates the payment-related columns.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub payment_status: String,
    pub membership_expires_at: Option<DateTime<Utc>>,
    pub last_payment_amount: Option<BigDecimal>,
    pub last_payment_currency: Option<String>,
    pub last_payment_at: Option<DateTime<Utc>>,
    pub last_order_id: Option<String>,
    pub salesperson_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset applied to a user when a completed payment is reconciled.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::users)]
pub struct PaymentUpdate {
    pub payment_status: String,
    pub membership_expires_at: DateTime<Utc>,
    pub last_payment_amount: BigDecimal,
    pub last_payment_currency: String,
    pub last_payment_at: DateTime<Utc>,
    pub last_order_id: String,
    // None leaves the stored email untouched
    pub email: Option<String>,
    pub updated_at: DateTime<Utc>,
}
