// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// An immutable per-sale audit record, written once per reconciled payment.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::sales)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Sale {
    pub id: i32,
    pub salesperson_id: String,
    pub user_id: String,
    pub order_id: String,
    pub period_key: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub commission: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::sales)]
pub struct NewSale {
    pub salesperson_id: String,
    pub user_id: String,
    pub order_id: String,
    pub period_key: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub commission: BigDecimal,
    pub created_at: DateTime<Utc>,
}
