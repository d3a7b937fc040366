// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// An archived monthly commission snapshot, one per salesperson per period.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::monthly_archives)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MonthlyArchive {
    pub salesperson_id: String,
    pub period_key: String,
    pub earnings: BigDecimal,
    pub sales_count: i32,
    pub archived_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::monthly_archives)]
pub struct NewMonthlyArchive {
    pub salesperson_id: String,
    pub period_key: String,
    pub earnings: BigDecimal,
    pub sales_count: i32,
    pub archived_at: DateTime<Utc>,
}
