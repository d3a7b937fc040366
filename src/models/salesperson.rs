// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A commission earner. Created lazily on the first attributed sale.
///
/// `monthly_totals` and `yearly_totals` are JSONB maps from period key
/// ("2025-06" / "2025") to a decimal amount stored as a string, so period
/// accumulation never passes through floating point.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::salespersons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Salesperson {
    pub id: String,
    pub total_commission: BigDecimal,
    pub total_sales: i32,
    pub current_period_earnings: BigDecimal,
    pub current_period_sales: i32,
    pub monthly_totals: serde_json::Value,
    pub yearly_totals: serde_json::Value,
    pub last_sale_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::salespersons)]
pub struct NewSalesperson {
    pub id: String,
    pub total_commission: BigDecimal,
    pub total_sales: i32,
    pub current_period_earnings: BigDecimal,
    pub current_period_sales: i32,
    pub monthly_totals: serde_json::Value,
    pub yearly_totals: serde_json::Value,
    pub last_sale_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Read a period entry out of a totals map, treating anything absent or
/// unparseable as zero. Legacy numeric entries are accepted via their
/// JSON text representation.
pub fn period_total(map: &serde_json::Value, key: &str) -> BigDecimal {
    match map.get(key) {
        Some(serde_json::Value::String(s)) => {
            BigDecimal::from_str(s).unwrap_or_else(|_| BigDecimal::from(0))
        }
        Some(serde_json::Value::Number(n)) => {
            BigDecimal::from_str(&n.to_string()).unwrap_or_else(|_| BigDecimal::from(0))
        }
        _ => BigDecimal::from(0),
    }
}

/// Add `delta` to the period entry under `key`, returning the new total.
/// Non-object maps (possible with hand-edited rows) are reset to an object.
pub fn bump_period_total(
    map: &mut serde_json::Value,
    key: &str,
    delta: &BigDecimal,
) -> BigDecimal {
    let updated = period_total(map, key) + delta;
    if !map.is_object() {
        *map = serde_json::json!({});
    }
    if let Some(obj) = map.as_object_mut() {
        obj.insert(
            key.to_string(),
            serde_json::Value::String(updated.to_string()),
        );
    }
    updated
}
