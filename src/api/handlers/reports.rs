// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, Query, State};
use axum::Json;
use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

use crate::api::CallerIdentity;
use crate::context::AppContext;
use crate::error::ServiceError;
use crate::models::salesperson::period_total;
use crate::models::{Sale, Salesperson};
use crate::period;
use crate::schema::{sales, salespersons};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Period key, e.g. "2025-06". Defaults to the current month.
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommissionReport {
    pub salesperson_id: String,
    pub period: String,
    pub total_commission: BigDecimal,
    pub sales: Vec<Sale>,
}

/// Stored commission total and sale audit records for one period.
///
/// An unknown salesperson is a zero-valued, empty report rather than an
/// error: reporting callers cannot tell "never sold anything" apart from
/// "does not exist", and neither should fail.
pub async fn get_commission_report(
    State(ctx): State<AppContext>,
    _caller: CallerIdentity,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<CommissionReport>, ServiceError> {
    let period_key = query
        .period
        .unwrap_or_else(|| period::month_key(Utc::now()));

    let mut conn = ctx.db.get_connection().await?;

    let salesperson = salespersons::table
        .find(&id)
        .first::<Salesperson>(&mut conn)
        .await
        .optional()?;

    let total_commission = salesperson
        .map(|sp| period_total(&sp.monthly_totals, &period_key))
        .unwrap_or_else(|| BigDecimal::from(0));

    let period_sales = sales::table
        .filter(sales::salesperson_id.eq(&id))
        .filter(sales::period_key.eq(&period_key))
        .order(sales::created_at.asc())
        .load::<Sale>(&mut conn)
        .await?;

    Ok(Json(CommissionReport {
        salesperson_id: id,
        period: period_key,
        total_commission,
        sales: period_sales,
    }))
}

/// Full stored salesperson record (cumulative totals plus period mappings).
pub async fn get_salesperson(
    State(ctx): State<AppContext>,
    _caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Salesperson>, ServiceError> {
    let mut conn = ctx.db.get_connection().await?;

    let salesperson = salespersons::table
        .find(&id)
        .first::<Salesperson>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ServiceError::NotFound(format!("salesperson {} not found", id)))?;

    Ok(Json(salesperson))
}
