// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::api::CallerIdentity;
use crate::context::AppContext;
use crate::error::ServiceError;
use crate::processor::CreatedOrder;
use crate::tiers;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub tier_id: String,
    pub user_id: String,
}

/// Create a processor order for a membership tier.
///
/// The tier id is validated against the static price table before the
/// processor is contacted; processor failures come back to the caller as a
/// generic internal error with the detail kept server-side.
pub async fn create_order(
    State(ctx): State<AppContext>,
    caller: CallerIdentity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreatedOrder>, ServiceError> {
    let tier = tiers::lookup(&req.tier_id)
        .ok_or_else(|| ServiceError::InvalidArgument(format!("unknown tier: {}", req.tier_id)))?;

    let order = ctx
        .processor
        .create_order(tier, &req.user_id)
        .await
        .map_err(ServiceError::Processor)?;

    info!(
        caller = %caller.0,
        user_id = %req.user_id,
        tier = tier.id,
        order_id = %order.order_id,
        "Order created"
    );

    Ok(Json(order))
}
