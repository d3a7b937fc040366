// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Idempotency ledger entry keyed by the processor's order id. Inserted with
/// ON CONFLICT DO NOTHING inside the reconciliation transaction; a conflict
/// means the notification was already applied.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::processed_orders)]
pub struct NewProcessedOrder {
    pub order_id: String,
    pub processed_at: DateTime<Utc>,
}
