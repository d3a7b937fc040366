// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::allow_tables_to_appear_in_same_query;
use diesel::table;

// Member accounts
table! {
    users (id) {
        id -> Varchar,
        email -> Nullable<Varchar>,
        payment_status -> Varchar,
        membership_expires_at -> Nullable<Timestamptz>,
        last_payment_amount -> Nullable<Numeric>,
        last_payment_currency -> Nullable<Varchar>,
        last_payment_at -> Nullable<Timestamptz>,
        last_order_id -> Nullable<Varchar>,
        salesperson_id -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

// Commission earners
table! {
    salespersons (id) {
        id -> Varchar,
        total_commission -> Numeric,
        total_sales -> Int4,
        current_period_earnings -> Numeric,
        current_period_sales -> Int4,
        monthly_totals -> Jsonb,
        yearly_totals -> Jsonb,
        last_sale_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

// Per-sale audit records
table! {
    sales (id) {
        id -> Int4,
        salesperson_id -> Varchar,
        user_id -> Varchar,
        order_id -> Varchar,
        period_key -> Varchar,
        amount -> Numeric,
        currency -> Varchar,
        commission -> Numeric,
        created_at -> Timestamptz,
    }
}

// Archived monthly snapshots
table! {
    monthly_archives (salesperson_id, period_key) {
        salesperson_id -> Varchar,
        period_key -> Varchar,
        earnings -> Numeric,
        sales_count -> Int4,
        archived_at -> Timestamptz,
    }
}

// Idempotency ledger for processor orders
table! {
    processed_orders (order_id) {
        order_id -> Varchar,
        processed_at -> Timestamptz,
    }
}

// Allow joining the tables if needed
allow_tables_to_appear_in_same_query!(
    users,
    salespersons,
    sales,
    monthly_archives,
    processed_orders,
);
