// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

use bigdecimal::BigDecimal;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

/// A membership pricing level with a fixed currency and amount.
#[derive(Debug, Clone, Serialize)]
pub struct Tier {
    pub id: &'static str,
    pub amount: BigDecimal,
    pub currency: &'static str,
    pub description: &'static str,
}

// The price table is static by design: tier ids arrive from untrusted callers
// and anything outside this table is rejected before the processor is touched.
static PRICE_TABLE: Lazy<HashMap<&'static str, Tier>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for (id, amount, description) in [
        ("sadc", "100.00", "Membership - 1 month"),
        ("sadc3", "270.00", "Membership - 3 months"),
        ("sadc12", "960.00", "Membership - 12 months"),
    ] {
        table.insert(
            id,
            Tier {
                id,
                amount: BigDecimal::from_str(amount).expect("static tier amount"),
                currency: "USD",
                description,
            },
        );
    }
    table
});

/// Look up a tier by its caller-supplied identifier.
pub fn lookup(tier_id: &str) -> Option<&'static Tier> {
    PRICE_TABLE.get(tier_id)
}
