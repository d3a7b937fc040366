// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

//! Calendar period keys used to bucket commission totals.
//!
//! Months are keyed "YYYY-MM" and years "YYYY", always in UTC. The rollover
//! scheduler also lives off this module's month-boundary math.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Month bucket key for a timestamp, e.g. "2025-06".
pub fn month_key(ts: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}

/// Year bucket key for a timestamp, e.g. "2025".
pub fn year_key(ts: DateTime<Utc>) -> String {
    format!("{:04}", ts.year())
}

/// First instant of the month following `now`, in UTC.
pub fn next_month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    first_instant(year, month)
}

/// Key of the month preceding `now`'s month. The rollover job fires just after
/// a month boundary and archives under this key.
pub fn previous_month_key(now: DateTime<Utc>) -> String {
    let (year, month) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    format!("{:04}-{:02}", year, month)
}

fn first_instant(year: i32, month: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid month start")
        .and_utc()
}
