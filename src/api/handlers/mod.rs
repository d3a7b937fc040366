// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

pub mod health;
pub mod orders;
pub mod reports;
pub mod webhook;
