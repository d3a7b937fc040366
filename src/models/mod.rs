// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

pub mod archive;
pub mod processed_order;
pub mod sale;
pub mod salesperson;
pub mod user;

pub use archive::{MonthlyArchive, NewMonthlyArchive};
pub use processed_order::NewProcessedOrder;
pub use sale::{NewSale, Sale};
pub use salesperson::{NewSalesperson, Salesperson};
pub use user::{PaymentUpdate, User};
