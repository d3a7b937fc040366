pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod period;
pub mod processor;
pub mod reconcile;
pub mod schema;
pub mod tiers;
pub mod worker;
