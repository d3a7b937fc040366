use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::processor::ProcessorClient;

/// Everything a handler invocation needs, constructed once in main and passed
/// as axum state. Keeping the handles explicit (no module-level singletons)
/// lets tests assemble a context around doubles.
#[derive(Clone)]
pub struct AppContext {
    pub db: Arc<Database>,
    pub processor: Arc<ProcessorClient>,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(db: Arc<Database>, processor: Arc<ProcessorClient>, config: Arc<Config>) -> Self {
        Self {
            db,
            processor,
            config,
        }
    }
}
