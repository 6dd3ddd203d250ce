use std::sync::Arc;

use crate::db::Database;

/// Shared by every request through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
}

impl AppState {
    pub fn new(db: impl Database + 'static) -> Self {
        Self { db: Arc::new(db) }
    }

    pub fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }
}
