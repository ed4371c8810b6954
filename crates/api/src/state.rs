use std::sync::Arc;

use notifications_mailer::{Dispatcher, Mailer};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and everything else sit behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: notifications_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Outgoing mail transport (SMTP, or the in-memory outbox in tests).
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// A dispatcher bound to this state's pool and mailer.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.pool.clone(), Arc::clone(&self.mailer))
    }
}
