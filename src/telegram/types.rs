//! Handler types and shared dependencies

use std::sync::Arc;

use crate::broadcast::CreativeStaging;
use crate::storage::db::{self, DbPool};
use crate::storage::get_connection;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub staging: CreativeStaging,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<DbPool>, staging: CreativeStaging) -> Self {
        Self { db_pool, staging }
    }
}

/// Проверяет по базе, является ли пользователь администратором.
///
/// Любая ошибка базы трактуется как «не администратор» и логируется:
/// лучше отказать админу, чем открыть рассылку постороннему.
pub fn is_admin_user(db_pool: &Arc<DbPool>, user_id: i64) -> bool {
    let conn = match get_connection(db_pool) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to get DB connection for admin check: {}", e);
            return false;
        }
    };

    match db::is_admin(&conn, user_id) {
        Ok(is_admin) => is_admin,
        Err(e) => {
            log::error!("Failed to check admin role for user {}: {}", user_id, e);
            false
        }
    }
}
