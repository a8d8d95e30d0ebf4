use std::sync::Arc;

use async_trait::async_trait;
use teloxide::types::ChatId;

use crate::core::error::AppResult;
use crate::storage::db::{self, DbPool};

/// Роль, по которой отбирается аудитория рассылки.
///
/// Закрытый набор значений вместо произвольной строки: опечатка в
/// конфигурации обнаруживается на старте, а не молчаливой рассылкой
/// нулю пользователей.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastRole {
    Client,
    Admin,
}

impl BroadcastRole {
    /// Разбирает значение из конфигурации.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "client" => Some(BroadcastRole::Client),
            "admin" => Some(BroadcastRole::Admin),
            _ => None,
        }
    }

    /// Значение колонки `role` в базе.
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastRole::Client => "client",
            BroadcastRole::Admin => "admin",
        }
    }
}

/// Получатель рассылки: ID чата и роль, по которой он был отобран.
///
/// Живёт только на время одной рассылки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipient {
    pub chat_id: ChatId,
    pub role: BroadcastRole,
}

/// Хранилище пользователей с точки зрения рассылки.
///
/// Отдельный трейт, чтобы движок рассылки можно было тестировать с
/// фейковым хранилищем, без SQLite.
#[async_trait]
pub trait AudienceStore: Send + Sync {
    /// Возвращает аудиторию с заданной ролью, сначала самых новых,
    /// не больше `limit` записей. Пустая аудитория — не ошибка.
    async fn find_by_role(&self, role: BroadcastRole, limit: usize) -> AppResult<Vec<Recipient>>;

    /// Увеличивает счётчик полученных рассылок пользователя.
    async fn increment_sent_counter(&self, chat_id: ChatId) -> AppResult<()>;
}

/// Реализация [`AudienceStore`] поверх пула SQLite.
pub struct SqliteAudienceStore {
    pool: Arc<DbPool>,
}

impl SqliteAudienceStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AudienceStore for SqliteAudienceStore {
    async fn find_by_role(&self, role: BroadcastRole, limit: usize) -> AppResult<Vec<Recipient>> {
        let conn = db::get_connection(&self.pool)?;
        let ids = db::find_user_ids_by_role(&conn, role.as_str(), limit)?;
        Ok(ids
            .into_iter()
            .map(|id| Recipient {
                chat_id: ChatId(id),
                role,
            })
            .collect())
    }

    async fn increment_sent_counter(&self, chat_id: ChatId) -> AppResult<()> {
        let conn = db::get_connection(&self.pool)?;
        db::increment_sent_counter(&conn, chat_id.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(BroadcastRole::parse("client"), Some(BroadcastRole::Client));
        assert_eq!(BroadcastRole::parse("  Admin "), Some(BroadcastRole::Admin));
        assert_eq!(BroadcastRole::parse("clients"), None);
        assert_eq!(BroadcastRole::parse(""), None);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [BroadcastRole::Client, BroadcastRole::Admin] {
            assert_eq!(BroadcastRole::parse(role.as_str()), Some(role));
        }
    }
}
