use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Result;

/// Роль администратора в колонке `role`.
pub const ROLE_ADMIN: &str = "admin";

/// Структура, представляющая пользователя в базе данных.
pub struct User {
    /// Telegram ID пользователя
    pub telegram_id: i64,
    /// Имя пользователя (username) в Telegram, если доступно
    pub username: Option<String>,
    /// Имя
    pub first_name: Option<String>,
    /// Фамилия
    pub last_name: Option<String>,
    /// Код языка клиента Telegram
    pub language_code: Option<String>,
    /// Флаг бота (0/1)
    pub is_bot: i32,
    /// Флаг Telegram Premium (0/1)
    pub is_premium: i32,
    /// Роль пользователя: "client" или "admin"
    pub role: String,
    /// Сколько рассылок получил пользователь за всё время
    pub messages_sent_count: i64,
    /// Дата регистрации
    pub created_at: String,
}

impl User {
    /// Является ли пользователь администратором.
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Профиль пользователя из входящего апдейта Telegram.
///
/// Используется и при создании, и при обновлении строки: роль и счётчик
/// рассылок при обновлении не трогаются.
pub struct UserProfile<'a> {
    pub telegram_id: i64,
    pub username: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub language_code: Option<&'a str>,
    pub is_bot: bool,
    pub is_premium: bool,
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and ensures the
/// schema is up to date.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
///
/// # Returns
///
/// Returns a `DbPool` on success or an `r2d2::Error` if pool creation fails.
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    let conn = pool.get()?;
    if let Err(e) = init_schema(&conn) {
        log::error!("Failed to initialize schema: {}", e);
    }
    if let Err(e) = migrate_schema(&conn) {
        log::warn!("Failed to migrate schema: {}", e);
        // Don't fail on migration errors, as they might be expected
    }

    Ok(pool)
}

/// Get a connection from the pool
///
/// Retrieves a connection from the connection pool. The connection is
/// automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Creates the base tables if they don't exist yet
fn init_schema(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id INTEGER PRIMARY KEY,
            username TEXT,
            first_name TEXT,
            last_name TEXT,
            language_code TEXT,
            is_bot INTEGER NOT NULL DEFAULT 0,
            is_premium INTEGER NOT NULL DEFAULT 0,
            role TEXT NOT NULL DEFAULT 'client',
            messages_sent_count INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_users_role_created
            ON users (role, created_at DESC);
        CREATE TABLE IF NOT EXISTS payments (
            order_id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            status TEXT NOT NULL,
            payment_method TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
}

/// Migrate database schema to ensure all required columns exist
/// This function safely adds missing columns to existing tables
fn migrate_schema(conn: &rusqlite::Connection) -> Result<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(users)")?;
    let rows = stmt.query_map([], |row| {
        row.get::<_, String>(1) // column name
    })?;

    let mut columns = Vec::new();
    for row in rows {
        columns.push(row?);
    }

    // Add is_premium if it doesn't exist (pre-0.2 databases)
    if !columns.contains(&"is_premium".to_string()) {
        log::info!("Adding missing column: is_premium to users table");
        if let Err(e) = conn.execute("ALTER TABLE users ADD COLUMN is_premium INTEGER NOT NULL DEFAULT 0", []) {
            log::warn!("Failed to add is_premium column: {}", e);
        }
    }

    // Add messages_sent_count if it doesn't exist
    if !columns.contains(&"messages_sent_count".to_string()) {
        log::info!("Adding missing column: messages_sent_count to users table");
        if let Err(e) = conn.execute(
            "ALTER TABLE users ADD COLUMN messages_sent_count INTEGER NOT NULL DEFAULT 0",
            [],
        ) {
            log::warn!("Failed to add messages_sent_count column: {}", e);
        }
    }

    Ok(())
}

/// Создает пользователя или обновляет его профиль, если он уже есть.
///
/// Роль и счётчик рассылок существующей строки сохраняются: повторный
/// `/start` не разжалует администратора.
///
/// # Returns
///
/// Возвращает `Ok(true)` если пользователь создан, `Ok(false)` если
/// обновлён существующий.
pub fn upsert_user(conn: &DbConnection, profile: &UserProfile<'_>) -> Result<bool> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT telegram_id FROM users WHERE telegram_id = ?1",
            [profile.telegram_id],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    if existing.is_some() {
        conn.execute(
            "UPDATE users SET username = ?1, first_name = ?2, last_name = ?3,
                 language_code = ?4, is_bot = ?5, is_premium = ?6
             WHERE telegram_id = ?7",
            rusqlite::params![
                profile.username,
                profile.first_name,
                profile.last_name,
                profile.language_code,
                profile.is_bot as i32,
                profile.is_premium as i32,
                profile.telegram_id,
            ],
        )?;
        Ok(false)
    } else {
        conn.execute(
            "INSERT INTO users (telegram_id, username, first_name, last_name, language_code, is_bot, is_premium)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                profile.telegram_id,
                profile.username,
                profile.first_name,
                profile.last_name,
                profile.language_code,
                profile.is_bot as i32,
                profile.is_premium as i32,
            ],
        )?;
        Ok(true)
    }
}

/// Получает пользователя из базы данных по Telegram ID.
///
/// # Returns
///
/// Возвращает `Ok(Some(User))` если пользователь найден, `Ok(None)` если не найден,
/// или ошибку базы данных.
pub fn get_user(conn: &DbConnection, telegram_id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT telegram_id, username, first_name, last_name, language_code,
                is_bot, is_premium, role, messages_sent_count, created_at
         FROM users WHERE telegram_id = ?",
    )?;
    let mut rows = stmt.query([telegram_id])?;

    if let Some(row) = rows.next()? {
        Ok(Some(User {
            telegram_id: row.get(0)?,
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            language_code: row.get(4)?,
            is_bot: row.get(5)?,
            is_premium: row.get(6)?,
            role: row.get(7)?,
            messages_sent_count: row.get(8)?,
            created_at: row.get(9)?,
        }))
    } else {
        Ok(None)
    }
}

/// Проверяет, является ли пользователь администратором (role = 'admin').
///
/// Если пользователь не найден, возвращает `false`.
pub fn is_admin(conn: &DbConnection, telegram_id: i64) -> Result<bool> {
    Ok(get_user(conn, telegram_id)?.map(|u| u.is_admin()).unwrap_or(false))
}

/// Получает список Telegram ID пользователей с заданной ролью.
///
/// Сортировка по убыванию даты регистрации (сначала самые новые),
/// при равных датах — по убыванию ID для детерминированного порядка.
/// Результат ограничен `limit`.
pub fn find_user_ids_by_role(conn: &DbConnection, role: &str, limit: usize) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT telegram_id FROM users WHERE role = ?1
         ORDER BY created_at DESC, telegram_id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(rusqlite::params![role, limit as i64], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Увеличивает счётчик полученных рассылок пользователя.
///
/// # Errors
///
/// Возвращает `QueryReturnedNoRows`, если пользователя нет в базе.
pub fn increment_sent_counter(conn: &DbConnection, telegram_id: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE users SET messages_sent_count = messages_sent_count + 1 WHERE telegram_id = ?1",
        [telegram_id],
    )?;
    if updated == 0 {
        return Err(rusqlite::Error::QueryReturnedNoRows);
    }
    Ok(())
}

/// Всего пользователей в базе.
pub fn count_users(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}

/// Пользователей с заданной ролью.
pub fn count_users_with_role(conn: &DbConnection, role: &str) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users WHERE role = ?1", [role], |row| row.get(0))
}

/// Пользователей, зарегистрированных начиная с указанного момента
/// (строка в формате SQLite `YYYY-MM-DD HH:MM:SS`, UTC).
pub fn count_registered_since(conn: &DbConnection, since: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE created_at >= ?1",
        [since],
        |row| row.get(0),
    )
}

/// Пользователей с Telegram Premium.
pub fn count_premium_users(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users WHERE is_premium = 1", [], |row| row.get(0))
}

/// Запись о платеже из вебхука Продамуса.
pub struct PaymentRecord<'a> {
    pub order_id: &'a str,
    pub user_id: i64,
    pub amount: f64,
    pub status: &'a str,
    pub payment_method: Option<&'a str>,
}

/// Создает платеж или обновляет статус существующего (по order_id).
pub fn upsert_payment(conn: &DbConnection, payment: &PaymentRecord<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO payments (order_id, user_id, amount, status, payment_method)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(order_id) DO UPDATE SET
             status = excluded.status,
             payment_method = excluded.payment_method,
             updated_at = CURRENT_TIMESTAMP",
        rusqlite::params![
            payment.order_id,
            payment.user_id,
            payment.amount,
            payment.status,
            payment.payment_method,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_pool() -> (TempDir, DbPool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    fn insert_user_at(conn: &DbConnection, id: i64, role: &str, created_at: &str) {
        conn.execute(
            "INSERT INTO users (telegram_id, role, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, role, created_at],
        )
        .unwrap();
    }

    #[test]
    fn test_upsert_user_creates_then_updates() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        let created = upsert_user(
            &conn,
            &UserProfile {
                telegram_id: 1,
                username: Some("stan"),
                first_name: Some("Стэн"),
                last_name: None,
                language_code: Some("ru"),
                is_bot: false,
                is_premium: false,
            },
        )
        .unwrap();
        assert!(created);

        // Promote to admin, then re-run /start with a new username
        conn.execute("UPDATE users SET role = 'admin' WHERE telegram_id = 1", [])
            .unwrap();
        let created = upsert_user(
            &conn,
            &UserProfile {
                telegram_id: 1,
                username: Some("stan_new"),
                first_name: Some("Стэн"),
                last_name: None,
                language_code: Some("ru"),
                is_bot: false,
                is_premium: true,
            },
        )
        .unwrap();
        assert!(!created);

        let user = get_user(&conn, 1).unwrap().unwrap();
        assert_eq!(user.username.as_deref(), Some("stan_new"));
        assert_eq!(user.is_premium, 1);
        // Upsert must not demote the admin
        assert_eq!(user.role, "admin");
    }

    #[test]
    fn test_find_user_ids_by_role_newest_first_and_capped() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        insert_user_at(&conn, 10, "client", "2024-01-01 10:00:00");
        insert_user_at(&conn, 11, "client", "2024-03-01 10:00:00");
        insert_user_at(&conn, 12, "client", "2024-02-01 10:00:00");
        insert_user_at(&conn, 99, "admin", "2024-04-01 10:00:00");

        let ids = find_user_ids_by_role(&conn, "client", 100).unwrap();
        assert_eq!(ids, vec![11, 12, 10]);

        let ids = find_user_ids_by_role(&conn, "client", 2).unwrap();
        assert_eq!(ids, vec![11, 12]);

        let ids = find_user_ids_by_role(&conn, "partner", 100).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_increment_sent_counter() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        insert_user_at(&conn, 5, "client", "2024-01-01 10:00:00");
        increment_sent_counter(&conn, 5).unwrap();
        increment_sent_counter(&conn, 5).unwrap();

        let user = get_user(&conn, 5).unwrap().unwrap();
        assert_eq!(user.messages_sent_count, 2);

        // Unknown recipient is an error, not a silent no-op
        assert!(increment_sent_counter(&conn, 42).is_err());
    }

    #[test]
    fn test_counts() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        insert_user_at(&conn, 1, "client", "2024-01-01 10:00:00");
        insert_user_at(&conn, 2, "client", "2024-06-01 10:00:00");
        insert_user_at(&conn, 3, "admin", "2024-06-01 11:00:00");
        conn.execute("UPDATE users SET is_premium = 1 WHERE telegram_id = 2", [])
            .unwrap();

        assert_eq!(count_users(&conn).unwrap(), 3);
        assert_eq!(count_users_with_role(&conn, "admin").unwrap(), 1);
        assert_eq!(count_premium_users(&conn).unwrap(), 1);
        assert_eq!(count_registered_since(&conn, "2024-06-01 00:00:00").unwrap(), 2);
    }

    #[test]
    fn test_upsert_payment_updates_status() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        upsert_payment(
            &conn,
            &PaymentRecord {
                order_id: "order-1",
                user_id: 1,
                amount: 990.0,
                status: "PENDING",
                payment_method: Some("card"),
            },
        )
        .unwrap();
        upsert_payment(
            &conn,
            &PaymentRecord {
                order_id: "order-1",
                user_id: 1,
                amount: 990.0,
                status: "SUCCESS",
                payment_method: Some("card"),
            },
        )
        .unwrap();

        let (count, status): (i64, String) = conn
            .query_row(
                "SELECT COUNT(*), MAX(status) FROM payments WHERE order_id = 'order-1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(status, "SUCCESS");
    }
}
