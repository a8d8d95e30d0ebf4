//! /stats command: aggregate statistics for administrators

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::storage::db;
use crate::storage::get_connection;
use crate::telegram::types::{is_admin_user, HandlerDeps};

struct BotStats {
    total_users: i64,
    total_admins: i64,
    registered_today: i64,
    premium_count: i64,
}

fn collect_stats(conn: &db::DbConnection) -> rusqlite::Result<BotStats> {
    // Сутки считаем от полуночи UTC — created_at хранится в UTC
    let start_of_day = chrono::Utc::now().format("%Y-%m-%d 00:00:00").to_string();

    Ok(BotStats {
        total_users: db::count_users(conn)?,
        total_admins: db::count_users_with_role(conn, db::ROLE_ADMIN)?,
        registered_today: db::count_registered_since(conn, &start_of_day)?,
        premium_count: db::count_premium_users(conn)?,
    })
}

fn format_stats(stats: &BotStats) -> String {
    let mut text = "📊 *Статистика бота*\n\n".to_string();
    text.push_str(&format!("• Всего пользователей: *{}*\n", stats.total_users));
    text.push_str(&format!("  (из них админов: *{}*)\n", stats.total_admins));
    text.push_str(&format!("• Зарегистрировалось сегодня: *{}*\n", stats.registered_today));
    text.push_str(&format!("• Премиум пользователей: *{}*\n", stats.premium_count));
    text
}

/// Отправляет статистику администратору. Для остальных команда молчит.
pub async fn handle_stats_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(()); // молчим
    };
    let user_id = i64::try_from(from.id.0).unwrap_or(0);

    if !is_admin_user(&deps.db_pool, user_id) {
        // Не админ — молчим
        return Ok(());
    }

    let stats = match get_connection(&deps.db_pool)
        .map_err(|e| e.to_string())
        .and_then(|conn| collect_stats(&conn).map_err(|e| e.to_string()))
    {
        Ok(stats) => stats,
        Err(e) => {
            log::error!("Ошибка при обработке /stats: {}", e);
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, format_stats(&stats))
        .parse_mode(ParseMode::Markdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_stats() {
        let text = format_stats(&BotStats {
            total_users: 120,
            total_admins: 2,
            registered_today: 7,
            premium_count: 15,
        });

        assert!(text.contains("Всего пользователей: *120*"));
        assert!(text.contains("админов: *2*"));
        assert!(text.contains("сегодня: *7*"));
        assert!(text.contains("Премиум пользователей: *15*"));
    }
}
