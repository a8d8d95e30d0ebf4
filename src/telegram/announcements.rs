//! Event announcements fetched from the Strapi CMS

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::utils::escape_markdown_v2;

/// Ответ Strapi: список анонсов в поле `data`
#[derive(Debug, Deserialize)]
struct AnnouncementsResponse {
    data: Vec<RawAnnouncement>,
}

#[derive(Debug, Deserialize)]
struct RawAnnouncement {
    title: Option<String>,
    date: Option<String>,
    content: Option<String>,
}

/// Анонс мероприятия после валидации.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub title: String,
    pub date: DateTime<Utc>,
    pub content: Option<String>,
}

/// Разбирает дату анонса: полный ISO 8601 или просто `YYYY-MM-DD`.
fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn validate_announcements(raw: Vec<RawAnnouncement>) -> Vec<Announcement> {
    let mut announcements: Vec<Announcement> = raw
        .into_iter()
        .filter_map(|item| {
            let (Some(title), Some(date_raw)) = (item.title, item.date) else {
                log::warn!("Некорректный объект анонса: отсутствует title или date");
                return None;
            };
            let Some(date) = parse_event_date(&date_raw) else {
                log::warn!("Некорректная дата анонса '{}'", date_raw);
                return None;
            };
            let content = item
                .content
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            Some(Announcement { title, date, content })
        })
        .collect();

    announcements.sort_by_key(|a| a.date);
    announcements
}

/// Загружает анонсы из Strapi, отбрасывая некорректные записи.
/// Результат отсортирован по дате, ближайшее мероприятие первым.
pub async fn fetch_announcements(strapi_url: &str) -> AppResult<Vec<Announcement>> {
    let url = format!("{}/announcements", strapi_url);
    let response = reqwest::get(&url).await?;
    if !response.status().is_success() {
        return Err(AppError::HttpStatus(response.status()));
    }

    let body: AnnouncementsResponse = response.json().await?;
    Ok(validate_announcements(body.data))
}

fn format_event_date(date: &DateTime<Utc>) -> String {
    date.format("%d.%m.%Y %H:%M").to_string()
}

fn push_event(message: &mut String, event: &Announcement) {
    message.push_str(&format!(
        "\n👉 *Тема:* {}\n⏱️ *Дата:* {}\n",
        escape_markdown_v2(&event.title),
        escape_markdown_v2(&format_event_date(&event.date))
    ));
    if let Some(ref content) = event.content {
        message.push_str(&format!("📢 {}\n", escape_markdown_v2(content)));
    }
}

/// Собирает MarkdownV2-сообщение: ближайшее мероприятие и остальные ниже.
fn format_announcements(announcements: &[Announcement]) -> Option<String> {
    let (next_event, other_events) = announcements.split_first()?;

    let mut message = "📅 *Ближайшее мероприятие*\n".to_string();
    push_event(&mut message, next_event);

    if !other_events.is_empty() {
        message.push_str("\n\n💼 *Другие мероприятия*\n");
        for event in other_events {
            push_event(&mut message, event);
        }
    }

    Some(message)
}

/// Кнопка «Прислать анонс»: загружает и показывает список мероприятий.
pub async fn handle_announcements_callback(bot: &Bot, chat_id: ChatId) -> ResponseResult<()> {
    let Some(ref strapi_url) = *config::STRAPI_URL else {
        bot.send_message(chat_id, "❌ Нет доступных мероприятий\\.")
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        return Ok(());
    };

    match fetch_announcements(strapi_url).await {
        Ok(announcements) => match format_announcements(&announcements) {
            Some(message) => {
                bot.send_message(chat_id, message)
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
            }
            None => {
                bot.send_message(chat_id, "❌ Нет доступных мероприятий\\.")
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
            }
        },
        Err(e) => {
            log::error!("Ошибка при получении анонсов: {}", e);
            bot.send_message(chat_id, "❌ Не удалось загрузить мероприятия\\.")
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: Option<&str>, date: Option<&str>, content: Option<&str>) -> RawAnnouncement {
        RawAnnouncement {
            title: title.map(String::from),
            date: date.map(String::from),
            content: content.map(String::from),
        }
    }

    #[test]
    fn test_parse_event_date_formats() {
        assert!(parse_event_date("2026-09-01T18:30:00Z").is_some());
        assert!(parse_event_date("2026-09-01T18:30:00+03:00").is_some());
        assert!(parse_event_date("2026-09-01").is_some());
        assert!(parse_event_date("скоро").is_none());
    }

    #[test]
    fn test_validate_drops_incomplete_and_sorts() {
        let announcements = validate_announcements(vec![
            raw(Some("Поздний"), Some("2026-10-01"), None),
            raw(None, Some("2026-09-01"), None),
            raw(Some("Без даты"), None, None),
            raw(Some("Ранний"), Some("2026-09-01"), Some("  подробности  ")),
        ]);

        assert_eq!(announcements.len(), 2);
        assert_eq!(announcements[0].title, "Ранний");
        assert_eq!(announcements[0].content.as_deref(), Some("подробности"));
        assert_eq!(announcements[1].title, "Поздний");
    }

    #[test]
    fn test_format_announcements_next_and_rest() {
        let announcements = validate_announcements(vec![
            raw(Some("Второй"), Some("2026-10-01"), None),
            raw(Some("Первый"), Some("2026-09-01"), Some("про маркетплейсы")),
        ]);

        let message = format_announcements(&announcements).unwrap();
        assert!(message.starts_with("📅 *Ближайшее мероприятие*"));
        assert!(message.contains("Первый"));
        assert!(message.contains("про маркетплейсы"));
        assert!(message.contains("💼 *Другие мероприятия*"));
        assert!(message.contains("Второй"));
    }

    #[test]
    fn test_format_announcements_empty() {
        assert!(format_announcements(&[]).is_none());
    }
}
