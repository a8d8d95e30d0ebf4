//! Broadcast controller: staging of admin creatives and the
//! confirm/cancel lifecycle

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::broadcast::{
    estimate_duration_secs, run_broadcast, AudienceStore, Creative, SqliteAudienceStore,
};
use crate::core::config;
use crate::telegram::types::{is_admin_user, HandlerDeps};

/// Клавиатура подтверждения рассылки под ответом на загруженный креатив
fn confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Да", "confirm_broadcast"),
        InlineKeyboardButton::callback("Нет", "cancel_broadcast"),
    ]])
}

/// Извлекает креатив из сообщения администратора.
///
/// Команды (`/start`, `/stats`) креативом не считаются. Из нескольких
/// размеров фото берётся самый крупный.
fn extract_creative(msg: &Message) -> Option<Creative> {
    if let Some(photos) = msg.photo() {
        let photo = photos.iter().max_by_key(|p| p.width * p.height)?;
        return Some(Creative::Photo {
            file_id: photo.file.id.0.clone(),
            caption: msg.caption().map(str::to_string),
        });
    }
    if let Some(video) = msg.video() {
        return Some(Creative::Video {
            file_id: video.file.id.0.clone(),
            caption: msg.caption().map(str::to_string),
        });
    }
    if let Some(sticker) = msg.sticker() {
        return Some(Creative::Sticker {
            file_id: sticker.file.id.0.clone(),
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(Creative::Voice {
            file_id: voice.file.id.0.clone(),
        });
    }
    if let Some(video_note) = msg.video_note() {
        return Some(Creative::VideoNote {
            file_id: video_note.file.id.0.clone(),
        });
    }
    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return None;
        }
        return Some(Creative::Text { body: text.to_string() });
    }
    None
}

/// Принимает медиа или текст от администратора и ставит его в staging.
///
/// Сообщения не-администраторов молча игнорируются — это обычный чат
/// с ботом, а не попытка рассылки.
pub async fn handle_creative_submission(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let admin_id = i64::try_from(from.id.0).unwrap_or(0);

    if !is_admin_user(&deps.db_pool, admin_id) {
        return Ok(());
    }

    let Some(creative) = extract_creative(msg) else {
        return Ok(());
    };

    let label = creative.label();
    log::info!("Админ {} загрузил креатив ({})", admin_id, creative.kind());
    deps.staging.stage(admin_id, creative).await;

    bot.send_message(
        msg.chat.id,
        format!("Креатив ({}) загружен. Отправить его всем пользователям?", label),
    )
    .reply_markup(confirm_keyboard())
    .await?;

    Ok(())
}

fn callback_chat_id(q: &CallbackQuery, fallback: i64) -> ChatId {
    q.message.as_ref().map(|m| m.chat().id).unwrap_or(ChatId(fallback))
}

/// Кнопка «Да»: запускает рассылку застейдженного креатива.
///
/// Порядок проверок фиксирован: сначала права, потом наличие креатива.
/// Слот очищается атомарно при взятии креатива, поэтому два
/// одновременных подтверждения не отправят рассылку дважды.
pub async fn handle_confirm_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let admin_id = i64::try_from(q.from.id.0).unwrap_or(0);
    let chat_id = callback_chat_id(q, admin_id);

    if !is_admin_user(&deps.db_pool, admin_id) {
        bot.send_message(chat_id, "У вас нет прав на рассылку.").await?;
        return Ok(());
    }

    let Some(creative) = deps.staging.take(admin_id).await else {
        bot.send_message(
            chat_id,
            "Нет креатива для рассылки (возможно, уже отправлено или сброшено).",
        )
        .await?;
        return Ok(());
    };

    let role = config::broadcast::target_role();
    let limit = *config::broadcast::AUDIENCE_LIMIT;
    let store = SqliteAudienceStore::new(Arc::clone(&deps.db_pool));

    let recipients = match store.find_by_role(role, limit).await {
        Ok(recipients) => recipients,
        Err(e) => {
            log::error!("Не удалось получить аудиторию рассылки: {}", e);
            bot.send_message(chat_id, "Не удалось получить список пользователей. Рассылка не запущена.")
                .await?;
            return Ok(());
        }
    };

    if recipients.is_empty() {
        bot.send_message(chat_id, "Нет пользователей для рассылки.").await?;
        return Ok(());
    }

    let estimate = estimate_duration_secs(recipients.len(), config::broadcast::CHUNK_SIZE);
    bot.send_message(
        chat_id,
        format!(
            "Будет отправлено *{}* пользователям.\nПримерное время выполнения ~ *{}* секунд.\nНачинаем рассылку...",
            recipients.len(),
            estimate
        ),
    )
    .parse_mode(ParseMode::Markdown)
    .await?;

    log::info!(
        "Рассылка: админ={}, тип={}, пользователей={}, оценка={}s",
        admin_id,
        creative.kind(),
        recipients.len(),
        estimate
    );

    let report = run_broadcast(bot, &store, &recipients, &creative).await;
    let total_secs = report.elapsed.as_secs_f64().round() as u64;

    log::info!(
        "Рассылка завершена: всего={}, success={}, fail={}, time={}сек.",
        report.total,
        report.delivered,
        report.failed,
        total_secs
    );
    if report.stale_counters > 0 {
        log::warn!(
            "У {} получателей сообщение доставлено, но счётчик рассылок не обновился",
            report.stale_counters
        );
    }

    if report.is_clean() {
        bot.send_message(
            chat_id,
            format!(
                "Рассылка успешно завершена всем *{}* пользователям!\nЗатрачено: ~{} сек.",
                report.delivered, total_secs
            ),
        )
        .parse_mode(ParseMode::Markdown)
        .await?;
    } else {
        bot.send_message(
            chat_id,
            format!(
                "Рассылка завершена. Всего: {}, Успешно: {}, Ошибок: {}.\nЗатрачено ~{} сек.",
                report.total, report.delivered, report.failed, total_secs
            ),
        )
        .await?;
    }

    Ok(())
}

/// Кнопка «Нет»: сбрасывает застейдженный креатив.
pub async fn handle_cancel_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let admin_id = i64::try_from(q.from.id.0).unwrap_or(0);
    let chat_id = callback_chat_id(q, admin_id);

    if !is_admin_user(&deps.db_pool, admin_id) {
        bot.send_message(chat_id, "У вас нет прав на рассылку.").await?;
        return Ok(());
    }

    deps.staging.clear(admin_id).await;
    bot.send_message(chat_id, "Рассылка отменена.").await?;

    Ok(())
}
