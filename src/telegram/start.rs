//! /start command: user registration and the community welcome message

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::core::config;
use crate::core::utils::escape_markdown_v2;
use crate::storage::db::{self, UserProfile};
use crate::storage::get_connection;
use crate::telegram::types::HandlerDeps;

/// Inline keyboard shown under the welcome message
fn welcome_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("💳 Оплатить", "pay")],
        vec![InlineKeyboardButton::callback(
            "📢 Прислать анонс ближайшей программы",
            "send_announcement",
        )],
    ])
}

/// Текст приветствия сообщества (MarkdownV2).
fn welcome_text(first_name: &str) -> String {
    format!(
        "*{}*, на связи *Скуфы маркетинга*👋\n\n\
         _Благодарю тебя за подписку, теперь ты не пропустишь самое важное\\!_\n\n\
         Этот бот создан для оповещения о наших мероприятиях и активностях, \
         которые помогают селлерам выходить на новый уровень\\.\n\n\
         Подобные мероприятия обычно проходят не чаще 2х раз в месяц\\.\n\n\
         Для оплаты участия в мероприятии, перейдите по кнопке *\"Оплатить\"*\\.\n\n\
         Если тебе интересно узнать о ближайшем мероприятии, нажмите на кнопку \
         *\"Прислать анонс ближайшей программы\"*",
        escape_markdown_v2(first_name)
    )
}

/// Регистрирует пользователя (или обновляет профиль) и отправляет
/// приветственное сообщение с кнопками оплаты и анонса.
pub async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        log::warn!("ctx.from отсутствует при выполнении /start");
        return Ok(());
    };
    let user_id = i64::try_from(from.id.0).unwrap_or(0);

    let registration = get_connection(&deps.db_pool)
        .map_err(|e| e.to_string())
        .and_then(|conn| {
            db::upsert_user(
                &conn,
                &UserProfile {
                    telegram_id: user_id,
                    username: from.username.as_deref(),
                    first_name: Some(from.first_name.as_str()),
                    last_name: from.last_name.as_deref(),
                    language_code: from.language_code.as_deref(),
                    is_bot: from.is_bot,
                    is_premium: from.is_premium,
                },
            )
            .map_err(|e| e.to_string())
        });

    match registration {
        Ok(true) => log::info!("Новый пользователь: ID={} ({:?})", user_id, from.username),
        Ok(false) => log::info!(
            "Пользователь повторно запустил /start: ID={} ({:?})",
            user_id,
            from.username
        ),
        Err(e) => {
            log::error!("Ошибка при работе с БД: {}", e);
            bot.send_message(msg.chat.id, "Произошла ошибка при регистрации. Попробуйте позже!")
                .await?;
            return Ok(());
        }
    }

    let first_name = if from.first_name.is_empty() { "Гость" } else { from.first_name.as_str() };
    if let Err(e) = bot
        .send_message(msg.chat.id, welcome_text(first_name))
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(welcome_keyboard())
        .await
    {
        log::error!("Ошибка при отправке приветственного сообщения: {}", e);
    }

    Ok(())
}

/// Кнопка «Оплатить»: отправляет ссылку на оплату из конфигурации.
pub async fn handle_pay_callback(bot: &Bot, chat_id: ChatId, user_id: i64) -> ResponseResult<()> {
    match *config::PAYMENT_URL {
        Some(ref link) => {
            let message = format!("Для оплаты перейдите по ссылке: [Оплатить]({})", link);
            if let Err(e) = bot
                .send_message(chat_id, message)
                .parse_mode(ParseMode::MarkdownV2)
                .await
            {
                log::error!("Ошибка при отправке ссылки на оплату: {}", e);
            }
        }
        None => {
            bot.send_message(chat_id, "Оплата временно недоступна. Попробуйте позже!")
                .await?;
        }
    }

    log::info!("Пользователь {} нажал кнопку \"Оплатить\".", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_welcome_keyboard_callbacks() {
        let kb = welcome_keyboard();
        let data: Vec<String> = kb
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|btn| match &btn.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect();

        assert_eq!(data, vec!["pay".to_string(), "send_announcement".to_string()]);
    }

    #[test]
    fn test_welcome_text_escapes_name() {
        let text = welcome_text("Стэн!");
        assert!(text.starts_with("*Стэн\\!*"));
        assert!(text.contains("Скуфы маркетинга"));
    }
}
