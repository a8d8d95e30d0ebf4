//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use crate::telegram::announcements::handle_announcements_callback;
use crate::telegram::bot::Command;
use crate::telegram::broadcast::{
    handle_cancel_callback, handle_confirm_callback, handle_creative_submission,
};
use crate::telegram::start::{handle_pay_callback, handle_start_command};
use crate::telegram::stats::handle_stats_command;
use crate::telegram::types::{HandlerDeps, HandlerError};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// This function returns a handler tree that can be used with teloxide's
/// Dispatcher. The same schema is used in production and in integration
/// tests.
///
/// # Arguments
/// * `deps` - Handler dependencies (database pool, creative staging)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_creatives = deps.clone();
    let deps_callbacks = deps;

    dptree::entry()
        // Commands first so /start and /stats never land in staging
        .branch(command_handler(deps_commands))
        // Admin media/text submissions become staged creatives
        .branch(creative_handler(deps_creatives))
        // Inline keyboard buttons
        .branch(callback_handler(deps_callbacks))
}

/// Handler for bot commands (/start, /stats)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => {
                        handle_start_command(&bot, &msg, &deps).await?;
                    }
                    Command::Stats => {
                        handle_stats_command(&bot, &msg, &deps).await?;
                    }
                }
                Ok(())
            }
        },
    ))
}

/// Handler for admin creative submissions (media or plain text)
fn creative_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| {
            msg.photo().is_some()
                || msg.video().is_some()
                || msg.sticker().is_some()
                || msg.voice().is_some()
                || msg.video_note().is_some()
                || msg.text().map(|text| !text.starts_with('/')).unwrap_or(false)
        })
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_creative_submission(&bot, &msg, &deps).await {
                    log::error!("Ошибка обработки креатива: {:?}", e);
                }
                Ok(())
            }
        })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let Some(data) = q.data.clone() else {
                return Ok(());
            };
            let user_id = i64::try_from(q.from.id.0).unwrap_or(0);
            let chat_id = q.message.as_ref().map(|m| m.chat().id).unwrap_or(ChatId(user_id));

            match data.as_str() {
                "pay" => {
                    bot.answer_callback_query(q.id.clone()).await?;
                    handle_pay_callback(&bot, chat_id, user_id).await?;
                }
                "send_announcement" => {
                    bot.answer_callback_query(q.id.clone()).await?;
                    handle_announcements_callback(&bot, chat_id).await?;
                }
                "confirm_broadcast" => {
                    handle_confirm_callback(&bot, &q, &deps).await?;
                }
                "cancel_broadcast" => {
                    handle_cancel_callback(&bot, &q, &deps).await?;
                }
                other => {
                    log::warn!("Неизвестный callback: {}", other);
                }
            }
            Ok(())
        }
    })
}
