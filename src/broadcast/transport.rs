use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile};

use crate::core::error::AppResult;

/// Транспорт доставки креативов: по одной операции на тип креатива.
///
/// Абстракция над Telegram Bot API, чтобы диспетчер рассылки можно было
/// прогонять в тестах против фейкового транспорта. Каждый вызов может
/// упасть независимо от остальных (бан бота пользователем, сеть и т.д.).
#[async_trait]
pub trait BroadcastTransport: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<()>;
    async fn send_photo(&self, chat_id: ChatId, file_id: &str, caption: Option<&str>) -> AppResult<()>;
    async fn send_video(&self, chat_id: ChatId, file_id: &str, caption: Option<&str>) -> AppResult<()>;
    async fn send_sticker(&self, chat_id: ChatId, file_id: &str) -> AppResult<()>;
    async fn send_voice(&self, chat_id: ChatId, file_id: &str) -> AppResult<()>;
    async fn send_video_note(&self, chat_id: ChatId, file_id: &str) -> AppResult<()>;
}

fn input_file(file_id: &str) -> InputFile {
    InputFile::file_id(FileId(file_id.to_string()))
}

#[async_trait]
impl BroadcastTransport for Bot {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<()> {
        Requester::send_message(self, chat_id, text.to_string()).await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, file_id: &str, caption: Option<&str>) -> AppResult<()> {
        let mut req = Requester::send_photo(self, chat_id, input_file(file_id));
        if let Some(caption) = caption.filter(|c| !c.is_empty()) {
            req = req.caption(caption.to_string());
        }
        req.await?;
        Ok(())
    }

    async fn send_video(&self, chat_id: ChatId, file_id: &str, caption: Option<&str>) -> AppResult<()> {
        let mut req = Requester::send_video(self, chat_id, input_file(file_id));
        if let Some(caption) = caption.filter(|c| !c.is_empty()) {
            req = req.caption(caption.to_string());
        }
        req.await?;
        Ok(())
    }

    async fn send_sticker(&self, chat_id: ChatId, file_id: &str) -> AppResult<()> {
        Requester::send_sticker(self, chat_id, input_file(file_id)).await?;
        Ok(())
    }

    async fn send_voice(&self, chat_id: ChatId, file_id: &str) -> AppResult<()> {
        Requester::send_voice(self, chat_id, input_file(file_id)).await?;
        Ok(())
    }

    async fn send_video_note(&self, chat_id: ChatId, file_id: &str) -> AppResult<()> {
        Requester::send_video_note(self, chat_id, input_file(file_id)).await?;
        Ok(())
    }
}
