use futures_util::future::join_all;
use teloxide::types::ChatId;

use crate::broadcast::audience::{AudienceStore, Recipient};
use crate::broadcast::creative::{split_text, Creative};
use crate::broadcast::transport::BroadcastTransport;
use crate::core::config;
use crate::core::error::AppResult;

/// Исход доставки одному получателю.
///
/// Недоставленное сообщение и доставленное-но-не-учтённое — разные
/// ситуации: во втором случае пользователь креатив получил, устарел
/// только его счётчик рассылок.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Сообщение отправлено, счётчик обновлён
    Delivered,
    /// Сообщение отправлено, но счётчик в базе обновить не удалось
    DeliveredCounterStale,
    /// Отправка не удалась
    Failed,
}

/// Итог обработки одного чанка.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Доставлено (включая доставки с устаревшим счётчиком)
    pub delivered: usize,
    /// Не доставлено
    pub failed: usize,
    /// Из доставленных — с необновлённым счётчиком
    pub stale_counters: usize,
}

/// Отправляет креатив одному получателю, выбирая операцию транспорта по
/// типу креатива. Текст длиннее лимита уходит несколькими сообщениями
/// подряд.
async fn send_creative(transport: &dyn BroadcastTransport, chat_id: ChatId, creative: &Creative) -> AppResult<()> {
    match creative {
        Creative::Photo { file_id, caption } => transport.send_photo(chat_id, file_id, caption.as_deref()).await,
        Creative::Video { file_id, caption } => transport.send_video(chat_id, file_id, caption.as_deref()).await,
        Creative::Text { body } => {
            for part in split_text(body, config::broadcast::MAX_MESSAGE_LENGTH) {
                transport.send_text(chat_id, &part).await?;
            }
            Ok(())
        }
        Creative::Sticker { file_id } => transport.send_sticker(chat_id, file_id).await,
        Creative::Voice { file_id } => transport.send_voice(chat_id, file_id).await,
        Creative::VideoNote { file_id } => transport.send_video_note(chat_id, file_id).await,
    }
}

/// Доставляет креатив одному получателю и обновляет его счётчик.
///
/// Любая ошибка остаётся локальной для этого получателя.
async fn deliver_to(
    transport: &dyn BroadcastTransport,
    store: &dyn AudienceStore,
    recipient: &Recipient,
    creative: &Creative,
) -> DeliveryOutcome {
    if let Err(e) = send_creative(transport, recipient.chat_id, creative).await {
        log::error!("Ошибка при отправке пользователю {}: {}", recipient.chat_id, e);
        return DeliveryOutcome::Failed;
    }

    if let Err(e) = store.increment_sent_counter(recipient.chat_id).await {
        log::warn!(
            "Сообщение доставлено пользователю {}, но счётчик рассылок не обновлён: {}",
            recipient.chat_id,
            e
        );
        return DeliveryOutcome::DeliveredCounterStale;
    }

    DeliveryOutcome::Delivered
}

/// Рассылает креатив одному чанку получателей.
///
/// Все отправки внутри чанка идут одновременно; функция возвращается
/// только когда известен исход каждой. Падение одного получателя не
/// отменяет остальных.
pub async fn dispatch_chunk(
    transport: &dyn BroadcastTransport,
    store: &dyn AudienceStore,
    chunk: &[Recipient],
    creative: &Creative,
) -> ChunkOutcome {
    let deliveries = chunk
        .iter()
        .map(|recipient| deliver_to(transport, store, recipient, creative));
    let outcomes = join_all(deliveries).await;

    let mut result = ChunkOutcome::default();
    for outcome in outcomes {
        match outcome {
            DeliveryOutcome::Delivered => result.delivered += 1,
            DeliveryOutcome::DeliveredCounterStale => {
                result.delivered += 1;
                result.stale_counters += 1;
            }
            DeliveryOutcome::Failed => result.failed += 1,
        }
    }
    result
}
