use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::broadcast::creative::Creative;

/// Хранилище загруженных креативов, по одному на администратора.
///
/// Новая загрузка перезаписывает предыдущую; подтверждение или отмена
/// очищают слот. Живёт только в памяти процесса: перезапуск бота
/// сбрасывает незавершённые рассылки.
#[derive(Clone, Default)]
pub struct CreativeStaging {
    /// admin_id -> ожидающий подтверждения креатив
    slots: Arc<Mutex<HashMap<i64, Creative>>>,
}

impl CreativeStaging {
    /// Создает пустое хранилище.
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Сохраняет креатив администратора, перезаписывая предыдущий.
    pub async fn stage(&self, admin_id: i64, creative: Creative) {
        let mut slots = self.slots.lock().await;
        slots.insert(admin_id, creative);
    }

    /// Возвращает текущий креатив администратора, не очищая слот.
    pub async fn peek(&self, admin_id: i64) -> Option<Creative> {
        let slots = self.slots.lock().await;
        slots.get(&admin_id).cloned()
    }

    /// Забирает креатив, очищая слот — одной операцией под общим локом,
    /// чтобы два одновременных подтверждения не отправили рассылку дважды.
    pub async fn take(&self, admin_id: i64) -> Option<Creative> {
        let mut slots = self.slots.lock().await;
        slots.remove(&admin_id)
    }

    /// Удаляет креатив администратора. Идемпотентна.
    pub async fn clear(&self, admin_id: i64) {
        let mut slots = self.slots.lock().await;
        slots.remove(&admin_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &str) -> Creative {
        Creative::Text { body: body.to_string() }
    }

    #[tokio::test]
    async fn test_stage_and_peek() {
        let staging = CreativeStaging::new();
        staging.stage(1, text("первый")).await;

        assert_eq!(staging.peek(1).await, Some(text("первый")));
        // peek не очищает
        assert_eq!(staging.peek(1).await, Some(text("первый")));
        assert_eq!(staging.peek(2).await, None);
    }

    #[tokio::test]
    async fn test_stage_overwrites() {
        let staging = CreativeStaging::new();
        staging.stage(1, text("первый")).await;
        staging.stage(1, text("второй")).await;

        assert_eq!(staging.peek(1).await, Some(text("второй")));
    }

    #[tokio::test]
    async fn test_take_clears_slot() {
        let staging = CreativeStaging::new();
        staging.stage(1, text("единственный")).await;

        assert_eq!(staging.take(1).await, Some(text("единственный")));
        // Второе подтверждение уже ничего не получает
        assert_eq!(staging.take(1).await, None);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let staging = CreativeStaging::new();
        staging.clear(1).await;
        staging.clear(1).await;
        assert_eq!(staging.peek(1).await, None);
    }

    #[tokio::test]
    async fn test_slots_are_per_admin() {
        let staging = CreativeStaging::new();
        staging.stage(1, text("от первого")).await;
        staging.stage(2, text("от второго")).await;

        assert_eq!(staging.take(1).await, Some(text("от первого")));
        assert_eq!(staging.peek(2).await, Some(text("от второго")));
    }
}
