/// Креатив для рассылки, загруженный администратором.
///
/// Медийные варианты несут `file_id` Telegram — файл переиспользуется
/// сервером, повторная загрузка не нужна. Подпись есть только у фото и
/// видео; текстовый вариант несёт сам текст.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creative {
    Photo { file_id: String, caption: Option<String> },
    Video { file_id: String, caption: Option<String> },
    Text { body: String },
    Sticker { file_id: String },
    Voice { file_id: String },
    VideoNote { file_id: String },
}

impl Creative {
    /// Машинное имя типа креатива (для логов).
    pub fn kind(&self) -> &'static str {
        match self {
            Creative::Photo { .. } => "photo",
            Creative::Video { .. } => "video",
            Creative::Text { .. } => "text",
            Creative::Sticker { .. } => "sticker",
            Creative::Voice { .. } => "voice",
            Creative::VideoNote { .. } => "video_note",
        }
    }

    /// Человекочитаемое название типа для сообщений администратору.
    pub fn label(&self) -> &'static str {
        match self {
            Creative::Photo { .. } => "фото",
            Creative::Video { .. } => "видео",
            Creative::Text { .. } => "текст",
            Creative::Sticker { .. } => "стикер",
            Creative::Voice { .. } => "голосовое сообщение",
            Creative::VideoNote { .. } => "кружочек",
        }
    }
}

/// Разбивает слишком длинный текст на части не длиннее `max_chars`
/// символов, чтобы Telegram не выдал ошибку на лимите в 4096.
///
/// Разбиение по фиксированной ширине, без учёта границ слов. Пустой
/// текст даёт пустой список частей.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max_chars).map(|part| part.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_text_short_stays_whole() {
        let parts = split_text("привет", 4096);
        assert_eq!(parts, vec!["привет".to_string()]);
    }

    #[test]
    fn test_split_text_exact_limit() {
        let text = "a".repeat(4096);
        let parts = split_text(&text, 4096);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].chars().count(), 4096);
    }

    #[test]
    fn test_split_text_10000_into_three() {
        let text = "x".repeat(10_000);
        let parts = split_text(&text, 4096);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].chars().count(), 4096);
        assert_eq!(parts[1].chars().count(), 4096);
        assert_eq!(parts[2].chars().count(), 1808);
    }

    #[test]
    fn test_split_text_counts_chars_not_bytes() {
        // Cyrillic is two bytes per char; the split must not cut UTF-8
        let text = "ж".repeat(5000);
        let parts = split_text(&text, 4096);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].chars().count(), 4096);
        assert_eq!(parts[1].chars().count(), 904);
    }

    #[test]
    fn test_split_text_empty() {
        assert!(split_text("", 4096).is_empty());
    }

    #[test]
    fn test_creative_kind_names() {
        let photo = Creative::Photo {
            file_id: "f".to_string(),
            caption: None,
        };
        assert_eq!(photo.kind(), "photo");
        assert_eq!(photo.label(), "фото");

        let note = Creative::VideoNote { file_id: "f".to_string() };
        assert_eq!(note.kind(), "video_note");
        assert_eq!(note.label(), "кружочек");
    }
}
