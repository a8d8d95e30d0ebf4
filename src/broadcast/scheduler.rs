use crate::core::config;

/// Разбивает аудиторию на чанки не больше `chunk_size` получателей,
/// сохраняя исходный порядок. Каждый получатель попадает ровно в один
/// чанк.
pub fn schedule<T: Clone>(recipients: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    let chunk_size = chunk_size.max(1);
    recipients.chunks(chunk_size).map(|chunk| chunk.to_vec()).collect()
}

/// Оценка времени рассылки в секундах: один чанк в секунду плюс
/// фиксированная накладная константа. Только для показа администратору,
/// на выполнение не влияет.
pub fn estimate_duration_secs(recipient_count: usize, chunk_size: usize) -> u64 {
    let chunk_size = chunk_size.max(1);
    recipient_count.div_ceil(chunk_size) as u64 + config::broadcast::ESTIMATE_OVERHEAD_SECS
}
