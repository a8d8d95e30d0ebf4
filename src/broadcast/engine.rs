use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::broadcast::audience::{AudienceStore, Recipient};
use crate::broadcast::creative::Creative;
use crate::broadcast::dispatcher::dispatch_chunk;
use crate::broadcast::scheduler;
use crate::broadcast::transport::BroadcastTransport;
use crate::core::config;

/// Итог завершённой рассылки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Размер аудитории
    pub total: usize,
    /// Доставлено (включая доставки с устаревшим счётчиком)
    pub delivered: usize,
    /// Не доставлено
    pub failed: usize,
    /// Доставлено, но счётчик рассылок в базе не обновился
    pub stale_counters: usize,
    /// Фактическая длительность рассылки
    pub elapsed: Duration,
}

impl BroadcastReport {
    /// Рассылка прошла без единой ошибки доставки.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Прогоняет рассылку по всей аудитории: чанк за чанком, с паузой между
/// чанками, чтобы не упереться в rate-limit Telegram.
///
/// Чанки обрабатываются строго последовательно; следующий не стартует,
/// пока не известны все исходы предыдущего. После последнего чанка пауза
/// не нужна — дальше отправок нет. Ошибки отдельных получателей
/// учитываются в отчёте и не прерывают рассылку.
pub async fn run_broadcast(
    transport: &dyn BroadcastTransport,
    store: &dyn AudienceStore,
    recipients: &[Recipient],
    creative: &Creative,
) -> BroadcastReport {
    let started = Instant::now();

    let chunks = scheduler::schedule(recipients, config::broadcast::CHUNK_SIZE);
    let chunk_count = chunks.len();

    let mut report = BroadcastReport {
        total: recipients.len(),
        delivered: 0,
        failed: 0,
        stale_counters: 0,
        elapsed: Duration::ZERO,
    };

    for (idx, chunk) in chunks.iter().enumerate() {
        let outcome = dispatch_chunk(transport, store, chunk, creative).await;
        report.delivered += outcome.delivered;
        report.failed += outcome.failed;
        report.stale_counters += outcome.stale_counters;

        log::debug!(
            "Чанк {}/{}: доставлено {}, ошибок {}",
            idx + 1,
            chunk_count,
            outcome.delivered,
            outcome.failed
        );

        if idx + 1 < chunk_count {
            sleep(config::broadcast::pacing_delay()).await;
        }
    }

    report.elapsed = started.elapsed();
    report
}
