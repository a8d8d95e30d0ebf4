use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use teloxide::prelude::*;
use tower_http::cors::{Any, CorsLayer};

use crate::payments::signature::verify_signature;
use crate::storage::db::{self, DbPool, PaymentRecord};
use crate::storage::get_connection;

/// Способ оплаты, как его понимает наша база.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Card,
    Sbp,
    Qiwi,
    Yandex,
    PayPal,
    Crypto,
}

impl PaymentMethod {
    /// Разбирает код способа оплаты из вебхука Продамуса.
    pub fn from_provider_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "ac" | "ackz" | "acf" => Some(PaymentMethod::Card),
            "sbp" => Some(PaymentMethod::Sbp),
            "qw" | "qiwi" => Some(PaymentMethod::Qiwi),
            "pc" | "yandex" => Some(PaymentMethod::Yandex),
            "paypal" => Some(PaymentMethod::PayPal),
            "crypto" => Some(PaymentMethod::Crypto),
            _ => None,
        }
    }

    /// Значение для колонки `payment_method`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Sbp => "sbp",
            PaymentMethod::Qiwi => "qiwi",
            PaymentMethod::Yandex => "yandex",
            PaymentMethod::PayPal => "paypal",
            PaymentMethod::Crypto => "crypto",
        }
    }
}

fn map_payment_method(raw: Option<&str>) -> Option<PaymentMethod> {
    let code = raw?;
    match PaymentMethod::from_provider_code(code) {
        Some(method) => Some(method),
        None => {
            log::warn!("Неизвестный payment_method из Продамуса: {}", code);
            None
        }
    }
}

/// Общее состояние обработчиков вебхука.
#[derive(Clone)]
pub struct WebhookState {
    bot: Bot,
    db_pool: Arc<DbPool>,
    secret_key: Arc<String>,
}

/// Обработчик `POST /webhook/payment`.
///
/// Проверяет подпись, валидирует поля, сохраняет платёж и уведомляет
/// пользователя в чате. Ошибка уведомления не меняет HTTP-ответ:
/// платёж уже записан.
async fn handle_payment_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, &'static str) {
    log::info!("📩 Получены данные вебхука: {}", body);

    let signature = headers.get("sign").and_then(|value| value.to_str().ok());
    let verified = signature
        .map(|sign| verify_signature(&body, &state.secret_key, sign))
        .unwrap_or(false);
    if !verified {
        log::warn!("⚠️ Ошибка верификации подписи запроса.");
        return (StatusCode::BAD_REQUEST, "Invalid signature");
    }

    let order_id = body.get("order_id").and_then(|v| v.as_str());
    let status = body.get("status").and_then(|v| v.as_str());
    let amount_field = body.get("amount");
    let user_id_field = body.get("user_id");

    let (Some(order_id), Some(status)) = (order_id, status) else {
        log::warn!("⚠️ Некорректные данные в запросе (отсутствуют ключевые поля).");
        return (StatusCode::BAD_REQUEST, "Invalid request data");
    };
    if amount_field.is_none() || user_id_field.is_none() {
        log::warn!("⚠️ Некорректные данные в запросе (отсутствуют ключевые поля).");
        return (StatusCode::BAD_REQUEST, "Invalid request data");
    }

    let user_id = match user_id_field.and_then(|v| v.as_str()) {
        Some(raw) if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) => match raw.parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                log::warn!("⚠️ user_id не является корректным числом: {}", raw);
                return (StatusCode::BAD_REQUEST, "Invalid user_id");
            }
        },
        other => {
            log::warn!("⚠️ user_id не является корректным числом: {:?}", other);
            return (StatusCode::BAD_REQUEST, "Invalid user_id");
        }
    };

    let amount = match amount_field {
        Some(serde_json::Value::String(raw)) => raw.parse::<f64>().ok(),
        Some(value) => value.as_f64(),
        None => None,
    };
    let Some(amount) = amount else {
        log::error!("❌ Ошибка конвертации amount: {:?}", amount_field);
        return (StatusCode::BAD_REQUEST, "Invalid amount format");
    };

    let conn = match get_connection(&state.db_pool) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("❌ Ошибка записи в БД: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    match db::get_user(&conn, user_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            log::warn!("⚠️ Пользователь не найден: {}", user_id);
            return (StatusCode::NOT_FOUND, "User not found");
        }
        Err(e) => {
            log::error!("❌ Ошибка записи в БД: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    }

    let payment_method = map_payment_method(body.get("payment_method").and_then(|v| v.as_str()));
    let status_upper = status.to_uppercase();

    if let Err(e) = db::upsert_payment(
        &conn,
        &PaymentRecord {
            order_id,
            user_id,
            amount,
            status: &status_upper,
            payment_method: payment_method.map(|m| m.as_str()),
        },
    ) {
        log::error!("❌ Ошибка записи в БД: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
    }
    log::info!("✅ Оплата {} обновлена: {}", order_id, status);

    let notification = match status {
        "success" => format!(
            "✅ Оплата на сумму {} RUB успешно прошла!\n\nСсылка на опросник...",
            amount
        ),
        "pending" => format!(
            "⌛ Ваша оплата на сумму {} RUB обрабатывается. Пожалуйста, дождитесь подтверждения!",
            amount
        ),
        _ => "❌ Ошибка оплаты. Попробуйте снова.".to_string(),
    };

    match state.bot.send_message(ChatId(user_id), notification).await {
        Ok(_) => log::info!("📩 Уведомление об оплате отправлено пользователю {}", user_id),
        Err(e) => log::error!("❌ Ошибка отправки сообщения пользователю {}: {}", user_id, e),
    }

    (StatusCode::OK, "OK")
}

/// Запускает HTTP-сервер платёжных вебхуков.
pub async fn run_webhook_server(port: u16, bot: Bot, db_pool: Arc<DbPool>, secret_key: String) -> anyhow::Result<()> {
    let state = WebhookState {
        bot,
        db_pool,
        secret_key: Arc::new(secret_key),
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/webhook/payment", post(handle_payment_webhook))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("🚀 Webhook сервер запущен на порту {}", port);
    axum::serve(listener, app).await?;

    Ok(())
}
