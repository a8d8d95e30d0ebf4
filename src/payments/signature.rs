use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Вычисляет HMAC-SHA256 (hex) тела вебхука.
///
/// Продамус подписывает JSON, сериализованный с отсортированными по
/// алфавиту ключами. `serde_json::Value` хранит объекты в BTreeMap,
/// поэтому повторная сериализация даёт ровно такую строку.
pub fn compute_signature(data: &serde_json::Value, secret_key: &str) -> String {
    let payload = data.to_string();

    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Проверяет подпись из заголовка `Sign` вебхука.
pub fn verify_signature(data: &serde_json::Value, secret_key: &str, signature: &str) -> bool {
    let computed = compute_signature(data, secret_key);

    if computed != signature {
        log::warn!(
            "⚠️ Подписи не совпадают! Ожидалось: {}, получено: {}",
            signature,
            computed
        );
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_and_verify_round_trip() {
        let body = json!({
            "order_id": "order-1",
            "amount": "990",
            "status": "success",
            "user_id": "123456789"
        });

        let signature = compute_signature(&body, "secret");
        assert!(verify_signature(&body, "secret", &signature));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let body = json!({ "order_id": "order-1", "amount": "990" });
        let signature = compute_signature(&body, "secret");

        let tampered = json!({ "order_id": "order-1", "amount": "9990" });
        assert!(!verify_signature(&tampered, "secret", &signature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = json!({ "order_id": "order-1" });
        let signature = compute_signature(&body, "secret");
        assert!(!verify_signature(&body, "other-secret", &signature));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        // Поставщик может прислать поля в любом порядке; подпись
        // считается по отсортированной сериализации
        let a: serde_json::Value = serde_json::from_str(r#"{"b":"2","a":"1"}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"a":"1","b":"2"}"#).unwrap();

        assert_eq!(compute_signature(&a, "secret"), compute_signature(&b, "secret"));
    }
}
