//! Config redaction: safe-to-print snapshots with credentials masked.

use serde_json::Value;

use crate::schema::SignVisionConfig;

static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "token",
    "accessToken",
    "secret",
    "password",
];

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Redact a config JSON value, masking every sensitive field.
///
/// Keeps the first four characters as a hint when the secret is long enough.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

/// Redacted JSON view of a typed config.
pub fn redacted_config(config: &SignVisionConfig) -> Value {
    serde_json::to_value(config)
        .map(|v| redact(&v))
        .unwrap_or(Value::Null)
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            let hint = if s.chars().count() > 8 {
                format!("{}***", s.chars().take(4).collect::<String>())
            } else {
                "***".to_string()
            };
            Value::String(hint)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_api_key() {
        let v = json!({"model": {"apiKey": "AIzaSyExampleKey123", "provider": "gemini"}});
        let r = redact(&v);
        assert_eq!(r["model"]["apiKey"], "AIza***");
        assert_eq!(r["model"]["provider"], "gemini");
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        let r = redact(&json!({"token": "abc"}));
        assert_eq!(r["token"], "***");
    }

    #[test]
    fn typed_config_is_redacted() {
        let mut config = SignVisionConfig::default();
        config.model.api_key = Some("sk-1234567890abcdef".into());
        let r = redacted_config(&config);
        assert_eq!(r["model"]["apiKey"], "sk-1***");
        assert_eq!(r["server"]["port"], 8000);
    }
}
