//! Нестрогая десериализация значений, приходящих из разных хранилищ.
//!
//! PostgREST отдаёт `numeric` то числом, то строкой, а SQLite хранит
//! булевы значения как 0/1. Эти функции принимают все варианты.

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// bool из `true`/`false`, `0`/`1` или строк `"true"`/`"false"`/`"t"`/`"f"`
pub fn bool_from_any<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().map(|v| v != 0).unwrap_or(false)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(true),
            "false" | "f" | "0" => Ok(false),
            other => Err(de::Error::custom(format!("invalid boolean: {}", other))),
        },
        other => Err(de::Error::custom(format!("invalid boolean: {}", other))),
    }
}

/// Необязательное число: число, числовая строка или null.
/// Пустая или нечисловая строка трактуется как отсутствие значения.
pub fn opt_f64_from_any<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => Ok(s.trim().parse::<f64>().ok()),
        Some(other) => Err(de::Error::custom(format!("invalid number: {}", other))),
    }
}

/// Необязательная строка: строки проходят как есть, числа приводятся к строке.
/// Нужна для дат, которые некоторые источники отдают как epoch или int.
pub fn opt_string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::custom(format!("invalid string: {}", other))),
    }
}

/// Строка, где null и отсутствие поля дают пустую строку
pub fn string_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string_from_any(deserializer)?.unwrap_or_default())
}
