//! Extra utilties for use elsewhere in the API.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();

    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
        })
        .is_match(email)
}

/// Generates a random password for members whose password was reset.
pub fn generate_temporary_password() -> String {
    base64::encode_config(Uuid::new_v4().as_bytes(), base64::URL_SAFE_NO_PAD)
}

/// Deserializes an optional HTML checkbox value.
///
/// Forms send `"on"` for a checked box, JSON clients send a boolean.
pub fn deserialize_checkbox<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Checkbox {
        Bool(bool),
        Text(String),
    }

    match Option::<Checkbox>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Checkbox::Bool(checked)) => Ok(Some(checked)),
        Some(Checkbox::Text(text)) => match text.as_str() {
            "on" | "true" => Ok(Some(true)),
            "off" | "false" | "" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "expected a checkbox value, found {}",
                other
            ))),
        },
    }
}
