#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

use serde_json::Value;

fn coerce(value: &Value) -> String {
    match value {
        Value::String(text) => return text.to_string(),
        Value::Null => return "".to_string(),
        _ => return value.to_string(),
    }
}

fn non_null<'a>(value: Option<&'a Value>) -> Option<&'a Value> {
    return value.filter(|value| return !value.is_null());
}

/// Reduces any backend response body to the single string that gets
/// displayed. Recognized shapes, in priority order:
///
/// 1. a bare string
/// 2. `{ "response": { "content": .. } }`
/// 3. `{ "response": .. }`, objects serialized to JSON
/// 4. `{ "content": .. }`
/// 5. anything else, serialized to JSON
pub fn normalize(raw: &Value) -> String {
    let text = match raw {
        Value::String(text) => text.to_string(),
        Value::Object(body) => {
            let response = non_null(body.get("response"));
            let content = non_null(body.get("content"));

            if let Some(nested) = response.and_then(|res| return non_null(res.get("content"))) {
                coerce(nested)
            } else if let Some(res) = response {
                coerce(res)
            } else if let Some(content) = content {
                coerce(content)
            } else {
                raw.to_string()
            }
        }
        _ => coerce(raw),
    };

    return text.trim().to_string();
}

/// Bodies that aren't JSON are treated as bare strings.
pub fn normalize_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => return normalize(&value),
        Err(_) => return body.trim().to_string(),
    }
}

/// Pulls the `error` field out of a failed response body, if there is one.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    let message = coerce(non_null(value.get("error"))?).trim().to_string();
    if message.is_empty() {
        return None;
    }

    return Some(message);
}
