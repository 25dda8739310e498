//! Shallow XSS escaping for request input.
//!
//! Strings have `<`, `>`, `"` and `'` replaced by HTML entities and are
//! trimmed. This is not an HTML parser; it only neutralises markup characters
//! before values reach handlers.

use serde_json::{Map, Value};

/// Escape markup characters and trim surrounding whitespace
pub fn escape_str(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape every string inside a JSON value.
///
/// Object keys are left as-is; numbers, booleans and null pass through.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(b),
        Value::Number(n) => Value::Number(n),
        Value::String(s) => Value::String(escape_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, sanitize_value(value)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

/// Escape the values of an `application/x-www-form-urlencoded` query string.
///
/// Pairs whose value cannot be percent-decoded are kept unchanged.
pub fn sanitize_query(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, raw_value)) => {
                let plus_decoded = raw_value.replace('+', " ");
                match urlencoding::decode(&plus_decoded) {
                    Ok(decoded) => {
                        format!("{}={}", key, urlencoding::encode(&escape_str(&decoded)))
                    }
                    Err(_) => pair.to_string(),
                }
            }
            None => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}
