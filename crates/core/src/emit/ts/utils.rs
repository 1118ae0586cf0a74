//! Common utilities for TypeScript code generation.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde_json::Value;

use super::types::TsLiteral;

/// TypeScript reserved words that cannot be used as identifiers.
pub static TS_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "debugger",
        "default",
        "delete",
        "do",
        "else",
        "enum",
        "export",
        "extends",
        "false",
        "finally",
        "for",
        "function",
        "if",
        "import",
        "in",
        "instanceof",
        "new",
        "null",
        "return",
        "super",
        "switch",
        "this",
        "throw",
        "true",
        "try",
        "typeof",
        "var",
        "void",
        "while",
        "with",
        "yield",
        "let",
        "static",
        "implements",
        "interface",
        "package",
        "private",
        "protected",
        "public",
        "await",
        "async",
    ]
    .into_iter()
    .collect()
});

/// Check if an identifier needs bracket notation (or quoting) for property/key access.
///
/// Returns true if the name:
/// - Is empty
/// - Doesn't start with a letter, underscore, or dollar sign
/// - Contains characters other than alphanumeric, underscore, or dollar sign
pub fn needs_bracket_notation(name: &str) -> bool {
    name.is_empty()
        || !name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape a string for use in a double-quoted JavaScript/TypeScript string literal.
pub fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote a string if needed for use as a property key or enum key.
pub fn quote_if_needed(name: &str) -> String {
    if needs_bracket_notation(name) {
        format!("\"{}\"", escape_js_string(name))
    } else {
        name.to_string()
    }
}

/// Format a parameter access expression (e.g., `params.foo` or `params["foo-bar"]`).
///
/// Optional properties use optional chaining on the object.
pub fn format_param_access(obj: &str, prop: &str, required: bool) -> String {
    if needs_bracket_notation(prop) {
        if required {
            format!("{obj}[\"{}\"]", escape_js_string(prop))
        } else {
            format!("{obj}?.[\"{}\"]", escape_js_string(prop))
        }
    } else if required {
        format!("{obj}.{prop}")
    } else {
        format!("{obj}?.{prop}")
    }
}

/// Make `name` a usable identifier: digit-leading names and reserved words get an `_` prefix.
pub fn sanitize_ts_identifier(name: &str) -> String {
    if name.is_empty() {
        return "_empty".to_string();
    }
    let mut result = name.to_string();
    if result.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        result = format!("_{result}");
    }
    if TS_RESERVED_WORDS.contains(result.as_str()) {
        result = format!("_{result}");
    }
    result
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

fn split_words(s: &str) -> Vec<&str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect()
}

/// `get_users_by_id` → `getUsersById`, `ListUsers` → `listUsers`.
pub fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    for (i, part) in split_words(s).into_iter().enumerate() {
        if i == 0 {
            if part.chars().all(|c| !c.is_ascii_lowercase()) {
                result.push_str(&part.to_ascii_lowercase());
            } else {
                let mut chars = part.chars();
                if let Some(first) = chars.next() {
                    result.push(first.to_ascii_lowercase());
                    result.extend(chars);
                }
            }
        } else {
            result.push_str(&capitalize_first(part));
        }
    }
    sanitize_ts_identifier(&result)
}

/// `user.profile` → `UserProfile`, `pet_status` → `PetStatus`.
pub fn to_pascal_case(s: &str) -> String {
    let joined: String = split_words(s).into_iter().map(capitalize_first).collect();
    if joined.is_empty() {
        return "_Empty".to_string();
    }
    if joined.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("_{joined}");
    }
    joined
}

/// Convert a JSON enum value to a TypeScript literal.
pub fn json_to_literal(v: &Value) -> Option<TsLiteral> {
    match v {
        Value::String(s) => Some(TsLiteral::String(s.clone())),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => TsLiteral::Int(i),
            None => TsLiteral::Number(n.as_f64().unwrap_or_default()),
        }),
        Value::Bool(b) => Some(TsLiteral::Bool(*b)),
        Value::Null => Some(TsLiteral::Null),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Generate a key name for an enum value (used in const enum objects).
pub fn enum_value_to_key(v: &Value, index: usize) -> String {
    match v {
        Value::String(s) => quote_if_needed(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) if i >= 0 => format!("VALUE_{i}"),
            _ => format!("VALUE_{index}"),
        },
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Null => "NULL".to_string(),
        Value::Array(_) | Value::Object(_) => format!("VALUE_{index}"),
    }
}
