//! Text rendering helpers shared by the prompt blocks.

use serde_json::{Map, Value};

/// Uppercases the first character and lowercases the rest.
pub(crate) fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Renders a JSON value as prompt text; lists are joined with `", "`.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(", "),
        Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

/// Appends `  Key: value` lines for every entry of a section.
pub(crate) fn push_section(lines: &mut Vec<String>, title: &str, section: &Map<String, Value>) {
    lines.push(format!("{title}:"));
    for (key, value) in section {
        lines.push(format!("  {}: {}", capitalize(key), render_value(value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn capitalize_matches_title_style() {
        assert_eq!(capitalize("eye_color"), "Eye_color");
        assert_eq!(capitalize("HEIGHT"), "Height");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn render_value_joins_lists() {
        assert_eq!(render_value(&json!(["chess", "tea"])), "chess, tea");
        assert_eq!(render_value(&json!("calm")), "calm");
        assert_eq!(render_value(&json!(42)), "42");
        assert_eq!(render_value(&json!(null)), "N/A");
    }
}
