//! Rendering job results for the terminal.

use clap::ValueEnum;
use serde_json::Value;

/// How results are printed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Indented, YAML-like text.
    #[default]
    Nested,
    /// Pretty-printed JSON.
    Json,
}

/// Render a value as text lines in the chosen format.
pub fn render(value: &Value, format: OutputFormat) -> Vec<String> {
    match format {
        OutputFormat::Nested => {
            let mut out = Vec::new();
            nested(value, 0, "", &mut out);
            out
        }
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .unwrap_or_else(|_| value.to_string())
            .lines()
            .map(str::to_string)
            .collect(),
    }
}

fn nested(value: &Value, indent: usize, prefix: &str, out: &mut Vec<String>) {
    let pad = " ".repeat(indent);
    match value {
        Value::Null => out.push(format!("{pad}{prefix}None")),
        Value::Bool(true) => out.push(format!("{pad}{prefix}True")),
        Value::Bool(false) => out.push(format!("{pad}{prefix}False")),
        Value::Number(n) => out.push(format!("{pad}{prefix}{n}")),
        Value::String(s) => {
            let mut lines = s.lines();
            out.push(format!("{pad}{prefix}{}", lines.next().unwrap_or_default()));
            for line in lines {
                out.push(format!("{pad}{}{line}", " ".repeat(prefix.len())));
            }
        }
        Value::Array(items) => {
            for item in items {
                if item.is_object() {
                    out.push(format!("{pad}|_"));
                    nested(item, indent + 2, "", out);
                } else if item.is_array() {
                    out.push(format!("{pad}|_"));
                    nested(item, indent + 2, "- ", out);
                } else {
                    nested(item, indent, "- ", out);
                }
            }
        }
        Value::Object(map) => {
            if indent > 0 {
                out.push(format!("{pad}----------"));
            }
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                out.push(format!("{pad}{prefix}{key}:"));
                nested(&map[key.as_str()], indent + 4, "", out);
            }
        }
    }
}
