//! Template Compilation
//!
//! A compiled template is a list of literal text and data lookups.

use crate::TemplateError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Text(String),
    Escaped(Vec<String>),
    Raw(Vec<String>),
}

/// Compiled template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    /// Compile template source
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                parts.push(Part::Text(rest[..start].to_string()));
            }

            let raw = rest[start..].starts_with("{{{");
            let (open, close) = if raw { ("{{{", "}}}") } else { ("{{", "}}") };
            let body_start = start + open.len();
            let body_len = rest[body_start..]
                .find(close)
                .ok_or(TemplateError::UnclosedTag(offset + start))?;

            let name = rest[body_start..body_start + body_len].trim();
            if name.is_empty() {
                return Err(TemplateError::EmptyTag(offset + start));
            }
            let path = lookup_path(name);
            parts.push(if raw { Part::Raw(path) } else { Part::Escaped(path) });

            let consumed = body_start + body_len + close.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            parts.push(Part::Text(rest.to_string()));
        }

        Ok(Self { parts })
    }

    /// Render with `data`; missing values render as nothing
    pub fn render(&self, data: &Value) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Escaped(path) => out.push_str(&escape_html(&stringify(resolve(data, path)))),
                Part::Raw(path) => out.push_str(&stringify(resolve(data, path))),
            }
        }
        out
    }
}

fn lookup_path(name: &str) -> Vec<String> {
    if name == "this" || name == "." {
        return Vec::new();
    }
    name.split('.').map(|s| s.trim().to_string()).collect()
}

fn resolve<'a>(data: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(data, |value, key| match value {
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => value.get(key.as_str()),
    })
}

fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            _ => out.push(c),
        }
    }
    out
}
