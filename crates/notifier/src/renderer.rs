//! Message body rendering.
//!
//! Templates use `{{ field }}` placeholders resolved against the recipient's
//! serialized fields (`id`, `name`, `email`, `created_at`). `\{{` emits a
//! literal `{{`. Substituted values are HTML-escaped since bodies are sent as
//! `text/html`.

use std::path::Path;

use courier_common::error::AppError;
use courier_common::types::Recipient;

use crate::error::RenderError;

/// Produces the message body for one recipient.
///
/// Implementations are shared by every worker and must not keep per-call state.
pub trait Renderer: Send + Sync {
    fn render(&self, recipient: &Recipient) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A template parsed once at startup and evaluated per recipient.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    segments: Vec<Segment>,
}

impl TemplateRenderer {
    /// Read and parse a template file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let renderer = Self::parse(&source)?;

        tracing::info!(
            path = %path.display(),
            placeholders = renderer.fields().count(),
            "Template loaded"
        );
        Ok(renderer)
    }

    /// Parse template text into literal and placeholder segments.
    pub fn parse(source: &str) -> Result<Self, AppError> {
        let mut segments = Vec::new();
        let mut literal = String::with_capacity(source.len());
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\\' && chars.peek() == Some(&'{') {
                chars.next();
                if chars.peek() == Some(&'{') {
                    chars.next();
                    literal.push_str("{{");
                } else {
                    literal.push_str("\\{");
                }
            } else if c == '{' && chars.peek() == Some(&'{') {
                chars.next();

                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') if chars.peek() == Some(&'}') => {
                            chars.next();
                            break;
                        }
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(AppError::Template(format!(
                                "Unclosed placeholder: {{{{{name}"
                            )));
                        }
                    }
                }

                let name = name.trim();
                if name.is_empty() {
                    return Err(AppError::Template("Empty placeholder `{{}}`".to_string()));
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field(name.to_string()));
            } else {
                literal.push(c);
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Placeholder names in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, recipient: &Recipient) -> Result<String, RenderError> {
        let context = serde_json::to_value(recipient)?;
        let mut body = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => body.push_str(text),
                Segment::Field(name) => {
                    let value = context
                        .get(name)
                        .filter(|v| !v.is_null())
                        .ok_or_else(|| RenderError::MissingField(name.clone()))?;
                    push_escaped(&mut body, &value_to_string(value));
                }
            }
        }

        Ok(body)
    }
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
