//! Segment text templates.
//!
//! A template is literal text with `{field}` placeholders. A placeholder may
//! carry a format spec: `{pct:03}` pads an integer with zeros, `{load1:.2}`
//! fixes the number of decimals. `{{` and `}}` produce literal braces.

use std::fmt;

use barline_types::{FormatSpec, RawValue};
use thiserror::Error;

/// Errors produced while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed '{{' at byte {0}")]
    Unclosed(usize),

    #[error("unmatched '}}' at byte {0}")]
    UnmatchedClose(usize),

    #[error("invalid field name '{0}'")]
    BadFieldName(String),

    #[error("invalid format spec '{0}'")]
    BadFormatSpec(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Field { name: String, spec: FormatSpec },
}

/// A parsed segment template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    pieces: Vec<Piece>,
}

impl Template {
    /// Parse template text.
    ///
    /// ```rust
    /// use barline_sdk::Template;
    /// use barline_types::{RawValue, Volume};
    ///
    /// let template = Template::parse("V: {pct:03}").unwrap();
    /// let raw = RawValue::Volume(Volume { pct: 50, muted: false });
    /// assert_eq!(template.render(&raw), "V: 050");
    /// ```
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedClose(pos)),
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(pos));
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(parse_placeholder(&body)?);
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            pieces,
        })
    }

    /// The template text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of every field referenced by a placeholder.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Field { name, .. } => Some(name.as_str()),
            Piece::Literal(_) => None,
        })
    }

    /// Render against a raw value. Fields the value lacks render as `?`.
    pub fn render(&self, raw: &RawValue) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Field { name, spec } => match raw.field(name) {
                    Some(value) => out.push_str(&value.render(*spec)),
                    None => out.push('?'),
                },
            }
        }
        out
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_placeholder(body: &str) -> Result<Piece, TemplateError> {
    let (name, spec) = match body.split_once(':') {
        Some((name, spec)) => (name.trim(), Some(spec.trim())),
        None => (body.trim(), None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(TemplateError::BadFieldName(name.to_string()));
    }

    let spec = match spec {
        None => FormatSpec::Default,
        Some(spec) => parse_spec(spec)?,
    };

    Ok(Piece::Field {
        name: name.to_string(),
        spec,
    })
}

fn parse_spec(spec: &str) -> Result<FormatSpec, TemplateError> {
    let bad = || TemplateError::BadFormatSpec(spec.to_string());

    if let Some(decimals) = spec.strip_prefix('.') {
        return decimals
            .parse()
            .map(FormatSpec::Precision)
            .map_err(|_| bad());
    }
    if let Some(width) = spec.strip_prefix('0') {
        return width.parse().map(FormatSpec::ZeroPad).map_err(|_| bad());
    }
    Err(bad())
}

#[cfg(test)]
mod tests {
    use super::*;
    use barline_types::{DiskUsage, LoadAverage};

    fn disk() -> RawValue {
        RawValue::Disk(DiskUsage::new("/", 80, 100))
    }

    #[test]
    fn renders_fields_and_literals() {
        let t = Template::parse("D: {used}/{total}").unwrap();
        assert_eq!(t.render(&disk()), "D: 80B/100B");
        assert_eq!(t.fields().collect::<Vec<_>>(), vec!["used", "total"]);
    }

    #[test]
    fn precision_spec() {
        let t = Template::parse("C: {load1:.2}").unwrap();
        let raw = RawValue::Load(LoadAverage {
            one: 0.456,
            five: 0.0,
            fifteen: 0.0,
        });
        assert_eq!(t.render(&raw), "C: 0.46");
    }

    #[test]
    fn escaped_braces() {
        let t = Template::parse("{{{path}}}").unwrap();
        assert_eq!(t.render(&disk()), "{/}");
        assert_eq!(t.fields().count(), 1);
    }

    #[test]
    fn literal_only() {
        let t = Template::parse("USB").unwrap();
        assert_eq!(t.render(&RawValue::Unavailable), "USB");
        assert_eq!(t.fields().count(), 0);
    }

    #[test]
    fn missing_field_renders_placeholder_marker() {
        let t = Template::parse("T: {celsius}C").unwrap();
        assert_eq!(t.render(&disk()), "T: ?C");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Template::parse("D: {used"), Err(TemplateError::Unclosed(3)));
        assert_eq!(Template::parse("oops}"), Err(TemplateError::UnmatchedClose(4)));
        assert!(matches!(
            Template::parse("{}"),
            Err(TemplateError::BadFieldName(_))
        ));
        assert!(matches!(
            Template::parse("{used-bytes}"),
            Err(TemplateError::BadFieldName(_))
        ));
        assert!(matches!(
            Template::parse("{pct:x}"),
            Err(TemplateError::BadFormatSpec(_))
        ));
        assert!(matches!(
            Template::parse("{pct:.}"),
            Err(TemplateError::BadFormatSpec(_))
        ));
    }

    #[test]
    fn keeps_source_text() {
        let t = Template::parse("V: {pct:03}").unwrap();
        assert_eq!(t.as_str(), "V: {pct:03}");
        assert_eq!(t.to_string(), "V: {pct:03}");
    }
}
