//! Rule evaluation: raw value in, segment out.
//!
//! A [`Rule`] is an ordered list of `(predicate -> outcome)` conditions plus a
//! fallback. The first matching condition wins. Evaluation is pure: the same
//! slot name and raw value always produce the same segment.

use barline_types::{FieldKind, FieldValue, ProviderKind, RawValue, Segment, Severity};
use serde::Deserialize;

use crate::error::RuleError;
use crate::template::Template;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    fn is_equality(&self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    fn apply<T: PartialOrd>(&self, lhs: T, rhs: T) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
        }
    }
}

/// Right-hand side of a comparison.
///
/// Byte fields also accept a size string such as `"1GiB"` or `"500MB"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Literal {
    fn describe(&self) -> String {
        match self {
            Literal::Bool(b) => format!("bool {}", b),
            Literal::Int(n) => format!("integer {}", n),
            Literal::Float(x) => format!("float {}", x),
            Literal::Text(t) => format!("text '{}'", t),
        }
    }

    fn as_number(&self, field: FieldKind) -> Option<f64> {
        match self {
            Literal::Int(n) => Some(*n as f64),
            Literal::Float(x) => Some(*x),
            Literal::Text(t) if field == FieldKind::Bytes => parse_size(t).map(|b| b as f64),
            _ => None,
        }
    }
}

/// Parse a byte size with an optional SI or IEC suffix (`512`, `1GiB`, `2.5MB`).
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let number: f64 = number.parse().ok()?;

    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "KB" | "kB" => 1_000,
        "MB" => 1_000_000,
        "GB" => 1_000_000_000,
        "TB" => 1_000_000_000_000,
        "KiB" => 1 << 10,
        "MiB" => 1 << 20,
        "GiB" => 1 << 30,
        "TiB" => 1 << 40,
        _ => return None,
    };
    Some((number * multiplier as f64) as u64)
}

/// A condition on a raw value's fields.
///
/// Deserializes from `{ field, op, value }`, `{ all = [..] }`,
/// `{ any = [..] }` or `{ not = .. }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    All {
        all: Vec<Predicate>,
    },
    Any {
        any: Vec<Predicate>,
    },
    Not {
        not: Box<Predicate>,
    },
    Compare {
        field: String,
        op: CompareOp,
        value: Literal,
    },
    Always,
}

impl Predicate {
    /// Shorthand for a comparison.
    pub fn compare(field: impl Into<String>, op: CompareOp, value: Literal) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    /// `field == true`.
    pub fn is_true(field: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Eq, Literal::Bool(true))
    }

    /// Whether the raw value satisfies this predicate.
    ///
    /// A comparison on a field the value does not have is false.
    pub fn matches(&self, raw: &RawValue) -> bool {
        match self {
            Predicate::All { all } => all.iter().all(|p| p.matches(raw)),
            Predicate::Any { any } => any.iter().any(|p| p.matches(raw)),
            Predicate::Not { not } => !not.matches(raw),
            Predicate::Always => true,
            Predicate::Compare { field, op, value } => match raw.field(field) {
                Some(actual) => compare(&actual, *op, value),
                None => false,
            },
        }
    }

    fn validate(&self, kind: ProviderKind) -> Result<(), RuleError> {
        match self {
            Predicate::All { all: preds } | Predicate::Any { any: preds } => {
                preds.iter().try_for_each(|p| p.validate(kind))
            }
            Predicate::Not { not } => not.validate(kind),
            Predicate::Always => Ok(()),
            Predicate::Compare { field, op, value } => {
                let field_kind =
                    kind.field_kind(field)
                        .ok_or_else(|| RuleError::UnknownField {
                            kind,
                            field: field.clone(),
                        })?;
                let mismatch = || RuleError::TypeMismatch {
                    field: field.clone(),
                    expected: field_kind,
                    found: value.describe(),
                };

                match field_kind {
                    FieldKind::Bool => {
                        if !matches!(value, Literal::Bool(_)) {
                            return Err(mismatch());
                        }
                    }
                    FieldKind::Text => {
                        if !matches!(value, Literal::Text(_)) {
                            return Err(mismatch());
                        }
                    }
                    _ => {
                        if value.as_number(field_kind).is_none() {
                            return Err(mismatch());
                        }
                    }
                }

                if !field_kind.is_numeric() && !op.is_equality() {
                    return Err(RuleError::NotOrdered {
                        field: field.clone(),
                    });
                }
                Ok(())
            }
        }
    }
}

fn compare(actual: &FieldValue, op: CompareOp, expected: &Literal) -> bool {
    match (actual, expected) {
        (FieldValue::Bool(a), Literal::Bool(b)) => op.apply(a, b),
        (FieldValue::Text(a), Literal::Text(b)) => op.apply(a.as_str(), b.as_str()),
        _ => match (actual.as_f64(), expected.as_number(actual.kind())) {
            (Some(a), Some(b)) => op.apply(a, b),
            _ => false,
        },
    }
}

/// What a matching condition produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Show { template: Template, severity: Severity },
    Suppress,
}

impl Outcome {
    /// Show a rendered template with the given severity.
    ///
    /// A `Suppressed` severity is the same as [`Outcome::Suppress`].
    pub fn show(template: Template, severity: Severity) -> Self {
        if severity == Severity::Suppressed {
            Outcome::Suppress
        } else {
            Outcome::Show { template, severity }
        }
    }

    fn produce(&self, slot: &str, raw: &RawValue) -> Segment {
        match self {
            Outcome::Show { template, severity } => {
                Segment::new(slot, template.render(raw), *severity)
            }
            Outcome::Suppress => Segment::suppressed(slot),
        }
    }

    fn validate(&self, kind: ProviderKind) -> Result<(), RuleError> {
        if let Outcome::Show { template, .. } = self {
            for field in template.fields() {
                if kind.field_kind(field).is_none() {
                    return Err(RuleError::UnknownField {
                        kind,
                        field: field.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// One `(predicate -> outcome)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub when: Predicate,
    pub then: Outcome,
}

/// Ordered conditions with a fallback.
///
/// # Example
///
/// ```rust
/// use barline_sdk::{CompareOp, Literal, Outcome, Predicate, Rule, Template};
/// use barline_types::{DiskUsage, RawValue, Severity};
///
/// let text = Template::parse("D: {used}/{total}").unwrap();
/// let rule = Rule::new(Outcome::show(text.clone(), Severity::Good))
///     .when(
///         Predicate::compare("avail_frac", CompareOp::Lt, Literal::Float(0.1)),
///         Outcome::show(text.clone(), Severity::Bad),
///     )
///     .when(
///         Predicate::compare("avail_frac", CompareOp::Lt, Literal::Float(0.3)),
///         Outcome::show(text, Severity::Degraded),
///     );
///
/// let segment = rule.evaluate("disk", &RawValue::Disk(DiskUsage::new("/", 80, 100)));
/// assert_eq!(segment.text, "D: 80B/100B");
/// assert_eq!(segment.severity, Severity::Degraded);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    conditions: Vec<Condition>,
    fallback: Outcome,
}

impl Rule {
    /// A rule with no conditions, always producing `fallback`.
    pub fn new(fallback: Outcome) -> Self {
        Self {
            conditions: Vec::new(),
            fallback,
        }
    }

    /// Append a condition. Conditions are checked in the order added.
    pub fn when(mut self, when: Predicate, then: Outcome) -> Self {
        self.conditions.push(Condition { when, then });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn fallback(&self) -> &Outcome {
        &self.fallback
    }

    /// Map a raw value to a segment. `Unavailable` is always suppressed.
    pub fn evaluate(&self, slot: &str, raw: &RawValue) -> Segment {
        if raw.is_unavailable() {
            return Segment::suppressed(slot);
        }

        self.conditions
            .iter()
            .find(|c| c.when.matches(raw))
            .map(|c| &c.then)
            .unwrap_or(&self.fallback)
            .produce(slot, raw)
    }

    /// Check every field reference and literal against a provider kind.
    pub fn validate(&self, kind: ProviderKind) -> Result<(), RuleError> {
        for condition in &self.conditions {
            condition.when.validate(kind)?;
            condition.then.validate(kind)?;
        }
        self.fallback.validate(kind)
    }
}
