//! Token and value types produced by the lexer.

use std::fmt;

/// A dotted field path, e.g. `gpu.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A literal value attached to a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    List(Vec<Value>),
}

impl Value {
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Types an unquoted literal the way the surface language reads:
    /// integer, then decimal, then boolean, then plain string. Only
    /// digit-shaped input is sniffed as a number, so words `f64` would
    /// happily parse (`inf`, `NaN`) stay strings.
    pub(crate) fn from_bare(raw: &str) -> Value {
        if looks_numeric(raw) {
            if let Ok(i) = raw.parse::<i64>() {
                return Value::Integer(i);
            }
            if let Ok(f) = raw.parse::<f64>() {
                return Value::Number(f);
            }
        }
        if raw.eq_ignore_ascii_case("true") {
            Value::Boolean(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Value::Boolean(false)
        } else {
            Value::String(raw.to_string())
        }
    }
}

fn looks_numeric(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

/// The closed set of operator keywords a caller can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOp {
    Contains,
    StartsWith,
    EndsWith,
    Range,
    IsNull,
    Exact,
    In,
    NotIn,
    Eq,
    Ne,
    Lte,
    Lt,
    Gte,
    Gt,
}

impl SurfaceOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "contains" => Some(Self::Contains),
            "startswith" => Some(Self::StartsWith),
            "endswith" => Some(Self::EndsWith),
            "range" => Some(Self::Range),
            "isnull" => Some(Self::IsNull),
            "exact" => Some(Self::Exact),
            "in" => Some(Self::In),
            "not_in" => Some(Self::NotIn),
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "lte" => Some(Self::Lte),
            "lt" => Some(Self::Lt),
            "gte" => Some(Self::Gte),
            "gt" => Some(Self::Gt),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Range => "range",
            Self::IsNull => "isnull",
            Self::Exact => "exact",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lte => "lte",
            Self::Lt => "lt",
            Self::Gte => "gte",
            Self::Gt => "gt",
        }
    }

    /// Whether the operator takes a comma-separated list literal.
    pub fn takes_list(self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::Range)
    }
}

impl fmt::Display for SurfaceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One lexed token. Positions are character offsets into the input;
/// `start`/`end` spans are half-open.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Field {
        path: FieldPath,
        start: usize,
        end: usize,
    },
    Operator {
        op: SurfaceOp,
        position: usize,
    },
    Literal {
        value: Value,
        start: usize,
        end: usize,
    },
    GroupOpen {
        position: usize,
    },
    GroupClose {
        position: usize,
    },
    And {
        position: usize,
    },
    Or {
        position: usize,
    },
}

impl Token {
    pub fn position(&self) -> usize {
        match self {
            Token::Field { start, .. } | Token::Literal { start, .. } => *start,
            Token::Operator { position, .. }
            | Token::GroupOpen { position }
            | Token::GroupClose { position }
            | Token::And { position }
            | Token::Or { position } => *position,
        }
    }

    pub fn end_position(&self) -> usize {
        match self {
            Token::Field { end, .. } | Token::Literal { end, .. } => *end,
            Token::Operator { op, position } => position + op.symbol().len(),
            Token::GroupOpen { position }
            | Token::GroupClose { position }
            | Token::And { position }
            | Token::Or { position } => position + 1,
        }
    }

    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Field { path, .. } => format!("field path `{}`", path),
            Token::Operator { op, .. } => format!("operator `{}`", op),
            Token::Literal { .. } => "a literal value".to_string(),
            Token::GroupOpen { .. } => "`(`".to_string(),
            Token::GroupClose { .. } => "`)`".to_string(),
            Token::And { .. } => "`&`".to_string(),
            Token::Or { .. } => "`|`".to_string(),
        }
    }
}
