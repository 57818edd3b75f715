//! Composite `(amount,currency)` literal codec.
//!
//! # Responsibility
//! - Encode [`Money`] as a composite literal and decode it back.
//! - Encode/decode ordered lists of [`Money`] as an array-of-composite literal.
//! - Plug both encodings into `rusqlite` through `ToSql`/`FromSql`.
//!
//! # Invariants
//! - Decoding tolerates missing outer parentheses and quoted field values.
//! - A decoded composite always has exactly two fields.

use crate::model::payment::Money;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors raised while decoding composite or array literals.
#[derive(Debug)]
pub enum CompositeError {
    Csv(csv::Error),
    /// Literal did not hold exactly two fields.
    FieldCount(usize),
    Utf8(std::str::Utf8Error),
    MalformedArray(String),
}

impl Display for CompositeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "{err}"),
            Self::FieldCount(count) => write!(f, "expected 2 elements but got {count}"),
            Self::Utf8(err) => write!(f, "composite literal is not valid UTF-8: {err}"),
            Self::MalformedArray(literal) => write!(f, "malformed array literal `{literal}`"),
        }
    }
}

impl Error for CompositeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Utf8(err) => Some(err),
            Self::FieldCount(_) | Self::MalformedArray(_) => None,
        }
    }
}

impl From<csv::Error> for CompositeError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl Money {
    /// Renders `(amount,currency)`.
    pub fn to_composite_literal(&self) -> String {
        format!("({},{})", self.amount, self.currency)
    }

    /// Parses a composite literal such as `(5.00,USD)` or `("5.00","USD")`.
    ///
    /// # Errors
    /// - Returns [`CompositeError::FieldCount`] unless exactly two fields remain
    ///   after stripping parentheses and quotes.
    pub fn from_composite_literal(literal: &str) -> Result<Self, CompositeError> {
        let inner = literal.strip_prefix('(').unwrap_or(literal);
        let inner = inner.strip_suffix(')').unwrap_or(inner);
        let cleaned = inner.replace(['"', '\''], "");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(cleaned.as_bytes());
        let mut record = csv::StringRecord::new();
        if !reader.read_record(&mut record)? {
            return Err(CompositeError::FieldCount(0));
        }
        if record.len() != 2 {
            return Err(CompositeError::FieldCount(record.len()));
        }

        Ok(Self::new(&record[0], &record[1]))
    }

    /// Byte-string variant of [`Money::from_composite_literal`].
    pub fn from_composite_bytes(bytes: &[u8]) -> Result<Self, CompositeError> {
        let literal = std::str::from_utf8(bytes).map_err(CompositeError::Utf8)?;
        Self::from_composite_literal(literal)
    }
}

/// Renders an array-of-composite literal, e.g. `{"(5.00,GBP)","(10.00,USD)"}`.
pub fn encode_money_array(items: &[Money]) -> String {
    let elements = items
        .iter()
        .map(|item| format!("\"{}\"", item.to_composite_literal()))
        .collect::<Vec<_>>();
    format!("{{{}}}", elements.join(","))
}

/// Parses an array-of-composite literal. Surrounding braces are optional.
///
/// # Errors
/// - Returns [`CompositeError::MalformedArray`] on unbalanced quotes or
///   parentheses, or on empty elements.
/// - Propagates element decode failures.
pub fn decode_money_array(literal: &str) -> Result<Vec<Money>, CompositeError> {
    let trimmed = literal.trim();
    let inner = trimmed.strip_prefix('{').unwrap_or(trimmed);
    let inner = inner.strip_suffix('}').unwrap_or(inner);
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    split_array_elements(inner)
        .ok_or_else(|| CompositeError::MalformedArray(literal.to_string()))?
        .iter()
        .map(|element| Money::from_composite_literal(element))
        .collect()
}

/// Splits on commas outside quotes and parentheses, unquoting and trimming
/// each element.
fn split_array_elements(inner: &str) -> Option<Vec<String>> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut depth = 0usize;
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => current.push(chars.next()?),
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => {
                depth += 1;
                current.push(ch);
            }
            ')' if !in_quotes => {
                depth = depth.checked_sub(1)?;
                current.push(ch);
            }
            ',' if !in_quotes && depth == 0 => {
                elements.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    if in_quotes || depth != 0 {
        return None;
    }
    elements.push(current);

    let elements = elements
        .iter()
        .map(|element| element.trim().to_string())
        .collect::<Vec<_>>();
    if elements.iter().any(String::is_empty) {
        return None;
    }
    Some(elements)
}

/// Ordered list of [`Money`] stored as one array column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoneyArray(pub Vec<Money>);

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_composite_literal()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Money::from_composite_bytes(bytes).map_err(|err| FromSqlError::Other(Box::new(err)))
            }
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for MoneyArray {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(encode_money_array(&self.0)))
    }
}

impl FromSql for MoneyArray {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let bytes = match value {
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes,
            _ => return Err(FromSqlError::InvalidType),
        };
        let literal = std::str::from_utf8(bytes).map_err(|err| FromSqlError::Other(Box::new(err)))?;
        decode_money_array(literal)
            .map(MoneyArray)
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}
