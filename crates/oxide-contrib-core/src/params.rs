//! Named statement parameters.
//!
//! Statements produced by this crate refer to values as `@name`
//! placeholders. [`Params`] carries the values, and [`bind_named`] rewrites
//! the placeholders for drivers that only bind positionally.

use crate::error::{CoreError, Result};
use crate::value::{SqlValue, ToSqlValue};

/// An insertion-ordered `name -> value` parameter mapping.
///
/// Names are stored without their sigil, so `"@id"`, `":id"` and `"id"` all
/// address the same entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, SqlValue)>,
}

impl Params {
    /// Creates an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a parameter and returns the mapping, for chaining.
    #[must_use]
    pub fn with<V: ToSqlValue>(mut self, name: &str, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a parameter, replacing an existing value in place.
    pub fn insert<V: ToSqlValue>(&mut self, name: &str, value: V) {
        let name = normalize_name(name);
        let value = value.to_sql_value();
        match self.position(name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Returns the value bound to `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.position(normalize_name(name)).map(|i| &self.entries[i].1)
    }

    /// Overlays `other` on top of this mapping.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.entries {
            self.insert(name, value.clone());
        }
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<K: AsRef<str>, V: ToSqlValue> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name.as_ref(), value);
        }
        params
    }
}

fn normalize_name(name: &str) -> &str {
    name.strip_prefix(['@', ':', '$']).unwrap_or(name)
}

/// Rewrites `@name` placeholders into positional `?` markers.
///
/// Returns the rewritten SQL and the values in placeholder order. A name used
/// twice is bound twice. Placeholders inside quoted literals, quoted or
/// bracketed identifiers and `--` comments are left untouched, as are `@@`
/// system variables.
///
/// # Errors
///
/// Returns [`CoreError::MissingParameter`] when a placeholder has no value.
pub fn bind_named(sql: &str, params: &Params) -> Result<(String, Vec<SqlValue>)> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' | '[' | '`' => {
                let close = if c == '[' { ']' } else { c };
                let end = skip_quoted(&chars, i + 1, close);
                out.extend(&chars[i..end]);
                i = end;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                let end = chars[i..]
                    .iter()
                    .position(|&ch| ch == '\n')
                    .map_or(chars.len(), |p| i + p);
                out.extend(&chars[i..end]);
                i = end;
            }
            '@' if chars.get(i + 1) == Some(&'@') => {
                let end = scan_identifier(&chars, i + 2);
                out.extend(&chars[i..end]);
                i = end;
            }
            '@' => {
                let end = scan_identifier(&chars, i + 1);
                if end == i + 1 {
                    out.push(c);
                    i += 1;
                    continue;
                }
                let name: String = chars[i + 1..end].iter().collect();
                let value = params
                    .get(&name)
                    .ok_or_else(|| CoreError::MissingParameter(name.clone()))?;
                values.push(value.clone());
                out.push('?');
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok((out, values))
}

/// Returns the index just past the closing quote. A doubled quote is an
/// escaped quote, not a terminator.
fn skip_quoted(chars: &[char], mut i: usize, close: char) -> usize {
    while i < chars.len() {
        if chars[i] == close {
            if chars.get(i + 1) == Some(&close) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn scan_identifier(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
        i += 1;
    }
    i
}
