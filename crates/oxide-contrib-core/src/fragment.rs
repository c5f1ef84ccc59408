//! SQL fragment builder.
//!
//! Callers hand in raw `WHERE` and `ORDER BY` text, with or without the
//! leading keyword. These helpers add the keyword when it is missing and
//! render `column = @column` lists. Raw text that already carries its keyword
//! is trusted verbatim; values must travel through [`Params`], never through
//! the text.
//!
//! [`Params`]: crate::params::Params

use crate::dialect::DialectId;

/// Prefixes `" where "` unless the clause already contains a `where` word.
///
/// Blank input yields an empty string.
///
/// ```rust
/// use oxide_contrib_core::fragment::normalize_where;
///
/// assert_eq!(normalize_where("CountryId>@id"), " where CountryId>@id");
/// assert_eq!(normalize_where("WHERE CountryId>@id"), "WHERE CountryId>@id");
/// assert_eq!(normalize_where(""), "");
/// ```
#[must_use]
pub fn normalize_where(raw: &str) -> String {
    if raw.trim().is_empty() {
        String::new()
    } else if contains_word(raw, "where") {
        raw.to_string()
    } else {
        format!(" where {raw}")
    }
}

/// Prefixes `" order by "` unless the clause already contains an `order` or
/// a `by` word.
///
/// Blank input yields an empty string.
#[must_use]
pub fn normalize_sort(raw: &str) -> String {
    if raw.trim().is_empty() {
        String::new()
    } else if contains_word(raw, "order") || contains_word(raw, "by") {
        raw.to_string()
    } else {
        format!(" order by {raw}")
    }
}

/// Renders `a = @a, b = @b` for an UPDATE SET clause.
#[must_use]
pub fn column_assignment_list<S: AsRef<str>>(columns: &[S]) -> String {
    render_pairs(columns, ", ", str::to_string)
}

/// Renders `a = @a <joiner> b = @b`, typically with `and`.
#[must_use]
pub fn key_equality_predicate<S: AsRef<str>>(columns: &[S], joiner: &str) -> String {
    render_pairs(columns, &format!(" {} ", joiner.trim()), str::to_string)
}

/// [`column_assignment_list`] with column names quoted for `dialect`.
#[must_use]
pub fn quoted_assignment_list<S: AsRef<str>>(dialect: &DialectId, columns: &[S]) -> String {
    render_pairs(columns, ", ", |c| dialect.quote_identifier(c))
}

/// [`key_equality_predicate`] with column names quoted for `dialect`.
#[must_use]
pub fn quoted_key_predicate<S: AsRef<str>>(
    dialect: &DialectId,
    columns: &[S],
    joiner: &str,
) -> String {
    render_pairs(columns, &format!(" {} ", joiner.trim()), |c| {
        dialect.quote_identifier(c)
    })
}

/// Joins statement pieces with single spaces, dropping blank pieces.
///
/// Normalized clauses carry a leading space, and verbatim clauses may carry
/// any whitespace; this keeps the assembled statement tidy either way.
#[must_use]
pub fn join_sql(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_pairs<S, F>(columns: &[S], separator: &str, quote: F) -> String
where
    S: AsRef<str>,
    F: Fn(&str) -> String,
{
    columns
        .iter()
        .map(|c| {
            let c = c.as_ref();
            format!("{} = @{c}", quote(c))
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Looks for `word` as a bare SQL word. Placeholders (`@where`), quoted
/// literals and quoted or bracketed identifiers do not count.
fn contains_word(text: &str, word: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut token = String::new();
    let mut placeholder = false;

    for c in text.chars() {
        if let Some(close) = quote {
            if c == close {
                quote = None;
            }
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            token.push(c);
            continue;
        }
        if !placeholder && token.eq_ignore_ascii_case(word) {
            return true;
        }
        token.clear();
        placeholder = c == '@';
        quote = match c {
            '\'' => Some('\''),
            '"' => Some('"'),
            '`' => Some('`'),
            '[' => Some(']'),
            _ => None,
        };
    }
    !placeholder && token.eq_ignore_ascii_case(word)
}
