//! SQL identifier to Go identifier conversion.

use convert_case::{Boundary, Case, Converter};

/// Strips a literal `prefix` from `ident` when it is followed by a word boundary.
///
/// A prefix ending in `_` is its own boundary; otherwise the remainder must
/// start with `_`. Nothing is stripped when the prefix would consume the
/// whole identifier.
pub fn strip_prefix<'a>(ident: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() || ident.len() <= prefix.len() {
        return ident;
    }
    match ident.strip_prefix(prefix) {
        Some(rest) if prefix.ends_with('_') || rest.starts_with('_') => {
            let trimmed = rest.trim_start_matches('_');
            if trimmed.is_empty() {
                ident
            } else {
                trimmed
            }
        }
        _ => ident,
    }
}

/// Converts a snake_case (or camelCase) identifier to an exported Go name.
pub fn to_exported(ident: &str) -> String {
    let converted = Converter::new()
        .set_boundaries(&[
            Boundary::Underscore,
            Boundary::Hyphen,
            Boundary::Space,
            Boundary::LowerUpper,
        ])
        .to_case(Case::Pascal)
        .convert(ident);

    let mut name: String = converted
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    match name.chars().next() {
        None => "X".to_owned(),
        Some(c) if c.is_ascii_digit() => {
            name.insert(0, 'X');
            name
        }
        Some(_) => name,
    }
}

/// Exported Go name for `ident` after removing `prefix`.
pub fn exported_name(ident: &str, prefix: &str) -> String {
    to_exported(strip_prefix(ident, prefix))
}

/// The table name GORM derives from a struct name when none is given.
pub fn gorm_table_name(struct_name: &str) -> String {
    let snake = Converter::new()
        .set_boundaries(&[Boundary::LowerUpper, Boundary::DigitUpper])
        .to_case(Case::Snake)
        .convert(struct_name);
    pluralize(&snake)
}

/// English plural of the last word, already-plural words unchanged.
pub fn pluralize(word: &str) -> String {
    const ES_SUFFIXES: [&str; 5] = ["ss", "x", "z", "ch", "sh"];

    if word.is_empty() {
        return String::new();
    }
    if ES_SUFFIXES.iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }
    if word.ends_with('s') {
        return word.to_owned();
    }
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    format!("{word}s")
}
