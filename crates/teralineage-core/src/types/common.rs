//! The qualified-name vocabulary shared by every component of the analyzer.

use std::fmt;

/// A dotted table or object name: `catalog.schema.base`, with either prefix omitted.
///
/// Normalized-alias keys built from a `QualifiedName` are lower-cased by callers before
/// use as map keys; the `QualifiedName` itself always preserves the source-text case of
/// each part, since displayed base names must not be mangled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub base: String,
}

impl QualifiedName {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: None,
            base: base.into(),
        }
    }

    /// Builds a `QualifiedName` from a dot-separated reference (1 to 3 parts),
    /// identifier-quoting aware. Extra leading parts beyond `catalog.schema.base`
    /// are folded into `catalog` as-is, joined back with dots, since Teradata
    /// references rarely exceed three parts and the exact extra-part semantics are
    /// not specified.
    pub fn parse(raw: &str) -> Self {
        let parts = split_qualified_identifiers(raw);
        match parts.len() {
            0 => Self::new(String::new()),
            1 => Self::new(parts[0].clone()),
            2 => Self {
                catalog: None,
                schema: Some(parts[0].clone()),
                base: parts[1].clone(),
            },
            3 => Self {
                catalog: Some(parts[0].clone()),
                schema: Some(parts[1].clone()),
                base: parts[2].clone(),
            },
            _ => Self {
                catalog: Some(parts[..parts.len() - 2].join(".")),
                schema: Some(parts[parts.len() - 2].clone()),
                base: parts[parts.len() - 1].clone(),
            },
        }
    }

    /// The lower-cased key used in alias maps and single-base maps.
    pub fn normalized_key(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [self.catalog.as_deref(), self.schema.as_deref(), Some(self.base.as_str())]
            .into_iter()
            .flatten()
            .collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Splits a dotted reference into parts, treating `"`, `'`, `` ` ``, and `[...]`
/// quoting as opaque to the `.` separator.
pub fn split_qualified_identifiers(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = name.chars().peekable();
    let mut active_quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(q) = active_quote {
            current.push(ch);
            if (q != ']' && ch == q) || (q == ']' && ch == ']') {
                active_quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => {
                active_quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                active_quote = Some(']');
                current.push(ch);
            }
            '.' => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts.iter().map(|p| unquote_identifier(p)).collect()
}

fn is_quoted(part: &str) -> bool {
    let mut chars = part.chars();
    match (chars.next(), part.chars().last()) {
        (Some('"'), Some('"')) | (Some('`'), Some('`')) | (Some('\''), Some('\'')) => part.len() >= 2,
        _ => part.starts_with('[') && part.ends_with(']') && part.len() >= 2,
    }
}

pub fn unquote_identifier(part: &str) -> String {
    if is_quoted(part) {
        part[1..part.len() - 1].to_string()
    } else {
        part.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_dotted_form_omitting_empty_parts() {
        let q = QualifiedName::parse("sales.orders");
        assert_eq!(q.to_string(), "sales.orders");
        let q = QualifiedName::new("orders");
        assert_eq!(q.to_string(), "orders");
    }

    #[test]
    fn parse_handles_three_parts() {
        let q = QualifiedName::parse("db.sales.orders");
        assert_eq!(q.catalog.as_deref(), Some("db"));
        assert_eq!(q.schema.as_deref(), Some("sales"));
        assert_eq!(q.base, "orders");
    }

    #[test]
    fn normalized_key_is_lowercase() {
        let q = QualifiedName::parse("Sales.Orders");
        assert_eq!(q.normalized_key(), "sales.orders");
        assert_eq!(q.to_string(), "Sales.Orders");
    }

    #[test]
    fn split_respects_quoting() {
        let parts = split_qualified_identifiers(r#""My.Db".orders"#);
        assert_eq!(parts, vec!["My.Db".to_string(), "orders".to_string()]);
    }
}
