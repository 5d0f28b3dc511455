//! Java identifier grammar.
//!
//! Identifier legality per JLS 3.8/3.9, keyword avoidance, and the
//! [`QualifiedName`] type used for well-known and generated class names.
//!
//! Note on JLS 3.8 vs 3.9: the JLS nominally distinguishes `TypeIdentifier`
//! and `UnqualifiedMethodIdentifier` from `Identifier`, but since 3.9 folds
//! the contextual keywords into `Keyword`, all three reduce to the same set.
//! There is little utility in emitting names like `record` or `yield`, so a
//! single identifier predicate stands in for all three.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use unicode_xid::UnicodeXID;

/// JLS 3.9 reserved keywords.
static RESERVED_KEYWORDS: &[&str] = &[
    "abstract", "continue", "for", "new", "switch", "assert", "default", "if", "package",
    "synchronized", "boolean", "do", "goto", "private", "this", "break", "double", "implements",
    "protected", "throw", "byte", "else", "import", "public", "throws", "case", "enum",
    "instanceof", "return", "transient", "catch", "extends", "int", "short", "try", "char",
    "final", "interface", "static", "void", "class", "finally", "long", "strictfp", "volatile",
    "const", "float", "native", "super", "while", "_",
];

/// JLS 3.9 contextual keywords.
static CONTEXTUAL_KEYWORDS: &[&str] = &[
    "exports", "opens", "requires", "uses", "module", "permits", "sealed", "var", "non-sealed",
    "provides", "to", "with", "open", "record", "transitive", "yield",
];

/// JLS 3.10.3, 3.10.8.
static LITERALS: &[&str] = &["false", "true", "null"];

/// The module export field name is reserved for the backend's own use.
pub const MODULE_EXPORT_NAME: &str = "export";

/// Every word excluded as an output identifier, including names the backend
/// reserves for itself.
static IDENTIFIER_AVOIDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    RESERVED_KEYWORDS
        .iter()
        .chain(CONTEXTUAL_KEYWORDS)
        .chain(LITERALS)
        .copied()
        .chain([MODULE_EXPORT_NAME])
        .collect()
});

fn is_java_ident_start(c: char) -> bool {
    c.is_xid_start() || c == '$' || c == '_'
}

fn is_java_ident_part(c: char) -> bool {
    c.is_xid_continue() || c == '$'
}

/// JLS 3.8 IdentifierChars.
pub fn is_identifier_chars(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if is_java_ident_start(first) => chars.all(is_java_ident_part),
        _ => false,
    }
}

/// A legal Java identifier: identifier characters and not a keyword or
/// keyword-like literal.
pub fn is_identifier(text: &str) -> bool {
    is_identifier_chars(text) && !IDENTIFIER_AVOIDS.contains(text)
}

fn escape_char(c: char, out: &mut String) {
    match c {
        '-' | '#' => out.push('_'),
        other => {
            out.push('$');
            out.push_str(&format!("{:x}", other as u32));
        }
    }
}

/// Rewrite every codepoint that cannot appear in an identifier.
pub fn escape_nonidentifier_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    match chars.next() {
        None => return out,
        Some(first) if is_java_ident_start(first) => out.push(first),
        Some(first) => escape_char(first, &mut out),
    }
    for c in chars {
        if is_java_ident_part(c) {
            out.push(c);
        } else {
            escape_char(c, &mut out);
        }
    }
    out
}

/// Modify a name so it is always a legal, non-reserved identifier.
pub fn safe_identifier(text: &str) -> String {
    if text.is_empty() {
        "$".to_string()
    } else if IDENTIFIER_AVOIDS.contains(text) {
        format!("{text}_")
    } else if is_identifier_chars(text) {
        text.to_string()
    } else {
        escape_nonidentifier_chars(text)
    }
}

/// Capitalize the first letter, leaving the rest alone. The JavaBeans rule:
/// `fooBar` pairs with `getFooBar`, but `BARFoo` stays `BARFoo`.
pub fn to_pascal(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Turn dashed module path segments like `hello-world` into `HelloWorld`.
pub fn segment_to_pascal(text: &str) -> String {
    text.split(['-', '_', '.'])
        .filter(|part| !part.is_empty())
        .map(to_pascal)
        .collect()
}

/// A dot-separated class or member path, e.g. `java.lang.String`. Parts are
/// assumed safe by construction; see [`QualifiedName::safe`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    parts: Vec<String>,
}

impl QualifiedName {
    pub fn empty() -> Self {
        Self { parts: Vec::new() }
    }

    /// Create from parts already known to be legal identifiers.
    pub fn known_safe<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Create from arbitrary text, sanitizing each part.
    pub fn safe<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            parts: parts
                .into_iter()
                .map(|p| safe_identifier(p.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn last_part(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }

    pub fn fully_qualified(&self) -> String {
        self.parts.join(".")
    }

    /// Split into leading parts and the tail part.
    pub fn split(&self) -> (QualifiedName, String) {
        let (last, lead) = self
            .parts
            .split_last()
            .expect("cannot split an empty qualified name");
        (
            QualifiedName {
                parts: lead.to_vec(),
            },
            last.clone(),
        )
    }

    /// Further qualify with a name assumed safe.
    pub fn qualify(&self, part: impl Into<String>) -> QualifiedName {
        let mut parts = self.parts.clone();
        parts.push(part.into());
        QualifiedName { parts }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fully_qualified())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_not_identifiers() {
        assert!(!is_identifier("class"));
        assert!(!is_identifier("yield"));
        assert!(!is_identifier("null"));
        assert!(is_identifier("clazz"));
    }

    #[test]
    fn safe_identifier_rewrites() {
        assert_eq!(safe_identifier(""), "$");
        assert_eq!(safe_identifier("enum"), "enum_");
        assert_eq!(safe_identifier("export"), "export_");
        assert_eq!(safe_identifier("fooBar"), "fooBar");
        assert_eq!(safe_identifier("foo-bar"), "foo_bar");
        assert_eq!(safe_identifier("a#1"), "a_1");
        assert_eq!(safe_identifier("3x"), "$33x");
    }

    #[test]
    fn identifier_chars_allow_unicode() {
        assert!(is_identifier("caf\u{e9}"));
        assert!(is_identifier("$x"));
        assert!(!is_identifier("x y"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn pascal_follows_beans_rule() {
        assert_eq!(to_pascal("fooBar"), "FooBar");
        assert_eq!(to_pascal("BARFoo"), "BARFoo");
        assert_eq!(segment_to_pascal("hello-world"), "HelloWorld");
    }

    #[test]
    fn qualified_name_split() {
        let name = QualifiedName::known_safe(["java", "lang", "String"]);
        let (lead, tail) = name.split();
        assert_eq!(lead.fully_qualified(), "java.lang");
        assert_eq!(tail, "String");
        assert_eq!(name.fully_qualified(), "java.lang.String");
    }
}
