//! Well-known output names.
//!
//! Standard Java names the lowering emits directly, plus the `veld.core`
//! runtime support entry points generated code leans on.

use once_cell::sync::Lazy;

use crate::ast::{Expr, Literal, Stmt};
use crate::grammar::QualifiedName;

fn qn(parts: &[&str]) -> QualifiedName {
    QualifiedName::known_safe(parts.iter().copied())
}

// java.lang
pub static JAVA_LANG: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "lang"]));
pub static JAVA_LANG_OBJECT: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "lang", "Object"]));
pub static JAVA_LANG_STRING: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "lang", "String"]));
pub static JAVA_LANG_BOOLEAN: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "lang", "Boolean"]));
pub static JAVA_LANG_INTEGER: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "lang", "Integer"]));
pub static JAVA_LANG_LONG: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "lang", "Long"]));
pub static JAVA_LANG_DOUBLE: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "lang", "Double"]));
pub static JAVA_LANG_VOID: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "lang", "Void"]));
pub static JAVA_LANG_CLASS: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "lang", "Class"]));
pub static JAVA_LANG_CLASS_FOR_NAME: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "lang", "Class", "forName"]));
pub static JAVA_LANG_CLASS_NOT_FOUND_EXCEPTION: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "lang", "ClassNotFoundException"]));
pub static JAVA_LANG_RUNTIME_EXCEPTION: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "lang", "RuntimeException"]));
pub static JAVA_LANG_ILLEGAL_STATE_EXCEPTION: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "lang", "IllegalStateException"]));
pub static JAVA_LANG_STRING_BUILDER: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "lang", "StringBuilder"]));
pub static JAVA_LANG_DOUBLE_POSITIVE_INFINITY: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "lang", "Double", "POSITIVE_INFINITY"]));
pub static JAVA_LANG_DOUBLE_NEGATIVE_INFINITY: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "lang", "Double", "NEGATIVE_INFINITY"]));
pub static JAVA_LANG_DOUBLE_NAN: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "lang", "Double", "NaN"]));

// java.util
pub static JAVA_UTIL_LIST: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "util", "List"]));
pub static JAVA_UTIL_MAP: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "util", "Map"]));
pub static JAVA_UTIL_MAP_ENTRY: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "util", "Map", "Entry"]));
pub static JAVA_UTIL_DEQUE: Lazy<QualifiedName> = Lazy::new(|| qn(&["java", "util", "Deque"]));
pub static JAVA_UTIL_ARRAYS_AS_LIST: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "util", "Arrays", "asList"]));
pub static JAVA_UTIL_FUNCTION: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "util", "function"]));

// veld.core runtime support
pub static VELD_CORE: Lazy<QualifiedName> = Lazy::new(|| qn(&["veld", "core", "Core"]));
pub static CORE_BUBBLE: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["veld", "core", "Core", "bubble"]));
pub static CORE_CAST: Lazy<QualifiedName> = Lazy::new(|| qn(&["veld", "core", "Core", "cast"]));
pub static CORE_CAST_TO_NON_NULL: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["veld", "core", "Core", "castToNonNull"]));
pub static CORE_DO_NOTHING: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["veld", "core", "Core", "doNothing"]));
/// Failure recovery catches this; payloads travel out of band.
pub static VELD_BUBBLE_EXCEPTION: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["java", "lang", "RuntimeException"]));

// Stub names, mostly for diagnostics.
pub static VELD_STUB_MISTRANSLATION: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["veld", "core", "Stub", "cantTranslate"]));
pub static VELD_STUB_INVALID_TYPE: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["veld", "core", "Stub", "InvalidType"]));

// JUnit
pub static JUNIT_TEST: Lazy<QualifiedName> =
    Lazy::new(|| qn(&["org", "junit", "jupiter", "api", "Test"]));

/// Consume a value doing nothing with it; keeps non-statement expressions
/// legal as Java expression statements.
pub fn do_nothing(expr: Expr) -> Expr {
    CORE_DO_NOTHING.static_call(vec![expr])
}

/// Ensure an expression can stand alone as a statement.
pub fn as_statement_expr(expr: Expr) -> Expr {
    if expr.makes_statement() {
        expr
    } else {
        do_nothing(expr)
    }
}

fn diagnostic_text(source: &str, diagnostic: Option<&str>) -> String {
    let text = match diagnostic {
        Some(d) => format!("{source}: {d}"),
        None => format!("{source}: cannot lower"),
    };
    // Keep generated comments one line and free of comment terminators.
    text.replace("*/", "*\\/").replace('\n', " ")
}

/// A call that marks a mistranslated expression in otherwise valid output.
pub fn garbage_expr(source: &str, diagnostic: Option<&str>) -> Expr {
    VELD_STUB_MISTRANSLATION.static_call(vec![Expr::Literal(Literal::Str(diagnostic_text(
        source, diagnostic,
    )))])
}

/// A comment standing in for a mistranslated statement.
pub fn garbage_comment(source: &str, diagnostic: Option<&str>) -> Stmt {
    Stmt::Comment(diagnostic_text(source, diagnostic))
}
