//! Stable identities for resolved names.
//!
//! The resolver assigns every declared name a [`BindingId`] that is unique
//! across the whole compiled unit, so shadowing in source never produces two
//! bindings with the same id. Backends key every cache on these ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identity of a resolved binding (parameter, local, module-level
/// declaration, imported name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BindingId(pub u32);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identity of a module within a compiled unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

/// Unique identity of a function-like body (module init, function, method,
/// constructor, accessor, local function, test).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// A declared name after resolution: the stable id plus the source text it
/// had. Two bindings may share text (shadowing) but never an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedName {
    pub id: BindingId,
    pub text: String,
}

impl ResolvedName {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id: BindingId(id),
            text: text.into(),
        }
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.text, self.id)
    }
}

/// A member name used in dot access (methods, properties). Not a binding:
/// member names resolve against a type shape, not a lexical scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DotName(pub String);

impl DotName {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
