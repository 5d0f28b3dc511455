//! Static types as the checker resolved them.
//!
//! Backends see one closed [`Type`] enum. Generic substitution has already
//! been applied where it matters: an overridden method's signature arrives
//! with its type arguments bound, so a backend can compare positions
//! directly against the overriding declaration.

use crate::name::{BindingId, ModuleId, ResolvedName};

/// Whether a nominal type erases to a class or an interface in targets that
/// care about the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NominalKind {
    Class,
    Interface,
}

/// A reference to a declared type, possibly applied to type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NominalType {
    /// Simple source name of the definition, e.g. `List`.
    pub name: String,
    /// The defining module, when the type is user-declared.
    pub module: Option<ModuleId>,
    /// The binding of the declaration, when the type is user-declared.
    pub binding: Option<BindingId>,
    pub kind: NominalKind,
    pub args: Vec<Type>,
}

impl NominalType {
    /// A builtin (well-known) nominal type with no declaring module.
    pub fn builtin(name: impl Into<String>, kind: NominalKind, args: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            module: None,
            binding: None,
            kind,
            args,
        }
    }
}

/// A reference to a type formal in scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVar {
    pub name: ResolvedName,
}

/// A declared type parameter with its upper bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeFormal {
    pub name: ResolvedName,
    pub bounds: Vec<Type>,
}

/// One value parameter of a function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SigParam {
    pub ty: Type,
    pub optional: bool,
}

/// A resolved function signature. Parameters never include an implicit
/// receiver; methods carry that separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    pub type_params: Vec<TypeFormal>,
    pub params: Vec<SigParam>,
    /// Element type of a trailing rest parameter, if any.
    pub rest: Option<Type>,
    pub ret: Type,
}

impl Signature {
    pub fn new(params: Vec<SigParam>, ret: Type) -> Self {
        Self {
            type_params: Vec::new(),
            params,
            rest: None,
            ret,
        }
    }

    /// Index of the first optional parameter, or the parameter count when
    /// every parameter is required.
    pub fn required_count(&self) -> usize {
        self.params
            .iter()
            .position(|p| p.optional)
            .unwrap_or(self.params.len())
    }
}

/// The closed set of static types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Type {
    Boolean,
    Int,
    Long,
    Float64,
    Str,
    #[default]
    Void,
    Never,
    /// Top of the value lattice; any value.
    Top,
    /// Produced for unresolvable or contradictory types.
    Invalid,
    Nominal(NominalType),
    Function(Box<Signature>),
    Nullable(Box<Type>),
    Var(TypeVar),
}

impl Type {
    pub fn nullable(self) -> Type {
        match self {
            Type::Nullable(_) => self,
            other => Type::Nullable(Box::new(other)),
        }
    }

    /// The type with any top-level null possibility stripped.
    pub fn without_null(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_))
    }

    /// Void and never both lower to "no usable value".
    pub fn is_void_like(&self) -> bool {
        matches!(self, Type::Void | Type::Never)
    }

    pub fn is_boolean_like(&self) -> bool {
        matches!(self.without_null(), Type::Boolean)
    }

    pub fn mentions_invalid(&self) -> bool {
        match self {
            Type::Invalid => true,
            Type::Nullable(inner) => inner.mentions_invalid(),
            Type::Nominal(n) => n.args.iter().any(Type::mentions_invalid),
            Type::Function(sig) => {
                sig.params.iter().any(|p| p.ty.mentions_invalid())
                    || sig.rest.as_ref().is_some_and(Type::mentions_invalid)
                    || sig.ret.mentions_invalid()
            }
            _ => false,
        }
    }

    /// The signature when this is (possibly nullable) function type.
    pub fn as_signature(&self) -> Option<&Signature> {
        match self.without_null() {
            Type::Function(sig) => Some(sig),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_is_idempotent() {
        let t = Type::Int.nullable().nullable();
        assert_eq!(t, Type::Nullable(Box::new(Type::Int)));
        assert_eq!(t.without_null(), &Type::Int);
    }

    #[test]
    fn required_count_stops_at_first_optional() {
        let sig = Signature::new(
            vec![
                SigParam {
                    ty: Type::Int,
                    optional: false,
                },
                SigParam {
                    ty: Type::Str,
                    optional: true,
                },
                SigParam {
                    ty: Type::Int,
                    optional: false,
                },
            ],
            Type::Void,
        );
        assert_eq!(sig.required_count(), 1);
    }

    #[test]
    fn boolean_like_sees_through_null() {
        assert!(Type::Boolean.nullable().is_boolean_like());
        assert!(!Type::Int.is_boolean_like());
    }
}
