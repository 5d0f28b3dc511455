//! Lowering strategies for local names.
//!
//! Local variables may need to be lifted into a synthesized scope class so
//! lambdas can capture and mutate them; local functions may need lifting so
//! they can self- or mutually recurse. A [`LocalName`] records how to
//! address a binding after that decision; declaring the lifted storage is
//! the block lowering's job.

use crate::ast::{Expr, FieldAccess, MethodRef, NameExpr};
use crate::grammar::QualifiedName;
use crate::names::OutName;

/// How a name is lifted, and what it is lifted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLift {
    None,
    /// Local var that is either not captured or already effectively final.
    RegularVar,
    /// Local var that is captured and mutable.
    CapturedMutableVar,
    /// Captured mutable var addressed from inside its own scope class.
    ThisCapturedMutableVar,
    /// Local function that is not recursive.
    SimpleFunction,
    /// Local function that is recursive but not called before definition.
    RecursiveFunction,
    /// Local function that is recursive and must be forward declared.
    FwdDeclFunction,
}

/// How to address one local (or locally found) name in output code.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalName {
    /// Not actually local: a module-level member found as a fallback.
    ModuleLevel { qualified: QualifiedName },
    RegularVar {
        name: OutName,
        mutably_captured: bool,
    },
    CapturedMutableVar {
        name: OutName,
        scope: OutName,
    },
    ThisCapturedMutableVar {
        name: OutName,
    },
    SimpleFunction {
        name: OutName,
        recursive: bool,
    },
    RecursiveFunction {
        name: OutName,
        scope: OutName,
    },
    ForwardDeclaredFunction {
        name: OutName,
        scope: OutName,
    },
}

impl LocalName {
    pub fn lift_kind(&self) -> NameLift {
        match self {
            LocalName::ModuleLevel { .. } => NameLift::None,
            LocalName::RegularVar { .. } => NameLift::RegularVar,
            LocalName::CapturedMutableVar { .. } => NameLift::CapturedMutableVar,
            LocalName::ThisCapturedMutableVar { .. } => NameLift::ThisCapturedMutableVar,
            LocalName::SimpleFunction { .. } => NameLift::SimpleFunction,
            LocalName::RecursiveFunction { .. } => NameLift::RecursiveFunction,
            LocalName::ForwardDeclaredFunction { .. } => NameLift::FwdDeclFunction,
        }
    }

    /// The unqualified output name of the binding itself.
    pub fn out_name(&self) -> OutName {
        match self {
            LocalName::ModuleLevel { qualified } => OutName::fixed(qualified.last_part()),
            LocalName::RegularVar { name, .. }
            | LocalName::CapturedMutableVar { name, .. }
            | LocalName::ThisCapturedMutableVar { name }
            | LocalName::SimpleFunction { name, .. }
            | LocalName::RecursiveFunction { name, .. }
            | LocalName::ForwardDeclaredFunction { name, .. } => name.clone(),
        }
    }

    pub fn scope_name(&self) -> Option<&OutName> {
        match self {
            LocalName::CapturedMutableVar { scope, .. }
            | LocalName::RecursiveFunction { scope, .. }
            | LocalName::ForwardDeclaredFunction { scope, .. } => Some(scope),
            _ => None,
        }
    }

    pub fn is_mutably_captured(&self) -> bool {
        match self {
            LocalName::RegularVar {
                mutably_captured, ..
            } => *mutably_captured,
            LocalName::CapturedMutableVar { .. } | LocalName::ThisCapturedMutableVar { .. } => true,
            _ => false,
        }
    }

    pub fn is_recursive_fn(&self) -> bool {
        match self {
            LocalName::SimpleFunction { recursive, .. } => *recursive,
            LocalName::RecursiveFunction { .. } | LocalName::ForwardDeclaredFunction { .. } => true,
            _ => false,
        }
    }

    /// The refined name after lifting into `scope`, or `None` when the
    /// requested lift does not apply to this kind. Refinement is monotonic:
    /// a lifted name never goes back to an unlifted kind.
    pub fn lift(&self, lift: NameLift, scope: &OutName) -> Option<LocalName> {
        match (self, lift) {
            (LocalName::RegularVar { name, .. }, NameLift::CapturedMutableVar) => {
                Some(LocalName::CapturedMutableVar {
                    name: name.clone(),
                    scope: scope.clone(),
                })
            }
            (LocalName::SimpleFunction { name, .. }, NameLift::RecursiveFunction) => {
                Some(LocalName::RecursiveFunction {
                    name: name.clone(),
                    scope: scope.clone(),
                })
            }
            (LocalName::SimpleFunction { name, .. }, NameLift::FwdDeclFunction) => {
                Some(LocalName::ForwardDeclaredFunction {
                    name: name.clone(),
                    scope: scope.clone(),
                })
            }
            _ => None,
        }
    }

    /// Address this name as an expression. `in_scope` is true when the
    /// reference site sits inside a method of the binding's own scope class,
    /// where the carrier is the implicit receiver.
    pub fn as_expr(&self, in_scope: bool) -> Expr {
        match self {
            LocalName::ModuleLevel { qualified } => qualified.name_expr(),
            LocalName::RegularVar { name, .. } | LocalName::SimpleFunction { name, .. } => {
                name.ident().name_expr()
            }
            LocalName::CapturedMutableVar { name, scope } => {
                if in_scope {
                    Expr::This.field(name.ident())
                } else {
                    Expr::Name(NameExpr {
                        parts: vec![scope.ident(), name.ident()],
                    })
                }
            }
            LocalName::ThisCapturedMutableVar { name } => Expr::This.field(name.ident()),
            LocalName::RecursiveFunction { name, scope } => {
                let subject = if in_scope {
                    Expr::This
                } else {
                    scope.ident().name_expr()
                };
                Expr::MethodRef(MethodRef {
                    subject: Box::new(subject),
                    method: name.ident(),
                })
            }
            LocalName::ForwardDeclaredFunction { name, scope } => {
                let subject = if in_scope {
                    Expr::This
                } else {
                    scope.ident().name_expr()
                };
                // The forward declaration is a field holding the function
                // value, so the field access is the value.
                Expr::FieldAccess(FieldAccess {
                    subject: Box::new(subject),
                    field: name.ident(),
                })
            }
        }
    }

    /// Address this name as an assignment target, when it has one.
    pub fn as_lhs(&self, in_scope: bool) -> Option<Expr> {
        match self {
            LocalName::ModuleLevel { qualified } => Some(qualified.name_expr()),
            LocalName::RegularVar { name, .. } | LocalName::SimpleFunction { name, .. } => {
                Some(name.ident().name_expr())
            }
            LocalName::CapturedMutableVar { .. }
            | LocalName::ThisCapturedMutableVar { .. }
            | LocalName::ForwardDeclaredFunction { .. } => Some(self.as_expr(in_scope)),
            LocalName::RecursiveFunction { .. } => None,
        }
    }
}
