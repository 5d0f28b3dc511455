//! Veld Intermediate Representation
//!
//! The resolved, typed tree produced by the front end and consumed by the
//! code-generating backends. Everything here is read-only from a backend's
//! point of view: names are already resolved to stable ids, types are fully
//! inferred, and the [`usage::UsageIndex`] answers "where is this binding
//! declared and used" without another tree walk.

pub mod module;
pub mod name;
pub mod tree;
pub mod types;
pub mod usage;

pub use module::{
    Accessor, Category, Constructor, FunctionDecl, Import, ImportKind, Member, Method, Module,
    ModuleLevelDecl, ModuleResult, ModuleSet, Property, StaticProperty, TestDecl, TopLevel,
    TypeDecl, TypeDeclKind, Visibility,
};
pub use name::{BindingId, BodyId, DotName, ModuleId, ResolvedName};
pub use tree::{
    Assign, Block, Call, Callee, Case, Cast, CtorRef, Expression, FnRef, Formal, Function,
    Garbage, GetProperty, If, Infix, InstanceOf, Labeled, LocalDecl, LocalFunctionDecl, MethodRef,
    Op, Parameters, Prefix, PrefixOp, Reference, SetProperty, Statement, Subject, Switch, Try,
    Value, ValueCallee, While,
};
pub use types::{NominalKind, NominalType, SigParam, Signature, Type, TypeFormal, TypeVar};
pub use usage::{DeclKind, DeclSite, UsageIndex, UseSite};
