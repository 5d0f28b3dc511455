//! Modules and top-level declarations.

use crate::name::{BodyId, DotName, ModuleId, ResolvedName};
use crate::tree::{Block, Expression, Function, Garbage};
use crate::types::{NominalType, Signature, Type, TypeFormal};

/// All modules of one compiled unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleSet {
    pub modules: Vec<Module>,
}

impl ModuleSet {
    pub fn single(module: Module) -> Self {
        Self {
            modules: vec![module],
        }
    }
}

/// Whether a declaration ships with the library or only with its tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Production,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub id: ModuleId,
    /// Source path of the module, dashed segments, e.g. `demo/hello-world`.
    pub name: String,
    /// Standard-library preambles get no entry point.
    pub is_std_lib: bool,
    /// Body id of module-level initialization code.
    pub body_id: BodyId,
    pub imports: Vec<Import>,
    pub top_levels: Vec<TopLevel>,
    /// The module's exported result value, if it has one.
    pub result: Option<ModuleResult>,
}

/// The module's result expression with its resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleResult {
    pub expr: Expression,
    pub ty: Type,
}

/// A name imported from another module, already resolved to its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub local: ResolvedName,
    pub module: ModuleId,
    pub target: ResolvedName,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Value,
    Function,
    Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    Function(FunctionDecl),
    ModuleLevel(ModuleLevelDecl),
    /// A run of module initialization statements.
    Init(Block),
    Type(TypeDecl),
    Test(TestDecl),
    Garbage(Garbage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: ResolvedName,
    pub exported: bool,
    pub category: Category,
    pub func: Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleLevelDecl {
    pub name: ResolvedName,
    pub ty: Type,
    pub init: Option<Expression>,
    pub assign_once: bool,
    pub exported: bool,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclKind {
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: ResolvedName,
    pub kind: TypeDeclKind,
    pub exported: bool,
    pub category: Category,
    pub type_params: Vec<TypeFormal>,
    pub super_types: Vec<NominalType>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Constructor(Constructor),
    Method(Method),
    Getter(Accessor),
    Setter(Accessor),
    Property(Property),
    StaticProperty(StaticProperty),
    Garbage(Garbage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    pub name: ResolvedName,
    pub visibility: Visibility,
    pub func: Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: ResolvedName,
    pub dot_name: DotName,
    pub visibility: Visibility,
    pub is_static: bool,
    pub func: Function,
    /// Signatures this method overrides, with the supertype's type arguments
    /// already substituted in.
    pub overridden: Vec<Signature>,
}

/// A getter or setter; getters take no parameters, setters exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub dot_name: DotName,
    pub visibility: Visibility,
    pub func: Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: ResolvedName,
    pub dot_name: DotName,
    pub ty: Type,
    pub visibility: Visibility,
    pub assign_once: bool,
    /// Abstract properties surface only through their accessors.
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticProperty {
    pub dot_name: DotName,
    pub ty: Type,
    pub visibility: Visibility,
    pub assign_once: bool,
    pub init: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestDecl {
    pub name: ResolvedName,
    pub func: Function,
}
