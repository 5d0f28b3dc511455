//! The Java output AST.
//!
//! A plain data tree: no parent pointers and no source positions (those stay
//! on the input IR). The pretty printer and the packaging collaborator
//! consume this, guided by [`ProgramMeta`].

use serde::{Deserialize, Serialize};

use crate::grammar::QualifiedName;
use crate::names::OutName;

/// A single output identifier occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: OutName,
}

impl Ident {
    pub fn new(name: OutName) -> Self {
        Self { name }
    }

    pub fn text(&self) -> &str {
        &self.name.text
    }

    pub fn name_expr(&self) -> Expr {
        Expr::Name(NameExpr {
            parts: vec![self.clone()],
        })
    }
}

/// Where generated source should land in the output project tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceDir {
    #[default]
    MainJava,
    TestJava,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryPoint {
    #[default]
    None,
    MainMethod,
}

/// Metadata the packaging collaborator needs to lay out compilable sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramMeta {
    pub entry_point: EntryPoint,
    pub source_dir: SourceDir,
    pub test_class: bool,
}

/// One output compilation unit: a package plus a single top-level type.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub package: QualifiedName,
    pub meta: ProgramMeta,
    pub decl: TypeDeclaration,
}

impl Program {
    /// Simple name of the declared type.
    pub fn type_name(&self) -> &str {
        match &self.decl {
            TypeDeclaration::Class(c) => c.name.text(),
            TypeDeclaration::Interface(i) => i.name.text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDeclaration {
    Class(ClassDecl),
    Interface(InterfaceDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    Public,
    #[default]
    PackagePrivate,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: QualifiedName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub access: Access,
    pub is_final: bool,
    pub is_static: bool,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub extends: Option<ClassType>,
    pub implements: Vec<ClassType>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub access: Access,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<ClassType>,
    pub members: Vec<InterfaceMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Initializer(Initializer),
    Class(ClassDecl),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub access: Access,
    pub is_static: bool,
    pub is_final: bool,
    pub ty: JType,
    pub name: Ident,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub annotations: Vec<Annotation>,
    pub access: Access,
    pub is_static: bool,
    pub is_abstract: bool,
    pub type_params: Vec<TypeParam>,
    pub result: ResultType,
    pub name: Ident,
    pub params: Vec<Param>,
    pub throws: Vec<ClassType>,
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    pub access: Access,
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Initializer {
    pub is_static: bool,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceMethodKind {
    Abstract,
    Default,
    Static,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceMember {
    Method(InterfaceMethod),
    Field(InterfaceField),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceMethod {
    pub kind: InterfaceMethodKind,
    pub type_params: Vec<TypeParam>,
    pub result: ResultType,
    pub name: Ident,
    pub params: Vec<Param>,
    /// Required for default and static methods, absent for abstract ones.
    pub body: Option<Block>,
}

/// Interface fields are implicitly public static final.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceField {
    pub ty: JType,
    pub name: Ident,
    pub init: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: JType,
    pub name: Ident,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: OutName,
    pub bounds: Vec<ClassType>,
}

/// The JVM primitive types used by this backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Int,
    Long,
    Double,
}

impl PrimitiveKind {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Double => "double",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JType {
    Primitive(PrimitiveKind),
    Class(ClassType),
    Array(Box<JType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassType {
    pub name: QualifiedName,
    pub args: Vec<TypeArg>,
    /// Rendered as a nullability annotation on the use site.
    pub nullable: bool,
}

impl ClassType {
    pub fn raw(name: QualifiedName) -> Self {
        Self {
            name,
            args: Vec::new(),
            nullable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    Type(ClassType),
    Wildcard,
    Extends(ClassType),
    Super(ClassType),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultType {
    Void,
    Type(JType),
}

impl ResultType {
    pub fn is_void(&self) -> bool {
        matches!(self, ResultType::Void)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    /// Prepend a preamble; keeps the block flat.
    pub fn preface(mut self, preamble: Vec<Stmt>) -> Block {
        if preamble.is_empty() {
            return self;
        }
        let mut statements = preamble;
        statements.append(&mut self.statements);
        Block { statements }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Block),
    LocalVar(LocalVar),
    LocalClass(LocalClassDecl),
    Expr(Expr),
    If(IfStmt),
    While(WhileStmt),
    Switch(SwitchStmt),
    Try(TryStmt),
    Labeled(LabeledStmt),
    Break(Option<Ident>),
    Continue(Option<Ident>),
    Return(Option<Expr>),
    Throw(Expr),
    /// A line comment standing in for an untranslatable statement.
    Comment(String),
    /// Alternate constructor invocation, `this(...)`; only valid first in a
    /// constructor body.
    ThisCall(Vec<Expr>),
}

impl Stmt {
    /// Wrap in a block unless it already is one.
    pub fn into_block(self) -> Block {
        match self {
            Stmt::Block(b) => b,
            other => Block::new(vec![other]),
        }
    }

    /// True when control provably leaves this statement without falling
    /// through, for switch-case break insertion.
    pub fn exits_abruptly(&self) -> bool {
        matches!(
            self,
            Stmt::Return(_) | Stmt::Throw(_) | Stmt::Break(_) | Stmt::Continue(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub ty: JType,
    pub name: Ident,
    pub is_final: bool,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalClassDecl {
    pub name: Ident,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub test: Expr,
    pub consequent: Block,
    /// A block, or another `If` for an else-if chain.
    pub alternate: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub test: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub selector: Expr,
    pub cases: Vec<SwitchCase>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// Case label values; `None` is the default case.
    pub labels: Option<Vec<i64>>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub types: Vec<ClassType>,
    pub name: Ident,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStmt {
    pub label: Ident,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A possibly qualified name, e.g. `scope__1.x` or `pkg.Cls.field`.
    Name(NameExpr),
    FieldAccess(FieldAccess),
    This,
    Literal(Literal),
    Assign(AssignExpr),
    Infix(InfixExpr),
    Not(Box<Expr>),
    InstanceCall(InstanceCall),
    StaticCall(StaticCall),
    New(NewExpr),
    Lambda(Lambda),
    MethodRef(MethodRef),
    StaticMethodRef(StaticMethodRef),
    Cast(CastExpr),
    InstanceOf(InstanceOfExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameExpr {
    pub parts: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccess {
    pub subject: Box<Expr>,
    pub field: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Null,
    /// `T.class`
    Class(JType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub target: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpr {
    pub op: JavaOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceCall {
    /// Missing subject means an unqualified call on the current instance.
    pub subject: Option<Box<Expr>>,
    pub method: Ident,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticCall {
    /// Missing class means an unqualified call within the declaring class.
    pub class: Option<QualifiedName>,
    pub method: Ident,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub ty: ClassType,
    /// Emit a `<>` diamond after the type.
    pub diamond: bool,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<Ident>,
    pub body: LambdaBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodRef {
    pub subject: Box<Expr>,
    pub method: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticMethodRef {
    pub class: QualifiedName,
    pub method: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub ty: JType,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOfExpr {
    pub expr: Box<Expr>,
    pub ty: JType,
}

impl Expr {
    pub fn field(self, field: Ident) -> Expr {
        Expr::FieldAccess(FieldAccess {
            subject: Box::new(self),
            field,
        })
    }

    pub fn call(self, method: Ident, args: Vec<Expr>) -> Expr {
        Expr::InstanceCall(InstanceCall {
            subject: Some(Box::new(self)),
            method,
            args,
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Expr {
        Expr::Assign(AssignExpr {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn infix(op: JavaOp, left: Expr, right: Expr) -> Expr {
        Expr::Infix(InfixExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Compare against `null`.
    pub fn test_null(self) -> Expr {
        Expr::infix(JavaOp::Eq, self, Expr::Literal(Literal::Null))
    }

    /// True when Java allows this expression as a standalone statement.
    pub fn makes_statement(&self) -> bool {
        matches!(
            self,
            Expr::Assign(_) | Expr::InstanceCall(_) | Expr::StaticCall(_) | Expr::New(_)
        )
    }
}

/// Build a possibly qualified name expression from raw identifier text.
pub fn name_expr<I, S>(parts: I) -> Expr
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Expr::Name(NameExpr {
        parts: parts
            .into_iter()
            .map(|p| Ident::new(OutName::fixed(p.into())))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_meta_round_trips_as_json() {
        let meta = ProgramMeta {
            entry_point: EntryPoint::MainMethod,
            source_dir: SourceDir::TestJava,
            test_class: true,
        };
        let json = serde_json::to_string(&meta).unwrap();
        let back: ProgramMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }

    #[test]
    fn statement_expression_classification() {
        let call = Expr::InstanceCall(InstanceCall {
            subject: None,
            method: Ident::new(crate::names::OutName::fixed("run")),
            args: vec![],
        });
        assert!(call.makes_statement());
        assert!(!Expr::This.makes_statement());
        assert!(!Expr::Literal(Literal::Int(1)).makes_statement());
    }
}

impl QualifiedName {
    pub fn class_type(&self) -> ClassType {
        ClassType::raw(self.clone())
    }

    pub fn name_expr(&self) -> Expr {
        name_expr(self.parts().iter().cloned())
    }

    /// A static method call on this fully qualified path; the last part is
    /// the method name.
    pub fn static_call(&self, args: Vec<Expr>) -> Expr {
        let (class, method) = self.split();
        Expr::StaticCall(StaticCall {
            class: if class.is_empty() { None } else { Some(class) },
            method: Ident::new(OutName::fixed(method)),
            args,
        })
    }

    /// A static method reference `Cls::method`; the last part is the method.
    pub fn static_method_ref(&self) -> Expr {
        let (class, method) = self.split();
        Expr::StaticMethodRef(StaticMethodRef {
            class,
            method: Ident::new(OutName::fixed(method)),
        })
    }
}
