//! IR statements and expressions.
//!
//! Both enums are closed: a backend dispatches over every variant with no
//! wildcard arm, so growing the IR breaks backends at compile time instead
//! of at runtime.

use crate::name::{BodyId, DotName, ResolvedName};
use crate::types::{NominalType, Signature, Type, TypeFormal};

/// A function-like: type/value parameters plus an optional body. A missing
/// body means the declaration is abstract.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub body_id: BodyId,
    pub type_params: Vec<TypeFormal>,
    pub params: Parameters,
    pub return_type: Type,
    pub body: Option<Block>,
}

/// The value parameters of a function-like.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters {
    /// The implicit receiver binding, for methods.
    pub this_name: Option<ResolvedName>,
    pub params: Vec<Formal>,
    /// Trailing rest parameter; its type is the element type.
    pub rest: Option<Formal>,
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Formal {
    pub name: ResolvedName,
    pub ty: Type,
    pub optional: bool,
    /// False when the parameter is reassigned somewhere in the body.
    pub assign_once: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

/// A construct the front end could not translate; carries its textual form
/// for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Garbage {
    pub source: String,
    pub diagnostic: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Block),
    Expr(Expression),
    LocalDecl(LocalDecl),
    LocalFunction(LocalFunctionDecl),
    Assign(Assign),
    SetProperty(SetProperty),
    If(If),
    While(While),
    Labeled(Labeled),
    Break(Option<ResolvedName>),
    Continue(Option<ResolvedName>),
    Return(Option<Expression>),
    /// Signal the failure channel; payloads travel out of band.
    Throw,
    Try(Try),
    Switch(Switch),
    Garbage(Garbage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalDecl {
    pub name: ResolvedName,
    pub ty: Type,
    pub init: Option<Expression>,
    pub assign_once: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalFunctionDecl {
    pub name: ResolvedName,
    pub sig: Signature,
    pub func: Function,
}

/// Reassignment of a local or module-level binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: ResolvedName,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetProperty {
    pub subject: Expression,
    pub property: DotName,
    /// True when the property is storage-backed on the receiver rather than
    /// abstract (accessor-mediated).
    pub backed: bool,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Labeled {
    pub label: ResolvedName,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Try {
    pub tried: Block,
    pub recover: Block,
}

/// A computed jump over small integer case indices, produced by earlier
/// control-flow conversion. Case values never overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub selector: Expression,
    pub cases: Vec<Case>,
    pub default: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub values: Vec<i64>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Value(Value),
    Reference(Reference),
    Call(Call),
    Infix(Infix),
    Prefix(Prefix),
    GetProperty(GetProperty),
    Cast(Cast),
    InstanceOf(InstanceOf),
    /// Assertion that a nullable value is present; checked upstream.
    NotNull(Box<Expression>),
    This,
    Garbage(Garbage),
}

/// A compile-time constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float64(f64),
    Str(String),
    Null,
    Void,
    /// A first-class reference to a type, e.g. for checked casts.
    TypeRef(Type),
}

/// A use of a resolved binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub name: ResolvedName,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Callee,
    pub args: Vec<Expression>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A direct call of a declared function (module-level or local).
    Function(FnRef),
    /// A method call through a receiver expression or a type (static).
    Method(MethodRef),
    /// Construction of a nominal type.
    Constructor(CtorRef),
    /// A call of a function-typed value.
    Value(ValueCallee),
    Garbage(Garbage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnRef {
    pub name: ResolvedName,
    pub sig: Signature,
}

/// Receiver of a method call or property access.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    Expr(Box<Expression>),
    Type(NominalType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodRef {
    pub subject: Subject,
    pub method: DotName,
    pub sig: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CtorRef {
    pub ty: NominalType,
    pub sig: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueCallee {
    pub callee: Box<Expression>,
    pub sig: Signature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetProperty {
    pub subject: Subject,
    pub property: DotName,
    /// See [`SetProperty::backed`].
    pub backed: bool,
    pub ty: Type,
}

/// The closed infix operator set after desugaring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    AndAnd,
    OrOr,
    EqInt,
    LtInt,
    LeInt,
    GtInt,
    GeInt,
    AddInt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Infix {
    pub op: Op,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prefix {
    pub op: PrefixOp,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub ty: Type,
    pub expr: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOf {
    pub expr: Box<Expression>,
    pub ty: Type,
}

impl Statement {
    /// Visit every binding referenced anywhere under this statement,
    /// including inside nested local function bodies.
    pub fn for_each_reference(&self, f: &mut impl FnMut(&ResolvedName)) {
        match self {
            Statement::Block(b) => {
                for s in &b.statements {
                    s.for_each_reference(f);
                }
            }
            Statement::Expr(e) => e.for_each_reference(f),
            Statement::LocalDecl(d) => {
                if let Some(init) = &d.init {
                    init.for_each_reference(f);
                }
            }
            Statement::LocalFunction(d) => {
                if let Some(body) = &d.func.body {
                    for s in &body.statements {
                        s.for_each_reference(f);
                    }
                }
            }
            Statement::Assign(a) => a.value.for_each_reference(f),
            Statement::SetProperty(sp) => {
                sp.subject.for_each_reference(f);
                sp.value.for_each_reference(f);
            }
            Statement::If(i) => {
                i.test.for_each_reference(f);
                i.consequent.for_each_reference(f);
                if let Some(alt) = &i.alternate {
                    alt.for_each_reference(f);
                }
            }
            Statement::While(w) => {
                w.test.for_each_reference(f);
                w.body.for_each_reference(f);
            }
            Statement::Labeled(l) => l.body.for_each_reference(f),
            Statement::Break(_) | Statement::Continue(_) | Statement::Throw => {}
            Statement::Return(e) => {
                if let Some(e) = e {
                    e.for_each_reference(f);
                }
            }
            Statement::Try(t) => {
                for s in &t.tried.statements {
                    s.for_each_reference(f);
                }
                for s in &t.recover.statements {
                    s.for_each_reference(f);
                }
            }
            Statement::Switch(sw) => {
                sw.selector.for_each_reference(f);
                for case in &sw.cases {
                    for s in &case.body.statements {
                        s.for_each_reference(f);
                    }
                }
                for s in &sw.default.statements {
                    s.for_each_reference(f);
                }
            }
            Statement::Garbage(_) => {}
        }
    }
}

impl Expression {
    /// Visit every binding referenced under this expression.
    pub fn for_each_reference(&self, f: &mut impl FnMut(&ResolvedName)) {
        match self {
            Expression::Value(_) | Expression::This | Expression::Garbage(_) => {}
            Expression::Reference(r) => f(&r.name),
            Expression::Call(call) => {
                match &call.callee {
                    Callee::Function(fr) => f(&fr.name),
                    Callee::Method(m) => {
                        if let Subject::Expr(e) = &m.subject {
                            e.for_each_reference(f);
                        }
                    }
                    Callee::Constructor(_) | Callee::Garbage(_) => {}
                    Callee::Value(v) => v.callee.for_each_reference(f),
                }
                for arg in &call.args {
                    arg.for_each_reference(f);
                }
            }
            Expression::Infix(i) => {
                i.left.for_each_reference(f);
                i.right.for_each_reference(f);
            }
            Expression::Prefix(p) => p.operand.for_each_reference(f),
            Expression::GetProperty(gp) => {
                if let Subject::Expr(e) = &gp.subject {
                    e.for_each_reference(f);
                }
            }
            Expression::Cast(c) => c.expr.for_each_reference(f),
            Expression::InstanceOf(io) => io.expr.for_each_reference(f),
            Expression::NotNull(e) => e.for_each_reference(f),
        }
    }
}
