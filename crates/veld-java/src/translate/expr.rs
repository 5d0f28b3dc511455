//! Expression dispatch.

use veld_ir as ir;
use veld_ir::DeclKind;

use crate::ast::{
    Expr, Ident, InfixExpr, InstanceOfExpr, JavaOp, Literal, NewExpr, StaticCall,
};
use crate::error::LowerResult;
use crate::local::LocalName;
use crate::names::OutName;
use crate::standard::{
    garbage_expr, CORE_CAST, CORE_CAST_TO_NON_NULL, JAVA_LANG_DOUBLE_NAN,
    JAVA_LANG_DOUBLE_NEGATIVE_INFINITY, JAVA_LANG_DOUBLE_POSITIVE_INFINITY,
    JAVA_LANG_STRING_BUILDER,
};
use crate::types::JavaType;

use super::ModuleScope;

/// javac rejects string literals above this many bytes of modified UTF-8.
const JAVAC_STRING_LITERAL_LIMIT: usize = 65534;

impl<'n, 'ir> ModuleScope<'n, 'ir> {
    pub(crate) fn expr(&mut self, x: &ir::Expression) -> LowerResult<Expr> {
        Ok(match x {
            ir::Expression::Value(v) => self.value(v)?,
            ir::Expression::Reference(r) => self.reference(&r.name)?,
            ir::Expression::Call(call) => self.call_expr(call)?,
            ir::Expression::Infix(i) => Expr::Infix(InfixExpr {
                op: infix_op(i.op),
                left: Box::new(self.expr(&i.left)?),
                right: Box::new(self.expr(&i.right)?),
            }),
            ir::Expression::Prefix(p) => match p.op {
                ir::PrefixOp::Not => simplified_complement(self.expr(&p.operand)?),
            },
            ir::Expression::GetProperty(gp) => self.get_property(gp)?,
            ir::Expression::Cast(c) => self.cast_expr(c)?,
            ir::Expression::InstanceOf(io) => Expr::InstanceOf(InstanceOfExpr {
                expr: Box::new(self.expr(&io.expr)?),
                ty: crate::ast::JType::Class(
                    JavaType::from_ir(&io.ty, self.names)?
                        .as_reference()
                        .to_class_type(),
                ),
            }),
            // The null-check happened upstream; the value flows through.
            ir::Expression::NotNull(e) => self.expr(e)?,
            ir::Expression::This => Expr::This,
            ir::Expression::Garbage(g) => garbage_expr(&g.source, g.diagnostic.as_deref()),
        })
    }

    pub(crate) fn local_in_scope(&self, local: &LocalName) -> bool {
        local
            .scope_name()
            .is_some_and(|scope| self.scope_stack.iter().any(|s| s == scope))
    }

    /// A captured mutable var accessed from code living inside its own
    /// scope class is addressed via the implicit receiver.
    pub(crate) fn local_for_site(&mut self, name: &ir::ResolvedName) -> LocalName {
        let local = self.names.lookup_local_or_external(name);
        match local {
            LocalName::CapturedMutableVar {
                ref name,
                ref scope,
            } if self.scope_stack.contains(scope) => LocalName::ThisCapturedMutableVar {
                name: name.clone(),
            },
            other => other,
        }
    }

    fn addressed(&mut self, name: &ir::ResolvedName) -> Expr {
        let local = self.local_for_site(name);
        let in_scope = self.local_in_scope(&local);
        local.as_expr(in_scope)
    }

    fn reference(&mut self, name: &ir::ResolvedName) -> LowerResult<Expr> {
        let resolved = self.names.usage().resolve_import(name.id);
        let Some(decl) = self.names.usage().decl_of(resolved) else {
            // Unresolved: degrade to a plain local read.
            return Ok(self.addressed(name));
        };
        Ok(match decl.kind {
            DeclKind::Type | DeclKind::Method => garbage_expr(
                &name.text,
                Some("declared as a type or method but used as a value"),
            ),
            DeclKind::ModuleLevel | DeclKind::Test => {
                let (class, field) = self.names.module_member(name);
                class.qualify(field.text).name_expr()
            }
            DeclKind::ModuleFunction => {
                let (class, func) = self.names.module_member(name);
                class.qualify(func.text).static_method_ref()
            }
            DeclKind::LocalVar { .. }
            | DeclKind::Formal { .. }
            | DeclKind::RestFormal
            | DeclKind::LocalFunction => self.addressed(name),
            DeclKind::Import(kind) => match kind {
                // An import whose target module is outside this unit keeps
                // its import-declared shape.
                ir::ImportKind::Value | ir::ImportKind::Type => {
                    let (class, field) = self.names.module_member(name);
                    class.qualify(field.text).name_expr()
                }
                ir::ImportKind::Function => {
                    let (class, func) = self.names.module_member(name);
                    class.qualify(func.text).static_method_ref()
                }
            },
        })
    }

    fn call_expr(&mut self, call: &ir::Call) -> LowerResult<Expr> {
        match &call.callee {
            ir::Callee::Method(method) => self.call_method(method, &call.args),
            ir::Callee::Constructor(ctor) => {
                let args = self.call_args(&call.args)?;
                Ok(Expr::New(NewExpr {
                    ty: self.class_type_ref(&ctor.ty),
                    diamond: !ctor.ty.args.is_empty(),
                    args,
                }))
            }
            ir::Callee::Function(fn_ref) => self.call_function(fn_ref, &call.args),
            ir::Callee::Value(value) => {
                let callable = self.expr(&value.callee)?;
                self.call_function_value(&value.sig, callable, &call.args)
            }
            ir::Callee::Garbage(g) => Ok(garbage_expr(&g.source, g.diagnostic.as_deref())),
        }
    }

    fn call_args(&mut self, args: &[ir::Expression]) -> LowerResult<Vec<Expr>> {
        args.iter().map(|arg| self.expr(arg)).collect()
    }

    fn call_method(
        &mut self,
        method: &ir::MethodRef,
        args: &[ir::Expression],
    ) -> LowerResult<Expr> {
        let method_name = self.names.method_name(&method.method).ident();
        let args = self.call_args(args)?;
        Ok(match &method.subject {
            ir::Subject::Type(nominal) => Expr::StaticCall(StaticCall {
                class: Some(self.names.class_type_name(nominal)),
                method: method_name,
                args,
            }),
            ir::Subject::Expr(subject) => {
                let subject = self.expr(subject)?;
                subject.call(method_name, args)
            }
        })
    }

    /// Direct calls of declared functions: module functions become static
    /// calls; local functions dispatch by their lifted form.
    fn call_function(&mut self, fn_ref: &ir::FnRef, args: &[ir::Expression]) -> LowerResult<Expr> {
        let resolved = self.names.usage().resolve_import(fn_ref.name.id);
        let decl_kind = self.names.usage().decl_of(resolved).map(|d| d.kind);
        match decl_kind {
            Some(DeclKind::LocalFunction) => self.call_lifted_function(fn_ref, args),
            Some(
                DeclKind::LocalVar { .. }
                | DeclKind::Formal { .. }
                | DeclKind::RestFormal
                | DeclKind::ModuleLevel,
            ) => {
                let callable = self.addressed(&fn_ref.name);
                self.call_function_value(&fn_ref.sig, callable, args)
            }
            Some(DeclKind::Type | DeclKind::Method | DeclKind::Test) => Ok(garbage_expr(
                &fn_ref.name.text,
                Some("declaration cannot be called as a function"),
            )),
            Some(DeclKind::ModuleFunction | DeclKind::Import(_)) | None => {
                let (class, func) = self.names.module_member(&fn_ref.name);
                let args = self.call_args(args)?;
                Ok(Expr::StaticCall(StaticCall {
                    class: Some(class),
                    method: func.ident(),
                    args,
                }))
            }
        }
    }

    fn call_lifted_function(
        &mut self,
        fn_ref: &ir::FnRef,
        args: &[ir::Expression],
    ) -> LowerResult<Expr> {
        let local = self.names.lookup_local_or_external(&fn_ref.name);
        let in_scope = self.local_in_scope(&local);
        match local {
            LocalName::RecursiveFunction { name, scope } => {
                let receiver = scope_receiver(&scope, in_scope);
                let args = self.call_args(args)?;
                Ok(receiver.call(name.ident(), args))
            }
            LocalName::ForwardDeclaredFunction { name, scope } => {
                let receiver = scope_receiver(&scope, in_scope);
                let field = receiver.field(name.ident());
                // The field holds a SAM value; call through its method.
                self.call_function_value(&fn_ref.sig, field, args)
            }
            other => {
                let callable = other.as_expr(in_scope);
                self.call_function_value(&fn_ref.sig, callable, args)
            }
        }
    }

    /// Call a function-typed value through its SAM method.
    fn call_function_value(
        &mut self,
        sig: &ir::Signature,
        callable: Expr,
        args: &[ir::Expression],
    ) -> LowerResult<Expr> {
        let sam = self.names.sam_type(sig)?;
        let args = self.call_args(args)?;
        Ok(callable.call(Ident::new(OutName::fixed(sam.method)), args))
    }

    fn get_property(&mut self, gp: &ir::GetProperty) -> LowerResult<Expr> {
        Ok(match (&gp.subject, gp.backed) {
            (ir::Subject::Expr(subject), true) => {
                let subject = self.expr(subject)?;
                subject.field(self.names.static_field(&gp.property).ident())
            }
            (ir::Subject::Expr(subject), false) => {
                let subject = self.expr(subject)?;
                let getter = self.names.getter_name(&gp.property, &gp.ty);
                subject.call(getter, vec![])
            }
            (ir::Subject::Type(nominal), _) => {
                let class = self.names.class_type_name(nominal);
                let field = self.names.static_field(&gp.property);
                class.qualify(field.text).name_expr()
            }
        })
    }

    /// Checked casts run through the runtime so failures surface through
    /// the failure channel rather than as raw class cast errors.
    fn cast_expr(&mut self, cast: &ir::Cast) -> LowerResult<Expr> {
        let stripped = cast.ty.without_null();
        let helper = if *stripped != cast.ty && !matches!(stripped, ir::Type::Never) {
            &CORE_CAST_TO_NON_NULL
        } else {
            &CORE_CAST
        };
        let literal = JavaType::from_ir(&cast.ty, self.names)?.to_class_literal();
        let value = self.expr(&cast.expr)?;
        Ok(helper.static_call(vec![literal, value]))
    }

    fn value(&mut self, v: &ir::Value) -> LowerResult<Expr> {
        Ok(match v {
            ir::Value::Bool(b) => Expr::Literal(Literal::Bool(*b)),
            ir::Value::Int(i) => Expr::Literal(Literal::Int(*i)),
            ir::Value::Float64(f) => {
                if *f == f64::INFINITY {
                    JAVA_LANG_DOUBLE_POSITIVE_INFINITY.name_expr()
                } else if *f == f64::NEG_INFINITY {
                    JAVA_LANG_DOUBLE_NEGATIVE_INFINITY.name_expr()
                } else if f.is_nan() {
                    JAVA_LANG_DOUBLE_NAN.name_expr()
                } else {
                    Expr::Literal(Literal::Double(*f))
                }
            }
            ir::Value::Str(s) => string_expr(s),
            ir::Value::Null | ir::Value::Void => Expr::Literal(Literal::Null),
            ir::Value::TypeRef(ty) => JavaType::from_ir(ty, self.names)?.to_class_literal(),
        })
    }
}

fn scope_receiver(scope: &OutName, in_scope: bool) -> Expr {
    if in_scope {
        Expr::This
    } else {
        scope.ident().name_expr()
    }
}

fn infix_op(op: ir::Op) -> JavaOp {
    match op {
        ir::Op::AndAnd => JavaOp::And,
        ir::Op::OrOr => JavaOp::Or,
        ir::Op::EqInt => JavaOp::Eq,
        ir::Op::LtInt => JavaOp::Lt,
        ir::Op::LeInt => JavaOp::Le,
        ir::Op::GtInt => JavaOp::Gt,
        ir::Op::GeInt => JavaOp::Ge,
        ir::Op::AddInt => JavaOp::Add,
    }
}

/// Take the complement of a boolean expression, flipping comparisons and
/// collapsing double negation instead of stacking `!`.
pub(crate) fn simplified_complement(value: Expr) -> Expr {
    match value {
        Expr::Infix(infix) => {
            let complement = match infix.op {
                JavaOp::Ge => Some(JavaOp::Lt),
                JavaOp::Le => Some(JavaOp::Gt),
                JavaOp::Gt => Some(JavaOp::Le),
                JavaOp::Lt => Some(JavaOp::Ge),
                JavaOp::Ne => Some(JavaOp::Eq),
                JavaOp::Eq => Some(JavaOp::Ne),
                JavaOp::And | JavaOp::Or | JavaOp::Add => None,
            };
            match complement {
                Some(op) => Expr::Infix(InfixExpr { op, ..infix }),
                None => Expr::Not(Box::new(Expr::Infix(infix))),
            }
        }
        Expr::Not(inner) => *inner,
        other => Expr::Not(Box::new(other)),
    }
}

/// Modified UTF-8 byte count of one code point, as the class-file format
/// measures string constants.
fn modified_utf8_len(c: char) -> usize {
    let code = c as u32;
    match code {
        0 => 2,
        1..=0x7f => 1,
        0x80..=0x7ff => 2,
        0x800..=0xffff => 3,
        // Encoded as a surrogate pair, three bytes each.
        _ => 6,
    }
}

/// String constants beyond the class-file limit become a StringBuilder
/// chain of in-limit chunks. Literal identity is not semantically
/// meaningful, so the rewrite is safe.
fn string_expr(s: &str) -> Expr {
    let total: usize = s.chars().map(modified_utf8_len).sum();
    if total <= JAVAC_STRING_LITERAL_LIMIT {
        return Expr::Literal(Literal::Str(s.to_string()));
    }

    let utf16_len = s.encode_utf16().count();
    let mut expr = Expr::New(NewExpr {
        ty: crate::ast::ClassType::raw(JAVA_LANG_STRING_BUILDER.clone()),
        diamond: false,
        args: vec![Expr::Literal(Literal::Int(utf16_len as i64))],
    });
    let mut chunk = String::new();
    let mut chunk_len = 0usize;
    for c in s.chars() {
        let len = modified_utf8_len(c);
        if chunk_len + len >= JAVAC_STRING_LITERAL_LIMIT {
            expr = append_chunk(expr, std::mem::take(&mut chunk));
            chunk_len = 0;
        }
        chunk.push(c);
        chunk_len += len;
    }
    if !chunk.is_empty() {
        expr = append_chunk(expr, chunk);
    }
    expr.call(Ident::new(OutName::fixed("toString")), vec![])
}

fn append_chunk(expr: Expr, chunk: String) -> Expr {
    expr.call(
        Ident::new(OutName::fixed("append")),
        vec![Expr::Literal(Literal::Str(chunk))],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NameExpr;

    fn name(text: &str) -> Expr {
        Expr::Name(NameExpr {
            parts: vec![Ident::new(OutName::fixed(text))],
        })
    }

    #[test]
    fn complement_flips_comparisons() {
        let lt = Expr::infix(JavaOp::Lt, name("a"), name("b"));
        match simplified_complement(lt) {
            Expr::Infix(infix) => assert_eq!(infix.op, JavaOp::Ge),
            other => panic!("expected infix, got {other:?}"),
        }
    }

    #[test]
    fn complement_collapses_double_negation() {
        let not = Expr::Not(Box::new(name("a")));
        assert_eq!(simplified_complement(not), name("a"));
        assert_eq!(
            simplified_complement(name("a")),
            Expr::Not(Box::new(name("a")))
        );
    }

    #[test]
    fn short_strings_stay_literal() {
        assert_eq!(
            string_expr("hello"),
            Expr::Literal(Literal::Str("hello".to_string()))
        );
    }

    #[test]
    fn long_strings_become_builder_chains() {
        let long = "x".repeat(70_000);
        match string_expr(&long) {
            Expr::InstanceCall(call) => {
                assert_eq!(call.method.text(), "toString");
                // Two appends: 65533 chars then the remainder.
                let mut appends = 0;
                let mut inner = call.subject.expect("chained on the builder");
                while let Expr::InstanceCall(c) = *inner {
                    assert_eq!(c.method.text(), "append");
                    appends += 1;
                    inner = c.subject.expect("chained");
                }
                assert_eq!(appends, 2);
            }
            other => panic!("expected builder chain, got {other:?}"),
        }
    }
}
