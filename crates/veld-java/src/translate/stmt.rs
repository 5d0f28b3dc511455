//! Statement dispatch.
//!
//! One arm per IR statement variant, no wildcard: a new variant upstream is
//! a compile error here, not a silent gap.

use veld_ir as ir;

use crate::ast::{
    Block, CatchClause, ClassType, Expr, IfStmt, LabeledStmt, LocalVar, Stmt, SwitchCase,
    SwitchStmt, TryStmt, WhileStmt,
};
use crate::error::{LowerError, LowerResult};
use crate::standard::{as_statement_expr, garbage_comment, CORE_BUBBLE, VELD_BUBBLE_EXCEPTION};
use crate::types::JavaType;

use super::ModuleScope;

impl<'n, 'ir> ModuleScope<'n, 'ir> {
    pub(crate) fn stmt(&mut self, t: &ir::Statement) -> LowerResult<Stmt> {
        Ok(match t {
            ir::Statement::Block(b) => Stmt::Block(self.block(Some(b))?),
            ir::Statement::Expr(e) => self.expr_statement(e)?,
            ir::Statement::LocalDecl(d) => self.local_var(d)?,
            ir::Statement::LocalFunction(d) => self.local_fn_var_decl(d)?,
            ir::Statement::Assign(a) => self.assignment(a)?,
            ir::Statement::SetProperty(sp) => self.set_property(sp)?,
            ir::Statement::If(i) => Stmt::If(self.if_stmt(i)?),
            ir::Statement::While(w) => Stmt::While(WhileStmt {
                test: self.expr(&w.test)?,
                body: self.stmt(&w.body)?.into_block(),
            }),
            ir::Statement::Labeled(l) => self.labeled(l)?,
            ir::Statement::Break(label) => Stmt::Break(
                label
                    .as_ref()
                    .map(|name| self.names.label(name).ident()),
            ),
            ir::Statement::Continue(label) => Stmt::Continue(
                label
                    .as_ref()
                    .map(|name| self.names.label(name).ident()),
            ),
            ir::Statement::Return(value) => Stmt::Return(match value {
                Some(expr) => Some(self.expr(expr)?),
                None => None,
            }),
            ir::Statement::Throw => Stmt::Throw(CORE_BUBBLE.static_call(vec![])),
            ir::Statement::Try(t) => self.try_stmt(t)?,
            ir::Statement::Switch(sw) => self.switch_stmt(sw)?,
            ir::Statement::Garbage(g) => garbage_comment(&g.source, g.diagnostic.as_deref()),
        })
    }

    /// Literal and garbage expressions make meaningless statements; keep a
    /// marker comment instead.
    fn expr_statement(&mut self, e: &ir::Expression) -> LowerResult<Stmt> {
        Ok(match e {
            ir::Expression::Value(v) => match v {
                ir::Value::Bool(_)
                | ir::Value::Int(_)
                | ir::Value::Float64(_)
                | ir::Value::Str(_)
                | ir::Value::Null
                | ir::Value::Void => {
                    garbage_comment(&format!("{v:?}"), Some("Literal expression statement"))
                }
                ir::Value::TypeRef(_) => Stmt::Expr(as_statement_expr(self.expr(e)?)),
            },
            ir::Expression::Garbage(g) => garbage_comment(&g.source, g.diagnostic.as_deref()),
            other => Stmt::Expr(as_statement_expr(self.expr(other)?)),
        })
    }

    fn local_var(&mut self, d: &ir::LocalDecl) -> LowerResult<Stmt> {
        let init = match &d.init {
            Some(init) => Some(self.expr(init)?),
            None => None,
        };
        Ok(Stmt::LocalVar(LocalVar {
            ty: JavaType::from_ir(&d.ty, self.names)?.to_ast(),
            name: self.names.lookup_regular_local(&d.name).ident(),
            is_final: false,
            init,
        }))
    }

    fn assignment(&mut self, a: &ir::Assign) -> LowerResult<Stmt> {
        let target = self.left_hand_side(&a.target)?;
        let value = self.expr(&a.value)?;
        Ok(Stmt::Expr(Expr::assign(target, value)))
    }

    pub(crate) fn left_hand_side(&mut self, name: &ir::ResolvedName) -> LowerResult<Expr> {
        let local = self.local_for_site(name);
        let in_scope = self.local_in_scope(&local);
        local.as_lhs(in_scope).ok_or_else(|| {
            LowerError::internal(format!("{name} is not assignable in output"))
        })
    }

    fn set_property(&mut self, sp: &ir::SetProperty) -> LowerResult<Stmt> {
        let subject = self.expr(&sp.subject)?;
        let value = self.expr(&sp.value)?;
        Ok(if sp.backed {
            Stmt::Expr(Expr::assign(
                subject.field(self.names.static_field(&sp.property).ident()),
                value,
            ))
        } else {
            Stmt::Expr(subject.call(self.names.setter_name(&sp.property), vec![value]))
        })
    }

    fn if_stmt(&mut self, i: &ir::If) -> LowerResult<IfStmt> {
        let test = self.expr(&i.test)?;
        let consequent = self.stmt(&i.consequent)?.into_block();
        let alternate = match i.alternate.as_deref() {
            None => None,
            // Keep else-if chains flat.
            Some(ir::Statement::If(nested)) => Some(Box::new(Stmt::If(self.if_stmt(nested)?))),
            Some(other) => {
                let block = self.stmt(other)?.into_block();
                if block.statements.is_empty() {
                    None
                } else {
                    Some(Box::new(Stmt::Block(block)))
                }
            }
        };
        Ok(IfStmt {
            test,
            consequent,
            alternate,
        })
    }

    fn labeled(&mut self, l: &ir::Labeled) -> LowerResult<Stmt> {
        let label = self.names.label(&l.label).ident();
        let body = match self.stmt(&l.body)? {
            // A label directly on a declaration would change its scope.
            Stmt::LocalVar(_) | Stmt::LocalClass(_) => return Err(LowerError::LabelOnDeclaration),
            stmt @ (Stmt::While(_) | Stmt::Block(_) | Stmt::Switch(_)) => stmt,
            other => Stmt::Block(Block::new(vec![other])),
        };
        Ok(Stmt::Labeled(LabeledStmt {
            label,
            body: Box::new(body),
        }))
    }

    /// Failure recovery: anything thrown through the failure channel is the
    /// runtime's bubble exception.
    fn try_stmt(&mut self, t: &ir::Try) -> LowerResult<Stmt> {
        let body = self.block(Some(&t.tried))?;
        let name = self.names.ignored_ident();
        let recover = self.block(Some(&t.recover))?;
        Ok(Stmt::Try(TryStmt {
            body,
            catches: vec![CatchClause {
                types: vec![ClassType::raw(VELD_BUBBLE_EXCEPTION.clone())],
                name,
                body: recover,
            }],
            finally: None,
        }))
    }

    /// Java cases fall through by default, so every case body that does not
    /// provably exit gets a break appended. Bodies are wrapped in blocks so
    /// case-local declarations cannot collide across cases.
    fn switch_stmt(&mut self, sw: &ir::Switch) -> LowerResult<Stmt> {
        let selector = self.expr(&sw.selector)?;
        let mut cases = Vec::with_capacity(sw.cases.len() + 1);
        for case in &sw.cases {
            let body = self.case_body(&case.body)?;
            cases.push(SwitchCase {
                labels: Some(case.values.clone()),
                body,
            });
        }
        cases.push(SwitchCase {
            labels: None,
            body: self.case_body(&sw.default)?,
        });
        Ok(Stmt::Switch(SwitchStmt { selector, cases }))
    }

    fn case_body(&mut self, body: &ir::Block) -> LowerResult<Vec<Stmt>> {
        let mut block = self.block(Some(body))?;
        let needs_break = match block.statements.last() {
            Some(last) => !last.exits_abruptly(),
            None => true,
        };
        if needs_break {
            block.statements.push(Stmt::Break(None));
        }
        Ok(vec![Stmt::Block(block)])
    }
}
