//! Statement-list lowering with scope synthesis.
//!
//! Java lambdas only capture effectively final locals, and a lambda value
//! cannot reference itself before it is constructed. Both restrictions are
//! solved the same way: lift the offending binding into a synthesized local
//! class (a "scope") and address it through a final instance of that class.
//! A scope's lifetime is one contiguous run of statements that need it; any
//! statement that lifts nothing closes the window.

use rustc_hash::{FxHashMap, FxHashSet};
use veld_ir as ir;
use veld_ir::BindingId;

use crate::ast::{
    Block, ClassMember, ClassType, Expr, FieldDecl, Lambda, LambdaBody, LocalClassDecl, LocalVar,
    MethodDecl, NameExpr, NewExpr, Stmt,
};
use crate::error::LowerResult;
use crate::local::NameLift;
use crate::names::{OutName, CAPTURE_SUFFIX};
use crate::types::JavaType;

use super::{result_type, ModuleScope};

/// A scope being assembled: its names, the members lifted into it so far,
/// and the recursive functions already called before it opened (a forward
/// declaration placed here would never be assigned in time for those).
struct ScopeStmts {
    scope_name: OutName,
    class_name: OutName,
    calls_before: FxHashSet<BindingId>,
    members: Vec<ClassMember>,
}

/// Output under construction: lowered statements interleaved with scope
/// placeholders, materialized once the whole list is processed and every
/// scope's member list is final.
enum Entry {
    Stmt(Stmt),
    Scope(usize),
}

/// Block-local synthesis state.
struct BlockState {
    scopes: Vec<ScopeStmts>,
    /// Scope ids in declaration-list order; forward-declaration scopes are
    /// inserted at the front.
    order: Vec<usize>,
    entries: Vec<Entry>,
    /// Whether the previous statement left a scope open.
    in_scope: bool,
}

impl BlockState {
    fn new() -> Self {
        Self {
            scopes: Vec::new(),
            order: Vec::new(),
            entries: Vec::new(),
            in_scope: false,
        }
    }

    fn new_scope(
        &mut self,
        names: (OutName, OutName),
        calls_before: FxHashSet<BindingId>,
        insert_at_front: bool,
    ) -> usize {
        let id = self.scopes.len();
        self.scopes.push(ScopeStmts {
            scope_name: names.0,
            class_name: names.1,
            calls_before,
            members: Vec::new(),
        });
        if insert_at_front {
            self.order.insert(0, id);
            self.entries.insert(0, Entry::Scope(id));
        } else {
            self.order.push(id);
            self.entries.push(Entry::Scope(id));
        }
        id
    }

    /// The open scope, if the previous statement left one open.
    fn open_scope(&self) -> Option<usize> {
        if self.in_scope {
            Some(*self.order.last().expect("in_scope implies a scope exists"))
        } else {
            None
        }
    }

    /// Replace placeholders with each scope's class declaration and its
    /// single final instantiation.
    fn materialize(self) -> Vec<Stmt> {
        let mut scopes = self.scopes;
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            match entry {
                Entry::Stmt(stmt) => out.push(stmt),
                Entry::Scope(id) => {
                    let scope = &mut scopes[id];
                    let class_type = ClassType::raw(crate::grammar::QualifiedName::known_safe([
                        scope.class_name.text.clone(),
                    ]));
                    out.push(Stmt::LocalClass(LocalClassDecl {
                        name: scope.class_name.ident(),
                        members: std::mem::take(&mut scope.members),
                    }));
                    out.push(Stmt::LocalVar(LocalVar {
                        ty: crate::ast::JType::Class(class_type.clone()),
                        name: scope.scope_name.ident(),
                        is_final: true,
                        init: Some(Expr::New(NewExpr {
                            ty: class_type,
                            diamond: false,
                            args: vec![],
                        })),
                    }));
                }
            }
        }
        out
    }
}

impl<'n, 'ir> ModuleScope<'n, 'ir> {
    /// Lower a function body, lifting captured-mutable parameters first.
    pub(crate) fn function_block(&mut self, func: &ir::Function) -> LowerResult<Block> {
        self.block_with_params(func.body.as_ref(), Some(&func.params))
    }

    /// Lower a plain statement block.
    pub(crate) fn block(&mut self, block: Option<&ir::Block>) -> LowerResult<Block> {
        self.block_with_params(block, None)
    }

    fn block_with_params(
        &mut self,
        block: Option<&ir::Block>,
        params: Option<&ir::Parameters>,
    ) -> LowerResult<Block> {
        let Some(block) = block else {
            return Ok(Block::default());
        };
        let mut state = BlockState::new();
        let mut called_funcs: FxHashSet<BindingId> = FxHashSet::default();

        // The recursive local functions declared in this list, removed as
        // each declaration is reached.
        let mut recursive_funcs: FxHashSet<BindingId> = FxHashSet::default();
        for stmt in &block.statements {
            if let ir::Statement::LocalFunction(decl) = stmt {
                if self
                    .names
                    .lookup_local(&decl.name)
                    .is_some_and(|n| n.is_recursive_fn())
                {
                    recursive_funcs.insert(decl.name.id);
                }
            }
        }

        if let Some(params) = params {
            self.lift_parameters(params, &mut state, &called_funcs)?;
        }

        for stmt in &block.statements {
            match stmt {
                ir::Statement::LocalFunction(decl) => {
                    if recursive_funcs.remove(&decl.name.id) {
                        if called_funcs.contains(&decl.name.id) {
                            // Already called above: the function value must
                            // exist before this point, so forward declare it
                            // as a field of a scope that predates the call.
                            let scope_id = match state
                                .order
                                .iter()
                                .rev()
                                .copied()
                                .find(|id| !state.scopes[*id].calls_before.contains(&decl.name.id))
                            {
                                Some(id) => id,
                                None => {
                                    let fresh = self.names.new_scope_decl();
                                    state.new_scope(fresh, called_funcs.clone(), true)
                                }
                            };
                            let scope_name = state.scopes[scope_id].scope_name.clone();
                            self.names.lift_local(
                                &decl.name,
                                &scope_name,
                                NameLift::FwdDeclFunction,
                            )?;
                            let assign = self.local_fn_field_assign(decl, &scope_name)?;
                            state.entries.push(Entry::Stmt(assign));
                            let field = self.local_fn_field_decl(decl)?;
                            state.scopes[scope_id].members.push(field);
                        } else {
                            let scope_id = match state.open_scope() {
                                Some(id) => id,
                                None => {
                                    let fresh = self.names.new_scope_decl();
                                    state.in_scope = true;
                                    state.new_scope(fresh, called_funcs.clone(), false)
                                }
                            };
                            let scope_name = state.scopes[scope_id].scope_name.clone();
                            self.names.lift_local(
                                &decl.name,
                                &scope_name,
                                NameLift::RecursiveFunction,
                            )?;
                            let method = self.local_fn_method_decl(decl, &scope_name)?;
                            state.scopes[scope_id].members.push(method);
                        }
                    } else {
                        state.in_scope = false;
                        let lowered = self.local_fn_var_decl(decl)?;
                        state.entries.push(Entry::Stmt(lowered));
                    }
                }
                ir::Statement::LocalDecl(decl) => {
                    let captured = self
                        .names
                        .lookup_local(&decl.name)
                        .is_some_and(|n| n.is_mutably_captured());
                    if captured {
                        let scope_id = match state.open_scope() {
                            Some(id) => id,
                            None => {
                                let fresh = self.names.new_scope_decl();
                                state.in_scope = true;
                                state.new_scope(fresh, called_funcs.clone(), false)
                            }
                        };
                        let scope_name = state.scopes[scope_id].scope_name.clone();
                        let lifted = self.names.lift_local(
                            &decl.name,
                            &scope_name,
                            NameLift::CapturedMutableVar,
                        )?;
                        let init = match &decl.init {
                            Some(init) => Some(self.expr(init)?),
                            None => None,
                        };
                        state.scopes[scope_id].members.push(ClassMember::Field(FieldDecl {
                            access: crate::ast::Access::PackagePrivate,
                            is_static: false,
                            is_final: false,
                            ty: JavaType::from_ir(&decl.ty, self.names)?.to_ast(),
                            name: lifted.out_name().ident(),
                            init,
                        }));
                    } else {
                        state.in_scope = false;
                        let lowered = self.stmt(stmt)?;
                        state.entries.push(Entry::Stmt(lowered));
                    }
                }
                other => {
                    state.in_scope = false;
                    let lowered = self.stmt(other)?;
                    state.entries.push(Entry::Stmt(lowered));
                }
            }
            // See whether this statement calls a recursive function that is
            // still waiting for its declaration.
            if !recursive_funcs.is_empty() {
                stmt.for_each_reference(&mut |name| {
                    if recursive_funcs.contains(&name.id) {
                        called_funcs.insert(name.id);
                    }
                });
            }
        }

        Ok(Block::new(state.materialize()))
    }

    /// Captured mutable parameters cannot be re-seated, so copy each into a
    /// same-named temporary at entry and lift the original name, preserving
    /// read order.
    fn lift_parameters(
        &mut self,
        params: &ir::Parameters,
        state: &mut BlockState,
        called_funcs: &FxHashSet<BindingId>,
    ) -> LowerResult<()> {
        let this_id = params.this_name.as_ref().map(|n| n.id);
        let mut capture_names: FxHashMap<BindingId, OutName> = FxHashMap::default();

        for param in &params.params {
            if Some(param.name.id) == this_id {
                continue;
            }
            let needs_lift = !param.assign_once
                && self
                    .names
                    .lookup_local(&param.name)
                    .is_some_and(|n| n.is_mutably_captured());
            if !needs_lift {
                continue;
            }
            let old_name = self.names.lookup_regular_local(&param.name);
            let new_name = old_name.with_suffix(CAPTURE_SUFFIX);
            capture_names.insert(param.name.id, new_name.clone());
            state.entries.push(Entry::Stmt(Stmt::LocalVar(LocalVar {
                ty: JavaType::from_ir(&param.ty, self.names)?.to_ast(),
                name: new_name.ident(),
                is_final: false,
                init: Some(old_name.ident().name_expr()),
            })));
        }

        for param in &params.params {
            let Some(capture) = capture_names.get(&param.name.id).cloned() else {
                continue;
            };
            let scope_id = match state.open_scope() {
                Some(id) => id,
                None => {
                    let fresh = self.names.new_scope_decl();
                    state.in_scope = true;
                    state.new_scope(fresh, called_funcs.clone(), false)
                }
            };
            let scope_name = state.scopes[scope_id].scope_name.clone();
            let lifted =
                self.names
                    .lift_local(&param.name, &scope_name, NameLift::CapturedMutableVar)?;
            state.scopes[scope_id].members.push(ClassMember::Field(FieldDecl {
                access: crate::ast::Access::PackagePrivate,
                is_static: false,
                is_final: false,
                ty: JavaType::from_ir(&param.ty, self.names)?.to_ast(),
                name: lifted.out_name().ident(),
                init: Some(capture.ident().name_expr()),
            }));
        }
        Ok(())
    }

    /// An unlifted local function: a final-free local holding a lambda.
    pub(crate) fn local_fn_var_decl(&mut self, decl: &ir::LocalFunctionDecl) -> LowerResult<Stmt> {
        let ty = JavaType::from_sig(&decl.sig, self.names)?.to_ast();
        let name = self
            .names
            .lookup_local_or_external(&decl.name)
            .out_name()
            .ident();
        let lambda = self.local_fn_lambda(decl)?;
        Ok(Stmt::LocalVar(LocalVar {
            ty,
            name,
            is_final: false,
            init: Some(lambda),
        }))
    }

    /// The lambda expression form of a local function.
    fn local_fn_lambda(&mut self, decl: &ir::LocalFunctionDecl) -> LowerResult<Expr> {
        let params_preamble = self.parameters(&decl.func.params)?;
        let simple_params: Vec<_> = params_preamble.params.iter().map(|p| p.name.clone()).collect();

        // A single-return body with no preamble can be an expression lambda.
        let expr_body = if params_preamble.preamble.is_empty() && !self.any_param_lifts(&decl.func)
        {
            match decl.func.body.as_ref().map(|b| b.statements.as_slice()) {
                Some([ir::Statement::Return(Some(result))]) => Some(self.expr(result)?),
                _ => None,
            }
        } else {
            None
        };
        let body = match expr_body {
            Some(expr) => LambdaBody::Expr(Box::new(expr)),
            None => LambdaBody::Block(
                self.function_block(&decl.func)?
                    .preface(params_preamble.preamble),
            ),
        };
        Ok(Expr::Lambda(Lambda {
            params: simple_params,
            body,
        }))
    }

    fn any_param_lifts(&mut self, func: &ir::Function) -> bool {
        func.params.params.iter().any(|p| {
            !p.assign_once
                && self
                    .names
                    .lookup_local(&p.name)
                    .is_some_and(|n| n.is_mutably_captured())
        })
    }

    /// A recursive local function lifted to a method of its scope class.
    fn local_fn_method_decl(
        &mut self,
        decl: &ir::LocalFunctionDecl,
        scope_name: &OutName,
    ) -> LowerResult<ClassMember> {
        let params_preamble = self.parameters(&decl.func.params)?;
        let type_params = self.type_formals(&decl.func.type_params)?;
        let result = result_type(self.names, &decl.func.return_type)?;
        let name = self
            .names
            .lookup_local_or_external(&decl.name)
            .out_name()
            .ident();
        // Inside the method, siblings of this scope are addressed via the
        // implicit receiver.
        self.scope_stack.push(scope_name.clone());
        let body = self.function_block(&decl.func);
        self.scope_stack.pop();
        Ok(ClassMember::Method(MethodDecl {
            annotations: vec![],
            access: crate::ast::Access::PackagePrivate,
            is_static: false,
            is_abstract: false,
            type_params,
            result,
            name,
            params: params_preamble.params,
            throws: vec![],
            body: Some(body?.preface(params_preamble.preamble)),
        }))
    }

    /// The uninitialized field form of a forward-declared function.
    fn local_fn_field_decl(&mut self, decl: &ir::LocalFunctionDecl) -> LowerResult<ClassMember> {
        let ty = JavaType::from_sig(&decl.sig, self.names)?.to_ast();
        let name = self
            .names
            .lookup_local_or_external(&decl.name)
            .out_name()
            .ident();
        Ok(ClassMember::Field(FieldDecl {
            access: crate::ast::Access::PackagePrivate,
            is_static: false,
            is_final: false,
            ty,
            name,
            init: None,
        }))
    }

    /// The statement assigning a forward-declared function its value at the
    /// original declaration point.
    fn local_fn_field_assign(
        &mut self,
        decl: &ir::LocalFunctionDecl,
        scope_name: &OutName,
    ) -> LowerResult<Stmt> {
        let name = self
            .names
            .lookup_local_or_external(&decl.name)
            .out_name()
            .ident();
        let target = Expr::Name(NameExpr {
            parts: vec![scope_name.ident(), name],
        });
        let lambda = self.local_fn_lambda(decl)?;
        Ok(Stmt::Expr(Expr::assign(target, lambda)))
    }
}
