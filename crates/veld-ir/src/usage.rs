//! The name-usage index.
//!
//! Backends need to know, for every binding, where it is declared and how it
//! is used: from which function body, whether the use assigns, whether an
//! assignment sits inside a loop, and whether a read feeds another local's
//! initializer. The index precomputes those facts in two passes over a
//! [`ModuleSet`] so backends never re-walk the tree to classify a binding.

use rustc_hash::FxHashMap;

use crate::module::{Category, ImportKind, Member, Module, ModuleSet, TopLevel};
use crate::name::{BindingId, BodyId, ModuleId, ResolvedName};
use crate::tree::{
    Block, Callee, Expression, Function, Parameters, Statement, Subject,
};

/// What kind of declaration introduced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    ModuleFunction,
    ModuleLevel,
    Test,
    Type,
    Method,
    LocalVar { has_init: bool, assign_once: bool },
    LocalFunction,
    Formal { assign_once: bool },
    RestFormal,
    Import(ImportKind),
}

/// Where a binding was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclSite {
    pub kind: DeclKind,
    pub module: ModuleId,
    pub category: Category,
    pub exported: bool,
    /// The function body containing the declaration statement; `None` for
    /// module-level declarations.
    pub containing_body: Option<BodyId>,
}

/// One use of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseSite {
    /// The innermost function body containing the use.
    pub body: BodyId,
    pub is_assign: bool,
    /// True when the use sits inside a loop that is itself inside the
    /// binding's declaring body. Makes one syntactic assignment count as
    /// many.
    pub in_loop: bool,
    /// The local whose initializer this read feeds, if any.
    pub receiving_local: Option<BindingId>,
}

/// Read-only oracle over declarations and uses.
#[derive(Debug, Default)]
pub struct UsageIndex {
    decls: FxHashMap<BindingId, DeclSite>,
    names: FxHashMap<BindingId, String>,
    uses: FxHashMap<BindingId, Vec<UseSite>>,
    imports: FxHashMap<BindingId, BindingId>,
}

impl UsageIndex {
    /// Build the index for a whole module set.
    pub fn scan(set: &ModuleSet) -> UsageIndex {
        let mut scanner = Scanner::default();
        for module in &set.modules {
            scanner.declarations(module);
        }
        for module in &set.modules {
            scanner.uses(module);
        }
        scanner.index
    }

    pub fn decl_of(&self, id: BindingId) -> Option<&DeclSite> {
        self.decls.get(&id)
    }

    /// Source text of a declared binding.
    pub fn name_text(&self, id: BindingId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Reconstruct the [`ResolvedName`] of a declared binding.
    pub fn resolved(&self, id: BindingId) -> Option<ResolvedName> {
        self.names.get(&id).map(|text| ResolvedName {
            id,
            text: text.clone(),
        })
    }

    pub fn uses_of(&self, id: BindingId) -> &[UseSite] {
        self.uses.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Follow import links to the originally declared binding.
    pub fn resolve_import(&self, id: BindingId) -> BindingId {
        let mut current = id;
        // Import chains are short; the bound only guards malformed input.
        for _ in 0..32 {
            match self.imports.get(&current) {
                Some(next) => current = *next,
                None => break,
            }
        }
        current
    }
}

enum Frame {
    Body(BodyId),
    Loop,
}

/// Two-pass tree walk that fills a [`UsageIndex`].
#[derive(Default)]
struct Scanner {
    index: UsageIndex,
    module: ModuleId,
    category: Category,
    frames: Vec<Frame>,
    /// Stack of locals whose initializers we are currently inside.
    receiving: Vec<BindingId>,
}

impl Scanner {
    fn declare(&mut self, name: &ResolvedName, kind: DeclKind, body: Option<BodyId>) {
        self.declare_vis(name, kind, body, false)
    }

    fn declare_vis(
        &mut self,
        name: &ResolvedName,
        kind: DeclKind,
        body: Option<BodyId>,
        exported: bool,
    ) {
        self.index.decls.insert(
            name.id,
            DeclSite {
                kind,
                module: self.module,
                category: self.category,
                exported,
                containing_body: body,
            },
        );
        self.index.names.insert(name.id, name.text.clone());
    }

    // Pass 1: declarations.

    fn declarations(&mut self, module: &Module) {
        self.module = module.id;
        for import in &module.imports {
            self.category = Category::Production;
            self.declare(&import.local, DeclKind::Import(import.kind), None);
            self.index.imports.insert(import.local.id, import.target.id);
            // The target's own module registers its declaration; keep the
            // text around even if that module is outside this set.
            self.index
                .names
                .entry(import.target.id)
                .or_insert_with(|| import.target.text.clone());
        }
        for tl in &module.top_levels {
            match tl {
                TopLevel::Function(f) => {
                    self.category = f.category;
                    self.declare_vis(&f.name, DeclKind::ModuleFunction, None, f.exported);
                    self.declare_function(&f.func);
                }
                TopLevel::ModuleLevel(d) => {
                    self.category = d.category;
                    self.declare_vis(&d.name, DeclKind::ModuleLevel, None, d.exported);
                }
                TopLevel::Init(block) => {
                    self.category = Category::Production;
                    self.declare_block(block, module.body_id);
                }
                TopLevel::Type(t) => {
                    self.category = t.category;
                    self.declare(&t.name, DeclKind::Type, None);
                    for member in &t.members {
                        match member {
                            Member::Constructor(c) => {
                                self.declare(&c.name, DeclKind::Method, None);
                                self.declare_function(&c.func);
                            }
                            Member::Method(m) => {
                                self.declare(&m.name, DeclKind::Method, None);
                                self.declare_function(&m.func);
                            }
                            Member::Getter(a) | Member::Setter(a) => {
                                self.declare_function(&a.func);
                            }
                            Member::Property(_)
                            | Member::StaticProperty(_)
                            | Member::Garbage(_) => {}
                        }
                    }
                }
                TopLevel::Test(t) => {
                    self.category = Category::Test;
                    self.declare(&t.name, DeclKind::Test, None);
                    self.declare_function(&t.func);
                }
                TopLevel::Garbage(_) => {}
            }
        }
    }

    fn declare_function(&mut self, func: &Function) {
        let body = func.body_id;
        self.declare_parameters(&func.params, body);
        if let Some(block) = &func.body {
            self.declare_block(block, body);
        }
    }

    fn declare_parameters(&mut self, params: &Parameters, body: BodyId) {
        for p in &params.params {
            self.declare(
                &p.name,
                DeclKind::Formal {
                    assign_once: p.assign_once,
                },
                Some(body),
            );
        }
        if let Some(rest) = &params.rest {
            self.declare(&rest.name, DeclKind::RestFormal, Some(body));
        }
    }

    fn declare_block(&mut self, block: &Block, body: BodyId) {
        for stmt in &block.statements {
            self.declare_stmt(stmt, body);
        }
    }

    fn declare_stmt(&mut self, stmt: &Statement, body: BodyId) {
        match stmt {
            Statement::Block(b) => self.declare_block(b, body),
            Statement::LocalDecl(d) => {
                self.declare(
                    &d.name,
                    DeclKind::LocalVar {
                        has_init: d.init.is_some(),
                        assign_once: d.assign_once,
                    },
                    Some(body),
                );
            }
            Statement::LocalFunction(d) => {
                self.declare(&d.name, DeclKind::LocalFunction, Some(body));
                self.declare_function(&d.func);
            }
            Statement::If(i) => {
                self.declare_stmt(&i.consequent, body);
                if let Some(alt) = &i.alternate {
                    self.declare_stmt(alt, body);
                }
            }
            Statement::While(w) => self.declare_stmt(&w.body, body),
            Statement::Labeled(l) => self.declare_stmt(&l.body, body),
            Statement::Try(t) => {
                self.declare_block(&t.tried, body);
                self.declare_block(&t.recover, body);
            }
            Statement::Switch(sw) => {
                for case in &sw.cases {
                    self.declare_block(&case.body, body);
                }
                self.declare_block(&sw.default, body);
            }
            Statement::Expr(_)
            | Statement::Assign(_)
            | Statement::SetProperty(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Return(_)
            | Statement::Throw
            | Statement::Garbage(_) => {}
        }
    }

    // Pass 2: uses.

    fn current_body(&self) -> BodyId {
        for frame in self.frames.iter().rev() {
            if let Frame::Body(body) = frame {
                return *body;
            }
        }
        // The walk always opens the module body frame first.
        unreachable!("use outside any body frame")
    }

    /// True when a loop frame sits between the top of the stack and the
    /// declaring body of `id`.
    fn in_loop_relative_to(&self, id: BindingId) -> bool {
        let decl_body = match self.index.decls.get(&id).and_then(|d| d.containing_body) {
            Some(body) => body,
            None => return false,
        };
        let mut saw_loop = false;
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Loop => saw_loop = true,
                Frame::Body(body) if *body == decl_body => return saw_loop,
                Frame::Body(_) => {}
            }
        }
        false
    }

    fn record_use(&mut self, name: &ResolvedName, is_assign: bool) {
        let site = UseSite {
            body: self.current_body(),
            is_assign,
            in_loop: is_assign && self.in_loop_relative_to(name.id),
            receiving_local: self.receiving.last().copied(),
        };
        self.index.uses.entry(name.id).or_default().push(site);
    }

    fn uses(&mut self, module: &Module) {
        self.module = module.id;
        self.frames.push(Frame::Body(module.body_id));
        for tl in &module.top_levels {
            match tl {
                TopLevel::Function(f) => self.use_function(&f.func),
                TopLevel::ModuleLevel(d) => {
                    if let Some(init) = &d.init {
                        self.use_expr(init);
                    }
                }
                TopLevel::Init(block) => self.use_block(block),
                TopLevel::Type(t) => {
                    for member in &t.members {
                        match member {
                            Member::Constructor(c) => self.use_function(&c.func),
                            Member::Method(m) => self.use_function(&m.func),
                            Member::Getter(a) | Member::Setter(a) => self.use_function(&a.func),
                            Member::StaticProperty(p) => self.use_expr(&p.init),
                            Member::Property(_) | Member::Garbage(_) => {}
                        }
                    }
                }
                TopLevel::Test(t) => self.use_function(&t.func),
                TopLevel::Garbage(_) => {}
            }
        }
        if let Some(result) = &module.result {
            self.use_expr(&result.expr);
        }
        self.frames.pop();
    }

    fn use_function(&mut self, func: &Function) {
        self.frames.push(Frame::Body(func.body_id));
        if let Some(block) = &func.body {
            self.use_block(block);
        }
        self.frames.pop();
    }

    fn use_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.use_stmt(stmt);
        }
    }

    fn use_stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Block(b) => self.use_block(b),
            Statement::Expr(e) => self.use_expr(e),
            Statement::LocalDecl(d) => {
                if let Some(init) = &d.init {
                    self.receiving.push(d.name.id);
                    self.use_expr(init);
                    self.receiving.pop();
                }
            }
            Statement::LocalFunction(d) => self.use_function(&d.func),
            Statement::Assign(a) => {
                self.record_use(&a.target, true);
                self.use_expr(&a.value);
            }
            Statement::SetProperty(sp) => {
                self.use_expr(&sp.subject);
                self.use_expr(&sp.value);
            }
            Statement::If(i) => {
                self.use_expr(&i.test);
                self.use_stmt(&i.consequent);
                if let Some(alt) = &i.alternate {
                    self.use_stmt(alt);
                }
            }
            Statement::While(w) => {
                self.frames.push(Frame::Loop);
                self.use_expr(&w.test);
                self.use_stmt(&w.body);
                self.frames.pop();
            }
            Statement::Labeled(l) => self.use_stmt(&l.body),
            Statement::Break(_) | Statement::Continue(_) | Statement::Throw => {}
            Statement::Return(e) => {
                if let Some(e) = e {
                    self.use_expr(e);
                }
            }
            Statement::Try(t) => {
                self.use_block(&t.tried);
                self.use_block(&t.recover);
            }
            Statement::Switch(sw) => {
                self.use_expr(&sw.selector);
                for case in &sw.cases {
                    self.use_block(&case.body);
                }
                self.use_block(&sw.default);
            }
            Statement::Garbage(_) => {}
        }
    }

    fn use_expr(&mut self, expr: &Expression) {
        match expr {
            Expression::Value(_) | Expression::This | Expression::Garbage(_) => {}
            Expression::Reference(r) => self.record_use(&r.name, false),
            Expression::Call(call) => {
                match &call.callee {
                    Callee::Function(fr) => self.record_use(&fr.name, false),
                    Callee::Method(m) => {
                        if let Subject::Expr(e) = &m.subject {
                            self.use_expr(e);
                        }
                    }
                    Callee::Constructor(_) | Callee::Garbage(_) => {}
                    Callee::Value(v) => self.use_expr(&v.callee),
                }
                for arg in &call.args {
                    self.use_expr(arg);
                }
            }
            Expression::Infix(i) => {
                self.use_expr(&i.left);
                self.use_expr(&i.right);
            }
            Expression::Prefix(p) => self.use_expr(&p.operand),
            Expression::GetProperty(gp) => {
                if let Subject::Expr(e) = &gp.subject {
                    self.use_expr(e);
                }
            }
            Expression::Cast(c) => self.use_expr(&c.expr),
            Expression::InstanceOf(io) => self.use_expr(&io.expr),
            Expression::NotNull(e) => self.use_expr(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::ResolvedName;
    use crate::tree::{Assign, Block, Expression, LocalDecl, Reference, Statement, While};
    use crate::types::Type;

    fn local(name: &ResolvedName, init: Option<Expression>) -> Statement {
        Statement::LocalDecl(LocalDecl {
            name: name.clone(),
            ty: Type::Int,
            init,
            assign_once: false,
        })
    }

    fn read(name: &ResolvedName) -> Expression {
        Expression::Reference(Reference {
            name: name.clone(),
            ty: Type::Int,
        })
    }

    fn test_module(top_levels: Vec<TopLevel>) -> ModuleSet {
        ModuleSet::single(Module {
            id: ModuleId(0),
            name: "test".into(),
            is_std_lib: false,
            body_id: BodyId(0),
            imports: vec![],
            top_levels,
            result: None,
        })
    }

    #[test]
    fn assignment_in_loop_is_flagged() {
        let x = ResolvedName::new(1, "x");
        let set = test_module(vec![TopLevel::Init(Block::new(vec![
            local(&x, Some(Expression::Value(crate::tree::Value::Int(0)))),
            Statement::While(While {
                test: Expression::Value(crate::tree::Value::Bool(true)),
                body: Box::new(Statement::Assign(Assign {
                    target: x.clone(),
                    value: Expression::Value(crate::tree::Value::Int(1)),
                })),
            }),
        ]))]);
        let index = UsageIndex::scan(&set);
        let uses = index.uses_of(x.id);
        assert_eq!(uses.len(), 1);
        assert!(uses[0].is_assign);
        assert!(uses[0].in_loop);
    }

    #[test]
    fn read_in_initializer_records_receiver() {
        let x = ResolvedName::new(1, "x");
        let y = ResolvedName::new(2, "y");
        let set = test_module(vec![TopLevel::Init(Block::new(vec![
            local(&x, None),
            local(&y, Some(read(&x))),
        ]))]);
        let index = UsageIndex::scan(&set);
        let uses = index.uses_of(x.id);
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].receiving_local, Some(y.id));
    }

    #[test]
    fn import_chain_resolves_to_origin() {
        let mut index = UsageIndex::default();
        index.imports.insert(BindingId(3), BindingId(2));
        index.imports.insert(BindingId(2), BindingId(1));
        assert_eq!(index.resolve_import(BindingId(3)), BindingId(1));
        assert_eq!(index.resolve_import(BindingId(7)), BindingId(7));
    }
}
