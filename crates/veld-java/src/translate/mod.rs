//! Statement/expression lowering driver.
//!
//! [`JavaTranslator`] lowers one resolved module at a time into Java
//! programs: a static "globals" class for module-level state, one class or
//! interface per type declaration, an entry-point class, a JUnit test class,
//! and any synthesized functional interfaces. The other naming and
//! classification services hang off the [`JavaNames`] registry it borrows.

mod block;
mod expr;
mod sam;
mod stmt;

use veld_ir as ir;

use crate::adjust::{find_boxed_adjustments, unbox_to_primitive, with_adjustments};
use crate::ast::{
    Access, Annotation, Block, ClassDecl, ClassMember, ClassType, ConstructorDecl, EntryPoint,
    Expr, FieldDecl, Ident, Initializer, InstanceCall, InterfaceDecl, InterfaceMember,
    InterfaceMethod, InterfaceMethodKind, JType, Literal, MethodDecl, NewExpr, Param, PrimitiveKind,
    Program, ProgramMeta, ResultType, SourceDir, Stmt, TypeDeclaration, TypeParam,
};
use crate::error::{LowerError, LowerResult};
use crate::grammar::{QualifiedName, MODULE_EXPORT_NAME};
use crate::names::{JavaNames, OutName};
use crate::standard::{
    garbage_comment, JAVA_LANG_CLASS_FOR_NAME, JAVA_LANG_CLASS_NOT_FOUND_EXCEPTION,
    JAVA_LANG_ILLEGAL_STATE_EXCEPTION, JAVA_LANG_STRING, JAVA_LANG_STRING_BUILDER,
    JAVA_UTIL_ARRAYS_AS_LIST, JAVA_UTIL_LIST, JUNIT_TEST,
};
use crate::types::JavaType;

/// Lowers modules of one compiled unit against a shared name registry.
pub struct JavaTranslator<'n, 'ir> {
    names: &'n mut JavaNames<'ir>,
}

impl<'n, 'ir> JavaTranslator<'n, 'ir> {
    pub fn new(names: &'n mut JavaNames<'ir>) -> Self {
        Self { names }
    }

    /// Translate a single module into output programs.
    pub fn translate(&mut self, module: &ir::Module) -> LowerResult<Vec<Program>> {
        self.names.enter_module(module.id);
        let mut scope = ModuleScope {
            names: self.names,
            programs: Vec::new(),
            module_fields: Vec::new(),
            module_funcs: Vec::new(),
            module_init: Vec::new(),
            test_decls: Vec::new(),
            processing_test: false,
            scope_stack: Vec::new(),
        };
        scope.module(module)?;
        Ok(scope.programs)
    }
}

/// Parameters plus any preamble statements introducing a method body.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParamsPreamble {
    pub params: Vec<Param>,
    pub preamble: Vec<Stmt>,
}

/// An overload needs its parameters and either the original or a
/// call-forwarding body.
struct Overload {
    params: ParamsPreamble,
    body: Block,
}

pub(crate) struct ModuleScope<'n, 'ir> {
    pub(crate) names: &'n mut JavaNames<'ir>,
    programs: Vec<Program>,
    module_fields: Vec<ClassMember>,
    module_funcs: Vec<ClassMember>,
    module_init: Vec<Stmt>,
    test_decls: Vec<ClassMember>,
    processing_test: bool,
    /// Scope-instance names whose class methods we are lexically inside;
    /// references to members of those scopes go through `this`.
    pub(crate) scope_stack: Vec<OutName>,
}

impl<'n, 'ir> ModuleScope<'n, 'ir> {
    fn module(&mut self, module: &ir::Module) -> LowerResult<()> {
        for tl in &module.top_levels {
            match tl {
                ir::TopLevel::Function(f) => {
                    self.processing_test = f.category == ir::Category::Test;
                    self.module_function(f)?;
                }
                ir::TopLevel::ModuleLevel(d) => {
                    self.processing_test = d.category == ir::Category::Test;
                    self.module_level_declare(d)?;
                }
                ir::TopLevel::Init(init) => {
                    for s in &init.statements {
                        let lowered = self.stmt(s)?;
                        self.module_init.push(lowered);
                    }
                }
                ir::TopLevel::Type(t) => {
                    self.processing_test = t.category == ir::Category::Test;
                    match t.kind {
                        ir::TypeDeclKind::Class => self.class_declare(t)?,
                        ir::TypeDeclKind::Interface => self.interface_declare(t)?,
                        ir::TypeDeclKind::Enum => {
                            // Not lowered yet; leave a visible marker instead
                            // of aborting the module.
                            self.module_init.push(garbage_comment(
                                &format!("enum {}", t.name.text),
                                Some("enum declarations are not lowered"),
                            ));
                        }
                    }
                }
                ir::TopLevel::Test(t) => {
                    self.processing_test = true;
                    self.module_test(t)?;
                }
                ir::TopLevel::Garbage(g) => {
                    let comment = garbage_comment(&g.source, g.diagnostic.as_deref());
                    self.module_init.push(comment);
                }
            }
            self.processing_test = false;
        }

        let mut has_result = false;
        let result_field_type = match &module.result {
            Some(result) if !result.ty.is_void_like() && !result.ty.mentions_invalid() => {
                has_result = true;
                JavaType::from_ir(&result.ty, self.names)?
            }
            _ => JavaType::Void,
        };
        let export = Ident::new(OutName::fixed(MODULE_EXPORT_NAME));
        if has_result {
            self.module_fields.push(ClassMember::Field(FieldDecl {
                access: Access::Public,
                is_static: true,
                is_final: false,
                ty: result_field_type.to_ast(),
                name: export.clone(),
                init: None,
            }));
            let result = module.result.as_ref().expect("has_result checked");
            let value = self.expr(&result.expr)?;
            self.module_init
                .push(Stmt::Expr(Expr::assign(export.name_expr(), value)));
        }

        if !module.is_std_lib {
            self.entry_point(has_result)?;
        }

        let globals_class = self.names.current_module().globals_class.clone();
        let mut members = Vec::new();
        members.append(&mut self.module_fields);
        members.append(&mut self.module_funcs);
        let init = std::mem::take(&mut self.module_init);
        if !init.is_empty() {
            members.push(ClassMember::Initializer(Initializer {
                is_static: true,
                body: Block::new(init),
            }));
        }
        self.globalish_program(&globals_class, false, members);

        self.sam_utility()?;

        if !self.test_decls.is_empty() {
            let test_class = self.names.current_module().test_class.clone();
            let members = std::mem::take(&mut self.test_decls);
            self.globalish_program(&test_class, true, members);
        }
        Ok(())
    }

    fn program_meta(&self, is_entry: bool, is_test_class: bool) -> ProgramMeta {
        ProgramMeta {
            entry_point: if is_entry {
                EntryPoint::MainMethod
            } else {
                EntryPoint::None
            },
            source_dir: if is_test_class {
                SourceDir::TestJava
            } else {
                SourceDir::MainJava
            },
            test_class: is_test_class,
        }
    }

    /// Build a final class holding static members, with a private
    /// constructor so it is never instantiated.
    fn globalish_program(&mut self, name: &str, is_test_class: bool, members: Vec<ClassMember>) {
        let ident = Ident::new(OutName::fixed(name));
        let mut body = vec![ClassMember::Constructor(ConstructorDecl {
            access: Access::Private,
            name: ident.clone(),
            params: vec![],
            body: Block::default(),
        })];
        body.extend(members);
        self.programs.push(Program {
            package: self.names.current_module().package.clone(),
            meta: self.program_meta(false, is_test_class),
            decl: TypeDeclaration::Class(ClassDecl {
                access: Access::Public,
                is_final: true,
                is_static: false,
                name: ident,
                type_params: vec![],
                extends: None,
                implements: vec![],
                members: body,
            }),
        });
    }

    /// The `XMain` class whose `main` touches the globals class, forcing
    /// module initialization.
    fn entry_point(&mut self, has_result: bool) -> LowerResult<()> {
        let info = self.names.current_module();
        let entry_class = info.entry_class.clone();
        let globals = info.qualified_class_name(ir::Category::Production);
        let (access_result, throws) = if has_result {
            (
                crate::standard::as_statement_expr(
                    globals.qualify(MODULE_EXPORT_NAME).name_expr(),
                ),
                vec![],
            )
        } else {
            (
                JAVA_LANG_CLASS_FOR_NAME.static_call(vec![Expr::Literal(Literal::Str(
                    globals.fully_qualified(),
                ))]),
                vec![ClassType::raw(JAVA_LANG_CLASS_NOT_FOUND_EXCEPTION.clone())],
            )
        };
        let ident = Ident::new(OutName::fixed(entry_class));
        self.programs.push(Program {
            package: self.names.current_module().package.clone(),
            meta: self.program_meta(true, false),
            decl: TypeDeclaration::Class(ClassDecl {
                access: Access::Public,
                is_final: true,
                is_static: false,
                name: ident.clone(),
                type_params: vec![],
                extends: None,
                implements: vec![],
                members: vec![
                    ClassMember::Constructor(ConstructorDecl {
                        access: Access::Private,
                        name: ident,
                        params: vec![],
                        body: Block::default(),
                    }),
                    ClassMember::Method(MethodDecl {
                        annotations: vec![],
                        access: Access::Public,
                        is_static: true,
                        is_abstract: false,
                        type_params: vec![],
                        result: ResultType::Void,
                        name: Ident::new(OutName::fixed("main")),
                        params: vec![Param {
                            ty: JType::Array(Box::new(JType::Class(ClassType::raw(
                                JAVA_LANG_STRING.clone(),
                            )))),
                            name: Ident::new(OutName::fixed("args")),
                            variadic: false,
                        }],
                        throws,
                        body: Some(Block::new(vec![Stmt::Expr(access_result)])),
                    }),
                ],
            }),
        });
        Ok(())
    }

    fn active_decls<'a>(
        processing_test: bool,
        test_decls: &'a mut Vec<ClassMember>,
        other: &'a mut Vec<ClassMember>,
    ) -> &'a mut Vec<ClassMember> {
        if processing_test {
            test_decls
        } else {
            other
        }
    }

    fn module_function(&mut self, decl: &ir::FunctionDecl) -> LowerResult<()> {
        let body = self.function_block(&decl.func)?;
        let (_, out) = self.names.module_member(&decl.name);
        let name = out.ident();
        let result = result_type(self.names, &decl.func.return_type)?;
        let access = access_for(decl.exported);
        let type_params = self.type_formals(&decl.func.type_params)?;
        let overloads = {
            let forward_name = name.clone();
            let returns = !result.is_void();
            self.overloads(None, &decl.func.params, body, |args| {
                forward_static(forward_name.clone(), args, returns)
            })?
        };
        for over in overloads {
            let member = ClassMember::Method(MethodDecl {
                annotations: vec![],
                access,
                is_static: true,
                is_abstract: false,
                type_params: type_params.clone(),
                result: result.clone(),
                name: name.clone(),
                params: over.params.params,
                throws: vec![],
                body: Some(over.body.preface(over.params.preamble)),
            });
            Self::active_decls(
                self.processing_test,
                &mut self.test_decls,
                &mut self.module_funcs,
            )
            .push(member);
        }
        Ok(())
    }

    fn module_test(&mut self, decl: &ir::TestDecl) -> LowerResult<()> {
        let (_, out) = self.names.module_member(&decl.name);
        let name = out.ident();

        // A leading nominal-typed parameter is the test context object:
        // instantiate it and convert recorded soft failures at the end.
        let context = decl.func.params.params.first().and_then(|p| {
            match p.ty.without_null() {
                ir::Type::Nominal(nominal) => Some((p, nominal)),
                _ => None,
            }
        });
        let body = match context {
            Some((param, nominal)) => {
                let type_ref = ClassType::raw(self.names.class_type_name(nominal));
                let instance = self.names.lookup_regular_local(&param.name).ident();
                let local_decl = Stmt::LocalVar(crate::ast::LocalVar {
                    ty: JType::Class(type_ref.clone()),
                    name: instance.clone(),
                    is_final: false,
                    init: Some(Expr::New(NewExpr {
                        ty: type_ref,
                        diamond: false,
                        args: vec![],
                    })),
                });
                let tried = self.block(decl.func.body.as_ref())?;
                let finish = Stmt::Expr(instance.name_expr().call(
                    Ident::new(OutName::fixed("checkSoftFailures")),
                    vec![],
                ));
                Block::new(vec![
                    local_decl,
                    Stmt::Try(crate::ast::TryStmt {
                        body: tried,
                        catches: vec![],
                        finally: Some(Block::new(vec![finish])),
                    }),
                ])
            }
            _ => self.block(decl.func.body.as_ref())?,
        };

        self.test_decls.push(ClassMember::Method(MethodDecl {
            annotations: vec![Annotation {
                name: JUNIT_TEST.clone(),
            }],
            access: Access::Public,
            is_static: false,
            is_abstract: false,
            type_params: vec![],
            result: ResultType::Void,
            name,
            params: vec![],
            throws: vec![],
            body: Some(body),
        }));
        Ok(())
    }

    fn module_level_declare(&mut self, decl: &ir::ModuleLevelDecl) -> LowerResult<()> {
        let ty = JavaType::from_ir(&decl.ty, self.names)?.to_ast();
        let (_, out) = self.names.module_member(&decl.name);
        let name = out.ident();
        let field = ClassMember::Field(FieldDecl {
            access: access_for(decl.exported),
            is_static: true,
            is_final: decl.assign_once,
            ty,
            name: name.clone(),
            init: None,
        });
        Self::active_decls(
            self.processing_test,
            &mut self.test_decls,
            &mut self.module_fields,
        )
        .push(field);
        if let Some(init) = &decl.init {
            let value = self.expr(init)?;
            let assign = Stmt::Expr(Expr::assign(name.name_expr(), value));
            if self.processing_test {
                self.test_decls.push(ClassMember::Initializer(Initializer {
                    is_static: true,
                    body: Block::new(vec![assign]),
                }));
            } else {
                self.module_init.push(assign);
            }
        }
        Ok(())
    }

    fn class_declare(&mut self, decl: &ir::TypeDecl) -> LowerResult<()> {
        let name = self.names.type_decl_name(&decl.name).ident();
        let class_type_params = self.type_formals(&decl.type_params)?;
        let mut members: Vec<ClassMember> = Vec::new();

        for member in &decl.members {
            match member {
                ir::Member::Garbage(g) => {
                    if let Stmt::Comment(text) = garbage_comment(&g.source, g.diagnostic.as_deref())
                    {
                        members.push(ClassMember::Comment(text));
                    }
                }
                ir::Member::Constructor(ctor) => {
                    if ctor.visibility == ir::Visibility::Public {
                        if let Some(builder) =
                            self.class_builder(&name, &class_type_params, ctor)?
                        {
                            members.push(ClassMember::Class(builder));
                        }
                    }
                    let access = access_for(ctor.visibility == ir::Visibility::Public);
                    let body = self.function_block(&ctor.func)?;
                    let overloads = self.overloads(None, &ctor.func.params, body, |args| {
                        Block::new(vec![Stmt::ThisCall(args)])
                    })?;
                    for over in overloads {
                        members.push(ClassMember::Constructor(ConstructorDecl {
                            access,
                            name: name.clone(),
                            params: over.params.params,
                            body: over.body.preface(over.params.preamble),
                        }));
                    }
                }
                ir::Member::Getter(getter) => {
                    let result = result_type(self.names, &getter.func.return_type)?;
                    let method_name = self
                        .names
                        .getter_name(&getter.dot_name, &getter.func.return_type);
                    let body = match &getter.func.body {
                        Some(_) => Some(self.function_block(&getter.func)?),
                        None => None,
                    };
                    members.push(ClassMember::Method(MethodDecl {
                        annotations: vec![],
                        access: access_for(getter.visibility == ir::Visibility::Public),
                        is_static: false,
                        is_abstract: getter.func.body.is_none(),
                        type_params: vec![],
                        result,
                        name: method_name,
                        params: vec![],
                        throws: vec![],
                        body,
                    }));
                }
                ir::Member::Setter(setter) => {
                    let result = result_type(self.names, &setter.func.return_type)?;
                    let method_name = self.names.setter_name(&setter.dot_name);
                    let params = self.parameters(&setter.func.params)?;
                    let body = match &setter.func.body {
                        Some(_) => Some(self.function_block(&setter.func)?),
                        None => None,
                    };
                    members.push(ClassMember::Method(MethodDecl {
                        annotations: vec![],
                        access: access_for(setter.visibility == ir::Visibility::Public),
                        is_static: false,
                        is_abstract: setter.func.body.is_none(),
                        type_params: vec![],
                        result,
                        name: method_name,
                        params: params.params,
                        throws: vec![],
                        body,
                    }));
                }
                ir::Member::Method(method) => {
                    self.class_method(method, &mut members)?;
                }
                ir::Member::Property(prop) => {
                    if !prop.is_abstract {
                        members.push(ClassMember::Field(FieldDecl {
                            access: access_for(prop.visibility == ir::Visibility::Public),
                            is_static: false,
                            is_final: prop.assign_once,
                            ty: JavaType::from_ir(&prop.ty, self.names)?.to_ast(),
                            name: self.names.field_name(&prop.name).ident(),
                            init: None,
                        }));
                    }
                }
                ir::Member::StaticProperty(prop) => {
                    let init = self.expr(&prop.init)?;
                    members.push(ClassMember::Field(FieldDecl {
                        access: access_for(prop.visibility == ir::Visibility::Public),
                        is_static: true,
                        is_final: prop.assign_once,
                        ty: JavaType::from_ir(&prop.ty, self.names)?.to_ast(),
                        name: self.names.static_field(&prop.dot_name).ident(),
                        init: Some(init),
                    }));
                }
            }
        }

        let implements = decl
            .super_types
            .iter()
            .map(|s| self.class_type_ref(s))
            .collect();
        self.programs.push(Program {
            package: self.names.current_module().package.clone(),
            meta: self.program_meta(false, self.processing_test),
            decl: TypeDeclaration::Class(ClassDecl {
                access: access_for(decl.exported),
                is_final: true,
                is_static: false,
                name,
                type_params: class_type_params,
                extends: None,
                implements,
                members,
            }),
        });
        Ok(())
    }

    /// Lower one concrete or abstract method, including the primitive-to-
    /// boxed bridge for generic overrides and optional-parameter overloads.
    fn class_method(
        &mut self,
        method: &ir::Method,
        members: &mut Vec<ClassMember>,
    ) -> LowerResult<()> {
        let method_name = self.names.method_name(&method.dot_name).ident();
        let access = access_for(method.visibility == ir::Visibility::Public);
        let type_params = self.type_formals(&method.func.type_params)?;
        let tentative_result = result_type(self.names, &method.func.return_type)?;

        if method.func.body.is_none() {
            let params = self.parameters(&method.func.params)?;
            members.push(ClassMember::Method(MethodDecl {
                annotations: vec![],
                access,
                is_static: method.is_static,
                is_abstract: true,
                type_params,
                result: tentative_result,
                name: method_name,
                params: params.params,
                throws: vec![],
                body: None,
            }));
            return Ok(());
        }

        let formals = self.parameters(&method.func.params)?;
        let tentative_body = self.function_block(&method.func)?;

        let adjustments = if method.is_static {
            None
        } else {
            find_boxed_adjustments(
                self.names,
                &formals.params,
                &tentative_result,
                &method.overridden,
            )?
        };

        let mut result = tentative_result;
        let mut body = tentative_body;
        if let Some(adj) = &adjustments {
            // Keep the primitive-signature implementation as a private
            // helper; the public method presents the boxed signature and
            // unboxes on the way in.
            let helper = self.names.private_helper(&method.name).ident();
            members.push(ClassMember::Method(MethodDecl {
                annotations: vec![],
                access: Access::Private,
                is_static: false,
                is_abstract: false,
                type_params: type_params.clone(),
                result: result.clone(),
                name: helper.clone(),
                params: formals.params.clone(),
                throws: vec![],
                // The helper keeps the original signature and owns the
                // parameter preamble.
                body: Some(body.preface(formals.preamble.clone())),
            }));
            let call = Expr::InstanceCall(InstanceCall {
                subject: None,
                method: helper,
                args: formals
                    .params
                    .iter()
                    .enumerate()
                    .map(|(index, param)| {
                        let read = param.name.name_expr();
                        match param.ty {
                            JType::Primitive(kind) if adj.param_needs_adjustment(index) => {
                                unbox_to_primitive(read, kind)
                            }
                            _ => read,
                        }
                    })
                    .collect(),
            });
            body = Block::new(vec![if result.is_void() {
                Stmt::Expr(call)
            } else {
                Stmt::Return(Some(call))
            }]);
            if adj.adjust_return {
                if let ResultType::Type(JType::Primitive(kind)) = result {
                    result = ResultType::Type(JType::Class(kind.boxed().class_type()));
                }
            }
        }

        let overloads = {
            let forward_name = method_name.clone();
            let returns = !result.is_void();
            self.overloads(adjustments.as_ref(), &method.func.params, body, |args| {
                forward_unqualified(forward_name.clone(), args, returns)
            })?
        };
        for over in overloads {
            members.push(ClassMember::Method(MethodDecl {
                annotations: vec![],
                access,
                is_static: method.is_static,
                is_abstract: false,
                type_params: type_params.clone(),
                result: result.clone(),
                name: method_name.clone(),
                params: over.params.params,
                throws: vec![],
                body: Some(over.body.preface(over.params.preamble)),
            }));
        }
        Ok(())
    }

    fn interface_declare(&mut self, decl: &ir::TypeDecl) -> LowerResult<()> {
        let mut members: Vec<InterfaceMember> = Vec::new();
        for member in &decl.members {
            match member {
                ir::Member::Garbage(g) => {
                    if let Stmt::Comment(text) = garbage_comment(&g.source, g.diagnostic.as_deref())
                    {
                        members.push(InterfaceMember::Comment(text));
                    }
                }
                ir::Member::Constructor(ctor) => {
                    members.push(InterfaceMember::Comment(format!(
                        "{}: constructor invalid in an interface",
                        ctor.name.text
                    )));
                }
                ir::Member::Getter(getter) => {
                    let name = self
                        .names
                        .getter_name(&getter.dot_name, &getter.func.return_type);
                    let method = self.interface_method(name, &getter.func, vec![], false)?;
                    members.push(InterfaceMember::Method(method));
                }
                ir::Member::Setter(setter) => {
                    let name = self.names.setter_name(&setter.dot_name);
                    let method = self.interface_method(name, &setter.func, vec![], false)?;
                    members.push(InterfaceMember::Method(method));
                }
                ir::Member::Method(m) => {
                    let name = self.names.method_name(&m.dot_name).ident();
                    let type_params = self.type_formals(&m.func.type_params)?;
                    let method = self.interface_method(name, &m.func, type_params, m.is_static)?;
                    members.push(InterfaceMember::Method(method));
                }
                // Instance properties surface through their accessors.
                ir::Member::Property(_) => {}
                ir::Member::StaticProperty(prop) => {
                    let init = self.expr(&prop.init)?;
                    members.push(InterfaceMember::Field(crate::ast::InterfaceField {
                        ty: JavaType::from_ir(&prop.ty, self.names)?.to_ast(),
                        name: self.names.static_field(&prop.dot_name).ident(),
                        init,
                    }));
                }
            }
        }

        let extends = decl
            .super_types
            .iter()
            .map(|s| self.class_type_ref(s))
            .collect();
        let type_params = self.type_formals(&decl.type_params)?;
        self.programs.push(Program {
            package: self.names.current_module().package.clone(),
            meta: self.program_meta(false, self.processing_test),
            decl: TypeDeclaration::Interface(InterfaceDecl {
                access: access_for(decl.exported),
                name: self.names.type_decl_name(&decl.name).ident(),
                type_params,
                extends,
                members,
            }),
        });
        Ok(())
    }

    /// A virtual member becomes abstract and drops its body; concrete ones
    /// become default methods, or static for static members.
    fn interface_method(
        &mut self,
        name: Ident,
        func: &ir::Function,
        type_params: Vec<TypeParam>,
        is_static: bool,
    ) -> LowerResult<InterfaceMethod> {
        let is_virtual = func.body.is_none();
        if is_static && is_virtual {
            return Err(LowerError::internal(
                "static interface method requires a body",
            ));
        }
        let kind = if is_static {
            InterfaceMethodKind::Static
        } else if is_virtual {
            InterfaceMethodKind::Abstract
        } else {
            InterfaceMethodKind::Default
        };
        let params = self.parameters(&func.params)?;
        let body = if is_virtual {
            None
        } else {
            Some(self.function_block(func)?.preface(params.preamble.clone()))
        };
        Ok(InterfaceMethod {
            kind,
            type_params,
            result: result_type(self.names, &func.return_type)?,
            name,
            params: params.params,
            body,
        })
    }

    /// Create the Java parameters and any preamble statements for one IR
    /// parameter list. Rest parameters become varargs plus a list-typed
    /// local in the preamble.
    pub(crate) fn parameters(&mut self, px: &ir::Parameters) -> LowerResult<ParamsPreamble> {
        let mut params = Vec::new();
        let mut preamble = Vec::new();
        let this_id = px.this_name.as_ref().map(|n| n.id);

        for p in &px.params {
            if Some(p.name.id) == this_id {
                continue;
            }
            let mut ty = JavaType::from_ir(&p.ty, self.names)?;
            if p.optional {
                ty = ty.nullable();
            }
            params.push(Param {
                ty: ty.to_ast(),
                name: self.names.formal(&p.name),
                variadic: false,
            });
        }
        if let Some(rest) = &px.rest {
            let element = JavaType::from_ir(&rest.ty, self.names)?;
            let param_name = self.names.rest_formal(&rest.name);
            let local_name = self.names.formal(&rest.name);
            let local_ty = JType::Class(ClassType {
                name: JAVA_UTIL_LIST.clone(),
                args: vec![crate::ast::TypeArg::Type(
                    element.as_reference().to_class_type(),
                )],
                nullable: false,
            });
            params.push(Param {
                ty: element.to_ast(),
                name: param_name.clone(),
                variadic: true,
            });
            preamble.push(Stmt::LocalVar(crate::ast::LocalVar {
                ty: local_ty,
                name: local_name,
                is_final: false,
                init: Some(JAVA_UTIL_ARRAYS_AS_LIST.static_call(vec![param_name.name_expr()])),
            }));
        }
        Ok(ParamsPreamble { params, preamble })
    }

    /// Emit the full-arity declaration plus one forwarding overload per
    /// optional suffix length, stopping at the first required parameter
    /// from the end.
    fn overloads(
        &mut self,
        adjustments: Option<&crate::adjust::BoxedTypeAdjustments>,
        px: &ir::Parameters,
        original_body: Block,
        forward: impl Fn(Vec<Expr>) -> Block,
    ) -> LowerResult<Vec<Overload>> {
        let mut original = self.parameters(px)?;
        original.params = with_adjustments(original.params, adjustments);
        if adjustments.is_some() {
            // The bridged body is a plain delegation; the private helper
            // already owns the preamble.
            original.preamble.clear();
        }
        let original_params = original.params.clone();
        let mut overloads = vec![Overload {
            params: original,
            body: original_body,
        }];

        for idx in (0..px.params.len()).rev() {
            if !px.params[idx].optional {
                break;
            }
            let reduced = ir::Parameters {
                this_name: px.this_name.clone(),
                params: px.params[..idx].to_vec(),
                rest: None,
            };
            let mut formals = self.parameters(&reduced)?;
            formals.params = with_adjustments(formals.params, adjustments);
            formals.preamble.clear();
            let available = formals.params.len();
            let args = original_params
                .iter()
                .enumerate()
                .map(|(i, param)| {
                    if i < available {
                        param.name.name_expr()
                    } else {
                        Expr::Literal(Literal::Null)
                    }
                })
                .collect();
            overloads.push(Overload {
                params: formals,
                body: forward(args),
            });
        }
        Ok(overloads)
    }

    /// Build a chained-setter builder class for a public constructor with
    /// more than one meaningful parameter.
    fn class_builder(
        &mut self,
        class_name: &Ident,
        type_params: &[TypeParam],
        ctor: &ir::Constructor,
    ) -> LowerResult<Option<ClassDecl>> {
        let this_id = ctor.func.params.this_name.as_ref().map(|n| n.id);
        let value_params: Vec<&ir::Formal> = ctor
            .func
            .params
            .params
            .iter()
            .filter(|p| Some(p.name.id) != this_id)
            .collect();
        // With at most one parameter the constructor is easy to call
        // directly; rest parameters would need list extraction first.
        if value_params.len() <= 1 || ctor.func.params.rest.is_some() {
            return Ok(None);
        }

        let builder_name = Ident::new(OutName::fixed("Builder"));
        let type_args: Option<Vec<crate::ast::TypeArg>> = if type_params.is_empty() {
            None
        } else {
            Some(
                type_params
                    .iter()
                    .map(|tp| {
                        crate::ast::TypeArg::Type(ClassType::raw(QualifiedName::known_safe([
                            tp.name.text.clone()
                        ])))
                    })
                    .collect(),
            )
        };
        let builder_type = ClassType {
            name: QualifiedName::known_safe([builder_name.text().to_string()]),
            args: type_args.clone().unwrap_or_default(),
            nullable: false,
        };

        let mut members: Vec<ClassMember> = Vec::new();
        let mut fields: Vec<Ident> = Vec::new();
        // Flags and fields that participate in the required-field check.
        let mut requireds: Vec<Ident> = Vec::new();
        let mut required_fields: Vec<Ident> = Vec::new();
        let mut required_non_nulls: Vec<Ident> = Vec::new();

        for param in &value_params {
            let field_name = self.names.field_name(&param.name).ident();
            fields.push(field_name.clone());
            let field_java = JavaType::from_ir(&param.ty, self.names)?;
            let field_ty = field_java.to_ast();
            members.push(ClassMember::Field(FieldDecl {
                access: Access::PackagePrivate,
                is_static: false,
                is_final: false,
                ty: field_ty.clone(),
                name: field_name.clone(),
                init: None,
            }));
            let set_flag = if param.optional {
                None
            } else if matches!(&field_java, JavaType::Reference(r) if !r.nullable) {
                // Non-nullable reference type, so null indicates unset.
                required_non_nulls.push(field_name.clone());
                None
            } else {
                // A primitive or nullable reference type cannot use null as
                // the unset marker; track explicitly.
                let set_name =
                    Ident::new(OutName::fixed(format!("{}__set", field_name.text())));
                requireds.push(set_name.clone());
                required_fields.push(field_name.clone());
                members.push(ClassMember::Field(FieldDecl {
                    access: Access::PackagePrivate,
                    is_static: false,
                    is_final: false,
                    ty: JType::Primitive(PrimitiveKind::Boolean),
                    name: set_name.clone(),
                    init: None,
                }));
                Some(set_name)
            };

            let mut setter_body = Vec::new();
            if let Some(set_name) = &set_flag {
                setter_body.push(Stmt::Expr(Expr::assign(
                    set_name.name_expr(),
                    Expr::Literal(Literal::Bool(true)),
                )));
            }
            setter_body.push(Stmt::Expr(Expr::assign(
                Expr::This.field(field_name.clone()),
                field_name.name_expr(),
            )));
            setter_body.push(Stmt::Return(Some(Expr::This)));
            members.push(ClassMember::Method(MethodDecl {
                annotations: vec![],
                access: Access::Public,
                is_static: false,
                is_abstract: false,
                type_params: vec![],
                result: ResultType::Type(JType::Class(builder_type.clone())),
                name: field_name.clone(),
                params: vec![Param {
                    ty: field_ty,
                    name: field_name,
                    variadic: false,
                }],
                throws: vec![],
                body: Some(Block::new(setter_body)),
            }));
        }

        members.push(ClassMember::Method(self.builder_build_method(
            class_name,
            type_args.as_deref(),
            &fields,
            &requireds,
            &required_fields,
            &required_non_nulls,
        )));

        Ok(Some(ClassDecl {
            access: Access::Public,
            is_final: true,
            is_static: true,
            name: builder_name,
            type_params: type_params.to_vec(),
            extends: None,
            implements: vec![],
            members,
        }))
    }

    /// The `build()` method: check required fields, aggregate every missing
    /// one into a single error message, then construct.
    fn builder_build_method(
        &self,
        class_name: &Ident,
        type_args: Option<&[crate::ast::TypeArg]>,
        fields: &[Ident],
        requireds: &[Ident],
        required_fields: &[Ident],
        required_non_nulls: &[Ident],
    ) -> MethodDecl {
        let class_type = ClassType {
            name: QualifiedName::known_safe([class_name.text().to_string()]),
            args: type_args.map(<[_]>::to_vec).unwrap_or_default(),
            nullable: false,
        };
        let mut body: Vec<Stmt> = Vec::new();

        let unsets: Vec<Expr> = requireds
            .iter()
            .map(|flag| Expr::Not(Box::new(flag.name_expr())))
            .chain(
                required_non_nulls
                    .iter()
                    .map(|field| field.name_expr().test_null()),
            )
            .collect();
        if !unsets.is_empty() {
            let any_unset = unsets
                .clone()
                .into_iter()
                .reduce(|acc, unset| Expr::infix(crate::ast::JavaOp::Or, acc, unset))
                .expect("unsets is non-empty");

            let message = Ident::new(OutName::fixed("_message"));
            let mut consequent = vec![Stmt::LocalVar(crate::ast::LocalVar {
                ty: JType::Class(ClassType::raw(JAVA_LANG_STRING_BUILDER.clone())),
                name: message.clone(),
                is_final: false,
                init: Some(Expr::New(NewExpr {
                    ty: ClassType::raw(JAVA_LANG_STRING_BUILDER.clone()),
                    diamond: false,
                    args: vec![Expr::Literal(Literal::Str(
                        "Missing required fields:".to_string(),
                    ))],
                })),
            })];
            let named: Vec<&Ident> = required_fields
                .iter()
                .chain(required_non_nulls.iter())
                .collect();
            for (field, unset) in named.iter().zip(unsets.iter()) {
                consequent.push(Stmt::If(crate::ast::IfStmt {
                    test: unset.clone(),
                    consequent: Block::new(vec![Stmt::Expr(message.name_expr().call(
                        Ident::new(OutName::fixed("append")),
                        vec![Expr::Literal(Literal::Str(format!(" {}", field.text())))],
                    ))]),
                    alternate: None,
                }));
            }
            consequent.push(Stmt::Throw(Expr::New(NewExpr {
                ty: ClassType::raw(JAVA_LANG_ILLEGAL_STATE_EXCEPTION.clone()),
                diamond: false,
                args: vec![message
                    .name_expr()
                    .call(Ident::new(OutName::fixed("toString")), vec![])],
            })));
            body.push(Stmt::If(crate::ast::IfStmt {
                test: any_unset,
                consequent: Block::new(consequent),
                alternate: None,
            }));
        }

        body.push(Stmt::Return(Some(Expr::New(NewExpr {
            ty: ClassType::raw(QualifiedName::known_safe([class_name.text().to_string()])),
            diamond: type_args.is_some(),
            args: fields.iter().map(|f| f.name_expr()).collect(),
        }))));

        MethodDecl {
            annotations: vec![],
            access: Access::Public,
            is_static: false,
            is_abstract: false,
            type_params: vec![],
            result: ResultType::Type(JType::Class(class_type)),
            name: Ident::new(OutName::fixed("build")),
            params: vec![],
            throws: vec![],
            body: Some(Block::new(body)),
        }
    }

    pub(crate) fn class_type_ref(&mut self, nominal: &ir::NominalType) -> ClassType {
        ClassType::raw(self.names.class_type_name(nominal))
    }

    /// Lower type formals: Java requires any class bound first, and an
    /// `Object` bound says nothing.
    pub(crate) fn type_formals(
        &mut self,
        formals: &[ir::TypeFormal],
    ) -> LowerResult<Vec<TypeParam>> {
        let mut out = Vec::with_capacity(formals.len());
        for formal in formals {
            let mut bounds = Vec::new();
            for bound in &formal.bounds {
                let class_like =
                    matches!(bound, ir::Type::Nominal(n) if n.kind == ir::NominalKind::Class);
                let reference = JavaType::from_ir(bound, self.names)?.as_reference();
                bounds.push((class_like, reference));
            }
            bounds.sort_by_key(|(class_like, _)| !*class_like);
            out.push(TypeParam {
                name: self.names.type_formal(&formal.name),
                bounds: bounds
                    .into_iter()
                    .filter(|(_, r)| r.name != *crate::standard::JAVA_LANG_OBJECT)
                    .map(|(_, r)| r.to_class_type())
                    .collect(),
            });
        }
        Ok(out)
    }
}

pub(crate) fn access_for(public: bool) -> Access {
    if public {
        Access::Public
    } else {
        Access::PackagePrivate
    }
}

pub(crate) fn result_type(names: &mut JavaNames, ty: &ir::Type) -> LowerResult<ResultType> {
    Ok(JavaType::from_ir(ty, names)?.to_result_ast())
}

fn forward_static(name: Ident, args: Vec<Expr>, returns: bool) -> Block {
    let call = Expr::StaticCall(crate::ast::StaticCall {
        class: None,
        method: name,
        args,
    });
    Block::new(vec![if returns {
        Stmt::Return(Some(call))
    } else {
        Stmt::Expr(call)
    }])
}

fn forward_unqualified(name: Ident, args: Vec<Expr>, returns: bool) -> Block {
    let call = Expr::InstanceCall(InstanceCall {
        subject: None,
        method: name,
        args,
    });
    Block::new(vec![if returns {
        Stmt::Return(Some(call))
    } else {
        Stmt::Expr(call)
    }])
}
