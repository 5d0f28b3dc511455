//! End-to-end lowering tests over hand-built IR modules.

use veld_ir::{
    Assign, Block, BodyId, Call, Callee, Case, Category, Constructor, Expression, FnRef, Formal,
    Function, FunctionDecl, LocalDecl, LocalFunctionDecl, Member, Method, Module, ModuleId,
    ModuleSet, Parameters, Reference, ResolvedName, SigParam, Signature, Statement, Switch,
    TopLevel, Type, TypeDecl, TypeDeclKind, TypeVar, UsageIndex, Value, Visibility, While,
};
use veld_java::ast::{
    ClassDecl, ClassMember, Expr, JType, Literal, MethodDecl, Program, Stmt, TypeDeclaration,
};
use veld_java::lower_unit;

fn name(id: u32, text: &str) -> ResolvedName {
    ResolvedName::new(id, text)
}

fn int_value(v: i64) -> Expression {
    Expression::Value(Value::Int(v))
}

fn read(n: &ResolvedName, ty: Type) -> Expression {
    Expression::Reference(Reference {
        name: n.clone(),
        ty,
    })
}

fn void_sig() -> Signature {
    Signature::new(vec![], Type::Void)
}

fn call_fn(n: &ResolvedName, sig: Signature, args: Vec<Expression>) -> Expression {
    let ty = sig.ret.clone();
    Expression::Call(Call {
        callee: Callee::Function(FnRef {
            name: n.clone(),
            sig,
        }),
        args,
        ty,
    })
}

fn simple_function(body_id: u32, params: Vec<Formal>, ret: Type, body: Vec<Statement>) -> Function {
    Function {
        body_id: BodyId(body_id),
        type_params: vec![],
        params: Parameters {
            this_name: None,
            params,
            rest: None,
        },
        return_type: ret,
        body: Some(Block::new(body)),
    }
}

fn module_fn(fn_name: &ResolvedName, func: Function) -> TopLevel {
    TopLevel::Function(FunctionDecl {
        name: fn_name.clone(),
        exported: true,
        category: Category::Production,
        func,
    })
}

fn sample_module(top_levels: Vec<TopLevel>) -> ModuleSet {
    ModuleSet::single(Module {
        id: ModuleId(0),
        name: "demo/sample".to_string(),
        is_std_lib: true,
        body_id: BodyId(0),
        imports: vec![],
        top_levels,
        result: None,
    })
}

fn lower(set: &ModuleSet) -> Vec<Program> {
    let usage = UsageIndex::scan(set);
    lower_unit(&usage, set).expect("lowering should succeed")
}

fn find_class<'a>(programs: &'a [Program], class_name: &str) -> &'a ClassDecl {
    programs
        .iter()
        .find_map(|p| match &p.decl {
            TypeDeclaration::Class(c) if c.name.text() == class_name => Some(c),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no class {class_name} in output"))
}

fn find_methods<'a>(class: &'a ClassDecl, method_name: &str) -> Vec<&'a MethodDecl> {
    class
        .members
        .iter()
        .filter_map(|m| match m {
            ClassMember::Method(m) if m.name.text() == method_name => Some(m),
            _ => None,
        })
        .collect()
}

fn method_body<'a>(class: &'a ClassDecl, method_name: &str) -> &'a veld_java::ast::Block {
    let methods = find_methods(class, method_name);
    assert_eq!(methods.len(), 1, "expected a single method {method_name}");
    methods[0].body.as_ref().expect("method should have a body")
}

fn name_parts(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Name(n) => n.parts.iter().map(|i| i.text().to_string()).collect(),
        other => panic!("expected a name expression, got {other:?}"),
    }
}

/// A local `x`, assigned at declaration and once more inside a loop, read
/// from a nested closure: lifted into a scope carrier.
#[test]
fn loop_assigned_closure_read_local_is_lifted() {
    let x = name(1, "x");
    let g = name(2, "g");
    let host = name(3, "host");
    let set = sample_module(vec![module_fn(
        &host,
        simple_function(
            1,
            vec![],
            Type::Void,
            vec![
                Statement::LocalDecl(LocalDecl {
                    name: x.clone(),
                    ty: Type::Int,
                    init: Some(int_value(0)),
                    assign_once: false,
                }),
                Statement::While(While {
                    test: Expression::Value(Value::Bool(true)),
                    body: Box::new(Statement::Assign(Assign {
                        target: x.clone(),
                        value: int_value(1),
                    })),
                }),
                Statement::LocalFunction(LocalFunctionDecl {
                    name: g.clone(),
                    sig: Signature::new(vec![], Type::Int),
                    func: simple_function(
                        2,
                        vec![],
                        Type::Int,
                        vec![Statement::Return(Some(read(&x, Type::Int)))],
                    ),
                }),
            ],
        ),
    )]);

    let programs = lower(&set);
    let globals = find_class(&programs, "SampleGlobal");
    let body = method_body(globals, "host");

    // Scope class first, then its single final instance.
    let Stmt::LocalClass(scope_class) = &body.statements[0] else {
        panic!("expected a scope class, got {:?}", body.statements[0]);
    };
    assert_eq!(scope_class.name.text(), "Scope__1");
    let [ClassMember::Field(field)] = scope_class.members.as_slice() else {
        panic!("expected exactly the lifted field");
    };
    assert_eq!(field.name.text(), "x_1");
    assert_eq!(field.init, Some(Expr::Literal(Literal::Int(0))));

    let Stmt::LocalVar(instance) = &body.statements[1] else {
        panic!("expected the scope instantiation");
    };
    assert_eq!(instance.name.text(), "scope__1");
    assert!(instance.is_final);

    // The loop assignment goes through the scope.
    let Stmt::While(while_stmt) = &body.statements[2] else {
        panic!("expected the while loop");
    };
    let Stmt::Expr(Expr::Assign(assign)) = &while_stmt.body.statements[0] else {
        panic!("expected the lifted assignment");
    };
    assert_eq!(name_parts(&assign.target), vec!["scope__1", "x_1"]);

    // The closure reads the field off the scope instance.
    let Stmt::LocalVar(g_var) = &body.statements[3] else {
        panic!("expected the lambda local");
    };
    let Some(Expr::Lambda(lambda)) = &g_var.init else {
        panic!("expected a lambda initializer");
    };
    let veld_java::ast::LambdaBody::Expr(lambda_body) = &lambda.body else {
        panic!("single-return closures lower to expression lambdas");
    };
    assert_eq!(name_parts(lambda_body), vec!["scope__1", "x_1"]);
}

/// A local assigned once and read from a closure stays a plain local.
#[test]
fn single_assignment_closure_read_stays_regular() {
    let x = name(1, "x");
    let g = name(2, "g");
    let host = name(3, "host");
    let set = sample_module(vec![module_fn(
        &host,
        simple_function(
            1,
            vec![],
            Type::Void,
            vec![
                Statement::LocalDecl(LocalDecl {
                    name: x.clone(),
                    ty: Type::Int,
                    init: Some(int_value(0)),
                    assign_once: true,
                }),
                Statement::LocalFunction(LocalFunctionDecl {
                    name: g.clone(),
                    sig: Signature::new(vec![], Type::Int),
                    func: simple_function(
                        2,
                        vec![],
                        Type::Int,
                        vec![Statement::Return(Some(read(&x, Type::Int)))],
                    ),
                }),
            ],
        ),
    )]);

    let programs = lower(&set);
    let globals = find_class(&programs, "SampleGlobal");
    let body = method_body(globals, "host");

    assert!(
        !body
            .statements
            .iter()
            .any(|s| matches!(s, Stmt::LocalClass(_))),
        "no scope should be synthesized"
    );
    let Stmt::LocalVar(x_var) = &body.statements[0] else {
        panic!("expected the plain local");
    };
    assert_eq!(x_var.name.text(), "x_1");
}

/// Two assignments outside any loop, never read from a nested function:
/// still a plain local.
#[test]
fn reassigned_uncaptured_local_stays_regular() {
    let x = name(1, "x");
    let host = name(2, "host");
    let set = sample_module(vec![module_fn(
        &host,
        simple_function(
            1,
            vec![],
            Type::Void,
            vec![
                Statement::LocalDecl(LocalDecl {
                    name: x.clone(),
                    ty: Type::Int,
                    init: Some(int_value(0)),
                    assign_once: false,
                }),
                Statement::Assign(Assign {
                    target: x.clone(),
                    value: int_value(1),
                }),
            ],
        ),
    )]);

    let programs = lower(&set);
    let globals = find_class(&programs, "SampleGlobal");
    let body = method_body(globals, "host");
    assert!(
        !body
            .statements
            .iter()
            .any(|s| matches!(s, Stmt::LocalClass(_))),
        "no scope should be synthesized"
    );
    let Stmt::Expr(Expr::Assign(assign)) = &body.statements[1] else {
        panic!("expected a direct assignment");
    };
    assert_eq!(name_parts(&assign.target), vec!["x_1"]);
}

/// Mutual recursion with the callee declared later: the earlier function
/// becomes a method of the scope class, the later one a forward-declared
/// field assigned a closure at its declaration point, and the call site in
/// the method reads the sibling field.
#[test]
fn forward_declared_recursive_function_lowers_to_scope_field() {
    let b = name(10, "b");
    let a = name(11, "a");
    let host = name(12, "host");
    let set = sample_module(vec![module_fn(
        &host,
        simple_function(
            1,
            vec![],
            Type::Void,
            vec![
                // b is declared first and calls a before a's declaration.
                Statement::LocalFunction(LocalFunctionDecl {
                    name: b.clone(),
                    sig: void_sig(),
                    func: simple_function(
                        2,
                        vec![],
                        Type::Void,
                        vec![Statement::Expr(call_fn(&a, void_sig(), vec![]))],
                    ),
                }),
                Statement::LocalFunction(LocalFunctionDecl {
                    name: a.clone(),
                    sig: void_sig(),
                    func: simple_function(
                        3,
                        vec![],
                        Type::Void,
                        vec![Statement::Expr(call_fn(&b, void_sig(), vec![]))],
                    ),
                }),
                Statement::Expr(call_fn(&b, void_sig(), vec![])),
            ],
        ),
    )]);

    let programs = lower(&set);
    let globals = find_class(&programs, "SampleGlobal");
    let body = method_body(globals, "host");

    // Scope class, instance, deferred assignment of a, then the host call.
    let Stmt::LocalClass(scope_class) = &body.statements[0] else {
        panic!("expected the scope class first");
    };
    assert_eq!(scope_class.name.text(), "Scope__1");
    assert_eq!(scope_class.members.len(), 2);

    // b is a method of the scope; its call to a reads the sibling field
    // (unqualified, resolved against the enclosing scope class).
    let ClassMember::Method(b_method) = &scope_class.members[0] else {
        panic!("expected b as a scope method");
    };
    assert_eq!(b_method.name.text(), "b_10");
    let b_body = b_method.body.as_ref().expect("scope methods have bodies");
    let Stmt::Expr(Expr::InstanceCall(call)) = &b_body.statements[0] else {
        panic!("expected the forwarded call");
    };
    assert_eq!(call.method.text(), "run");
    assert_eq!(
        name_parts(call.subject.as_deref().expect("field receiver")),
        vec!["a_11"]
    );

    // a is a field of the scope, declared without an initializer.
    let ClassMember::Field(a_field) = &scope_class.members[1] else {
        panic!("expected a as a forward-declared field");
    };
    assert_eq!(a_field.name.text(), "a_11");
    assert!(a_field.init.is_none());
    assert!(matches!(&a_field.ty, JType::Class(c) if c.name.last_part() == "Runnable"));

    // The assignment statement gives the field its closure value.
    let Stmt::Expr(Expr::Assign(assign)) = &body.statements[2] else {
        panic!("expected the deferred assignment, got {:?}", body.statements[2]);
    };
    assert_eq!(name_parts(&assign.target), vec!["scope__1", "a_11"]);
    let Expr::Lambda(lambda) = assign.value.as_ref() else {
        panic!("expected a closure value");
    };
    let veld_java::ast::LambdaBody::Block(lambda_block) = &lambda.body else {
        panic!("void bodies lower to block lambdas");
    };
    let Stmt::Expr(Expr::InstanceCall(inner_call)) = &lambda_block.statements[0] else {
        panic!("expected the call back to b");
    };
    assert_eq!(inner_call.method.text(), "b_10");
    assert_eq!(
        name_parts(inner_call.subject.as_deref().expect("scope receiver")),
        vec!["scope__1"]
    );

    // The host-level call goes through the scope instance.
    let Stmt::Expr(Expr::InstanceCall(host_call)) = &body.statements[3] else {
        panic!("expected the host call");
    };
    assert_eq!(host_call.method.text(), "b_10");
    assert_eq!(
        name_parts(host_call.subject.as_deref().expect("scope receiver")),
        vec!["scope__1"]
    );
}

/// Self recursion addressed through the implicit receiver.
#[test]
fn self_recursive_function_calls_through_this() {
    let f = name(5, "f");
    let host = name(6, "host");
    let set = sample_module(vec![module_fn(
        &host,
        simple_function(
            1,
            vec![],
            Type::Void,
            vec![Statement::LocalFunction(LocalFunctionDecl {
                name: f.clone(),
                sig: void_sig(),
                func: simple_function(
                    2,
                    vec![],
                    Type::Void,
                    vec![Statement::Expr(call_fn(&f, void_sig(), vec![]))],
                ),
            })],
        ),
    )]);

    let programs = lower(&set);
    let globals = find_class(&programs, "SampleGlobal");
    let body = method_body(globals, "host");
    let Stmt::LocalClass(scope_class) = &body.statements[0] else {
        panic!("expected a scope class");
    };
    let ClassMember::Method(f_method) = &scope_class.members[0] else {
        panic!("expected f as a scope method");
    };
    let f_body = f_method.body.as_ref().unwrap();
    let Stmt::Expr(Expr::InstanceCall(call)) = &f_body.statements[0] else {
        panic!("expected the self call");
    };
    assert_eq!(call.method.text(), "f_5");
    assert_eq!(call.subject.as_deref(), Some(&Expr::This));
}

/// k optional trailing parameters produce exactly k+1 overloads, each
/// forwarding with null for the omitted suffix.
#[test]
fn optional_parameters_produce_forwarding_overloads() {
    let a = name(1, "a");
    let b = name(2, "b");
    let c = name(3, "c");
    let f = name(4, "f");
    let formal = |n: &ResolvedName, optional| Formal {
        name: n.clone(),
        ty: Type::Str,
        optional,
        assign_once: true,
    };
    let set = sample_module(vec![module_fn(
        &f,
        simple_function(
            1,
            vec![formal(&a, false), formal(&b, true), formal(&c, true)],
            Type::Void,
            vec![],
        ),
    )]);

    let programs = lower(&set);
    let globals = find_class(&programs, "SampleGlobal");
    let overloads = find_methods(globals, "f");
    assert_eq!(overloads.len(), 3, "two optionals mean three overloads");
    assert_eq!(overloads[0].params.len(), 3);
    assert_eq!(overloads[1].params.len(), 2);
    assert_eq!(overloads[2].params.len(), 1);

    // The unary overload forwards its argument plus two nulls.
    let body = overloads[2].body.as_ref().unwrap();
    let Stmt::Expr(Expr::StaticCall(call)) = &body.statements[0] else {
        panic!("void overloads forward as expression statements");
    };
    assert_eq!(call.method.text(), "f");
    assert_eq!(call.args.len(), 3);
    assert_eq!(name_parts(&call.args[0]), vec!["a_1"]);
    assert_eq!(call.args[1], Expr::Literal(Literal::Null));
    assert_eq!(call.args[2], Expr::Literal(Literal::Null));
}

/// An override declaring a primitive where the generic supertype resolved a
/// reference type gets a boxed public bridge delegating to a private
/// primitive helper.
#[test]
fn boxed_bridge_unboxes_adjusted_positions() {
    let x = name(1, "x");
    let apply = name(2, "apply");
    let holder = name(3, "Holder");
    let overridden = Signature::new(
        vec![SigParam {
            ty: Type::Var(TypeVar {
                name: name(9, "T"),
            }),
            optional: false,
        }],
        Type::Var(TypeVar {
            name: name(9, "T"),
        }),
    );
    let set = sample_module(vec![TopLevel::Type(TypeDecl {
        name: holder.clone(),
        kind: TypeDeclKind::Class,
        exported: true,
        category: Category::Production,
        type_params: vec![],
        super_types: vec![],
        members: vec![Member::Method(Method {
            name: apply.clone(),
            dot_name: veld_ir::DotName::new("apply"),
            visibility: Visibility::Public,
            is_static: false,
            func: simple_function(
                1,
                vec![Formal {
                    name: x.clone(),
                    ty: Type::Int,
                    optional: false,
                    assign_once: true,
                }],
                Type::Int,
                vec![Statement::Return(Some(read(&x, Type::Int)))],
            ),
            overridden: vec![overridden],
        })],
    })]);

    let programs = lower(&set);
    let holder_class = find_class(&programs, "Holder");

    // The private helper keeps the primitive signature.
    let helper = find_methods(holder_class, "apply_2");
    assert_eq!(helper.len(), 1);
    assert!(matches!(helper[0].access, veld_java::ast::Access::Private));
    assert!(matches!(helper[0].params[0].ty, JType::Primitive(_)));

    // The public method presents boxed types and unboxes on delegation.
    let bridges = find_methods(holder_class, "apply");
    assert_eq!(bridges.len(), 1);
    let bridge = bridges[0];
    assert!(matches!(&bridge.params[0].ty, JType::Class(c) if c.name.last_part() == "Integer"));
    assert!(matches!(&bridge.result, veld_java::ast::ResultType::Type(JType::Class(c))
        if c.name.last_part() == "Integer"));
    let body = bridge.body.as_ref().unwrap();
    let Stmt::Return(Some(Expr::InstanceCall(call))) = &body.statements[0] else {
        panic!("expected delegation to the helper");
    };
    assert_eq!(call.method.text(), "apply_2");
    let Expr::Cast(cast) = &call.args[0] else {
        panic!("expected the unboxing cast");
    };
    assert!(matches!(cast.ty, JType::Primitive(_)));
}

/// Builder synthesis for a public constructor with several parameters,
/// aggregating every missing required field into one failure.
#[test]
fn builder_reports_all_missing_required_fields() {
    let label = name(1, "label");
    let count = name(2, "count");
    let tag = name(3, "tag");
    let ctor = name(4, "Widget");
    let widget = name(5, "Widget");
    let set = sample_module(vec![TopLevel::Type(TypeDecl {
        name: widget.clone(),
        kind: TypeDeclKind::Class,
        exported: true,
        category: Category::Production,
        type_params: vec![],
        super_types: vec![],
        members: vec![Member::Constructor(Constructor {
            name: ctor.clone(),
            visibility: Visibility::Public,
            func: simple_function(
                1,
                vec![
                    Formal {
                        name: label.clone(),
                        ty: Type::Str,
                        optional: false,
                        assign_once: true,
                    },
                    Formal {
                        name: count.clone(),
                        ty: Type::Int,
                        optional: false,
                        assign_once: true,
                    },
                    Formal {
                        name: tag.clone(),
                        ty: Type::Str,
                        optional: true,
                        assign_once: true,
                    },
                ],
                Type::Void,
                vec![],
            ),
        })],
    })]);

    let programs = lower(&set);
    let widget_class = find_class(&programs, "Widget");
    let builder = widget_class
        .members
        .iter()
        .find_map(|m| match m {
            ClassMember::Class(c) if c.name.text() == "Builder" => Some(c),
            _ => None,
        })
        .expect("a Builder class should be synthesized");

    // Fields: label, count, count__set, tag. The primitive needs a set
    // flag; the non-nullable reference uses null as its unset marker.
    let field_names: Vec<&str> = builder
        .members
        .iter()
        .filter_map(|m| match m {
            ClassMember::Field(f) => Some(f.name.text()),
            _ => None,
        })
        .collect();
    assert_eq!(field_names, vec!["label", "count", "count__set", "tag"]);

    let build = find_methods(builder, "build");
    assert_eq!(build.len(), 1);
    let body = build[0].body.as_ref().unwrap();
    let Stmt::If(check) = &body.statements[0] else {
        panic!("expected the required-field check");
    };
    // !count__set || label == null
    let Expr::Infix(or) = &check.test else {
        panic!("expected the disjunction of unset tests");
    };
    assert_eq!(or.op, veld_java::ast::JavaOp::Or);
    // One message append per missing field, then the throw.
    let appends = check
        .consequent
        .statements
        .iter()
        .filter(|s| matches!(s, Stmt::If(_)))
        .count();
    assert_eq!(appends, 2);
    assert!(matches!(
        check.consequent.statements.last(),
        Some(Stmt::Throw(_))
    ));
    assert!(matches!(body.statements.last(), Some(Stmt::Return(_))));
}

/// Every case body not provably exiting gets a break appended; exiting ones
/// are left alone.
#[test]
fn switch_cases_get_fall_through_breaks() {
    let host = name(1, "host");
    let set = sample_module(vec![module_fn(
        &host,
        simple_function(
            1,
            vec![],
            Type::Int,
            vec![Statement::Switch(Switch {
                selector: int_value(1),
                cases: vec![
                    Case {
                        values: vec![0],
                        body: Block::new(vec![Statement::Expr(int_value(1))]),
                    },
                    Case {
                        values: vec![1],
                        body: Block::new(vec![Statement::Return(Some(int_value(2)))]),
                    },
                ],
                default: Block::new(vec![]),
            })],
        ),
    )]);

    let programs = lower(&set);
    let globals = find_class(&programs, "SampleGlobal");
    let body = method_body(globals, "host");
    let Stmt::Switch(switch) = &body.statements[0] else {
        panic!("expected the switch");
    };
    assert_eq!(switch.cases.len(), 3);

    let case_block = |index: usize| -> &veld_java::ast::Block {
        let [Stmt::Block(block)] = switch.cases[index].body.as_slice() else {
            panic!("case bodies are wrapped in blocks");
        };
        block
    };
    // Non-exiting case: break appended.
    assert!(matches!(
        case_block(0).statements.last(),
        Some(Stmt::Break(None))
    ));
    // Returning case: left alone.
    assert!(matches!(
        case_block(1).statements.last(),
        Some(Stmt::Return(_))
    ));
    // Empty default: conservative break.
    assert!(matches!(
        case_block(2).statements.last(),
        Some(Stmt::Break(None))
    ));
}

/// Rest parameters lower to varargs plus a list-typed local in the
/// preamble.
#[test]
fn rest_parameter_becomes_varargs_with_list_preamble() {
    let items = name(1, "items");
    let host = name(2, "host");
    let mut func = simple_function(
        1,
        vec![],
        Type::Void,
        vec![Statement::Expr(read(
            &items,
            Type::Nominal(veld_ir::NominalType::builtin(
                "List",
                veld_ir::NominalKind::Interface,
                vec![Type::Str],
            )),
        ))],
    );
    func.params.rest = Some(Formal {
        name: items.clone(),
        ty: Type::Str,
        optional: false,
        assign_once: true,
    });
    let set = sample_module(vec![module_fn(&host, func)]);

    let programs = lower(&set);
    let globals = find_class(&programs, "SampleGlobal");
    let methods = find_methods(globals, "host");
    assert_eq!(methods.len(), 1);
    let method = methods[0];
    assert_eq!(method.params.len(), 1);
    assert!(method.params[0].variadic);
    assert_eq!(method.params[0].name.text(), "items_1__rest");

    let body = method.body.as_ref().unwrap();
    let Stmt::LocalVar(list_local) = &body.statements[0] else {
        panic!("expected the list-typed preamble local");
    };
    assert_eq!(list_local.name.text(), "items_1");
    assert!(matches!(&list_local.ty, JType::Class(c) if c.name.last_part() == "List"));
    let Some(Expr::StaticCall(as_list)) = &list_local.init else {
        panic!("expected Arrays.asList");
    };
    assert_eq!(as_list.method.text(), "asList");
}

/// Lowering the same IR twice yields structurally identical output.
#[test]
fn lowering_is_deterministic() {
    let x = name(1, "x");
    let g = name(2, "g");
    let host = name(3, "host");
    let build = || {
        sample_module(vec![module_fn(
            &host,
            simple_function(
                1,
                vec![],
                Type::Void,
                vec![
                    Statement::LocalDecl(LocalDecl {
                        name: x.clone(),
                        ty: Type::Int,
                        init: Some(int_value(0)),
                        assign_once: false,
                    }),
                    Statement::While(While {
                        test: Expression::Value(Value::Bool(true)),
                        body: Box::new(Statement::Assign(Assign {
                            target: x.clone(),
                            value: int_value(1),
                        })),
                    }),
                    Statement::LocalFunction(LocalFunctionDecl {
                        name: g.clone(),
                        sig: Signature::new(vec![], Type::Int),
                        func: simple_function(
                            2,
                            vec![],
                            Type::Int,
                            vec![Statement::Return(Some(read(&x, Type::Int)))],
                        ),
                    }),
                ],
            ),
        )])
    };
    let first = lower(&build());
    let second = lower(&build());
    assert_eq!(first, second);
}

/// Shadowed source names never collide in output: distinct bindings get
/// distinct identifiers within one method body.
#[test]
fn shadowed_locals_get_distinct_identifiers() {
    let x1 = name(1, "x");
    let x2 = name(2, "x");
    let host = name(3, "host");
    let set = sample_module(vec![module_fn(
        &host,
        simple_function(
            1,
            vec![],
            Type::Void,
            vec![
                Statement::LocalDecl(LocalDecl {
                    name: x1.clone(),
                    ty: Type::Int,
                    init: Some(int_value(0)),
                    assign_once: true,
                }),
                Statement::Block(Block::new(vec![Statement::LocalDecl(LocalDecl {
                    name: x2.clone(),
                    ty: Type::Int,
                    init: Some(read(&x1, Type::Int)),
                    assign_once: true,
                })])),
            ],
        ),
    )]);

    let programs = lower(&set);
    let globals = find_class(&programs, "SampleGlobal");
    let body = method_body(globals, "host");
    let mut locals = Vec::new();
    fn collect_locals(stmts: &[Stmt], out: &mut Vec<String>) {
        for stmt in stmts {
            match stmt {
                Stmt::LocalVar(v) => out.push(v.name.text().to_string()),
                Stmt::Block(b) => collect_locals(&b.statements, out),
                _ => {}
            }
        }
    }
    collect_locals(&body.statements, &mut locals);
    assert_eq!(locals.len(), 2);
    assert_ne!(locals[0], locals[1]);
}

/// A function-typed parameter with an optional parameter of its own needs a
/// synthesized interface with a default-method overload forwarding null.
#[test]
fn optional_arity_signature_synthesizes_sam_interface() {
    let callback = name(1, "callback");
    let host = name(2, "host");
    let callback_sig = Signature {
        type_params: vec![],
        params: vec![
            SigParam {
                ty: Type::Str,
                optional: false,
            },
            SigParam {
                ty: Type::Str,
                optional: true,
            },
        ],
        rest: None,
        ret: Type::Void,
    };
    let set = sample_module(vec![module_fn(
        &host,
        simple_function(
            1,
            vec![Formal {
                name: callback.clone(),
                ty: Type::Function(Box::new(callback_sig.clone())),
                optional: false,
                assign_once: true,
            }],
            Type::Void,
            vec![Statement::Expr(Expression::Call(Call {
                callee: Callee::Value(veld_ir::ValueCallee {
                    callee: Box::new(read(
                        &callback,
                        Type::Function(Box::new(callback_sig.clone())),
                    )),
                    sig: callback_sig.clone(),
                }),
                args: vec![Expression::Value(Value::Str("hi".to_string()))],
                ty: Type::Void,
            }))],
        ),
    )]);

    let programs = lower(&set);
    let interface = programs
        .iter()
        .find_map(|p| match &p.decl {
            TypeDeclaration::Interface(i) if i.name.text() == "StringStringProcedure" => Some(i),
            _ => None,
        })
        .expect("a synthesized SAM interface program");
    assert_eq!(
        programs
            .iter()
            .find(|p| p.type_name() == "StringStringProcedure")
            .unwrap()
            .package
            .fully_qualified(),
        "demo.sample.function"
    );

    // One abstract full-arity method plus one default overload.
    let methods: Vec<&veld_java::ast::InterfaceMethod> = interface
        .members
        .iter()
        .filter_map(|m| match m {
            veld_java::ast::InterfaceMember::Method(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(methods.len(), 2);
    assert_eq!(
        methods[0].kind,
        veld_java::ast::InterfaceMethodKind::Default
    );
    assert_eq!(methods[0].params.len(), 1);
    assert_eq!(
        methods[1].kind,
        veld_java::ast::InterfaceMethodKind::Abstract
    );
    assert_eq!(methods[1].params.len(), 2);

    // The default method forwards with null for the omitted argument.
    let default_body = methods[0].body.as_ref().unwrap();
    let Stmt::Expr(Expr::InstanceCall(call)) = &default_body.statements[0] else {
        panic!("expected the forwarding call");
    };
    assert_eq!(call.args.len(), 2);
    assert_eq!(call.args[1], Expr::Literal(Literal::Null));

    // The call site dispatches through the synthesized SAM's method.
    let globals = find_class(&programs, "SampleGlobal");
    let body = method_body(globals, "host");
    let Stmt::Expr(Expr::InstanceCall(call)) = &body.statements[0] else {
        panic!("expected the SAM call");
    };
    assert_eq!(call.method.text(), "accept");
}
