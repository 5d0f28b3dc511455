//! Synthesized functional interface emission.
//!
//! Signatures with no standard `java.util.function` counterpart get a
//! module-private interface: one abstract method at full arity plus one
//! default method per optional arity below it, each forwarding with the
//! omitted trailing parameters passed as null.

use crate::ast::{
    Access, Block, Expr, Ident, InstanceCall, InterfaceDecl, InterfaceMember, InterfaceMethod,
    InterfaceMethodKind, Literal, Param, Program, Stmt, TypeDeclaration,
};
use crate::error::LowerResult;
use crate::names::OutName;
use crate::types::JavaType;

use super::{result_type, ModuleScope};

impl<'n, 'ir> ModuleScope<'n, 'ir> {
    /// Emit one program per SAM interface synthesized for the current
    /// module.
    pub(crate) fn sam_utility(&mut self) -> LowerResult<()> {
        for (sig, sam) in self.names.sam_types_for_current_module() {
            let result = result_type(self.names, &sig.ret)?;
            let method_name = Ident::new(OutName::fixed(sam.method.clone()));

            let mut first_optional = 0usize;
            let mut params: Vec<Param> = Vec::new();
            let mut in_required = true;
            for (index, formal) in sig.params.iter().enumerate() {
                if in_required {
                    if formal.optional {
                        in_required = false;
                    } else {
                        first_optional += 1;
                    }
                }
                let mut ty = JavaType::from_ir(&formal.ty, self.names)?;
                if formal.optional {
                    ty = ty.nullable();
                }
                params.push(Param {
                    ty: ty.to_ast(),
                    name: Ident::new(OutName::fixed(format!("arg{}", index + 1))),
                    variadic: false,
                });
            }
            if let Some(rest) = &sig.rest {
                let ty = JavaType::from_ir(rest, self.names)?;
                params.push(Param {
                    ty: ty.to_ast(),
                    name: Ident::new(OutName::fixed(format!("arg{}", params.len() + 1))),
                    variadic: true,
                });
            }

            let type_params = self.type_formals(&sig.type_params)?;
            let arity = params.len();
            let methods: Vec<InterfaceMember> = (first_optional..=arity)
                .map(|n| {
                    let body = if n < arity {
                        let call = Expr::InstanceCall(InstanceCall {
                            subject: None,
                            method: method_name.clone(),
                            args: params
                                .iter()
                                .enumerate()
                                .filter_map(|(p, param)| {
                                    if p < n {
                                        Some(param.name.name_expr())
                                    } else if param.variadic {
                                        // Omitted rest arguments are simply
                                        // not passed.
                                        None
                                    } else {
                                        Some(Expr::Literal(Literal::Null))
                                    }
                                })
                                .collect(),
                        });
                        Some(Block::new(vec![if result.is_void() {
                            Stmt::Expr(call)
                        } else {
                            Stmt::Return(Some(call))
                        }]))
                    } else {
                        None
                    };
                    InterfaceMember::Method(InterfaceMethod {
                        kind: if n < arity {
                            InterfaceMethodKind::Default
                        } else {
                            InterfaceMethodKind::Abstract
                        },
                        type_params: type_params.clone(),
                        result: result.clone(),
                        name: method_name.clone(),
                        params: params[..n].to_vec(),
                        body,
                    })
                })
                .collect();

            let (package, class_name) = sam.class_name.split();
            self.programs.push(Program {
                package,
                meta: self.program_meta(false, false),
                decl: TypeDeclaration::Interface(InterfaceDecl {
                    access: Access::Public,
                    name: Ident::new(OutName::fixed(class_name)),
                    type_params: type_params.clone(),
                    extends: vec![],
                    members: methods,
                }),
            });
        }
        Ok(())
    }
}
