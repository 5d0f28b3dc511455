//! Boxed-type adjustments for generic overrides.
//!
//! A generic supertype erases its type parameters to reference types, so an
//! override declaring a primitive at some position would not actually
//! override. Each such position must present as the boxed type publicly
//! while internal code keeps working on unboxed primitives.

use veld_ir as ir;

use crate::ast::{CastExpr, Expr, JType, Param, PrimitiveKind, ResultType};
use crate::error::LowerResult;
use crate::names::JavaNames;
use crate::types::JavaType;

/// Which positions of an overriding method must bridge from primitive to
/// boxed representation.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxedTypeAdjustments {
    /// One flag per declared parameter, in order.
    pub params: Vec<bool>,
    pub adjust_return: bool,
}

impl BoxedTypeAdjustments {
    pub fn param_needs_adjustment(&self, index: usize) -> bool {
        self.params.get(index).copied().unwrap_or(false)
    }
}

/// Compare an override's lowered parameters and result against every
/// overridden (generically substituted) signature. A position is marked
/// when the override declares a primitive where the overridden signature
/// resolves to a reference type. Returns `None` when nothing needs
/// bridging.
pub fn find_boxed_adjustments(
    names: &mut JavaNames,
    params: &[Param],
    result: &ResultType,
    overridden: &[ir::Signature],
) -> LowerResult<Option<BoxedTypeAdjustments>> {
    if overridden.is_empty() {
        return Ok(None);
    }
    let mut marks = vec![false; params.len()];
    let mut adjust_return = false;
    for signature in overridden {
        for (index, param) in params.iter().enumerate() {
            if marks[index] || !matches!(param.ty, JType::Primitive(_)) {
                continue;
            }
            let Some(overridden_param) = signature.params.get(index) else {
                continue;
            };
            if JavaType::from_ir(&overridden_param.ty, names)?.is_reference() {
                marks[index] = true;
            }
        }
        if !adjust_return {
            if let ResultType::Type(JType::Primitive(_)) = result {
                if JavaType::from_ir(&signature.ret, names)?.is_reference() {
                    adjust_return = true;
                }
            }
        }
    }
    if !adjust_return && !marks.iter().any(|m| *m) {
        return Ok(None);
    }
    Ok(Some(BoxedTypeAdjustments {
        params: marks,
        adjust_return,
    }))
}

/// Rewrite marked parameters to their boxed types; the bridge method's
/// public signature.
pub fn with_adjustments(params: Vec<Param>, adj: Option<&BoxedTypeAdjustments>) -> Vec<Param> {
    let Some(adj) = adj else {
        return params;
    };
    params
        .into_iter()
        .enumerate()
        .map(|(index, mut param)| {
            if adj.param_needs_adjustment(index) {
                if let JType::Primitive(kind) = param.ty {
                    param.ty = JType::Class(kind.boxed().class_type());
                }
            }
            param
        })
        .collect()
}

/// A cast unboxes a wrapper back to its primitive.
pub fn unbox_to_primitive(expr: Expr, kind: PrimitiveKind) -> Expr {
    Expr::Cast(CastExpr {
        ty: JType::Primitive(kind),
        expr: Box::new(expr),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ident;
    use crate::names::OutName;
    use veld_ir::{ModuleId, ModuleSet, SigParam, Signature, Type, UsageIndex};

    fn empty_unit() -> ModuleSet {
        ModuleSet::single(veld_ir::Module {
            id: ModuleId(0),
            name: "m".into(),
            is_std_lib: false,
            body_id: veld_ir::BodyId(0),
            imports: vec![],
            top_levels: vec![],
            result: None,
        })
    }

    fn int_param(name: &str) -> Param {
        Param {
            ty: JType::Primitive(PrimitiveKind::Int),
            name: Ident::new(OutName::fixed(name)),
            variadic: false,
        }
    }

    #[test]
    fn marks_primitive_position_overriding_reference() {
        let set = empty_unit();
        let usage = UsageIndex::scan(&set);
        let mut names = JavaNames::new(&usage, &set);
        let params = vec![int_param("a"), int_param("b")];
        // The supertype resolved position 1 to a type variable.
        let overridden = Signature::new(
            vec![
                SigParam {
                    ty: Type::Int,
                    optional: false,
                },
                SigParam {
                    ty: Type::Var(veld_ir::TypeVar {
                        name: veld_ir::ResolvedName::new(9, "T"),
                    }),
                    optional: false,
                },
            ],
            Type::Void,
        );
        let adj = find_boxed_adjustments(&mut names, &params, &ResultType::Void, &[overridden])
            .unwrap()
            .unwrap();
        assert_eq!(adj.params, vec![false, true]);
        assert!(!adj.adjust_return);

        let adjusted = with_adjustments(params, Some(&adj));
        assert!(matches!(adjusted[0].ty, JType::Primitive(_)));
        assert!(matches!(&adjusted[1].ty, JType::Class(c) if c.name.last_part() == "Integer"));
    }

    #[test]
    fn all_primitive_match_needs_no_bridge() {
        let set = empty_unit();
        let usage = UsageIndex::scan(&set);
        let mut names = JavaNames::new(&usage, &set);
        let params = vec![int_param("a")];
        let overridden = Signature::new(
            vec![SigParam {
                ty: Type::Int,
                optional: false,
            }],
            Type::Int,
        );
        let adj = find_boxed_adjustments(
            &mut names,
            &params,
            &ResultType::Type(JType::Primitive(PrimitiveKind::Int)),
            &[overridden],
        )
        .unwrap();
        assert!(adj.is_none());
    }
}
