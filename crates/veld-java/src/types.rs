//! Java-side view of IR types.
//!
//! The type system bifurcates into "some kind of primitive" and "everything
//! else", following the conventions of the Java standard library's
//! `java.util.function` specializations. Function types become single
//! abstract method (SAM) interfaces: a well-known one when the simplified
//! signature matches, a synthesized one otherwise.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use veld_ir as ir;

use crate::ast::{ClassType, Expr, JType, Literal, PrimitiveKind, ResultType, TypeArg};
use crate::error::LowerResult;
use crate::grammar::QualifiedName;
use crate::names::JavaNames;
use crate::standard::{
    JAVA_LANG, JAVA_LANG_BOOLEAN, JAVA_LANG_DOUBLE, JAVA_LANG_INTEGER, JAVA_LANG_LONG,
    JAVA_LANG_OBJECT, JAVA_LANG_STRING, JAVA_LANG_VOID, JAVA_UTIL_DEQUE, JAVA_UTIL_FUNCTION,
    JAVA_UTIL_LIST, JAVA_UTIL_MAP, JAVA_UTIL_MAP_ENTRY, VELD_STUB_INVALID_TYPE,
};

impl PrimitiveKind {
    /// The boxed wrapper class for this primitive.
    pub fn boxed(self) -> QualifiedName {
        match self {
            PrimitiveKind::Boolean => JAVA_LANG_BOOLEAN.clone(),
            PrimitiveKind::Int => JAVA_LANG_INTEGER.clone(),
            PrimitiveKind::Long => JAVA_LANG_LONG.clone(),
            PrimitiveKind::Double => JAVA_LANG_DOUBLE.clone(),
        }
    }
}

/// A Java type as the lowering reasons about it, before AST conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum JavaType {
    Primitive(PrimitiveKind),
    Reference(ReferenceType),
    Void,
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceType {
    pub name: QualifiedName,
    pub nullable: bool,
    pub args: Vec<ReferenceType>,
}

impl ReferenceType {
    pub fn plain(name: QualifiedName) -> Self {
        Self {
            name,
            nullable: false,
            args: Vec::new(),
        }
    }

    pub fn to_class_type(&self) -> ClassType {
        ClassType {
            name: self.name.clone(),
            args: self
                .args
                .iter()
                .map(|arg| TypeArg::Type(arg.to_class_type()))
                .collect(),
            nullable: self.nullable,
        }
    }
}

impl JavaType {
    pub fn reference(name: QualifiedName) -> JavaType {
        JavaType::Reference(ReferenceType::plain(name))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, JavaType::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, JavaType::Reference(_))
    }

    /// Type as written in a declaration position.
    pub fn to_ast(&self) -> JType {
        match self {
            JavaType::Primitive(p) => JType::Primitive(*p),
            JavaType::Reference(r) => JType::Class(r.to_class_type()),
            JavaType::Void => JType::Class(ClassType::raw(JAVA_LANG_VOID.clone())),
            JavaType::Invalid => JType::Class(ClassType::raw(VELD_STUB_INVALID_TYPE.clone())),
        }
    }

    /// Type as written in a method result position.
    pub fn to_result_ast(&self) -> ResultType {
        match self {
            JavaType::Void => ResultType::Void,
            other => ResultType::Type(other.to_ast()),
        }
    }

    /// For use as a type argument, or where a reference type is required.
    pub fn as_reference(&self) -> ReferenceType {
        match self {
            JavaType::Primitive(p) => ReferenceType::plain(p.boxed()),
            JavaType::Reference(r) => r.clone(),
            JavaType::Void => ReferenceType::plain(JAVA_LANG_VOID.clone()),
            JavaType::Invalid => ReferenceType::plain(VELD_STUB_INVALID_TYPE.clone()),
        }
    }

    pub fn nullable(self) -> JavaType {
        let mut reference = self.as_reference();
        reference.nullable = true;
        JavaType::Reference(reference)
    }

    /// `T.class`, always on the raw type.
    pub fn to_class_literal(&self) -> Expr {
        let raw = match self {
            JavaType::Reference(r) => {
                let mut raw = r.clone();
                raw.args.clear();
                raw.nullable = false;
                JType::Class(raw.to_class_type())
            }
            other => other.to_ast(),
        };
        Expr::Literal(Literal::Class(raw))
    }
}

/// Well-known nominal names with fixed Java counterparts.
static BUILTIN_NOMINALS: Lazy<FxHashMap<&'static str, QualifiedName>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("String", JAVA_LANG_STRING.clone());
    map.insert("List", JAVA_UTIL_LIST.clone());
    map.insert("ListBuilder", JAVA_UTIL_LIST.clone());
    map.insert("Listed", JAVA_UTIL_LIST.clone());
    map.insert("Map", JAVA_UTIL_MAP.clone());
    map.insert("Mapped", JAVA_UTIL_MAP.clone());
    map.insert("MapBuilder", JAVA_UTIL_MAP.clone());
    map.insert("Pair", JAVA_UTIL_MAP_ENTRY.clone());
    map.insert("Deque", JAVA_UTIL_DEQUE.clone());
    // equals and hashCode live on Object, so these connect straight to it
    // when used as bounds.
    map.insert("Equatable", JAVA_LANG_OBJECT.clone());
    map.insert("MapKey", JAVA_LANG_OBJECT.clone());
    map
});

/// Fixed Java counterpart for a builtin nominal name, if any.
pub fn builtin_nominal(name: &str) -> Option<&'static QualifiedName> {
    BUILTIN_NOMINALS.get(name)
}

impl JavaType {
    /// Map a resolved IR type to its Java representation. Function types
    /// consult (and may extend) the SAM registry.
    pub fn from_ir(ty: &ir::Type, names: &mut JavaNames) -> LowerResult<JavaType> {
        Ok(match ty {
            ir::Type::Boolean => JavaType::Primitive(PrimitiveKind::Boolean),
            ir::Type::Int => JavaType::Primitive(PrimitiveKind::Int),
            ir::Type::Long => JavaType::Primitive(PrimitiveKind::Long),
            ir::Type::Float64 => JavaType::Primitive(PrimitiveKind::Double),
            ir::Type::Str => JavaType::reference(JAVA_LANG_STRING.clone()),
            ir::Type::Void | ir::Type::Never => JavaType::Void,
            ir::Type::Top => JavaType::reference(JAVA_LANG_OBJECT.clone()),
            ir::Type::Invalid => JavaType::Invalid,
            ir::Type::Nullable(inner) => JavaType::from_ir(inner, names)?.nullable(),
            ir::Type::Var(tv) => {
                JavaType::reference(QualifiedName::known_safe([names
                    .type_formal(&tv.name)
                    .text]))
            }
            ir::Type::Function(sig) => JavaType::from_sig(sig, names)?,
            ir::Type::Nominal(nominal) => {
                let name = names.class_type_name(nominal);
                let mut args = Vec::with_capacity(nominal.args.len());
                for arg in &nominal.args {
                    args.push(JavaType::from_ir(arg, names)?.as_reference());
                }
                JavaType::Reference(ReferenceType {
                    name,
                    nullable: false,
                    args,
                })
            }
        })
    }

    /// The SAM interface type for a function signature.
    pub fn from_sig(sig: &ir::Signature, names: &mut JavaNames) -> LowerResult<JavaType> {
        let sam = names.sam_type(sig)?;
        Ok(JavaType::Reference(sam_reference(&sam, sig, names)?))
    }
}

/// The reference type for a SAM applied to a concrete signature: object
/// positions of the simplified signature become type arguments.
fn sam_reference(
    sam: &Sam,
    sig: &ir::Signature,
    names: &mut JavaNames,
) -> LowerResult<ReferenceType> {
    let mut args = Vec::new();
    if sam.num_type_args > 0 {
        for (idx, param) in sig.params.iter().enumerate() {
            if sam.sig.formals.get(idx) == Some(&SimpleType::Object) {
                args.push(JavaType::from_ir(&param.ty, names)?.as_reference());
            }
        }
        if sam.sig.var_arg == Some(SimpleType::Object) {
            if let Some(rest) = &sig.rest {
                args.push(JavaType::from_ir(rest, names)?.as_reference());
            }
        }
        if sam.sig.ret == SimpleType::Object {
            args.push(JavaType::from_ir(&sig.ret, names)?.as_reference());
        }
    }
    Ok(ReferenceType {
        name: sam.class_name.clone(),
        nullable: false,
        args,
    })
}

/// The simplified view of a type for SAM matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleType {
    Void,
    Object,
    Bool,
    Double,
    Int,
    Long,
}

impl SimpleType {
    /// The standard method verb for a `java.util.function` interface
    /// returning this simple type. Supplier variants override this.
    pub fn sam_method_name(self) -> &'static str {
        match self {
            SimpleType::Void => "accept",
            SimpleType::Object => "apply",
            SimpleType::Bool => "test",
            SimpleType::Double => "applyAsDouble",
            SimpleType::Int => "applyAsInt",
            SimpleType::Long => "applyAsLong",
        }
    }

    fn from_abbrev(c: char) -> SimpleType {
        match c {
            'v' => SimpleType::Void,
            'o' => SimpleType::Object,
            'b' => SimpleType::Bool,
            'd' => SimpleType::Double,
            'i' => SimpleType::Int,
            'l' => SimpleType::Long,
            other => panic!("unknown simple type abbreviation {other:?}"),
        }
    }
}

/// Simplify a resolved type for SAM matching.
pub fn simple_type(ty: &ir::Type) -> SimpleType {
    match ty {
        ir::Type::Void | ir::Type::Never => SimpleType::Void,
        ir::Type::Boolean => SimpleType::Bool,
        ir::Type::Int => SimpleType::Int,
        ir::Type::Long => SimpleType::Long,
        ir::Type::Float64 => SimpleType::Double,
        _ => SimpleType::Object,
    }
}

/// A function signature with minimal information to describe lambdas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleSignature {
    pub ret: SimpleType,
    pub formals: Vec<SimpleType>,
    pub var_arg: Option<SimpleType>,
    pub required_count: usize,
}

/// Simplify a full signature for SAM matching.
pub fn simple_signature(sig: &ir::Signature) -> SimpleSignature {
    SimpleSignature {
        ret: simple_type(&sig.ret),
        formals: sig
            .params
            .iter()
            .map(|p| {
                // Boolean parameters stay boxed: only return positions get
                // the Predicate specialization.
                if p.ty.is_boolean_like() {
                    SimpleType::Object
                } else {
                    simple_type(&p.ty)
                }
            })
            .collect(),
        var_arg: sig.rest.as_ref().map(simple_type),
        required_count: sig.required_count(),
    }
}

/// A single abstract method interface chosen or synthesized for a function
/// signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Sam {
    pub class_name: QualifiedName,
    pub sig: SimpleSignature,
    pub method: String,
    pub num_type_args: usize,
    pub synthetic: bool,
}

impl Sam {
    /// Describe a well-known interface from the `java.util.function`
    /// signature mini-language: one abbreviation per formal, return last.
    fn well_known(name: &str, sig: &str, method: Option<&str>, pkg: &QualifiedName) -> Sam {
        let ret = SimpleType::from_abbrev(sig.chars().next_back().expect("empty sam signature"));
        let formals: Vec<SimpleType> = sig
            .chars()
            .take(sig.len() - 1)
            .map(SimpleType::from_abbrev)
            .collect();
        let num_type_args = sig.chars().filter(|c| *c == 'o').count();
        let required_count = formals.len();
        Sam {
            class_name: pkg.qualify(name),
            sig: SimpleSignature {
                ret,
                formals,
                var_arg: None,
                required_count,
            },
            method: method.unwrap_or(ret.sam_method_name()).to_string(),
            num_type_args,
            synthetic: false,
        }
    }

    /// Synthesize a module-private interface for a signature no standard
    /// interface covers.
    pub fn synthetic(name: String, sig: &ir::Signature, pkg: &QualifiedName) -> Sam {
        let simple = simple_signature(sig);
        let method = simple.ret.sam_method_name().to_string();
        Sam {
            class_name: pkg.qualify(name),
            sig: simple,
            method,
            num_type_args: 0,
            synthetic: true,
        }
    }

    /// The standard interface matching a signature exactly, if any.
    /// Signatures with optional parameters never match: the default-method
    /// overloads require a synthesized interface.
    pub fn standard(sig: &ir::Signature) -> Option<Sam> {
        let simple = simple_signature(sig);
        if simple.required_count != simple.formals.len() {
            return None;
        }
        STANDARD_SAMS.get(&simple).cloned()
    }
}

static STANDARD_SAMS: Lazy<FxHashMap<SimpleSignature, Sam>> = Lazy::new(|| {
    let f = &*JAVA_UTIL_FUNCTION;
    let entries = [
        Sam::well_known("BiConsumer", "oov", Some("accept"), f),
        Sam::well_known("BiFunction", "ooo", None, f),
        Sam::well_known("BiPredicate", "oob", None, f),
        Sam::well_known("BooleanSupplier", "b", Some("getAsBoolean"), f),
        Sam::well_known("Consumer", "ov", Some("accept"), f),
        Sam::well_known("DoubleBinaryOperator", "ddd", None, f),
        Sam::well_known("DoubleConsumer", "dv", Some("accept"), f),
        Sam::well_known("DoubleFunction", "do", None, f),
        Sam::well_known("DoublePredicate", "db", None, f),
        Sam::well_known("DoubleSupplier", "d", Some("getAsDouble"), f),
        Sam::well_known("DoubleToIntFunction", "di", None, f),
        Sam::well_known("DoubleToLongFunction", "dl", None, f),
        Sam::well_known("DoubleUnaryOperator", "dd", None, f),
        Sam::well_known("Function", "oo", None, f),
        Sam::well_known("IntBinaryOperator", "iii", None, f),
        Sam::well_known("IntConsumer", "iv", Some("accept"), f),
        Sam::well_known("IntFunction", "io", None, f),
        Sam::well_known("IntPredicate", "ib", None, f),
        Sam::well_known("IntSupplier", "i", Some("getAsInt"), f),
        Sam::well_known("IntToDoubleFunction", "id", None, f),
        Sam::well_known("IntToLongFunction", "il", None, f),
        Sam::well_known("IntUnaryOperator", "ii", None, f),
        Sam::well_known("LongBinaryOperator", "lll", None, f),
        Sam::well_known("LongConsumer", "lv", Some("accept"), f),
        Sam::well_known("LongFunction", "lo", None, f),
        Sam::well_known("LongPredicate", "lb", None, f),
        Sam::well_known("LongSupplier", "l", Some("getAsLong"), f),
        Sam::well_known("LongToDoubleFunction", "ld", None, f),
        Sam::well_known("LongToIntFunction", "li", None, f),
        Sam::well_known("LongUnaryOperator", "ll", None, f),
        Sam::well_known("ObjDoubleConsumer", "odv", Some("accept"), f),
        Sam::well_known("ObjIntConsumer", "oiv", Some("accept"), f),
        Sam::well_known("ObjLongConsumer", "olv", Some("accept"), f),
        Sam::well_known("Predicate", "ob", None, f),
        Sam::well_known("Supplier", "o", Some("get"), f),
        Sam::well_known("ToDoubleBiFunction", "ood", None, f),
        Sam::well_known("ToDoubleFunction", "od", None, f),
        Sam::well_known("ToIntBiFunction", "ooi", None, f),
        Sam::well_known("ToIntFunction", "oi", None, f),
        Sam::well_known("ToLongBiFunction", "ool", None, f),
        Sam::well_known("ToLongFunction", "ol", None, f),
        Sam::well_known("Runnable", "v", Some("run"), &JAVA_LANG),
    ];
    entries
        .into_iter()
        .map(|sam| (sam.sig.clone(), sam))
        .collect()
});

const SIMPLE_NAME_FUNCTION: &str = "Function";
const SIMPLE_NAME_ANY: &str = "Any";
const SIMPLE_NAME_VOID_RETURN: &str = "Procedure";
const SIMPLE_NAME_BOOLEAN_RETURN: &str = "Predicate";
const SIMPLE_NAME_NO_PARAMS: &str = "Nullary";

fn suggest_simple_type_name(ty: &ir::Type) -> String {
    match ty.without_null() {
        ir::Type::Function(_) => SIMPLE_NAME_FUNCTION.to_string(),
        ir::Type::Top => SIMPLE_NAME_ANY.to_string(),
        ir::Type::Boolean => "Boolean".to_string(),
        ir::Type::Int => "Int".to_string(),
        ir::Type::Long => "Long".to_string(),
        ir::Type::Float64 => "Float64".to_string(),
        ir::Type::Str => "String".to_string(),
        ir::Type::Void => "Void".to_string(),
        ir::Type::Never => "Never".to_string(),
        ir::Type::Invalid => "Invalid".to_string(),
        ir::Type::Nominal(n) => n.name.clone(),
        ir::Type::Var(v) => v.name.text.clone(),
        ir::Type::Nullable(_) => unreachable!("without_null strips nullability"),
    }
}

/// Deduce a readable interface name from a function signature's shape.
pub fn suggest_sam_name(sig: &ir::Signature) -> String {
    let mut name = String::new();
    for param in &sig.params {
        name.push_str(&suggest_simple_type_name(&param.ty));
    }
    if let Some(rest) = &sig.rest {
        name.push_str(&suggest_simple_type_name(rest));
    }
    if name.is_empty() {
        name.push_str(SIMPLE_NAME_NO_PARAMS);
    }
    name.push_str(match &sig.ret {
        ir::Type::Void | ir::Type::Never => SIMPLE_NAME_VOID_RETURN,
        ir::Type::Boolean => SIMPLE_NAME_BOOLEAN_RETURN,
        other => return name + &suggest_simple_type_name(other),
    });
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_ir::{SigParam, Signature, Type};

    fn sig(params: Vec<Type>, ret: Type) -> Signature {
        Signature::new(
            params
                .into_iter()
                .map(|ty| SigParam {
                    ty,
                    optional: false,
                })
                .collect(),
            ret,
        )
    }

    #[test]
    fn standard_sam_matches_int_unary() {
        let sam = Sam::standard(&sig(vec![Type::Int], Type::Int)).unwrap();
        assert_eq!(sam.class_name.fully_qualified(), "java.util.function.IntUnaryOperator");
        assert_eq!(sam.method, "applyAsInt");
        assert!(!sam.synthetic);
    }

    #[test]
    fn boolean_params_do_not_specialize() {
        // (Boolean) -> Boolean is not BooleanUnaryOperator; the parameter
        // stays boxed, so only Predicate<Boolean> fits.
        let sam = Sam::standard(&sig(vec![Type::Boolean], Type::Boolean)).unwrap();
        assert_eq!(sam.class_name.last_part(), "Predicate");
    }

    #[test]
    fn optional_params_never_match_standard() {
        let mut s = sig(vec![Type::Int, Type::Int], Type::Int);
        s.params[1].optional = true;
        assert!(Sam::standard(&s).is_none());
    }

    #[test]
    fn suggested_names_follow_shape() {
        assert_eq!(suggest_sam_name(&sig(vec![], Type::Void)), "NullaryProcedure");
        assert_eq!(
            suggest_sam_name(&sig(vec![Type::Str], Type::Boolean)),
            "StringPredicate"
        );
        assert_eq!(
            suggest_sam_name(&sig(vec![Type::Int], Type::Str)),
            "IntString"
        );
    }

    #[test]
    fn nullable_formals_simplify_to_object() {
        assert_eq!(simple_type(&Type::Int.nullable()), SimpleType::Object);
        assert_eq!(simple_type(&Type::Int), SimpleType::Int);
    }
}
