//! Output name synthesis and the local binding classifier.
//!
//! [`JavaNames`] is the single-owner registry for everything name-shaped in
//! one compiled unit: simple/distinct identifier synthesis, module-level
//! qualification, accessor naming, SAM interface memoization, and the cached
//! classification of every local binding. It is created once per unit and
//! passed `&mut` down the lowering call graph; no ambient shared state.

use rustc_hash::{FxHashMap, FxHashSet};
use veld_ir as ir;
use veld_ir::{BindingId, BodyId, Category, DeclKind, DeclSite, ModuleId, UsageIndex};

use crate::ast::Ident;
use crate::error::{LowerError, LowerResult};
use crate::grammar::{safe_identifier, segment_to_pascal, to_pascal, QualifiedName};
use crate::local::{LocalName, NameLift};
use crate::types::{builtin_nominal, suggest_sam_name, Sam};

/// Suffix for the synthesized copy of a lifted parameter.
pub const CAPTURE_SUFFIX: &str = "__capture";
/// Suffix distinguishing a varargs formal from its list-typed local.
pub const REST_SUFFIX: &str = "__rest";
const SCOPE_VAR_PREFIX: &str = "scope__";
const SCOPE_CLASS_PREFIX: &str = "Scope__";
const IGNORED_PREFIX: &str = "ignored__";
/// Bounded retries for synthetic name disambiguation.
const MAX_NAME_RETRIES: u32 = 100;

/// A final, output-legal identifier, with an optional back-reference to the
/// binding it names (diagnostics only).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutName {
    pub text: String,
    pub source: Option<BindingId>,
}

impl OutName {
    /// A name already known to be safe, with no source binding.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    /// The stable form shared by every occurrence of a logical name:
    /// sanitized source text, no disambiguation. Used where the output
    /// language's own scoping already guarantees uniqueness.
    pub fn simple(name: &ir::ResolvedName) -> Self {
        Self {
            text: safe_identifier(&name.text),
            source: Some(name.id),
        }
    }

    /// The disambiguated form: sanitized text plus the binding id, so
    /// shadowed source names never collide in output.
    pub fn distinct(name: &ir::ResolvedName) -> Self {
        Self {
            text: safe_identifier(&format!("{}_{}", name.text, name.id.0)),
            source: Some(name.id),
        }
    }

    pub fn with_suffix(&self, suffix: &str) -> OutName {
        Self {
            text: format!("{}{}", self.text, suffix),
            source: self.source,
        }
    }

    pub fn ident(&self) -> Ident {
        Ident::new(self.clone())
    }
}

/// Output naming facts for one module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    pub module: ModuleId,
    pub package: QualifiedName,
    pub globals_class: String,
    pub entry_class: String,
    pub test_class: String,
}

/// Given a module at path `foo/bar-qux`, classes are `BarQuxGlobal`,
/// `BarQuxMain`, `BarQuxTest` in package `foo.bar_qux`.
const MODULE_GLOBAL_SUFFIX: &str = "Global";
const MODULE_ENTRY_SUFFIX: &str = "Main";
const MODULE_TEST_SUFFIX: &str = "Test";

impl ModuleInfo {
    pub fn from_module(module: &ir::Module) -> Self {
        let segments: Vec<&str> = module.name.split('/').filter(|s| !s.is_empty()).collect();
        let base = segments
            .last()
            .map(|s| segment_to_pascal(s))
            .unwrap_or_else(|| "AdHoc".to_string());
        Self {
            module: module.id,
            package: QualifiedName::safe(&segments),
            globals_class: format!("{base}{MODULE_GLOBAL_SUFFIX}"),
            entry_class: format!("{base}{MODULE_ENTRY_SUFFIX}"),
            test_class: format!("{base}{MODULE_TEST_SUFFIX}"),
        }
    }

    /// The static container class for the given dependency category.
    pub fn qualified_class_name(&self, category: Category) -> QualifiedName {
        let class = match category {
            Category::Production => &self.globals_class,
            Category::Test => &self.test_class,
        };
        self.package.qualify(class.clone())
    }

    /// Synthesized functional interfaces land in this subpackage.
    pub fn sam_package(&self) -> QualifiedName {
        self.package.qualify("function")
    }
}

/// The per-unit name registry. See the module docs.
pub struct JavaNames<'ir> {
    usage: &'ir UsageIndex,
    modules: FxHashMap<ModuleId, ModuleInfo>,
    current: ModuleId,
    sams: FxHashMap<ir::Signature, Sam>,
    sam_names: FxHashSet<String>,
    locals: FxHashMap<BindingId, LocalName>,
    scope_counter: u32,
    ignored_counter: u32,
}

impl<'ir> JavaNames<'ir> {
    pub fn new(usage: &'ir UsageIndex, set: &ir::ModuleSet) -> Self {
        let modules: FxHashMap<ModuleId, ModuleInfo> = set
            .modules
            .iter()
            .map(|m| (m.id, ModuleInfo::from_module(m)))
            .collect();
        let current = set.modules.first().map(|m| m.id).unwrap_or(ModuleId(0));
        Self {
            usage,
            modules,
            current,
            sams: FxHashMap::default(),
            sam_names: FxHashSet::default(),
            locals: FxHashMap::default(),
            scope_counter: 1,
            ignored_counter: 1,
        }
    }

    /// Switch the registry to a module before lowering it. Scope and
    /// ignored-name counters restart per module; the SAM and classification
    /// tables persist for the unit.
    pub fn enter_module(&mut self, module: ModuleId) {
        self.current = module;
        self.scope_counter = 1;
        self.ignored_counter = 1;
    }

    pub fn usage(&self) -> &'ir UsageIndex {
        self.usage
    }

    pub fn current_module(&self) -> &ModuleInfo {
        self.modules
            .get(&self.current)
            .expect("current module is always registered")
    }

    pub fn module_info(&self, module: ModuleId) -> Option<&ModuleInfo> {
        self.modules.get(&module)
    }

    fn info_for_decl(&self, decl: Option<&DeclSite>) -> &ModuleInfo {
        decl.and_then(|d| self.modules.get(&d.module))
            .unwrap_or_else(|| self.current_module())
    }

    fn resolve(&self, name: &ir::ResolvedName) -> ir::ResolvedName {
        let resolved = self.usage.resolve_import(name.id);
        if resolved == name.id {
            name.clone()
        } else {
            self.usage.resolved(resolved).unwrap_or_else(|| name.clone())
        }
    }

    /// Qualified container class plus member name for a module-level
    /// binding (field or function), following imports to the declaring
    /// module. Exported names are already unique within their module and
    /// keep their clean text; unexported ones stay disambiguated.
    pub fn module_member(&self, name: &ir::ResolvedName) -> (QualifiedName, OutName) {
        let resolved = self.resolve(name);
        let decl = self.usage.decl_of(resolved.id);
        let info = self.info_for_decl(decl);
        let category = decl.map(|d| d.category).unwrap_or(Category::Production);
        let member = if decl.is_some_and(|d| d.exported) {
            OutName::simple(&resolved)
        } else {
            OutName::distinct(&resolved)
        };
        (info.qualified_class_name(category), member)
    }

    /// Member name used in a method declaration or invocation.
    pub fn method_name(&self, name: &ir::DotName) -> OutName {
        OutName::fixed(safe_identifier(name.text()))
    }

    /// Backing field name for an instance property.
    pub fn field_name(&self, name: &ir::ResolvedName) -> OutName {
        OutName::simple(name)
    }

    /// Field name for a property addressed by member name.
    pub fn static_field(&self, name: &ir::DotName) -> OutName {
        OutName::fixed(safe_identifier(name.text()))
    }

    /// Name for a declared type.
    pub fn type_decl_name(&self, name: &ir::ResolvedName) -> OutName {
        OutName::simple(name)
    }

    /// Name for a type formal.
    pub fn type_formal(&self, name: &ir::ResolvedName) -> OutName {
        OutName::distinct(name)
    }

    /// Renamed private helper behind a boxed-signature bridge.
    pub fn private_helper(&self, name: &ir::ResolvedName) -> OutName {
        OutName::distinct(name)
    }

    pub fn label(&self, name: &ir::ResolvedName) -> OutName {
        OutName::distinct(name)
    }

    /// Formal parameter name; regular locals keep their distinct name.
    pub fn formal(&mut self, name: &ir::ResolvedName) -> Ident {
        self.lookup_regular_local(name).ident()
    }

    /// Temporary formal name for a varargs parameter.
    pub fn rest_formal(&mut self, name: &ir::ResolvedName) -> Ident {
        self.lookup_regular_local(name).with_suffix(REST_SUFFIX).ident()
    }

    /// Fully qualified output name of a user-declared or builtin type.
    pub fn class_type_name(&self, nominal: &ir::NominalType) -> QualifiedName {
        if let Some(known) = builtin_nominal(&nominal.name) {
            return known.clone();
        }
        let info = nominal
            .module
            .and_then(|m| self.modules.get(&m))
            .unwrap_or_else(|| self.current_module());
        info.package.qualify(safe_identifier(&nominal.name))
    }

    /// Java standard getter name. Names already starting with `is`/`get`
    /// pass through unchanged; that exact behavior is a compatibility
    /// contract, preserved as observed.
    pub fn getter_name(&self, name: &ir::DotName, return_type: &ir::Type) -> Ident {
        let text = name.text();
        let cap = if text.starts_with("is") || text.starts_with("get") {
            text.to_string()
        } else if return_type.is_boolean_like() {
            format!("is{}", to_pascal(text))
        } else {
            format!("get{}", to_pascal(text))
        };
        Ident::new(OutName::fixed(safe_identifier(&cap)))
    }

    /// Java standard setter name.
    pub fn setter_name(&self, name: &ir::DotName) -> Ident {
        Ident::new(OutName::fixed(safe_identifier(&format!(
            "set{}",
            to_pascal(name.text())
        ))))
    }

    /// Fresh scope variable and class names for a lifted-binding carrier.
    pub fn new_scope_decl(&mut self) -> (OutName, OutName) {
        let n = self.scope_counter;
        self.scope_counter += 1;
        (
            OutName::fixed(format!("{SCOPE_VAR_PREFIX}{n}")),
            OutName::fixed(format!("{SCOPE_CLASS_PREFIX}{n}")),
        )
    }

    /// Fresh identifier for a parameter whose value is never read.
    pub fn ignored_ident(&mut self) -> Ident {
        let n = self.ignored_counter;
        self.ignored_counter += 1;
        Ident::new(OutName::fixed(format!("{IGNORED_PREFIX}{n}")))
    }

    // Local binding classification.

    /// Classify a binding found in local scope, computing and caching its
    /// lowering strategy on first sight. Returns `None` for names that are
    /// not variable-like (types, methods, unresolved imports).
    pub fn lookup_local(&mut self, name: &ir::ResolvedName) -> Option<LocalName> {
        let resolved = self.resolve(name);
        if let Some(cached) = self.locals.get(&resolved.id) {
            return Some(cached.clone());
        }
        let decl = *self.usage.decl_of(resolved.id)?;
        let classified = match decl.kind {
            DeclKind::ModuleFunction | DeclKind::ModuleLevel | DeclKind::Test => {
                let (class, member) = self.module_member(&resolved);
                Some(LocalName::ModuleLevel {
                    qualified: class.qualify(member.text),
                })
            }
            DeclKind::Formal { .. } | DeclKind::RestFormal | DeclKind::LocalVar { .. } => {
                Some(LocalName::RegularVar {
                    name: OutName::distinct(&resolved),
                    mutably_captured: self.is_mutably_captured(resolved.id, decl),
                })
            }
            DeclKind::LocalFunction => Some(LocalName::SimpleFunction {
                name: OutName::distinct(&resolved),
                recursive: self.is_recursive_fn(resolved.id, decl),
            }),
            DeclKind::Type | DeclKind::Method | DeclKind::Import(_) => None,
        };
        if let Some(classified) = &classified {
            self.locals.insert(resolved.id, classified.clone());
        }
        classified
    }

    /// The plain output name of a binding expected to stay a regular local;
    /// unresolvable names conservatively get a distinct regular name.
    pub fn lookup_regular_local(&mut self, name: &ir::ResolvedName) -> OutName {
        match self.lookup_local(name) {
            Some(LocalName::RegularVar { name, .. }) => name,
            _ => OutName::distinct(&self.resolve(name)),
        }
    }

    /// Classify, falling back for names with no local classification:
    /// module-level members qualify through their container; anything else
    /// degrades to a regular, unlifted local.
    pub fn lookup_local_or_external(&mut self, name: &ir::ResolvedName) -> LocalName {
        if let Some(found) = self.lookup_local(name) {
            return found;
        }
        let resolved = self.resolve(name);
        LocalName::RegularVar {
            name: OutName::distinct(&resolved),
            mutably_captured: false,
        }
    }

    /// A binding is mutably captured iff it is assigned more than once
    /// (counting an assignment in a loop at least twice, and a parameter's
    /// implicit binding as one) and read from some other function body —
    /// directly, or through the initializer of another captured local.
    fn is_mutably_captured(&self, id: BindingId, decl: DeclSite) -> bool {
        let mut assigns: u32 = match decl.kind {
            DeclKind::Formal { .. } | DeclKind::RestFormal => 1,
            DeclKind::LocalVar { has_init, .. } => has_init as u32,
            _ => return false,
        };
        let decl_body: BodyId = match decl.containing_body {
            Some(body) => body,
            None => return false,
        };
        let mut captures = 0u32;
        for site in self.usage.uses_of(id) {
            if site.body != decl_body {
                captures += 1;
            }
            if site.is_assign {
                assigns += 1;
                if site.in_loop {
                    // Assignment in a loop is multiple assignment.
                    assigns += 1;
                }
            } else if let Some(receiver) = site.receiving_local {
                // If initialized *into* a var, that init could later move
                // into a scope constructor, capturing this binding.
                if let Some(receiver_decl) = self.usage.decl_of(receiver) {
                    if self.is_mutably_captured(receiver, *receiver_decl) {
                        captures += 1;
                    }
                }
            }
        }
        assigns > 1 && captures > 0
    }

    /// A local function is recursive iff it is referenced from anywhere
    /// outside the body its declaration sits in; that covers both self- and
    /// mutual recursion in one test.
    fn is_recursive_fn(&self, id: BindingId, decl: DeclSite) -> bool {
        let decl_body = match decl.containing_body {
            Some(body) => body,
            None => return false,
        };
        self.usage
            .uses_of(id)
            .iter()
            .any(|site| site.body != decl_body)
    }

    /// Refine a binding's classification after lifting it into a scope.
    /// Asking to lift a binding that was never classified indicates a
    /// classifier/synthesis desynchronization and is fatal.
    pub fn lift_local(
        &mut self,
        name: &ir::ResolvedName,
        scope: &OutName,
        lift: NameLift,
    ) -> LowerResult<LocalName> {
        let resolved = self.resolve(name);
        let old = match self.locals.get(&resolved.id) {
            Some(old) => old.clone(),
            None => {
                return Err(LowerError::UnclassifiedLift {
                    binding: resolved.to_string(),
                })
            }
        };
        if old.lift_kind() == lift {
            return Ok(old);
        }
        match old.lift(lift, scope) {
            Some(lifted) => {
                self.locals.insert(resolved.id, lifted.clone());
                Ok(lifted)
            }
            None => Err(LowerError::UnclassifiedLift {
                binding: resolved.to_string(),
            }),
        }
    }

    // SAM registry.

    /// The SAM interface for a function signature, memoized for the unit.
    pub fn sam_type(&mut self, sig: &ir::Signature) -> LowerResult<Sam> {
        if let Some(sam) = self.sams.get(sig) {
            return Ok(sam.clone());
        }
        let sam = match Sam::standard(sig) {
            Some(standard) => standard,
            None => {
                let name = self.synthetic_sam_name(sig)?;
                Sam::synthetic(name, sig, &self.current_module().sam_package())
            }
        };
        self.sams.insert(sig.clone(), sam.clone());
        Ok(sam)
    }

    fn synthetic_sam_name(&mut self, sig: &ir::Signature) -> LowerResult<String> {
        let base = safe_identifier(&suggest_sam_name(sig));
        if self.sam_names.insert(base.clone()) {
            return Ok(base);
        }
        for n in 1..MAX_NAME_RETRIES {
            let candidate = format!("{base}{n}");
            if self.sam_names.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(LowerError::NameExhausted { base })
    }

    /// The synthesized SAM interfaces belonging to the current module, in a
    /// stable order for deterministic output.
    pub fn sam_types_for_current_module(&self) -> Vec<(ir::Signature, Sam)> {
        let sam_package = self.current_module().sam_package();
        let mut sams: Vec<(ir::Signature, Sam)> = self
            .sams
            .iter()
            .filter(|(_, sam)| {
                sam.synthetic && {
                    let (lead, _) = sam.class_name.split();
                    lead == sam_package
                }
            })
            .map(|(sig, sam)| (sig.clone(), sam.clone()))
            .collect();
        sams.sort_by(|a, b| a.1.class_name.cmp(&b.1.class_name));
        sams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_ir::{Module, ModuleSet, ResolvedName, Type};

    fn empty_module(name: &str) -> ModuleSet {
        ModuleSet::single(Module {
            id: ModuleId(0),
            name: name.to_string(),
            is_std_lib: false,
            body_id: veld_ir::BodyId(0),
            imports: vec![],
            top_levels: vec![],
            result: None,
        })
    }

    #[test]
    fn out_names_are_stable_and_distinct() {
        let a = ResolvedName::new(7, "x");
        let b = ResolvedName::new(8, "x");
        assert_eq!(OutName::simple(&a).text, "x");
        assert_eq!(OutName::distinct(&a).text, "x_7");
        assert_eq!(OutName::distinct(&b).text, "x_8");
        assert_eq!(OutName::distinct(&a), OutName::distinct(&a));
    }

    #[test]
    fn module_info_names_follow_path() {
        let set = empty_module("demo/hello-world");
        let info = ModuleInfo::from_module(&set.modules[0]);
        assert_eq!(info.package.fully_qualified(), "demo.hello_world");
        assert_eq!(info.globals_class, "HelloWorldGlobal");
        assert_eq!(info.entry_class, "HelloWorldMain");
        assert_eq!(info.test_class, "HelloWorldTest");
        assert_eq!(
            info.sam_package().fully_qualified(),
            "demo.hello_world.function"
        );
    }

    #[test]
    fn getter_names_follow_beans_convention() {
        let set = empty_module("m");
        let usage = UsageIndex::scan(&set);
        let names = JavaNames::new(&usage, &set);
        let get = |text: &str, ty: &Type| {
            names
                .getter_name(&ir::DotName::new(text), ty)
                .text()
                .to_string()
        };
        assert_eq!(get("size", &Type::Int), "getSize");
        assert_eq!(get("empty", &Type::Boolean), "isEmpty");
        assert_eq!(get("empty", &Type::Boolean.nullable()), "isEmpty");
        // Pass-through compatibility rule.
        assert_eq!(get("isOpen", &Type::Boolean), "isOpen");
        assert_eq!(get("getter", &Type::Int), "getter");
        assert_eq!(names.setter_name(&ir::DotName::new("size")).text(), "setSize");
    }

    #[test]
    fn scope_names_count_up_and_reset_per_module() {
        let set = empty_module("m");
        let usage = UsageIndex::scan(&set);
        let mut names = JavaNames::new(&usage, &set);
        let (var1, class1) = names.new_scope_decl();
        let (var2, _) = names.new_scope_decl();
        assert_eq!(var1.text, "scope__1");
        assert_eq!(class1.text, "Scope__1");
        assert_eq!(var2.text, "scope__2");
        names.enter_module(ModuleId(0));
        assert_eq!(names.new_scope_decl().0.text, "scope__1");
    }

    #[test]
    fn classification_is_monotonic_and_lifting_unknowns_is_fatal() {
        use crate::local::{LocalName, NameLift};
        use veld_ir::{
            Block, Expression, LocalDecl, LocalFunctionDecl, Reference, Statement, TopLevel,
            Value,
        };

        let x = ResolvedName::new(1, "x");
        let g = ResolvedName::new(2, "g");
        let set = ModuleSet::single(Module {
            id: ModuleId(0),
            name: "m".into(),
            is_std_lib: false,
            body_id: veld_ir::BodyId(0),
            imports: vec![],
            top_levels: vec![TopLevel::Init(Block::new(vec![
                Statement::LocalDecl(LocalDecl {
                    name: x.clone(),
                    ty: Type::Int,
                    init: Some(Expression::Value(Value::Int(0))),
                    assign_once: false,
                }),
                Statement::Assign(veld_ir::Assign {
                    target: x.clone(),
                    value: Expression::Value(Value::Int(1)),
                }),
                Statement::LocalFunction(LocalFunctionDecl {
                    name: g.clone(),
                    sig: ir::Signature::new(vec![], Type::Int),
                    func: veld_ir::Function {
                        body_id: veld_ir::BodyId(1),
                        type_params: vec![],
                        params: veld_ir::Parameters::default(),
                        return_type: Type::Int,
                        body: Some(Block::new(vec![Statement::Return(Some(
                            Expression::Reference(Reference {
                                name: x.clone(),
                                ty: Type::Int,
                            }),
                        ))])),
                    },
                }),
            ]))],
            result: None,
        });
        let usage = UsageIndex::scan(&set);
        let mut names = JavaNames::new(&usage, &set);

        let before = names.lookup_local(&x).unwrap();
        assert!(before.is_mutably_captured());
        assert_eq!(before.lift_kind(), NameLift::RegularVar);

        let scope = OutName::fixed("scope__1");
        let lifted = names
            .lift_local(&x, &scope, NameLift::CapturedMutableVar)
            .unwrap();
        assert!(matches!(lifted, LocalName::CapturedMutableVar { .. }));

        // Once lifted, the binding never reports a non-lifted kind again.
        let after = names.lookup_local(&x).unwrap();
        assert_eq!(after.lift_kind(), NameLift::CapturedMutableVar);
        // Re-lifting to the same kind is a no-op, not an error.
        assert!(names
            .lift_local(&x, &scope, NameLift::CapturedMutableVar)
            .is_ok());

        // Lifting a binding with no recorded classification is a
        // classifier/synthesis desynchronization.
        let stranger = ResolvedName::new(99, "stranger");
        assert!(matches!(
            names.lift_local(&stranger, &scope, NameLift::CapturedMutableVar),
            Err(LowerError::UnclassifiedLift { .. })
        ));
    }

    #[test]
    fn synthetic_sam_names_disambiguate() {
        let set = empty_module("m");
        let usage = UsageIndex::scan(&set);
        let mut names = JavaNames::new(&usage, &set);
        let sig_a = ir::Signature::new(
            vec![ir::SigParam {
                ty: Type::Str,
                optional: true,
            }],
            Type::Void,
        );
        // Same shape, different identity: forces a fresh synthetic name.
        let mut sig_b = sig_a.clone();
        sig_b.ret = Type::Never;
        let a = names.sam_type(&sig_a).unwrap();
        let b = names.sam_type(&sig_b).unwrap();
        assert!(a.synthetic && b.synthetic);
        assert_eq!(a.class_name.last_part(), "StringProcedure");
        assert_eq!(b.class_name.last_part(), "StringProcedure1");
        // Memoized: same signature returns the same interface.
        assert_eq!(names.sam_type(&sig_a).unwrap(), a);
    }
}
