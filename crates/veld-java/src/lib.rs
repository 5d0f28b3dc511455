//! Veld Java backend.
//!
//! Lowers the resolved, typed IR into a Java AST ready for pretty-printing
//! and packaging. The hard parts live in name synthesis ([`names`]), local
//! binding classification ([`local`] + [`names::JavaNames`]), scope
//! synthesis, and the statement/expression lowering in [`translate`].

pub mod adjust;
pub mod ast;
pub mod error;
pub mod grammar;
pub mod local;
pub mod names;
pub mod standard;
pub mod translate;
pub mod types;

pub use error::{LowerError, LowerResult};
pub use names::{JavaNames, OutName};
pub use translate::JavaTranslator;

use veld_ir as ir;

/// Lower every module of a unit in order, sharing one name registry.
pub fn lower_unit(
    usage: &ir::UsageIndex,
    set: &ir::ModuleSet,
) -> LowerResult<Vec<ast::Program>> {
    let mut names = JavaNames::new(usage, set);
    let mut translator = JavaTranslator::new(&mut names);
    let mut programs = Vec::new();
    for module in &set.modules {
        programs.extend(translator.translate(module)?);
    }
    Ok(programs)
}
