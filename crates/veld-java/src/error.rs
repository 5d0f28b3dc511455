//! Lowering errors.
//!
//! Only internal invariant violations surface here; unsupported input
//! constructs degrade to garbage AST nodes instead.

use thiserror::Error;

pub type LowerResult<T> = Result<T, LowerError>;

#[derive(Debug, Error)]
pub enum LowerError {
    #[error("Name disambiguation exhausted for {base}")]
    NameExhausted { base: String },

    #[error("No classification recorded for binding {binding} while lifting")]
    UnclassifiedLift { binding: String },

    #[error("Label cannot attach to a local variable declaration")]
    LabelOnDeclaration,

    #[error("Internal lowering error: {message}")]
    Internal { message: String },
}

impl LowerError {
    pub fn internal(message: impl Into<String>) -> Self {
        LowerError::Internal {
            message: message.into(),
        }
    }
}
