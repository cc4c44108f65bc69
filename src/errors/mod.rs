// errors/mod.rs
//! Emitter errors (E4xxx). All fatal: the active context frame is restored
//! before any of these propagate, so a caller that catches one observes
//! consistent emitter state.

use miette::Diagnostic;
use thiserror::Error;

pub type EmitResult<T> = std::result::Result<T, EmitterError>;

#[derive(Error, Debug, Diagnostic)]
pub enum EmitterError {
    #[error("cannot derive an emitter operation for a {kind} node")]
    #[diagnostic(code(E4001))]
    UnsupportedTypeKind { kind: &'static str },

    #[error("declaration '{name}' created with no current scope")]
    #[diagnostic(
        code(E4002),
        help("set `scope` in a lexical or reference context before emitting declarations")
    )]
    ScopeAbsent { name: String },

    #[error("reference to declaration '{name}' was still unresolved when its target completed")]
    #[diagnostic(
        code(E4003),
        help("a `reference` operation must not return an unresolved placeholder")
    )]
    ReferenceCircular { name: String },

    #[error("template instantiation of '{model}' has a non-model template argument")]
    #[diagnostic(code(E4004))]
    InvalidTemplateArgument { model: String },

    #[error("unknown intrinsic scalar '{name}'")]
    #[diagnostic(code(E4005))]
    UnknownIntrinsic { name: String },

    #[error("emitter operation failed: {message}")]
    #[diagnostic(code(E4006))]
    Emit { message: String },

    #[error("failed to write output file '{path}'")]
    #[diagnostic(code(E4007))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl EmitterError {
    /// Escape hatch for user-operation failures that have no dedicated kind.
    pub fn emit(message: impl Into<String>) -> Self {
        EmitterError::Emit {
            message: message.into(),
        }
    }

    /// Raised by target emitters that cannot map an intrinsic scalar name.
    pub fn unknown_intrinsic(name: impl Into<String>) -> Self {
        EmitterError::UnknownIntrinsic { name: name.into() }
    }
}
