//! Quill: an emitter framework over typed program graphs.
//!
//! Given an immutable, referentially-linked type graph, quill dispatches
//! each node to a user-supplied [`TypeEmitter`], threads interned
//! lexical/reference context through the traversal, memoizes emitted
//! artifacts per (operation, type, context), breaks reference cycles with
//! single-assignment placeholders, and routes declarations into a scope
//! graph that is written out as source files.

pub mod builders;
pub mod context;
pub mod emitter;
pub mod entity;
pub mod errors;
pub mod graph;
pub mod host;
pub mod op_key;
pub mod placeholder;
pub mod scope;

pub use builders::{ArrayBuilder, CodePart, ObjectBuilder, StringBuilder};
pub use context::{ContextMap, ContextValue, SCOPE_KEY};
pub use emitter::{
    AssetEmitter, EmitProgramOptions, EmittedSourceFile, EmitterContext, TypeEmitter,
};
pub use entity::{EmitEntity, EmitValue, EmitterOutput, MemoKey, ObjectValue, TargetValue};
pub use errors::{EmitResult, EmitterError};
pub use graph::{Program, TypeId, TypeKind};
pub use host::{EmitterHost, FsHost, MemoryHost};
pub use op_key::OpKey;
pub use placeholder::Placeholder;
pub use scope::{DeclId, Declaration, Scope, ScopeId, SourceFile, SourceFileId};
