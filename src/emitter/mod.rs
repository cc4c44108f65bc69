// src/emitter/mod.rs
//
// The asset emitter: all state needed while driving a user emitter over the
// type graph. Methods are split across multiple files using split impl
// blocks:
// - context_stack.rs: the lexical/reference context fold
// - dispatch.rs: invoke(), memoization, circular markers, completion
// - reference.rs: emit_type_reference() and waiter resolution
// - walk.rs: emit_program() and the per-kind emit helpers
// - output.rs: write_output()

mod context_stack;
mod dispatch;
mod output;
mod reference;
mod type_emitter;
mod walk;

pub use output::EmittedSourceFile;
pub use type_emitter::TypeEmitter;

use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::context::{ContextArena, ContextMap, ContextMapId, ContextStateId};
use crate::entity::{EmitEntity, EmitValue, EmitterOutput, MemoKey, TargetValue};
use crate::errors::{EmitResult, EmitterError};
use crate::graph::{Program, TypeId};
use crate::placeholder::Placeholder;
use crate::scope::{Declaration, DeclId, Scope, ScopeArena, ScopeId, SourceFile, SourceFileId};

/// Entry point: wraps the program and vends asset emitters over it.
pub struct EmitterContext {
    program: Rc<Program>,
}

impl EmitterContext {
    pub fn new(program: Program) -> Self {
        EmitterContext {
            program: Rc::new(program),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn create_asset_emitter<V: TargetValue>(&self) -> AssetEmitter<V> {
        AssetEmitter::new(Rc::clone(&self.program))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmitProgramOptions {
    /// Emit the global namespace as a single `namespace` operation instead
    /// of walking its children.
    pub emit_global_namespace: bool,
    /// Also walk standard-library namespaces.
    pub emit_lib_namespace: bool,
}

pub(crate) type LexicalStack = SmallVec<[TypeId; 8]>;

/// Context state plus the lexical enclosure stack it was folded from.
#[derive(Clone)]
pub(crate) struct Frame {
    pub state: ContextStateId,
    pub stack: LexicalStack,
}

/// Reference context captured at an `emit_type_reference` call, merged into
/// the fold at the enclosure entry equal to the target.
pub(crate) struct IncomingRef {
    pub target: TypeId,
    pub reference: ContextMapId,
}

/// A reference that hit a circular marker: resolve it in the captured frame
/// once the target entity completes.
pub(crate) struct RefWaiter<V> {
    pub frame: Frame,
    pub placeholder: Placeholder<V>,
}

pub struct AssetEmitter<V: TargetValue> {
    program: Rc<Program>,
    pub(crate) contexts: ContextArena,
    pub(crate) scopes: ScopeArena<V>,
    pub(crate) memo: FxHashMap<MemoKey, EmitEntity<V>>,
    pub(crate) waiters: FxHashMap<MemoKey, Vec<RefWaiter<V>>>,
    pub(crate) known_contexts:
        FxHashMap<(TypeId, ContextStateId, Option<ContextMapId>), ContextStateId>,
    /// Operations deferred behind a bare placeholder; completed at dispatch
    /// boundaries once the placeholder resolves.
    pub(crate) pending: Vec<(MemoKey, Placeholder<V>)>,
    pub(crate) frame: Frame,
    pub(crate) program_state: Option<ContextStateId>,
    pub(crate) incoming_ref: Option<IncomingRef>,
}

impl<V: TargetValue> AssetEmitter<V> {
    pub fn new(program: Rc<Program>) -> Self {
        AssetEmitter {
            program,
            contexts: ContextArena::new(),
            scopes: ScopeArena::new(),
            memo: FxHashMap::default(),
            waiters: FxHashMap::default(),
            known_contexts: FxHashMap::default(),
            pending: Vec::new(),
            frame: Frame {
                state: ContextArena::EMPTY_STATE,
                stack: LexicalStack::new(),
            },
            program_state: None,
            incoming_ref: None,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_handle(&self) -> Rc<Program> {
        Rc::clone(&self.program)
    }

    /// The merged context visible to the running operation: lexical with the
    /// reference half overlaid.
    pub fn get_context(&self) -> ContextMap {
        self.contexts.merged_view(self.frame.state)
    }

    pub fn lexical_context(&self) -> &ContextMap {
        let state = self.contexts.state(self.frame.state);
        self.contexts.map(state.lexical)
    }

    pub fn reference_context(&self) -> &ContextMap {
        let state = self.contexts.state(self.frame.state);
        self.contexts.map(state.reference)
    }

    /// `reference.scope ?? lexical.scope ?? None`. The framework never
    /// synthesises a scope.
    pub fn current_scope(&self) -> Option<ScopeId> {
        self.contexts.scope_of(self.frame.state)
    }

    pub fn create_source_file(&mut self, path: &str) -> SourceFileId {
        tracing::trace!(path, "create source file");
        self.scopes.create_source_file(path)
    }

    pub fn create_scope(&mut self, name: &str, parent: ScopeId) -> ScopeId {
        self.scopes.create_scope(name, parent)
    }

    pub fn add_import(&mut self, file: SourceFileId, path: &str, name: &str) {
        self.scopes.add_import(file, path, name);
    }

    pub fn source_file(&self, id: SourceFileId) -> &SourceFile {
        self.scopes.file(id)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        self.scopes.scope(id)
    }

    pub fn declaration(&self, id: DeclId) -> &Declaration<V> {
        self.scopes.decl(id)
    }

    /// A named declaration routed into the current scope. Fails when no
    /// scope has been set in context.
    pub fn result_declaration(
        &mut self,
        name: &str,
        value: impl Into<EmitValue<V>>,
    ) -> EmitResult<EmitterOutput<V>> {
        let scope = self.current_scope().ok_or_else(|| EmitterError::ScopeAbsent {
            name: name.to_string(),
        })?;
        let decl = self.scopes.add_declaration(name, scope, value.into());
        Ok(EmitterOutput::Entity(EmitEntity::Declaration(decl)))
    }

    pub fn result_raw_code(&self, value: impl Into<EmitValue<V>>) -> EmitterOutput<V> {
        EmitterOutput::Entity(EmitEntity::RawCode(value.into()))
    }

    pub fn result_none(&self) -> EmitterOutput<V> {
        EmitterOutput::Entity(EmitEntity::NoEmit)
    }
}
