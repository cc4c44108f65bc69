// src/scope.rs
//
// The output-side hierarchy: source files, nested namespace scopes, and the
// declarations they own. Scopes form a forest rooted at source-file scopes;
// children and declaration lists are append-only during traversal.

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use crate::entity::{EmitValue, TargetValue};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SourceFileId(u32);

impl SourceFileId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct DeclId(u32);

impl DeclId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Root-to-scope paths are short; keep them inline.
pub type ScopeChain = SmallVec<[ScopeId; 8]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    SourceFile(SourceFileId),
    Namespace,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Owned declarations, in dispatcher-completion order.
    pub declarations: Vec<DeclId>,
}

impl Scope {
    pub fn is_source_file(&self) -> bool {
        matches!(self.kind, ScopeKind::SourceFile(_))
    }
}

#[derive(Debug)]
pub struct SourceFile {
    pub path: String,
    pub global_scope: ScopeId,
    /// Import path -> ordered set of imported names.
    pub imports: IndexMap<String, IndexSet<String>>,
}

/// A named artifact routed into a scope. The value may arrive through a
/// placeholder; nothing else about a declaration changes after creation.
#[derive(Debug)]
pub struct Declaration<V> {
    pub name: String,
    pub scope: ScopeId,
    pub value: EmitValue<V>,
}

/// Split of two scope chains at their first divergence.
#[derive(Debug)]
pub struct ScopeDiff {
    /// Divergent part of the current chain, deepest scope first.
    pub path_up: ScopeChain,
    /// Divergent part of the target chain, shallowest scope first.
    pub path_down: ScopeChain,
    /// Deepest scope shared by both chains, if any.
    pub common: Option<ScopeId>,
}

/// Arena owning scopes, source files, and declarations for one emitter run.
pub struct ScopeArena<V> {
    scopes: Vec<Scope>,
    files: Vec<SourceFile>,
    decls: Vec<Declaration<V>>,
}

impl<V: TargetValue> Default for ScopeArena<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: TargetValue> ScopeArena<V> {
    pub fn new() -> Self {
        ScopeArena {
            scopes: Vec::new(),
            files: Vec::new(),
            decls: Vec::new(),
        }
    }

    pub fn create_source_file(&mut self, path: &str) -> SourceFileId {
        let file_id = SourceFileId(self.files.len() as u32);
        let scope_id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind: ScopeKind::SourceFile(file_id),
            name: path.to_string(),
            parent: None,
            children: Vec::new(),
            declarations: Vec::new(),
        });
        self.files.push(SourceFile {
            path: path.to_string(),
            global_scope: scope_id,
            imports: IndexMap::new(),
        });
        file_id
    }

    pub fn create_scope(&mut self, name: &str, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind: ScopeKind::Namespace,
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            declarations: Vec::new(),
        });
        self.scopes[parent.0 as usize].children.push(id);
        id
    }

    /// Allocate a declaration. It joins its scope's list only when the
    /// dispatcher completes the owning operation (`attach`).
    pub fn add_declaration(&mut self, name: &str, scope: ScopeId, value: EmitValue<V>) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Declaration {
            name: name.to_string(),
            scope,
            value,
        });
        id
    }

    pub fn attach(&mut self, decl: DeclId) {
        let scope = self.decls[decl.0 as usize].scope;
        self.scopes[scope.0 as usize].declarations.push(decl);
    }

    pub fn add_import(&mut self, file: SourceFileId, path: &str, name: &str) {
        self.files[file.0 as usize]
            .imports
            .entry(path.to_string())
            .or_default()
            .insert(name.to_string());
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn file(&self, id: SourceFileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn decl(&self, id: DeclId) -> &Declaration<V> {
        &self.decls[id.0 as usize]
    }

    /// Path from the root source-file scope down to `scope`.
    pub fn chain(&self, scope: ScopeId) -> ScopeChain {
        let mut chain = ScopeChain::new();
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            chain.push(id);
            cursor = self.scope(id).parent;
        }
        chain.reverse();
        chain
    }

    /// Scope diff between the current scope and a reference target's scope.
    /// With no current scope the whole target chain is the way down.
    pub fn resolve_relative(&self, current: Option<ScopeId>, target: ScopeId) -> ScopeDiff {
        let target_chain = self.chain(target);
        let current_chain = match current {
            Some(scope) => self.chain(scope),
            None => ScopeChain::new(),
        };

        let mut shared = 0;
        while shared < current_chain.len()
            && shared < target_chain.len()
            && current_chain[shared] == target_chain[shared]
        {
            shared += 1;
        }

        let mut path_up: ScopeChain = current_chain[shared..].iter().copied().collect();
        path_up.reverse();
        let path_down: ScopeChain = target_chain[shared..].iter().copied().collect();
        let common = shared.checked_sub(1).map(|i| current_chain[i]);

        ScopeDiff {
            path_up,
            path_down,
            common,
        }
    }
}
