// src/context.rs
//
// Interned context state.
//
// Emitter operations observe a pair of string-keyed maps (lexical and
// reference). Both maps and the pair itself are interned so that an id
// equality check is a deep equality check; the dispatcher's memo key leans
// on this.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::scope::ScopeId;

/// Context key under which user emitters store the current scope.
pub const SCOPE_KEY: &str = "scope";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Scope(ScopeId),
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Int(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Str(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Str(value)
    }
}

impl From<ScopeId> for ContextValue {
    fn from(value: ScopeId) -> Self {
        ContextValue::Scope(value)
    }
}

impl ContextValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ContextValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_scope(&self) -> Option<ScopeId> {
        match self {
            ContextValue::Scope(s) => Some(*s),
            _ => None,
        }
    }
}

/// Ordered map so that equal contents always hash equally.
pub type ContextMap = BTreeMap<String, ContextValue>;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ContextMapId(u32);

impl ContextMapId {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ContextStateId(u32);

impl ContextStateId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// One interned lexical/reference pair.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ContextState {
    pub lexical: ContextMapId,
    pub reference: ContextMapId,
}

/// Canonicalising store for context maps and states. The empty map and the
/// empty state are pre-interned at index 0 as shared sentinels.
pub struct ContextArena {
    maps: Vec<ContextMap>,
    map_ids: FxHashMap<ContextMap, ContextMapId>,
    states: Vec<ContextState>,
    state_ids: FxHashMap<ContextState, ContextStateId>,
}

impl Default for ContextArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextArena {
    pub const EMPTY_MAP: ContextMapId = ContextMapId(0);
    pub const EMPTY_STATE: ContextStateId = ContextStateId(0);

    pub fn new() -> Self {
        let mut arena = ContextArena {
            maps: Vec::new(),
            map_ids: FxHashMap::default(),
            states: Vec::new(),
            state_ids: FxHashMap::default(),
        };
        let empty = arena.intern_map(ContextMap::new());
        debug_assert_eq!(empty, Self::EMPTY_MAP);
        let state = arena.intern_state(empty, empty);
        debug_assert_eq!(state, Self::EMPTY_STATE);
        arena
    }

    /// Intern a map, returning the existing id if an equal map is known.
    pub fn intern_map(&mut self, map: ContextMap) -> ContextMapId {
        if map.is_empty() && !self.maps.is_empty() {
            return Self::EMPTY_MAP;
        }
        let next_id = ContextMapId(self.maps.len() as u32);
        *self.map_ids.entry(map.clone()).or_insert_with(|| {
            self.maps.push(map);
            next_id
        })
    }

    pub fn intern_state(&mut self, lexical: ContextMapId, reference: ContextMapId) -> ContextStateId {
        let state = ContextState { lexical, reference };
        let next_id = ContextStateId(self.states.len() as u32);
        *self.state_ids.entry(state).or_insert_with(|| {
            self.states.push(state);
            next_id
        })
    }

    pub fn map(&self, id: ContextMapId) -> &ContextMap {
        &self.maps[id.0 as usize]
    }

    pub fn state(&self, id: ContextStateId) -> ContextState {
        self.states[id.0 as usize]
    }

    /// Right-biased merge of `overlay` into the map behind `base`.
    pub fn merge_maps(&mut self, base: ContextMapId, overlay: &ContextMap) -> ContextMapId {
        if overlay.is_empty() {
            return base;
        }
        let mut merged = self.map(base).clone();
        for (key, value) in overlay {
            merged.insert(key.clone(), value.clone());
        }
        self.intern_map(merged)
    }

    /// The scope exposed to user operations: reference wins over lexical.
    pub fn scope_of(&self, id: ContextStateId) -> Option<ScopeId> {
        let state = self.state(id);
        self.map(state.reference)
            .get(SCOPE_KEY)
            .or_else(|| self.map(state.lexical).get(SCOPE_KEY))
            .and_then(ContextValue::as_scope)
    }

    /// Lexical map with the reference map overlaid, as one owned map.
    pub fn merged_view(&self, id: ContextStateId) -> ContextMap {
        let state = self.state(id);
        let mut view = self.map(state.lexical).clone();
        for (key, value) in self.map(state.reference) {
            view.insert(key.clone(), value.clone());
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, ContextValue)]) -> ContextMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn interning_deduplicates_maps() {
        let mut arena = ContextArena::new();
        let a = arena.intern_map(map(&[("inA", true.into())]));
        let b = arena.intern_map(map(&[("inA", true.into())]));
        let c = arena.intern_map(map(&[("inA", false.into())]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_map_is_the_sentinel() {
        let mut arena = ContextArena::new();
        assert_eq!(arena.intern_map(ContextMap::new()), ContextArena::EMPTY_MAP);
    }

    #[test]
    fn states_compare_by_id() {
        let mut arena = ContextArena::new();
        let lex = arena.intern_map(map(&[("depth", 1i64.into())]));
        let s1 = arena.intern_state(lex, ContextArena::EMPTY_MAP);
        let s2 = arena.intern_state(lex, ContextArena::EMPTY_MAP);
        let s3 = arena.intern_state(ContextArena::EMPTY_MAP, lex);
        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
    }

    #[test]
    fn merge_is_right_biased() {
        let mut arena = ContextArena::new();
        let base = arena.intern_map(map(&[("x", 1i64.into()), ("y", 2i64.into())]));
        let merged = arena.merge_maps(base, &map(&[("y", 9i64.into())]));
        assert_eq!(arena.map(merged).get("x"), Some(&ContextValue::Int(1)));
        assert_eq!(arena.map(merged).get("y"), Some(&ContextValue::Int(9)));
    }

    #[test]
    fn merging_empty_overlay_keeps_identity() {
        let mut arena = ContextArena::new();
        let base = arena.intern_map(map(&[("x", 1i64.into())]));
        assert_eq!(arena.merge_maps(base, &ContextMap::new()), base);
    }
}
