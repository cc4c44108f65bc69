// src/entity.rs
//
// The emit-entity algebra and the target-value abstraction the framework is
// generic over.

use indexmap::IndexMap;

use crate::context::ContextStateId;
use crate::graph::TypeId;
use crate::op_key::OpKey;
use crate::placeholder::Placeholder;
use crate::scope::DeclId;

/// A target-language value the framework can carry around.
///
/// `empty()` fills references whose target produced `NoEmit`; `fragment`
/// lifts a bare piece of source text (the default `reference` rendering);
/// `render` turns the value into file contents for the default source-file
/// renderer.
pub trait TargetValue: Clone + std::fmt::Debug + 'static {
    fn empty() -> Self;
    fn fragment(text: &str) -> Self;
    fn render(&self) -> String;
}

impl TargetValue for String {
    fn empty() -> Self {
        String::new()
    }

    fn fragment(text: &str) -> Self {
        text.to_string()
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl TargetValue for serde_json::Value {
    fn empty() -> Self {
        serde_json::Value::Null
    }

    fn fragment(text: &str) -> Self {
        serde_json::Value::String(text.to_string())
    }

    fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Targets that can assemble keyed/indexed composites (object builders).
pub trait ObjectValue: TargetValue {
    fn object(fields: IndexMap<String, Self>) -> Self;
    fn array(items: Vec<Self>) -> Self;
}

impl ObjectValue for serde_json::Value {
    fn object(fields: IndexMap<String, Self>) -> Self {
        serde_json::Value::Object(fields.into_iter().collect())
    }

    fn array(items: Vec<Self>) -> Self {
        serde_json::Value::Array(items)
    }
}

/// A value that is either known now or arrives through a placeholder.
#[derive(Debug, Clone)]
pub enum EmitValue<V> {
    Concrete(V),
    Pending(Placeholder<V>),
}

impl<V: TargetValue> EmitValue<V> {
    /// The value, reading through a resolved placeholder.
    pub fn resolved(&self) -> Option<V> {
        match self {
            EmitValue::Concrete(v) => Some(v.clone()),
            EmitValue::Pending(ph) => ph.value(),
        }
    }

    /// True only for an unresolved placeholder.
    pub fn is_pending(&self) -> bool {
        match self {
            EmitValue::Concrete(_) => false,
            EmitValue::Pending(ph) => !ph.is_resolved(),
        }
    }
}

impl<V: TargetValue> From<V> for EmitValue<V> {
    fn from(value: V) -> Self {
        EmitValue::Concrete(value)
    }
}

impl<V: TargetValue> From<Placeholder<V>> for EmitValue<V> {
    fn from(placeholder: Placeholder<V>) -> Self {
        EmitValue::Pending(placeholder)
    }
}

impl From<&str> for EmitValue<String> {
    fn from(text: &str) -> Self {
        EmitValue::Concrete(text.to_string())
    }
}

/// Memo key: one user-operation invocation per (operation, type, context).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct MemoKey {
    pub op: OpKey,
    pub ty: TypeId,
    pub state: ContextStateId,
}

/// What an emitter operation produced, as stored by the dispatcher.
#[derive(Debug, Clone)]
pub enum EmitEntity<V> {
    /// A named artifact owned by a scope.
    Declaration(DeclId),
    /// An unnamed emitted fragment.
    RawCode(EmitValue<V>),
    /// The operation produced nothing observable.
    NoEmit,
    /// Sentinel returned while the keyed operation is still in progress.
    Circular(MemoKey),
}

impl<V: TargetValue> EmitEntity<V> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            EmitEntity::Declaration(_) => "declaration",
            EmitEntity::RawCode(_) => "code",
            EmitEntity::NoEmit => "none",
            EmitEntity::Circular(_) => "circular",
        }
    }

    /// The carried value for code-like entities. `NoEmit` reads as the
    /// target's empty value; declarations and circular markers have none.
    pub fn as_value(&self) -> Option<EmitValue<V>> {
        match self {
            EmitEntity::RawCode(value) => Some(value.clone()),
            EmitEntity::NoEmit => Some(EmitValue::Concrete(V::empty())),
            EmitEntity::Declaration(_) | EmitEntity::Circular(_) => None,
        }
    }
}

/// What user operations return to the dispatcher. Bare values are lifted to
/// `RawCode`; a bare placeholder keeps the memo entry circular until the
/// placeholder resolves.
#[derive(Debug)]
pub enum EmitterOutput<V> {
    Entity(EmitEntity<V>),
    Value(V),
    Pending(Placeholder<V>),
}

impl<V> From<EmitEntity<V>> for EmitterOutput<V> {
    fn from(entity: EmitEntity<V>) -> Self {
        EmitterOutput::Entity(entity)
    }
}

impl<V> From<Placeholder<V>> for EmitterOutput<V> {
    fn from(placeholder: Placeholder<V>) -> Self {
        EmitterOutput::Pending(placeholder)
    }
}
