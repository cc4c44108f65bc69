// src/builders.rs
//
// Builders that assemble target values out of a mix of concrete and
// deferred parts. Each builder's `reduce` publishes a concrete value when
// nothing is pending, otherwise a placeholder that fires once the last
// pending part resolves.

use std::cell::Cell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::entity::{EmitEntity, EmitValue, ObjectValue};
use crate::placeholder::Placeholder;

/// One segment of a string under construction.
#[derive(Debug, Clone)]
pub enum CodePart {
    Literal(String),
    Pending(Placeholder<String>),
}

impl From<&str> for CodePart {
    fn from(text: &str) -> Self {
        CodePart::Literal(text.to_string())
    }
}

impl From<String> for CodePart {
    fn from(text: String) -> Self {
        CodePart::Literal(text)
    }
}

impl From<Placeholder<String>> for CodePart {
    fn from(placeholder: Placeholder<String>) -> Self {
        CodePart::Pending(placeholder)
    }
}

impl From<EmitValue<String>> for CodePart {
    fn from(value: EmitValue<String>) -> Self {
        match value {
            EmitValue::Concrete(text) => CodePart::Literal(text),
            EmitValue::Pending(placeholder) => CodePart::Pending(placeholder),
        }
    }
}

impl From<EmitEntity<String>> for CodePart {
    fn from(entity: EmitEntity<String>) -> Self {
        match entity {
            EmitEntity::RawCode(value) => value.into(),
            EmitEntity::NoEmit => CodePart::Literal(String::new()),
            other => {
                debug_assert!(false, "cannot splice a {} entity into code", other.kind_name());
                CodePart::Literal(String::new())
            }
        }
    }
}

/// Ordered string segments, some possibly deferred.
#[derive(Debug, Default)]
pub struct StringBuilder {
    segments: Vec<CodePart>,
}

impl StringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, part: impl Into<CodePart>) {
        self.segments.push(part.into());
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn reduce(self) -> EmitValue<String> {
        let segments = Rc::new(self.segments);
        let pending: Vec<Placeholder<String>> = segments
            .iter()
            .filter_map(|segment| match segment {
                CodePart::Pending(ph) if !ph.is_resolved() => Some(ph.clone()),
                _ => None,
            })
            .collect();
        if pending.is_empty() {
            return EmitValue::Concrete(join_segments(&segments));
        }

        let out: Placeholder<String> = Placeholder::new();
        let remaining = Rc::new(Cell::new(pending.len()));
        for ph in pending {
            let segments = Rc::clone(&segments);
            let remaining = Rc::clone(&remaining);
            let out = out.clone();
            ph.on_value(move |_| {
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    out.set_value(join_segments(&segments));
                }
            });
        }
        EmitValue::Pending(out)
    }
}

fn join_segments(segments: &[CodePart]) -> String {
    let mut text = String::new();
    for segment in segments {
        match segment {
            CodePart::Literal(s) => text.push_str(s),
            CodePart::Pending(ph) => text.push_str(&ph.value().unwrap_or_default()),
        }
    }
    text
}

/// Template helper: flatten strings, deferred values, and reference results
/// into a single builder and reduce it.
#[macro_export]
macro_rules! code {
    ($($part:expr),* $(,)?) => {{
        let mut builder = $crate::builders::StringBuilder::new();
        $( builder.push($part); )*
        builder.reduce()
    }};
}

/// Keyed slots whose completed object publishes once every slot is concrete.
#[derive(Debug, Default)]
pub struct ObjectBuilder<V> {
    fields: IndexMap<String, EmitValue<V>>,
}

impl<V: ObjectValue> ObjectBuilder<V> {
    pub fn new() -> Self {
        ObjectBuilder {
            fields: IndexMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<EmitValue<V>>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn reduce(self) -> EmitValue<V> {
        let fields = Rc::new(self.fields);
        let pending: Vec<Placeholder<V>> = fields
            .values()
            .filter_map(|slot| match slot {
                EmitValue::Pending(ph) if !ph.is_resolved() => Some(ph.clone()),
                _ => None,
            })
            .collect();
        if pending.is_empty() {
            return EmitValue::Concrete(build_object(&fields));
        }

        let out: Placeholder<V> = Placeholder::new();
        let remaining = Rc::new(Cell::new(pending.len()));
        for ph in pending {
            let fields = Rc::clone(&fields);
            let remaining = Rc::clone(&remaining);
            let out = out.clone();
            ph.on_value(move |_| {
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    out.set_value(build_object(&fields));
                }
            });
        }
        EmitValue::Pending(out)
    }
}

fn build_object<V: ObjectValue>(fields: &IndexMap<String, EmitValue<V>>) -> V {
    let resolved: IndexMap<String, V> = fields
        .iter()
        .map(|(key, slot)| (key.clone(), slot.resolved().unwrap_or_else(V::empty)))
        .collect();
    V::object(resolved)
}

/// Indexed slots; same completion discipline as ObjectBuilder.
#[derive(Debug, Default)]
pub struct ArrayBuilder<V> {
    items: Vec<EmitValue<V>>,
}

impl<V: ObjectValue> ArrayBuilder<V> {
    pub fn new() -> Self {
        ArrayBuilder { items: Vec::new() }
    }

    pub fn push(&mut self, value: impl Into<EmitValue<V>>) {
        self.items.push(value.into());
    }

    pub fn reduce(self) -> EmitValue<V> {
        let items = Rc::new(self.items);
        let pending: Vec<Placeholder<V>> = items
            .iter()
            .filter_map(|slot| match slot {
                EmitValue::Pending(ph) if !ph.is_resolved() => Some(ph.clone()),
                _ => None,
            })
            .collect();
        if pending.is_empty() {
            return EmitValue::Concrete(build_array(&items));
        }

        let out: Placeholder<V> = Placeholder::new();
        let remaining = Rc::new(Cell::new(pending.len()));
        for ph in pending {
            let items = Rc::clone(&items);
            let remaining = Rc::clone(&remaining);
            let out = out.clone();
            ph.on_value(move |_| {
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    out.set_value(build_array(&items));
                }
            });
        }
        EmitValue::Pending(out)
    }
}

fn build_array<V: ObjectValue>(items: &[EmitValue<V>]) -> V {
    V::array(
        items
            .iter()
            .map(|slot| slot.resolved().unwrap_or_else(V::empty))
            .collect(),
    )
}
