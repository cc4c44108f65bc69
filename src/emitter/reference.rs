// src/emitter/reference.rs
//
// Reference resolution. A reference to a completed declaration renders
// immediately through the user's `reference` operation; a reference that
// hits a circular marker parks a waiter carrying the current frame and
// hands back a placeholder that the waiter fills once the target completes.

use super::{AssetEmitter, IncomingRef, RefWaiter, TypeEmitter};
use crate::context::ContextArena;
use crate::entity::{EmitEntity, EmitValue, EmitterOutput, TargetValue};
use crate::errors::{EmitResult, EmitterError};
use crate::graph::{TypeId, TypeNode};
use crate::op_key::{op_key_for, OpKey};
use crate::placeholder::Placeholder;

impl<V: TargetValue> AssetEmitter<V> {
    /// Emit a reference to `target` relative to the current scope.
    pub fn emit_type_reference<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        target: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        // Property references are a distinct operation from property
        // literals.
        let (op, extra) = if matches!(self.program().node(target), TypeNode::ModelProperty(_)) {
            (OpKey::ModelPropertyReference, None)
        } else {
            let op = op_key_for(self.program(), target);
            let extra = self.name_arg(e, op, target)?;
            (op, extra)
        };

        let captured = self.contexts.state(self.frame.state).reference;
        if captured != ContextArena::EMPTY_MAP {
            self.incoming_ref = Some(IncomingRef {
                target,
                reference: captured,
            });
        }
        let entity = self.invoke(e, op, target, extra);
        // Consumed by the context fold; not consumed when invoke failed
        // before reaching it.
        self.incoming_ref = None;
        let entity = entity?;

        if let EmitEntity::Circular(key) = entity {
            tracing::trace!(op = key.op.name(), ty = target.index(), "reference deferred");
            let placeholder: Placeholder<V> = Placeholder::new();
            self.waiters.entry(key).or_default().push(RefWaiter {
                frame: self.frame.clone(),
                placeholder: placeholder.clone(),
            });
            return Ok(EmitEntity::RawCode(EmitValue::Pending(placeholder)));
        }

        let result = self.finish_reference(e, entity, None)?;
        self.drain_ready(e)?;
        Ok(result)
    }

    /// Step 4 of reference resolution: non-declarations pass through;
    /// declarations render via the user's `reference` with the scope diff.
    /// When `fill` is present (waiter path) the rendered value must be
    /// concrete now and is copied into the parked placeholder.
    pub(crate) fn finish_reference<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        entity: EmitEntity<V>,
        fill: Option<&Placeholder<V>>,
    ) -> EmitResult<EmitEntity<V>> {
        let result = match entity {
            EmitEntity::Declaration(decl) => {
                let current = self.current_scope();
                let target_scope = self.scopes.decl(decl).scope;
                let diff = self.scopes.resolve_relative(current, target_scope);
                let output = e.reference(self, decl, &diff.path_up, &diff.path_down, diff.common)?;
                match output {
                    EmitterOutput::Value(value) => {
                        EmitEntity::RawCode(EmitValue::Concrete(value))
                    }
                    EmitterOutput::Entity(entity) => entity,
                    EmitterOutput::Pending(placeholder) => {
                        EmitEntity::RawCode(EmitValue::Pending(placeholder))
                    }
                }
            }
            other => other,
        };

        if let Some(placeholder) = fill {
            match result.as_value().and_then(|value| value.resolved()) {
                Some(value) => placeholder.set_value(value),
                None => {
                    return Err(EmitterError::ReferenceCircular {
                        name: self.reference_display(&result),
                    });
                }
            }
        }
        Ok(result)
    }

    pub(crate) fn resolve_waiter<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        waiter: RefWaiter<V>,
        entity: &EmitEntity<V>,
    ) -> EmitResult<()> {
        let saved = std::mem::replace(&mut self.frame, waiter.frame);
        let result = self.finish_reference(e, entity.clone(), Some(&waiter.placeholder));
        self.frame = saved;
        result.map(|_| ())
    }

    fn reference_display(&self, entity: &EmitEntity<V>) -> String {
        match entity {
            EmitEntity::Declaration(decl) => self.scopes.decl(*decl).name.clone(),
            other => format!("<{}>", other.kind_name()),
        }
    }
}
