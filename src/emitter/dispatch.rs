// src/emitter/dispatch.rs
//
// invoke(): the dispatcher proper. Enter the context frame, consult the
// memo, store a circular marker, run the user operation, restore the frame
// (on success and on error), then complete: overwrite the memo, drain
// waiters, attach declarations to their scope.

use super::{AssetEmitter, TypeEmitter};
use crate::entity::{EmitEntity, EmitValue, EmitterOutput, MemoKey, TargetValue};
use crate::errors::EmitResult;
use crate::graph::TypeId;
use crate::op_key::{op_key_for, OpKey};

enum InvokeStep<V> {
    Cached(EmitEntity<V>),
    Fresh(MemoKey, EmitterOutput<V>),
}

impl<V: TargetValue> AssetEmitter<V> {
    /// Dispatch a type to the user operation its kind selects.
    pub fn emit_type<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        ty: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        let op = op_key_for(self.program(), ty);
        let extra = self.name_arg(e, op, ty)?;
        let entity = self.invoke(e, op, ty, extra)?;
        self.drain_ready(e)?;
        Ok(entity)
    }

    /// The extra argument carried by declaration ops (the declaration name)
    /// and by `modelScalar` (the intrinsic name).
    pub(crate) fn name_arg<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        op: OpKey,
        ty: TypeId,
    ) -> EmitResult<Option<String>> {
        if op.is_declaration_key() {
            Ok(Some(self.emit_declaration_name(e, ty)?))
        } else if op == OpKey::ModelScalar {
            Ok(self.program().model(ty).intrinsic.clone())
        } else {
            Ok(None)
        }
    }

    pub(crate) fn invoke<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        op: OpKey,
        ty: TypeId,
        extra: Option<String>,
    ) -> EmitResult<EmitEntity<V>> {
        let saved = self.frame.clone();
        let step = self.invoke_in_frame(e, op, ty, extra);
        self.frame = saved;

        match step? {
            InvokeStep::Cached(entity) => Ok(entity),
            InvokeStep::Fresh(key, output) => match output {
                EmitterOutput::Value(value) => {
                    let entity = EmitEntity::RawCode(EmitValue::Concrete(value));
                    self.complete(e, key, entity.clone())?;
                    Ok(entity)
                }
                EmitterOutput::Entity(entity) => {
                    self.complete(e, key, entity.clone())?;
                    Ok(entity)
                }
                EmitterOutput::Pending(placeholder) => {
                    // The memo keeps the circular marker until the
                    // placeholder resolves; completion is observed at the
                    // next dispatch boundary.
                    tracing::trace!(op = op.name(), ty = ty.index(), "operation deferred");
                    self.pending.push((key, placeholder.clone()));
                    Ok(EmitEntity::RawCode(EmitValue::Pending(placeholder)))
                }
            },
        }
    }

    fn invoke_in_frame<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        op: OpKey,
        ty: TypeId,
        extra: Option<String>,
    ) -> EmitResult<InvokeStep<V>> {
        self.set_context_for_type(e, ty)?;
        let key = MemoKey {
            op,
            ty,
            state: self.frame.state,
        };
        if let Some(entity) = self.memo.get(&key) {
            tracing::trace!(op = op.name(), ty = ty.index(), "memo hit");
            return Ok(InvokeStep::Cached(entity.clone()));
        }
        // Re-entries during the user operation observe the marker.
        self.memo.insert(key, EmitEntity::Circular(key));
        tracing::trace!(op = op.name(), ty = ty.index(), state = key.state.index(), "invoke");
        let output = self.call_op(e, op, ty, extra.as_deref())?;
        Ok(InvokeStep::Fresh(key, output))
    }

    /// Overwrite the memo with the real entity, attach declarations to
    /// their scope, and drain every waiter registered against the key.
    pub(crate) fn complete<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        key: MemoKey,
        entity: EmitEntity<V>,
    ) -> EmitResult<()> {
        self.memo.insert(key, entity.clone());
        if let EmitEntity::Declaration(decl) = &entity {
            self.scopes.attach(*decl);
        }
        if let Some(waiters) = self.waiters.remove(&key) {
            tracing::trace!(op = key.op.name(), waiters = waiters.len(), "draining waiters");
            for waiter in waiters {
                self.resolve_waiter(e, waiter, &entity)?;
            }
        }
        Ok(())
    }

    /// Complete deferred operations whose placeholders have resolved since
    /// the last dispatch boundary.
    pub(crate) fn drain_ready<E: TypeEmitter<V> + ?Sized>(&mut self, e: &mut E) -> EmitResult<()> {
        loop {
            let ready = self
                .pending
                .iter()
                .position(|(_, placeholder)| placeholder.is_resolved());
            let Some(index) = ready else { break };
            let (key, placeholder) = self.pending.swap_remove(index);
            if let Some(value) = placeholder.value() {
                self.complete(e, key, EmitEntity::RawCode(EmitValue::Concrete(value)))?;
            }
        }
        Ok(())
    }

    fn call_op<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        op: OpKey,
        ty: TypeId,
        name: Option<&str>,
    ) -> EmitResult<EmitterOutput<V>> {
        let name = name.unwrap_or("");
        match op {
            OpKey::Namespace => e.namespace(self, ty),
            OpKey::ModelDeclaration => e.model_declaration(self, ty, name),
            OpKey::ModelInstantiation => e.model_instantiation(self, ty, name),
            OpKey::ModelLiteral => e.model_literal(self, ty),
            OpKey::ModelScalar => e.model_scalar(self, ty, name),
            OpKey::ModelProperties => e.model_properties(self, ty),
            OpKey::ModelPropertyLiteral => e.model_property_literal(self, ty),
            OpKey::ModelPropertyReference => e.model_property_reference(self, ty),
            OpKey::EnumDeclaration => e.enum_declaration(self, ty, name),
            OpKey::EnumMember => e.enum_member(self, ty),
            OpKey::EnumMembers => e.enum_members(self, ty),
            OpKey::UnionDeclaration => e.union_declaration(self, ty, name),
            OpKey::UnionInstantiation => e.union_instantiation(self, ty, name),
            OpKey::UnionLiteral => e.union_literal(self, ty),
            OpKey::UnionVariant => e.union_variant(self, ty),
            OpKey::UnionVariants => e.union_variants(self, ty),
            OpKey::InterfaceDeclaration => e.interface_declaration(self, ty, name),
            OpKey::InterfaceOperations => e.interface_operations(self, ty),
            OpKey::InterfaceOperationDeclaration => {
                e.interface_operation_declaration(self, ty, name)
            }
            OpKey::OperationDeclaration => e.operation_declaration(self, ty, name),
            OpKey::OperationParameters => e.operation_parameters(self, ty),
            OpKey::OperationReturnType => e.operation_return_type(self, ty),
            OpKey::TupleLiteral => e.tuple_literal(self, ty),
            OpKey::TupleLiteralValues => e.tuple_literal_values(self, ty),
            OpKey::BooleanLiteral => e.boolean_literal(self, ty),
            OpKey::StringLiteral => e.string_literal(self, ty),
            OpKey::NumericLiteral => e.numeric_literal(self, ty),
        }
    }
}
