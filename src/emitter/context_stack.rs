// src/emitter/context_stack.rs
//
// The context engine. The context active for a dispatched type is derived by
// folding per-enclosure contributions over its lexical enclosure stack,
// starting from the (lazily computed) program context. Each step is interned
// and memoized, so folding is associative over stack prefixes and a repeated
// fold is an id lookup.

use super::{AssetEmitter, Frame, LexicalStack, TypeEmitter};
use crate::context::{ContextArena, ContextMap, ContextMapId, ContextStateId};
use crate::entity::TargetValue;
use crate::errors::EmitResult;
use crate::graph::TypeId;
use crate::op_key::{op_key_for, OpKey};

impl<V: TargetValue> AssetEmitter<V> {
    pub(crate) fn resolved_program_state<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
    ) -> EmitResult<ContextStateId> {
        if let Some(state) = self.program_state {
            return Ok(state);
        }
        let lexical = e.program_context(self)?;
        let lexical = self.contexts.intern_map(lexical);
        let state = self.contexts.intern_state(lexical, ContextArena::EMPTY_MAP);
        self.program_state = Some(state);
        Ok(state)
    }

    /// Enter the context frame for `ty`: rebuild its enclosure stack and
    /// fold the contributions. Consumes any incoming reference context.
    pub(crate) fn set_context_for_type<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        ty: TypeId,
    ) -> EmitResult<()> {
        let stack: LexicalStack = if self.program().is_declaration(ty) {
            let mut stack: LexicalStack =
                self.program().namespace_chain(ty).into_iter().collect();
            stack.push(ty);
            stack
        } else {
            let mut stack = self.frame.stack.clone();
            stack.push(ty);
            stack
        };

        let incoming = self.incoming_ref.take();
        let mut state = self.resolved_program_state(e)?;
        for &entry in &stack {
            let entry_incoming = match &incoming {
                Some(inc) if inc.target == entry => Some(inc.reference),
                _ => None,
            };
            state = self.fold_entry(e, entry, state, entry_incoming)?;
        }
        self.frame = Frame { state, stack };
        Ok(())
    }

    /// One fold step, memoized by (entry, input state, incoming map). The
    /// incoming reference context participates in the key so a type folded
    /// under distinct incoming contexts yields distinct interned states.
    fn fold_entry<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        entry: TypeId,
        input: ContextStateId,
        incoming: Option<ContextMapId>,
    ) -> EmitResult<ContextStateId> {
        let memo_key = (entry, input, incoming);
        if let Some(&state) = self.known_contexts.get(&memo_key) {
            return Ok(state);
        }

        let op = op_key_for(self.program(), entry);
        let lexical_add = self.lexical_contribution(e, op, entry)?;
        let reference_add = if op.has_reference_context() {
            self.reference_contribution(e, op, entry)?
        } else {
            ContextMap::new()
        };

        let input_state = self.contexts.state(input);
        let lexical = self.contexts.merge_maps(input_state.lexical, &lexical_add);
        let mut reference = self.contexts.merge_maps(input_state.reference, &reference_add);
        if let Some(inc) = incoming {
            let inc_map = self.contexts.map(inc).clone();
            reference = self.contexts.merge_maps(reference, &inc_map);
        }
        let state = self.contexts.intern_state(lexical, reference);
        tracing::trace!(
            op = op.name(),
            entry = entry.index(),
            state = state.index(),
            "context fold"
        );
        self.known_contexts.insert(memo_key, state);
        Ok(state)
    }

    fn lexical_contribution<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        op: OpKey,
        entry: TypeId,
    ) -> EmitResult<ContextMap> {
        match op {
            OpKey::Namespace => e.namespace_context(self, entry),
            OpKey::ModelDeclaration => e.model_declaration_context(self, entry),
            OpKey::ModelInstantiation => e.model_instantiation_context(self, entry),
            OpKey::ModelLiteral => e.model_literal_context(self, entry),
            OpKey::ModelScalar => e.model_scalar_context(self, entry),
            OpKey::ModelPropertyLiteral => e.model_property_literal_context(self, entry),
            OpKey::UnionDeclaration => e.union_declaration_context(self, entry),
            OpKey::UnionInstantiation => e.union_instantiation_context(self, entry),
            OpKey::UnionLiteral => e.union_literal_context(self, entry),
            OpKey::UnionVariant => e.union_variant_context(self, entry),
            OpKey::InterfaceDeclaration => e.interface_declaration_context(self, entry),
            OpKey::InterfaceOperationDeclaration => {
                e.interface_operation_declaration_context(self, entry)
            }
            OpKey::OperationDeclaration => e.operation_declaration_context(self, entry),
            OpKey::EnumDeclaration => e.enum_declaration_context(self, entry),
            OpKey::EnumMember => e.enum_member_context(self, entry),
            OpKey::TupleLiteral => e.tuple_literal_context(self, entry),
            OpKey::BooleanLiteral => e.boolean_literal_context(self, entry),
            OpKey::StringLiteral => e.string_literal_context(self, entry),
            OpKey::NumericLiteral => e.numeric_literal_context(self, entry),
            // Sub-operations never appear as enclosure entries.
            _ => Ok(ContextMap::new()),
        }
    }

    fn reference_contribution<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        op: OpKey,
        entry: TypeId,
    ) -> EmitResult<ContextMap> {
        match op {
            OpKey::Namespace => e.namespace_reference_context(self, entry),
            OpKey::ModelDeclaration => e.model_declaration_reference_context(self, entry),
            OpKey::ModelInstantiation => e.model_instantiation_reference_context(self, entry),
            OpKey::ModelLiteral => e.model_literal_reference_context(self, entry),
            OpKey::ModelPropertyLiteral => {
                e.model_property_literal_reference_context(self, entry)
            }
            OpKey::UnionDeclaration => e.union_declaration_reference_context(self, entry),
            OpKey::UnionInstantiation => e.union_instantiation_reference_context(self, entry),
            OpKey::UnionLiteral => e.union_literal_reference_context(self, entry),
            OpKey::UnionVariant => e.union_variant_reference_context(self, entry),
            OpKey::InterfaceDeclaration => e.interface_declaration_reference_context(self, entry),
            OpKey::InterfaceOperationDeclaration => {
                e.interface_operation_declaration_reference_context(self, entry)
            }
            OpKey::OperationDeclaration => e.operation_declaration_reference_context(self, entry),
            OpKey::EnumDeclaration => e.enum_declaration_reference_context(self, entry),
            OpKey::TupleLiteral => e.tuple_literal_reference_context(self, entry),
            _ => Ok(ContextMap::new()),
        }
    }
}
