// src/emitter/walk.rs
//
// emit_program() and the per-kind emit helpers exposed to user operations.
// The helpers dispatch (and memoize) exactly like emit_type; they exist so
// user operations can drive sub-structure without re-deriving keys.

use super::{AssetEmitter, EmitProgramOptions, TypeEmitter};
use crate::entity::{EmitEntity, TargetValue};
use crate::errors::EmitResult;
use crate::graph::TypeId;
use crate::op_key::OpKey;

impl<V: TargetValue> AssetEmitter<V> {
    /// Walk the program's global namespace. Per namespace the order is:
    /// child namespaces, models, operations, enums, unions, interfaces.
    /// Template declarations are skipped; standard-library namespaces are
    /// skipped unless opted in.
    pub fn emit_program<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        options: EmitProgramOptions,
    ) -> EmitResult<()> {
        let global = self.program().global_namespace();
        if options.emit_global_namespace {
            self.emit_type(e, global)?;
            return Ok(());
        }
        self.walk_namespace(e, global, options)?;
        self.drain_ready(e)
    }

    fn walk_namespace<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        ns: TypeId,
        options: EmitProgramOptions,
    ) -> EmitResult<()> {
        let program = self.program_handle();
        let node = program.namespace(ns);
        for &child in &node.namespaces {
            if program.namespace(child).lib && !options.emit_lib_namespace {
                continue;
            }
            self.walk_namespace(e, child, options)?;
        }
        for &model in &node.models {
            if program.is_template_declaration(model) {
                continue;
            }
            self.emit_type(e, model)?;
        }
        for &operation in &node.operations {
            self.emit_type(e, operation)?;
        }
        for &en in &node.enums {
            self.emit_type(e, en)?;
        }
        for &un in &node.unions {
            if program.is_template_declaration(un) {
                continue;
            }
            self.emit_type(e, un)?;
        }
        for &iface in &node.interfaces {
            self.emit_type(e, iface)?;
        }
        Ok(())
    }

    /// The declaration name for a type, through the user's override.
    pub fn emit_declaration_name<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        ty: TypeId,
    ) -> EmitResult<String> {
        e.declaration_name(self, ty)
    }

    pub fn emit_model_properties<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        model: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        self.run_sub(e, OpKey::ModelProperties, model)
    }

    pub fn emit_model_property<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        property: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        self.run_sub(e, OpKey::ModelPropertyLiteral, property)
    }

    pub fn emit_operation_parameters<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        operation: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        self.run_sub(e, OpKey::OperationParameters, operation)
    }

    pub fn emit_operation_return_type<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        operation: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        self.run_sub(e, OpKey::OperationReturnType, operation)
    }

    pub fn emit_interface_operations<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        iface: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        self.run_sub(e, OpKey::InterfaceOperations, iface)
    }

    pub fn emit_interface_operation<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        operation: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        let name = self.emit_declaration_name(e, operation)?;
        let entity = self.invoke(e, OpKey::InterfaceOperationDeclaration, operation, Some(name))?;
        self.drain_ready(e)?;
        Ok(entity)
    }

    pub fn emit_enum_members<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        en: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        self.run_sub(e, OpKey::EnumMembers, en)
    }

    pub fn emit_union_variants<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        union: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        self.run_sub(e, OpKey::UnionVariants, union)
    }

    pub fn emit_tuple_literal_values<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        tuple: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        self.run_sub(e, OpKey::TupleLiteralValues, tuple)
    }

    fn run_sub<E: TypeEmitter<V> + ?Sized>(
        &mut self,
        e: &mut E,
        op: OpKey,
        ty: TypeId,
    ) -> EmitResult<EmitEntity<V>> {
        let entity = self.invoke(e, op, ty, None)?;
        self.drain_ready(e)?;
        Ok(entity)
    }
}
