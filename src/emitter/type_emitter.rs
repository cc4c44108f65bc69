// src/emitter/type_emitter.rs
//
// The user surface. A target emitter implements this trait and overrides
// only what it emits; every method has a default that traverses children
// and produces NoEmit, so the trivial emitter is a no-op walk of the whole
// graph.
//
// Operation methods receive the asset emitter and the dispatched type (plus
// the declaration name for named kinds, or the intrinsic name for scalars).
// Each dispatch-table key also has a `<key>_context` method contributing to
// the lexical half of the context fold and, unless the key is exempt, a
// `<key>_reference_context` method contributing to the reference half.

use super::output::EmittedSourceFile;
use super::AssetEmitter;
use crate::context::ContextMap;
use crate::entity::{EmitterOutput, TargetValue};
use crate::errors::{EmitResult, EmitterError};
use crate::graph::{TypeId, TypeNode};
use crate::scope::{DeclId, ScopeId, SourceFileId};

pub trait TypeEmitter<V: TargetValue> {
    // ========================================================================
    // Program-level hooks
    // ========================================================================

    /// Lexical seed for every context fold; computed once, lazily.
    fn program_context(&mut self, em: &mut AssetEmitter<V>) -> EmitResult<ContextMap> {
        let _ = em;
        Ok(ContextMap::new())
    }

    /// Render one created source file. The default concatenates the rendered
    /// values of the file scope's declarations, one per line.
    fn source_file(
        &mut self,
        em: &mut AssetEmitter<V>,
        file: SourceFileId,
    ) -> EmitResult<EmittedSourceFile> {
        let path = em.source_file(file).path.clone();
        let root = em.source_file(file).global_scope;
        let decls = em.scope(root).declarations.clone();
        let mut contents = String::new();
        for decl in decls {
            match em.declaration(decl).value.resolved() {
                Some(value) => contents.push_str(&value.render()),
                None => tracing::warn!(
                    declaration = em.declaration(decl).name.as_str(),
                    "declaration value unresolved at render time"
                ),
            }
            contents.push('\n');
        }
        Ok(EmittedSourceFile { path, contents })
    }

    /// Render a reference to a declaration given the scope diff between the
    /// referencing scope and the declaration's. The default is the bare
    /// declaration name.
    fn reference(
        &mut self,
        em: &mut AssetEmitter<V>,
        decl: DeclId,
        path_up: &[ScopeId],
        path_down: &[ScopeId],
        common: Option<ScopeId>,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = (path_up, path_down, common);
        let name = em.declaration(decl).name.clone();
        Ok(em.result_raw_code(V::fragment(&name)))
    }

    /// Declaration name defaulting: the intrinsic name for intrinsics; for a
    /// template instantiation the generic's name followed by the
    /// concatenated names of its model arguments (recursively). A non-model
    /// argument is fatal. Collisions are not deduplicated.
    fn declaration_name(&mut self, em: &mut AssetEmitter<V>, ty: TypeId) -> EmitResult<String> {
        let program = em.program_handle();
        match program.node(ty) {
            TypeNode::Model(model) => {
                if let Some(intrinsic) = &model.intrinsic {
                    return Ok(intrinsic.clone());
                }
                if model.template_args.is_empty() {
                    return Ok(model.name.clone());
                }
                let mut name = model.name.clone();
                for &arg in &model.template_args {
                    if !matches!(program.node(arg), TypeNode::Model(_)) {
                        return Err(EmitterError::InvalidTemplateArgument {
                            model: model.name.clone(),
                        });
                    }
                    name.push_str(&em.emit_declaration_name(self, arg)?);
                }
                Ok(name)
            }
            TypeNode::Union(union) => {
                let Some(base) = union.name.clone() else {
                    return Err(EmitterError::UnsupportedTypeKind {
                        kind: "anonymous Union",
                    });
                };
                if union.template_args.is_empty() {
                    return Ok(base);
                }
                let mut name = base;
                for &arg in &union.template_args {
                    if !matches!(program.node(arg), TypeNode::Model(_)) {
                        return Err(EmitterError::InvalidTemplateArgument { model: name });
                    }
                    name.push_str(&em.emit_declaration_name(self, arg)?);
                }
                Ok(name)
            }
            TypeNode::Namespace(ns) => Ok(ns.name.clone()),
            TypeNode::Interface(iface) => Ok(iface.name.clone()),
            TypeNode::Enum(en) => Ok(en.name.clone()),
            TypeNode::Operation(op) => Ok(op.name.clone()),
            TypeNode::EnumMember(member) => Ok(member.name.clone()),
            TypeNode::ModelProperty(property) => Ok(property.name.clone()),
            _ => Err(EmitterError::UnsupportedTypeKind {
                kind: program.kind(ty).name(),
            }),
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    fn namespace(&mut self, em: &mut AssetEmitter<V>, ns: TypeId) -> EmitResult<EmitterOutput<V>> {
        let program = em.program_handle();
        let node = program.namespace(ns);
        for &child in &node.namespaces {
            em.emit_type(self, child)?;
        }
        for &model in &node.models {
            if !program.is_template_declaration(model) {
                em.emit_type(self, model)?;
            }
        }
        for &operation in &node.operations {
            em.emit_type(self, operation)?;
        }
        for &en in &node.enums {
            em.emit_type(self, en)?;
        }
        for &union in &node.unions {
            if !program.is_template_declaration(union) {
                em.emit_type(self, union)?;
            }
        }
        for &iface in &node.interfaces {
            em.emit_type(self, iface)?;
        }
        Ok(em.result_none())
    }

    fn model_declaration(
        &mut self,
        em: &mut AssetEmitter<V>,
        model: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = name;
        em.emit_model_properties(self, model)?;
        Ok(em.result_none())
    }

    fn model_instantiation(
        &mut self,
        em: &mut AssetEmitter<V>,
        model: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = name;
        em.emit_model_properties(self, model)?;
        Ok(em.result_none())
    }

    fn model_literal(
        &mut self,
        em: &mut AssetEmitter<V>,
        model: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        em.emit_model_properties(self, model)?;
        Ok(em.result_none())
    }

    fn model_scalar(
        &mut self,
        em: &mut AssetEmitter<V>,
        model: TypeId,
        scalar_name: &str,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = (model, scalar_name);
        Ok(em.result_none())
    }

    fn model_properties(
        &mut self,
        em: &mut AssetEmitter<V>,
        model: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let properties: Vec<TypeId> =
            em.program().model(model).properties.values().copied().collect();
        for property in properties {
            em.emit_model_property(self, property)?;
        }
        Ok(em.result_none())
    }

    fn model_property_literal(
        &mut self,
        em: &mut AssetEmitter<V>,
        property: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let ty = em.program().property(property).ty;
        em.emit_type_reference(self, ty)?;
        Ok(em.result_none())
    }

    /// References to properties are a distinct operation from property
    /// literals; the default forwards to the property's type.
    fn model_property_reference(
        &mut self,
        em: &mut AssetEmitter<V>,
        property: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let ty = em.program().property(property).ty;
        Ok(EmitterOutput::Entity(em.emit_type_reference(self, ty)?))
    }

    fn enum_declaration(
        &mut self,
        em: &mut AssetEmitter<V>,
        en: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = name;
        em.emit_enum_members(self, en)?;
        Ok(em.result_none())
    }

    fn enum_members(
        &mut self,
        em: &mut AssetEmitter<V>,
        en: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let members = em.program().enumeration(en).members.clone();
        for member in members {
            em.emit_type(self, member)?;
        }
        Ok(em.result_none())
    }

    fn enum_member(
        &mut self,
        em: &mut AssetEmitter<V>,
        member: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = member;
        Ok(em.result_none())
    }

    fn union_declaration(
        &mut self,
        em: &mut AssetEmitter<V>,
        union: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = name;
        em.emit_union_variants(self, union)?;
        Ok(em.result_none())
    }

    fn union_instantiation(
        &mut self,
        em: &mut AssetEmitter<V>,
        union: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = name;
        em.emit_union_variants(self, union)?;
        Ok(em.result_none())
    }

    fn union_literal(
        &mut self,
        em: &mut AssetEmitter<V>,
        union: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        em.emit_union_variants(self, union)?;
        Ok(em.result_none())
    }

    fn union_variants(
        &mut self,
        em: &mut AssetEmitter<V>,
        union: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let variants = em.program().union(union).variants.clone();
        for variant in variants {
            em.emit_type(self, variant)?;
        }
        Ok(em.result_none())
    }

    fn union_variant(
        &mut self,
        em: &mut AssetEmitter<V>,
        variant: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let ty = em.program().variant(variant).ty;
        em.emit_type_reference(self, ty)?;
        Ok(em.result_none())
    }

    fn interface_declaration(
        &mut self,
        em: &mut AssetEmitter<V>,
        iface: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = name;
        em.emit_interface_operations(self, iface)?;
        Ok(em.result_none())
    }

    fn interface_operations(
        &mut self,
        em: &mut AssetEmitter<V>,
        iface: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let operations = em.program().interface(iface).operations.clone();
        for operation in operations {
            em.emit_interface_operation(self, operation)?;
        }
        Ok(em.result_none())
    }

    fn interface_operation_declaration(
        &mut self,
        em: &mut AssetEmitter<V>,
        operation: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = name;
        em.emit_operation_parameters(self, operation)?;
        em.emit_operation_return_type(self, operation)?;
        Ok(em.result_none())
    }

    fn operation_declaration(
        &mut self,
        em: &mut AssetEmitter<V>,
        operation: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = name;
        em.emit_operation_parameters(self, operation)?;
        em.emit_operation_return_type(self, operation)?;
        Ok(em.result_none())
    }

    fn operation_parameters(
        &mut self,
        em: &mut AssetEmitter<V>,
        operation: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let parameters = em.program().operation(operation).parameters;
        let properties: Vec<TypeId> = em
            .program()
            .model(parameters)
            .properties
            .values()
            .copied()
            .collect();
        for property in properties {
            em.emit_model_property(self, property)?;
        }
        Ok(em.result_none())
    }

    fn operation_return_type(
        &mut self,
        em: &mut AssetEmitter<V>,
        operation: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let return_type = em.program().operation(operation).return_type;
        em.emit_type_reference(self, return_type)?;
        Ok(em.result_none())
    }

    fn tuple_literal(
        &mut self,
        em: &mut AssetEmitter<V>,
        tuple: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        em.emit_tuple_literal_values(self, tuple)?;
        Ok(em.result_none())
    }

    fn tuple_literal_values(
        &mut self,
        em: &mut AssetEmitter<V>,
        tuple: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let values = em.program().tuple(tuple).values.clone();
        for value in values {
            em.emit_type_reference(self, value)?;
        }
        Ok(em.result_none())
    }

    fn boolean_literal(
        &mut self,
        em: &mut AssetEmitter<V>,
        literal: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = literal;
        Ok(em.result_none())
    }

    fn string_literal(
        &mut self,
        em: &mut AssetEmitter<V>,
        literal: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = literal;
        Ok(em.result_none())
    }

    fn numeric_literal(
        &mut self,
        em: &mut AssetEmitter<V>,
        literal: TypeId,
    ) -> EmitResult<EmitterOutput<V>> {
        let _ = literal;
        Ok(em.result_none())
    }

    // ========================================================================
    // Lexical context methods, one per dispatch-table key
    // ========================================================================

    fn namespace_context(&mut self, _em: &mut AssetEmitter<V>, _ns: TypeId) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn model_declaration_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _model: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn model_instantiation_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _model: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn model_literal_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _model: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn model_scalar_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _model: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn model_property_literal_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _property: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn union_declaration_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _union: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn union_instantiation_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _union: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn union_literal_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _union: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn union_variant_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _variant: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn interface_declaration_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _iface: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn interface_operation_declaration_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _operation: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn operation_declaration_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _operation: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn enum_declaration_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _en: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn enum_member_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _member: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn tuple_literal_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _tuple: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn boolean_literal_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _literal: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn string_literal_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _literal: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn numeric_literal_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _literal: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    // ========================================================================
    // Reference context methods (non-exempt keys only)
    // ========================================================================

    fn namespace_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _ns: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn model_declaration_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _model: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn model_instantiation_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _model: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn model_literal_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _model: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn model_property_literal_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _property: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn union_declaration_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _union: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn union_instantiation_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _union: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn union_literal_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _union: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn union_variant_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _variant: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn interface_declaration_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _iface: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn interface_operation_declaration_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _operation: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn operation_declaration_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _operation: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn enum_declaration_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _en: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }

    fn tuple_literal_reference_context(
        &mut self,
        _em: &mut AssetEmitter<V>,
        _tuple: TypeId,
    ) -> EmitResult<ContextMap> {
        Ok(ContextMap::new())
    }
}
