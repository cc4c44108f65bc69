// tests/cycles.rs
//! Cycle resolution: circular markers, waiters, and placeholder-backed
//! builders over mutually recursive models.

use quill::builders::{ObjectBuilder, StringBuilder};
use quill::context::{ContextMap, ContextValue, SCOPE_KEY};
use quill::emitter::{AssetEmitter, EmitProgramOptions, EmitterContext, TypeEmitter};
use quill::entity::{EmitEntity, EmitValue, EmitterOutput};
use quill::errors::EmitResult;
use quill::graph::{Program, TypeId};
use quill::scope::SourceFileId;
use quill::{code, MemoryHost};
use serde_json::{json, Value};

fn scope_context(em: &mut AssetEmitter<String>, path: &str) -> ContextMap {
    let file = em.create_source_file(path);
    let scope = em.source_file(file).global_scope;
    let mut ctx = ContextMap::new();
    ctx.insert(SCOPE_KEY.to_string(), ContextValue::Scope(scope));
    ctx
}

/// Emits each model as a declaration whose value is the concatenation of
/// its properties' referenced names.
#[derive(Default)]
struct ModelTextEmitter {
    model_declaration_calls: usize,
    model_properties_calls: usize,
    property_literal_calls: usize,
}

impl TypeEmitter<String> for ModelTextEmitter {
    fn program_context(&mut self, em: &mut AssetEmitter<String>) -> EmitResult<ContextMap> {
        Ok(scope_context(em, "models.ts"))
    }

    fn model_declaration(
        &mut self,
        em: &mut AssetEmitter<String>,
        model: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<String>> {
        self.model_declaration_calls += 1;
        let properties = em.emit_model_properties(self, model)?;
        em.result_declaration(name, code![properties])
    }

    fn model_properties(
        &mut self,
        em: &mut AssetEmitter<String>,
        model: TypeId,
    ) -> EmitResult<EmitterOutput<String>> {
        self.model_properties_calls += 1;
        let properties: Vec<TypeId> = em
            .program()
            .model(model)
            .properties
            .values()
            .copied()
            .collect();
        let mut builder = StringBuilder::new();
        for property in properties {
            builder.push(em.emit_model_property(self, property)?);
        }
        Ok(em.result_raw_code(builder.reduce()))
    }

    fn model_property_literal(
        &mut self,
        em: &mut AssetEmitter<String>,
        property: TypeId,
    ) -> EmitResult<EmitterOutput<String>> {
        self.property_literal_calls += 1;
        let ty = em.program().property(property).ty;
        let reference = em.emit_type_reference(self, ty)?;
        Ok(em.result_raw_code(code![reference]))
    }
}

fn declarations(em: &AssetEmitter<String>) -> Vec<(String, String)> {
    let root = em.source_file(SourceFileId::new(0)).global_scope;
    em.scope(root)
        .declarations
        .iter()
        .map(|&id| {
            let decl = em.declaration(id);
            (
                decl.name.clone(),
                decl.value.resolved().expect("declaration value unresolved"),
            )
        })
        .collect()
}

#[test]
fn two_type_cycle_resolves_both_references() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let foo = program.add_model(Some(global), "Foo");
    let bar = program.add_model(Some(global), "Bar");
    program.add_property(foo, "p", bar);
    program.add_property(bar, "p", foo);

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = ModelTextEmitter::default();
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();

    assert_eq!(emitter.model_declaration_calls, 2);
    assert_eq!(emitter.model_properties_calls, 2);
    assert_eq!(emitter.property_literal_calls, 2);

    // Bar completes while Foo is still in progress.
    let decls = declarations(&em);
    assert_eq!(
        decls,
        vec![
            ("Bar".to_string(), "Foo".to_string()),
            ("Foo".to_string(), "Bar".to_string()),
        ]
    );
}

#[test]
fn three_type_cycle_with_shared_references() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let foo = program.add_model(Some(global), "Foo");
    let bar = program.add_model(Some(global), "Bar");
    let baz = program.add_model(Some(global), "Baz");
    program.add_property(foo, "p", bar);
    program.add_property(foo, "p2", bar);
    program.add_property(bar, "p", foo);
    program.add_property(bar, "p2", baz);
    program.add_property(baz, "p", foo);
    program.add_property(baz, "p2", bar);

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = ModelTextEmitter::default();
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();

    assert_eq!(emitter.property_literal_calls, 6);

    let decls = declarations(&em);
    let by_name = |name: &str| {
        decls
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .unwrap()
    };
    assert_eq!(by_name("Foo"), "BarBar");
    assert_eq!(by_name("Bar"), "FooBaz");
    assert_eq!(by_name("Baz"), "FooBar");
}

#[test]
fn repeated_emission_is_idempotent() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let foo = program.add_model(Some(global), "Foo");
    let bar = program.add_model(Some(global), "Bar");
    program.add_property(foo, "p", bar);
    program.add_property(bar, "p", foo);

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = ModelTextEmitter::default();
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();
    let first = declarations(&em);

    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();
    assert_eq!(emitter.model_declaration_calls, 2);
    assert_eq!(declarations(&em), first);

    let mut host_a = MemoryHost::new();
    let mut host_b = MemoryHost::new();
    em.write_output(&mut emitter, &mut host_a).unwrap();
    em.write_output(&mut emitter, &mut host_b).unwrap();
    assert_eq!(host_a.get("models.ts"), host_b.get("models.ts"));
}

/// Builds a JSON object graph; cycles resolve through `$ref` substitution.
#[derive(Default)]
struct JsonSchemaEmitter;

impl TypeEmitter<Value> for JsonSchemaEmitter {
    fn program_context(&mut self, em: &mut AssetEmitter<Value>) -> EmitResult<ContextMap> {
        let file = em.create_source_file("schema.json");
        let scope = em.source_file(file).global_scope;
        let mut ctx = ContextMap::new();
        ctx.insert(SCOPE_KEY.to_string(), ContextValue::Scope(scope));
        Ok(ctx)
    }

    fn model_declaration(
        &mut self,
        em: &mut AssetEmitter<Value>,
        model: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<Value>> {
        let properties: Vec<(String, TypeId)> = em
            .program()
            .model(model)
            .properties
            .iter()
            .map(|(n, id)| (n.clone(), *id))
            .collect();
        let mut fields: ObjectBuilder<Value> = ObjectBuilder::new();
        for (prop_name, property) in properties {
            let entity = em.emit_model_property(self, property)?;
            let value = entity
                .as_value()
                .unwrap_or(EmitValue::Concrete(Value::Null));
            fields.set(prop_name, value);
        }
        em.result_declaration(name, fields.reduce())
    }

    fn model_property_literal(
        &mut self,
        em: &mut AssetEmitter<Value>,
        property: TypeId,
    ) -> EmitResult<EmitterOutput<Value>> {
        let ty = em.program().property(property).ty;
        Ok(EmitterOutput::Entity(em.emit_type_reference(self, ty)?))
    }

    fn reference(
        &mut self,
        em: &mut AssetEmitter<Value>,
        decl: quill::scope::DeclId,
        _path_up: &[quill::scope::ScopeId],
        _path_down: &[quill::scope::ScopeId],
        _common: Option<quill::scope::ScopeId>,
    ) -> EmitResult<EmitterOutput<Value>> {
        let name = em.declaration(decl).name.clone();
        Ok(em.result_raw_code(json!({ "$ref": name })))
    }
}

#[test]
fn object_builder_resolves_cycles_by_ref_substitution() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let foo = program.add_model(Some(global), "Foo");
    let bar = program.add_model(Some(global), "Bar");
    program.add_property(foo, "p", bar);
    program.add_property(bar, "p", foo);

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<Value>();
    let mut emitter = JsonSchemaEmitter;
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();

    let root = em.source_file(SourceFileId::new(0)).global_scope;
    let mut resolved = Vec::new();
    for &id in &em.scope(root).declarations {
        let decl = em.declaration(id);
        resolved.push((decl.name.clone(), decl.value.resolved().unwrap()));
    }

    let by_name = |name: &str| {
        resolved
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .unwrap()
    };
    assert_eq!(by_name("Foo"), json!({ "p": { "$ref": "Bar" } }));
    assert_eq!(by_name("Bar"), json!({ "p": { "$ref": "Foo" } }));

    // Serialized output carries no placeholder markers.
    let mut host = MemoryHost::new();
    em.write_output(&mut emitter, &mut host).unwrap();
    let contents = host.get("schema.json").unwrap();
    assert!(contents.contains("$ref"));
    assert!(!contents.to_lowercase().contains("placeholder"));
    assert!(!contents.contains("null"));
}

/// An emitter whose cyclic declaration values flow through a raw
/// EmitEntity rather than a builder.
#[test]
fn circular_entity_is_visible_to_reentrant_dispatch() {
    struct Probe {
        saw_circular: bool,
    }

    impl TypeEmitter<String> for Probe {
        fn program_context(&mut self, em: &mut AssetEmitter<String>) -> EmitResult<ContextMap> {
            Ok(scope_context(em, "out.ts"))
        }

        fn model_declaration(
            &mut self,
            em: &mut AssetEmitter<String>,
            model: TypeId,
            name: &str,
        ) -> EmitResult<EmitterOutput<String>> {
            // Re-entering the dispatcher for the in-progress type yields the
            // circular marker.
            let reentry = em.emit_type(self, model)?;
            if matches!(reentry, EmitEntity::Circular(_)) {
                self.saw_circular = true;
            }
            em.result_declaration(name, name.to_string())
        }
    }

    let mut program = Program::new();
    let global = program.global_namespace();
    program.add_model(Some(global), "Solo");

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = Probe { saw_circular: false };
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();
    assert!(emitter.saw_circular);
}
