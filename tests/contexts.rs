// tests/contexts.rs
//! Context propagation: lexical namespace context, reference context, and
//! context-keyed memoization (including per-declaration file routing).

use quill::context::{ContextMap, ContextValue, SCOPE_KEY};
use quill::emitter::{AssetEmitter, EmitProgramOptions, EmitterContext, TypeEmitter};
use quill::entity::EmitterOutput;
use quill::errors::EmitResult;
use quill::graph::{Program, TypeId};
use quill::MemoryHost;

fn bool_entry(key: &str, value: bool) -> ContextMap {
    let mut ctx = ContextMap::new();
    ctx.insert(key.to_string(), ContextValue::Bool(value));
    ctx
}

#[derive(Default)]
struct NamespaceContextEmitter {
    observed: Vec<(String, bool)>,
}

impl TypeEmitter<String> for NamespaceContextEmitter {
    fn namespace_context(
        &mut self,
        em: &mut AssetEmitter<String>,
        ns: TypeId,
    ) -> EmitResult<ContextMap> {
        let name = em.program().namespace(ns).name.clone();
        Ok(bool_entry("inA", name == "A"))
    }

    fn model_declaration(
        &mut self,
        em: &mut AssetEmitter<String>,
        model: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<String>> {
        let in_a = em
            .get_context()
            .get("inA")
            .and_then(ContextValue::as_bool)
            .unwrap_or(false);
        self.observed.push((name.to_string(), in_a));
        em.emit_model_properties(self, model)?;
        Ok(em.result_none())
    }
}

#[test]
fn namespace_context_propagates_lexically() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let string_ = program.add_scalar(None, "string");
    let bar = program.add_model(Some(global), "Bar");
    let a = program.add_namespace(global, "A");
    let foo = program.add_model(Some(a), "Foo");
    program.add_property(foo, "p", string_);
    program.add_property(bar, "p", foo);

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = NamespaceContextEmitter::default();
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();

    // Child namespaces walk first, and the reference from Bar to Foo is a
    // memo hit under Foo's own lexical context.
    assert_eq!(
        emitter.observed,
        vec![("Foo".to_string(), true), ("Bar".to_string(), false)]
    );
}

#[derive(Default)]
struct ReferenceContextEmitter {
    declaration_fires: Vec<(String, bool)>,
    reference_context_calls: usize,
}

impl TypeEmitter<String> for ReferenceContextEmitter {
    fn model_declaration_reference_context(
        &mut self,
        em: &mut AssetEmitter<String>,
        model: TypeId,
    ) -> EmitResult<ContextMap> {
        self.reference_context_calls += 1;
        if em.program().model(model).name == "Qux" {
            Ok(ContextMap::new())
        } else {
            Ok(bool_entry("ref", true))
        }
    }

    fn model_declaration(
        &mut self,
        em: &mut AssetEmitter<String>,
        model: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<String>> {
        let has_ref = em.get_context().contains_key("ref");
        self.declaration_fires.push((name.to_string(), has_ref));
        em.emit_model_properties(self, model)?;
        Ok(em.result_none())
    }
}

#[test]
fn reference_context_forces_distinct_emissions() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let qux = program.add_model(Some(global), "Qux");
    let foo = program.add_model(Some(global), "Foo");
    let bar = program.add_model(Some(global), "Bar");
    program.add_property(foo, "p", qux);
    program.add_property(bar, "p", qux);

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = ReferenceContextEmitter::default();
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();

    // Qux is emitted twice: once under the incoming reference context and
    // once bare from the walk. Each referencing model carries {ref} from
    // its own reference-context contribution.
    assert_eq!(emitter.reference_context_calls, 4);
    assert_eq!(emitter.declaration_fires.len(), 4);
    assert_eq!(
        emitter.declaration_fires,
        vec![
            ("Qux".to_string(), false),
            ("Foo".to_string(), true),
            ("Qux".to_string(), true),
            ("Bar".to_string(), true),
        ]
    );
}

#[derive(Default)]
struct FileRoutingEmitter;

impl TypeEmitter<String> for FileRoutingEmitter {
    fn model_declaration_context(
        &mut self,
        em: &mut AssetEmitter<String>,
        model: TypeId,
    ) -> EmitResult<ContextMap> {
        let name = em.program().model(model).name.clone();
        let file = em.create_source_file(&format!("{name}.ts"));
        let scope = em.source_file(file).global_scope;
        let mut ctx = ContextMap::new();
        ctx.insert(SCOPE_KEY.to_string(), ContextValue::Scope(scope));
        Ok(ctx)
    }

    fn model_declaration(
        &mut self,
        em: &mut AssetEmitter<String>,
        _model: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<String>> {
        em.result_declaration(name, format!("interface {name} {{}}"))
    }
}

#[test]
fn per_declaration_file_routing() {
    let mut program = Program::new();
    let global = program.global_namespace();
    for name in ["Apple", "Banana", "Cherry"] {
        program.add_model(Some(global), name);
    }

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = FileRoutingEmitter;
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();

    let mut host = MemoryHost::new();
    em.write_output(&mut emitter, &mut host).unwrap();

    assert_eq!(host.len(), 3);
    for name in ["Apple", "Banana", "Cherry"] {
        let contents = host.get(&format!("{name}.ts")).unwrap();
        assert_eq!(contents, format!("interface {name} {{}}\n"));
    }
}

/// Routes one declaration into a nested namespace scope; references from
/// the file root qualify through the scope diff's downward path.
#[derive(Default)]
struct ScopedEmitter {
    root: Option<quill::ScopeId>,
    nested: Option<quill::ScopeId>,
}

impl TypeEmitter<String> for ScopedEmitter {
    fn program_context(&mut self, em: &mut AssetEmitter<String>) -> EmitResult<ContextMap> {
        let file = em.create_source_file("api.ts");
        let root = em.source_file(file).global_scope;
        self.root = Some(root);
        self.nested = Some(em.create_scope("Api", root));
        let mut ctx = ContextMap::new();
        ctx.insert(SCOPE_KEY.to_string(), ContextValue::Scope(root));
        Ok(ctx)
    }

    fn model_declaration_context(
        &mut self,
        em: &mut AssetEmitter<String>,
        model: TypeId,
    ) -> EmitResult<ContextMap> {
        let mut ctx = ContextMap::new();
        if em.program().model(model).name == "Foo" {
            if let Some(nested) = self.nested {
                ctx.insert(SCOPE_KEY.to_string(), ContextValue::Scope(nested));
            }
        }
        Ok(ctx)
    }

    fn model_declaration(
        &mut self,
        em: &mut AssetEmitter<String>,
        model: TypeId,
        name: &str,
    ) -> EmitResult<EmitterOutput<String>> {
        let properties: Vec<TypeId> = em
            .program()
            .model(model)
            .properties
            .values()
            .copied()
            .collect();
        let mut builder = quill::StringBuilder::new();
        for property in properties {
            builder.push(em.emit_model_property(self, property)?);
        }
        em.result_declaration(name, builder.reduce())
    }

    fn model_property_literal(
        &mut self,
        em: &mut AssetEmitter<String>,
        property: TypeId,
    ) -> EmitResult<EmitterOutput<String>> {
        let ty = em.program().property(property).ty;
        Ok(EmitterOutput::Entity(em.emit_type_reference(self, ty)?))
    }

    fn reference(
        &mut self,
        em: &mut AssetEmitter<String>,
        decl: quill::DeclId,
        _path_up: &[quill::ScopeId],
        path_down: &[quill::ScopeId],
        _common: Option<quill::ScopeId>,
    ) -> EmitResult<EmitterOutput<String>> {
        let mut parts: Vec<String> = path_down
            .iter()
            .map(|&scope| em.scope(scope).name.clone())
            .collect();
        parts.push(em.declaration(decl).name.clone());
        Ok(em.result_raw_code(parts.join(".")))
    }
}

#[test]
fn references_qualify_through_the_scope_diff() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let foo = program.add_model(Some(global), "Foo");
    let bar = program.add_model(Some(global), "Bar");
    program.add_property(bar, "p", foo);

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = ScopedEmitter::default();
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();

    let root = emitter.root.unwrap();
    let bar_decl = em
        .scope(root)
        .declarations
        .iter()
        .map(|&id| em.declaration(id))
        .find(|d| d.name == "Bar")
        .unwrap();
    assert_eq!(bar_decl.value.resolved().unwrap(), "Api.Foo");

    let nested = emitter.nested.unwrap();
    let nested_names: Vec<&str> = em
        .scope(nested)
        .declarations
        .iter()
        .map(|&id| em.declaration(id).name.as_str())
        .collect();
    assert_eq!(nested_names, ["Foo"]);
}

#[derive(Default)]
struct CountingEmitter {
    model_declaration_calls: usize,
}

impl TypeEmitter<String> for CountingEmitter {
    fn model_declaration(
        &mut self,
        em: &mut AssetEmitter<String>,
        _model: TypeId,
        _name: &str,
    ) -> EmitResult<EmitterOutput<String>> {
        self.model_declaration_calls += 1;
        Ok(em.result_none())
    }
}

#[test]
fn repeated_emit_type_hits_the_memo() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let foo = program.add_model(Some(global), "Foo");

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = CountingEmitter::default();
    for _ in 0..3 {
        em.emit_type(&mut emitter, foo).unwrap();
    }
    assert_eq!(emitter.model_declaration_calls, 1);
}

#[test]
fn template_declarations_are_skipped_by_the_walk() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let boxed = program.add_model(Some(global), "Box");
    program.mark_template_declaration(boxed);
    program.add_model(Some(global), "Plain");

    let ctx = EmitterContext::new(program);
    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = CountingEmitter::default();
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();
    assert_eq!(emitter.model_declaration_calls, 1);
}

#[test]
fn lib_namespaces_are_skipped_unless_opted_in() {
    let mut program = Program::new();
    let global = program.global_namespace();
    let lib = program.add_lib_namespace(global, "Std");
    program.add_model(Some(lib), "Builtin");
    program.add_model(Some(global), "Mine");

    let ctx = EmitterContext::new(program);

    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = CountingEmitter::default();
    em.emit_program(&mut emitter, EmitProgramOptions::default())
        .unwrap();
    assert_eq!(emitter.model_declaration_calls, 1);

    let mut em = ctx.create_asset_emitter::<String>();
    let mut emitter = CountingEmitter::default();
    em.emit_program(
        &mut emitter,
        EmitProgramOptions {
            emit_lib_namespace: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(emitter.model_declaration_calls, 2);
}
