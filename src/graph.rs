// src/graph.rs
//
// The input type graph: an arena of typed nodes addressed by TypeId handles.
//
// The graph is produced by a compiler front end (or by tests) through the
// `&mut` builder methods on `Program` and is immutable once emission starts;
// the emitter only ever holds it behind `Rc`.

use indexmap::IndexMap;
use smallvec::SmallVec;

/// Handle to a node in the type graph (Copy, trivial Eq/Hash).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(u32);

impl TypeId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Inline storage for short id lists (namespace chains, enclosure stacks).
pub type TypeIdVec = SmallVec<[TypeId; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Namespace,
    Model,
    ModelProperty,
    Operation,
    Interface,
    Union,
    UnionVariant,
    Enum,
    EnumMember,
    Tuple,
    BooleanLiteral,
    StringLiteral,
    NumericLiteral,
}

impl TypeKind {
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Namespace => "Namespace",
            TypeKind::Model => "Model",
            TypeKind::ModelProperty => "ModelProperty",
            TypeKind::Operation => "Operation",
            TypeKind::Interface => "Interface",
            TypeKind::Union => "Union",
            TypeKind::UnionVariant => "UnionVariant",
            TypeKind::Enum => "Enum",
            TypeKind::EnumMember => "EnumMember",
            TypeKind::Tuple => "Tuple",
            TypeKind::BooleanLiteral => "BooleanLiteral",
            TypeKind::StringLiteral => "StringLiteral",
            TypeKind::NumericLiteral => "NumericLiteral",
        }
    }
}

#[derive(Debug)]
pub struct NamespaceNode {
    /// Empty for the global namespace.
    pub name: String,
    pub parent: Option<TypeId>,
    pub namespaces: Vec<TypeId>,
    pub models: Vec<TypeId>,
    pub operations: Vec<TypeId>,
    pub enums: Vec<TypeId>,
    pub unions: Vec<TypeId>,
    pub interfaces: Vec<TypeId>,
    /// Standard-library namespace; the program walk skips it by default.
    pub lib: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ModelIndexer {
    pub key: TypeId,
    pub value: TypeId,
}

#[derive(Debug)]
pub struct ModelNode {
    /// Empty for anonymous model literals; "Array" for array instantiations.
    pub name: String,
    pub namespace: Option<TypeId>,
    /// Property name -> ModelProperty node, in insertion order.
    pub properties: IndexMap<String, TypeId>,
    pub base_model: Option<TypeId>,
    pub indexer: Option<ModelIndexer>,
    /// Intrinsic scalar name when this model is a built-in scalar.
    pub intrinsic: Option<String>,
    pub template_args: Vec<TypeId>,
    /// Declared template parameters without arguments; skipped by the walk.
    pub template_declaration: bool,
}

impl ModelNode {
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty() || self.name == "Array"
    }
}

#[derive(Debug)]
pub struct ModelPropertyNode {
    pub name: String,
    pub ty: TypeId,
    pub optional: bool,
    pub model: Option<TypeId>,
}

#[derive(Debug)]
pub struct OperationNode {
    pub name: String,
    pub namespace: Option<TypeId>,
    /// Set when the operation is declared inside an interface.
    pub interface: Option<TypeId>,
    /// Anonymous model holding the parameters.
    pub parameters: TypeId,
    pub return_type: TypeId,
}

#[derive(Debug)]
pub struct InterfaceNode {
    pub name: String,
    pub namespace: Option<TypeId>,
    pub operations: Vec<TypeId>,
}

#[derive(Debug)]
pub struct UnionNode {
    /// None for anonymous (expression) unions.
    pub name: Option<String>,
    pub namespace: Option<TypeId>,
    pub variants: Vec<TypeId>,
    pub template_args: Vec<TypeId>,
    pub template_declaration: bool,
}

#[derive(Debug)]
pub struct UnionVariantNode {
    pub name: Option<String>,
    pub union: TypeId,
    pub ty: TypeId,
}

#[derive(Debug)]
pub struct EnumNode {
    pub name: String,
    pub namespace: Option<TypeId>,
    pub members: Vec<TypeId>,
}

#[derive(Debug, Clone)]
pub enum EnumMemberValue {
    Str(String),
    Num(f64),
}

#[derive(Debug)]
pub struct EnumMemberNode {
    pub name: String,
    pub value: Option<EnumMemberValue>,
    pub owner: TypeId,
}

#[derive(Debug)]
pub struct TupleNode {
    pub values: Vec<TypeId>,
}

#[derive(Debug)]
pub enum TypeNode {
    Namespace(NamespaceNode),
    Model(ModelNode),
    ModelProperty(ModelPropertyNode),
    Operation(OperationNode),
    Interface(InterfaceNode),
    Union(UnionNode),
    UnionVariant(UnionVariantNode),
    Enum(EnumNode),
    EnumMember(EnumMemberNode),
    Tuple(TupleNode),
    BooleanLiteral(bool),
    StringLiteral(String),
    NumericLiteral(f64),
}

/// The type graph plus its distinguished global namespace.
#[derive(Debug)]
pub struct Program {
    nodes: Vec<TypeNode>,
    global_namespace: TypeId,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        let mut program = Program {
            nodes: Vec::new(),
            global_namespace: TypeId(0),
        };
        program.global_namespace = program.alloc(TypeNode::Namespace(NamespaceNode {
            name: String::new(),
            parent: None,
            namespaces: Vec::new(),
            models: Vec::new(),
            operations: Vec::new(),
            enums: Vec::new(),
            unions: Vec::new(),
            interfaces: Vec::new(),
            lib: false,
        }));
        program
    }

    fn alloc(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn global_namespace(&self) -> TypeId {
        self.global_namespace
    }

    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: TypeId) -> TypeKind {
        match self.node(id) {
            TypeNode::Namespace(_) => TypeKind::Namespace,
            TypeNode::Model(_) => TypeKind::Model,
            TypeNode::ModelProperty(_) => TypeKind::ModelProperty,
            TypeNode::Operation(_) => TypeKind::Operation,
            TypeNode::Interface(_) => TypeKind::Interface,
            TypeNode::Union(_) => TypeKind::Union,
            TypeNode::UnionVariant(_) => TypeKind::UnionVariant,
            TypeNode::Enum(_) => TypeKind::Enum,
            TypeNode::EnumMember(_) => TypeKind::EnumMember,
            TypeNode::Tuple(_) => TypeKind::Tuple,
            TypeNode::BooleanLiteral(_) => TypeKind::BooleanLiteral,
            TypeNode::StringLiteral(_) => TypeKind::StringLiteral,
            TypeNode::NumericLiteral(_) => TypeKind::NumericLiteral,
        }
    }

    // ========================================================================
    // Kind-checked accessors. Handing these a foreign-kind id is a caller bug.
    // ========================================================================

    pub fn namespace(&self, id: TypeId) -> &NamespaceNode {
        match self.node(id) {
            TypeNode::Namespace(n) => n,
            other => panic!("expected Namespace node, found {:?}", other),
        }
    }

    pub fn model(&self, id: TypeId) -> &ModelNode {
        match self.node(id) {
            TypeNode::Model(m) => m,
            other => panic!("expected Model node, found {:?}", other),
        }
    }

    pub fn property(&self, id: TypeId) -> &ModelPropertyNode {
        match self.node(id) {
            TypeNode::ModelProperty(p) => p,
            other => panic!("expected ModelProperty node, found {:?}", other),
        }
    }

    pub fn operation(&self, id: TypeId) -> &OperationNode {
        match self.node(id) {
            TypeNode::Operation(o) => o,
            other => panic!("expected Operation node, found {:?}", other),
        }
    }

    pub fn interface(&self, id: TypeId) -> &InterfaceNode {
        match self.node(id) {
            TypeNode::Interface(i) => i,
            other => panic!("expected Interface node, found {:?}", other),
        }
    }

    pub fn union(&self, id: TypeId) -> &UnionNode {
        match self.node(id) {
            TypeNode::Union(u) => u,
            other => panic!("expected Union node, found {:?}", other),
        }
    }

    pub fn variant(&self, id: TypeId) -> &UnionVariantNode {
        match self.node(id) {
            TypeNode::UnionVariant(v) => v,
            other => panic!("expected UnionVariant node, found {:?}", other),
        }
    }

    pub fn enumeration(&self, id: TypeId) -> &EnumNode {
        match self.node(id) {
            TypeNode::Enum(e) => e,
            other => panic!("expected Enum node, found {:?}", other),
        }
    }

    pub fn enum_member(&self, id: TypeId) -> &EnumMemberNode {
        match self.node(id) {
            TypeNode::EnumMember(m) => m,
            other => panic!("expected EnumMember node, found {:?}", other),
        }
    }

    pub fn tuple(&self, id: TypeId) -> &TupleNode {
        match self.node(id) {
            TypeNode::Tuple(t) => t,
            other => panic!("expected Tuple node, found {:?}", other),
        }
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// Declaration types reset the lexical enclosure stack: Namespace, named
    /// (non-anonymous) Model, Interface, Enum, Operation, named Union.
    pub fn is_declaration(&self, id: TypeId) -> bool {
        match self.node(id) {
            TypeNode::Namespace(_)
            | TypeNode::Interface(_)
            | TypeNode::Enum(_)
            | TypeNode::Operation(_) => true,
            TypeNode::Model(m) => !m.is_anonymous(),
            TypeNode::Union(u) => u.name.is_some(),
            _ => false,
        }
    }

    /// Declared-but-uninstantiated templates are skipped by the program walk.
    pub fn is_template_declaration(&self, id: TypeId) -> bool {
        match self.node(id) {
            TypeNode::Model(m) => m.template_declaration,
            TypeNode::Union(u) => u.template_declaration,
            _ => false,
        }
    }

    /// The namespace immediately containing a declarative node.
    pub fn containing_namespace(&self, id: TypeId) -> Option<TypeId> {
        match self.node(id) {
            TypeNode::Namespace(n) => n.parent,
            TypeNode::Model(m) => m.namespace,
            TypeNode::Interface(i) => i.namespace,
            TypeNode::Enum(e) => e.namespace,
            TypeNode::Union(u) => u.namespace,
            TypeNode::Operation(o) => match o.interface {
                Some(iface) => self.interface(iface).namespace,
                None => o.namespace,
            },
            TypeNode::ModelProperty(p) => p.model.and_then(|m| self.containing_namespace(m)),
            TypeNode::EnumMember(m) => self.containing_namespace(m.owner),
            TypeNode::UnionVariant(v) => self.containing_namespace(v.union),
            _ => None,
        }
    }

    /// Chain of non-empty enclosing namespaces, outermost first. The global
    /// (unnamed) namespace never appears.
    pub fn namespace_chain(&self, id: TypeId) -> TypeIdVec {
        let mut chain = TypeIdVec::new();
        let mut cursor = self.containing_namespace(id);
        while let Some(ns) = cursor {
            let node = self.namespace(ns);
            if !node.name.is_empty() {
                chain.push(ns);
            }
            cursor = node.parent;
        }
        chain.reverse();
        chain
    }

    // ========================================================================
    // Builder methods (front-end / test surface)
    // ========================================================================

    pub fn add_namespace(&mut self, parent: TypeId, name: &str) -> TypeId {
        let id = self.alloc(TypeNode::Namespace(NamespaceNode {
            name: name.to_string(),
            parent: Some(parent),
            namespaces: Vec::new(),
            models: Vec::new(),
            operations: Vec::new(),
            enums: Vec::new(),
            unions: Vec::new(),
            interfaces: Vec::new(),
            lib: false,
        }));
        self.namespace_mut(parent).namespaces.push(id);
        id
    }

    /// A standard-library namespace: skipped by the walk unless opted in.
    pub fn add_lib_namespace(&mut self, parent: TypeId, name: &str) -> TypeId {
        let id = self.add_namespace(parent, name);
        self.namespace_mut(id).lib = true;
        id
    }

    pub fn add_model(&mut self, namespace: Option<TypeId>, name: &str) -> TypeId {
        let id = self.alloc(TypeNode::Model(ModelNode {
            name: name.to_string(),
            namespace,
            properties: IndexMap::new(),
            base_model: None,
            indexer: None,
            intrinsic: None,
            template_args: Vec::new(),
            template_declaration: false,
        }));
        if let Some(ns) = namespace {
            if !name.is_empty() {
                self.namespace_mut(ns).models.push(id);
            }
        }
        id
    }

    /// An intrinsic scalar model (`string`, `int32`, ...).
    pub fn add_scalar(&mut self, namespace: Option<TypeId>, name: &str) -> TypeId {
        let id = self.add_model(namespace, name);
        self.model_mut(id).intrinsic = Some(name.to_string());
        id
    }

    pub fn add_property(&mut self, model: TypeId, name: &str, ty: TypeId) -> TypeId {
        let id = self.alloc(TypeNode::ModelProperty(ModelPropertyNode {
            name: name.to_string(),
            ty,
            optional: false,
            model: Some(model),
        }));
        self.model_mut(model).properties.insert(name.to_string(), id);
        id
    }

    pub fn add_optional_property(&mut self, model: TypeId, name: &str, ty: TypeId) -> TypeId {
        let id = self.add_property(model, name, ty);
        if let TypeNode::ModelProperty(p) = &mut self.nodes[id.0 as usize] {
            p.optional = true;
        }
        id
    }

    pub fn set_base_model(&mut self, model: TypeId, base: TypeId) {
        self.model_mut(model).base_model = Some(base);
    }

    pub fn set_indexer(&mut self, model: TypeId, key: TypeId, value: TypeId) {
        self.model_mut(model).indexer = Some(ModelIndexer { key, value });
    }

    pub fn set_template_args(&mut self, model: TypeId, args: Vec<TypeId>) {
        self.model_mut(model).template_args = args;
    }

    pub fn mark_template_declaration(&mut self, id: TypeId) {
        match &mut self.nodes[id.0 as usize] {
            TypeNode::Model(m) => m.template_declaration = true,
            TypeNode::Union(u) => u.template_declaration = true,
            other => panic!("cannot mark {:?} as a template declaration", other),
        }
    }

    pub fn add_operation(
        &mut self,
        namespace: Option<TypeId>,
        interface: Option<TypeId>,
        name: &str,
        parameters: TypeId,
        return_type: TypeId,
    ) -> TypeId {
        let id = self.alloc(TypeNode::Operation(OperationNode {
            name: name.to_string(),
            namespace,
            interface,
            parameters,
            return_type,
        }));
        if let Some(iface) = interface {
            match &mut self.nodes[iface.0 as usize] {
                TypeNode::Interface(i) => i.operations.push(id),
                other => panic!("expected Interface node, found {:?}", other),
            }
        } else if let Some(ns) = namespace {
            self.namespace_mut(ns).operations.push(id);
        }
        id
    }

    pub fn add_interface(&mut self, namespace: Option<TypeId>, name: &str) -> TypeId {
        let id = self.alloc(TypeNode::Interface(InterfaceNode {
            name: name.to_string(),
            namespace,
            operations: Vec::new(),
        }));
        if let Some(ns) = namespace {
            self.namespace_mut(ns).interfaces.push(id);
        }
        id
    }

    pub fn add_enum(&mut self, namespace: Option<TypeId>, name: &str) -> TypeId {
        let id = self.alloc(TypeNode::Enum(EnumNode {
            name: name.to_string(),
            namespace,
            members: Vec::new(),
        }));
        if let Some(ns) = namespace {
            self.namespace_mut(ns).enums.push(id);
        }
        id
    }

    pub fn add_enum_member(
        &mut self,
        owner: TypeId,
        name: &str,
        value: Option<EnumMemberValue>,
    ) -> TypeId {
        let id = self.alloc(TypeNode::EnumMember(EnumMemberNode {
            name: name.to_string(),
            value,
            owner,
        }));
        match &mut self.nodes[owner.0 as usize] {
            TypeNode::Enum(e) => e.members.push(id),
            other => panic!("expected Enum node, found {:?}", other),
        }
        id
    }

    pub fn add_union(&mut self, namespace: Option<TypeId>, name: Option<&str>) -> TypeId {
        let id = self.alloc(TypeNode::Union(UnionNode {
            name: name.map(str::to_string),
            namespace,
            variants: Vec::new(),
            template_args: Vec::new(),
            template_declaration: false,
        }));
        if let (Some(ns), Some(_)) = (namespace, name) {
            self.namespace_mut(ns).unions.push(id);
        }
        id
    }

    pub fn add_union_variant(&mut self, union: TypeId, name: Option<&str>, ty: TypeId) -> TypeId {
        let id = self.alloc(TypeNode::UnionVariant(UnionVariantNode {
            name: name.map(str::to_string),
            union,
            ty,
        }));
        match &mut self.nodes[union.0 as usize] {
            TypeNode::Union(u) => u.variants.push(id),
            other => panic!("expected Union node, found {:?}", other),
        }
        id
    }

    pub fn add_tuple(&mut self, values: Vec<TypeId>) -> TypeId {
        self.alloc(TypeNode::Tuple(TupleNode { values }))
    }

    pub fn add_boolean_literal(&mut self, value: bool) -> TypeId {
        self.alloc(TypeNode::BooleanLiteral(value))
    }

    pub fn add_string_literal(&mut self, value: &str) -> TypeId {
        self.alloc(TypeNode::StringLiteral(value.to_string()))
    }

    pub fn add_numeric_literal(&mut self, value: f64) -> TypeId {
        self.alloc(TypeNode::NumericLiteral(value))
    }

    fn namespace_mut(&mut self, id: TypeId) -> &mut NamespaceNode {
        match &mut self.nodes[id.0 as usize] {
            TypeNode::Namespace(n) => n,
            other => panic!("expected Namespace node, found {:?}", other),
        }
    }

    fn model_mut(&mut self, id: TypeId) -> &mut ModelNode {
        match &mut self.nodes[id.0 as usize] {
            TypeNode::Model(m) => m,
            other => panic!("expected Model node, found {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_namespace_is_unnamed() {
        let program = Program::new();
        assert_eq!(program.namespace(program.global_namespace()).name, "");
    }

    #[test]
    fn namespace_chain_skips_global() {
        let mut program = Program::new();
        let global = program.global_namespace();
        let a = program.add_namespace(global, "A");
        let b = program.add_namespace(a, "B");
        let model = program.add_model(Some(b), "Widget");

        let chain = program.namespace_chain(model);
        assert_eq!(chain.as_slice(), &[a, b]);
        assert!(program.namespace_chain(a).is_empty());
    }

    #[test]
    fn anonymous_models_are_not_declarations() {
        let mut program = Program::new();
        let global = program.global_namespace();
        let named = program.add_model(Some(global), "Widget");
        let anon = program.add_model(None, "");
        let array = program.add_model(None, "Array");

        assert!(program.is_declaration(named));
        assert!(!program.is_declaration(anon));
        assert!(!program.is_declaration(array));
    }

    #[test]
    fn properties_preserve_insertion_order() {
        let mut program = Program::new();
        let model = program.add_model(None, "Widget");
        let s = program.add_scalar(None, "string");
        program.add_property(model, "z", s);
        program.add_property(model, "a", s);

        let names: Vec<&String> = program.model(model).properties.keys().collect();
        assert_eq!(names, ["z", "a"]);
    }

    #[test]
    fn interface_operation_knows_namespace() {
        let mut program = Program::new();
        let global = program.global_namespace();
        let ns = program.add_namespace(global, "Api");
        let iface = program.add_interface(Some(ns), "Things");
        let params = program.add_model(None, "");
        let ret = program.add_scalar(None, "string");
        let op = program.add_operation(None, Some(iface), "get", params, ret);

        assert_eq!(program.containing_namespace(op), Some(ns));
        assert_eq!(program.interface(iface).operations, vec![op]);
    }
}
