// src/op_key.rs
//
// Kind -> operation-key dispatch table. The camelCase names are part of the
// external contract (they appear in traces and error text); dispatch itself
// goes through the enum.

use crate::graph::{Program, TypeId, TypeNode};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum OpKey {
    Namespace,
    ModelDeclaration,
    ModelInstantiation,
    ModelLiteral,
    ModelScalar,
    ModelProperties,
    ModelPropertyLiteral,
    ModelPropertyReference,
    EnumDeclaration,
    EnumMember,
    EnumMembers,
    UnionDeclaration,
    UnionInstantiation,
    UnionLiteral,
    UnionVariant,
    UnionVariants,
    InterfaceDeclaration,
    InterfaceOperations,
    InterfaceOperationDeclaration,
    OperationDeclaration,
    OperationParameters,
    OperationReturnType,
    TupleLiteral,
    TupleLiteralValues,
    BooleanLiteral,
    StringLiteral,
    NumericLiteral,
}

impl OpKey {
    pub fn name(self) -> &'static str {
        match self {
            OpKey::Namespace => "namespace",
            OpKey::ModelDeclaration => "modelDeclaration",
            OpKey::ModelInstantiation => "modelInstantiation",
            OpKey::ModelLiteral => "modelLiteral",
            OpKey::ModelScalar => "modelScalar",
            OpKey::ModelProperties => "modelProperties",
            OpKey::ModelPropertyLiteral => "modelPropertyLiteral",
            OpKey::ModelPropertyReference => "modelPropertyReference",
            OpKey::EnumDeclaration => "enumDeclaration",
            OpKey::EnumMember => "enumMember",
            OpKey::EnumMembers => "enumMembers",
            OpKey::UnionDeclaration => "unionDeclaration",
            OpKey::UnionInstantiation => "unionInstantiation",
            OpKey::UnionLiteral => "unionLiteral",
            OpKey::UnionVariant => "unionVariant",
            OpKey::UnionVariants => "unionVariants",
            OpKey::InterfaceDeclaration => "interfaceDeclaration",
            OpKey::InterfaceOperations => "interfaceOperations",
            OpKey::InterfaceOperationDeclaration => "interfaceOperationDeclaration",
            OpKey::OperationDeclaration => "operationDeclaration",
            OpKey::OperationParameters => "operationParameters",
            OpKey::OperationReturnType => "operationReturnType",
            OpKey::TupleLiteral => "tupleLiteral",
            OpKey::TupleLiteralValues => "tupleLiteralValues",
            OpKey::BooleanLiteral => "booleanLiteral",
            OpKey::StringLiteral => "stringLiteral",
            OpKey::NumericLiteral => "numericLiteral",
        }
    }

    /// Declaration keys carry the declaration name as an extra argument.
    pub fn is_declaration_key(self) -> bool {
        matches!(
            self,
            OpKey::ModelDeclaration
                | OpKey::ModelInstantiation
                | OpKey::UnionDeclaration
                | OpKey::UnionInstantiation
                | OpKey::OperationDeclaration
                | OpKey::InterfaceOperationDeclaration
                | OpKey::InterfaceDeclaration
                | OpKey::EnumDeclaration
        )
    }

    /// Keys exempt from the reference-context half of the context fold:
    /// the three literals, intrinsic scalars, and enum members.
    pub fn has_reference_context(self) -> bool {
        !matches!(
            self,
            OpKey::BooleanLiteral
                | OpKey::StringLiteral
                | OpKey::NumericLiteral
                | OpKey::ModelScalar
                | OpKey::EnumMember
        )
    }
}

/// Derive the operation key for a type node.
pub fn op_key_for(program: &Program, ty: TypeId) -> OpKey {
    match program.node(ty) {
        TypeNode::Model(m) => {
            if m.intrinsic.is_some() {
                OpKey::ModelScalar
            } else if m.is_anonymous() {
                OpKey::ModelLiteral
            } else if m.template_args.is_empty() {
                OpKey::ModelDeclaration
            } else {
                OpKey::ModelInstantiation
            }
        }
        TypeNode::Union(u) => {
            if u.name.is_none() {
                OpKey::UnionLiteral
            } else if u.template_args.is_empty() {
                OpKey::UnionDeclaration
            } else {
                OpKey::UnionInstantiation
            }
        }
        TypeNode::Operation(o) => {
            if o.interface.is_some() {
                OpKey::InterfaceOperationDeclaration
            } else {
                OpKey::OperationDeclaration
            }
        }
        TypeNode::Interface(_) => OpKey::InterfaceDeclaration,
        TypeNode::Enum(_) => OpKey::EnumDeclaration,
        TypeNode::EnumMember(_) => OpKey::EnumMember,
        TypeNode::UnionVariant(_) => OpKey::UnionVariant,
        TypeNode::Tuple(_) => OpKey::TupleLiteral,
        TypeNode::Namespace(_) => OpKey::Namespace,
        TypeNode::ModelProperty(_) => OpKey::ModelPropertyLiteral,
        TypeNode::BooleanLiteral(_) => OpKey::BooleanLiteral,
        TypeNode::StringLiteral(_) => OpKey::StringLiteral,
        TypeNode::NumericLiteral(_) => OpKey::NumericLiteral,
    }
}
