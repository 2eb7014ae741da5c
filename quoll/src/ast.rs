use compact_str::CompactString;

use crate::arithmetic::Exponent;
use crate::span::Span;

/// A symbolic unit expression, as written in `unit` declarations, variable
/// annotations and unit-assignment expressions (e.g. `kg·m/s^2`, `mm^2`,
/// `1000 m`). Evaluated against the unit registry.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitExpression {
    /// The dimensionless unit.
    Unity,
    Identifier(CompactString),
    /// A scalar conversion factor applied to a unit (`1000 m`).
    Scale(f64, Box<UnitExpression>),
    Multiply(Box<UnitExpression>, Box<UnitExpression>),
    Divide(Box<UnitExpression>, Box<UnitExpression>),
    Power(Box<UnitExpression>, Exponent),
}

impl UnitExpression {
    pub fn identifier(name: impl Into<CompactString>) -> Self {
        UnitExpression::Identifier(name.into())
    }
}

/// Index of an expression node in a [`Program`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Index of a declaration in a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    LogicalNeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Power,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    Equal,
    NotEqual,
}

impl BinaryOperator {
    pub fn is_arithmetic(self) -> bool {
        use BinaryOperator::*;
        matches!(self, Add | Sub | Mul | Div | Power)
    }

    pub fn is_comparison(self) -> bool {
        !self.is_arithmetic()
    }
}

/// Expression node kinds. This is a closed union: the type checker matches
/// on it exhaustively, so an unhandled node kind is a compile error rather
/// than a runtime fault.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Scalar(f64),
    BoolConstant(bool),
    StringConstant(CompactString),
    /// A bare unit literal (`{mm}`), not yet attached to a value.
    UnitLiteral(UnitExpression),
    /// A name reference. Name resolution happens upstream: an unresolved
    /// reference arrives with `None` and has already been diagnosed there.
    Identifier(CompactString, Option<DeclId>),
    UnaryOperator {
        op: UnaryOperator,
        operand: NodeId,
    },
    BinaryOperator {
        op: BinaryOperator,
        lhs: NodeId,
        rhs: NodeId,
    },
    Group(NodeId),
    /// `if c1 then b1 [else if c2 then b2 ...] otherwise e`.
    If {
        branches: Vec<(NodeId, NodeId)>,
        otherwise: NodeId,
    },
    /// Attaches a unit to a value (`400{mm^2}`), elevating it into a
    /// quantity.
    UnitAssignment {
        value: NodeId,
        unit: UnitExpression,
    },
    /// Instantiation of an element declaration.
    Call {
        name: CompactString,
        target: Option<DeclId>,
        arguments: Vec<NodeId>,
    },
    /// One argument of a call, bound to a property of the target element.
    Argument {
        property: Option<DeclId>,
        value: NodeId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub span: Span,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    Variable {
        /// Declared unit annotation, if any.
        annotation: Option<UnitExpression>,
        /// Defining expression, if any.
        value: Option<NodeId>,
    },
    /// An element type with typed properties (each a variable declaration).
    Element { properties: Vec<DeclId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: CompactString,
    pub span: Span,
    /// Set by the upstream reference checker when this declaration is part
    /// of a reference cycle. The type checker never recurses into a marked
    /// declaration.
    pub circular: bool,
    pub kind: DeclarationKind,
}

/// An arena-allocated, name-resolved expression tree. Pass results are
/// never stored on the tree itself; analyses keep side tables keyed by
/// [`NodeId`] / [`DeclId`].
#[derive(Debug, Clone, Default)]
pub struct Program {
    nodes: Vec<Node>,
    declarations: Vec<Declaration>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_node(&mut self, span: Span, kind: ExpressionKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { span, kind });
        id
    }

    pub fn push_declaration(&mut self, declaration: Declaration) -> DeclId {
        let id = DeclId(self.declarations.len() as u32);
        self.declarations.push(declaration);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.0 as usize]
    }

    pub fn declaration_ids(&self) -> impl Iterator<Item = DeclId> {
        (0..self.declarations.len() as u32).map(DeclId)
    }
}
