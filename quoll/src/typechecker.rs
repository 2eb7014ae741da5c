use std::collections::{HashMap, HashSet};

use compact_str::CompactString;
use log::debug;
use num_traits::FromPrimitive;
use thiserror::Error;

use crate::arithmetic::Rational;
use crate::ast::{
    BinaryOperator, DeclId, DeclarationKind, ExpressionKind, NodeId, Program, UnaryOperator,
    UnitExpression,
};
use crate::registry::{RegistryError, UnitRegistry};
use crate::result_type::ResultType;
use crate::span::Span;
use crate::unit::Unit;

/// A problem found during type checking. Diagnostics are collected in a
/// log; checking never aborts, so one pass surfaces every diagnosable
/// problem in the program.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeCheckDiagnostic {
    #[error("Incompatible units in binary operation: '{lhs}' vs '{rhs}'.")]
    BinaryUnitMismatch {
        span: Span,
        lhs: ResultType,
        rhs: ResultType,
    },

    #[error("Variable '{name}' is declared as '{declared}' but evaluates to '{inferred}'.")]
    VariableUnitDeclarationMismatch {
        span: Span,
        name: CompactString,
        declared: Unit,
        inferred: ResultType,
    },

    #[error("The defining expression of variable '{name}' could not be typed.")]
    VariableUnitEvaluationFailure { span: Span, name: CompactString },

    #[error("Variable '{name}' carries the unit '{inferred}' but has no explicit unit annotation.")]
    MissingUnitAnnotation {
        span: Span,
        name: CompactString,
        inferred: Unit,
    },

    #[error("Argument for property '{property}' has type '{actual}', expected '{expected}'.")]
    ArgumentUnitMismatch {
        span: Span,
        property: CompactString,
        expected: ResultType,
        actual: ResultType,
    },

    #[error("Condition must be a boolean, got '{actual}'.")]
    IfConditionNotBoolean { span: Span, actual: ResultType },

    #[error("Branch has type '{actual}', which is incompatible with '{expected}'.")]
    IfBranchTypeMismatch {
        span: Span,
        expected: ResultType,
        actual: ResultType,
    },

    #[error("A string can not be used in a numeric context.")]
    StringUsedInNumericContext { span: Span },

    #[error("The exponent must be a literal numeric constant.")]
    NonLiteralExponent { span: Span },

    #[error("Unknown unit '{symbol}'.")]
    UnknownUnit {
        span: Span,
        symbol: String,
        suggestion: Option<String>,
    },
}

impl TypeCheckDiagnostic {
    pub fn span(&self) -> Span {
        use TypeCheckDiagnostic::*;
        match self {
            BinaryUnitMismatch { span, .. }
            | VariableUnitDeclarationMismatch { span, .. }
            | VariableUnitEvaluationFailure { span, .. }
            | MissingUnitAnnotation { span, .. }
            | ArgumentUnitMismatch { span, .. }
            | IfConditionNotBoolean { span, .. }
            | IfBranchTypeMismatch { span, .. }
            | StringUsedInNumericContext { span }
            | NonLiteralExponent { span }
            | UnknownUnit { span, .. } => *span,
        }
    }
}

/// The per-session output of a checking pass: one side table per result
/// slot, keyed by arena ids, plus the diagnostic log. The tree itself is
/// never mutated.
#[derive(Debug, Default)]
pub struct TypeCheckResults {
    /// Inferred type per expression node (`None` = unresolved).
    pub node_types: HashMap<NodeId, Option<ResultType>>,
    /// Declared (annotated) type per declaration.
    pub assigned_types: HashMap<DeclId, Option<ResultType>>,
    /// Reconciled type per declaration.
    pub declaration_types: HashMap<DeclId, Option<ResultType>>,
    pub diagnostics: Vec<TypeCheckDiagnostic>,
}

impl TypeCheckResults {
    pub fn evaluated_type(&self, id: NodeId) -> Option<&ResultType> {
        self.node_types.get(&id).and_then(|t| t.as_ref())
    }

    pub fn assigned_type(&self, id: DeclId) -> Option<&ResultType> {
        self.assigned_types.get(&id).and_then(|t| t.as_ref())
    }

    pub fn declaration_type(&self, id: DeclId) -> Option<&ResultType> {
        self.declaration_types.get(&id).and_then(|t| t.as_ref())
    }

    pub fn is_error_free(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// A tree-walking pass that assigns a result-type classification to every
/// expression node and validates each unit-sensitive construct. Failed
/// checks degrade the affected node to unresolved and checking proceeds;
/// every declaration is visited exactly once (visits are memoized, since
/// declarations may be referenced before or after their textual position).
pub struct TypeChecker<'a> {
    program: &'a Program,
    units: &'a UnitRegistry,
    node_types: HashMap<NodeId, Option<ResultType>>,
    assigned_types: HashMap<DeclId, Option<ResultType>>,
    declaration_types: HashMap<DeclId, Option<ResultType>>,
    in_progress: HashSet<DeclId>,
    diagnostics: Vec<TypeCheckDiagnostic>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(units: &'a UnitRegistry, program: &'a Program) -> Self {
        TypeChecker {
            program,
            units,
            node_types: HashMap::new(),
            assigned_types: HashMap::new(),
            declaration_types: HashMap::new(),
            in_progress: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn check_program(mut self) -> TypeCheckResults {
        for id in self.program.declaration_ids() {
            self.check_declaration(id);
        }
        TypeCheckResults {
            node_types: self.node_types,
            assigned_types: self.assigned_types,
            declaration_types: self.declaration_types,
            diagnostics: self.diagnostics,
        }
    }

    fn check_declaration(&mut self, id: DeclId) -> Option<ResultType> {
        if let Some(cached) = self.declaration_types.get(&id) {
            return cached.clone();
        }

        let program = self.program;
        let declaration = program.declaration(id);

        // Respect the cycle marker placed by the upstream reference
        // checker: never recurse into a marked declaration, and raise no
        // diagnostics of our own for it.
        if declaration.circular {
            self.declaration_types.insert(id, None);
            return None;
        }

        // An unmarked cycle is a contract violation by the upstream pass,
        // not a user error.
        assert!(
            self.in_progress.insert(id),
            "reference cycle through '{}' was not marked by the upstream reference checker",
            declaration.name
        );

        let result = match &declaration.kind {
            DeclarationKind::Variable { annotation, value } => {
                let declared = annotation
                    .as_ref()
                    .and_then(|expr| self.resolve_unit_expression(expr, declaration.span));
                self.assigned_types
                    .insert(id, declared.clone().map(ResultType::Quantity));

                match value {
                    None => declared.map(ResultType::Quantity),
                    Some(value) => {
                        let inferred = self.check_expression(*value);
                        self.reconcile_variable(declaration.span, &declaration.name, declared, inferred)
                    }
                }
            }
            DeclarationKind::Element { properties } => {
                for property in properties {
                    self.check_declaration(*property);
                }
                Some(ResultType::Element(id))
            }
        };

        self.in_progress.remove(&id);
        debug!(
            "declaration '{}' typed as {:?}",
            declaration.name, result
        );
        self.declaration_types.insert(id, result.clone());
        result
    }

    /// The declared-vs-inferred reconciliation for a variable that has a
    /// defining expression.
    fn reconcile_variable(
        &mut self,
        span: Span,
        name: &CompactString,
        declared: Option<Unit>,
        inferred: Option<ResultType>,
    ) -> Option<ResultType> {
        match (declared, inferred) {
            (None, None) => None,
            (Some(_), None) => {
                self.diagnostics
                    .push(TypeCheckDiagnostic::VariableUnitEvaluationFailure {
                        span,
                        name: name.clone(),
                    });
                None
            }
            (None, Some(inferred)) => {
                if let ResultType::Quantity(unit) = &inferred {
                    if !unit.is_dimensionless() {
                        self.diagnostics
                            .push(TypeCheckDiagnostic::MissingUnitAnnotation {
                                span,
                                name: name.clone(),
                                inferred: unit.clone(),
                            });
                    }
                }
                Some(inferred)
            }
            (Some(declared), Some(inferred)) => {
                let expected = ResultType::Quantity(declared.clone());
                if expected.is_compatible_with(&inferred) {
                    Some(expected)
                } else {
                    self.diagnostics
                        .push(TypeCheckDiagnostic::VariableUnitDeclarationMismatch {
                            span,
                            name: name.clone(),
                            declared,
                            inferred,
                        });
                    None
                }
            }
        }
    }

    fn check_expression(&mut self, id: NodeId) -> Option<ResultType> {
        if let Some(cached) = self.node_types.get(&id) {
            return cached.clone();
        }

        let program = self.program;
        let node = program.node(id);

        let result = match &node.kind {
            ExpressionKind::Scalar(_) => Some(ResultType::Quantity(Unit::dimensionless())),
            ExpressionKind::BoolConstant(_) => Some(ResultType::Boolean),
            ExpressionKind::StringConstant(_) => Some(ResultType::String),
            ExpressionKind::UnitLiteral(expression) => self
                .resolve_unit_expression(expression, node.span)
                .map(ResultType::UnitLiteral),
            // Resolution failures have already been diagnosed upstream.
            ExpressionKind::Identifier(_, None) => None,
            ExpressionKind::Identifier(_, Some(declaration)) => {
                self.check_declaration(*declaration)
            }
            ExpressionKind::Group(inner) => self.check_expression(*inner),
            ExpressionKind::UnaryOperator { op, operand } => {
                let operand_type = self.check_expression(*operand);
                match (op, operand_type) {
                    (_, None) => None,
                    (UnaryOperator::Negate, Some(t @ ResultType::Quantity(_))) => Some(t),
                    (UnaryOperator::Negate, Some(t @ ResultType::UnitLiteral(_))) => Some(t),
                    (UnaryOperator::Negate, Some(ResultType::String)) => {
                        self.diagnostics
                            .push(TypeCheckDiagnostic::StringUsedInNumericContext {
                                span: program.node(*operand).span,
                            });
                        None
                    }
                    (UnaryOperator::LogicalNeg, Some(ResultType::Boolean)) => {
                        Some(ResultType::Boolean)
                    }
                    _ => None,
                }
            }
            ExpressionKind::BinaryOperator { op, lhs, rhs } => {
                self.check_binary(node.span, *op, *lhs, *rhs)
            }
            ExpressionKind::If {
                branches,
                otherwise,
            } => self.check_if(branches, *otherwise),
            ExpressionKind::UnitAssignment { value, unit } => {
                let value_type = self.check_expression(*value);
                match (self.resolve_unit_expression(unit, node.span), value_type) {
                    (None, _) | (_, None) => None,
                    (Some(unit), Some(ResultType::Quantity(v)))
                        if v.is_dimensionless() || v.equal_dimensions(&unit) =>
                    {
                        Some(ResultType::Quantity(unit))
                    }
                    (Some(_), Some(ResultType::String)) => {
                        self.diagnostics
                            .push(TypeCheckDiagnostic::StringUsedInNumericContext {
                                span: program.node(*value).span,
                            });
                        None
                    }
                    (Some(unit), Some(other)) => {
                        self.diagnostics
                            .push(TypeCheckDiagnostic::BinaryUnitMismatch {
                                span: node.span,
                                lhs: other,
                                rhs: ResultType::UnitLiteral(unit),
                            });
                        None
                    }
                }
            }
            ExpressionKind::Call {
                target, arguments, ..
            } => {
                for argument in arguments {
                    self.check_expression(*argument);
                }
                match target {
                    Some(declaration)
                        if matches!(
                            program.declaration(*declaration).kind,
                            DeclarationKind::Element { .. }
                        ) =>
                    {
                        Some(ResultType::Element(*declaration))
                    }
                    _ => None,
                }
            }
            ExpressionKind::Argument { property, value } => {
                let value_type = self.check_expression(*value);
                if let Some(property) = property {
                    let expected = self.check_declaration(*property);
                    if let (Some(expected), Some(actual)) = (&expected, &value_type) {
                        if !expected.is_compatible_with(actual) {
                            self.diagnostics
                                .push(TypeCheckDiagnostic::ArgumentUnitMismatch {
                                    span: program.node(*value).span,
                                    property: program.declaration(*property).name.clone(),
                                    expected: expected.clone(),
                                    actual: actual.clone(),
                                });
                        }
                    }
                }
                value_type
            }
        };

        self.node_types.insert(id, result.clone());
        result
    }

    fn check_binary(
        &mut self,
        span: Span,
        op: BinaryOperator,
        lhs_id: NodeId,
        rhs_id: NodeId,
    ) -> Option<ResultType> {
        let lhs_type = self.check_expression(lhs_id);
        let rhs_type = self.check_expression(rhs_id);
        let (Some(lhs_type), Some(rhs_type)) = (lhs_type, rhs_type) else {
            return None;
        };

        if op.is_comparison() {
            // Comparison failures intentionally do not log a diagnostic;
            // the node simply degrades to unresolved.
            return match (op, &lhs_type, &rhs_type) {
                (_, ResultType::Quantity(a), ResultType::Quantity(b)) => {
                    if a.equal_dimensions(b) {
                        Some(ResultType::Boolean)
                    } else {
                        None
                    }
                }
                (_, ResultType::UnitLiteral(a), ResultType::UnitLiteral(b)) => {
                    if a.equal_dimensions(b) {
                        Some(ResultType::Boolean)
                    } else {
                        None
                    }
                }
                (BinaryOperator::Equal | BinaryOperator::NotEqual, a, b)
                    if a.is_compatible_with(b) =>
                {
                    Some(ResultType::Boolean)
                }
                _ => None,
            };
        }

        let mut has_string_operand = false;
        for (operand_type, operand_id) in [(&lhs_type, lhs_id), (&rhs_type, rhs_id)] {
            if matches!(operand_type, ResultType::String) {
                self.diagnostics
                    .push(TypeCheckDiagnostic::StringUsedInNumericContext {
                        span: self.program.node(operand_id).span,
                    });
                has_string_operand = true;
            }
        }
        if has_string_operand {
            return None;
        }

        // Bare-unit arithmetic follows the same algebra, but the result
        // stays a unit literal until an explicit unit assignment elevates
        // it into a quantity.
        let (a, b, wrap): (Unit, Unit, fn(Unit) -> ResultType) = match (&lhs_type, &rhs_type) {
            (ResultType::Quantity(a), ResultType::Quantity(b)) => {
                (a.clone(), b.clone(), ResultType::Quantity)
            }
            (ResultType::UnitLiteral(a), ResultType::UnitLiteral(b)) => {
                (a.clone(), b.clone(), ResultType::UnitLiteral)
            }
            _ => {
                self.diagnostics
                    .push(TypeCheckDiagnostic::BinaryUnitMismatch {
                        span,
                        lhs: lhs_type,
                        rhs: rhs_type,
                    });
                return None;
            }
        };

        match op {
            BinaryOperator::Add | BinaryOperator::Sub => match a.checked_add(&b) {
                Ok(unit) => Some(wrap(unit)),
                Err(_) => {
                    self.diagnostics
                        .push(TypeCheckDiagnostic::BinaryUnitMismatch {
                            span,
                            lhs: lhs_type,
                            rhs: rhs_type,
                        });
                    None
                }
            },
            BinaryOperator::Mul => Some(wrap(&a * &b)),
            BinaryOperator::Div => Some(wrap(&a / &b)),
            BinaryOperator::Power => {
                // A runtime-valued exponent would make the dimension vector
                // itself runtime-dependent; only literal constants keep the
                // check static. Enforced here, not at parse time.
                match self.literal_exponent(rhs_id) {
                    Some(exponent) => Some(wrap(a.pow(exponent))),
                    None => {
                        self.diagnostics
                            .push(TypeCheckDiagnostic::NonLiteralExponent {
                                span: self.program.node(rhs_id).span,
                            });
                        None
                    }
                }
            }
            _ => unreachable!("comparisons are handled above"),
        }
    }

    fn check_if(&mut self, branches: &[(NodeId, NodeId)], otherwise: NodeId) -> Option<ResultType> {
        let program = self.program;
        let mut ok = true;
        let mut first: Option<ResultType> = None;

        // Conditions and bodies are all checked even after a failure, so a
        // single pass surfaces every error.
        for (condition, _) in branches {
            match self.check_expression(*condition) {
                Some(ResultType::Boolean) => {}
                Some(actual) => {
                    self.diagnostics
                        .push(TypeCheckDiagnostic::IfConditionNotBoolean {
                            span: program.node(*condition).span,
                            actual,
                        });
                    ok = false;
                }
                None => ok = false,
            }
        }

        for body in branches
            .iter()
            .map(|(_, body)| *body)
            .chain(std::iter::once(otherwise))
        {
            match self.check_expression(body) {
                None => ok = false,
                Some(actual) => match &first {
                    None => first = Some(actual),
                    Some(expected) if expected.is_compatible_with(&actual) => {}
                    Some(expected) => {
                        self.diagnostics
                            .push(TypeCheckDiagnostic::IfBranchTypeMismatch {
                                span: program.node(body).span,
                                expected: expected.clone(),
                                actual,
                            });
                        ok = false;
                    }
                },
            }
        }

        if ok {
            first
        } else {
            None
        }
    }

    fn resolve_unit_expression(
        &mut self,
        expression: &UnitExpression,
        span: Span,
    ) -> Option<Unit> {
        match self.units.evaluate(expression, "<expression>") {
            Ok(unit) => Some(unit),
            Err(RegistryError::UnknownEntry(symbol, suggestion)) => {
                self.diagnostics.push(TypeCheckDiagnostic::UnknownUnit {
                    span,
                    symbol,
                    suggestion,
                });
                None
            }
            Err(other) => {
                self.diagnostics.push(TypeCheckDiagnostic::UnknownUnit {
                    span,
                    symbol: other.to_string(),
                    suggestion: None,
                });
                None
            }
        }
    }

    fn literal_exponent(&self, id: NodeId) -> Option<Rational> {
        match &self.program.node(id).kind {
            ExpressionKind::Scalar(n) => Rational::from_f64(*n),
            ExpressionKind::Group(inner) => self.literal_exponent(*inner),
            ExpressionKind::UnaryOperator {
                op: UnaryOperator::Negate,
                operand,
            } => self.literal_exponent(*operand).map(|e| -e),
            _ => None,
        }
    }
}
