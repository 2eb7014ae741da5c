use quoll::ast::{
    BinaryOperator, DeclId, Declaration, DeclarationKind, ExpressionKind, NodeId, Program,
    UnitExpression,
};
use quoll::{Rational, ResultType, Session, Span, TypeCheckDiagnostic, TypeCheckResults};

fn scalar(program: &mut Program, value: f64) -> NodeId {
    program.push_node(Span::dummy(), ExpressionKind::Scalar(value))
}

fn quantity(program: &mut Program, value: f64, unit: UnitExpression) -> NodeId {
    let value = scalar(program, value);
    program.push_node(Span::dummy(), ExpressionKind::UnitAssignment { value, unit })
}

fn binary(program: &mut Program, op: BinaryOperator, lhs: NodeId, rhs: NodeId) -> NodeId {
    program.push_node(Span::dummy(), ExpressionKind::BinaryOperator { op, lhs, rhs })
}

fn variable(
    program: &mut Program,
    name: &str,
    annotation: Option<UnitExpression>,
    value: Option<NodeId>,
) -> DeclId {
    program.push_declaration(Declaration {
        name: name.into(),
        span: Span::dummy(),
        circular: false,
        kind: DeclarationKind::Variable { annotation, value },
    })
}

fn ident(name: &str) -> UnitExpression {
    UnitExpression::identifier(name)
}

fn squared(name: &str) -> UnitExpression {
    UnitExpression::Power(Box::new(ident(name)), Rational::from_integer(2))
}

fn check(program: &Program) -> TypeCheckResults {
    Session::standard().check(program)
}

#[test]
fn area_calculation_checks_cleanly() {
    // a: {mm^2} = 100{mm} * 200{mm} + 400{mm^2}
    let mut program = Program::new();
    let width = quantity(&mut program, 100.0, ident("mm"));
    let height = quantity(&mut program, 200.0, ident("mm"));
    let product = binary(&mut program, BinaryOperator::Mul, width, height);
    let extra = quantity(&mut program, 400.0, squared("mm"));
    let sum = binary(&mut program, BinaryOperator::Add, product, extra);
    let area = variable(&mut program, "a", Some(squared("mm")), Some(sum));

    let results = check(&program);
    assert!(results.is_error_free(), "{:?}", results.diagnostics);

    // The product carries length squared on exactly one axis.
    let length_axis = quoll::AXIS_NAMES
        .iter()
        .position(|name| *name == "Length")
        .unwrap();
    match results.evaluated_type(product) {
        Some(ResultType::Quantity(unit)) => {
            let powers = unit.vector().powers();
            for (axis, power) in powers.iter().enumerate() {
                let expected = if axis == length_axis {
                    Rational::from_integer(2)
                } else {
                    Rational::from_integer(0)
                };
                assert_eq!(*power, expected);
            }
        }
        other => panic!("expected a quantity, got {other:?}"),
    }

    // The declared annotation wins as the declaration's type.
    match results.declaration_type(area) {
        Some(ResultType::Quantity(unit)) => {
            assert_eq!(unit.vector().powers()[length_axis], Rational::from_integer(2));
        }
        other => panic!("expected a quantity, got {other:?}"),
    }
}

#[test]
fn volume_against_area_annotation_is_a_single_declaration_mismatch() {
    // v: {m^2} = 100{mm} * 200{mm} * 300{mm}
    let mut program = Program::new();
    let a = quantity(&mut program, 100.0, ident("mm"));
    let b = quantity(&mut program, 200.0, ident("mm"));
    let c = quantity(&mut program, 300.0, ident("mm"));
    let ab = binary(&mut program, BinaryOperator::Mul, a, b);
    let abc = binary(&mut program, BinaryOperator::Mul, ab, c);
    let volume = variable(&mut program, "v", Some(squared("m")), Some(abc));

    let results = check(&program);
    assert_eq!(results.diagnostics.len(), 1, "{:?}", results.diagnostics);
    assert!(matches!(
        results.diagnostics[0],
        TypeCheckDiagnostic::VariableUnitDeclarationMismatch { .. }
    ));
    assert_eq!(results.declaration_type(volume), None);
    // The product itself typed fine; only the reconciliation failed.
    assert!(matches!(
        results.evaluated_type(abc),
        Some(ResultType::Quantity(_))
    ));
}

#[test]
fn if_branches_with_different_dimensions_are_one_mismatch() {
    // x: {m} = 10{m}
    // y = if x > 5{m} then 1{m} otherwise 2{kg}
    let mut program = Program::new();
    let ten = quantity(&mut program, 10.0, ident("m"));
    let x = variable(&mut program, "x", Some(ident("m")), Some(ten));

    let x_ref = program.push_node(
        Span::dummy(),
        ExpressionKind::Identifier("x".into(), Some(x)),
    );
    let five = quantity(&mut program, 5.0, ident("m"));
    let condition = binary(&mut program, BinaryOperator::GreaterThan, x_ref, five);
    let then_branch = quantity(&mut program, 1.0, ident("m"));
    let otherwise = quantity(&mut program, 2.0, ident("kg"));
    let conditional = program.push_node(
        Span::dummy(),
        ExpressionKind::If {
            branches: vec![(condition, then_branch)],
            otherwise,
        },
    );
    let y = variable(&mut program, "y", None, Some(conditional));

    let results = check(&program);
    assert_eq!(results.diagnostics.len(), 1, "{:?}", results.diagnostics);
    assert!(matches!(
        results.diagnostics[0],
        TypeCheckDiagnostic::IfBranchTypeMismatch { .. }
    ));
    assert_eq!(results.evaluated_type(conditional), None);
    assert_eq!(results.declaration_type(y), None);
}

#[test]
fn variable_exponent_degrades_to_unresolved() {
    // n = 2
    // p = 5{m} ^ n
    let mut program = Program::new();
    let two = scalar(&mut program, 2.0);
    let n = variable(&mut program, "n", None, Some(two));

    let base = quantity(&mut program, 5.0, ident("m"));
    let n_ref = program.push_node(
        Span::dummy(),
        ExpressionKind::Identifier("n".into(), Some(n)),
    );
    let power = binary(&mut program, BinaryOperator::Power, base, n_ref);
    let p = variable(&mut program, "p", None, Some(power));

    let results = check(&program);
    assert_eq!(results.diagnostics.len(), 1, "{:?}", results.diagnostics);
    assert!(matches!(
        results.diagnostics[0],
        TypeCheckDiagnostic::NonLiteralExponent { .. }
    ));
    assert_eq!(results.evaluated_type(power), None);
    assert_eq!(results.declaration_type(p), None);
}

#[test]
fn literal_exponent_survives_grouping_and_negation() {
    // p: {} = 5{m}^(-(2)) * 25{m^2}
    let mut program = Program::new();
    let base = quantity(&mut program, 5.0, ident("m"));
    let two = scalar(&mut program, 2.0);
    let grouped = program.push_node(Span::dummy(), ExpressionKind::Group(two));
    let negated = program.push_node(
        Span::dummy(),
        ExpressionKind::UnaryOperator {
            op: quoll::ast::UnaryOperator::Negate,
            operand: grouped,
        },
    );
    let power = binary(&mut program, BinaryOperator::Power, base, negated);
    let area = quantity(&mut program, 25.0, squared("m"));
    let product = binary(&mut program, BinaryOperator::Mul, power, area);
    variable(&mut program, "p", None, Some(product));

    let results = check(&program);
    assert!(results.is_error_free(), "{:?}", results.diagnostics);
    match results.evaluated_type(product) {
        Some(ResultType::Quantity(unit)) => assert!(unit.is_dimensionless()),
        other => panic!("expected a dimensionless quantity, got {other:?}"),
    }
}

#[test]
fn marked_reference_cycle_is_quietly_unresolved() {
    // a = b, b = a, both marked circular upstream.
    let mut program = Program::new();
    let ref_to_b = program.push_node(
        Span::dummy(),
        ExpressionKind::Identifier("b".into(), Some(DeclId(1))),
    );
    let a = program.push_declaration(Declaration {
        name: "a".into(),
        span: Span::dummy(),
        circular: true,
        kind: DeclarationKind::Variable {
            annotation: None,
            value: Some(ref_to_b),
        },
    });
    let ref_to_a = program.push_node(
        Span::dummy(),
        ExpressionKind::Identifier("a".into(), Some(a)),
    );
    let b = program.push_declaration(Declaration {
        name: "b".into(),
        span: Span::dummy(),
        circular: true,
        kind: DeclarationKind::Variable {
            annotation: None,
            value: Some(ref_to_a),
        },
    });

    let results = check(&program);
    assert!(results.is_error_free(), "{:?}", results.diagnostics);
    assert_eq!(results.declaration_type(a), None);
    assert_eq!(results.declaration_type(b), None);
}

#[test]
fn checked_quantities_feed_the_simplifier() {
    // f: {kN} = 5{kN}; m = f * 3{m} carries force times length.
    let mut program = Program::new();
    let force = quantity(&mut program, 5.0, ident("kN"));
    let f = variable(&mut program, "f", Some(ident("kN")), Some(force));
    let f_ref = program.push_node(
        Span::dummy(),
        ExpressionKind::Identifier("f".into(), Some(f)),
    );
    let arm = quantity(&mut program, 3.0, ident("m"));
    let moment = binary(&mut program, BinaryOperator::Mul, f_ref, arm);
    variable(&mut program, "moment", Some(binary_unit("kN", "m")), Some(moment));

    let session = Session::standard();
    let results = session.check(&program);
    assert!(results.is_error_free(), "{:?}", results.diagnostics);

    let Some(ResultType::Quantity(unit)) = results.evaluated_type(moment) else {
        panic!("expected a quantity");
    };
    let mut simplifier = session.simplifier();
    let simplified = simplifier.simplify(unit, 15_000.0).unwrap();
    let joule = session.units().get("J").unwrap();
    assert!(simplified.unit.equal_dimensions(joule));
}

fn binary_unit(lhs: &str, rhs: &str) -> UnitExpression {
    UnitExpression::Multiply(Box::new(ident(lhs)), Box::new(ident(rhs)))
}
