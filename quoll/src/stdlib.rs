//! The standard session baseline: the eight canonical dimensions and the
//! SI core units. Registered programmatically at session start; user
//! declarations extend the same registries afterwards.

use crate::arithmetic::Rational;
use crate::ast::UnitExpression;
use crate::dimension::AXIS_NAMES;
use crate::registry::RegistryDeclaration;

fn base(symbol: &str, dimension: &str) -> RegistryDeclaration {
    RegistryDeclaration::BaseUnit {
        symbol: symbol.into(),
        dimension: dimension.into(),
    }
}

fn unit(symbol: &str, expression: UnitExpression) -> RegistryDeclaration {
    RegistryDeclaration::Unit {
        symbol: symbol.into(),
        expression,
    }
}

fn multiple(symbol: &str, factor: f64, parent: &str) -> RegistryDeclaration {
    unit(
        symbol,
        UnitExpression::Scale(factor, Box::new(UnitExpression::identifier(parent))),
    )
}

fn product(lhs: UnitExpression, rhs: UnitExpression) -> UnitExpression {
    UnitExpression::Multiply(Box::new(lhs), Box::new(rhs))
}

fn quotient(lhs: UnitExpression, rhs: UnitExpression) -> UnitExpression {
    UnitExpression::Divide(Box::new(lhs), Box::new(rhs))
}

fn power(inner: UnitExpression, exponent: i128) -> UnitExpression {
    UnitExpression::Power(Box::new(inner), Rational::from_integer(exponent))
}

fn ident(name: &str) -> UnitExpression {
    UnitExpression::identifier(name)
}

pub fn declarations() -> Vec<RegistryDeclaration> {
    let mut declarations: Vec<RegistryDeclaration> = AXIS_NAMES
        .iter()
        .map(|name| RegistryDeclaration::Dimension((*name).into()))
        .collect();

    declarations.extend([
        base("kg", "Mass"),
        base("m", "Length"),
        base("s", "Time"),
        base("A", "ElectricCurrent"),
        base("K", "Temperature"),
        base("mol", "Substance"),
        base("cd", "LuminousIntensity"),
        base("rad", "Angle"),
        // Coherent derived units, in decomposition preference order.
        unit("N", quotient(product(ident("kg"), ident("m")), power(ident("s"), 2))),
        unit("Pa", quotient(ident("N"), power(ident("m"), 2))),
        unit("J", product(ident("N"), ident("m"))),
        unit("W", quotient(ident("J"), ident("s"))),
        // Multiples.
        multiple("mm", 1e-3, "m"),
        multiple("cm", 1e-2, "m"),
        multiple("km", 1e3, "m"),
        multiple("g", 1e-3, "kg"),
        multiple("t", 1e3, "kg"),
        multiple("ms", 1e-3, "s"),
        multiple("min", 60.0, "s"),
        multiple("h", 60.0, "min"),
        multiple("kN", 1e3, "N"),
        multiple("MN", 1e6, "N"),
        multiple("kPa", 1e3, "Pa"),
        multiple("MPa", 1e6, "Pa"),
        multiple("GPa", 1e9, "Pa"),
        multiple("kJ", 1e3, "J"),
        multiple("kW", 1e3, "W"),
        multiple("deg", std::f64::consts::PI / 180.0, "rad"),
    ]);

    declarations
}
