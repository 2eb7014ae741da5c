use std::fmt::Display;

use crate::ast::DeclId;
use crate::unit::Unit;

/// The statically-checked classification of what an expression produces.
///
/// "Unresolved" is represented as `Option<ResultType>::None` by the type
/// checker and never appears inside this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultType {
    /// A numeric value paired with a unit.
    Quantity(Unit),
    /// A bare unit, not yet attached to a value.
    UnitLiteral(Unit),
    Boolean,
    String,
    /// An instance of an element declaration.
    Element(DeclId),
    List(Box<ResultType>),
}

impl ResultType {
    /// Two quantities are compatible iff their dimensions match (factors
    /// ignored); other classifications are compatible iff they are the same
    /// variant, with matching targets for elements and matching inner types
    /// for lists.
    pub fn is_compatible_with(&self, other: &ResultType) -> bool {
        match (self, other) {
            (ResultType::Quantity(a), ResultType::Quantity(b)) => a.equal_dimensions(b),
            (ResultType::UnitLiteral(a), ResultType::UnitLiteral(b)) => a.equal_dimensions(b),
            (ResultType::Boolean, ResultType::Boolean) => true,
            (ResultType::String, ResultType::String) => true,
            (ResultType::Element(a), ResultType::Element(b)) => a == b,
            (ResultType::List(a), ResultType::List(b)) => a.is_compatible_with(b),
            _ => false,
        }
    }

}

impl Display for ResultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultType::Quantity(unit) => write!(f, "Quantity<{unit}>"),
            ResultType::UnitLiteral(unit) => write!(f, "Unit<{unit}>"),
            ResultType::Boolean => f.write_str("Boolean"),
            ResultType::String => f.write_str("String"),
            ResultType::Element(_) => f.write_str("Element"),
            ResultType::List(inner) => write!(f, "List<{inner}>"),
        }
    }
}
