mod arithmetic;
pub mod ast;
pub mod diagnostic;
mod dimension;
pub mod registry;
mod result_type;
pub mod simplify;
mod span;
pub mod stdlib;
mod suggestion;
mod typechecker;
mod unit;

pub use arithmetic::{Exponent, Rational};
pub use dimension::{Dimension, DimensionVector, AXIS_COUNT, AXIS_NAMES};
pub use result_type::ResultType;
pub use span::{SourceCodePosition, Span};
pub use typechecker::{TypeCheckDiagnostic, TypeCheckResults, TypeChecker};
pub use unit::{Unit, UnitError, UnitKind};

use ast::Program;
use registry::{DimensionRegistry, RegistryDeclaration, RegistryError, UnitRegistry};
use simplify::Simplifier;

/// The top-level entry point: a dimension registry and a unit registry
/// populated from declarations, with type checking and simplification on
/// top. Registries are append-only; a session never forgets a unit.
pub struct Session {
    dimensions: DimensionRegistry,
    units: UnitRegistry,
}

impl Session {
    /// A session with no dimensions and no units.
    pub fn empty() -> Self {
        Session {
            dimensions: DimensionRegistry::default(),
            units: UnitRegistry::default(),
        }
    }

    /// A session pre-populated with the standard dimensions and SI units.
    pub fn standard() -> Self {
        let mut session = Self::empty();
        for declaration in stdlib::declarations() {
            session
                .register(&declaration)
                .expect("the standard library registers without conflicts");
        }
        session
    }

    pub fn register(&mut self, declaration: &RegistryDeclaration) -> Result<(), RegistryError> {
        match declaration {
            RegistryDeclaration::Dimension(name) => {
                self.dimensions.add_base_dimension(name)?;
                Ok(())
            }
            RegistryDeclaration::BaseUnit { symbol, dimension } => {
                let axis = self.dimensions.axis_of(dimension)?;
                self.units.add_base_unit(symbol, axis)
            }
            RegistryDeclaration::Unit { symbol, expression } => {
                self.units.add_unit(symbol, expression)
            }
        }
    }

    pub fn dimensions(&self) -> &DimensionRegistry {
        &self.dimensions
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Type-check a name-resolved program against this session's units.
    pub fn check(&self, program: &Program) -> TypeCheckResults {
        TypeChecker::new(&self.units, program).check_program()
    }

    /// A simplifier over this session's units. Decompositions are memoized
    /// per simplifier, so reuse one across related calls.
    pub fn simplifier(&self) -> Simplifier<'_> {
        Simplifier::new(&self.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_session_knows_si_units() {
        let session = Session::standard();
        assert!(session.units().contains("m"));
        assert!(session.units().contains("kPa"));
        assert!(!session.units().contains("furlong"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut session = Session::standard();
        let declaration = RegistryDeclaration::Dimension("Length".into());
        assert!(matches!(
            session.register(&declaration),
            Err(RegistryError::EntryExists(_))
        ));
    }
}
