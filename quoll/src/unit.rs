use std::fmt::Display;
use std::ops::{Div, Mul};

use compact_str::CompactString;
use thiserror::Error;

use crate::arithmetic::{pretty_exponent, Exponent, Power, Rational};
use crate::dimension::{DimensionVector, AXIS_NAMES};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum UnitError {
    #[error("incompatible dimensions: '{0}' vs '{1}'")]
    IncompatibleDimensions(Unit, Unit),
}

pub type Result<T> = std::result::Result<T, UnitError>;

/// A unit is either a base unit tied to one axis, a named derived unit, a
/// named multiple (rescaling) of another named unit, or the anonymous
/// composite result of an algebraic operation.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitKind {
    Base { axis: usize },
    Derived,
    Multiple { parent: CompactString, factor: f64 },
    Composite,
}

/// An immutable unit value: a dimension vector plus identity. All algebra
/// produces fresh values; fallible operations return `Result` instead of
/// carrying a validity flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    symbol: Option<CompactString>,
    kind: UnitKind,
    vector: DimensionVector,
}

impl Unit {
    pub fn dimensionless() -> Self {
        Unit {
            symbol: None,
            kind: UnitKind::Composite,
            vector: DimensionVector::dimensionless(),
        }
    }

    /// A coherent base unit: power 1, factor 1 on its own axis.
    pub fn base(symbol: impl Into<CompactString>, axis: usize) -> Self {
        Unit {
            symbol: Some(symbol.into()),
            kind: UnitKind::Base { axis },
            vector: DimensionVector::base_axis(axis),
        }
    }

    /// A named derived unit over an already-combined dimension vector.
    pub fn derived(symbol: impl Into<CompactString>, vector: DimensionVector) -> Self {
        Unit {
            symbol: Some(symbol.into()),
            kind: UnitKind::Derived,
            vector,
        }
    }

    /// A named rescaling of a base or derived unit (e.g. km vs m). Returns
    /// `None` if the parent is dimensionless and cannot carry the factor.
    pub fn multiple(symbol: impl Into<CompactString>, parent: &Unit, factor: f64) -> Option<Self> {
        let parent_symbol = parent.symbol()?;
        Some(Unit {
            symbol: Some(symbol.into()),
            kind: UnitKind::Multiple {
                parent: parent_symbol.into(),
                factor,
            },
            vector: parent.vector.scaled(factor)?,
        })
    }

    pub(crate) fn composite(vector: DimensionVector) -> Self {
        Unit {
            symbol: None,
            kind: UnitKind::Composite,
            vector,
        }
    }

    pub fn vector(&self) -> &DimensionVector {
        &self.vector
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn is_base(&self) -> bool {
        matches!(self.kind, UnitKind::Base { .. })
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.kind, UnitKind::Derived)
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self.kind, UnitKind::Multiple { .. })
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, UnitKind::Composite)
    }

    /// The symbol of the unit this multiple rescales.
    pub fn parent_symbol(&self) -> Option<&str> {
        match &self.kind {
            UnitKind::Multiple { parent, .. } => Some(parent),
            _ => None,
        }
    }

    /// A unit is coherent when every axis it touches carries a factor of 1.
    pub fn is_coherent(&self) -> bool {
        self.vector.nonzero_axes().all(|(_, d)| d.factor == 1.0)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.vector.is_dimensionless()
    }

    pub fn equal_dimensions(&self, other: &Unit) -> bool {
        self.vector.equal_dimensions(&other.vector)
    }

    /// Addition requires matching dimensions; the result carries `self`'s
    /// dimension vector unchanged.
    pub fn checked_add(&self, other: &Unit) -> Result<Unit> {
        if self.equal_dimensions(other) {
            Ok(self.clone())
        } else {
            Err(UnitError::IncompatibleDimensions(
                self.clone(),
                other.clone(),
            ))
        }
    }

    pub fn checked_sub(&self, other: &Unit) -> Result<Unit> {
        self.checked_add(other)
    }

    pub fn pow(&self, e: Exponent) -> Unit {
        Unit::composite(self.vector.power(e))
    }

    pub fn powi(&self, e: i128) -> Unit {
        self.pow(Rational::from_integer(e))
    }

    /// Multiplier converting a value in `self` into the scale of `target`.
    pub fn conversion_factor(&self, target: &Unit) -> Result<f64> {
        if !self.equal_dimensions(target) {
            return Err(UnitError::IncompatibleDimensions(
                self.clone(),
                target.clone(),
            ));
        }
        Ok(self.vector.conversion_factor(&target.vector))
    }

    pub fn latex(&self) -> String {
        match self.symbol() {
            Some(symbol) => format!("\\mathrm{{{symbol}}}"),
            None => {
                let factors: Vec<String> = self
                    .vector
                    .nonzero_axes()
                    .map(|(axis, d)| {
                        format!(
                            "\\mathrm{{{}}}{}",
                            AXIS_NAMES[axis],
                            crate::arithmetic::latex_exponent(&d.power)
                        )
                    })
                    .collect();
                if factors.is_empty() {
                    "1".into()
                } else {
                    factors.join("\\cdot ")
                }
            }
        }
    }
}

impl Mul for &Unit {
    type Output = Unit;

    fn mul(self, other: &Unit) -> Unit {
        Unit::composite(*self.vector() * *other.vector())
    }
}

impl Div for &Unit {
    type Output = Unit;

    fn div(self, other: &Unit) -> Unit {
        Unit::composite(*self.vector() / *other.vector())
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.symbol() {
            Some(symbol) => f.write_str(symbol),
            None if self.is_dimensionless() => f.write_str("1"),
            None => {
                // An anonymous composite has no symbol until it is
                // decomposed; fall back to axis names.
                let mut first = true;
                for (axis, d) in self.vector.nonzero_axes() {
                    if !first {
                        f.write_str("·")?;
                    }
                    first = false;
                    write!(f, "{}{}", AXIS_NAMES[axis], pretty_exponent(&d.power))?;
                }
                Ok(())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::test_units::*;
    use super::*;

    #[test]
    fn addition_requires_equal_dimensions() {
        let sum = meter().checked_add(&millimeter()).unwrap();
        assert!(sum.equal_dimensions(&meter()));
        assert_eq!(sum, meter());

        assert!(meter().checked_add(&second()).is_err());
        assert!(meter().checked_sub(&second()).is_err());
    }

    #[test]
    fn multiplication_combines_dimensions() {
        let speed = &meter() / &second();
        assert!(speed.is_composite());
        assert_eq!(
            speed.vector().axis(LENGTH_AXIS).power,
            Rational::from_integer(1)
        );
        assert_eq!(
            speed.vector().axis(TIME_AXIS).power,
            Rational::from_integer(-1)
        );
    }

    #[test]
    fn pow_multiplies_axis_powers() {
        let area = meter().powi(2);
        assert_eq!(
            area.vector().axis(LENGTH_AXIS).power,
            Rational::from_integer(2)
        );

        let root = area.pow(Rational::new(1, 2));
        assert!(root.equal_dimensions(&meter()));
    }

    #[test]
    fn conversion_factors_are_reciprocal() {
        let forward = millimeter().conversion_factor(&meter()).unwrap();
        let backward = meter().conversion_factor(&millimeter()).unwrap();
        assert_relative_eq!(forward * backward, 1.0, epsilon = 1e-12);
        assert_relative_eq!(forward, 1e-3, epsilon = 1e-12);

        assert!(meter().conversion_factor(&second()).is_err());
    }

    #[test]
    fn multiple_of_derived_unit() {
        let kn = kilonewton();
        assert!(kn.is_multiple());
        assert_eq!(kn.parent_symbol(), Some("N"));
        assert_relative_eq!(
            kn.conversion_factor(&newton()).unwrap(),
            1e3,
            epsilon = 1e-9
        );
    }

    #[test]
    fn coherence_classification() {
        assert!(meter().is_coherent());
        assert!(newton().is_coherent());
        assert!(!millimeter().is_coherent());
        assert!(!kilonewton().is_coherent());
    }

    #[test]
    fn display() {
        assert_eq!(meter().to_string(), "m");
        assert_eq!(kilonewton().to_string(), "kN");
        assert_eq!((&meter() / &second()).to_string(), "Length·Time⁻¹");
        assert_eq!(Unit::dimensionless().to_string(), "1");
    }

    #[test]
    fn latex() {
        assert_eq!(meter().latex(), "\\mathrm{m}");
        assert_eq!(
            (&meter() / &second()).latex(),
            "\\mathrm{Length}\\cdot \\mathrm{Time}^{-1}"
        );
    }
}
