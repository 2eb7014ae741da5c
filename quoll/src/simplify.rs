use std::collections::HashMap;
use std::fmt::Display;

use itertools::Itertools;
use log::debug;
use num_traits::Zero;
use thiserror::Error;

use crate::arithmetic::{latex_exponent, pretty_exponent, Exponent, Power, Rational};
use crate::dimension::{DimensionVector, AXIS_COUNT};
use crate::registry::UnitRegistry;
use crate::unit::Unit;

/// Preferred order of magnitude for displayed values: the best-multiple
/// search steers `log10(value)` towards this offset.
const LOG10_TARGET: f64 = 1.5;

/// Values in this band are left alone by the best-multiple search.
fn is_readable(value: f64) -> bool {
    (0.1..1e4).contains(&value.abs())
}

/// Wider band: a value displayed in an already-named unit is not
/// re-expressed as long as it stays in here.
fn is_comfortable(value: f64) -> bool {
    (1e-3..1e5).contains(&value.abs())
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimplifyError {
    #[error("simplification produced '{produced}', which does not match the dimensions of '{original}'")]
    DimensionMismatch { original: Unit, produced: Unit },
}

pub type Result<T> = std::result::Result<T, SimplifyError>;

/// An equivalent rendering of a unit as a product of named units, with the
/// magnitude rescaled accordingly.
#[derive(Debug, Clone, PartialEq)]
pub struct Simplified {
    /// Named units and their exponents, in decomposition order.
    pub factors: Vec<(Unit, Exponent)>,
    /// The product of the factors, as a unit value.
    pub unit: Unit,
    /// The rescaled magnitude (`0.0` when no magnitude was provided).
    pub value: f64,
}

impl Simplified {
    pub fn latex(&self) -> String {
        if self.factors.is_empty() {
            return "1".into();
        }
        self.factors
            .iter()
            .map(|(unit, exponent)| format!("{}{}", unit.latex(), latex_exponent(exponent)))
            .join("\\cdot ")
    }
}

impl Display for Simplified {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.factors.is_empty() {
            return f.write_str("1");
        }
        let rendered = self
            .factors
            .iter()
            .map(|(unit, exponent)| format!("{unit}{}", pretty_exponent(exponent)))
            .join("·");
        f.write_str(&rendered)
    }
}

/// Decomposes composite units into named coherent units and picks readable
/// unit multiples. Decompositions are memoized per simplifier, keyed by the
/// power vector; `Unit` values themselves stay plain immutable data.
pub struct Simplifier<'a> {
    units: &'a UnitRegistry,
    memo: HashMap<[Exponent; AXIS_COUNT], Vec<(Unit, Exponent)>>,
}

impl<'a> Simplifier<'a> {
    pub fn new(units: &'a UnitRegistry) -> Self {
        Simplifier {
            units,
            memo: HashMap::new(),
        }
    }

    /// Re-expresses `unit` as a product of named coherent units and, when a
    /// magnitude is given (`0.0` means "no value provided"), rescales it to
    /// unit multiples chosen for readability. The result is always
    /// dimensionally equal to the input, or an explicit error.
    pub fn simplify(&mut self, unit: &Unit, value: f64) -> Result<Simplified> {
        if unit.is_dimensionless() {
            return Ok(Simplified {
                factors: vec![],
                unit: Unit::dimensionless(),
                value,
            });
        }

        // A named unit whose magnitude is already in a comfortable range is
        // left alone; re-expression would only hurt readability.
        if unit.symbol().is_some() && value != 0.0 && is_comfortable(value) {
            return Ok(Simplified {
                factors: vec![(unit.clone(), Rational::from_integer(1))],
                unit: unit.clone(),
                value,
            });
        }

        let factors = self.decompose(unit.vector());

        let mut coherent = DimensionVector::dimensionless();
        for (factor_unit, exponent) in &factors {
            coherent = coherent * factor_unit.vector().power(*exponent);
        }
        if !unit.vector().equal_dimensions(&coherent) {
            return Err(SimplifyError::DimensionMismatch {
                original: unit.clone(),
                produced: Unit::composite(coherent),
            });
        }

        if value == 0.0 {
            return Ok(Simplified {
                unit: Unit::composite(coherent),
                factors,
                value,
            });
        }

        // Rescale the magnitude into the coherent decomposition, then walk
        // the factors in order, adopting for each the registered multiple
        // that brings the running value closest to the readability target.
        // This is a local, order-dependent heuristic: each factor is
        // optimized in sequence, carrying the rescaled value forward.
        let mut value = value * unit.vector().conversion_factor(&coherent);
        let mut chosen: Vec<(Unit, Exponent)> = Vec::with_capacity(factors.len());

        for (factor_unit, exponent) in factors {
            if is_readable(value) {
                chosen.push((factor_unit, exponent));
                continue;
            }

            let score = |v: f64| (v.abs().log10() - LOG10_TARGET).abs();

            let mut best_unit = factor_unit.clone();
            let mut best_value = value;
            let mut best_score = score(value);

            let symbol = factor_unit
                .symbol()
                .expect("decomposition factors are named units");
            for multiple in self.units.multiples_of(symbol) {
                let ratio = factor_unit
                    .vector()
                    .power(exponent)
                    .conversion_factor(&multiple.vector().power(exponent));
                let candidate_value = value * ratio;
                let candidate_score = score(candidate_value);
                if candidate_score < best_score {
                    best_unit = multiple.clone();
                    best_value = candidate_value;
                    best_score = candidate_score;
                }
            }

            debug!(
                "best multiple for {symbol}{}: {} (value {best_value})",
                pretty_exponent(&exponent),
                best_unit
            );
            value = best_value;
            chosen.push((best_unit, exponent));
        }

        let mut produced = DimensionVector::dimensionless();
        for (factor_unit, exponent) in &chosen {
            produced = produced * factor_unit.vector().power(*exponent);
        }
        if !unit.vector().equal_dimensions(&produced) {
            return Err(SimplifyError::DimensionMismatch {
                original: unit.clone(),
                produced: Unit::composite(produced),
            });
        }

        Ok(Simplified {
            factors: chosen,
            unit: Unit::composite(produced),
            value,
        })
    }

    /// Greedily consumes the unit's dimension vector: coherent derived
    /// units first (which must divide evenly), then base units (which
    /// always consume their axis entirely, including fractional and
    /// negative powers).
    fn decompose(&mut self, vector: &DimensionVector) -> Vec<(Unit, Exponent)> {
        if let Some(cached) = self.memo.get(&vector.powers()) {
            return cached.clone();
        }

        let mut working = *vector;
        let mut factors: Vec<(Unit, Exponent)> = vec![];

        for unit in self.units.iter_coherent_derived_units() {
            let exponent = working.whole_divisor_exponent(unit.vector());
            if !exponent.is_zero() {
                working = working / unit.vector().power(exponent);
                factors.push((unit.clone(), exponent));
            }
        }

        for unit in self.units.iter_base_units() {
            let exponent = working.partial_divisor_exponent(unit.vector());
            if !exponent.is_zero() {
                working = working / unit.vector().power(exponent);
                factors.push((unit.clone(), exponent));
            }
        }

        if !working.is_dimensionless() {
            // Only possible when some axis has no registered base unit; the
            // callers' dimension revalidation turns this into an error.
            debug!("decomposition left a remainder on some axis");
        }

        self.memo.insert(vector.powers(), factors.clone());
        factors
    }
}
