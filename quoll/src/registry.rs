use std::collections::HashMap;

use compact_str::CompactString;
use thiserror::Error;

use crate::ast::UnitExpression;
use crate::dimension::AXIS_COUNT;
use crate::suggestion;
use crate::unit::Unit;

#[derive(Clone, Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("Entry '{0}' exists already.")]
    EntryExists(String),

    #[error("Unknown entry '{0}'.")]
    UnknownEntry(String, Option<String>),

    #[error("No free dimension axis left for '{0}'.")]
    TooManyDimensions(String),

    #[error("Axis index {1} is out of range for base unit '{0}'.")]
    AxisOutOfRange(String, usize),

    #[error("Unit '{0}' is dimensionless and can not carry a conversion factor.")]
    DimensionlessScaledUnit(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// One registry-populating declaration, in source form. The standard
/// library and user programs both feed the session through these.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryDeclaration {
    /// `dimension X`
    Dimension(CompactString),
    /// `unit sym : Dimension`
    BaseUnit {
        symbol: CompactString,
        dimension: CompactString,
    },
    /// `unit sym = <unit-expression>`
    Unit {
        symbol: CompactString,
        expression: UnitExpression,
    },
}

/// Maps declared dimension names to axis indices, assigned in declaration
/// order. Populated once per session and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct DimensionRegistry {
    names: Vec<CompactString>,
}

impl DimensionRegistry {
    pub fn add_base_dimension(&mut self, name: &str) -> Result<usize> {
        if self.names.iter().any(|n| n == name) {
            return Err(RegistryError::EntryExists(name.to_owned()));
        }
        if self.names.len() == AXIS_COUNT {
            return Err(RegistryError::TooManyDimensions(name.to_owned()));
        }
        self.names.push(name.into());
        Ok(self.names.len() - 1)
    }

    pub fn axis_of(&self, name: &str) -> Result<usize> {
        self.names.iter().position(|n| n == name).ok_or_else(|| {
            let suggestion = suggestion::did_you_mean(self.names.iter().map(|n| n.as_str()), name);
            RegistryError::UnknownEntry(name.to_owned(), suggestion)
        })
    }

    pub fn name_of(&self, axis: usize) -> Option<&str> {
        self.names.get(axis).map(|n| n.as_str())
    }

    pub fn iter_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_str())
    }
}

/// Maps declared unit symbols to `Unit` instances and keeps the
/// declaration-ordered views the simplifier iterates: base units, coherent
/// derived units, and per-parent unit multiples.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: HashMap<CompactString, Unit>,
    base_units: Vec<CompactString>,
    coherent_derived_units: Vec<CompactString>,
    multiples: HashMap<CompactString, Vec<CompactString>>,
}

impl UnitRegistry {
    pub fn get(&self, symbol: &str) -> Result<&Unit> {
        self.units.get(symbol).ok_or_else(|| {
            let suggestion = suggestion::did_you_mean(self.units.keys().map(|k| k.as_str()), symbol);
            RegistryError::UnknownEntry(symbol.to_owned(), suggestion)
        })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.units.contains_key(symbol)
    }

    pub fn add_base_unit(&mut self, symbol: &str, axis: usize) -> Result<()> {
        self.check_fresh(symbol)?;
        if axis >= AXIS_COUNT {
            return Err(RegistryError::AxisOutOfRange(symbol.to_owned(), axis));
        }
        self.units.insert(symbol.into(), Unit::base(symbol, axis));
        self.base_units.push(symbol.into());
        Ok(())
    }

    /// Registers `unit sym = <expression>`. An expression of the shape
    /// `factor × single-named-unit` (or a plain alias) declares a unit
    /// multiple; anything else declares a derived unit.
    pub fn add_unit(&mut self, symbol: &str, expression: &UnitExpression) -> Result<()> {
        self.check_fresh(symbol)?;

        match multiple_shape(expression) {
            Some((factor, parent_symbol)) => {
                // Multiples always hang off the coherent root, so that the
                // best-multiple search finds them no matter which multiple
                // they were declared against (`unit h = 60 min`).
                let (root_symbol, root_factor) = self.coherent_root(parent_symbol)?;
                let root = self.units[&root_symbol].clone();
                let unit = Unit::multiple(symbol, &root, factor * root_factor)
                    .ok_or_else(|| RegistryError::DimensionlessScaledUnit(symbol.to_owned()))?;
                self.units.insert(symbol.into(), unit);
                self.multiples
                    .entry(root_symbol)
                    .or_default()
                    .push(symbol.into());
            }
            None => {
                let evaluated = self.evaluate(expression, symbol)?;
                let unit = Unit::derived(symbol, *evaluated.vector());
                if unit.is_coherent() {
                    self.coherent_derived_units.push(symbol.into());
                }
                self.units.insert(symbol.into(), unit);
            }
        }

        Ok(())
    }

    /// Evaluates a symbolic unit expression against the registered symbols.
    pub fn evaluate(&self, expression: &UnitExpression, context: &str) -> Result<Unit> {
        match expression {
            UnitExpression::Unity => Ok(Unit::dimensionless()),
            UnitExpression::Identifier(name) => self.get(name).cloned(),
            UnitExpression::Scale(factor, inner) => {
                let inner = self.evaluate(inner, context)?;
                let vector = inner
                    .vector()
                    .scaled(*factor)
                    .ok_or_else(|| RegistryError::DimensionlessScaledUnit(context.to_owned()))?;
                Ok(Unit::composite(vector))
            }
            UnitExpression::Multiply(lhs, rhs) => {
                Ok(&self.evaluate(lhs, context)? * &self.evaluate(rhs, context)?)
            }
            UnitExpression::Divide(lhs, rhs) => {
                Ok(&self.evaluate(lhs, context)? / &self.evaluate(rhs, context)?)
            }
            UnitExpression::Power(inner, exponent) => {
                Ok(self.evaluate(inner, context)?.pow(*exponent))
            }
        }
    }

    /// Walks a multiple's parent chain up to its coherent base or derived
    /// unit, accumulating the conversion factor along the way.
    fn coherent_root(&self, symbol: &str) -> Result<(CompactString, f64)> {
        let mut current = self.get(symbol)?;
        let mut factor = 1.0;
        loop {
            match (current.parent_symbol(), current.symbol()) {
                (Some(parent), Some(_)) => {
                    let parent_unit = self.get(parent)?;
                    factor *= current
                        .conversion_factor(parent_unit)
                        .expect("a multiple shares its parent's dimensions");
                    current = parent_unit;
                }
                (None, Some(own)) => return Ok((own.into(), factor)),
                (_, None) => unreachable!("registered units are always named"),
            }
        }
    }

    fn check_fresh(&self, symbol: &str) -> Result<()> {
        if self.contains(symbol) {
            Err(RegistryError::EntryExists(symbol.to_owned()))
        } else {
            Ok(())
        }
    }

    /// Base units, in declaration order.
    pub fn iter_base_units(&self) -> impl Iterator<Item = &Unit> {
        self.base_units.iter().map(|s| &self.units[s])
    }

    /// Coherent derived units, in declaration order. These are tried first
    /// during decomposition.
    pub fn iter_coherent_derived_units(&self) -> impl Iterator<Item = &Unit> {
        self.coherent_derived_units.iter().map(|s| &self.units[s])
    }

    /// The registered multiples of a coherent unit (`mm`/`cm`/`km` for `m`).
    pub fn multiples_of(&self, symbol: &str) -> impl Iterator<Item = &Unit> {
        self.multiples
            .get(symbol)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|s| &self.units[s])
    }
}

/// Recognizes `factor × single-named-unit` (and plain aliases), the shape
/// that declares a unit multiple instead of a derived unit.
fn multiple_shape(expression: &UnitExpression) -> Option<(f64, &str)> {
    match expression {
        UnitExpression::Identifier(name) => Some((1.0, name)),
        UnitExpression::Scale(factor, inner) => match inner.as_ref() {
            UnitExpression::Identifier(name) => Some((*factor, name)),
            _ => None,
        },
        _ => None,
    }
}
