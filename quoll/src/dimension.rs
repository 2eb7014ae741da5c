use std::ops::{Div, Mul};

use num_traits::{Signed, ToPrimitive, Zero};

use crate::arithmetic::{Exponent, Power, Rational};

/// The fixed, ordered set of fundamental axes. Every dimension vector has
/// exactly this many slots; dimension declarations bind names to them in
/// declaration order.
pub const AXIS_COUNT: usize = 8;

/// Canonical axis names, in the order the standard library declares them.
pub const AXIS_NAMES: [&str; AXIS_COUNT] = [
    "Mass",
    "Length",
    "Time",
    "ElectricCurrent",
    "Temperature",
    "Substance",
    "LuminousIntensity",
    "Angle",
];

/// One axis of a dimension vector. `factor` is the multiplier to the
/// SI-coherent reference on this axis and is only meaningful where
/// `power != 0`; it is normalized back to `1.0` whenever a power cancels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub power: Exponent,
    pub factor: f64,
}

impl Dimension {
    fn none() -> Self {
        Dimension {
            power: Rational::zero(),
            factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionVector([Dimension; AXIS_COUNT]);

impl DimensionVector {
    pub fn dimensionless() -> Self {
        DimensionVector([Dimension::none(); AXIS_COUNT])
    }

    /// A coherent vector with power 1 and factor 1 on a single axis.
    pub fn base_axis(axis: usize) -> Self {
        let mut vector = Self::dimensionless();
        vector.0[axis].power = Rational::from_integer(1);
        vector
    }

    pub fn axis(&self, axis: usize) -> &Dimension {
        &self.0[axis]
    }

    /// All axes with a nonzero power.
    pub fn nonzero_axes(&self) -> impl Iterator<Item = (usize, &Dimension)> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.power.is_zero())
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|d| d.power.is_zero())
    }

    /// Compares power vectors only; factors are ignored. This is the
    /// precondition for addition/subtraction and quantity comparison.
    pub fn equal_dimensions(&self, other: &Self) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| a.power == b.power)
    }

    /// The per-axis powers, used as a structural key for memoization.
    pub fn powers(&self) -> [Exponent; AXIS_COUNT] {
        let mut powers = [Rational::zero(); AXIS_COUNT];
        for (i, d) in self.0.iter().enumerate() {
            powers[i] = d.power;
        }
        powers
    }

    /// Multiplier that converts a value carried by `self` into the scale of
    /// `target`. Only meaningful when `equal_dimensions(self, target)`;
    /// callers check that precondition.
    pub fn conversion_factor(&self, target: &Self) -> f64 {
        let mut factor = 1.0;
        for (axis, d) in self.nonzero_axes() {
            let power = d.power.to_f64().unwrap();
            factor *= (d.factor / target.0[axis].factor).powf(power);
        }
        factor
    }

    /// Distributes a scalar conversion factor onto the first nonzero-power
    /// axis, so that `scaled.conversion_factor(self) == factor`. Used when
    /// constructing unit multiples and scaled derived units. Returns `None`
    /// for a dimensionless vector, which has no axis to carry the factor.
    pub fn scaled(&self, factor: f64) -> Option<Self> {
        let (axis, d) = self.nonzero_axes().next()?;
        let power = d.power.to_f64().unwrap();
        let mut vector = *self;
        vector.0[axis].factor = d.factor * factor.powf(1.0 / power);
        Some(vector)
    }

    /// The largest integral exponent `k >= 1` such that `divisor^k` divides
    /// `self` axis-wise: on every axis the divisor touches, the dividend's
    /// power must be nonzero, same-signed, at least as large in magnitude,
    /// and an integral multiple. Returns zero otherwise. Used against
    /// coherent derived units, which must divide evenly.
    pub fn whole_divisor_exponent(&self, divisor: &Self) -> Exponent {
        let mut result: Option<Exponent> = None;
        for (axis, d) in divisor.nonzero_axes() {
            let power = self.0[axis].power;
            if power.is_zero() {
                return Rational::zero();
            }
            let quotient = power / d.power;
            if !quotient.is_integer() || quotient < Rational::from_integer(1) {
                return Rational::zero();
            }
            result = Some(match result {
                None => quotient,
                Some(r) => r.min(quotient),
            });
        }
        result.unwrap_or_else(Rational::zero)
    }

    /// Like [`Self::whole_divisor_exponent`], but exact rational quotients
    /// are allowed and the quotient may be negative, as long as all per-axis
    /// quotients agree in sign. Used only against base units; since a base
    /// unit touches a single axis, this always consumes that axis entirely,
    /// which guarantees that any composite unit fully decomposes.
    pub fn partial_divisor_exponent(&self, divisor: &Self) -> Exponent {
        let mut result: Option<Exponent> = None;
        for (axis, d) in divisor.nonzero_axes() {
            let power = self.0[axis].power;
            if power.is_zero() {
                return Rational::zero();
            }
            let quotient = power / d.power;
            result = Some(match result {
                None => quotient,
                Some(r) => {
                    if r.is_positive() != quotient.is_positive() {
                        return Rational::zero();
                    }
                    if quotient.abs() < r.abs() {
                        quotient
                    } else {
                        r
                    }
                }
            });
        }
        result.unwrap_or_else(Rational::zero)
    }

    fn normalized(mut self) -> Self {
        for d in &mut self.0 {
            if d.power.is_zero() {
                d.factor = 1.0;
            }
        }
        self
    }
}

impl Mul for DimensionVector {
    type Output = Self;

    fn mul(mut self, other: Self) -> Self {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            a.power += b.power;
            a.factor *= b.factor;
        }
        self.normalized()
    }
}

impl Div for DimensionVector {
    type Output = Self;

    fn div(mut self, other: Self) -> Self {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            a.power -= b.power;
            a.factor /= b.factor;
        }
        self.normalized()
    }
}

impl Power for DimensionVector {
    fn power(mut self, e: Exponent) -> Self {
        let e_f64 = e.to_f64().unwrap();
        for d in &mut self.0 {
            d.power *= e;
            d.factor = d.factor.powf(e_f64);
        }
        self.normalized()
    }
}
