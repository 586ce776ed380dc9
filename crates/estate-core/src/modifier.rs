//! Value modifiers and the four-way multiplier set they act on.

use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// How a modifier combines with the running value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    /// `previous + amount`
    #[serde(rename = "ADD")]
    Add,
    /// `previous * amount`
    #[serde(rename = "MULT")]
    Mult,
}

/// A catalog-defined adjustment applied to a numeric value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueModifier {
    #[serde(rename = "type")]
    pub kind: ModifierKind,
    #[serde(rename = "value")]
    pub amount: f64,
}

impl ValueModifier {
    /// Leaves any value unchanged.
    pub const NEUTRAL: ValueModifier = ValueModifier::mult(1.0);

    pub const fn add(amount: f64) -> Self {
        Self {
            kind: ModifierKind::Add,
            amount,
        }
    }

    pub const fn mult(amount: f64) -> Self {
        Self {
            kind: ModifierKind::Mult,
            amount,
        }
    }

    /// Apply this modifier to `previous`.
    pub fn apply(&self, previous: f64) -> f64 {
        resolve(previous, self)
    }
}

impl Default for ValueModifier {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Compose a running value with a modifier.
///
/// Example:
/// let v = resolve(30.0, &ValueModifier::mult(1.2));
/// assert_eq!(v, 36.0);
pub fn resolve(previous: f64, modifier: &ValueModifier) -> f64 {
    match modifier.kind {
        ModifierKind::Add => previous + modifier.amount,
        ModifierKind::Mult => previous * modifier.amount,
    }
}

/// Danger level plus land, build and TP multipliers for a property.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Multipliers {
    pub danger_level: f64,
    pub land_cost: f64,
    pub build_cost: f64,
    pub tp_value: f64,
}

impl Multipliers {
    /// All four values at `1`.
    pub const NEUTRAL: Multipliers = Multipliers {
        danger_level: 1.0,
        land_cost: 1.0,
        build_cost: 1.0,
        tp_value: 1.0,
    };

    /// Resolve one modifier per field, in field order.
    pub fn modified_by(self, modifiers: &ModifierSet) -> Self {
        Self {
            danger_level: resolve(self.danger_level, &modifiers.danger_level),
            land_cost: resolve(self.land_cost, &modifiers.land_cost),
            build_cost: resolve(self.build_cost, &modifiers.build_cost),
            tp_value: resolve(self.tp_value, &modifiers.tp_value),
        }
    }
}

impl Default for Multipliers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl Mul for Multipliers {
    type Output = Multipliers;

    fn mul(self, rhs: Multipliers) -> Multipliers {
        Multipliers {
            danger_level: self.danger_level * rhs.danger_level,
            land_cost: self.land_cost * rhs.land_cost,
            build_cost: self.build_cost * rhs.build_cost,
            tp_value: self.tp_value * rhs.tp_value,
        }
    }
}

/// One modifier for each of the four property values, as carried by a trait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierSet {
    #[serde(default)]
    pub danger_level: ValueModifier,
    #[serde(default)]
    pub land_cost: ValueModifier,
    #[serde(default)]
    pub build_cost: ValueModifier,
    #[serde(default)]
    pub tp_value: ValueModifier,
}
