use core::cmp::Ordering;
use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Numeric stand-in for [`Cost::Infinite`] when a solver needs a plain number.
///
/// Larger than any realistic finite communication cost.
pub const INFINITY_COST: f64 = 1e13;

/// The price of a collective or of a resharding transition.
///
/// `Infinite` marks a plan the solver must never select. It absorbs addition, compares
/// greater than every finite cost, and is kept apart from large finite values so it
/// cannot be confused with an expensive but legal plan.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Cost {
    /// A non-negative finite cost.
    Finite(f64),
    /// The plan is forbidden or cannot be priced.
    Infinite,
}

impl Cost {
    /// The cost of doing nothing.
    pub const ZERO: Cost = Cost::Finite(0.0);

    /// Returns `true` when this cost forbids the plan.
    pub fn is_infinite(&self) -> bool {
        matches!(self, Cost::Infinite)
    }

    /// Returns the finite value, if any.
    pub fn finite(&self) -> Option<f64> {
        match self {
            Cost::Finite(value) => Some(*value),
            Cost::Infinite => None,
        }
    }

    /// Flattens the cost into a number, mapping `Infinite` to [`INFINITY_COST`].
    pub fn to_f64_saturating(&self) -> f64 {
        match self {
            Cost::Finite(value) => *value,
            Cost::Infinite => INFINITY_COST,
        }
    }
}

impl Default for Cost {
    fn default() -> Self {
        Cost::ZERO
    }
}

impl From<f64> for Cost {
    fn from(value: f64) -> Self {
        Cost::Finite(value)
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Cost::Finite(a), Cost::Finite(b)) => a.partial_cmp(b),
            (Cost::Finite(_), Cost::Infinite) => Some(Ordering::Less),
            (Cost::Infinite, Cost::Finite(_)) => Some(Ordering::Greater),
            (Cost::Infinite, Cost::Infinite) => Some(Ordering::Equal),
        }
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        match (self, rhs) {
            (Cost::Finite(a), Cost::Finite(b)) => Cost::Finite(a + b),
            _ => Cost::Infinite,
        }
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        *self = *self + rhs;
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Finite(value) => write!(f, "{value}"),
            Cost::Infinite => f.write_str("inf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn test_infinite_is_greater_than_any_finite() {
        assert!(Cost::Infinite > Cost::Finite(INFINITY_COST * 10.0));
        assert!(Cost::Finite(1.0) < Cost::Infinite);
        assert_eq!(
            Cost::Infinite.partial_cmp(&Cost::Infinite),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_infinite_absorbs_addition() {
        assert_eq!(Cost::Finite(2.0) + Cost::Infinite, Cost::Infinite);
        assert_eq!(Cost::Finite(2.0) + Cost::Finite(3.0), Cost::Finite(5.0));

        let total: Cost = vec![Cost::Finite(1.0), Cost::Infinite, Cost::Finite(4.0)]
            .into_iter()
            .sum();
        assert!(total.is_infinite());
    }

    #[test]
    fn test_saturating_export_and_display() {
        assert_eq!(Cost::Infinite.to_f64_saturating(), INFINITY_COST);
        assert_eq!(Cost::Finite(0.5).finite(), Some(0.5));
        assert_eq!(Cost::Infinite.finite(), None);
        assert_eq!(Cost::Infinite.to_string(), "inf");
    }
}
