//! Quantities
//!
//! Quantities live on a grid of half units. The optimizer only ever moves a
//! quantity along this grid, so a [`Quantity`] stores a count of halves rather
//! than a fractional value.

use std::fmt;

use rust_decimal::{Decimal, prelude::ToPrimitive};

/// Snap an amount to the nearest multiple of 0.50, rounding ties to even.
///
/// Amounts too large to double are already whole and are returned unchanged.
pub fn snap_to_grid(amount: Decimal) -> Decimal {
    amount
        .checked_mul(Decimal::TWO)
        .map_or(amount, |doubled| doubled.round() / Decimal::TWO)
}

/// A fixed perturbation applied to a single quantity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Remove one whole unit.
    MinusOne,

    /// Remove half a unit.
    MinusHalf,

    /// Add half a unit.
    PlusHalf,

    /// Add one whole unit.
    PlusOne,
}

impl Step {
    /// Every step the optimizer may choose from.
    pub const ALL: [Step; 4] = [Step::MinusOne, Step::MinusHalf, Step::PlusHalf, Step::PlusOne];

    /// Signed size of the step in half units.
    pub const fn halves(self) -> i32 {
        match self {
            Step::MinusOne => -2,
            Step::MinusHalf => -1,
            Step::PlusHalf => 1,
            Step::PlusOne => 2,
        }
    }
}

/// A non-negative quantity on the half-unit grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity {
    halves: u32,
}

impl Quantity {
    /// No quantity at all.
    pub const ZERO: Quantity = Quantity { halves: 0 };

    /// The smallest quantity an item may hold while it is part of a combination.
    pub const MIN: Quantity = Quantity { halves: 1 };

    /// Create a quantity from a count of half units.
    pub const fn from_halves(halves: u32) -> Self {
        Self { halves }
    }

    /// Create a quantity from a count of whole units.
    pub const fn from_units(units: u32) -> Self {
        Self {
            halves: units.saturating_mul(2),
        }
    }

    /// Snap a decimal amount onto the grid.
    ///
    /// Negative amounts snap to zero and amounts beyond the representable range saturate.
    pub fn snap(amount: Decimal) -> Self {
        if amount.is_sign_negative() {
            return Self::ZERO;
        }

        let halves = amount
            .checked_mul(Decimal::TWO)
            .and_then(|doubled| doubled.round().to_u32())
            .unwrap_or(u32::MAX);

        Self { halves }
    }

    /// Number of half units in this quantity.
    pub const fn halves(self) -> u32 {
        self.halves
    }

    /// The quantity as a decimal number of units.
    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.halves) / Decimal::TWO
    }

    /// Apply a step, never going below [`Quantity::MIN`].
    #[must_use]
    pub fn step(self, step: Step) -> Self {
        let halves = self.halves.saturating_add_signed(step.halves());

        Self { halves }.max(Self::MIN)
    }

    /// Round to whole units, with half units going to the nearest even count.
    pub const fn rounded_units(self) -> u32 {
        let whole = self.halves / 2;

        if self.halves % 2 == 1 && whole % 2 == 1 {
            whole + 1
        } else {
            whole
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal().normalize())
    }
}
