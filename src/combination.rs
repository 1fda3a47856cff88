//! Combinations

use std::collections::{BTreeMap, btree_map};

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

use crate::{catalog::Catalog, quantity::Quantity};

/// Sum `price × quantity` over a set of entries, saturating at [`Decimal::MAX`].
///
/// Names missing from the catalog contribute nothing.
pub fn value_of<'n>(
    entries: impl IntoIterator<Item = (&'n str, Decimal)>,
    catalog: &Catalog,
) -> Decimal {
    checked_value_of(entries, catalog).unwrap_or(Decimal::MAX)
}

/// Sum `price × quantity` over a set of entries, or `None` when the sum leaves the
/// [`Decimal`] range.
pub fn checked_value_of<'n>(
    entries: impl IntoIterator<Item = (&'n str, Decimal)>,
    catalog: &Catalog,
) -> Option<Decimal> {
    entries
        .into_iter()
        .try_fold(Decimal::ZERO, |total, (name, quantity)| {
            catalog
                .unit_amount(name)
                .checked_mul(quantity)
                .and_then(|line| total.checked_add(line))
        })
}

/// A hypothetical set of items with quantities on the half-unit grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combination {
    quantities: BTreeMap<String, Quantity>,
}

impl Combination {
    /// Create an empty combination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantity of an item.
    pub fn set(&mut self, name: impl Into<String>, quantity: Quantity) {
        self.quantities.insert(name.into(), quantity);
    }

    /// Quantity of an item, if it is part of the combination.
    pub fn get(&self, name: &str) -> Option<Quantity> {
        self.quantities.get(name).copied()
    }

    /// Item names in the combination.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.quantities.keys().map(String::as_str)
    }

    /// Iterate over item names and quantities.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Quantity)> {
        self.quantities
            .iter()
            .map(|(name, quantity)| (name.as_str(), *quantity))
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// Whether the combination has no items.
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Total value as a plain amount in the catalog's currency.
    pub fn amount(&self, catalog: &Catalog) -> Decimal {
        self.checked_amount(catalog).unwrap_or(Decimal::MAX)
    }

    /// Total value, or `None` when it is too large to represent.
    pub fn checked_amount(&self, catalog: &Catalog) -> Option<Decimal> {
        checked_value_of(
            self.iter()
                .map(|(name, quantity)| (name, quantity.to_decimal())),
            catalog,
        )
    }

    /// Total value of the combination.
    pub fn value(&self, catalog: &Catalog) -> Money<'static, Currency> {
        catalog.money(self.amount(catalog))
    }

    /// Round every quantity to whole units, dropping items that round to zero.
    pub fn rounded(&self) -> Order {
        self.iter()
            .map(|(name, quantity)| (name, quantity.rounded_units()))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, Quantity)> for Combination {
    fn from_iter<T: IntoIterator<Item = (S, Quantity)>>(iter: T) -> Self {
        Self {
            quantities: iter
                .into_iter()
                .map(|(name, quantity)| (name.into(), quantity))
                .collect(),
        }
    }
}

/// Whole-unit item counts, as shown to a person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    units: BTreeMap<String, u32>,
}

impl Order {
    /// Create an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add whole units of an item.
    pub fn add(&mut self, name: impl Into<String>, units: u32) {
        if units == 0 {
            return;
        }

        match self.units.entry(name.into()) {
            btree_map::Entry::Occupied(mut entry) => {
                let total = entry.get().saturating_add(units);
                entry.insert(total);
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(units);
            }
        }
    }

    /// Units of an item, zero when absent.
    pub fn units(&self, name: &str) -> u32 {
        self.units.get(name).copied().unwrap_or_default()
    }

    /// Iterate over item names and unit counts.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.units.iter().map(|(name, units)| (name.as_str(), *units))
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the order has no items.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Total value as a plain amount in the catalog's currency.
    pub fn amount(&self, catalog: &Catalog) -> Decimal {
        value_of(
            self.iter().map(|(name, units)| (name, Decimal::from(units))),
            catalog,
        )
    }

    /// Total value of the order.
    pub fn value(&self, catalog: &Catalog) -> Money<'static, Currency> {
        catalog.money(self.amount(catalog))
    }
}

impl<'n> FromIterator<(&'n str, u32)> for Order {
    fn from_iter<T: IntoIterator<Item = (&'n str, u32)>>(iter: T) -> Self {
        let mut order = Order::new();

        for (name, units) in iter {
            order.add(name, units);
        }

        order
    }
}
