//! Allocation
//!
//! Splits a payment total between two menus, searches each menu for a combination matching its
//! share, and tops up any remaining shortfall with whole units of a low priced filler item.

use decimal_percentage::Percentage;
use rand::Rng;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::Catalog,
    combination::Order,
    quantity::snap_to_grid,
    search::{LocalSearch, NoopObserver, Score, SearchSettings},
};

/// Default cap on filler units added to a single allocation.
pub const DEFAULT_FILLER_UNITS: u32 = 20;

/// Errors raised while allocating a total.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    /// The allocated value missed the total by more than the configured tolerance.
    #[error("allocation gap {gap} exceeds tolerance {tolerance}")]
    GapExceeded {
        /// Total minus allocated value
        gap: Decimal,
        /// Largest accepted absolute gap
        tolerance: Decimal,
    },
}

/// How to treat a leftover difference between the total and the allocated value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum GapPolicy {
    /// Always return the allocation, whatever the gap.
    #[default]
    Accept,

    /// Fail when the absolute gap is larger than this amount.
    Tolerance(Decimal),
}

impl GapPolicy {
    /// Check a gap against this policy.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::GapExceeded`] when the gap is outside the tolerance.
    pub fn check(self, gap: Decimal) -> Result<(), AllocationError> {
        match self {
            GapPolicy::Accept => Ok(()),
            GapPolicy::Tolerance(tolerance) if gap.abs() > tolerance => {
                Err(AllocationError::GapExceeded { gap, tolerance })
            }
            GapPolicy::Tolerance(_) => Ok(()),
        }
    }
}

/// Item used to close small shortfalls after rounding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filler {
    /// Name of the filler item in the secondary menu
    pub item: String,

    /// Most units that may be added
    pub max_units: u32,
}

impl Filler {
    /// Filler capped at [`DEFAULT_FILLER_UNITS`].
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            max_units: DEFAULT_FILLER_UNITS,
        }
    }
}

/// A labelled catalog with its own search tuning.
#[derive(Clone, Debug)]
pub struct Menu {
    /// Display label, such as "Bebidas"
    pub label: String,

    /// Priced items
    pub catalog: Catalog,

    /// Search tuning for this menu
    pub search: SearchSettings,
}

/// Result for one menu of an allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuAllocation {
    /// Menu label
    pub label: String,

    /// Share of the total this menu was asked to match
    pub target: Decimal,

    /// Whole-unit order shown to the user
    pub order: Order,

    /// Value of the order
    pub amount: Decimal,

    /// Score of the search result before rounding
    pub score: Score,
}

/// A total split into two concrete orders.
#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
    /// Total that was allocated
    pub total: Decimal,

    /// Primary menu result
    pub primary: MenuAllocation,

    /// Secondary menu result, including any filler units
    pub secondary: MenuAllocation,

    /// Filler units added to the secondary order
    pub filler_units: u32,

    /// Total minus the combined value of both orders
    pub gap: Decimal,
}

impl Allocation {
    /// Combined value of both orders.
    pub fn allocated(&self) -> Decimal {
        self.primary.amount.saturating_add(self.secondary.amount)
    }
}

/// Splits totals between a primary and a secondary menu.
#[derive(Clone, Debug)]
pub struct Allocator {
    primary: Menu,
    secondary: Menu,
    primary_share: Decimal,
    filler: Option<Filler>,
    gap_policy: GapPolicy,
}

impl Allocator {
    /// Create an allocator giving `primary_share` of every total to the primary menu.
    pub fn new(primary: Menu, secondary: Menu, primary_share: Percentage) -> Self {
        Self {
            primary,
            secondary,
            primary_share: primary_share * Decimal::ONE,
            filler: None,
            gap_policy: GapPolicy::default(),
        }
    }

    /// Top up short allocations with units of a filler item from the secondary menu.
    #[must_use]
    pub fn with_filler(mut self, filler: Filler) -> Self {
        self.filler = Some(filler);
        self
    }

    /// Set the policy applied to the final gap.
    #[must_use]
    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    /// Primary menu
    pub fn primary(&self) -> &Menu {
        &self.primary
    }

    /// Secondary menu
    pub fn secondary(&self) -> &Menu {
        &self.secondary
    }

    /// Filler item used to top up short allocations, if any.
    pub fn filler(&self) -> Option<&Filler> {
        self.filler.as_ref()
    }

    /// Split a total into the primary and secondary targets, both snapped to the half-unit grid.
    pub fn targets(&self, total: Decimal) -> (Decimal, Decimal) {
        let primary = snap_to_grid(self.primary_share * total);
        let secondary = snap_to_grid(total - primary);

        (primary, secondary)
    }

    /// Allocate a total across both menus.
    ///
    /// The total is read in the menus' currency.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::GapExceeded`] if the gap policy rejects the result.
    #[tracing::instrument(name = "allocation.allocate", skip_all, fields(total = %total))]
    pub fn allocate<R: Rng + ?Sized>(
        &self,
        total: &Money<'_, Currency>,
        rng: &mut R,
    ) -> Result<Allocation, AllocationError> {
        let total = *total.amount();
        let (primary_target, secondary_target) = self.targets(total);

        let primary = allocate_menu(&self.primary, primary_target, rng);
        let mut secondary = allocate_menu(&self.secondary, secondary_target, rng);

        let shortfall = total
            .saturating_sub(primary.amount)
            .saturating_sub(secondary.amount);
        let filler_units = self.top_up(&mut secondary.order, shortfall);

        if filler_units > 0 {
            secondary.amount = secondary.order.amount(&self.secondary.catalog);
        }

        let allocated = primary.amount.saturating_add(secondary.amount);
        let gap = total.saturating_sub(allocated);

        info!(
            %primary_target,
            %secondary_target,
            %allocated,
            filler_units,
            %gap,
            "allocated total"
        );

        self.gap_policy.check(gap)?;

        Ok(Allocation {
            total,
            primary,
            secondary,
            filler_units,
            gap,
        })
    }

    /// Add whole filler units without pushing the order past the shortfall.
    fn top_up(&self, order: &mut Order, shortfall: Decimal) -> u32 {
        let Some(filler) = &self.filler else {
            return 0;
        };

        if shortfall <= Decimal::ZERO {
            return 0;
        }

        let Some(price) = self
            .secondary
            .catalog
            .price(&filler.item)
            .map(|price| *price.amount())
        else {
            debug!(item = %filler.item, menu = %self.secondary.label, "filler item not in menu");
            return 0;
        };

        if price <= Decimal::ZERO {
            return 0;
        }

        let units = shortfall
            .checked_div(price)
            .and_then(|ratio| ratio.floor().to_u32())
            .unwrap_or(u32::MAX)
            .min(filler.max_units);

        if units > 0 {
            debug!(item = %filler.item, units, "adding filler units");
            order.add(filler.item.as_str(), units);
        }

        units
    }
}

fn allocate_menu<R: Rng + ?Sized>(menu: &Menu, target: Decimal, rng: &mut R) -> MenuAllocation {
    let outcome = LocalSearch::new(menu.search).optimize_with_observer(
        &menu.catalog,
        &menu.catalog.money(target),
        rng,
        &mut NoopObserver,
    );

    let order = outcome.combination.rounded();
    let amount = order.amount(&menu.catalog);

    MenuAllocation {
        label: menu.label.clone(),
        target,
        order,
        amount,
        score: outcome.score,
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;
    use crate::catalog::parse_catalog;

    fn menu(label: &str, text: &str) -> Menu {
        Menu {
            label: label.to_string(),
            catalog: parse_catalog(text).catalog,
            search: SearchSettings::new(5, 2000),
        }
    }

    fn allocator() -> Allocator {
        Allocator::new(
            menu("Bebidas", "Suco R$ 10,00\nÁgua R$ 3,00\nRefri Lata R$ 7,00"),
            menu(
                "Sanduíches",
                "X Salada Simples R$ 18,00\nX Bacon Duplo R$ 28,00\nCebola R$ 0.50",
            ),
            Percentage::from(Decimal::new(20, 2)),
        )
        .with_filler(Filler::new("Cebola"))
    }

    fn unreachable_allocator() -> Allocator {
        Allocator::new(
            menu("Bebidas", "Garrafa R$ 1000,00"),
            menu("Sanduíches", "Banquete R$ 1000,00"),
            Percentage::from(Decimal::new(50, 2)),
        )
    }

    #[test]
    fn targets_split_by_share_on_grid() {
        let allocator = allocator();

        assert_eq!(
            allocator.targets(Decimal::from(100)),
            (Decimal::from(20), Decimal::from(80))
        );
        // 20% of 33.33 is 6.666, which snaps to 6.50; the rest, 26.83, snaps to 27.00
        assert_eq!(
            allocator.targets(Decimal::new(3333, 2)),
            (Decimal::new(65, 1), Decimal::from(27))
        );
    }

    #[test]
    fn top_up_adds_whole_units_below_shortfall() {
        let allocator = allocator();
        let mut order = Order::new();

        let units = allocator.top_up(&mut order, Decimal::new(320, 2));

        assert_eq!(units, 6);
        assert_eq!(order.units("Cebola"), 6);
    }

    #[test]
    fn top_up_is_capped() {
        let allocator = allocator();
        let mut order = Order::new();

        assert_eq!(allocator.top_up(&mut order, Decimal::from(50)), DEFAULT_FILLER_UNITS);
    }

    #[test]
    fn top_up_without_filler_is_a_no_op() {
        let allocator = unreachable_allocator();
        let mut order = Order::new();

        assert_eq!(allocator.top_up(&mut order, Decimal::from(5)), 0);
        assert!(order.is_empty());
    }

    #[test]
    fn top_up_skips_filler_missing_from_menu() {
        let allocator = unreachable_allocator().with_filler(Filler::new("Cebola"));
        let mut order = Order::new();

        assert_eq!(allocator.top_up(&mut order, Decimal::from(5)), 0);
    }

    #[test]
    fn top_up_skips_free_filler() {
        let allocator = Allocator::new(
            menu("Bebidas", "Suco R$ 10,00"),
            menu("Sanduíches", "Guardanapo R$ 0,00"),
            Percentage::from(Decimal::new(20, 2)),
        )
        .with_filler(Filler::new("Guardanapo"));
        let mut order = Order::new();

        assert_eq!(allocator.top_up(&mut order, Decimal::from(5)), 0);
    }

    #[test]
    fn allocate_reports_consistent_totals() -> TestResult {
        let allocator = allocator();

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);

            let allocation = allocator.allocate(&Money::from_major(250, iso::BRL), &mut rng)?;

            assert_eq!(allocation.total, Decimal::from(250));
            assert_eq!(allocation.primary.target, Decimal::from(50));
            assert_eq!(allocation.secondary.target, Decimal::from(200));
            assert!(allocation.filler_units <= DEFAULT_FILLER_UNITS);
            assert_eq!(allocation.gap, allocation.total - allocation.allocated());
            assert_eq!(
                allocation.secondary.amount,
                allocation
                    .secondary
                    .order
                    .amount(&allocator.secondary().catalog)
            );
        }

        Ok(())
    }

    #[test]
    fn unreachable_total_is_accepted_by_default() -> TestResult {
        let mut rng = StdRng::seed_from_u64(1);

        let allocation =
            unreachable_allocator().allocate(&Money::from_major(10, iso::BRL), &mut rng)?;

        assert!(allocation.primary.order.is_empty());
        assert!(allocation.secondary.order.is_empty());
        assert!(allocation.primary.score.exceeds());
        assert_eq!(allocation.gap, Decimal::from(10));

        Ok(())
    }

    #[test]
    fn allocate_handles_totals_at_the_decimal_limit() -> TestResult {
        let mut rng = StdRng::seed_from_u64(1);
        let allocator = allocator();

        let allocation =
            allocator.allocate(&Money::from_decimal(Decimal::MAX, iso::BRL), &mut rng)?;

        assert_eq!(allocation.total, Decimal::MAX);
        assert_eq!(allocation.filler_units, DEFAULT_FILLER_UNITS);
        assert!(allocation.gap > Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn tolerance_policy_rejects_large_gap() {
        let mut rng = StdRng::seed_from_u64(1);
        let allocator =
            unreachable_allocator().with_gap_policy(GapPolicy::Tolerance(Decimal::from(1)));

        let result = allocator.allocate(&Money::from_major(10, iso::BRL), &mut rng);

        assert_eq!(
            result,
            Err(AllocationError::GapExceeded {
                gap: Decimal::from(10),
                tolerance: Decimal::from(1),
            })
        );
    }

    #[test]
    fn zero_total_allocates_nothing() -> TestResult {
        let mut rng = StdRng::seed_from_u64(1);

        let allocation = allocator().allocate(&Money::from_major(0, iso::BRL), &mut rng)?;

        assert!(allocation.primary.order.is_empty());
        assert!(allocation.secondary.order.is_empty());
        assert_eq!(allocation.filler_units, 0);
        assert_eq!(allocation.gap, Decimal::ZERO);

        Ok(())
    }
}
