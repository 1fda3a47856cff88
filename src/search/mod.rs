//! Local Search
//!
//! Randomized hill-climbing over item quantities. Starting from a random subset of the catalog,
//! each iteration nudges one quantity by a fixed step and keeps the change only when it strictly
//! improves the score against the target.

use rand::{
    Rng,
    seq::{SliceRandom, index},
};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    catalog::Catalog,
    combination::{Combination, checked_value_of},
    quantity::{Quantity, Step},
};

pub mod observer;

pub use observer::{NoopObserver, SearchObserver};

/// Penalty added to the distance of any combination worth more than the target.
pub const LARGE_PENALTY: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Bounds for the quantity assigned to each item of a fresh combination.
const INITIAL_QUANTITY_RANGE: (f64, f64) = (1.0, 10.0);

/// Penalized distance between a combination's value and the target.
///
/// Scores order by whether the target is exceeded first and by distance second, so any
/// combination over the target ranks below every combination at or under it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
    exceeds: bool,
    distance: Decimal,
}

impl Score {
    /// Score of a combination whose value is too large to represent. It ranks below every
    /// other score.
    pub const OUT_OF_RANGE: Score = Score {
        exceeds: true,
        distance: Decimal::MAX,
    };

    /// Score a value against a target.
    pub fn evaluate(value: Decimal, target: Decimal) -> Self {
        Self {
            exceeds: value > target,
            distance: target.saturating_sub(value).abs(),
        }
    }

    /// Score a value that may have overflowed.
    pub fn evaluate_checked(value: Option<Decimal>, target: Decimal) -> Self {
        value.map_or(Self::OUT_OF_RANGE, |value| Self::evaluate(value, target))
    }

    /// Whether the value was above the target.
    pub fn exceeds(&self) -> bool {
        self.exceeds
    }

    /// Absolute distance between the value and the target.
    pub fn distance(&self) -> Decimal {
        self.distance
    }

    /// Distance plus [`LARGE_PENALTY`] when the target is exceeded.
    pub fn penalized(&self) -> Decimal {
        if self.exceeds {
            self.distance.saturating_add(LARGE_PENALTY)
        } else {
            self.distance
        }
    }
}

/// Tuning for a local search run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchSettings {
    /// Number of distinct items in the starting combination
    pub subset_size: usize,

    /// Iterations per trajectory
    pub max_iterations: usize,

    /// Independent trajectories to run, keeping the best
    pub restarts: usize,
}

impl SearchSettings {
    /// Settings for a single trajectory.
    pub fn new(subset_size: usize, max_iterations: usize) -> Self {
        Self {
            subset_size,
            max_iterations,
            restarts: 1,
        }
    }

    /// Run several independent trajectories and keep the best.
    #[must_use]
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::new(5, 10_000)
    }
}

/// Best combination found by a search, with its quality.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Best combination found
    pub combination: Combination,

    /// Score of the best combination
    pub score: Score,

    /// Value of the best combination, in the catalog's currency, saturating at [`Decimal::MAX`]
    pub amount: Decimal,

    /// Iterations run across all trajectories
    pub iterations: usize,

    /// Accepted improvements across all trajectories
    pub improvements: usize,
}

impl SearchOutcome {
    fn empty(target: Decimal) -> Self {
        Self {
            combination: Combination::new(),
            score: Score::evaluate(Decimal::ZERO, target),
            amount: Decimal::ZERO,
            iterations: 0,
            improvements: 0,
        }
    }

    /// Value of the best combination.
    pub fn value(&self, catalog: &Catalog) -> Money<'static, Currency> {
        catalog.money(self.amount)
    }
}

/// Greedy local search over a catalog.
#[derive(Copy, Clone, Debug, Default)]
pub struct LocalSearch {
    settings: SearchSettings,
}

impl LocalSearch {
    /// Create a search with the given settings.
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    /// Find a combination whose value approaches `target` without exceeding it.
    ///
    /// The target is read in the catalog's currency. An empty catalog or a target of zero or less
    /// yields an empty combination.
    pub fn optimize<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        target: &Money<'_, Currency>,
        rng: &mut R,
    ) -> Combination {
        self.optimize_with_observer(catalog, target, rng, &mut NoopObserver)
            .combination
    }

    /// Search with an observer, returning the best combination together with its score.
    #[tracing::instrument(
        name = "search.optimize",
        skip_all,
        fields(target = %target, items = catalog.len())
    )]
    pub fn optimize_with_observer<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        target: &Money<'_, Currency>,
        rng: &mut R,
        observer: &mut dyn SearchObserver,
    ) -> SearchOutcome {
        let target = *target.amount();

        if catalog.is_empty() || target <= Decimal::ZERO {
            debug!("degenerate input, returning empty combination");

            return SearchOutcome::empty(target);
        }

        let mut best = self.climb(catalog, target, rng, observer, 0);

        for restart in 1..self.settings.restarts {
            let outcome = self.climb(catalog, target, rng, observer, restart);

            let iterations = best.iterations + outcome.iterations;
            let improvements = best.improvements + outcome.improvements;

            if outcome.score < best.score {
                best = outcome;
            }

            best.iterations = iterations;
            best.improvements = improvements;
        }

        debug!(
            amount = %best.amount,
            distance = %best.score.distance(),
            exceeds = best.score.exceeds(),
            iterations = best.iterations,
            improvements = best.improvements,
            "search finished"
        );

        best
    }

    fn climb<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        target: Decimal,
        rng: &mut R,
        observer: &mut dyn SearchObserver,
        restart: usize,
    ) -> SearchOutcome {
        let mut best = initial_combination(catalog, self.settings.subset_size, rng);
        // `None` while the combination's value is out of the Decimal range.
        let mut amount = best.checked_amount(catalog);
        let mut score = Score::evaluate_checked(amount, target);

        // The key set never changes during a trajectory, only quantities do.
        let names: SmallVec<[String; 10]> = best.names().map(str::to_string).collect();

        observer.on_start(restart, &best, score);

        let mut iterations = 0;
        let mut improvements = 0;

        for iteration in 0..self.settings.max_iterations {
            let Some(name) = names.choose(rng) else {
                break;
            };

            let Some(step) = Step::ALL.choose(rng).copied() else {
                break;
            };

            iterations += 1;

            let Some(current) = best.get(name) else {
                continue;
            };

            let moved = current.step(step);
            let neighbor_amount = match amount {
                Some(amount) => catalog
                    .unit_amount(name)
                    .checked_mul(moved.to_decimal() - current.to_decimal())
                    .and_then(|delta| amount.checked_add(delta)),
                None => value_with(&best, catalog, name, moved),
            };
            let neighbor_score = Score::evaluate_checked(neighbor_amount, target);

            let accepted = neighbor_score < score;

            if accepted {
                best.set(name.as_str(), moved);
                amount = neighbor_amount;
                score = neighbor_score;
                improvements += 1;
            }

            observer.on_iteration(iteration, score, accepted);
        }

        SearchOutcome {
            combination: best,
            score,
            amount: amount.unwrap_or(Decimal::MAX),
            iterations,
            improvements,
        }
    }
}

/// Value of `combination` with the quantity of `name` replaced by `quantity`.
fn value_with(
    combination: &Combination,
    catalog: &Catalog,
    name: &str,
    quantity: Quantity,
) -> Option<Decimal> {
    checked_value_of(
        combination.iter().map(|(item, current)| {
            let quantity = if item == name { quantity } else { current };

            (item, quantity.to_decimal())
        }),
        catalog,
    )
}

/// Find a combination of catalog items whose value approaches `target` without exceeding it.
///
/// Runs a single trajectory. See [`LocalSearch`] for restarts and outcome reporting.
pub fn optimize<R: Rng + ?Sized>(
    catalog: &Catalog,
    target: &Money<'_, Currency>,
    subset_size: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Combination {
    LocalSearch::new(SearchSettings::new(subset_size, max_iterations))
        .optimize(catalog, target, rng)
}

/// Build a random starting combination.
///
/// Picks `min(subset_size, catalog.len())` distinct items uniformly and gives each a quantity
/// drawn uniformly from 1 to 10, snapped to the half-unit grid.
pub fn initial_combination<R: Rng + ?Sized>(
    catalog: &Catalog,
    subset_size: usize,
    rng: &mut R,
) -> Combination {
    let size = subset_size.min(catalog.len());

    if size == 0 {
        return Combination::new();
    }

    let chosen = index::sample(rng, catalog.len(), size);
    let mut combination = Combination::new();

    for idx in chosen {
        if let Some(item) = catalog.get_index(idx) {
            combination.set(item.name(), random_quantity(rng));
        }
    }

    combination
}

fn random_quantity<R: Rng + ?Sized>(rng: &mut R) -> Quantity {
    let (low, high) = INITIAL_QUANTITY_RANGE;
    let raw: f64 = rng.gen_range(low..=high);

    Decimal::from_f64(raw).map_or(Quantity::from_units(1), Quantity::snap)
}
