//! Convergence of the local search on a small drinks menu.
//!
//! With `Suco` at 10,00 and `Água` at 3,00 a target of 23,00 is reachable exactly
//! (2 × Suco + 1 × Água). The search is greedy, so individual runs may stall in a local
//! optimum, but it must never settle above the target and more iterations can only help.

use rand::{SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;
use rusty_money::{Money, iso};

use tally::{
    catalog::parse_catalog,
    search::{LocalSearch, NoopObserver, SearchSettings, optimize},
};

const TRIALS: u64 = 40;

#[test]
fn repeated_runs_stay_at_or_below_target() {
    let catalog = parse_catalog("Suco R$ 10,00\nÁgua R$ 3,00").catalog;
    let target = Money::from_major(23, iso::BRL);

    for seed in 0..TRIALS {
        let mut rng = StdRng::seed_from_u64(seed);

        let combination = optimize(&catalog, &target, 2, 5000, &mut rng);

        assert_eq!(combination.len(), 2, "seed {seed} dropped an item");
        assert!(
            combination.amount(&catalog) <= Decimal::from(23),
            "seed {seed} settled above the target: {combination:?}"
        );
    }
}

#[test]
fn mean_gap_shrinks_with_more_iterations() {
    let catalog = parse_catalog("Suco R$ 10,00\nÁgua R$ 3,00").catalog;
    let target = Money::from_major(23, iso::BRL);

    // Each budget draws from its own seeds, so the longer runs are not continuations of the
    // shorter ones.
    let mean_gap = |max_iterations: usize, seeds: std::ops::Range<u64>| {
        let search = LocalSearch::new(SearchSettings::new(2, max_iterations));
        let trials = seeds.end - seeds.start;

        let total: Decimal = seeds
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);

                search
                    .optimize_with_observer(&catalog, &target, &mut rng, &mut NoopObserver)
                    .score
                    .distance()
            })
            .sum();

        total / Decimal::from(trials)
    };

    let short = mean_gap(10, 0..TRIALS);
    let long = mean_gap(1_000, 1_000..1_000 + TRIALS);

    assert!(long < short, "mean gap did not shrink: {short} -> {long}");
    assert!(long <= Decimal::from(3), "long runs still far from target: {long}");
}

#[test]
fn same_seed_reproduces_run() {
    let catalog = parse_catalog("Suco R$ 10,00\nÁgua R$ 3,00\nCreme R$ 15,00").catalog;
    let target = Money::from_major(97, iso::BRL);

    let run = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);

        optimize(&catalog, &target, 3, 3000, &mut rng)
    };

    assert_eq!(run(21), run(21));
}

#[test]
fn concurrent_searches_match_sequential_runs() {
    let catalog = parse_catalog("Suco R$ 10,00\nÁgua R$ 3,00\nCreme R$ 15,00").catalog;
    let target = Money::from_major(97, iso::BRL);
    let seeds = [5, 6];

    let run = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);

        optimize(&catalog, &target, 3, 3000, &mut rng)
    };

    let sequential: Vec<_> = seeds.iter().map(|&seed| run(seed)).collect();
    let run = &run;

    let concurrent: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = seeds
            .iter()
            .map(|&seed| scope.spawn(move || run(seed)))
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .collect()
    });

    assert_eq!(concurrent, sequential);
}
