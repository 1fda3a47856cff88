//! Allocation with the shipped Clips Burger menus.

use std::path::Path;

use rand::{SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;
use rusty_money::Money;
use testresult::TestResult;

use tally::{allocation::DEFAULT_FILLER_UNITS, config::TallyConfig};

fn fixture() -> Result<TallyConfig, tally::config::ConfigError> {
    TallyConfig::from_path(Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/clips_burger.yml"))
}

#[test]
fn fixture_menus_parse_cleanly() -> TestResult {
    let loaded = fixture()?.load()?;

    assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
    assert_eq!(loaded.allocator.primary().catalog.len(), 9);
    assert_eq!(loaded.allocator.secondary().catalog.len(), 21);
    assert!(loaded.allocator.secondary().catalog.contains("Cebola"));

    Ok(())
}

#[test]
fn payment_totals_are_split_twenty_eighty() -> TestResult {
    let mut config = fixture()?;
    config.max_iterations = 2_000;

    let loaded = config.load()?;
    let mut rng = StdRng::seed_from_u64(2024);

    for (major, minor) in [(1_520, 50), (380, 0), (2_450, 0)] {
        let amount = Decimal::from(major) + Decimal::new(minor, 2);
        let total = Money::from_decimal(amount, loaded.currency);

        let allocation = loaded.allocator.allocate(&total, &mut rng)?;
        let (primary_target, secondary_target) = loaded.allocator.targets(amount);

        assert_eq!(allocation.primary.target, primary_target);
        assert_eq!(allocation.secondary.target, secondary_target);
        assert!(allocation.filler_units <= DEFAULT_FILLER_UNITS);
        assert_eq!(allocation.gap, amount - allocation.allocated());
        assert!(
            allocation.primary.score.distance() < allocation.primary.target,
            "drinks search made no progress for {amount}: {allocation:?}"
        );
    }

    Ok(())
}
