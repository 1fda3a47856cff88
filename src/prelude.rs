//! Tally prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    allocation::{Allocation, AllocationError, Allocator, Filler, GapPolicy, Menu, MenuAllocation},
    catalog::{Catalog, CatalogParser, CatalogWarning, MenuItem, ParsedCatalog, parse_catalog},
    combination::{Combination, Order},
    config::{ConfigError, LoadedConfig, TallyConfig},
    quantity::{Quantity, Step, snap_to_grid},
    report::{AllocationReport, ReportError},
    search::{
        LocalSearch, NoopObserver, Score, SearchObserver, SearchOutcome, SearchSettings, optimize,
    },
};
