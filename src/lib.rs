//! Tally
//!
//! Tally reconciles point-of-sale payment totals against a priced menu. For every total it
//! searches for a plausible set of menu items whose combined price approaches the total without
//! exceeding it, using a randomized local search over item quantities.

pub mod allocation;
pub mod catalog;
pub mod combination;
pub mod config;
pub mod prelude;
pub mod quantity;
pub mod report;
pub mod search;
