//! Search observer

use crate::{combination::Combination, search::Score};

/// Receives callbacks while a local search runs.
///
/// All methods default to no-ops so implementors only override what they need.
pub trait SearchObserver {
    /// Called once per trajectory, after the initial combination has been scored.
    fn on_start(&mut self, _restart: usize, _initial: &Combination, _score: Score) {}

    /// Called after every iteration with the best score so far in this trajectory.
    fn on_iteration(&mut self, _iteration: usize, _best: Score, _accepted: bool) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}
