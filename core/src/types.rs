//! Shared primitive types used across the entire simulation.

/// A simulated month. Month 1 is the first month of the horizon.
pub type Month = u32;

/// Position of a trial within a Monte Carlo run (0-based).
pub type TrialIndex = u64;

/// A master or derived random seed.
pub type Seed = u64;

/// The canonical identifier of a persisted run result.
pub type RunId = String;
