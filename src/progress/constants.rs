//! Progress display constants

/// Width of the step progress bar
pub const PROGRESS_BAR_WIDTH: usize = 40;

/// Throttle scan updates to this many milliseconds
pub const UPDATE_THROTTLE_MS: u128 = 100;

// vim: ts=4
