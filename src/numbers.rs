//! Small numeric helpers: ranged randoms and match ids

use std::time::SystemTime;

use rand::Rng;
use ulid::Ulid;

/// Uniform random number in `[min, max)`
///
/// Returns `min` when the range is empty, so callers can pass degenerate
/// surfaces without panicking.
pub fn random_range<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..max)
}

/// Generate a 26 character, time-sortable match id (ULID)
///
/// Randomness comes from the game's rng so seeded games stay reproducible
/// apart from the timestamp.
pub fn new_id<R: Rng>(rng: &mut R, at: SystemTime) -> String {
    Ulid::from_datetime_with_source(at, rng).to_string()
}
