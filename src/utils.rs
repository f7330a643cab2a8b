//! Various utilities
//!
//! External create wrappers, small functions, etc.

pub mod match_opts;
pub mod progress;
pub mod random;

/// Minimum meaningful difference between two scalars.
///
/// Also the padding applied to every computed bounding box.
pub const EPSILON: f32 = 1e-5;

/// Close enough for us.
#[inline]
pub fn equal(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}
