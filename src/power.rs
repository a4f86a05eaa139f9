//! Scale factor to power conversion used for enemy budgeting.

/// Scale of an ordinary unit.
pub const BASELINE_SCALE: f32 = 1.0;

/// Power of a unit with the given scale factor.
///
/// Units at or below baseline shrink quadratically; anything above baseline
/// grows exponentially, so a 2.5 boss is worth roughly twelve baseline units.
pub fn power(scale: f32) -> f32 {
    let scale = scale.max(0.0);
    if scale <= BASELINE_SCALE {
        scale * scale
    } else {
        scale.exp()
    }
}
