//! Drawing and shrinking integer dtype values.
//!
//! Integer values live in `i128`, which holds every signed and unsigned
//! catalog dtype. Draws never leave the resolved inclusive range, so no
//! resampling is needed.

use rand::Rng;

/// Values near zero drawn by the small-value lane
const NEAR_ZERO: [i128; 5] = [0, 1, -1, 2, -2];

/// Bounds of the small-magnitude lane
const SMALL_RANGE: (i128, i128) = (-128, 127);

/// Draw an integer from `lo..=hi`
///
/// Mixes a uniform lane with lanes favouring the bounds and small values, so
/// edge cases turn up far more often than uniform sampling would give.
pub(crate) fn draw(rng: &mut dyn rand::RngCore, lo: i128, hi: i128) -> i128 {
    match rng.gen_range(0..100u32) {
        0..50 => rng.gen_range(lo..=hi),
        50..65 => {
            if rng.r#gen::<bool>() {
                lo
            } else {
                hi
            }
        }
        65..85 => NEAR_ZERO[rng.gen_range(0..NEAR_ZERO.len())].clamp(lo, hi),
        _ => {
            let small_lo = lo.max(SMALL_RANGE.0);
            let small_hi = hi.min(SMALL_RANGE.1);
            if small_lo <= small_hi {
                rng.gen_range(small_lo..=small_hi)
            } else {
                rng.gen_range(lo..=hi)
            }
        }
    }
}

/// The permitted value closest to zero
pub(crate) fn shrink_target(lo: i128, hi: i128) -> i128 {
    0i128.clamp(lo, hi)
}

/// Shrink candidates for `value` inside `lo..=hi`, simplest first
///
/// Values outside the range have no candidates.
///
/// Tries the target, then the positive twin of a negative value, then a
/// binary ladder of distances from the target.
pub(crate) fn shrink_candidates(value: i128, lo: i128, hi: i128) -> Vec<i128> {
    let target = shrink_target(lo, hi);
    let mut candidates = Vec::new();
    if value == target || !(lo..=hi).contains(&value) {
        return candidates;
    }

    let mut push = |candidate: i128| {
        if candidate != value
            && (lo..=hi).contains(&candidate)
            && !candidates.contains(&candidate)
        {
            candidates.push(candidate);
        }
    };

    push(target);
    if value < 0 {
        push(-value);
    }

    let distance = value - target;
    let magnitude = distance.unsigned_abs();
    let sign = distance.signum();
    for shift in (1..128).rev() {
        let step = magnitude >> shift;
        if step > 0 {
            push(target + sign * step as i128);
        }
    }
    for shift in 1..128 {
        let step = magnitude >> shift;
        if step == 0 {
            break;
        }
        push(target + sign * (magnitude - step) as i128);
    }

    candidates
}
