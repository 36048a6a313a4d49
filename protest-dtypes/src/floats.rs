//! Drawing and shrinking float dtype values.
//!
//! Every value is computed in `f64` and rounded to the dtype's width before it
//! is checked. A draw that fails the check is discarded and redrawn, up to the
//! configured resample budget, after which the permitted extremes are tried
//! deterministically.

use rand::Rng;

use crate::config::GeneratorConfig;
use crate::constraints::ResolvedConstraints;
use crate::dtype::FloatWidth;
use crate::error::DtypeError;
use crate::value::Value;

const SPECIALS: [f64; 5] = [0.0, -0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY];

/// Everything needed to draw or check values of one float strategy
#[derive(Debug, Clone, Copy)]
pub(crate) struct FloatSpace<'a> {
    pub width: FloatWidth,
    pub constraints: &'a ResolvedConstraints,
    /// Whether nonzero subnormals must be avoided
    pub flushes: bool,
}

impl FloatSpace<'_> {
    fn bounds(&self) -> (f64, f64) {
        self.constraints
            .float_bounds()
            .unwrap_or((f64::NEG_INFINITY, f64::INFINITY))
    }

    /// Whether `value` may be produced by this strategy
    pub fn is_valid(&self, value: f64) -> bool {
        self.constraints.permits(&Value::Float(value))
            && !(self.flushes && self.width.is_subnormal(value))
    }

    /// Draw one value, resampling invalid draws
    pub fn generate(
        &self,
        rng: &mut dyn rand::RngCore,
        config: &GeneratorConfig,
    ) -> Result<f64, DtypeError> {
        for _ in 0..config.max_resample_attempts {
            let candidate = self.draw(rng);
            if self.is_valid(candidate) {
                return Ok(candidate);
            }
        }

        let (lo, hi) = self.bounds();
        let normal = self.width.smallest_normal();
        tracing::trace!(
            width = self.width.bits(),
            attempts = config.max_resample_attempts,
            "float draws exhausted, falling back to fixed values"
        );
        [lo, hi, 0.0, normal, -normal]
            .into_iter()
            .find(|candidate| self.is_valid(*candidate))
            .ok_or(DtypeError::FilterExhausted {
                attempts: config.max_resample_attempts,
            })
    }

    fn draw(&self, rng: &mut dyn rand::RngCore) -> f64 {
        match rng.gen_range(0..100u32) {
            0..55 => self.draw_uniform(rng),
            55..70 => self.draw_bound(rng),
            70..85 => SPECIALS[rng.gen_range(0..SPECIALS.len())],
            _ if !self.flushes => self.draw_subnormal(rng),
            _ => self.draw_uniform(rng),
        }
    }

    fn draw_uniform(&self, rng: &mut dyn rand::RngCore) -> f64 {
        if rng.r#gen::<bool>() {
            let max_finite = self.width.max_finite();
            let (lo, hi) = self.bounds();
            let finite_lo = lo.max(-max_finite);
            let finite_hi = hi.min(max_finite);
            if finite_lo > finite_hi {
                return lo;
            }
            let u: f64 = rng.r#gen();
            let mixed = finite_lo * (1.0 - u) + finite_hi * u;
            self.width.round(mixed).clamp(finite_lo, finite_hi)
        } else {
            self.width.decode(rng.next_u64())
        }
    }

    // Lands on a bound or a few ulps inside it
    fn draw_bound(&self, rng: &mut dyn rand::RngCore) -> f64 {
        let (lo, hi) = self.bounds();
        let steps = rng.gen_range(0..3u32);
        if rng.r#gen::<bool>() {
            (0..steps).fold(lo, |v, _| self.width.next_up(v))
        } else {
            (0..steps).fold(hi, |v, _| self.width.next_down(v))
        }
    }

    fn draw_subnormal(&self, rng: &mut dyn rand::RngCore) -> f64 {
        let mantissa = rng.gen_range(1..(1u64 << self.width.mantissa_bits()));
        let sign = if rng.r#gen::<bool>() {
            1u64 << (self.width.bits() - 1)
        } else {
            0
        };
        self.width.decode(sign | mantissa)
    }

    /// Shrink candidates for `value`, simplest first, all valid and distinct
    pub fn shrink_candidates(&self, value: f64) -> Vec<f64> {
        let mut raw = Vec::new();
        let max_finite = self.width.max_finite();

        if !value.is_finite() {
            raw.extend([0.0, 1.0, -1.0, max_finite, -max_finite]);
            if value.is_nan() || value == f64::NEG_INFINITY {
                raw.push(f64::INFINITY);
            }
            if value.is_nan() {
                raw.push(f64::NEG_INFINITY);
            }
            raw.extend(self.boundary_integers());
        } else if value.fract() != 0.0 {
            let whole = value.trunc();
            raw.extend([0.0, whole, whole + value.signum()]);
            raw.extend(self.boundary_integers());
            let fraction = value.fract();
            for k in 0..=self.width.mantissa_bits() + 1 {
                let scale = 2f64.powi(k as i32);
                raw.push(whole + (fraction * scale).trunc() / scale);
            }
        } else {
            raw.push(0.0);
            if value < 0.0 || value.is_sign_negative() {
                raw.push(-value);
            }
            raw.extend(self.boundary_integers());
            raw.extend(integer_ladder(value));
        }

        let mut candidates: Vec<f64> = Vec::with_capacity(raw.len());
        for candidate in raw {
            let rounded = self.width.round(candidate);
            if rounded.to_bits() != value.to_bits()
                && self.is_valid(rounded)
                && !candidates.iter().any(|c| c.to_bits() == rounded.to_bits())
            {
                candidates.push(rounded);
            }
        }
        candidates
    }

    // Whole numbers nearest zero just inside a range that excludes zero
    fn boundary_integers(&self) -> Vec<f64> {
        let (lo, hi) = self.bounds();
        let mut out = Vec::new();
        if lo > 0.0 && lo.is_finite() {
            out.extend([lo.ceil(), lo]);
        }
        if hi < 0.0 && hi.is_finite() {
            out.extend([hi.floor(), hi]);
        }
        out
    }
}

// Whole values between zero and `value`, by halving distances
fn integer_ladder(value: f64) -> Vec<f64> {
    let magnitude = value.abs();
    let sign = value.signum();
    let mut steps = Vec::new();
    let mut step = (magnitude / 2.0).trunc();
    while step >= 1.0 {
        steps.push(step);
        step = (step / 2.0).trunc();
    }

    let mut ladder: Vec<f64> = steps.iter().rev().map(|s| sign * s).collect();
    ladder.extend(steps.iter().map(|s| sign * (magnitude - s)));
    ladder
}
