//! Flush-to-zero detection for the float widths.
//!
//! Whether subnormal values survive arithmetic depends on the hardware and on
//! how the process was built, so it is measured at runtime rather than assumed.
//! Results are cached per width for the lifetime of the process only.

use std::fmt::Debug;
use std::hint::black_box;

use crossbeam::atomic::AtomicCell;
use half::f16;

use crate::dtype::FloatWidth;
use crate::error::DtypeError;

/// Smallest positive normal value for each supported float width
pub const WIDTH_SMALLEST_NORMALS: [(u32, f64); 3] = [
    (16, 6.103515625e-05),
    (32, 1.1754943508222875e-38),
    (64, 2.2250738585072014e-308),
];

/// Smallest positive normal value at `width`
pub fn smallest_normal(width: u32) -> Result<f64, DtypeError> {
    WIDTH_SMALLEST_NORMALS
        .iter()
        .find(|(w, _)| *w == width)
        .map(|(_, value)| *value)
        .ok_or(DtypeError::UnsupportedWidth { width })
}

static FTZ_CACHE: [AtomicCell<Option<bool>>; 3] = [
    AtomicCell::new(None),
    AtomicCell::new(None),
    AtomicCell::new(None),
];

fn cache_slot(width: FloatWidth) -> &'static AtomicCell<Option<bool>> {
    match width {
        FloatWidth::Width16 => &FTZ_CACHE[0],
        FloatWidth::Width32 => &FTZ_CACHE[1],
        FloatWidth::Width64 => &FTZ_CACHE[2],
    }
}

/// Whether the runtime flushes subnormal results to zero at `width`
///
/// The first call per width measures; later calls read the cache. Two threads
/// racing on the first call both measure and store the same answer.
pub fn flushes_to_zero(width: u32) -> Result<bool, DtypeError> {
    let float_width = FloatWidth::from_width(width).ok_or(DtypeError::UnsupportedWidth { width })?;
    let slot = cache_slot(float_width);
    if let Some(cached) = slot.load() {
        return Ok(cached);
    }
    let flushes = measure(float_width)?;
    slot.store(Some(flushes));
    tracing::debug!(width, flushes, "probed subnormal support");
    Ok(flushes)
}

/// Run the probe without consulting or filling the cache
pub fn measure(width: FloatWidth) -> Result<bool, DtypeError> {
    let normal = smallest_normal(width.bits())?;
    let divisor = (1u64 << width.mantissa_bits()) as f64;
    // black_box keeps the division on the runtime's arithmetic path
    let flushed = match width {
        FloatWidth::Width16 => {
            let subnormal = black_box(f16::from_f64(normal)) / black_box(f16::from_f64(divisor));
            subnormal == f16::from_f64(0.0)
        }
        FloatWidth::Width32 => {
            let subnormal = black_box(normal as f32) / black_box(divisor as f32);
            subnormal == 0.0
        }
        FloatWidth::Width64 => {
            let subnormal = black_box(normal) / black_box(divisor);
            subnormal == 0.0
        }
    };
    Ok(flushed)
}

/// Source of flush-to-zero answers consulted by float strategies
pub trait SubnormalProbe: Debug + Send + Sync {
    /// Whether nonzero subnormals collapse to zero at `width`
    fn flushes_to_zero(&self, width: u32) -> Result<bool, DtypeError>;
}

/// Probe backed by the cached runtime measurement
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeProbe;

impl SubnormalProbe for RuntimeProbe {
    fn flushes_to_zero(&self, width: u32) -> Result<bool, DtypeError> {
        flushes_to_zero(width)
    }
}

/// Probe returning a fixed answer for every supported width
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe {
    flushes: bool,
}

impl FixedProbe {
    pub fn new(flushes: bool) -> Self {
        Self { flushes }
    }

    /// Pretend the platform keeps subnormals
    pub fn preserving() -> Self {
        Self::new(false)
    }

    /// Pretend the platform flushes subnormals to zero
    pub fn flushing() -> Self {
        Self::new(true)
    }
}

impl SubnormalProbe for FixedProbe {
    fn flushes_to_zero(&self, width: u32) -> Result<bool, DtypeError> {
        smallest_normal(width).map(|_| self.flushes)
    }
}
