//! Time, frequency and ratio unit conversions.
//!
//! The simulator counts time in quanta, frequencies in MHz and scores as ratios. Reports use
//! milliseconds or microseconds, kHz (the unit of cpufreq sysfs nodes) and percents.

/// Length of one simulation quantum in milliseconds.
pub const QUANTUM_MS: u32 = 10;

/// Converts a number of quanta to milliseconds.
pub fn quantum_to_ms(quantum: u32) -> u32 {
    quantum * QUANTUM_MS
}

/// Converts milliseconds to microseconds.
pub fn ms_to_us(ms: u32) -> u32 {
    ms * 1000
}

/// Converts MHz to kHz.
pub fn mhz_to_khz(mhz: u32) -> u32 {
    mhz * 1000
}

/// Converts a score ratio to percents rounded to two decimals.
pub fn ratio_to_pct(ratio: f64) -> f64 {
    (ratio * 10000.).round() / 100.
}
