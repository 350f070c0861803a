//! Time-rotating browser fingerprint profile.
//!
//! The profile is a pure function of wall-clock time: every caller inside
//! the same rotation bucket sees the same values, and the values change when
//! the bucket does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Knuth's multiplicative hash constant (odd, so multiplication mod 2^32 is a bijection).
pub const SEED_MULTIPLIER: u64 = 2_654_435_761;

/// Mask applied to the canvas seed to derive the WebGL seed.
pub const WEBGL_SEED_MASK: u32 = 0xDEAD_BEEF;

/// Screen sizes, cycled by bucket.
pub const SCREEN_SIZES: [(u32, u32); 8] = [
    (1366, 768),
    (1920, 1080),
    (1536, 864),
    (1440, 900),
    (1280, 720),
    (1600, 900),
    (2560, 1440),
    (1280, 800),
];

/// IANA time zones, cycled by bucket.
pub const TIMEZONES: [&str; 6] = [
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "America/Phoenix",
    "America/Anchorage",
];

/// Browser languages, cycled by bucket.
pub const LANGUAGES: [&str; 5] = ["en-US", "en-GB", "en", "es-US", "fr-CA"];

/// Navigator platforms, cycled by bucket.
pub const PLATFORMS: [&str; 3] = ["Win32", "MacIntel", "Linux x86_64"];

/// Browser fingerprint for one time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintProfile {
    /// Canvas noise seed.
    pub canvas_seed: u32,
    /// WebGL noise seed.
    pub webgl_seed: u32,
    /// Screen width in pixels.
    pub screen_width: u32,
    /// Screen height in pixels.
    pub screen_height: u32,
    /// IANA time zone.
    pub timezone: String,
    /// Browser language tag.
    pub language: String,
    /// Navigator platform string.
    pub platform: String,
}

/// Rotation bucket for a unix timestamp. Floors toward negative infinity.
pub fn bucket(now_secs: i64, rotation_interval_secs: u64) -> i64 {
    let interval = i64::try_from(rotation_interval_secs.max(1)).unwrap_or(i64::MAX);
    now_secs.div_euclid(interval)
}

/// `(bucket * K) mod 2^32`.
pub fn seed_for_bucket(bucket: i64) -> u32 {
    // Two's-complement reinterpretation keeps the mod-2^32 result exact for negative buckets.
    (bucket as u64).wrapping_mul(SEED_MULTIPLIER) as u32
}

fn pool_index(bucket: i64, len: usize) -> usize {
    // Pool lengths are tiny; the remainder always fits in usize.
    bucket.rem_euclid(len as i64) as usize
}

/// Compute the fingerprint for `now_secs` (unix seconds).
///
/// A zero interval is treated as one second.
pub fn fingerprint(now_secs: i64, rotation_interval_secs: u64) -> FingerprintProfile {
    let bucket = bucket(now_secs, rotation_interval_secs);
    let seed = seed_for_bucket(bucket);
    let (screen_width, screen_height) = SCREEN_SIZES[pool_index(bucket, SCREEN_SIZES.len())];

    FingerprintProfile {
        canvas_seed: seed,
        webgl_seed: seed ^ WEBGL_SEED_MASK,
        screen_width,
        screen_height,
        timezone: TIMEZONES[pool_index(bucket, TIMEZONES.len())].to_string(),
        language: LANGUAGES[pool_index(bucket, LANGUAGES.len())].to_string(),
        platform: PLATFORMS[pool_index(bucket, PLATFORMS.len())].to_string(),
    }
}

/// Convenience wrapper over [`fingerprint`] for a `DateTime`.
pub fn fingerprint_at(now: DateTime<Utc>, rotation_interval_secs: u64) -> FingerprintProfile {
    fingerprint(now.timestamp(), rotation_interval_secs)
}
